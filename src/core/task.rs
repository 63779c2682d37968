//! Task data model as served by the project API.
//!
//! Tasks carry their prerequisites (`dependsOnIds`) and, when the remote
//! scheduler has run, the CPM fields used by the diagram.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a task.
///
/// The API issues either numeric or UUID identifiers depending on the
/// deployment, so both are accepted on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TaskId {
    Int(i64),
    Uuid(Uuid),
}

impl TaskId {
    /// Short form for narrow columns: numbers as-is, UUIDs truncated.
    pub fn short(&self) -> String {
        match self {
            TaskId::Int(n) => n.to_string(),
            TaskId::Uuid(u) => u.to_string()[..8].to_string(),
        }
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskId::Int(n) => write!(f, "{}", n),
            TaskId::Uuid(u) => write!(f, "{}", u),
        }
    }
}

impl std::str::FromStr for TaskId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Ok(TaskId::Int(n));
        }
        Ok(TaskId::Uuid(Uuid::parse_str(s)?))
    }
}

impl From<i64> for TaskId {
    fn from(n: i64) -> Self {
        TaskId::Int(n)
    }
}

impl From<Uuid> for TaskId {
    fn from(u: Uuid) -> Self {
        TaskId::Uuid(u)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::InProgress => write!(f, "in progress"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

/// Scheduling fields computed by the remote critical-path service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpmFields {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub early_finish: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_start: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub late_finish: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<u32>,
}

impl CpmFields {
    pub fn is_empty(&self) -> bool {
        *self == CpmFields::default()
    }

    /// Fill every absent field from `other`; present fields are kept.
    pub fn fill_from(&mut self, other: &CpmFields) {
        self.early_start = self.early_start.or(other.early_start);
        self.early_finish = self.early_finish.or(other.early_finish);
        self.late_start = self.late_start.or(other.late_start);
        self.late_finish = self.late_finish.or(other.late_finish);
        self.slack = self.slack.or(other.slack);
    }
}

/// A task in a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Estimated duration in days.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee_name: Option<String>,
    /// Prerequisites: tasks that must complete before this one starts.
    #[serde(default, alias = "dependsOnTaskIds")]
    pub depends_on_ids: Vec<TaskId>,
    #[serde(flatten)]
    pub cpm: CpmFields,
}

impl Task {
    /// Create a pending task with no prerequisites.
    pub fn new(id: impl Into<TaskId>, title: &str) -> Self {
        Self {
            id: id.into(),
            title: title.to_string(),
            description: None,
            status: TaskStatus::Pending,
            priority: None,
            estimated_duration: None,
            due_date: None,
            assignee_id: None,
            assignee_name: None,
            depends_on_ids: Vec::new(),
            cpm: CpmFields::default(),
        }
    }

    /// Builder-style prerequisite list.
    pub fn with_dependencies(mut self, prerequisites: &[TaskId]) -> Self {
        self.depends_on_ids = prerequisites.to_vec();
        self
    }

    pub fn with_duration(mut self, days: u32) -> Self {
        self.estimated_duration = Some(days);
        self
    }

    /// A source task has no prerequisites.
    pub fn is_source(&self) -> bool {
        self.depends_on_ids.is_empty()
    }

    pub fn depends_on(&self, prerequisite: &TaskId) -> bool {
        self.depends_on_ids.contains(prerequisite)
    }

    /// Structural checks on a task as received from the API.
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() {
            return Err(crate::Error::Validation(format!(
                "Task {} has an empty title",
                self.id
            )));
        }
        if self.estimated_duration == Some(0) {
            return Err(crate::Error::Validation(format!(
                "Task {} has a zero estimated duration",
                self.id
            )));
        }
        Ok(())
    }

    /// Check the CPM invariants for whichever fields are present.
    ///
    /// `earlyFinish = earlyStart + duration`, `lateFinish >= earlyFinish`,
    /// `slack = lateStart - earlyStart = lateFinish - earlyFinish`.
    pub fn cpm_consistent(&self) -> bool {
        let c = &self.cpm;
        if let (Some(es), Some(ef), Some(d)) =
            (c.early_start, c.early_finish, self.estimated_duration)
        {
            if es.checked_add(d) != Some(ef) {
                return false;
            }
        }
        if let (Some(ef), Some(lf)) = (c.early_finish, c.late_finish) {
            if lf < ef {
                return false;
            }
        }
        if let (Some(slack), Some(es), Some(ls)) = (c.slack, c.early_start, c.late_start) {
            if ls.checked_sub(es) != Some(slack) {
                return false;
            }
        }
        if let (Some(slack), Some(ef), Some(lf)) = (c.slack, c.early_finish, c.late_finish) {
            if lf.checked_sub(ef) != Some(slack) {
                return false;
            }
        }
        true
    }
}

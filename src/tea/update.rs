//! Pure update function for the TEA (The Elm Architecture) pattern.
//!
//! The update function takes a model and a message, mutates the model,
//! and returns a list of commands to execute.

use crossterm::event::{KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};

use crate::core::dag::available_candidates;
use crate::core::task::TaskId;
use crate::diagram::Point;
use crate::ui;
use crate::{plog, plog_debug, plog_warn, Error};

use super::command::Command;
use super::message::Message;
use super::model::{CriticalState, Mode, Model, Notification, NotificationLevel, Picker, PickerKind};

/// Pan distance per key press, in diagram units.
const PAN_STEP: f64 = 50.0;

/// Helper to set an error notification and mark model as dirty.
fn set_error(model: &mut Model, message: String) {
    plog_warn!("UI Error: {}", message);
    model.notification = Some(Notification {
        level: NotificationLevel::Error,
        message,
    });
    model.dirty = true;
}

fn set_info(model: &mut Model, message: String) {
    model.notification = Some(Notification {
        level: NotificationLevel::Info,
        message,
    });
    model.dirty = true;
}

/// Unauthorized responses clear the session; everything else is reported
/// with `context`.
fn report(model: &mut Model, context: &str, err: &Error, cmds: &mut Vec<Command>) {
    if matches!(err, Error::Unauthorized) {
        model.authenticated = false;
        cmds.push(Command::ClearSession);
        set_error(
            model,
            "Session expired. Set PERT_TOKEN or pass --token.".to_string(),
        );
    } else {
        set_error(model, format!("{}: {}", context, err));
    }
}

fn select(model: &mut Model, task: Option<TaskId>, cmds: &mut Vec<Command>) {
    if let Some(change) = model.chart.select(task) {
        cmds.push(Command::SelectionChanged(change));
        model.redraw();
    }
}

fn request_critical(model: &mut Model, cmds: &mut Vec<Command>) {
    model.critical = CriticalState::Loading;
    cmds.push(Command::LoadCritical);
}

/// Pure update function: Model + Message → Commands
///
/// The function itself has no side effects - all I/O happens via returned Commands.
pub fn update(model: &mut Model, msg: Message) -> Vec<Command> {
    let mut cmds = Vec::new();

    match msg {
        Message::Key(key) => {
            model.notification = None; // Clear notification on any key press
            model.dirty = true;
            match model.mode {
                Mode::Diagram => update_diagram_mode(model, key, &mut cmds),
                Mode::Picker(kind) => update_picker_mode(model, key, kind, &mut cmds),
            }
        }

        Message::Mouse(mouse) => {
            if model.mode == Mode::Diagram {
                update_mouse(model, mouse, &mut cmds);
            }
        }

        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            model.dirty = true;
        }

        Message::RefreshTick => {
            plog_debug!("Message::RefreshTick");
            cmds.push(Command::LoadTasks);
        }

        Message::SessionChanged(authenticated) => {
            plog_debug!("Message::SessionChanged authenticated={}", authenticated);
            model.authenticated = authenticated;
            model.dirty = true;
        }

        Message::TasksLoaded(snapshot) => {
            plog!("Message::TasksLoaded count={}", snapshot.len());
            model.tasks = snapshot;
            model.loaded = true;
            model.load_error = None;

            if let Some(selected) = model.chart.selected() {
                if !model.tasks.contains(&selected) {
                    select(model, None, &mut cmds);
                }
            }
            if let Some(picker) = &model.picker {
                if !model.tasks.contains(&picker.task) {
                    model.picker = None;
                    model.mode = Mode::Diagram;
                }
            }
            model.redraw();
            request_critical(model, &mut cmds);
        }

        Message::TasksFailed(err) => {
            plog_warn!("Message::TasksFailed err={}", err);
            model.load_error = Some(err.to_string());
            if model.critical == CriticalState::Loading {
                model.critical = CriticalState::Idle;
            }
            report(model, "Failed to load tasks", &err, &mut cmds);
        }

        Message::CriticalLoaded(overlay) => {
            plog_debug!(
                "Message::CriticalLoaded path={} critical={}",
                overlay.path().len(),
                overlay.critical_count()
            );
            model.chart.set_overlay(overlay);
            model.critical = CriticalState::Ready;
            model.redraw();
        }

        Message::CriticalFailed(err) => {
            // Non-fatal: the diagram stays, without highlighting.
            plog_warn!("Message::CriticalFailed err={}", err);
            model.chart.clear_overlay();
            model.critical = CriticalState::Failed(err.to_string());
            model.redraw();
            if matches!(err, Error::Unauthorized) {
                report(model, "Critical path", &err, &mut cmds);
            }
        }

        Message::DependencyAdded(task) => {
            plog!("Message::DependencyAdded task={}", task.id);
            let id = task.id;
            model.tasks = model.tasks.with_task(task);
            model.redraw();
            set_info(model, format!("Prerequisite added to #{}", id.short()));
            request_critical(model, &mut cmds);
        }

        Message::DependencyRemoved(task) => {
            plog!("Message::DependencyRemoved task={}", task.id);
            let id = task.id;
            model.tasks = model.tasks.with_task(task);
            model.redraw();
            set_info(model, format!("Prerequisite removed from #{}", id.short()));
            request_critical(model, &mut cmds);
        }

        Message::DependencyFailed {
            task,
            prerequisite,
            error,
        } => {
            plog_warn!(
                "Message::DependencyFailed task={} prerequisite={} err={}",
                task,
                prerequisite,
                error
            );
            let context = format!("#{} -> #{}", prerequisite.short(), task.short());
            report(model, &context, &error, &mut cmds);
        }
    }

    cmds
}

fn update_diagram_mode(model: &mut Model, key: KeyEvent, cmds: &mut Vec<Command>) {
    match key.code {
        KeyCode::Char('+') | KeyCode::Char('=') => {
            model.chart.viewport_mut().zoom_in();
            model.redraw();
        }

        KeyCode::Char('-') => {
            model.chart.viewport_mut().zoom_out();
            model.redraw();
        }

        KeyCode::Char('0') => {
            model.chart.viewport_mut().reset_zoom();
            model.chart.viewport_mut().reset_pan();
            model.redraw();
        }

        KeyCode::Char('h') | KeyCode::Left => model.chart.viewport_mut().pan_by(-PAN_STEP, 0.0),
        KeyCode::Char('l') | KeyCode::Right => model.chart.viewport_mut().pan_by(PAN_STEP, 0.0),
        KeyCode::Char('k') | KeyCode::Up => model.chart.viewport_mut().pan_by(0.0, -PAN_STEP),
        KeyCode::Char('j') | KeyCode::Down => model.chart.viewport_mut().pan_by(0.0, PAN_STEP),

        KeyCode::Tab => cycle_selection(model, 1, cmds),
        KeyCode::BackTab => cycle_selection(model, -1, cmds),

        KeyCode::Esc => select(model, None, cmds),

        KeyCode::Char('r') => {
            model.critical = CriticalState::Loading;
            cmds.push(Command::LoadTasks);
        }

        KeyCode::Char('a') => open_picker(model, PickerKind::AddPrerequisite),
        KeyCode::Char('x') => open_picker(model, PickerKind::RemovePrerequisite),

        KeyCode::Char('q') => {
            cmds.push(Command::Quit);
        }

        KeyCode::Char('?') => {
            model.show_keymap = !model.show_keymap;
        }

        _ => {}
    }
}

fn cycle_selection(model: &mut Model, step: isize, cmds: &mut Vec<Command>) {
    let order = model.diagram_order();
    if order.is_empty() {
        return;
    }
    let len = order.len() as isize;
    let next = match model
        .chart
        .selected()
        .and_then(|id| order.iter().position(|t| *t == id))
    {
        Some(i) => (i as isize + step).rem_euclid(len),
        None if step >= 0 => 0,
        None => len - 1,
    };
    select(model, Some(order[next as usize]), cmds);
}

fn open_picker(model: &mut Model, kind: PickerKind) {
    let Some(task) = model.chart.selected() else {
        set_info(model, "Select a task first (Tab or click)".to_string());
        return;
    };

    let options: Vec<TaskId> = match kind {
        PickerKind::AddPrerequisite => match available_candidates(&task, &model.tasks) {
            Ok(candidates) => candidates.into_iter().map(|t| t.id).collect(),
            Err(e) => {
                set_error(model, e.to_string());
                return;
            }
        },
        PickerKind::RemovePrerequisite => match model.tasks.graph().prerequisites(&task) {
            Ok(ids) => ids,
            Err(e) => {
                set_error(model, e.to_string());
                return;
            }
        },
    };

    if options.is_empty() {
        let message = match kind {
            PickerKind::AddPrerequisite => "No task can be added without creating a cycle",
            PickerKind::RemovePrerequisite => "Task has no prerequisites",
        };
        set_info(model, message.to_string());
        return;
    }

    plog_debug!("open_picker kind={:?} task={} options={}", kind, task, options.len());
    model.picker = Some(Picker {
        kind,
        task,
        options,
        selected: 0,
    });
    model.mode = Mode::Picker(kind);
}

fn close_picker(model: &mut Model) {
    model.picker = None;
    model.mode = Mode::Diagram;
}

fn update_picker_mode(model: &mut Model, key: KeyEvent, kind: PickerKind, cmds: &mut Vec<Command>) {
    let Some(picker) = model.picker.as_mut() else {
        close_picker(model);
        return;
    };
    let len = picker.options.len();

    match key.code {
        KeyCode::Char('j') | KeyCode::Down if len > 0 => {
            picker.selected = (picker.selected + 1) % len;
        }

        KeyCode::Char('k') | KeyCode::Up if len > 0 => {
            picker.selected = picker.selected.checked_sub(1).unwrap_or(len - 1);
        }

        KeyCode::Enter => {
            if let Some(&prerequisite) = picker.options.get(picker.selected) {
                let task = picker.task;
                cmds.push(match kind {
                    PickerKind::AddPrerequisite => Command::AddDependency { task, prerequisite },
                    PickerKind::RemovePrerequisite => {
                        Command::RemoveDependency { task, prerequisite }
                    }
                });
            }
            close_picker(model);
        }

        KeyCode::Esc | KeyCode::Char('q') => close_picker(model),

        _ => {}
    }
}

fn update_mouse(model: &mut Model, mouse: MouseEvent, cmds: &mut Vec<Command>) {
    if mouse.kind != MouseEventKind::Down(MouseButton::Left) {
        return;
    }
    let (width, height) = model.terminal_size;
    let area = ui::diagram_area(ratatui::layout::Rect::new(0, 0, width, height));
    if mouse.column < area.x
        || mouse.row < area.y
        || mouse.column >= area.x + area.width
        || mouse.row >= area.y + area.height
    {
        return;
    }

    // Centre of the clicked cell, in surface pixels.
    let pointer = Point::new(
        (mouse.column - area.x) as f64 * ui::CELL_WIDTH + ui::CELL_WIDTH / 2.0,
        (mouse.row - area.y) as f64 * ui::CELL_HEIGHT + ui::CELL_HEIGHT / 2.0,
    );
    if let Some(change) = model
        .chart
        .click(pointer, Point::new(0.0, 0.0), &model.tasks)
    {
        cmds.push(Command::SelectionChanged(change));
        model.redraw();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cpm::CriticalOverlay;
    use crate::core::task::Task;
    use crate::diagram::LayoutConfig;
    use crate::store::TaskSnapshot;
    use crossterm::event::KeyModifiers;

    fn id(n: i64) -> TaskId {
        TaskId::Int(n)
    }

    /// 1 -> 2 -> 4, 1 -> 3 -> 4
    fn diamond() -> Vec<Task> {
        vec![
            Task::new(1, "a").with_duration(2),
            Task::new(2, "b").with_duration(3).with_dependencies(&[id(1)]),
            Task::new(3, "c").with_duration(1).with_dependencies(&[id(1)]),
            Task::new(4, "d").with_duration(1).with_dependencies(&[id(2), id(3)]),
        ]
    }

    fn test_model() -> Model {
        Model::new("1", LayoutConfig::default(), true)
    }

    fn loaded_model() -> Model {
        let mut model = test_model();
        update(&mut model, Message::TasksLoaded(TaskSnapshot::new(diamond())));
        model
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::empty())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Loading
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_tasks_loaded_requests_critical_path() {
        let mut model = test_model();
        let cmds = update(&mut model, Message::TasksLoaded(TaskSnapshot::new(diamond())));
        assert_eq!(cmds, vec![Command::LoadCritical]);
        assert!(model.loaded);
        assert_eq!(model.critical, CriticalState::Loading);
        assert!(model.drawing.is_ok());
    }

    #[test]
    fn test_critical_failure_is_non_fatal() {
        let mut model = loaded_model();
        let cmds = update(
            &mut model,
            Message::CriticalFailed(Error::Network("connection refused".into())),
        );
        assert!(cmds.is_empty());
        assert!(model.drawing.is_ok());
        assert!(matches!(model.critical, CriticalState::Failed(_)));
        assert!(model.chart.overlay().is_empty());
    }

    #[test]
    fn test_unauthorized_clears_session() {
        let mut model = loaded_model();
        let cmds = update(&mut model, Message::TasksFailed(Error::Unauthorized));
        assert_eq!(cmds, vec![Command::ClearSession]);
        assert!(!model.authenticated);
        assert_eq!(
            model.notification.as_ref().map(|n| n.level),
            Some(NotificationLevel::Error)
        );
    }

    #[test]
    fn test_refresh_key_reloads() {
        let mut model = loaded_model();
        let cmds = update(&mut model, Message::Key(key(KeyCode::Char('r'))));
        assert_eq!(cmds, vec![Command::LoadTasks]);
    }

    #[test]
    fn test_reload_drops_vanished_selection() {
        let mut model = loaded_model();
        model.chart.select(Some(id(4)));
        let remaining: Vec<Task> = diamond().into_iter().take(3).collect();
        let cmds = update(&mut model, Message::TasksLoaded(TaskSnapshot::new(remaining)));
        assert_eq!(model.chart.selected(), None);
        assert!(matches!(cmds[0], Command::SelectionChanged(_)));
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Viewport
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_zoom_keys() {
        let mut model = loaded_model();
        update(&mut model, Message::Key(key(KeyCode::Char('+'))));
        assert_eq!(model.chart.viewport().zoom(), 1.1);
        update(&mut model, Message::Key(key(KeyCode::Char('-'))));
        update(&mut model, Message::Key(key(KeyCode::Char('-'))));
        assert_eq!(model.chart.viewport().zoom(), 0.9);
        update(&mut model, Message::Key(key(KeyCode::Char('0'))));
        assert_eq!(model.chart.viewport().zoom(), 1.0);
    }

    #[test]
    fn test_tab_cycles_selection_in_diagram_order() {
        let mut model = loaded_model();
        let cmds = update(&mut model, Message::Key(key(KeyCode::Tab)));
        assert_eq!(model.chart.selected(), Some(id(1)));
        assert!(matches!(cmds[0], Command::SelectionChanged(_)));

        update(&mut model, Message::Key(key(KeyCode::BackTab)));
        assert_eq!(model.chart.selected(), Some(id(4)));

        update(&mut model, Message::Key(key(KeyCode::Esc)));
        assert_eq!(model.chart.selected(), None);
    }

    #[test]
    fn test_mouse_click_selects_task() {
        let mut model = loaded_model();
        update(&mut model, Message::Resize(80, 24));
        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 10,
            row: ui::diagram_area(ratatui::layout::Rect::new(0, 0, 80, 24)).y + 4,
            modifiers: KeyModifiers::empty(),
        };
        let cmds = update(&mut model, Message::Mouse(click));
        assert_eq!(model.chart.selected(), Some(id(1)));
        assert_eq!(cmds.len(), 1);
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Pickers
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_add_picker_excludes_dependents() {
        let mut model = loaded_model();
        model.chart.select(Some(id(2)));
        update(&mut model, Message::Key(key(KeyCode::Char('a'))));
        assert_eq!(model.mode, Mode::Picker(PickerKind::AddPrerequisite));
        // 1 is already a prerequisite, 4 depends on 2
        assert_eq!(model.picker.as_ref().unwrap().options, vec![id(3)]);

        let cmds = update(&mut model, Message::Key(key(KeyCode::Enter)));
        assert_eq!(
            cmds,
            vec![Command::AddDependency {
                task: id(2),
                prerequisite: id(3)
            }]
        );
        assert_eq!(model.mode, Mode::Diagram);
    }

    #[test]
    fn test_remove_picker_lists_prerequisites() {
        let mut model = loaded_model();
        model.chart.select(Some(id(4)));
        update(&mut model, Message::Key(key(KeyCode::Char('x'))));
        update(&mut model, Message::Key(key(KeyCode::Down)));
        let cmds = update(&mut model, Message::Key(key(KeyCode::Enter)));
        assert_eq!(
            cmds,
            vec![Command::RemoveDependency {
                task: id(4),
                prerequisite: id(3)
            }]
        );
    }

    #[test]
    fn test_picker_requires_selection() {
        let mut model = loaded_model();
        update(&mut model, Message::Key(key(KeyCode::Char('a'))));
        assert_eq!(model.mode, Mode::Diagram);
        assert!(model.notification.is_some());
    }

    #[test]
    fn test_picker_esc_cancels() {
        let mut model = loaded_model();
        model.chart.select(Some(id(4)));
        update(&mut model, Message::Key(key(KeyCode::Char('x'))));
        let cmds = update(&mut model, Message::Key(key(KeyCode::Esc)));
        assert!(cmds.is_empty());
        assert!(model.picker.is_none());
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Mutations
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn test_dependency_added_replaces_snapshot() {
        let mut model = loaded_model();
        let before = model.tasks.clone();
        let updated = Task::new(3, "c").with_duration(1).with_dependencies(&[id(1), id(2)]);
        let cmds = update(&mut model, Message::DependencyAdded(updated));

        assert_eq!(cmds, vec![Command::LoadCritical]);
        assert!(model.tasks.get(&id(3)).unwrap().depends_on(&id(2)));
        assert!(!before.get(&id(3)).unwrap().depends_on(&id(2)));
    }

    #[test]
    fn test_dependency_failure_keeps_state() {
        let mut model = loaded_model();
        let cmds = update(
            &mut model,
            Message::DependencyFailed {
                task: id(1),
                prerequisite: id(4),
                error: Error::Cycle {
                    task: id(1),
                    prerequisite: id(4),
                },
            },
        );
        assert!(cmds.is_empty());
        assert!(model.tasks.get(&id(1)).unwrap().is_source());
        assert!(model
            .notification
            .as_ref()
            .unwrap()
            .message
            .contains("cycle"));
    }

    #[test]
    fn test_critical_loaded_highlights() {
        let mut model = loaded_model();
        let tasks: Vec<Task> = model.tasks.to_vec();
        let overlay = CriticalOverlay::new(vec![id(1), id(2), id(4)], &tasks[..]);
        update(&mut model, Message::CriticalLoaded(overlay));
        assert_eq!(model.critical, CriticalState::Ready);
        assert!(model.chart.overlay().is_critical_edge(&id(2), &id(4)));
    }

    #[test]
    fn test_q_quits() {
        let mut model = test_model();
        let cmds = update(&mut model, Message::Key(key(KeyCode::Char('q'))));
        assert_eq!(cmds, vec![Command::Quit]);
    }
}

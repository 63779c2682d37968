//! Terminal UI rendering for the pert TUI.
//!
//! Layout: a two-line header (project, critical-path summary), the diagram
//! canvas, an optional detail pane on the right, and a one-line status bar.
//!
//! This module renders from RenderState (immutable snapshot) - it never
//! mutates application state. The diagram itself arrives as a list of draw
//! commands; this module only maps them onto a ratatui canvas.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::canvas::{Canvas, Context, Line as CanvasLine, Rectangle},
    widgets::{Clear, Paragraph, Wrap},
    Frame,
};

use crate::diagram::{DrawCommand, EdgeStyle, NodeStyle, Point, TextStyle};
use crate::render::{CriticalView, DiagramView, PickerView, RenderState, TaskDetail};
use crate::tea::{Mode, Notification, NotificationLevel};

/// Surface pixels covered by one terminal cell.
pub const CELL_WIDTH: f64 = 10.0;
pub const CELL_HEIGHT: f64 = 16.0;

const HEADER_HEIGHT: u16 = 2;
const STATUSBAR_HEIGHT: u16 = 1;
const DETAIL_WIDTH: u16 = 40;
/// Narrower terminals hide the detail pane.
const DETAIL_MIN_TERMINAL_WIDTH: u16 = 100;

const COLOR_TEXT_DIMMED: Color = Color::Gray;
const COLOR_TEXT_MUTED: Color = Color::DarkGray;
const COLOR_CRITICAL: Color = Color::Red;
const COLOR_SELECTED: Color = Color::Cyan;

struct Regions {
    header: Rect,
    diagram: Rect,
    detail: Option<Rect>,
    statusbar: Rect,
}

fn regions(area: Rect) -> Regions {
    let [header, body, statusbar] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Fill(1),
        Constraint::Length(STATUSBAR_HEIGHT),
    ])
    .areas(area);

    if area.width >= DETAIL_MIN_TERMINAL_WIDTH {
        let [diagram, detail] =
            Layout::horizontal([Constraint::Fill(1), Constraint::Length(DETAIL_WIDTH)]).areas(body);
        Regions {
            header,
            diagram,
            detail: Some(detail),
            statusbar,
        }
    } else {
        Regions {
            header,
            diagram: body,
            detail: None,
            statusbar,
        }
    }
}

/// Region of the terminal occupied by the diagram canvas. Shared with the
/// update function so mouse clicks map onto the same cells.
pub fn diagram_area(area: Rect) -> Rect {
    regions(area).diagram
}

// -----------------------------------------------------------------------------
// Context-sensitive keymap
// -----------------------------------------------------------------------------

struct Keybinding(&'static str, &'static str);

struct KeybindingGroup(Vec<Keybinding>);

fn keybindings_for_mode(mode: Mode, has_selection: bool) -> Vec<KeybindingGroup> {
    match mode {
        Mode::Diagram => {
            let mut groups = vec![
                KeybindingGroup(vec![
                    Keybinding("+/-", "zoom"),
                    Keybinding("0", "reset"),
                    Keybinding("hjkl", "pan"),
                ]),
                KeybindingGroup(vec![Keybinding("Tab", "select"), Keybinding("r", "refresh")]),
            ];
            if has_selection {
                groups.push(KeybindingGroup(vec![
                    Keybinding("a", "add prerequisite"),
                    Keybinding("x", "remove prerequisite"),
                    Keybinding("Esc", "deselect"),
                ]));
            }
            groups.push(KeybindingGroup(vec![Keybinding("q", "quit")]));
            groups
        }
        Mode::Picker(_) => vec![KeybindingGroup(vec![
            Keybinding("j/k", "move"),
            Keybinding("Enter", "confirm"),
            Keybinding("Esc", "cancel"),
        ])],
    }
}

/// Main render function - entry point for all UI drawing.
pub fn draw(frame: &mut Frame, state: &RenderState) {
    let area = frame.area();
    if area.height < HEADER_HEIGHT + STATUSBAR_HEIGHT + 1 {
        frame.render_widget(Paragraph::new("Terminal too small"), area);
        return;
    }
    let regions = regions(area);

    render_header(frame, state, regions.header);
    render_diagram(frame, state, regions.diagram);
    if let Some(detail) = regions.detail {
        render_detail(frame, state.detail.as_ref(), detail);
    }
    render_statusbar(frame, state, regions.statusbar);

    if let Some(picker) = &state.picker {
        render_picker(frame, picker, regions.diagram);
    }
    if let Some(ref notification) = state.notification {
        render_notification(frame, notification, area);
    }
}

fn render_header(frame: &mut Frame, state: &RenderState, area: Rect) {
    let title = Line::from(vec![
        Span::styled("PERT ", Style::default().add_modifier(Modifier::BOLD)),
        Span::styled(
            format!("project {} · {} tasks", state.project, state.task_count),
            Style::default().fg(COLOR_TEXT_DIMMED),
        ),
        if state.authenticated {
            Span::raw("")
        } else {
            Span::styled("  no token", Style::default().fg(Color::Yellow))
        },
    ]);

    let summary = match &state.critical {
        CriticalView::Idle => Line::from(""),
        CriticalView::Loading => Line::from(Span::styled(
            "Loading...",
            Style::default().fg(COLOR_TEXT_MUTED),
        )),
        CriticalView::Ready {
            tasks,
            total_duration,
        } => Line::from(vec![
            Span::styled("Critical path: ", Style::default().fg(COLOR_CRITICAL)),
            Span::raw(format!(
                "{} tasks | Total duration: {} days",
                tasks, total_duration
            )),
        ]),
        CriticalView::Empty => Line::from(Span::styled(
            "No critical path. Give tasks estimated durations, link them with dependencies, and make sure at least one task has no prerequisites.",
            Style::default().fg(COLOR_TEXT_MUTED),
        )),
        CriticalView::Failed(message) => Line::from(vec![
            Span::styled("Critical path unavailable: ", Style::default().fg(COLOR_CRITICAL)),
            Span::styled(message.clone(), Style::default().fg(COLOR_TEXT_DIMMED)),
            Span::styled("  (r to retry)", Style::default().fg(COLOR_TEXT_MUTED)),
        ]),
    };

    frame.render_widget(Paragraph::new(vec![title, summary]), area);
}

fn render_diagram(frame: &mut Frame, state: &RenderState, area: Rect) {
    let message = match &state.diagram {
        DiagramView::Loading => "Loading tasks...".to_string(),
        DiagramView::NoTasks => "This project has no tasks.".to_string(),
        DiagramView::Failed(err) => format!("Could not load tasks: {}  (r to retry)", err),
        DiagramView::Error { message, tasks } => {
            let mut lines = vec![
                Line::from(Span::styled(
                    message.clone(),
                    Style::default().fg(COLOR_CRITICAL),
                )),
                Line::from(""),
            ];
            lines.extend(
                tasks
                    .iter()
                    .map(|t| Line::from(Span::styled(format!("  {}", t), Style::default()))),
            );
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
            return;
        }
        DiagramView::Ready {
            commands,
            zoom,
            pan,
        } => {
            render_canvas(frame, commands, *zoom, *pan, area);
            return;
        }
    };
    frame.render_widget(
        Paragraph::new(Span::styled(message, Style::default().fg(COLOR_TEXT_DIMMED))),
        area,
    );
}

fn edge_color(style: EdgeStyle) -> Color {
    match style {
        EdgeStyle::Normal => COLOR_TEXT_MUTED,
        EdgeStyle::Critical => COLOR_CRITICAL,
    }
}

fn node_color(style: NodeStyle) -> Color {
    match style {
        NodeStyle::Normal => COLOR_TEXT_DIMMED,
        NodeStyle::Critical => COLOR_CRITICAL,
        NodeStyle::Selected => COLOR_SELECTED,
    }
}

fn text_style(style: TextStyle) -> Style {
    match style {
        TextStyle::Title => Style::default().add_modifier(Modifier::BOLD),
        TextStyle::Detail => Style::default().fg(COLOR_TEXT_DIMMED),
        TextStyle::Marker => Style::default()
            .fg(COLOR_CRITICAL)
            .add_modifier(Modifier::BOLD),
    }
}

/// Canvas y grows upwards; diagram y grows downwards.
fn flip(p: Point) -> (f64, f64) {
    (p.x, -p.y)
}

fn paint(ctx: &mut Context, command: &DrawCommand) {
    match command {
        DrawCommand::Line { from, to, style } => {
            let (x1, y1) = flip(*from);
            let (x2, y2) = flip(*to);
            ctx.draw(&CanvasLine::new(x1, y1, x2, y2, edge_color(*style)));
        }
        DrawCommand::Arrowhead {
            tip,
            left,
            right,
            style,
        } => {
            let (tx, ty) = flip(*tip);
            for barb in [left, right] {
                let (bx, by) = flip(*barb);
                ctx.draw(&CanvasLine::new(tx, ty, bx, by, edge_color(*style)));
            }
        }
        DrawCommand::Rect { rect, style, .. } => {
            ctx.draw(&Rectangle {
                x: rect.x,
                y: -(rect.y + rect.height),
                width: rect.width,
                height: rect.height,
                color: node_color(*style),
            });
        }
        DrawCommand::Text {
            at, text, style, ..
        } => {
            let width = text.chars().count() as f64 * CELL_WIDTH;
            let x = match style {
                // Right-aligned so the marker stays inside the box.
                TextStyle::Marker => at.x + 2.5 * CELL_WIDTH - width,
                _ => at.x - width / 2.0,
            };
            let y = -at.y;
            ctx.print(x, y, Span::styled(text.clone(), text_style(*style)));
        }
    }
}

fn render_canvas(frame: &mut Frame, commands: &[DrawCommand], zoom: f64, pan: Point, area: Rect) {
    let left = pan.x * zoom;
    let top = pan.y * zoom;
    let width = area.width as f64 * CELL_WIDTH;
    let height = area.height as f64 * CELL_HEIGHT;

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([left, left + width])
        .y_bounds([-(top + height), -top])
        .paint(|ctx| {
            let (edges, nodes): (Vec<&DrawCommand>, Vec<&DrawCommand>) = commands
                .iter()
                .partition(|c| matches!(c, DrawCommand::Line { .. } | DrawCommand::Arrowhead { .. }));
            for command in edges {
                paint(ctx, command);
            }
            ctx.layer();
            for command in nodes {
                paint(ctx, command);
            }
        });
    frame.render_widget(canvas, area);
}

fn render_detail(frame: &mut Frame, detail: Option<&TaskDetail>, area: Rect) {
    let label = Style::default().fg(COLOR_TEXT_MUTED);
    let Some(task) = detail else {
        frame.render_widget(
            Paragraph::new(Span::styled("No task selected", label)),
            area,
        );
        return;
    };

    let field = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<10}", name), label),
            Span::raw(value),
        ])
    };
    let opt = |value: Option<u32>| value.map_or("-".to_string(), |v| v.to_string());

    let title_style = if task.critical {
        Style::default().fg(COLOR_CRITICAL).add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    let mut lines = vec![
        Line::from(Span::styled(format!("#{} {}", task.id.short(), task.title), title_style)),
        Line::from(""),
        field("Status", task.status.clone()),
        field("Priority", task.priority.clone().unwrap_or_else(|| "-".into())),
        field(
            "Duration",
            task.duration.map_or("-".to_string(), |d| format!("{}d", d)),
        ),
        field("Assignee", task.assignee.clone().unwrap_or_else(|| "-".into())),
        field("Due", task.due_date.clone().unwrap_or_else(|| "-".into())),
        Line::from(""),
        field(
            "ES / EF",
            format!("{} / {}", opt(task.cpm.early_start), opt(task.cpm.early_finish)),
        ),
        field(
            "LS / LF",
            format!("{} / {}", opt(task.cpm.late_start), opt(task.cpm.late_finish)),
        ),
        field("Slack", opt(task.cpm.slack)),
    ];

    if !task.prerequisites.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Depends on", label)));
        lines.extend(task.prerequisites.iter().map(|p| Line::from(format!("  {}", p))));
    }
    if !task.dependents.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled("Required by", label)));
        lines.extend(task.dependents.iter().map(|d| Line::from(format!("  {}", d))));
    }
    if let Some(description) = &task.description {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            description.clone(),
            Style::default().fg(COLOR_TEXT_DIMMED),
        )));
    }

    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), area);
}

fn render_picker(frame: &mut Frame, picker: &PickerView, area: Rect) {
    let height = (picker.items.len() as u16 + 2).min(area.height);
    let width = area.width.min(60);
    let popup = Rect {
        x: area.x + 1,
        y: area.y,
        width,
        height,
    };
    frame.render_widget(Clear, popup);

    let mut lines = vec![
        Line::from(Span::styled(
            picker.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];
    let visible = height.saturating_sub(2) as usize;
    let start = picker.selected.saturating_sub(visible.saturating_sub(1));
    lines.extend(
        picker
            .items
            .iter()
            .enumerate()
            .skip(start)
            .take(visible)
            .map(|(i, item)| {
                let style = if i == picker.selected {
                    Style::default().add_modifier(Modifier::REVERSED)
                } else {
                    Style::default()
                };
                Line::from(Span::styled(item.clone(), style))
            }),
    );
    frame.render_widget(Paragraph::new(lines), popup);
}

/// Bottom line: "?" toggle, then the keymap legend when expanded.
fn render_statusbar(frame: &mut Frame, state: &RenderState, area: Rect) {
    let groups = keybindings_for_mode(state.mode, state.detail.is_some());
    let key_style = Style::default().fg(COLOR_TEXT_DIMMED);
    let desc_style = Style::default().fg(COLOR_TEXT_MUTED);

    let help_style = if state.show_keymap {
        Style::default()
    } else {
        Style::default().fg(COLOR_TEXT_MUTED)
    };
    let mut spans: Vec<Span> = vec![Span::styled("?", help_style)];

    if state.show_keymap || matches!(state.mode, Mode::Picker(_)) {
        for group in groups.iter().filter(|g| !g.0.is_empty()) {
            spans.push(Span::styled(" │ ", desc_style));
            for (idx, keybinding) in group.0.iter().enumerate() {
                if idx > 0 {
                    spans.push(Span::styled(" • ", desc_style));
                }
                spans.push(Span::styled(keybinding.0, key_style));
                spans.push(Span::styled(format!(" {}", keybinding.1), desc_style));
            }
        }
    }

    if let DiagramView::Ready { zoom, .. } = &state.diagram {
        let badge = format!(" {}% ", (zoom * 100.0).round() as u32);
        let content_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let spacer = (area.width as usize)
            .saturating_sub(content_width)
            .saturating_sub(badge.len());
        if spacer > 0 {
            spans.push(Span::raw(" ".repeat(spacer)));
        }
        spans.push(Span::styled(badge, key_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render notification message on the bottom line of the screen.
fn render_notification(frame: &mut Frame, notification: &Notification, area: Rect) {
    let notification_area = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(1),
        width: area.width,
        height: 1,
    };

    frame.render_widget(Clear, notification_area);

    let line = match notification.level {
        NotificationLevel::Error => Line::from(vec![
            Span::styled(
                "Error: ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                notification.message.clone(),
                Style::default().fg(Color::Red),
            ),
        ]),
        NotificationLevel::Info => Line::from(Span::styled(
            notification.message.clone(),
            Style::default().fg(Color::Green),
        )),
    };

    frame.render_widget(Paragraph::new(line), notification_area);
}

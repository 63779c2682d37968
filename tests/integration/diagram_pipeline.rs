//! Leveling, layout, rendering, and viewport working together.

use pert::core::{assign_levels, CriticalOverlay, Task, TaskId};
use pert::diagram::viewport::{MAX_ZOOM, MIN_ZOOM};
use pert::diagram::{DrawCommand, EdgeStyle, LayoutConfig, NodeStyle, PertChart, Point, Rect};

use crate::fixtures::{diamond, id, task};

fn rect_of(chart: &PertChart, tasks: &[Task], task: TaskId) -> Rect {
    let drawing = chart.draw(tasks).unwrap();
    drawing.layout.position(&task).unwrap().rect
}

/// Style of the line drawn from `prerequisite` to `dependent`.
fn edge_style(chart: &PertChart, tasks: &[Task], prerequisite: TaskId, dependent: TaskId) -> EdgeStyle {
    let from = rect_of(chart, tasks, prerequisite);
    let to = rect_of(chart, tasks, dependent);
    let start = Point::new(from.right(), from.y + from.height / 2.0);
    let end = Point::new(to.x, to.y + to.height / 2.0);

    chart
        .draw(tasks)
        .unwrap()
        .commands
        .into_iter()
        .find_map(|cmd| match cmd {
            DrawCommand::Line { from, to, style } if from == start && to == end => Some(style),
            _ => None,
        })
        .unwrap_or_else(|| panic!("no edge {} -> {}", prerequisite, dependent))
}

fn node_style(chart: &PertChart, tasks: &[Task], task: TaskId) -> NodeStyle {
    chart
        .draw(tasks)
        .unwrap()
        .commands
        .into_iter()
        .find_map(|cmd| match cmd {
            DrawCommand::Rect { task_id, style, .. } if task_id == task => Some(style),
            _ => None,
        })
        .unwrap()
}

fn overlay(path: &[i64], tasks: &[Task]) -> CriticalOverlay {
    let path: Vec<TaskId> = path.iter().map(|&n| id(n)).collect();
    let critical: Vec<Task> = tasks
        .iter()
        .filter(|t| path.contains(&t.id))
        .cloned()
        .collect();
    CriticalOverlay::new(path, &critical)
}

#[test]
fn test_diamond_levels() {
    let levels = assign_levels(&diamond()).unwrap();
    assert_eq!(levels.get(&id(1)), Some(0));
    assert_eq!(levels.get(&id(2)), Some(1));
    assert_eq!(levels.get(&id(3)), Some(1));
    assert_eq!(levels.get(&id(4)), Some(2));
}

#[test]
fn test_diamond_placement() {
    let tasks = diamond();
    let chart = PertChart::new(LayoutConfig::default());

    let at = |n: i64| {
        let r = rect_of(&chart, &tasks, id(n));
        (r.x, r.y)
    };
    assert_eq!(at(1), (50.0, 50.0));
    assert_eq!(at(2), (50.0, 250.0));
    assert_eq!(at(3), (300.0, 250.0));
    assert_eq!(at(4), (50.0, 450.0));
}

#[test]
fn test_no_two_boxes_overlap() {
    let mut tasks = diamond();
    for n in 5..25 {
        tasks.push(task(n, &format!("T{}", n), 1, &[n % 4 + 1]));
    }
    let chart = PertChart::new(LayoutConfig::default());
    let drawing = chart.draw(&tasks).unwrap();
    let positions = drawing.layout.positions();
    assert_eq!(positions.len(), tasks.len());

    for (i, a) in positions.iter().enumerate() {
        for b in &positions[i + 1..] {
            assert!(
                !a.rect.intersects(&b.rect),
                "{} and {} overlap",
                a.task_id,
                b.task_id
            );
        }
    }
}

#[test]
fn test_critical_path_styles_edges_and_nodes() {
    let tasks = diamond();
    let mut chart = PertChart::new(LayoutConfig::default());
    chart.set_overlay(overlay(&[1, 2, 4], &tasks));

    assert_eq!(edge_style(&chart, &tasks, id(1), id(2)), EdgeStyle::Critical);
    assert_eq!(edge_style(&chart, &tasks, id(2), id(4)), EdgeStyle::Critical);
    assert_eq!(edge_style(&chart, &tasks, id(1), id(3)), EdgeStyle::Normal);
    assert_eq!(edge_style(&chart, &tasks, id(3), id(4)), EdgeStyle::Normal);

    assert_eq!(node_style(&chart, &tasks, id(1)), NodeStyle::Critical);
    assert_eq!(node_style(&chart, &tasks, id(3)), NodeStyle::Normal);
}

/// A and D are both critical, but the path goes through B, so the direct
/// A -> D edge is not highlighted.
#[test]
fn test_shortcut_between_critical_tasks_stays_normal() {
    let tasks = vec![
        task(1, "A", 2, &[]),
        task(2, "B", 3, &[1]),
        task(4, "D", 4, &[2, 1]),
    ];
    let mut chart = PertChart::new(LayoutConfig::default());
    chart.set_overlay(overlay(&[1, 2, 4], &tasks));

    assert_eq!(edge_style(&chart, &tasks, id(1), id(4)), EdgeStyle::Normal);
    assert_eq!(edge_style(&chart, &tasks, id(1), id(2)), EdgeStyle::Critical);
    assert_eq!(node_style(&chart, &tasks, id(4)), NodeStyle::Critical);
}

#[test]
fn test_selection_outranks_critical() {
    let tasks = diamond();
    let mut chart = PertChart::new(LayoutConfig::default());
    chart.set_overlay(overlay(&[1, 2, 4], &tasks));
    chart.select(Some(id(2)));
    assert_eq!(node_style(&chart, &tasks, id(2)), NodeStyle::Selected);
}

#[test]
fn test_cycle_reports_members_instead_of_drawing() {
    let tasks = vec![
        task(1, "a", 1, &[3]),
        task(2, "b", 1, &[1]),
        task(3, "c", 1, &[2]),
        task(4, "free", 1, &[]),
    ];
    let chart = PertChart::new(LayoutConfig::default());
    let err = chart.draw(&tasks).unwrap_err();
    for n in 1..=3 {
        assert!(err.tasks.contains(&id(n)), "missing {} in {:?}", n, err.tasks);
    }
    assert!(!err.tasks.contains(&id(4)));
}

#[test]
fn test_zoom_scales_commands_and_clamps() {
    let tasks = diamond();
    let mut chart = PertChart::new(LayoutConfig::default());

    for _ in 0..30 {
        chart.viewport_mut().zoom_in();
    }
    assert_eq!(chart.viewport().zoom(), MAX_ZOOM);
    let drawing = chart.draw(&tasks).unwrap();
    let first_rect = drawing.commands.iter().find_map(|cmd| match cmd {
        DrawCommand::Rect { rect, .. } => Some(*rect),
        _ => None,
    });
    assert_eq!(
        first_rect,
        Some(Rect {
            x: 100.0,
            y: 100.0,
            width: 300.0,
            height: 160.0
        })
    );

    for _ in 0..30 {
        chart.viewport_mut().zoom_out();
    }
    assert_eq!(chart.viewport().zoom(), MIN_ZOOM);
}

#[test]
fn test_click_selects_through_zoom_and_pan() {
    let tasks = diamond();
    let mut chart = PertChart::new(LayoutConfig::default());
    chart.viewport_mut().set_zoom(2.0);
    chart.viewport_mut().pan_by(0.0, 200.0);

    // Screen (110, 110) -> diagram (55, 255): inside B.
    let change = chart
        .click(Point::new(110.0, 110.0), Point::new(0.0, 0.0), &tasks)
        .unwrap();
    assert_eq!(change.current, Some(id(2)));

    // Empty space clears the selection.
    let change = chart
        .click(Point::new(1000.0, 5.0), Point::new(0.0, 0.0), &tasks)
        .unwrap();
    assert_eq!(change.previous, Some(id(2)));
    assert_eq!(change.current, None);
}

#[test]
fn test_branch_off_critical_path_stays_normal() {
    let tasks = vec![
        task(1, "A", 1, &[]),
        task(2, "B", 1, &[1]),
        task(3, "C", 1, &[2]),
        task(4, "D", 1, &[1]),
    ];
    let mut chart = PertChart::new(LayoutConfig::default());
    chart.set_overlay(overlay(&[1, 2, 3], &tasks));

    assert_eq!(edge_style(&chart, &tasks, id(1), id(2)), EdgeStyle::Critical);
    assert_eq!(edge_style(&chart, &tasks, id(2), id(3)), EdgeStyle::Critical);
    assert_eq!(edge_style(&chart, &tasks, id(1), id(4)), EdgeStyle::Normal);
    assert_eq!(node_style(&chart, &tasks, id(4)), NodeStyle::Normal);
}

/// Path order alone does not make an edge critical; both ends must be in
/// the critical task set too.
#[test]
fn test_path_without_critical_tasks_stays_normal() {
    let tasks = vec![task(1, "A", 1, &[]), task(2, "B", 1, &[1])];
    let mut chart = PertChart::new(LayoutConfig::default());
    chart.set_overlay(CriticalOverlay::new(vec![id(1), id(2)], &[]));

    assert_eq!(edge_style(&chart, &tasks, id(1), id(2)), EdgeStyle::Normal);
    assert_eq!(node_style(&chart, &tasks, id(1)), NodeStyle::Normal);
}

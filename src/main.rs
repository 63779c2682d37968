use std::io::{self, stdout, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use crossbeam_channel::{Receiver, TryRecvError};
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::runtime::Runtime;

use pert::api::{HttpCollaborator, ProjectId};
use pert::app::{LogicThread, Services};
use pert::config::Config;
use pert::core::{assign_levels, Task, TaskId};
use pert::diagram::PertChart;
use pert::render::RenderState;
use pert::session::{Session, SessionContext};
use pert::store::DependencyStore;
use pert::{plog, plog_warn, ui, Error, Result};

const FRAME_DURATION: Duration = Duration::from_micros(16_666); // 60fps

/// pert - task dependency graph and CPM/PERT diagram for a project
#[derive(Parser, Debug)]
#[command(name = "pert")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    PERT_TOKEN=...  Bearer token for the project API\n    PERT_DEBUG=1    Enable debug logging (alternative to --debug)\n    PERT_LOG=trace  Explicit log level")]
pub struct Cli {
    /// Enable debug logging (writes to ~/.pert/pert.log)
    #[arg(short = 'd', long, global = true)]
    pub debug: bool,

    /// Base URL of the project API
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Project whose tasks are shown
    #[arg(short = 'p', long, global = true)]
    pub project: Option<String>,

    /// Bearer token (overrides PERT_TOKEN and the config file)
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// List the project's tasks
    Tasks,

    /// Show the diagram level of every task
    Levels,

    /// Show a task's prerequisites and dependents
    Deps { task: TaskId },

    /// List tasks that can become a prerequisite without creating a cycle
    Candidates { task: TaskId },

    /// Make TASK depend on PREREQUISITE
    AddDep { task: TaskId, prerequisite: TaskId },

    /// Remove the dependency of TASK on PREREQUISITE
    RemoveDep { task: TaskId, prerequisite: TaskId },

    /// Show the critical path
    Critical,

    /// Lay out the diagram and print it
    Draw {
        /// Print draw commands as JSON
        #[arg(long)]
        json: bool,

        /// Zoom factor (0.5 to 2.0)
        #[arg(long, default_value_t = 1.0)]
        zoom: f64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    pert::log::init_with_debug(cli.debug);
    if cli.debug {
        plog!("pert starting (debug mode enabled)");
    } else {
        plog!("pert starting");
    }

    let config = Config::load()?.with_overrides(cli.api_url.clone(), cli.project.clone());
    let session = SessionContext::new(Session::resolve(
        cli.token.clone(),
        std::env::var("PERT_TOKEN").ok(),
        config.token.clone(),
    ));
    let store = Arc::new(build_store(&config, &session)?);

    match cli.command {
        Some(command) => Runtime::new()?.block_on(run_command(command, &store, &config)),
        None => run_tui(config, session, store),
    }
}

fn build_store(config: &Config, session: &SessionContext) -> Result<DependencyStore> {
    let project = config.project.clone().ok_or_else(|| {
        Error::Validation(
            "No project selected: pass --project or set `project` in ~/.pert/pert.toml".into(),
        )
    })?;
    let client = HttpCollaborator::new(
        config.effective_api_url(),
        session.clone(),
        config.request_timeout(),
    )?;
    Ok(DependencyStore::new(
        Arc::new(client),
        ProjectId::new(project),
    ))
}

fn run_tui(config: Config, session: SessionContext, store: Arc<DependencyStore>) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let (state_tx, state_rx) = crossbeam_channel::bounded::<RenderState>(1);

    let shutdown_clone = shutdown.clone();
    let services = Services {
        config,
        session,
        store,
    };
    let logic_handle =
        thread::spawn(move || LogicThread::run(services, state_tx, shutdown_clone));

    let mut terminal = setup_terminal()?;
    let result = render_loop(&mut terminal, state_rx, &shutdown);

    shutdown.store(true, Ordering::SeqCst);
    let logic_result = logic_handle
        .join()
        .map_err(|_| Error::TaskJoin("logic thread panicked".into()))?;
    restore_terminal(&mut terminal)?;
    result.and(logic_result)
}

fn render_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    state_rx: Receiver<RenderState>,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut state = RenderState::default();
    let mut last_version: u64 = 0;
    let mut last_frame = Instant::now();
    let mut dirty = true;

    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match state_rx.try_recv() {
            Ok(s) => {
                dirty = dirty || s.version != last_version;
                state = s;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => break,
        }

        if last_frame.elapsed() < FRAME_DURATION {
            thread::sleep(Duration::from_micros(500));
            continue;
        }
        last_frame = Instant::now();

        if dirty {
            terminal.draw(|f| ui::draw(f, &state))?;
            last_version = state.version;
            dirty = false;
        }
    }
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    execute!(io::stdout(), EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.hide_cursor()?;
    terminal.clear()?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor()?;
    execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen)?;
    Ok(disable_raw_mode()?)
}

// -----------------------------------------------------------------------------
// Subcommands
// -----------------------------------------------------------------------------

async fn run_command(command: Command, store: &DependencyStore, config: &Config) -> Result<()> {
    plog!("Command: {:?}", command);
    let tasks = store.refresh().await?;

    match command {
        Command::Tasks => {
            println!("{:<10} {:<12} {:>5}  {:<30} DEPENDS ON", "ID", "STATUS", "DAYS", "TITLE");
            for task in tasks.iter() {
                println!(
                    "{:<10} {:<12} {:>5}  {:<30} {}",
                    task.id.short(),
                    task.status.to_string(),
                    task.estimated_duration.map_or("-".to_string(), |d| d.to_string()),
                    truncate_string(&task.title, 30),
                    format_ids(&task.depends_on_ids)
                );
            }
        }

        Command::Levels => {
            let levels = assign_levels(&tasks)?;
            for (id, level) in levels.iter() {
                println!("L{:<3} #{:<10} {}", level, id.short(), title_of(&tasks, &id));
            }
        }

        Command::Deps { task } => {
            println!("#{} {}", task.short(), title_of(&tasks, &task));
            println!();
            println!("Depends on:");
            print_task_list(&store.list_dependencies(&task)?);
            println!("Required by:");
            print_task_list(&store.list_dependents(&task)?);
        }

        Command::Candidates { task } => {
            print_task_list(&store.available_candidates(&task)?);
        }

        Command::AddDep { task, prerequisite } => {
            let updated = store.add_dependency(&task, &prerequisite).await?;
            println!(
                "#{} now depends on {}",
                updated.id.short(),
                format_ids(&updated.depends_on_ids)
            );
        }

        Command::RemoveDep { task, prerequisite } => {
            let updated = store.remove_dependency(&task, &prerequisite).await?;
            println!(
                "#{} now depends on {}",
                updated.id.short(),
                format_ids(&updated.depends_on_ids)
            );
        }

        Command::Critical => {
            let overlay = store.critical_overlay().await?;
            if overlay.path().is_empty() {
                println!("No critical path.");
                println!("Check that tasks have estimated durations, are linked by dependencies,");
                println!("and that at least one task has no prerequisites.");
                return Ok(());
            }
            println!(
                "Critical path: {} tasks | Total duration: {} days",
                overlay.path().len(),
                overlay.total_duration()
            );
            println!();
            for task in overlay.merge_into(&tasks).iter().filter(|t| overlay.on_path(&t.id)) {
                let cpm = &task.cpm;
                println!(
                    "#{:<10} {:<30} ES {:>4} EF {:>4} LS {:>4} LF {:>4} slack {:>3}",
                    task.id.short(),
                    truncate_string(&task.title, 30),
                    fmt_opt(cpm.early_start),
                    fmt_opt(cpm.early_finish),
                    fmt_opt(cpm.late_start),
                    fmt_opt(cpm.late_finish),
                    fmt_opt(cpm.slack)
                );
            }
        }

        Command::Draw { json, zoom } => {
            let mut chart = PertChart::new(config.layout);
            chart.viewport_mut().set_zoom(zoom);
            match store.critical_overlay().await {
                Ok(overlay) => chart.set_overlay(overlay),
                Err(e) => {
                    plog_warn!("critical path unavailable: {}", e);
                    eprintln!("warning: critical path unavailable: {}", e);
                }
            }
            let drawing = chart
                .draw(&tasks)
                .map_err(|e| Error::Validation(e.message))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&drawing.commands)?);
            } else {
                for position in drawing.layout.positions() {
                    let marker = if chart.overlay().is_critical_task(&position.task_id) {
                        "*"
                    } else {
                        " "
                    };
                    println!(
                        "{}L{:<3} ({:>6.0}, {:>6.0})  #{} {}",
                        marker,
                        position.level,
                        position.rect.x,
                        position.rect.y,
                        position.task_id.short(),
                        title_of(&tasks, &position.task_id)
                    );
                }
                let bounds = drawing.layout.bounds(chart.config());
                println!();
                println!(
                    "{} draw commands, diagram {:.0} x {:.0}",
                    drawing.commands.len(),
                    bounds.width,
                    bounds.height
                );
            }
        }
    }

    Ok(())
}

fn title_of(tasks: &[Task], id: &TaskId) -> String {
    tasks
        .iter()
        .find(|t| t.id == *id)
        .map(|t| t.title.clone())
        .unwrap_or_default()
}

fn print_task_list(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("  (none)");
    }
    for task in tasks {
        println!("  #{:<10} {}", task.id.short(), task.title);
    }
}

fn format_ids(ids: &[TaskId]) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.iter()
        .map(|id| format!("#{}", id.short()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn fmt_opt(value: Option<u32>) -> String {
    value.map_or("-".to_string(), |v| v.to_string())
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

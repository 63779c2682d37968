use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::Sender;
use crossterm::event::{self, Event};
use tokio::runtime::Runtime;
use tokio::sync::mpsc;

use crate::actors::{ActorHandle, RefreshActor, SessionWatchActor};
use crate::config::Config;
use crate::render::RenderState;
use crate::session::SessionContext;
use crate::store::DependencyStore;
use crate::tea::{update, Command, Message, Model};
use crate::util::with_timeout;
use crate::{plog, plog_debug, plog_warn, Result};

const MAX_BG_MESSAGES: usize = 50;

/// Everything the logic thread needs to talk to the outside world.
pub struct Services {
    pub config: Config,
    pub session: SessionContext,
    pub store: Arc<DependencyStore>,
}

pub struct LogicThread;

impl LogicThread {
    pub fn run(
        services: Services,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        Runtime::new()?.block_on(Self::run_async(services, state_tx, shutdown))
    }

    async fn run_async(
        services: Services,
        state_tx: Sender<RenderState>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<()> {
        let Services {
            config,
            session,
            store,
        } = services;
        plog_debug!(
            "LogicThread::run_async api_url={} project={}",
            config.effective_api_url(),
            store.project()
        );

        let mut model = Model::new(
            store.project().to_string(),
            config.layout,
            session.current().is_authenticated(),
        );
        let (width, height) = crossterm::terminal::size()?;
        update(&mut model, Message::Resize(width, height));

        let (msg_tx, mut msg_rx) = mpsc::unbounded_channel::<Message>();
        let actors = spawn_actors(msg_tx.clone(), &config, &session);
        let timeout = config.request_timeout();

        execute_command(Command::LoadTasks, &store, &session, &msg_tx, timeout);
        send_state(&state_tx, &model);

        loop {
            if shutdown.load(Ordering::Relaxed) {
                break;
            }

            // Terminal input (priority)
            while event::poll(Duration::ZERO)? {
                let msg = match event::read()? {
                    Event::Key(key) => Message::Key(key),
                    Event::Mouse(mouse) => Message::Mouse(mouse),
                    Event::Resize(w, h) => Message::Resize(w, h),
                    _ => continue,
                };
                for cmd in update(&mut model, msg) {
                    if execute_command(cmd, &store, &session, &msg_tx, timeout) {
                        shutdown.store(true, Ordering::Relaxed);
                        shutdown_actors(&actors);
                        return Ok(());
                    }
                }

                if model.dirty {
                    send_state(&state_tx, &model);
                    model.dirty = false;
                }
            }

            // Background messages (bounded)
            for _ in 0..MAX_BG_MESSAGES {
                let Ok(msg) = msg_rx.try_recv() else { break };
                for cmd in update(&mut model, msg) {
                    if execute_command(cmd, &store, &session, &msg_tx, timeout) {
                        shutdown.store(true, Ordering::Relaxed);
                        shutdown_actors(&actors);
                        return Ok(());
                    }
                }
            }

            if model.dirty {
                send_state(&state_tx, &model);
                model.dirty = false;
            }

            tokio::time::sleep(Duration::from_millis(1)).await;
        }

        shutdown_actors(&actors);
        Ok(())
    }
}

/// Run one command. Collaborator calls are spawned and report back as
/// messages; whichever response arrives last is applied last.
///
/// Returns true when the app should quit.
fn execute_command(
    cmd: Command,
    store: &Arc<DependencyStore>,
    session: &SessionContext,
    msg_tx: &mpsc::UnboundedSender<Message>,
    timeout: Duration,
) -> bool {
    match cmd {
        Command::LoadTasks => {
            plog_debug!("Command::LoadTasks");
            let store = store.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let msg = match with_timeout(timeout, store.refresh()).await {
                    Ok(snapshot) => Message::TasksLoaded(snapshot),
                    Err(e) => Message::TasksFailed(e),
                };
                let _ = tx.send(msg);
            });
        }

        Command::LoadCritical => {
            plog_debug!("Command::LoadCritical");
            let store = store.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let msg = match with_timeout(timeout, store.critical_overlay()).await {
                    Ok(overlay) => Message::CriticalLoaded(overlay),
                    Err(e) => Message::CriticalFailed(e),
                };
                let _ = tx.send(msg);
            });
        }

        Command::AddDependency { task, prerequisite } => {
            plog_debug!("Command::AddDependency task={} prerequisite={}", task, prerequisite);
            let store = store.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let msg = match with_timeout(timeout, store.add_dependency(&task, &prerequisite)).await {
                    Ok(updated) => Message::DependencyAdded(updated),
                    Err(error) => Message::DependencyFailed {
                        task,
                        prerequisite,
                        error,
                    },
                };
                let _ = tx.send(msg);
            });
        }

        Command::RemoveDependency { task, prerequisite } => {
            plog_debug!("Command::RemoveDependency task={} prerequisite={}", task, prerequisite);
            let store = store.clone();
            let tx = msg_tx.clone();
            tokio::spawn(async move {
                let msg =
                    match with_timeout(timeout, store.remove_dependency(&task, &prerequisite)).await {
                        Ok(updated) => Message::DependencyRemoved(updated),
                        Err(error) => Message::DependencyFailed {
                            task,
                            prerequisite,
                            error,
                        },
                    };
                let _ = tx.send(msg);
            });
        }

        Command::ClearSession => {
            plog_warn!("Command::ClearSession: server rejected the token");
            session.clear();
        }

        Command::SelectionChanged(change) => {
            plog!(
                "Selection changed: {} -> {}",
                change.previous.map_or("none".to_string(), |id| id.to_string()),
                change.current.map_or("none".to_string(), |id| id.to_string())
            );
        }

        Command::Quit => {
            plog_debug!("Command::Quit");
            return true;
        }
    }

    false
}

fn send_state(state_tx: &Sender<RenderState>, model: &Model) {
    let _ = state_tx.try_send(model.snapshot());
}

fn spawn_actors(
    msg_tx: mpsc::UnboundedSender<Message>,
    config: &Config,
    session: &SessionContext,
) -> Vec<ActorHandle> {
    let mut actors = vec![SessionWatchActor::new(msg_tx.clone(), session.clone()).spawn()];
    if let Some(interval) = config.refresh_interval() {
        actors.push(RefreshActor::new(msg_tx, interval).spawn());
    }
    plog_debug!("Spawned {} actors", actors.len());
    actors
}

fn shutdown_actors(actors: &[ActorHandle]) {
    plog_debug!("Shutting down {} actors", actors.len());
    for actor in actors {
        actor.shutdown();
    }
}

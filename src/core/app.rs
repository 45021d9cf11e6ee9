//! Main application orchestrator.

use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::KeyEvent;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;

use crate::actions::{ActionDispatcher, ContainerAction};
use crate::config::Config;
use crate::core::events::{Event, EventHandler, EventResult};
use crate::core::snapshot::SnapshotBuilder;
use crate::core::state::{handle_command_key, AppState, KeyOutcome, StatusLevel};
use crate::integrations::docker::ContainerRuntime;
use crate::integrations::ports::IptablesNat;
use crate::integrations::system::SystemMonitor;
use crate::ui::renderer::Renderer;
use crate::ui::theme::Theme;

pub struct App {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    state: AppState,
    monitor: SystemMonitor,
    snapshot: Arc<SnapshotBuilder>,
    dispatcher: Arc<ActionDispatcher>,
    event_tx: mpsc::UnboundedSender<Event>,
    refresh_interval: Duration,
}

impl App {
    pub fn new(runtime: Arc<dyn ContainerRuntime>, config: Config) -> Result<Self> {
        let backend = CrosstermBackend::new(std::io::stdout());
        let terminal = Terminal::new(backend)?;

        let theme = Theme::from_name(&config.display.theme);
        let state = AppState::new(theme);

        let snapshot = Arc::new(SnapshotBuilder::new(
            runtime.clone(),
            Arc::new(IptablesNat),
            config.refresh.stats_workers,
            Duration::from_millis(config.refresh.call_timeout_ms),
        ));
        let dispatcher = Arc::new(ActionDispatcher::new(runtime));

        // Placeholder sender, replaced in run().
        let (event_tx, _) = mpsc::unbounded_channel::<Event>();

        Ok(Self {
            terminal,
            state,
            monitor: SystemMonitor::new(),
            snapshot,
            dispatcher,
            event_tx,
            refresh_interval: Duration::from_secs(config.refresh.interval_secs.max(1)),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        self.setup_terminal()?;

        let (mut event_handler, event_tx) = EventHandler::new();
        self.event_tx = event_tx.clone();
        EventHandler::spawn_sources(event_tx, self.refresh_interval);

        // Prime data before the first frame.
        self.refresh();
        self.render()?;

        let result = self.event_loop(&mut event_handler).await;

        self.shutdown()?;
        result
    }

    fn setup_terminal(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::EnterAlternateScreen,
            crossterm::cursor::Hide,
        )?;
        Ok(())
    }

    fn shutdown(&mut self) -> Result<()> {
        crossterm::terminal::disable_raw_mode()?;
        crossterm::execute!(
            std::io::stdout(),
            crossterm::terminal::LeaveAlternateScreen,
            crossterm::cursor::Show,
        )?;
        Ok(())
    }

    async fn event_loop(&mut self, event_handler: &mut EventHandler) -> Result<()> {
        loop {
            let Some(event) = event_handler.next().await else {
                break;
            };

            match self.handle_event(event)? {
                EventResult::Continue => {}
                EventResult::Quit => break,
            }
        }
        Ok(())
    }

    fn handle_event(&mut self, event: Event) -> Result<EventResult> {
        match event {
            Event::Key(key) => return self.handle_key(key),
            Event::Resize => {
                self.render()?;
            }
            Event::Tick => {
                self.state.clear_expired_status();
                self.render()?;
            }
            Event::Refresh => {
                self.refresh();
            }
            Event::SnapshotReady(result) => {
                self.state.refreshing = false;
                match result {
                    Ok(snapshot) => self.state.apply_snapshot(snapshot),
                    Err(e) => {
                        tracing::warn!("snapshot failed: {:#}", e);
                        self.state.runtime_error = Some(format!("Runtime unavailable: {:#}", e));
                    }
                }
                self.render()?;
            }
            Event::ActionCompleted(outcome) => {
                self.state
                    .set_status(outcome.message, StatusLevel::from(outcome.level));
                // The action may have changed the world; refresh now
                // instead of waiting for the next interval.
                self.refresh();
                self.render()?;
            }
        }
        Ok(EventResult::Continue)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Result<EventResult> {
        match handle_command_key(&mut self.state, key) {
            KeyOutcome::Quit => return Ok(EventResult::Quit),
            KeyOutcome::Ignored => {}
            KeyOutcome::Redraw => {
                self.render()?;
            }
            KeyOutcome::Refresh => {
                self.state
                    .set_status("Container list updated.", StatusLevel::Info);
                self.refresh();
                self.render()?;
            }
            KeyOutcome::Dispatch { action, id, name } => {
                self.dispatch(action, id, name);
                self.render()?;
            }
        }
        Ok(EventResult::Continue)
    }

    /// Sample host metrics and kick off one snapshot rebuild. Skipped
    /// while a rebuild is already in flight so a slow runtime cannot
    /// pile up work.
    fn refresh(&mut self) {
        self.state.metrics = self.monitor.sample();

        if self.state.refreshing {
            return;
        }
        self.state.refreshing = true;

        let builder = self.snapshot.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let result = builder.build().await;
            let _ = tx.send(Event::SnapshotReady(result));
        });
    }

    /// Run one lifecycle command in the background; the outcome comes
    /// back as an event so the loop stays responsive.
    fn dispatch(&mut self, action: ContainerAction, id: String, name: String) {
        if action == ContainerAction::Stop {
            self.state.set_status(
                "Stopping container, this may take a minute...",
                StatusLevel::Info,
            );
        }

        let dispatcher = self.dispatcher.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
            let outcome = dispatcher.dispatch(action, &id, &name).await;
            let _ = tx.send(Event::ActionCompleted(outcome));
        });
    }

    fn render(&mut self) -> Result<()> {
        let state = &self.state;
        self.terminal.draw(|frame| {
            Renderer::render(frame, state);
        })?;
        Ok(())
    }
}

//! Event plumbing for the render/input loop.
//!
//! All sources (terminal input, render tick, refresh tick, background
//! task completions) funnel into one mpsc channel consumed by the main
//! loop, so state mutation and rendering never race.

use std::time::Duration;

use crossterm::event::KeyEvent;
use tokio::sync::mpsc;

use crate::actions::ActionOutcome;
use crate::core::snapshot::ContainerRecord;

/// Render tick cadence; refresh cadence comes from config.
pub const RENDER_TICK: Duration = Duration::from_millis(250);

#[derive(Debug)]
pub enum Event {
    // Input
    Key(KeyEvent),
    Resize,

    // Timing
    /// Redraw and housekeeping (status expiry).
    Tick,
    /// Kick off a metrics sample + snapshot rebuild.
    Refresh,

    // Background task completions, joined on the main loop
    SnapshotReady(anyhow::Result<Vec<ContainerRecord>>),
    ActionCompleted(ActionOutcome),
}

/// Result of handling one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResult {
    Continue,
    Quit,
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> (Self, mpsc::UnboundedSender<Event>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { rx }, tx)
    }

    /// Start the event source tasks. They die with the channel when the
    /// loop quits.
    pub fn spawn_sources(event_tx: mpsc::UnboundedSender<Event>, refresh_interval: Duration) {
        tokio::spawn(Self::terminal_events(event_tx.clone()));
        tokio::spawn(Self::tick_events(event_tx.clone(), RENDER_TICK, || Event::Tick));
        tokio::spawn(Self::tick_events(event_tx, refresh_interval, || {
            Event::Refresh
        }));
    }

    async fn terminal_events(tx: mpsc::UnboundedSender<Event>) {
        use crossterm::event::{Event as CrosstermEvent, EventStream};
        use futures::StreamExt;

        let mut reader = EventStream::new();
        while let Some(event_result) = reader.next().await {
            let event = match event_result {
                Ok(CrosstermEvent::Key(key)) => Event::Key(key),
                Ok(CrosstermEvent::Resize(_, _)) => Event::Resize,
                _ => continue,
            };
            if tx.send(event).is_err() {
                break;
            }
        }
    }

    async fn tick_events(
        tx: mpsc::UnboundedSender<Event>,
        interval: Duration,
        event: fn() -> Event,
    ) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            if tx.send(event()).is_err() {
                break;
            }
        }
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}

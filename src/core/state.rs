//! Application state: the container list, the selection, and the
//! keystroke-to-command state machine.
//!
//! All of this is owned by the main loop; background tasks only hand
//! results back over the event channel.

use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::actions::{ContainerAction, OutcomeLevel};
use crate::core::snapshot::ContainerRecord;
use crate::integrations::system::HostMetrics;
use crate::ui::theme::Theme;

/// How long a transient status line stays visible.
const STATUS_TTL_MS: i64 = 5_000;

/// Top-level input mode. Rename and delete are explicit sub-states so
/// illegal transitions (e.g. confirming a delete mid-rename) cannot be
/// expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppMode {
    Dashboard,
    RenameInput {
        target_id: String,
        target_name: String,
        buffer: String,
    },
    ConfirmDelete {
        target_id: String,
        target_name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Success,
    Error,
}

impl From<OutcomeLevel> for StatusLevel {
    fn from(level: OutcomeLevel) -> Self {
        match level {
            OutcomeLevel::Success => Self::Success,
            OutcomeLevel::Error => Self::Error,
        }
    }
}

/// Short-lived status line; cleared after a few ticks.
#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub created_at: DateTime<Utc>,
}

impl StatusMessage {
    pub fn new(text: impl Into<String>, level: StatusLevel) -> Self {
        Self {
            text: text.into(),
            level,
            created_at: Utc::now(),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at).num_milliseconds() > STATUS_TTL_MS
    }
}

/// The ordered container list plus the cursor. Rebuilt every tick from
/// a fresh snapshot; the selection is carried by container identity,
/// not by index.
#[derive(Debug, Clone, Default)]
pub struct ListState {
    pub containers: Vec<ContainerRecord>,
    pub selected: Option<usize>,
}

impl ListState {
    pub fn selected_container(&self) -> Option<&ContainerRecord> {
        self.selected.and_then(|i| self.containers.get(i))
    }

    /// Replace the list with a fresh snapshot, keeping the cursor on
    /// the same container when it survived, else clamping.
    pub fn reconcile(&mut self, snapshot: Vec<ContainerRecord>) {
        let previous_id = self.selected_container().map(|c| c.id.clone());
        let previous_index = self.selected;

        self.containers = snapshot;
        self.selected = if self.containers.is_empty() {
            None
        } else if let Some(index) = previous_id
            .and_then(|id| self.containers.iter().position(|c| c.id == id))
        {
            Some(index)
        } else {
            // The selected container is gone (or nothing was selected):
            // prefer the same position, else the last row.
            let last = self.containers.len() - 1;
            Some(previous_index.unwrap_or(0).min(last))
        };
    }

    pub fn select_up(&mut self) {
        if let Some(i) = self.selected {
            self.selected = Some(i.saturating_sub(1));
        }
    }

    pub fn select_down(&mut self) {
        if let Some(i) = self.selected {
            let last = self.containers.len().saturating_sub(1);
            self.selected = Some((i + 1).min(last));
        }
    }
}

/// Everything the render step needs, owned by the loop.
pub struct AppState {
    pub mode: AppMode,
    pub list: ListState,
    pub metrics: HostMetrics,
    pub status: Option<StatusMessage>,
    /// Persistent banner while the runtime is unreachable.
    pub runtime_error: Option<String>,
    pub refreshing: bool,
    pub theme: Theme,
}

impl AppState {
    pub fn new(theme: Theme) -> Self {
        Self {
            mode: AppMode::Dashboard,
            list: ListState::default(),
            metrics: HostMetrics::zeroed(),
            status: None,
            runtime_error: None,
            refreshing: false,
            theme,
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage::new(text, level));
    }

    pub fn clear_expired_status(&mut self) {
        let now = Utc::now();
        if self.status.as_ref().is_some_and(|s| s.is_expired(now)) {
            self.status = None;
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: Vec<ContainerRecord>) {
        self.runtime_error = None;
        self.list.reconcile(snapshot);
    }
}

/// What the loop should do after one keystroke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOutcome {
    Ignored,
    Redraw,
    Refresh,
    Dispatch {
        action: ContainerAction,
        id: String,
        name: String,
    },
    Quit,
}

/// The full (mode, key) transition function. Pure over `AppState` so
/// the confirmation machinery is testable without a terminal.
pub fn handle_command_key(state: &mut AppState, key: KeyEvent) -> KeyOutcome {
    // Ctrl-C quits from any mode.
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    match state.mode.clone() {
        AppMode::Dashboard => handle_dashboard_key(state, key),
        AppMode::RenameInput {
            target_id,
            target_name,
            buffer,
        } => handle_rename_key(state, key, target_id, target_name, buffer),
        AppMode::ConfirmDelete {
            target_id,
            target_name,
        } => handle_confirm_delete_key(state, key, target_id, target_name),
    }
}

fn handle_dashboard_key(state: &mut AppState, key: KeyEvent) -> KeyOutcome {
    let code = match key.code {
        KeyCode::Char(c) => KeyCode::Char(c.to_ascii_lowercase()),
        other => other,
    };

    match code {
        KeyCode::Char('q') => KeyOutcome::Quit,
        KeyCode::Up | KeyCode::Char('k') => {
            state.list.select_up();
            KeyOutcome::Redraw
        }
        KeyCode::Down | KeyCode::Char('j') => {
            state.list.select_down();
            KeyOutcome::Redraw
        }
        KeyCode::Char('u') => KeyOutcome::Refresh,
        KeyCode::Char('s') => dispatch_selected(state, ContainerAction::Start),
        KeyCode::Char('x') => dispatch_selected(state, ContainerAction::Stop),
        KeyCode::Char('r') => dispatch_selected(state, ContainerAction::Restart),
        KeyCode::Char('n') => {
            if let Some(container) = state.list.selected_container() {
                state.mode = AppMode::RenameInput {
                    target_id: container.id.clone(),
                    target_name: container.name.clone(),
                    buffer: String::new(),
                };
                KeyOutcome::Redraw
            } else {
                KeyOutcome::Ignored
            }
        }
        KeyCode::Char('d') => {
            if let Some(container) = state.list.selected_container() {
                state.mode = AppMode::ConfirmDelete {
                    target_id: container.id.clone(),
                    target_name: container.name.clone(),
                };
                KeyOutcome::Redraw
            } else {
                KeyOutcome::Ignored
            }
        }
        _ => KeyOutcome::Ignored,
    }
}

fn handle_rename_key(
    state: &mut AppState,
    key: KeyEvent,
    target_id: String,
    target_name: String,
    mut buffer: String,
) -> KeyOutcome {
    match key.code {
        KeyCode::Esc => {
            // Typed buffer is discarded; no runtime call was made.
            state.mode = AppMode::Dashboard;
            KeyOutcome::Redraw
        }
        KeyCode::Enter => {
            state.mode = AppMode::Dashboard;
            if buffer.trim().is_empty() {
                state.set_status(
                    "Rename rejected: name must not be empty.",
                    StatusLevel::Error,
                );
                KeyOutcome::Redraw
            } else {
                KeyOutcome::Dispatch {
                    action: ContainerAction::Rename {
                        new_name: buffer.trim().to_string(),
                    },
                    id: target_id,
                    name: target_name,
                }
            }
        }
        KeyCode::Backspace => {
            buffer.pop();
            state.mode = AppMode::RenameInput {
                target_id,
                target_name,
                buffer,
            };
            KeyOutcome::Redraw
        }
        KeyCode::Char(c) => {
            buffer.push(c);
            state.mode = AppMode::RenameInput {
                target_id,
                target_name,
                buffer,
            };
            KeyOutcome::Redraw
        }
        _ => KeyOutcome::Ignored,
    }
}

fn handle_confirm_delete_key(
    state: &mut AppState,
    key: KeyEvent,
    target_id: String,
    target_name: String,
) -> KeyOutcome {
    state.mode = AppMode::Dashboard;
    match key.code {
        // The second confirming keystroke; anything else cancels.
        KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Char('y') | KeyCode::Char('Y')
        | KeyCode::Enter => KeyOutcome::Dispatch {
            action: ContainerAction::Remove,
            id: target_id,
            name: target_name,
        },
        _ => KeyOutcome::Redraw,
    }
}

fn dispatch_selected(state: &mut AppState, action: ContainerAction) -> KeyOutcome {
    match state.list.selected_container() {
        Some(container) => KeyOutcome::Dispatch {
            action,
            id: container.id.clone(),
            name: container.name.clone(),
        },
        None => KeyOutcome::Ignored,
    }
}

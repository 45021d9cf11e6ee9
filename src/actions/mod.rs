//! Container lifecycle command dispatch.
//!
//! Every outcome, success or failure, becomes a status line for the
//! render step. Runtime errors are never propagated past here; the
//! next natural refresh tick is the retry policy.

use std::sync::Arc;

use crate::integrations::docker::ContainerRuntime;

/// A runtime mutation requested against the selected container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerAction {
    Start,
    Stop,
    Restart,
    Rename { new_name: String },
    Remove,
}

impl ContainerAction {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Rename { .. } => "rename",
            Self::Remove => "remove",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeLevel {
    Success,
    Error,
}

/// What the operator sees on the status line after a dispatch.
#[derive(Debug, Clone)]
pub struct ActionOutcome {
    pub message: String,
    pub level: OutcomeLevel,
}

impl ActionOutcome {
    fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: OutcomeLevel::Success,
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: OutcomeLevel::Error,
        }
    }
}

pub struct ActionDispatcher {
    runtime: Arc<dyn ContainerRuntime>,
}

impl ActionDispatcher {
    pub fn new(runtime: Arc<dyn ContainerRuntime>) -> Self {
        Self { runtime }
    }

    /// Execute one action against the container identified by `id`.
    /// `name` is only used for operator-facing messages.
    pub async fn dispatch(&self, action: ContainerAction, id: &str, name: &str) -> ActionOutcome {
        let result = match &action {
            ContainerAction::Start => self.runtime.start(id).await,
            ContainerAction::Stop => self.runtime.stop(id).await,
            ContainerAction::Restart => self.runtime.restart(id).await,
            ContainerAction::Rename { new_name } => {
                // Rejected locally; no runtime call for an empty name.
                if new_name.trim().is_empty() {
                    return ActionOutcome::error("Rename rejected: name must not be empty.");
                }
                self.runtime.rename(id, new_name.trim()).await
            }
            ContainerAction::Remove => self.runtime.remove(id).await,
        };

        match result {
            Ok(()) => ActionOutcome::success(match &action {
                ContainerAction::Rename { new_name } => {
                    format!("Successfully renamed {} to {}.", name, new_name.trim())
                }
                ContainerAction::Remove => {
                    format!("Successfully removed container {}.", name)
                }
                _ => format!("Successfully sent '{}' command to {}.", action.verb(), name),
            }),
            Err(e) => ActionOutcome::error(format!("Error: {:#}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::snapshot::test_support::{container, FakeRuntime};
    use crate::integrations::docker::{
        ContainerDetails, ContainerStatus, ContainerSummary,
    };
    use anyhow::Result;
    use async_trait::async_trait;

    /// Fails the test if any runtime call is made at all.
    struct UntouchableRuntime;

    #[async_trait]
    impl crate::integrations::docker::ContainerRuntime for UntouchableRuntime {
        async fn ping(&self) -> Result<()> {
            panic!("unexpected runtime call");
        }
        async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
            panic!("unexpected runtime call");
        }
        async fn inspect(&self, _id: &str) -> Result<ContainerDetails> {
            panic!("unexpected runtime call");
        }
        async fn memory_usage(&self, _id: &str) -> Result<u64> {
            panic!("unexpected runtime call");
        }
        async fn start(&self, _id: &str) -> Result<()> {
            panic!("unexpected runtime call");
        }
        async fn stop(&self, _id: &str) -> Result<()> {
            panic!("unexpected runtime call");
        }
        async fn restart(&self, _id: &str) -> Result<()> {
            panic!("unexpected runtime call");
        }
        async fn rename(&self, _id: &str, _new_name: &str) -> Result<()> {
            panic!("unexpected runtime call");
        }
        async fn remove(&self, _id: &str) -> Result<()> {
            panic!("unexpected runtime call");
        }
    }

    #[tokio::test]
    async fn stop_on_already_stopped_container_is_a_no_op_success() {
        let runtime = Arc::new(FakeRuntime::with(vec![
            container("a1", "web", ContainerStatus::Exited),
            container("b2", "db", ContainerStatus::Running),
        ]));
        let dispatcher = ActionDispatcher::new(runtime.clone());

        let outcome = dispatcher
            .dispatch(ContainerAction::Stop, "a1", "web")
            .await;
        assert_eq!(outcome.level, OutcomeLevel::Success);

        // The other container's record is untouched.
        let containers = runtime.containers.lock().unwrap();
        let db = containers.iter().find(|c| c.summary.id == "b2").unwrap();
        assert_eq!(db.summary.status, ContainerStatus::Running);
    }

    #[tokio::test]
    async fn empty_rename_is_rejected_before_any_runtime_call() {
        let dispatcher = ActionDispatcher::new(Arc::new(UntouchableRuntime));

        let outcome = dispatcher
            .dispatch(
                ContainerAction::Rename {
                    new_name: "   ".to_string(),
                },
                "a1",
                "web",
            )
            .await;
        assert_eq!(outcome.level, OutcomeLevel::Error);
    }

    #[tokio::test]
    async fn rename_trims_and_reports_the_new_name() {
        let runtime = Arc::new(FakeRuntime::with(vec![container(
            "a1",
            "web",
            ContainerStatus::Running,
        )]));
        let dispatcher = ActionDispatcher::new(runtime.clone());

        let outcome = dispatcher
            .dispatch(
                ContainerAction::Rename {
                    new_name: " web2 ".to_string(),
                },
                "a1",
                "web",
            )
            .await;
        assert_eq!(outcome.level, OutcomeLevel::Success);
        assert!(outcome.message.contains("web2"));

        let containers = runtime.containers.lock().unwrap();
        assert_eq!(containers[0].summary.name, "web2");
    }

    #[tokio::test]
    async fn runtime_error_surfaces_as_non_fatal_status() {
        let runtime = Arc::new(FakeRuntime::with(vec![]));
        let dispatcher = ActionDispatcher::new(runtime);

        let outcome = dispatcher
            .dispatch(ContainerAction::Remove, "ghost", "ghost")
            .await;
        assert_eq!(outcome.level, OutcomeLevel::Error);
        assert!(outcome.message.starts_with("Error:"));
    }
}

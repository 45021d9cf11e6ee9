//! Container snapshot assembly.
//!
//! One snapshot per refresh tick: list every container the runtime
//! knows about, then fan out per-container inspect/stats calls under a
//! bounded worker cap so a large fleet still fits in one tick. A
//! failure on any single container degrades that record instead of
//! aborting the refresh.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio::time::timeout;

use crate::integrations::docker::{
    ContainerRuntime, ContainerStatus, ContainerSummary, PortMapping,
};
use crate::integrations::ports::{resolve_ports, NatTable};

/// Fully assembled view of one container for a single refresh. The id
/// is the only field that survives across refreshes; everything else
/// is replaced wholesale each tick.
#[derive(Debug, Clone)]
pub struct ContainerRecord {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: ContainerStatus,
    /// Only meaningful while running.
    pub uptime: Option<Duration>,
    pub ports: Vec<PortMapping>,
    /// Zero unless running and the stats call succeeded.
    pub memory_bytes: u64,
}

impl ContainerRecord {
    pub fn short_id(&self) -> &str {
        &self.id[..self.id.len().min(12)]
    }

    pub fn uptime_display(&self) -> String {
        match self.uptime {
            Some(d) => format_uptime(d),
            None => "-".to_string(),
        }
    }

    pub fn ports_display(&self) -> String {
        if self.ports.is_empty() {
            "-".to_string()
        } else {
            self.ports
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(",")
        }
    }
}

/// Compact `1d2h3m` / `42s` style uptime.
pub fn format_uptime(uptime: Duration) -> String {
    let total = uptime.as_secs();
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;

    let mut parts = String::new();
    if days > 0 {
        parts.push_str(&format!("{}d", days));
    }
    if hours > 0 {
        parts.push_str(&format!("{}h", hours));
    }
    if minutes > 0 {
        parts.push_str(&format!("{}m", minutes));
    }
    if parts.is_empty() {
        parts.push_str(&format!("{}s", total % 60));
    }
    parts
}

pub struct SnapshotBuilder {
    runtime: Arc<dyn ContainerRuntime>,
    nat: Arc<dyn NatTable>,
    worker_cap: usize,
    call_timeout: Duration,
}

impl SnapshotBuilder {
    pub fn new(
        runtime: Arc<dyn ContainerRuntime>,
        nat: Arc<dyn NatTable>,
        worker_cap: usize,
        call_timeout: Duration,
    ) -> Self {
        Self {
            runtime,
            nat,
            worker_cap: worker_cap.max(1),
            call_timeout,
        }
    }

    /// Build one ordered snapshot. `Err` only when the listing itself
    /// fails (runtime unreachable); per-container failures degrade.
    pub async fn build(&self) -> Result<Vec<ContainerRecord>> {
        let summaries = self
            .runtime
            .list_containers()
            .await
            .context("listing containers")?;

        let cap = self.worker_cap.min(summaries.len().max(1));
        let mut records: Vec<ContainerRecord> = stream::iter(summaries)
            .map(|summary| self.assemble(summary))
            .buffer_unordered(cap)
            .collect()
            .await;

        // Stable order so the cursor tracks across refreshes.
        records.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(records)
    }

    async fn assemble(&self, summary: ContainerSummary) -> ContainerRecord {
        let running = summary.status == ContainerStatus::Running;

        let details = if running {
            match timeout(self.call_timeout, self.runtime.inspect(&summary.id)).await {
                Ok(Ok(details)) => details,
                Ok(Err(e)) => {
                    tracing::debug!(container = %summary.id, "inspect failed: {}", e);
                    Default::default()
                }
                Err(_) => {
                    tracing::debug!(container = %summary.id, "inspect timed out");
                    Default::default()
                }
            }
        } else {
            Default::default()
        };

        let memory_bytes = if running {
            match timeout(self.call_timeout, self.runtime.memory_usage(&summary.id)).await {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => {
                    tracing::debug!(container = %summary.id, "stats failed: {}", e);
                    0
                }
                Err(_) => 0,
            }
        } else {
            0
        };

        let ports = match timeout(
            self.call_timeout,
            resolve_ports(
                &summary.ports,
                details.ip_address.as_deref(),
                self.nat.as_ref(),
            ),
        )
        .await
        {
            Ok(ports) => ports,
            Err(_) => summary.ports.clone(),
        };

        let uptime = if running {
            details
                .started_at
                .and_then(|started| (Utc::now() - started).to_std().ok())
        } else {
            None
        };

        ContainerRecord {
            id: summary.id,
            name: summary.name,
            image: summary.image,
            status: summary.status,
            uptime,
            ports,
            memory_bytes,
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::collections::HashSet;
    use std::sync::Mutex;

    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use chrono::{Duration as ChronoDuration, Utc};

    use crate::integrations::docker::{
        ContainerDetails, ContainerRuntime, ContainerStatus, ContainerSummary,
    };
    use crate::integrations::ports::{NatError, NatRule, NatTable};

    #[derive(Debug, Clone)]
    pub struct FakeContainer {
        pub summary: ContainerSummary,
        pub ip: Option<String>,
        pub memory_bytes: u64,
    }

    /// In-memory runtime whose lifecycle calls mutate the listing, so
    /// tests can drive a dispatch-then-refresh cycle.
    #[derive(Default)]
    pub struct FakeRuntime {
        pub containers: Mutex<Vec<FakeContainer>>,
        /// Ids whose stats calls fail, simulating exit-between-calls races.
        pub broken_stats: Mutex<HashSet<String>>,
    }

    impl FakeRuntime {
        pub fn with(containers: Vec<FakeContainer>) -> Self {
            Self {
                containers: Mutex::new(containers),
                broken_stats: Mutex::new(HashSet::new()),
            }
        }

        fn set_status(&self, id: &str, status: ContainerStatus) -> Result<()> {
            let mut containers = self.containers.lock().unwrap();
            match containers.iter_mut().find(|c| c.summary.id == id) {
                Some(c) => {
                    c.summary.status = status;
                    Ok(())
                }
                None => bail!("no such container: {id}"),
            }
        }
    }

    #[async_trait]
    impl ContainerRuntime for FakeRuntime {
        async fn ping(&self) -> Result<()> {
            Ok(())
        }

        async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
            Ok(self
                .containers
                .lock()
                .unwrap()
                .iter()
                .map(|c| c.summary.clone())
                .collect())
        }

        async fn inspect(&self, id: &str) -> Result<ContainerDetails> {
            let containers = self.containers.lock().unwrap();
            let container = containers
                .iter()
                .find(|c| c.summary.id == id)
                .ok_or_else(|| anyhow::anyhow!("no such container: {id}"))?;
            Ok(ContainerDetails {
                ip_address: container.ip.clone(),
                started_at: Some(Utc::now() - ChronoDuration::minutes(5)),
            })
        }

        async fn memory_usage(&self, id: &str) -> Result<u64> {
            if self.broken_stats.lock().unwrap().contains(id) {
                bail!("container exited during stats call");
            }
            let containers = self.containers.lock().unwrap();
            Ok(containers
                .iter()
                .find(|c| c.summary.id == id)
                .map(|c| c.memory_bytes)
                .unwrap_or(0))
        }

        async fn start(&self, id: &str) -> Result<()> {
            self.set_status(id, ContainerStatus::Running)
        }

        async fn stop(&self, id: &str) -> Result<()> {
            // Docker answers 304 for an already-stopped container; the
            // client treats that as success.
            self.set_status(id, ContainerStatus::Exited)
        }

        async fn restart(&self, id: &str) -> Result<()> {
            self.set_status(id, ContainerStatus::Running)
        }

        async fn rename(&self, id: &str, new_name: &str) -> Result<()> {
            let mut containers = self.containers.lock().unwrap();
            match containers.iter_mut().find(|c| c.summary.id == id) {
                Some(c) => {
                    c.summary.name = new_name.to_string();
                    Ok(())
                }
                None => bail!("no such container: {id}"),
            }
        }

        async fn remove(&self, id: &str) -> Result<()> {
            let mut containers = self.containers.lock().unwrap();
            let before = containers.len();
            containers.retain(|c| c.summary.id != id);
            if containers.len() == before {
                bail!("no such container: {id}");
            }
            Ok(())
        }
    }

    pub struct EmptyNat;

    #[async_trait]
    impl NatTable for EmptyNat {
        async fn rules(&self) -> Result<Vec<NatRule>, NatError> {
            Ok(Vec::new())
        }
    }

    pub fn container(id: &str, name: &str, status: ContainerStatus) -> FakeContainer {
        FakeContainer {
            summary: ContainerSummary {
                id: id.to_string(),
                name: name.to_string(),
                image: format!("{name}:latest"),
                status,
                ports: Vec::new(),
            },
            ip: Some("172.17.0.2".to_string()),
            memory_bytes: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use pretty_assertions::assert_eq;

    fn builder(runtime: Arc<FakeRuntime>) -> SnapshotBuilder {
        SnapshotBuilder::new(runtime, Arc::new(EmptyNat), 4, Duration::from_millis(500))
    }

    #[tokio::test]
    async fn snapshot_is_sorted_by_name() {
        let runtime = Arc::new(FakeRuntime::with(vec![
            container("b2", "web", ContainerStatus::Running),
            container("a1", "db", ContainerStatus::Exited),
            container("c3", "cache", ContainerStatus::Running),
        ]));

        let records = builder(runtime).build().await.unwrap();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["cache", "db", "web"]);
    }

    #[tokio::test]
    async fn stopped_containers_report_no_uptime_and_zero_memory() {
        let mut stopped = container("a1", "db", ContainerStatus::Exited);
        stopped.memory_bytes = 999; // Must be ignored while not running.
        let runtime = Arc::new(FakeRuntime::with(vec![stopped]));

        let records = builder(runtime).build().await.unwrap();
        assert_eq!(records[0].memory_bytes, 0);
        assert!(records[0].uptime.is_none());
        assert_eq!(records[0].uptime_display(), "-");
    }

    #[tokio::test]
    async fn one_broken_stats_call_does_not_abort_the_snapshot() {
        let mut web = container("a1", "web", ContainerStatus::Running);
        web.memory_bytes = 1024;
        let api = container("b2", "api", ContainerStatus::Running);
        let runtime = Arc::new(FakeRuntime::with(vec![web, api]));
        runtime
            .broken_stats
            .lock()
            .unwrap()
            .insert("b2".to_string());

        let records = builder(runtime).build().await.unwrap();
        assert_eq!(records.len(), 2);
        let api = records.iter().find(|r| r.id == "b2").unwrap();
        assert_eq!(api.memory_bytes, 0);
        let web = records.iter().find(|r| r.id == "a1").unwrap();
        assert_eq!(web.memory_bytes, 1024);
    }

    #[tokio::test]
    async fn running_container_reports_uptime() {
        let runtime = Arc::new(FakeRuntime::with(vec![container(
            "a1",
            "web",
            ContainerStatus::Running,
        )]));

        let records = builder(runtime).build().await.unwrap();
        let uptime = records[0].uptime.expect("running container has uptime");
        assert!(uptime.as_secs() >= 4 * 60);
    }

    #[test]
    fn uptime_formatting() {
        assert_eq!(format_uptime(Duration::from_secs(42)), "42s");
        assert_eq!(format_uptime(Duration::from_secs(60)), "1m");
        assert_eq!(format_uptime(Duration::from_secs(3_600 + 120)), "1h2m");
        assert_eq!(
            format_uptime(Duration::from_secs(86_400 + 2 * 3_600 + 180)),
            "1d2h3m"
        );
    }
}

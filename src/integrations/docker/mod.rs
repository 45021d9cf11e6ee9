//! Docker runtime integration - listing, stats and lifecycle commands

use anyhow::Result;
use async_trait::async_trait;
use bollard::container::{
    ListContainersOptions, RemoveContainerOptions, RenameContainerOptions, Stats, StatsOptions,
};
use bollard::Docker;
use chrono::{DateTime, Utc};
use futures::StreamExt;

/// Lifecycle status as reported by the runtime listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerStatus {
    Running,
    Paused,
    Exited,
    Created,
    Restarting,
    Dead,
    Unknown,
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Paused => write!(f, "paused"),
            Self::Exited => write!(f, "exited"),
            Self::Created => write!(f, "created"),
            Self::Restarting => write!(f, "restarting"),
            Self::Dead => write!(f, "dead"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

impl From<&str> for ContainerStatus {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "running" => Self::Running,
            "paused" => Self::Paused,
            "exited" => Self::Exited,
            "created" => Self::Created,
            "restarting" => Self::Restarting,
            "dead" => Self::Dead,
            _ => Self::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Tcp,
    Udp,
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => write!(f, "tcp"),
            Self::Udp => write!(f, "udp"),
        }
    }
}

impl From<&str> for Protocol {
    fn from(s: &str) -> Self {
        if s.eq_ignore_ascii_case("udp") {
            Self::Udp
        } else {
            Self::Tcp
        }
    }
}

/// One published (or publishable) port of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortMapping {
    pub container_port: u16,
    pub protocol: Protocol,
    /// Absent when the runtime knows the port but has no host binding for it.
    pub host_port: Option<u16>,
}

impl std::fmt::Display for PortMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.host_port {
            Some(host) => write!(f, "{}->{}", host, self.container_port),
            None => write!(f, "{}", self.container_port),
        }
    }
}

/// What a single listing entry gives us before any per-container calls.
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: ContainerStatus,
    pub ports: Vec<PortMapping>,
}

/// Per-container details that only inspect can answer.
#[derive(Debug, Clone, Default)]
pub struct ContainerDetails {
    pub ip_address: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
}

/// The runtime capability the core consumes. Tests substitute fakes;
/// production uses [`DockerClient`].
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    async fn ping(&self) -> Result<()>;
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>>;
    async fn inspect(&self, id: &str) -> Result<ContainerDetails>;
    /// Current RAM usage in bytes for a running container.
    async fn memory_usage(&self, id: &str) -> Result<u64>;
    async fn start(&self, id: &str) -> Result<()>;
    async fn stop(&self, id: &str) -> Result<()>;
    async fn restart(&self, id: &str) -> Result<()>;
    async fn rename(&self, id: &str, new_name: &str) -> Result<()>;
    async fn remove(&self, id: &str) -> Result<()>;
}

/// Docker client wrapper over bollard.
pub struct DockerClient {
    docker: Docker,
}

impl DockerClient {
    pub fn new() -> Result<Self> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self { docker })
    }

    /// Connect to a custom socket path.
    pub fn with_socket(socket_path: &str) -> Result<Self> {
        let docker = Docker::connect_with_socket(socket_path, 120, bollard::API_DEFAULT_VERSION)?;
        Ok(Self { docker })
    }

    fn parse_memory(stats: &Stats) -> u64 {
        stats.memory_stats.usage.unwrap_or(0)
    }
}

#[async_trait]
impl ContainerRuntime for DockerClient {
    async fn ping(&self) -> Result<()> {
        self.docker.ping().await?;
        Ok(())
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let options = ListContainersOptions::<String> {
            all: true,
            ..Default::default()
        };

        let containers = self.docker.list_containers(Some(options)).await?;
        let mut result = Vec::new();

        for container in containers {
            let id = container.id.unwrap_or_default();
            let name = container
                .names
                .and_then(|n| n.first().cloned())
                .unwrap_or_default()
                .trim_start_matches('/')
                .to_string();

            // Tagless images only give us the digest id.
            let image = container.image.or(container.image_id).unwrap_or_default();
            let state = container.state.unwrap_or_default();
            let status = ContainerStatus::from(state.as_str());

            let ports = container
                .ports
                .unwrap_or_default()
                .into_iter()
                .map(|p| PortMapping {
                    container_port: p.private_port,
                    host_port: p.public_port,
                    protocol: p
                        .typ
                        .map(|t| Protocol::from(t.to_string().as_str()))
                        .unwrap_or_default(),
                })
                .collect();

            result.push(ContainerSummary {
                id,
                name,
                image,
                status,
                ports,
            });
        }

        Ok(result)
    }

    async fn inspect(&self, id: &str) -> Result<ContainerDetails> {
        let response = self.docker.inspect_container(id, None).await?;

        let started_at = response
            .state
            .as_ref()
            .and_then(|s| s.started_at.as_deref())
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc));

        // First network with an address wins.
        let ip_address = response
            .network_settings
            .and_then(|ns| ns.networks)
            .and_then(|networks| {
                networks
                    .values()
                    .filter_map(|n| n.ip_address.clone())
                    .find(|ip| !ip.is_empty())
            });

        Ok(ContainerDetails {
            ip_address,
            started_at,
        })
    }

    async fn memory_usage(&self, id: &str) -> Result<u64> {
        let options = StatsOptions {
            stream: false,
            one_shot: true,
        };

        let mut stream = self.docker.stats(id, Some(options));

        if let Some(Ok(stats)) = stream.next().await {
            Ok(Self::parse_memory(&stats))
        } else {
            Ok(0)
        }
    }

    async fn start(&self, id: &str) -> Result<()> {
        self.docker.start_container::<String>(id, None).await?;
        Ok(())
    }

    async fn stop(&self, id: &str) -> Result<()> {
        self.docker.stop_container(id, None).await?;
        Ok(())
    }

    async fn restart(&self, id: &str) -> Result<()> {
        self.docker.restart_container(id, None).await?;
        Ok(())
    }

    async fn rename(&self, id: &str, new_name: &str) -> Result<()> {
        self.docker
            .rename_container(id, RenameContainerOptions { name: new_name })
            .await?;
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<()> {
        self.docker
            .remove_container(
                id,
                Some(RemoveContainerOptions {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_status_from_str() {
        assert_eq!(ContainerStatus::from("running"), ContainerStatus::Running);
        assert_eq!(ContainerStatus::from("RUNNING"), ContainerStatus::Running);
        assert_eq!(ContainerStatus::from("exited"), ContainerStatus::Exited);
        assert_eq!(
            ContainerStatus::from("some_new_state"),
            ContainerStatus::Unknown
        );
    }

    #[test]
    fn port_mapping_display() {
        let published = PortMapping {
            container_port: 80,
            protocol: Protocol::Tcp,
            host_port: Some(8080),
        };
        assert_eq!(published.to_string(), "8080->80");

        let unpublished = PortMapping {
            container_port: 5432,
            protocol: Protocol::Tcp,
            host_port: None,
        };
        assert_eq!(unpublished.to_string(), "5432");
    }

    #[test]
    fn protocol_parse_defaults_to_tcp() {
        assert_eq!(Protocol::from("udp"), Protocol::Udp);
        assert_eq!(Protocol::from("UDP"), Protocol::Udp);
        assert_eq!(Protocol::from("tcp"), Protocol::Tcp);
        assert_eq!(Protocol::from(""), Protocol::Tcp);
    }
}

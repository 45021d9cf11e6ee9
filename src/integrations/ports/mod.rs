//! Port mapping resolution with a packet-filter fallback.
//!
//! The runtime API is authoritative whenever it reports at least one
//! published mapping. Some network modes leave the API's port list
//! unbound even though the kernel holds DNAT rules for the container;
//! for those we read the host NAT table and re-associate its rules
//! with the container's declared ports. The two sources never merge.

use anyhow::Result;
use async_trait::async_trait;
use regex::Regex;
use thiserror::Error;
use tokio::process::Command;

use crate::integrations::docker::{PortMapping, Protocol};

/// One DNAT rule from the host packet-filter table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatRule {
    pub protocol: Protocol,
    /// The `--dport` the host forwards from.
    pub host_port: u16,
    /// DNAT destination address (the container's internal IP).
    pub destination_ip: String,
    /// DNAT destination port (the container-side port).
    pub destination_port: u16,
}

#[derive(Debug, Error)]
pub enum NatError {
    #[error("packet filter read requires elevated privilege")]
    PermissionDenied,
    #[error("packet filter table unavailable: {0}")]
    Unavailable(String),
}

/// Capability over the host NAT/port-forward rule table. Isolated as a
/// trait so tests never touch privileged system calls.
#[async_trait]
pub trait NatTable: Send + Sync {
    async fn rules(&self) -> Result<Vec<NatRule>, NatError>;
}

/// Reads the NAT table via `iptables-save -t nat`. Linux-specific and
/// typically root-only; failures degrade, they never propagate.
pub struct IptablesNat;

#[async_trait]
impl NatTable for IptablesNat {
    async fn rules(&self) -> Result<Vec<NatRule>, NatError> {
        let output = Command::new("iptables-save")
            .args(["-t", "nat"])
            .output()
            .await
            .map_err(|e| NatError::Unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("Permission denied") || stderr.contains("must be root") {
                return Err(NatError::PermissionDenied);
            }
            return Err(NatError::Unavailable(stderr.trim().to_string()));
        }

        Ok(parse_rules(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extract DNAT rules from `iptables-save` output. Lines that are not
/// port-forwarding DNAT rules are skipped.
fn parse_rules(output: &str) -> Vec<NatRule> {
    let re = Regex::new(
        r"-p\s+(tcp|udp)\b.*--dport\s+(\d+)\b.*-j\s+DNAT\s+--to-destination\s+([0-9.]+):(\d+)",
    )
    .expect("static pattern");

    output
        .lines()
        .filter_map(|line| {
            let caps = re.captures(line)?;
            Some(NatRule {
                protocol: Protocol::from(&caps[1]),
                host_port: caps[2].parse().ok()?,
                destination_ip: caps[3].to_string(),
                destination_port: caps[4].parse().ok()?,
            })
        })
        .collect()
}

/// Resolve the effective port mappings for one container.
///
/// `api_ports` is the runtime listing's answer; `container_ip` is the
/// container's internal address used to match NAT destinations. The
/// fallback is only consulted when the API published nothing, and any
/// fallback failure leaves the API's (unpublished) set in place.
pub async fn resolve_ports(
    api_ports: &[PortMapping],
    container_ip: Option<&str>,
    nat: &dyn NatTable,
) -> Vec<PortMapping> {
    if api_ports.iter().any(|p| p.host_port.is_some()) {
        return api_ports.to_vec();
    }

    // Nothing declared, or no address to match against.
    let Some(ip) = container_ip else {
        return api_ports.to_vec();
    };
    if api_ports.is_empty() {
        return Vec::new();
    }

    let rules = match nat.rules().await {
        Ok(rules) => rules,
        Err(e) => {
            tracing::debug!("NAT fallback unavailable: {}", e);
            return api_ports.to_vec();
        }
    };

    api_ports
        .iter()
        .map(|p| {
            let host_port = rules
                .iter()
                .find(|r| {
                    r.destination_ip == ip
                        && r.destination_port == p.container_port
                        && r.protocol == p.protocol
                })
                .map(|r| r.host_port);
            PortMapping { host_port, ..*p }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SAMPLE: &str = "\
*nat
:PREROUTING ACCEPT [0:0]
:DOCKER - [0:0]
-A PREROUTING -m addrtype --dst-type LOCAL -j DOCKER
-A POSTROUTING -s 172.17.0.2/32 -d 172.17.0.2/32 -p tcp -m tcp --dport 80 -j MASQUERADE
-A DOCKER ! -i docker0 -p tcp -m tcp --dport 8080 -j DNAT --to-destination 172.17.0.2:80
-A DOCKER ! -i docker0 -p udp -m udp --dport 5353 -j DNAT --to-destination 172.17.0.3:53
COMMIT
";

    struct FakeNat(Vec<NatRule>);

    #[async_trait]
    impl NatTable for FakeNat {
        async fn rules(&self) -> Result<Vec<NatRule>, NatError> {
            Ok(self.0.clone())
        }
    }

    /// Panics if the fallback path is ever consulted.
    struct UntouchableNat;

    #[async_trait]
    impl NatTable for UntouchableNat {
        async fn rules(&self) -> Result<Vec<NatRule>, NatError> {
            panic!("NAT table consulted although the API result was authoritative");
        }
    }

    struct DeniedNat;

    #[async_trait]
    impl NatTable for DeniedNat {
        async fn rules(&self) -> Result<Vec<NatRule>, NatError> {
            Err(NatError::PermissionDenied)
        }
    }

    fn unpublished(port: u16) -> PortMapping {
        PortMapping {
            container_port: port,
            protocol: Protocol::Tcp,
            host_port: None,
        }
    }

    #[test]
    fn parses_dnat_rules_only() {
        let rules = parse_rules(SAMPLE);
        assert_eq!(
            rules,
            vec![
                NatRule {
                    protocol: Protocol::Tcp,
                    host_port: 8080,
                    destination_ip: "172.17.0.2".to_string(),
                    destination_port: 80,
                },
                NatRule {
                    protocol: Protocol::Udp,
                    host_port: 5353,
                    destination_ip: "172.17.0.3".to_string(),
                    destination_port: 53,
                },
            ]
        );
    }

    #[tokio::test]
    async fn api_result_wins_without_touching_fallback() {
        let api = vec![PortMapping {
            container_port: 80,
            protocol: Protocol::Tcp,
            host_port: Some(8080),
        }];

        let resolved = resolve_ports(&api, Some("172.17.0.2"), &UntouchableNat).await;
        assert_eq!(resolved, api);
    }

    #[tokio::test]
    async fn fallback_reassociates_declared_ports() {
        let api = vec![unpublished(80), unpublished(9000)];
        let nat = FakeNat(parse_rules(SAMPLE));

        let resolved = resolve_ports(&api, Some("172.17.0.2"), &nat).await;
        assert_eq!(resolved[0].host_port, Some(8080));
        // No rule for 9000; stays unpublished rather than borrowing one.
        assert_eq!(resolved[1].host_port, None);
    }

    #[tokio::test]
    async fn fallback_matches_ip_and_protocol() {
        let api = vec![unpublished(53)];
        let nat = FakeNat(parse_rules(SAMPLE));

        // The only rule for port 53 is udp on a different container.
        let resolved = resolve_ports(&api, Some("172.17.0.2"), &nat).await;
        assert_eq!(resolved[0].host_port, None);
    }

    #[tokio::test]
    async fn permission_denied_degrades_to_api_set() {
        let api = vec![unpublished(80)];
        let resolved = resolve_ports(&api, Some("172.17.0.2"), &DeniedNat).await;
        assert_eq!(resolved, api);
    }

    #[tokio::test]
    async fn no_declared_ports_yields_empty() {
        let resolved = resolve_ports(&[], Some("172.17.0.2"), &UntouchableNat).await;
        assert!(resolved.is_empty());
    }
}

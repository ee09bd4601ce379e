//! Gateway configuration: the recognized option set from the connection
//! facade down to the transport worker.
//!
//! Loaded from YAML (`serde_yaml`, matching the teacher's configuration
//! loading style) or built programmatically for tests.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{OmegaError, Result};

fn default_poll_interval_ms() -> u64 {
    100
}

fn default_refresh_safety_fraction() -> f64 {
    0.75
}

/// Full recognized configuration surface (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// `tcp://host:port` or `inproc://name`.
    pub endpoint: String,

    /// Pins the server's CURVE public key. Absent => unauthenticated
    /// connection. Accepted here and forwarded to the transport; CURVE
    /// key exchange itself is an external transport-library concern.
    #[serde(default)]
    pub server_public_key: Option<String>,

    /// Tenant id stamped on headers by the single-client facade.
    #[serde(default)]
    pub client_id: Option<i64>,

    /// Routing id; also used as the socket identity.
    pub sender_comp_id: String,

    /// Bound on the outbound queue. Unbounded if unset.
    #[serde(default)]
    pub outbound_queue_capacity: Option<usize>,

    /// Transport poll timeout in milliseconds. Also the upper bound on
    /// shutdown latency.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Fraction of the access token's TTL at which to schedule the next
    /// refresh. Default 0.75 (spec §9 open question, resolved).
    #[serde(default = "default_refresh_safety_fraction")]
    pub refresh_safety_fraction: f64,

    /// What happens when `outbound_queue_capacity` is set and the queue is
    /// full. Default `Block` (spec §4.2).
    #[serde(default)]
    pub outbound_queue_full_policy: QueueFullPolicy,
}

/// Full-queue behavior for a bounded outbound queue (spec §4.2, §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueFullPolicy {
    #[default]
    Block,
    DropOldest,
}

impl GatewayConfig {
    pub fn new(endpoint: impl Into<String>, sender_comp_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            server_public_key: None,
            client_id: None,
            sender_comp_id: sender_comp_id.into(),
            outbound_queue_capacity: None,
            poll_interval_ms: default_poll_interval_ms(),
            refresh_safety_fraction: default_refresh_safety_fraction(),
            outbound_queue_full_policy: QueueFullPolicy::default(),
        }
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: GatewayConfig =
            serde_yaml::from_str(yaml).map_err(|e| OmegaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Structural validation: conflicting or malformed options (spec §7
    /// `ConfigError`). Field-level type validity is already enforced by
    /// serde at deserialization time, so this only checks cross-field and
    /// format invariants.
    pub fn validate(&self) -> Result<()> {
        // `inproc://` is accepted at this layer per the URI grammar, but
        // the vendored transport has no inproc implementation; `ipc://`
        // is the scheme that actually works for in-process tests.
        let scheme_ok = self.endpoint.starts_with("tcp://")
            || self.endpoint.starts_with("ipc://")
            || self.endpoint.starts_with("inproc://");
        if !scheme_ok {
            return Err(OmegaError::Config(format!(
                "endpoint must be tcp://, ipc://, or inproc://, got {:?}",
                self.endpoint
            )));
        }
        if self.sender_comp_id.is_empty() {
            return Err(OmegaError::Config(
                "sender_comp_id must not be empty".into(),
            ));
        }
        if !(0.0..1.0).contains(&self.refresh_safety_fraction) {
            return Err(OmegaError::Config(format!(
                "refresh_safety_fraction must be in [0, 1), got {}",
                self.refresh_safety_fraction
            )));
        }
        if let Some(cap) = self.outbound_queue_capacity
            && cap == 0
        {
            return Err(OmegaError::Config(
                "outbound_queue_capacity must be positive when set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_spec_compliant() {
        let cfg = GatewayConfig::new("tcp://127.0.0.1:9999", "sender-1");
        assert_eq!(cfg.poll_interval_ms, 100);
        assert_eq!(cfg.refresh_safety_fraction, 0.75);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn rejects_bad_scheme() {
        let cfg = GatewayConfig::new("http://nope", "sender-1");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_empty_sender_comp_id() {
        let cfg = GatewayConfig::new("tcp://127.0.0.1:9999", "");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loads_from_yaml() {
        let yaml = "endpoint: tcp://127.0.0.1:5555\nsender_comp_id: abc\n";
        let cfg = GatewayConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.endpoint, "tcp://127.0.0.1:5555");
        assert_eq!(cfg.outbound_queue_capacity, None);
    }
}

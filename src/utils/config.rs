// src/utils/config.rs
//! Pipeline configuration
//!
//! Plain structs with defaults; immutable once the pipeline starts. How the
//! values get here (env, CLI, files) is the embedding application's concern,
//! as is everything broker-specific (address, topic, compression, acks).

/// Relay batching configuration
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Flush when the in-memory batch reaches this many records
    pub batch_max_messages: usize,

    /// Flush a non-empty batch once this much time has passed since the
    /// last flush, even with no new traffic
    pub flush_interval_ms: u64,

    /// Upper bound on the final delivery attempt during shutdown
    pub shutdown_flush_timeout_ms: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            batch_max_messages: 100,
            flush_interval_ms: 1000,
            shutdown_flush_timeout_ms: 2000,
        }
    }
}

/// Top-level SDK configuration
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// Account identifier stamped into every record
    pub account_id: String,

    /// Relay batching settings
    pub relay: RelayConfig,
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            account_id: "local-traffic-relay".to_string(),
            relay: RelayConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SdkConfig::default();
        assert_eq!(config.account_id, "local-traffic-relay");
        assert_eq!(config.relay.batch_max_messages, 100);
        assert_eq!(config.relay.flush_interval_ms, 1000);
        assert_eq!(config.relay.shutdown_flush_timeout_ms, 2000);
    }

    #[test]
    fn test_custom_config() {
        let config = SdkConfig {
            account_id: "custom-account".to_string(),
            relay: RelayConfig {
                batch_max_messages: 5,
                flush_interval_ms: 200,
                ..Default::default()
            },
        };
        assert_eq!(config.account_id, "custom-account");
        assert_eq!(config.relay.batch_max_messages, 5);
        assert_eq!(config.relay.flush_interval_ms, 200);
    }
}

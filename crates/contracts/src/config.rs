//! RelayConfig - Config Loader output
//!
//! Describes a complete relay setup: sink endpoint, dispatcher worker pool,
//! collection schedule, resource attributes and instrument filters.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Complete relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Sink endpoint settings
    #[serde(default)]
    pub sink: SinkSettings,

    /// Worker pool settings
    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    /// Collection schedule settings
    #[serde(default)]
    pub collect: CollectSettings,

    /// Resource attributes attached to every write (sorted by key)
    #[serde(default)]
    pub resource: BTreeMap<String, String>,

    /// Instrument names the taxonomy refuses to back (no-op instruments)
    #[serde(default)]
    pub disabled_instruments: Vec<String>,
}

/// Sink kind selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    /// Log writes via tracing (no network)
    #[default]
    Log,
    /// statsd line protocol over UDP
    Udp,
}

/// Sink endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkSettings {
    /// Sink implementation to use
    #[serde(default)]
    pub kind: SinkKind,

    /// Target address for network sinks
    #[serde(default = "default_sink_addr")]
    pub addr: String,

    /// Prefix prepended to every metric name ("" = none)
    #[serde(default)]
    pub prefix: String,
}

impl Default for SinkSettings {
    fn default() -> Self {
        Self {
            kind: SinkKind::default(),
            addr: default_sink_addr(),
            prefix: String::new(),
        }
    }
}

fn default_sink_addr() -> String {
    "127.0.0.1:8125".to_string()
}

/// Worker pool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// Number of worker tasks; must be at least 1
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Job queue capacity; defaults to `workers * 10` when unset
    #[serde(default)]
    pub queue_capacity: Option<usize>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            queue_capacity: None,
        }
    }
}

fn default_workers() -> usize {
    1
}

impl DispatcherSettings {
    /// Effective queue capacity after applying the `workers * 10` default
    pub fn effective_queue_capacity(&self) -> usize {
        match self.queue_capacity {
            Some(cap) if cap > 0 => cap,
            _ => self.workers.max(1) * 10,
        }
    }
}

/// Collection schedule settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectSettings {
    /// Sweep interval in milliseconds
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
}

impl Default for CollectSettings {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_interval_ms() -> u64 {
    60_000
}

impl CollectSettings {
    /// Sweep interval as a duration
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RelayConfig::default();
        assert_eq!(config.sink.kind, SinkKind::Log);
        assert_eq!(config.sink.addr, "127.0.0.1:8125");
        assert_eq!(config.dispatcher.workers, 1);
        assert_eq!(config.dispatcher.effective_queue_capacity(), 10);
        assert_eq!(config.collect.interval(), Duration::from_secs(60));
    }

    #[test]
    fn test_queue_capacity_override() {
        let settings = DispatcherSettings {
            workers: 4,
            queue_capacity: Some(128),
        };
        assert_eq!(settings.effective_queue_capacity(), 128);

        let defaulted = DispatcherSettings {
            workers: 4,
            queue_capacity: None,
        };
        assert_eq!(defaulted.effective_queue_capacity(), 40);
    }

    #[test]
    fn test_deserialize_minimal_json() {
        let config: RelayConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.dispatcher.workers, 1);
        assert!(config.disabled_instruments.is_empty());
    }
}

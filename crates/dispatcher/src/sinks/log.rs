//! LogSink - writes metric lines to the tracing output

use std::time::Duration;

use contracts::{ContractError, StatSink, Tag};
use tracing::info;

/// Sink that logs every write for debugging and demos
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log(&self, op: &str, stat: &str, value: &str, rate: f32, tags: &[Tag]) {
        let tags: Vec<String> = tags.iter().map(|t| format!("{}:{}", t.key, t.value)).collect();
        info!(
            sink = %self.name,
            op,
            stat,
            value,
            rate,
            tags = tags.join(","),
            "Metric write"
        );
    }
}

impl StatSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn inc(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.log("inc", stat, &value.to_string(), rate, tags);
        Ok(())
    }

    async fn dec(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.log("dec", stat, &value.to_string(), rate, tags);
        Ok(())
    }

    async fn gauge(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.log("gauge", stat, &value.to_string(), rate, tags);
        Ok(())
    }

    async fn gauge_delta(&self, stat: &str, delta: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.log("gauge_delta", stat, &format!("{delta:+}"), rate, tags);
        Ok(())
    }

    async fn timing(&self, stat: &str, millis: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.log("timing", stat, &millis.to_string(), rate, tags);
        Ok(())
    }

    async fn timing_duration(
        &self,
        stat: &str,
        duration: Duration,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError> {
        self.log("timing", stat, &duration.as_millis().to_string(), rate, tags);
        Ok(())
    }

    async fn set(&self, stat: &str, value: &str, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.log("set", stat, value, rate, tags);
        Ok(())
    }

    async fn set_int(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.log("set", stat, &value.to_string(), rate, tags);
        Ok(())
    }

    async fn raw(&self, stat: &str, value: &str, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.log("raw", stat, value, rate, tags);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_sink_write() {
        let sink = LogSink::new("test_log");
        let result = sink.inc("hits", 1, 1.0, &[Tag::new("a", "b")]).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_log_sink_name() {
        let sink = LogSink::new("my_logger");
        assert_eq!(sink.name(), "my_logger");
    }
}

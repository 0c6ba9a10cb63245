//! MemorySink - records writes in memory
//!
//! Used by tests across the workspace to assert on exactly which writes
//! reached the sink, and to simulate slow or failing sinks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{ContractError, StatSink, Tag};
use tokio::time::sleep;

/// One recorded write
#[derive(Debug, Clone, PartialEq)]
pub struct WriteRecord {
    /// Operation name ("inc", "gauge", ...)
    pub op: &'static str,
    pub stat: String,
    /// Payload rendered as a string (integer values via `to_string`)
    pub value: String,
    pub rate: f32,
    pub tags: Vec<Tag>,
}

/// Sink that appends every write to a shared vector
pub struct MemorySink {
    name: String,
    records: Arc<Mutex<Vec<WriteRecord>>>,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl MemorySink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
            delay: None,
        }
    }

    /// Make every write fail with a sink error
    pub fn with_failure(self) -> Self {
        self.fail.store(true, Ordering::Relaxed);
        self
    }

    /// Delay every write (simulates a slow sink)
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Handle to the record storage, usable after the sink is moved away
    pub fn shared_records(&self) -> Arc<Mutex<Vec<WriteRecord>>> {
        Arc::clone(&self.records)
    }

    /// Snapshot of all records so far
    pub fn records(&self) -> Vec<WriteRecord> {
        self.records.lock().unwrap().clone()
    }

    async fn record(
        &self,
        op: &'static str,
        stat: &str,
        value: String,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }
        if self.fail.load(Ordering::Relaxed) {
            return Err(ContractError::sink_write(&self.name, "simulated failure"));
        }
        self.records.lock().unwrap().push(WriteRecord {
            op,
            stat: stat.to_string(),
            value,
            rate,
            tags: tags.to_vec(),
        });
        Ok(())
    }
}

impl StatSink for MemorySink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn inc(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.record("inc", stat, value.to_string(), rate, tags).await
    }

    async fn dec(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.record("dec", stat, value.to_string(), rate, tags).await
    }

    async fn gauge(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.record("gauge", stat, value.to_string(), rate, tags).await
    }

    async fn gauge_delta(&self, stat: &str, delta: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.record("gauge_delta", stat, delta.to_string(), rate, tags).await
    }

    async fn timing(&self, stat: &str, millis: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.record("timing", stat, millis.to_string(), rate, tags).await
    }

    async fn timing_duration(
        &self,
        stat: &str,
        duration: Duration,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError> {
        self.record(
            "timing_duration",
            stat,
            duration.as_millis().to_string(),
            rate,
            tags,
        )
        .await
    }

    async fn set(&self, stat: &str, value: &str, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.record("set", stat, value.to_string(), rate, tags).await
    }

    async fn set_int(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.record("set_int", stat, value.to_string(), rate, tags).await
    }

    async fn raw(&self, stat: &str, value: &str, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.record("raw", stat, value.to_string(), rate, tags).await
    }
}

//! StatSink trait - Dispatcher output interface
//!
//! Defines the abstract write interface the dispatcher drives. Implementations
//! may block on I/O; the dispatcher keeps that off the producer's path.

use std::time::Duration;

use crate::{ContractError, Tag};

/// Metric write trait
///
/// All sink implementations must implement this trait. Methods take `&self`
/// because one sink instance is shared by every dispatcher worker.
#[trait_variant::make(StatSink: Send)]
pub trait LocalStatSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Increment a counter by `value`
    async fn inc(
        &self,
        stat: &str,
        value: i64,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;

    /// Decrement a counter by `value`
    async fn dec(
        &self,
        stat: &str,
        value: i64,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;

    /// Set a gauge to an absolute `value`
    async fn gauge(
        &self,
        stat: &str,
        value: i64,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;

    /// Apply a signed delta to a gauge
    async fn gauge_delta(
        &self,
        stat: &str,
        delta: i64,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;

    /// Record a timing value in milliseconds
    async fn timing(
        &self,
        stat: &str,
        millis: i64,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;

    /// Record a timing value from a duration
    async fn timing_duration(
        &self,
        stat: &str,
        duration: Duration,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;

    /// Record a member of a set
    async fn set(
        &self,
        stat: &str,
        value: &str,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;

    /// Record an integer member of a set
    async fn set_int(
        &self,
        stat: &str,
        value: i64,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;

    /// Submit an already-formatted raw value
    async fn raw(
        &self,
        stat: &str,
        value: &str,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError>;
}

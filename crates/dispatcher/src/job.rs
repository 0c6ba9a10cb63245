//! WriteJob - a deferred sink write
//!
//! Each variant captures every argument of exactly one sink operation. Jobs
//! are immutable once built and owned by the queue until a worker (or the
//! shutdown drain) consumes them.

use std::time::Duration;

use contracts::{ContractError, StatSink, Tag};

/// One deferred invocation against the sink write interface
#[derive(Debug, Clone)]
pub enum WriteJob {
    Inc {
        stat: String,
        value: i64,
        rate: f32,
        tags: Vec<Tag>,
    },
    Dec {
        stat: String,
        value: i64,
        rate: f32,
        tags: Vec<Tag>,
    },
    Gauge {
        stat: String,
        value: i64,
        rate: f32,
        tags: Vec<Tag>,
    },
    GaugeDelta {
        stat: String,
        delta: i64,
        rate: f32,
        tags: Vec<Tag>,
    },
    Timing {
        stat: String,
        millis: i64,
        rate: f32,
        tags: Vec<Tag>,
    },
    TimingDuration {
        stat: String,
        duration: Duration,
        rate: f32,
        tags: Vec<Tag>,
    },
    Set {
        stat: String,
        value: String,
        rate: f32,
        tags: Vec<Tag>,
    },
    SetInt {
        stat: String,
        value: i64,
        rate: f32,
        tags: Vec<Tag>,
    },
    Raw {
        stat: String,
        value: String,
        rate: f32,
        tags: Vec<Tag>,
    },
}

impl WriteJob {
    /// The metric name this job writes to
    pub fn metric_name(&self) -> &str {
        match self {
            Self::Inc { stat, .. }
            | Self::Dec { stat, .. }
            | Self::Gauge { stat, .. }
            | Self::GaugeDelta { stat, .. }
            | Self::Timing { stat, .. }
            | Self::TimingDuration { stat, .. }
            | Self::Set { stat, .. }
            | Self::SetInt { stat, .. }
            | Self::Raw { stat, .. } => stat,
        }
    }

    /// Perform the captured write against `sink`
    pub async fn apply<S>(&self, sink: &S) -> Result<(), ContractError>
    where
        S: StatSink + Sync,
    {
        match self {
            Self::Inc {
                stat,
                value,
                rate,
                tags,
            } => sink.inc(stat, *value, *rate, tags).await,
            Self::Dec {
                stat,
                value,
                rate,
                tags,
            } => sink.dec(stat, *value, *rate, tags).await,
            Self::Gauge {
                stat,
                value,
                rate,
                tags,
            } => sink.gauge(stat, *value, *rate, tags).await,
            Self::GaugeDelta {
                stat,
                delta,
                rate,
                tags,
            } => sink.gauge_delta(stat, *delta, *rate, tags).await,
            Self::Timing {
                stat,
                millis,
                rate,
                tags,
            } => sink.timing(stat, *millis, *rate, tags).await,
            Self::TimingDuration {
                stat,
                duration,
                rate,
                tags,
            } => sink.timing_duration(stat, *duration, *rate, tags).await,
            Self::Set {
                stat,
                value,
                rate,
                tags,
            } => sink.set(stat, value, *rate, tags).await,
            Self::SetInt {
                stat,
                value,
                rate,
                tags,
            } => sink.set_int(stat, *value, *rate, tags).await,
            Self::Raw {
                stat,
                value,
                rate,
                tags,
            } => sink.raw(stat, value, *rate, tags).await,
        }
    }
}

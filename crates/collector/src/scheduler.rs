//! Scheduler - drives pipeline sweeps on a fixed interval
//!
//! The ticker is a trait so tests can fire sweeps deterministically instead
//! of waiting on wall-clock time. Sweep errors go to the error handler and
//! never stop the loop; only cancellation does.

use std::time::Duration;

use observability::{metrics as self_metrics, ErrorHandler};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::context::CollectContext;
use crate::pipeline::Pipeline;

/// Source of sweep instants
#[trait_variant::make(Ticker: Send)]
pub trait LocalTicker {
    /// Complete when the next sweep should run
    async fn tick(&mut self);
}

/// Wall-clock ticker; first tick fires one full period after creation
pub struct IntervalTicker {
    inner: Interval,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        let mut inner = interval_at(Instant::now() + period, period);
        // A sweep that overruns its interval must not cause a burst of
        // catch-up sweeps afterwards.
        inner.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { inner }
    }
}

impl Ticker for IntervalTicker {
    async fn tick(&mut self) {
        self.inner.tick().await;
    }
}

/// Periodic driver for [`Pipeline::produce`]
pub struct Scheduler<T> {
    pipeline: Arc<Pipeline>,
    ticker: T,
    error_handler: ErrorHandler,
}

impl<T: Ticker> Scheduler<T> {
    pub fn new(pipeline: Arc<Pipeline>, ticker: T, error_handler: ErrorHandler) -> Self {
        Self {
            pipeline,
            ticker,
            error_handler,
        }
    }

    /// Sweep on every tick until `cancel` flips to true.
    ///
    /// The same cancellation signal is threaded into each sweep's context,
    /// so stopping the scheduler also aborts an in-flight sweep between
    /// callbacks.
    pub async fn run(mut self, mut cancel: watch::Receiver<bool>) {
        info!("Collection scheduler started");
        let cx = CollectContext::from_watch(cancel.clone());

        loop {
            tokio::select! {
                _ = self.ticker.tick() => {
                    let started = Instant::now();
                    match self.pipeline.produce(&cx) {
                        Ok(()) => {
                            self_metrics::record_sweep(
                                started.elapsed().as_secs_f64() * 1000.0,
                                false,
                            );
                        }
                        Err(err) => {
                            self_metrics::record_sweep(
                                started.elapsed().as_secs_f64() * 1000.0,
                                true,
                            );
                            (self.error_handler)(&err);
                        }
                    }
                }
                _ = cancel.changed() => break,
            }
        }

        debug!("Collection scheduler stopped");
    }
}

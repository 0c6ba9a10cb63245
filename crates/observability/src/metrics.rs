//! Relay self-instrumentation
//!
//! Counters and gauges describing the relay's own health, published through
//! the `metrics` facade so the optional Prometheus endpoint can expose them.

use metrics::{counter, gauge, histogram};

/// Record a job accepted into the dispatcher queue
pub fn record_job_submitted() {
    counter!("statrelay_jobs_submitted_total").increment(1);
}

/// Record a job applied to the sink
pub fn record_job_applied(sink: &str) {
    counter!("statrelay_jobs_applied_total", "sink" => sink.to_string()).increment(1);
}

/// Record a sink write failure (swallowed at the dispatcher boundary)
pub fn record_job_failed(sink: &str) {
    counter!("statrelay_jobs_failed_total", "sink" => sink.to_string()).increment(1);
}

/// Record jobs applied inline by the shutdown drain
pub fn record_jobs_drained(count: u64) {
    if count > 0 {
        counter!("statrelay_jobs_drained_total").increment(count);
    }
}

/// Record the approximate queue depth observed by a worker
pub fn record_queue_depth(depth: usize) {
    gauge!("statrelay_queue_depth").set(depth as f64);
}

/// Record one completed collection sweep
pub fn record_sweep(duration_ms: f64, failed: bool) {
    counter!("statrelay_sweeps_total").increment(1);
    if failed {
        counter!("statrelay_sweep_errors_total").increment(1);
    }
    histogram!("statrelay_sweep_duration_ms").record(duration_ms);
}

//! # Dispatcher
//!
//! Bounded worker pool decoupling metric producers from a possibly slow sink.
//!
//! Producers hand [`WriteJob`]s to the dispatcher, which queues them on a
//! bounded MPMC channel and applies them to the wrapped [`contracts::StatSink`]
//! from a fixed set of worker tasks. `stop()` joins the workers and then
//! drains whatever is still buffered, so no job submitted before shutdown is
//! ever lost. Sink failures never propagate back to producers.

mod dispatcher;
mod job;
mod metrics;
pub mod sinks;

pub use dispatcher::{Dispatcher, SubmitHandle};
pub use job::WriteJob;
pub use metrics::{DispatcherMetrics, DispatcherMetricsSnapshot};

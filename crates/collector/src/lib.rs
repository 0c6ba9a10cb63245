//! # Collector
//!
//! Pull-based metric collection: the pipeline of registered callbacks, the
//! per-scope meter/registry that creates instruments and validates
//! registrations, the interval scheduler driving sweeps, and the provider
//! wiring all of it to a [`dispatcher::Dispatcher`].
//!
//! ## Flow
//! A meter creates an observable instrument and a callback is registered for
//! it. The scheduler ticks, the pipeline invokes every live callback, the
//! callback observes values through its observer, the observer validates the
//! instrument identity and submits a write job to the dispatcher.

mod context;
mod error;
mod instrument;
mod meter;
mod observer;
mod pipeline;
mod provider;
mod scheduler;

pub use context::{cancel_pair, CancelHandle, CollectContext};
pub use error::CollectError;
pub use instrument::{Instrument, ObservableInstrument};
pub use meter::{InstrumentBuilder, Meter, ObservableBuilder};
pub use observer::{MultiObserver, Registration, SingleObserver};
pub use pipeline::{CallbackKey, Pipeline, PipelineCallback};
pub use provider::{MeterProvider, ProviderBuilder};
pub use scheduler::{IntervalTicker, Scheduler, Ticker};

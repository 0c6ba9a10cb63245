//! MeterProvider - wires pipeline, dispatcher and scheduler together
//!
//! Owns the full lifecycle: `start()` brings up the dispatcher workers and
//! spawns the scheduler loop, `stop()` cancels the loop and drains the
//! dispatcher. Everything configurable arrives through the builder; there is
//! no ambient global state.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use contracts::{ContractError, RelayConfig, Resource, Scope, StatSink};
use dispatcher::{Dispatcher, DispatcherMetricsSnapshot};
use observability::{default_error_handler, ErrorHandler};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, instrument};

use crate::instrument::Emitter;
use crate::meter::Meter;
use crate::pipeline::Pipeline;
use crate::scheduler::{IntervalTicker, Scheduler};

/// The original exporter collected once a minute; keep that default.
const DEFAULT_INTERVAL: Duration = Duration::from_millis(60_000);

/// Builder for [`MeterProvider`]
pub struct ProviderBuilder {
    resource: Resource,
    interval: Duration,
    workers: usize,
    queue_capacity: Option<usize>,
    disabled_instruments: Vec<String>,
    error_handler: Option<ErrorHandler>,
}

impl Default for ProviderBuilder {
    fn default() -> Self {
        Self {
            resource: Resource::default(),
            interval: DEFAULT_INTERVAL,
            workers: 1,
            queue_capacity: None,
            disabled_instruments: Vec::new(),
            error_handler: None,
        }
    }
}

impl ProviderBuilder {
    /// Seed builder values from a loaded [`RelayConfig`]
    pub fn from_config(config: &RelayConfig) -> Self {
        Self {
            resource: Resource::from_pairs(
                config.resource.iter().map(|(k, v)| (k.clone(), v.clone())),
            ),
            interval: config.collect.interval(),
            workers: config.dispatcher.workers,
            queue_capacity: config.dispatcher.queue_capacity,
            disabled_instruments: config.disabled_instruments.clone(),
            error_handler: None,
        }
    }

    /// Resource attributes flattened into every write
    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = resource;
        self
    }

    /// Sweep interval (default 60 s)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Dispatcher worker count (default 1; zero fails at `start`)
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Dispatcher queue capacity (default `workers * 10`)
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = Some(capacity);
        self
    }

    /// Instrument names the taxonomy should refuse to back
    pub fn with_disabled_instruments(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.disabled_instruments = names.into_iter().map(Into::into).collect();
        self
    }

    /// Hook receiving every non-fatal error (default logs at WARN)
    pub fn with_error_handler(mut self, handler: ErrorHandler) -> Self {
        self.error_handler = Some(handler);
        self
    }

    /// Build the provider around `sink`
    pub fn build<S>(self, sink: S) -> MeterProvider<S>
    where
        S: StatSink + Send + Sync + 'static,
    {
        let error_handler = self.error_handler.unwrap_or_else(default_error_handler);
        let dispatcher = Arc::new(Dispatcher::new(
            sink,
            self.workers,
            self.queue_capacity,
            Arc::clone(&error_handler),
        ));
        let (cancel_tx, cancel_rx) = watch::channel(false);

        MeterProvider {
            pipeline: Arc::new(Pipeline::new()),
            dispatcher,
            resource: self.resource,
            interval: self.interval,
            disabled: self.disabled_instruments.into(),
            error_handler,
            cancel_tx,
            cancel_rx,
            scheduler_handle: Mutex::new(None),
        }
    }
}

/// Entry point tying meters to one pipeline, dispatcher and scheduler
pub struct MeterProvider<S> {
    pipeline: Arc<Pipeline>,
    dispatcher: Arc<Dispatcher<S>>,
    resource: Resource,
    interval: Duration,
    disabled: Arc<[String]>,
    error_handler: ErrorHandler,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
    scheduler_handle: Mutex<Option<JoinHandle<()>>>,
}

impl<S> MeterProvider<S>
where
    S: StatSink + Send + Sync + 'static,
{
    pub fn builder() -> ProviderBuilder {
        ProviderBuilder::default()
    }

    /// Create a meter for the given instrumentation name
    pub fn meter(&self, name: impl Into<String>) -> Meter {
        self.scoped_meter(Scope::new(name))
    }

    /// Create a meter for a fully qualified scope
    pub fn meter_with_version(
        &self,
        name: impl Into<String>,
        version: impl Into<String>,
        schema_url: impl Into<String>,
    ) -> Meter {
        self.scoped_meter(Scope::with_version(name, version, schema_url))
    }

    fn scoped_meter(&self, scope: Scope) -> Meter {
        Meter::new(
            scope,
            Arc::clone(&self.pipeline),
            Emitter {
                submit: self.dispatcher.handle(),
                resource: self.resource.clone(),
                error_handler: Arc::clone(&self.error_handler),
            },
            Arc::clone(&self.disabled),
        )
    }

    /// The shared pipeline (exposed for embedders that sweep manually)
    pub fn pipeline(&self) -> Arc<Pipeline> {
        Arc::clone(&self.pipeline)
    }

    /// Dispatcher counter snapshot
    pub fn dispatcher_metrics(&self) -> DispatcherMetricsSnapshot {
        self.dispatcher.metrics()
    }

    /// Start dispatcher workers and the collection scheduler.
    ///
    /// # Errors
    /// Propagates dispatcher configuration errors (zero workers) and errors
    /// when called more than once.
    #[instrument(name = "provider_start", skip(self))]
    pub fn start(&self) -> Result<(), ContractError> {
        self.dispatcher.start()?;

        let scheduler = Scheduler::new(
            Arc::clone(&self.pipeline),
            IntervalTicker::new(self.interval),
            Arc::clone(&self.error_handler),
        );
        let cancel = self.cancel_rx.clone();
        let handle = tokio::spawn(scheduler.run(cancel));
        *self.scheduler_handle.lock().unwrap() = Some(handle);

        info!(interval_ms = self.interval.as_millis() as u64, "MeterProvider started");
        Ok(())
    }

    /// Stop the scheduler, then stop and drain the dispatcher.
    ///
    /// Idempotent: repeated calls after the first are no-ops. An in-flight
    /// sweep observes the cancellation between callbacks.
    #[instrument(name = "provider_stop", skip(self))]
    pub async fn stop(&self) {
        let _ = self.cancel_tx.send(true);

        let handle = self.scheduler_handle.lock().unwrap().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                tracing::error!(error = ?e, "Scheduler task panicked");
            }
        }

        // Dispatcher::stop carries its own one-shot guard.
        self.dispatcher.stop().await;
        info!("MeterProvider stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CollectContext;
    use contracts::Tag;
    use dispatcher::sinks::MemorySink;
    use observability::noop_error_handler;

    fn provider_with_memory_sink(
        builder: ProviderBuilder,
    ) -> (
        MeterProvider<MemorySink>,
        Arc<Mutex<Vec<dispatcher::sinks::WriteRecord>>>,
    ) {
        let sink = MemorySink::new("mem");
        let records = sink.shared_records();
        (builder.with_error_handler(noop_error_handler()).build(sink), records)
    }

    #[tokio::test]
    async fn test_manual_sweep_through_provider() {
        let (provider, records) = provider_with_memory_sink(
            MeterProvider::<MemorySink>::builder()
                .with_resource(Resource::from_pairs([("service.name", "relay-test")])),
        );
        provider.start().unwrap();

        let meter = provider.meter("svc");
        let gauge = meter.observable_gauge("depth").build();
        let inst = gauge.clone();
        let _reg = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst, 7.0, &[Tag::new("shard", "1")]);
                    Ok(())
                },
                &[gauge],
            )
            .unwrap();

        provider.pipeline().produce(&CollectContext::never()).unwrap();
        provider.stop().await;

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stat, "depth");
        assert_eq!(records[0].value, "7");
        // Resource attributes come first, observation tags after.
        assert_eq!(
            records[0].tags,
            vec![Tag::new("service.name", "relay-test"), Tag::new("shard", "1")]
        );
    }

    #[tokio::test]
    async fn test_scheduler_sweeps_on_interval() {
        let (provider, records) = provider_with_memory_sink(
            MeterProvider::<MemorySink>::builder().with_interval(Duration::from_millis(20)),
        );
        provider.start().unwrap();

        let meter = provider.meter("svc");
        let _counter = meter
            .observable_counter("ticks")
            .with_callback(|_, observer| {
                observer.observe(1.0, &[]);
                Ok(())
            })
            .build();

        tokio::time::sleep(Duration::from_millis(120)).await;
        provider.stop().await;

        assert!(!records.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_workers_is_a_start_error() {
        let (provider, _records) = provider_with_memory_sink(
            MeterProvider::<MemorySink>::builder().with_workers(0),
        );
        let err = provider.start().unwrap_err();
        assert!(matches!(err, ContractError::NoWorkers));
    }

    #[tokio::test]
    async fn test_double_start_errors() {
        let (provider, _records) =
            provider_with_memory_sink(MeterProvider::<MemorySink>::builder());
        provider.start().unwrap();
        assert!(provider.start().is_err());
        provider.stop().await;
    }

    #[tokio::test]
    async fn test_stop_is_idempotent() {
        let (provider, records) =
            provider_with_memory_sink(MeterProvider::<MemorySink>::builder());
        provider.start().unwrap();

        let meter = provider.meter("svc");
        meter.counter("hits").build().add(1.0, &[]);

        provider.stop().await;
        provider.stop().await;

        assert_eq!(records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_from_config_applies_settings() {
        let config = RelayConfig {
            disabled_instruments: vec!["noisy".into()],
            ..Default::default()
        };
        let (provider, records) =
            provider_with_memory_sink(ProviderBuilder::from_config(&config));
        provider.start().unwrap();

        let meter = provider.meter("svc");
        let noisy = meter.counter("noisy").build();
        assert!(noisy.is_noop());
        noisy.add(3.0, &[]);
        provider.stop().await;

        assert!(records.lock().unwrap().is_empty());
    }
}

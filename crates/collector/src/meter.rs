//! Meter - per-scope instrument factory and callback registry
//!
//! A meter owns a [`contracts::Scope`] and creates instruments inside it.
//! Registration is where scope integrity is enforced: a callback may only be
//! bound to observable instruments created by the registering meter.

use std::collections::HashSet;
use std::sync::Arc;

use contracts::{ContractError, InstrumentId, InstrumentKind, Scope};
use tracing::debug;

use crate::context::CollectContext;
use crate::instrument::{Emitter, Instrument, ObservableInstrument};
use crate::observer::{MultiObserver, Registration, SingleObserver};
use crate::pipeline::Pipeline;

/// Callback signature for single-instrument registrations
pub(crate) type SingleCallbackFn =
    Box<dyn Fn(&CollectContext, &SingleObserver) -> Result<(), ContractError> + Send + Sync>;

/// Per-scope instrument factory
pub struct Meter {
    scope: Scope,
    pipeline: Arc<Pipeline>,
    emitter: Emitter,
    disabled: Arc<[String]>,
}

impl Meter {
    pub(crate) fn new(
        scope: Scope,
        pipeline: Arc<Pipeline>,
        emitter: Emitter,
        disabled: Arc<[String]>,
    ) -> Self {
        Self {
            scope,
            pipeline,
            emitter,
            disabled,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    // ===== Synchronous instruments =====

    /// Monotonic counter written directly by application code
    pub fn counter(&self, name: impl Into<String>) -> InstrumentBuilder<'_> {
        InstrumentBuilder::new(self, name.into(), InstrumentKind::Counter)
    }

    /// Bidirectional counter written directly by application code
    pub fn up_down_counter(&self, name: impl Into<String>) -> InstrumentBuilder<'_> {
        InstrumentBuilder::new(self, name.into(), InstrumentKind::UpDownCounter)
    }

    /// Value distribution written directly by application code
    pub fn histogram(&self, name: impl Into<String>) -> InstrumentBuilder<'_> {
        InstrumentBuilder::new(self, name.into(), InstrumentKind::Histogram)
    }

    // ===== Observable instruments =====

    /// Monotonic counter pulled through callbacks
    pub fn observable_counter(&self, name: impl Into<String>) -> ObservableBuilder<'_> {
        ObservableBuilder::new(self, name.into(), InstrumentKind::ObservableCounter)
    }

    /// Bidirectional counter pulled through callbacks
    pub fn observable_up_down_counter(&self, name: impl Into<String>) -> ObservableBuilder<'_> {
        ObservableBuilder::new(self, name.into(), InstrumentKind::ObservableUpDownCounter)
    }

    /// Point-in-time value pulled through callbacks
    pub fn observable_gauge(&self, name: impl Into<String>) -> ObservableBuilder<'_> {
        ObservableBuilder::new(self, name.into(), InstrumentKind::ObservableGauge)
    }

    // ===== Callback registration =====

    /// Bind `callback` to exactly the supplied observable instruments.
    ///
    /// - An empty instrument list returns a no-op [`Registration`] without
    ///   scheduling anything.
    /// - Every instrument must belong to this meter's scope; all offenders
    ///   are collected into one [`ContractError::InvalidRegistration`] and
    ///   nothing is installed on error.
    /// - If every supplied instrument is a no-op (dropped by the taxonomy)
    ///   the list is treated as empty.
    ///
    /// During a sweep, the callback receives a [`MultiObserver`] that only
    /// accepts observations for the registered instrument identities.
    pub fn register_callback<F>(
        &self,
        callback: F,
        instruments: &[ObservableInstrument],
    ) -> Result<Registration, ContractError>
    where
        F: Fn(&CollectContext, &MultiObserver) -> Result<(), ContractError>
            + Send
            + Sync
            + 'static,
    {
        if instruments.is_empty() {
            // Don't schedule a callback with nothing to observe.
            return Ok(Registration::noop());
        }

        let mut errors: Vec<String> = Vec::new();
        let mut registered: HashSet<InstrumentId> = HashSet::new();
        let mut live = 0usize;
        for instrument in instruments {
            if instrument.is_noop() {
                // Dropped instruments are tolerated: their identity is
                // accepted so observations stay silent no-ops, but they do
                // not keep the callback alive on their own.
                registered.insert(instrument.id().clone());
                continue;
            }
            match instrument.registerable(&self.scope) {
                Ok(()) => {
                    registered.insert(instrument.id().clone());
                    live += 1;
                }
                Err(message) => errors.push(message),
            }
        }

        if !errors.is_empty() {
            // No partial registration: one offending instrument aborts all.
            return Err(ContractError::InvalidRegistration { errors });
        }
        if live == 0 {
            return Ok(Registration::noop());
        }

        let observer = MultiObserver::new(registered, Arc::clone(&self.emitter.error_handler));
        let key = self
            .pipeline
            .add_multi_callback(Box::new(move |cx| callback(cx, &observer)));

        debug!(scope = %self.scope.name, instruments = live, "callback registered");
        Ok(Registration::new(Arc::clone(&self.pipeline), key))
    }

    fn is_disabled(&self, name: &str) -> bool {
        self.disabled.iter().any(|d| d == name)
    }

    fn resolve_emitter(&self, name: &str) -> Option<Emitter> {
        if self.is_disabled(name) {
            debug!(scope = %self.scope.name, name, "instrument disabled, backing dropped");
            None
        } else {
            Some(self.emitter.clone())
        }
    }
}

/// Builder for synchronous instruments
pub struct InstrumentBuilder<'a> {
    meter: &'a Meter,
    name: String,
    kind: InstrumentKind,
    unit: String,
    description: String,
}

impl<'a> InstrumentBuilder<'a> {
    fn new(meter: &'a Meter, name: String, kind: InstrumentKind) -> Self {
        Self {
            meter,
            name,
            kind,
            unit: String::new(),
            description: String::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn build(self) -> Instrument {
        let emitter = self.meter.resolve_emitter(&self.name);
        let id = InstrumentId {
            name: self.name,
            description: self.description,
            kind: self.kind,
            unit: self.unit,
            scope: self.meter.scope.clone(),
        };
        Instrument::new(id, emitter)
    }
}

/// Builder for observable instruments
pub struct ObservableBuilder<'a> {
    meter: &'a Meter,
    name: String,
    kind: InstrumentKind,
    unit: String,
    description: String,
    callbacks: Vec<SingleCallbackFn>,
}

impl<'a> ObservableBuilder<'a> {
    fn new(meter: &'a Meter, name: String, kind: InstrumentKind) -> Self {
        Self {
            meter,
            name,
            kind,
            unit: String::new(),
            description: String::new(),
            callbacks: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Attach a callback bound to this instrument alone, invoked on every
    /// sweep with a typed observer
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(&CollectContext, &SingleObserver) -> Result<(), ContractError>
            + Send
            + Sync
            + 'static,
    {
        self.callbacks.push(Box::new(callback));
        self
    }

    pub fn build(self) -> ObservableInstrument {
        let emitter = self.meter.resolve_emitter(&self.name);
        let id = InstrumentId {
            name: self.name,
            description: self.description,
            kind: self.kind,
            unit: self.unit,
            scope: self.meter.scope.clone(),
        };
        let instrument = ObservableInstrument::new(id, emitter);

        // Creation-time callbacks for dropped instruments are discarded.
        if !instrument.is_noop() {
            for callback in self.callbacks {
                let observer = SingleObserver::new(instrument.clone());
                self.meter
                    .pipeline
                    .add_callback(Box::new(move |cx| callback(cx, &observer)));
            }
        }
        instrument
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Resource, Tag};
    use dispatcher::sinks::MemorySink;
    use dispatcher::Dispatcher;
    use observability::noop_error_handler;
    use std::sync::Mutex;

    struct Harness {
        pipeline: Arc<Pipeline>,
        dispatcher: Dispatcher<MemorySink>,
        records: Arc<Mutex<Vec<dispatcher::sinks::WriteRecord>>>,
        disabled: Arc<[String]>,
        resource: Resource,
    }

    impl Harness {
        fn new(disabled: &[&str]) -> Self {
            let sink = MemorySink::new("mem");
            let records = sink.shared_records();
            let dispatcher = Dispatcher::new(sink, 1, Some(64), noop_error_handler());
            Self {
                pipeline: Arc::new(Pipeline::new()),
                dispatcher,
                records,
                disabled: disabled.iter().map(|s| s.to_string()).collect(),
                resource: Resource::default(),
            }
        }

        fn meter(&self, scope_name: &str) -> Meter {
            Meter::new(
                Scope::new(scope_name),
                Arc::clone(&self.pipeline),
                Emitter {
                    submit: self.dispatcher.handle(),
                    resource: self.resource.clone(),
                    error_handler: noop_error_handler(),
                },
                Arc::clone(&self.disabled),
            )
        }

        fn meter_with_handler(
            &self,
            scope_name: &str,
            error_handler: observability::ErrorHandler,
        ) -> Meter {
            Meter::new(
                Scope::new(scope_name),
                Arc::clone(&self.pipeline),
                Emitter {
                    submit: self.dispatcher.handle(),
                    resource: self.resource.clone(),
                    error_handler,
                },
                Arc::clone(&self.disabled),
            )
        }

        /// Drain everything queued so far into the record log
        async fn flush(&self) {
            self.dispatcher.stop().await;
        }
    }

    #[test]
    fn test_register_callback_empty_set_is_noop() {
        let harness = Harness::new(&[]);
        let meter = harness.meter("svc");

        let reg = meter.register_callback(|_, _| Ok(()), &[]).unwrap();
        assert!(!reg.is_active());
        assert_eq!(harness.pipeline.callback_counts(), (0, 0));
    }

    #[test]
    fn test_register_callback_all_dropped_is_noop() {
        let harness = Harness::new(&["ignored"]);
        let meter = harness.meter("svc");
        let inst = meter.observable_gauge("ignored").build();
        assert!(inst.is_noop());

        let reg = meter
            .register_callback(|_, _| Ok(()), &[inst])
            .unwrap();
        assert!(!reg.is_active());
        assert_eq!(harness.pipeline.callback_counts(), (0, 0));
    }

    #[test]
    fn test_register_callback_scope_mismatch_names_every_offender() {
        let harness = Harness::new(&[]);
        let owner = harness.meter("owner");
        let intruder = harness.meter("intruder");

        let a = owner.observable_counter("a").build();
        let b = owner.observable_gauge("b").build();
        let ok = intruder.observable_gauge("c").build();

        let err = intruder
            .register_callback(|_, _| Ok(()), &[a, b, ok])
            .unwrap_err();
        let text = err.to_string();
        assert!(text.contains(
            "invalid registration: observable \"a\" from Meter \"owner\", \
             registered with Meter \"intruder\""
        ));
        assert!(text.contains(
            "invalid registration: observable \"b\" from Meter \"owner\", \
             registered with Meter \"intruder\""
        ));
        // No partial registration took place.
        assert_eq!(harness.pipeline.callback_counts(), (0, 0));
    }

    #[tokio::test]
    async fn test_observed_value_reaches_sink() {
        let harness = Harness::new(&[]);
        let meter = harness.meter("svc");
        let depth = meter.observable_gauge("queue_depth").build();

        let inst = depth.clone();
        let _reg = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst, 4.0, &[Tag::new("shard", "0")]);
                    Ok(())
                },
                &[depth],
            )
            .unwrap();

        harness.pipeline.produce(&CollectContext::never()).unwrap();
        harness.flush().await;

        let records = harness.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].op, "inc");
        assert_eq!(records[0].stat, "queue_depth");
        assert_eq!(records[0].value, "4");
        assert_eq!(records[0].tags, vec![Tag::new("shard", "0")]);
    }

    #[tokio::test]
    async fn test_fractional_observation_truncates() {
        let harness = Harness::new(&[]);
        let meter = harness.meter("svc");
        let gauge = meter.observable_gauge("ratio").build();

        let inst = gauge.clone();
        let _reg = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst, 4.9, &[]);
                    Ok(())
                },
                &[gauge],
            )
            .unwrap();

        harness.pipeline.produce(&CollectContext::never()).unwrap();
        harness.flush().await;

        assert_eq!(harness.records.lock().unwrap()[0].value, "4");
    }

    #[tokio::test]
    async fn test_unregistered_observation_reported_and_dropped() {
        let harness = Harness::new(&[]);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let handler: observability::ErrorHandler = Arc::new(move |err| {
            seen_clone.lock().unwrap().push(err.to_string());
        });
        let meter = harness.meter_with_handler("svc", handler);

        let a = meter.observable_counter("a").build();
        let b = meter.observable_counter("b").build();

        let (inst_a, inst_b) = (a.clone(), b.clone());
        let _reg = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst_a, 1.0, &[]);
                    // b was never part of this registration.
                    observer.observe(&inst_b, 1.0, &[]);
                    Ok(())
                },
                &[a],
            )
            .unwrap();

        harness.pipeline.produce(&CollectContext::never()).unwrap();
        harness.flush().await;

        let records = harness.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stat, "a");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("not registered for callback"));
        assert!(seen[0].contains("\"b\""));
    }

    #[tokio::test]
    async fn test_unregister_stops_future_sweeps() {
        let harness = Harness::new(&[]);
        let meter = harness.meter("svc");
        let counter = meter.observable_counter("events").build();

        let inst = counter.clone();
        let reg = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst, 1.0, &[]);
                    Ok(())
                },
                &[counter],
            )
            .unwrap();

        harness.pipeline.produce(&CollectContext::never()).unwrap();
        reg.unregister();
        harness.pipeline.produce(&CollectContext::never()).unwrap();
        harness.flush().await;

        assert_eq!(harness.records.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_single_instrument_creation_callback() {
        let harness = Harness::new(&[]);
        let meter = harness.meter("svc");
        let _uptime = meter
            .observable_counter("uptime")
            .with_unit("s")
            .with_callback(|_, observer| {
                observer.observe(42.0, &[]);
                Ok(())
            })
            .build();

        assert_eq!(harness.pipeline.callback_counts(), (1, 0));
        harness.pipeline.produce(&CollectContext::never()).unwrap();
        harness.flush().await;

        let records = harness.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stat, "uptime");
        assert_eq!(records[0].value, "42");
    }

    #[tokio::test]
    async fn test_sync_instruments_write_through_resolved_op() {
        let harness = Harness::new(&[]);
        let meter = harness.meter("svc");

        meter.counter("hits").build().add(2.0, &[]);
        meter
            .histogram("latency")
            .with_unit("ms")
            .build()
            .record(12.5, &[]);
        harness.flush().await;

        let records = harness.records.lock().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].op, "inc");
        assert_eq!(records[0].value, "2");
        assert_eq!(records[1].op, "timing");
        assert_eq!(records[1].value, "12");
    }

    #[tokio::test]
    async fn test_disabled_sync_instrument_is_noop() {
        let harness = Harness::new(&["hits"]);
        let meter = harness.meter("svc");

        let counter = meter.counter("hits").build();
        assert!(counter.is_noop());
        counter.add(5.0, &[]);
        harness.flush().await;

        assert!(harness.records.lock().unwrap().is_empty());
    }
}

//! # Integration Tests
//!
//! Cross-crate scenarios exercising the full path from instrument to sink:
//! config -> provider -> meter -> pipeline -> dispatcher -> sink.

#[cfg(test)]
mod e2e_tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use collector::{cancel_pair, CollectContext, MeterProvider, ProviderBuilder};
    use contracts::{ContractError, RelayConfig, Resource, Tag};
    use dispatcher::sinks::{MemorySink, WriteRecord};
    use observability::{noop_error_handler, ErrorHandler};

    fn memory_provider(
        builder: ProviderBuilder,
    ) -> (MeterProvider<MemorySink>, Arc<Mutex<Vec<WriteRecord>>>) {
        let sink = MemorySink::new("mem");
        let records = sink.shared_records();
        (builder.build(sink), records)
    }

    fn collecting_handler() -> (ErrorHandler, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen);
        let handler: ErrorHandler = Arc::new(move |err| {
            seen_clone.lock().unwrap().push(err.to_string());
        });
        (handler, seen)
    }

    /// End-to-end: observable instrument -> registered callback -> sweep ->
    /// dispatcher -> sink, with resource attributes flattened into the tags.
    #[tokio::test]
    async fn test_e2e_observable_flow() {
        let (provider, records) = memory_provider(
            MeterProvider::<MemorySink>::builder()
                .with_resource(Resource::from_pairs([("service.name", "relay")]))
                .with_workers(2)
                .with_error_handler(noop_error_handler()),
        );
        provider.start().unwrap();

        let meter = provider.meter("integration");
        let depth = meter
            .observable_gauge("queue_depth")
            .with_unit("1")
            .build();

        let inst = depth.clone();
        let registration = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst, 4.0, &[Tag::new("shard", "a")]);
                    Ok(())
                },
                &[depth],
            )
            .unwrap();

        provider
            .pipeline()
            .produce(&CollectContext::never())
            .unwrap();
        provider.stop().await;
        registration.unregister();

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].op, "inc");
        assert_eq!(records[0].stat, "queue_depth");
        assert_eq!(records[0].value, "4");
        assert_eq!(
            records[0].tags,
            vec![Tag::new("service.name", "relay"), Tag::new("shard", "a")]
        );
    }

    /// A callback observing an instrument it never registered produces an
    /// error report and no write, while the rest of the sweep continues.
    #[tokio::test]
    async fn test_e2e_foreign_observation_is_isolated() {
        let (handler, seen) = collecting_handler();
        let (provider, records) = memory_provider(
            MeterProvider::<MemorySink>::builder().with_error_handler(handler),
        );
        provider.start().unwrap();

        let meter = provider.meter("integration");
        let registered = meter.observable_counter("registered").build();
        let foreign = meter.observable_counter("foreign").build();

        let (inst_a, inst_b) = (registered.clone(), foreign.clone());
        let _reg = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst_a, 1.0, &[]);
                    observer.observe(&inst_b, 1.0, &[]);
                    Ok(())
                },
                &[registered],
            )
            .unwrap();

        let other_hits = Arc::new(AtomicUsize::new(0));
        let other_inst = meter.observable_counter("other").build();
        let (hits, inst) = (Arc::clone(&other_hits), other_inst.clone());
        let _other = meter
            .register_callback(
                move |_, observer| {
                    hits.fetch_add(1, Ordering::SeqCst);
                    observer.observe(&inst, 1.0, &[]);
                    Ok(())
                },
                &[other_inst],
            )
            .unwrap();

        provider
            .pipeline()
            .produce(&CollectContext::never())
            .unwrap();
        provider.stop().await;

        let stats: Vec<String> = records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.stat.clone())
            .collect();
        assert!(stats.contains(&"registered".to_string()));
        assert!(stats.contains(&"other".to_string()));
        assert!(!stats.contains(&"foreign".to_string()));

        assert_eq!(other_hits.load(Ordering::SeqCst), 1);
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].contains("foreign"));
    }

    /// Cross-scope registration fails naming every offender and installs
    /// nothing.
    #[tokio::test]
    async fn test_e2e_cross_scope_registration_rejected() {
        let (provider, _records) =
            memory_provider(MeterProvider::<MemorySink>::builder());

        let owner = provider.meter("component.a");
        let intruder = provider.meter("component.b");
        let inst = owner.observable_gauge("temperature").build();

        let err = intruder
            .register_callback(|_, _| Ok(()), &[inst])
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidRegistration { .. }));
        assert_eq!(
            err.to_string(),
            "invalid registration: observable \"temperature\" from Meter \"component.a\", \
             registered with Meter \"component.b\""
        );
        assert_eq!(provider.pipeline().callback_counts(), (0, 0));
    }

    /// 100 measurements from 10 concurrent producers with 2 workers all
    /// arrive exactly once by the time stop() returns.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_concurrent_producers_drain_completely() {
        let (provider, records) = memory_provider(
            MeterProvider::<MemorySink>::builder()
                .with_workers(2)
                .with_queue_capacity(8),
        );
        provider.start().unwrap();
        let provider = Arc::new(provider);

        let mut producers = Vec::new();
        for p in 0..10u64 {
            let meter = provider.meter("burst");
            // Producers submit from plain threads: with a capacity of 8 the
            // queue fills up and back-pressure blocks them briefly.
            producers.push(tokio::task::spawn_blocking(move || {
                let counter = meter.counter("events").build();
                for i in 0..10u64 {
                    counter.add((p * 10 + i) as f64, &[]);
                }
            }));
        }
        for producer in producers {
            producer.await.unwrap();
        }
        provider.stop().await;

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 100);
        let mut values: Vec<i64> = records.iter().map(|r| r.value.parse().unwrap()).collect();
        values.sort_unstable();
        assert_eq!(values, (0..100).collect::<Vec<i64>>());
    }

    /// Unregistration from two concurrent callers never panics, and the
    /// callback stops firing after either call returns.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_e2e_concurrent_unregister() {
        let (provider, records) =
            memory_provider(MeterProvider::<MemorySink>::builder());
        provider.start().unwrap();

        let meter = provider.meter("integration");
        let counter = meter.observable_counter("events").build();
        let inst = counter.clone();
        let registration = Arc::new(
            meter
                .register_callback(
                    move |_, observer| {
                        observer.observe(&inst, 1.0, &[]);
                        Ok(())
                    },
                    &[counter],
                )
                .unwrap(),
        );

        provider
            .pipeline()
            .produce(&CollectContext::never())
            .unwrap();

        let (a, b) = (Arc::clone(&registration), Arc::clone(&registration));
        let (ra, rb) = tokio::join!(
            tokio::task::spawn_blocking(move || a.unregister()),
            tokio::task::spawn_blocking(move || b.unregister()),
        );
        ra.unwrap();
        rb.unwrap();

        provider
            .pipeline()
            .produce(&CollectContext::never())
            .unwrap();
        provider.stop().await;

        assert_eq!(records.lock().unwrap().len(), 1);
    }

    /// A cancelled context aborts a sweep between callbacks; observations
    /// already applied are kept.
    #[tokio::test]
    async fn test_e2e_cancellation_mid_sweep() {
        let (provider, records) =
            memory_provider(MeterProvider::<MemorySink>::builder());
        provider.start().unwrap();

        let meter = provider.meter("integration");
        let first = meter.observable_counter("first").build();
        let second = meter.observable_counter("second").build();

        let (cancel, cx) = cancel_pair();
        let cancel = Arc::new(cancel);

        let (inst, trigger) = (first.clone(), Arc::clone(&cancel));
        let _first_reg = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst, 1.0, &[]);
                    trigger.cancel();
                    Ok(())
                },
                &[first],
            )
            .unwrap();

        let inst = second.clone();
        let _second_reg = meter
            .register_callback(
                move |_, observer| {
                    observer.observe(&inst, 1.0, &[]);
                    Ok(())
                },
                &[second],
            )
            .unwrap();

        let err = provider.pipeline().produce(&cx).unwrap_err();
        assert!(matches!(err, collector::CollectError::Cancelled));
        provider.stop().await;

        let records = records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].stat, "first");
    }

    /// The scheduler drives sweeps end to end on a short interval.
    #[tokio::test]
    async fn test_e2e_scheduled_collection() {
        let (provider, records) = memory_provider(
            MeterProvider::<MemorySink>::builder().with_interval(Duration::from_millis(10)),
        );
        provider.start().unwrap();

        let meter = provider.meter("integration");
        let _ticks = meter
            .observable_counter("ticks")
            .with_callback(|_, observer| {
                observer.observe(1.0, &[]);
                Ok(())
            })
            .build();

        tokio::time::sleep(Duration::from_millis(100)).await;
        provider.stop().await;

        assert!(records.lock().unwrap().len() >= 2);
    }

    /// Config loaded from TOML drives the provider: disabled instruments
    /// never emit, worker settings apply.
    #[tokio::test]
    async fn test_e2e_config_driven_provider() {
        let toml = r#"
disabled_instruments = ["suppressed"]

[dispatcher]
workers = 2

[collect]
interval_ms = 60000
"#;
        let config: RelayConfig =
            config_loader::ConfigLoader::load_from_str(toml, config_loader::ConfigFormat::Toml)
                .unwrap();

        let (provider, records) = memory_provider(ProviderBuilder::from_config(&config));
        provider.start().unwrap();

        let meter = provider.meter("integration");
        meter.counter("kept").build().add(1.0, &[]);
        meter.counter("suppressed").build().add(1.0, &[]);
        provider.stop().await;

        let stats: Vec<String> = records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.stat.clone())
            .collect();
        assert_eq!(stats, vec!["kept".to_string()]);
    }
}

//! `run` command implementation.
//!
//! Wires the configured sink into a provider, registers a demo producer and
//! runs until the duration elapses or a shutdown signal arrives.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use collector::ProviderBuilder;
use contracts::{SinkKind, StatSink, Tag};
use dispatcher::sinks::{LogSink, UdpStatSink};
use rand::Rng;
use tracing::{info, warn};

use crate::cli::RunArgs;

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut config = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    // Apply CLI overrides
    if let Some(interval_ms) = args.interval_ms {
        info!(interval_ms, "Overriding sweep interval from CLI");
        config.collect.interval_ms = interval_ms;
    }
    if let Some(workers) = args.workers {
        info!(workers, "Overriding worker count from CLI");
        config.dispatcher.workers = workers;
    }

    info!(
        sink = ?config.sink.kind,
        addr = %config.sink.addr,
        workers = config.dispatcher.workers,
        queue_capacity = config.dispatcher.effective_queue_capacity(),
        interval_ms = config.collect.interval_ms,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        return Ok(());
    }

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
    }

    match config.sink.kind {
        SinkKind::Log => {
            let sink = LogSink::new("log");
            run_with_sink(sink, &config, args).await
        }
        SinkKind::Udp => {
            let sink = UdpStatSink::connect("statsd", &config.sink.addr, &config.sink.prefix)
                .await
                .with_context(|| format!("Failed to connect UDP sink to {}", config.sink.addr))?;
            run_with_sink(sink, &config, args).await
        }
    }
}

/// Run the provider and demo producer against any sink implementation
async fn run_with_sink<S>(sink: S, config: &contracts::RelayConfig, args: &RunArgs) -> Result<()>
where
    S: StatSink + Send + Sync + 'static,
{
    let provider = ProviderBuilder::from_config(config).build(sink);
    provider.start().context("Failed to start provider")?;

    let started = Instant::now();
    let meter = provider.meter_with_version("statrelay.demo", env!("CARGO_PKG_VERSION"), "");

    // Observable side: uptime pulled on every sweep.
    let _uptime = meter
        .observable_gauge("demo.uptime_seconds")
        .with_unit("s")
        .with_description("Seconds since the demo producer started")
        .with_callback(move |_, observer| {
            observer.observe(started.elapsed().as_secs_f64(), &[]);
            Ok(())
        })
        .build();

    // Multi-instrument callback: sweep count and producer progress from one
    // registration.
    let sweeps = meter
        .observable_counter("demo.sweeps")
        .with_description("Completed collection sweeps")
        .build();
    let produced = meter
        .observable_gauge("demo.produced_total")
        .with_description("Measurements produced by the demo loop")
        .build();

    let produced_total = Arc::new(AtomicU64::new(0));
    let produced_reader = Arc::clone(&produced_total);
    let sweep_count = AtomicU64::new(0);
    let (sweeps_inst, produced_inst) = (sweeps.clone(), produced.clone());
    let _registration = meter.register_callback(
        move |_, observer| {
            observer.observe(&sweeps_inst, sweep_count.fetch_add(1, Ordering::Relaxed) as f64, &[]);
            observer.observe(
                &produced_inst,
                produced_reader.load(Ordering::Relaxed) as f64,
                &[],
            );
            Ok(())
        },
        &[sweeps, produced],
    )?;

    // Sync side: a background task hammering a counter and a histogram.
    let requests = meter
        .counter("demo.requests")
        .with_description("Simulated request count")
        .build();
    let latency = meter
        .histogram("demo.latency")
        .with_unit("ms")
        .with_description("Simulated request latency")
        .build();

    let producer = tokio::spawn(async move {
        loop {
            let millis = rand::rng().random_range(1.0..40.0);
            requests.add(1.0, &[Tag::new("route", "/demo")]);
            latency.record(millis, &[Tag::new("route", "/demo")]);
            produced_total.fetch_add(2, Ordering::Relaxed);
            tokio::time::sleep(Duration::from_millis(250)).await;
        }
    });

    info!("Relay running - press Ctrl+C to stop");

    if args.duration > 0 {
        tokio::select! {
            _ = tokio::time::sleep(Duration::from_secs(args.duration)) => {
                info!(seconds = args.duration, "Duration elapsed, stopping");
            }
            _ = shutdown_signal() => {
                warn!("Received shutdown signal, stopping relay...");
            }
        }
    } else {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping relay...");
    }

    producer.abort();
    provider.stop().await;

    let stats = provider.dispatcher_metrics();
    info!(
        submitted = stats.submitted_count,
        applied = stats.applied_count,
        failed = stats.failure_count,
        drained = stats.drained_count,
        "Relay stopped"
    );

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

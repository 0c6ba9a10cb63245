//! Dispatcher - bounded queue + fixed worker pool in front of a sink

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_channel::{Receiver, Sender};
use contracts::{ContractError, StatSink, Tag};
use observability::{metrics as self_metrics, ErrorHandler};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

use crate::job::WriteJob;
use crate::metrics::{DispatcherMetrics, DispatcherMetricsSnapshot};

/// Worker pool applying [`WriteJob`]s to a wrapped sink.
///
/// Lifecycle: constructed idle, `start()` spawns the workers, `stop()` joins
/// them and drains the queue. A stopped dispatcher cannot be restarted;
/// construct a new one.
pub struct Dispatcher<S> {
    sink: Arc<S>,
    rx: Receiver<WriteJob>,
    handle: SubmitHandle,
    workers: usize,
    stop_tx: watch::Sender<bool>,
    stop_rx: watch::Receiver<bool>,
    worker_handles: Mutex<Vec<JoinHandle<()>>>,
    started: AtomicBool,
    stopped: AtomicBool,
    metrics: Arc<DispatcherMetrics>,
    error_handler: ErrorHandler,
}

impl<S> Dispatcher<S>
where
    S: StatSink + Send + Sync + 'static,
{
    /// Create an idle dispatcher wrapping `sink`.
    ///
    /// `queue_capacity` of `None` (or 0) falls back to `workers * 10`.
    pub fn new(
        sink: S,
        workers: usize,
        queue_capacity: Option<usize>,
        error_handler: ErrorHandler,
    ) -> Self {
        let capacity = match queue_capacity {
            Some(cap) if cap > 0 => cap,
            _ => workers.max(1) * 10,
        };
        let (tx, rx) = async_channel::bounded(capacity);
        let (stop_tx, stop_rx) = watch::channel(false);
        let metrics = Arc::new(DispatcherMetrics::new());

        let handle = SubmitHandle {
            sink_name: Arc::from(sink.name()),
            tx,
            metrics: Arc::clone(&metrics),
            error_handler: Arc::clone(&error_handler),
        };

        Self {
            sink: Arc::new(sink),
            rx,
            handle,
            workers,
            stop_tx,
            stop_rx,
            worker_handles: Mutex::new(Vec::new()),
            started: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
            metrics,
            error_handler,
        }
    }

    /// Spawn the worker tasks.
    ///
    /// # Errors
    /// Returns [`ContractError::NoWorkers`] when configured with zero workers,
    /// and an error when the dispatcher was already started.
    #[instrument(name = "dispatcher_start", skip(self), fields(workers = self.workers))]
    pub fn start(&self) -> Result<(), ContractError> {
        if self.workers == 0 {
            return Err(ContractError::NoWorkers);
        }
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(ContractError::Other("dispatcher already started".into()));
        }

        let mut handles = self.worker_handles.lock().unwrap();
        for id in 0..self.workers {
            let sink = Arc::clone(&self.sink);
            let rx = self.rx.clone();
            let stop_rx = self.stop_rx.clone();
            let metrics = Arc::clone(&self.metrics);
            let error_handler = Arc::clone(&self.error_handler);
            handles.push(tokio::spawn(async move {
                worker_loop(id, sink, rx, stop_rx, metrics, error_handler).await;
            }));
        }

        info!(workers = self.workers, "Dispatcher started");
        Ok(())
    }

    /// Submit a job, blocking the calling thread while the queue is full.
    ///
    /// Back-pressure is intentional: producers block briefly rather than drop
    /// data. Async callers on a current-thread runtime should prefer
    /// [`SubmitHandle::submit_async`].
    pub fn submit(&self, job: WriteJob) {
        self.handle.submit(job);
    }

    /// A cheap cloneable handle for producers.
    ///
    /// The handle exposes the same write interface as the wrapped sink, so
    /// callers are unaware of the queue in between.
    pub fn handle(&self) -> SubmitHandle {
        self.handle.clone()
    }

    /// Counter snapshot
    pub fn metrics(&self) -> DispatcherMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Signal the workers to exit, join them, then drain the queue.
    ///
    /// Every job submitted before this call is applied to the sink by the
    /// time it returns: either by a worker, or inline here during the drain.
    /// Idempotent; concurrent calls run the shutdown logic exactly once.
    #[instrument(name = "dispatcher_stop", skip(self))]
    pub async fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            debug!("Dispatcher already stopped");
            return;
        }

        let _ = self.stop_tx.send(true);

        let handles: Vec<JoinHandle<()>> = self.worker_handles.lock().unwrap().drain(..).collect();
        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = ?e, "Dispatcher worker panicked");
            }
        }

        // Refuse new submissions, then apply whatever is still buffered.
        self.handle.tx.close();
        let mut drained = 0u64;
        while let Ok(job) = self.rx.try_recv() {
            drained += 1;
            apply_job(
                &job,
                self.sink.as_ref(),
                &self.metrics,
                &self.error_handler,
            )
            .await;
        }
        self.metrics.add_drained_count(drained);
        self.metrics.set_queue_len(0);
        self_metrics::record_jobs_drained(drained);

        info!(drained, "Dispatcher stopped");
    }
}

/// Cloneable producer-side handle to a dispatcher queue
#[derive(Clone)]
pub struct SubmitHandle {
    sink_name: Arc<str>,
    tx: Sender<WriteJob>,
    metrics: Arc<DispatcherMetrics>,
    error_handler: ErrorHandler,
}

impl SubmitHandle {
    /// Submit a job, blocking the calling thread while the queue is full
    pub fn submit(&self, job: WriteJob) {
        match self.tx.send_blocking(job) {
            Ok(()) => self.accept(),
            Err(err) => self.reject(err.into_inner()),
        }
    }

    /// Submit a job, awaiting while the queue is full
    pub async fn submit_async(&self, job: WriteJob) {
        match self.tx.send(job).await {
            Ok(()) => self.accept(),
            Err(err) => self.reject(err.into_inner()),
        }
    }

    fn accept(&self) {
        self.metrics.inc_submitted_count();
        self.metrics.set_queue_len(self.tx.len());
        self_metrics::record_job_submitted();
    }

    // The queue only rejects after stop(); report and discard.
    fn reject(&self, job: WriteJob) {
        (self.error_handler)(&ContractError::DispatcherStopped {
            metric: job.metric_name().to_string(),
        });
    }
}

impl StatSink for SubmitHandle {
    fn name(&self) -> &str {
        &self.sink_name
    }

    async fn inc(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.submit_async(WriteJob::Inc {
            stat: stat.to_string(),
            value,
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn dec(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.submit_async(WriteJob::Dec {
            stat: stat.to_string(),
            value,
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn gauge(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.submit_async(WriteJob::Gauge {
            stat: stat.to_string(),
            value,
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn gauge_delta(&self, stat: &str, delta: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.submit_async(WriteJob::GaugeDelta {
            stat: stat.to_string(),
            delta,
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn timing(&self, stat: &str, millis: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.submit_async(WriteJob::Timing {
            stat: stat.to_string(),
            millis,
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn timing_duration(
        &self,
        stat: &str,
        duration: Duration,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError> {
        self.submit_async(WriteJob::TimingDuration {
            stat: stat.to_string(),
            duration,
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn set(&self, stat: &str, value: &str, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.submit_async(WriteJob::Set {
            stat: stat.to_string(),
            value: value.to_string(),
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn set_int(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.submit_async(WriteJob::SetInt {
            stat: stat.to_string(),
            value,
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }

    async fn raw(&self, stat: &str, value: &str, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.submit_async(WriteJob::Raw {
            stat: stat.to_string(),
            value: value.to_string(),
            rate,
            tags: tags.to_vec(),
        })
        .await;
        Ok(())
    }
}

/// Worker task pulling jobs off the shared queue
#[instrument(name = "dispatcher_worker_loop", skip_all, fields(worker = id))]
async fn worker_loop<S>(
    id: usize,
    sink: Arc<S>,
    rx: Receiver<WriteJob>,
    mut stop_rx: watch::Receiver<bool>,
    metrics: Arc<DispatcherMetrics>,
    error_handler: ErrorHandler,
) where
    S: StatSink + Send + Sync + 'static,
{
    debug!(worker = id, "Dispatcher worker started");

    loop {
        tokio::select! {
            job = rx.recv() => match job {
                Ok(job) => {
                    metrics.set_queue_len(rx.len());
                    self_metrics::record_queue_depth(rx.len());
                    apply_job(&job, sink.as_ref(), &metrics, &error_handler).await;
                }
                // Queue closed and empty
                Err(_) => break,
            },
            _ = stop_rx.changed() => break,
        }
    }

    debug!(worker = id, "Dispatcher worker stopped");
}

/// Apply one job, swallowing sink errors at this boundary.
///
/// Metric emission is best-effort: failures are logged, counted and reported
/// to the error handler, never returned to the producer.
async fn apply_job<S>(
    job: &WriteJob,
    sink: &S,
    metrics: &DispatcherMetrics,
    error_handler: &ErrorHandler,
) where
    S: StatSink + Sync,
{
    match job.apply(sink).await {
        Ok(()) => {
            metrics.inc_applied_count();
            self_metrics::record_job_applied(sink.name());
        }
        Err(e) => {
            metrics.inc_failure_count();
            self_metrics::record_job_failed(sink.name());
            error!(
                sink = sink.name(),
                metric = job.metric_name(),
                error = %e,
                "Write failed"
            );
            error_handler(&e);
        }
    }
}

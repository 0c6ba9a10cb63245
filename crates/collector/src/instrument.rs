//! Instruments and their resolved write path
//!
//! One instrument type per flavor (sync / observable) carrying a kind tag;
//! the sink operation is resolved once at creation time instead of through a
//! per-kind type hierarchy. Add-semantics kinds write through the sink's
//! increment path, record/histogram semantics through the timing path.

use std::sync::Arc;

use contracts::{InstrumentId, InstrumentKind, Resource, Scope, Tag};
use dispatcher::{SubmitHandle, WriteJob};
use observability::ErrorHandler;

/// Sink operation an instrument resolves to at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WriteOp {
    Increment,
    Timing,
}

impl WriteOp {
    pub(crate) fn for_kind(kind: InstrumentKind) -> Self {
        match kind {
            InstrumentKind::Histogram => Self::Timing,
            _ => Self::Increment,
        }
    }
}

/// Shared write-path state threaded into every instrument
#[derive(Clone)]
pub(crate) struct Emitter {
    pub submit: SubmitHandle,
    pub resource: Resource,
    pub error_handler: ErrorHandler,
}

impl Emitter {
    /// Build and submit the write job for one measurement.
    ///
    /// The `f64 -> i64` narrowing is deliberate: every value travels the
    /// sink's integer write path, so fractional parts are truncated.
    pub(crate) fn emit(&self, id: &InstrumentId, op: WriteOp, value: f64, tags: &[Tag]) {
        let tags = self.resource.collect_tags(tags);
        let job = match op {
            WriteOp::Increment => WriteJob::Inc {
                stat: id.name.clone(),
                value: value as i64,
                rate: 1.0,
                tags,
            },
            WriteOp::Timing => WriteJob::Timing {
                stat: id.name.clone(),
                millis: value as i64,
                rate: 1.0,
                tags,
            },
        };
        self.submit.submit(job);
    }
}

/// Synchronous (push-based) instrument
pub struct Instrument {
    id: InstrumentId,
    op: WriteOp,
    emitter: Option<Emitter>,
}

impl Instrument {
    pub(crate) fn new(id: InstrumentId, emitter: Option<Emitter>) -> Self {
        let op = WriteOp::for_kind(id.kind);
        Self { id, op, emitter }
    }

    pub fn id(&self) -> &InstrumentId {
        &self.id
    }

    /// Whether the taxonomy declined to back this instrument
    pub fn is_noop(&self) -> bool {
        self.emitter.is_none()
    }

    /// Record an increment (counter and up-down-counter kinds)
    pub fn add(&self, value: f64, tags: &[Tag]) {
        self.write(value, tags);
    }

    /// Record a distribution value (histogram kind)
    pub fn record(&self, value: f64, tags: &[Tag]) {
        self.write(value, tags);
    }

    fn write(&self, value: f64, tags: &[Tag]) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(&self.id, self.op, value, tags);
        }
    }
}

struct ObservableState {
    id: InstrumentId,
    op: WriteOp,
    emitter: Option<Emitter>,
}

/// Pull-based instrument, reported only through registered callbacks
#[derive(Clone)]
pub struct ObservableInstrument {
    state: Arc<ObservableState>,
}

impl ObservableInstrument {
    pub(crate) fn new(id: InstrumentId, emitter: Option<Emitter>) -> Self {
        let op = WriteOp::for_kind(id.kind);
        Self {
            state: Arc::new(ObservableState { id, op, emitter }),
        }
    }

    pub fn id(&self) -> &InstrumentId {
        &self.state.id
    }

    /// Whether the taxonomy declined to back this instrument
    pub fn is_noop(&self) -> bool {
        self.state.emitter.is_none()
    }

    /// Check that this instrument may be registered by `scope`.
    ///
    /// Returns the scope-mismatch message when the instrument belongs to a
    /// different meter.
    pub(crate) fn registerable(&self, scope: &Scope) -> Result<(), String> {
        if &self.state.id.scope != scope {
            return Err(format!(
                "invalid registration: observable \"{}\" from Meter \"{}\", registered with Meter \"{}\"",
                self.state.id.name, self.state.id.scope.name, scope.name,
            ));
        }
        Ok(())
    }

    /// Submit one observed value (identity checks happen in the observer)
    pub(crate) fn observe_value(&self, value: f64, tags: &[Tag]) {
        if let Some(emitter) = &self.state.emitter {
            emitter.emit(&self.state.id, self.state.op, value, tags);
        }
    }
}

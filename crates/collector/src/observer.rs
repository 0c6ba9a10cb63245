//! Observers handed to collection callbacks, and the Registration handle
//!
//! The multi-instrument observer enforces the registration's identity set:
//! an observation against an instrument outside the set is reported to the
//! error handler and dropped, never written and never a panic.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use contracts::{ContractError, InstrumentId, Tag};
use observability::ErrorHandler;

use crate::instrument::ObservableInstrument;
use crate::pipeline::{CallbackKey, Pipeline};

/// Observer for multi-instrument callbacks
pub struct MultiObserver {
    registered: HashSet<InstrumentId>,
    error_handler: ErrorHandler,
}

impl MultiObserver {
    pub(crate) fn new(registered: HashSet<InstrumentId>, error_handler: ErrorHandler) -> Self {
        Self {
            registered,
            error_handler,
        }
    }

    /// Report `value` through `instrument`.
    ///
    /// The instrument must match one of the identities passed at registration
    /// time; otherwise the observation is dropped and the error handler is
    /// notified while the sweep continues.
    pub fn observe(&self, instrument: &ObservableInstrument, value: f64, tags: &[Tag]) {
        if !self.registered.contains(instrument.id()) {
            (self.error_handler)(&ContractError::unregistered_observation(
                &instrument.id().name,
            ));
            return;
        }
        instrument.observe_value(value, tags);
    }
}

/// Observer for single-instrument callbacks, pre-bound to its instrument
pub struct SingleObserver {
    instrument: ObservableInstrument,
}

impl SingleObserver {
    pub(crate) fn new(instrument: ObservableInstrument) -> Self {
        Self { instrument }
    }

    /// Report `value` through the bound instrument
    pub fn observe(&self, value: f64, tags: &[Tag]) {
        self.instrument.observe_value(value, tags);
    }
}

/// Live binding between a registered callback and the pipeline.
///
/// `unregister` is idempotent and safe to call from concurrent callers: the
/// pipeline entry is taken out exactly once, and after any call returns the
/// callback never fires again.
pub struct Registration {
    entry: Mutex<Option<(Arc<Pipeline>, CallbackKey)>>,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").finish_non_exhaustive()
    }
}

impl Registration {
    pub(crate) fn new(pipeline: Arc<Pipeline>, key: CallbackKey) -> Self {
        Self {
            entry: Mutex::new(Some((pipeline, key))),
        }
    }

    /// A registration with nothing to unregister (empty instrument sets)
    pub(crate) fn noop() -> Self {
        Self {
            entry: Mutex::new(None),
        }
    }

    /// Remove the bound callback from the pipeline
    pub fn unregister(&self) {
        let entry = self.entry.lock().unwrap().take();
        if let Some((pipeline, key)) = entry {
            pipeline.unregister(key);
        }
    }

    /// Whether this registration still holds a live callback
    pub fn is_active(&self) -> bool {
        self.entry.lock().unwrap().is_some()
    }
}

//! Pipeline - the set of registered collection callbacks
//!
//! One mutex guards both mutation and iteration. Collection intervals are on
//! the order of tens of seconds, so the simple locking discipline wins over
//! a concurrent structure: a callback list can never be observed torn, and a
//! completed `unregister` guarantees the callback will not fire again.

use std::sync::Mutex;

use contracts::ContractError;
use slab::Slab;
use tracing::trace;

use crate::context::CollectContext;
use crate::error::CollectError;

/// A registered collection callback
pub type PipelineCallback =
    Box<dyn Fn(&CollectContext) -> Result<(), ContractError> + Send + Sync>;

/// Key identifying a multi-instrument callback for O(1) removal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallbackKey(usize);

#[derive(Default)]
struct PipelineInner {
    /// Single-instrument callbacks, in registration order
    callbacks: Vec<PipelineCallback>,
    /// Multi-instrument callbacks; slab keys stay stable across removals
    multi_callbacks: Slab<PipelineCallback>,
}

/// Ordered collections of collection callbacks, swept by `produce`
#[derive(Default)]
pub struct Pipeline {
    inner: Mutex<PipelineInner>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a single-instrument callback
    pub fn add_callback(&self, callback: PipelineCallback) {
        let mut inner = self.inner.lock().unwrap();
        inner.callbacks.push(callback);
    }

    /// Insert a multi-instrument callback; the key unregisters it later
    pub fn add_multi_callback(&self, callback: PipelineCallback) -> CallbackKey {
        let mut inner = self.inner.lock().unwrap();
        CallbackKey(inner.multi_callbacks.insert(callback))
    }

    /// Remove a multi-instrument callback.
    ///
    /// Idempotent: removing an already removed key is a no-op. Returns
    /// whether a callback was actually removed. Once this returns, the
    /// callback cannot fire again: removal takes the same mutex `produce`
    /// sweeps under.
    pub fn unregister(&self, key: CallbackKey) -> bool {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.multi_callbacks.try_remove(key.0).is_some();
        if removed {
            trace!(key = key.0, "callback unregistered");
        }
        removed
    }

    /// Number of (single, multi) callbacks currently registered
    pub fn callback_counts(&self) -> (usize, usize) {
        let inner = self.inner.lock().unwrap();
        (inner.callbacks.len(), inner.multi_callbacks.len())
    }

    /// Invoke every registered callback once, in registration order.
    ///
    /// Individual callback errors are accumulated and returned together so
    /// operators see every broken callback from one sweep; they never stop
    /// the iteration. A cancelled context aborts the sweep immediately with
    /// [`CollectError::Cancelled`]; observations already applied stand.
    ///
    /// Safe to call concurrently with registration and unregistration.
    pub fn produce(&self, cx: &CollectContext) -> Result<(), CollectError> {
        let inner = self.inner.lock().unwrap();
        let mut errors: Vec<String> = Vec::new();

        for callback in &inner.callbacks {
            if cx.is_cancelled() {
                return Err(CollectError::Cancelled);
            }
            if let Err(err) = callback(cx) {
                errors.push(err.to_string());
            }
        }
        for (_, callback) in inner.multi_callbacks.iter() {
            if cx.is_cancelled() {
                return Err(CollectError::Cancelled);
            }
            if let Err(err) = callback(cx) {
                errors.push(err.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(CollectError::Callbacks { errors })
        }
    }
}

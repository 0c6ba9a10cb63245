//! Process-wide hook for non-fatal errors
//!
//! Scope mismatches caught at observation time, sink write failures and sweep
//! errors are reported here rather than returned to producers. The handler is
//! an explicit constructor parameter everywhere it is consumed; there is no
//! ambient global to trip over in tests.

use std::error::Error;
use std::sync::Arc;

use tracing::warn;

/// Shared hook invoked with every non-fatal error.
///
/// Must tolerate concurrent calls; implementations should return quickly.
pub type ErrorHandler = Arc<dyn Fn(&(dyn Error + Send + Sync)) + Send + Sync>;

/// The default handler: log the error at WARN and move on
pub fn default_error_handler() -> ErrorHandler {
    Arc::new(|err| {
        warn!(error = %err, "metric emission error");
    })
}

/// A handler that swallows errors entirely (for tests and benchmarks)
pub fn noop_error_handler() -> ErrorHandler {
    Arc::new(|_| {})
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::ContractError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_handler_is_callable_concurrently() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        let handler: ErrorHandler = Arc::new(move |_| {
            hits_clone.fetch_add(1, Ordering::Relaxed);
        });

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let handler = Arc::clone(&handler);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        handler(&ContractError::Other("boom".into()));
                    }
                })
            })
            .collect();
        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(hits.load(Ordering::Relaxed), 400);
    }
}

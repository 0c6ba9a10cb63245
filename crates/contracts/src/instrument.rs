//! Instrument identity types
//!
//! An instrument is identified by its name, kind, unit, description and the
//! scope that created it. Identity equality is field-wise; the registry uses
//! it to decide which callbacks may report through which instruments.

use serde::{Deserialize, Serialize};

/// Instrument kind taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    /// Monotonic counter, written synchronously
    Counter,
    /// Bidirectional counter, written synchronously
    UpDownCounter,
    /// Value distribution, written synchronously
    Histogram,
    /// Monotonic counter, pulled by callback
    ObservableCounter,
    /// Bidirectional counter, pulled by callback
    ObservableUpDownCounter,
    /// Point-in-time value, pulled by callback
    ObservableGauge,
}

impl InstrumentKind {
    /// Whether this kind is pull-based (reported through registered callbacks)
    pub fn is_observable(self) -> bool {
        matches!(
            self,
            Self::ObservableCounter | Self::ObservableUpDownCounter | Self::ObservableGauge
        )
    }
}

/// The logical namespace that created an instrument.
///
/// Two scopes are equal only if every field matches; an instrument observed
/// from a callback registered by a different scope is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    /// Instrumentation name (e.g. a crate or subsystem name)
    pub name: String,
    /// Instrumentation version
    pub version: String,
    /// Schema URL, if any
    pub schema_url: String,
}

impl Scope {
    /// Create a scope with only a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Create a fully qualified scope
    pub fn with_version(
        name: impl Into<String>,
        version: impl Into<String>,
        schema_url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            schema_url: schema_url.into(),
        }
    }
}

/// Comparable unique identity of an instrument.
///
/// Used as the registry key for observable instruments.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InstrumentId {
    pub name: String,
    pub description: String,
    pub kind: InstrumentKind,
    pub unit: String,
    pub scope: Scope,
}

//! Configuration validation
//!
//! Rules:
//! - dispatcher.workers >= 1
//! - dispatcher.queue_capacity, when set, >= 1
//! - collect.interval_ms >= 1
//! - sink.addr parses as a socket address for network sinks
//! - disabled_instruments entries are unique and non-empty
//! - resource keys are non-empty

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{ContractError, RelayConfig, SinkKind};

/// Validate a RelayConfig
///
/// Returns the first violation encountered, or Ok(()).
pub fn validate(config: &RelayConfig) -> Result<(), ContractError> {
    validate_dispatcher(config)?;
    validate_collect(config)?;
    validate_sink(config)?;
    validate_instrument_filters(config)?;
    validate_resource(config)?;
    Ok(())
}

fn validate_dispatcher(config: &RelayConfig) -> Result<(), ContractError> {
    if config.dispatcher.workers == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.workers",
            "at least one worker is required",
        ));
    }
    if let Some(capacity) = config.dispatcher.queue_capacity {
        if capacity == 0 {
            return Err(ContractError::config_validation(
                "dispatcher.queue_capacity",
                "queue capacity must be positive (omit for the workers*10 default)",
            ));
        }
    }
    Ok(())
}

fn validate_collect(config: &RelayConfig) -> Result<(), ContractError> {
    if config.collect.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "collect.interval_ms",
            "sweep interval must be positive",
        ));
    }
    Ok(())
}

fn validate_sink(config: &RelayConfig) -> Result<(), ContractError> {
    if config.sink.kind == SinkKind::Udp && config.sink.addr.parse::<SocketAddr>().is_err() {
        return Err(ContractError::config_validation(
            "sink.addr",
            format!("invalid socket address '{}'", config.sink.addr),
        ));
    }
    Ok(())
}

fn validate_instrument_filters(config: &RelayConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for name in &config.disabled_instruments {
        if name.is_empty() {
            return Err(ContractError::config_validation(
                "disabled_instruments",
                "instrument name must not be empty",
            ));
        }
        if !seen.insert(name) {
            return Err(ContractError::config_validation(
                format!("disabled_instruments[{name}]"),
                "duplicate instrument name",
            ));
        }
    }
    Ok(())
}

fn validate_resource(config: &RelayConfig) -> Result<(), ContractError> {
    for key in config.resource.keys() {
        if key.is_empty() {
            return Err(ContractError::config_validation(
                "resource",
                "attribute key must not be empty",
            ));
        }
    }
    Ok(())
}

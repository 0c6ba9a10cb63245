//! Bundled sink implementations
//!
//! The dispatcher works against any [`contracts::StatSink`]; these are the
//! implementations shipped with the relay: a tracing-backed sink for demos
//! and tests, a demo-grade UDP statsd sink, and an in-memory recording sink.

mod log;
mod memory;
mod udp;

pub use log::LogSink;
pub use memory::{MemorySink, WriteRecord};
pub use udp::UdpStatSink;

//! UdpStatSink - statsd line protocol over UDP
//!
//! Demo-grade sink: one datagram per write, dogstatsd-style tag suffix,
//! fire-and-forget. Production deployments are expected to plug in their own
//! [`contracts::StatSink`] implementation.

use std::time::Duration;

use contracts::{ContractError, StatSink, Tag};
use tokio::net::UdpSocket;
use tracing::debug;

/// Sink that sends statsd lines to a UDP endpoint
pub struct UdpStatSink {
    name: String,
    socket: UdpSocket,
    prefix: String,
}

impl UdpStatSink {
    /// Bind a local socket and connect it to `addr` (e.g. "127.0.0.1:8125").
    ///
    /// `prefix` is prepended to every metric name; pass "" for none.
    pub async fn connect(
        name: impl Into<String>,
        addr: &str,
        prefix: impl Into<String>,
    ) -> Result<Self, ContractError> {
        let name = name.into();
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket
            .connect(addr)
            .await
            .map_err(|e| ContractError::sink_write(&name, format!("connect {addr}: {e}")))?;

        debug!(sink = %name, addr, "UdpStatSink connected");
        Ok(Self {
            name,
            socket,
            prefix: prefix.into(),
        })
    }

    fn format_line(&self, stat: &str, value: &str, kind: &str, rate: f32, tags: &[Tag]) -> String {
        let mut line = String::with_capacity(64);
        if !self.prefix.is_empty() {
            line.push_str(&self.prefix);
            line.push('.');
        }
        line.push_str(stat);
        line.push(':');
        line.push_str(value);
        if !kind.is_empty() {
            line.push('|');
            line.push_str(kind);
        }
        if rate < 1.0 {
            line.push_str(&format!("|@{rate}"));
        }
        if !tags.is_empty() {
            line.push_str("|#");
            for (i, tag) in tags.iter().enumerate() {
                if i > 0 {
                    line.push(',');
                }
                line.push_str(&tag.key);
                line.push(':');
                line.push_str(&tag.value);
            }
        }
        line
    }

    async fn send(
        &self,
        stat: &str,
        value: &str,
        kind: &str,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError> {
        let line = self.format_line(stat, value, kind, rate, tags);
        self.socket
            .send(line.as_bytes())
            .await
            .map_err(|e| ContractError::sink_write(&self.name, e.to_string()))?;
        Ok(())
    }
}

impl StatSink for UdpStatSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn inc(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.send(stat, &value.to_string(), "c", rate, tags).await
    }

    async fn dec(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.send(stat, &(-value).to_string(), "c", rate, tags).await
    }

    async fn gauge(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.send(stat, &value.to_string(), "g", rate, tags).await
    }

    async fn gauge_delta(&self, stat: &str, delta: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        // statsd distinguishes deltas from absolute sets by a leading sign
        self.send(stat, &format!("{delta:+}"), "g", rate, tags).await
    }

    async fn timing(&self, stat: &str, millis: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.send(stat, &millis.to_string(), "ms", rate, tags).await
    }

    async fn timing_duration(
        &self,
        stat: &str,
        duration: Duration,
        rate: f32,
        tags: &[Tag],
    ) -> Result<(), ContractError> {
        self.send(stat, &duration.as_millis().to_string(), "ms", rate, tags)
            .await
    }

    async fn set(&self, stat: &str, value: &str, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.send(stat, value, "s", rate, tags).await
    }

    async fn set_int(&self, stat: &str, value: i64, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.send(stat, &value.to_string(), "s", rate, tags).await
    }

    async fn raw(&self, stat: &str, value: &str, rate: f32, tags: &[Tag]) -> Result<(), ContractError> {
        self.send(stat, value, "", rate, tags).await
    }
}

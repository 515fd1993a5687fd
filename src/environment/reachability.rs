//! Local network reachability probing.
//!
//! # Design Decisions
//! - The probe is a trait so resolution can be tested without sockets
//! - Each probe carries its own deadline; nothing is cancelled globally
//! - A TCP handshake is enough to tell whether a local node is listening

use futures_util::future::BoxFuture;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Why a reachability probe failed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeFailure {
    #[error("connection to {addr} failed: {reason}")]
    Unreachable { addr: String, reason: String },

    #[error("no answer from {addr} within {timeout_ms} ms")]
    Timeout { addr: String, timeout_ms: u64 },
}

/// Checks whether something is listening at `host:port`.
pub trait ReachabilityProbe: Send + Sync {
    fn probe(&self, host: &str, port: u16, deadline: Duration) -> BoxFuture<'_, Result<(), ProbeFailure>>;
}

/// Probe that completes a TCP handshake and closes the socket.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpProbe;

impl ReachabilityProbe for TcpProbe {
    fn probe(&self, host: &str, port: u16, deadline: Duration) -> BoxFuture<'_, Result<(), ProbeFailure>> {
        let addr = format!("{}:{}", host, port);
        Box::pin(async move {
            match timeout(deadline, TcpStream::connect(&addr)).await {
                Ok(Ok(_stream)) => Ok(()),
                Ok(Err(e)) => Err(ProbeFailure::Unreachable {
                    addr,
                    reason: e.to_string(),
                }),
                Err(_) => Err(ProbeFailure::Timeout {
                    addr,
                    timeout_ms: deadline.as_millis() as u64,
                }),
            }
        })
    }
}

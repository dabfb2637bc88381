//! One-shot leader discovery
//!
//! A joining node binds the discovery port and blocks until one datagram
//! arrives; the payload is the leader's address string. With no timeout the
//! wait is unbounded, so the controller's reconnect loop always passes one.

use crate::common::{ClusterConfig, Error, Result};
use std::time::Duration;
use tokio::net::UdpSocket;

/// Wait for one leader announcement and return the advertised address.
///
/// Binding the discovery port fails if another role on this host already
/// holds it; that is fatal to the caller's current transition, not retried
/// here.
pub async fn discover_leader(
    config: &ClusterConfig,
    timeout: Option<Duration>,
) -> Result<String> {
    let addr = config.discovery_bind_addr();
    let socket = UdpSocket::bind(addr).await.map_err(|e| Error::Bind {
        addr,
        source: e,
    })?;

    let mut buf = [0u8; 256];
    let receive = socket.recv_from(&mut buf);
    let (len, from) = match timeout {
        Some(duration) => tokio::time::timeout(duration, receive)
            .await
            .map_err(|_| Error::DiscoveryTimeout)??,
        None => receive.await?,
    };

    let payload = std::str::from_utf8(&buf[..len])
        .map_err(|e| Error::MalformedPayload(format!("discovery datagram not UTF-8: {}", e)))?
        .trim()
        .to_string();
    if payload.is_empty() {
        return Err(Error::MalformedPayload(
            "empty discovery datagram".to_string(),
        ));
    }

    tracing::info!("discovered leader {} (announced from {})", payload, from);
    Ok(payload)
}

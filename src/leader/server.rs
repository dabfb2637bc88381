//! Leader runtime
//!
//! Started by the election controller when this node assumes leadership.
//! Owns every leader-side resource: the discovery and candidate-gossip
//! broadcasters, the TCP accept loop with one session task per follower,
//! the periodic self-metrics refresh, and the demotion evaluation loop.
//! All periodic tasks watch one stop channel and are joined with a bounded
//! grace period before forced cancellation, so a role switch never leaves
//! two roles' listeners alive at once.

use crate::common::utils::join_with_grace;
use crate::common::{ClusterConfig, Error, Result};
use crate::display::StatusSink;
use crate::leader::membership::MembershipTable;
use crate::metrics::{collect_record, MetricsProbe};
use crate::protocol::{gossip, read_message, NodeRole, TelemetryMessage};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

/// Why the leader runtime returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderExit {
    /// A strictly better node appeared; the controller re-enters discovery.
    Demoted,
    /// Operator shutdown.
    Shutdown,
}

/// Run as leader until demoted or shut down.
///
/// Binds all leader sockets up front; any bind failure is fatal to this
/// role transition and reported to the caller, which falls back to the
/// follower path rather than crashing the process.
pub async fn run(
    config: &ClusterConfig,
    address: &str,
    probe: Arc<dyn MetricsProbe>,
    sink: Arc<dyn StatusSink>,
    mut shutdown: watch::Receiver<bool>,
) -> Result<LeaderExit> {
    if *shutdown.borrow() {
        return Ok(LeaderExit::Shutdown);
    }

    let broadcast_ip: IpAddr = config.broadcast_addr.parse().map_err(|_| {
        Error::InvalidConfig(format!("invalid broadcast_addr: {}", config.broadcast_addr))
    })?;

    // Fresh table with the leader's own synthetic record. It has no session
    // and is therefore never evicted by disconnect; the refresh task keeps
    // its metrics and score current like any other entry.
    let table = Arc::new(MembershipTable::new());
    table.upsert(collect_record(probe.as_ref(), NodeRole::Leader, address));
    sink.push_snapshot(&table.snapshot());

    // Bind first; there is no fallback port.
    let service_addr = config.service_bind_addr();
    let listener = TcpListener::bind(service_addr)
        .await
        .map_err(|e| Error::Bind {
            addr: service_addr,
            source: e,
        })?;
    let discovery_socket = broadcast_socket(config).await?;
    let gossip_socket = broadcast_socket(config).await?;

    tracing::info!("assuming leadership as {} on {}", address, service_addr);
    sink.connection_status("Connected");

    let (stop_tx, stop_rx) = watch::channel(false);
    let mut tasks: Vec<JoinHandle<()>> = Vec::new();

    tasks.push(tokio::spawn(announce_loop(
        discovery_socket,
        address.to_string(),
        SocketAddr::new(broadcast_ip, config.discovery_port),
        config.discovery_interval(),
        stop_rx.clone(),
    )));
    tasks.push(tokio::spawn(gossip_loop(
        gossip_socket,
        table.clone(),
        SocketAddr::new(broadcast_ip, config.gossip_port),
        config.gossip_interval(),
        stop_rx.clone(),
    )));
    tasks.push(tokio::spawn(refresh_loop(
        table.clone(),
        probe.clone(),
        sink.clone(),
        address.to_string(),
        config.refresh_interval(),
        stop_rx.clone(),
    )));
    tasks.push(tokio::spawn(accept_loop(
        listener,
        table.clone(),
        sink.clone(),
        stop_rx,
        config.teardown_grace(),
    )));

    // Demotion evaluation runs in place; it owns the decision to stop.
    // The first tick waits a full period: the table needs at least one
    // gossip round behind it before stepping down is safe for the cluster.
    let mut eval = tokio::time::interval_at(
        tokio::time::Instant::now() + config.evaluation_interval(),
        config.evaluation_interval(),
    );
    let exit = loop {
        tokio::select! {
            _ = shutdown.changed() => break LeaderExit::Shutdown,
            _ = eval.tick() => {
                if let Some(better) = find_usurper(&table, address) {
                    tracing::info!(
                        "stepping down: {} scores {} against our {}",
                        better.0, better.1, better.2
                    );
                    break LeaderExit::Demoted;
                }
            }
        }
    };

    let _ = stop_tx.send(true);
    join_with_grace(tasks, config.teardown_grace()).await;
    sink.connection_status("Disconnected");
    tracing::info!("leader runtime stopped ({:?})", exit);
    Ok(exit)
}

/// Demote only when the table has company and the top entry is someone
/// else with a strictly greater score. A solitary leader never demotes.
fn find_usurper(table: &MembershipTable, own_address: &str) -> Option<(String, i32, i32)> {
    let snapshot = table.snapshot();
    if snapshot.len() <= 1 {
        return None;
    }
    let top = &snapshot[0];
    if top.address == own_address {
        return None;
    }
    let own_score = table.get(own_address).map(|r| r.score).unwrap_or(0);
    if top.score > own_score {
        Some((top.address.clone(), top.score, own_score))
    } else {
        None
    }
}

async fn broadcast_socket(config: &ClusterConfig) -> Result<UdpSocket> {
    let addr = SocketAddr::new(
        config
            .bind_ip
            .parse()
            .map_err(|_| Error::InvalidConfig(format!("invalid bind_ip: {}", config.bind_ip)))?,
        0,
    );
    let socket = UdpSocket::bind(addr).await.map_err(|e| Error::Bind {
        addr,
        source: e,
    })?;
    socket.set_broadcast(true)?;
    Ok(socket)
}

/// Periodically announce the leader's own address on the discovery port.
async fn announce_loop(
    socket: UdpSocket,
    address: String,
    target: SocketAddr,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        if let Err(e) = socket.send_to(address.as_bytes(), target).await {
            tracing::warn!("discovery broadcast failed: {}", e);
        } else {
            tracing::trace!("announced {} to {}", address, target);
        }
        if crate::common::sleep_or_shutdown(interval, &mut stop).await {
            return;
        }
    }
}

/// Periodically broadcast the top-3 candidates by descending score.
async fn gossip_loop(
    socket: UdpSocket,
    table: Arc<MembershipTable>,
    target: SocketAddr,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        let message = gossip::encode_candidates(&table.top_candidates(3));
        if !message.is_empty() {
            if let Err(e) = socket.send_to(message.as_bytes(), target).await {
                tracing::warn!("candidate gossip failed: {}", e);
            } else {
                tracing::trace!("gossiped candidates: {}", message);
            }
        }
        if crate::common::sleep_or_shutdown(interval, &mut stop).await {
            return;
        }
    }
}

/// Keep the leader's own record fresh so demotion decisions and gossip use
/// current numbers.
async fn refresh_loop(
    table: Arc<MembershipTable>,
    probe: Arc<dyn MetricsProbe>,
    sink: Arc<dyn StatusSink>,
    address: String,
    interval: Duration,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        if crate::common::sleep_or_shutdown(interval, &mut stop).await {
            return;
        }
        table.upsert(collect_record(probe.as_ref(), NodeRole::Leader, &address));
        sink.push_snapshot(&table.snapshot());
    }
}

/// Accept telemetry sessions without a concurrency bound; one task each.
async fn accept_loop(
    listener: TcpListener,
    table: Arc<MembershipTable>,
    sink: Arc<dyn StatusSink>,
    mut stop: watch::Receiver<bool>,
    grace: Duration,
) {
    let mut sessions = JoinSet::new();
    loop {
        tokio::select! {
            _ = stop.changed() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    tracing::info!("follower connected from {}", peer);
                    sessions.spawn(handle_session(
                        stream,
                        peer,
                        table.clone(),
                        sink.clone(),
                        stop.clone(),
                    ));
                }
                Err(e) => tracing::warn!("accept failed: {}", e),
            }
        }
    }
    // Release the well-known port before draining sessions
    drop(listener);
    let drain = async {
        while sessions.join_next().await.is_some() {}
    };
    if tokio::time::timeout(grace, drain).await.is_err() {
        tracing::warn!("forcing remaining telemetry sessions closed");
        sessions.shutdown().await;
    }
}

/// One follower's telemetry session. Reads one record per frame and upserts
/// it; any connection-level error evicts the follower and ends the task.
async fn handle_session(
    mut stream: TcpStream,
    peer: SocketAddr,
    table: Arc<MembershipTable>,
    sink: Arc<dyn StatusSink>,
    mut stop: watch::Receiver<bool>,
) {
    let peer_ip = peer.ip().to_string();
    // Identity of this session in the table, pinned by the first record;
    // falls back to the socket peer if the session dies before reporting.
    let mut identity: Option<String> = None;

    loop {
        let message = tokio::select! {
            _ = stop.changed() => break,
            message = read_message(&mut stream) => message,
        };
        match message {
            Ok(TelemetryMessage::Record(record)) => {
                // One session, one address: a record declaring a different
                // address would outlive its session's eviction, so drop it.
                match &identity {
                    Some(pinned) if *pinned != record.address => {
                        tracing::warn!(
                            "session for {} pushed a record for {}; dropping it",
                            pinned,
                            record.address
                        );
                        continue;
                    }
                    Some(_) => {}
                    None => identity = Some(record.address.clone()),
                }
                tracing::debug!("telemetry push from {} ({})", record.address, record.hostname);
                table.upsert(record);
                sink.push_snapshot(&table.snapshot());
            }
            Ok(other) => {
                tracing::warn!("unexpected telemetry message from {}: {:?}", peer_ip, other);
            }
            Err(e) => {
                tracing::warn!("telemetry session with {} ended: {}", peer_ip, e);
                let evicted = identity.take().unwrap_or_else(|| peer_ip.clone());
                if table.remove(&evicted) {
                    tracing::info!("evicted {}", evicted);
                    sink.push_snapshot(&table.snapshot());
                }
                return;
            }
        }
    }
    // Teardown path: the socket closes with the task; the table is
    // discarded wholesale on demotion.
}

//! End-to-end failover: a weak bootstrap leader hands over to a stronger
//! joiner, then rejoins it as a follower.
//!
//! Two nodes share port numbers but live on distinct loopback addresses
//! (127.0.0.1 and 127.0.0.2), with each node's "broadcast" target pointed
//! at the other so the UDP paths work without a real broadcast domain.

use minilead::common::ClusterConfig;
use minilead::display::NullSink;
use minilead::metrics::FixedProbe;
use minilead::{Node, RoleState};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

const DISCOVERY_PORT: u16 = 25600;
const GOSSIP_PORT: u16 = 25601;
const SERVICE_PORT: u16 = 25602;

fn node_config(own_ip: &str, peer_ip: &str, bootstrap_leader: bool) -> ClusterConfig {
    ClusterConfig {
        advertise_ip: Some(own_ip.to_string()),
        bind_ip: own_ip.to_string(),
        broadcast_addr: peer_ip.to_string(),
        discovery_port: DISCOVERY_PORT,
        gossip_port: GOSSIP_PORT,
        service_port: SERVICE_PORT,
        discovery_interval_secs: 1,
        gossip_interval_secs: 1,
        telemetry_interval_secs: 1,
        refresh_interval_secs: 1,
        evaluation_interval_secs: 3,
        reconnect_backoff_secs: 1,
        teardown_grace_secs: 1,
        bootstrap_leader,
    }
}

/// Poll a node until its role matches, or panic at the deadline.
async fn await_state<F>(node: &Arc<Node>, what: &str, deadline: Duration, mut predicate: F)
where
    F: FnMut(&RoleState) -> bool,
{
    let wait = async {
        loop {
            if predicate(&node.state()) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };
    if tokio::time::timeout(deadline, wait).await.is_err() {
        panic!("{}: still {} at deadline", what, node.state());
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn test_stronger_joiner_takes_over_leadership() {
    // Node A: weak hardware, boots the cold cluster as leader.
    let node_a = Arc::new(Node::new(
        node_config("127.0.0.1", "127.0.0.2", true),
        Arc::new(FixedProbe::with_memory_free("node-a", 4.0)),
        Arc::new(NullSink),
    ));
    // Node B: strong hardware, joins as an ordinary follower.
    let node_b = Arc::new(Node::new(
        node_config("127.0.0.2", "127.0.0.1", false),
        Arc::new(FixedProbe::with_memory_free("node-b", 30.0)),
        Arc::new(NullSink),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // B goes first so it is already listening when A's first announcement
    // and gossip round go out.
    let handle_b = {
        let node = node_b.clone();
        let shutdown = shutdown_rx.clone();
        tokio::spawn(async move { node.run(shutdown).await })
    };
    tokio::time::sleep(Duration::from_millis(300)).await;
    let handle_a = {
        let node = node_a.clone();
        let shutdown = shutdown_rx;
        tokio::spawn(async move { node.run(shutdown).await })
    };

    // B finds A and starts reporting.
    await_state(&node_b, "node B joining A", Duration::from_secs(15), |s| {
        *s == RoleState::FollowerConnected("127.0.0.1".to_string())
    })
    .await;

    // A's evaluation notices B's better score and steps down; B, ranked
    // first in A's last gossip, promotes itself.
    await_state(&node_b, "node B promotion", Duration::from_secs(30), |s| {
        *s == RoleState::Leader
    })
    .await;

    // The new leader is actually serving on its well-known port.
    let probe_connect = async {
        loop {
            if tokio::net::TcpStream::connect(("127.0.0.2", SERVICE_PORT))
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    };
    tokio::time::timeout(Duration::from_secs(10), probe_connect)
        .await
        .expect("new leader not reachable on the service port");

    // A rediscovers the cluster and follows B.
    await_state(&node_a, "node A rejoining", Duration::from_secs(30), |s| {
        *s == RoleState::FollowerConnected("127.0.0.2".to_string())
    })
    .await;

    shutdown_tx.send(true).unwrap();
    let _ = tokio::time::timeout(Duration::from_secs(10), handle_a).await;
    let _ = tokio::time::timeout(Duration::from_secs(10), handle_b).await;
}

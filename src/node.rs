//! Election / failover controller
//!
//! Per-node state machine owning the role transitions:
//!
//! ```text
//!   Discovering ──discovery + connect──▶ FollowerConnected
//!       │ ▲                                   │
//!       │ └────────send failure───────────────┘
//!       │
//!       └──primary candidate on failure──▶ Leader ──beaten on eval──▶ Discovering
//! ```
//!
//! Role switches are serialized: the old role's tasks are stopped (with a
//! bounded grace period) before the new role binds anything, so a node
//! never runs leader-side and follower-side listeners at once.

use crate::common::{sleep_or_shutdown, ClusterConfig, Result};
use crate::display::StatusSink;
use crate::follower::{self, CandidateTracker, SessionEnd};
use crate::leader::{self, LeaderExit};
use crate::metrics::MetricsProbe;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

/// The node's current role. Exactly one per process, owned and mutated by
/// the controller; everything else only reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleState {
    Discovering,
    FollowerConnected(String),
    Leader,
}

impl std::fmt::Display for RoleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RoleState::Discovering => write!(f, "discovering"),
            RoleState::FollowerConnected(leader) => write!(f, "follower of {}", leader),
            RoleState::Leader => write!(f, "leader"),
        }
    }
}

pub struct Node {
    config: ClusterConfig,
    address: String,
    probe: Arc<dyn MetricsProbe>,
    sink: Arc<dyn StatusSink>,
    state: Mutex<RoleState>,
}

impl Node {
    pub fn new(
        config: ClusterConfig,
        probe: Arc<dyn MetricsProbe>,
        sink: Arc<dyn StatusSink>,
    ) -> Self {
        let address = config
            .advertise_ip
            .clone()
            .unwrap_or_else(|| crate::common::local_ip().to_string());
        Self {
            config,
            address,
            probe,
            sink,
            state: Mutex::new(RoleState::Discovering),
        }
    }

    /// The address peers use to reach this node; its identity key.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn state(&self) -> RoleState {
        self.state.lock().unwrap().clone()
    }

    fn set_state(&self, state: RoleState) {
        tracing::info!("role: {}", state);
        *self.state.lock().unwrap() = state;
    }

    /// Run until operator shutdown. There is no terminal role; the node
    /// keeps cycling between follower and leader as the cluster evolves.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut assume_leadership = self.config.bootstrap_leader;
        loop {
            if *shutdown.borrow() {
                return Ok(());
            }

            if !std::mem::take(&mut assume_leadership) {
                self.set_state(RoleState::Discovering);
                let promote = match self.follower_phase(&mut shutdown).await {
                    Ok(promote) => promote,
                    Err(e) => {
                        // Bind failure at follower role start: fatal to this
                        // transition, retried after the backoff.
                        tracing::error!("follower role start failed: {}", e);
                        if sleep_or_shutdown(self.config.reconnect_backoff(), &mut shutdown).await
                        {
                            return Ok(());
                        }
                        continue;
                    }
                };
                if !promote {
                    return Ok(());
                }
            }

            self.set_state(RoleState::Leader);
            match leader::run(
                &self.config,
                &self.address,
                self.probe.clone(),
                self.sink.clone(),
                shutdown.clone(),
            )
            .await
            {
                Ok(LeaderExit::Shutdown) => return Ok(()),
                Ok(LeaderExit::Demoted) => {
                    // The winner is concurrently self-promoting; rediscover
                    // it as an ordinary follower.
                    self.sink.connection_status("Attempting to reconnect...");
                }
                Err(e) => {
                    tracing::error!(
                        "leader role start failed: {}; falling back to follower",
                        e
                    );
                    if sleep_or_shutdown(self.config.reconnect_backoff(), &mut shutdown).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Run the follower side until we should promote (`Ok(true)`) or shut
    /// down (`Ok(false)`). The gossip listener lives for the whole phase
    /// and is torn down before leadership starts.
    async fn follower_phase(&self, shutdown: &mut watch::Receiver<bool>) -> Result<bool> {
        let tracker = Arc::new(CandidateTracker::new(self.address.clone()));
        let socket = follower::bind_gossip_socket(&self.config).await?;
        let (stop_tx, stop_rx) = watch::channel(false);
        let listener = tokio::spawn(follower::gossip::listen(socket, tracker.clone(), stop_rx));

        let outcome = self.discover_and_report(&tracker, shutdown).await;

        let _ = stop_tx.send(true);
        crate::common::join_with_grace(vec![listener], self.config.teardown_grace()).await;
        outcome
    }

    /// The discovery/reconnect loop. On any failure the candidate check
    /// runs first; only when we are not the primary candidate do we back
    /// off and rediscover.
    async fn discover_and_report(
        &self,
        tracker: &CandidateTracker,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<bool> {
        let backoff = self.config.reconnect_backoff();
        loop {
            if *shutdown.borrow() {
                return Ok(false);
            }

            let leader_ip =
                match follower::discover_leader(&self.config, Some(backoff)).await {
                    Ok(ip) => ip,
                    Err(e) => {
                        tracing::debug!("discovery attempt failed: {}", e);
                        if tracker.is_primary() {
                            tracing::info!(
                                "no leader reachable and we are the primary candidate; promoting"
                            );
                            return Ok(true);
                        }
                        if sleep_or_shutdown(backoff, shutdown).await {
                            return Ok(false);
                        }
                        continue;
                    }
                };

            let stream = match follower::connect(&self.config, &leader_ip).await {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::warn!("connect to {} failed: {}", leader_ip, e);
                    if tracker.is_primary() {
                        tracing::info!(
                            "leader unreachable and we are the primary candidate; promoting"
                        );
                        return Ok(true);
                    }
                    if sleep_or_shutdown(backoff, shutdown).await {
                        return Ok(false);
                    }
                    continue;
                }
            };

            self.set_state(RoleState::FollowerConnected(leader_ip.clone()));
            match follower::run_session(
                &self.config,
                stream,
                &self.address,
                self.probe.clone(),
                self.sink.clone(),
                shutdown,
            )
            .await
            {
                Ok(SessionEnd::Shutdown) => return Ok(false),
                Err(e) => {
                    // The stale socket is already closed (dropped by the
                    // session) before we retry.
                    tracing::warn!("telemetry session with {} broke: {}", leader_ip, e);
                    self.sink.connection_status("Disconnected");
                    self.sink.connection_status("Attempting to reconnect...");
                    self.set_state(RoleState::Discovering);
                    if tracker.is_primary() {
                        tracing::info!(
                            "lost the leader and we are the primary candidate; promoting"
                        );
                        return Ok(true);
                    }
                    if sleep_or_shutdown(backoff, shutdown).await {
                        return Ok(false);
                    }
                }
            }
        }
    }
}

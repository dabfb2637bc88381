//! Candidate gossip listener
//!
//! Followers watch the gossip port to learn where the leader last ranked
//! them. Only the most recent datagram counts: every receipt overwrites the
//! primary/secondary flags, and an address absent from the list clears them.
//! The flags are the leader's last broadcast opinion, not authoritative
//! membership; they gate self-promotion and nothing else.

use crate::common::{ClusterConfig, Error, Result};
use crate::protocol::gossip::parse_candidates;
use std::sync::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::watch;

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    primary: bool,
    secondary: bool,
}

/// Tracks whether the local node led the most recent candidate broadcast.
pub struct CandidateTracker {
    own_address: String,
    flags: Mutex<Flags>,
}

impl CandidateTracker {
    pub fn new(own_address: String) -> Self {
        Self {
            own_address,
            flags: Mutex::new(Flags::default()),
        }
    }

    /// Ingest one gossip datagram's ordered candidate list.
    pub fn observe(&self, candidates: &[(String, i32)]) {
        let mut flags = self.flags.lock().unwrap();
        *flags = Flags::default();
        for (position, (address, score)) in candidates.iter().enumerate() {
            if *address == self.own_address {
                match position {
                    0 => {
                        flags.primary = true;
                        tracing::debug!("we are the primary candidate (score {})", score);
                    }
                    1 => {
                        flags.secondary = true;
                        tracing::debug!("we are the secondary candidate (score {})", score);
                    }
                    _ => {}
                }
            }
        }
    }

    /// Did the last broadcast rank us first?
    pub fn is_primary(&self) -> bool {
        self.flags.lock().unwrap().primary
    }

    /// Did the last broadcast rank us second?
    pub fn is_secondary(&self) -> bool {
        self.flags.lock().unwrap().secondary
    }
}

/// Bind the gossip port. Separate from the listen loop so the caller can
/// treat a bind failure as fatal to the follower role transition.
pub async fn bind_gossip_socket(config: &ClusterConfig) -> Result<UdpSocket> {
    let addr = config.gossip_bind_addr();
    UdpSocket::bind(addr).await.map_err(|e| Error::Bind {
        addr,
        source: e,
    })
}

/// Continuous listener: parse each datagram and overwrite the tracker.
/// Runs until the stop channel flips; datagram-level errors are logged and
/// the loop keeps going.
pub async fn listen(
    socket: UdpSocket,
    tracker: std::sync::Arc<CandidateTracker>,
    mut stop: watch::Receiver<bool>,
) {
    let mut buf = [0u8; 1024];
    loop {
        let received = tokio::select! {
            _ = stop.changed() => return,
            received = socket.recv_from(&mut buf) => received,
        };
        match received {
            Ok((len, _from)) => match std::str::from_utf8(&buf[..len]) {
                Ok(message) => {
                    tracing::trace!("gossip: {}", message);
                    tracker.observe(&parse_candidates(message));
                }
                Err(e) => tracing::debug!("ignoring non-UTF-8 gossip datagram: {}", e),
            },
            Err(e) => tracing::warn!("gossip receive failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_flag_set_at_position_zero() {
        let tracker = CandidateTracker::new("10.0.0.2".to_string());
        tracker.observe(&[
            ("10.0.0.2".to_string(), 91),
            ("10.0.0.3".to_string(), 77),
        ]);
        assert!(tracker.is_primary());
        assert!(!tracker.is_secondary());
    }

    #[test]
    fn test_secondary_flag_set_at_position_one() {
        let tracker = CandidateTracker::new("10.0.0.3".to_string());
        tracker.observe(&[
            ("10.0.0.2".to_string(), 91),
            ("10.0.0.3".to_string(), 77),
        ]);
        assert!(!tracker.is_primary());
        assert!(tracker.is_secondary());
    }

    #[test]
    fn test_absence_clears_both_flags() {
        let tracker = CandidateTracker::new("10.0.0.2".to_string());
        tracker.observe(&[("10.0.0.2".to_string(), 91)]);
        assert!(tracker.is_primary());

        tracker.observe(&[("10.0.0.9".to_string(), 99)]);
        assert!(!tracker.is_primary());
        assert!(!tracker.is_secondary());
    }

    #[test]
    fn test_latest_datagram_wins() {
        // Simulated out-of-order delivery: the tracker must reflect the
        // most recently received datagram, whatever it says.
        let tracker = CandidateTracker::new("10.0.0.2".to_string());

        // "Newer" datagram arrives first, ranking us primary
        tracker.observe(&[("10.0.0.2".to_string(), 91)]);
        assert!(tracker.is_primary());

        // "Older" datagram arrives late and demotes us; it still wins
        // because receipt order is all the tracker knows.
        tracker.observe(&[
            ("10.0.0.9".to_string(), 95),
            ("10.0.0.2".to_string(), 91),
        ]);
        assert!(!tracker.is_primary());
        assert!(tracker.is_secondary());
    }

    #[test]
    fn test_third_place_sets_nothing() {
        let tracker = CandidateTracker::new("10.0.0.4".to_string());
        tracker.observe(&[
            ("10.0.0.2".to_string(), 91),
            ("10.0.0.3".to_string(), 77),
            ("10.0.0.4".to_string(), 60),
        ]);
        assert!(!tracker.is_primary());
        assert!(!tracker.is_secondary());
    }
}

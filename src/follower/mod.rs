//! Follower-side runtime
//!
//! The follower is responsible for:
//! - One-shot leader discovery on the broadcast port
//! - Listening to candidate gossip to learn its own rank
//! - Pushing telemetry to the leader over one persistent session

pub mod discovery;
pub mod gossip;
pub mod session;

pub use discovery::discover_leader;
pub use gossip::{bind_gossip_socket, CandidateTracker};
pub use session::{connect, run_session, SessionEnd};

//! Leader-side runtime
//!
//! The leader is responsible for:
//! - Announcing its address on the discovery port
//! - Accepting telemetry sessions and maintaining the membership table
//! - Broadcasting the ranked top-3 candidates
//! - Evaluating itself for demotion on a fixed interval

pub mod membership;
pub mod server;

pub use membership::MembershipTable;
pub use server::{run, LeaderExit};

//! Common utilities and types shared across minilead

pub mod config;
pub mod error;
pub mod score;
pub mod utils;

pub use config::ClusterConfig;
pub use error::{Error, Result};
pub use utils::{
    format_gb, format_ghz, format_pct, join_with_grace, local_ip, numeric_value,
    sleep_or_shutdown,
};

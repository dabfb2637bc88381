//! Utility functions for minilead

use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::watch;

/// Best-effort detection of the local routable IP.
///
/// Opens a UDP socket "towards" a public address without sending anything;
/// the kernel picks the outbound interface and we read its address back.
/// Falls back to loopback on hosts with no route.
pub fn local_ip() -> IpAddr {
    std::net::UdpSocket::bind("0.0.0.0:0")
        .and_then(|socket| {
            socket.connect("8.8.8.8:80")?;
            socket.local_addr()
        })
        .map(|addr| addr.ip())
        .unwrap_or_else(|_| "127.0.0.1".parse().unwrap())
}

/// Strip everything but digits and dots, then parse.
///
/// Metric fields travel as display-formatted strings ("3.20 GHz",
/// "457.13 GB"); unparseable input contributes 0 instead of an error.
pub fn numeric_value(s: &str) -> f64 {
    let cleaned: String = s.chars().filter(|c| c.is_ascii_digit() || *c == '.').collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Format helpers matching the record wire conventions.
pub fn format_ghz(ghz: f64) -> String {
    format!("{:.2} GHz", ghz)
}

pub fn format_gb(gb: f64) -> String {
    format!("{:.2} GB", gb)
}

pub fn format_pct(pct: f64) -> String {
    format!("{:.2} %", pct)
}

/// Sleep that a shutdown signal can interrupt.
///
/// Returns `true` when the sleep was cut short by shutdown, so callers can
/// break out of their retry loops promptly instead of finishing the backoff.
pub async fn sleep_or_shutdown(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        res = shutdown.changed() => {
            res.is_err() || *shutdown.borrow()
        }
    }
}

/// Wait for each task to stop gracefully, then cancel stragglers.
///
/// Role teardown must complete before the next role's resources start;
/// tasks that miss the grace window are aborted so a hung socket cannot
/// wedge a role switch.
pub async fn join_with_grace(tasks: Vec<tokio::task::JoinHandle<()>>, grace: Duration) {
    for mut task in tasks {
        if tokio::time::timeout(grace, &mut task).await.is_err() {
            task.abort();
            let _ = task.await;
        }
    }
}

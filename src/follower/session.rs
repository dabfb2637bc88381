//! Follower telemetry session
//!
//! One persistent connection to the current leader. Every tick the session
//! gathers a fresh record and pushes it; the first send failure breaks the
//! session and returns control to the election controller's reconnect path.
//! There is no retry in here.

use crate::common::{ClusterConfig, Error, Result};
use crate::display::StatusSink;
use crate::metrics::{collect_record, MetricsProbe};
use crate::protocol::{write_message, NodeRole, TelemetryMessage};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::watch;

/// Why the session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Shutdown,
}

/// Open the telemetry connection to `leader_ip` on the service port.
pub async fn connect(config: &ClusterConfig, leader_ip: &str) -> Result<TcpStream> {
    let target = format!("{}:{}", leader_ip, config.service_port);
    TcpStream::connect(&target)
        .await
        .map_err(|e| Error::ConnectionFailed(format!("{}: {}", target, e)))
}

/// Push telemetry over an established connection until something breaks.
///
/// Returns `Ok(SessionEnd::Shutdown)` only on operator shutdown; any send
/// failure surfaces as `SessionClosed` for the controller to handle. The
/// socket is dropped (closed) before this function returns.
pub async fn run_session(
    config: &ClusterConfig,
    mut stream: TcpStream,
    own_address: &str,
    probe: Arc<dyn MetricsProbe>,
    sink: Arc<dyn StatusSink>,
    shutdown: &mut watch::Receiver<bool>,
) -> Result<SessionEnd> {
    let target = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    tracing::info!("telemetry session established with {}", target);
    sink.connection_status("Connected");

    let mut ticker = tokio::time::interval(config.telemetry_interval());
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                tracing::info!("telemetry session closing on shutdown");
                return Ok(SessionEnd::Shutdown);
            }
            _ = ticker.tick() => {
                let record = collect_record(probe.as_ref(), NodeRole::Follower, own_address);
                // The display mirrors what we just reported upstream
                sink.push_snapshot(std::slice::from_ref(&record));
                write_message(&mut stream, &TelemetryMessage::Record(record))
                    .await
                    .map_err(|e| Error::SessionClosed(format!("{}: {}", target, e)))?;
                tracing::debug!("pushed telemetry to {}", target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::NullSink;
    use crate::metrics::FixedProbe;

    fn test_config(service_port: u16) -> ClusterConfig {
        ClusterConfig {
            bind_ip: "127.0.0.1".to_string(),
            service_port,
            telemetry_interval_secs: 1,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_connect_refused_is_connection_failed() {
        let config = test_config(24410);
        let err = connect(&config, "127.0.0.1").await.unwrap_err();
        assert!(matches!(err, Error::ConnectionFailed(_)));
    }

    #[tokio::test]
    async fn test_send_failure_after_peer_close_is_session_closed() {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        let config = test_config(24411);
        let listener = TcpListener::bind("127.0.0.1:24411").await.unwrap();

        // Accept one connection, read one frame, then slam it shut.
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = stream.read(&mut buf).await;
            drop(stream);
        });

        let stream = connect(&config, "127.0.0.1").await.unwrap();
        let probe = Arc::new(FixedProbe::with_memory_free("node", 8.0));
        let (_tx, mut rx) = watch::channel(false);
        let err = run_session(
            &config,
            stream,
            "127.0.0.1",
            probe,
            Arc::new(NullSink),
            &mut rx,
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::SessionClosed(_)));
    }

    #[tokio::test]
    async fn test_shutdown_ends_session_cleanly() {
        use tokio::net::TcpListener;

        let config = test_config(24412);
        let listener = TcpListener::bind("127.0.0.1:24412").await.unwrap();
        tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            // Hold the socket open until the test ends
            tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        });

        let stream = connect(&config, "127.0.0.1").await.unwrap();
        let probe = Arc::new(FixedProbe::with_memory_free("node", 8.0));
        let (tx, mut rx) = watch::channel(false);
        let session = tokio::spawn(async move {
            run_session(
                &config,
                stream,
                "127.0.0.1",
                probe,
                Arc::new(NullSink),
                &mut rx,
            )
            .await
        });

        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        tx.send(true).unwrap();
        let end = session.await.unwrap().unwrap();
        assert_eq!(end, SessionEnd::Shutdown);
    }
}

use super::{ConnectionTracker, DiagnosticSnapshot};
use crate::Result;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tracing::info;

/// Spawns a task that logs a [`DiagnosticSnapshot`] every time the process
/// receives `SIGUSR1`.
///
/// The handler is installed before this returns, so a signal sent right
/// after startup is not lost.
pub fn spawn_dump_listener(tracker: Arc<ConnectionTracker>) -> Result<JoinHandle<()>> {
    spawn_dump_listener_with(tracker, log_snapshot)
}

/// Like [`spawn_dump_listener`], handing each snapshot to `sink`
pub fn spawn_dump_listener_with<F>(
    tracker: Arc<ConnectionTracker>,
    mut sink: F,
) -> Result<JoinHandle<()>>
where
    F: FnMut(DiagnosticSnapshot) + Send + 'static,
{
    let mut usr1 = signal(SignalKind::user_defined1())?;

    Ok(tokio::spawn(async move {
        while usr1.recv().await.is_some() {
            sink(tracker.snapshot());
        }
    }))
}

fn log_snapshot(snapshot: DiagnosticSnapshot) {
    info!(
        active_connections = snapshot.connections.len(),
        "SIGUSR1 received, dumping diagnostics\n{snapshot}"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_sigusr1_dumps_live_connections() {
        let tracker = Arc::new(ConnectionTracker::new());
        let guard = tracker.register("198.51.100.7:5000".parse().unwrap());
        guard.record_request("GET /status HTTP/1.1".to_string());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_dump_listener_with(Arc::clone(&tracker), move |snapshot| {
            let _ = tx.send(snapshot);
        })
        .unwrap();

        let status = Command::new("kill")
            .args(["-USR1", &std::process::id().to_string()])
            .status()
            .unwrap();
        assert!(status.success());

        let snapshot = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(snapshot.total_requests, 1);
        assert_eq!(snapshot.connections.len(), 1);
        assert_eq!(
            snapshot.connections[0].last_request.as_deref(),
            Some("GET /status HTTP/1.1")
        );

        let rendered = snapshot.to_string();
        assert!(rendered.contains("peer=198.51.100.7:5000"));
        handle.abort();
    }
}

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Live connection registry backing the diagnostic dump
#[derive(Debug)]
pub struct ConnectionTracker {
    started_at: Instant,
    next_id: AtomicU64,
    total_connections: AtomicU64,
    total_requests: AtomicU64,
    active: Mutex<BTreeMap<u64, ConnectionEntry>>,
}

#[derive(Debug)]
struct ConnectionEntry {
    peer: SocketAddr,
    opened_at: Instant,
    stats: Arc<ConnectionStats>,
}

#[derive(Debug, Default)]
struct ConnectionStats {
    requests: AtomicU64,
    last_request: Mutex<Option<String>>,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            next_id: AtomicU64::new(1),
            total_connections: AtomicU64::new(0),
            total_requests: AtomicU64::new(0),
            active: Mutex::new(BTreeMap::new()),
        }
    }

    /// Registers a new connection; it stays listed until the guard drops
    pub fn register(self: &Arc<Self>, peer: SocketAddr) -> ConnectionGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let total = self.total_connections.fetch_add(1, Ordering::Relaxed) + 1;
        let stats = Arc::new(ConnectionStats::default());
        self.entries().insert(
            id,
            ConnectionEntry {
                peer,
                opened_at: Instant::now(),
                stats: Arc::clone(&stats),
            },
        );
        tracing::debug!(id, %peer, total_connections = total, "Connection registered");

        ConnectionGuard {
            id,
            tracker: Arc::clone(self),
            stats,
        }
    }

    pub fn snapshot(&self) -> DiagnosticSnapshot {
        let now = Instant::now();
        let connections = self
            .entries()
            .iter()
            .map(|(id, entry)| ConnectionInfo {
                id: *id,
                peer: entry.peer,
                age: now.duration_since(entry.opened_at),
                requests: entry.stats.requests.load(Ordering::Relaxed),
                last_request: lock(&entry.stats.last_request).clone(),
            })
            .collect();

        DiagnosticSnapshot {
            uptime: now.duration_since(self.started_at),
            total_connections: self.total_connections.load(Ordering::Relaxed),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            connections,
        }
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<u64, ConnectionEntry>> {
        lock(&self.active)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// RAII registration of one connection
#[derive(Debug)]
pub struct ConnectionGuard {
    id: u64,
    tracker: Arc<ConnectionTracker>,
    stats: Arc<ConnectionStats>,
}

impl ConnectionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Counts a completed request
    pub fn record_request(&self, request_line: String) {
        self.stats.requests.fetch_add(1, Ordering::Relaxed);
        self.tracker.total_requests.fetch_add(1, Ordering::Relaxed);
        *lock(&self.stats.last_request) = Some(request_line);
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if let Some(entry) = self.tracker.entries().remove(&self.id) {
            tracing::debug!(
                id = self.id,
                peer = %entry.peer,
                requests = entry.stats.requests.load(Ordering::Relaxed),
                duration_ms = entry.opened_at.elapsed().as_millis(),
                "Connection released"
            );
        }
    }
}

/// Point-in-time view of the process
#[derive(Debug, Clone)]
pub struct DiagnosticSnapshot {
    pub uptime: Duration,
    pub total_connections: u64,
    pub total_requests: u64,
    pub connections: Vec<ConnectionInfo>,
}

#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub id: u64,
    pub peer: SocketAddr,
    pub age: Duration,
    pub requests: u64,
    pub last_request: Option<String>,
}

impl fmt::Display for DiagnosticSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "uptime={:.3}s total_connections={} total_requests={} active_connections={}",
            self.uptime.as_secs_f64(),
            self.total_connections,
            self.total_requests,
            self.connections.len()
        )?;
        for conn in &self.connections {
            writeln!(
                f,
                "  #{} peer={} age={:.3}s requests={} last={}",
                conn.id,
                conn.peer,
                conn.age.as_secs_f64(),
                conn.requests,
                conn.last_request.as_deref().unwrap_or("-")
            )?;
        }
        Ok(())
    }
}

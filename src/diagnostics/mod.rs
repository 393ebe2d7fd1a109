//! Out-of-band process introspection
//!
//! A [`ConnectionTracker`] follows every live connection; on Unix,
//! `SIGUSR1` logs its snapshot without pausing request handling.

#[cfg(unix)]
pub mod signal;
pub mod tracker;

#[cfg(unix)]
pub use signal::{spawn_dump_listener, spawn_dump_listener_with};
pub use tracker::{ConnectionGuard, ConnectionInfo, ConnectionTracker, DiagnosticSnapshot};

//! Common traits and helpers used across the echo-headers library
//!
//! This module contains the traits that define the server and client
//! interface, plus a helper for spinning up servers in tests.

pub mod test_utils;
pub mod traits;

pub use test_utils::spawn_test_server;
pub use traits::{EchoClient, EchoServerTrait};

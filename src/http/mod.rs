//! HTTP echo server implementation
//!
//! This module provides the HTTP/1.1 server that answers every request with a
//! plain-text echo of what it received: request line, headers, optionally the
//! body, the peer address and the outcome of `Expect: 100-continue`.

pub mod client;
pub mod config;
pub mod connection;
pub mod echo;
pub mod expect;
pub mod protocol;
pub mod query;
pub mod response;
pub mod server;


pub use client::{ClientConfig, EchoResponse, HttpEchoClient};
pub use config::{HttpConfig, resolve_bind_addr};
pub use connection::HttpConnection;
pub use protocol::{HttpError, RequestHead};
pub use server::HttpEchoServer;

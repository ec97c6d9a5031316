//! Axon - Minimal sequential TCP echo server
//!
//! This library provides a blocking TCP echo server that relays every byte a
//! client sends straight back to it. Connections are served strictly one at
//! a time; a client connecting mid-conversation waits in the operating
//! system's backlog until the current connection closes.

pub mod server;

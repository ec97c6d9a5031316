//! Server module for the Axon echo server

pub mod config;
pub mod connection;
pub mod error;
pub mod listener;
pub mod logging;
pub mod monitor;

pub use config::ServerConfig;
pub use connection::{relay_loop, ChunkStream, TcpChunkStream, CHUNK_SIZE};
pub use error::{Result, ServerError};
pub use listener::EchoListener;
pub use logging::init_logging;
pub use monitor::{ServerCounters, ServerMonitor};

//! Listening socket and sequential accept loop

use crate::server::config::ServerConfig;
use crate::server::connection::{relay_loop, TcpChunkStream};
use crate::server::error::{Result, ServerError};
use crate::server::monitor::ServerCounters;
use std::net::{SocketAddr, TcpListener, TcpStream};
use tracing::{error, info};

/// Sequential TCP echo listener.
///
/// Owns the listening socket for the process lifetime and serves accepted
/// connections strictly one at a time; clients connecting mid-conversation
/// wait in the operating system's backlog until the current connection
/// closes.
pub struct EchoListener {
    listener: TcpListener,
}

impl EchoListener {
    /// Bind the listening socket. Failure here is fatal to startup.
    pub fn bind(config: &ServerConfig) -> Result<Self> {
        let addr = config.address();
        let listener = TcpListener::bind(&addr).map_err(|e| ServerError::Bind {
            addr: addr.clone(),
            source: e,
        })?;
        Ok(Self { listener })
    }

    /// Local address of the bound socket (resolves the real port when bound
    /// to port 0).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, serving each to completion before the
    /// next. Accept errors are logged and counted; the loop carries on. There
    /// is no internal termination condition.
    pub fn run(&self, counters: &ServerCounters) -> Result<()> {
        for stream in self.listener.incoming() {
            match stream {
                Ok(stream) => {
                    counters.increment_connections();
                    serve(stream, counters);
                }
                Err(e) => {
                    counters.increment_error();
                    error!(error = %e, "Failed to accept connection");
                }
            }
        }

        Ok(())
    }
}

/// Serve one connection until the peer closes it or an I/O error ends it.
///
/// The stream is dropped on every exit path, so the socket closes even when
/// the relay fails partway through.
fn serve(stream: TcpStream, counters: &ServerCounters) {
    let peer_addr = stream.peer_addr().ok();
    info!(peer = ?peer_addr, "New client connected");

    let mut chunk_stream = TcpChunkStream::new(stream);
    match relay_loop(&mut chunk_stream, peer_addr, counters) {
        Ok(total) => {
            info!(peer = ?peer_addr, bytes = total, "Connection closed by peer");
        }
        Err(e) => {
            counters.increment_error();
            error!(error = %e, peer = ?peer_addr, "Connection error");
        }
    }
}

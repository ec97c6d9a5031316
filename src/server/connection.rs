use crate::server::error::{Result, ServerError};
use crate::server::monitor::ServerCounters;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use tracing::{debug, info, warn};

/// Maximum number of bytes moved by a single read, and therefore the largest
/// unit the server echoes back in one write.
pub const CHUNK_SIZE: usize = 1024;

/// Trait for byte stream operations at chunk granularity
pub trait ChunkStream {
    /// Read up to `buf.len()` bytes; a return of zero means the peer closed
    /// its end of the stream.
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Write the whole buffer, retrying short writes until every byte is sent
    fn write_chunk(&mut self, buf: &[u8]) -> Result<()>;
}

/// TCP-based implementation of ChunkStream
#[derive(Debug)]
pub struct TcpChunkStream {
    stream: TcpStream,
}

impl TcpChunkStream {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }
}

impl ChunkStream for TcpChunkStream {
    fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = self.stream.read(buf).map_err(|e| {
            debug!(error = %e, "Failed to read from stream");
            ServerError::Connection(e)
        })?;
        Ok(n)
    }

    fn write_chunk(&mut self, buf: &[u8]) -> Result<()> {
        // write_all keeps writing across short writes until the buffer is out
        self.stream.write_all(buf).map_err(|e| {
            warn!(error = %e, "Failed to write to stream");
            ServerError::Connection(e)
        })?;
        Ok(())
    }
}

/// Relay every byte the peer sends straight back to it.
///
/// Reads chunks of at most [`CHUNK_SIZE`] bytes and writes each one back in
/// full before the next read. Returns the total number of bytes echoed once
/// the peer closes the stream (zero-length read). A read or write error ends
/// only this connection; the caller decides what happens next.
pub fn relay_loop<S: ChunkStream>(
    stream: &mut S,
    peer: Option<SocketAddr>,
    counters: &ServerCounters,
) -> Result<u64> {
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = stream.read_chunk(&mut buf)?;
        if n == 0 {
            debug!(peer = ?peer, "Peer closed the stream");
            return Ok(total);
        }

        counters.add_received(n as u64);
        info!(peer = ?peer, bytes = n, "Echoing chunk");

        stream.write_chunk(&buf[..n])?;
        counters.add_echoed(n as u64);
        total += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::monitor::ServerMonitor;
    use mockall::mock;
    use mockall::Sequence;
    use std::io::ErrorKind;

    mock! {
        pub ChunkStream {}

        impl ChunkStream for ChunkStream {
            fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize>;
            fn write_chunk(&mut self, buf: &[u8]) -> Result<()>;
        }
    }

    #[test]
    fn test_relay_echoes_until_peer_closes() -> Result<()> {
        let monitor = ServerMonitor::new(100);
        let counters = monitor.counters();
        let mut mock_stream = MockChunkStream::new();
        let mut seq = Sequence::new();

        mock_stream
            .expect_read_chunk()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|buf| {
                buf[..5].copy_from_slice(b"hello");
                Ok(5)
            });

        mock_stream
            .expect_write_chunk()
            .withf(|buf: &[u8]| buf == b"hello")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        mock_stream
            .expect_read_chunk()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(0));

        let total = relay_loop(&mut mock_stream, None, &counters)?;
        assert_eq!(total, 5);

        let stats = monitor.stats();
        assert_eq!(stats.bytes_received, 5);
        assert_eq!(stats.bytes_echoed, 5);
        Ok(())
    }

    #[test]
    fn test_relay_immediate_close_echoes_nothing() -> Result<()> {
        let monitor = ServerMonitor::new(100);
        let counters = monitor.counters();
        let mut mock_stream = MockChunkStream::new();

        mock_stream.expect_read_chunk().times(1).returning(|_| Ok(0));
        mock_stream.expect_write_chunk().times(0);

        let total = relay_loop(&mut mock_stream, None, &counters)?;
        assert_eq!(total, 0);
        assert_eq!(monitor.stats().bytes_echoed, 0);
        Ok(())
    }

    #[test]
    fn test_relay_read_error_ends_connection() {
        let monitor = ServerMonitor::new(100);
        let counters = monitor.counters();
        let mut mock_stream = MockChunkStream::new();

        mock_stream.expect_read_chunk().times(1).returning(|_| {
            Err(ServerError::Connection(std::io::Error::from(
                ErrorKind::ConnectionReset,
            )))
        });

        let result = relay_loop(&mut mock_stream, None, &counters);
        assert!(result.is_err());
    }

    #[test]
    fn test_relay_write_error_ends_connection() {
        let monitor = ServerMonitor::new(100);
        let counters = monitor.counters();
        let mut mock_stream = MockChunkStream::new();
        let mut seq = Sequence::new();

        mock_stream
            .expect_read_chunk()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|buf| {
                buf[..3].copy_from_slice(b"abc");
                Ok(3)
            });

        mock_stream
            .expect_write_chunk()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(ServerError::Connection(std::io::Error::from(
                    ErrorKind::BrokenPipe,
                )))
            });

        let result = relay_loop(&mut mock_stream, None, &counters);
        assert!(result.is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::server::monitor::ServerMonitor;
    use proptest::prelude::*;

    /// In-memory stream: reads drain `input`, writes accumulate in `output`
    struct BufferStream {
        input: Vec<u8>,
        pos: usize,
        output: Vec<u8>,
    }

    impl ChunkStream for BufferStream {
        fn read_chunk(&mut self, buf: &mut [u8]) -> Result<usize> {
            let n = (self.input.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.input[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }

        fn write_chunk(&mut self, buf: &[u8]) -> Result<()> {
            self.output.extend_from_slice(buf);
            Ok(())
        }
    }

    proptest! {
        #[test]
        fn test_relay_returns_exactly_the_bytes_received(
            input in proptest::collection::vec(any::<u8>(), 0..4096)
        ) {
            let monitor = ServerMonitor::new(100);
            let counters = monitor.counters();
            let mut stream = BufferStream {
                input: input.clone(),
                pos: 0,
                output: Vec::new(),
            };

            let total = relay_loop(&mut stream, None, &counters).unwrap();
            prop_assert_eq!(total, input.len() as u64);
            prop_assert_eq!(stream.output, input);
        }
    }
}

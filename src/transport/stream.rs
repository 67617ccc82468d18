//! Frame transport over a tokio byte stream.
//!
//! # Example
//!
//! ```ignore
//! use tkey_shamir::transport::StreamTransport;
//!
//! let transport = StreamTransport::open("/dev/ttyACM0").await?;
//! ```

use std::path::Path;
use std::time::Duration;

use bytes::{BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::Transport;
use crate::command::CommandDescriptor;
use crate::error::{Result, TkeyError};
use crate::protocol::{FramingHeader, HEADER_SIZE};

/// [`Transport`] over anything readable and writable.
pub struct StreamTransport<S> {
    stream: S,
    read_timeout: Option<Duration>,
}

impl<S> StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Wrap an already-open stream. Reads start out unbounded.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            read_timeout: None,
        }
    }

    /// Currently configured read timeout, `None` when unbounded.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    /// Get a reference to the underlying stream.
    pub fn inner(&self) -> &S {
        &self.stream
    }

    /// Unwrap the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }

    async fn read_unbounded(
        &mut self,
        expected: &CommandDescriptor,
    ) -> Result<(Bytes, FramingHeader)> {
        let first = self.stream.read_u8().await.map_err(eof_as_closed)?;
        let header = FramingHeader::decode(first)?;

        // The header tells us how much follows; a mismatch means we are
        // out of step with the device and must not guess.
        if header.cmd_len != expected.cmd_len {
            return Err(TkeyError::Protocol(format!(
                "{}: expected length class {} bytes, got {}",
                expected.name,
                expected.cmd_len.byte_len(),
                header.cmd_len.byte_len()
            )));
        }

        let mut buf = BytesMut::with_capacity(header.frame_len());
        buf.put_u8(first);
        buf.resize(header.frame_len(), 0);
        self.stream
            .read_exact(&mut buf[HEADER_SIZE..])
            .await
            .map_err(eof_as_closed)?;

        Ok((buf.freeze(), header))
    }
}

impl StreamTransport<tokio::fs::File> {
    /// Open a character device (e.g. a USB CDC serial node) for reading and
    /// writing. Line settings must already be configured.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = tokio::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(path.as_ref())
            .await?;
        tracing::debug!("Opened device {}", path.as_ref().display());
        Ok(Self::new(file))
    }
}

#[cfg(unix)]
impl StreamTransport<tokio::net::UnixStream> {
    /// Connect to a device emulator listening on a Unix socket.
    pub async fn connect_unix(path: impl AsRef<Path>) -> Result<Self> {
        let stream = tokio::net::UnixStream::connect(path.as_ref()).await?;
        tracing::debug!("Connected to {}", path.as_ref().display());
        Ok(Self::new(stream))
    }
}

impl<S> Transport for StreamTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    async fn write(&mut self, frame: &[u8]) -> Result<()> {
        tracing::trace!(len = frame.len(), header = ?frame.first(), "tx frame");
        self.stream.write_all(frame).await?;
        self.stream.flush().await?;
        Ok(())
    }

    async fn read_frame(
        &mut self,
        expected: &CommandDescriptor,
        sequence_id: u8,
    ) -> Result<(Bytes, FramingHeader)> {
        let (raw, header) = match self.read_timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_unbounded(expected))
                .await
                .map_err(|_| TkeyError::Timeout(limit.as_secs()))??,
            None => self.read_unbounded(expected).await?,
        };

        tracing::trace!(
            len = raw.len(),
            id = header.id,
            expected_id = sequence_id,
            "rx {}",
            expected.name
        );
        Ok((raw, header))
    }

    async fn set_read_timeout(&mut self, seconds: u64) -> Result<()> {
        self.read_timeout = match seconds {
            0 => None,
            s => Some(Duration::from_secs(s)),
        };
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.stream.shutdown().await?;
        Ok(())
    }
}

fn eof_as_closed(err: std::io::Error) -> TkeyError {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        TkeyError::ConnectionClosed
    } else {
        TkeyError::Io(err)
    }
}

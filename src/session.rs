//! Protocol session and builder.
//!
//! A [`Session`] owns the transport and exposes one method per device
//! round trip. Every round has the same shape:
//! 1. Build the request payload and frame
//! 2. Write it to the transport
//! 3. Read the paired response frame for the same sequence id
//! 4. Decode and check status
//! 5. Copy out the payload field
//!
//! # Example
//!
//! ```ignore
//! use tkey_shamir::{SessionBuilder, StreamTransport};
//!
//! let transport = StreamTransport::open("/dev/ttyACM0").await?;
//! let mut session = SessionBuilder::new()
//!     .identity_timeout(2)
//!     .build(transport)?;
//!
//! let app = session.get_identity().await?;
//! println!("talking to {}", app);
//! ```

use crate::codec::{request, response, NameVersion};
use crate::command::{lookup, response_for, Command, CommandDescriptor};
use crate::error::{Result, TkeyError};
use crate::protocol::{build_frame, decode_frame, validate_sequence_id, Frame};
use crate::transport::Transport;

/// Sequence id used by the device app's host tooling.
pub const DEFAULT_SEQUENCE_ID: u8 = 2;

/// Bounded wait, in seconds, for the identity probe.
pub const DEFAULT_IDENTITY_TIMEOUT_SECS: u64 = 2;

/// Builder for configuring a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionBuilder {
    sequence_id: u8,
    identity_timeout_secs: u64,
}

impl SessionBuilder {
    /// Create a builder with default settings.
    pub fn new() -> Self {
        Self {
            sequence_id: DEFAULT_SEQUENCE_ID,
            identity_timeout_secs: DEFAULT_IDENTITY_TIMEOUT_SECS,
        }
    }

    /// Set the sequence id stamped on every frame (0-3).
    ///
    /// Default: 2
    pub fn sequence_id(mut self, id: u8) -> Self {
        self.sequence_id = id;
        self
    }

    /// Set the read timeout applied to [`Session::get_identity`].
    ///
    /// Default: 2 seconds. Must be non-zero; 0 means unbounded on the wire.
    pub fn identity_timeout(mut self, seconds: u64) -> Self {
        self.identity_timeout_secs = seconds;
        self
    }

    /// Validate settings and wrap the transport.
    pub fn build<T: Transport>(self, transport: T) -> Result<Session<T>> {
        validate_sequence_id(self.sequence_id)?;
        if self.identity_timeout_secs == 0 {
            return Err(TkeyError::InvalidParameter(
                "identity timeout must be at least one second".to_string(),
            ));
        }

        Ok(Session {
            transport,
            sequence_id: self.sequence_id,
            identity_timeout_secs: self.identity_timeout_secs,
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An open session with the device app.
///
/// All methods take `&mut self`: one request is outstanding at a time.
pub struct Session<T> {
    transport: T,
    sequence_id: u8,
    identity_timeout_secs: u64,
}

impl<T: Transport> Session<T> {
    /// Wrap a transport with default settings.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            sequence_id: DEFAULT_SEQUENCE_ID,
            identity_timeout_secs: DEFAULT_IDENTITY_TIMEOUT_SECS,
        }
    }

    /// Sequence id stamped on every frame.
    pub fn sequence_id(&self) -> u8 {
        self.sequence_id
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Unwrap the transport without closing it.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Close the transport. Any half-finished split or combine is abandoned.
    pub async fn close(mut self) -> Result<()> {
        tracing::debug!("Closing session");
        self.transport.close().await
    }

    /// Encode and write a request; returns the response descriptor to expect.
    async fn send(
        &mut self,
        command: Command,
        payload: &[u8],
    ) -> Result<&'static CommandDescriptor> {
        let descriptor = lookup(command);
        let expected = response_for(command).ok_or_else(|| {
            TkeyError::Protocol(format!("{} is not a request", descriptor.name))
        })?;

        let frame = build_frame(descriptor, self.sequence_id, payload)?;
        self.transport.write(&frame).await?;
        Ok(expected)
    }

    /// Read and decode the response for the last request.
    async fn receive(&mut self, expected: &'static CommandDescriptor) -> Result<Frame> {
        let (raw, _header) = self
            .transport
            .read_frame(expected, self.sequence_id)
            .await?;
        decode_frame(expected, self.sequence_id, &raw)
    }

    async fn exchange(&mut self, command: Command, payload: &[u8]) -> Result<Frame> {
        let expected = self.send(command, payload).await?;
        self.receive(expected).await
    }

    /// Hand the device a secret to split into `parts` shares, `threshold` of
    /// which reconstruct it.
    ///
    /// The device keeps the secret until the next mutating command.
    pub async fn put_secret(&mut self, parts: u8, threshold: u8, secret: &[u8]) -> Result<()> {
        let payload = request::put_secret(parts, threshold, secret)?;
        tracing::debug!(parts, threshold, len = secret.len(), "putSecret");
        self.exchange(Command::PutSecret, &payload).await?;
        Ok(())
    }

    /// Ask the device to reconstruct the secret from the first `count`
    /// shares previously stored with [`Session::put_share`].
    pub async fn get_secret(&mut self, count: u8) -> Result<Vec<u8>> {
        tracing::debug!(count, "getSecret");
        let frame = self
            .exchange(Command::GetSecret, &request::get_secret(count))
            .await?;
        response::secret(&frame)
    }

    /// Fetch share `index` of the secret last stored with
    /// [`Session::put_secret`].
    pub async fn get_share(&mut self, index: u8) -> Result<Vec<u8>> {
        tracing::debug!(index, "getShare");
        let frame = self
            .exchange(Command::GetShare, &request::get_share(index))
            .await?;
        response::share(&frame)
    }

    /// Store a share in slot `index` for a later [`Session::get_secret`].
    pub async fn put_share(&mut self, index: u8, share: &[u8]) -> Result<()> {
        let payload = request::put_share(index, share)?;
        tracing::debug!(index, len = share.len(), "putShare");
        self.exchange(Command::PutShare, &payload).await?;
        Ok(())
    }

    /// Store a public key on the device.
    pub async fn put_public_key(&mut self, key: &[u8]) -> Result<()> {
        let payload = request::put_public_key(key)?;
        tracing::debug!(len = key.len(), "putPubKey");
        self.exchange(Command::PutPubKey, &payload).await?;
        Ok(())
    }

    /// Read the device's public key.
    pub async fn get_public_key(&mut self) -> Result<Vec<u8>> {
        tracing::debug!("getPubKey");
        let frame = self.exchange(Command::GetPubKey, &[]).await?;
        response::public_key(&frame)
    }

    /// Probe the device app's name and version.
    ///
    /// The read is bounded by the configured identity timeout. The
    /// unbounded default is restored afterwards whether or not the read
    /// succeeded; a failed restore is reported even when the probe worked.
    pub async fn get_identity(&mut self) -> Result<NameVersion> {
        tracing::debug!("getNameVersion");
        let expected = self.send(Command::GetNameVersion, &[]).await?;

        let read = match self
            .transport
            .set_read_timeout(self.identity_timeout_secs)
            .await
        {
            Ok(()) => self.receive(expected).await,
            Err(e) => Err(e),
        };
        let restored = self.transport.set_read_timeout(0).await;

        match (read, restored) {
            (Ok(frame), Ok(())) => response::name_version(&frame),
            (Ok(_), Err(e)) => Err(TkeyError::TimeoutRestore(Box::new(e))),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(restore)) => {
                tracing::warn!("Failed to restore read timeout: {}", restore);
                Err(e)
            }
        }
    }
}

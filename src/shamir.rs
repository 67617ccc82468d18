//! Split and combine: the multi-round Shamir protocols.
//!
//! Both protocols lean on state the device keeps between frames:
//!
//! - **split** stores the secret with `putSecret`, then the device answers
//!   `getShare` for each index from that stored secret.
//! - **combine** fills share slots with `putShare`, then `getSecret`
//!   interpolates over the first `count` slots.
//!
//! Nothing else that touches device secret state may run between those
//! rounds. [`ShamirDevice`] holds the session by value and both protocols
//! take `&mut self`, so the borrow checker rules out interleaving within
//! this process.
//!
//! # Example
//!
//! ```ignore
//! use tkey_shamir::{Session, ShamirDevice, StreamTransport};
//!
//! let transport = StreamTransport::open("/dev/ttyACM0").await?;
//! let mut device = ShamirDevice::new(Session::new(transport));
//!
//! let shares = device.split(&[0xDE, 0xAD, 0xBE, 0xEF], 5, 3).await?;
//! let secret = device.combine(&shares[1..4]).await?;
//! ```

use serde::{Deserialize, Serialize};

use crate::codec::request::SHARE_CAPACITY;
use crate::codec::response::SECRET_LEN;
use crate::command::{lookup, Command};
use crate::error::{Result, TkeyError};
use crate::session::Session;
use crate::transport::Transport;

/// Largest share count the one-byte `parts` field can carry.
pub const MAX_PARTS: usize = 255;

/// Smallest meaningful reconstruction threshold.
pub const MIN_THRESHOLD: usize = 2;

/// Shortest share accepted by combine.
pub const MIN_SHARE_LEN: usize = 2;

/// Validated split parameters, `2 <= threshold <= parts <= 255`.
///
/// Deserializing goes through [`SplitParams::new`], so a stored value is
/// checked the same way as one built in code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSplitParams")]
pub struct SplitParams {
    parts: u8,
    threshold: u8,
}

#[derive(Deserialize)]
struct UncheckedSplitParams {
    parts: usize,
    threshold: usize,
}

impl TryFrom<UncheckedSplitParams> for SplitParams {
    type Error = TkeyError;

    fn try_from(raw: UncheckedSplitParams) -> Result<Self> {
        Self::new(raw.parts, raw.threshold)
    }
}

impl SplitParams {
    /// Validate and build.
    pub fn new(parts: usize, threshold: usize) -> Result<Self> {
        if parts < threshold {
            return Err(TkeyError::InvalidParameter(
                "parts cannot be less than threshold".to_string(),
            ));
        }
        if parts > MAX_PARTS {
            return Err(TkeyError::InvalidParameter(format!(
                "parts cannot exceed {}",
                MAX_PARTS
            )));
        }
        if threshold < MIN_THRESHOLD {
            return Err(TkeyError::InvalidParameter(format!(
                "threshold must be at least {}",
                MIN_THRESHOLD
            )));
        }

        // Both fit a byte now: threshold <= parts <= 255.
        Ok(Self {
            parts: parts as u8,
            threshold: threshold as u8,
        })
    }

    /// Number of shares to produce.
    pub fn parts(&self) -> u8 {
        self.parts
    }

    /// Shares needed to reconstruct.
    pub fn threshold(&self) -> u8 {
        self.threshold
    }
}

/// One share as produced by the device.
///
/// The bytes are opaque; `index` is the position the share was fetched at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    /// Position in the split output, `0..parts`.
    pub index: u8,
    /// Share bytes.
    pub bytes: Vec<u8>,
}

impl AsRef<[u8]> for Share {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// Check combine input before any share leaves the host.
fn validate_shares<S: AsRef<[u8]>>(shares: &[S]) -> Result<usize> {
    if shares.len() < 2 {
        return Err(TkeyError::InvalidParameter(
            "less than two shares cannot be used to reconstruct the secret".to_string(),
        ));
    }
    if shares.len() > MAX_PARTS {
        return Err(TkeyError::InvalidParameter(format!(
            "cannot combine more than {} shares",
            MAX_PARTS
        )));
    }

    let len = shares[0].as_ref().len();
    if len < MIN_SHARE_LEN {
        return Err(TkeyError::InvalidParameter(format!(
            "shares must be at least {} bytes",
            MIN_SHARE_LEN
        )));
    }
    if shares.iter().any(|s| s.as_ref().len() != len) {
        return Err(TkeyError::InvalidParameter(
            "all shares must be the same length".to_string(),
        ));
    }
    if len > SHARE_CAPACITY {
        return Err(TkeyError::Encoding {
            command: lookup(Command::PutShare).name,
            len,
            max: SHARE_CAPACITY,
        });
    }

    Ok(len)
}

/// Split/combine orchestrator over a [`Session`].
pub struct ShamirDevice<T> {
    session: Session<T>,
}

impl<T: Transport> ShamirDevice<T> {
    /// Take ownership of an open session.
    pub fn new(session: Session<T>) -> Self {
        Self { session }
    }

    /// Get a reference to the session.
    pub fn session(&self) -> &Session<T> {
        &self.session
    }

    /// Get a mutable reference to the session, for single-round calls.
    pub fn session_mut(&mut self) -> &mut Session<T> {
        &mut self.session
    }

    /// Give the session back.
    pub fn into_session(self) -> Session<T> {
        self.session
    }

    /// Close the underlying session.
    pub async fn close(self) -> Result<()> {
        self.session.close().await
    }

    /// Split `secret` into `parts` shares, any `threshold` of which
    /// reconstruct it.
    ///
    /// Shares are returned in index order. Any failed round discards the
    /// shares collected so far.
    ///
    /// # Errors
    ///
    /// - [`TkeyError::InvalidParameter`] for bad parts/threshold or an empty
    ///   secret, [`TkeyError::Encoding`] for a secret over 32 bytes. Both
    ///   before any I/O.
    /// - [`TkeyError::Split`] wrapping the failing round otherwise.
    pub async fn split(
        &mut self,
        secret: &[u8],
        parts: usize,
        threshold: usize,
    ) -> Result<Vec<Share>> {
        let params = SplitParams::new(parts, threshold)?;
        self.split_with(secret, params).await
    }

    /// [`ShamirDevice::split`] with pre-validated parameters.
    pub async fn split_with(&mut self, secret: &[u8], params: SplitParams) -> Result<Vec<Share>> {
        if secret.is_empty() {
            return Err(TkeyError::InvalidParameter(
                "cannot split an empty secret".to_string(),
            ));
        }
        // The device shares the first 32 bytes of the field and drops the rest.
        if secret.len() > SECRET_LEN {
            return Err(TkeyError::Encoding {
                command: lookup(Command::PutSecret).name,
                len: secret.len(),
                max: SECRET_LEN,
            });
        }

        tracing::debug!(
            parts = params.parts,
            threshold = params.threshold,
            "Splitting secret"
        );

        self.session
            .put_secret(params.parts, params.threshold, secret)
            .await
            .map_err(|e| TkeyError::split("putSecret", e))?;

        let mut shares = Vec::with_capacity(params.parts as usize);
        for index in 0..params.parts {
            let bytes = self
                .session
                .get_share(index)
                .await
                .map_err(|e| {
                    tracing::warn!(index, "getShare failed, discarding {} shares", shares.len());
                    TkeyError::split("getShare", e)
                })?;
            shares.push(Share { index, bytes });
        }

        Ok(shares)
    }

    /// Reconstruct a secret from two or more shares.
    ///
    /// Each share goes to the slot matching its position in `shares`. The
    /// driver does not look inside shares: duplicates, or fewer shares than
    /// the split threshold, are for the device to reject.
    ///
    /// # Errors
    ///
    /// - [`TkeyError::InvalidParameter`] for fewer than two shares, unequal
    ///   lengths, or shares under two bytes; [`TkeyError::Encoding`] for
    ///   shares over 124 bytes. Both before any I/O.
    /// - [`TkeyError::Combine`] wrapping the failing round otherwise.
    pub async fn combine<S: AsRef<[u8]>>(&mut self, shares: &[S]) -> Result<Vec<u8>> {
        validate_shares(shares)?;
        tracing::debug!(count = shares.len(), "Combining shares");

        for (slot, share) in shares.iter().enumerate() {
            // validate_shares caps the count at 255.
            let slot = slot as u8;
            self.session
                .put_share(slot, share.as_ref())
                .await
                .map_err(|e| TkeyError::combine("putShare", e))?;
        }

        self.session
            .get_secret(shares.len() as u8)
            .await
            .map_err(|e| TkeyError::combine("getSecret", e))
    }
}

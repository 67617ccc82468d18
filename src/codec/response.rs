//! Response payload accessors.
//!
//! Each accessor takes a decoded [`Frame`] (status already checked and
//! stripped) and copies out its field at a fixed offset.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TkeyError};
use crate::protocol::Frame;

/// Length of the secret returned by `rspGetSecret`.
pub const SECRET_LEN: usize = 32;

/// Length of a share returned by `rspGetShare`.
pub const SHARE_LEN: usize = 33;

/// Length of the key returned by `rspGetPubKey`.
pub const PUBLIC_KEY_LEN: usize = 32;

/// Bytes of the identity blob that carry name and version.
pub const NAME_VERSION_LEN: usize = 12;

fn field(frame: &Frame, offset: usize, len: usize) -> Result<&[u8]> {
    frame.payload().get(offset..offset + len).ok_or_else(|| {
        TkeyError::Protocol(format!(
            "{}: payload of {} bytes too short for field {}..{}",
            frame.descriptor.name,
            frame.payload_len(),
            offset,
            offset + len
        ))
    })
}

/// `rspGetSecret`: secret at 0..32.
pub fn secret(frame: &Frame) -> Result<Vec<u8>> {
    field(frame, 0, SECRET_LEN).map(<[u8]>::to_vec)
}

/// `rspGetShare`: share at 0..33.
pub fn share(frame: &Frame) -> Result<Vec<u8>> {
    field(frame, 0, SHARE_LEN).map(<[u8]>::to_vec)
}

/// `rspGetPubKey`: key at 0..32.
pub fn public_key(frame: &Frame) -> Result<Vec<u8>> {
    field(frame, 0, PUBLIC_KEY_LEN).map(<[u8]>::to_vec)
}

/// `rspGetNameVersion`: see [`NameVersion::unpack`].
pub fn name_version(frame: &Frame) -> Result<NameVersion> {
    field(frame, 0, NAME_VERSION_LEN).and_then(NameVersion::unpack)
}

/// Device app identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameVersion {
    /// First four-character name word.
    pub name0: String,
    /// Second four-character name word.
    pub name1: String,
    /// App version.
    pub version: u32,
}

impl NameVersion {
    /// Unpack from the identity blob.
    ///
    /// Layout: name0 at 0..4, name1 at 4..8, version u32 little-endian at
    /// 8..12. Each name byte maps to one char. Bytes past 12 are ignored.
    pub fn unpack(raw: &[u8]) -> Result<Self> {
        let blob: &[u8; NAME_VERSION_LEN] = raw
            .get(..NAME_VERSION_LEN)
            .and_then(|b| b.try_into().ok())
            .ok_or_else(|| {
                TkeyError::Protocol(format!(
                    "identity blob of {} bytes, need {}",
                    raw.len(),
                    NAME_VERSION_LEN
                ))
            })?;

        let chars = |bytes: &[u8]| bytes.iter().map(|&b| char::from(b)).collect::<String>();
        Ok(Self {
            name0: chars(&blob[0..4]),
            name1: chars(&blob[4..8]),
            version: u32::from_le_bytes([blob[8], blob[9], blob[10], blob[11]]),
        })
    }
}

impl std::fmt::Display for NameVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{} v{}", self.name0, self.name1, self.version)
    }
}

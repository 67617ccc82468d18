//! Framing header encoding and decoding.
//!
//! Every frame starts with a single framing header byte:
//! ```text
//! ┌──────────┬────────┬──────────┬─────────┬──────────┐
//! │ Reserved │ ID     │ Endpoint │ NOT OK  │ CmdLen   │
//! │ bit 7    │ bits 6-5│ bits 4-3│ bit 2   │ bits 1-0 │
//! └──────────┴────────┴──────────┴─────────┴──────────┘
//! ```
//!
//! The header is followed by the frame body: one opcode byte plus the
//! payload, `CmdLen::byte_len()` bytes in total.

use crate::error::{Result, TkeyError};

/// Framing header size in bytes (fixed, exactly 1).
pub const HEADER_SIZE: usize = 1;

/// Highest sequence id that fits the two ID bits.
pub const MAX_SEQUENCE_ID: u8 = 3;

/// Status byte value for a successful response.
pub const STATUS_OK: u8 = 0x00;

/// Status byte value the device app uses for a rejected request.
pub const STATUS_BAD: u8 = 0x01;

/// Reserved bit, must be 0.
const RESERVED_BIT: u8 = 0b1000_0000;
/// Response status bit, set when the response is not OK.
const NOT_OK_BIT: u8 = 0b0000_0100;
const ID_SHIFT: u8 = 5;
const ID_MASK: u8 = 0b0110_0000;
const ENDPOINT_SHIFT: u8 = 3;
const ENDPOINT_MASK: u8 = 0b0001_1000;
const CMDLEN_MASK: u8 = 0b0000_0011;

/// Frame body length class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmdLen {
    /// 1-byte body (opcode only).
    Len1,
    /// 4-byte body.
    Len4,
    /// 32-byte body.
    Len32,
    /// 128-byte body.
    Len128,
}

impl CmdLen {
    /// Number of body bytes following the framing header.
    #[inline]
    pub const fn byte_len(self) -> usize {
        match self {
            CmdLen::Len1 => 1,
            CmdLen::Len4 => 4,
            CmdLen::Len32 => 32,
            CmdLen::Len128 => 128,
        }
    }

    /// Two-bit code carried in the framing header.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            CmdLen::Len1 => 0,
            CmdLen::Len4 => 1,
            CmdLen::Len32 => 2,
            CmdLen::Len128 => 3,
        }
    }

    /// Inverse of [`CmdLen::code`], only the low two bits are used.
    #[inline]
    pub const fn from_code(code: u8) -> Self {
        match code & CMDLEN_MASK {
            0 => CmdLen::Len1,
            1 => CmdLen::Len4,
            2 => CmdLen::Len32,
            _ => CmdLen::Len128,
        }
    }
}

/// Destination of a frame inside the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Hardware core (unused by this driver).
    Hardware,
    /// Reserved endpoint.
    Reserved,
    /// Device firmware.
    Firmware,
    /// Loaded device app.
    App,
}

impl Endpoint {
    /// Two-bit code carried in the framing header.
    #[inline]
    pub const fn code(self) -> u8 {
        match self {
            Endpoint::Hardware => 0,
            Endpoint::Reserved => 1,
            Endpoint::Firmware => 2,
            Endpoint::App => 3,
        }
    }

    #[inline]
    const fn from_code(code: u8) -> Self {
        match code & 0b11 {
            0 => Endpoint::Hardware,
            1 => Endpoint::Reserved,
            2 => Endpoint::Firmware,
            _ => Endpoint::App,
        }
    }
}

/// Decoded framing header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FramingHeader {
    /// Sequence id (0-3).
    pub id: u8,
    /// Destination endpoint.
    pub endpoint: Endpoint,
    /// Body length class.
    pub cmd_len: CmdLen,
    /// Set by the device when the response is not OK.
    pub response_not_ok: bool,
}

impl FramingHeader {
    /// Create a new request header.
    pub fn new(id: u8, endpoint: Endpoint, cmd_len: CmdLen) -> Self {
        Self {
            id,
            endpoint,
            cmd_len,
            response_not_ok: false,
        }
    }

    /// Encode the header byte.
    ///
    /// # Example
    ///
    /// ```
    /// use tkey_shamir::protocol::{CmdLen, Endpoint, FramingHeader};
    ///
    /// let header = FramingHeader::new(2, Endpoint::App, CmdLen::Len128);
    /// assert_eq!(header.encode(), 0x5b);
    /// ```
    pub fn encode(&self) -> u8 {
        let mut byte = ((self.id << ID_SHIFT) & ID_MASK)
            | (self.endpoint.code() << ENDPOINT_SHIFT)
            | self.cmd_len.code();
        if self.response_not_ok {
            byte |= NOT_OK_BIT;
        }
        byte
    }

    /// Decode a header byte.
    ///
    /// Fails if the reserved bit is set.
    pub fn decode(byte: u8) -> Result<Self> {
        if byte & RESERVED_BIT != 0 {
            return Err(TkeyError::Protocol(format!(
                "Reserved bit #7 set in framing header 0x{:02x}",
                byte
            )));
        }

        Ok(Self {
            id: (byte & ID_MASK) >> ID_SHIFT,
            endpoint: Endpoint::from_code((byte & ENDPOINT_MASK) >> ENDPOINT_SHIFT),
            cmd_len: CmdLen::from_code(byte),
            response_not_ok: byte & NOT_OK_BIT != 0,
        })
    }

    /// Total bytes on the wire for a frame with this header.
    #[inline]
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.cmd_len.byte_len()
    }
}

/// Validate a sequence id before it is packed into a header.
pub fn validate_sequence_id(id: u8) -> Result<()> {
    if id > MAX_SEQUENCE_ID {
        return Err(TkeyError::InvalidParameter(format!(
            "sequence id {} exceeds maximum {}",
            id, MAX_SEQUENCE_ID
        )));
    }
    Ok(())
}

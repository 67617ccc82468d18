//! Frame building and response decoding.
//!
//! A frame on the wire is the framing header byte followed by a body of
//! exactly `CmdLen::byte_len()` bytes: the opcode, then the payload,
//! zero-padded at the tail.
//!
//! # Example
//!
//! ```
//! use tkey_shamir::command::{lookup, Command};
//! use tkey_shamir::protocol::build_frame;
//!
//! let frame = build_frame(lookup(Command::GetShare), 2, &[4]).unwrap();
//! assert_eq!(&frame[..], &[0x59, 0x05, 0x04, 0x00, 0x00]);
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use super::wire_format::{validate_sequence_id, FramingHeader, HEADER_SIZE, STATUS_OK};
use crate::command::CommandDescriptor;
use crate::error::{Result, TkeyError};

/// Offset of the opcode byte within a raw frame.
pub const OPCODE_OFFSET: usize = HEADER_SIZE;

/// Offset of the first payload byte within a raw frame.
pub const PAYLOAD_OFFSET: usize = HEADER_SIZE + 1;

/// A decoded, status-checked response frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Decoded framing header.
    pub header: FramingHeader,
    /// Descriptor the frame was validated against.
    pub descriptor: &'static CommandDescriptor,
    /// Status byte, if the descriptor carries one.
    pub status: Option<u8>,
    /// Payload after the opcode (and status, if any).
    pub payload: Bytes,
}

impl Frame {
    /// Get a reference to the payload bytes.
    #[inline]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Get the payload length.
    #[inline]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Get the sequence id.
    #[inline]
    pub fn sequence_id(&self) -> u8 {
        self.header.id
    }

    /// Check if the device reported success.
    #[inline]
    pub fn is_ok(&self) -> bool {
        !self.header.response_not_ok && self.status.map_or(true, |s| s == STATUS_OK)
    }
}

/// Build a complete request frame.
///
/// The output length is always `1 + descriptor.cmd_len.byte_len()`; the
/// payload is copied after the opcode and the remainder zero-filled.
///
/// # Errors
///
/// - [`TkeyError::Encoding`] if the payload exceeds the command's capacity.
/// - [`TkeyError::InvalidParameter`] if `sequence_id` does not fit two bits.
pub fn build_frame(
    descriptor: &CommandDescriptor,
    sequence_id: u8,
    payload: &[u8],
) -> Result<Bytes> {
    validate_sequence_id(sequence_id)?;

    let max = descriptor.payload_capacity();
    if payload.len() > max {
        return Err(TkeyError::Encoding {
            command: descriptor.name,
            len: payload.len(),
            max,
        });
    }

    let header = FramingHeader::new(sequence_id, descriptor.endpoint, descriptor.cmd_len);
    let frame_len = header.frame_len();

    let mut buf = BytesMut::with_capacity(frame_len);
    buf.put_u8(header.encode());
    buf.put_u8(descriptor.opcode);
    buf.put_slice(payload);
    buf.put_bytes(0, frame_len - buf.len());

    Ok(buf.freeze())
}

/// Decode and validate a raw response frame.
///
/// Checks, in order: header shape, length class, NOT-OK bit, sequence id,
/// endpoint, opcode, then the status byte when the descriptor has one.
/// The payload itself is never interpreted here.
pub fn decode_frame(
    descriptor: &'static CommandDescriptor,
    sequence_id: u8,
    raw: &[u8],
) -> Result<Frame> {
    let first = *raw
        .first()
        .ok_or_else(|| TkeyError::Protocol("Empty response frame".to_string()))?;
    let header = FramingHeader::decode(first)?;

    if header.cmd_len != descriptor.cmd_len {
        return Err(TkeyError::Protocol(format!(
            "{}: expected length class {} bytes, got {}",
            descriptor.name,
            descriptor.cmd_len.byte_len(),
            header.cmd_len.byte_len()
        )));
    }

    if raw.len() != header.frame_len() {
        return Err(TkeyError::Protocol(format!(
            "{}: frame is {} bytes, expected {}",
            descriptor.name,
            raw.len(),
            header.frame_len()
        )));
    }

    if header.response_not_ok {
        return Err(TkeyError::Status {
            command: descriptor.name,
        });
    }

    if header.id != sequence_id {
        return Err(TkeyError::Protocol(format!(
            "{}: expected sequence id {}, got {}",
            descriptor.name, sequence_id, header.id
        )));
    }

    if header.endpoint != descriptor.endpoint {
        return Err(TkeyError::Protocol(format!(
            "{}: expected endpoint {:?}, got {:?}",
            descriptor.name, descriptor.endpoint, header.endpoint
        )));
    }

    let opcode = raw[OPCODE_OFFSET];
    if opcode != descriptor.opcode {
        return Err(TkeyError::Protocol(format!(
            "{}: expected opcode 0x{:02x}, got 0x{:02x}",
            descriptor.name, descriptor.opcode, opcode
        )));
    }

    let body = &raw[PAYLOAD_OFFSET..];
    let (status, payload) = if descriptor.has_status {
        let (&status, rest) = body.split_first().ok_or_else(|| {
            TkeyError::Protocol(format!("{}: no room for status byte", descriptor.name))
        })?;
        if status != STATUS_OK {
            return Err(TkeyError::Status {
                command: descriptor.name,
            });
        }
        (Some(status), rest)
    } else {
        (None, body)
    };

    Ok(Frame {
        header,
        descriptor,
        status,
        payload: Bytes::copy_from_slice(payload),
    })
}

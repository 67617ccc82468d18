//! Protocol module - framing header, frame building and decoding.
//!
//! This module implements the device's fixed-size framing:
//! - 1-byte framing header encoding/decoding
//! - Request frames padded to the command's length class
//! - Status-checked response frames

mod frame;
mod wire_format;

pub use frame::{build_frame, decode_frame, Frame, OPCODE_OFFSET, PAYLOAD_OFFSET};
pub use wire_format::{
    validate_sequence_id, CmdLen, Endpoint, FramingHeader, HEADER_SIZE, MAX_SEQUENCE_ID,
    STATUS_BAD, STATUS_OK,
};

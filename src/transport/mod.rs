//! Transport module - moving whole frames to and from the device.
//!
//! Provides:
//! - [`Transport`] - the frame-level contract the session is built on
//! - [`StreamTransport`] - implementation over any tokio byte stream
//!   (serial device node, Unix socket to an emulator, in-memory duplex)

mod stream;

pub use stream::StreamTransport;

use bytes::Bytes;

use crate::command::CommandDescriptor;
use crate::error::Result;
use crate::protocol::FramingHeader;

/// Frame-level channel to the device.
///
/// Exactly one request may be outstanding at a time; every method takes
/// `&mut self`, so a transport cannot be driven from two places at once.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Write one complete frame.
    async fn write(&mut self, frame: &[u8]) -> Result<()>;

    /// Read one complete frame, sized by the expected response descriptor.
    ///
    /// Returns the raw frame (header byte included) and its parsed header.
    /// Status, opcode and sequence id are checked by the caller.
    async fn read_frame(
        &mut self,
        expected: &CommandDescriptor,
        sequence_id: u8,
    ) -> Result<(Bytes, FramingHeader)>;

    /// Bound subsequent reads to `seconds`; 0 restores the unbounded default.
    async fn set_read_timeout(&mut self, seconds: u64) -> Result<()>;

    /// Close the channel. Device-side state is left as-is.
    async fn close(&mut self) -> Result<()>;
}

//! # tkey-shamir
//!
//! Rust client driver for the Shamir secret-sharing app running on a
//! Tillitis TKey.
//!
//! The device does all share arithmetic; this crate speaks its framed
//! command/response protocol and sequences the rounds that make up a split
//! or a combine.
//!
//! ## Architecture
//!
//! - **Command registry** ([`command`]): opcodes, names and length classes
//! - **Framing** ([`protocol`]): 1-byte header, fixed-size padded frames
//! - **Payload layouts** ([`codec`]): fixed field offsets per command
//! - **Transport** ([`transport`]): frame I/O over any tokio byte stream
//! - **Session** ([`Session`]): one method per device round trip
//! - **Orchestrator** ([`ShamirDevice`]): split and combine
//!
//! ## Example
//!
//! ```ignore
//! use tkey_shamir::{Session, ShamirDevice, StreamTransport};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let transport = StreamTransport::open("/dev/ttyACM0").await?;
//!     let mut device = ShamirDevice::new(Session::new(transport));
//!
//!     println!("{}", device.session_mut().get_identity().await?);
//!
//!     let shares = device.split(b"correct horse", 5, 3).await?;
//!     let secret = device.combine(&shares[..3]).await?;
//!
//!     device.close().await?;
//!     Ok(())
//! }
//! ```

pub mod codec;
pub mod command;
pub mod error;
pub mod protocol;
pub mod transport;

mod session;
mod shamir;

pub use codec::NameVersion;
pub use error::{Result, TkeyError};
pub use session::{Session, SessionBuilder, DEFAULT_IDENTITY_TIMEOUT_SECS, DEFAULT_SEQUENCE_ID};
pub use shamir::{ShamirDevice, Share, SplitParams, MAX_PARTS, MIN_SHARE_LEN, MIN_THRESHOLD};
pub use transport::{StreamTransport, Transport};

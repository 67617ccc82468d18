//! Codec module - per-operation payload layouts.
//!
//! Frame payloads carry no delimiters or length prefixes; every field sits
//! at a fixed offset. This module is the single place those offsets live:
//!
//! - [`request`] - payload builders for outgoing commands
//! - [`response`] - named accessors for incoming payloads
//!
//! Offsets are counted from the first payload byte, i.e. after the opcode
//! and, for responses, after the status byte.
//!
//! # Example
//!
//! ```
//! use tkey_shamir::codec::request;
//!
//! let payload = request::put_secret(5, 3, &[0xDE, 0xAD]).unwrap();
//! assert_eq!(&payload[..4], &[5, 3, 0xDE, 0xAD]);
//! assert_eq!(payload.len(), 127);
//! ```

pub mod request;
pub mod response;

pub use response::NameVersion;

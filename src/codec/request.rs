//! Request payload builders.
//!
//! Each builder returns the full payload for its command, zero-padded to
//! the command's capacity, or an encoding error if a field overflows.
//! Undersized secrets, shares and keys are padded rather than rejected:
//! the device app expects that.
//! TODO: revisit whether the device should be told the real secret length.

use bytes::{BufMut, Bytes, BytesMut};

use crate::command::{lookup, Command};
use crate::error::{Result, TkeyError};

/// Secret field capacity in a `cmdPutSecret` payload.
pub const SECRET_CAPACITY: usize = 125;

/// Share field capacity in a `cmdPutShare` payload.
pub const SHARE_CAPACITY: usize = 124;

/// Key field capacity in a `cmdPutPubKey` payload.
pub const PUBLIC_KEY_CAPACITY: usize = 127;

fn field_fits(command: Command, field: &[u8], max: usize) -> Result<()> {
    if field.len() > max {
        return Err(TkeyError::Encoding {
            command: lookup(command).name,
            len: field.len(),
            max,
        });
    }
    Ok(())
}

fn padded(command: Command, fill: impl FnOnce(&mut BytesMut)) -> Bytes {
    let capacity = lookup(command).payload_capacity();
    let mut buf = BytesMut::with_capacity(capacity);
    fill(&mut buf);
    debug_assert!(buf.len() <= capacity);
    buf.put_bytes(0, capacity - buf.len());
    buf.freeze()
}

/// `cmdPutSecret`: parts at 0, threshold at 1, secret at 2..127.
pub fn put_secret(parts: u8, threshold: u8, secret: &[u8]) -> Result<Bytes> {
    field_fits(Command::PutSecret, secret, SECRET_CAPACITY)?;
    Ok(padded(Command::PutSecret, |buf| {
        buf.put_u8(parts);
        buf.put_u8(threshold);
        buf.put_slice(secret);
    }))
}

/// `cmdGetSecret`: share count at 0.
pub fn get_secret(count: u8) -> Bytes {
    padded(Command::GetSecret, |buf| buf.put_u8(count))
}

/// `cmdGetShare`: share index at 0.
pub fn get_share(index: u8) -> Bytes {
    padded(Command::GetShare, |buf| buf.put_u8(index))
}

/// `cmdPutShare`: share index at 0, share at 1..125, two reserved bytes.
pub fn put_share(index: u8, share: &[u8]) -> Result<Bytes> {
    field_fits(Command::PutShare, share, SHARE_CAPACITY)?;
    Ok(padded(Command::PutShare, |buf| {
        buf.put_u8(index);
        buf.put_slice(share);
    }))
}

/// `cmdPutPubKey`: key at 0..127.
pub fn put_public_key(key: &[u8]) -> Result<Bytes> {
    field_fits(Command::PutPubKey, key, PUBLIC_KEY_CAPACITY)?;
    Ok(padded(Command::PutPubKey, |buf| buf.put_slice(key)))
}

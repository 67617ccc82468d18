//! Shared test fixtures: an in-process Shamir device app emulator.
//!
//! The emulator consumes raw request frames and produces raw response
//! frames, so it can sit behind either the in-memory [`EmulatorTransport`]
//! or a real byte stream via [`spawn_device`].

#![allow(dead_code)]

use std::collections::{HashMap, HashSet, VecDeque};

use bytes::Bytes;
use tkey_shamir::command::{by_opcode, response_for, CommandDescriptor};
use tkey_shamir::protocol::{FramingHeader, STATUS_BAD, STATUS_OK};
use tkey_shamir::{Result, TkeyError, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

/// Secret width the device app works on.
pub const DEVICE_SECRET_LEN: usize = 32;

/// Version reported by the emulator.
pub const EMULATOR_VERSION: u32 = 3;

/// Public key the emulator starts with.
pub const EMULATOR_PUBKEY: [u8; 32] = [0x9c; 32];

// GF(2^8) with the AES polynomial.
fn gf_mul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        let carry = a & 0x80 != 0;
        a <<= 1;
        if carry {
            a ^= 0x1b;
        }
        b >>= 1;
    }
    product
}

fn gf_inv(a: u8) -> u8 {
    // a^254 == a^-1 for a != 0
    let mut result = 1u8;
    let mut base = a;
    let mut exp = 254u8;
    while exp != 0 {
        if exp & 1 != 0 {
            result = gf_mul(result, base);
        }
        base = gf_mul(base, base);
        exp >>= 1;
    }
    result
}

struct StoredSecret {
    parts: u8,
    /// coefficients[k][byte]; coefficients[0] is the secret.
    coefficients: Vec<[u8; DEVICE_SECRET_LEN]>,
}

impl StoredSecret {
    fn share(&self, index: u8) -> Vec<u8> {
        let x = index + 1;
        let mut share = vec![x];
        for byte in 0..DEVICE_SECRET_LEN {
            // Horner from the highest coefficient down.
            let y = self
                .coefficients
                .iter()
                .rev()
                .fold(0u8, |acc, c| gf_mul(acc, x) ^ c[byte]);
            share.push(y);
        }
        share
    }
}

/// Device app emulator.
pub struct Emulator {
    stored: Option<StoredSecret>,
    threshold: Option<u8>,
    slots: HashMap<u8, Vec<u8>>,
    pubkey: Vec<u8>,
    rng: u64,
    /// Opcodes of every request seen, in order.
    pub seen: Vec<u8>,
    /// Answer NOK to these request opcodes.
    pub reject: HashSet<u8>,
    /// Answer NOK to `getShare` for this index only.
    pub reject_share_index: Option<u8>,
    /// Never answer these request opcodes.
    pub silent: HashSet<u8>,
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            stored: None,
            threshold: None,
            slots: HashMap::new(),
            pubkey: EMULATOR_PUBKEY.to_vec(),
            rng: 0x2545_f491_4f6c_dd1d,
            seen: Vec::new(),
            reject: HashSet::new(),
            reject_share_index: None,
            silent: HashSet::new(),
        }
    }
}

impl Emulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_byte(&mut self) -> u8 {
        // xorshift64
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 7;
        self.rng ^= self.rng << 17;
        (self.rng >> 24) as u8
    }

    /// Count of requests seen with `opcode`.
    pub fn count(&self, opcode: u8) -> usize {
        self.seen.iter().filter(|&&o| o == opcode).count()
    }

    /// Handle one raw request frame. `None` means stay silent.
    pub fn handle(&mut self, request: &[u8]) -> Option<Vec<u8>> {
        let header = FramingHeader::decode(request[0]).expect("valid framing header");
        assert_eq!(request.len(), header.frame_len(), "request not padded to class");

        let opcode = request[1];
        let payload = &request[2..];
        self.seen.push(opcode);

        let descriptor = by_opcode(opcode).expect("known opcode");
        assert_eq!(descriptor.cmd_len, header.cmd_len, "wrong class for opcode");
        let rsp = response_for(descriptor.command).expect("request opcode");

        if self.silent.contains(&opcode) {
            return None;
        }

        let body = if self.reject.contains(&opcode) {
            Err(())
        } else {
            self.execute(opcode, payload)
        };

        let mut raw = vec![0u8; 1 + rsp.cmd_len.byte_len()];
        raw[0] = FramingHeader::new(header.id, rsp.endpoint, rsp.cmd_len).encode();
        raw[1] = rsp.opcode;
        match body {
            Ok(data) => {
                let start = if rsp.has_status {
                    raw[2] = STATUS_OK;
                    3
                } else {
                    2
                };
                raw[start..start + data.len()].copy_from_slice(&data);
            }
            Err(()) if rsp.has_status => raw[2] = STATUS_BAD,
            Err(()) => {
                let mut h = FramingHeader::decode(raw[0]).unwrap();
                h.response_not_ok = true;
                raw[0] = h.encode();
            }
        }
        Some(raw)
    }

    fn execute(&mut self, opcode: u8, p: &[u8]) -> std::result::Result<Vec<u8>, ()> {
        match opcode {
            0x01 => {
                let mut blob = b"tk1 shmr".to_vec();
                blob.extend_from_slice(&EMULATOR_VERSION.to_le_bytes());
                Ok(blob)
            }
            0x03 => {
                let (parts, threshold) = (p[0], p[1]);
                if threshold < 2 || parts < threshold {
                    return Err(());
                }
                let mut secret = [0u8; DEVICE_SECRET_LEN];
                secret.copy_from_slice(&p[2..2 + DEVICE_SECRET_LEN]);
                let mut coefficients = vec![secret];
                for _ in 1..threshold {
                    let mut c = [0u8; DEVICE_SECRET_LEN];
                    for b in c.iter_mut() {
                        *b = self.next_byte();
                    }
                    coefficients.push(c);
                }
                self.stored = Some(StoredSecret {
                    parts,
                    coefficients,
                });
                self.threshold = Some(threshold);
                Ok(Vec::new())
            }
            0x05 => {
                let index = p[0];
                if self.reject_share_index == Some(index) {
                    return Err(());
                }
                match &self.stored {
                    Some(s) if index < s.parts => Ok(s.share(index)),
                    _ => Err(()),
                }
            }
            0x07 => {
                self.slots
                    .insert(p[0], p[1..1 + DEVICE_SECRET_LEN + 1].to_vec());
                Ok(Vec::new())
            }
            0x09 => {
                let count = p[0];
                if count < 2 || self.threshold.map_or(false, |t| count < t) {
                    return Err(());
                }
                let shares: Vec<&Vec<u8>> = (0..count)
                    .map(|i| self.slots.get(&i).ok_or(()))
                    .collect::<std::result::Result<_, _>>()?;
                let xs: Vec<u8> = shares.iter().map(|s| s[0]).collect();
                let distinct: HashSet<u8> = xs.iter().copied().collect();
                if distinct.len() != xs.len() || xs.contains(&0) {
                    return Err(());
                }

                let mut secret = vec![0u8; DEVICE_SECRET_LEN];
                for (j, share) in shares.iter().enumerate() {
                    // Lagrange basis at x = 0; subtraction is xor.
                    let mut basis = 1u8;
                    for (m, &xm) in xs.iter().enumerate() {
                        if m != j {
                            basis = gf_mul(basis, gf_mul(xm, gf_inv(xm ^ xs[j])));
                        }
                    }
                    for (b, out) in secret.iter_mut().enumerate() {
                        *out ^= gf_mul(basis, share[1 + b]);
                    }
                }
                self.slots.clear();
                Ok(secret)
            }
            0x0b => Ok(self.pubkey.clone()),
            0x0d => {
                self.pubkey = p[..32].to_vec();
                Ok(Vec::new())
            }
            _ => Err(()),
        }
    }
}

/// In-memory transport in front of an [`Emulator`].
#[derive(Default)]
pub struct EmulatorTransport {
    pub device: Emulator,
    pending: VecDeque<Vec<u8>>,
    /// Every timeout the session asked for, in order.
    pub timeouts: Vec<u64>,
    pub current_timeout: u64,
    pub writes: usize,
    pub closed: bool,
}

impl EmulatorTransport {
    pub fn new(device: Emulator) -> Self {
        Self {
            device,
            ..Default::default()
        }
    }
}

impl Transport for EmulatorTransport {
    async fn write(&mut self, frame: &[u8]) -> Result<()> {
        if self.closed {
            return Err(TkeyError::ConnectionClosed);
        }
        self.writes += 1;
        if let Some(reply) = self.device.handle(frame) {
            self.pending.push_back(reply);
        }
        Ok(())
    }

    async fn read_frame(
        &mut self,
        expected: &CommandDescriptor,
        _sequence_id: u8,
    ) -> Result<(Bytes, FramingHeader)> {
        let raw = match self.pending.pop_front() {
            Some(raw) => raw,
            None if self.current_timeout > 0 => {
                return Err(TkeyError::Timeout(self.current_timeout))
            }
            None => return Err(TkeyError::ConnectionClosed),
        };
        let header = FramingHeader::decode(raw[0])?;
        if header.cmd_len != expected.cmd_len {
            return Err(TkeyError::Protocol("length class mismatch".to_string()));
        }
        Ok((Bytes::from(raw), header))
    }

    async fn set_read_timeout(&mut self, seconds: u64) -> Result<()> {
        self.timeouts.push(seconds);
        self.current_timeout = seconds;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// Run an emulator behind one end of an in-memory byte stream.
///
/// The task ends at EOF and hands the emulator back for inspection.
pub fn spawn_device(mut device: Emulator) -> (DuplexStream, JoinHandle<Emulator>) {
    let (host, mut wire) = tokio::io::duplex(1024);

    let task = tokio::spawn(async move {
        loop {
            let first = match wire.read_u8().await {
                Ok(b) => b,
                Err(_) => break,
            };
            let header = FramingHeader::decode(first).expect("valid framing header");
            let mut frame = vec![0u8; header.frame_len()];
            frame[0] = first;
            if wire.read_exact(&mut frame[1..]).await.is_err() {
                break;
            }
            if let Some(reply) = device.handle(&frame) {
                if wire.write_all(&reply).await.is_err() {
                    break;
                }
            }
        }
        device
    });

    (host, task)
}

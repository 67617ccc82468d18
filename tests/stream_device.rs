//! End-to-end tests over a byte stream.
//!
//! The emulator runs in its own task behind a `tokio::io::duplex` pipe, so
//! every frame goes through `StreamTransport` header parsing and exact
//! reads.

mod common;

use std::time::Duration;

use common::{spawn_device, Emulator, DEVICE_SECRET_LEN};
use tkey_shamir::{Session, SessionBuilder, ShamirDevice, StreamTransport, TkeyError};

#[tokio::test]
async fn test_split_combine_over_stream() {
    let (stream, task) = spawn_device(Emulator::new());
    let mut dev = ShamirDevice::new(Session::new(StreamTransport::new(stream)));

    let secret: Vec<u8> = (1..=DEVICE_SECRET_LEN as u8).collect();
    let shares = dev.split(&secret, 5, 3).await.unwrap();
    let restored = dev.combine(&shares[2..]).await.unwrap();
    assert_eq!(restored, secret);

    dev.close().await.unwrap();
    let emulator = task.await.unwrap();
    // 1 putSecret + 5 getShare + 3 putShare + 1 getSecret
    assert_eq!(emulator.seen.len(), 10);
}

#[tokio::test]
async fn test_identity_over_stream_restores_timeout() {
    let (stream, _task) = spawn_device(Emulator::new());
    let mut session = SessionBuilder::new()
        .identity_timeout(1)
        .build(StreamTransport::new(stream))
        .unwrap();

    let nv = session.get_identity().await.unwrap();
    assert_eq!(nv.to_string(), "tk1 shmr v3");
    assert_eq!(session.transport().read_timeout(), None);
}

#[tokio::test(start_paused = true)]
async fn test_silent_device_times_out_and_restores() {
    let mut emu = Emulator::new();
    emu.silent.insert(0x01);
    let (stream, _task) = spawn_device(emu);
    let mut session = Session::new(StreamTransport::new(stream));

    let err = session.get_identity().await.unwrap_err();
    assert!(matches!(err, TkeyError::Timeout(2)));
    assert_eq!(session.transport().read_timeout(), None);
}

#[tokio::test]
async fn test_nok_status_over_stream() {
    let mut emu = Emulator::new();
    emu.reject.insert(0x03);
    let (stream, _task) = spawn_device(emu);
    let mut dev = ShamirDevice::new(Session::new(StreamTransport::new(stream)));

    let err = dev.split(&[1, 2, 3], 3, 2).await.unwrap_err();
    assert!(err.is_status());
}

#[tokio::test]
async fn test_device_gone_mid_session() {
    let (stream, task) = spawn_device(Emulator::new());
    let mut session = Session::new(StreamTransport::new(stream));

    session.get_public_key().await.unwrap();
    task.abort();
    let _ = task.await;

    let result = tokio::time::timeout(Duration::from_secs(5), session.get_share(0)).await;
    let err = result.expect("transport must not hang").unwrap_err();
    assert!(matches!(
        err,
        TkeyError::ConnectionClosed | TkeyError::Io(_)
    ));
}

//! Integration tests — full tap-to-receiver lifecycle over a real
//! Unix-domain socket, plus disconnect and absent-listener scenarios.

use std::io::Read;
use std::os::unix::net::UnixListener;
use std::path::PathBuf;
use std::thread;

use vtap_core::{
    Backend, ChannelTransport, FrameDescriptor, FrameHeader, FrameTap, LinkState, PixelFormat,
    PlaneView, SendOutcome, StreamFormat, TapConfig,
};

// ── Helpers ──────────────────────────────────────────────────────

fn socket_path(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    dir.path().join(name)
}

fn channel_config(path: &std::path::Path) -> TapConfig {
    let mut config = TapConfig::default();
    config.backend = Backend::Channel;
    config.channel.socket_path = path.to_path_buf();
    config
}

/// A 4×2 I420 frame with tight pitches and known byte patterns.
/// Planes: Y = 8 bytes, U = 2 bytes, V = 2 bytes.
fn test_planes() -> [Vec<u8>; 3] {
    [
        vec![0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17],
        vec![0x20, 0x21],
        vec![0x30, 0x31],
    ]
}

fn test_frame<'a>(bufs: &'a [Vec<u8>; 3], pts: u64) -> FrameDescriptor<'a> {
    let planes = [
        PlaneView::new(&bufs[0], 4, 2),
        PlaneView::new(&bufs[1], 2, 1),
        PlaneView::new(&bufs[2], 2, 1),
    ];
    FrameDescriptor::new(4, 2, PixelFormat::I420, &planes, pts).unwrap()
}

/// Read one header + payload off the stream.
fn read_frame(stream: &mut impl Read) -> (FrameHeader, Vec<u8>) {
    let mut header_bytes = [0u8; FrameHeader::SIZE];
    stream.read_exact(&mut header_bytes).unwrap();
    let header = FrameHeader::decode(&header_bytes).unwrap();
    let mut payload = vec![0u8; header.payload_len()];
    stream.read_exact(&mut payload).unwrap();
    (header, payload)
}

// ── Absent listener ──────────────────────────────────────────────

#[test]
fn open_without_listener_drops_every_frame() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir, "absent.sock");
    let config = channel_config(&path);
    let hint = StreamFormat::new(4, 2, PixelFormat::I420.fourcc());

    let mut tap = FrameTap::open(&config, hint).unwrap();
    assert!(!tap.is_active());

    let bufs = test_planes();
    let frame = test_frame(&bufs, 1);
    for _ in 0..100 {
        assert_eq!(tap.on_frame(&frame), SendOutcome::Dropped);
    }
    assert_eq!(tap.frames_sent(), 0);
    assert_eq!(tap.frames_seen(), 100);
}

// ── Live receiver ────────────────────────────────────────────────

#[test]
fn receiver_observes_headers_and_raw_planes() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir, "live.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let receiver = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut frames = Vec::new();
        for _ in 0..3 {
            frames.push(read_frame(&mut stream));
        }
        frames
    });

    let config = channel_config(&path);
    let hint = StreamFormat::new(4, 2, PixelFormat::I420.fourcc());
    let mut tap = FrameTap::open(&config, hint).unwrap();
    assert!(tap.is_active());

    let bufs = test_planes();
    for pts in 1..=3u64 {
        let frame = test_frame(&bufs, pts * 1000);
        assert_eq!(tap.on_frame(&frame), SendOutcome::Delivered);
    }
    assert_eq!(tap.frames_sent(), 3);
    tap.close();

    let frames = receiver.join().unwrap();
    assert_eq!(frames.len(), 3);
    for (i, (header, payload)) in frames.iter().enumerate() {
        assert_eq!(header.width, 4);
        assert_eq!(header.height, 2);
        assert_eq!(header.plane_count, 3);
        assert_eq!(header.fourcc, PixelFormat::I420.fourcc());
        assert_eq!(header.pitches, [4, 2, 2, 0]);
        assert_eq!(header.lines, [2, 1, 1, 0]);
        assert_eq!(header.pts, (i as u64 + 1) * 1000);

        // 4*2 + 2*1 + 2*1 = 12 raw bytes, exactly the source planes —
        // this transport streams strided planes without repacking.
        assert_eq!(payload.len(), 12);
        assert_eq!(&payload[0..8], &bufs[0][..]);
        assert_eq!(&payload[8..10], &bufs[1][..]);
        assert_eq!(&payload[10..12], &bufs[2][..]);
    }
}

#[test]
fn padded_planes_travel_with_their_stride() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir, "padded.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let receiver = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_frame(&mut stream)
    });

    let mut transport = ChannelTransport::connect(&path);
    assert_eq!(transport.state(), LinkState::Connected);

    // Pitch 6 for a width-4 Y plane: padding travels on this transport.
    let y: Vec<u8> = vec![1, 2, 3, 4, 0xEE, 0xEE, 5, 6, 7, 8, 0xEE, 0xEE];
    let u = vec![9, 10, 0xEE];
    let v = vec![11, 12, 0xEE];
    let planes = [
        PlaneView::new(&y, 6, 2),
        PlaneView::new(&u, 3, 1),
        PlaneView::new(&v, 3, 1),
    ];
    let frame = FrameDescriptor::new(4, 2, PixelFormat::I420, &planes, 7).unwrap();

    assert_eq!(transport.send(&frame), SendOutcome::Delivered);
    transport.close();

    let (header, payload) = receiver.join().unwrap();
    assert_eq!(header.pitches, [6, 3, 3, 0]);
    assert_eq!(header.payload_len(), 12 + 3 + 3);
    assert_eq!(&payload[0..12], &y[..]);
    assert_eq!(&payload[12..15], &u[..]);
    assert_eq!(&payload[15..18], &v[..]);
}

// ── Peer disconnect ──────────────────────────────────────────────

#[test]
fn peer_disconnect_latches_failed_and_freezes_counters() {
    let dir = tempfile::tempdir().unwrap();
    let path = socket_path(&dir, "drop.sock");
    let listener = UnixListener::bind(&path).unwrap();

    let receiver = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        // Read exactly one frame, then hang up.
        let _ = read_frame(&mut stream);
    });

    let mut transport = ChannelTransport::connect(&path);
    let bufs = test_planes();
    let frame = test_frame(&bufs, 1);

    assert_eq!(transport.send(&frame), SendOutcome::Delivered);
    assert_eq!(transport.frames_sent(), 1);

    // Make sure the peer is gone before writing again.
    receiver.join().unwrap();

    // The kernel may accept a few writes into its buffer after the peer
    // closes; the transport must latch Failed as soon as one errors.
    for _ in 0..32 {
        transport.send(&frame);
        if transport.state() == LinkState::Failed {
            break;
        }
    }
    assert_eq!(transport.state(), LinkState::Failed);

    let frozen = transport.frames_sent();
    for _ in 0..10 {
        assert_eq!(transport.send(&frame), SendOutcome::Dropped);
    }
    assert_eq!(transport.frames_sent(), frozen);
}

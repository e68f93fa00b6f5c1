//! vtap-receiver — entry point.
//!
//! Listens on a Unix stream socket for frames in the vtap wire format and
//! logs what arrives. Meant as a debugging bridge before wiring the
//! channel into a real consumer: it validates headers, drains payloads,
//! and reports geometry, format, and throughput.
//!
//! ```text
//! vtap-receiver                        Listen on /tmp/vtap.sock
//! vtap-receiver --socket <path>        Listen on a custom socket
//! ```

use std::io::Read;
use std::os::unix::net::{UnixListener, UnixStream};
use std::path::PathBuf;

use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use vtap_core::config::DEFAULT_SOCKET_PATH;
use vtap_core::error::TapError;
use vtap_core::frame::fourcc_to_string;
use vtap_core::wire::FrameHeader;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "vtap-receiver", about = "Debug receiver for the vtap frame channel")]
struct Cli {
    /// Unix-socket path to listen on.
    #[arg(short, long, default_value = DEFAULT_SOCKET_PATH)]
    socket: PathBuf,

    /// Log every frame instead of a periodic summary.
    #[arg(short, long)]
    verbose: bool,
}

/// Summary cadence when not verbose (frames).
const SUMMARY_INTERVAL: u64 = 60;

/// Payload read granularity. A desynced or hostile header can declare a
/// multi-gigabyte payload, so the buffer is never sized from the header.
const DRAIN_CHUNK: usize = 1 << 20;

// ── Main ─────────────────────────────────────────────────────────

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Replace a stale socket from an earlier run.
    if cli.socket.exists() {
        std::fs::remove_file(&cli.socket)?;
    }
    let listener = UnixListener::bind(&cli.socket)?;
    info!(socket = %cli.socket.display(), "listening");

    let mut frames_total: u64 = 0;
    loop {
        let (stream, _) = listener.accept()?;
        info!("sender connected");
        match serve_connection(stream, cli.verbose, &mut frames_total) {
            Ok(()) => info!(frames = frames_total, "sender disconnected"),
            Err(e) => warn!(error = %e, "connection error; waiting for a new sender"),
        }
    }
}

/// Read frames until the sender hangs up or the stream desyncs.
fn serve_connection(
    mut stream: UnixStream,
    verbose: bool,
    frames_total: &mut u64,
) -> Result<(), TapError> {
    let mut header_bytes = [0u8; FrameHeader::SIZE];
    let mut chunk = vec![0u8; DRAIN_CHUNK];

    loop {
        if let Err(e) = stream.read_exact(&mut header_bytes) {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Ok(());
            }
            return Err(e.into());
        }

        // A bad magic means the stream desynced; drop this connection
        // and wait for a fresh one rather than hunting for alignment.
        let header = FrameHeader::decode(&header_bytes)?;

        let payload_len = header.payload_len();
        drain_payload(&mut stream, payload_len, &mut chunk)?;

        *frames_total += 1;
        if verbose {
            info!(
                frame = *frames_total,
                width = header.width,
                height = header.height,
                chroma = %fourcc_to_string(header.fourcc),
                planes = header.plane_count,
                pts = header.pts,
                payload_bytes = payload_len,
                "frame"
            );
        } else {
            debug!(
                frame = *frames_total,
                pts = header.pts,
                payload_bytes = payload_len,
                "frame"
            );
            if *frames_total % SUMMARY_INTERVAL == 0 {
                info!(
                    frames = *frames_total,
                    width = header.width,
                    height = header.height,
                    chroma = %fourcc_to_string(header.fourcc),
                    "receiving"
                );
            }
        }
    }
}

/// Read and discard `remaining` payload bytes through a fixed buffer.
fn drain_payload(
    stream: &mut impl Read,
    mut remaining: usize,
    chunk: &mut [u8],
) -> std::io::Result<()> {
    while remaining > 0 {
        let n = remaining.min(chunk.len());
        stream.read_exact(&mut chunk[..n])?;
        remaining -= n;
    }
    Ok(())
}

// ── Tests ────────────────────────────────────────────────────────

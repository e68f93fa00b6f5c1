//! Per-frame orchestration: the tap the host pipeline calls into.
//!
//! The host invokes [`FrameTap::open`] once, [`FrameTap::on_frame`] for
//! every displayed frame on the same logical callback thread, and
//! [`FrameTap::close`] once. Export is strictly best-effort: nothing that
//! happens in here may disturb playback, so every failure collapses into
//! a [`SendOutcome`] instead of an error crossing the host boundary, and
//! the host's frame is only ever borrowed.

use tracing::{info, warn};

use crate::channel::ChannelTransport;
use crate::config::{Backend, TapConfig};
use crate::error::TapError;
use crate::frame::{FrameDescriptor, PixelFormat, StreamFormat, fourcc_to_string};
use crate::ndi::NdiTransport;

/// What became of one frame handed to the tap.
///
/// This is the whole host-facing result surface: "delivered", "dropped"
/// (transport inactive, failed, or out of memory), or "rejected"
/// (unsupported input). Never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The frame reached the consumer (or the library accepted it).
    Delivered,
    /// The transport could not take the frame; it was discarded.
    Dropped,
    /// The input format is not exportable; no transport was invoked.
    Rejected,
}

/// The one active transport behind a tap instance.
enum Transport {
    Channel(ChannelTransport),
    Ndi(NdiTransport),
}

impl Transport {
    fn send(&mut self, frame: &FrameDescriptor<'_>) -> SendOutcome {
        match self {
            Transport::Channel(t) => t.send(frame),
            Transport::Ndi(t) => t.send(frame),
        }
    }

    fn is_active(&self) -> bool {
        match self {
            Transport::Channel(t) => t.is_active(),
            Transport::Ndi(t) => t.is_active(),
        }
    }

    fn frames_sent(&self) -> u64 {
        match self {
            Transport::Channel(t) => t.frames_sent(),
            Transport::Ndi(t) => t.frames_sent(),
        }
    }

    fn close(&mut self) {
        match self {
            Transport::Channel(t) => t.close(),
            Transport::Ndi(t) => t.close(),
        }
    }
}

/// Frame tap: validates incoming frames and forwards them to the one
/// transport selected at open time.
///
/// Lifecycle: Unopened → Open(Active | Inactive) → Closed, never back.
/// "Inactive" means the transport exists but its connection or sender
/// handle does not; `on_frame` degrades to counting drops.
pub struct FrameTap {
    transport: Option<Transport>,
    frames_seen: u64,
    /// FourCCs already warned about, so each rejected format logs once.
    warned_fourccs: Vec<u32>,
}

impl FrameTap {
    /// Open a tap for one playback session.
    ///
    /// Exactly one backend is chosen from `config` for the instance's
    /// lifetime. A transport that cannot establish its consumer side is
    /// kept in an inactive state rather than failing the open — the tap
    /// must come up even when nobody is listening yet. Only a degenerate
    /// format hint or an allocation failure aborts the open.
    pub fn open(config: &TapConfig, hint: StreamFormat) -> Result<Self, TapError> {
        if hint.width == 0 || hint.height == 0 {
            return Err(TapError::InvalidGeometry("zero width or height in hint"));
        }

        let transport = match config.backend {
            Backend::Channel => {
                Transport::Channel(ChannelTransport::connect(&config.channel.socket_path))
            }
            Backend::Ndi => Transport::Ndi(NdiTransport::open(&config.ndi, hint)?),
        };

        info!(
            backend = ?config.backend,
            active = transport.is_active(),
            chroma = %fourcc_to_string(hint.fourcc),
            width = hint.width,
            height = hint.height,
            "tap open"
        );

        Ok(Self {
            transport: Some(transport),
            frames_seen: 0,
            warned_fourccs: Vec::new(),
        })
    }

    /// Handle one decoded frame. Hot path.
    ///
    /// The descriptor borrows host plane memory that is valid only for
    /// this call; nothing is retained. The host's own frame continues
    /// through its pipeline untouched whatever the outcome here.
    pub fn on_frame(&mut self, frame: &FrameDescriptor<'_>) -> SendOutcome {
        self.frames_seen += 1;

        let Some(transport) = self.transport.as_mut() else {
            // Closed tap: frames pass through unexported.
            return SendOutcome::Dropped;
        };

        if !Self::exportable(frame) {
            // Log the first occurrence only; the same format will repeat
            // for every following frame of the stream.
            if self.first_sighting(frame.format.fourcc()) {
                warn!(
                    chroma = %fourcc_to_string(frame.format.fourcc()),
                    width = frame.width,
                    height = frame.height,
                    "unsupported input; frames will not be exported"
                );
            }
            return SendOutcome::Rejected;
        }

        if let Err(e) = frame.validate() {
            if self.first_sighting(frame.format.fourcc()) {
                warn!(error = %e, "invalid frame geometry; frames will not be exported");
            }
            return SendOutcome::Rejected;
        }

        transport.send(frame)
    }

    /// Whether the underlying transport can currently deliver frames.
    pub fn is_active(&self) -> bool {
        self.transport.as_ref().is_some_and(Transport::is_active)
    }

    /// Frames handed to the tap since open.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Frames the transport actually delivered.
    pub fn frames_sent(&self) -> u64 {
        self.transport.as_ref().map_or(0, Transport::frames_sent)
    }

    /// Release the transport and scratch buffers. Idempotent.
    pub fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            transport.close();
            info!(
                seen = self.frames_seen,
                sent = transport.frames_sent(),
                "tap closed"
            );
        }
    }

    /// True the first time `fourcc` is rejected; later rejections of the
    /// same format stay silent. At most a handful of formats ever appear
    /// in one stream, so a linear scan is fine.
    fn first_sighting(&mut self, fourcc: u32) -> bool {
        if self.warned_fourccs.contains(&fourcc) {
            return false;
        }
        self.warned_fourccs.push(fourcc);
        true
    }

    /// Supported input: planar 4:2:0 with even dimensions.
    fn exportable(frame: &FrameDescriptor<'_>) -> bool {
        matches!(frame.format, PixelFormat::I420 | PixelFormat::Yv12)
            && frame.width % 2 == 0
            && frame.height % 2 == 0
    }
}

impl Drop for FrameTap {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Tests ────────────────────────────────────────────────────────

//! Video-over-IP transport backed by the NDI sending library.
//!
//! One [`NdiTransport`] owns one sender handle. Frames are packed to a
//! contiguous I420 buffer (the library's FourCC is fixed to I420) and
//! handed to `NDIlib_send_send_video_v2`, which is fire-and-forget: no
//! completion is awaited and the packed buffer is free for reuse as soon
//! as the call returns.
//!
//! A missing runtime or a refused sender handle leaves the transport
//! present-but-inactive — frames are dropped and playback is unaffected.

pub mod sys;

use std::ffi::CString;
use std::ptr;

use tracing::{debug, info, warn};

use crate::config::NdiConfig;
use crate::error::TapError;
use crate::frame::{FrameDescriptor, StreamFormat};
use crate::pack::PixelPacker;
use crate::tap::SendOutcome;

/// How often a successful send logs progress (in frames).
const PROGRESS_INTERVAL: u64 = 60;

/// Scale from the tap's microsecond timestamps to the library's
/// 100-nanosecond timecode units.
const TIMECODE_SCALE: i64 = 10;

/// Sender-side NDI transport.
pub struct NdiTransport {
    sender: Option<sys::SendInstance>,
    packer: PixelPacker,
    frame_rate_num: u32,
    frame_rate_den: u32,
    frames_seen: u64,
    frames_sent: u64,
}

impl NdiTransport {
    /// Create a sender named after the config.
    ///
    /// Library absence or sender-creation failure is logged and leaves
    /// the transport inactive; only a scratch-allocation failure for the
    /// hinted geometry fails the open.
    pub fn open(config: &NdiConfig, hint: StreamFormat) -> Result<Self, TapError> {
        let mut packer = PixelPacker::new();
        packer.reserve_for(hint.width, hint.height)?;

        let sender = match Self::create_sender(config) {
            Ok(sender) => {
                info!(
                    name = %config.stream_name,
                    width = hint.width,
                    height = hint.height,
                    "NDI sender started"
                );
                Some(sender)
            }
            Err(e) => {
                warn!(error = %e, "NDI unavailable; frames will be dropped");
                None
            }
        };

        Ok(Self {
            sender,
            packer,
            frame_rate_num: hint.frame_rate_num,
            frame_rate_den: hint.frame_rate_den,
            frames_seen: 0,
            frames_sent: 0,
        })
    }

    fn create_sender(config: &NdiConfig) -> Result<sys::SendInstance, TapError> {
        let rt = sys::runtime()?;

        let name = CString::new(config.stream_name.as_str())
            .map_err(|_| TapError::SenderCreate("stream name contains NUL".into()))?;
        let settings = sys::SendCreate {
            p_ndi_name: name.as_ptr(),
            p_groups: ptr::null(),
            clock_video: config.clock_video,
            clock_audio: false,
        };

        let sender = rt.send_create(&settings);
        if sender.is_null() {
            return Err(TapError::SenderCreate(format!(
                "NDIlib_send_create returned null for '{}'",
                config.stream_name
            )));
        }
        Ok(sender)
    }

    /// Pack and submit one frame.
    pub fn send(&mut self, frame: &FrameDescriptor<'_>) -> SendOutcome {
        self.frames_seen += 1;

        let Some(sender) = self.sender else {
            return SendOutcome::Dropped;
        };

        let packed = match self.packer.pack(frame) {
            Ok(buf) => buf,
            Err(TapError::ScratchAlloc(bytes)) => {
                warn!(bytes, "scratch growth failed; dropping frame");
                return SendOutcome::Dropped;
            }
            Err(_) => return SendOutcome::Rejected,
        };

        let video = sys::VideoFrame {
            xres: frame.width as i32,
            yres: frame.height as i32,
            four_cc: sys::FOURCC_I420,
            frame_rate_n: self.frame_rate_num as i32,
            frame_rate_d: self.frame_rate_den as i32,
            picture_aspect_ratio: frame.aspect_ratio(),
            frame_format_type: sys::FRAME_FORMAT_PROGRESSIVE,
            timecode: (frame.pts as i64).wrapping_mul(TIMECODE_SCALE),
            p_data: packed.as_ptr(),
            line_stride_in_bytes: frame.width as i32,
            p_metadata: ptr::null(),
            timestamp: 0,
        };

        // Fire-and-forget: the runtime is known good while a sender exists.
        if let Ok(rt) = sys::runtime() {
            rt.send_video(sender, &video);
        }

        self.frames_sent += 1;
        if self.frames_sent % PROGRESS_INTERVAL == 0 {
            debug!(
                frames = self.frames_sent,
                width = frame.width,
                height = frame.height,
                "NDI progress"
            );
        }
        SendOutcome::Delivered
    }

    /// Whether a sender handle exists.
    pub fn is_active(&self) -> bool {
        self.sender.is_some()
    }

    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Destroy the sender handle. The process-wide runtime stays up for
    /// other instances.
    pub fn close(&mut self) {
        if let Some(sender) = self.sender.take() {
            if let Ok(rt) = sys::runtime() {
                rt.send_destroy(sender);
            }
            info!(sent = self.frames_sent, "NDI sender stopped");
        }
    }
}

impl Drop for NdiTransport {
    fn drop(&mut self) {
        self.close();
    }
}

// ── Tests ────────────────────────────────────────────────────────

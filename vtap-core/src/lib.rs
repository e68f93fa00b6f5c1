//! # vtap-core
//!
//! Frame-export tap for a media-playback pipeline. The host decodes
//! video and calls the tap once per displayed frame; the tap forwards a
//! copy of the frame to an external consumer without ever touching
//! playback.
//!
//! This crate contains:
//! - **Frame model**: [`FrameDescriptor`], [`PlaneView`], [`PixelFormat`] —
//!   borrowed, stride-aware views of host-owned planes
//! - **Packing**: [`PixelPacker`] — strided 4:2:0 planes → contiguous I420
//! - **Wire format**: [`FrameHeader`] — fixed little-endian header for the
//!   local-channel protocol
//! - **Writer**: `write_all` — short-write-tolerant blocking writes
//! - **Transports**: [`ChannelTransport`] (Unix socket) and
//!   [`NdiTransport`] (dynamically loaded NDI runtime)
//! - **Orchestration**: [`FrameTap`] — open / on_frame / close with
//!   best-effort [`SendOutcome`] semantics
//! - **Config**: [`TapConfig`] — TOML configuration
//! - **Error**: [`TapError`] — typed, `thiserror`-based hierarchy
//!
//! The tap is single-threaded by contract: the host guarantees open,
//! frame, and close calls arrive in order on one logical callback thread,
//! so per-instance state carries no locks. The only process-wide state is
//! the NDI runtime, guarded by a one-time initialization cell.

pub mod channel;
pub mod config;
pub mod error;
pub mod frame;
pub mod ndi;
pub mod pack;
pub mod tap;
pub mod wire;
pub mod writer;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use channel::{ChannelTransport, LinkState};
pub use config::{Backend, ChannelConfig, LoggingConfig, NdiConfig, TapConfig};
pub use error::TapError;
pub use frame::{FrameDescriptor, MAX_PLANES, PixelFormat, PlaneView, StreamFormat};
pub use ndi::NdiTransport;
pub use pack::{PixelPacker, packed_420_len};
pub use tap::{FrameTap, SendOutcome};
pub use wire::{FrameHeader, MAGIC, VERSION};
pub use writer::{WriteError, write_all};

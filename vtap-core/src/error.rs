//! Domain-specific error types for the frame tap.
//!
//! All fallible operations return `Result<T, TapError>`. No panics on
//! invalid input — every error is typed and recoverable. Nothing in this
//! hierarchy ever reaches the host pipeline as a fatal condition: the tap
//! boundary translates failures into [`crate::tap::SendOutcome`] values.

use thiserror::Error;

use crate::frame::fourcc_to_string;

/// The canonical error type for the tap.
#[derive(Debug, Error)]
pub enum TapError {
    // ── Format Errors ────────────────────────────────────────────
    /// The incoming frame's pixel format is not in the supported set.
    #[error("unsupported pixel format: {}", fourcc_to_string(*.0))]
    UnsupportedFormat(u32),

    /// Width or height is not divisible by 2, which would truncate the
    /// chroma planes of a 4:2:0 frame.
    #[error("odd frame dimensions for 4:2:0 chroma: {width}x{height}")]
    OddDimensions { width: u32, height: u32 },

    /// A geometry or stride invariant was violated.
    #[error("invalid frame geometry: {0}")]
    InvalidGeometry(&'static str),

    // ── Wire Errors ──────────────────────────────────────────────
    /// A received header is shorter than the fixed wire layout.
    #[error("truncated frame header: {len} bytes")]
    TruncatedHeader { len: usize },

    /// Received bytes that do not start with the VCAM magic sequence.
    #[error("invalid magic bytes")]
    InvalidMagic,

    /// The header announces a protocol version this build cannot parse.
    #[error("unsupported protocol version: {0}")]
    UnsupportedVersion(u32),

    // ── Transport Errors ─────────────────────────────────────────
    /// The external sending library could not be loaded or initialized.
    #[error("sending library unavailable: {0}")]
    RuntimeUnavailable(String),

    /// The external library refused to create a sender handle.
    #[error("sender creation failed: {0}")]
    SenderCreate(String),

    /// The I/O layer reported an error.
    #[error("connection error: {0}")]
    Io(#[from] std::io::Error),

    // ── Resource Errors ──────────────────────────────────────────
    /// Growing the packing scratch buffer failed.
    #[error("scratch buffer allocation failed ({0} bytes)")]
    ScratchAlloc(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let e = TapError::OddDimensions {
            width: 639,
            height: 480,
        };
        assert!(e.to_string().contains("639x480"));

        let e = TapError::UnsupportedVersion(7);
        assert!(e.to_string().contains('7'));
    }

    #[test]
    fn unsupported_format_names_fourcc() {
        let e = TapError::UnsupportedFormat(u32::from_le_bytes(*b"RV32"));
        assert!(e.to_string().contains("RV32"));
    }

    #[test]
    fn from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe broke");
        let e: TapError = io_err.into();
        assert!(matches!(e, TapError::Io(_)));
    }
}

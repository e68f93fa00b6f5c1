//! Frame descriptions shared by the packer, the wire framer, and the
//! transports.
//!
//! A [`FrameDescriptor`] is a normalized, pipeline-agnostic view of one
//! decoded video frame. It **borrows** the host's plane memory: every
//! [`PlaneView`] inside it is valid only for the duration of the call that
//! provided the frame and must never be stored past that call.

use crate::error::TapError;

/// Maximum number of planes a frame may carry on the wire.
pub const MAX_PLANES: usize = 4;

/// Render a FourCC tag as printable ASCII (for diagnostics).
pub fn fourcc_to_string(fourcc: u32) -> String {
    fourcc
        .to_le_bytes()
        .iter()
        .map(|&b| {
            if b.is_ascii_graphic() || b == b' ' {
                b as char
            } else {
                '?'
            }
        })
        .collect()
}

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of a decoded frame, tagged by its FourCC code.
///
/// The numeric values are the ASCII FourCC in little-endian byte order,
/// identical to the host pipeline's chroma codes and to the NDI video
/// FourCC enum, so the tag travels unchanged across every boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum PixelFormat {
    /// Planar YUV 4:2:0 — Y, U, V planes.
    I420 = 0x30323449,
    /// Planar YUV 4:2:0 — Y, V, U planes (chroma order swapped).
    Yv12 = 0x32315659,
    /// Packed YUV 4:2:2 — single interleaved plane.
    Uyvy = 0x59565955,
}

impl PixelFormat {
    /// Map a host chroma FourCC onto a known format.
    pub fn from_fourcc(fourcc: u32) -> Option<Self> {
        match fourcc {
            0x30323449 => Some(PixelFormat::I420),
            0x32315659 => Some(PixelFormat::Yv12),
            0x59565955 => Some(PixelFormat::Uyvy),
            _ => None,
        }
    }

    /// The FourCC tag carried on the wire.
    pub const fn fourcc(self) -> u32 {
        self as u32
    }

    /// Number of planes this format stores.
    pub const fn plane_count(self) -> usize {
        match self {
            PixelFormat::I420 | PixelFormat::Yv12 => 3,
            PixelFormat::Uyvy => 1,
        }
    }

    /// Whether this is a planar 4:2:0 layout (half-resolution chroma).
    pub const fn is_planar_420(self) -> bool {
        matches!(self, PixelFormat::I420 | PixelFormat::Yv12)
    }

    /// Logical row width in bytes for plane `index` at frame width `width`.
    pub const fn row_bytes(self, index: usize, width: u32) -> usize {
        match self {
            PixelFormat::I420 | PixelFormat::Yv12 => {
                if index == 0 {
                    width as usize
                } else {
                    (width / 2) as usize
                }
            }
            // UYVY packs 2 pixels into 4 bytes.
            PixelFormat::Uyvy => (width as usize) * 2,
        }
    }
}

// ── PlaneView ────────────────────────────────────────────────────

/// Borrowed, non-owning view of one plane of host memory.
///
/// `data` holds `lines` rows of `pitch` bytes each; `pitch` may exceed
/// the logical row width due to decoder padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaneView<'a> {
    /// Raw plane bytes — at least `pitch * lines` long.
    pub data: &'a [u8],
    /// Row pitch in bytes.
    pub pitch: usize,
    /// Number of rows.
    pub lines: usize,
}

impl<'a> PlaneView<'a> {
    pub fn new(data: &'a [u8], pitch: usize, lines: usize) -> Self {
        Self { data, pitch, lines }
    }

    /// Total bytes this plane contributes to a raw wire payload.
    pub fn byte_len(&self) -> usize {
        self.pitch * self.lines
    }
}

// ── FrameDescriptor ──────────────────────────────────────────────

/// One decoded frame, described for export.
///
/// Built by the tap from host data once per frame; read-only for the
/// lifetime of one send call; never persisted.
#[derive(Debug, Clone, Copy)]
pub struct FrameDescriptor<'a> {
    /// Visible width in pixels.
    pub width: u32,
    /// Visible height in pixels.
    pub height: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Number of populated entries in `planes`.
    pub plane_count: usize,
    /// Plane views; slots at and past `plane_count` are empty.
    pub planes: [PlaneView<'a>; MAX_PLANES],
    /// Opaque presentation timestamp, passed through unmodified.
    pub pts: u64,
}

impl<'a> FrameDescriptor<'a> {
    /// Build a descriptor from host planes.
    ///
    /// `host_planes` must hold exactly `format.plane_count()` entries.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        host_planes: &[PlaneView<'a>],
        pts: u64,
    ) -> Result<Self, TapError> {
        if host_planes.len() != format.plane_count() {
            return Err(TapError::InvalidGeometry(
                "plane count does not match pixel format",
            ));
        }
        let mut planes = [PlaneView::default(); MAX_PLANES];
        planes[..host_planes.len()].copy_from_slice(host_planes);
        let frame = Self {
            width,
            height,
            format,
            plane_count: host_planes.len(),
            planes,
            pts,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// Check every geometry invariant the export path relies on.
    pub fn validate(&self) -> Result<(), TapError> {
        if self.width == 0 || self.height == 0 {
            return Err(TapError::InvalidGeometry("zero width or height"));
        }
        if self.plane_count != self.format.plane_count() {
            return Err(TapError::InvalidGeometry(
                "plane count does not match pixel format",
            ));
        }
        if self.format.is_planar_420() && (self.width % 2 != 0 || self.height % 2 != 0) {
            return Err(TapError::OddDimensions {
                width: self.width,
                height: self.height,
            });
        }
        for (i, plane) in self.planes[..self.plane_count].iter().enumerate() {
            if plane.pitch < self.format.row_bytes(i, self.width) {
                return Err(TapError::InvalidGeometry("pitch below logical row width"));
            }
            if plane.data.len() < plane.byte_len() {
                return Err(TapError::InvalidGeometry("plane shorter than pitch * lines"));
            }
        }
        Ok(())
    }

    /// Picture aspect ratio, recomputed each frame.
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height as f32
    }

    /// Iterator over the populated planes.
    pub fn planes(&self) -> impl Iterator<Item = &PlaneView<'a>> {
        self.planes[..self.plane_count].iter()
    }
}

// ── StreamFormat ─────────────────────────────────────────────────

/// Format hint the host provides when the tap opens.
///
/// The geometry pre-sizes the packing scratch; the frame-rate fraction is
/// forwarded to the video-over-IP sender, which needs it per frame.
#[derive(Debug, Clone, Copy)]
pub struct StreamFormat {
    pub width: u32,
    pub height: u32,
    /// Host chroma FourCC (may be a format the tap cannot export).
    pub fourcc: u32,
    pub frame_rate_num: u32,
    pub frame_rate_den: u32,
}

impl StreamFormat {
    pub fn new(width: u32, height: u32, fourcc: u32) -> Self {
        Self {
            width,
            height,
            fourcc,
            frame_rate_num: 30,
            frame_rate_den: 1,
        }
    }

    pub fn with_frame_rate(mut self, num: u32, den: u32) -> Self {
        self.frame_rate_num = num;
        self.frame_rate_den = den;
        self
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn i420_planes(width: u32, height: u32, pad: usize) -> [Vec<u8>; 3] {
        let (w, h) = (width as usize, height as usize);
        [
            vec![0u8; (w + pad) * h],
            vec![0u8; (w / 2 + pad) * (h / 2)],
            vec![0u8; (w / 2 + pad) * (h / 2)],
        ]
    }

    fn descriptor<'a>(
        width: u32,
        height: u32,
        format: PixelFormat,
        bufs: &'a [Vec<u8>; 3],
        pad: usize,
    ) -> Result<FrameDescriptor<'a>, TapError> {
        let (w, h) = (width as usize, height as usize);
        let planes = [
            PlaneView::new(&bufs[0], w + pad, h),
            PlaneView::new(&bufs[1], w / 2 + pad, h / 2),
            PlaneView::new(&bufs[2], w / 2 + pad, h / 2),
        ];
        FrameDescriptor::new(width, height, format, &planes, 0)
    }

    #[test]
    fn fourcc_values_match_ascii() {
        assert_eq!(PixelFormat::I420.fourcc(), u32::from_le_bytes(*b"I420"));
        assert_eq!(PixelFormat::Yv12.fourcc(), u32::from_le_bytes(*b"YV12"));
        assert_eq!(PixelFormat::Uyvy.fourcc(), u32::from_le_bytes(*b"UYVY"));
    }

    #[test]
    fn from_fourcc_roundtrip() {
        for fmt in [PixelFormat::I420, PixelFormat::Yv12, PixelFormat::Uyvy] {
            assert_eq!(PixelFormat::from_fourcc(fmt.fourcc()), Some(fmt));
        }
        assert_eq!(PixelFormat::from_fourcc(u32::from_le_bytes(*b"RV32")), None);
    }

    #[test]
    fn valid_descriptor_passes() {
        let bufs = i420_planes(4, 2, 3);
        let frame = descriptor(4, 2, PixelFormat::I420, &bufs, 3).unwrap();
        assert_eq!(frame.plane_count, 3);
        assert_eq!(frame.planes[0].pitch, 7);
    }

    #[test]
    fn odd_dimensions_rejected() {
        let bufs = i420_planes(6, 4, 0);
        let err = descriptor(5, 4, PixelFormat::I420, &bufs, 0).unwrap_err();
        assert!(matches!(err, TapError::OddDimensions { width: 5, .. }));
    }

    #[test]
    fn zero_dimension_rejected() {
        let bufs = i420_planes(4, 2, 0);
        assert!(descriptor(0, 2, PixelFormat::I420, &bufs, 0).is_err());
    }

    #[test]
    fn pitch_below_row_width_rejected() {
        let bufs = i420_planes(4, 2, 0);
        let planes = [
            PlaneView::new(&bufs[0], 3, 2), // pitch 3 < width 4
            PlaneView::new(&bufs[1], 2, 1),
            PlaneView::new(&bufs[2], 2, 1),
        ];
        let err = FrameDescriptor::new(4, 2, PixelFormat::I420, &planes, 0).unwrap_err();
        assert!(matches!(err, TapError::InvalidGeometry(_)));
    }

    #[test]
    fn plane_count_mismatch_rejected() {
        let buf = vec![0u8; 16];
        let planes = [PlaneView::new(&buf, 8, 2)];
        assert!(FrameDescriptor::new(4, 2, PixelFormat::I420, &planes, 0).is_err());
    }

    #[test]
    fn hand_built_plane_count_mismatch_rejected() {
        // Fields are public, so a descriptor can be assembled without
        // going through `new`; validation must still catch a plane count
        // that disagrees with the format before anything slices chroma.
        let buf = vec![0u8; 8];
        let mut planes = [PlaneView::default(); MAX_PLANES];
        planes[0] = PlaneView::new(&buf, 4, 2);
        let frame = FrameDescriptor {
            width: 4,
            height: 2,
            format: PixelFormat::I420,
            plane_count: 1,
            planes,
            pts: 0,
        };
        assert!(matches!(
            frame.validate(),
            Err(TapError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn aspect_ratio_derived() {
        let bufs = i420_planes(1920, 1080, 0);
        let frame = descriptor(1920, 1080, PixelFormat::I420, &bufs, 0).unwrap();
        assert!((frame.aspect_ratio() - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn fourcc_to_string_handles_garbage() {
        assert_eq!(fourcc_to_string(u32::from_le_bytes(*b"I420")), "I420");
        assert_eq!(fourcc_to_string(0x00000001), "????");
    }
}

//! Wire format for the local-channel transport.
//!
//! One frame on the wire is a fixed 64-byte header followed by the raw
//! plane payloads. All integers are **little-endian**; producer and
//! consumer may differ in architecture.
//!
//! ## Header layout (64 bytes)
//!
//! ```text
//! magic:        u32   (4)  0x5643414D, "VCAM"
//! version:      u32   (4)  currently 1
//! width:        u32   (4)
//! height:       u32   (4)
//! fourcc:       u32   (4)  source pixel format tag
//! plane_count:  u32   (4)  ≤ 4
//! pts:          u64   (8)  opaque presentation time
//! pitches[4]:   u32  (16)  row stride per plane, 0 for unused slots
//! lines[4]:     u32  (16)  row count per plane, 0 for unused slots
//! ```
//!
//! Followed by, for each plane `i < plane_count`:
//! `pitches[i] * lines[i]` raw bytes in original host stride — this
//! transport does not repack; the receiver recovers the geometry from
//! the header.

use crate::error::TapError;
use crate::frame::{FrameDescriptor, MAX_PLANES};

/// Protocol magic, "VCAM" read as a big-endian u32.
pub const MAGIC: u32 = 0x5643_414D;

/// Wire protocol version this build speaks.
pub const VERSION: u32 = 1;

// ── FrameHeader ──────────────────────────────────────────────────

/// Per-frame metadata preceding the plane payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub width: u32,
    pub height: u32,
    pub fourcc: u32,
    pub plane_count: u32,
    pub pts: u64,
    pub pitches: [u32; MAX_PLANES],
    pub lines: [u32; MAX_PLANES],
}

impl FrameHeader {
    /// Encoded size on the wire.
    pub const SIZE: usize = 64;

    /// Describe `frame` for the wire.
    pub fn from_descriptor(frame: &FrameDescriptor<'_>) -> Self {
        let mut pitches = [0u32; MAX_PLANES];
        let mut lines = [0u32; MAX_PLANES];
        for (i, plane) in frame.planes().enumerate() {
            pitches[i] = plane.pitch as u32;
            lines[i] = plane.lines as u32;
        }
        Self {
            width: frame.width,
            height: frame.height,
            fourcc: frame.format.fourcc(),
            plane_count: frame.plane_count as u32,
            pts: frame.pts,
            pitches,
            lines,
        }
    }

    /// Serialize to bytes (little-endian).
    pub fn encode(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..4].copy_from_slice(&MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&self.width.to_le_bytes());
        buf[12..16].copy_from_slice(&self.height.to_le_bytes());
        buf[16..20].copy_from_slice(&self.fourcc.to_le_bytes());
        buf[20..24].copy_from_slice(&self.plane_count.to_le_bytes());
        buf[24..32].copy_from_slice(&self.pts.to_le_bytes());
        for i in 0..MAX_PLANES {
            let off = 32 + i * 4;
            buf[off..off + 4].copy_from_slice(&self.pitches[i].to_le_bytes());
        }
        for i in 0..MAX_PLANES {
            let off = 48 + i * 4;
            buf[off..off + 4].copy_from_slice(&self.lines[i].to_le_bytes());
        }
        buf
    }

    /// Deserialize from bytes, checking magic and version.
    pub fn decode(data: &[u8]) -> Result<Self, TapError> {
        if data.len() < Self::SIZE {
            return Err(TapError::TruncatedHeader { len: data.len() });
        }
        let u32_at = |off: usize| u32::from_le_bytes(data[off..off + 4].try_into().unwrap());

        if u32_at(0) != MAGIC {
            return Err(TapError::InvalidMagic);
        }
        let version = u32_at(4);
        if version != VERSION {
            return Err(TapError::UnsupportedVersion(version));
        }

        let mut pitches = [0u32; MAX_PLANES];
        let mut lines = [0u32; MAX_PLANES];
        for i in 0..MAX_PLANES {
            pitches[i] = u32_at(32 + i * 4);
            lines[i] = u32_at(48 + i * 4);
        }

        Ok(Self {
            width: u32_at(8),
            height: u32_at(12),
            fourcc: u32_at(16),
            plane_count: u32_at(20),
            pts: u64::from_le_bytes(data[24..32].try_into().unwrap()),
            pitches,
            lines,
        })
    }

    /// Total payload bytes that follow this header on the wire.
    pub fn payload_len(&self) -> usize {
        let count = (self.plane_count as usize).min(MAX_PLANES);
        (0..count)
            .map(|i| self.pitches[i] as usize * self.lines[i] as usize)
            .sum()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameDescriptor, PixelFormat, PlaneView};

    fn header(plane_count: u32) -> FrameHeader {
        let mut pitches = [0u32; MAX_PLANES];
        let mut lines = [0u32; MAX_PLANES];
        for i in 0..plane_count as usize {
            pitches[i] = 2 + i as u32;
            lines[i] = 1 + i as u32;
        }
        FrameHeader {
            width: 2,
            height: 2,
            fourcc: PixelFormat::I420.fourcc(),
            plane_count,
            pts: 0xDEAD_BEEF_CAFE_0001,
            pitches,
            lines,
        }
    }

    #[test]
    fn roundtrip_minimum_geometry_all_plane_counts() {
        for count in 1..=4u32 {
            let hdr = header(count);
            let decoded = FrameHeader::decode(&hdr.encode()).unwrap();
            assert_eq!(decoded, hdr, "plane_count={count}");
        }
    }

    #[test]
    fn magic_and_version_sit_first() {
        let bytes = header(3).encode();
        assert_eq!(&bytes[0..4], &MAGIC.to_le_bytes());
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
    }

    #[test]
    fn bad_magic_rejected() {
        let mut bytes = header(3).encode();
        bytes[0] ^= 0xFF;
        assert!(matches!(
            FrameHeader::decode(&bytes),
            Err(TapError::InvalidMagic)
        ));
    }

    #[test]
    fn future_version_rejected() {
        let mut bytes = header(3).encode();
        bytes[4..8].copy_from_slice(&2u32.to_le_bytes());
        assert!(matches!(
            FrameHeader::decode(&bytes),
            Err(TapError::UnsupportedVersion(2))
        ));
    }

    #[test]
    fn short_buffer_rejected() {
        let bytes = header(3).encode();
        assert!(matches!(
            FrameHeader::decode(&bytes[..FrameHeader::SIZE - 1]),
            Err(TapError::TruncatedHeader { .. })
        ));
    }

    #[test]
    fn payload_len_sums_used_planes_only() {
        let hdr = header(2);
        // plane 0: 2 * 1, plane 1: 3 * 2 — planes 2/3 are zero slots.
        assert_eq!(hdr.payload_len(), 2 + 6);
    }

    #[test]
    fn from_descriptor_copies_geometry() {
        let bufs = [vec![0u8; 12], vec![0u8; 3], vec![0u8; 3]];
        let planes = [
            PlaneView::new(&bufs[0], 6, 2),
            PlaneView::new(&bufs[1], 3, 1),
            PlaneView::new(&bufs[2], 3, 1),
        ];
        let frame = FrameDescriptor::new(4, 2, PixelFormat::I420, &planes, 42).unwrap();
        let hdr = FrameHeader::from_descriptor(&frame);
        assert_eq!(hdr.width, 4);
        assert_eq!(hdr.plane_count, 3);
        assert_eq!(hdr.pts, 42);
        assert_eq!(hdr.pitches, [6, 3, 3, 0]);
        assert_eq!(hdr.lines, [2, 1, 1, 0]);
        assert_eq!(hdr.payload_len(), 12 + 3 + 3);
    }
}

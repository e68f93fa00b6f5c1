//! Strided-plane to contiguous-buffer packing.
//!
//! The video-over-IP library wants one contiguous I420 buffer with a tight
//! stride, while decoders hand out planes whose rows carry alignment
//! padding. [`PixelPacker`] copies each plane row by row into a single
//! scratch buffer laid out as:
//!
//! ```text
//! [Y: width × height][U: width/2 × height/2][V: width/2 × height/2]
//! ```
//!
//! The scratch buffer belongs to the packer and is reused across frames.
//! Capacity only grows, never shrinks; the returned slice is overwritten
//! by the next `pack` call and must not be retained past it.

use crate::error::TapError;
use crate::frame::{FrameDescriptor, PixelFormat, PlaneView};

/// Number of payload bytes a packed 4:2:0 frame occupies.
pub fn packed_420_len(width: u32, height: u32) -> usize {
    let (w, h) = (width as usize, height as usize);
    w * h + 2 * (w / 2) * (h / 2)
}

/// Converts planar 4:2:0 frames into tightly packed I420 buffers.
pub struct PixelPacker {
    scratch: Vec<u8>,
}

impl PixelPacker {
    pub fn new() -> Self {
        Self {
            scratch: Vec::new(),
        }
    }

    /// Pre-size the scratch for the given geometry.
    ///
    /// Called at open time so an allocation failure surfaces there, where
    /// it is allowed to abort opening, instead of mid-playback.
    pub fn reserve_for(&mut self, width: u32, height: u32) -> Result<(), TapError> {
        self.grow_to(packed_420_len(width, height))
    }

    /// Pack `frame` into the scratch buffer and return the packed bytes.
    ///
    /// The output is always true I420: YV12 input has its chroma planes
    /// read in swapped order. The frame must be planar 4:2:0 with even
    /// dimensions; anything else was rejected upstream and is rejected
    /// again here.
    pub fn pack(&mut self, frame: &FrameDescriptor<'_>) -> Result<&[u8], TapError> {
        if !frame.format.is_planar_420() {
            return Err(TapError::UnsupportedFormat(frame.format.fourcc()));
        }
        if frame.width % 2 != 0 || frame.height % 2 != 0 {
            return Err(TapError::OddDimensions {
                width: frame.width,
                height: frame.height,
            });
        }
        frame.validate()?;

        let (w, h) = (frame.width as usize, frame.height as usize);
        let (cw, ch) = (w / 2, h / 2);
        let required = packed_420_len(frame.width, frame.height);
        self.grow_to(required)?;

        // YV12 stores V before U; emit I420 order regardless.
        let (u_idx, v_idx) = match frame.format {
            PixelFormat::Yv12 => (2, 1),
            _ => (1, 2),
        };

        copy_plane(&mut self.scratch[..w * h], &frame.planes[0], w, h);
        copy_plane(
            &mut self.scratch[w * h..w * h + cw * ch],
            &frame.planes[u_idx],
            cw,
            ch,
        );
        copy_plane(
            &mut self.scratch[w * h + cw * ch..required],
            &frame.planes[v_idx],
            cw,
            ch,
        );

        Ok(&self.scratch[..required])
    }

    /// Current scratch capacity in bytes (diagnostics and tests).
    pub fn capacity(&self) -> usize {
        self.scratch.capacity()
    }

    fn grow_to(&mut self, required: usize) -> Result<(), TapError> {
        if self.scratch.len() < required {
            let additional = required - self.scratch.len();
            self.scratch
                .try_reserve_exact(additional)
                .map_err(|_| TapError::ScratchAlloc(required))?;
            self.scratch.resize(required, 0);
        }
        Ok(())
    }
}

impl Default for PixelPacker {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy `rows` rows of `row_bytes` each from a strided plane into `dst`.
fn copy_plane(dst: &mut [u8], plane: &PlaneView<'_>, row_bytes: usize, rows: usize) {
    for y in 0..rows {
        let src = y * plane.pitch;
        dst[y * row_bytes..(y + 1) * row_bytes]
            .copy_from_slice(&plane.data[src..src + row_bytes]);
    }
}

// ── Tests ────────────────────────────────────────────────────────

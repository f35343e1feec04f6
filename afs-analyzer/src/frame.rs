//! Frame-level data model: [`Csp`], [`Picstruct`], [`FrameFlags`], [`FrameInfo`], [`SourceFrame`].

use bitflags::bitflags;
use std::sync::Arc;

/// Chroma subsampling × bit-depth variant of a planar frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Csp {
    Yuv420_8,
    Yuv420_16,
    Yuv444_8,
    Yuv444_16,
}

impl Csp {
    pub fn is_420(self) -> bool {
        matches!(self, Self::Yuv420_8 | Self::Yuv420_16)
    }

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Yuv420_8 | Self::Yuv444_8 => 1,
            Self::Yuv420_16 | Self::Yuv444_16 => 2,
        }
    }
}

/// Interlace structure of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Picstruct {
    Frame,
    TopFieldFirst,
    BottomFieldFirst,
}

bitflags! {
    /// Pulldown/interlace flags carried on [`FrameInfo`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FrameFlags: u8 {
        const INTERLACED = 0x01;
        const RFF        = 0x02;
        const RFF_TFF    = 0x04;
        const RFF_BFF    = 0x08;
        const RFF_COPY   = 0x10;
    }
}

/// A pitched, planar image as delivered by a [`crate::FrameSource`] — the opaque device
/// allocation the AFS core reads, as described in spec §3 "FrameInfo". In this repository the
/// "device address" is an ordinary host-resident byte buffer (see SPEC_FULL.md §9 "Device
/// reductions on host"): the `CodecBackend`/`FrameSource` traits are the only genuinely
/// vendor-specific seam, and they are already abstracted and mockable.
#[derive(Debug, Clone)]
pub struct FrameInfo {
    pub csp: Csp,
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub data: Arc<Vec<u8>>,
    pub picstruct: Picstruct,
    pub flags: FrameFlags,
    pub timestamp: i64,
    pub duration: i64,
}

/// A [`FrameInfo`] admitted into [`crate::SourceCache`], with 4:2:0 chroma fields
/// de-interleaved per spec §3/§4.1: luma in `[0, H)`, U-even in `[H, 5H/4)`, U-odd in
/// `[5H/4, 6H/4)`, V-even in `[6H/4, 7H/4)`, V-odd in `[7H/4, 2H)`. 4:4:4 variants are stored
/// plain (a straight copy of the source buffer).
///
/// Once admitted, a `SourceFrame`'s pixel data is never mutated — only `flags`/`timestamp` are
/// re-stamped when the owning slot is reused for a later frame index.
#[derive(Debug, Clone)]
pub struct SourceFrame {
    pub frame_index: i64,
    pub csp: Csp,
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
    pub data: Vec<u8>,
    pub picstruct: Picstruct,
    pub flags: FrameFlags,
    pub timestamp: i64,
    pub duration: i64,
}

impl SourceFrame {
    /// Offset, in rows, of the U-even field plane within `data` (4:2:0 only).
    pub fn u_even_row_offset(&self) -> usize {
        self.height as usize
    }

    pub fn u_odd_row_offset(&self) -> usize {
        self.height as usize * 5 / 4
    }

    pub fn v_even_row_offset(&self) -> usize {
        self.height as usize * 6 / 4
    }

    pub fn v_odd_row_offset(&self) -> usize {
        self.height as usize * 7 / 4
    }

    /// A single row, `pitch` bytes wide, starting at device-row `row`.
    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.pitch;
        &self.data[start..start + self.pitch]
    }
}


//! Composes final output pixels from two source frames and a (possibly filtered) stripe map
//! (spec §4.7). Grounded on `NVEncFilterAfs::synthesize`'s call site in the original filter;
//! the device kernel itself is CUDA-only and not part of the retrieved source, so the
//! per-pixel selection rule below is a direct host-side reading of the spec's description:
//! "selects per-pixel between curr, a weave of curr and prev, or a smoothed blend, based on
//! the StripeMap bits and whether the frame is at a shift boundary."
//!
//! The `shift`/`tb_order` inputs below come from the caller's cadence decision (the root
//! crate's orchestrator, reading `Status::SHIFTn` out of the classifier's output) rather than
//! from any config type in this crate — the analyzer stays config-agnostic.

use crate::frame::{Csp, FrameInfo, FrameFlags, Picstruct, SourceFrame};
use crate::stripe_cache::StripeMap;
use std::sync::Arc;

/// Bit-copies a progressive `SourceFrame`, re-interleaving 4:2:0 chroma back into plain rows
/// (the inverse of [`crate::source_cache::de_interleave_420`]).
pub fn passthrough_progressive(src: &SourceFrame, timestamp: i64, duration: i64) -> FrameInfo {
    let data = match src.csp {
        Csp::Yuv420_8 | Csp::Yuv420_16 => re_interleave_420(src),
        Csp::Yuv444_8 | Csp::Yuv444_16 => src.data.clone(),
    };
    FrameInfo {
        csp: src.csp,
        width: src.width,
        height: src.height,
        pitch: src.pitch,
        data: Arc::new(data),
        picstruct: Picstruct::Frame,
        flags: FrameFlags::empty(),
        timestamp,
        duration,
    }
}

fn re_interleave_420(src: &SourceFrame) -> Vec<u8> {
    let h = src.height as usize;
    let pitch = src.pitch;
    let mut out = src.data.clone();
    let u_even = src.u_even_row_offset();
    let u_odd = src.u_odd_row_offset();
    let v_even = src.v_even_row_offset();
    let v_odd = src.v_odd_row_offset();
    for r in 0..h / 4 {
        let dst_u_even = (u_even + 2 * r) * pitch;
        let dst_u_odd = (u_even + 2 * r + 1) * pitch;
        out[dst_u_even..dst_u_even + pitch]
            .copy_from_slice(&src.data[(u_even + r) * pitch..(u_even + r + 1) * pitch]);
        out[dst_u_odd..dst_u_odd + pitch]
            .copy_from_slice(&src.data[(u_odd + r) * pitch..(u_odd + r + 1) * pitch]);
        let dst_v_even = (v_even + 2 * r) * pitch;
        let dst_v_odd = (v_even + 2 * r + 1) * pitch;
        out[dst_v_even..dst_v_even + pitch]
            .copy_from_slice(&src.data[(v_even + r) * pitch..(v_even + r + 1) * pitch]);
        out[dst_v_odd..dst_v_odd + pitch]
            .copy_from_slice(&src.data[(v_odd + r) * pitch..(v_odd + r + 1) * pitch]);
    }
    out
}

/// `synthesize(curr, prev, stripe, shift)` for the interlaced path. `shift` is the frame's
/// field-shift decision (from the classifier's `SHIFT0..3` bit for this output position):
/// when set, a field's source line is taken from `prev` instead of `curr`. Wherever the
/// stripe map marks deinterlace artifacts, the selected line is blended with the other
/// frame's line at the same row (the weave/smooth step) rather than taken verbatim.
pub fn synthesize(
    curr: &SourceFrame,
    prev: &SourceFrame,
    stripe: &StripeMap,
    tb_order: u8,
    shift: bool,
    timestamp: i64,
    duration: i64,
) -> FrameInfo {
    let w = curr.width as usize;
    let h = curr.height as usize;
    let pitch = curr.pitch;
    let mut luma = vec![0u8; h * pitch];

    for y in 0..h {
        let is_even_field = (y & 1) == tb_order as usize;
        let base_row = if shift && is_even_field { prev.row(y) } else { curr.row(y) };
        let other_row = if shift && is_even_field { curr.row(y) } else { prev.row(y) };
        let stripe_row = &stripe.bits[y * w..(y + 1) * w];
        let out_row = &mut luma[y * pitch..y * pitch + w];
        for x in 0..w {
            out_row[x] = if stripe_row[x] != 0 {
                ((base_row[x] as u16 + other_row[x] as u16) / 2) as u8
            } else {
                base_row[x]
            };
        }
    }

    // Chroma is carried from `curr` unblended: the stripe map only classifies luma, and
    // chroma sub-sampling (4:2:0) or full resolution (4:4:4) follows the same field cadence
    // as luma without needing its own weave decision.
    let data = match curr.csp {
        Csp::Yuv420_8 | Csp::Yuv420_16 => {
            let mut out = re_interleave_420(curr);
            out[..h * pitch].copy_from_slice(&luma[..h * pitch]);
            out
        }
        Csp::Yuv444_8 | Csp::Yuv444_16 => {
            let mut out = curr.data.clone();
            out[..h * pitch].copy_from_slice(&luma[..h * pitch]);
            out
        }
    };

    FrameInfo {
        csp: curr.csp,
        width: curr.width,
        height: curr.height,
        pitch: curr.pitch,
        data: Arc::new(data),
        picstruct: Picstruct::Frame,
        flags: FrameFlags::empty(),
        timestamp,
        duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::Csp;

    fn frame(height: usize, fill: u8) -> SourceFrame {
        let w = 4usize;
        let pitch = w;
        let data = vec![fill; pitch * height * 2];
        SourceFrame {
            frame_index: 0,
            csp: Csp::Yuv444_8,
            width: w as u32,
            height: height as u32,
            pitch,
            data,
            picstruct: Picstruct::TopFieldFirst,
            flags: FrameFlags::empty(),
            timestamp: 0,
            duration: 1,
        }
    }

    #[test]
    fn no_stripe_bits_passes_curr_through_unblended() {
        let curr = frame(4, 200);
        let prev = frame(4, 50);
        let stripe = StripeMap {
            status: crate::stripe_cache::StripeStatus::Merged,
            frame: 0,
            bits: vec![0u8; 4 * 4],
            width: 4,
            height: 4,
            count0: 0,
            count1: 0,
        };
        let out = synthesize(&curr, &prev, &stripe, 0, false, 0, 1);
        assert!(out.data.iter().all(|&b| b == 200));
    }
}

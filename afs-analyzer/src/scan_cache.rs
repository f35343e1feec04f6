//! Per-frame scan maps (field-difference + motion-map) and `analyze_stripe` (spec §4.2).

use crate::frame::SourceFrame;
use crate::motion_counters::count_motion;

/// The orchestrator calls `ScanCache.compute(iframe, ...)` then, once `iframe >= 5`, classifies
/// frame `iframe - 5`. Sub-step A's `assume_shift` window slides with each of the 4 SHIFT
/// positions (spec §4.5: `iframe+i-1 .. iframe+i+2` for `i in 0..4`), so the classifier as a
/// whole reads scan results for `(iframe-5)-1 .. (iframe-5)+5`, i.e. `iframe-6 .. iframe`. That
/// spans 7 distinct frame indices counting back from the one just computed, so the ring needs 7
/// slots, not the 5 a reading of "keeps 5 scan maps" alone would suggest.
pub const CAPACITY: usize = 7;

/// Bit 0x40 = motion, 0x10 = stripe marker for even-field rows, 0x20 = stripe marker for
/// odd-field rows, matching the NV12-layout byte map described in spec §3/§4.2.
pub const BIT_MOTION: u8 = 0x40;
pub const BIT_STRIPE_EVEN: u8 = 0x10;
pub const BIT_STRIPE_ODD: u8 = 0x20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub top: u32,
    pub bottom: u32,
    pub left: u32,
    pub right: u32,
}

impl Default for ClipRect {
    fn default() -> Self {
        Self { top: 0, bottom: 0, left: 0, right: 0 }
    }
}

/// The parameter signature a [`ScanMap`] is memoized against (spec §3 "Cache invariants").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParams {
    pub tb_order: u8,
    pub mode: u8,
    pub thre_shift: u16,
    pub thre_deint: u16,
    pub thre_ymotion: u16,
    pub thre_cmotion: u16,
    pub clip: ClipRect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    Empty,
    Valid,
}

#[derive(Debug, Clone)]
pub struct ScanMap {
    pub status: ScanStatus,
    pub frame: i64,
    pub params: ScanParams,
    /// Per-pixel classification bits, `width * height` bytes, luma-plane-sized.
    pub bits: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub ff_motion: i64,
    pub lf_motion: i64,
}

impl ScanMap {
    fn empty() -> Self {
        Self {
            status: ScanStatus::Empty,
            frame: -1,
            params: ScanParams {
                tb_order: 0,
                mode: 0,
                thre_shift: 0,
                thre_deint: 0,
                thre_ymotion: 0,
                thre_cmotion: 0,
                clip: ClipRect::default(),
            },
            bits: Vec::new(),
            width: 0,
            height: 0,
            ff_motion: 0,
            lf_motion: 0,
        }
    }

    /// Cache-hit predicate from spec §4.2: valid, same frame index, and the full parameter
    /// signature matches (mirrors `NVEncFilterAfs::scan_frame_result_cached`).
    fn is_hit(&self, frame: i64, params: &ScanParams) -> bool {
        self.status == ScanStatus::Valid && self.frame == frame && self.params == *params
    }
}

/// Ring of [`ScanMap`]s, memoized by parameter signature.
#[derive(Debug)]
pub struct ScanCache {
    slots: Vec<ScanMap>,
}

impl Default for ScanCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanCache {
    pub fn new() -> Self {
        Self {
            slots: (0..CAPACITY).map(|_| ScanMap::empty()).collect(),
        }
    }

    fn slot_index(frame: i64) -> usize {
        frame.rem_euclid(CAPACITY as i64) as usize
    }

    pub fn get(&self, frame: i64) -> &ScanMap {
        &self.slots[Self::slot_index(frame)]
    }

    /// Computes (or returns the cached) scan map for `frame`, analyzing `curr` against `prev`.
    /// On a cache miss, invalidates the two stripe maps that depend on this scan map (spec §3:
    /// "Writing ScanMap i invalidates StripeMap i-1 and StripeMap i").
    pub fn compute<'a>(
        &'a mut self,
        frame: i64,
        curr: &SourceFrame,
        prev: &SourceFrame,
        params: ScanParams,
        mut invalidate_stripe: impl FnMut(i64),
    ) -> &'a ScanMap {
        let idx = Self::slot_index(frame);
        if !self.slots[idx].is_hit(frame, &params) {
            self.slots[idx] = analyze_stripe(frame, curr, prev, &params);
            invalidate_stripe(frame - 1);
            invalidate_stripe(frame);
        }
        &self.slots[idx]
    }
}

/// `analyze_stripe(curr, prev, params) -> ScanMap` (spec §4.2): per luma pixel, compares
/// temporal motion (`|curr - prev|` vs `thre_ymotion`, chroma vs `thre_cmotion`) and vertical
/// stripe (`|row_n - row_{n+1}|` vs `thre_deint`), setting bits 0x40/0x10/0x20 accordingly.
pub fn analyze_stripe(
    frame: i64,
    curr: &SourceFrame,
    prev: &SourceFrame,
    params: &ScanParams,
) -> ScanMap {
    let w = curr.width as usize;
    let h = curr.height as usize;
    let pitch = curr.pitch;
    let mut bits = vec![0u8; w * h];

    for y in 0..h {
        let curr_row = &curr.data[y * pitch..y * pitch + w];
        let prev_row = &prev.data[y * pitch..y * pitch + w];
        let next_row_y = (y + 1).min(h - 1);
        let curr_next_row = &curr.data[next_row_y * pitch..next_row_y * pitch + w];

        for x in 0..w {
            let mut b = 0u8;
            let motion = (curr_row[x] as i32 - prev_row[x] as i32).unsigned_abs();
            if motion > params.thre_ymotion as u32 {
                b |= BIT_MOTION;
            }
            let stripe = (curr_row[x] as i32 - curr_next_row[x] as i32).unsigned_abs();
            if stripe > params.thre_deint as u32 {
                let is_even_field = (y & 1) == params.tb_order as usize;
                b |= if is_even_field { BIT_STRIPE_EVEN } else { BIT_STRIPE_ODD };
            }
            bits[y * w + x] = b;
        }
    }

    let (ff_motion, lf_motion) = count_motion(&bits, w, h, params.clip, params.tb_order);

    ScanMap {
        status: ScanStatus::Valid,
        frame,
        params: *params,
        bits,
        width: curr.width,
        height: curr.height,
        ff_motion,
        lf_motion,
    }
}


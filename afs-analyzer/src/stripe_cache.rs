//! Merged two-frame "stripe" maps, plus a scratch slot for the optional spatial filter pass
//! (spec §4.3).

use crate::motion_counters::count_stripe;
use crate::scan_cache::{ClipRect, ScanMap, BIT_STRIPE_EVEN, BIT_STRIPE_ODD};

pub const CAPACITY: usize = 5;
/// Index of the scratch slot used by [`StripeCache::filter`] — the "capacity 6th" slot spec
/// §4.3 describes, kept separate from the 5 regular merged slots so a filter pass never
/// clobbers a StripeMap another frame's classification still depends on.
const SCRATCH: usize = CAPACITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripeStatus {
    Empty,
    Merged,
    Filtered,
}

#[derive(Debug, Clone)]
pub struct StripeMap {
    pub status: StripeStatus,
    pub frame: i64,
    pub bits: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub count0: i64,
    pub count1: i64,
}

impl StripeMap {
    fn empty() -> Self {
        Self {
            status: StripeStatus::Empty,
            frame: -1,
            bits: Vec::new(),
            width: 0,
            height: 0,
            count0: 0,
            count1: 0,
        }
    }
}

#[derive(Debug)]
pub struct StripeCache {
    slots: Vec<StripeMap>,
}

impl Default for StripeCache {
    fn default() -> Self {
        Self::new()
    }
}

impl StripeCache {
    pub fn new() -> Self {
        Self {
            slots: (0..=CAPACITY).map(|_| StripeMap::empty()).collect(),
        }
    }

    fn slot_index(frame: i64) -> usize {
        frame.rem_euclid(CAPACITY as i64) as usize
    }

    pub fn get(&self, frame: i64) -> &StripeMap {
        &self.slots[Self::slot_index(frame)]
    }

    /// Invalidates the slot for `frame`, as required when the ScanMap it was merged from is
    /// recomputed (spec §3 cache invariant).
    pub fn invalidate(&mut self, frame: i64) {
        if frame < 0 {
            return;
        }
        let idx = Self::slot_index(frame);
        if self.slots[idx].frame == frame {
            self.slots[idx].status = StripeStatus::Empty;
        }
    }

    /// `merge_scan(scan[i], scan[i+1]) -> StripeMap` (spec §4.3): combines the two scan-map
    /// bytes per pixel into a single stripe byte used by the classifier.
    pub fn merge(&mut self, frame: i64, scan_i: &ScanMap, scan_i1: &ScanMap) -> &StripeMap {
        let idx = Self::slot_index(frame);
        if self.slots[idx].status == StripeStatus::Empty || self.slots[idx].frame != frame {
            let w = scan_i.width as usize;
            let h = scan_i.height as usize;
            let mut bits = vec![0u8; w * h];
            for i in 0..bits.len() {
                bits[i] = scan_i.bits[i] | scan_i1.bits.get(i).copied().unwrap_or(0);
            }
            let clip = scan_i.params.clip;
            let tb_order = scan_i.params.tb_order;
            let (count0, count1) = count_stripe(&bits, w, h, clip, tb_order);
            self.slots[idx] = StripeMap {
                status: StripeStatus::Merged,
                frame,
                bits,
                width: scan_i.width,
                height: scan_i.height,
                count0,
                count1,
            };
        }
        &self.slots[idx]
    }

    /// Spatial cleanup pass, run into the scratch slot when `analyze >= 2` (spec §4.3). The
    /// scratch slot's status goes `Merged -> Filtered`. `clip`/`tb_order` come from the
    /// classifier's `ScanParams` — a `StripeMap` itself carries no clip rectangle.
    pub fn filter(&mut self, frame: i64, analyze: u8, clip: ClipRect, tb_order: u8) -> &StripeMap {
        if analyze < 2 {
            return self.get(frame);
        }
        let source = self.slots[Self::slot_index(frame)].clone();
        let w = source.width as usize;
        let h = source.height as usize;
        let mut filtered = source.bits.clone();

        // A simple 3x3 majority cleanup: an isolated stripe bit with no stripe neighbor above
        // or below is treated as noise and cleared.
        for y in 1..h.saturating_sub(1) {
            for x in 0..w {
                let i = y * w + x;
                let has_stripe = filtered[i] & (BIT_STRIPE_EVEN | BIT_STRIPE_ODD) != 0;
                if !has_stripe {
                    continue;
                }
                let above = source.bits[(y - 1) * w + x] & (BIT_STRIPE_EVEN | BIT_STRIPE_ODD) != 0;
                let below = source.bits[(y + 1) * w + x] & (BIT_STRIPE_EVEN | BIT_STRIPE_ODD) != 0;
                if !above && !below {
                    filtered[i] &= !(BIT_STRIPE_EVEN | BIT_STRIPE_ODD);
                }
            }
        }

        let (count0, count1) = count_stripe(&filtered, w, h, clip, tb_order);
        self.slots[SCRATCH] = StripeMap {
            status: StripeStatus::Filtered,
            frame,
            bits: filtered,
            width: source.width,
            height: source.height,
            count0,
            count1,
        };
        &self.slots[SCRATCH]
    }
}


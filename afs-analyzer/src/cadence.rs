//! Status bitset and the five-frame-lookahead cadence classifier (spec §4.5).

use bitflags::bitflags;

use crate::scan_cache::ScanCache;
use crate::stripe_cache::StripeCache;

bitflags! {
    /// Per-frame status bitset. A plain integer with named bits rather than a sum type
    /// (SPEC_FULL.md §9 "Status bitset → tagged flags") — SHIFT0..3 and PROGRESSIVE, for
    /// instance, compose freely.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Status: u16 {
        const SHIFT0      = 0x0001;
        const SHIFT1      = 0x0002;
        const SHIFT2      = 0x0004;
        const SHIFT3      = 0x0008;
        const PROGRESSIVE = 0x0010;
        const RFF         = 0x0020;
        const RFF_COPY    = 0x0040;
        const RFF_TFF     = 0x0080;
        const RFF_BFF     = 0x0100;
        const FRAME_DROP  = 0x0200;
        const SMOOTHING   = 0x0400;
        const FORCE24     = 0x0800;
    }
}

impl Status {
    pub fn shift_n(self, n: u8) -> bool {
        match n {
            0 => self.contains(Status::SHIFT0),
            1 => self.contains(Status::SHIFT1),
            2 => self.contains(Status::SHIFT2),
            3 => self.contains(Status::SHIFT3),
            _ => false,
        }
    }
}

/// Tuning parameters the classifier needs, independent of the per-frame source flags (these
/// come from [`crate::AfsConfig`]).
#[derive(Debug, Clone, Copy)]
pub struct ClassifierParams {
    pub coeff_shift: u16,
    pub method_switch: u16,
    pub reverse: [bool; 4],
    pub frame_drop_enabled: bool,
    pub smoothing_enabled: bool,
    pub force24_enabled: bool,
}

/// Per-frame source-derived inputs that feed directly into status assembly.
#[derive(Debug, Clone, Copy)]
pub struct SourceFlags {
    pub progressive: bool,
    pub rff: bool,
}

fn max3(a: i64, b: i64, c: i64) -> i64 {
    a.max(b).max(c)
}

/// Sub-step A — assume-shift hypothesis for a single position (spec §4.5), grounded on
/// `NVEncFilterAfs::detect_telecine_cross`. `sp` are the four consecutive ScanMaps'
/// `(ff_motion, lf_motion)` pairs covering that position's own `iframe+i-1 .. iframe+i+2`
/// window — the window slides with the position, it is not shared across all four.
fn assume_shift(sp: [(i64, i64); 4], coeff_shift: i64) -> bool {
    let (sp1_ff, sp1_lf) = sp[0];
    let (sp2_ff, sp2_lf) = sp[1];
    let (sp3_ff, sp3_lf) = sp[2];
    let (sp4_ff, sp4_lf) = sp[3];

    let lhs = max3(
        (sp1_lf + sp2_lf - sp2_ff).abs(),
        (sp3_ff + sp4_ff - sp3_lf).abs(),
        0,
    ) * coeff_shift;

    let rule_a = {
        let rhs = max3(
            (sp1_ff + sp2_ff - sp1_lf).abs(),
            (sp2_ff + sp3_ff - sp2_lf).abs(),
            (sp3_lf + sp4_lf - sp4_ff).abs(),
        ) * 256;
        lhs > rhs && sp2_lf.max(sp3_ff) * coeff_shift > sp2_ff * 256
    };

    // Symmetric second rule (NVEncFilterAfs.cpp:907-913): same lhs as rule_a, only the rhs
    // middle term and the final guard's right-hand side change, checking sp3.lf instead of
    // sp2.ff (spec §4.5: "a symmetric second rule checking sp3.lf").
    let rule_b = {
        let rhs = max3(
            (sp1_ff + sp2_ff - sp1_lf).abs(),
            (sp2_lf + sp3_lf - sp3_ff).abs(),
            (sp3_lf + sp4_lf - sp4_ff).abs(),
        ) * 256;
        lhs > rhs && sp2_lf.max(sp3_ff) * coeff_shift > sp3_lf * 256
    };

    rule_a || rule_b
}

/// `analyze_frame(iframe) -> status[iframe]` (spec §4.5). Sub-step A's sliding window means this
/// needs scan results for `iframe-1 .. iframe+5` (not just `iframe-1 .. iframe+2`, the span a
/// single position's own window covers) and stripe results for `iframe .. iframe+3`, already
/// populated in `scan`/`stripe`.
pub fn analyze_frame(
    iframe: i64,
    scan: &ScanCache,
    stripe: &StripeCache,
    params: &ClassifierParams,
    source: SourceFlags,
) -> Status {
    // The clip rectangle is a property of the ScanMap parameter signature, not the StripeMap;
    // thread `scan.get(iframe)`'s clip into the sub-step B threshold below (spec §4.5 sub-step
    // B, NVEncFilterAfs.cpp:927-928).
    let clip = scan.get(iframe).params.clip;

    // Sub-step A: assume-shift is recomputed per position, its `iframe+i-1..iframe+i+2` window
    // sliding with `i` (spec §4.5, NVEncFilterAfs.cpp:919-920) — it is not shared across all
    // four positions.
    let assume: [bool; 4] = std::array::from_fn(|i| {
        let sp: [(i64, i64); 4] = std::array::from_fn(|j| {
            let s = scan.get(iframe + i as i64 + j as i64 - 1);
            (s.ff_motion, s.lf_motion)
        });
        assume_shift(sp, params.coeff_shift as i64)
    });

    // Sub-step B: threshold test over the 4 stripe positions iframe..iframe+3.
    let mut result_stat = [0u8; 4];
    for i in 0..4 {
        let st = stripe.get(iframe + i as i64);
        let shift_bit = if st.count0 * params.coeff_shift as i64 > st.count1 * 256 {
            1
        } else {
            0
        };
        let total = {
            let w = (st.width as i64 - clip.left as i64 - clip.right as i64).max(0);
            let h = (st.height as i64 - clip.top as i64 - clip.bottom as i64).max(0);
            let parity = h % 2;
            (h - parity) * w
        };
        let threshold = total * params.method_switch as i64 / 4096;
        let above_threshold = if threshold > st.count0 && threshold > st.count1 { 2 } else { 0 };
        result_stat[i] = shift_bit | above_threshold;
    }

    // Sub-step C: status assembly.
    let mut status = Status::empty();
    for i in 0..4u8 {
        let bit = if result_stat[i as usize] & 2 != 0 {
            assume[i as usize]
        } else {
            result_stat[i as usize] & 1 != 0
        };
        let bit = bit ^ params.reverse[i as usize];
        if bit {
            status |= match i {
                0 => Status::SHIFT0,
                1 => Status::SHIFT1,
                2 => Status::SHIFT2,
                _ => Status::SHIFT3,
            };
        }
    }

    if source.progressive {
        status |= Status::PROGRESSIVE;
        if source.rff {
            status |= Status::RFF;
        }
    }
    if params.frame_drop_enabled {
        status |= Status::FRAME_DROP;
    }
    if params.smoothing_enabled {
        status |= Status::SMOOTHING;
    }
    if params.force24_enabled {
        status |= Status::FORCE24;
    }

    if iframe < 1 {
        status &= Status::SHIFT0;
    }

    status
}

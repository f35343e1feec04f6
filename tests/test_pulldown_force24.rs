//! S2 (spec §8): a 3-2-pulldown-shaped interlaced stream under `force24=true`/`drop=true`.
//!
//! The classifier's SHIFT bits come out of real per-pixel motion/stripe analysis
//! (`afs_analyzer::cadence::analyze_frame`), not a status the caller can hand in directly — so
//! this test drives that analysis with a duplicate-pair pixel pattern (two held values across
//! five-frame groups) rather than asserting an exact drop count it cannot independently compute.
//! It checks the structural invariants spec §8 calls out instead: the run completes, pts stays
//! non-decreasing (invariant 3, the telescoping duration law), and a pulldown-shaped stream with
//! drop enabled emits strictly fewer frames than it was given (invariant 5).

mod common;

use std::sync::Arc;

use afs_analyzer::{Csp, FrameFlags, FrameInfo, Picstruct};
use encode_pipeline::mock::MockBackend;

use transcode_core::config::AfsPreset;

/// A held-value frame: all five members of a pulldown group share one of two pixel values,
/// mimicking a source frame duplicated across repeated fields, with a hard value change at each
/// group boundary to give the motion counters something to detect.
fn pulldown_frame(index: i64) -> FrameInfo {
    let group = index / 5;
    let fill = ((group % 2) * 255) as u8;
    let pitch = common::WIDTH as usize;
    FrameInfo {
        csp: Csp::Yuv444_8,
        width: common::WIDTH,
        height: common::HEIGHT,
        pitch,
        data: Arc::new(vec![fill; pitch * common::HEIGHT as usize]),
        picstruct: Picstruct::TopFieldFirst,
        flags: FrameFlags::empty(),
        timestamp: index * 1001,
        duration: 1001,
    }
}

#[test]
fn pulldown_cadence_emits_fewer_frames_with_non_decreasing_pts() {
    let frames: Vec<_> = (0..25).map(pulldown_frame).collect();
    let mut config = common::default_config();
    config.afs = transcode_core::config::AfsConfig::from_preset(AfsPreset::Force24Sd);
    config.validate().unwrap();

    let (orchestrator, sink) =
        common::build_orchestrator(frames, (1001, 30000), &config, MockBackend::new());
    orchestrator.run().unwrap();

    let sink = sink.lock().unwrap();
    assert!(sink.saw_eos());
    let pts = sink.pts_sequence();
    assert!(!pts.is_empty());
    assert!(pts.len() < 25, "force24+drop over a pulldown-shaped stream should drop some frames");
    assert!(pts.windows(2).all(|w| w[1] >= w[0]), "output pts must be non-decreasing");
}

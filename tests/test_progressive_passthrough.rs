//! S1 (spec §8): ten `PROGRESSIVE` frames at 1000-tick spacing, `shift=false`/`force24=false`.
//! With no motion and no RFF anywhere, `StreamStatus` never drops and the quarter-jitter term
//! stays zero throughout, so every emitted frame's reconstructed `out_pts` equals its admission
//! index times 1000 — the same sequence as the input timestamps.

mod common;

use encode_pipeline::mock::MockBackend;

#[test]
fn ten_progressive_frames_emit_unchanged_with_no_drops() {
    let frames: Vec<_> = (0..10).map(common::progressive_frame).collect();
    let mut config = common::default_config();
    config.afs.shift = false;
    config.afs.drop = false;
    config.afs.smooth = false;
    config.validate().unwrap();

    let (orchestrator, sink) =
        common::build_orchestrator(frames, common::TIMEBASE, &config, MockBackend::new());
    orchestrator.run().unwrap();

    let sink = sink.lock().unwrap();
    assert!(sink.saw_eos());
    assert_eq!(sink.pts_sequence(), (0..10).map(|i| i * 1000).collect::<Vec<i64>>());
}

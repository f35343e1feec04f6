//! S3 (spec §8): a short progressive run transitioning into interlaced material carrying an RFF
//! flag. `StreamStatus::set_status`'s `rff_smooth` term only engages around a
//! `PROGRESSIVE -> RFF` boundary (`afs_analyzer::stream_status`), so this exercises that
//! transition end to end through the orchestrator rather than asserting the exact smoothing
//! constant directly (already covered at the unit level in `afs_analyzer::stream_status::tests`).

mod common;

use encode_pipeline::mock::MockBackend;

#[test]
fn progressive_to_rff_transition_runs_cleanly_with_monotonic_output() {
    let mut frames: Vec<_> = (0..3).map(common::progressive_frame).collect();
    frames.push(common::frame(3 * 1001, 1001, afs_analyzer::Picstruct::TopFieldFirst, true));
    frames.extend((4..6).map(|i| {
        common::frame(i * 1001, 1001, afs_analyzer::Picstruct::TopFieldFirst, false)
    }));

    let config = common::default_config();
    let (orchestrator, sink) =
        common::build_orchestrator(frames, (1, 1000), &config, MockBackend::new());
    orchestrator.run().unwrap();

    let sink = sink.lock().unwrap();
    assert!(sink.saw_eos());
    let pts = sink.pts_sequence();
    assert!(!pts.is_empty());
    assert!(pts.len() <= 6);
    assert!(pts.windows(2).all(|w| w[1] >= w[0]), "output pts must be non-decreasing across the boundary");
}

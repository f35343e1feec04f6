//! S5 (spec §8): the backend reports [`EncodeOutcome::NeedMoreInput`] on every other submission.
//! That outcome is not an error (spec §4.8 step 3 / §7) — every frame must still be written once
//! the pipeline is flushed.

mod common;

use encode_pipeline::mock::MockBackend;

#[test]
fn need_more_input_outcomes_do_not_lose_or_error_on_frames() {
    let frames: Vec<_> = (0..10).map(common::progressive_frame).collect();
    let config = common::default_config();

    let mut backend = MockBackend::new();
    backend.need_more_input_on_odd = true;

    let (orchestrator, sink) = common::build_orchestrator(frames, common::TIMEBASE, &config, backend);
    orchestrator.run().unwrap();

    let sink = sink.lock().unwrap();
    assert!(sink.saw_eos());
    assert_eq!(sink.pts_sequence(), (0..10).map(|i| i * 1000).collect::<Vec<i64>>());
}

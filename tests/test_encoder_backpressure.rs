//! S4 (spec §8): more in-flight frames than the pipeline's ring can hold. With `RING_SIZE`
//! triples plus eight extra progressive frames, the pipeline must drain the oldest pending triple
//! (spec §4.8 step 1) rather than error or lose frames, and every bitstream must still land in
//! submission order.

mod common;

use encode_pipeline::mock::MockBackend;
use encode_pipeline::RING_SIZE;

#[test]
fn more_frames_than_the_ring_holds_still_all_arrive_in_order() {
    let total = RING_SIZE + 8;
    let frames: Vec<_> = (0..total as i64).map(common::progressive_frame).collect();
    let config = common::default_config();

    let (orchestrator, sink) =
        common::build_orchestrator(frames, common::TIMEBASE, &config, MockBackend::new());
    orchestrator.run().unwrap();

    let sink = sink.lock().unwrap();
    assert!(sink.saw_eos());
    let expected: Vec<i64> = (0..total as i64).map(|i| i * 1000).collect();
    assert_eq!(sink.pts_sequence(), expected, "submission order must equal bitstream write order");
}

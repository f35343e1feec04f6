//! S6 (spec §8): the backend never signals its EOS completion event. `EncodePipeline::flush`
//! bounds that wait to [`FLUSH_TIMEOUT`] (500ms) and must surface a `Timeout` error rather than
//! hang, with no frames lost before that point.

mod common;

use std::time::Instant;

use encode_pipeline::mock::MockBackend;
use transcode_core::error::TranscodeError;

#[test]
fn flush_times_out_cleanly_when_eos_never_signals() {
    let frames: Vec<_> = (0..3).map(common::progressive_frame).collect();
    let config = common::default_config();

    let mut backend = MockBackend::new();
    backend.eos_never_signals = true;

    let (orchestrator, _sink) = common::build_orchestrator(frames, common::TIMEBASE, &config, backend);

    let start = Instant::now();
    let err = orchestrator.run().unwrap_err();
    assert!(start.elapsed() >= std::time::Duration::from_millis(450));
    assert!(matches!(err, TranscodeError::Timeout(_)));
}

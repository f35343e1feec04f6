//! Shared fixtures for the scenario integration tests (spec §8 S1-S6), following the teacher's
//! `tests/common/mod.rs` convention of one fixture module reused across scenario files.

use std::sync::{Arc, Mutex};

use afs_analyzer::{Csp, FrameFlags, FrameInfo, Picstruct};
use encode_pipeline::mock::{MockBackend, MockFrameSource, MockSink};
use encode_pipeline::{BitstreamSink, EncodePipeline};

use transcode_core::config::{AfsConfig, AfsPreset, EncoderConfig, TranscodeConfig};
use transcode_core::Orchestrator;

pub const WIDTH: u32 = 8;
pub const HEIGHT: u32 = 8;
pub const TIMEBASE: (i64, i64) = (1, 1000);

/// A progressive frame at `pitch == width`, timestamp `index * 1000`.
pub fn progressive_frame(index: i64) -> FrameInfo {
    frame(index * 1000, 1000, Picstruct::Frame, false)
}

/// An interlaced frame at 30000/1001 timing, with no RFF flag.
pub fn interlaced_frame(index: i64) -> FrameInfo {
    frame(index * 1001, 1001, Picstruct::TopFieldFirst, false)
}

pub fn frame(timestamp: i64, duration: i64, picstruct: Picstruct, rff: bool) -> FrameInfo {
    let pitch = WIDTH as usize;
    FrameInfo {
        csp: Csp::Yuv444_8,
        width: WIDTH,
        height: HEIGHT,
        pitch,
        data: Arc::new(vec![0u8; pitch * HEIGHT as usize]),
        picstruct,
        flags: if rff { FrameFlags::RFF } else { FrameFlags::empty() },
        timestamp,
        duration,
    }
}

pub fn default_config() -> TranscodeConfig {
    let mut config = TranscodeConfig {
        output: "test-out.bin".into(),
        afs: AfsConfig::from_preset(AfsPreset::Default),
        encoder: EncoderConfig { width: WIDTH as i64, height: HEIGHT as i64, ..EncoderConfig::default() },
        timecode_path: None,
        log_path: None,
    };
    config.validate().expect("default config must validate");
    config
}

/// A `BitstreamSink` that shares its [`MockSink`] with the caller so results are inspectable
/// after `Orchestrator::run` has consumed the boxed sink.
pub struct SharedSink(pub Arc<Mutex<MockSink>>);

impl BitstreamSink for SharedSink {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.0.lock().unwrap().write(bytes)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap().flush()
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.0.lock().unwrap().close()
    }
}

/// Builds an `Orchestrator` over canned `frames`, a fresh `MockBackend`, and a `MockSink`
/// reachable through the returned handle.
pub fn build_orchestrator(
    frames: Vec<FrameInfo>,
    timebase: (i64, i64),
    config: &TranscodeConfig,
    backend: MockBackend,
) -> (Orchestrator<MockFrameSource, MockBackend>, Arc<Mutex<MockSink>>) {
    let source = MockFrameSource::new(frames, timebase);
    let pipeline = EncodePipeline::allocate_io_buffers(backend, WIDTH, HEIGHT, 4096).unwrap();
    let sink = Arc::new(Mutex::new(MockSink::default()));
    let boxed: Box<dyn BitstreamSink> = Box::new(SharedSink(sink.clone()));
    let orchestrator = Orchestrator::new(source, pipeline, boxed, config).unwrap();
    (orchestrator, sink)
}

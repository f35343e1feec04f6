//! Demonstrates the transcode pipeline end-to-end against synthetic sources: one progressive
//! passthrough run and one mixed-cadence run with a pull-down-style RFF pattern, both driven
//! entirely through `encode-pipeline`'s mocks rather than a real vendor SDK. Analogous to the
//! teacher's own standalone `examples/` binaries that exercise the library against a synthetic
//! capture source.

use std::sync::{Arc, Mutex};

use anyhow::Result;

use afs_analyzer::{Csp, FrameFlags, FrameInfo, Picstruct};
use encode_pipeline::mock::{MockBackend, MockFrameSource, MockSink};
use encode_pipeline::{BitstreamSink, EncodePipeline};

use transcode_core::config::{AfsConfig, AfsPreset, EncoderConfig, TranscodeConfig};
use transcode_core::Orchestrator;

const WIDTH: u32 = 8;
const HEIGHT: u32 = 8;
const TIMEBASE: (i64, i64) = (1001, 30000);

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    run_progressive_passthrough()?;
    run_pulldown_cadence()?;
    Ok(())
}

fn make_frame(index: i64, picstruct: Picstruct, rff: bool) -> FrameInfo {
    let pitch = WIDTH as usize;
    let fill = (index % 256) as u8;
    FrameInfo {
        csp: Csp::Yuv444_8,
        width: WIDTH,
        height: HEIGHT,
        pitch,
        data: Arc::new(vec![fill; pitch * HEIGHT as usize]),
        picstruct,
        flags: if rff { FrameFlags::RFF } else { FrameFlags::empty() },
        timestamp: index * TIMEBASE.0,
        duration: TIMEBASE.0,
    }
}

/// A thin `BitstreamSink` that shares a [`MockSink`] with the caller so results can be
/// inspected after [`Orchestrator::run`] consumes the sink.
struct SharedSink(Arc<Mutex<MockSink>>);

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

fn build_config() -> Result<TranscodeConfig> {
    let mut config = TranscodeConfig {
        output: "demo.bin".into(),
        afs: AfsConfig::from_preset(AfsPreset::Default),
        encoder: EncoderConfig { width: WIDTH as i64, height: HEIGHT as i64, ..EncoderConfig::default() },
        timecode_path: None,
        log_path: None,
    };
    config.validate()?;
    Ok(config)
}

fn run_progressive_passthrough() -> Result<()> {
    tracing::info!("demo: progressive passthrough");
    let frames: Vec<FrameInfo> =
        (0..12).map(|i| make_frame(i, Picstruct::Frame, false)).collect();
    let source = MockFrameSource::new(frames, TIMEBASE);

    let backend = MockBackend::new();
    let pipeline = EncodePipeline::allocate_io_buffers(backend, WIDTH, HEIGHT, 4096)?;
    let sink = Arc::new(Mutex::new(MockSink::default()));
    let boxed_sink: Box<dyn BitstreamSink> = Box::new(SharedSink(sink.clone()));

    let config = build_config()?;
    let orchestrator = Orchestrator::new(source, pipeline, boxed_sink, &config)?;
    orchestrator.run()?;

    let sink = sink.lock().unwrap();
    tracing::info!(
        bitstreams = sink.writes,
        pts_sequence = ?sink.pts_sequence(),
        saw_eos = sink.saw_eos(),
        "demo: progressive passthrough finished"
    );
    Ok(())
}

fn run_pulldown_cadence() -> Result<()> {
    tracing::info!("demo: mixed interlaced / pull-down cadence");
    let mut frames = Vec::new();
    for i in 0..20i64 {
        // Every fifth frame carries an RFF repeat flag, the hallmark of 3-2 pulldown source
        // material re-timed to a progressive frame rate.
        let rff = i % 5 == 4;
        frames.push(make_frame(i, Picstruct::TopFieldFirst, rff));
    }
    let source = MockFrameSource::new(frames, TIMEBASE);

    let backend = MockBackend::new();
    let pipeline = EncodePipeline::allocate_io_buffers(backend, WIDTH, HEIGHT, 4096)?;
    let sink = Arc::new(Mutex::new(MockSink::default()));
    let boxed_sink: Box<dyn BitstreamSink> = Box::new(SharedSink(sink.clone()));

    let mut config = build_config()?;
    config.afs = AfsConfig::from_preset(AfsPreset::Force24Sd);
    config.validate()?;
    let orchestrator = Orchestrator::new(source, pipeline, boxed_sink, &config)?;
    orchestrator.run()?;

    let sink = sink.lock().unwrap();
    tracing::info!(
        bitstreams = sink.writes,
        saw_eos = sink.saw_eos(),
        "demo: pull-down cadence finished"
    );
    Ok(())
}

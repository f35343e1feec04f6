use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;

use afs_analyzer::Csp;
use encode_pipeline::mock::MockBackend;
use encode_pipeline::EncodePipeline;

use transcode_core::config::{AfsConfig, AfsPreset, Codec, EncoderConfig, TbOrder, TranscodeConfig};
use transcode_core::file_sink::FileBitstreamSink;
use transcode_core::raw_source::RawYuvSource;
use transcode_core::Orchestrator;

/// Hardware-accelerated inverse-telecine transcoder: reads a raw planar-YUV source, classifies
/// its cadence, and re-synthesizes progressive output through an encoder pipeline.
#[derive(Parser, Debug)]
#[command(name = "transcode")]
#[command(about = "Transcode a raw YUV source with Auto Field Shift cadence correction")]
struct Args {
    /// Input raw planar-YUV file (fixed-size, fixed-pitch frames; no container demuxing)
    input: PathBuf,

    /// Output bitstream path
    #[arg(short, long, default_value = "out.bin")]
    output: PathBuf,

    #[arg(long, default_value_t = 1920)]
    width: u32,

    #[arg(long, default_value_t = 1080)]
    height: u32,

    /// Input frame rate, used to derive the per-frame duration in the input timebase
    #[arg(long, default_value_t = 24)]
    fps: u32,

    /// AFS tuning preset: default, triple, double, anime, min-afterimage, force24-sd,
    /// force24-hd, force30
    #[arg(long, default_value = "default")]
    afs_preset: String,

    /// Target codec: h264, hevc
    #[arg(long, default_value = "h264")]
    codec: String,

    /// Field order of interlaced input: tff, bff
    #[arg(long, default_value = "tff")]
    tb_order: String,

    /// Encode as 4:4:4 instead of 4:2:0
    #[arg(long)]
    yuv444: bool,

    /// Write a v2 timecode file alongside the output
    #[arg(long)]
    timecode: Option<PathBuf>,

    /// Write an AFS CSV log alongside the output
    #[arg(long)]
    afs_log: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let afs_preset = parse_afs_preset(&args.afs_preset)?;
    let codec = parse_codec(&args.codec)?;
    let tb_order = parse_tb_order(&args.tb_order)?;

    let mut afs = AfsConfig::from_preset(afs_preset);
    afs.tb_order = tb_order;
    afs.timecode = args.timecode.is_some();
    afs.log = args.afs_log.is_some();

    let encoder = EncoderConfig {
        codec,
        width: args.width as i64,
        height: args.height as i64,
        yuv444: args.yuv444,
        ..EncoderConfig::default()
    };

    let mut config = TranscodeConfig {
        output: args.output.clone(),
        afs,
        encoder,
        timecode_path: args.timecode.clone(),
        log_path: args.afs_log.clone(),
    };
    config.validate().map_err(|e| anyhow!("invalid configuration: {e}"))?;

    let csp = if args.yuv444 { Csp::Yuv444_8 } else { Csp::Yuv420_8 };
    let timebase = (1, args.fps as i64 * 1000);
    let frame_duration = 1000;
    let source = RawYuvSource::open(&args.input, csp, args.width, args.height, timebase, frame_duration)?;

    let backend = MockBackend::new();
    let bitstream_size = args.width as usize * args.height as usize;
    let pipeline = EncodePipeline::allocate_io_buffers(backend, args.width, args.height, bitstream_size)?;

    let sink = Box::new(FileBitstreamSink::create(&config.output)?);

    tracing::info!(input = %args.input.display(), output = %config.output.display(), "starting transcode");
    let orchestrator = Orchestrator::new(source, pipeline, sink, &config)?;
    orchestrator.run()?;
    tracing::info!("transcode complete");

    Ok(())
}

fn parse_afs_preset(preset: &str) -> Result<AfsPreset> {
    match preset.to_lowercase().as_str() {
        "default" => Ok(AfsPreset::Default),
        "triple" => Ok(AfsPreset::Triple),
        "double" => Ok(AfsPreset::Double),
        "anime" => Ok(AfsPreset::Anime),
        "min-afterimage" => Ok(AfsPreset::MinAfterimage),
        "force24-sd" => Ok(AfsPreset::Force24Sd),
        "force24-hd" => Ok(AfsPreset::Force24Hd),
        "force30" => Ok(AfsPreset::Force30),
        other => Err(anyhow!(
            "invalid AFS preset: {other}. Use: default, triple, double, anime, min-afterimage, force24-sd, force24-hd, force30"
        )),
    }
}

fn parse_codec(codec: &str) -> Result<Codec> {
    match codec.to_lowercase().as_str() {
        "h264" => Ok(Codec::H264),
        "hevc" => Ok(Codec::Hevc),
        other => Err(anyhow!("invalid codec: {other}. Use: h264, hevc")),
    }
}

fn parse_tb_order(order: &str) -> Result<TbOrder> {
    match order.to_lowercase().as_str() {
        "tff" => Ok(TbOrder::Tff),
        "bff" => Ok(TbOrder::Bff),
        other => Err(anyhow!("invalid field order: {other}. Use: tff, bff")),
    }
}

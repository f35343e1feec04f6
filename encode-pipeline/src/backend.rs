//! The external interfaces the encode pipeline consumes (spec §6): `FrameSource`,
//! `CodecBackend`, `BitstreamSink`. These mirror the vendor encoder/decoder SDK at concept
//! level; a real deployment backs them with NVENC/NVDEC, a production pipeline backs
//! `FrameSource` with a demuxer+decoder, and tests back all three with the in-memory mocks in
//! [`crate::mock`].

use afs_analyzer::{FrameInfo, Picstruct};
use std::fmt;

/// A source of pitched-device frames, per spec §6 "FrameSource".
pub trait FrameSource: Send {
    /// Reads the next frame, or `None` at EOF.
    fn read(&mut self) -> Result<Option<FrameInfo>, SourceError>;

    /// For GPU-decoded sources only: the next compressed bitstream packet and its PTS.
    fn next_bitstream(&mut self) -> Result<Option<(Vec<u8>, i64)>, SourceError> {
        Ok(None)
    }

    /// Input timebase, as `(numerator, denominator)`.
    fn video_codec_context(&self) -> (i64, i64) {
        (1, 1000)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceError(pub String);

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "frame source error: {}", self.0)
    }
}

impl std::error::Error for SourceError {}

/// Outcome of [`CodecBackend::encode_picture`]. `NeedMoreInput` is not an error (spec §4.8,
/// §7): the backend consumed the submission but has not produced a bitstream for it yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeOutcome {
    Success,
    NeedMoreInput,
}

/// Parameters accompanying an `encode_picture` submission.
#[derive(Debug, Clone, Copy)]
pub struct PictureParams {
    pub pts: i64,
    pub duration: i64,
    pub picstruct: Picstruct,
    pub eos: bool,
}

/// Mirrors the vendor SDK at concept level (spec §6 "CodecBackend"). Associated types keep
/// the handles opaque to the pipeline — it never inspects them, only passes them back to the
/// backend that issued them.
pub trait CodecBackend {
    type Surface;
    type Bitstream;
    type Event: Clone;
    type Registered;

    fn create_input_buffer(&mut self, width: u32, height: u32) -> Result<Self::Surface, i32>;
    fn create_bitstream_buffer(&mut self, size: usize) -> Result<Self::Bitstream, i32>;
    fn register_async_event(&mut self) -> Result<Self::Event, i32>;
    fn register_resource(
        &mut self,
        ptr: usize,
        width: u32,
        height: u32,
        pitch: usize,
    ) -> Result<Self::Registered, i32>;
    fn map_input_resource(&mut self, registered: &Self::Registered) -> Result<Self::Surface, i32>;

    /// Copies a host-synthesized frame into `surface`.
    fn upload(&mut self, surface: &Self::Surface, frame: &FrameInfo) -> Result<(), i32>;

    fn encode_picture(
        &mut self,
        surface: &Self::Surface,
        bitstream: &Self::Bitstream,
        event: &Self::Event,
        params: PictureParams,
    ) -> Result<EncodeOutcome, i32>;

    /// Blocks until `event` fires, or `timeout` elapses (`None` = wait forever).
    fn wait_event(&mut self, event: &Self::Event, timeout: Option<std::time::Duration>) -> bool;

    fn lock_bitstream(&mut self, bitstream: &Self::Bitstream) -> Result<Vec<u8>, i32>;
    fn unlock_bitstream(&mut self, bitstream: &Self::Bitstream) -> Result<(), i32>;

    fn destroy_input_buffer(&mut self, surface: Self::Surface);
    fn destroy_bitstream_buffer(&mut self, bitstream: Self::Bitstream);
    fn destroy_event(&mut self, event: Self::Event);
    fn destroy_registered_resource(&mut self, registered: Self::Registered);
}

/// Append-only byte stream (spec §6 "BitstreamSink"): one buffered writer, flushed and closed
/// at EOS.
pub trait BitstreamSink: Send {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()>;
    fn flush(&mut self) -> std::io::Result<()>;
    fn close(&mut self) -> std::io::Result<()> {
        self.flush()
    }
}

//! In-memory mocks for [`crate::backend::CodecBackend`], [`crate::backend::FrameSource`], and
//! [`crate::backend::BitstreamSink`], used by this crate's own tests and by the root crate's
//! scenario tests (S1-S6, spec §8). Grounded on SPEC_FULL.md §9's "Vendor C-API handles ->
//! owned wrappers with explicit destroy" note: the `CodecBackend` trait is mockable, and this
//! is the software implementation that "records submissions and delivers canned bitstreams".

use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::Duration;

use afs_analyzer::FrameInfo;

use crate::backend::{BitstreamSink, CodecBackend, EncodeOutcome, FrameSource, PictureParams, SourceError};

const EOS_MARKER: &[u8] = b"EOS";

/// A software `CodecBackend`: surfaces/bitstreams/events are plain integer handles, uploads
/// are recorded rather than copied to a device, and every event "fires" immediately unless the
/// test explicitly configures it not to.
pub struct MockBackend {
    next_handle: u64,
    /// Per-bitstream-handle payload to hand back from `lock_bitstream`.
    payloads: HashMap<u64, Vec<u8>>,
    submissions: u64,
    /// When set, `encode_picture` returns `NeedMoreInput` on every odd submission (spec §8 S5).
    pub need_more_input_on_odd: bool,
    /// When set, the EOS event's `wait_event` always reports not-ready (spec §8 S6).
    pub eos_never_signals: bool,
    destroyed: u64,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            next_handle: 0,
            payloads: HashMap::new(),
            submissions: 0,
            need_more_input_on_odd: false,
            eos_never_signals: false,
            destroyed: 0,
        }
    }

    fn handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }

    pub fn destroyed_count(&self) -> u64 {
        self.destroyed
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl CodecBackend for MockBackend {
    type Surface = u64;
    type Bitstream = u64;
    type Event = u64;
    type Registered = u64;

    fn create_input_buffer(&mut self, _width: u32, _height: u32) -> Result<Self::Surface, i32> {
        Ok(self.handle())
    }

    fn create_bitstream_buffer(&mut self, _size: usize) -> Result<Self::Bitstream, i32> {
        Ok(self.handle())
    }

    fn register_async_event(&mut self) -> Result<Self::Event, i32> {
        Ok(self.handle())
    }

    fn register_resource(
        &mut self,
        _ptr: usize,
        _width: u32,
        _height: u32,
        _pitch: usize,
    ) -> Result<Self::Registered, i32> {
        Ok(self.handle())
    }

    fn map_input_resource(&mut self, registered: &Self::Registered) -> Result<Self::Surface, i32> {
        Ok(*registered)
    }

    fn upload(&mut self, _surface: &Self::Surface, _frame: &FrameInfo) -> Result<(), i32> {
        Ok(())
    }

    fn encode_picture(
        &mut self,
        _surface: &Self::Surface,
        bitstream: &Self::Bitstream,
        event: &Self::Event,
        params: PictureParams,
    ) -> Result<EncodeOutcome, i32> {
        self.submissions += 1;
        let payload = if params.eos {
            EOS_MARKER.to_vec()
        } else {
            params.pts.to_le_bytes().to_vec()
        };
        self.payloads.insert(*bitstream, payload);
        let _ = event;
        if !params.eos && self.need_more_input_on_odd && self.submissions % 2 == 1 {
            Ok(EncodeOutcome::NeedMoreInput)
        } else {
            Ok(EncodeOutcome::Success)
        }
    }

    fn wait_event(&mut self, _event: &Self::Event, timeout: Option<Duration>) -> bool {
        // Only the EOS wait ever passes `Some(timeout)` in this pipeline; a real backend would
        // distinguish readiness by handle identity, but the mock only needs to fail exactly the
        // flush-time EOS wait for scenario S6. Every infinite (`None`) wait succeeds immediately
        // since the mock has no device latency to simulate.
        !(self.eos_never_signals && timeout.is_some())
    }

    fn lock_bitstream(&mut self, bitstream: &Self::Bitstream) -> Result<Vec<u8>, i32> {
        Ok(self.payloads.remove(bitstream).unwrap_or_default())
    }

    fn unlock_bitstream(&mut self, _bitstream: &Self::Bitstream) -> Result<(), i32> {
        Ok(())
    }

    fn destroy_input_buffer(&mut self, _surface: Self::Surface) {
        self.destroyed += 1;
    }

    fn destroy_bitstream_buffer(&mut self, _bitstream: Self::Bitstream) {
        self.destroyed += 1;
    }

    fn destroy_event(&mut self, _event: Self::Event) {
        self.destroyed += 1;
    }

    fn destroy_registered_resource(&mut self, _registered: Self::Registered) {
        self.destroyed += 1;
    }
}

/// An in-memory [`BitstreamSink`] that records every write, in order.
#[derive(Default)]
pub struct MockSink {
    pub chunks: Vec<Vec<u8>>,
    pub writes: usize,
    pub flushed: bool,
    pub closed: bool,
}

impl MockSink {
    /// Decodes every non-EOS chunk back into the `pts` it was tagged with, in write order.
    pub fn pts_sequence(&self) -> Vec<i64> {
        self.chunks
            .iter()
            .filter(|c| c.as_slice() != EOS_MARKER)
            .map(|c| i64::from_le_bytes(c.as_slice().try_into().unwrap()))
            .collect()
    }

    pub fn saw_eos(&self) -> bool {
        self.chunks.iter().any(|c| c.as_slice() == EOS_MARKER)
    }
}

impl BitstreamSink for MockSink {
    fn write(&mut self, bytes: &[u8]) -> std::io::Result<()> {
        self.chunks.push(bytes.to_vec());
        self.writes += 1;
        Ok(())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flushed = true;
        Ok(())
    }

    fn close(&mut self) -> std::io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A canned [`FrameSource`] that hands back a pre-built queue of frames, then reports EOF. Used
/// to drive scenario tests (S1-S6, spec §8) against synthetic cadences without a real file.
pub struct MockFrameSource {
    frames: VecDeque<FrameInfo>,
    timebase: (i64, i64),
}

impl MockFrameSource {
    pub fn new(frames: Vec<FrameInfo>, timebase: (i64, i64)) -> Self {
        Self { frames: frames.into(), timebase }
    }
}

impl FrameSource for MockFrameSource {
    fn read(&mut self) -> Result<Option<FrameInfo>, SourceError> {
        Ok(self.frames.pop_front())
    }

    fn video_codec_context(&self) -> (i64, i64) {
        self.timebase
    }
}

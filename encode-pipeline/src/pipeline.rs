//! Owns the ring of (input-surface, output-bitstream, completion-event) triples and drives
//! submit/wait/writeback (spec §4.8). Grounded on the teacher's `cap-rtsp` back-pressure
//! framing (a bounded queue the caller blocks against rather than drops into) restyled from
//! GStreamer's appsrc queue to the vendor SDK's completion-event wait described in
//! `original_source/NVEncCore/NVEncCore.cpp` `ProcessOutput`/`FlushEncoder`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use afs_analyzer::{FrameInfo, TranscodeError};

use crate::backend::{BitstreamSink, CodecBackend, EncodeOutcome, PictureParams};

/// Number of in-flight buffer triples (spec §4.8: "Owns N=32 buffer triples").
pub const RING_SIZE: usize = 32;

/// Flush drains pending triples, then waits on the EOS event for at most this long (spec §5
/// "Timeouts").
pub const FLUSH_TIMEOUT: Duration = Duration::from_millis(500);

struct Triple<B: CodecBackend> {
    surface: B::Surface,
    bitstream: B::Bitstream,
    event: B::Event,
    /// Whether `wait_event` must be called before this triple's bitstream may be locked. Cleared
    /// once a submission has actually been issued against the triple.
    wait_flag: bool,
}

/// Drives a [`CodecBackend`] through its async ring of input/output buffers (spec §4.8).
pub struct EncodePipeline<B: CodecBackend> {
    backend: B,
    triples: Vec<Triple<B>>,
    available: VecDeque<usize>,
    pending: VecDeque<usize>,
    eos_triple: Triple<B>,
    submitted: u64,
    written: u64,
}

impl<B: CodecBackend> EncodePipeline<B> {
    /// `allocate_io_buffers` (spec §3 "Lifecycle"): creates the 32 buffer triples plus one EOS
    /// triple, each with its own registered completion event.
    pub fn allocate_io_buffers(
        mut backend: B,
        width: u32,
        height: u32,
        bitstream_size: usize,
    ) -> Result<Self, TranscodeError> {
        let mut triples = Vec::with_capacity(RING_SIZE);
        for _ in 0..RING_SIZE {
            triples.push(new_triple(&mut backend, width, height, bitstream_size)?);
        }
        let eos_triple = new_triple(&mut backend, width, height, bitstream_size)?;
        let available = (0..RING_SIZE).collect();
        Ok(Self {
            backend,
            triples,
            available,
            pending: VecDeque::new(),
            eos_triple,
            submitted: 0,
            written: 0,
        })
    }

    pub fn submitted(&self) -> u64 {
        self.submitted
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// One cycle of spec §4.8 step 1-3: acquire a triple (blocking on the oldest pending one's
    /// completion if the ring is full — the backpressure point), upload the frame, submit.
    pub fn submit(
        &mut self,
        frame: &FrameInfo,
        sink: &mut dyn BitstreamSink,
    ) -> Result<(), TranscodeError> {
        let idx = self.acquire_triple(sink)?;
        {
            let t = &mut self.triples[idx];
            self.backend
                .upload(&t.surface, frame)
                .map_err(TranscodeError::EncoderError)?;
        }
        let params = PictureParams {
            pts: frame.timestamp,
            duration: frame.duration,
            picstruct: frame.picstruct,
            eos: false,
        };
        let outcome = {
            let t = &self.triples[idx];
            self.backend
                .encode_picture(&t.surface, &t.bitstream, &t.event, params)
                .map_err(TranscodeError::EncoderError)?
        };
        // NeedMoreInput is not an error (spec §4.8 step 3 / §7): the triple is still pending
        // either way, its bitstream just isn't ready yet.
        let _ = matches!(outcome, EncodeOutcome::NeedMoreInput);
        self.triples[idx].wait_flag = true;
        self.pending.push_back(idx);
        self.submitted += 1;
        Ok(())
    }

    /// Pops an available triple, or — if the ring is full — drains the oldest pending triple
    /// through the wait/lock/write/unlock cycle to free one up. This is the backpressure point
    /// described in spec §4.8 step 1.
    fn acquire_triple(&mut self, sink: &mut dyn BitstreamSink) -> Result<usize, TranscodeError> {
        if let Some(idx) = self.available.pop_front() {
            return Ok(idx);
        }
        tracing::debug!(pending = self.pending.len(), "pipeline: ring full, draining oldest triple");
        let idx = self
            .pending
            .pop_front()
            .expect("ring exhausted with no available and no pending triple");
        self.drain_triple(idx, None, sink)?;
        Ok(idx)
    }

    /// Waits on `idx`'s event (if needed), locks its bitstream, writes it to `sink`, unlocks,
    /// and returns the triple to `available`. `timeout` bounds the wait; `None` waits forever
    /// (the backpressure path), `Some(d)` is used only by [`Self::flush`].
    fn drain_triple(
        &mut self,
        idx: usize,
        timeout: Option<Duration>,
        sink: &mut dyn BitstreamSink,
    ) -> Result<(), TranscodeError> {
        let ready = if self.triples[idx].wait_flag {
            self.backend.wait_event(&self.triples[idx].event, timeout)
        } else {
            true
        };
        if !ready {
            return Err(TranscodeError::Timeout(format!(
                "triple {idx} did not signal completion within {:?}",
                timeout.unwrap_or_default()
            )));
        }
        let bytes = self
            .backend
            .lock_bitstream(&self.triples[idx].bitstream)
            .map_err(TranscodeError::EncoderError)?;
        sink.write(&bytes).map_err(|e| TranscodeError::IoError(e.to_string()))?;
        self.backend
            .unlock_bitstream(&self.triples[idx].bitstream)
            .map_err(TranscodeError::EncoderError)?;
        self.triples[idx].wait_flag = false;
        self.written += 1;
        self.available.push_back(idx);
        Ok(())
    }

    /// Submit EOS, drain all pending triples, then wait on the EOS event for at most
    /// [`FLUSH_TIMEOUT`] (spec §4.8 "Flush").
    pub fn flush(&mut self, sink: &mut dyn BitstreamSink) -> Result<(), TranscodeError> {
        let eos_params = PictureParams {
            pts: 0,
            duration: 0,
            picstruct: afs_analyzer::Picstruct::Frame,
            eos: true,
        };
        self.backend
            .encode_picture(
                &self.eos_triple.surface,
                &self.eos_triple.bitstream,
                &self.eos_triple.event,
                eos_params,
            )
            .map_err(TranscodeError::EncoderError)?;

        while let Some(idx) = self.pending.pop_front() {
            self.drain_triple(idx, None, sink)?;
        }

        let deadline = Instant::now() + FLUSH_TIMEOUT;
        let remaining = deadline.saturating_duration_since(Instant::now());
        if !self.backend.wait_event(&self.eos_triple.event, Some(remaining)) {
            return Err(TranscodeError::Timeout(
                "flush: EOS event did not signal within 500ms".into(),
            ));
        }
        sink.flush().map_err(|e| TranscodeError::IoError(e.to_string()))?;
        Ok(())
    }

    /// `release_io_buffers` (spec §3 "Lifecycle"): destroys every triple's backend resources.
    pub fn release_io_buffers(mut self) {
        for t in self.triples.drain(..) {
            self.backend.destroy_input_buffer(t.surface);
            self.backend.destroy_bitstream_buffer(t.bitstream);
            self.backend.destroy_event(t.event);
        }
        self.backend.destroy_input_buffer(self.eos_triple.surface);
        self.backend.destroy_bitstream_buffer(self.eos_triple.bitstream);
        self.backend.destroy_event(self.eos_triple.event);
    }
}

fn new_triple<B: CodecBackend>(
    backend: &mut B,
    width: u32,
    height: u32,
    bitstream_size: usize,
) -> Result<Triple<B>, TranscodeError> {
    let surface = backend
        .create_input_buffer(width, height)
        .map_err(TranscodeError::EncoderError)?;
    let bitstream = backend
        .create_bitstream_buffer(bitstream_size)
        .map_err(TranscodeError::EncoderError)?;
    let event = backend.register_async_event().map_err(TranscodeError::EncoderError)?;
    Ok(Triple { surface, bitstream, event, wait_flag: false })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockBackend, MockSink};
    use afs_analyzer::{Csp, FrameFlags, Picstruct};
    use std::sync::Arc;

    fn frame(pts: i64) -> FrameInfo {
        FrameInfo {
            csp: Csp::Yuv444_8,
            width: 4,
            height: 4,
            pitch: 4,
            data: Arc::new(vec![0u8; 16]),
            picstruct: Picstruct::Frame,
            flags: FrameFlags::empty(),
            timestamp: pts,
            duration: 1,
        }
    }

    #[test]
    fn submissions_and_bitstreams_preserve_order() {
        let backend = MockBackend::new();
        let mut pipe = EncodePipeline::allocate_io_buffers(backend, 4, 4, 64).unwrap();
        let mut sink = MockSink::default();
        for i in 0..40i64 {
            pipe.submit(&frame(i), &mut sink).unwrap();
        }
        pipe.flush(&mut sink).unwrap();
        assert_eq!(sink.writes, pipe.submitted() as usize + 1); // +1 for the EOS bitstream
        assert_eq!(sink.pts_sequence(), (0..40).collect::<Vec<i64>>());
        assert!(sink.saw_eos());
    }

    #[test]
    fn backpressure_drains_the_oldest_triple_on_the_33rd_submission() {
        let backend = MockBackend::new();
        let mut pipe = EncodePipeline::allocate_io_buffers(backend, 4, 4, 64).unwrap();
        let mut sink = MockSink::default();
        for i in 0..RING_SIZE as i64 {
            pipe.submit(&frame(i), &mut sink).unwrap();
        }
        assert_eq!(sink.writes, 0, "ring not yet full, no backpressure drain expected");
        // The 33rd submission exhausts `available` and forces the pipeline to drain the oldest
        // pending triple (submission 0) before it can proceed (spec §4.8 step 1).
        pipe.submit(&frame(RING_SIZE as i64), &mut sink).unwrap();
        assert_eq!(sink.writes, 1);
        assert_eq!(sink.pts_sequence(), vec![0]);
    }

    #[test]
    fn need_more_input_is_not_an_error() {
        let mut backend = MockBackend::new();
        backend.need_more_input_on_odd = true;
        let mut pipe = EncodePipeline::allocate_io_buffers(backend, 4, 4, 64).unwrap();
        let mut sink = MockSink::default();
        for i in 0..10i64 {
            pipe.submit(&frame(i), &mut sink).unwrap();
        }
        pipe.flush(&mut sink).unwrap();
        assert_eq!(sink.writes, 11);
    }

    #[test]
    fn flush_times_out_when_eos_event_never_signals() {
        let mut backend = MockBackend::new();
        backend.eos_never_signals = true;
        let mut pipe = EncodePipeline::allocate_io_buffers(backend, 4, 4, 64).unwrap();
        let mut sink = MockSink::default();
        pipe.submit(&frame(0), &mut sink).unwrap();
        let err = pipe.flush(&mut sink).unwrap_err();
        assert!(matches!(err, TranscodeError::Timeout(_)));
    }
}

//! Drives a separate decode thread when the source is a GPU-decoded elementary stream,
//! handing off mapped device pointers to the encoder ring (spec §4.9). Grounded on
//! `original_source/NVEncCore/NVEncCore.cpp`'s decode/display section for the three emit
//! patterns and the single decoder-context lock; the shared error flag is replaced with a
//! one-shot message-passing channel per SPEC_FULL.md §9.

use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use afs_analyzer::{Picstruct, TranscodeError};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

/// One decoded picture ready for display, as yielded by a [`VideoDecoder`] (spec §4.9).
#[derive(Debug, Clone, Copy)]
pub struct DisplayInfo {
    pub picture_index: u32,
    pub timestamp: i64,
    pub top_field_first: bool,
    pub progressive: bool,
}

/// A mapped device frame, ready to be 2D-copied into the next encoder input surface.
pub struct MappedFrame {
    pub ptr: usize,
    pub width: u32,
    pub height: u32,
    pub pitch: usize,
}

/// The GPU decoder side of the coupler. Implementations wrap the vendor decode SDK; this
/// crate's tests use [`crate::mock`]'s software decoder.
pub trait VideoDecoder: Send {
    fn submit_packet(&mut self, packet: &[u8], pts: i64) -> Result<(), i32>;
    /// Non-blocking poll for the next picture ready to display, if any.
    fn poll_display(&mut self) -> Result<Option<DisplayInfo>, i32>;
    fn map_frame(&mut self, picture_index: u32, second_field: bool) -> Result<MappedFrame, i32>;
    fn unmap_frame(&mut self, picture_index: u32);
}

/// Which emit pattern the coupler uses per [`DisplayInfo`] (spec §4.9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeinterlaceMode {
    /// One emit, `unpaired_field=1`, progressive flag taken from the picture's own structure.
    Weave,
    /// Two emits, one per field.
    Bob,
    /// One emit, always marked interlaced; deinterlacing happens downstream (the AFS pipeline).
    Adaptive,
}

/// A single output emitted by the coupler for the encoder ring to consume.
#[derive(Debug, Clone, Copy)]
pub struct DecodedEmit {
    pub picture_index: u32,
    pub timestamp: i64,
    pub picstruct: Picstruct,
    pub second_field: bool,
}

fn emit_pattern(info: DisplayInfo, mode: DeinterlaceMode) -> Vec<DecodedEmit> {
    match mode {
        DeinterlaceMode::Weave => vec![DecodedEmit {
            picture_index: info.picture_index,
            timestamp: info.timestamp,
            picstruct: if info.progressive { Picstruct::Frame } else { interlaced_picstruct(info) },
            second_field: false,
        }],
        DeinterlaceMode::Bob => (0..2)
            .map(|field| DecodedEmit {
                picture_index: info.picture_index,
                timestamp: info.timestamp,
                picstruct: interlaced_picstruct(info),
                second_field: field == 1,
            })
            .collect(),
        DeinterlaceMode::Adaptive => vec![DecodedEmit {
            picture_index: info.picture_index,
            timestamp: info.timestamp,
            picstruct: interlaced_picstruct(info),
            second_field: false,
        }],
    }
}

fn interlaced_picstruct(info: DisplayInfo) -> Picstruct {
    if info.top_field_first {
        Picstruct::TopFieldFirst
    } else {
        Picstruct::BottomFieldFirst
    }
}

/// Drives `decoder` on a dedicated producer thread (spec §4.9, §5): reads packets from
/// `read_packet`, submits them to the decoder, and forwards each resulting
/// [`DecodedEmit`] onto a bounded channel the orchestrator drains. `decoder_lock` serializes
/// the shared GPU decode context between this thread and any caller that also touches it (a
/// real deployment's map/unmap/memcpy2d path runs under the same lock).
pub struct DecodeCoupler {
    handle: Option<JoinHandle<()>>,
    error_rx: Receiver<TranscodeError>,
}

impl DecodeCoupler {
    pub fn spawn<D, F>(
        decoder: Arc<Mutex<D>>,
        mode: DeinterlaceMode,
        mut read_packet: F,
        emit_tx: Sender<DecodedEmit>,
    ) -> Self
    where
        D: VideoDecoder + 'static,
        F: FnMut() -> Result<Option<(Vec<u8>, i64)>, TranscodeError> + Send + 'static,
    {
        let (error_tx, error_rx) = bounded(1);
        let handle = thread::spawn(move || {
            if let Err(e) = run_producer(&decoder, mode, &mut read_packet, &emit_tx) {
                // One-shot: a full channel here just means the orchestrator already observed an
                // earlier error, which takes precedence.
                let _ = error_tx.send(e);
            }
        });
        Self { handle: Some(handle), error_rx }
    }

    /// Non-blocking check for a producer-thread error (spec §5 "Cancellation").
    pub fn poll_error(&self) -> Option<TranscodeError> {
        self.error_rx.try_recv().ok()
    }

    /// Joins the producer thread (spec §4.9: "join() the producer before exiting Encode").
    pub fn join(mut self) -> Result<(), TranscodeError> {
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
        if let Ok(e) = self.error_rx.recv_timeout(Duration::from_millis(0)) {
            return Err(e);
        }
        Ok(())
    }
}

fn run_producer<D: VideoDecoder>(
    decoder: &Arc<Mutex<D>>,
    mode: DeinterlaceMode,
    read_packet: &mut dyn FnMut() -> Result<Option<(Vec<u8>, i64)>, TranscodeError>,
    emit_tx: &Sender<DecodedEmit>,
) -> Result<(), TranscodeError> {
    loop {
        let packet = match read_packet()? {
            Some(p) => p,
            None => break,
        };
        {
            let mut dec = decoder.lock().expect("decoder lock poisoned");
            dec.submit_packet(&packet.0, packet.1)
                .map_err(TranscodeError::DecoderError)?;
        }
        while let Some(info) = {
            let mut dec = decoder.lock().expect("decoder lock poisoned");
            dec.poll_display().map_err(TranscodeError::DecoderError)?
        } {
            for emit in emit_pattern(info, mode) {
                if emit_tx.send(emit).is_err() {
                    return Ok(()); // orchestrator shut down; stop producing quietly.
                }
            }
        }
    }
    Ok(())
}

/// Drains `rx` until it is disconnected, using `recv_timeout` so the caller can interleave
/// other work (spec §5 "Suspension points": "decoder_queue.dequeue - bounded blocking poll").
pub fn try_recv_emit(rx: &Receiver<DecodedEmit>, timeout: Duration) -> Option<DecodedEmit> {
    match rx.recv_timeout(timeout) {
        Ok(e) => Some(e),
        Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingDecoder {
        queued: Vec<DisplayInfo>,
    }

    impl VideoDecoder for CountingDecoder {
        fn submit_packet(&mut self, _packet: &[u8], pts: i64) -> Result<(), i32> {
            self.queued.push(DisplayInfo {
                picture_index: pts as u32,
                timestamp: pts,
                top_field_first: true,
                progressive: false,
            });
            Ok(())
        }

        fn poll_display(&mut self) -> Result<Option<DisplayInfo>, i32> {
            Ok(self.queued.pop())
        }

        fn map_frame(&mut self, _picture_index: u32, _second_field: bool) -> Result<MappedFrame, i32> {
            Ok(MappedFrame { ptr: 0, width: 0, height: 0, pitch: 0 })
        }

        fn unmap_frame(&mut self, _picture_index: u32) {}
    }

    #[test]
    fn bob_mode_emits_two_fields_per_picture() {
        let info = DisplayInfo { picture_index: 1, timestamp: 10, top_field_first: true, progressive: false };
        let emits = emit_pattern(info, DeinterlaceMode::Bob);
        assert_eq!(emits.len(), 2);
        assert!(!emits[0].second_field);
        assert!(emits[1].second_field);
    }

    #[test]
    fn weave_mode_emits_once_and_honors_progressive() {
        let info = DisplayInfo { picture_index: 1, timestamp: 10, top_field_first: false, progressive: true };
        let emits = emit_pattern(info, DeinterlaceMode::Weave);
        assert_eq!(emits.len(), 1);
        assert_eq!(emits[0].picstruct, Picstruct::Frame);
    }

    #[test]
    fn producer_thread_forwards_emits_and_joins_cleanly() {
        let decoder = Arc::new(Mutex::new(CountingDecoder { queued: Vec::new() }));
        let (tx, rx) = bounded(16);
        let mut packets = vec![Some((vec![0u8; 1], 0i64)), None];
        let coupler = DecodeCoupler::spawn(
            decoder,
            DeinterlaceMode::Weave,
            move || Ok(packets.remove(0)),
            tx,
        );
        let emit = try_recv_emit(&rx, Duration::from_secs(1));
        assert!(emit.is_some());
        coupler.join().unwrap();
    }
}

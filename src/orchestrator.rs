//! Top-level Encode loop (spec §4.10): pulls frames from a [`FrameSource`], runs them through
//! the AFS pipeline, and submits the results to an [`EncodePipeline`], flushing and closing out
//! at EOF.
//!
//! Grounded on `NVEncCore::Encode`'s main loop in `original_source/NVEncCore/NVEncCore.cpp`: a
//! single-pass frame index drives ScanCache, the five-frame-lookahead CadenceClassifier, and
//! StreamStatus in lockstep, with a short priming block at start-of-stream and an EOF drain at
//! the end.

use std::path::PathBuf;

use afs_analyzer::cadence::{analyze_frame, ClassifierParams, SourceFlags, Status};
use afs_analyzer::frame::{FrameFlags, Picstruct, SourceFrame};
use afs_analyzer::scan_cache::{ScanCache, ScanParams};
use afs_analyzer::source_cache::SourceCache;
use afs_analyzer::stream_status::{Duration, StreamStatus};
use afs_analyzer::stripe_cache::StripeCache;
use afs_analyzer::synthesizer::{passthrough_progressive, synthesize};
use encode_pipeline::{BitstreamSink, CodecBackend, EncodePipeline, FrameSource};

use crate::afs_log::AfsLogWriter;
use crate::config::TranscodeConfig;
use crate::error::{Result, TranscodeError};
use crate::timecode::TimecodeWriter;

/// Frames of lookahead the classifier needs before the orchestrator may release the oldest
/// frame for synthesis (spec §2 "Control flow…is serialized").
const PREREAD_LEN: i64 = 3;

/// `SourceCache`'s 5-slot arena only ever needs to serve `ScanCache.compute`'s current/previous
/// pair (a lag of 1 from the admit index). The orchestrator's own synthesis step lags the admit
/// index by up to `8 + PREREAD_LEN` frames (five for the classifier's lookahead, three more for
/// the refill window), well past that arena's retention — so the orchestrator keeps its own
/// longer-lived ring of admitted frames for synthesis and timestamp lookups instead of reaching
/// back into `SourceCache` beyond the window it actually guarantees.
const SYNTH_RING: usize = 16;

/// Drives one encode from `source` through `pipeline` into `sink`.
pub struct Orchestrator<F: FrameSource, B: CodecBackend> {
    source: F,
    pipeline: EncodePipeline<B>,
    sink: Box<dyn BitstreamSink>,
    source_cache: SourceCache,
    scan: ScanCache,
    stripe: StripeCache,
    stream_status: StreamStatus,
    classifier_params: ClassifierParams,
    scan_params: ScanParams,
    analyze: u8,
    tb_order: u8,
    timebase: (i64, i64),
    statuses: Vec<Status>,
    source_flags: Vec<SourceFlags>,
    frame_ring: Vec<Option<SourceFrame>>,
    nframe: i64,
    output_pts: i64,
    timecode: Option<TimecodeWriter>,
    afs_log: Option<AfsLogWriter>,
}

impl<F: FrameSource, B: CodecBackend> Orchestrator<F, B> {
    pub fn new(
        source: F,
        pipeline: EncodePipeline<B>,
        sink: Box<dyn BitstreamSink>,
        config: &TranscodeConfig,
    ) -> Result<Self> {
        let timebase = source.video_codec_context();
        let timecode = match &config.timecode_path {
            Some(path) if config.afs.timecode => Some(TimecodeWriter::create(path)?),
            _ => None,
        };
        let afs_log = match &config.log_path {
            Some(path) if config.afs.log => Some(AfsLogWriter::create(path)?),
            _ => None,
        };

        Ok(Self {
            source,
            pipeline,
            sink,
            source_cache: SourceCache::new(),
            scan: ScanCache::new(),
            stripe: StripeCache::new(),
            stream_status: StreamStatus::new(),
            classifier_params: config.afs.classifier_params(),
            scan_params: ScanParams {
                tb_order: config.afs.tb_order.as_u8(),
                mode: config.afs.analyze,
                thre_shift: config.afs.thre_shift,
                thre_deint: config.afs.thre_deint,
                thre_ymotion: config.afs.thre_ymotion,
                thre_cmotion: config.afs.thre_cmotion,
                clip: config.afs.clip,
            },
            analyze: config.afs.analyze,
            tb_order: config.afs.tb_order.as_u8(),
            timebase,
            statuses: Vec::new(),
            source_flags: Vec::new(),
            frame_ring: (0..SYNTH_RING).map(|_| None).collect(),
            nframe: 0,
            output_pts: 0,
            timecode,
            afs_log,
        })
    }

    /// Runs the encode to completion: admits every source frame, classifies cadence, emits
    /// synthesized pictures, then flushes the pipeline and closes the sink (spec §4.10).
    pub fn run(mut self) -> Result<()> {
        tracing::info!("orchestrator: encode starting");
        let mut iframe: i64 = 0;
        loop {
            let incoming = self.source.read().map_err(|e| TranscodeError::InvalidSequence(e.to_string()))?;
            if incoming.is_none() {
                break;
            }

            if let Some(frame) = incoming {
                if iframe == 0 {
                    self.source_cache.alloc(&frame)?;
                }
                self.source_flags.push(SourceFlags {
                    progressive: frame.picstruct == Picstruct::Frame,
                    rff: frame.flags.contains(FrameFlags::RFF),
                });
                self.source_cache.add(&frame)?;
                let admitted = self.source_cache.get(iframe).clone();
                let ring_idx = (iframe.rem_euclid(SYNTH_RING as i64)) as usize;
                self.frame_ring[ring_idx] = Some(admitted);

                if iframe == 0 {
                    // Seeds ScanCache slot(-1) with a zero-motion placeholder so the first real
                    // scan (frame 0, prev = frame -1) has a defined "previous" frame instead of
                    // indexing before the start of the stream (spec §4.10: "ScanCache.compute(-1,
                    // src_minus_one=dummy)").
                    let f0 = self.source_cache.get(0).clone();
                    self.scan.compute(-1, &f0, &f0, self.scan_params, |_| {});
                }

                let curr = self.source_cache.get(iframe).clone();
                let prev = if iframe > 0 {
                    self.source_cache.get(iframe - 1).clone()
                } else {
                    curr.clone()
                };
                {
                    let stripe = &mut self.stripe;
                    self.scan
                        .compute(iframe, &curr, &prev, self.scan_params, |f| stripe.invalidate(f));
                }
                if iframe >= 1 {
                    let scan_prev = self.scan.get(iframe - 1).clone();
                    let scan_curr = self.scan.get(iframe).clone();
                    self.stripe.merge(iframe - 1, &scan_prev, &scan_curr);
                }

                if iframe >= 5 {
                    self.ensure_status(iframe - 5)?;
                }
            }

            if iframe >= 8 {
                for i in self.nframe..=self.nframe + PREREAD_LEN {
                    self.ensure_status(i)?;
                }
                let target = self.nframe + PREREAD_LEN;
                if (target as usize) < self.statuses.len() {
                    self.emit_one()?;
                }
            }

            iframe += 1;
        }

        tracing::info!(iframe, "orchestrator: source exhausted, draining lookahead backlog");
        // EOF drain: every frame admitted has scan/stripe/status data by now, but up to
        // `PREREAD_LEN + 8` of them may not have been emitted yet (spec §4.10 "after EOF").
        loop {
            for i in self.nframe..=self.nframe + PREREAD_LEN {
                self.ensure_status(i)?;
            }
            let target = self.nframe + PREREAD_LEN;
            if (target as usize) >= self.statuses.len() {
                break;
            }
            self.emit_one()?;
        }

        tracing::info!(
            submitted = self.pipeline.submitted(),
            written = self.pipeline.written(),
            "orchestrator: flushing pipeline"
        );
        self.pipeline.flush(self.sink.as_mut())?;
        self.sink.close().map_err(|e| TranscodeError::IoError(e.to_string()))?;
        if let Some(tc) = &mut self.timecode {
            tc.close()?;
        }
        if let Some(log) = &mut self.afs_log {
            log.close()?;
        }
        self.pipeline.release_io_buffers();
        tracing::info!("orchestrator: encode complete");
        Ok(())
    }

    /// Computes `analyze_frame(i)` if the backing scan/stripe data is available and it has not
    /// already been computed, pushing it onto the sequential status history. Called both from
    /// the per-iframe classification step and from the "refill lookahead" block (spec §4.10);
    /// both call sites are idempotent against the same target because `ScanCache`/`StripeCache`
    /// memoize by parameter signature.
    fn ensure_status(&mut self, i: i64) -> Result<()> {
        if i < 0 || (i as usize) < self.statuses.len() {
            return Ok(());
        }
        if (i as usize) != self.statuses.len() {
            // A gap means the caller asked ahead of what scan/stripe data actually covers (the
            // EOF tail, typically); nothing to do until the backlog catches up.
            return Ok(());
        }
        let source = *self
            .source_flags
            .get(i as usize)
            .unwrap_or_else(|| self.source_flags.last().expect("at least one frame admitted"));
        let status = analyze_frame(i, &self.scan, &self.stripe, &self.classifier_params, source);
        self.statuses.push(status);
        Ok(())
    }

    /// Looks up a previously-admitted frame by its original admission index, from the
    /// orchestrator's own [`SYNTH_RING`]-deep ring rather than `SourceCache` (see the comment on
    /// [`SYNTH_RING`]).
    fn ring_frame(&self, i: i64) -> &SourceFrame {
        let idx = i.rem_euclid(SYNTH_RING as i64) as usize;
        self.frame_ring[idx]
            .as_ref()
            .filter(|f| f.frame_index == i)
            .unwrap_or_else(|| panic!("frame {i} is no longer available in the synthesis ring"))
    }

    /// Emits the frame at `self.nframe`: primes `StreamStatus` on the first three calls, then
    /// runs the steady-state set/get_duration/synth/submit cycle (spec §4.10).
    fn emit_one(&mut self) -> Result<()> {
        let nframe = self.nframe;
        let target = nframe + PREREAD_LEN;
        let status = self.statuses[target as usize];
        let orig_pts = self.ring_frame(target).timestamp;

        if nframe < 3 {
            // Priming: the original implementation's first three `set_status` calls pass the
            // loop index itself as `drop24_override` rather than a constant 0 (SPEC_FULL.md §9
            // Open Question resolution), which changes the initial `phase24` seed for sources
            // that already carry a pulldown cadence from frame zero.
            self.stream_status.set_status(target, status, nframe, orig_pts)?;
        } else {
            self.stream_status.set_status(target, status, 0, orig_pts)?;
        }

        let dur = self.stream_status.get_duration(nframe)?;
        self.nframe += 1;

        let duration = match dur {
            Duration::Drop => return Ok(()),
            Duration::Frames(d) => d,
        };

        let emit_status = self.statuses[nframe as usize];
        let curr = self.ring_frame(nframe).clone();
        let pts = self.output_pts;

        let frame = if emit_status.contains(Status::PROGRESSIVE) {
            passthrough_progressive(&curr, pts, duration)
        } else {
            let prev = if nframe > 0 {
                self.ring_frame(nframe - 1).clone()
            } else {
                curr.clone()
            };
            let stripe = self
                .stripe
                .filter(nframe, self.analyze, self.scan_params.clip, self.tb_order)
                .clone();
            synthesize(&curr, &prev, &stripe, self.tb_order, emit_status.shift_n(0), pts, duration)
        };

        self.pipeline.submit(&frame, self.sink.as_mut())?;
        self.output_pts += duration;

        if let Some(tc) = &mut self.timecode {
            tc.write_frame(pts, self.timebase)?;
        }
        if let Some(log) = &mut self.afs_log {
            if let Some(row) = self.stream_status.last_log_row() {
                log.write_row(&row)?;
            }
        }
        Ok(())
    }
}

/// Resolves a relative timecode/log path against the output file's directory, matching the
/// teacher's convention of sidecar files living next to the primary output.
pub fn sidecar_path(output: &std::path::Path, extension: &str) -> PathBuf {
    output.with_extension(extension)
}

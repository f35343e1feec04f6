//! Converts the classifier's status stream into per-frame PTS adjustments, 24 fps phase
//! tracking, and drop decisions (spec §4.6). Algorithm grounded verbatim on
//! `afsStreamStatus::init` / `set_status` / `get_duration` in the original filter.

use crate::cadence::Status;
use crate::error::{Result, TranscodeError};

const RING: usize = 16;

/// Outcome of [`StreamStatus::get_duration`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Duration {
    Frames(i64),
    Drop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Pts(i64),
    Drop,
}

/// One row of the optional AFS CSV log (spec §6 "AFS log file").
#[derive(Debug, Clone, Copy)]
pub struct LogRow {
    pub iframe: i64,
    pub status: Status,
    pub pos: Option<i64>,
    pub orig_pts: i64,
    pub quarter_jitter: i64,
    pub prev_jitter: i64,
    pub position24: i64,
    pub phase24: i64,
    pub rff_smooth: i64,
}

#[derive(Debug)]
pub struct StreamStatus {
    initialized: bool,
    prev_status: Status,
    prev_jitter: i64,
    additional_jitter: i64,
    prev_rff_smooth: i64,
    phase24: i64,
    position24: i64,
    quarter_jitter: i64,
    set_frame: i64,
    pos: [Position; RING],
    last_log_row: Option<LogRow>,
}

impl Default for StreamStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamStatus {
    pub fn new() -> Self {
        Self {
            initialized: false,
            prev_status: Status::empty(),
            prev_jitter: 0,
            additional_jitter: 0,
            prev_rff_smooth: 0,
            phase24: 4,
            position24: 0,
            quarter_jitter: 0,
            set_frame: -1,
            pos: [Position::Pts(0); RING],
            last_log_row: None,
        }
    }

    fn slot(iframe: i64) -> usize {
        iframe.rem_euclid(RING as i64) as usize
    }

    /// `(iframe, status, drop24_override, orig_pts)`, delivered in strictly increasing
    /// `iframe`. `drop24_override` mirrors the original's `int` parameter rather than a plain
    /// `bool`: the orchestrator's priming block passes the loop index itself (see
    /// SPEC_FULL.md §4.10 / §9), and any nonzero value is treated as "override set".
    pub fn set_status(
        &mut self,
        iframe: i64,
        status: Status,
        drop24_override: i64,
        orig_pts: i64,
    ) -> Result<()> {
        if !self.initialized {
            self.prev_status = status;
            self.phase24 = if drop24_override != 0
                || (!status.contains(Status::SHIFT0)
                    && status.contains(Status::SHIFT1)
                    && status.contains(Status::SHIFT2))
            {
                0
            } else {
                4
            };
            self.position24 = if status.contains(Status::FORCE24) { 1 } else { 0 };
            self.initialized = true;
        }

        if iframe > self.set_frame + 1 {
            return Err(TranscodeError::InvalidSequence(format!(
                "set_status({iframe}) called before frame {} was set",
                self.set_frame + 1
            )));
        }

        let progressive = status.contains(Status::PROGRESSIVE);

        let rff_smooth = if self.prev_status.contains(Status::RFF) && self.prev_rff_smooth == 0 {
            -1
        } else if self.prev_status.contains(Status::PROGRESSIVE)
            && status.contains(Status::RFF)
            && self.prev_rff_smooth == 0
        {
            1
        } else {
            0
        };

        let mut drop24_override_active = drop24_override != 0;
        let mut qj;
        if progressive {
            qj = rff_smooth;
            self.additional_jitter = 0;
            drop24_override_active = false;
        } else {
            let shift0_term = if status.contains(Status::SHIFT0) {
                -2
            } else if self.prev_status.contains(Status::SHIFT0) {
                if status.contains(Status::SMOOTHING) { -1 } else { -2 }
            } else {
                0
            };
            let additional_term = if status.contains(Status::SMOOTHING) || self.additional_jitter != -1
            {
                self.additional_jitter
            } else {
                -2
            };
            qj = shift0_term + additional_term + rff_smooth;
            self.position24 += rff_smooth;
        }

        // Step 4: pull-down drop (interlaced only).
        let mut pull_drop = if progressive {
            false
        } else {
            status.contains(Status::FRAME_DROP)
                && !(self.prev_status.contains(Status::SHIFT0) || status.contains(Status::SHIFT0))
                && status.contains(Status::SHIFT1)
        };
        self.additional_jitter = if pull_drop { -1 } else { 0 };

        // Step 5: 24 fps cadence.
        let mut drop24 = drop24_override_active
            || (!status.contains(Status::SHIFT0)
                && status.contains(Status::SHIFT1)
                && status.contains(Status::SHIFT2));
        if drop24 {
            self.phase24 = (self.position24 + 100).rem_euclid(5);
        }
        if self.position24 >= self.phase24
            && ((self.position24 + 100).rem_euclid(5) == self.phase24
                || (self.position24 + 99).rem_euclid(5) == self.phase24)
        {
            self.position24 -= 5;
            drop24 = true;
        }

        // Step 6: FORCE24 application.
        if status.contains(Status::FORCE24) {
            pull_drop = drop24;
            if progressive {
                qj += self.position24;
            } else {
                qj = self.position24;
                self.position24 += 1;
            }
        } else if !progressive {
            self.phase24 -= self.position24 + 1;
            self.position24 = 0;
        }

        // Step 7: jitter-threshold drop.
        let mut drop_thre = if status.contains(Status::FRAME_DROP) { 0 } else { -3 };
        if !progressive && self.prev_status.contains(Status::RFF) {
            drop_thre = -3;
        }
        let drop = (qj - self.prev_jitter < drop_thre) || pull_drop;

        // Step 8: emission.
        let slot = Self::slot(iframe);
        if drop {
            self.prev_jitter -= 4;
            self.pos[slot] = Position::Drop;
        } else {
            self.prev_jitter = qj;
            self.pos[slot] = Position::Pts(orig_pts + qj);
        }
        self.quarter_jitter = qj;
        self.prev_rff_smooth = rff_smooth;
        self.prev_status = status;
        self.set_frame = iframe;

        self.last_log_row = Some(LogRow {
            iframe,
            status,
            pos: match self.pos[slot] {
                Position::Pts(p) => Some(p),
                Position::Drop => None,
            },
            orig_pts,
            quarter_jitter: qj,
            prev_jitter: self.prev_jitter,
            position24: self.position24,
            phase24: self.phase24,
            rff_smooth,
        });

        Ok(())
    }

    /// Requires `set_frame >= i + 2`; scans forward through `pos[i+1..i+3]`, skipping DROP
    /// slots, to find the next emitted position.
    pub fn get_duration(&self, i: i64) -> Result<Duration> {
        if self.set_frame < i + 2 {
            return Err(TranscodeError::NotReady(format!(
                "get_duration({i}) requires set_frame >= {}, have {}",
                i + 2,
                self.set_frame
            )));
        }
        let this_pos = match self.pos[Self::slot(i)] {
            Position::Drop => return Ok(Duration::Drop),
            Position::Pts(p) => p,
        };
        for next in [i + 1, i + 2, i + 3] {
            if let Position::Pts(next_pos) = self.pos[Self::slot(next)] {
                return Ok(Duration::Frames(next_pos - this_pos));
            }
        }
        Ok(Duration::Frames(0))
    }

    /// The most recently emitted log row, for the AFS CSV writer.
    pub fn last_log_row(&self) -> Option<LogRow> {
        self.last_log_row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progressive_stream_emits_in_pts_with_no_drops() {
        let mut ss = StreamStatus::new();
        for i in 0..6 {
            ss.set_status(i, Status::PROGRESSIVE, 0, i * 1000).unwrap();
        }
        for i in 0..4 {
            assert_eq!(ss.get_duration(i).unwrap(), Duration::Frames(1000));
        }
    }

    #[test]
    fn protocol_violation_is_rejected() {
        let mut ss = StreamStatus::new();
        ss.set_status(0, Status::PROGRESSIVE, 0, 0).unwrap();
        let err = ss.set_status(5, Status::PROGRESSIVE, 0, 5000).unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidSequence(_)));
    }

    #[test]
    fn drop_cascade_decreases_prev_jitter_by_four() {
        let mut ss = StreamStatus::new();
        // Force a drop by feeding an interlaced cadence with FRAME_DROP set and a large
        // negative jump; the exact cadence values are less important here than observing the
        // `-4` step described in spec §8 invariant 6.
        let status = Status::SHIFT1 | Status::FRAME_DROP;
        ss.set_status(0, status, 0, 0).unwrap();
        let before = ss.prev_jitter;
        // SHIFT0 absent on both prev and current, SHIFT1 present -> pull_drop true -> drop.
        ss.set_status(1, status, 0, 1001).unwrap();
        assert_eq!(ss.prev_jitter, before - 4);
    }
}

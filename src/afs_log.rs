//! Optional AFS CSV log writer (spec §6 "AFS log file"): one row per frame describing the
//! classifier's status bitset and `StreamStatus`'s internal jitter/phase bookkeeping.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use afs_analyzer::cadence::Status;
use afs_analyzer::stream_status::LogRow;

use crate::error::{Result, TranscodeError};

const HEADER: &str =
    " iframe,  sts,       ,        pos,   orig_pts, q_jit, prevjit, pos24, phase24, rff_smooth";

pub struct AfsLogWriter {
    out: BufWriter<File>,
}

impl AfsLogWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| TranscodeError::IoError(e.to_string()))?;
        let mut out = BufWriter::new(file);
        writeln!(out, "{HEADER}").map_err(|e| TranscodeError::IoError(e.to_string()))?;
        Ok(Self { out })
    }

    pub fn write_row(&mut self, row: &LogRow) -> Result<()> {
        let flags = flag_string(row.status);
        let pos_str = row
            .pos
            .map(|p| format!("{p:10}"))
            .unwrap_or_else(|| format!("{:>10}", "DROP"));
        writeln!(
            self.out,
            "{:7}, 0x{:02x}, {}, {}, {:10}, {:3}, {:3}, {:3}, {:3}, {:3}",
            row.iframe,
            row.status.bits(),
            flags,
            pos_str,
            row.orig_pts,
            row.quarter_jitter,
            row.prev_jitter,
            row.position24,
            row.phase24,
            row.rff_smooth,
        )
        .map_err(|e| TranscodeError::IoError(e.to_string()))?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| TranscodeError::IoError(e.to_string()))
    }
}

/// `"p|i, r|-, 0|-, 1|-, 2|-, 3|-"` (spec §6): progressive/interlaced, RFF, then SHIFT0..3.
fn flag_string(status: Status) -> String {
    let progressive = if status.contains(Status::PROGRESSIVE) { 'p' } else { 'i' };
    let rff = if status.contains(Status::RFF) { 'r' } else { '-' };
    let shift = |n: u8| if status.shift_n(n) { char::from(b'0' + n) } else { '-' };
    format!("{progressive}, {rff}, {}, {}, {}, {}", shift(0), shift(1), shift(2), shift(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_string_decodes_progressive_and_shift_bits() {
        let status = Status::PROGRESSIVE | Status::RFF | Status::SHIFT1;
        assert_eq!(flag_string(status), "p, r, -, 1, -, -");
    }

    #[test]
    fn header_matches_documented_column_layout() {
        assert!(HEADER.starts_with(" iframe,  sts"));
    }
}

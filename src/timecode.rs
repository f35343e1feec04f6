//! V2 timecode file writer (spec §6 "Timecode file"): a two-line preamble followed by one
//! decimal millisecond line per emitted, non-dropped frame.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{Result, TranscodeError};

pub struct TimecodeWriter {
    out: BufWriter<File>,
}

impl TimecodeWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| TranscodeError::IoError(e.to_string()))?;
        let mut out = BufWriter::new(file);
        out.write_all(b"# timecode format v2\n")
            .map_err(|e| TranscodeError::IoError(e.to_string()))?;
        Ok(Self { out })
    }

    /// Converts `pts` (in the source's input timebase) to milliseconds and writes one line,
    /// unless the computed value is exactly zero (spec §6: "A frame with computed `pts == 0` is
    /// suppressed").
    pub fn write_frame(&mut self, pts: i64, timebase: (i64, i64)) -> Result<()> {
        let (num, den) = timebase;
        let ms = (pts as f64) * (num as f64) / (den as f64) * 1000.0;
        if ms == 0.0 {
            return Ok(());
        }
        writeln!(self.out, "{ms:.6}").map_err(|e| TranscodeError::IoError(e.to_string()))?;
        Ok(())
    }

    pub fn close(&mut self) -> Result<()> {
        self.out.flush().map_err(|e| TranscodeError::IoError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn writes_preamble_and_suppresses_zero_pts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.tc.txt");
        let mut tc = TimecodeWriter::create(&path).unwrap();
        tc.write_frame(0, (1, 1000)).unwrap();
        tc.write_frame(1000, (1, 1000)).unwrap();
        tc.close().unwrap();

        let mut contents = String::new();
        File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "# timecode format v2");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "1000.000000");
    }
}

//! A raw planar-YUV file [`FrameSource`] (spec §6 "FrameSource"). Demuxing and container
//! parsing are out of scope (spec.md Non-goals) — this reads fixed-size, fixed-pitch frames off
//! disk as a minimal, genuinely runnable stand-in for the vendor SDK's decode path, the same way
//! the teacher crate backs its own capture pipeline with a concrete platform source rather than
//! leaving the seam unimplemented.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;

use afs_analyzer::{Csp, FrameFlags, FrameInfo, Picstruct};
use encode_pipeline::backend::SourceError;
use encode_pipeline::FrameSource;

/// Reads consecutive fixed-size frames from a raw 4:2:0 or 4:4:4 planar file: luma `height`
/// rows of `pitch` bytes, followed by the chroma planes at the same `pitch` (the layout
/// [`afs_analyzer::source_cache`]'s de-interleave step already assumes — see its tests).
pub struct RawYuvSource {
    reader: BufReader<File>,
    csp: Csp,
    width: u32,
    height: u32,
    pitch: usize,
    frame_duration: i64,
    timebase: (i64, i64),
    next_pts: i64,
    frame_bytes: usize,
}

impl RawYuvSource {
    pub fn open(
        path: &Path,
        csp: Csp,
        width: u32,
        height: u32,
        timebase: (i64, i64),
        frame_duration: i64,
    ) -> std::io::Result<Self> {
        let file = File::open(path)?;
        let pitch = width as usize * csp.bytes_per_sample();
        let plane_rows = if csp.is_420() {
            height as usize * 2
        } else {
            height as usize * 3
        };
        let frame_bytes = plane_rows * pitch;
        Ok(Self {
            reader: BufReader::new(file),
            csp,
            width,
            height,
            pitch,
            frame_duration,
            timebase,
            next_pts: 0,
            frame_bytes,
        })
    }
}

impl FrameSource for RawYuvSource {
    fn read(&mut self) -> Result<Option<FrameInfo>, SourceError> {
        let mut buf = vec![0u8; self.frame_bytes];
        match self.reader.read_exact(&mut buf) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(SourceError(e.to_string())),
        }

        let frame = FrameInfo {
            csp: self.csp,
            width: self.width,
            height: self.height,
            pitch: self.pitch,
            data: Arc::new(buf),
            picstruct: Picstruct::Frame,
            flags: FrameFlags::empty(),
            timestamp: self.next_pts,
            duration: self.frame_duration,
        };
        self.next_pts += self.frame_duration;
        Ok(Some(frame))
    }

    fn video_codec_context(&self) -> (i64, i64) {
        self.timebase
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_exact_frames_and_reports_eof() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.yuv");
        // 2x2 4:2:0: frame_bytes = 2*height*pitch = 2*2*2 = 8 bytes per frame.
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0u8; 8]).unwrap();
        file.write_all(&[1u8; 8]).unwrap();
        drop(file);

        let mut src = RawYuvSource::open(&path, Csp::Yuv420_8, 2, 2, (1, 24000), 1000).unwrap();
        let f0 = src.read().unwrap().expect("first frame");
        assert_eq!(f0.timestamp, 0);
        let f1 = src.read().unwrap().expect("second frame");
        assert_eq!(f1.timestamp, f0.duration);
        assert!(src.read().unwrap().is_none());
    }

    #[test]
    fn truncated_trailing_frame_reports_eof_not_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.yuv");
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0u8; 3]).unwrap();
        drop(file);

        let mut src = RawYuvSource::open(&path, Csp::Yuv420_8, 2, 2, (1, 24000), 1000).unwrap();
        assert!(src.read().unwrap().is_none());
    }
}

//! Ring of past source frames, keyed by input index (spec §4.1).

use crate::error::{Result, TranscodeError};
use crate::frame::{Csp, FrameInfo, SourceFrame};

/// Number of past source frames kept resident; the cadence classifier's lookahead window
/// never needs to look further back than this.
pub const CAPACITY: usize = 5;

#[derive(Debug, Clone, Copy)]
struct Template {
    csp: Csp,
    width: u32,
    height: u32,
}

/// Fixed 5-slot arena of de-interleaved source frames, addressed by `(cache, frame_index)`
/// rather than raw pointers (SPEC_FULL.md §9 "Pointer-rich caches → arena+index").
#[derive(Debug, Default)]
pub struct SourceCache {
    slots: Vec<Option<SourceFrame>>,
    template: Option<Template>,
    input_counter: i64,
}

impl SourceCache {
    pub fn new() -> Self {
        Self {
            slots: (0..CAPACITY).map(|_| None).collect(),
            template: None,
            input_counter: 0,
        }
    }

    /// Reserves slots matching `template`'s csp/width/height.
    pub fn alloc(&mut self, template: &FrameInfo) -> Result<()> {
        if template.width == 0 || template.height == 0 {
            return Err(TranscodeError::OutOfMemory(
                "cannot allocate source cache for a zero-sized frame".into(),
            ));
        }
        self.template = Some(Template {
            csp: template.csp,
            width: template.width,
            height: template.height,
        });
        Ok(())
    }

    pub fn inframe(&self) -> i64 {
        self.input_counter
    }

    /// Admits `src`, de-interleaving 4:2:0 chroma into the slot `input_counter mod CAPACITY`.
    pub fn add(&mut self, src: &FrameInfo) -> Result<()> {
        if !matches!(
            src.csp,
            Csp::Yuv420_8 | Csp::Yuv420_16 | Csp::Yuv444_8 | Csp::Yuv444_16
        ) {
            return Err(TranscodeError::UnsupportedCsp(format!("{:?}", src.csp)));
        }

        let frame_index = self.input_counter;
        let slot_index = (frame_index as usize) % CAPACITY;
        self.slots[slot_index] = Some(if src.csp.is_420() {
            de_interleave_420(frame_index, src)
        } else {
            plain_copy(frame_index, src)
        });
        self.input_counter += 1;
        Ok(())
    }

    /// Returns the slot for frame `i`. Caller contract: `i ∈ [inframe() - CAPACITY, inframe())`;
    /// callers outside that window are an orchestrator bug, not a recoverable runtime condition,
    /// so this indexes directly rather than defensively re-validating a contract the orchestrator
    /// already owns.
    pub fn get(&self, i: i64) -> &SourceFrame {
        let slot_index = (i.rem_euclid(CAPACITY as i64)) as usize;
        self.slots[slot_index]
            .as_ref()
            .filter(|f| f.frame_index == i)
            .unwrap_or_else(|| panic!("SourceCache::get({i}) outside admitted window"))
    }
}

fn plain_copy(frame_index: i64, src: &FrameInfo) -> SourceFrame {
    SourceFrame {
        frame_index,
        csp: src.csp,
        width: src.width,
        height: src.height,
        pitch: src.pitch,
        data: src.data.as_ref().clone(),
        picstruct: src.picstruct,
        flags: src.flags,
        timestamp: src.timestamp,
        duration: src.duration,
    }
}

/// De-interleaves a 4:2:0 source into the layout described in spec §3/§4.1: luma rows
/// `[0, H)`, U-even `[H, 5H/4)`, U-odd `[5H/4, 6H/4)`, V-even `[6H/4, 7H/4)`, V-odd
/// `[7H/4, 2H)`, each row `pitch` bytes wide.
fn de_interleave_420(frame_index: i64, src: &FrameInfo) -> SourceFrame {
    let h = src.height as usize;
    let pitch = src.pitch;
    let mut data = vec![0u8; 2 * h * pitch];

    // Luma: straight copy.
    data[0..h * pitch].copy_from_slice(&src.data[0..h * pitch]);

    // Chroma planes in the source are half-height, full-pitch rows (same stride as luma, as
    // the vendor SDK's pitched allocations commonly do for NV12/YV12-derived formats).
    let u_plane_offset = h * pitch;
    let v_plane_offset = h * pitch + (h / 2) * pitch;
    let field_rows = h / 4;

    let u_even_dst = h * pitch;
    let u_odd_dst = (h * 5 / 4) * pitch;
    let v_even_dst = (h * 6 / 4) * pitch;
    let v_odd_dst = (h * 7 / 4) * pitch;

    for r in 0..field_rows {
        let u_even_src = u_plane_offset + (2 * r) * pitch;
        let u_odd_src = u_plane_offset + (2 * r + 1) * pitch;
        let v_even_src = v_plane_offset + (2 * r) * pitch;
        let v_odd_src = v_plane_offset + (2 * r + 1) * pitch;

        data[u_even_dst + r * pitch..u_even_dst + (r + 1) * pitch]
            .copy_from_slice(&src.data[u_even_src..u_even_src + pitch]);
        data[u_odd_dst + r * pitch..u_odd_dst + (r + 1) * pitch]
            .copy_from_slice(&src.data[u_odd_src..u_odd_src + pitch]);
        data[v_even_dst + r * pitch..v_even_dst + (r + 1) * pitch]
            .copy_from_slice(&src.data[v_even_src..v_even_src + pitch]);
        data[v_odd_dst + r * pitch..v_odd_dst + (r + 1) * pitch]
            .copy_from_slice(&src.data[v_odd_src..v_odd_src + pitch]);
    }

    SourceFrame {
        frame_index,
        csp: src.csp,
        width: src.width,
        height: src.height,
        pitch,
        data,
        picstruct: src.picstruct,
        flags: src.flags,
        timestamp: src.timestamp,
        duration: src.duration,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{FrameFlags, Picstruct};
    use std::sync::Arc;

    fn make_420_frame(height: u32, pitch: usize, fill: impl Fn(usize) -> u8) -> FrameInfo {
        // Luma (H rows) plus a separate half-height U plane and half-height V plane, each at
        // full pitch: H + H/2 + H/2 = 2H rows total.
        let total_rows = height as usize * 2;
        let mut data = vec![0u8; total_rows * pitch];
        for row in 0..total_rows {
            for col in 0..pitch {
                data[row * pitch + col] = fill(row);
            }
        }
        FrameInfo {
            csp: Csp::Yuv420_8,
            width: pitch as u32,
            height,
            pitch,
            data: Arc::new(data),
            picstruct: Picstruct::Frame,
            flags: FrameFlags::empty(),
            timestamp: 0,
            duration: 0,
        }
    }

    #[test]
    fn admits_frames_in_monotonic_order_and_tracks_input_counter() {
        let mut cache = SourceCache::new();
        let tmpl = make_420_frame(8, 4, |_| 0);
        cache.alloc(&tmpl).unwrap();
        for i in 0..7 {
            let f = make_420_frame(8, 4, move |row| (i * 10 + row) as u8);
            cache.add(&f).unwrap();
        }
        assert_eq!(cache.inframe(), 7);
        for i in 2..7 {
            assert_eq!(cache.get(i).frame_index, i);
        }
    }

    #[test]
    fn de_interleaves_u_even_rows_to_the_documented_offset() {
        let mut cache = SourceCache::new();
        let f = make_420_frame(8, 4, |row| row as u8);
        cache.alloc(&f).unwrap();
        cache.add(&f).unwrap();
        let sf = cache.get(0);

        // U plane in the source starts at row 8 (height); even field rows are 8, 10, 12, 14.
        let u_even_offset = sf.u_even_row_offset();
        assert_eq!(u_even_offset, 8);
        assert_eq!(sf.row(u_even_offset)[0], 8);
        assert_eq!(sf.row(u_even_offset + 1)[0], 10);
    }
}

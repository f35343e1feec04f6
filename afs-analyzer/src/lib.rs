//! Auto Field Shift (AFS) analyzer: inverse-telecine / adaptive-deinterlace classification and
//! frame synthesis, decoupled from any particular codec backend or frame source.
//!
//! The modules here are the leaf caches and algorithms described in spec §4.1-4.7: a ring of
//! past source frames ([`source_cache`]), per-frame scan/stripe classification
//! ([`scan_cache`], [`stripe_cache`], [`motion_counters`]), the five-frame-lookahead cadence
//! classifier ([`cadence`]), the PTS/drop state machine ([`stream_status`]), and the per-pixel
//! frame compositor ([`synthesizer`]). Nothing in this crate touches a GPU, a codec SDK, or a
//! frame source — those seams belong to `encode-pipeline` and the root crate's `FrameSource`
//! implementations.

pub mod cadence;
pub mod error;
pub mod frame;
pub mod motion_counters;
pub mod scan_cache;
pub mod source_cache;
pub mod stream_status;
pub mod stripe_cache;
pub mod synthesizer;

pub use cadence::{analyze_frame, ClassifierParams, SourceFlags, Status};
pub use error::{Result, TranscodeError};
pub use frame::{Csp, FrameFlags, FrameInfo, Picstruct, SourceFrame};
pub use motion_counters::{count_motion, count_stripe};
pub use scan_cache::{analyze_stripe, ClipRect, ScanCache, ScanMap, ScanParams};
pub use source_cache::SourceCache;
pub use stream_status::{Duration, LogRow, StreamStatus};
pub use stripe_cache::{StripeCache, StripeMap};
pub use synthesizer::{passthrough_progressive, synthesize};

//! Encoder pipeline orchestration: the async ring of input/output buffers that drives a vendor
//! GPU video-encoding engine (spec §4.8), and the GPU-decode coupling thread for elementary
//! streams that arrive pre-decoded on the device (spec §4.9).
//!
//! This crate owns the `CodecBackend`/`FrameSource`/`BitstreamSink` trait seams (spec §6) and a
//! software mock of all three for tests ([`mock`]). The AFS analyzer in the sibling
//! `afs-analyzer` crate does not depend on this crate; the root crate's orchestrator wires the
//! two together.

pub mod backend;
pub mod decode_coupler;
pub mod mock;
pub mod pipeline;

pub use backend::{BitstreamSink, CodecBackend, EncodeOutcome, PictureParams, SourceError};
pub use backend::FrameSource;
pub use decode_coupler::{DecodeCoupler, DecodedEmit, DeinterlaceMode, DisplayInfo, MappedFrame, VideoDecoder};
pub use mock::MockFrameSource;
pub use pipeline::{EncodePipeline, FLUSH_TIMEOUT, RING_SIZE};

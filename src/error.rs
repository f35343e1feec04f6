//! The library's public error type. `TranscodeError` lives in `afs-analyzer` (it is shared
//! with `encode-pipeline`, which has no dependency on this crate); this module just re-exports
//! it at the root crate's public boundary, following the teacher's convention of a thin
//! `error.rs` that the rest of the crate imports from rather than reaching into a leaf crate
//! directly.
//!
//! `anyhow` stays at the CLI-binary boundary only (`src/main.rs`) — library errors here are
//! concrete `TranscodeError` values, matching the teacher's `From<std::io::Error> for
//! CaptureError` convention rather than a dynamic `anyhow::Error`.

pub use afs_analyzer::error::{Result, TranscodeError};

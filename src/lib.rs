//! `transcode_core`: wires the `afs-analyzer` cadence classifier and `encode-pipeline`'s
//! encoder ring into a single [`orchestrator::Orchestrator`], plus the validated configuration
//! surface and sidecar file writers (spec §6) that sit around it.
//!
//! Mirrors the teacher crate's root-lib shape: a thin `lib.rs` that declares modules and
//! re-exports the handful of types a caller actually needs, leaving the substantial logic in
//! named submodules.

pub mod afs_log;
pub mod config;
pub mod error;
pub mod file_sink;
pub mod orchestrator;
pub mod raw_source;
pub mod timecode;

pub use config::{AfsConfig, AfsPreset, Codec, EncoderConfig, RateControl, TbOrder, TranscodeConfig};
pub use error::{Result, TranscodeError};
pub use orchestrator::Orchestrator;

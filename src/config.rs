//! # Configuration Module
//!
//! Validated configuration surfaces for the AFS analyzer and the encoder backend, plus the
//! CLI-facing aggregate that nests both. Follows the teacher crate's `CaptureConfig` pattern: a
//! `Default` impl with sane values, constructors, and a `validate(&mut self)` that is called
//! once before work begins and may auto-correct contradictory fields (logging a warning when it
//! does, rather than silently truncating).
//!
//! spec.md §6 scopes INI/CLI parsing out of the core's own responsibilities, but the core still
//! needs *some* typed configuration surface to hand the classifier and the encoder backend —
//! this module is that surface, covered by SPEC_FULL.md §10.2.

use afs_analyzer::cadence::ClassifierParams;
use afs_analyzer::scan_cache::ClipRect;

use crate::error::TranscodeError;

/// Named AFS tuning presets (spec §6 "AFS configuration"). Each preset expands to a known
/// vector of the underlying numeric fields via [`AfsConfig::from_preset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfsPreset {
    Default,
    Triple,
    Double,
    Anime,
    MinAfterimage,
    Force24Sd,
    Force24Hd,
    Force30,
}

/// Numeric preset table, carried over verbatim from the original filter's
/// `NVEncFilterAfs::set_preset` (SPEC_FULL.md §6.1) because spec.md names the presets by label
/// only.
struct PresetValues {
    method_switch: u16,
    coeff_shift: u16,
    thre_shift: u16,
    thre_deint: u16,
    thre_ymotion: u16,
    thre_cmotion: u16,
    analyze: u8,
    shift: bool,
    drop: bool,
    smooth: bool,
    force24: bool,
    tune: bool,
}

impl AfsPreset {
    fn values(self) -> PresetValues {
        match self {
            Self::Default => PresetValues {
                method_switch: 64,
                coeff_shift: 119,
                thre_shift: 0,
                thre_deint: 48,
                thre_ymotion: 112,
                thre_cmotion: 112,
                analyze: 0,
                shift: true,
                drop: true,
                smooth: false,
                force24: false,
                tune: false,
            },
            Self::Triple => PresetValues {
                drop: false,
                ..Self::Default.values()
            },
            Self::Double => PresetValues {
                smooth: true,
                ..Self::Default.values()
            },
            Self::Anime => PresetValues {
                method_switch: 128,
                smooth: true,
                ..Self::Default.values()
            },
            Self::MinAfterimage => PresetValues {
                coeff_shift: 192,
                smooth: true,
                ..Self::Default.values()
            },
            Self::Force24Sd => PresetValues {
                smooth: true,
                force24: true,
                ..Self::Default.values()
            },
            Self::Force24Hd => PresetValues {
                smooth: true,
                force24: true,
                ..Self::Default.values()
            },
            Self::Force30 => PresetValues {
                shift: false,
                drop: false,
                smooth: false,
                ..Self::Default.values()
            },
        }
    }
}

/// Top/bottom-field-first indicator (spec §6 "tb_order").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TbOrder {
    Bff,
    Tff,
}

impl TbOrder {
    pub fn as_u8(self) -> u8 {
        match self {
            Self::Bff => 0,
            Self::Tff => 1,
        }
    }
}

/// Validated configuration for the AFS analyzer (spec §6 "AFS configuration").
#[derive(Debug, Clone)]
pub struct AfsConfig {
    pub preset: AfsPreset,
    pub clip: ClipRect,
    pub method_switch: u16,
    pub coeff_shift: u16,
    pub thre_shift: u16,
    pub thre_deint: u16,
    pub thre_ymotion: u16,
    pub thre_cmotion: u16,
    pub analyze: u8,
    pub shift: bool,
    pub drop: bool,
    pub smooth: bool,
    pub force24: bool,
    pub tune: bool,
    pub tb_order: TbOrder,
    pub rff: bool,
    pub timecode: bool,
    pub log: bool,
    pub reverse: [bool; 4],
}

impl Default for AfsConfig {
    fn default() -> Self {
        Self::from_preset(AfsPreset::Default)
    }
}

impl AfsConfig {
    /// Expands a named preset into a full `AfsConfig` (spec §6.1 preset table). `clip`/
    /// `tb_order`/`rff`/`timecode`/`log`/`reverse` are not part of the preset vector and take
    /// their documented defaults; callers override them after construction.
    pub fn from_preset(preset: AfsPreset) -> Self {
        let v = preset.values();
        Self {
            preset,
            clip: ClipRect::default(),
            method_switch: v.method_switch,
            coeff_shift: v.coeff_shift,
            thre_shift: v.thre_shift,
            thre_deint: v.thre_deint,
            thre_ymotion: v.thre_ymotion,
            thre_cmotion: v.thre_cmotion,
            analyze: v.analyze,
            shift: v.shift,
            drop: v.drop,
            smooth: v.smooth,
            force24: v.force24,
            tune: v.tune,
            tb_order: TbOrder::Tff,
            rff: true,
            timecode: false,
            log: false,
            reverse: [false; 4],
        }
    }

    /// Validates the documented ranges and enforces `shift=false => drop=false, smooth=false`
    /// (spec §6), auto-correcting and logging a warning rather than silently truncating —
    /// matching the original's `check_param` behavior (SPEC_FULL.md §10.2).
    pub fn validate(&mut self) -> Result<(), TranscodeError> {
        check_range("method_switch", self.method_switch, 0, 256)?;
        check_range("coeff_shift", self.coeff_shift, 0, 256)?;
        check_range("thre_shift", self.thre_shift, 0, 1024)?;
        check_range("thre_deint", self.thre_deint, 0, 1024)?;
        check_range("thre_Ymotion", self.thre_ymotion, 0, 1024)?;
        check_range("thre_Cmotion", self.thre_cmotion, 0, 1024)?;
        check_range("analyze", self.analyze as u16, 0, 5)?;

        if !self.shift && (self.drop || self.smooth) {
            tracing::warn!(
                "afs: shift=false forces drop=false, smooth=false; clearing both (was drop={}, smooth={})",
                self.drop,
                self.smooth
            );
            self.drop = false;
            self.smooth = false;
        }
        Ok(())
    }

    /// Builds the tuning parameters [`afs_analyzer::analyze_frame`] needs, independent of the
    /// per-frame source flags.
    pub fn classifier_params(&self) -> ClassifierParams {
        ClassifierParams {
            coeff_shift: self.coeff_shift,
            method_switch: self.method_switch,
            reverse: self.reverse,
            frame_drop_enabled: self.drop,
            smoothing_enabled: self.smooth,
            force24_enabled: self.force24,
        }
    }
}

fn check_range(field: &'static str, value: u16, min: u16, max: u16) -> Result<(), TranscodeError> {
    if value < min || value > max {
        return Err(TranscodeError::UnsupportedParam {
            field,
            reason: format!("{value} out of range [{min}, {max}]"),
        });
    }
    Ok(())
}

/// Target codec (spec §6 "Encoder configuration").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Codec {
    H264,
    Hevc,
}

/// Rate-control mode and its required fields (spec §6: "CQP requires {qpI, qpP, qpB}, VBR
/// requires avg + max").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateControl {
    Cqp { qp_i: u8, qp_p: u8, qp_b: u8 },
    Vbr { avg_bitrate_bps: u64, max_bitrate_bps: u64 },
    Cbr { bitrate_bps: u64 },
}

/// Validated encoder backend configuration (spec §6 "Encoder configuration").
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub codec: Codec,
    pub preset: String,
    pub rate_control: RateControl,
    pub width: i64,
    pub height: i64,
    /// Codec level in tenths (e.g. 41 = level 4.1).
    pub level: Option<u32>,
    pub vbv_size_bits: Option<u64>,
    pub bframes: u32,
    pub gop: u32,
    pub bluray: bool,
    pub lossless: bool,
    pub yuv444: bool,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            codec: Codec::H264,
            preset: "default".to_string(),
            rate_control: RateControl::Cqp { qp_i: 21, qp_p: 23, qp_b: 25 },
            width: 1920,
            height: 1080,
            level: None,
            vbv_size_bits: None,
            bframes: 3,
            gop: 30,
            bluray: false,
            lossless: false,
            yuv444: false,
        }
    }
}

impl EncoderConfig {
    /// Validates frame dimensions and applies the `bluray`/`lossless`/`yuv444` derived-field
    /// rules from spec §6.
    ///
    /// The frame-dimension check is `width <= 0 || height <= 0`. The original implementation's
    /// equivalent check reads `width < 0 && height < 0`, which only rejects a resolution when
    /// *both* dimensions are negative — evidently a bug against its own "invalid resolution"
    /// comment (SPEC_FULL.md §9 Open Question). This repository implements the evidently
    /// intended check rather than reproducing the inversion.
    pub fn validate(&mut self) -> Result<(), TranscodeError> {
        if self.width <= 0 || self.height <= 0 {
            return Err(TranscodeError::UnsupportedParam {
                field: "width/height",
                reason: format!("invalid resolution {}x{}", self.width, self.height),
            });
        }

        if self.lossless {
            if self.codec != Codec::H264 {
                return Err(TranscodeError::UnsupportedParam {
                    field: "lossless",
                    reason: "lossless mode requires H.264".to_string(),
                });
            }
            self.rate_control = RateControl::Cqp { qp_i: 0, qp_p: 0, qp_b: 0 };
        }

        if self.bluray {
            let level = self.level.unwrap_or(41).min(41);
            self.level = Some(level);

            let max_bitrate = match &mut self.rate_control {
                RateControl::Vbr { max_bitrate_bps, .. } => {
                    *max_bitrate_bps = (*max_bitrate_bps).min(40_000_000);
                    *max_bitrate_bps
                }
                RateControl::Cbr { bitrate_bps } => {
                    *bitrate_bps = (*bitrate_bps).min(40_000_000);
                    *bitrate_bps
                }
                RateControl::Cqp { .. } => 40_000_000,
            };
            self.vbv_size_bits = Some(self.vbv_size_bits.unwrap_or(max_bitrate).min(max_bitrate));

            if self.bframes > 3 {
                tracing::warn!("bluray: clamping bframes {} -> 3", self.bframes);
                self.bframes = 3;
            }
            let gop_unit = self.bframes + 1;
            let max_gop = (30 / gop_unit).max(1) * gop_unit;
            if self.gop > max_gop {
                tracing::warn!("bluray: snapping gop {} -> {} (multiple of {})", self.gop, max_gop, gop_unit);
                self.gop = max_gop;
            }
        }

        if self.yuv444 && self.codec != Codec::Hevc && self.codec != Codec::H264 {
            // Every codec variant modeled here supports a 4:4:4 high profile; this branch exists
            // so a future codec addition is forced to decide its own yuv444 handling.
            return Err(TranscodeError::UnsupportedParam {
                field: "yuv444",
                reason: "no 4:4:4 profile defined for this codec".to_string(),
            });
        }

        Ok(())
    }

    /// `true` when `yuv444` selects the high-444 profile / chroma-format 3 (spec §6).
    pub fn chroma_format(&self) -> u8 {
        if self.yuv444 {
            3
        } else {
            1
        }
    }
}

/// The CLI-facing aggregate: output path, AFS config, encoder config, and optional sidecar file
/// paths. Nests the two config types above following the teacher's own config-module nesting
/// style (SPEC_FULL.md §10.2).
#[derive(Debug, Clone)]
pub struct TranscodeConfig {
    pub output: std::path::PathBuf,
    pub afs: AfsConfig,
    pub encoder: EncoderConfig,
    pub timecode_path: Option<std::path::PathBuf>,
    pub log_path: Option<std::path::PathBuf>,
}

impl TranscodeConfig {
    pub fn validate(&mut self) -> Result<(), TranscodeError> {
        self.afs.validate()?;
        self.encoder.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_matches_documented_table() {
        let cfg = AfsConfig::default();
        assert_eq!(cfg.method_switch, 64);
        assert_eq!(cfg.coeff_shift, 119);
        assert!(cfg.shift);
        assert!(cfg.drop);
        assert!(!cfg.smooth);
    }

    #[test]
    fn shift_false_force_clears_drop_and_smooth() {
        let mut cfg = AfsConfig::from_preset(AfsPreset::Double);
        cfg.shift = false;
        cfg.validate().unwrap();
        assert!(!cfg.drop);
        assert!(!cfg.smooth);
    }

    #[test]
    fn invalid_resolution_is_rejected_without_the_original_double_negative_bug() {
        let mut cfg = EncoderConfig { width: 0, height: 1080, ..EncoderConfig::default() };
        assert!(matches!(
            cfg.validate(),
            Err(TranscodeError::UnsupportedParam { field: "width/height", .. })
        ));
        // A single negative dimension alone must already fail -- the original's buggy
        // `&&`-of-negatives check would have let this through.
        let mut cfg = EncoderConfig { width: -4, height: 1080, ..EncoderConfig::default() };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bluray_clamps_bitrate_and_snaps_gop() {
        let mut cfg = EncoderConfig {
            bluray: true,
            rate_control: RateControl::Vbr { avg_bitrate_bps: 60_000_000, max_bitrate_bps: 60_000_000 },
            bframes: 5,
            gop: 100,
            ..EncoderConfig::default()
        };
        cfg.validate().unwrap();
        assert_eq!(cfg.level, Some(41));
        assert!(matches!(cfg.rate_control, RateControl::Vbr { max_bitrate_bps: 40_000_000, .. }));
        assert_eq!(cfg.bframes, 3);
        assert_eq!(cfg.gop % (cfg.bframes + 1), 0);
        assert!(cfg.gop <= 30);
    }

    #[test]
    fn lossless_requires_h264_and_forces_zero_cqp() {
        let mut cfg = EncoderConfig { lossless: true, codec: Codec::Hevc, ..EncoderConfig::default() };
        assert!(cfg.validate().is_err());

        let mut cfg = EncoderConfig { lossless: true, codec: Codec::H264, ..EncoderConfig::default() };
        cfg.validate().unwrap();
        assert!(matches!(cfg.rate_control, RateControl::Cqp { qp_i: 0, qp_p: 0, qp_b: 0 }));
    }
}

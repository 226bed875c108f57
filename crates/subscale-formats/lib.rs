//! # subscale-formats
//!
//! Subtitle format detection and conversion. Every supported input converts
//! to a 1080p-ready ASS document: SRT (and everything that converts to SRT —
//! WebVTT, TTML/XML captions, Bilibili/YouTube JSON dumps) goes through the
//! SRT→ASS builder, while native ASS input is resampled in place by
//! [`subscale_core`].
//!
//! ```rust
//! use subscale_core::ResampleConfig;
//! use subscale_formats::{convert_str, SubtitleFormat};
//!
//! let srt = "1\n00:00:01,000 --> 00:00:02,000\nHello\n\n";
//! let ass = convert_str(SubtitleFormat::Srt, srt, &ResampleConfig::default()).unwrap();
//! assert!(ass.contains("[Events]"));
//! ```
//!
//! File I/O lives here rather than in the core: [`convert_path`] is the
//! path-taking entry point, [`convert_str`] the in-memory one.

mod entities;
pub mod json;
pub mod srt;
pub mod ttml;
pub mod vtt;

use std::fs;
use std::path::Path;

use subscale_core::{ResampleConfig, Resampler};
use thiserror::Error;

/// Result type for conversion operations.
pub type Result<T> = core::result::Result<T, ConvertError>;

/// Errors surfaced by the conversion layer.
///
/// The resampling core itself never fails; everything here is about reading
/// input files or inputs that yield no usable cues.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// Reading the input file failed; fatal for that conversion.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The input's format could not be determined.
    #[error("unsupported subtitle format: {0}")]
    UnsupportedFormat(String),

    /// The input claimed to be a known format but could not be parsed.
    #[error("{format} parse failed: {reason}")]
    Parse {
        /// Format being parsed
        format: &'static str,
        /// What went wrong
        reason: String,
    },

    /// The input parsed but contained no usable subtitle cues.
    #[error("no usable cues found in {0} input")]
    NoCues(&'static str),
}

/// Supported subtitle formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubtitleFormat {
    /// Advanced SubStation Alpha (.ass/.ssa) — resampled, not converted
    Ass,
    /// SubRip (.srt)
    Srt,
    /// WebVTT (.vtt)
    WebVtt,
    /// TTML or caption XML (.ttml/.xml)
    Ttml,
    /// Bilibili/YouTube caption JSON (.json)
    Json,
}

impl SubtitleFormat {
    /// Detect format from a file extension.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "ass" | "ssa" => Some(Self::Ass),
            "srt" => Some(Self::Srt),
            "vtt" | "webvtt" => Some(Self::WebVtt),
            "ttml" | "xml" => Some(Self::Ttml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    /// Best-effort detection from content shape, for inputs with no usable
    /// extension.
    #[must_use]
    pub fn from_content(content: &str) -> Option<Self> {
        let trimmed = content.trim_start_matches('\u{feff}').trim_start();
        if trimmed.contains("[Script Info]") || trimmed.contains("[Events]") {
            Some(Self::Ass)
        } else if trimmed.starts_with("WEBVTT") {
            Some(Self::WebVtt)
        } else if trimmed.starts_with('<') {
            Some(Self::Ttml)
        } else if trimmed.starts_with('{') || trimmed.starts_with('[') {
            Some(Self::Json)
        } else if trimmed.contains("-->") {
            Some(Self::Srt)
        } else {
            None
        }
    }

    /// The standard file extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Ass => "ass",
            Self::Srt => "srt",
            Self::WebVtt => "vtt",
            Self::Ttml => "ttml",
            Self::Json => "json",
        }
    }
}

/// Convert in-memory subtitle text of a known format into a final ASS
/// document rendered against `config`.
///
/// # Errors
///
/// Returns [`ConvertError::Parse`] or [`ConvertError::NoCues`] when the
/// input cannot be turned into cues. ASS and SRT inputs never fail.
pub fn convert_str(
    format: SubtitleFormat,
    content: &str,
    config: &ResampleConfig,
) -> Result<String> {
    // The resampler strips its own BOM; do the same for the converters
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    match format {
        SubtitleFormat::Ass => Ok(Resampler::new(config.clone()).resample(content)),
        SubtitleFormat::Srt => Ok(srt::to_ass(content, config)),
        SubtitleFormat::WebVtt => Ok(srt::to_ass(&vtt::to_srt(content)?, config)),
        SubtitleFormat::Ttml => Ok(srt::to_ass(&ttml::to_srt(content)?, config)),
        SubtitleFormat::Json => Ok(srt::to_ass(&json::to_srt(content)?, config)),
    }
}

/// Read a subtitle file and convert it into a final ASS document.
///
/// Format is taken from the file extension, falling back to content sniffing
/// for unknown or missing extensions.
///
/// # Errors
///
/// Returns [`ConvertError::Io`] when the file cannot be read,
/// [`ConvertError::UnsupportedFormat`] when neither extension nor content
/// identify a format, and the [`convert_str`] errors otherwise.
pub fn convert_path(path: &Path, config: &ResampleConfig) -> Result<String> {
    let content = fs::read_to_string(path)?;
    let format = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(SubtitleFormat::from_extension)
        .or_else(|| SubtitleFormat::from_content(&content))
        .ok_or_else(|| ConvertError::UnsupportedFormat(path.display().to_string()))?;
    log::debug!("converting {} as {format:?}", path.display());
    convert_str(format, &content, config)
}

//! Scaling ratios and the numeric formatting contract shared by every
//! resampler stage.
//!
//! A [`ScaleContext`] is derived once per document from the source and target
//! [`Resolution`] and threaded by reference through the section rewriter and
//! the tag-scaler; nothing in this crate keeps ratio state anywhere else.

use core::fmt;
use core::str::FromStr;

use thiserror::Error;

/// Tolerance when deciding whether a scaled value is a whole number.
const WHOLE_EPSILON: f64 = 1e-6;

/// Tolerance when comparing ratios against 1.0.
const RATIO_EPSILON: f64 = 1e-9;

/// A pixel resolution pair, as declared by `PlayResX`/`PlayResY`.
///
/// Parses from the conventional `WIDTHxHEIGHT` notation:
///
/// ```rust
/// use subscale_core::Resolution;
///
/// let res: Resolution = "1920x1080".parse().unwrap();
/// assert_eq!(res, Resolution::FULL_HD);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resolution {
    /// Horizontal resolution in pixels
    pub width: u32,
    /// Vertical resolution in pixels
    pub height: u32,
}

impl Resolution {
    /// 1920x1080, the default resampling target.
    pub const FULL_HD: Self = Self::new(1920, 1080);

    /// 1280x720, the default assumed for scripts that declare no `PlayRes`.
    pub const HD: Self = Self::new(1280, 720);

    /// Create a resolution from width and height in pixels.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width-to-height ratio.
    #[must_use]
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Error returned when parsing a `WIDTHxHEIGHT` resolution string fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid resolution `{0}`, expected WIDTHxHEIGHT (e.g. 1920x1080)")]
pub struct ParseResolutionError(pub String);

impl FromStr for Resolution {
    type Err = ParseResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseResolutionError(s.to_string());
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(err)?;
        let width: u32 = w.trim().parse().map_err(|_| err())?;
        let height: u32 = h.trim().parse().map_err(|_| err())?;
        if width == 0 || height == 0 {
            return Err(err());
        }
        Ok(Self { width, height })
    }
}

/// The pair of scale ratios derived from a source and target resolution,
/// plus the ratios derived from them.
///
/// `ratio_x`/`ratio_y` are target over source per axis. The geometric mean of
/// the two is used for properties that should scale isotropically even under
/// non-uniform axis scaling (border thickness, blur), and the aspect delta
/// (target aspect over source aspect) for percentage fields that only need
/// correction when the picture shape itself changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleContext {
    /// Horizontal ratio: `target.width / source.width`
    pub ratio_x: f64,
    /// Vertical ratio: `target.height / source.height`
    pub ratio_y: f64,
    mean: f64,
    aspect: f64,
}

impl ScaleContext {
    /// Derive the context for scaling from `source` to `target`.
    #[must_use]
    pub fn new(source: Resolution, target: Resolution) -> Self {
        let ratio_x = f64::from(target.width) / f64::from(source.width);
        let ratio_y = f64::from(target.height) / f64::from(source.height);
        Self {
            ratio_x,
            ratio_y,
            mean: (ratio_x * ratio_y).sqrt(),
            aspect: target.aspect() / source.aspect(),
        }
    }

    /// Geometric mean of the two axis ratios.
    #[must_use]
    pub fn ratio_mean(&self) -> f64 {
        self.mean
    }

    /// Target aspect ratio over source aspect ratio (1.0 when the picture
    /// shape is unchanged).
    #[must_use]
    pub fn aspect_delta(&self) -> f64 {
        self.aspect
    }

    /// True when both axis ratios are 1 within tolerance.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        (self.ratio_x - 1.0).abs() <= RATIO_EPSILON && (self.ratio_y - 1.0).abs() <= RATIO_EPSILON
    }
}

/// Format a scaled value per the engine's number contract: an integer literal
/// when the value is within epsilon of a whole number, otherwise two
/// fractional digits with trailing zeros and a dangling decimal point
/// stripped.
#[must_use]
pub fn fmt_scaled(value: f64) -> String {
    if (value - value.round()).abs() < WHOLE_EPSILON {
        #[allow(clippy::cast_possible_truncation)]
        return format!("{}", value.round() as i64);
    }
    let s = format!("{value:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Round half-up to the nearest integer, matching the behaviour expected for
/// pixel fields like font sizes and margins.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Scale a raw numeric field and round it half-up, leaving the field
/// untouched when it does not parse as a number.
#[must_use]
pub(crate) fn scale_rounded(raw: &str, ratio: f64) -> Option<String> {
    let v: f64 = raw.trim().parse().ok()?;
    Some(round_half_up(v * ratio).to_string())
}

/// Scale a raw numeric field and format it per the number contract, leaving
/// the field untouched when it does not parse as a number.
#[must_use]
pub(crate) fn scale_trimmed(raw: &str, ratio: f64) -> Option<String> {
    let v: f64 = raw.trim().parse().ok()?;
    Some(fmt_scaled(v * ratio))
}

//! # subscale-core
//!
//! Resolution resampling engine for ASS (Advanced `SubStation` Alpha) subtitle
//! scripts. Rescales a script from its authored `PlayResX`/`PlayResY` to a
//! target resolution, rewriting the style table, per-event margins and the
//! numeric arguments of inline override tags (`\pos`, `\move`, `\clip`,
//! drawing paths, nested `\t` transforms, ...) while leaving everything it
//! does not recognize untouched.
//!
//! The engine is a pure text transform: it takes a script as a string and
//! returns the rewritten script as a string. File I/O, format detection and
//! conversion from other subtitle formats live in sibling crates.
//!
//! ## Quick Start
//!
//! ```rust
//! use subscale_core::Resampler;
//!
//! let script = "\
//! [Script Info]
//! PlayResX: 1280
//! PlayResY: 720
//!
//! [Events]
//! Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
//! Dialogue: 0,0:00:00.00,0:00:05.00,Default,,0,0,0,,{\\pos(100,200)}Hello
//! ";
//!
//! let output = Resampler::default().resample(script);
//! assert!(output.contains("PlayResX: 1920"));
//! assert!(output.contains("\\pos(150,300)"));
//! ```
//!
//! ## Guarantees
//!
//! - No fatal-error path: malformed lines and unparseable tag arguments are
//!   emitted byte-for-byte unchanged, never rejected.
//! - No global state: all scaling flows through an explicit [`ScaleContext`].
//! - Output is a complete text blob with every line terminated according to
//!   the configured [`Newline`] policy, including the last one.

#![deny(unsafe_code)]

pub mod resample;
pub mod scale;
pub mod tags;

pub use resample::{
    BorderScale, Newline, PercentScale, ResampleConfig, ResamplePolicy, Resampler, DEFAULT_FONT,
};
pub use scale::{ParseResolutionError, Resolution, ScaleContext};
pub use tags::TagScaler;

/// Crate version for runtime compatibility checks
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Script resampling: configuration, policy and the section walk.
//!
//! [`Resampler`] is the single entry point: it takes a whole ASS document as
//! a string, resolves the authored resolution, forces the target resolution
//! into `[Script Info]`, rewrites the style table and every dialogue event,
//! and re-terminates the output per the configured newline policy. Sections
//! it does not know pass through verbatim.

pub(crate) mod events;
pub(crate) mod script_info;
pub(crate) mod styles;

use crate::scale::{Resolution, ScaleContext};
use crate::tags::TagScaler;
use styles::FormatSpec;

/// Default font forced onto every style and `\fn` override.
pub const DEFAULT_FONT: &str = "Open Sans Semibold";

/// How `\fscx`/`\fscy` percentage tags are treated.
///
/// Percentages are resolution-independent, so the default leaves them alone;
/// the aspect-ratio variant widens `\fscx` (and the style table's `ScaleX`)
/// by targetAspect/sourceAspect when the picture shape changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PercentScale {
    /// Leave percentage tags untouched.
    #[default]
    Keep,
    /// Multiply `\fscx` by the aspect-ratio delta; `\fscy` stays untouched.
    AspectRatio,
}

/// Which ratio scales border and shadow thickness (`\bord`, `\shad`, and the
/// style table's `Outline`/`Shadow`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BorderScale {
    /// Geometric mean of the axis ratios: thickness stays isotropic even
    /// under non-uniform scaling.
    #[default]
    GeometricMean,
    /// Plain vertical ratio.
    Vertical,
}

/// Output line-ending convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Newline {
    /// Unix line feeds.
    #[default]
    Lf,
    /// Windows/Aegisub-style carriage return + line feed.
    CrLf,
}

impl Newline {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

/// Rendering conventions the engine cannot decide on its own, made explicit
/// per invocation rather than baked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResamplePolicy {
    /// `\fscx`/`\fscy` handling.
    pub percent_scale: PercentScale,
    /// Border/shadow thickness ratio.
    pub border_scale: BorderScale,
    /// Output line endings.
    pub newline: Newline,
    /// Prefix the output with a UTF-8 byte-order mark.
    pub bom: bool,
}

impl ResamplePolicy {
    /// The ratio border/shadow values scale by under this policy.
    #[must_use]
    pub fn border_ratio(&self, ctx: &ScaleContext) -> f64 {
        match self.border_scale {
            BorderScale::GeometricMean => ctx.ratio_mean(),
            BorderScale::Vertical => ctx.ratio_y,
        }
    }
}

/// Everything the resampler needs to know about the target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ResampleConfig {
    /// Resolution the script is rewritten to.
    pub target: Resolution,
    /// Resolution assumed when the script declares no `PlayRes`.
    pub fallback_source: Resolution,
    /// Font forced onto every style and `\fn` override.
    pub font: String,
    /// Policy knobs; see [`ResamplePolicy`].
    pub policy: ResamplePolicy,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            target: Resolution::FULL_HD,
            fallback_source: Resolution::HD,
            font: DEFAULT_FONT.to_string(),
            policy: ResamplePolicy::default(),
        }
    }
}

/// Rescales ASS documents to the configured target resolution.
///
/// Operates purely on in-memory text; reading and writing files is the
/// caller's concern. See the crate docs for an example.
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    config: ResampleConfig,
}

/// Section kinds the walker treats specially.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    ScriptInfo,
    Styles,
    Events,
    Other,
}

impl Section {
    fn classify(header: &str) -> Self {
        let name = header
            .trim()
            .trim_start_matches('[')
            .trim_end_matches(']')
            .trim()
            .to_ascii_lowercase();
        match name.as_str() {
            "script info" => Self::ScriptInfo,
            "v4+ styles" | "v4 styles" | "styles" => Self::Styles,
            "events" => Self::Events,
            _ => Self::Other,
        }
    }
}

/// Bookkeeping for the styles section currently being emitted, so the
/// reference style can be inserted once the section ends.
struct StylesBlock {
    spec: Option<FormatSpec>,
    header_idx: usize,
    format_idx: Option<usize>,
    last_style_idx: Option<usize>,
    has_reference: bool,
}

impl Resampler {
    /// Create a resampler with the given configuration.
    #[must_use]
    pub const fn new(config: ResampleConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ResampleConfig {
        &self.config
    }

    /// Rescale a whole ASS document.
    ///
    /// Never fails: unknown sections, malformed lines and unparseable tag
    /// arguments all pass through unchanged. The returned text always ends
    /// with a line terminator.
    #[must_use]
    pub fn resample(&self, source: &str) -> String {
        let mut lines = split_lines(source);

        let source_res = script_info::detect(&lines, self.config.fallback_source);
        let ctx = ScaleContext::new(source_res, self.config.target);
        log::debug!(
            "resampling {source_res} -> {} (x {:.4}, y {:.4})",
            self.config.target,
            ctx.ratio_x,
            ctx.ratio_y
        );
        script_info::force(&mut lines, self.config.target);

        let lines = self.rewrite_sections(lines, &ctx);
        self.finish(&lines)
    }

    fn rewrite_sections(&self, lines: Vec<String>, ctx: &ScaleContext) -> Vec<String> {
        let scaler = TagScaler::new(ctx, &self.config.policy).with_font(&self.config.font);
        let reference = styles::reference_style(&self.config);
        let default_events = FormatSpec::default_events();

        let mut out: Vec<String> = Vec::with_capacity(lines.len() + 1);
        let mut section = Section::Other;
        let mut styles_block: Option<StylesBlock> = None;
        let mut reference_injected = false;
        let mut events_spec: Option<FormatSpec> = None;

        for line in lines {
            let trimmed = line.trim();
            if trimmed.starts_with('[') && trimmed.ends_with(']') {
                flush_styles(&mut out, styles_block.take(), &mut reference_injected, &reference);
                section = Section::classify(trimmed);
                out.push(line);
                if section == Section::Styles {
                    styles_block = Some(StylesBlock {
                        spec: None,
                        header_idx: out.len() - 1,
                        format_idx: None,
                        last_style_idx: None,
                        has_reference: false,
                    });
                }
                continue;
            }

            match section {
                Section::Styles => {
                    let Some(block) = styles_block.as_mut() else {
                        out.push(line);
                        continue;
                    };
                    let lower = trimmed.to_ascii_lowercase();
                    if lower.starts_with("format:") {
                        block.spec = FormatSpec::parse(&line);
                        out.push(line);
                        block.format_idx = Some(out.len() - 1);
                    } else if lower.starts_with("style:") {
                        let spec = block.spec.clone().unwrap_or_else(FormatSpec::default_styles);
                        let rewritten = styles::rewrite_style(&line, &spec, ctx, &self.config);
                        if rewritten == reference {
                            block.has_reference = true;
                        }
                        out.push(rewritten);
                        block.last_style_idx = Some(out.len() - 1);
                    } else {
                        out.push(line);
                    }
                }
                Section::Events => {
                    let lower = trimmed.to_ascii_lowercase();
                    if lower.starts_with("format:") {
                        events_spec = FormatSpec::parse(&line);
                        out.push(line);
                    } else if lower.starts_with("dialogue:") {
                        let spec = events_spec.as_ref().unwrap_or(&default_events);
                        match events::rewrite_dialogue(&line, spec, ctx, &scaler) {
                            Some(rewritten) => out.push(rewritten),
                            None => out.push(line),
                        }
                    } else {
                        out.push(line);
                    }
                }
                Section::ScriptInfo | Section::Other => out.push(line),
            }
        }
        flush_styles(&mut out, styles_block.take(), &mut reference_injected, &reference);

        out
    }

    fn finish(&self, lines: &[String]) -> String {
        let sep = self.config.policy.newline.as_str();
        let mut out =
            String::with_capacity(lines.iter().map(|l| l.len() + sep.len()).sum::<usize>() + 3);
        if self.config.policy.bom {
            out.push('\u{feff}');
        }
        for line in lines {
            out.push_str(line);
            out.push_str(sep);
        }
        out
    }
}

/// Strip a leading BOM, normalize CRLF/CR to LF and split into logical lines
/// (without the trailing empty line a terminated document produces).
fn split_lines(source: &str) -> Vec<String> {
    let text = source.strip_prefix('\u{feff}').unwrap_or(source);
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut lines: Vec<String> = text.split('\n').map(String::from).collect();
    if lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

/// Insert the reference style once per document when a styles section ends:
/// after the last style line, else after `Format:`, else after the header.
fn flush_styles(
    out: &mut Vec<String>,
    block: Option<StylesBlock>,
    injected: &mut bool,
    reference: &str,
) {
    let Some(block) = block else { return };
    if *injected {
        return;
    }
    if block.has_reference {
        *injected = true;
        return;
    }
    let at = block
        .last_style_idx
        .or(block.format_idx)
        .map_or(block.header_idx + 1, |i| i + 1);
    out.insert(at.min(out.len()), reference.to_string());
    *injected = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn section_classification() {
        assert_eq!(Section::classify("[Script Info]"), Section::ScriptInfo);
        assert_eq!(Section::classify("[V4+ Styles]"), Section::Styles);
        assert_eq!(Section::classify("[v4 styles]"), Section::Styles);
        assert_eq!(Section::classify("[Events]"), Section::Events);
        assert_eq!(Section::classify("[Fonts]"), Section::Other);
    }

    #[test]
    fn split_lines_normalizes_endings_and_bom() {
        assert_eq!(split_lines("a\r\nb\rc\n"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("\u{feff}a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines(""), Vec::<String>::new());
    }

    #[test]
    fn finish_honours_newline_and_bom_policy() {
        let mut config = ResampleConfig::default();
        config.policy.newline = Newline::CrLf;
        config.policy.bom = true;
        let resampler = Resampler::new(config);
        let out = resampler.finish(&["a".to_string(), "b".to_string()]);
        assert_eq!(out, "\u{feff}a\r\nb\r\n");
    }

    #[test]
    fn empty_document_gains_header_and_target_resolution() {
        let out = Resampler::default().resample("");
        assert_eq!(out, "[Script Info]\nPlayResX: 1920\nPlayResY: 1080\n");
    }
}

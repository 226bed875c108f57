//! Style-table rewriting driven by the section's `Format:` declaration.

use super::ResampleConfig;
use crate::scale::{scale_rounded, scale_trimmed, ScaleContext};

/// Ordered, lowercased field names declared by a `Format:` line.
///
/// Structured lines in the same section split into exactly this many
/// comma-separated fields, the last field absorbing any remaining commas
/// (dialogue text legitimately contains them).
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FormatSpec {
    fields: Vec<String>,
}

impl FormatSpec {
    /// Parse a `Format: A, B, C` line. Returns `None` without a separator.
    pub fn parse(line: &str) -> Option<Self> {
        let (_, payload) = line.split_once(':')?;
        let fields = payload
            .split(',')
            .map(|f| f.trim().to_ascii_lowercase())
            .collect();
        Some(Self { fields })
    }

    /// The standard V4+ style field order, assumed when a styles section
    /// carries no `Format:` line of its own.
    pub fn default_styles() -> Self {
        Self {
            fields: [
                "name",
                "fontname",
                "fontsize",
                "primarycolour",
                "secondarycolour",
                "outlinecolour",
                "backcolour",
                "bold",
                "italic",
                "underline",
                "strikeout",
                "scalex",
                "scaley",
                "spacing",
                "angle",
                "borderstyle",
                "outline",
                "shadow",
                "alignment",
                "marginl",
                "marginr",
                "marginv",
                "encoding",
            ]
            .map(str::to_string)
            .to_vec(),
        }
    }

    /// The standard event field order, assumed when an events section carries
    /// no `Format:` line of its own.
    pub fn default_events() -> Self {
        Self {
            fields: [
                "layer", "start", "end", "style", "name", "marginl", "marginr", "marginv",
                "effect", "text",
            ]
            .map(str::to_string)
            .to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Column index of a lowercase field name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f == name)
    }

    /// Split a structured-line payload into exactly `len()` trimmed fields;
    /// the final field absorbs any remaining commas. Shorter payloads yield
    /// fewer fields — the caller decides whether to pad or pass through.
    pub fn split_payload<'p>(&self, payload: &'p str) -> Vec<&'p str> {
        payload.splitn(self.len(), ',').map(str::trim).collect()
    }
}

/// Rewrite one `Style:` line: force the target font, scale the pixel-valued
/// columns, and leave anything unparseable as it was. Short payloads are
/// padded with empty fields so the named columns still line up.
pub(crate) fn rewrite_style(
    line: &str,
    spec: &FormatSpec,
    ctx: &ScaleContext,
    config: &ResampleConfig,
) -> String {
    let Some((_, payload)) = line.split_once(':') else {
        return line.to_string();
    };
    let mut parts: Vec<String> = spec
        .split_payload(payload)
        .into_iter()
        .map(String::from)
        .collect();
    while parts.len() < spec.len() {
        parts.push(String::new());
    }

    if let Some(i) = spec.index_of("fontname") {
        parts[i] = config.font.clone();
    }
    // Font size is a vertical pixel metric; round like the margins.
    if let Some(i) = spec.index_of("fontsize").or_else(|| spec.index_of("size")) {
        if let Some(v) = scale_rounded(&parts[i], ctx.ratio_y) {
            parts[i] = v;
        }
    }
    let border = config.policy.border_ratio(ctx);
    for name in ["outline", "shadow"] {
        if let Some(i) = spec.index_of(name) {
            if let Some(v) = scale_trimmed(&parts[i], border) {
                parts[i] = v;
            }
        }
    }
    // Horizontal percentage only needs correcting when the picture shape
    // changes; scaley is a percentage too and never scales.
    if let Some(i) = spec.index_of("scalex") {
        if let Some(v) = scale_trimmed(&parts[i], ctx.aspect_delta()) {
            parts[i] = v;
        }
    }
    for (name, ratio) in [
        ("marginl", ctx.ratio_x),
        ("marginr", ctx.ratio_x),
        ("marginv", ctx.ratio_y),
    ] {
        if let Some(i) = spec.index_of(name) {
            if let Some(v) = scale_rounded(&parts[i], ratio) {
                parts[i] = v;
            }
        }
    }

    format!("Style: {}", parts.join(","))
}

/// The fixed reference style appended to every rewritten style table: a
/// zero-scale marker at the target vertical resolution, invisible when
/// rendered but recording the resolution the script was resampled for.
pub(crate) fn reference_style(config: &ResampleConfig) -> String {
    format!(
        "Style: res,{},{},&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,0,0,0,0,1,2,2,2,10,10,10,1",
        config.font, config.target.height
    )
}

//! Dialogue-line rewriting: margins plus the free-text tag payload.

use super::styles::FormatSpec;
use crate::scale::{scale_rounded, ScaleContext};
use crate::tags::TagScaler;

/// Rewrite one `Dialogue:` line. Returns `None` when the payload has fewer
/// fields than the events `Format:` declares — the caller emits the original
/// line untouched rather than guessing at column positions.
pub(crate) fn rewrite_dialogue(
    line: &str,
    spec: &FormatSpec,
    ctx: &ScaleContext,
    scaler: &TagScaler<'_>,
) -> Option<String> {
    let (_, payload) = line.split_once(':')?;
    let split = spec.split_payload(payload);
    if split.len() != spec.len() {
        return None;
    }
    let mut parts: Vec<String> = split.into_iter().map(String::from).collect();

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

    let text_idx = spec.index_of("text").unwrap_or(parts.len() - 1);
    parts[text_idx] = scaler.scale_event_text(&parts[text_idx]);

    Some(format!("Dialogue: {}", parts.join(",")))
}

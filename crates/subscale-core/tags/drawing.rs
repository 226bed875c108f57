//! Drawing-path tokenization and coordinate scaling.
//!
//! ASS vector drawings are a whitespace-separated stream of single-letter
//! commands and numeric coordinates, used both as the vector argument of
//! `\clip`/`\iclip` and as the literal payload following a `\p<n>`
//! drawing-mode tag. Coordinates alternate x/y starting with x; every command
//! letter resets the alternation so the next number is an x again.

use crate::scale::{fmt_scaled, ScaleContext};

/// Path command alphabet: move, move-no-close, line, bezier, b-spline,
/// extend-spline, close.
fn is_command(token: &str) -> bool {
    let mut chars = token.chars();
    matches!(
        (chars.next(), chars.next()),
        (Some('m' | 'n' | 'l' | 'b' | 's' | 'p' | 'c'), None)
    )
}

/// Scale every coordinate in a raw path string by the axis-appropriate ratio.
///
/// Tokens that are neither commands nor parseable numbers pass through
/// unchanged, as does a blank input. Interior whitespace is normalized to
/// single spaces (ASS ignores the exact amount between path tokens); leading
/// and trailing whitespace is kept so surrounding text is not disturbed.
pub(crate) fn scale_path(path: &str, ctx: &ScaleContext) -> String {
    if path.trim().is_empty() {
        return path.to_string();
    }

    let mut out = Vec::new();
    let mut x_next = true;
    for token in path.split_whitespace() {
        if is_command(token) {
            x_next = true;
            out.push(token.to_string());
        } else if let Ok(value) = token.parse::<f64>() {
            let ratio = if x_next { ctx.ratio_x } else { ctx.ratio_y };
            out.push(fmt_scaled(value * ratio));
            x_next = !x_next;
        } else {
            out.push(token.to_string());
        }
    }

    let leading = &path[..path.len() - path.trim_start().len()];
    let trailing = &path[path.trim_end().len()..];
    format!("{leading}{}{trailing}", out.join(" "))
}

//! Inline override-tag scaling.
//!
//! A dialogue payload interleaves plain text with brace-delimited override
//! blocks (`{\pos(10,20)\fs24}`). The scaler walks the payload, rewrites the
//! numeric arguments of recognized tags inside each block, and leaves
//! everything else — plain text, unrecognized tags, brace structure — exactly
//! as it found it.
//!
//! Blocks are lexed as a tag stream rather than rewritten by repeated regex
//! passes: each `\` starts a tag whose argument is either a
//! balanced-parenthesis group or a bare numeric token. Nested `\t(...)`
//! transforms recurse into their trailing tag string, so arbitrarily deep
//! nesting terminates structurally. A `\p<n>` tag toggles drawing mode, under
//! which the plain text that follows the block is scaled as a vector path.
//!
//! There is no error path here. A tag whose argument does not parse is
//! emitted byte-for-byte unchanged.

mod drawing;

use crate::resample::{PercentScale, ResamplePolicy};
use crate::scale::{fmt_scaled, round_half_up, ScaleContext};

/// Rewrites the override tags of one document, holding the scale context and
/// policy by reference.
///
/// ```rust
/// use subscale_core::{Resolution, ResamplePolicy, ScaleContext, TagScaler};
///
/// let ctx = ScaleContext::new(Resolution::HD, Resolution::FULL_HD);
/// let policy = ResamplePolicy::default();
/// let scaler = TagScaler::new(&ctx, &policy);
/// assert_eq!(
///     scaler.scale_event_text(r"{\pos(100,200)}Hi"),
///     r"{\pos(150,300)}Hi"
/// );
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TagScaler<'a> {
    ctx: &'a ScaleContext,
    policy: &'a ResamplePolicy,
    font: Option<&'a str>,
}

impl<'a> TagScaler<'a> {
    /// Create a scaler over the given context and policy.
    #[must_use]
    pub const fn new(ctx: &'a ScaleContext, policy: &'a ResamplePolicy) -> Self {
        Self {
            ctx,
            policy,
            font: None,
        }
    }

    /// Also rewrite every `\fn<name>` tag to the given font.
    #[must_use]
    pub const fn with_font(mut self, font: &'a str) -> Self {
        self.font = Some(font);
        self
    }

    /// Scale a full dialogue text payload: every override block plus any
    /// plain text that a preceding `\p<n>` tag turned into a drawing.
    #[must_use]
    pub fn scale_event_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len() + 16);
        let mut drawing = false;
        let mut rest = text;
        while let Some(open) = rest.find('{') {
            let Some(len) = rest[open..].find('}') else {
                break;
            };
            let close = open + len;
            out.push_str(&self.plain(&rest[..open], drawing));
            out.push('{');
            out.push_str(&self.scale_block(&rest[open + 1..close], &mut drawing));
            out.push('}');
            rest = &rest[close + 1..];
        }
        out.push_str(&self.plain(rest, drawing));
        out
    }

    /// Scale the body of one override block (the text between the braces).
    #[must_use]
    pub fn scale_block_body(&self, body: &str) -> String {
        let mut drawing = false;
        self.scale_block(body, &mut drawing)
    }

    fn plain(&self, segment: &str, drawing: bool) -> String {
        if drawing {
            drawing::scale_path(segment, self.ctx)
        } else {
            segment.to_string()
        }
    }

    fn scale_block(&self, body: &str, drawing: &mut bool) -> String {
        let mut out = String::with_capacity(body.len());
        let mut rest = body;
        while !rest.is_empty() {
            let Some(bs) = rest.find('\\') else {
                out.push_str(rest);
                break;
            };
            out.push_str(&rest[..bs]);
            let after = &rest[bs + 1..];
            let (rendered, consumed) = self.scale_tag(after, drawing);
            out.push_str(&rendered);
            rest = &after[consumed..];
        }
        out
    }

    /// Rewrite one tag. `rest` is the text immediately after the backslash;
    /// returns the rendered replacement (including its backslash) and how many
    /// bytes of `rest` it consumed.
    fn scale_tag(&self, rest: &str, drawing: &mut bool) -> (String, usize) {
        let (rx, ry) = (self.ctx.ratio_x, self.ctx.ratio_y);
        let mean = self.ctx.ratio_mean();
        let border = self.policy.border_ratio(self.ctx);

        // Parenthesized-argument tags. A known name not followed by `(` falls
        // through to the verbatim path like any other unrecognized tag.
        if let Some((inner, consumed)) = paren_arg(rest, "t") {
            return (self.transform(inner), consumed);
        }
        if let Some((inner, consumed)) = paren_arg(rest, "pos") {
            return (self.xy_pair("pos", inner), consumed);
        }
        if let Some((inner, consumed)) = paren_arg(rest, "org") {
            return (self.xy_pair("org", inner), consumed);
        }
        if let Some((inner, consumed)) = paren_arg(rest, "move") {
            return (self.movement(inner), consumed);
        }
        if let Some((inner, consumed)) = paren_arg(rest, "margins") {
            return (self.margin_group(inner), consumed);
        }
        if let Some((inner, consumed)) = paren_arg(rest, "iclip") {
            return (self.clip("iclip", inner), consumed);
        }
        if let Some((inner, consumed)) = paren_arg(rest, "clip") {
            return (self.clip("clip", inner), consumed);
        }

        // Bare-argument tags, longest name first within each family.
        let bare_rules: &[(&str, f64, bool)] = &[
            ("marginl", rx, false),
            ("marginr", rx, false),
            ("marginv", ry, false),
            ("margint", ry, false),
            ("marginb", ry, false),
            ("xbord", rx, false),
            ("ybord", ry, false),
            ("xshad", rx, false),
            ("yshad", ry, false),
            ("bord", border, false),
            ("blur", mean, false),
            ("be", mean, false),
            ("shad", border, false),
            ("fsp", ry, false),
            ("fs", ry, true),
            ("fax", rx, false),
            ("fay", ry, false),
            ("pbo", ry, false),
        ];

        // Percentage scale tags come before the table so `\fscx`/`\fscy`
        // never fall into the `\fs` rule.
        if rest.starts_with("fscx") || rest.starts_with("fscy") {
            if self.policy.percent_scale == PercentScale::AspectRatio && rest.starts_with("fscx") {
                if let Some(hit) = self.bare(rest, "fscx", self.ctx.aspect_delta(), false) {
                    return hit;
                }
            }
            return passthrough(rest);
        }

        for &(name, ratio, round) in bare_rules {
            if rest.starts_with(name) {
                if let Some(hit) = self.bare(rest, name, ratio, round) {
                    return hit;
                }
                return passthrough(rest);
            }
        }

        if let Some(name) = rest.strip_prefix("fn") {
            let end = name.find('\\').unwrap_or(name.len());
            if let (Some(font), false) = (self.font, name[..end].is_empty()) {
                return (format!("\\fn{font}"), 2 + end);
            }
            return (format!("\\fn{}", &name[..end]), 2 + end);
        }

        if let Some(level) = rest.strip_prefix('p') {
            let digits = level.len() - level.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            if digits > 0 {
                *drawing = level[..digits].chars().any(|c| c != '0');
                return (format!("\\p{}", &level[..digits]), 1 + digits);
            }
        }

        passthrough(rest)
    }

    /// Bare numeric tag: `\name<value>`. `None` when no number follows.
    fn bare(&self, rest: &str, name: &str, ratio: f64, round: bool) -> Option<(String, usize)> {
        let (value, len) = bare_number(&rest[name.len()..])?;
        let formatted = if round {
            round_half_up(value * ratio).to_string()
        } else {
            fmt_scaled(value * ratio)
        };
        Some((format!("\\{name}{formatted}"), name.len() + len))
    }

    /// `\pos(x,y)` / `\org(x,y)`.
    fn xy_pair(&self, name: &str, inner: &str) -> String {
        let mut parts = inner.split(',');
        let parsed = (|| {
            let x: f64 = parts.next()?.trim().parse().ok()?;
            let y: f64 = parts.next()?.trim().parse().ok()?;
            parts.next().is_none().then_some((x, y))
        })();
        match parsed {
            Some((x, y)) => format!(
                "\\{name}({},{})",
                fmt_scaled(x * self.ctx.ratio_x),
                fmt_scaled(y * self.ctx.ratio_y)
            ),
            None => format!("\\{name}({inner})"),
        }
    }

    /// `\move(x1,y1,x2,y2[,t1,t2])`: coordinates scale, timings pass through.
    fn movement(&self, inner: &str) -> String {
        let parts: Vec<&str> = inner.split(',').collect();
        let coords: Option<Vec<f64>> = parts
            .iter()
            .take(4)
            .map(|p| p.trim().parse().ok())
            .collect();
        match coords {
            Some(c) if c.len() == 4 => {
                let mut out = format!(
                    "\\move({},{},{},{}",
                    fmt_scaled(c[0] * self.ctx.ratio_x),
                    fmt_scaled(c[1] * self.ctx.ratio_y),
                    fmt_scaled(c[2] * self.ctx.ratio_x),
                    fmt_scaled(c[3] * self.ctx.ratio_y)
                );
                for extra in &parts[4..] {
                    out.push(',');
                    out.push_str(extra);
                }
                out.push(')');
                out
            }
            _ => format!("\\move({inner})"),
        }
    }

    /// `\margins(l,r,t,b)`.
    fn margin_group(&self, inner: &str) -> String {
        let parts: Vec<&str> = inner.split(',').collect();
        let values: Option<Vec<f64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
        match values {
            Some(v) if v.len() == 4 => format!(
                "\\margins({},{},{},{})",
                fmt_scaled(v[0] * self.ctx.ratio_x),
                fmt_scaled(v[1] * self.ctx.ratio_x),
                fmt_scaled(v[2] * self.ctx.ratio_y),
                fmt_scaled(v[3] * self.ctx.ratio_y)
            ),
            _ => format!("\\margins({inner})"),
        }
    }

    /// `\clip(...)` / `\iclip(...)`: rectangle or vector path. A leading
    /// numeric scale level before the path is preserved unscaled.
    fn clip(&self, name: &str, inner: &str) -> String {
        let content = inner.trim();
        if content.chars().any(|c| c.is_ascii_alphabetic()) {
            if let Some((head, tail)) = content.split_once(',') {
                if head.trim().parse::<f64>().is_ok()
                    && tail.chars().any(|c| c.is_ascii_alphabetic())
                {
                    return format!(
                        "\\{name}({},{})",
                        head.trim(),
                        drawing::scale_path(tail, self.ctx)
                    );
                }
            }
            return format!("\\{name}({})", drawing::scale_path(content, self.ctx));
        }

        let parts: Vec<&str> = content.split(',').collect();
        let values: Option<Vec<f64>> = parts.iter().map(|p| p.trim().parse().ok()).collect();
        match values {
            Some(v) if v.len() == 4 => format!(
                "\\{name}({},{},{},{})",
                fmt_scaled(v[0] * self.ctx.ratio_x),
                fmt_scaled(v[1] * self.ctx.ratio_y),
                fmt_scaled(v[2] * self.ctx.ratio_x),
                fmt_scaled(v[3] * self.ctx.ratio_y)
            ),
            _ => format!("\\{name}({inner})"),
        }
    }

    /// `\t([t1,t2,[accel,]]tags)`: leading numeric parameters pass through,
    /// the trailing tag string is scaled recursively.
    fn transform(&self, inner: &str) -> String {
        match inner.find('\\') {
            Some(idx) => {
                let (head, tail) = inner.split_at(idx);
                // Drawing mode cannot leak out of a transform argument.
                let mut drawing = false;
                format!("\\t({head}{})", self.scale_block(tail, &mut drawing))
            }
            None => format!("\\t({inner})"),
        }
    }
}

/// Emit the tag verbatim up to the next backslash.
fn passthrough(rest: &str) -> (String, usize) {
    let end = rest.find('\\').unwrap_or(rest.len());
    (format!("\\{}", &rest[..end]), end)
}

/// Match `name(` at the start of `rest` and return the balanced-parenthesis
/// argument plus the total number of bytes consumed.
fn paren_arg<'t>(rest: &'t str, name: &str) -> Option<(&'t str, usize)> {
    let after = rest.strip_prefix(name)?;
    if !after.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    for (i, c) in after.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&after[1..i], name.len() + i + 1));
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse a leading signed decimal token, returning the value and its length.
fn bare_number(s: &str) -> Option<(f64, usize)> {
    let mut len = 0;
    let bytes = s.as_bytes();
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        len = 1;
    }
    while len < bytes.len() && (bytes[len].is_ascii_digit() || bytes[len] == b'.') {
        len += 1;
    }
    let value: f64 = s[..len].parse().ok()?;
    Some((value, len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resample::BorderScale;
    use crate::scale::Resolution;
    use pretty_assertions::assert_eq;

    fn ctx() -> ScaleContext {
        ScaleContext::new(Resolution::HD, Resolution::FULL_HD)
    }

    fn scale(text: &str) -> String {
        let ctx = ctx();
        let policy = ResamplePolicy::default();
        TagScaler::new(&ctx, &policy).scale_event_text(text)
    }

    #[test]
    fn pos_scales_per_axis() {
        assert_eq!(scale(r"{\pos(100,200)}Hi"), r"{\pos(150,300)}Hi");
    }

    #[test]
    fn org_and_fractional_output() {
        assert_eq!(scale(r"{\org(1,1)}x"), r"{\org(1.5,1.5)}x");
    }

    #[test]
    fn move_keeps_timing_params() {
        assert_eq!(
            scale(r"{\move(10,20,30,40,100,500)}x"),
            r"{\move(15,30,45,60,100,500)}x"
        );
        assert_eq!(scale(r"{\move(10,20,30,40)}x"), r"{\move(15,30,45,60)}x");
    }

    #[test]
    fn rect_clip_scales_corner_pairs() {
        assert_eq!(
            scale(r"{\clip(0,0,640,360)}x"),
            r"{\clip(0,0,960,540)}x"
        );
        assert_eq!(
            scale(r"{\iclip(10,10,20,20)}x"),
            r"{\iclip(15,15,30,30)}x"
        );
    }

    #[test]
    fn vector_clip_scales_path() {
        assert_eq!(
            scale(r"{\clip(m 0 0 l 100 0 100 100 l 0 100)}x"),
            r"{\clip(m 0 0 l 150 0 150 150 l 0 150)}x"
        );
    }

    #[test]
    fn vector_clip_preserves_scale_level() {
        assert_eq!(
            scale(r"{\clip(1,m 0 0 l 100 0)}x"),
            r"{\clip(1,m 0 0 l 150 0)}x"
        );
    }

    #[test]
    fn font_size_rounds_to_integer() {
        assert_eq!(scale(r"{\fs20}x"), r"{\fs30}x");
        // 21 * 1.5 = 31.5 rounds half-up
        assert_eq!(scale(r"{\fs21}x"), r"{\fs32}x");
    }

    #[test]
    fn border_and_shadow_use_mean_ratio_by_default() {
        assert_eq!(scale(r"{\bord2}x"), r"{\bord3}x");
        assert_eq!(scale(r"{\shad1}x"), r"{\shad1.5}x");
        assert_eq!(scale(r"{\blur2}x"), r"{\blur3}x");
        assert_eq!(scale(r"{\be2}x"), r"{\be3}x");
    }

    #[test]
    fn border_policy_vertical() {
        let ctx = ScaleContext::new(Resolution::new(1920, 540), Resolution::FULL_HD);
        let policy = ResamplePolicy {
            border_scale: BorderScale::Vertical,
            ..ResamplePolicy::default()
        };
        let scaler = TagScaler::new(&ctx, &policy);
        assert_eq!(scaler.scale_event_text(r"{\bord2}x"), r"{\bord4}x");
    }

    #[test]
    fn axis_suffixed_tags() {
        let ctx = ScaleContext::new(Resolution::new(960, 1080), Resolution::FULL_HD);
        let policy = ResamplePolicy::default();
        let scaler = TagScaler::new(&ctx, &policy);
        assert_eq!(scaler.scale_event_text(r"{\xbord2}x"), r"{\xbord4}x");
        assert_eq!(scaler.scale_event_text(r"{\ybord2}x"), r"{\ybord2}x");
        assert_eq!(scaler.scale_event_text(r"{\xshad3}x"), r"{\xshad6}x");
        assert_eq!(scaler.scale_event_text(r"{\yshad3}x"), r"{\yshad3}x");
    }

    #[test]
    fn margin_tags() {
        assert_eq!(
            scale(r"{\margins(10,20,30,40)}x"),
            r"{\margins(15,30,45,60)}x"
        );
        assert_eq!(scale(r"{\marginl10\marginv20}x"), r"{\marginl15\marginv30}x");
    }

    #[test]
    fn percent_scale_kept_by_default() {
        assert_eq!(scale(r"{\fscx50\fscy50}x"), r"{\fscx50\fscy50}x");
    }

    #[test]
    fn percent_scale_aspect_policy() {
        // 4:3 source, 16:9 target: fscx widens by 4/3, fscy untouched
        let ctx = ScaleContext::new(Resolution::new(640, 480), Resolution::FULL_HD);
        let policy = ResamplePolicy {
            percent_scale: PercentScale::AspectRatio,
            ..ResamplePolicy::default()
        };
        let scaler = TagScaler::new(&ctx, &policy);
        assert_eq!(
            scaler.scale_event_text(r"{\fscx75\fscy75}x"),
            r"{\fscx100\fscy75}x"
        );
    }

    #[test]
    fn nested_transform_recurses() {
        assert_eq!(
            scale(r"{\t(0,500,\fs20\pos(10,10))}x"),
            r"{\t(0,500,\fs30\pos(15,15))}x"
        );
    }

    #[test]
    fn doubly_nested_transform() {
        assert_eq!(
            scale(r"{\t(0,500,\t(100,200,\fs20))}x"),
            r"{\t(0,500,\t(100,200,\fs30))}x"
        );
    }

    #[test]
    fn transform_without_tags_untouched() {
        assert_eq!(scale(r"{\t(0,500)}x"), r"{\t(0,500)}x");
    }

    #[test]
    fn drawing_mode_scales_following_payload() {
        assert_eq!(
            scale(r"{\p1}m 0 0 l 100 0{\p0}done"),
            r"{\p1}m 0 0 l 150 0{\p0}done"
        );
    }

    #[test]
    fn drawing_mode_persists_across_tag_only_blocks() {
        assert_eq!(
            scale(r"{\p1}m 0 0 {\c&HFF0000&}l 100 0{\p0}"),
            r"{\p1}m 0 0 {\c&HFF0000&}l 150 0{\p0}"
        );
    }

    #[test]
    fn font_name_forced_when_configured() {
        let ctx = ctx();
        let policy = ResamplePolicy::default();
        let scaler = TagScaler::new(&ctx, &policy).with_font("Open Sans Semibold");
        assert_eq!(
            scaler.scale_event_text(r"{\fnArial\fs20}x"),
            r"{\fnOpen Sans Semibold\fs30}x"
        );
        // Without a font the name is untouched
        assert_eq!(scale(r"{\fnArial}x"), r"{\fnArial}x");
    }

    #[test]
    fn unknown_tags_and_plain_text_untouched() {
        assert_eq!(
            scale(r"{\b1\i1\c&H00FF00&\an8}Plain, text"),
            r"{\b1\i1\c&H00FF00&\an8}Plain, text"
        );
        assert_eq!(scale(r"{\fad(0,40)}x"), r"{\fad(0,40)}x");
        assert_eq!(scale("no tags at all"), "no tags at all");
    }

    #[test]
    fn unparseable_arguments_left_verbatim() {
        assert_eq!(scale(r"{\pos(a,b)}x"), r"{\pos(a,b)}x");
        assert_eq!(scale(r"{\fs}x"), r"{\fs}x");
        assert_eq!(scale(r"{\clip(1,2)}x"), r"{\clip(1,2)}x");
        assert_eq!(scale(r"{\move(1,2)}x"), r"{\move(1,2)}x");
    }

    #[test]
    fn unterminated_block_left_verbatim() {
        assert_eq!(scale(r"text {\pos(1,2"), r"text {\pos(1,2");
    }

    #[test]
    fn identity_ratio_changes_nothing() {
        let ctx = ScaleContext::new(Resolution::FULL_HD, Resolution::FULL_HD);
        let policy = ResamplePolicy::default();
        let scaler = TagScaler::new(&ctx, &policy);
        let text = r"{\pos(960,540)\fs48\bord2\clip(m 0 0 l 10 5)}Line";
        assert_eq!(scaler.scale_event_text(text), text);
    }

    #[test]
    fn spacing_and_shear() {
        assert_eq!(scale(r"{\fsp2}x"), r"{\fsp3}x");
        assert_eq!(scale(r"{\pbo10}x"), r"{\pbo15}x");
        assert_eq!(scale(r"{\fax0.2}x"), r"{\fax0.3}x");
    }
}

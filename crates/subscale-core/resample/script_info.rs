//! `PlayResX`/`PlayResY` detection and forcing.
//!
//! Declarations are matched case-insensitively at line start, anywhere in the
//! document (they conventionally live under `[Script Info]`). This stage
//! never fails: missing declarations fall back to a configured default
//! resolution, and the output document always carries the target values.

use crate::scale::Resolution;

/// Extract the authored resolution, falling back per axis when a declaration
/// is absent or unparseable.
pub(crate) fn detect(lines: &[String], fallback: Resolution) -> Resolution {
    let mut width = None;
    let mut height = None;
    for line in lines {
        let trimmed = line.trim();
        if starts_with_key(trimmed, "playresx") {
            width = width.or_else(|| parse_value(trimmed));
        } else if starts_with_key(trimmed, "playresy") {
            height = height.or_else(|| parse_value(trimmed));
        }
    }
    Resolution {
        width: width.unwrap_or(fallback.width),
        height: height.unwrap_or(fallback.height),
    }
}

/// Rewrite existing `PlayRes` declarations to the target resolution, or
/// insert them under the `[Script Info]` header, synthesizing that header at
/// the top of the document when it is missing too.
pub(crate) fn force(lines: &mut Vec<String>, target: Resolution) {
    let mut found_x = false;
    let mut found_y = false;
    for line in lines.iter_mut() {
        let trimmed = line.trim();
        if starts_with_key(trimmed, "playresx") {
            *line = format!("PlayResX: {}", target.width);
            found_x = true;
        } else if starts_with_key(trimmed, "playresy") {
            *line = format!("PlayResY: {}", target.height);
            found_y = true;
        }
    }
    if found_x && found_y {
        return;
    }

    let header = lines
        .iter()
        .position(|l| l.trim().eq_ignore_ascii_case("[script info]"));
    let mut insert_at = match header {
        Some(i) => i + 1,
        None => {
            lines.insert(0, "[Script Info]".to_string());
            1
        }
    };
    if !found_x {
        lines.insert(insert_at, format!("PlayResX: {}", target.width));
        insert_at += 1;
    }
    if !found_y {
        lines.insert(insert_at, format!("PlayResY: {}", target.height));
    }
}

fn starts_with_key(line: &str, key: &str) -> bool {
    line.len() >= key.len() && line[..key.len()].eq_ignore_ascii_case(key)
}

/// Value after the `:` (or, tolerated, `=`) separator.
fn parse_value(line: &str) -> Option<u32> {
    let (_, value) = line.split_once(':').or_else(|| line.split_once('='))?;
    let parsed: f64 = value.trim().parse().ok()?;
    if parsed <= 0.0 || !parsed.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Some(parsed.round() as u32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(String::from).collect()
    }

    #[test]
    fn detects_declared_resolution() {
        let doc = lines("[Script Info]\nTitle: x\nPlayResX: 1280\nPlayResY: 720");
        assert_eq!(detect(&doc, Resolution::HD), Resolution::new(1280, 720));
    }

    #[test]
    fn detects_case_insensitively_and_equals_form() {
        let doc = lines("playresx=640\nPLAYRESY: 480");
        assert_eq!(detect(&doc, Resolution::HD), Resolution::new(640, 480));
    }

    #[test]
    fn missing_axes_fall_back_independently() {
        let doc = lines("[Script Info]\nPlayResX: 1920");
        assert_eq!(detect(&doc, Resolution::HD), Resolution::new(1920, 720));
        assert_eq!(detect(&lines("[Script Info]"), Resolution::HD), Resolution::HD);
    }

    #[test]
    fn zero_or_garbage_values_fall_back() {
        let doc = lines("PlayResX: 0\nPlayResY: abc");
        assert_eq!(detect(&doc, Resolution::HD), Resolution::HD);
    }

    #[test]
    fn force_replaces_existing_values() {
        let mut doc = lines("[Script Info]\nPlayResX: 1280\nPlayResY: 720\n\n[Events]");
        force(&mut doc, Resolution::FULL_HD);
        assert_eq!(doc[1], "PlayResX: 1920");
        assert_eq!(doc[2], "PlayResY: 1080");
    }

    #[test]
    fn force_inserts_after_header_when_missing() {
        let mut doc = lines("[Script Info]\nTitle: x\n\n[Events]");
        force(&mut doc, Resolution::FULL_HD);
        assert_eq!(doc[0], "[Script Info]");
        assert_eq!(doc[1], "PlayResX: 1920");
        assert_eq!(doc[2], "PlayResY: 1080");
        assert_eq!(doc[3], "Title: x");
    }

    #[test]
    fn force_synthesizes_header_when_absent() {
        let mut doc = lines("[Events]\nDialogue: ...");
        force(&mut doc, Resolution::FULL_HD);
        assert_eq!(
            &doc[..3],
            &[
                "[Script Info]".to_string(),
                "PlayResX: 1920".to_string(),
                "PlayResY: 1080".to_string(),
            ]
        );
        assert_eq!(doc[3], "[Events]");
    }

    #[test]
    fn force_fills_single_missing_axis() {
        let mut doc = lines("[Script Info]\nPlayResY: 720");
        force(&mut doc, Resolution::FULL_HD);
        assert_eq!(doc[1], "PlayResX: 1920");
        assert_eq!(doc[2], "PlayResY: 1080");
    }
}

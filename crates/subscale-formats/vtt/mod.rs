//! WebVTT→SRT conversion.
//!
//! Handles the `WEBVTT` header block and its metadata, optional cue
//! identifiers, cue settings trailing the timestamps, and the common cue
//! markup: voice spans, ruby annotations, colour classes and b/i/u.

use std::sync::OnceLock;

use regex::Regex;

use crate::entities::deep_unescape;
use crate::{ConvertError, Result};

fn time_full_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+):(\d+):(\d+)\.(\d+)").unwrap())
}

fn time_short_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+):(\d+)\.(\d+)").unwrap())
}

fn time_no_ms_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+):(\d+):(\d+)").unwrap())
}

/// Convert WebVTT text to SRT.
///
/// # Errors
///
/// [`ConvertError::NoCues`] when no valid cue survives conversion.
pub fn to_srt(content: &str) -> Result<String> {
    let content = deep_unescape(content);
    let lines: Vec<&str> = content.lines().collect();
    let mut out = String::new();
    let mut counter = 1usize;
    let mut i = 0usize;

    // Skip the WEBVTT header and its metadata block
    while i < lines.len() {
        let line = lines[i].trim();
        if line.starts_with("WEBVTT") {
            i += 1;
            while i < lines.len() && lines[i].contains(':') && !lines[i].contains("-->") {
                i += 1;
            }
            break;
        }
        i += 1;
    }

    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() {
            i += 1;
            continue;
        }
        // Cue identifier: a line right above the timing line
        if !line.contains("-->") && i + 1 < lines.len() && lines[i + 1].contains("-->") {
            i += 1;
            continue;
        }
        if let Some((start_raw, end_raw)) = line.split_once("-->") {
            let start = vtt_time_to_srt(start_raw);
            let end = vtt_time_to_srt(end_raw);
            i += 1;

            let mut text_lines = Vec::new();
            while i < lines.len() && !lines[i].trim().is_empty() {
                let text = convert_cue_tags(lines[i].trim());
                if !text.is_empty() {
                    text_lines.push(text);
                }
                i += 1;
            }
            if !text_lines.is_empty() {
                out.push_str(&format!(
                    "{counter}\n{start} --> {end}\n{}\n\n",
                    text_lines.join("\n")
                ));
                counter += 1;
            }
        } else {
            i += 1;
        }
    }

    if counter == 1 {
        return Err(ConvertError::NoCues("WebVTT"));
    }
    Ok(out)
}

/// VTT clock time (with or without hours or milliseconds, possibly followed
/// by cue settings) to an SRT timestamp.
fn vtt_time_to_srt(time: &str) -> String {
    // Drop cue settings after the timestamp
    let time = time.trim().split_whitespace().next().unwrap_or("");

    if let Some(caps) = time_full_regex().captures(time) {
        let h: u32 = caps[1].parse().unwrap_or(0);
        let m: u32 = caps[2].parse().unwrap_or(0);
        let s: u32 = caps[3].parse().unwrap_or(0);
        return format!("{h:02}:{m:02}:{s:02},{:03}", millis(&caps[4]));
    }
    if let Some(caps) = time_short_regex().captures(time) {
        let m: u32 = caps[1].parse().unwrap_or(0);
        let s: u32 = caps[2].parse().unwrap_or(0);
        return format!("{:02}:{:02}:{s:02},{:03}", m / 60, m % 60, millis(&caps[3]));
    }
    if let Some(caps) = time_no_ms_regex().captures(time) {
        let h: u32 = caps[1].parse().unwrap_or(0);
        let m: u32 = caps[2].parse().unwrap_or(0);
        let s: u32 = caps[3].parse().unwrap_or(0);
        return format!("{h:02}:{m:02}:{s:02},000");
    }
    "00:00:00,000".to_string()
}

/// Normalize a captured fraction to milliseconds (".5" is 500ms).
pub(crate) fn millis(fraction: &str) -> u32 {
    let mut padded = fraction.to_string();
    padded.truncate(3);
    while padded.len() < 3 {
        padded.push('0');
    }
    padded.parse().unwrap_or(0)
}

/// Map VTT cue markup onto SRT-compatible markup.
fn convert_cue_tags(text: &str) -> String {
    static TIMESTAMP: OnceLock<Regex> = OnceLock::new();
    static VOICE: OnceLock<Regex> = OnceLock::new();
    static RUBY: OnceLock<Regex> = OnceLock::new();
    static COLOR_CLASS: OnceLock<Regex> = OnceLock::new();
    static OTHER_CLASS: OnceLock<Regex> = OnceLock::new();

    let timestamp =
        TIMESTAMP.get_or_init(|| Regex::new(r"<\d{2}:\d{2}:\d{2}\.\d{3}>").unwrap());
    let voice = VOICE.get_or_init(|| Regex::new(r"<v\s+([^>]+)>").unwrap());
    let ruby =
        RUBY.get_or_init(|| Regex::new(r"<ruby>([^<]*)<rt>[^<]*</rt></ruby>").unwrap());
    let color_class =
        COLOR_CLASS.get_or_init(|| Regex::new(r"<c\.(#[0-9A-Fa-f]{6})>").unwrap());
    let other_class = OTHER_CLASS.get_or_init(|| Regex::new(r"<c\.[^>]*>").unwrap());

    let text = timestamp.replace_all(text, "");
    let text = voice.replace_all(&text, "$1: ");
    let text = text.replace("</v>", "");
    let text = ruby.replace_all(&text, "$1");
    let text = color_class.replace_all(&text, r#"<font color="$1">"#);
    let text = text.replace("</c>", "</font>");
    let text = other_class.replace_all(&text, "");
    text.into_owned()
}

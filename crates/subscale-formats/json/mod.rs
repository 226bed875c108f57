//! Bilibili/YouTube caption JSON→SRT conversion.
//!
//! The two schemas are told apart by key shape before deserializing into
//! typed structs: Bilibili dumps carry `body[].from/to/content` in seconds,
//! YouTube `timedtext` dumps carry `events[].tStartMs/dDurationMs/segs[]`
//! in milliseconds.

use serde::Deserialize;

use crate::{ConvertError, Result};

#[derive(Debug, Deserialize)]
struct BiliRoot {
    #[serde(default)]
    body: Vec<BiliEntry>,
}

#[derive(Debug, Deserialize)]
struct BiliEntry {
    #[serde(default)]
    from: f64,
    #[serde(default)]
    to: f64,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct YoutubeRoot {
    #[serde(default)]
    events: Vec<YoutubeEvent>,
}

#[derive(Debug, Deserialize)]
struct YoutubeEvent {
    #[serde(default, rename = "tStartMs")]
    start_ms: f64,
    #[serde(default, rename = "dDurationMs")]
    duration_ms: f64,
    #[serde(default)]
    segs: Vec<YoutubeSeg>,
}

#[derive(Debug, Deserialize)]
struct YoutubeSeg {
    #[serde(default)]
    utf8: String,
}

/// Convert a caption JSON dump to SRT.
///
/// # Errors
///
/// [`ConvertError::Parse`] for invalid JSON or an unrecognized schema,
/// [`ConvertError::NoCues`] when no entry survives validation.
pub fn to_srt(content: &str) -> Result<String> {
    let value: serde_json::Value = serde_json::from_str(content).map_err(|e| {
        ConvertError::Parse {
            format: "JSON",
            reason: e.to_string(),
        }
    })?;

    if value.get("body").is_some() {
        let root: BiliRoot = serde_json::from_value(value).map_err(|e| ConvertError::Parse {
            format: "Bilibili JSON",
            reason: e.to_string(),
        })?;
        bilibili(root)
    } else if value.get("events").is_some() {
        let root: YoutubeRoot =
            serde_json::from_value(value).map_err(|e| ConvertError::Parse {
                format: "YouTube JSON",
                reason: e.to_string(),
            })?;
        youtube(root)
    } else {
        Err(ConvertError::Parse {
            format: "JSON",
            reason: "no recognized caption keys (body/events)".to_string(),
        })
    }
}

fn bilibili(root: BiliRoot) -> Result<String> {
    let mut out = String::new();
    let mut counter = 1usize;
    for entry in root.body {
        // Guard against zero-length and reversed entries
        if entry.to <= 0.0 || entry.to <= entry.from {
            continue;
        }
        let text = entry.content.trim();
        if text.is_empty() {
            continue;
        }
        out.push_str(&format!(
            "{counter}\n{} --> {}\n{text}\n\n",
            seconds_to_srt(entry.from),
            seconds_to_srt(entry.to)
        ));
        counter += 1;
    }
    if counter == 1 {
        return Err(ConvertError::NoCues("Bilibili JSON"));
    }
    Ok(out)
}

fn youtube(root: YoutubeRoot) -> Result<String> {
    let mut cues: Vec<(f64, f64, String)> = Vec::new();
    for event in root.events {
        if event.segs.is_empty() {
            continue;
        }
        let text: String = event
            .segs
            .iter()
            .map(|s| s.utf8.trim())
            .collect::<Vec<_>>()
            .join("");
        if text.trim().is_empty() {
            continue;
        }
        let start = event.start_ms / 1000.0;
        let end = (event.start_ms + event.duration_ms) / 1000.0;
        cues.push((start, end, text));
    }
    if cues.is_empty() {
        return Err(ConvertError::NoCues("YouTube JSON"));
    }
    cues.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut out = String::new();
    for (i, (start, end, text)) in cues.into_iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{text}\n\n",
            i + 1,
            seconds_to_srt(start),
            seconds_to_srt(end)
        ));
    }
    Ok(out)
}

/// Seconds to an SRT timestamp, clamped at zero.
fn seconds_to_srt(seconds: f64) -> String {
    let seconds = seconds.max(0.0);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let total_ms = (seconds * 1000.0 + 0.5) as u64;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        total_ms / 3_600_000,
        total_ms % 3_600_000 / 60_000,
        total_ms % 60_000 / 1000,
        total_ms % 1000
    )
}

//! TTML and caption-XML→SRT conversion.
//!
//! Two dialects are tried in order: first the caption-site XML shape
//! (`<xml><dia><st>/<et>/<sub>` with centisecond timestamps and CDATA text),
//! then standard TTML (`<p begin end>` paragraphs wherever they appear in
//! the body, `<br/>` line breaks, inline spans contributing their text).
//! The whole input is deep-unescaped before parsing; markup the walk does
//! not recognize simply contributes nothing.

use std::sync::OnceLock;

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use regex::Regex;

use crate::entities::deep_unescape;
use crate::vtt::millis;
use crate::{ConvertError, Result};

/// Convert TTML or caption XML to SRT.
///
/// # Errors
///
/// [`ConvertError::Parse`] when neither dialect parses,
/// [`ConvertError::NoCues`] when parsing succeeds but yields nothing.
pub fn to_srt(content: &str) -> Result<String> {
    let content = deep_unescape(content);
    match caption_xml(&content) {
        Ok(srt) => Ok(srt),
        Err(_) => timed_text(&content),
    }
}

#[derive(Debug, Clone, Copy)]
enum DiaField {
    Start,
    End,
    Text,
}

/// The `<dia><st>/<et>/<sub>` caption-XML dialect.
fn caption_xml(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    let mut cues: Vec<(String, String, String)> = Vec::new();
    let mut field: Option<DiaField> = None;
    let mut start = String::new();
    let mut end = String::new();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"dia" => {
                    start.clear();
                    end.clear();
                    text.clear();
                }
                b"st" => field = Some(DiaField::Start),
                b"et" => field = Some(DiaField::End),
                b"sub" => field = Some(DiaField::Text),
                _ => {}
            },
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"dia" => {
                    let body = text.trim();
                    if !body.is_empty() {
                        cues.push((start.clone(), end.clone(), body.replace('\n', "\\N")));
                    }
                }
                b"st" | b"et" | b"sub" => field = None,
                _ => {}
            },
            Ok(Event::Text(t)) => {
                append(field, &String::from_utf8_lossy(&t), &mut start, &mut end, &mut text);
            }
            Ok(Event::CData(c)) => {
                append(field, &String::from_utf8_lossy(&c), &mut start, &mut end, &mut text);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ConvertError::Parse {
                    format: "caption XML",
                    reason: e.to_string(),
                })
            }
        }
    }

    if cues.is_empty() {
        return Err(ConvertError::NoCues("caption XML"));
    }
    Ok(build_srt(cues.into_iter().map(|(st, et, sub)| {
        (centiseconds_to_srt(&st), centiseconds_to_srt(&et), sub)
    })))
}

fn append(
    field: Option<DiaField>,
    chunk: &str,
    start: &mut String,
    end: &mut String,
    text: &mut String,
) {
    match field {
        Some(DiaField::Start) => start.push_str(chunk.trim()),
        Some(DiaField::End) => end.push_str(chunk.trim()),
        Some(DiaField::Text) => text.push_str(chunk),
        None => {}
    }
}

/// Standard TTML: every `<p begin end>` paragraph in the document.
fn timed_text(content: &str) -> Result<String> {
    let mut reader = Reader::from_str(content);
    let mut cues: Vec<(String, String, String)> = Vec::new();
    // (begin, end, accumulated text) while inside a <p>
    let mut current: Option<(String, String, String)> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    current = Some((
                        attribute(&e, "begin").unwrap_or_default(),
                        attribute(&e, "end").unwrap_or_default(),
                        String::new(),
                    ));
                }
                b"br" => {
                    if let Some((_, _, text)) = &mut current {
                        text.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"br" {
                    if let Some((_, _, text)) = &mut current {
                        text.push('\n');
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"p" {
                    if let Some((begin, end, text)) = current.take() {
                        let body = text.trim();
                        if !body.is_empty() {
                            cues.push((
                                clock_to_srt(&begin),
                                clock_to_srt(&end),
                                body.to_string(),
                            ));
                        }
                    }
                }
            }
            Ok(Event::Text(t)) => {
                if let Some((_, _, text)) = &mut current {
                    text.push_str(&String::from_utf8_lossy(&t));
                }
            }
            Ok(Event::CData(c)) => {
                if let Some((_, _, text)) = &mut current {
                    text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ConvertError::Parse {
                    format: "TTML",
                    reason: e.to_string(),
                })
            }
        }
    }

    if cues.is_empty() {
        return Err(ConvertError::NoCues("TTML"));
    }
    Ok(build_srt(cues.into_iter()))
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Option<String> {
    let attr = element.try_get_attribute(name).ok().flatten()?;
    Some(String::from_utf8_lossy(&attr.value).into_owned())
}

fn build_srt(cues: impl Iterator<Item = (String, String, String)>) -> String {
    let mut out = String::new();
    for (i, (start, end, text)) in cues.enumerate() {
        out.push_str(&format!("{}\n{start} --> {end}\n{text}\n\n", i + 1));
    }
    out
}

/// Centisecond counter (caption XML) to an SRT timestamp.
fn centiseconds_to_srt(value: &str) -> String {
    let Ok(cs) = value.trim().parse::<u64>() else {
        return "00:00:00,000".to_string();
    };
    let ms = cs * 10;
    format!(
        "{:02}:{:02}:{:02},{:03}",
        ms / 3_600_000,
        ms % 3_600_000 / 60_000,
        ms % 60_000 / 1000,
        ms % 1000
    )
}

/// TTML clock time to an SRT timestamp: `HH:MM:SS.fff`, `HH:MM:SS:FF`
/// (frames at 25fps) or `HH:MM:SS`.
fn clock_to_srt(value: &str) -> String {
    static WITH_MS: OnceLock<Regex> = OnceLock::new();
    static FRAMES: OnceLock<Regex> = OnceLock::new();
    static PLAIN: OnceLock<Regex> = OnceLock::new();

    let with_ms = WITH_MS.get_or_init(|| Regex::new(r"(\d+):(\d+):(\d+)\.(\d+)").unwrap());
    let frames = FRAMES.get_or_init(|| Regex::new(r"(\d+):(\d+):(\d+):(\d+)").unwrap());
    let plain = PLAIN.get_or_init(|| Regex::new(r"(\d+):(\d+):(\d+)").unwrap());

    if let Some(caps) = with_ms.captures(value) {
        let h: u32 = caps[1].parse().unwrap_or(0);
        let m: u32 = caps[2].parse().unwrap_or(0);
        let s: u32 = caps[3].parse().unwrap_or(0);
        return format!("{h:02}:{m:02}:{s:02},{:03}", millis(&caps[4]));
    }
    if let Some(caps) = frames.captures(value) {
        let h: u32 = caps[1].parse().unwrap_or(0);
        let m: u32 = caps[2].parse().unwrap_or(0);
        let s: u32 = caps[3].parse().unwrap_or(0);
        let ff: u32 = caps[4].parse().unwrap_or(0);
        return format!("{h:02}:{m:02}:{s:02},{:03}", ff * 40);
    }
    if let Some(caps) = plain.captures(value) {
        let h: u32 = caps[1].parse().unwrap_or(0);
        let m: u32 = caps[2].parse().unwrap_or(0);
        let s: u32 = caps[3].parse().unwrap_or(0);
        return format!("{h:02}:{m:02}:{s:02},000");
    }
    "00:00:00,000".to_string()
}

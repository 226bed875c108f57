//! SRT cue parsing and the SRT→ASS builder.
//!
//! Every line of an SRT cue becomes its own dialogue event, classified as
//! spoken dialogue or an on-screen sign. Duplicates produced by that split
//! (and by sloppy upstream converters) are merged back together before the
//! final document is emitted: same class and timing joins the texts with
//! `\N`, same class and text with abutting timing extends the event.

use std::sync::OnceLock;

use regex::Regex;
use subscale_core::ResampleConfig;

fn timing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+):(\d+):(\d+),(\d+)").unwrap())
}

fn font_color_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)<font[^>]*color\s*=\s*["']?#?([0-9a-fA-F]{6})["']?[^>]*>"#).unwrap()
    })
}

fn any_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)</?[^>]+>").unwrap())
}

fn override_block_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\\[^}]*\}").unwrap())
}

fn all_caps_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Z0-9\s[:punct:]]+$").unwrap())
}

/// Dialogue vs. on-screen sign, deciding style and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CueClass {
    Dialogue,
    Sign,
}

impl CueClass {
    const fn style_name(self) -> &'static str {
        match self {
            Self::Dialogue => "Default",
            Self::Sign => "Sign",
        }
    }
}

#[derive(Debug, Clone)]
struct Event {
    start: String,
    end: String,
    class: CueClass,
    text: String,
}

/// Convert SRT text into a complete ASS document rendered against `config`.
///
/// Infallible by design: input without a single valid cue yields a document
/// with an empty events list.
#[must_use]
pub fn to_ass(content: &str, config: &ResampleConfig) -> String {
    let events = merge(parse(content));
    let mut out = header(config);
    for event in events {
        let text = match event.class {
            // House opener for spoken lines
            CueClass::Dialogue => format!("{{\\blur3}}{{\\fad(0,40)}}{}", event.text),
            CueClass::Sign => event.text,
        };
        out.push_str(&format!(
            "Dialogue: 0,{},{},{},,0000,0000,0000,,{}\n",
            event.start,
            event.end,
            event.class.style_name(),
            text
        ));
    }
    out
}

fn parse(content: &str) -> Vec<Event> {
    let lines: Vec<&str> = content.lines().collect();
    let mut events = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let line = lines[i].trim();
        if line.is_empty() || !timing_regex().is_match(line) {
            i += 1;
            continue;
        }
        let Some((start_raw, end_raw)) = line.split_once("-->") else {
            i += 1;
            continue;
        };
        let start = srt_time_to_ass(start_raw);
        let end = srt_time_to_ass(end_raw);
        i += 1;
        while i < lines.len() && !lines[i].trim().is_empty() {
            let text = convert_tags(lines[i]);
            if !text.is_empty() {
                let class = classify(&text);
                events.push(Event {
                    start: start.clone(),
                    end: end.clone(),
                    class,
                    text,
                });
            }
            i += 1;
        }
    }
    events
}

/// SRT `HH:MM:SS,mmm` to ASS `H:MM:SS.cc`.
fn srt_time_to_ass(time: &str) -> String {
    let Some(caps) = timing_regex().captures(time) else {
        return "0:00:00.00".to_string();
    };
    let h: u32 = caps[1].parse().unwrap_or(0);
    let m: u32 = caps[2].parse().unwrap_or(0);
    let s: u32 = caps[3].parse().unwrap_or(0);
    let ms: u32 = caps[4].parse().unwrap_or(0);
    format!("{h}:{m:02}:{s:02}.{:02}", ms / 10)
}

/// HTML-ish SRT markup to ASS override tags; anything unconverted is
/// stripped and runs of whitespace collapse.
fn convert_tags(text: &str) -> String {
    let mut text = font_color_regex()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let hex = &caps[1];
            // HTML is RGB, ASS colours are BGR
            format!("{{\\c&H{}{}{}&}}", &hex[4..6], &hex[2..4], &hex[0..2])
        })
        .into_owned();

    for (from, to) in [
        ("<b>", "{\\b1}"),
        ("</b>", "{\\b0}"),
        ("<i>", "{\\i1}"),
        ("</i>", "{\\i0}"),
        ("<u>", "{\\u1}"),
        ("</u>", "{\\u0}"),
        ("<s>", "{\\s1}"),
        ("</s>", "{\\s0}"),
    ] {
        text = text.replace(from, to);
    }

    let text = any_tag_regex().replace_all(&text, "");
    let collapsed: Vec<&str> = text.split_whitespace().collect();
    collapsed.join(" ")
}

/// A cue is a sign when, stripped of override tags, it is fully bracketed or
/// shouting in capitals.
fn classify(text: &str) -> CueClass {
    let clean = override_block_regex().replace_all(text, "");
    let clean = clean.trim();
    if clean.is_empty() {
        return CueClass::Dialogue;
    }
    if (clean.starts_with('(') && clean.ends_with(')'))
        || (clean.starts_with('[') && clean.ends_with(']'))
    {
        return CueClass::Sign;
    }
    if all_caps_regex().is_match(clean) && clean.to_uppercase() == clean {
        return CueClass::Sign;
    }
    CueClass::Dialogue
}

fn merge(mut events: Vec<Event>) -> Vec<Event> {
    events.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.end.cmp(&b.end))
            .then_with(|| a.class.style_name().cmp(b.class.style_name()))
    });

    let mut absorbed = vec![false; events.len()];
    let mut merged = Vec::with_capacity(events.len());
    for i in 0..events.len() {
        if absorbed[i] {
            continue;
        }
        let mut current = events[i].clone();
        for j in i + 1..events.len() {
            if absorbed[j] {
                continue;
            }
            let next = &events[j];
            if next.class != current.class {
                continue;
            }
            if next.start == current.start && next.end == current.end {
                if next.text != current.text {
                    current.text = format!("{}\\N{}", current.text, next.text);
                }
                absorbed[j] = true;
            } else if next.text == current.text && current.end == next.start {
                current.end = next.end.clone();
                absorbed[j] = true;
            }
        }
        merged.push(current);
    }

    // Signs first, then chronological
    merged.sort_by(|a, b| match (a.class, b.class) {
        (CueClass::Sign, CueClass::Dialogue) => std::cmp::Ordering::Less,
        (CueClass::Dialogue, CueClass::Sign) => std::cmp::Ordering::Greater,
        _ => a.start.cmp(&b.start),
    });
    merged
}

/// Script header targeted at the configured resolution and font.
fn header(config: &ResampleConfig) -> String {
    let font = &config.font;
    let width = config.target.width;
    let height = config.target.height;
    format!(
        "[Script Info]\n\
         ; Script generated by subscale\n\
         Title: Converted subtitle\n\
         ScriptType: v4.00+\n\
         WrapStyle: 0\n\
         ScaledBorderAndShadow: yes\n\
         YCbCr Matrix: None\n\
         PlayResX: {width}\n\
         PlayResY: {height}\n\
         Timer: 100.0000\n\
         \n\
         [V4+ Styles]\n\
         Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n\
         Style: Default,{font},70,&H00FFFFFF,&H00FFFFFF,&H00000000,&H80000000,0,0,0,0,100,100,0,0,1,1.5,1,2,64,64,33,1\n\
         Style: Default Above,{font},70,&H00FFFFFF,&H000000FF,&H00000000,&H80000000,-1,0,0,0,100,100,0,0,1,1.5,1,8,0,0,65,1\n\
         Style: Sign,{font},75,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,-1,0,0,0,100,100,0,0,1,1,0,8,0,0,0,1\n\
         Style: res,{font},{height},&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,0,0,0,0,1,2,2,2,10,10,10,1\n\
         \n\
         [Events]\n\
         Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n"
    )
}

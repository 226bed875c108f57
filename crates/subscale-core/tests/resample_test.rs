//! End-to-end resampling tests over whole documents.

use pretty_assertions::assert_eq;
use subscale_core::{
    BorderScale, Newline, PercentScale, ResampleConfig, ResamplePolicy, Resampler, Resolution,
};

const SCRIPT_720P: &str = "\
[Script Info]
Title: Fixture
ScriptType: v4.00+
PlayResX: 1280
PlayResY: 720

[V4+ Styles]
Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding
Style: Default,Arial,48,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,100,100,0,0,1,2,0,2,10,10,10,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:00.00,0:00:05.00,Default,,10,20,5,,{\\pos(100,200)}Hello
Dialogue: 0,0:00:05.00,0:00:10.00,Default,,0,0,0,,{\\clip(m 0 0 l 100 0 100 100 l 0 100)}Boxed
";

fn resample(source: &str) -> String {
    Resampler::default().resample(source)
}

#[test]
fn forces_target_resolution() {
    let out = resample(SCRIPT_720P);
    assert!(out.contains("PlayResX: 1920"));
    assert!(out.contains("PlayResY: 1080"));
    assert!(!out.contains("1280"));
}

#[test]
fn margins_scale_and_round() {
    // MarginL=10, MarginR=20, MarginV=5 at 1280x720 -> 15/30/8 at 1920x1080
    let out = resample(SCRIPT_720P);
    assert!(out.contains("Dialogue: 0,0:00:00.00,0:00:05.00,Default,,15,30,8,,"));
}

#[test]
fn pos_and_clip_scale() {
    let out = resample(SCRIPT_720P);
    assert!(out.contains(r"{\pos(150,300)}Hello"));
    assert!(out.contains(r"{\clip(m 0 0 l 150 0 150 150 l 0 150)}Boxed"));
}

#[test]
fn style_fontsize_and_fontname() {
    let out = resample(SCRIPT_720P);
    assert!(out.contains("Style: Default,Open Sans Semibold,72,"));
}

#[test]
fn reference_style_appended_after_styles() {
    let out = resample(SCRIPT_720P);
    let lines: Vec<&str> = out.lines().collect();
    let default_idx = lines
        .iter()
        .position(|l| l.starts_with("Style: Default"))
        .unwrap();
    assert_eq!(
        lines[default_idx + 1],
        "Style: res,Open Sans Semibold,1080,&H00FFFFFF,&H000000FF,&H00000000,&H00000000,0,0,0,0,0,0,0,0,1,2,2,2,10,10,10,1"
    );
}

#[test]
fn reference_style_not_duplicated() {
    let once = resample(SCRIPT_720P);
    let twice = resample(&once);
    let count = twice.lines().filter(|l| l.starts_with("Style: res,")).count();
    assert_eq!(count, 1);
}

#[test]
fn identity_ratio_keeps_values() {
    let source = SCRIPT_720P
        .replace("PlayResX: 1280", "PlayResX: 1920")
        .replace("PlayResY: 720", "PlayResY: 1080");
    let out = resample(&source);
    // Numeric values unchanged at ratio 1...
    assert!(out.contains(r"{\pos(100,200)}Hello"));
    assert!(out.contains("Dialogue: 0,0:00:00.00,0:00:05.00,Default,,10,20,5,,"));
    assert!(out.contains("Style: Default,Open Sans Semibold,48,"));
    // ...but the font and reference style are still injected.
    assert!(out.contains("Style: res,Open Sans Semibold,1080,"));
}

#[test]
fn resampling_is_idempotent() {
    let once = resample(SCRIPT_720P);
    assert_eq!(resample(&once), once);
}

#[test]
fn malformed_dialogue_passes_through_unchanged() {
    let source = format!("{SCRIPT_720P}Dialogue: 0,0:00:10.00,broken\n");
    let out = resample(&source);
    assert!(out.contains("Dialogue: 0,0:00:10.00,broken\n"));
}

#[test]
fn nested_transform_scales_inner_tags() {
    let source = "\
[Script Info]
PlayResX: 960
PlayResY: 540

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:00.00,0:00:05.00,Default,,0,0,0,,{\\t(0,500,\\fs20\\pos(10,10))}Hi
";
    let out = resample(source);
    assert!(out.contains(r"{\t(0,500,\fs40\pos(20,20))}Hi"));
}

#[test]
fn missing_playres_defaults_and_inserts() {
    let source = "\
[Script Info]
Title: NoRes

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:00.00,0:00:05.00,Default,,0,0,0,,{\\pos(640,360)}Mid
";
    let out = resample(source);
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "[Script Info]");
    assert_eq!(lines[1], "PlayResX: 1920");
    assert_eq!(lines[2], "PlayResY: 1080");
    assert_eq!(lines[3], "Title: NoRes");
    // Default source is 1280x720, so the centre point scales by 1.5
    assert!(out.contains(r"{\pos(960,540)}Mid"));
}

#[test]
fn document_without_script_info_gains_one() {
    let source = "[Events]\nFormat: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n";
    let out = resample(source);
    assert!(out.starts_with("[Script Info]\nPlayResX: 1920\nPlayResY: 1080\n[Events]\n"));
}

#[test]
fn fn_override_forced_to_target_font() {
    let source = SCRIPT_720P.replace("{\\pos(100,200)}", "{\\fnComic Sans MS\\pos(100,200)}");
    let out = resample(&source);
    assert!(out.contains(r"{\fnOpen Sans Semibold\pos(150,300)}Hello"));
}

#[test]
fn crlf_and_bom_policy() {
    let config = ResampleConfig {
        policy: ResamplePolicy {
            newline: Newline::CrLf,
            bom: true,
            ..ResamplePolicy::default()
        },
        ..ResampleConfig::default()
    };
    let out = Resampler::new(config).resample(SCRIPT_720P);
    assert!(out.starts_with('\u{feff}'));
    assert!(out.ends_with("\r\n"));
    assert!(!out.replace("\r\n", "").contains('\r'));
}

#[test]
fn crlf_input_is_normalized() {
    let crlf_source = SCRIPT_720P.replace('\n', "\r\n");
    assert_eq!(resample(&crlf_source), resample(SCRIPT_720P));
}

#[test]
fn aspect_ratio_policy_rescales_percentages() {
    let source = "\
[Script Info]
PlayResX: 640
PlayResY: 480

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:00.00,0:00:05.00,Default,,0,0,0,,{\\fscx75\\fscy75}Wide
";
    let keep = resample(source);
    assert!(keep.contains(r"{\fscx75\fscy75}Wide"));

    let config = ResampleConfig {
        policy: ResamplePolicy {
            percent_scale: PercentScale::AspectRatio,
            ..ResamplePolicy::default()
        },
        ..ResampleConfig::default()
    };
    let wide = Resampler::new(config).resample(source);
    assert!(wide.contains(r"{\fscx100\fscy75}Wide"));
}

#[test]
fn vertical_border_policy_applies_to_styles_and_tags() {
    let source = "\
[Script Info]
PlayResX: 1920
PlayResY: 540

[V4+ Styles]
Format: Name, Fontname, Fontsize, Outline, Shadow
Style: Default,Arial,20,2,1

[Events]
Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text
Dialogue: 0,0:00:00.00,0:00:05.00,Default,,0,0,0,,{\\bord2}x
";
    let config = ResampleConfig {
        policy: ResamplePolicy {
            border_scale: BorderScale::Vertical,
            ..ResamplePolicy::default()
        },
        ..ResampleConfig::default()
    };
    let out = Resampler::new(config).resample(source);
    // ratio_y = 2: style outline/shadow and \bord double
    assert!(out.contains("Style: Default,Open Sans Semibold,40,4,2"));
    assert!(out.contains(r"{\bord4}x"));
}

#[test]
fn unknown_sections_pass_through() {
    let source = format!("{SCRIPT_720P}\n[Fonts]\nfontname: whatever.ttf\n");
    let out = resample(&source);
    assert!(out.contains("[Fonts]\nfontname: whatever.ttf\n"));
}

#[test]
fn custom_target_resolution() {
    let config = ResampleConfig {
        target: Resolution::new(3840, 2160),
        ..ResampleConfig::default()
    };
    let out = Resampler::new(config).resample(SCRIPT_720P);
    assert!(out.contains("PlayResX: 3840"));
    assert!(out.contains(r"{\pos(300,600)}Hello"));
    assert!(out.contains("Style: res,Open Sans Semibold,2160,"));
}

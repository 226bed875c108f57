//! Batch subtitle converter front end.
//!
//! Each input file is converted independently into a resampled ASS document
//! written next to it; a failure on one file logs an error and the batch
//! moves on.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use subscale_core::{
    BorderScale, Newline, PercentScale, ResampleConfig, ResamplePolicy, Resolution, DEFAULT_FONT,
};

const AFTER_HELP: &str = "Examples:
  subscale episode.srt
  subscale *.vtt --font \"Gandhi Sans\"
  subscale signs.ass --target 3840x2160 --vertical-borders
  subscale dump.json --crlf --bom -o episode.ass";

#[derive(Debug, Parser)]
#[command(
    name = "subscale",
    version,
    about = "Convert subtitles (SRT, WebVTT, TTML/XML, JSON, ASS) into resampled ASS",
    after_help = AFTER_HELP
)]
struct Cli {
    /// Input subtitle files
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Target resolution, WIDTHxHEIGHT
    #[arg(long, default_value = "1920x1080", value_parser = parse_resolution)]
    target: Resolution,

    /// Font forced onto every style and \fn override
    #[arg(long, default_value = DEFAULT_FONT)]
    font: String,

    /// Resolution assumed for ASS input without PlayRes declarations
    #[arg(long, default_value = "1280x720", value_parser = parse_resolution)]
    assume: Resolution,

    /// Scale \fscx by the aspect-ratio change instead of leaving percentages alone
    #[arg(long)]
    aspect_fscx: bool,

    /// Scale borders and shadows by the vertical ratio instead of the geometric mean
    #[arg(long)]
    vertical_borders: bool,

    /// Write CRLF line endings
    #[arg(long)]
    crlf: bool,

    /// Prefix the output with a UTF-8 byte-order mark
    #[arg(long)]
    bom: bool,

    /// Output path (single input only); default is a sibling file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    s.parse().map_err(|e: subscale_core::ParseResolutionError| e.to_string())
}

impl Cli {
    fn config(&self) -> ResampleConfig {
        ResampleConfig {
            target: self.target,
            fallback_source: self.assume,
            font: self.font.clone(),
            policy: ResamplePolicy {
                percent_scale: if self.aspect_fscx {
                    PercentScale::AspectRatio
                } else {
                    PercentScale::Keep
                },
                border_scale: if self.vertical_borders {
                    BorderScale::Vertical
                } else {
                    BorderScale::GeometricMean
                },
                newline: if self.crlf { Newline::CrLf } else { Newline::Lf },
                bom: self.bom,
            },
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if cli.output.is_some() && cli.inputs.len() > 1 {
        log::error!("--output only makes sense with a single input file");
        return ExitCode::FAILURE;
    }

    let config = cli.config();
    let mut failures = 0usize;
    for input in &cli.inputs {
        match convert_one(input, cli.output.as_deref(), &config) {
            Ok(output) => log::info!("{} -> {}", input.display(), output.display()),
            Err(err) => {
                log::error!("{}: {err:#}", input.display());
                failures += 1;
            }
        }
    }

    if failures > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn convert_one(
    input: &Path,
    output: Option<&Path>,
    config: &ResampleConfig,
) -> anyhow::Result<PathBuf> {
    let ass = subscale_formats::convert_path(input, config)
        .with_context(|| format!("converting {}", input.display()))?;
    let output = output.map_or_else(|| sibling_output(input, config.target.height), Path::to_path_buf);
    std::fs::write(&output, ass).with_context(|| format!("writing {}", output.display()))?;
    Ok(output)
}

/// Sibling path `<stem>_<height>p.ass`, appending a counter rather than
/// overwriting an existing file.
fn sibling_output(input: &Path, height: u32) -> PathBuf {
    let stem = input
        .file_stem()
        .map_or_else(|| "output".to_string(), |s| s.to_string_lossy().into_owned());
    let dir = input.parent().unwrap_or_else(|| Path::new(""));

    let mut candidate = dir.join(format!("{stem}_{height}p.ass"));
    let mut counter = 1u32;
    while candidate.exists() {
        candidate = dir.join(format!("{stem}_{height}p({counter}).ass"));
        counter += 1;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sibling_output_naming() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("episode.srt");
        std::fs::write(&input, "x").unwrap();

        let first = sibling_output(&input, 1080);
        assert_eq!(first, dir.path().join("episode_1080p.ass"));

        std::fs::write(&first, "taken").unwrap();
        let second = sibling_output(&input, 1080);
        assert_eq!(second, dir.path().join("episode_1080p(1).ass"));
    }

    #[test]
    fn policy_flags_map_to_config() {
        let cli = Cli::parse_from([
            "subscale",
            "in.srt",
            "--aspect-fscx",
            "--vertical-borders",
            "--crlf",
            "--bom",
            "--target",
            "3840x2160",
        ]);
        let config = cli.config();
        assert_eq!(config.target, Resolution::new(3840, 2160));
        assert_eq!(config.policy.percent_scale, PercentScale::AspectRatio);
        assert_eq!(config.policy.border_scale, BorderScale::Vertical);
        assert_eq!(config.policy.newline, Newline::CrLf);
        assert!(config.policy.bom);
    }

    #[test]
    fn defaults_match_the_documented_policy() {
        let cli = Cli::parse_from(["subscale", "in.srt"]);
        let config = cli.config();
        assert_eq!(config, ResampleConfig::default());
    }
}

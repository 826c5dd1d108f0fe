//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `slidedeck_core` linkage with deterministic output.
//! - Optionally start core file logging and load a deck JSON file to print
//!   a per-slide summary.
//!
//! Usage: `slidedeck_cli [--log-dir <abs dir>] [--log-level <level>] [deck.json]`

use slidedeck_core::{EditingSession, EditorConfig, JsonFileDeckSource};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    log_dir: Option<String>,
    log_level: Option<String>,
    deck_path: Option<PathBuf>,
}

fn main() -> ExitCode {
    println!("slidedeck_core ping={}", slidedeck_core::ping());
    println!("slidedeck_core version={}", slidedeck_core::core_version());

    match run(std::env::args().skip(1)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: impl IntoIterator<Item = String>) -> Result<(), String> {
    let args = parse_args(args)?;
    if let Some(log_dir) = &args.log_dir {
        let level = args
            .log_level
            .as_deref()
            .unwrap_or_else(|| slidedeck_core::default_log_level());
        slidedeck_core::init_logging(level, log_dir).map_err(|err| err.to_string())?;
        println!("logging level={level} dir={log_dir}");
    }
    match &args.deck_path {
        Some(path) => summarize_deck(path),
        None => Ok(()),
    }
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<CliArgs, String> {
    let mut parsed = CliArgs::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--log-dir" => {
                parsed.log_dir = Some(args.next().ok_or("--log-dir needs a directory")?);
            }
            "--log-level" => {
                parsed.log_level = Some(args.next().ok_or("--log-level needs a level")?);
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag `{flag}`")),
            _ if parsed.deck_path.is_some() => {
                return Err(format!("unexpected argument `{arg}`"));
            }
            _ => parsed.deck_path = Some(PathBuf::from(&arg)),
        }
    }
    if parsed.log_level.is_some() && parsed.log_dir.is_none() {
        return Err("--log-level requires --log-dir".to_string());
    }
    Ok(parsed)
}

fn summarize_deck(path: &Path) -> Result<(), String> {
    let request_id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| format!("`{}` has no usable file name", path.display()))?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let source = JsonFileDeckSource::new(dir);
    let session = EditingSession::load(&source, request_id, EditorConfig::default())
        .map_err(|err| err.to_string())?;

    let document = session.document();
    println!("slides={}", document.len());
    for (index, slide) in document.slides().enumerate() {
        println!(
            "slide[{index}] id={} elements={}",
            slide.id,
            slide.element_count()
        );
        for element in slide.elements() {
            let Some(frame) = session.render_frame(&slide.id, &element.id) else {
                continue;
            };
            println!(
                "  {} {} x={:.1} y={:.1} w={:.1} h={:.1}",
                element.kind(),
                element.id,
                frame.x,
                frame.y,
                frame.width,
                frame.height
            );
        }
    }
    Ok(())
}

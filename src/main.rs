use anyhow::Context;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use env_logger::Env;
use log::{debug, warn};
use md2pdf::config::{self, Settings};
use md2pdf::convert::{ConvertOptions, Converter};
use md2pdf::error::Md2PdfError;
use md2pdf::pdf_engine::PdfEngine;
use md2pdf::theme::ThemeManager;
use md2pdf::theme_builder::ThemeWizard;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "md2pdf")]
#[command(about = "Convert Markdown files to PDF with custom styles")]
#[command(disable_version_flag = true)]
#[command(after_help = "Examples:
  md2pdf document.md
  md2pdf document.md -o report.pdf --theme dark
  md2pdf *.md --output-dir pdfs
  md2pdf ch1.md ch2.md ch3.md --merge -o book.pdf
  md2pdf --theme-list
  md2pdf --create-theme")]
struct Cli {
    #[arg(help = "Input Markdown file(s)")]
    inputs: Vec<PathBuf>,

    #[arg(
        short = 'o',
        long = "output-name",
        help = "Output PDF file (default: input name with .pdf; merge: merged_output.pdf)"
    )]
    output_name: Option<PathBuf>,

    #[arg(long, help = "Directory for batch output PDFs (default: next to each input)")]
    output_dir: Option<PathBuf>,

    #[arg(long, help = "Theme name from the themes directory (default: default)")]
    theme: Option<String>,

    #[arg(long, help = "Custom CSS file; takes precedence over --theme")]
    css: Option<PathBuf>,

    #[arg(long, help = "Merge all inputs into a single PDF")]
    merge: bool,

    #[arg(long, help = "Do not insert page breaks between merged files")]
    no_auto_break: bool,

    #[arg(short = 'p', long, help = "Open the PDF after generation")]
    preview: bool,

    #[arg(long, help = "List available themes")]
    theme_list: bool,

    #[arg(long, help = "Create a new theme interactively")]
    create_theme: bool,

    #[arg(long, help = "JSON configuration file")]
    config: Option<PathBuf>,

    #[arg(long, help = "Enable debug logging")]
    verbose: bool,

    #[arg(short = 'v', long, help = "Print version")]
    version: bool,
}

/// Rewrite the multi-letter short flags older scripts use into long flags.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some("-on") => OsString::from("--output-name"),
            Some("-od") => OsString::from("--output-dir"),
            Some("-thl") => OsString::from("--theme-list"),
            _ => arg,
        })
        .collect()
}

fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder
        .format(|buf, record| {
            let level = match record.level() {
                log::Level::Error => "Error",
                log::Level::Warn => "Warning",
                log::Level::Info => "Info",
                log::Level::Debug => "Debug",
                log::Level::Trace => "Trace",
            };
            writeln!(buf, "{}: {}", level, record.args())
        })
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    if cli.version {
        println!("md2pdf {}", config::VERSION);
        return Ok(ExitCode::SUCCESS);
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!("Settings: {:?}", settings);

    if cli.theme_list {
        display_themes(&ThemeManager::from_settings(&settings));
        return Ok(ExitCode::SUCCESS);
    }

    if cli.create_theme {
        return create_theme(ThemeManager::from_settings(&settings));
    }

    if cli.inputs.is_empty() {
        Cli::command()
            .error(
                ErrorKind::MissingRequiredArgument,
                "at least one input file is required",
            )
            .exit();
    }

    let mut options = ConvertOptions::new(settings).with_custom_css(cli.css);
    if let Some(theme) = cli.theme {
        options = options.with_theme(theme);
    }
    let converter = Converter::setup(options, PdfEngine::locate)?;

    let output = cli.output_name.as_deref();

    if cli.merge {
        if cli.output_dir.is_some() {
            warn!("--output-dir does not apply to merge mode; use --output-name instead");
        }
        converter.convert_merge(&cli.inputs, output, !cli.no_auto_break, cli.preview)?;
        return Ok(ExitCode::SUCCESS);
    }

    if cli.inputs.len() > 1 {
        if output.is_some() {
            warn!("--output-name is ignored in batch mode; use --output-dir instead");
        }
        let summary =
            converter.convert_batch(&cli.inputs, cli.output_dir.as_deref(), cli.preview)?;
        if summary.all_failed() {
            return Ok(ExitCode::FAILURE);
        }
        return Ok(ExitCode::SUCCESS);
    }

    if cli.output_dir.is_some() {
        warn!("--output-dir only applies to batch mode; use --output-name for a single file");
    }
    converter.convert_single(&cli.inputs[0], output, cli.preview)?;
    Ok(ExitCode::SUCCESS)
}

fn display_themes(themes: &ThemeManager) {
    let names = themes.list_themes();
    if names.is_empty() {
        println!("No themes found in themes directory.");
        return;
    }

    println!("Available themes:");
    for name in names {
        println!("  - {}", name);
    }
    println!();
    println!("Usage: md2pdf document.md --theme <theme-name>");
}

fn create_theme(themes: ThemeManager) -> anyhow::Result<ExitCode> {
    let stdin = io::stdin();
    let mut wizard = ThemeWizard::new(stdin.lock(), io::stdout(), themes);

    match wizard.run() {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(Md2PdfError::Cancelled) => {
            println!();
            println!("Theme creation cancelled.");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(e).context("Theme creation failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn test_normalize_args_rewrites_legacy_flags() {
        let normalized = normalize_args(args(&[
            "md2pdf", "a.md", "-on", "out.pdf", "-thl", "-od", "d",
        ]));
        assert_eq!(
            normalized,
            args(&[
                "md2pdf",
                "a.md",
                "--output-name",
                "out.pdf",
                "--theme-list",
                "--output-dir",
                "d"
            ])
        );
    }

    #[test]
    fn test_normalize_args_leaves_values_alone() {
        let normalized = normalize_args(args(&["md2pdf", "-o", "-on.pdf", "on.md"]));
        assert_eq!(normalized, args(&["md2pdf", "-o", "-on.pdf", "on.md"]));
    }

    #[test]
    fn test_cli_parses_merge_flags() {
        let cli = Cli::parse_from(normalize_args(args(&[
            "md2pdf",
            "a.md",
            "b.md",
            "--merge",
            "--no-auto-break",
            "-on",
            "book.pdf",
            "--theme",
            "dark",
        ])));
        assert_eq!(cli.inputs.len(), 2);
        assert!(cli.merge);
        assert!(cli.no_auto_break);
        assert_eq!(cli.output_name, Some(PathBuf::from("book.pdf")));
        assert_eq!(cli.theme.as_deref(), Some("dark"));
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from(args(&["md2pdf", "-v", "-p"]));
        assert!(cli.version);
        assert!(cli.preview);
        assert!(cli.inputs.is_empty());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}

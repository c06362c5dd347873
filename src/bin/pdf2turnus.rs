//! CLI binary for pdf2turnus.
//!
//! A thin shim over the library crate: maps subcommand flags to
//! `TemplateConfig` and prints JSON, statistics tables and batch summaries.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use pdf2turnus::{
    generate_duty_images, parse_schedule_file, scan_markers_file, stats, TemplateConfig,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Parse a roster, JSON to stdout
  pdf2turnus parse turnus.pdf --template 2024

  # Parse to a file with the statistics table
  pdf2turnus parse turnus.pdf --template 2024 -o turnus.json --stats

  # Keep schedules whose page carried no name
  pdf2turnus parse turnus.pdf --template 2024 --keep-unnamed

  # Scan a strike list for continuation/split-day markers
  pdf2turnus markers strekliste.pdf --template 2024 -o markers.json

  # Generate per-duty row images, overwriting existing files
  pdf2turnus images strekliste.pdf --template 2024 --out-dir duty-img --force

TEMPLATE VERSIONS:
  2023    rosters printed with the pre-2024 layout (6 pt higher on the page)
  2024    current layout (default)

ENVIRONMENT VARIABLES:
  PDFIUM_LIB_PATH   Path to an existing libpdfium directory
  RUST_LOG          Tracing filter, overrides --verbose/--quiet
"#;

/// Parse turnus roster PDFs into structured schedules.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2turnus",
    version,
    about = "Parse turnus roster PDFs into structured schedules",
    long_about = "Parse Norwegian turnus roster PDFs (6 weeks × 7 days, two schedules per page) \
into structured JSON with per-day start/end times, duty codes and continuation flags. \
Also scans strike-list documents for markers and generates per-duty row images.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2TURNUS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors and the requested result.
    #[arg(short, long, global = true, env = "PDF2TURNUS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a roster PDF into Schedule Store JSON.
    Parse {
        /// Roster PDF path.
        input: PathBuf,

        /// Template version: 2023 or 2024.
        #[arg(long, env = "PDF2TURNUS_TEMPLATE", default_value = "2024")]
        template: String,

        /// Write JSON to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the per-schedule statistics table.
        #[arg(long)]
        stats: bool,

        /// Keep schedules whose page carried no discoverable name.
        #[arg(long)]
        keep_unnamed: bool,
    },

    /// Scan a strike-list PDF for continuation and split-day markers.
    Markers {
        /// Strike-list PDF path.
        input: PathBuf,

        /// Template version: 2023 or 2024.
        #[arg(long, env = "PDF2TURNUS_TEMPLATE", default_value = "2024")]
        template: String,

        /// Write JSON to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate per-duty cropped PNGs from a strike-list PDF.
    Images {
        /// Strike-list PDF path.
        input: PathBuf,

        /// Template version: 2023 or 2024.
        #[arg(long, env = "PDF2TURNUS_TEMPLATE", default_value = "2024")]
        template: String,

        /// Output directory for the PNGs.
        #[arg(long, env = "PDF2TURNUS_OUT_DIR")]
        out_dir: PathBuf,

        /// Regenerate images that already exist.
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Parse {
            input,
            template,
            output,
            stats: show_stats,
            keep_unnamed,
        } => run_parse(&input, &template, output.as_deref(), show_stats, keep_unnamed, cli.quiet),
        Command::Markers {
            input,
            template,
            output,
        } => run_markers(&input, &template, output.as_deref()),
        Command::Images {
            input,
            template,
            out_dir,
            force,
        } => run_images(&input, &template, &out_dir, force, cli.quiet),
    }
}

fn run_parse(
    input: &std::path::Path,
    template: &str,
    output: Option<&std::path::Path>,
    show_stats: bool,
    keep_unnamed: bool,
    quiet: bool,
) -> Result<()> {
    let config = TemplateConfig::for_version(template)?;
    let mut store =
        parse_schedule_file(input, &config).with_context(|| format!("Parsing {input:?}"))?;
    if !keep_unnamed {
        store.retain_named();
    }

    let json = serde_json::to_string_pretty(&store).context("Serialising schedule store")?;
    write_result(&json, output)?;

    if !quiet {
        eprintln!(
            "{} {} schedules parsed",
            green("✔"),
            bold(&store.schedules.len().to_string())
        );
    }

    if show_stats {
        print_stats_table(&stats::aggregate_store(&store));
    }
    Ok(())
}

fn run_markers(
    input: &std::path::Path,
    template: &str,
    output: Option<&std::path::Path>,
) -> Result<()> {
    let config = TemplateConfig::for_version(template)?;
    let scan = scan_markers_file(input, &config).with_context(|| format!("Scanning {input:?}"))?;

    let json = serde_json::to_string_pretty(&scan).context("Serialising marker scan")?;
    write_result(&json, output)?;

    eprintln!(
        "{} {} pairs, {} split-day duties",
        green("✔"),
        bold(&scan.pairs.len().to_string()),
        bold(&scan.split_day.len().to_string())
    );
    Ok(())
}

fn run_images(
    input: &std::path::Path,
    template: &str,
    out_dir: &std::path::Path,
    force: bool,
    quiet: bool,
) -> Result<()> {
    let config = TemplateConfig::for_version(template)?;
    let path = input.to_path_buf();

    let bar = if quiet {
        None
    } else {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
        );
        bar.set_prefix("Cropping");
        bar.set_message("rendering strike-list pages…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Some(bar)
    };

    let pdfium = pdf2turnus::parse::bind_pdfium()?;
    let resolved = pdf2turnus::pipeline::input::resolve_local(&path)?;
    let source = pdf2turnus::PdfiumSource::open(&pdfium, &resolved, &config)?;
    let report = generate_duty_images(&source, &config, out_dir, force)
        .with_context(|| format!("Generating duty images from {input:?}"))?;

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    for err in &report.errors {
        eprintln!("  {} {}", red("✗"), err);
    }
    eprintln!(
        "{} {} generated, {} skipped, {} errored  →  {}",
        if report.errors.is_empty() {
            green("✔")
        } else {
            cyan("⚠")
        },
        bold(&report.generated.to_string()),
        report.skipped,
        if report.errors.is_empty() {
            report.errors.len().to_string()
        } else {
            red(&report.errors.len().to_string())
        },
        bold(&out_dir.display().to_string()),
    );
    Ok(())
}

/// Write JSON to the output file, or stdout when none given.
fn write_result(json: &str, output: Option<&std::path::Path>) -> Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Creating {parent:?}"))?;
            }
            std::fs::write(path, json).with_context(|| format!("Writing {path:?}"))?;
            eprintln!("{} {}", dim("wrote"), bold(&path.display().to_string()));
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(json.as_bytes()).context("Writing to stdout")?;
            handle.write_all(b"\n").ok();
        }
    }
    Ok(())
}

fn print_stats_table(rows: &[stats::ScheduleStats]) {
    eprintln!(
        "{}",
        bold("schedule      shifts  early  <06  aftn  <20  night  wknd-d  wknd-h   day-h   aft-h  night-h")
    );
    for r in rows {
        eprintln!(
            "{:<13} {:>6} {:>6} {:>4} {:>5} {:>4} {:>6} {:>7} {:>7.1} {:>7.1} {:>7.1} {:>8.1}",
            r.name,
            r.shift_count,
            r.early_count,
            r.before_six_count,
            r.afternoon_count,
            r.afternoon_before_20_count,
            r.night_count,
            r.weekend_day_count,
            r.weekend_hours,
            r.weekend_daytime_hours,
            r.weekend_afternoon_hours,
            r.weekend_night_hours,
        );
    }
}

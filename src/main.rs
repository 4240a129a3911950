//! folder-size - folder size reports, duplicate subtree detection and
//! sync-collision cleanup.
//!
//! Usage:
//!   folder-size [PATH]              Report folder sizes
//!   folder-size find-dups [PATH]    List structurally identical directories
//!   folder-size fix-drive [PATH]    Reconcile `name (1).ext` sync copies
//!   folder-size --help              Show help

use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result, bail};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use foldersize_analyze::{
    DuplicateTreeConfig, DuplicateTreeFinder, LineLevel, ReconcileConfig, Reconciler,
};
use foldersize_core::SizeConfig;
use foldersize_scan::SizeAggregator;

#[derive(Parser)]
#[command(
    name = "folder-size",
    version,
    about = "Report folder sizes, find duplicate trees and clean up sync copies",
    long_about = "folder-size shows where disk space goes.\n\n\
                  Run `folder-size [PATH]` for a size report, or use the \
                  subcommands to look for duplicated directory trees and to \
                  reconcile `name (1).ext` copies left behind by sync clients."
)]
struct Cli {
    /// Path to report on (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Nesting levels below the root that are always listed (-1 lists none)
    #[arg(short, long, default_value = "1", allow_negative_numbers = true)]
    depth: i32,

    /// Folder name to list wherever it occurs (repeatable)
    #[arg(short, long = "separate", value_name = "NAME")]
    separate: Vec<String>,

    /// Also list any folder larger than 500 MB
    #[arg(short = 'l', long)]
    show_large: bool,

    /// Show full paths instead of entry names
    #[arg(short, long)]
    full_name: bool,

    /// Also write the report to this file
    #[arg(long, value_name = "FILE")]
    dump: Option<PathBuf>,

    /// Output format
    #[arg(long, default_value = "text")]
    format: OutputFormat,

    /// Start without asking for confirmation
    #[arg(short = 'y', long)]
    yes: bool,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// List directories whose trees have identical names and layout
    FindDups {
        /// Path to search
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Directory name glob to skip (replaces the default list; repeatable)
        #[arg(short, long, value_name = "GLOB")]
        exclude: Vec<String>,

        /// File receiving a copy of the listing
        #[arg(long, default_value = "FindDups.log", value_name = "FILE")]
        log: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },

    /// Reconcile sync-client collision copies (dry run unless --run)
    FixDrive {
        /// Path to reconcile
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Actually delete and rename files
        #[arg(long)]
        run: bool,

        /// Newline-delimited list of absolute paths to leave alone
        #[arg(long, value_name = "FILE")]
        exclusions: Option<PathBuf>,

        /// Also write the decision log to this file
        #[arg(long, value_name = "FILE")]
        dump: Option<PathBuf>,

        /// Do not byte-compare pairs that both hold data
        #[arg(long)]
        no_compare: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Command::FindDups {
            path,
            exclude,
            log,
            format,
        }) => run_find_dups(&path, exclude, &log, format),
        Some(Command::FixDrive {
            path,
            run,
            exclusions,
            dump,
            no_compare,
        }) => run_fix_drive(&path, run, exclusions.as_deref(), dump.as_deref(), no_compare),
        None => run_sizes(&cli),
    }
}

/// Log to stderr. `RUST_LOG` wins; otherwise warnings, or debug with `-v`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Fail early on a root that cannot be walked.
fn resolve_root(path: &Path) -> Result<PathBuf> {
    let root = path
        .canonicalize()
        .with_context(|| format!("Invalid path: {}", path.display()))?;
    if !root.is_dir() {
        bail!("Not a directory: {}", root.display());
    }
    Ok(root)
}

/// Run the folder size report.
fn run_sizes(cli: &Cli) -> Result<()> {
    let root = resolve_root(&cli.path)?;

    let config = SizeConfig::builder()
        .root(root.clone())
        .max_depth(cli.depth)
        .always_show(cli.separate.clone())
        .show_large_threshold(cli.show_large.then_some(SizeConfig::LARGE_FOLDER_THRESHOLD))
        .build()
        .context("Invalid size configuration")?;

    if !cli.yes {
        print_settings(cli, &config);
        wait_for_enter()?;
    }

    eprintln!("Running...");
    let report = SizeAggregator::new(config)
        .aggregate()
        .context("Size aggregation failed")?;
    debug!(
        dirs = report.dirs,
        files = report.files,
        elapsed_ms = report.duration.as_millis() as u64,
        "walk finished"
    );

    let lines = match cli.format {
        OutputFormat::Text => report.lines(cli.full_name),
        OutputFormat::Json => vec![serde_json::to_string_pretty(&report)?],
    };
    for line in &lines {
        println!("{line}");
    }
    if let Some(dump) = &cli.dump {
        write_lines(dump, lines.iter().map(String::as_str))?;
    }

    report_warnings(report.warnings.len());
    Ok(())
}

fn print_settings(cli: &Cli, config: &SizeConfig) {
    println!("Path: {}", config.root.display());
    println!("Depth: {}", config.max_depth);
    if config.always_show.is_empty() {
        println!("Separate: (none)");
    } else {
        println!("Separate: {}", config.always_show.join(", "));
    }
    println!("Show large folders: {}", cli.show_large);
    println!("Full names: {}", cli.full_name);
    if let Some(dump) = &cli.dump {
        println!("Dump file: {}", dump.display());
    }
    println!();
    println!("Press Enter to start...");
}

fn wait_for_enter() -> Result<()> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read confirmation")?;
    Ok(())
}

/// Run duplicate subtree detection.
fn run_find_dups(path: &Path, exclude: Vec<String>, log: &Path, format: OutputFormat) -> Result<()> {
    let root = resolve_root(path)?;

    let mut builder = DuplicateTreeConfig::builder();
    if !exclude.is_empty() {
        builder.exclude_names(exclude);
    }
    let config = builder.build().context("Invalid duplicate search configuration")?;

    eprintln!("Hashing {}...", root.display());
    let report = DuplicateTreeFinder::with_config(config)
        .find_duplicates(&root)
        .context("Duplicate search failed")?;

    match format {
        OutputFormat::Text => {
            let lines = report.lines();
            if lines.is_empty() {
                println!("No duplicate trees found.");
            }
            for line in &lines {
                println!("{line}");
            }
            write_lines(log, lines.iter().map(String::as_str))?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)?;
            println!("{json}");
            std::fs::write(log, json)
                .with_context(|| format!("Failed to write {}", log.display()))?;
        }
    }
    eprintln!("Listing written to {}", log.display());

    report_warnings(report.warnings.len());
    Ok(())
}

/// Run collision reconciliation.
fn run_fix_drive(
    path: &Path,
    run: bool,
    exclusions: Option<&Path>,
    dump: Option<&Path>,
    no_compare: bool,
) -> Result<()> {
    let root = resolve_root(path)?;

    let exclusions = match exclusions {
        Some(file) => ReconcileConfig::load_exclusions(file)
            .with_context(|| format!("Failed to read exclusions from {}", file.display()))?,
        None => Default::default(),
    };
    let config = ReconcileConfig::builder()
        .dry_run(!run)
        .exclusions(exclusions)
        .compare_contents(!no_compare)
        .build()
        .context("Invalid reconcile configuration")?;

    if !run {
        eprintln!("Dry run: nothing will be changed. Pass --run to apply.");
    }
    let report = Reconciler::with_config(config)
        .reconcile(&root)
        .context("Reconciliation failed")?;

    for line in &report.lines {
        match line.level {
            LineLevel::Error => eprintln!("{}", line.text),
            LineLevel::Info | LineLevel::Flag => println!("{}", line.text),
        }
    }
    if let Some(dump) = dump {
        let rendered: Vec<String> = report
            .lines
            .iter()
            .map(|line| match line.level {
                LineLevel::Error => format!("[ERROR]: {}", line.text),
                LineLevel::Info | LineLevel::Flag => line.text.clone(),
            })
            .collect();
        write_lines(dump, rendered.iter().map(String::as_str))?;
    }

    eprintln!(
        "{} pair(s), {} action(s), {} need review, {} failed",
        report.groups.len(),
        report.actions().len(),
        report.conflict_count(),
        report.failure_count()
    );
    report_warnings(report.warnings.len());
    Ok(())
}

fn write_lines<'a>(path: &Path, lines: impl IntoIterator<Item = &'a str>) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn report_warnings(count: usize) {
    if count > 0 {
        eprintln!("{count} path(s) could not be read and were skipped");
    }
}

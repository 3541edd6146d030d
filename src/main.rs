//! twinscan - find duplicate files and directories by content fingerprint.
//!
//! Usage:
//!   twinscan PATH --duplicates                 Every duplicate entry
//!   twinscan PATH --duplicate-files            Duplicate files only
//!   twinscan PATH --duplicate-music            Duplicate music files
//!   twinscan PATH --find-images                Every image file
//!   twinscan PATH --export index.csv           Save the index
//!   twinscan --import index.csv --duplicates   Report from a saved index
//!   twinscan --help                            Show help

mod report;
mod settings;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing_subscriber::EnvFilter;

use twinscan_analyze::{
    CategoryTables, DirectoryAggregator, DuplicateClassifier, DuplicateFilter, MediaCategory,
    duplicates, find_category, to_rows,
};
use twinscan_core::{DEFAULT_PREFIX_BYTES, snapshot};
use twinscan_scan::{JwalkScanner, ScanConfig, ScanProgress, TreeIndex};

use crate::report::{TextRenderer, View, render_json};
use crate::settings::{ScanSettings, Settings};

#[derive(Parser)]
#[command(
    name = "twinscan",
    version,
    about = "Find duplicate files and directories by content fingerprint",
    long_about = "twinscan fingerprints the first bytes of every file below PATH, derives a \
                  digest for every directory from its contents and reports entries that \
                  share digest, size and kind.\n\n\
                  A saved index can be loaded with --import and extended by scanning more \
                  paths before reporting."
)]
struct Cli {
    /// File or directory to scan
    #[arg(required_unless_present = "import")]
    path: Option<PathBuf>,

    /// List every duplicate entry
    #[arg(long)]
    duplicates: bool,

    /// List duplicate files
    #[arg(long)]
    duplicate_files: bool,

    /// List duplicate directories
    #[arg(long)]
    duplicate_directories: bool,

    /// List duplicate music files
    #[arg(long)]
    duplicate_music: bool,

    /// List duplicate video files
    #[arg(long)]
    duplicate_videos: bool,

    /// List duplicate image files
    #[arg(long)]
    duplicate_images: bool,

    /// List duplicate document files
    #[arg(long)]
    duplicate_documents: bool,

    /// List every music file
    #[arg(long)]
    find_music: bool,

    /// List every video file
    #[arg(long)]
    find_videos: bool,

    /// List every image file
    #[arg(long)]
    find_images: bool,

    /// List every document file
    #[arg(long)]
    find_documents: bool,

    /// Load a previously exported index before scanning
    #[arg(long, value_name = "FILE")]
    import: Option<PathBuf>,

    /// Write the final index to a CSV snapshot
    #[arg(long, value_name = "FILE")]
    export: Option<PathBuf>,

    /// Leading bytes fingerprinted per file
    #[arg(long, value_name = "N")]
    prefix_bytes: Option<u64>,

    /// Fingerprinting threads (0 = one per core)
    #[arg(short = 'j', long, value_name = "N")]
    threads: Option<usize>,

    /// Follow symbolic links
    #[arg(long)]
    follow_symlinks: bool,

    /// Drop index entries under PATH that no longer exist
    #[arg(long)]
    prune_stale: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Settings file (defaults to <config dir>/twinscan/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// A view requested on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Duplicates(DuplicateFilter),
    Find(MediaCategory),
}

impl Request {
    fn title(self) -> String {
        match self {
            Request::Duplicates(DuplicateFilter::All) => "Duplicates".to_string(),
            Request::Duplicates(DuplicateFilter::Files) => "Duplicate files".to_string(),
            Request::Duplicates(DuplicateFilter::Directories) => "Duplicate directories".to_string(),
            Request::Duplicates(DuplicateFilter::Category(category)) => {
                format!("Duplicate {category} files")
            }
            Request::Find(category) => format!("All {category} files"),
        }
    }

    fn view(self, index: &TreeIndex, tables: &CategoryTables) -> View {
        let entries = match self {
            Request::Duplicates(filter) => duplicates(index, filter, tables),
            Request::Find(category) => find_category(index, category, tables),
        };
        View::new(self.title(), to_rows(&entries))
    }
}

impl Cli {
    /// Requested views in a fixed order.
    fn requests(&self) -> Vec<Request> {
        use DuplicateFilter::*;
        use MediaCategory::*;

        [
            (self.duplicates, Request::Duplicates(All)),
            (self.duplicate_files, Request::Duplicates(Files)),
            (self.duplicate_directories, Request::Duplicates(Directories)),
            (self.duplicate_music, Request::Duplicates(Category(Music))),
            (self.duplicate_videos, Request::Duplicates(Category(Video))),
            (self.duplicate_images, Request::Duplicates(Category(Image))),
            (self.duplicate_documents, Request::Duplicates(Category(Document))),
            (self.find_music, Request::Find(Music)),
            (self.find_videos, Request::Find(Video)),
            (self.find_images, Request::Find(Image)),
            (self.find_documents, Request::Find(Document)),
        ]
        .into_iter()
        .filter_map(|(wanted, request)| wanted.then_some(request))
        .collect()
    }

    fn scan_config(&self, root: &Path, defaults: &ScanSettings) -> Result<ScanConfig> {
        let mut builder = ScanConfig::builder();
        builder
            .root(root)
            .prefix_bytes(
                self.prefix_bytes
                    .or(defaults.prefix_bytes)
                    .unwrap_or(DEFAULT_PREFIX_BYTES),
            )
            .threads(self.threads.or(defaults.threads).unwrap_or(0))
            .follow_symlinks(self.follow_symlinks || defaults.follow_symlinks)
            .prune_stale(self.prune_stale || defaults.prune_stale)
            .ignore_patterns(defaults.ignore_patterns.clone());
        if let Some(include_hidden) = defaults.include_hidden {
            builder.include_hidden(include_hidden);
        }
        builder.build().context("Invalid scan configuration")
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let settings = Settings::load(cli.config.as_deref())?;
    let mut index = TreeIndex::new();

    if let Some(file) = &cli.import {
        let imported = snapshot::import_from_path(&mut index, file)
            .with_context(|| format!("Failed to import {}", file.display()))?;
        tracing::info!(
            rows = imported.imported,
            rejected = imported.rejected.len(),
            "imported {}",
            file.display()
        );
    }

    if let Some(path) = &cli.path {
        let config = cli.scan_config(path, &settings.scan)?;
        run_scan(&config, &mut index)?;
    }

    let aggregation = DirectoryAggregator::new()
        .aggregate(&mut index)
        .context("Directory aggregation failed")?;
    let report = DuplicateClassifier::new().classify(&mut index);
    tracing::info!(
        passes = aggregation.passes,
        unresolved = aggregation.unresolved.len(),
        groups = report.group_count(),
        duplicates = report.duplicate_entries,
        "analysis complete"
    );

    let views: Vec<View> = cli
        .requests()
        .into_iter()
        .map(|request| request.view(&index, &settings.categories))
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match cli.format {
        OutputFormat::Text => {
            let renderer = TextRenderer::new(settings.report.clone());
            for view in &views {
                renderer.render(view, &mut out)?;
            }
        }
        OutputFormat::Json => render_json(&views, &mut out)?,
    }
    out.flush()?;

    if let Some(file) = &cli.export {
        let rows = snapshot::export_to_path(&index, file)
            .with_context(|| format!("Failed to export {}", file.display()))?;
        tracing::info!(rows, "exported {}", file.display());
    }

    Ok(())
}

/// Scan one root into the index, logging progress while it runs.
fn run_scan(config: &ScanConfig, index: &mut TreeIndex) -> Result<()> {
    tracing::info!("scanning {}", config.root.display());

    let scanner = JwalkScanner::new();
    let progress = scanner.subscribe();
    let watcher = thread::spawn(move || log_progress(progress));

    let outcome = scanner.scan(config, index);
    // Closes the progress channel so the watcher exits.
    drop(scanner);
    let _ = watcher.join();

    let outcome =
        outcome.with_context(|| format!("Failed to scan {}", config.root.display()))?;
    for warning in &outcome.warnings {
        tracing::warn!(kind = ?warning.kind, "{}", warning.message);
    }
    tracing::info!(
        files = outcome.files_indexed,
        dirs = outcome.dirs_indexed,
        pruned = outcome.pruned,
        skipped = outcome.warnings.len(),
        incomplete = outcome.incomplete_dirs,
        "scanned in {:.2}s",
        outcome.scan_duration.as_secs_f64()
    );
    Ok(())
}

fn log_progress(mut progress: broadcast::Receiver<ScanProgress>) {
    loop {
        match progress.blocking_recv() {
            Ok(update) => tracing::debug!(
                files = update.files_fingerprinted,
                dirs = update.dirs_found,
                bytes = update.bytes_read,
                "{:.0} files/s",
                update.files_per_second()
            ),
            Err(RecvError::Lagged(_)) => continue,
            Err(RecvError::Closed) => break,
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,twinscan={level},twinscan_core={level},twinscan_scan={level},twinscan_analyze={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .init();
}

mod app;
mod ui;

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use cbse_paper_downloader::logging::{self, DEFAULT_LOG_FILE};
use cbse_paper_downloader::{AcademicYear, DownloadCoordinator, DownloaderConfig, Subject};
use clap::Parser;
use iced::window;

/// Download CBSE Class X sample papers for every subject and year.
#[derive(Parser, Debug)]
#[command(name = "cbse-paper-downloader", version)]
struct Cli {
    /// Download location (default: ~/Downloads/CBSE_Papers)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// Run the batch in the terminal instead of opening the window
    #[arg(long)]
    headless: bool,

    /// Number of (subject, year) pairs processed at once
    #[arg(short, long, default_value_t = 5)]
    workers: usize,

    /// Archive root the URL templates are appended to
    #[arg(long, value_parser = parse_base_url)]
    base_url: Option<String>,

    /// Only these subjects (science, maths, english, sst, hindi-b)
    #[arg(long = "subject")]
    subjects: Vec<Subject>,

    /// Only these academic years, e.g. 2020_21 or 2020
    #[arg(long = "year")]
    years: Vec<AcademicYear>,

    /// Write a JSON report with one entry per (subject, year)
    #[arg(long)]
    report: Option<PathBuf>,

    /// Detailed log file
    #[arg(long, default_value = DEFAULT_LOG_FILE)]
    log_file: PathBuf,
}

fn parse_base_url(s: &str) -> Result<String, String> {
    url::Url::parse(s)
        .map(|url| url.to_string())
        .map_err(|e| format!("invalid base URL '{}': {}", s, e))
}

impl Cli {
    fn config(&self) -> DownloaderConfig {
        let mut config = DownloaderConfig {
            workers: self.workers,
            ..Default::default()
        };
        if let Some(dir) = &self.dir {
            config.base_dir = dir.clone();
        }
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if !self.subjects.is_empty() {
            config.subjects = self.subjects.clone();
        }
        if !self.years.is_empty() {
            config.years = self.years.clone();
        }
        config
    }
}

fn run_headless(cli: &Cli, config: DownloaderConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("failed to start tokio runtime")?;
    let coordinator = DownloadCoordinator::new(config)?;

    let report = runtime.block_on(coordinator.download_all());

    println!(
        "Done: {} downloaded, {} already present, {} not found, {} failed",
        report.downloaded(),
        report.already_present(),
        report.not_found(),
        report.failed()
    );

    if let Some(path) = &cli.report {
        let file = File::create(path)
            .with_context(|| format!("failed to create report {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &report)
            .context("failed to write report")?;
        tracing::info!(path = %path.display(), "Report written");
    }

    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(&cli.log_file) {
        logging::init_logging_stderr();
        tracing::warn!("file logging disabled: {:#}", e);
    }

    let config = cli.config();

    if cli.headless {
        return run_headless(&cli, config);
    }

    iced::application(
        move || app::DownloadApp::new(config.clone()),
        app::update,
        app::view,
    )
    .title("CBSE Sample Paper Downloader")
    .window(window::Settings {
        size: iced::Size::new(600.0, 400.0),
        ..Default::default()
    })
    .run()
    .map_err(|e| anyhow::anyhow!("GUI exited with an error: {}", e))
}

use std::path::PathBuf;
use std::time::Duration;

use crate::catalog::{Subject, DEFAULT_BASE_URL};
use crate::domain::{AcademicYear, DownloadTask};
use crate::utils::default_download_dir;

/// Browser-like agent string; the archive rejects some default client agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Configuration for the archive client and the batch coordinator
#[derive(Debug, Clone)]
pub struct DownloaderConfig {
    pub base_url: String,
    pub user_agent: String,
    /// Upper bound for a single existence probe
    pub probe_timeout: Duration,
    /// Number of tasks processed concurrently
    pub workers: usize,
    pub base_dir: PathBuf,
    pub subjects: Vec<Subject>,
    pub years: Vec<AcademicYear>,
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            probe_timeout: Duration::from_secs(10),
            workers: 5,
            base_dir: default_download_dir(),
            subjects: Subject::ALL.to_vec(),
            years: AcademicYear::all(),
        }
    }
}

impl DownloaderConfig {
    /// Subject-major cross product of the configured subjects and years.
    pub fn tasks(&self) -> Vec<DownloadTask> {
        self.subjects
            .iter()
            .flat_map(|&subject| {
                self.years
                    .iter()
                    .map(move |&year| DownloadTask::new(subject, year))
            })
            .collect()
    }
}

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

use crate::catalog::Subject;
use crate::domain::AppError;
use crate::utils::sanitize_filename;

static YEAR_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})(?:_(\d{2}))?$").expect("academic year pattern is valid")
});

/// Academic session starting in `start`, rendered as `2014_15`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AcademicYear {
    start: u16,
}

impl AcademicYear {
    /// First session the archive publishes Class X sample papers for.
    pub const FIRST: u16 = 2014;
    /// Last session covered by a default run.
    pub const LAST: u16 = 2024;

    pub fn new(start: u16) -> Self {
        Self { start }
    }

    pub fn start(self) -> u16 {
        self.start
    }

    /// The fixed historical range, oldest first.
    pub fn all() -> Vec<AcademicYear> {
        (Self::FIRST..=Self::LAST).map(AcademicYear::new).collect()
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{:02}", self.start, end_suffix(self.start))
    }
}

/// Two-digit end year; widened so `u16::MAX` does not overflow.
fn end_suffix(start: u16) -> u32 {
    (u32::from(start) + 1) % 100
}

impl FromStr for AcademicYear {
    type Err = AppError;

    /// Accepts either the full token (`2020_21`) or just the start year.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || AppError::InvalidInput(format!("invalid academic year: {s}"));

        let caps = YEAR_TOKEN.captures(s.trim()).ok_or_else(invalid)?;
        let start: u16 = caps[1].parse().map_err(|_| invalid())?;

        if let Some(end) = caps.get(2) {
            let end: u32 = end.as_str().parse().map_err(|_| invalid())?;
            if end != end_suffix(start) {
                return Err(invalid());
            }
        }

        Ok(AcademicYear::new(start))
    }
}

impl Serialize for AcademicYear {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One (subject, academic year) pair scheduled by the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DownloadTask {
    pub subject: Subject,
    pub year: AcademicYear,
}

impl DownloadTask {
    pub fn new(subject: Subject, year: AcademicYear) -> Self {
        Self { subject, year }
    }

    pub fn filename(&self) -> String {
        sanitize_filename(&format!("sample paper_{}_{}.pdf", self.subject, self.year))
    }

    /// `{base}/{subject}/{start}samplepaper/{filename}`
    pub fn destination(&self, base_dir: &Path) -> PathBuf {
        base_dir
            .join(self.subject.key())
            .join(format!("{}samplepaper", self.year.start()))
            .join(self.filename())
    }
}

impl fmt::Display for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.subject, self.year)
    }
}

/// What `fetch` did with a destination path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Downloaded { bytes: u64 },
    AlreadyPresent,
}

/// Terminal state of a single task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Downloaded { url: String, path: PathBuf, bytes: u64 },
    AlreadyPresent { url: String, path: PathBuf },
    NotFound,
    Failed { error: String },
    Crashed { error: String },
}

impl TaskOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            TaskOutcome::Downloaded { .. } | TaskOutcome::AlreadyPresent { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskReport {
    #[serde(flatten)]
    pub task: DownloadTask,
    #[serde(flatten)]
    pub outcome: TaskOutcome,
}

/// Per-task results of one `download_all` run, in completion order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub tasks: Vec<TaskReport>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.tasks.len()
    }

    pub fn downloaded(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Downloaded { .. }))
    }

    pub fn already_present(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::AlreadyPresent { .. }))
    }

    pub fn not_found(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::NotFound))
    }

    /// Transfer failures and crashed tasks.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, TaskOutcome::Failed { .. } | TaskOutcome::Crashed { .. }))
    }

    fn count(&self, pred: impl Fn(&TaskOutcome) -> bool) -> usize {
        self.tasks.iter().filter(|r| pred(&r.outcome)).count()
    }
}

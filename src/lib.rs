//! Bulk downloader for CBSE Class X sample papers.
//!
//! [`DownloadCoordinator::download_all`] probes the archive for every
//! (subject, academic year) pair and saves whatever it finds under the
//! configured base directory. [`DownloadCoordinator::resolve`] and
//! [`DownloadCoordinator::fetch`] expose the two halves for finer control.

pub mod api;
pub mod application;
pub mod catalog;
pub mod domain;
pub mod logging;
pub mod utils;

pub use api::DownloaderConfig;
pub use application::DownloadCoordinator;
pub use catalog::Subject;
pub use domain::{AcademicYear, AppError, BatchReport, DownloadTask, TaskOutcome, TaskReport};

pub mod client;
pub mod models;

pub use client::{ApiError, ArchiveClient, ProbeOutcome, Result};
pub use models::DownloaderConfig;

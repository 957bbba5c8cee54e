pub mod download_coordinator;
pub mod resolver;

pub use download_coordinator::DownloadCoordinator;

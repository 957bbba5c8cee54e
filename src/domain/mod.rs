pub mod error;
pub mod model;

pub use error::AppError;
pub use model::{AcademicYear, BatchReport, DownloadTask, FetchOutcome, TaskOutcome, TaskReport};

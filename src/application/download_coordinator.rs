use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use futures::channel::mpsc::UnboundedSender;
use futures::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::{
    api::{ArchiveClient, DownloaderConfig},
    application::resolver,
    catalog::Subject,
    domain::{AcademicYear, AppError, BatchReport, DownloadTask, FetchOutcome, TaskOutcome, TaskReport},
    utils::partial_path,
};

/// Owns the archive client and configuration; clones share both.
#[derive(Clone)]
pub struct DownloadCoordinator {
    api_client: ArchiveClient,
    config: Arc<DownloaderConfig>,
}

impl DownloadCoordinator {
    pub fn new(config: DownloaderConfig) -> Result<Self, AppError> {
        let api_client = ArchiveClient::new(&config)
            .map_err(|e| AppError::InvalidInput(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_client,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    pub async fn resolve(&self, subject: Subject, year: AcademicYear) -> Result<String, AppError> {
        resolver::resolve(&self.api_client, subject, year).await
    }

    /// Download `url` to `path` unless something is already there.
    ///
    /// The body is streamed into `<path>.part` and renamed on completion, so a
    /// failed transfer never leaves a file at `path`.
    pub async fn fetch(&self, url: &str, path: &Path) -> Result<FetchOutcome, AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                error!(path = %parent.display(), error = %e, "Failed to create directory");
                AppError::Io(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let exists = fs::try_exists(path).await.map_err(|e| {
            error!(path = %path.display(), error = %e, "Failed to check destination");
            AppError::Io(format!("Failed to check {}: {}", path.display(), e))
        })?;
        if exists {
            info!(path = %path.display(), "File already exists");
            return Ok(FetchOutcome::AlreadyPresent);
        }

        let part = partial_path(path);
        let result = match self.stream_to_file(url, &part).await {
            Ok(bytes) => fs::rename(&part, path)
                .await
                .map(|_| bytes)
                .map_err(|e| AppError::Io(format!("Failed to move file into place: {}", e))),
            Err(e) => Err(e),
        };

        match result {
            Ok(bytes) => {
                info!(path = %path.display(), bytes, "Successfully downloaded");
                Ok(FetchOutcome::Downloaded { bytes })
            }
            Err(e) => {
                let _ = fs::remove_file(&part).await;
                error!(%url, error = %e, "Error downloading");
                Err(e)
            }
        }
    }

    async fn stream_to_file(&self, url: &str, part: &Path) -> Result<u64, AppError> {
        let transfer = |reason: String| AppError::Transfer {
            url: url.to_string(),
            reason,
        };

        let (_total, stream) = self
            .api_client
            .download_file_stream(url)
            .await
            .map_err(|e| transfer(e.to_string()))?;
        let mut stream = stream.boxed();

        let mut file = fs::File::create(part)
            .await
            .map_err(|e| AppError::Io(format!("Failed to create file: {}", e)))?;

        let mut downloaded = 0u64;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| transfer(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| AppError::Io(format!("Write error: {}", e)))?;
            downloaded += chunk.len() as u64;
        }

        file.sync_all()
            .await
            .map_err(|e| AppError::Io(format!("Failed to sync file: {}", e)))?;

        Ok(downloaded)
    }

    /// Resolve then fetch one pair. Never fails; the outcome says what happened.
    pub async fn run_task(&self, task: DownloadTask) -> TaskOutcome {
        let url = match self.resolve(task.subject, task.year).await {
            Ok(url) => url,
            Err(AppError::NotFound { .. }) => {
                warn!(%task, "No paper found");
                return TaskOutcome::NotFound;
            }
            Err(e) => {
                error!(%task, error = %e, "Resolution failed");
                return TaskOutcome::Failed {
                    error: e.to_string(),
                };
            }
        };

        let path = task.destination(&self.config.base_dir);
        match self.fetch(&url, &path).await {
            Ok(FetchOutcome::Downloaded { bytes }) => TaskOutcome::Downloaded { url, path, bytes },
            Ok(FetchOutcome::AlreadyPresent) => TaskOutcome::AlreadyPresent { url, path },
            Err(e) => TaskOutcome::Failed {
                error: e.to_string(),
            },
        }
    }

    /// Runs `work` on its own tokio task so a panic stays contained.
    ///
    /// Only plain fields of `task` are logged here; anything that formats the
    /// task belongs inside `work`.
    async fn run_isolated<Fut>(task: DownloadTask, work: Fut) -> TaskOutcome
    where
        Fut: Future<Output = TaskOutcome> + Send + 'static,
    {
        match tokio::spawn(work).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(
                    subject = task.subject.key(),
                    year = task.year.start(),
                    error = %e,
                    "Task aborted unexpectedly"
                );
                TaskOutcome::Crashed {
                    error: e.to_string(),
                }
            }
        }
    }

    pub async fn download_all(&self) -> BatchReport {
        self.download_all_with_progress(None).await
    }

    /// Process every configured (subject, year) pair on a fixed pool of workers.
    ///
    /// Returns once all tasks have finished, whatever their outcome. When a
    /// progress sink is given it receives one report per finished task.
    pub async fn download_all_with_progress(
        &self,
        progress: Option<UnboundedSender<TaskReport>>,
    ) -> BatchReport {
        self.run_batch(progress, |coordinator, task| async move {
            coordinator.run_task(task).await
        })
        .await
    }

    async fn run_batch<F, Fut>(
        &self,
        progress: Option<UnboundedSender<TaskReport>>,
        runner: F,
    ) -> BatchReport
    where
        F: Fn(DownloadCoordinator, DownloadTask) -> Fut + Clone + Send + 'static,
        Fut: Future<Output = TaskOutcome> + Send + 'static,
    {
        let tasks = self.config.tasks();
        let workers = self.config.workers.max(1);
        info!(tasks = tasks.len(), workers, base_dir = %self.config.base_dir.display(), "Starting download of all papers");

        if let Err(e) = fs::create_dir_all(&self.config.base_dir).await {
            error!(error = %e, "Failed to create base directory");
        }

        let (queue_tx, queue_rx) = mpsc::channel::<DownloadTask>(tasks.len().max(1));
        for task in tasks {
            if queue_tx.send(task).await.is_err() {
                break;
            }
        }
        drop(queue_tx);

        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<TaskReport>();

        let mut pool = JoinSet::new();
        for worker_id in 0..workers {
            let queue_rx = Arc::clone(&queue_rx);
            let report_tx = report_tx.clone();
            let coordinator = self.clone();
            let runner = runner.clone();

            pool.spawn(async move {
                loop {
                    let next = queue_rx.lock().await.recv().await;
                    let Some(task) = next else {
                        break;
                    };

                    debug!(
                        worker_id,
                        subject = task.subject.key(),
                        year = task.year.start(),
                        "Picked up task"
                    );
                    let work = runner(coordinator.clone(), task);
                    let outcome = Self::run_isolated(task, work).await;
                    if report_tx.send(TaskReport { task, outcome }).is_err() {
                        break;
                    }
                }
                debug!(worker_id, "Worker idle, queue drained");
            });
        }
        drop(report_tx);

        let mut report = BatchReport::default();
        while let Some(task_report) = report_rx.recv().await {
            if let Some(progress) = &progress {
                let _ = progress.unbounded_send(task_report.clone());
            }
            report.tasks.push(task_report);
        }
        while pool.join_next().await.is_some() {}

        info!(
            total = report.total(),
            downloaded = report.downloaded(),
            already_present = report.already_present(),
            not_found = report.not_found(),
            failed = report.failed(),
            "All downloads completed"
        );

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const SCIENCE_2020: &str =
        "/web_material/SQP/CLASS%20X_2020_21/Science%20SQP%20(2020_21).pdf";

    fn coordinator_for(server: &mockito::ServerGuard, base_dir: &Path) -> DownloadCoordinator {
        DownloadCoordinator::new(DownloaderConfig {
            base_url: format!("{}/web_material/SQP", server.url()),
            probe_timeout: Duration::from_secs(2),
            base_dir: base_dir.to_path_buf(),
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_resolve_and_fetch_end_to_end() {
        let mut server = mockito::Server::new_async().await;
        let _head = server
            .mock("HEAD", SCIENCE_2020)
            .with_status(200)
            .create_async()
            .await;
        let _get = server
            .mock("GET", SCIENCE_2020)
            .with_status(200)
            .with_body("%PDF-1.7 science")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_for(&server, dir.path());
        let task = DownloadTask::new(Subject::Science, AcademicYear::new(2020));

        let url = coordinator.resolve(task.subject, task.year).await.unwrap();
        assert_eq!(url, format!("{}{}", server.url(), SCIENCE_2020));

        let path = task.destination(dir.path());
        let outcome = coordinator.fetch(&url, &path).await.unwrap();

        assert_eq!(outcome, FetchOutcome::Downloaded { bytes: 16 });
        assert_eq!(
            path,
            dir.path()
                .join("science")
                .join("2020samplepaper")
                .join("sample paper_science_2020_21.pdf")
        );
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 science");
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn test_fetch_is_idempotent() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/web_material/SQP/paper.pdf")
            .with_status(200)
            .with_body("first")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_for(&server, dir.path());
        let url = format!("{}/web_material/SQP/paper.pdf", server.url());
        let path = dir.path().join("nested").join("paper.pdf");

        let first = coordinator.fetch(&url, &path).await.unwrap();
        let second = coordinator.fetch(&url, &path).await.unwrap();

        assert_eq!(first, FetchOutcome::Downloaded { bytes: 5 });
        assert_eq!(second, FetchOutcome::AlreadyPresent);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first");
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_existing_file_is_never_overwritten() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/web_material/SQP/paper.pdf")
            .with_status(200)
            .with_body("fresh")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("paper.pdf");
        std::fs::write(&path, "stale").unwrap();

        let coordinator = coordinator_for(&server, dir.path());
        let url = format!("{}/web_material/SQP/paper.pdf", server.url());
        let outcome = coordinator.fetch(&url, &path).await.unwrap();

        assert_eq!(outcome, FetchOutcome::AlreadyPresent);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "stale");
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_transfer_leaves_no_file() {
        let mut server = mockito::Server::new_async().await;
        let _get = server
            .mock("GET", "/web_material/SQP/paper.pdf")
            .with_status(503)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_for(&server, dir.path());
        let url = format!("{}/web_material/SQP/paper.pdf", server.url());
        let path = dir.path().join("paper.pdf");

        let result = coordinator.fetch(&url, &path).await;
        assert!(matches!(result, Err(AppError::Transfer { .. })));
        assert!(!path.exists());
        assert!(!partial_path(&path).exists());
    }

    #[tokio::test]
    async fn test_fetch_reports_unreadable_destination() {
        let mut server = mockito::Server::new_async().await;
        let get = server
            .mock("GET", "/web_material/SQP/paper.pdf")
            .with_status(200)
            .with_body("%PDF")
            .expect(0)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_for(&server, dir.path());
        let url = format!("{}/web_material/SQP/paper.pdf", server.url());
        // Longer than any filesystem allows, so the existence check itself fails
        let path = dir.path().join(format!("{}.pdf", "x".repeat(300)));

        let result = coordinator.fetch(&url, &path).await;
        assert!(matches!(result, Err(AppError::Io(_))));
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_run_task_reports_not_found() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_for(&server, dir.path());

        let outcome = coordinator
            .run_task(DownloadTask::new(Subject::English, AcademicYear::new(2019)))
            .await;
        assert_eq!(outcome, TaskOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_run_task_reports_transfer_failure() {
        let mut server = mockito::Server::new_async().await;
        let _head = server
            .mock("HEAD", SCIENCE_2020)
            .with_status(200)
            .create_async()
            .await;
        let _get = server
            .mock("GET", SCIENCE_2020)
            .with_status(500)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_for(&server, dir.path());

        let outcome = coordinator
            .run_task(DownloadTask::new(Subject::Science, AcademicYear::new(2020)))
            .await;
        assert!(matches!(outcome, TaskOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn test_batch_finishes_when_most_tasks_fail() {
        let mut server = mockito::Server::new_async().await;
        let _head = server
            .mock("HEAD", SCIENCE_2020)
            .with_status(200)
            .create_async()
            .await;
        let _get = server
            .mock("GET", SCIENCE_2020)
            .with_status(200)
            .with_body("%PDF")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_for(&server, dir.path());

        let report = coordinator.download_all().await;

        assert_eq!(report.total(), 55);
        assert_eq!(report.downloaded(), 1);
        assert_eq!(report.not_found(), 54);
        assert!(dir
            .path()
            .join("science/2020samplepaper/sample paper_science_2020_21.pdf")
            .exists());
    }

    #[tokio::test]
    async fn test_batch_isolates_failed_and_crashed_tasks() {
        let mut server = mockito::Server::new_async().await;
        let _head = server
            .mock("HEAD", mockito::Matcher::Any)
            .with_status(200)
            .create_async()
            .await;
        // Only science 2020 and 2021 transfer; every other GET gets a 501
        let _get = server
            .mock(
                "GET",
                mockito::Matcher::Regex(
                    r"^/web_material/SQP/ClassX_202[01]_2[12]/Science-SQP\.pdf$".to_string(),
                ),
            )
            .with_status(200)
            .with_body("%PDF")
            .expect(2)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = coordinator_for(&server, dir.path());
        let broken = DownloadTask::new(Subject::English, AcademicYear::new(2018));

        let report = coordinator
            .run_batch(None, move |coordinator, task| async move {
                if task == broken {
                    panic!("worker bug while handling {}", task.subject);
                }
                coordinator.run_task(task).await
            })
            .await;

        assert_eq!(report.total(), 55);
        assert_eq!(report.downloaded(), 2);
        assert_eq!(report.not_found(), 0);
        assert_eq!(report.failed(), 53);

        let crashed: Vec<_> = report
            .tasks
            .iter()
            .filter(|r| matches!(r.outcome, TaskOutcome::Crashed { .. }))
            .collect();
        assert_eq!(crashed.len(), 1);
        assert_eq!(crashed[0].task, broken);

        for year in [2020, 2021] {
            let task = DownloadTask::new(Subject::Science, AcademicYear::new(year));
            assert_eq!(std::fs::read(task.destination(dir.path())).unwrap(), b"%PDF");
        }
    }

    #[tokio::test]
    async fn test_debug_logging_keeps_every_task() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let coordinator = DownloadCoordinator::new(DownloaderConfig {
            base_url: format!("{}/web_material/SQP", server.url()),
            base_dir: dir.path().to_path_buf(),
            subjects: vec![Subject::Science],
            years: vec![AcademicYear::new(u16::MAX), AcademicYear::new(2020)],
            workers: 1,
            ..Default::default()
        })
        .unwrap();

        let report = coordinator.download_all().await;

        assert_eq!(report.total(), 2);
        assert_eq!(report.not_found(), 2);
    }

    #[tokio::test]
    async fn test_second_run_skips_downloaded_files() {
        let mut server = mockito::Server::new_async().await;
        let _head = server
            .mock("HEAD", SCIENCE_2020)
            .with_status(200)
            .create_async()
            .await;
        let get = server
            .mock("GET", SCIENCE_2020)
            .with_status(200)
            .with_body("%PDF")
            .expect(1)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let coordinator = DownloadCoordinator::new(DownloaderConfig {
            base_url: format!("{}/web_material/SQP", server.url()),
            base_dir: dir.path().to_path_buf(),
            subjects: vec![Subject::Science],
            years: vec![AcademicYear::new(2020)],
            ..Default::default()
        })
        .unwrap();

        let first = coordinator.download_all().await;
        let second = coordinator.download_all().await;

        assert_eq!(first.downloaded(), 1);
        assert_eq!(second.already_present(), 1);
        get.assert_async().await;
    }

    #[tokio::test]
    async fn test_progress_receives_one_report_per_task() {
        let server = mockito::Server::new_async().await;
        let dir = tempfile::tempdir().unwrap();
        let coordinator = DownloadCoordinator::new(DownloaderConfig {
            base_url: format!("{}/web_material/SQP", server.url()),
            base_dir: dir.path().to_path_buf(),
            subjects: vec![Subject::Science, Subject::English],
            years: vec![AcademicYear::new(2022), AcademicYear::new(2023)],
            workers: 2,
            ..Default::default()
        })
        .unwrap();

        let (tx, rx) = futures::channel::mpsc::unbounded();
        let report = coordinator.download_all_with_progress(Some(tx)).await;
        let seen: Vec<TaskReport> = rx.collect().await;

        assert_eq!(report.total(), 4);
        assert_eq!(seen.len(), 4);
        assert!(seen.iter().all(|r| r.outcome == TaskOutcome::NotFound));
    }
}

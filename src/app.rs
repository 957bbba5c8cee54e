use crate::ui::{DownloadMessage, DownloadView};
use cbse_paper_downloader::{
    BatchReport, DownloadCoordinator, DownloaderConfig, TaskOutcome, TaskReport,
};
use futures::StreamExt;
use iced::Task;
use std::path::PathBuf;

pub struct DownloadApp {
    view: DownloadView,
    // Template for each run; the base directory comes from the text field
    config: DownloaderConfig,
}

impl DownloadApp {
    pub fn new(config: DownloaderConfig) -> Self {
        let view = DownloadView::new(config.base_dir.display().to_string());
        Self { view, config }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    UiMessage(DownloadMessage),
    FolderSelected(Option<PathBuf>),
    /// One (subject, year) pair finished
    TaskFinished(TaskReport),
    /// Whole batch finished, or could not start
    BatchFinished(Result<BatchReport, String>),
}

fn describe(report: &TaskReport) -> String {
    match &report.outcome {
        TaskOutcome::Downloaded { path, .. } => {
            format!("{}: downloaded to {}", report.task, path.display())
        }
        TaskOutcome::AlreadyPresent { path, .. } => {
            format!("{}: already present at {}", report.task, path.display())
        }
        TaskOutcome::NotFound => format!("{}: no paper found", report.task),
        TaskOutcome::Failed { error } | TaskOutcome::Crashed { error } => {
            format!("{}: failed ({})", report.task, error)
        }
    }
}

pub fn update(app: &mut DownloadApp, message: Message) -> Task<Message> {
    match message {
        Message::UiMessage(ui_msg) => {
            app.view.update(ui_msg.clone());

            match ui_msg {
                DownloadMessage::BrowsePressed => {
                    return Task::perform(
                        async {
                            rfd::AsyncFileDialog::new()
                                .pick_folder()
                                .await
                                .map(|handle| handle.path().to_path_buf())
                        },
                        Message::FolderSelected,
                    );
                }
                DownloadMessage::DownloadPressed if !app.view.is_downloading => {
                    let dir = app.view.download_dir.trim();
                    if dir.is_empty() {
                        app.view.push_log("Please select a download directory first!");
                        return Task::none();
                    }

                    let config = DownloaderConfig {
                        base_dir: PathBuf::from(dir),
                        ..app.config.clone()
                    };
                    let total = config.tasks().len();

                    let coordinator = match DownloadCoordinator::new(config) {
                        Ok(coordinator) => coordinator,
                        Err(e) => {
                            return Task::done(Message::BatchFinished(Err(e.to_string())));
                        }
                    };

                    app.view.is_downloading = true;
                    app.view.completed = 0;
                    app.view.total = total;
                    app.view.status_message = "Initializing...".to_string();

                    let (progress_tx, progress_rx) = futures::channel::mpsc::unbounded();

                    // iced runs both on its tokio executor
                    let batch = Task::perform(
                        async move {
                            Ok(coordinator
                                .download_all_with_progress(Some(progress_tx))
                                .await)
                        },
                        Message::BatchFinished,
                    );
                    let progress = Task::stream(progress_rx.map(Message::TaskFinished));

                    return Task::batch([progress, batch]);
                }
                _ => {}
            }
        }
        Message::FolderSelected(Some(path)) => {
            app.view.download_dir = path.display().to_string();
        }
        Message::FolderSelected(None) => {}
        // Reports can still arrive after BatchFinished reset the counters
        Message::TaskFinished(_) if !app.view.is_downloading => {}
        Message::TaskFinished(report) => {
            app.view.completed += 1;
            app.view.status_message = format!(
                "Processed {} of {} ({})",
                app.view.completed, app.view.total, report.task
            );
            app.view.push_log(describe(&report));
        }
        Message::BatchFinished(result) => {
            app.view.is_downloading = false;
            app.view.completed = 0;
            app.view.total = 0;
            match result {
                Ok(report) => {
                    app.view.status_message = "Download completed".to_string();
                    app.view.push_log(format!(
                        "All downloads completed! {} downloaded, {} already present, {} not found, {} failed",
                        report.downloaded(),
                        report.already_present(),
                        report.not_found(),
                        report.failed()
                    ));
                }
                Err(e) => {
                    app.view.status_message = "Download completed".to_string();
                    app.view.push_log(format!("Error: {}", e));
                }
            }
        }
    }
    Task::none()
}

pub fn view(app: &DownloadApp) -> iced::Element<'_, Message> {
    app.view.view().map(Message::UiMessage)
}

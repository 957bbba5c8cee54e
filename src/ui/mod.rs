use iced::{
    widget::{button, column, progress_bar, row, scrollable, text, text_input, Column, Space},
    Element, Length,
};

/// Keeps the status log from growing without bound during long runs.
const MAX_LOG_LINES: usize = 500;

/// Main view state
pub struct DownloadView {
    pub download_dir: String,
    pub status_message: String,
    pub is_downloading: bool,
    pub completed: usize,
    pub total: usize,
    log: Vec<String>,
}

impl DownloadView {
    pub fn new(download_dir: String) -> Self {
        Self {
            download_dir,
            status_message: "Ready".to_string(),
            is_downloading: false,
            completed: 0,
            total: 0,
            log: Vec::new(),
        }
    }

    pub fn push_log(&mut self, line: impl Into<String>) {
        self.log.push(line.into());
        if self.log.len() > MAX_LOG_LINES {
            let excess = self.log.len() - MAX_LOG_LINES;
            self.log.drain(..excess);
        }
    }

    pub fn progress(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    DirectoryChanged(String),
    BrowsePressed,
    DownloadPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::DirectoryChanged(dir) => {
                self.download_dir = dir;
            }
            DownloadMessage::BrowsePressed | DownloadMessage::DownloadPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let idle = !self.is_downloading;

        let log: Column<'_, DownloadMessage> =
            Column::with_children(self.log.iter().map(|line| text(line).size(13).into()))
                .spacing(2);

        column![
            text("CBSE Sample Paper Downloader").size(28),
            Space::new().height(Length::Fixed(10.0)),
            row![
                text("Download Location:").size(16),
                text_input("Choose a folder...", &self.download_dir)
                    .on_input(DownloadMessage::DirectoryChanged)
                    .padding(8),
                button("Browse")
                    .on_press_maybe(idle.then_some(DownloadMessage::BrowsePressed))
                    .padding([8, 16]),
            ]
            .spacing(10),
            progress_bar(0.0..=1.0, self.progress()),
            text(&self.status_message).size(14),
            button("Start Download")
                .on_press_maybe(idle.then_some(DownloadMessage::DownloadPressed))
                .padding([10, 20]),
            scrollable(log).height(Length::Fill),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}

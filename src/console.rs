//! Terminal front-end
//!
//! Lets the controller run without a browser: typed lines stand in for
//! recognized speech, spoken text is printed and dashboard operations are
//! applied to an in-memory dashboard.
//!
//! Input lines:
//! - plain text is a transcript
//! - `!code` reports a recognition error (`!no-speech`, `!network`, ...)
//! - `/reply text` publishes an assistant reply on the chat bus

use crate::bus::ChatPublisher;
use crate::session::AvatarState;
use crate::speech::{
    RecognitionErrorCode, RecognitionOutcome, RecognitionRequest, Recognizer, Synthesizer,
    Utterance,
};
use crate::ui::{ChartSnapshot, Dashboard, PreviewMetrics, UiOutcome, UploadResults};
use crate::Result;
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Notify;
use tracing::{debug, info, warn};

const SECTIONS: &[&str] = &["upload", "data-preview", "local-files", "visualizations", "chatbot"];

/// Recognizer reading one transcript per input line
pub struct LineRecognizer<R> {
    lines: tokio::sync::Mutex<Lines<R>>,
    aborted: Notify,
    closed: AtomicBool,
    chat: Option<ChatPublisher>,
}

impl LineRecognizer<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()))
    }
}

impl<R> LineRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self {
            lines: tokio::sync::Mutex::new(reader.lines()),
            aborted: Notify::new(),
            closed: AtomicBool::new(false),
            chat: None,
        }
    }

    /// Publish `/reply` lines on the chat bus
    pub fn with_chat(mut self, chat: ChatPublisher) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Whether the input reached end of file
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn publish_reply(&self, reply: &str) {
        match &self.chat {
            Some(chat) => {
                if let Err(e) = chat.publish_assistant_reply(reply) {
                    warn!("Dropped chat reply: {}", e);
                }
            }
            None => warn!("No chat bus attached; ignoring reply"),
        }
    }
}

#[async_trait]
impl<R> Recognizer for LineRecognizer<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn recognize(&self, request: RecognitionRequest) -> Result<RecognitionOutcome> {
        if self.is_closed() {
            return Ok(RecognitionOutcome::Ended);
        }

        let mut lines = self.lines.lock().await;
        println!("[listening:{}]", request.lang);

        loop {
            let aborted = self.aborted.notified();

            tokio::select! {
                _ = aborted => {
                    return Ok(RecognitionOutcome::Error(RecognitionErrorCode::Aborted));
                }
                line = lines.next_line() => {
                    let Some(line) = line? else {
                        debug!("Input closed");
                        self.closed.store(true, Ordering::SeqCst);
                        return Ok(RecognitionOutcome::Ended);
                    };

                    let line = line.trim();
                    if let Some(reply) = line.strip_prefix("/reply ") {
                        self.publish_reply(reply.trim());
                        continue;
                    }
                    if let Some(code) = line.strip_prefix('!') {
                        let code = RecognitionErrorCode::from_code(code.trim());
                        return Ok(RecognitionOutcome::Error(code));
                    }
                    return Ok(RecognitionOutcome::Transcript(line.to_string()));
                }
            }
        }
    }

    /// Stores a permit, so an abort that lands before the read starts
    /// still cancels it
    fn abort(&self) {
        self.aborted.notify_one();
    }
}

/// Synthesizer that prints what it would say
#[derive(Default)]
pub struct ConsoleSynthesizer {
    speaking: AtomicBool,
}

impl ConsoleSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Synthesizer for ConsoleSynthesizer {
    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    async fn speak(&self, utterance: Utterance) -> Result<()> {
        self.speaking.store(true, Ordering::SeqCst);
        println!("[speak:{}] {}", utterance.lang, utterance.text);
        self.speaking.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn cancel(&self) {
        self.speaking.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct DashboardState {
    section: String,
    dark_theme: bool,
    upload_date: Option<NaiveDate>,
    processed: bool,
    logs: Vec<String>,
}

impl DashboardState {
    fn log(&mut self, message: impl Into<String>) {
        let message = message.into();
        info!("Dashboard: {}", message);
        self.logs.push(format!(
            "[INFO] {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            message
        ));
    }
}

/// In-memory dashboard that records what it was asked to do
pub struct LoggingDashboard {
    state: Mutex<DashboardState>,
    chat: Option<ChatPublisher>,
}

impl LoggingDashboard {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DashboardState {
                section: "upload".to_string(),
                ..Default::default()
            }),
            chat: None,
        }
    }

    /// Publish submitted chat queries on the bus
    pub fn with_chat(mut self, chat: ChatPublisher) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn section(&self) -> String {
        self.state.lock().section.clone()
    }

    pub fn is_dark_theme(&self) -> bool {
        self.state.lock().dark_theme
    }

    pub fn upload_date(&self) -> Option<NaiveDate> {
        self.state.lock().upload_date
    }
}

impl Default for LoggingDashboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Dashboard for LoggingDashboard {
    fn show_section(&self, section: &str) -> Result<UiOutcome> {
        let section = match section {
            "insights" => "visualizations",
            other => other,
        };
        if !SECTIONS.contains(&section) {
            return Ok(UiOutcome::Unavailable);
        }

        let mut state = self.state.lock();
        state.section = section.to_string();
        state.log(format!("Showing section {}", section));
        Ok(UiOutcome::Performed)
    }

    fn send_chat_query(&self, query: &str) -> Result<UiOutcome> {
        if let Some(chat) = &self.chat {
            chat.publish_user_message(query)?;
        }
        self.state.lock().log(format!("Chat query sent: {}", query));
        Ok(UiOutcome::Performed)
    }

    fn open_file_picker(&self) -> Result<UiOutcome> {
        self.state.lock().log("File picker opened");
        Ok(UiOutcome::Performed)
    }

    fn trigger_processing(&self) -> Result<UiOutcome> {
        let mut state = self.state.lock();
        state.processed = true;
        state.log("Processing started");
        Ok(UiOutcome::Performed)
    }

    fn download_processed(&self) -> Result<UiOutcome> {
        let mut state = self.state.lock();
        if !state.processed {
            return Ok(UiOutcome::Unavailable);
        }
        state.log("Processed file downloaded");
        Ok(UiOutcome::Performed)
    }

    fn set_upload_date(&self, date: NaiveDate) -> Result<UiOutcome> {
        let mut state = self.state.lock();
        state.upload_date = Some(date);
        state.log(format!("Upload date set to {}", date));
        Ok(UiOutcome::Performed)
    }

    fn toggle_theme(&self) -> Result<UiOutcome> {
        let mut state = self.state.lock();
        state.dark_theme = !state.dark_theme;
        let theme = if state.dark_theme { "dark" } else { "light" };
        state.log(format!("Theme switched to {}", theme));
        Ok(UiOutcome::Performed)
    }

    fn clear_logs(&self) -> Result<UiOutcome> {
        self.state.lock().logs.clear();
        info!("Dashboard: logs cleared");
        Ok(UiOutcome::Performed)
    }

    fn refresh_preview(&self) -> Result<UiOutcome> {
        self.state.lock().log("Data preview refreshed");
        Ok(UiOutcome::Performed)
    }

    fn download_all_files(&self) -> Result<UiOutcome> {
        self.state.lock().log("Downloading all files");
        Ok(UiOutcome::Performed)
    }

    fn set_avatar(&self, state: AvatarState) {
        debug!("Avatar: {}", state);
    }

    fn chart_snapshot(&self) -> Option<ChartSnapshot> {
        Some(ChartSnapshot::default())
    }

    fn upload_results(&self) -> Option<UploadResults> {
        let state = self.state.lock();
        Some(UploadResults {
            visible: state.processed,
            date: state.upload_date.map(|d| d.to_string()),
            ..Default::default()
        })
    }

    fn preview_metrics(&self) -> Option<PreviewMetrics> {
        Some(PreviewMetrics::default())
    }

    fn log_entries(&self) -> Option<Vec<String>> {
        Some(self.state.lock().logs.clone())
    }
}

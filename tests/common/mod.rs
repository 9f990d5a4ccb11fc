//! Scripted collaborators for driving the controller in tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use syncvoice::bus::ChatSubscriber;
use syncvoice::intent::{IntentClient, IntentResponse};
use syncvoice::session::AvatarState;
use syncvoice::speech::{
    RecognitionOutcome, RecognitionRequest, Recognizer, Synthesizer, Utterance,
};
use syncvoice::ui::{ChartSnapshot, Dashboard, PreviewMetrics, UiOutcome, UploadResults};
use syncvoice::{Result, VoiceConfig, VoiceController, VoiceError};
use tokio::sync::Notify;

pub const GREETING: &str = "Hello, I'm SyncVoice. How can I help?";

/// One scripted recognition request
pub enum Step {
    Hear(RecognitionOutcome),
    /// The request cannot be started
    FailToStart,
    /// Stay open until aborted
    Hang,
}

impl Step {
    pub fn transcript(text: &str) -> Self {
        Step::Hear(RecognitionOutcome::Transcript(text.to_string()))
    }
}

/// Recognizer replaying a script; ends the conversation when it runs out
pub struct ScriptedRecognizer {
    available: bool,
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<RecognitionRequest>>,
    aborts: AtomicUsize,
    aborted: Notify,
}

impl ScriptedRecognizer {
    pub fn new(script: Vec<Step>) -> Self {
        Self {
            available: true,
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            aborts: AtomicUsize::new(0),
            aborted: Notify::new(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::new(Vec::new())
        }
    }

    pub fn requests(&self) -> Vec<RecognitionRequest> {
        self.requests.lock().clone()
    }

    pub fn aborts(&self) -> usize {
        self.aborts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Recognizer for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        self.available
    }

    async fn recognize(&self, request: RecognitionRequest) -> Result<RecognitionOutcome> {
        self.requests.lock().push(request);
        let step = self.script.lock().pop_front();

        match step {
            Some(Step::Hear(outcome)) => Ok(outcome),
            Some(Step::FailToStart) => Err(VoiceError::Recognition("already started".into())),
            Some(Step::Hang) => {
                self.aborted.notified().await;
                Ok(RecognitionOutcome::Error(
                    syncvoice::speech::RecognitionErrorCode::Aborted,
                ))
            }
            None => Ok(RecognitionOutcome::Ended),
        }
    }

    fn abort(&self) {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        self.aborted.notify_one();
    }
}

/// Synthesizer that records every utterance
#[derive(Default)]
pub struct RecordingSynth {
    spoken: Mutex<Vec<(String, String)>>,
    speaking: AtomicBool,
}

impl RecordingSynth {
    pub fn texts(&self) -> Vec<String> {
        self.spoken.lock().iter().map(|(text, _)| text.clone()).collect()
    }

    pub fn spoken(&self) -> Vec<(String, String)> {
        self.spoken.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.texts().pop()
    }
}

#[async_trait]
impl Synthesizer for RecordingSynth {
    fn is_speaking(&self) -> bool {
        self.speaking.load(Ordering::SeqCst)
    }

    async fn speak(&self, utterance: Utterance) -> Result<()> {
        self.speaking.store(true, Ordering::SeqCst);
        self.spoken.lock().push((utterance.text, utterance.lang));
        tokio::task::yield_now().await;
        self.speaking.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn cancel(&self) {
        self.speaking.store(false, Ordering::SeqCst);
    }
}

/// Intent client replaying canned replies
#[derive(Default)]
pub struct ScriptedIntents {
    replies: Mutex<VecDeque<Result<IntentResponse>>>,
    commands: Mutex<Vec<String>>,
    delay: Duration,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedIntents {
    pub fn new(replies: Vec<Result<IntentResponse>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            ..Default::default()
        }
    }

    /// Hold every reply back for `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    /// Most requests that were ever pending at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IntentClient for ScriptedIntents {
    async fn classify(&self, command: &str) -> Result<IntentResponse> {
        self.commands.lock().push(command.to_string());
        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(pending, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let reply = self.replies.lock().pop_front();
        reply.unwrap_or_else(|| Err(VoiceError::Transport("no scripted reply".into())))
    }
}

/// Dashboard recording each operation as `name` or `name:argument`
#[derive(Default)]
pub struct RecordingDashboard {
    calls: Mutex<Vec<String>>,
    unavailable: Mutex<HashSet<String>>,
    failing: Mutex<Option<String>>,
    avatars: Mutex<Vec<AvatarState>>,
    charts: Option<ChartSnapshot>,
    uploads: Option<UploadResults>,
    metrics: Option<PreviewMetrics>,
    logs: Option<Vec<String>>,
}

impl RecordingDashboard {
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn avatars(&self) -> Vec<AvatarState> {
        self.avatars.lock().clone()
    }

    pub fn with_charts(mut self, charts: ChartSnapshot) -> Self {
        self.charts = Some(charts);
        self
    }

    pub fn with_uploads(mut self, uploads: UploadResults) -> Self {
        self.uploads = Some(uploads);
        self
    }

    pub fn with_metrics(mut self, metrics: PreviewMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn with_logs(mut self, logs: Vec<String>) -> Self {
        self.logs = Some(logs);
        self
    }

    /// Make an operation report its control as missing
    pub fn without(self, operation: &str) -> Self {
        self.unavailable.lock().insert(operation.to_string());
        self
    }

    /// Make an operation fail outright
    pub fn failing(self, operation: &str) -> Self {
        *self.failing.lock() = Some(operation.to_string());
        self
    }

    fn record(&self, operation: &str, argument: Option<&str>) -> Result<UiOutcome> {
        if self.failing.lock().as_deref() == Some(operation) {
            return Err(VoiceError::Action(format!("{} exploded", operation)));
        }
        if self.unavailable.lock().contains(operation) {
            return Ok(UiOutcome::Unavailable);
        }

        let call = match argument {
            Some(argument) => format!("{}:{}", operation, argument),
            None => operation.to_string(),
        };
        self.calls.lock().push(call);
        Ok(UiOutcome::Performed)
    }
}

impl Dashboard for RecordingDashboard {
    fn show_section(&self, section: &str) -> Result<UiOutcome> {
        self.record("show_section", Some(section))
    }

    fn send_chat_query(&self, query: &str) -> Result<UiOutcome> {
        self.record("send_chat_query", Some(query))
    }

    fn open_file_picker(&self) -> Result<UiOutcome> {
        self.record("open_file_picker", None)
    }

    fn trigger_processing(&self) -> Result<UiOutcome> {
        self.record("trigger_processing", None)
    }

    fn download_processed(&self) -> Result<UiOutcome> {
        self.record("download_processed", None)
    }

    fn set_upload_date(&self, date: NaiveDate) -> Result<UiOutcome> {
        self.record("set_upload_date", Some(&date.to_string()))
    }

    fn toggle_theme(&self) -> Result<UiOutcome> {
        self.record("toggle_theme", None)
    }

    fn clear_logs(&self) -> Result<UiOutcome> {
        self.record("clear_logs", None)
    }

    fn refresh_preview(&self) -> Result<UiOutcome> {
        self.record("refresh_preview", None)
    }

    fn download_all_files(&self) -> Result<UiOutcome> {
        self.record("download_all_files", None)
    }

    fn set_avatar(&self, state: AvatarState) {
        self.avatars.lock().push(state);
    }

    fn chart_snapshot(&self) -> Option<ChartSnapshot> {
        self.charts.clone()
    }

    fn upload_results(&self) -> Option<UploadResults> {
        self.uploads.clone()
    }

    fn preview_metrics(&self) -> Option<PreviewMetrics> {
        self.metrics.clone()
    }

    fn log_entries(&self) -> Option<Vec<String>> {
        self.logs.clone()
    }
}

/// Controller wired to fakes, keeping handles for assertions
pub struct Harness {
    pub controller: Arc<VoiceController>,
    pub recognizer: Arc<ScriptedRecognizer>,
    pub synth: Arc<RecordingSynth>,
    pub intents: Arc<ScriptedIntents>,
    pub dashboard: Arc<RecordingDashboard>,
}

pub struct HarnessBuilder {
    config: VoiceConfig,
    recognizer: ScriptedRecognizer,
    intents: Option<Arc<dyn IntentClient>>,
    scripted: Vec<Result<IntentResponse>>,
    reply_delay: Duration,
    dashboard: RecordingDashboard,
    chat: Option<ChatSubscriber>,
}

impl HarnessBuilder {
    pub fn new() -> Self {
        Self {
            config: VoiceConfig::default().with_cancel_grace_ms(1),
            recognizer: ScriptedRecognizer::new(Vec::new()),
            intents: None,
            scripted: Vec::new(),
            reply_delay: Duration::ZERO,
            dashboard: RecordingDashboard::default(),
            chat: None,
        }
    }

    pub fn config(mut self, config: VoiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn hears(mut self, script: Vec<Step>) -> Self {
        self.recognizer = ScriptedRecognizer::new(script);
        self
    }

    pub fn recognizer(mut self, recognizer: ScriptedRecognizer) -> Self {
        self.recognizer = recognizer;
        self
    }

    pub fn replies(mut self, replies: Vec<Result<IntentResponse>>) -> Self {
        self.scripted = replies;
        self
    }

    /// Delay every scripted reply
    pub fn reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }

    pub fn intent_client(mut self, client: Arc<dyn IntentClient>) -> Self {
        self.intents = Some(client);
        self
    }

    pub fn dashboard(mut self, dashboard: RecordingDashboard) -> Self {
        self.dashboard = dashboard;
        self
    }

    pub fn chat(mut self, chat: ChatSubscriber) -> Self {
        self.chat = Some(chat);
        self
    }

    pub fn build(self) -> Harness {
        let recognizer = Arc::new(self.recognizer);
        let synth = Arc::new(RecordingSynth::default());
        let intents = Arc::new(ScriptedIntents::new(self.scripted).with_delay(self.reply_delay));
        let dashboard = Arc::new(self.dashboard);

        let client: Arc<dyn IntentClient> = match self.intents {
            Some(client) => client,
            None => intents.clone(),
        };

        let mut builder = VoiceController::builder()
            .with_config(self.config)
            .with_recognizer(recognizer.clone())
            .with_synthesizer(synth.clone())
            .with_intent_client(client)
            .with_dashboard(dashboard.clone());
        if let Some(chat) = self.chat {
            builder = builder.with_chat(chat);
        }

        Harness {
            controller: Arc::new(builder.build().expect("controller builds")),
            recognizer,
            synth,
            intents,
            dashboard,
        }
    }
}

impl Default for HarnessBuilder {
    fn default() -> Self {
        Self::new()
    }
}

//! Voice session controller
//!
//! Drives the conversation loop: Listen -> Recognize -> Intent -> Speak ->
//! Listen. Every step returns the next step instead of calling back into
//! the loop, so re-arming never grows the stack.

use crate::bus::ChatSubscriber;
use crate::config::VoiceConfig;
use crate::intent::{HttpIntentClient, Intent, IntentClient, IntentResponse};
use crate::session::{AvatarState, ControllerState, SharedSession};
use crate::shortcut::{KeyPress, Shortcut};
use crate::speech::{RecognitionOutcome, RecognitionRequest, Recognizer, Speaker, Synthesizer};
use crate::ui::{
    summarize_charts, summarize_logs, summarize_metrics, summarize_upload_results, Avatar,
    Dashboard,
};
use crate::{Result, VoiceError};
use chrono::NaiveDate;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const NOT_AVAILABLE: &str = "Sorry, voice recognition is not available right now.";
const START_FAILED: &str =
    "Sorry, I couldn't start listening. Please check microphone permissions.";
const EMPTY_COMMAND: &str = "I didn't catch that clearly. Could you try again?";
const UNKNOWN_ACTION: &str = "I received an action I don't know how to handle.";
const LANGUAGE_CHANGED: &str = "Language changed.";

/// What the conversation loop does after a step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NextStep {
    /// Open a new recognition request
    Listen,
    /// Wait for manual activation
    Idle,
}

/// Voice session controller
pub struct VoiceController {
    config: VoiceConfig,
    session: SharedSession,
    shortcut: Shortcut,
    recognizer: Arc<dyn Recognizer>,
    speaker: Speaker,
    intents: Arc<dyn IntentClient>,
    dashboard: Arc<dyn Dashboard>,
    avatar: Avatar,
    chat: Option<ChatSubscriber>,
    /// Set while a conversation loop is running
    conversing: AtomicBool,
}

/// Clears the conversation flag when the loop ends or is dropped
struct Conversing<'a>(&'a AtomicBool);

impl Drop for Conversing<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl VoiceController {
    pub fn builder() -> VoiceControllerBuilder {
        VoiceControllerBuilder::new()
    }

    /// Shared session, for rendering
    pub fn session(&self) -> &SharedSession {
        &self.session
    }

    pub fn config(&self) -> &VoiceConfig {
        &self.config
    }

    pub fn shortcut(&self) -> &Shortcut {
        &self.shortcut
    }

    pub fn is_disabled(&self) -> bool {
        self.session.is_disabled()
    }

    // === Activation ===

    /// Toggle the assistant
    ///
    /// While listening this stops listening. Otherwise it greets the user
    /// and runs the conversation until it goes idle. Activating while a
    /// command is being processed or answered does nothing.
    pub async fn activate(&self) -> Result<()> {
        if self.session.is_disabled() {
            warn!("Voice control not supported or initialized.");
            return Err(VoiceError::Unsupported("speech recognition".into()));
        }

        if self.session.is_listening() {
            self.stop_listening();
            return Ok(());
        }

        let state = self.session.state();
        if state.is_processing() || state.is_speaking() {
            info!("Assistant busy ({:?}); ignoring activation.", state);
            return Ok(());
        }
        if self.conversing.swap(true, Ordering::SeqCst) {
            info!("Conversation already running; ignoring activation.");
            return Ok(());
        }
        let _conversing = Conversing(&self.conversing);

        let lang = self.session.current_lang();
        self.say(&self.config.greeting, &lang).await;
        self.enter(ControllerState::Idle);
        self.run_until_idle().await;
        Ok(())
    }

    /// Handle a key press, returning whether it was consumed
    pub async fn handle_key(&self, key: &KeyPress) -> bool {
        if !self.shortcut.matches(key) {
            return false;
        }

        debug!("Shortcut {} pressed", self.shortcut);
        if let Err(e) = self.activate().await {
            debug!("Shortcut ignored: {}", e);
        }
        true
    }

    /// Keep listening until a step asks to go idle
    pub async fn run_until_idle(&self) {
        while self.listen_once().await == NextStep::Listen {}
        debug!("Conversation idle");
    }

    // === Listening ===

    /// Open one recognition request and handle its outcome
    pub async fn listen_once(&self) -> NextStep {
        if self.session.is_disabled() {
            error!("Speech Recognition not initialized.");
            self.say_default(NOT_AVAILABLE).await;
            self.enter(ControllerState::Idle);
            return NextStep::Idle;
        }

        let started = self.session.write().begin_listening();
        if !started {
            info!("Already listening.");
            return NextStep::Idle;
        }

        self.speaker.cancel();
        self.enter(ControllerState::Listening);
        self.avatar.set(AvatarState::Listening);

        let request = RecognitionRequest::new(self.session.current_lang());
        info!("Started listening ({})...", request.lang);

        match self.recognizer.recognize(request).await {
            Ok(outcome) => self.handle_recognition(outcome).await,
            Err(e) => {
                error!("Error starting recognition: {}", e);
                self.session.write().end_listening();
                self.avatar.set(AvatarState::Idle);
                self.enter(ControllerState::Idle);
                self.say_default(START_FAILED).await;
                self.enter(ControllerState::Idle);
                NextStep::Idle
            }
        }
    }

    /// Abort an open recognition request
    pub fn stop_listening(&self) {
        let was_listening = self.session.write().end_listening();
        if !was_listening {
            return;
        }

        self.recognizer.abort();
        self.avatar.set(AvatarState::Idle);
        self.enter(ControllerState::Idle);
        info!("Stopped listening.");
    }

    /// React to the result of a recognition request
    pub async fn handle_recognition(&self, outcome: RecognitionOutcome) -> NextStep {
        match outcome {
            RecognitionOutcome::Transcript(transcript) => {
                info!("Recognition result: {:?}", transcript);
                self.session.write().end_listening();
                self.process_transcript(&transcript).await
            }
            RecognitionOutcome::Error(code) => {
                self.session.write().end_listening();
                self.avatar.set(AvatarState::Idle);
                self.enter(ControllerState::Idle);

                match code.spoken_message() {
                    Some(message) => {
                        error!("Recognition error: {}", code.to_error());
                        self.say_default(message).await;
                        self.enter(ControllerState::Idle);
                    }
                    None => info!("Recognition aborted, likely intentional stop."),
                }
                NextStep::Idle
            }
            RecognitionOutcome::Ended => {
                let was_listening = self.session.write().end_listening();
                if was_listening {
                    warn!("Recognition ended unexpectedly.");
                    self.avatar.set(AvatarState::Idle);
                    self.enter(ControllerState::Idle);
                } else {
                    debug!("Recognition service ended.");
                }
                NextStep::Idle
            }
        }
    }

    // === Processing ===

    /// Send a transcript to the intent endpoint and act on the reply
    pub async fn process_transcript(&self, transcript: &str) -> NextStep {
        info!("Processing transcript: {:?}", transcript);
        self.enter(ControllerState::Processing);
        self.avatar.set(AvatarState::Processing);

        let command = transcript.trim();
        if command.is_empty() {
            debug!("Empty command after processing.");
            self.avatar.set(AvatarState::Idle);
            self.say_default(EMPTY_COMMAND).await;
            return self.finish(NextStep::Listen);
        }

        match self.intents.classify(command).await {
            Ok(response) => {
                debug!("Received action data from backend: {:?}", response);
                self.avatar.set(AvatarState::Idle);
                self.handle_intent(&response).await
            }
            Err(e) => {
                error!("Error processing command: {}", e);
                self.avatar.set(AvatarState::Idle);
                self.say_default(&e.user_message()).await;
                self.finish(NextStep::Listen)
            }
        }
    }

    /// Speak the reply, perform the action and decide whether to re-listen
    pub async fn handle_intent(&self, response: &IntentResponse) -> NextStep {
        let intent = response.intent();
        let lang = response.reply_lang(&self.session.current_lang());

        if intent.speaks_response_first() {
            self.say(response.spoken_response(), &lang).await;
        }

        if let Err(e) = self.perform(&intent, response, &lang).await {
            error!("Error executing action '{}': {}", intent, e);
            let reason = match e {
                VoiceError::Action(reason) => reason,
                other => other.to_string(),
            };
            self.say_default(&VoiceError::Action(reason).user_message())
                .await;
        }

        let next = if intent.rearms_listening() {
            NextStep::Listen
        } else {
            NextStep::Idle
        };
        self.finish(next)
    }

    /// Run the dashboard side of an intent
    async fn perform(&self, intent: &Intent, response: &IntentResponse, lang: &str) -> Result<()> {
        match intent {
            Intent::Navigate { section } => match section {
                Some(section) => {
                    info!("Executing navigation to: {}", section);
                    if !self.dashboard.show_section(section)?.is_performed() {
                        warn!("Section {:?} could not be shown", section);
                    }
                }
                None => {
                    error!("Navigation action missing section parameter.");
                    self.say_default("I couldn't navigate because the destination was unclear.")
                        .await;
                }
            },

            Intent::ChatbotQuery { query } => {
                let sent = match query {
                    Some(query) => {
                        info!("Executing chatbot query: {}", query);
                        self.dashboard.send_chat_query(query)?.is_performed()
                    }
                    None => false,
                };
                if !sent {
                    error!("Chatbot query missing query or chat input.");
                    self.say_default("I couldn't send the message to the chatbot.")
                        .await;
                }
            }

            Intent::ReadChatbotResponse => {
                self.sync_chat();
                let reply = self.session.write().take_bot_reply();
                match reply {
                    Some(reply) => self.say(&reply, lang).await,
                    None => {
                        self.say("There's no recent chatbot response available to read.", lang)
                            .await
                    }
                }
            }

            Intent::VisualizationSummary => match self.dashboard.chart_snapshot() {
                Some(charts) => self.say(&summarize_charts(&charts), lang).await,
                None => {
                    warn!("Chart snapshot not available.");
                    self.say("I can't summarize the charts at the moment.", lang)
                        .await;
                }
            },

            Intent::TriggerFileInputClick => {
                if !self.dashboard.open_file_picker()?.is_performed() {
                    error!("File input element not found.");
                    self.say_default("I couldn't open the file selection window.")
                        .await;
                }
            }

            Intent::TriggerProcessButton => {
                if !self.dashboard.trigger_processing()?.is_performed() {
                    error!("Upload button not found.");
                    self.say_default("I couldn't start the processing.").await;
                }
            }

            Intent::ReadUploadSummary => match self.dashboard.upload_results() {
                Some(results) => self.say(&summarize_upload_results(&results), lang).await,
                None => {
                    warn!("Upload results not available.");
                    self.say("I can't read the upload summary right now.", lang)
                        .await;
                }
            },

            Intent::TriggerDownloadProcessed => {
                if !self.dashboard.download_processed()?.is_performed() {
                    error!("Download processed file button not found or disabled.");
                    self.say_default(
                        "I couldn't download the processed file. Please ensure processing is complete.",
                    )
                    .await;
                }
            }

            Intent::SetDate { date } => {
                let parsed = date
                    .as_deref()
                    .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
                let set = match parsed {
                    Some(date) => {
                        info!("Executing set date: {}", date);
                        self.dashboard.set_upload_date(date)?.is_performed()
                    }
                    None => false,
                };
                if !set {
                    error!("Set date action missing date or element: {:?}", date);
                    self.say_default("I couldn't set the date.").await;
                }
            }

            Intent::ThemeToggle => {
                if !self.dashboard.toggle_theme()?.is_performed() {
                    // the reply already confirmed the toggle
                    error!("Theme toggle button not found.");
                }
            }

            Intent::ReadLogs => match self.dashboard.log_entries() {
                Some(entries) => {
                    let summary = summarize_logs(&entries, self.config.recent_log_count);
                    self.say(&summary, lang).await;
                }
                None => {
                    warn!("Log entries not available.");
                    self.say("I can't read the logs right now.", lang).await;
                }
            },

            Intent::ClearLogs => {
                if !self.dashboard.clear_logs()?.is_performed() {
                    warn!("Logs could not be cleared.");
                }
            }

            Intent::TriggerRefreshPreview => {
                if !self.dashboard.refresh_preview()?.is_performed() {
                    error!("Refresh preview button not found.");
                    self.say_default("I couldn't refresh the data preview.").await;
                }
            }

            Intent::ReadMetrics => match self.dashboard.preview_metrics() {
                Some(metrics) => self.say(&summarize_metrics(&metrics), lang).await,
                None => {
                    warn!("Preview metrics not available.");
                    self.say("I can't read the data metrics right now.", lang)
                        .await;
                }
            },

            Intent::TriggerDownloadAllZip => {
                if !self.dashboard.download_all_files()?.is_performed() {
                    warn!("Download of all files not available.");
                    self.say_default("I couldn't start the download for all files.")
                        .await;
                }
            }

            Intent::ChangeLanguage { lang: new_lang } => match new_lang {
                Some(new_lang) => {
                    info!("Changing language to: {}", new_lang);
                    self.session.write().set_language(new_lang.as_str());
                    self.say(LANGUAGE_CHANGED, new_lang).await;
                }
                None => error!("Change language action missing lang parameter."),
            },

            Intent::Stop => {
                info!("Executing stop action.");
                self.say(response.spoken_response(), lang).await;
            }

            Intent::Error => {
                error!("Backend returned error: {}", response.spoken_response());
                self.say(response.spoken_response(), lang).await;
            }

            Intent::Unknown(action) => {
                warn!("Unknown action received: {}", action);
                self.say(UNKNOWN_ACTION, lang).await;
            }
        }

        Ok(())
    }

    // === Chat ===

    /// Pull the newest assistant reply off the chat bus
    pub fn sync_chat(&self) {
        let Some(chat) = &self.chat else {
            return;
        };

        if let Some(reply) = chat.latest_assistant_reply() {
            debug!("Updated last bot reply: {:?}", reply);
            self.session.write().record_bot_reply(reply);
        }
    }

    // === Helpers ===

    fn enter(&self, next: ControllerState) {
        self.session.write().enter(next);
    }

    fn finish(&self, next: NextStep) -> NextStep {
        self.enter(ControllerState::Idle);
        next
    }

    /// Speak in the session language
    async fn say_default(&self, text: &str) {
        let lang = self.session.current_lang();
        self.say(text, &lang).await;
    }

    /// Speak and log failures; the loop never stops on speech errors
    async fn say(&self, text: &str, lang: &str) {
        self.enter(ControllerState::Speaking);
        if let Err(e) = self.speaker.speak(text, lang).await {
            debug!("Continuing after speech failure: {}", e);
        }
    }
}

/// Builder for creating a voice controller
pub struct VoiceControllerBuilder {
    config: VoiceConfig,
    recognizer: Option<Arc<dyn Recognizer>>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    intents: Option<Arc<dyn IntentClient>>,
    dashboard: Option<Arc<dyn Dashboard>>,
    chat: Option<ChatSubscriber>,
}

impl VoiceControllerBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            config: VoiceConfig::default(),
            recognizer: None,
            synthesizer: None,
            intents: None,
            dashboard: None,
            chat: None,
        }
    }

    pub fn with_config(mut self, config: VoiceConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn Recognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Use a custom intent client instead of the HTTP one
    pub fn with_intent_client(mut self, intents: Arc<dyn IntentClient>) -> Self {
        self.intents = Some(intents);
        self
    }

    pub fn with_dashboard(mut self, dashboard: Arc<dyn Dashboard>) -> Self {
        self.dashboard = Some(dashboard);
        self
    }

    /// Subscribe to assistant replies from the chat component
    pub fn with_chat(mut self, chat: ChatSubscriber) -> Self {
        self.chat = Some(chat);
        self
    }

    /// Build the controller
    pub fn build(self) -> Result<VoiceController> {
        self.config.validate()?;
        let shortcut = self.config.parsed_shortcut()?;

        let recognizer = self
            .recognizer
            .ok_or_else(|| VoiceError::Config("no speech recognizer configured".into()))?;
        let synthesizer = self
            .synthesizer
            .ok_or_else(|| VoiceError::Config("no speech synthesizer configured".into()))?;
        let dashboard = self
            .dashboard
            .ok_or_else(|| VoiceError::Config("no dashboard configured".into()))?;
        let intents: Arc<dyn IntentClient> = match self.intents {
            Some(intents) => intents,
            None => Arc::new(HttpIntentClient::new(&self.config)?),
        };

        let session = SharedSession::new(self.config.default_lang.as_str());
        let avatar = Avatar::new(session.clone(), dashboard.clone());
        let speaker = Speaker::new(synthesizer, self.config.cancel_grace(), avatar.clone());

        if !recognizer.is_available() {
            error!("Speech Recognition not supported in this browser.");
            session.write().disable();
        }
        if !speaker.is_available() {
            warn!("Speech Synthesis not supported; replies will not be spoken.");
        }

        avatar.set(AvatarState::Idle);
        info!(
            "Voice controller ready (lang: {}, shortcut: {})",
            self.config.default_lang, shortcut
        );

        Ok(VoiceController {
            config: self.config,
            session,
            shortcut,
            recognizer,
            speaker,
            intents,
            dashboard,
            avatar,
            chat: self.chat,
            conversing: AtomicBool::new(false),
        })
    }
}

impl Default for VoiceControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

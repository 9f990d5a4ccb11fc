//! Intent wire format and its typed form

use serde::{Deserialize, Serialize};
use std::fmt;

/// Spoken when the backend omits `response`
pub const DEFAULT_RESPONSE: &str = "Okay.";

/// Request body for the intent endpoint
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoiceCommandRequest {
    pub command: String,
}

/// Intent as returned by the backend classifier
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntentResponse {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl IntentResponse {
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            ..Default::default()
        }
    }

    pub fn with_response(mut self, response: impl Into<String>) -> Self {
        self.response = Some(response.into());
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    /// Text to speak for this intent, `"Okay."` when absent or blank
    pub fn spoken_response(&self) -> &str {
        self.response
            .as_deref()
            .filter(|r| !r.trim().is_empty())
            .unwrap_or(DEFAULT_RESPONSE)
    }

    /// Language for the reply, falling back to `session_lang`
    pub fn reply_lang(&self, session_lang: &str) -> String {
        non_empty(&self.lang).unwrap_or(session_lang).to_string()
    }

    /// Convert into the typed intent
    pub fn intent(&self) -> Intent {
        let owned = |v: &Option<String>| non_empty(v).map(str::to_string);

        match self.action.trim() {
            "navigate" => Intent::Navigate {
                section: owned(&self.section),
            },
            "chatbot_query" => Intent::ChatbotQuery {
                query: owned(&self.query),
            },
            "read_chatbot_response" => Intent::ReadChatbotResponse,
            "visualization_summary" => Intent::VisualizationSummary,
            "trigger_file_input_click" => Intent::TriggerFileInputClick,
            "trigger_process_button" => Intent::TriggerProcessButton,
            "read_upload_summary" => Intent::ReadUploadSummary,
            "trigger_download_processed" => Intent::TriggerDownloadProcessed,
            "set_date" => Intent::SetDate {
                date: owned(&self.date),
            },
            "theme_toggle" => Intent::ThemeToggle,
            "read_logs" => Intent::ReadLogs,
            "clear_logs" => Intent::ClearLogs,
            "trigger_refresh_preview" => Intent::TriggerRefreshPreview,
            "read_metrics" => Intent::ReadMetrics,
            "trigger_download_all_zip" => Intent::TriggerDownloadAllZip,
            "change_language" => Intent::ChangeLanguage {
                lang: owned(&self.lang),
            },
            "stop" => Intent::Stop,
            "error" => Intent::Error,
            other => Intent::Unknown(other.to_string()),
        }
    }
}

/// Closed set of dashboard actions the controller can perform
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Switch the dashboard to another section
    Navigate { section: Option<String> },
    /// Populate the chat input and submit it
    ChatbotQuery { query: Option<String> },
    /// Read back the last assistant reply
    ReadChatbotResponse,
    VisualizationSummary,
    TriggerFileInputClick,
    TriggerProcessButton,
    ReadUploadSummary,
    TriggerDownloadProcessed,
    /// Set the upload date (`YYYY-MM-DD`)
    SetDate { date: Option<String> },
    ThemeToggle,
    ReadLogs,
    ClearLogs,
    TriggerRefreshPreview,
    ReadMetrics,
    TriggerDownloadAllZip,
    /// Switch the session language
    ChangeLanguage { lang: Option<String> },
    /// End the conversation
    Stop,
    /// Backend could not classify the command
    Error,
    /// Action name outside the known set
    Unknown(String),
}

impl Intent {
    /// Wire name of the action
    pub fn action_name(&self) -> &str {
        match self {
            Intent::Navigate { .. } => "navigate",
            Intent::ChatbotQuery { .. } => "chatbot_query",
            Intent::ReadChatbotResponse => "read_chatbot_response",
            Intent::VisualizationSummary => "visualization_summary",
            Intent::TriggerFileInputClick => "trigger_file_input_click",
            Intent::TriggerProcessButton => "trigger_process_button",
            Intent::ReadUploadSummary => "read_upload_summary",
            Intent::TriggerDownloadProcessed => "trigger_download_processed",
            Intent::SetDate { .. } => "set_date",
            Intent::ThemeToggle => "theme_toggle",
            Intent::ReadLogs => "read_logs",
            Intent::ClearLogs => "clear_logs",
            Intent::TriggerRefreshPreview => "trigger_refresh_preview",
            Intent::ReadMetrics => "read_metrics",
            Intent::TriggerDownloadAllZip => "trigger_download_all_zip",
            Intent::ChangeLanguage { .. } => "change_language",
            Intent::Stop => "stop",
            Intent::Error => "error",
            Intent::Unknown(name) => name,
        }
    }

    /// `stop` and `error` speak their response as the action itself
    pub fn speaks_response_first(&self) -> bool {
        !matches!(self, Intent::Stop | Intent::Error)
    }

    /// Every action except `stop` continues the conversation
    pub fn rearms_listening(&self) -> bool {
        !matches!(self, Intent::Stop)
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.action_name())
    }
}

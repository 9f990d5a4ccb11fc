//! Dashboard operations the voice controller drives
//!
//! The dashboard is an external collaborator. The controller only needs
//! a handful of operations and read-only snapshots, collected in the
//! `Dashboard` trait.

pub mod summary;

pub use summary::{
    clean_log_line, summarize_charts, summarize_logs, summarize_metrics,
    summarize_upload_results, ChartSnapshot, PreviewMetrics, UploadResults,
};

use crate::session::{AvatarState, SharedSession};
use crate::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::debug;

/// Result of a dashboard operation that may have no target
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiOutcome {
    /// The operation ran
    Performed,
    /// The control it needs is missing or disabled
    Unavailable,
}

impl UiOutcome {
    pub fn is_performed(&self) -> bool {
        matches!(self, UiOutcome::Performed)
    }
}

/// Operations exposed by the dashboard UI
///
/// `Err` means the operation itself failed; `Ok(Unavailable)` means there
/// was nothing to operate on.
pub trait Dashboard: Send + Sync {
    /// Switch to a section (`upload`, `data-preview`, `visualizations`, ...)
    fn show_section(&self, section: &str) -> Result<UiOutcome>;

    /// Put `query` in the chat input and submit it
    fn send_chat_query(&self, query: &str) -> Result<UiOutcome>;

    /// Open the upload file picker
    fn open_file_picker(&self) -> Result<UiOutcome>;

    /// Press the upload "Process" button
    fn trigger_processing(&self) -> Result<UiOutcome>;

    /// Download the last processed file; unavailable until processing is done
    fn download_processed(&self) -> Result<UiOutcome>;

    fn set_upload_date(&self, date: NaiveDate) -> Result<UiOutcome>;

    fn toggle_theme(&self) -> Result<UiOutcome>;

    fn clear_logs(&self) -> Result<UiOutcome>;

    fn refresh_preview(&self) -> Result<UiOutcome>;

    /// Download all daily files as one archive
    fn download_all_files(&self) -> Result<UiOutcome>;

    /// Render the avatar state
    fn set_avatar(&self, _state: AvatarState) {}

    // Snapshot providers; `None` when the dashboard cannot provide one.

    fn chart_snapshot(&self) -> Option<ChartSnapshot>;

    fn upload_results(&self) -> Option<UploadResults>;

    fn preview_metrics(&self) -> Option<PreviewMetrics>;

    fn log_entries(&self) -> Option<Vec<String>>;
}

/// Publishes avatar changes to the session and the dashboard
#[derive(Clone)]
pub struct Avatar {
    session: SharedSession,
    view: Option<Arc<dyn Dashboard>>,
}

impl Avatar {
    pub fn new(session: SharedSession, view: Arc<dyn Dashboard>) -> Self {
        Self {
            session,
            view: Some(view),
        }
    }

    /// Avatar that only records its state on the session
    pub fn detached(session: SharedSession) -> Self {
        Self {
            session,
            view: None,
        }
    }

    pub fn set(&self, state: AvatarState) {
        self.session.write().set_avatar(state);
        if let Some(view) = &self.view {
            view.set_avatar(state);
        }
        debug!("Avatar -> {}", state);
    }

    pub fn current(&self) -> AvatarState {
        self.session.avatar()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detached_avatar_updates_session() {
        let session = SharedSession::new("en-US");
        let avatar = Avatar::detached(session.clone());

        avatar.set(AvatarState::Processing);
        assert_eq!(session.avatar(), AvatarState::Processing);
        assert_eq!(avatar.current(), AvatarState::Processing);
    }

    #[test]
    fn test_outcome() {
        assert!(UiOutcome::Performed.is_performed());
        assert!(!UiOutcome::Unavailable.is_performed());
    }
}

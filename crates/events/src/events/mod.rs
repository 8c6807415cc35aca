use serde::{Deserialize, Serialize};

use crate::{EventLevel, EventSource};
use natstage_errors::UserFacingError;

/// Structured failure information shared across domains.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureContext {
    /// Stable error code when the error provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Short user-facing message.
    pub message: String,
    /// Optional remediation hint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    /// Whether retrying the operation might succeed.
    pub retryable: bool,
}

impl FailureContext {
    /// Construct a new failure context.
    #[must_use]
    pub fn new(
        code: Option<impl Into<String>>,
        message: impl Into<String>,
        hint: Option<impl Into<String>>,
        retryable: bool,
    ) -> Self {
        Self {
            code: code.map(Into::into),
            message: message.into(),
            hint: hint.map(Into::into),
            retryable,
        }
    }

    /// Build failure context from a `UserFacingError` implementation.
    #[must_use]
    pub fn from_error<E: UserFacingError + ?Sized>(error: &E) -> Self {
        Self::new(
            error.user_code(),
            error.user_message().into_owned(),
            error.user_hint(),
            error.is_retryable(),
        )
    }
}

pub mod general;
pub mod staging;

pub use general::*;
pub use staging::*;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, operations)
    General(GeneralEvent),

    /// Staging area, materialization, linking and search-path events
    Staging(StagingEvent),
}

impl AppEvent {
    /// Identify the source component for this event.
    #[must_use]
    pub fn event_source(&self) -> EventSource {
        match self {
            Self::General(_) => EventSource::GENERAL,
            Self::Staging(
                StagingEvent::LinkCreated { .. } | StagingEvent::LinkAlreadyExists { .. },
            ) => EventSource::LINKING,
            Self::Staging(StagingEvent::SearchPathUpdated { .. }) => EventSource::LOADER,
            Self::Staging(_) => EventSource::STAGING,
        }
    }

    /// Determine the appropriate tracing log level for this event
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        use tracing::Level;

        match self {
            Self::General(GeneralEvent::OperationFailed { .. }) => Level::ERROR,

            Self::General(GeneralEvent::Warning { .. }) => Level::WARN,

            // Cleanup is best-effort; a failure there is only worth a debug record
            Self::Staging(
                StagingEvent::CleanupFailed { .. }
                | StagingEvent::LinkAlreadyExists { .. }
                | StagingEvent::ResourceMaterialized { .. }
                | StagingEvent::LinkCreated { .. },
            ) => Level::DEBUG,

            Self::Staging(StagingEvent::CleanedUp { .. }) => Level::TRACE,

            _ => Level::INFO,
        }
    }

    /// Get the log target for this event (for structured logging)
    #[must_use]
    pub fn log_target(&self) -> &'static str {
        match self {
            Self::General(_) => "natstage::events::general",
            Self::Staging(_) => "natstage::events::staging",
        }
    }

    /// Record this event through `tracing` at its own level.
    pub fn trace(&self) {
        let source = self.event_source();
        let target = self.log_target();
        let event = serde_json::to_string(self).unwrap_or_else(|_| format!("{self:?}"));

        match EventLevel::from(self.log_level()) {
            EventLevel::Error => {
                tracing::error!(source = source.as_str(), log_target = target, %event, "natstage event");
            }
            EventLevel::Warn => {
                tracing::warn!(source = source.as_str(), log_target = target, %event, "natstage event");
            }
            EventLevel::Info => {
                tracing::info!(source = source.as_str(), log_target = target, %event, "natstage event");
            }
            EventLevel::Debug => {
                tracing::debug!(source = source.as_str(), log_target = target, %event, "natstage event");
            }
            EventLevel::Trace => {
                tracing::trace!(source = source.as_str(), log_target = target, %event, "natstage event");
            }
        }
    }
}

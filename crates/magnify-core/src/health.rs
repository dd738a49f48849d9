//! Remote service health: wire format, folded status, and the readiness
//! state machine that gates the AI method.
//!
//! Health checks are a steady-state signal, not a one-shot operation:
//! any failure to reach the service or to parse its answer folds into
//! "nothing is ready" instead of surfacing as an error.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::service::UpscaleService;
use crate::types::RemoteServiceError;

/// Status strings that count as ready.
const READY_WORDS: &[&str] = &["ready", "ok", "healthy"];

/// A status field that is either a word (`"ready"`) or a flag (`true`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatusValue {
    /// Boolean status, e.g. `"model_loaded": true`.
    Flag(bool),
    /// Textual status, e.g. `"model_status": "loading"`.
    Text(String),
}

impl StatusValue {
    /// Whether this value means "ready".
    #[must_use]
    pub fn is_ready(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Text(text) => READY_WORDS
                .iter()
                .any(|w| w.eq_ignore_ascii_case(text.trim())),
        }
    }
}

/// JSON body of `GET <base>/health`.
///
/// Both the `server_status`/`model_status` and the
/// `status`/`model_loaded` spellings are accepted, alone or together.
/// When both spellings are present the `*_status` field wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthReport {
    /// Overall server status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_status: Option<StatusValue>,
    /// Overall server status, short spelling.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusValue>,
    /// Model loading status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_status: Option<StatusValue>,
    /// Model loading flag.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_loaded: Option<StatusValue>,
}

impl HealthReport {
    /// Parse a health response body.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error if the body is not a JSON object
    /// of the expected shape.
    pub fn from_json(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Interpret a `/health` reply of any HTTP status.
    ///
    /// A server still loading its model may answer 503 with a valid
    /// report, so the body is parsed first and the status code only
    /// matters when it is not a report.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteServiceError::Status`] for an unparsable non-2xx
    /// reply and [`RemoteServiceError::InvalidResponse`] for an
    /// unparsable 2xx reply.
    pub fn from_response(status: u16, body: &str) -> Result<Self, RemoteServiceError> {
        match Self::from_json(body) {
            Ok(report) => {
                if !(200..300).contains(&status) {
                    log::debug!("health answered {status} with a report");
                }
                Ok(report)
            }
            Err(_) if !(200..300).contains(&status) => Err(RemoteServiceError::Status(status)),
            Err(e) => Err(RemoteServiceError::InvalidResponse(e.to_string())),
        }
    }

    /// Fold the report into readiness flags.
    ///
    /// A model cannot be ready on a server that is not.
    #[must_use]
    pub fn status(&self) -> HealthStatus {
        let server_ready = self
            .server_status
            .as_ref()
            .or(self.status.as_ref())
            .is_some_and(StatusValue::is_ready);
        let model_ready = server_ready
            && self
                .model_status
                .as_ref()
                .or(self.model_loaded.as_ref())
                .is_some_and(StatusValue::is_ready);
        HealthStatus {
            server_ready,
            model_ready,
        }
    }
}

/// Result of one health check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// The server answered and reported itself ready.
    pub server_ready: bool,
    /// The AI model is loaded.
    pub model_ready: bool,
}

impl HealthStatus {
    /// The status used whenever the service cannot be reached.
    pub const UNREACHABLE: Self = Self {
        server_ready: false,
        model_ready: false,
    };
}

/// Readiness of the AI path.
///
/// Transitions are driven solely by the periodic health poll. Only
/// [`Readiness::Ready`] permits an AI submission; leaving `Ready` never
/// affects a request that is already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Readiness {
    /// The server could not be reached or is not ready.
    #[default]
    Unreachable,
    /// The server is up but the model is still loading.
    ServerOnly,
    /// Server and model are both ready.
    Ready,
}

impl Readiness {
    /// Map a folded health status onto a readiness state.
    #[must_use]
    pub const fn from_status(status: HealthStatus) -> Self {
        match (status.server_ready, status.model_ready) {
            (true, true) => Self::Ready,
            (true, false) => Self::ServerOnly,
            (false, _) => Self::Unreachable,
        }
    }

    /// Whether the AI method may be submitted.
    #[must_use]
    pub const fn allows_ai(self) -> bool {
        matches!(self, Self::Ready)
    }

    /// Status line shown in the UI.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::Unreachable => "Connecting to server... (retrying)",
            Self::ServerOnly => "Server ready, loading AI model...",
            Self::Ready => "Server and AI model ready",
        }
    }
}

impl fmt::Display for Readiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unreachable => "unreachable",
            Self::ServerOnly => "model loading",
            Self::Ready => "ready",
        })
    }
}

/// A readiness change observed by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the poll.
    pub from: Readiness,
    /// State after the poll.
    pub to: Readiness,
}

impl Transition {
    /// Whether the poll changed anything.
    #[must_use]
    pub fn changed(self) -> bool {
        self.from != self.to
    }
}

/// Query the service once, folding every failure into
/// [`HealthStatus::UNREACHABLE`].
#[allow(clippy::future_not_send)] // the browser service is !Send
pub async fn check_service_health<S: UpscaleService>(service: &S) -> HealthStatus {
    match service.health().await {
        Ok(report) => report.status(),
        Err(e) => {
            log::debug!("health check failed: {e}");
            HealthStatus::UNREACHABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn server_and_model_status_strings() {
        let report =
            HealthReport::from_json(r#"{"server_status":"ready","model_status":"ready"}"#)
                .unwrap();
        assert_eq!(Readiness::from_status(report.status()), Readiness::Ready);

        let loading =
            HealthReport::from_json(r#"{"server_status":"ready","model_status":"loading"}"#)
                .unwrap();
        assert_eq!(
            Readiness::from_status(loading.status()),
            Readiness::ServerOnly
        );
    }

    #[test]
    fn alternate_spelling_with_boolean_model_flag() {
        let report = HealthReport::from_json(r#"{"status":"ok","model_loaded":true}"#).unwrap();
        assert_eq!(
            report.status(),
            HealthStatus {
                server_ready: true,
                model_ready: true
            }
        );

        let not_loaded =
            HealthReport::from_json(r#"{"status":"healthy","model_loaded":false}"#).unwrap();
        assert_eq!(
            Readiness::from_status(not_loaded.status()),
            Readiness::ServerOnly
        );
    }

    #[test]
    fn model_ready_without_server_is_unreachable() {
        let report =
            HealthReport::from_json(r#"{"server_status":"starting","model_status":"ready"}"#)
                .unwrap();
        assert_eq!(report.status(), HealthStatus::UNREACHABLE);
        assert_eq!(
            Readiness::from_status(report.status()),
            Readiness::Unreachable
        );
    }

    #[test]
    fn missing_fields_mean_not_ready() {
        let report = HealthReport::from_json("{}").unwrap();
        assert_eq!(report.status(), HealthStatus::UNREACHABLE);
    }

    #[test]
    fn status_words_are_case_insensitive() {
        assert!(StatusValue::Text(" Ready ".into()).is_ready());
        assert!(!StatusValue::Text("loading".into()).is_ready());
        assert!(StatusValue::Flag(true).is_ready());
    }

    #[test]
    fn only_ready_allows_ai() {
        assert!(Readiness::Ready.allows_ai());
        assert!(!Readiness::ServerOnly.allows_ai());
        assert!(!Readiness::Unreachable.allows_ai());
        assert_eq!(Readiness::default(), Readiness::Unreachable);
    }

    #[test]
    fn both_spellings_together_parse() {
        let report = HealthReport::from_json(
            r#"{"status":"ok","server_status":"ready","model_status":"ready"}"#,
        )
        .unwrap();
        assert_eq!(Readiness::from_status(report.status()), Readiness::Ready);

        let loading = HealthReport::from_json(
            r#"{"server_status":"ready","model_status":"loading","model_loaded":true}"#,
        )
        .unwrap();
        assert_eq!(
            Readiness::from_status(loading.status()),
            Readiness::ServerOnly
        );
    }

    #[test]
    fn short_spelling_fills_in_for_a_missing_long_one() {
        let report =
            HealthReport::from_json(r#"{"status":"healthy","model_status":"ready"}"#).unwrap();
        assert_eq!(Readiness::from_status(report.status()), Readiness::Ready);
    }

    #[test]
    fn error_status_with_report_still_counts() {
        let report = HealthReport::from_response(
            503,
            r#"{"server_status":"ready","model_status":"loading"}"#,
        )
        .unwrap();
        assert_eq!(
            Readiness::from_status(report.status()),
            Readiness::ServerOnly
        );
    }

    #[test]
    fn unparsable_reply_keeps_its_status() {
        assert_eq!(
            HealthReport::from_response(502, "<html>Bad Gateway</html>").unwrap_err(),
            RemoteServiceError::Status(502)
        );
        assert!(matches!(
            HealthReport::from_response(200, "ok").unwrap_err(),
            RemoteServiceError::InvalidResponse(_)
        ));
    }

    #[test]
    fn non_object_body_fails_to_parse() {
        assert!(HealthReport::from_json("<html>").is_err());
    }
}

use std::time::Duration;

use thiserror::Error;

/// Errors returned by the text-generation backend and the analysis orchestrator.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("text generation API returned status {status}: {body}")]
    Api { status: u16, body: String },

    /// The call did not complete within the configured bound.
    #[error("text generation timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// The backend answered successfully but produced no text segment.
    #[error("text generation returned no text content")]
    EmptyResponse,

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Coarse classification callers can branch on without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisErrorKind {
    Timeout,
    Transport,
    Api,
    EmptyResponse,
    Decode,
}

impl AnalysisError {
    #[must_use]
    pub fn kind(&self) -> AnalysisErrorKind {
        match self {
            AnalysisError::Http(e) if e.is_timeout() => AnalysisErrorKind::Timeout,
            AnalysisError::Http(e) if e.is_decode() => AnalysisErrorKind::Decode,
            AnalysisError::Http(_) => AnalysisErrorKind::Transport,
            AnalysisError::Api { .. } => AnalysisErrorKind::Api,
            AnalysisError::Timeout(_) => AnalysisErrorKind::Timeout,
            AnalysisError::EmptyResponse => AnalysisErrorKind::EmptyResponse,
            AnalysisError::Deserialize { .. } => AnalysisErrorKind::Decode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_for_non_http_variants() {
        assert_eq!(
            AnalysisError::Timeout(Duration::from_secs(5)).kind(),
            AnalysisErrorKind::Timeout
        );
        assert_eq!(
            AnalysisError::Api {
                status: 429,
                body: "rate limited".to_owned()
            }
            .kind(),
            AnalysisErrorKind::Api
        );
        assert_eq!(
            AnalysisError::EmptyResponse.kind(),
            AnalysisErrorKind::EmptyResponse
        );

        let source = serde_json::from_str::<()>("invalid").unwrap_err();
        assert_eq!(
            AnalysisError::Deserialize {
                context: "test".to_owned(),
                source,
            }
            .kind(),
            AnalysisErrorKind::Decode
        );
    }

    #[test]
    fn timeout_message_names_the_bound() {
        let msg = AnalysisError::Timeout(Duration::from_millis(1500)).to_string();
        assert_eq!(msg, "text generation timed out after 1.5s");
    }

    #[tokio::test]
    async fn connect_failure_is_transport() {
        let err = reqwest::Client::new()
            .get("http://0.0.0.0:1")
            .send()
            .await
            .unwrap_err();
        assert_eq!(AnalysisError::Http(err).kind(), AnalysisErrorKind::Transport);
    }
}

//! Submission errors.
//!
//! Every variant renders as a single human-readable sentence. The two that
//! matter most to users need different fixes: `AllEndpointsUnreachable`
//! means no backend is running, `ServerRejected` means a backend is running
//! and refused the pipeline.

use thiserror::Error;

/// Outcome of a failed submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubmissionError {
    /// Every endpoint failed at the network layer
    #[error("Cannot reach any analysis backend (tried: {})", .attempted.join(", "))]
    AllEndpointsUnreachable { attempted: Vec<String> },

    /// A reachable endpoint answered with a non-2xx status
    #[error("Backend {endpoint} rejected the request with status {status}: {body}")]
    ServerRejected {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The probe succeeded but the analysis request failed at the network layer
    #[error("Lost connection to {endpoint} while sending the pipeline: {reason}")]
    ConnectionLost { endpoint: String, reason: String },

    /// A 2xx response whose body is not an analysis summary
    #[error("Backend {endpoint} returned an unreadable response: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    /// A submission is already running for this session
    #[error("A submission is already in flight")]
    InFlight,

    /// The session was torn down or cancelled before the submission finished
    #[error("Submission was cancelled")]
    Cancelled,
}

/// Discriminant of [`SubmissionError`], for callers that branch on the
/// failure class without caring about its details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionErrorKind {
    AllEndpointsUnreachable,
    ServerRejected,
    ConnectionLost,
    InvalidResponse,
    InFlight,
    Cancelled,
}

impl SubmissionError {
    pub fn kind(&self) -> SubmissionErrorKind {
        match self {
            SubmissionError::AllEndpointsUnreachable { .. } => {
                SubmissionErrorKind::AllEndpointsUnreachable
            }
            SubmissionError::ServerRejected { .. } => SubmissionErrorKind::ServerRejected,
            SubmissionError::ConnectionLost { .. } => SubmissionErrorKind::ConnectionLost,
            SubmissionError::InvalidResponse { .. } => SubmissionErrorKind::InvalidResponse,
            SubmissionError::InFlight => SubmissionErrorKind::InFlight,
            SubmissionError::Cancelled => SubmissionErrorKind::Cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unreachable_lists_endpoints() {
        let error = SubmissionError::AllEndpointsUnreachable {
            attempted: vec!["http://a".to_string(), "http://b".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "Cannot reach any analysis backend (tried: http://a, http://b)"
        );
        assert_eq!(error.kind(), SubmissionErrorKind::AllEndpointsUnreachable);
    }

    #[test]
    fn test_rejected_is_verbatim() {
        let error = SubmissionError::ServerRejected {
            endpoint: "http://a".to_string(),
            status: 422,
            body: "{\"detail\":\"bad edge\"}".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Backend http://a rejected the request with status 422: {\"detail\":\"bad edge\"}"
        );
    }
}

//! User-facing notifications for submission outcomes.
//!
//! The UI layer decides how to show these (toast, status bar, stderr); this
//! module only decides what they say.

use crate::error::SubmissionError;
use plumb_libs::AnalysisSummary;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

/// A single human-readable message about a finished submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
    /// How long the message should stay on screen
    pub duration: Duration,
}

impl Notification {
    /// Describe the outcome of a submission.
    ///
    /// Failures say whether no backend could be reached (start a local
    /// service) or a backend refused the pipeline (fix the pipeline).
    pub fn from_outcome(outcome: &Result<AnalysisSummary, SubmissionError>) -> Self {
        match outcome {
            Ok(summary) => Self {
                title: "Pipeline Analysis Complete".to_string(),
                description: format!(
                    "Pipeline has {} nodes, {} edges. Is DAG? {}",
                    summary.num_nodes,
                    summary.num_edges,
                    if summary.is_dag { "yes" } else { "no" }
                ),
                severity: Severity::Info,
                duration: Duration::from_secs(5),
            },
            Err(e) => Self {
                title: "Error".to_string(),
                description: format!("Failed to analyze pipeline: {}", Self::explain(e)),
                severity: Severity::Error,
                duration: Duration::from_secs(10),
            },
        }
    }

    fn explain(error: &SubmissionError) -> String {
        match error {
            SubmissionError::AllEndpointsUnreachable { attempted } if !attempted.is_empty() => {
                format!(
                    "Cannot connect to any backend. Make sure an analysis service is running at one of: {}",
                    attempted.join(", ")
                )
            }
            SubmissionError::AllEndpointsUnreachable { .. } => {
                "No analysis endpoints are configured".to_string()
            }
            SubmissionError::ServerRejected { status, body, .. } => {
                format!("Server returned {}: {}", status, body)
            }
            other => other.to_string(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

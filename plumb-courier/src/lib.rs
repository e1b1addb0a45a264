//! # Plumb Courier
//!
//! Submission side of the pipeline editor: the client that delivers a
//! serialized graph to the first reachable analysis endpoint, and the
//! editing session that owns the graph and guards against concurrent
//! submissions.

pub mod client;
pub mod error;
pub mod notification;
pub mod session;

pub use client::{AnalysisTransport, Courier, HttpTransport, TransportError};
pub use error::{SubmissionError, SubmissionErrorKind};
pub use notification::{Notification, Severity};
pub use session::{EditorSession, SubmissionTicket};

// Wire type shared with the analysis service
pub use plumb_libs::AnalysisSummary;

//! Editing session.
//!
//! Owns the graph store of one editor view and exposes the callbacks the
//! canvas raises. Structural errors from those callbacks are logged and the
//! mutation is dropped; they never take the session down.
//!
//! Submission runs on a tokio task over a serialized snapshot of the graph,
//! so the task never touches the store. Only one submission may be in flight
//! at a time, and tearing the session down aborts it.

use crate::client::Courier;
use crate::error::SubmissionError;
use plumb_libs::{
    serialize, AnalysisSummary, Connection, Edge, EdgeChange, GraphStore, Node, NodeChange,
    NodeData, Port, Position,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{error, info, warn};

/// Clears the in-flight flag when the submission task ends, however it ends
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Handle on a running submission
pub struct SubmissionTicket {
    handle: JoinHandle<Result<AnalysisSummary, SubmissionError>>,
}

impl SubmissionTicket {
    /// Wait for the submission to finish.
    ///
    /// Resolves to `SubmissionError::Cancelled` if the session was dropped or
    /// cancelled first.
    pub async fn outcome(self) -> Result<AnalysisSummary, SubmissionError> {
        match self.handle.await {
            Ok(result) => result,
            Err(e) => {
                if e.is_panic() {
                    error!("Submission task panicked: {}", e);
                }
                Err(SubmissionError::Cancelled)
            }
        }
    }
}

/// One editor view: the graph it edits and the courier it submits through
pub struct EditorSession {
    store: GraphStore,
    courier: Arc<Courier>,
    in_flight: Arc<AtomicBool>,
    pending: Option<AbortHandle>,
}

impl EditorSession {
    /// Create a session over an existing graph
    ///
    /// # Arguments
    ///
    /// * `store` - Initial graph (e.g. the starter pipeline)
    /// * `courier` - Submission client shared with other sessions
    pub fn new(store: GraphStore, courier: Arc<Courier>) -> Self {
        Self {
            store,
            courier,
            in_flight: Arc::new(AtomicBool::new(false)),
            pending: None,
        }
    }

    /// Read access to the graph
    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Nodes to render
    pub fn nodes(&self) -> &[Node] {
        self.store.nodes()
    }

    /// Edges to render
    pub fn edges(&self) -> &[Edge] {
        self.store.edges()
    }

    /// Ports to render for a node, empty if the node does not exist
    pub fn ports(&self, node_id: &str) -> Vec<Port> {
        self.store.ports(node_id).unwrap_or_default()
    }

    /// A node-type token was dropped on the canvas.
    ///
    /// Returns the new node's id, or `None` if the token is not a node type.
    pub fn on_drop(&mut self, type_token: &str, position: Position) -> Option<String> {
        match self.store.add_node(type_token, position) {
            Ok(node) => Some(node.id.clone()),
            Err(e) => {
                warn!("Ignored drop: {}", e);
                None
            }
        }
    }

    /// A node's editing controls changed some of its fields.
    ///
    /// Returns `false` if the node does not exist.
    pub fn on_node_data_patch(&mut self, node_id: &str, patch: NodeData) -> bool {
        match self.store.update_node_data(node_id, patch) {
            Ok(_) => true,
            Err(e) => {
                warn!("Ignored data patch: {}", e);
                false
            }
        }
    }

    /// The user dragged a wire between two ports.
    ///
    /// Returns the new edge's id, or `None` if the connection was rejected.
    pub fn on_connect(&mut self, connection: Connection) -> Option<String> {
        match self.store.connect(connection) {
            Ok(edge) => Some(edge.id.clone()),
            Err(e) => {
                warn!("Ignored connection: {}", e);
                None
            }
        }
    }

    pub fn on_nodes_change(&mut self, changes: Vec<NodeChange>) -> usize {
        self.store.apply_node_changes(changes)
    }

    pub fn on_edges_change(&mut self, changes: Vec<EdgeChange>) -> usize {
        self.store.apply_edge_changes(changes)
    }

    /// Whether a submission is currently running
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Start submitting the current graph.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns
    ///
    /// * `Ok(SubmissionTicket)` - The submission is running
    /// * `Err(SubmissionError::InFlight)` - Another submission is still
    ///   running; this request is rejected, not queued
    pub fn submit(&mut self) -> Result<SubmissionTicket, SubmissionError> {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            warn!("Submission rejected: another one is in flight");
            return Err(SubmissionError::InFlight);
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        let graph = serialize(&self.store);
        let courier = Arc::clone(&self.courier);

        info!("Starting submission");
        let handle = tokio::spawn(async move {
            let _guard = guard;
            courier.submit(&graph).await
        });

        self.pending = Some(handle.abort_handle());
        Ok(SubmissionTicket { handle })
    }

    /// Abandon the running submission, if any.
    ///
    /// Returns `true` if a submission was running.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(handle) if !handle.is_finished() => {
                info!("Cancelling in-flight submission");
                handle.abort();
                true
            }
            _ => false,
        }
    }
}

impl Drop for EditorSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

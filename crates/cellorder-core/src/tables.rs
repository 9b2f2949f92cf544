//! The relational state the materializer folds events into.
//!
//! `Tables` is a plain in-memory store, keyed the way the backing SQL store
//! described by the catalog would key it. [`TableOp`] is the materializer's
//! output alphabet: every event reduces to zero or more ops, and applying a
//! batch of ops is the only way `Tables` changes.

use rustc_hash::FxHashMap;

use crate::model::{
    Actor, ActorId, ApprovalId, Cell, CellId, DeltaId, ExecutionQueueEntry, Output, OutputDelta,
    OutputId, PendingClear, QueueId, RuntimeSession, SessionId, ToolApproval, UserId,
};

/// One mutation to a state table, as produced by [`crate::materializer::reduce`].
#[derive(Debug, Clone)]
pub enum TableOp {
    /// Insert or fully replace a cell row.
    UpsertCell(Box<Cell>),
    DeleteCell(CellId),
    /// Insert or fully replace an output row (used both for new outputs and
    /// for in-place display-id updates, where the caller has already cloned
    /// and mutated the existing row).
    UpsertOutput(Box<Output>),
    DeleteOutputsForCell(CellId),
    InsertOutputDelta(Box<OutputDelta>),
    UpsertPendingClear(PendingClear),
    DeletePendingClear(CellId),
    UpsertRuntimeSession(Box<RuntimeSession>),
    UpsertQueueEntry(Box<ExecutionQueueEntry>),
    SetPresence { user_id: UserId, cell_id: Option<CellId> },
    UpsertActor(Actor),
    UpsertToolApproval(Box<ToolApproval>),
    SetNotebookMetadata { key: String, value: serde_json::Value },
    SetNotebookTitle(String),
    SetUiState { key: String, value: serde_json::Value },
}

/// The full in-memory state a notebook's event log materializes into.
#[derive(Debug, Default)]
pub struct Tables {
    pub cells: FxHashMap<CellId, Cell>,
    pub outputs: FxHashMap<OutputId, Output>,
    pub output_deltas: FxHashMap<DeltaId, OutputDelta>,
    pub pending_clears: FxHashMap<CellId, PendingClear>,
    pub runtime_sessions: FxHashMap<SessionId, RuntimeSession>,
    pub execution_queue: FxHashMap<QueueId, ExecutionQueueEntry>,
    pub presence: FxHashMap<UserId, Option<CellId>>,
    pub actors: FxHashMap<ActorId, Actor>,
    pub tool_approvals: FxHashMap<ApprovalId, ToolApproval>,
    pub notebook_metadata: FxHashMap<String, serde_json::Value>,
    pub notebook_title: Option<String>,
    pub ui_state: FxHashMap<String, serde_json::Value>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a single table op. Infallible: every op targets a table keyed
    /// by scalar id and either inserts, replaces, or removes a row.
    pub fn apply(&mut self, op: TableOp) {
        match op {
            TableOp::UpsertCell(cell) => {
                self.cells.insert(cell.id.clone(), *cell);
            }
            TableOp::DeleteCell(id) => {
                self.cells.remove(&id);
            }
            TableOp::UpsertOutput(output) => {
                self.outputs.insert(output.id.clone(), *output);
            }
            TableOp::DeleteOutputsForCell(cell_id) => {
                self.outputs.retain(|_, o| o.cell_id != cell_id);
            }
            TableOp::InsertOutputDelta(delta) => {
                self.output_deltas.insert(delta.id.clone(), *delta);
            }
            TableOp::UpsertPendingClear(pending) => {
                self.pending_clears.insert(pending.cell_id.clone(), pending);
            }
            TableOp::DeletePendingClear(cell_id) => {
                self.pending_clears.remove(&cell_id);
            }
            TableOp::UpsertRuntimeSession(session) => {
                self.runtime_sessions.insert(session.session_id.clone(), *session);
            }
            TableOp::UpsertQueueEntry(entry) => {
                self.execution_queue.insert(entry.id.clone(), *entry);
            }
            TableOp::SetPresence { user_id, cell_id } => {
                self.presence.insert(user_id, cell_id);
            }
            TableOp::UpsertActor(actor) => {
                self.actors.insert(actor.id.clone(), actor);
            }
            TableOp::UpsertToolApproval(approval) => {
                self.tool_approvals.insert(approval.id.clone(), *approval);
            }
            TableOp::SetNotebookMetadata { key, value } => {
                self.notebook_metadata.insert(key, value);
            }
            TableOp::SetNotebookTitle(title) => {
                self.notebook_title = Some(title);
            }
            TableOp::SetUiState { key, value } => {
                self.ui_state.insert(key, value);
            }
        }
    }

    pub fn apply_all(&mut self, ops: impl IntoIterator<Item = TableOp>) {
        for op in ops {
            self.apply(op);
        }
    }

    /// Allocate the next delta sequence number for an output, starting at 0.
    pub fn next_delta_sequence(&self, output_id: &str) -> u64 {
        let max = self
            .output_deltas
            .values()
            .filter(|d| d.output_id == output_id)
            .map(|d| d.sequence_number)
            .max();
        max.map(|m| m + 1).unwrap_or(0)
    }
}

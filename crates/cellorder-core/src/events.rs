//! The versioned event catalog.
//!
//! Events are append-only and immutable: a new behavior gets a new variant
//! (and usually a new version-tagged name) rather than a change to an
//! existing one, so historical logs stay replayable.

use serde::{Deserialize, Serialize};

use crate::model::{
    ActorId, ActorType, ApprovalId, ApprovalStatus, CellId, CellType, OutputContent, OutputId,
    QueueId, Representations, RuntimeStatus, SessionId, UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityField {
    Source,
    Output,
    AiContext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOutcome {
    Success,
    Failure,
}

/// A stable reference to a cell, returned by cell-creation so subsequent
/// operations (notably the importer's running `cellBefore`) can chain off
/// it without re-querying the full cell table.
#[derive(Debug, Clone)]
pub struct CellReference {
    pub id: CellId,
    pub cell_type: CellType,
    pub fractional_index: String,
}

/// A single versioned event record. Dispatch over this enum is exhaustive
/// in [`crate::materializer::reduce`]; there is no default/unknown arm.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name", content = "args")]
pub enum Event {
    #[serde(rename = "v1.NotebookInitialized")]
    NotebookInitializedV1 { notebook_id: String },

    #[serde(rename = "v1.NotebookMetadataSet")]
    NotebookMetadataSet {
        key: String,
        value: serde_json::Value,
    },

    #[serde(rename = "v1.NotebookTitleChanged")]
    NotebookTitleChanged { title: String },

    /// Deprecated positional form, retained for replay: `position` is
    /// converted to a pseudo fractional index by the materializer and
    /// should not be emitted by new writers.
    #[serde(rename = "v1.CellCreated")]
    CellCreatedV1 {
        id: CellId,
        position: f64,
        cell_type: CellType,
        created_by: ActorId,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<ActorId>,
    },

    #[serde(rename = "v2.CellCreated")]
    CellCreatedV2 {
        id: CellId,
        fractional_index: String,
        cell_type: CellType,
        created_by: ActorId,
    },

    #[serde(rename = "v1.CellSourceChanged")]
    CellSourceChanged {
        id: CellId,
        source: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<ActorId>,
    },

    #[serde(rename = "v1.CellTypeChanged")]
    CellTypeChanged {
        id: CellId,
        cell_type: CellType,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<ActorId>,
    },

    #[serde(rename = "v1.CellDeleted")]
    CellDeleted {
        id: CellId,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<ActorId>,
    },

    /// Legacy name kept as a distinct replay arm alongside `v2.CellMoved`:
    /// same shape, separate branch of the sum type.
    #[serde(rename = "v1.CellMoved")]
    CellMovedV1 {
        id: CellId,
        fractional_index: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<ActorId>,
    },

    #[serde(rename = "v2.CellMoved")]
    CellMovedV2 {
        id: CellId,
        fractional_index: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<ActorId>,
    },

    #[serde(rename = "v1.CellVisibilityToggled")]
    CellVisibilityToggled {
        id: CellId,
        field: VisibilityField,
        visible: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        actor_id: Option<ActorId>,
    },

    #[serde(rename = "v1.CellAiSettingsChanged")]
    CellAiSettingsChanged {
        id: CellId,
        #[serde(skip_serializing_if = "Option::is_none")]
        ai_provider: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ai_model: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        ai_settings: Option<serde_json::Value>,
    },

    #[serde(rename = "v1.CellSqlSettingsChanged")]
    CellSqlSettingsChanged {
        id: CellId,
        #[serde(skip_serializing_if = "Option::is_none")]
        sql_connection_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        sql_result_variable: Option<String>,
    },

    #[serde(rename = "v1.RuntimeSessionStarted")]
    RuntimeSessionStarted {
        session_id: SessionId,
        runtime_id: String,
        runtime_type: String,
        can_execute_code: bool,
        can_execute_sql: bool,
        can_execute_ai: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        available_ai_models: Option<Vec<String>>,
    },

    #[serde(rename = "v1.RuntimeSessionStatusChanged")]
    RuntimeSessionStatusChanged {
        session_id: SessionId,
        status: RuntimeStatus,
        #[serde(skip_serializing_if = "Option::is_none")]
        is_active: Option<bool>,
    },

    #[serde(rename = "v1.RuntimeSessionTerminated")]
    RuntimeSessionTerminated { session_id: SessionId },

    #[serde(rename = "v1.ExecutionRequested")]
    ExecutionRequested {
        queue_id: QueueId,
        cell_id: CellId,
        execution_count: u32,
        requested_by: ActorId,
    },

    #[serde(rename = "v1.ExecutionAssigned")]
    ExecutionAssigned {
        queue_id: QueueId,
        runtime_session: SessionId,
    },

    #[serde(rename = "v1.ExecutionStarted")]
    ExecutionStarted {
        queue_id: QueueId,
        runtime_session: SessionId,
        started_at: i64,
    },

    #[serde(rename = "v1.ExecutionCompleted")]
    ExecutionCompleted {
        queue_id: QueueId,
        status: ExecutionOutcome,
        completed_at: i64,
        duration_ms: u64,
    },

    #[serde(rename = "v1.ExecutionCancelled")]
    ExecutionCancelled {
        queue_id: QueueId,
        #[serde(skip_serializing_if = "Option::is_none")]
        cancelled_by: Option<ActorId>,
    },

    #[serde(rename = "v1.MultimediaDisplayOutputAdded")]
    MultimediaDisplayOutputAdded {
        id: OutputId,
        cell_id: CellId,
        position: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        display_id: Option<String>,
        representations: Representations,
        #[serde(skip_serializing_if = "Option::is_none")]
        execution_count: Option<u32>,
    },

    /// In-place update only; never inserts a new row.
    #[serde(rename = "v1.MultimediaDisplayOutputUpdated")]
    MultimediaDisplayOutputUpdated {
        display_id: String,
        representations: Representations,
    },

    #[serde(rename = "v1.MultimediaResultOutputAdded")]
    MultimediaResultOutputAdded {
        id: OutputId,
        cell_id: CellId,
        position: f64,
        representations: Representations,
        #[serde(skip_serializing_if = "Option::is_none")]
        execution_count: Option<u32>,
    },

    #[serde(rename = "v1.TerminalOutputAdded")]
    TerminalOutputAdded {
        id: OutputId,
        cell_id: CellId,
        position: f64,
        stream_name: String,
        content: OutputContent,
    },

    /// Deprecated: concatenates into the target output's `data` in place.
    #[serde(rename = "v1.TerminalOutputAppended")]
    TerminalOutputAppendedV1 { output_id: OutputId, delta: String },

    #[serde(rename = "v2.TerminalOutputAppended")]
    TerminalOutputAppendedV2 {
        output_id: OutputId,
        delta: String,
        sequence_number: u64,
    },

    #[serde(rename = "v1.MarkdownOutputAdded")]
    MarkdownOutputAdded {
        id: OutputId,
        cell_id: CellId,
        position: f64,
        content: OutputContent,
    },

    #[serde(rename = "v1.MarkdownOutputAppended")]
    MarkdownOutputAppendedV1 { output_id: OutputId, delta: String },

    #[serde(rename = "v2.MarkdownOutputAppended")]
    MarkdownOutputAppendedV2 {
        output_id: OutputId,
        delta: String,
        sequence_number: u64,
    },

    #[serde(rename = "v1.ErrorOutputAdded")]
    ErrorOutputAdded {
        id: OutputId,
        cell_id: CellId,
        position: f64,
        content: OutputContent,
    },

    #[serde(rename = "v1.CellOutputsCleared")]
    CellOutputsCleared {
        cell_id: CellId,
        wait: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        cleared_by: Option<ActorId>,
    },

    #[serde(rename = "v1.ActorProfileSet")]
    ActorProfileSet {
        id: ActorId,
        actor_type: ActorType,
        display_name: String,
    },

    #[serde(rename = "v1.ToolApprovalRequested")]
    ToolApprovalRequested {
        id: ApprovalId,
        cell_id: CellId,
        tool_name: String,
        requested_by: ActorId,
    },

    #[serde(rename = "v1.ToolApprovalResponded")]
    ToolApprovalResponded {
        id: ApprovalId,
        status: ApprovalStatus,
        responded_by: ActorId,
    },

    #[serde(rename = "v1.PresenceSet")]
    PresenceSet {
        user_id: UserId,
        #[serde(skip_serializing_if = "Option::is_none")]
        cell_id: Option<CellId>,
    },

    #[serde(rename = "v1.UiStateSet")]
    UiStateSet {
        key: String,
        value: serde_json::Value,
    },

    /// No-op materializer arm; kept so a log containing debug markers
    /// replays without error.
    #[serde(rename = "v1.DebugEvent")]
    DebugEvent { message: String },
}

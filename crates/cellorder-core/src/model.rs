//! Record types for the notebook state tables.
//!
//! These are plain data, never mutated except by applying a
//! [`crate::tables::TableOp`] produced by the materializer. Ids are opaque
//! strings (UUIDs in practice) rather than newtypes, since the event catalog
//! itself treats every id as an untyped string field.

use serde::{Deserialize, Serialize};

pub type CellId = String;
pub type OutputId = String;
pub type DeltaId = String;
pub type ActorId = String;
pub type UserId = String;
pub type SessionId = String;
pub type QueueId = String;
pub type ApprovalId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellType {
    Code,
    Markdown,
    Sql,
    Raw,
    Ai,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionState {
    #[default]
    Idle,
    Queued,
    Running,
    Completed,
    Error,
}

/// A single notebook cell. Ordered by `fractional_index` ascending; ties
/// broken by `id` lexicographic ascending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub cell_type: CellType,
    pub source: String,
    pub fractional_index: Option<String>,
    pub execution_count: Option<u32>,
    pub execution_state: ExecutionState,
    pub assigned_runtime_session: Option<SessionId>,
    pub sql_connection_id: Option<String>,
    pub sql_result_variable: Option<String>,
    pub ai_provider: Option<String>,
    pub ai_model: Option<String>,
    pub ai_settings: Option<serde_json::Value>,
    pub source_visible: bool,
    pub output_visible: bool,
    pub ai_context_visible: bool,
    pub created_by: ActorId,
    pub last_execution_duration_ms: Option<u64>,
}

impl Cell {
    pub fn new(id: impl Into<CellId>, cell_type: CellType, created_by: impl Into<ActorId>) -> Self {
        Self {
            id: id.into(),
            cell_type,
            source: String::new(),
            fractional_index: None,
            execution_count: None,
            execution_state: ExecutionState::default(),
            assigned_runtime_session: None,
            sql_connection_id: None,
            sql_result_variable: None,
            ai_provider: None,
            ai_model: None,
            ai_settings: None,
            source_visible: true,
            output_visible: true,
            ai_context_visible: true,
            created_by: created_by.into(),
            last_execution_duration_ms: None,
        }
    }

    /// Sort key implementing the tie-break rule: index ascending, then id.
    pub fn order_key(&self) -> (&str, &str) {
        (self.fractional_index.as_deref().unwrap_or(""), self.id.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputType {
    MultimediaDisplay,
    MultimediaResult,
    Terminal,
    Markdown,
    Error,
}

/// The inline-vs-by-reference content envelope shared by every output-add
/// event and the denormalized output table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputContent {
    Inline {
        data: serde_json::Value,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
    Artifact {
        artifact_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<serde_json::Value>,
    },
}

impl OutputContent {
    pub fn inline(data: impl Into<serde_json::Value>) -> Self {
        Self::Inline {
            data: data.into(),
            metadata: None,
        }
    }
}

/// One MIME-typed payload within a multimedia output's bundle. `representations`
/// is an ordered keyless map from MIME type to container, so this is a `Vec`
/// rather than a `HashMap` to preserve the priority/insertion order callers
/// supplied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Representation {
    pub mime_type: String,
    pub content: OutputContent,
}

pub type Representations = Vec<Representation>;

/// A materialized output row. Exactly one of `data`/`artifact_id` is
/// populated per representation; `data`/`mime_type` here are the
/// denormalized primary representation columns filled in by the
/// materializer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub id: OutputId,
    pub cell_id: CellId,
    pub output_type: OutputType,
    pub position: f64,
    pub stream_name: Option<String>,
    pub execution_count: Option<u32>,
    pub display_id: Option<String>,
    pub data: Option<serde_json::Value>,
    pub artifact_id: Option<String>,
    pub mime_type: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub representations: Option<Representations>,
}

/// An appended chunk of a streaming output. Appended, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputDelta {
    pub id: DeltaId,
    pub output_id: OutputId,
    pub delta: String,
    pub sequence_number: u64,
}

/// A pending deferred clear, keyed by cell. At most one entry per `cell_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingClear {
    pub cell_id: CellId,
    pub cleared_by: Option<ActorId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeStatus {
    Starting,
    Ready,
    Busy,
    Restarting,
    Terminated,
}

/// A connected execution runtime and its capabilities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeSession {
    pub session_id: SessionId,
    pub runtime_id: String,
    pub runtime_type: String,
    pub status: RuntimeStatus,
    pub is_active: bool,
    pub can_execute_code: bool,
    pub can_execute_sql: bool,
    pub can_execute_ai: bool,
    pub available_ai_models: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    Pending,
    Assigned,
    Executing,
    Completed,
    Failed,
    Cancelled,
}

/// One queued-or-in-flight execution request for a cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionQueueEntry {
    pub id: QueueId,
    pub cell_id: CellId,
    pub execution_count: u32,
    pub requested_by: ActorId,
    pub status: QueueStatus,
    pub assigned_runtime_session: Option<SessionId>,
    pub started_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub execution_duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorType {
    Human,
    Ai,
    System,
}

/// A known participant (human, AI, or system) in a notebook.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub actor_type: ActorType,
    pub display_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Denied,
}

/// A request for a human to approve an AI-initiated tool call, and its
/// resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolApproval {
    pub id: ApprovalId,
    pub cell_id: CellId,
    pub tool_name: String,
    pub requested_by: ActorId,
    pub status: ApprovalStatus,
    pub responded_by: Option<ActorId>,
    pub responded_at: Option<i64>,
}

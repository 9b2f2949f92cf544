//! The pure event-to-table-operation reducer.
//!
//! `reduce` is dependent only on the current [`Tables`] it is given, never
//! on wall-clock time, randomness, or any mutable global. Replaying the
//! same event sequence against a fresh `Tables` always produces the same
//! state, independent of how the events are batched.

use serde_json::Value;

use crate::events::{CellReference, Event, ExecutionOutcome, VisibilityField};
use crate::index;
use crate::model::{
    Cell, CellType, ExecutionQueueEntry, ExecutionState, Output, OutputContent, OutputDelta,
    OutputType, PendingClear, QueueStatus, Representation, Representations, RuntimeSession,
    RuntimeStatus,
};
use crate::tables::{TableOp, Tables};

/// MIME priority for general multimedia outputs (display outputs and the
/// catch-all case), most to least preferred.
const GENERAL_MIME_PRIORITY: &[&str] = &[
    "application/vnd.plotly.v1+json",
    "application/vnd.vega.v5+json",
    "application/vnd.jupyter.widget-view+json",
    "application/vnd.dataresource+json",
    "application/vdom.v1+json",
    "application/geo+json",
    "application/json",
    "application/javascript",
    "text/html",
    "image/svg+xml",
    "image/png",
    "image/jpeg",
    "image/gif",
    "text/latex",
    "text/markdown",
    "text/plain",
];

/// MIME priority for `MultimediaResultOutputAdded`: narrower, HTML-first.
const RESULT_MIME_PRIORITY: &[&str] = &[
    "text/html",
    "image/png",
    "image/jpeg",
    "image/svg+xml",
    "application/json",
    "text/plain",
];

fn select_primary<'a>(
    representations: &'a Representations,
    priority: &[&str],
) -> Option<&'a Representation> {
    priority
        .iter()
        .find_map(|mime| representations.iter().find(|r| r.mime_type == *mime))
}

/// Coerce a `serde_json::Value` to its string form for the denormalized
/// `data` column: strings pass through unchanged, everything else is
/// serialized to JSON text.
fn coerce_to_string(value: &Value) -> Value {
    match value {
        Value::String(_) => value.clone(),
        other => Value::String(other.to_string()),
    }
}

/// Split a primary representation into the `(data, artifact_id)` pair
/// stored on the denormalized output row.
fn primary_fields(rep: Option<&Representation>) -> (Option<Value>, Option<String>, Option<String>) {
    match rep {
        None => (None, None, None),
        Some(rep) => match &rep.content {
            OutputContent::Inline { data, .. } => {
                (Some(coerce_to_string(data)), None, Some(rep.mime_type.clone()))
            }
            OutputContent::Artifact { artifact_id, .. } => {
                (None, Some(artifact_id.clone()), Some(rep.mime_type.clone()))
            }
        },
    }
}

fn content_fields(content: &OutputContent) -> (Option<Value>, Option<String>) {
    match content {
        OutputContent::Inline { data, .. } => (Some(data.clone()), None),
        OutputContent::Artifact { artifact_id, .. } => (None, Some(artifact_id.clone())),
    }
}

/// Consume any pending clear on `cell_id`, returning the ops to delete its
/// existing outputs and the pending-clear row itself. Used by every
/// output-add event so a deferred `clear_output(wait=True)` only takes
/// effect once a real output arrives.
fn consume_pending_clear(tables: &Tables, cell_id: &str, ops: &mut Vec<TableOp>) {
    if tables.pending_clears.contains_key(cell_id) {
        ops.push(TableOp::DeleteOutputsForCell(cell_id.to_string()));
        ops.push(TableOp::DeletePendingClear(cell_id.to_string()));
    }
}

fn set_presence(ops: &mut Vec<TableOp>, actor_id: Option<&str>, cell_id: Option<String>) {
    if let Some(actor_id) = actor_id {
        ops.push(TableOp::SetPresence {
            user_id: actor_id.to_string(),
            cell_id,
        });
    }
}

/// Reduce one event into the table operations it implies, given the current
/// state to resolve references against. Returns an empty batch for no-op
/// events and for events referencing rows that no longer exist.
pub fn reduce(event: &Event, tables: &Tables) -> Vec<TableOp> {
    let mut ops = Vec::new();

    match event {
        Event::NotebookInitializedV1 { .. } => {}

        Event::NotebookMetadataSet { key, value } => {
            ops.push(TableOp::SetNotebookMetadata {
                key: key.clone(),
                value: value.clone(),
            });
        }

        Event::NotebookTitleChanged { title } => {
            ops.push(TableOp::SetNotebookTitle(title.clone()));
        }

        Event::CellCreatedV1 {
            id,
            position,
            cell_type,
            created_by,
            actor_id,
        } => {
            if !tables.cells.contains_key(id) {
                let mut cell = Cell::new(id.clone(), *cell_type, created_by.clone());
                cell.fractional_index = Some(format!("a{}", index::encode_base36(position.floor() as u64)));
                ops.push(TableOp::UpsertCell(Box::new(cell)));
            }
            set_presence(&mut ops, actor_id.as_deref().or(Some(created_by)), Some(id.clone()));
        }

        Event::CellCreatedV2 {
            id,
            fractional_index,
            cell_type,
            created_by,
        } => {
            let mut cell = Cell::new(id.clone(), *cell_type, created_by.clone());
            cell.fractional_index = Some(fractional_index.clone());
            ops.push(TableOp::UpsertCell(Box::new(cell)));
            set_presence(&mut ops, Some(created_by), Some(id.clone()));
        }

        Event::CellSourceChanged { id, source, actor_id } => {
            if let Some(cell) = tables.cells.get(id) {
                let mut cell = cell.clone();
                cell.source = source.clone();
                ops.push(TableOp::UpsertCell(Box::new(cell)));
                set_presence(&mut ops, actor_id.as_deref(), Some(id.clone()));
            }
        }

        Event::CellTypeChanged { id, cell_type, actor_id } => {
            if let Some(cell) = tables.cells.get(id) {
                let mut cell = cell.clone();
                cell.cell_type = *cell_type;
                ops.push(TableOp::UpsertCell(Box::new(cell)));
                set_presence(&mut ops, actor_id.as_deref(), Some(id.clone()));
            }
        }

        Event::CellDeleted { id, actor_id } => {
            ops.push(TableOp::DeleteCell(id.clone()));
            set_presence(&mut ops, actor_id.as_deref(), Some(id.clone()));
        }

        Event::CellMovedV1 { id, fractional_index, actor_id }
        | Event::CellMovedV2 { id, fractional_index, actor_id } => {
            if let Some(cell) = tables.cells.get(id) {
                let mut cell = cell.clone();
                cell.fractional_index = Some(fractional_index.clone());
                ops.push(TableOp::UpsertCell(Box::new(cell)));
                set_presence(&mut ops, actor_id.as_deref(), Some(id.clone()));
            }
        }

        Event::CellVisibilityToggled { id, field, visible, actor_id } => {
            if let Some(cell) = tables.cells.get(id) {
                let mut cell = cell.clone();
                match field {
                    VisibilityField::Source => cell.source_visible = *visible,
                    VisibilityField::Output => cell.output_visible = *visible,
                    VisibilityField::AiContext => cell.ai_context_visible = *visible,
                }
                ops.push(TableOp::UpsertCell(Box::new(cell)));
                set_presence(&mut ops, actor_id.as_deref(), Some(id.clone()));
            }
        }

        Event::CellAiSettingsChanged { id, ai_provider, ai_model, ai_settings } => {
            if let Some(cell) = tables.cells.get(id) {
                let mut cell = cell.clone();
                cell.ai_provider = ai_provider.clone();
                cell.ai_model = ai_model.clone();
                cell.ai_settings = ai_settings.clone();
                ops.push(TableOp::UpsertCell(Box::new(cell)));
            }
        }

        Event::CellSqlSettingsChanged { id, sql_connection_id, sql_result_variable } => {
            if let Some(cell) = tables.cells.get(id) {
                let mut cell = cell.clone();
                cell.sql_connection_id = sql_connection_id.clone();
                cell.sql_result_variable = sql_result_variable.clone();
                ops.push(TableOp::UpsertCell(Box::new(cell)));
            }
        }

        Event::RuntimeSessionStarted {
            session_id,
            runtime_id,
            runtime_type,
            can_execute_code,
            can_execute_sql,
            can_execute_ai,
            available_ai_models,
        } => {
            ops.push(TableOp::UpsertRuntimeSession(Box::new(RuntimeSession {
                session_id: session_id.clone(),
                runtime_id: runtime_id.clone(),
                runtime_type: runtime_type.clone(),
                status: RuntimeStatus::Starting,
                is_active: true,
                can_execute_code: *can_execute_code,
                can_execute_sql: *can_execute_sql,
                can_execute_ai: *can_execute_ai,
                available_ai_models: available_ai_models.clone(),
            })));
        }

        Event::RuntimeSessionStatusChanged { session_id, status, is_active } => {
            if let Some(session) = tables.runtime_sessions.get(session_id) {
                let mut session = session.clone();
                session.status = *status;
                if let Some(is_active) = is_active {
                    session.is_active = *is_active;
                }
                ops.push(TableOp::UpsertRuntimeSession(Box::new(session)));
            }
        }

        Event::RuntimeSessionTerminated { session_id } => {
            if let Some(session) = tables.runtime_sessions.get(session_id) {
                let mut session = session.clone();
                session.status = RuntimeStatus::Terminated;
                session.is_active = false;
                ops.push(TableOp::UpsertRuntimeSession(Box::new(session)));
            }
        }

        Event::ExecutionRequested { queue_id, cell_id, execution_count, requested_by } => {
            ops.push(TableOp::UpsertQueueEntry(Box::new(ExecutionQueueEntry {
                id: queue_id.clone(),
                cell_id: cell_id.clone(),
                execution_count: *execution_count,
                requested_by: requested_by.clone(),
                status: QueueStatus::Pending,
                assigned_runtime_session: None,
                started_at: None,
                completed_at: None,
                execution_duration_ms: None,
            })));
            if let Some(cell) = tables.cells.get(cell_id) {
                let mut cell = cell.clone();
                cell.execution_state = ExecutionState::Queued;
                cell.execution_count = Some(*execution_count);
                ops.push(TableOp::UpsertCell(Box::new(cell)));
            }
            set_presence(&mut ops, Some(requested_by), Some(cell_id.clone()));
        }

        Event::ExecutionAssigned { queue_id, runtime_session } => {
            if let Some(entry) = tables.execution_queue.get(queue_id) {
                let mut entry = entry.clone();
                entry.status = QueueStatus::Assigned;
                entry.assigned_runtime_session = Some(runtime_session.clone());
                ops.push(TableOp::UpsertQueueEntry(Box::new(entry)));
            }
        }

        Event::ExecutionStarted { queue_id, runtime_session, started_at } => {
            if let Some(entry) = tables.execution_queue.get(queue_id) {
                let mut entry = entry.clone();
                entry.status = QueueStatus::Executing;
                entry.started_at = Some(*started_at);
                if let Some(cell) = tables.cells.get(&entry.cell_id) {
                    let mut cell = cell.clone();
                    cell.execution_state = ExecutionState::Running;
                    cell.assigned_runtime_session = Some(runtime_session.clone());
                    ops.push(TableOp::UpsertCell(Box::new(cell)));
                }
                ops.push(TableOp::UpsertQueueEntry(Box::new(entry)));
            }
        }

        Event::ExecutionCompleted { queue_id, status, completed_at, duration_ms } => {
            if let Some(entry) = tables.execution_queue.get(queue_id) {
                let mut entry = entry.clone();
                entry.status = match status {
                    ExecutionOutcome::Success => QueueStatus::Completed,
                    ExecutionOutcome::Failure => QueueStatus::Failed,
                };
                entry.completed_at = Some(*completed_at);
                entry.execution_duration_ms = Some(*duration_ms);
                if let Some(cell) = tables.cells.get(&entry.cell_id) {
                    let mut cell = cell.clone();
                    cell.execution_state = match status {
                        ExecutionOutcome::Success => ExecutionState::Completed,
                        ExecutionOutcome::Failure => ExecutionState::Error,
                    };
                    cell.last_execution_duration_ms = Some(*duration_ms);
                    ops.push(TableOp::UpsertCell(Box::new(cell)));
                }
                ops.push(TableOp::UpsertQueueEntry(Box::new(entry)));
            }
        }

        Event::ExecutionCancelled { queue_id, cancelled_by } => {
            if let Some(entry) = tables.execution_queue.get(queue_id) {
                let mut entry = entry.clone();
                entry.status = QueueStatus::Cancelled;
                if let Some(cell) = tables.cells.get(&entry.cell_id) {
                    let mut cell = cell.clone();
                    cell.execution_state = ExecutionState::Idle;
                    ops.push(TableOp::UpsertCell(Box::new(cell)));
                }
                set_presence(&mut ops, cancelled_by.as_deref(), Some(entry.cell_id.clone()));
                ops.push(TableOp::UpsertQueueEntry(Box::new(entry)));
            }
        }

        Event::MultimediaDisplayOutputAdded {
            id,
            cell_id,
            position,
            display_id,
            representations,
            execution_count,
        } => {
            consume_pending_clear(tables, cell_id, &mut ops);
            let primary = select_primary(representations, GENERAL_MIME_PRIORITY);
            let (data, artifact_id, mime_type) = primary_fields(primary);
            ops.push(TableOp::UpsertOutput(Box::new(Output {
                id: id.clone(),
                cell_id: cell_id.clone(),
                output_type: OutputType::MultimediaDisplay,
                position: *position,
                stream_name: None,
                execution_count: *execution_count,
                display_id: display_id.clone(),
                data,
                artifact_id,
                mime_type,
                metadata: None,
                representations: Some(representations.clone()),
            })));
            if let Some(display_id) = display_id {
                update_outputs_by_display_id(tables, display_id, representations, GENERAL_MIME_PRIORITY, &mut ops);
            }
        }

        Event::MultimediaDisplayOutputUpdated { display_id, representations } => {
            update_outputs_by_display_id(tables, display_id, representations, GENERAL_MIME_PRIORITY, &mut ops);
        }

        Event::MultimediaResultOutputAdded { id, cell_id, position, representations, execution_count } => {
            consume_pending_clear(tables, cell_id, &mut ops);
            let primary = select_primary(representations, RESULT_MIME_PRIORITY);
            let (data, artifact_id, mime_type) = primary_fields(primary);
            ops.push(TableOp::UpsertOutput(Box::new(Output {
                id: id.clone(),
                cell_id: cell_id.clone(),
                output_type: OutputType::MultimediaResult,
                position: *position,
                stream_name: None,
                execution_count: *execution_count,
                display_id: None,
                data,
                artifact_id,
                mime_type,
                metadata: None,
                representations: Some(representations.clone()),
            })));
        }

        Event::TerminalOutputAdded { id, cell_id, position, stream_name, content } => {
            consume_pending_clear(tables, cell_id, &mut ops);
            let (data, artifact_id) = content_fields(content);
            ops.push(TableOp::UpsertOutput(Box::new(Output {
                id: id.clone(),
                cell_id: cell_id.clone(),
                output_type: OutputType::Terminal,
                position: *position,
                stream_name: Some(stream_name.clone()),
                execution_count: None,
                display_id: None,
                data,
                artifact_id,
                mime_type: None,
                metadata: None,
                representations: None,
            })));
        }

        Event::TerminalOutputAppendedV1 { output_id, delta } => {
            if let Some(output) = tables.outputs.get(output_id) {
                let mut output = output.clone();
                let existing = output.data.as_ref().and_then(|v| v.as_str()).unwrap_or("");
                output.data = Some(Value::String(format!("{existing}{delta}")));
                ops.push(TableOp::UpsertOutput(Box::new(output)));
            }
        }

        Event::TerminalOutputAppendedV2 { output_id, delta, sequence_number } => {
            if tables.outputs.contains_key(output_id) {
                ops.push(TableOp::InsertOutputDelta(Box::new(OutputDelta {
                    id: format!("{output_id}:{sequence_number}"),
                    output_id: output_id.clone(),
                    delta: delta.clone(),
                    sequence_number: *sequence_number,
                })));
            }
        }

        Event::MarkdownOutputAdded { id, cell_id, position, content } => {
            consume_pending_clear(tables, cell_id, &mut ops);
            let (data, artifact_id) = content_fields(content);
            ops.push(TableOp::UpsertOutput(Box::new(Output {
                id: id.clone(),
                cell_id: cell_id.clone(),
                output_type: OutputType::Markdown,
                position: *position,
                stream_name: None,
                execution_count: None,
                display_id: None,
                data,
                artifact_id,
                mime_type: None,
                metadata: None,
                representations: None,
            })));
        }

        Event::MarkdownOutputAppendedV1 { output_id, delta } => {
            if let Some(output) = tables.outputs.get(output_id) {
                let mut output = output.clone();
                let existing = output.data.as_ref().and_then(|v| v.as_str()).unwrap_or("");
                output.data = Some(Value::String(format!("{existing}{delta}")));
                ops.push(TableOp::UpsertOutput(Box::new(output)));
            }
        }

        Event::MarkdownOutputAppendedV2 { output_id, delta, sequence_number } => {
            if tables.outputs.contains_key(output_id) {
                ops.push(TableOp::InsertOutputDelta(Box::new(OutputDelta {
                    id: format!("{output_id}:{sequence_number}"),
                    output_id: output_id.clone(),
                    delta: delta.clone(),
                    sequence_number: *sequence_number,
                })));
            }
        }

        Event::ErrorOutputAdded { id, cell_id, position, content } => {
            consume_pending_clear(tables, cell_id, &mut ops);
            let (data, artifact_id) = content_fields(content);
            ops.push(TableOp::UpsertOutput(Box::new(Output {
                id: id.clone(),
                cell_id: cell_id.clone(),
                output_type: OutputType::Error,
                position: *position,
                stream_name: None,
                execution_count: None,
                display_id: None,
                data,
                artifact_id,
                mime_type: None,
                metadata: None,
                representations: None,
            })));
        }

        Event::CellOutputsCleared { cell_id, wait, cleared_by } => {
            if *wait {
                ops.push(TableOp::UpsertPendingClear(PendingClear {
                    cell_id: cell_id.clone(),
                    cleared_by: cleared_by.clone(),
                }));
            } else {
                ops.push(TableOp::DeleteOutputsForCell(cell_id.clone()));
            }
            set_presence(&mut ops, cleared_by.as_deref(), Some(cell_id.clone()));
        }

        Event::ActorProfileSet { id, actor_type, display_name } => {
            ops.push(TableOp::UpsertActor(crate::model::Actor {
                id: id.clone(),
                actor_type: *actor_type,
                display_name: display_name.clone(),
            }));
        }

        Event::ToolApprovalRequested { id, cell_id, tool_name, requested_by } => {
            ops.push(TableOp::UpsertToolApproval(Box::new(crate::model::ToolApproval {
                id: id.clone(),
                cell_id: cell_id.clone(),
                tool_name: tool_name.clone(),
                requested_by: requested_by.clone(),
                status: crate::model::ApprovalStatus::Pending,
                responded_by: None,
                responded_at: None,
            })));
        }

        Event::ToolApprovalResponded { id, status, responded_by } => {
            if let Some(approval) = tables.tool_approvals.get(id) {
                let mut approval = approval.clone();
                approval.status = *status;
                approval.responded_by = Some(responded_by.clone());
                ops.push(TableOp::UpsertToolApproval(Box::new(approval)));
            }
        }

        Event::PresenceSet { user_id, cell_id } => {
            ops.push(TableOp::SetPresence {
                user_id: user_id.clone(),
                cell_id: cell_id.clone(),
            });
        }

        Event::UiStateSet { key, value } => {
            ops.push(TableOp::SetUiState {
                key: key.clone(),
                value: value.clone(),
            });
        }

        Event::DebugEvent { .. } => {}
    }

    ops
}

fn update_outputs_by_display_id(
    tables: &Tables,
    display_id: &str,
    representations: &Representations,
    priority: &[&str],
    ops: &mut Vec<TableOp>,
) {
    let primary = select_primary(representations, priority);
    let (data, artifact_id, mime_type) = primary_fields(primary);
    for output in tables.outputs.values() {
        if output.output_type == OutputType::MultimediaDisplay
            && output.display_id.as_deref() == Some(display_id)
        {
            let mut output = output.clone();
            output.data = data.clone();
            output.artifact_id = artifact_id.clone();
            output.mime_type = mime_type.clone();
            output.representations = Some(representations.clone());
            ops.push(TableOp::UpsertOutput(Box::new(output)));
        }
    }
}

/// The `CellReference` a caller needs after materializing a `CellCreatedV2`
/// event, for chaining further `createCellBetween` calls (the importer's
/// running `cellBefore`).
pub fn cell_reference_after_create(id: &str, fractional_index: &str, cell_type: CellType) -> CellReference {
    CellReference {
        id: id.to_string(),
        cell_type,
        fractional_index: fractional_index.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActorType, CellType};

    fn apply(tables: &mut Tables, event: Event) {
        let ops = reduce(&event, tables);
        tables.apply_all(ops);
    }

    #[test]
    fn create_v2_then_source_change() {
        let mut tables = Tables::new();
        apply(
            &mut tables,
            Event::CellCreatedV2 {
                id: "c1".into(),
                fractional_index: "m".into(),
                cell_type: CellType::Code,
                created_by: "u1".into(),
            },
        );
        apply(
            &mut tables,
            Event::CellSourceChanged {
                id: "c1".into(),
                source: "print(1)".into(),
                actor_id: Some("u1".into()),
            },
        );
        let cell = tables.cells.get("c1").unwrap();
        assert_eq!(cell.source, "print(1)");
        assert_eq!(tables.presence.get("u1").unwrap().as_deref(), Some("c1"));
    }

    #[test]
    fn pending_clear_then_add_replaces_outputs() {
        let mut tables = Tables::new();
        tables.cells.insert(
            "c1".into(),
            Cell::new("c1", CellType::Code, "u1"),
        );
        tables.outputs.insert(
            "old".into(),
            Output {
                id: "old".into(),
                cell_id: "c1".into(),
                output_type: OutputType::Terminal,
                position: 0.0,
                stream_name: Some("stdout".into()),
                execution_count: None,
                display_id: None,
                data: Some(Value::String("stale".into())),
                artifact_id: None,
                mime_type: None,
                metadata: None,
                representations: None,
            },
        );

        apply(
            &mut tables,
            Event::CellOutputsCleared {
                cell_id: "c1".into(),
                wait: true,
                cleared_by: Some("u1".into()),
            },
        );
        assert!(tables.pending_clears.contains_key("c1"));
        assert!(tables.outputs.contains_key("old"));

        apply(
            &mut tables,
            Event::TerminalOutputAdded {
                id: "new".into(),
                cell_id: "c1".into(),
                position: 0.0,
                stream_name: "stdout".into(),
                content: OutputContent::inline(Value::String("hi".into())),
            },
        );

        assert!(!tables.pending_clears.contains_key("c1"));
        assert!(!tables.outputs.contains_key("old"));
        let new_output = tables.outputs.get("new").unwrap();
        assert_eq!(new_output.data, Some(Value::String("hi".into())));
    }

    #[test]
    fn display_id_update_affects_all_matching_rows() {
        let mut tables = Tables::new();
        tables.cells.insert("c1".into(), Cell::new("c1", CellType::Code, "u1"));

        let rep1 = vec![Representation {
            mime_type: "text/plain".into(),
            content: OutputContent::inline(Value::String("v1".into())),
        }];
        apply(
            &mut tables,
            Event::MultimediaDisplayOutputAdded {
                id: "o1".into(),
                cell_id: "c1".into(),
                position: 0.0,
                display_id: Some("d1".into()),
                representations: rep1,
                execution_count: None,
            },
        );

        let rep2 = vec![Representation {
            mime_type: "text/plain".into(),
            content: OutputContent::inline(Value::String("v2".into())),
        }];
        apply(
            &mut tables,
            Event::MultimediaDisplayOutputAdded {
                id: "o2".into(),
                cell_id: "c1".into(),
                position: 1.0,
                display_id: Some("d1".into()),
                representations: rep2,
                execution_count: None,
            },
        );

        assert_eq!(tables.outputs.len(), 2);
        for output in tables.outputs.values() {
            assert_eq!(output.data, Some(Value::String("v2".into())));
        }

        let rep3 = vec![Representation {
            mime_type: "text/plain".into(),
            content: OutputContent::inline(Value::String("v3".into())),
        }];
        apply(
            &mut tables,
            Event::MultimediaDisplayOutputUpdated {
                display_id: "d1".into(),
                representations: rep3,
            },
        );
        assert_eq!(tables.outputs.len(), 2);
        for output in tables.outputs.values() {
            assert_eq!(output.data, Some(Value::String("v3".into())));
        }
    }

    #[test]
    fn terminal_delta_reconstruction() {
        let mut tables = Tables::new();
        tables.cells.insert("c1".into(), Cell::new("c1", CellType::Code, "u1"));
        apply(
            &mut tables,
            Event::TerminalOutputAdded {
                id: "o1".into(),
                cell_id: "c1".into(),
                position: 0.0,
                stream_name: "stdout".into(),
                content: OutputContent::inline(Value::String("a".into())),
            },
        );
        apply(
            &mut tables,
            Event::TerminalOutputAppendedV2 {
                output_id: "o1".into(),
                delta: "b".into(),
                sequence_number: 0,
            },
        );
        apply(
            &mut tables,
            Event::TerminalOutputAppendedV2 {
                output_id: "o1".into(),
                delta: "c".into(),
                sequence_number: 1,
            },
        );

        let output = tables.outputs.get("o1").unwrap();
        let deltas: Vec<OutputDelta> = tables
            .output_deltas
            .values()
            .filter(|d| d.output_id == "o1")
            .cloned()
            .collect();
        assert_eq!(crate::query::apply_deltas(output.data.as_ref(), &deltas), "abc");
    }

    #[test]
    fn execution_lifecycle_updates_queue_and_cell() {
        let mut tables = Tables::new();
        tables.cells.insert("c1".into(), Cell::new("c1", CellType::Code, "u1"));

        apply(
            &mut tables,
            Event::ExecutionRequested {
                queue_id: "q1".into(),
                cell_id: "c1".into(),
                execution_count: 1,
                requested_by: "u1".into(),
            },
        );
        apply(
            &mut tables,
            Event::ExecutionAssigned {
                queue_id: "q1".into(),
                runtime_session: "s1".into(),
            },
        );
        apply(
            &mut tables,
            Event::ExecutionStarted {
                queue_id: "q1".into(),
                runtime_session: "s1".into(),
                started_at: 1,
            },
        );
        apply(
            &mut tables,
            Event::ExecutionCompleted {
                queue_id: "q1".into(),
                status: ExecutionOutcome::Success,
                completed_at: 2,
                duration_ms: 50,
            },
        );

        let entry = tables.execution_queue.get("q1").unwrap();
        assert_eq!(entry.status, QueueStatus::Completed);
        assert_eq!(entry.execution_duration_ms, Some(50));
        let cell = tables.cells.get("c1").unwrap();
        assert_eq!(cell.execution_state, ExecutionState::Completed);
        assert_eq!(cell.last_execution_duration_ms, Some(50));
        assert_eq!(cell.execution_count, Some(1));
    }

    #[test]
    fn unknown_output_append_is_a_soft_no_op() {
        let tables = Tables::new();
        let ops = reduce(
            &Event::TerminalOutputAppendedV1 {
                output_id: "missing".into(),
                delta: "x".into(),
            },
            &tables,
        );
        assert!(ops.is_empty());
    }

    #[test]
    fn actor_profile_set_upserts() {
        let mut tables = Tables::new();
        apply(
            &mut tables,
            Event::ActorProfileSet {
                id: "u1".into(),
                actor_type: ActorType::Human,
                display_name: "Ada".into(),
            },
        );
        assert_eq!(tables.actors.get("u1").unwrap().display_name, "Ada");
    }
}

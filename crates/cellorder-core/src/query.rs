//! Parameterized, pure projections over [`Tables`].
//!
//! Every query here is a plain function taking `&Tables` and returning an
//! owned result: cheap enough to recompute on demand rather than cached, so
//! there is no incremental-computation machinery sitting between writers
//! and readers.

use crate::model::{CellId, CellType, ExecutionQueueEntry, Output, OutputDelta, RuntimeSession};
use crate::tables::Tables;

/// `(id, fractionalIndex, cellType)` for every cell, ordered by
/// `fractionalIndex` ascending, ties broken by id.
pub fn cell_references(tables: &Tables) -> Vec<(CellId, String, CellType)> {
    let mut cells: Vec<_> = tables.cells.values().collect();
    cells.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
    cells
        .into_iter()
        .filter_map(|c| c.fractional_index.clone().map(|idx| (c.id.clone(), idx, c.cell_type)))
        .collect()
}

/// `(id, fractionalIndex)` for every cell, same ordering as [`cell_references`].
pub fn cell_ordering(tables: &Tables) -> Vec<(CellId, String)> {
    cell_references(tables).into_iter().map(|(id, idx, _)| (id, idx)).collect()
}

pub fn first_cell(tables: &Tables) -> Option<(CellId, String, CellType)> {
    cell_references(tables).into_iter().next()
}

pub fn last_cell(tables: &Tables) -> Option<(CellId, String, CellType)> {
    cell_references(tables).into_iter().next_back()
}

/// Up to `limit` cells with `fractionalIndex < idx`, nearest first.
pub fn cells_before(tables: &Tables, idx: &str, limit: usize) -> Vec<(CellId, String, CellType)> {
    let mut refs = cell_references(tables);
    refs.retain(|(_, i, _)| i.as_str() < idx);
    refs.reverse();
    refs.truncate(limit);
    refs
}

/// Up to `limit` cells with `fractionalIndex > idx`, nearest first.
pub fn cells_after(tables: &Tables, idx: &str, limit: usize) -> Vec<(CellId, String, CellType)> {
    let mut refs = cell_references(tables);
    refs.retain(|(_, i, _)| i.as_str() > idx);
    refs.truncate(limit);
    refs
}

/// All cells with `start <= fractionalIndex <= end`, either bound optional.
pub fn cells_in_range(
    tables: &Tables,
    start: Option<&str>,
    end: Option<&str>,
) -> Vec<(CellId, String, CellType)> {
    cell_references(tables)
        .into_iter()
        .filter(|(_, idx, _)| {
            start.is_none_or(|s| idx.as_str() >= s) && end.is_none_or(|e| idx.as_str() <= e)
        })
        .collect()
}

/// The cell immediately before and immediately after `idx`, excluding `cell_id`.
pub fn adjacent_cells(
    tables: &Tables,
    cell_id: &str,
    idx: &str,
) -> (Option<(CellId, String, CellType)>, Option<(CellId, String, CellType)>) {
    let before = cells_before(tables, idx, 1)
        .into_iter()
        .find(|(id, _, _)| id != cell_id);
    let after = cells_after(tables, idx, 1)
        .into_iter()
        .find(|(id, _, _)| id != cell_id);
    (before, after)
}

/// Outputs for a cell, ordered by `position` ascending.
pub fn outputs_for_cell(tables: &Tables, cell_id: &str) -> Vec<Output> {
    let mut outputs: Vec<Output> = tables
        .outputs
        .values()
        .filter(|o| o.cell_id == cell_id)
        .cloned()
        .collect();
    outputs.sort_by(|a, b| a.position.partial_cmp(&b.position).unwrap_or(std::cmp::Ordering::Equal));
    outputs
}

/// Deltas for an output, ordered by `sequence_number` ascending.
pub fn output_deltas_for_output(tables: &Tables, output_id: &str) -> Vec<OutputDelta> {
    let mut deltas: Vec<OutputDelta> = tables
        .output_deltas
        .values()
        .filter(|d| d.output_id == output_id)
        .cloned()
        .collect();
    deltas.sort_by_key(|d| d.sequence_number);
    deltas
}

/// Fold an output's original data with its ordered v2 deltas into final
/// streamed content.
pub fn apply_deltas(original: Option<&serde_json::Value>, deltas: &[OutputDelta]) -> String {
    let mut sorted: Vec<&OutputDelta> = deltas.iter().collect();
    sorted.sort_by_key(|d| d.sequence_number);
    let base = original.and_then(|v| v.as_str()).unwrap_or("").to_string();
    sorted.into_iter().fold(base, |acc, d| acc + &d.delta)
}

/// Execution queue entries for a cell, ordered by id descending (most
/// recent request first, since ids are monotonically-increasing uuids in
/// practice).
pub fn execution_queue_for_cell(tables: &Tables, cell_id: &str) -> Vec<ExecutionQueueEntry> {
    let mut entries: Vec<ExecutionQueueEntry> = tables
        .execution_queue
        .values()
        .filter(|e| e.cell_id == cell_id)
        .cloned()
        .collect();
    entries.sort_by(|a, b| b.id.cmp(&a.id));
    entries
}

/// All runtime sessions, ordered by `session_id` descending.
pub fn runtime_sessions(tables: &Tables) -> Vec<RuntimeSession> {
    let mut sessions: Vec<RuntimeSession> = tables.runtime_sessions.values().cloned().collect();
    sessions.sort_by(|a, b| b.session_id.cmp(&a.session_id));
    sessions
}

/// Canonical notebook metadata view with documented defaults applied.
pub struct NotebookMetadataView {
    pub title: String,
    pub owner_id: String,
    pub runtime_type: String,
    pub is_public: bool,
}

pub fn notebook_metadata(tables: &Tables) -> NotebookMetadataView {
    let string_field = |key: &str, default: &str| -> String {
        tables
            .notebook_metadata
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    };
    NotebookMetadataView {
        title: tables.notebook_title.clone().unwrap_or_else(|| "Untitled".to_string()),
        owner_id: string_field("owner_id", "anonymous"),
        runtime_type: string_field("runtime_type", "python3"),
        is_public: tables
            .notebook_metadata
            .get("is_public")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Cell, CellType};

    fn cell(id: &str, idx: &str) -> Cell {
        let mut c = Cell::new(id, CellType::Code, "tester");
        c.fractional_index = Some(idx.to_string());
        c
    }

    fn tables_with(cells: Vec<Cell>) -> Tables {
        let mut tables = Tables::new();
        for c in cells {
            tables.cells.insert(c.id.clone(), c);
        }
        tables
    }

    #[test]
    fn cell_references_is_sorted_by_index() {
        let tables = tables_with(vec![cell("c3", "s"), cell("c1", "c"), cell("c2", "m")]);
        let refs = cell_references(&tables);
        let ids: Vec<&str> = refs.iter().map(|(id, _, _)| id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2", "c3"]);
    }

    #[test]
    fn first_and_last_cell() {
        let tables = tables_with(vec![cell("c3", "s"), cell("c1", "c"), cell("c2", "m")]);
        assert_eq!(first_cell(&tables).unwrap().0, "c1");
        assert_eq!(last_cell(&tables).unwrap().0, "c3");
    }

    #[test]
    fn before_after_and_range() {
        let tables = tables_with(vec![cell("c1", "c"), cell("c2", "m"), cell("c3", "s")]);
        let before = cells_before(&tables, "m", 5);
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].0, "c1");

        let after = cells_after(&tables, "m", 5);
        assert_eq!(after.len(), 1);
        assert_eq!(after[0].0, "c3");

        let range = cells_in_range(&tables, Some("c"), Some("m"));
        assert_eq!(range.len(), 2);
    }

    #[test]
    fn adjacent_excludes_self() {
        let tables = tables_with(vec![cell("c1", "c"), cell("c2", "m"), cell("c3", "s")]);
        let (before, after) = adjacent_cells(&tables, "c2", "m");
        assert_eq!(before.unwrap().0, "c1");
        assert_eq!(after.unwrap().0, "c3");
    }

    #[test]
    fn notebook_metadata_defaults() {
        let tables = Tables::new();
        let meta = notebook_metadata(&tables);
        assert_eq!(meta.title, "Untitled");
        assert_eq!(meta.owner_id, "anonymous");
        assert_eq!(meta.runtime_type, "python3");
        assert!(!meta.is_public);
    }
}

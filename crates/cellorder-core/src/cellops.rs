//! Cell operations: turning "put a cell here" requests into event batches,
//! consulting the index algebra and falling back to the rebalance planner
//! when adjacency is exhausted.

use crate::error::Result;
use crate::events::{CellReference, Event};
use crate::index::{self, JitterSource};
use crate::model::{ActorId, Cell, CellId, CellType, OutputId, OutputType};
use crate::rebalance::{between_with_fallback, RebalanceContext};
use crate::tables::Tables;

/// The caller-supplied fields for a new cell; everything else (index,
/// visibility defaults, execution state) is filled in by the materializer
/// when the resulting `CellCreated` event is applied.
pub struct NewCellData {
    pub id: CellId,
    pub cell_type: CellType,
    pub created_by: ActorId,
}

/// The result of [`create_cell_between`].
pub struct CreateCellResult {
    pub events: Vec<Event>,
    pub new_cell_id: CellId,
    pub needs_rebalancing: bool,
    pub rebalance_count: Option<usize>,
}

/// `createCellBetween(cellData, cellBefore?, cellAfter?, allCells)`.
pub fn create_cell_between(
    cell_data: NewCellData,
    cell_before: Option<&CellReference>,
    cell_after: Option<&CellReference>,
    all_cells: &[Cell],
    mut jitter: Option<&mut dyn JitterSource>,
    buffer_cells: usize,
) -> Result<CreateCellResult> {
    let mut sorted: Vec<&Cell> = all_cells.iter().collect();
    sorted.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

    let (prev, next): (Option<String>, Option<String>) = match (cell_before, cell_after) {
        (Some(before), after) => (
            Some(before.fractional_index.clone()),
            after.map(|c| c.fractional_index.clone()),
        ),
        (None, Some(after)) => (None, Some(after.fractional_index.clone())),
        (None, None) => match sorted.last() {
            Some(last) => (last.fractional_index.clone(), None),
            None => (None, None),
        },
    };

    let insert_pos = match cell_before {
        Some(before) => sorted
            .iter()
            .position(|c| c.id == before.id)
            .map(|p| p + 1)
            .unwrap_or(sorted.len()),
        None => match cell_after {
            Some(after) => sorted.iter().position(|c| c.id == after.id).unwrap_or(sorted.len()),
            None => sorted.len(),
        },
    };

    let ctx = RebalanceContext {
        all_cells,
        insert_pos,
        buffer_cells,
        actor_id: Some(cell_data.created_by.clone()),
    };

    let fallback = between_with_fallback(
        prev.as_deref(),
        next.as_deref(),
        index::reborrow_jitter(&mut jitter),
        Some(ctx),
    )?;

    let rebalance_count = fallback.rebalance_result.as_ref().map(|r| r.events.len());
    let mut events = Vec::new();
    if let Some(rebalance_result) = fallback.rebalance_result {
        events.extend(rebalance_result.events);
    }
    events.push(Event::CellCreatedV2 {
        id: cell_data.id.clone(),
        fractional_index: fallback.index,
        cell_type: cell_data.cell_type,
        created_by: cell_data.created_by,
    });

    Ok(CreateCellResult {
        events,
        new_cell_id: cell_data.id,
        needs_rebalancing: fallback.needs_rebalancing,
        rebalance_count,
    })
}

fn straddles(current: &str, prev: Option<&str>, next: Option<&str>) -> bool {
    let above_lower = prev.is_none_or(|p| p < current);
    let below_upper = next.is_none_or(|n| current < n);
    above_lower && below_upper
}

/// `moveCellBetween(cell, cellBefore?, cellAfter?, actorId?, jitter)`.
///
/// Returns `None` if the cell has no index yet, or if it already sits
/// between the supplied bounds (no-op).
pub fn move_cell_between(
    cell: &Cell,
    cell_before: Option<&CellReference>,
    cell_after: Option<&CellReference>,
    actor_id: Option<&str>,
    mut jitter: Option<&mut dyn JitterSource>,
) -> Result<Option<Event>> {
    let Some(current) = cell.fractional_index.as_deref() else {
        return Ok(None);
    };

    let prev = cell_before.map(|c| c.fractional_index.as_str());
    let next = cell_after.map(|c| c.fractional_index.as_str());

    if straddles(current, prev, next) {
        return Ok(None);
    }

    let idx = match jitter.as_deref_mut() {
        Some(j) => index::between_with_jitter(prev, next, j)?,
        None => index::between(prev, next)?,
    };

    Ok(Some(Event::CellMovedV2 {
        id: cell.id.clone(),
        fractional_index: idx,
        actor_id: actor_id.map(str::to_string),
    }))
}

/// The result of [`move_cell_between_with_rebalancing`].
pub struct MoveCellResult {
    pub events: Vec<Event>,
    pub needs_rebalancing: bool,
}

/// `moveCellBetweenWithRebalancing`: wraps [`move_cell_between`] with the
/// same fallback strategy [`create_cell_between`] uses.
pub fn move_cell_between_with_rebalancing(
    cell: &Cell,
    cell_before: Option<&CellReference>,
    cell_after: Option<&CellReference>,
    actor_id: Option<&str>,
    all_cells: &[Cell],
    mut jitter: Option<&mut dyn JitterSource>,
    buffer_cells: usize,
) -> Result<MoveCellResult> {
    let Some(current) = cell.fractional_index.clone() else {
        return Ok(MoveCellResult {
            events: Vec::new(),
            needs_rebalancing: false,
        });
    };

    let prev = cell_before.map(|c| c.fractional_index.clone());
    let next = cell_after.map(|c| c.fractional_index.clone());

    if straddles(&current, prev.as_deref(), next.as_deref()) {
        return Ok(MoveCellResult {
            events: Vec::new(),
            needs_rebalancing: false,
        });
    }

    let mut sorted: Vec<&Cell> = all_cells.iter().collect();
    sorted.sort_by(|a, b| a.order_key().cmp(&b.order_key()));
    let insert_pos = sorted.iter().position(|c| c.id == cell.id).unwrap_or(sorted.len());

    let ctx = RebalanceContext {
        all_cells,
        insert_pos,
        buffer_cells,
        actor_id: actor_id.map(str::to_string),
    };

    let fallback = between_with_fallback(
        prev.as_deref(),
        next.as_deref(),
        index::reborrow_jitter(&mut jitter),
        Some(ctx),
    )?;

    let mut events = Vec::new();
    if let Some(rebalance_result) = fallback.rebalance_result {
        events.extend(rebalance_result.events);
    }
    events.push(Event::CellMovedV2 {
        id: cell.id.clone(),
        fractional_index: fallback.index,
        actor_id: actor_id.map(str::to_string),
    });

    Ok(MoveCellResult {
        events,
        needs_rebalancing: fallback.needs_rebalancing,
    })
}

/// Append a streamed chunk to an existing terminal or markdown output,
/// assigning it the next sequence number for that output.
///
/// Returns `None` if the output doesn't exist or isn't an appendable type
/// (no event is produced, matching the soft-fail policy the materializer
/// itself applies when an append event targets a row that isn't there).
pub fn append_output_delta(tables: &Tables, output_id: &OutputId, delta: String) -> Option<Event> {
    let output = tables.outputs.get(output_id)?;
    let sequence_number = tables.next_delta_sequence(output_id);
    match output.output_type {
        OutputType::Terminal => Some(Event::TerminalOutputAppendedV2 {
            output_id: output_id.clone(),
            delta,
            sequence_number,
        }),
        OutputType::Markdown => Some(Event::MarkdownOutputAppendedV2 {
            output_id: output_id.clone(),
            delta,
            sequence_number,
        }),
        _ => None,
    }
}

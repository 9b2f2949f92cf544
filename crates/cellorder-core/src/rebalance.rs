//! The rebalancing planner.
//!
//! Detects when `between` can no longer find room between existing indices
//! and computes a minimal reassignment that restores headroom, expressed as
//! a batch of `CellMoved` events that preserve relative cell order.

use crate::error::{AlgebraError, Result};
use crate::events::Event;
use crate::index::{self, JitterSource};
use crate::model::{Cell, CellId};

/// `needsRebalancing(cells, insertPos?)`.
pub fn needs_rebalancing(cells: &[Cell], insert_pos: Option<usize>) -> bool {
    let mut sorted: Vec<&Cell> = cells.iter().collect();
    sorted.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

    let adjacent_fails = sorted.windows(2).any(|w| {
        match (w[0].fractional_index.as_deref(), w[1].fractional_index.as_deref()) {
            (Some(a), Some(b)) => index::between(Some(a), Some(b)).is_err(),
            _ => false,
        }
    });
    if adjacent_fails {
        return true;
    }

    if let Some(pos) = insert_pos {
        let before = pos
            .checked_sub(1)
            .and_then(|i| sorted.get(i))
            .and_then(|c| c.fractional_index.as_deref());
        let after = sorted.get(pos).and_then(|c| c.fractional_index.as_deref());
        if index::between(before, after).is_err() {
            return true;
        }
    }

    false
}

/// Options for [`rebalance`].
pub struct RebalanceOptions<'a> {
    pub jitter: Option<&'a mut dyn JitterSource>,
    pub actor_id: Option<&'a str>,
    pub buffer_cells: usize,
}

/// The outcome of a rebalance: the `CellMoved` events to append, and the
/// full id→new-index assignment table (including cells the planner decided
/// not to move, which are simply absent from `assignments`).
#[derive(Debug, Default)]
pub struct RebalanceResult {
    pub events: Vec<Event>,
    pub assignments: Vec<(CellId, String)>,
}

impl RebalanceResult {
    pub fn new_index_for(&self, id: &str) -> Option<&str> {
        self.assignments
            .iter()
            .find(|(cell_id, _)| cell_id == id)
            .map(|(_, idx)| idx.as_str())
    }
}

/// `rebalance(cells, {jitter, actorId, bufferCells})`.
///
/// Generates `|cells| + 2*bufferCells` evenly-distributed indices and
/// assigns cells to the middle slice, reserving `bufferCells` headroom
/// positions on each side that are never emitted as events. Cells whose
/// computed index equals their current one are skipped.
pub fn rebalance(cells: &[Cell], mut opts: RebalanceOptions) -> Result<RebalanceResult> {
    let mut sorted: Vec<&Cell> = cells.iter().collect();
    sorted.sort_by(|a, b| a.order_key().cmp(&b.order_key()));

    let n = sorted.len() + 2 * opts.buffer_cells;
    let indices = index::generate(None, None, n, index::reborrow_jitter(&mut opts.jitter))?;

    if !index::validate_order(&indices) {
        return Err(AlgebraError::OrderingViolationPostOp);
    }

    let mut result = RebalanceResult::default();
    for (i, cell) in sorted.iter().enumerate() {
        let new_index = &indices[opts.buffer_cells + i];
        if cell.fractional_index.as_deref() == Some(new_index.as_str()) {
            continue;
        }
        result.assignments.push((cell.id.clone(), new_index.clone()));
        result.events.push(Event::CellMovedV2 {
            id: cell.id.clone(),
            fractional_index: new_index.clone(),
            actor_id: opts.actor_id.map(|a| format!("{a}-rebalance")),
        });
    }

    Ok(result)
}

/// Context supplied to [`between_with_fallback`] so it can invoke the
/// planner when the direct attempt fails.
pub struct RebalanceContext<'a> {
    pub all_cells: &'a [Cell],
    pub insert_pos: usize,
    pub buffer_cells: usize,
    pub actor_id: Option<String>,
}

/// The result of [`between_with_fallback`].
#[derive(Debug)]
pub struct FallbackResult {
    pub index: String,
    pub needs_rebalancing: bool,
    pub rebalance_result: Option<RebalanceResult>,
}

/// `betweenWithFallback(a, b, {allCells, insertPos, jitter})`.
///
/// Attempts `between(a, b)` directly; on `EmptyInterval`/`InvalidRange`, if
/// a [`RebalanceContext`] was supplied and rebalancing is actually needed,
/// runs [`rebalance`] and recomputes the insertion index from the *new*
/// indices at the corresponding slot. Without a context, the error
/// propagates unchanged.
pub fn between_with_fallback(
    a: Option<&str>,
    b: Option<&str>,
    mut jitter: Option<&mut dyn JitterSource>,
    context: Option<RebalanceContext>,
) -> Result<FallbackResult> {
    let attempt = match jitter.as_deref_mut() {
        Some(j) => index::between_with_jitter(a, b, j),
        None => index::between(a, b),
    };

    match attempt {
        Ok(idx) => Ok(FallbackResult {
            index: idx,
            needs_rebalancing: false,
            rebalance_result: None,
        }),
        Err(err @ (AlgebraError::EmptyInterval(..) | AlgebraError::InvalidRange(..))) => {
            let Some(ctx) = context else {
                return Err(err);
            };
            if !needs_rebalancing(ctx.all_cells, Some(ctx.insert_pos)) {
                return Err(err);
            }

            let result = rebalance(
                ctx.all_cells,
                RebalanceOptions {
                    jitter: index::reborrow_jitter(&mut jitter),
                    actor_id: ctx.actor_id.as_deref(),
                    buffer_cells: ctx.buffer_cells,
                },
            )?;

            let mut sorted: Vec<&Cell> = ctx.all_cells.iter().collect();
            sorted.sort_by(|x, y| x.order_key().cmp(&y.order_key()));

            let resolve = |cell: &Cell| -> Option<String> {
                result
                    .new_index_for(&cell.id)
                    .map(str::to_string)
                    .or_else(|| cell.fractional_index.clone())
            };
            let new_before = ctx
                .insert_pos
                .checked_sub(1)
                .and_then(|i| sorted.get(i))
                .and_then(|c| resolve(c));
            let new_after = sorted.get(ctx.insert_pos).and_then(|c| resolve(c));

            let idx = match index::reborrow_jitter(&mut jitter) {
                Some(j) => index::between_with_jitter(new_before.as_deref(), new_after.as_deref(), j)?,
                None => index::between(new_before.as_deref(), new_after.as_deref())?,
            };

            Ok(FallbackResult {
                index: idx,
                needs_rebalancing: true,
                rebalance_result: Some(result),
            })
        }
        Err(other) => Err(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CellType;

    fn cell(id: &str, idx: &str) -> Cell {
        let mut c = Cell::new(id, CellType::Code, "tester");
        c.fractional_index = Some(idx.to_string());
        c
    }

    #[test]
    fn detects_an_exhausted_gap() {
        let cells = vec![cell("a", "m"), cell("b", "m0")];
        assert!(needs_rebalancing(&cells, None));
    }

    #[test]
    fn healthy_spacing_needs_no_rebalance() {
        let cells = vec![cell("a", "c"), cell("b", "m"), cell("c", "s")];
        assert!(!needs_rebalancing(&cells, None));
    }

    #[test]
    fn rebalance_preserves_relative_order() {
        let cells = vec![
            cell("c1", "m"),
            cell("c2", "m0"),
            cell("c3", "m00"),
            cell("c4", "m000"),
        ];
        let result = rebalance(
            &cells,
            RebalanceOptions {
                jitter: None,
                actor_id: Some("actor-1"),
                buffer_cells: 1,
            },
        )
        .unwrap();

        let mut new_indices: Vec<(String, String)> = cells
            .iter()
            .map(|c| {
                let idx = result
                    .new_index_for(&c.id)
                    .map(str::to_string)
                    .unwrap_or_else(|| c.fractional_index.clone().unwrap());
                (c.id.clone(), idx)
            })
            .collect();
        new_indices.sort_by(|a, b| a.1.cmp(&b.1));
        let order: Vec<&str> = new_indices.iter().map(|(id, _)| id.as_str()).collect();
        assert_eq!(order, vec!["c1", "c2", "c3", "c4"]);

        for ev in &result.events {
            if let Event::CellMovedV2 { actor_id, .. } = ev {
                assert_eq!(actor_id.as_deref(), Some("actor-1-rebalance"));
            }
        }
    }

    #[test]
    fn rebalance_after_produces_valid_gaps() {
        let cells = vec![cell("a", "m"), cell("b", "m0")];
        let result = rebalance(
            &cells,
            RebalanceOptions {
                jitter: None,
                actor_id: None,
                buffer_cells: 1,
            },
        )
        .unwrap();

        let mut new_indices: Vec<String> = cells
            .iter()
            .map(|c| {
                result
                    .new_index_for(&c.id)
                    .map(str::to_string)
                    .unwrap_or_else(|| c.fractional_index.clone().unwrap())
            })
            .collect();
        new_indices.sort();

        assert!(index::between(None, Some(&new_indices[0])).is_ok());
        assert!(index::between(Some(&new_indices[0]), Some(&new_indices[1])).is_ok());
        assert!(index::between(Some(&new_indices[1]), None).is_ok());
    }

    #[test]
    fn rebalance_is_a_no_op_when_already_optimal() {
        // A single cell already sitting on the canonical midpoint with
        // buffer_cells = 0 needs no reassignment.
        let cells = vec![cell("only", "m")];
        let result = rebalance(
            &cells,
            RebalanceOptions {
                jitter: None,
                actor_id: None,
                buffer_cells: 0,
            },
        )
        .unwrap();
        assert!(result.events.is_empty());
    }

    #[test]
    fn fallback_without_context_propagates_error() {
        let err = between_with_fallback(Some("a"), Some("a0"), None, None).unwrap_err();
        assert_eq!(err, AlgebraError::EmptyInterval("a".into(), "a0".into()));
    }

    #[test]
    fn fallback_with_context_rebalances_and_succeeds() {
        let cells = vec![cell("a", "a"), cell("b", "a0")];
        let ctx = RebalanceContext {
            all_cells: &cells,
            insert_pos: 1,
            buffer_cells: 1,
            actor_id: Some("u1".to_string()),
        };
        let result = between_with_fallback(Some("a"), Some("a0"), None, Some(ctx)).unwrap();
        assert!(result.needs_rebalancing);
        let rb = result.rebalance_result.unwrap();
        assert!(!rb.events.is_empty());
        assert!(result.index.as_str() > "a");
    }
}

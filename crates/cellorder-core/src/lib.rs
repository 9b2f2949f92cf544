//! Ordering, rebalancing, and event materialization for collaborative
//! notebooks.
//!
//! # Architecture
//!
//! ```text
//! Event log ─────► materializer::reduce ─────► TableOp batch ─────► Tables
//!                                                                       │
//!                        index::between / rebalance::rebalance         │
//!                                   ▲                                  ▼
//!                         cellops::create_cell_between ◄────── query::* (cellOrdering, …)
//! ```
//!
//! `index` is the pure base-36 fractional-index algebra. `rebalance` wraps
//! it with a planner for when adjacency runs out. `cellops` turns
//! "put a cell here" requests into event batches. `materializer` folds
//! events into `Tables`, and `query` reads back out of them.

pub mod cellops;
pub mod error;
pub mod events;
pub mod index;
pub mod materializer;
pub mod model;
pub mod query;
pub mod rebalance;
pub mod tables;

pub use error::{AlgebraError, Result};
pub use events::{CellReference, Event};
pub use index::{JitterSource, NoJitter, RngJitter};
pub use model::*;
pub use tables::Tables;

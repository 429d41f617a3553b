//! Query planning and execution.
//!
//! A [`QueryPlan`] orders related fetches so parents run before children;
//! the [`SearchExecutor`] reads the primary rows and merges related rows with
//! a [`HashJoin`].

mod executor;
mod join;
mod plan;

pub use executor::{ExecutionResult, RelatedRows, SearchExecutor};
pub use join::{GroupedRows, HashJoin};
pub use plan::{FetchPlan, QueryPlan, QueryPlanner};

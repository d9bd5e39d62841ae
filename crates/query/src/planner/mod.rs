//! Query planner module.

mod query_planner;
mod resolve;

pub use query_planner::{QueryPlan, QueryPlanner, QueryRows};
pub use resolve::{dealias, resolve, validate_join_condition};

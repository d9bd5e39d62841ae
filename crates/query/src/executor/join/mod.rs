//! JOIN algorithm implementations.

mod hash;
mod nested;

pub use hash::HashJoin;
pub use nested::NestedLoopJoin;

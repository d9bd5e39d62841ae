//! Schema module for Quarry.
//!
//! A schema is the statically known shape of a record type: its name and
//! ordered, typed fields.

mod field;
mod record;

pub use field::Field;
pub use record::{Schema, SchemaBuilder};

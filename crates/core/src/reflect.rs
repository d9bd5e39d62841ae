//! Reflection capability for queryable record types.
//!
//! A record type becomes queryable by describing its shape once and exposing
//! positional field access. How an implementation produces these is its own
//! business; the engine only consumes them.

use crate::schema::Schema;
use crate::tuple::Tuple;
use crate::value::Value;

/// A record type whose fields can be enumerated and read by position.
///
/// # Example
///
/// ```rust
/// use quarry_core::{DataType, Reflect, Value};
/// use quarry_core::schema::{Schema, SchemaBuilder};
///
/// struct Point {
///     x: i32,
///     name: String,
/// }
///
/// impl Reflect for Point {
///     fn schema() -> Schema {
///         SchemaBuilder::new("Point")
///             .and_then(|b| b.field("x", DataType::Int32))
///             .and_then(|b| b.field("name", DataType::String))
///             .and_then(|b| b.build())
///             .expect("valid schema")
///     }
///
///     fn field(&self, index: usize) -> Value {
///         match index {
///             0 => Value::Int32(self.x),
///             _ => Value::String(self.name.clone()),
///         }
///     }
/// }
///
/// let p = Point { x: 3, name: "a".into() };
/// assert_eq!(p.to_tuple(2).get(0), Some(&Value::Int32(3)));
/// ```
pub trait Reflect {
    /// Returns the record's schema. Field indices of the schema are the
    /// indices accepted by [`Reflect::field`].
    fn schema() -> Schema;

    /// Reads the field at `index`.
    fn field(&self, index: usize) -> Value;

    /// Flattens the first `width` fields into a tuple.
    fn to_tuple(&self, width: usize) -> Tuple {
        Tuple::new((0..width).map(|i| self.field(i)).collect())
    }
}

//! Quarry Core - Value, tuple and schema types for the Quarry query engine.
//!
//! This crate provides the foundational types shared by the planner and executors:
//!
//! - `DataType`: Supported field types (Boolean, Int32, Int64, Float64, String)
//! - `Value`: Runtime values carried by tuples
//! - `Tuple`: An ordered, fixed-shape sequence of values
//! - `schema`: Record shape definitions (Schema, Field, SchemaBuilder)
//! - `Reflect`: The capability a record type implements to be queried
//! - `Error`: Error types for schema construction
//!
//! # Example
//!
//! ```rust
//! use quarry_core::{DataType, Tuple, Value};
//! use quarry_core::schema::SchemaBuilder;
//!
//! let schema = SchemaBuilder::new("Point")
//!     .unwrap()
//!     .field("x", DataType::Int32)
//!     .unwrap()
//!     .field("name", DataType::String)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let tuple = Tuple::new(vec![Value::Int32(1), Value::String("a".into())]);
//!
//! assert_eq!(schema.field_index("name"), Some(1));
//! assert_eq!(tuple.get(1), Some(&Value::String("a".into())));
//! ```

#![no_std]

extern crate alloc;

mod error;
mod reflect;
pub mod schema;
mod tuple;
mod types;
mod value;

pub use error::{Error, Result};
pub use reflect::Reflect;
pub use tuple::Tuple;
pub use types::DataType;
pub use value::Value;

//! Record schema definition for Quarry.

use super::field::Field;
use crate::error::{Error, Result};
use crate::types::DataType;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// The ordered, typed shape of a record type.
#[derive(Clone, Debug, PartialEq)]
pub struct Schema {
    /// Record type name, used as the table name in queries.
    name: String,
    /// Field definitions, in tuple order.
    fields: Vec<Field>,
}

impl Schema {
    /// Returns the schema name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields.
    #[inline]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the number of fields.
    #[inline]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the schema has no fields.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the field names in order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|f| f.name())
    }

    /// Gets a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Gets a field index by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    /// Returns the data type of the field at `index`.
    pub fn data_type(&self, index: usize) -> Result<DataType> {
        self.fields
            .get(index)
            .map(|f| f.data_type())
            .ok_or_else(|| Error::field_index_out_of_range(self.name.as_str(), index))
    }
}

/// Builder for record schemas.
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        Ok(Self {
            name,
            fields: Vec::new(),
        })
    }

    /// Validates a name follows identifier rules.
    fn check_naming_rules(name: &str) -> Result<()> {
        let mut chars = name.chars();
        let first = match chars.next() {
            Some(c) => c,
            None => return Err(Error::invalid_schema("Name cannot be empty")),
        };
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::invalid_schema(format!(
                "Name must start with letter or underscore: {}",
                name
            )));
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(Error::invalid_schema(format!(
                "Name contains invalid characters: {}",
                name
            )));
        }
        Ok(())
    }

    /// Appends a field to the schema.
    pub fn field(mut self, name: impl Into<String>, data_type: DataType) -> Result<Self> {
        let name = name.into();
        Self::check_naming_rules(&name)?;
        if self.fields.iter().any(|f| f.name() == name) {
            return Err(Error::duplicate_field(self.name.as_str(), name));
        }
        let index = self.fields.len();
        self.fields.push(Field::new(name, data_type).with_index(index));
        Ok(self)
    }

    /// Builds the schema.
    pub fn build(self) -> Result<Schema> {
        if self.fields.is_empty() {
            return Err(Error::invalid_schema(format!(
                "Schema {} has no fields",
                self.name
            )));
        }
        Ok(Schema {
            name: self.name,
            fields: self.fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    fn point() -> Schema {
        SchemaBuilder::new("Point")
            .unwrap()
            .field("x", DataType::Int32)
            .unwrap()
            .field("y", DataType::Int32)
            .unwrap()
            .field("name", DataType::String)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_schema_builder() {
        let schema = point();
        assert_eq!(schema.name(), "Point");
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["x", "y", "name"]);
        assert_eq!(schema.field("name").map(|f| f.index()), Some(2));
    }

    #[test]
    fn test_schema_lookup() {
        let schema = point();
        assert_eq!(schema.field_index("y"), Some(1));
        assert_eq!(schema.field_index("z"), None);
        assert_eq!(schema.data_type(2), Ok(DataType::String));
        assert!(matches!(
            schema.data_type(3),
            Err(Error::FieldIndexOutOfRange { index: 3, .. })
        ));
    }

    #[test]
    fn test_invalid_field_name() {
        let result = SchemaBuilder::new("test").unwrap().field("123invalid", DataType::Int32);
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
        assert!(SchemaBuilder::new("").is_err());
    }

    #[test]
    fn test_duplicate_field() {
        let result = SchemaBuilder::new("test")
            .unwrap()
            .field("id", DataType::Int64)
            .unwrap()
            .field("id", DataType::Int64);
        assert!(matches!(result, Err(Error::DuplicateField { .. })));
    }

    #[test]
    fn test_empty_schema_rejected() {
        assert!(SchemaBuilder::new("Empty").unwrap().build().is_err());
    }
}

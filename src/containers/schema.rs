use std::collections::HashSet;

use crate::{
    common::error::{FrameError, Result},
    core::types::DataType,
};

/// A single named, typed column in a [`Schema`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    /// The column name.
    pub name: String,

    /// The data type for values in this column.
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

/// An ordered, name-unique list of fields.
///
/// Field order defines column order in batches and is the basis for
/// positional projection.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    /// Creates a schema, rejecting duplicate field names.
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(fields.len());
        for field in &fields {
            if !seen.insert(field.name.as_str()) {
                return Err(FrameError::DuplicateField(field.name.clone()));
            }
        }

        Ok(Self { fields })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Finds a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Finds the index of a column by name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Restricts and reorders the schema to the named columns.
    ///
    /// An empty projection keeps every column in its original order.
    pub fn project(&self, columns: &[String]) -> Result<Schema> {
        if columns.is_empty() {
            return Ok(self.clone());
        }

        let fields = columns
            .iter()
            .map(|name| {
                self.field(name)
                    .cloned()
                    .ok_or_else(|| FrameError::ColumnNotFound(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Schema::new(fields)
    }
}

impl std::fmt::Display for Schema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fields = self
            .fields
            .iter()
            .map(|field| format!("{}: {}", field.name, field.data_type))
            .collect::<Vec<_>>();
        write!(f, "[{}]", fields.join(", "))
    }
}

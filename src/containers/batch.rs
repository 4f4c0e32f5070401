use std::sync::Arc;

use super::schema::Schema;
use crate::{
    common::error::{FrameError, Result},
    core::types::Value,
};

/// A row of data containing values for each column.
///
/// Rows are ordered collections of values that correspond to a schema's columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// The ordered values in this row.
    pub values: Vec<Value>,
}

impl Row {
    /// Creates a new row from a vector of values.
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Gets a reference to the value at the given column index.
    pub fn get_value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// A chunk of columnar data conforming to a schema.
///
/// Columns are stored behind `Arc` so projecting or cloning a batch never
/// copies cell data.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    schema: Schema,
    columns: Vec<Arc<[Value]>>,
    num_rows: usize,
}

impl Batch {
    /// Builds a batch from one value vector per schema field.
    ///
    /// Every column must have the same length and hold values compatible with
    /// its field's type.
    pub fn try_new(schema: Schema, columns: Vec<Vec<Value>>) -> Result<Self> {
        if columns.len() != schema.len() {
            return Err(FrameError::SchemaMismatch(format!(
                "expected {} columns, got {}",
                schema.len(),
                columns.len()
            )));
        }

        let num_rows = columns.first().map_or(0, Vec::len);

        for (field, column) in schema.fields().iter().zip(columns.iter()) {
            if column.len() != num_rows {
                return Err(FrameError::SchemaMismatch(format!(
                    "column {} has {} rows, expected {num_rows}",
                    field.name,
                    column.len()
                )));
            }

            for value in column {
                value
                    .is_compatible_with(&field.data_type)
                    .map_err(FrameError::TypeMismatch)?;
            }
        }

        Ok(Self {
            schema,
            columns: columns.into_iter().map(Arc::from).collect(),
            num_rows,
        })
    }

    /// Pivots row-major data into a columnar batch.
    pub fn from_rows(schema: Schema, rows: Vec<Row>) -> Result<Self> {
        let mut columns = vec![Vec::with_capacity(rows.len()); schema.len()];

        for row in rows {
            if row.values.len() != schema.len() {
                return Err(FrameError::SchemaMismatch(
                    "Row length doesn't match schema".to_string(),
                ));
            }

            for (column, value) in columns.iter_mut().zip(row.values) {
                column.push(value);
            }
        }

        Self::try_new(schema, columns)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column(&self, index: usize) -> Option<&[Value]> {
        self.columns.get(index).map(AsRef::as_ref)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&[Value]> {
        self.schema
            .index_of(name)
            .and_then(|index| self.column(index))
    }

    /// Materializes a single row; `None` when out of bounds.
    pub fn row(&self, index: usize) -> Option<Row> {
        if index >= self.num_rows {
            return None;
        }

        Some(Row::new(
            self.columns
                .iter()
                .map(|column| column[index].clone())
                .collect(),
        ))
    }

    /// Restricts the batch to the named columns, in the given order.
    ///
    /// An empty projection returns the batch unchanged.
    pub fn project(&self, columns: &[String]) -> Result<Batch> {
        if columns.is_empty() {
            return Ok(self.clone());
        }

        let schema = self.schema.project(columns)?;
        let projected = columns
            .iter()
            .map(|name| {
                self.schema
                    .index_of(name)
                    .map(|index| Arc::clone(&self.columns[index]))
                    .ok_or_else(|| FrameError::ColumnNotFound(name.clone()))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Batch {
            schema,
            columns: projected,
            num_rows: self.num_rows,
        })
    }
}

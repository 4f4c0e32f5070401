use strum::{Display, EnumString};

/// Column data types understood by the planner.
///
/// These are the type tags carried by schema fields and produced by
/// expression type resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum DataType {
    /// 64-bit signed integer.
    Int64,

    /// 64-bit floating point number.
    Float64,

    /// Variable-length UTF-8 text.
    #[strum(to_string = "Text", serialize = "String")]
    Text,

    /// Boolean true/false value.
    #[strum(to_string = "Bool", serialize = "Boolean")]
    Bool,
}

impl DataType {
    /// If two types are able to coerced
    pub fn can_coerce(from: DataType, to: DataType) -> bool {
        if from == to {
            return true;
        }

        matches!(
            (from, to),
            (DataType::Int64, DataType::Float64) | (DataType::Float64, DataType::Int64)
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }
}

/// A single cell value inside a batch column.
///
/// Values are strongly typed and correspond to [`DataType`] definitions.
#[derive(Debug, Clone, PartialEq, PartialOrd)]
pub enum Value {
    /// A 64-bit signed integer value.
    Int64(i64),

    /// A 64-bit floating point number.
    Float64(f64),

    /// A UTF-8 text string.
    Text(String),

    /// A boolean value (true/false).
    Bool(bool),

    /// Represents a NULL value (absence of data).
    Null,
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int64(i) => write!(f, "{}", i),
            Value::Text(s) => write!(f, "{}", s),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Float64(fl) => write!(f, "{}", fl),
            Value::Null => write!(f, "NULL"),
        }
    }
}

impl Value {
    /// Returns the data type of this value.
    ///
    /// Returns `None` for [`Value::Null`] since NULL has no specific type.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Int64(_) => Some(DataType::Int64),
            Value::Float64(_) => Some(DataType::Float64),
            Value::Text(_) => Some(DataType::Text),
            Value::Bool(_) => Some(DataType::Bool),
            Value::Null => None,
        }
    }

    /// Checks if this value can be stored in a column of the given type.
    pub fn is_compatible_with(&self, data_type: &DataType) -> Result<(), String> {
        match (self, data_type) {
            (Value::Int64(_), DataType::Int64)
            | (Value::Bool(_), DataType::Bool)
            | (Value::Float64(_), DataType::Float64)
            | (Value::Null, _)
            | (Value::Text(_), DataType::Text) => Ok(()),

            _ => Err(format!(
                "Type mismatch: {self:?} cannot be stored as {data_type:?}"
            )),
        }
    }
}

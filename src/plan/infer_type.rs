//! Result-type rules for the non-leaf expression variants.
//!
//! Errors are plain reasons; the caller attaches the rendered expression.

use crate::{
    core::types::DataType,
    plan::operator::{AggregateFunction, BooleanOperator, MathOperator},
};

pub(crate) fn resolve_boolean_op(
    left: DataType,
    op: BooleanOperator,
    right: DataType,
) -> Result<DataType, String> {
    if op.is_logical() {
        if left == DataType::Bool && right == DataType::Bool {
            return Ok(DataType::Bool);
        }

        return Err(format!("{op} requires Bool operands, got {left} and {right}"));
    }

    if DataType::can_coerce(left, right) {
        Ok(DataType::Bool)
    } else {
        Err(format!("cannot compare {left} {op} {right}"))
    }
}

pub(crate) fn resolve_math_op(
    left: DataType,
    op: MathOperator,
    right: DataType,
) -> Result<DataType, String> {
    common_numeric_type(left, right)
        .ok_or_else(|| format!("cannot perform arithmetic between {left} {op} {right}"))
}

pub(crate) fn resolve_aggregate(func: AggregateFunction, input: DataType) -> Result<DataType, String> {
    match func {
        AggregateFunction::Count => Ok(DataType::Int64),
        AggregateFunction::Min | AggregateFunction::Max => Ok(input),
        AggregateFunction::Sum if input.is_numeric() => Ok(input),
        AggregateFunction::Avg if input.is_numeric() => Ok(DataType::Float64),
        AggregateFunction::Sum | AggregateFunction::Avg => {
            Err(format!("{func} requires a numeric input, got {input}"))
        }
    }
}

fn common_numeric_type(left: DataType, right: DataType) -> Option<DataType> {
    match (left, right) {
        (DataType::Int64, DataType::Int64) => Some(DataType::Int64),
        (DataType::Float64, DataType::Float64)
        | (DataType::Int64, DataType::Float64)
        | (DataType::Float64, DataType::Int64) => Some(DataType::Float64),
        _ => None,
    }
}

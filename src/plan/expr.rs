//! The expression algebra embedded in projection, selection and aggregate
//! plan nodes.
//!
//! Every variant answers three planning-time questions:
//!
//! - [`Expr::data_type`]: the type it produces against a schema.
//! - [`Expr::columns_used`]: which source fields it reads (column lineage).
//! - [`Display`](fmt::Display): a stable human-readable rendering, also used
//!   as the output field name of unaliased expressions.

use std::fmt;

use crate::{
    common::error::{FrameError, Result},
    containers::schema::{Field, Schema},
    core::types::DataType,
    plan::{
        infer_type::{resolve_aggregate, resolve_boolean_op, resolve_math_op},
        logical::LogicalPlan,
        operator::{AggregateFunction, BooleanOperator, MathOperator},
    },
};

/// A constant value embedded in an expression.
///
/// The type of a literal is intrinsic and never depends on a schema.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Text(String),
    Int64(i64),
    Float64(f64),
    Bool(bool),
}

impl Literal {
    pub fn data_type(&self) -> DataType {
        match self {
            Literal::Text(_) => DataType::Text,
            Literal::Int64(_) => DataType::Int64,
            Literal::Float64(_) => DataType::Float64,
            Literal::Bool(_) => DataType::Bool,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Text(s) => write!(f, "'{s}'"),
            Literal::Int64(i) => write!(f, "{i}"),
            // `{}` on f64 is the shortest round-trippable form, without an exponent.
            Literal::Float64(fl) => write!(f, "{fl}"),
            Literal::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<i64> for Literal {
    fn from(value: i64) -> Self {
        Literal::Int64(value)
    }
}

impl From<i32> for Literal {
    fn from(value: i32) -> Self {
        Literal::Int64(i64::from(value))
    }
}

impl From<f64> for Literal {
    fn from(value: f64) -> Self {
        Literal::Float64(value)
    }
}

impl From<&str> for Literal {
    fn from(value: &str) -> Self {
        Literal::Text(value.to_owned())
    }
}

impl From<String> for Literal {
    fn from(value: String) -> Self {
        Literal::Text(value)
    }
}

impl From<bool> for Literal {
    fn from(value: bool) -> Self {
        Literal::Bool(value)
    }
}

/// A node in an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Reference to a field of the input schema, by name.
    Column(String),
    Literal(Literal),
    /// Renames the output of `expr`; type and lineage pass through.
    Alias { expr: Box<Expr>, alias: String },
    BooleanBinary {
        left: Box<Expr>,
        op: BooleanOperator,
        right: Box<Expr>,
    },
    Math {
        left: Box<Expr>,
        op: MathOperator,
        right: Box<Expr>,
    },
    /// Only meaningful inside an aggregate plan node.
    Aggregate {
        func: AggregateFunction,
        expr: Box<Expr>,
    },
}

/// Shorthand for [`Expr::Column`].
pub fn col(name: impl Into<String>) -> Expr {
    Expr::Column(name.into())
}

/// Shorthand for [`Expr::Literal`].
pub fn lit(value: impl Into<Literal>) -> Expr {
    Expr::Literal(value.into())
}

pub fn sum(expr: Expr) -> Expr {
    expr.aggregate(AggregateFunction::Sum)
}

pub fn count(expr: Expr) -> Expr {
    expr.aggregate(AggregateFunction::Count)
}

pub fn min(expr: Expr) -> Expr {
    expr.aggregate(AggregateFunction::Min)
}

pub fn max(expr: Expr) -> Expr {
    expr.aggregate(AggregateFunction::Max)
}

pub fn avg(expr: Expr) -> Expr {
    expr.aggregate(AggregateFunction::Avg)
}

impl Expr {
    /// Resolves the type this expression produces against `schema`.
    ///
    /// Fails with [`FrameError::ColumnNotFound`] for an unknown column and
    /// [`FrameError::TypeMismatch`] for operands that cannot be combined.
    pub fn data_type(&self, schema: &Schema) -> Result<DataType> {
        match self {
            Expr::Column(name) => schema
                .field(name)
                .map(|field| field.data_type)
                .ok_or_else(|| FrameError::ColumnNotFound(name.clone())),
            Expr::Literal(literal) => Ok(literal.data_type()),
            Expr::Alias { expr, .. } => expr.data_type(schema),
            Expr::BooleanBinary { left, op, right } => {
                let left = left.data_type(schema)?;
                let right = right.data_type(schema)?;

                resolve_boolean_op(left, *op, right).map_err(|reason| self.mismatch(reason))
            }
            Expr::Math { left, op, right } => {
                let left = left.data_type(schema)?;
                let right = right.data_type(schema)?;

                resolve_math_op(left, *op, right).map_err(|reason| self.mismatch(reason))
            }
            Expr::Aggregate { func, expr } => {
                let input = expr.data_type(schema)?;

                resolve_aggregate(*func, input).map_err(|reason| self.mismatch(reason))
            }
        }
    }

    /// Returns the source fields this expression reads from `input`.
    ///
    /// The result is deduplicated and ordered by first reference. A column
    /// missing from the input's schema is reported as
    /// [`FrameError::ColumnNotFound`] rather than treated as fatal.
    pub fn columns_used(&self, input: &LogicalPlan) -> Result<Vec<Field>> {
        let schema = input.schema()?;
        self.columns_used_in(&schema)
    }

    /// Same as [`Expr::columns_used`], against an already resolved schema.
    pub fn columns_used_in(&self, schema: &Schema) -> Result<Vec<Field>> {
        let mut fields = Vec::new();
        self.collect_columns(schema, &mut fields)?;
        Ok(fields)
    }

    fn collect_columns(&self, schema: &Schema, acc: &mut Vec<Field>) -> Result<()> {
        match self {
            Expr::Column(name) => {
                let field = schema
                    .field(name)
                    .ok_or_else(|| FrameError::ColumnNotFound(name.clone()))?;

                if !acc.iter().any(|seen| seen.name == field.name) {
                    acc.push(field.clone());
                }
                Ok(())
            }
            Expr::Literal(_) => Ok(()),
            Expr::Alias { expr, .. } | Expr::Aggregate { expr, .. } => {
                expr.collect_columns(schema, acc)
            }
            Expr::BooleanBinary { left, right, .. } | Expr::Math { left, right, .. } => {
                left.collect_columns(schema, acc)?;
                right.collect_columns(schema, acc)
            }
        }
    }

    /// The name of the field this expression produces in an output schema.
    pub fn output_name(&self) -> String {
        match self {
            Expr::Alias { alias, .. } => alias.clone(),
            other => other.to_string(),
        }
    }

    pub fn to_field(&self, schema: &Schema) -> Result<Field> {
        Ok(Field::new(self.output_name(), self.data_type(schema)?))
    }

    /// Whether this is an aggregate call, looking through aliases.
    pub fn is_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Alias { expr, .. } => expr.is_aggregate(),
            _ => false,
        }
    }

    /// Whether an aggregate call appears anywhere in this tree.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            Expr::Aggregate { .. } => true,
            Expr::Column(_) | Expr::Literal(_) => false,
            Expr::Alias { expr, .. } => expr.contains_aggregate(),
            Expr::BooleanBinary { left, right, .. } | Expr::Math { left, right, .. } => {
                left.contains_aggregate() || right.contains_aggregate()
            }
        }
    }

    pub fn alias(self, alias: impl Into<String>) -> Expr {
        Expr::Alias {
            expr: Box::new(self),
            alias: alias.into(),
        }
    }

    pub fn aggregate(self, func: AggregateFunction) -> Expr {
        Expr::Aggregate {
            func,
            expr: Box::new(self),
        }
    }

    pub fn eq(self, other: Expr) -> Expr {
        self.boolean(BooleanOperator::Equal, other)
    }

    pub fn not_eq(self, other: Expr) -> Expr {
        self.boolean(BooleanOperator::NotEqual, other)
    }

    pub fn lt(self, other: Expr) -> Expr {
        self.boolean(BooleanOperator::LessThan, other)
    }

    pub fn lt_eq(self, other: Expr) -> Expr {
        self.boolean(BooleanOperator::LessThanEqual, other)
    }

    pub fn gt(self, other: Expr) -> Expr {
        self.boolean(BooleanOperator::GreaterThan, other)
    }

    pub fn gt_eq(self, other: Expr) -> Expr {
        self.boolean(BooleanOperator::GreaterThanEqual, other)
    }

    pub fn and(self, other: Expr) -> Expr {
        self.boolean(BooleanOperator::And, other)
    }

    pub fn or(self, other: Expr) -> Expr {
        self.boolean(BooleanOperator::Or, other)
    }

    fn boolean(self, op: BooleanOperator, right: Expr) -> Expr {
        Expr::BooleanBinary {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    fn math(self, op: MathOperator, right: Expr) -> Expr {
        Expr::Math {
            left: Box::new(self),
            op,
            right: Box::new(right),
        }
    }

    fn mismatch(&self, reason: String) -> FrameError {
        FrameError::TypeMismatch(format!("{reason} in `{self}`"))
    }

    /// Binding power used to parenthesize nested binary nodes on display.
    fn precedence(&self) -> u8 {
        match self {
            Expr::Alias { .. } => 0,
            Expr::BooleanBinary { op, .. } => op.precedence(),
            Expr::Math { op, .. } => op.precedence(),
            Expr::Column(_) | Expr::Literal(_) | Expr::Aggregate { .. } => u8::MAX,
        }
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>, parent: u8, wrap_equal: bool) -> fmt::Result {
        let own = self.precedence();
        if own < parent || (wrap_equal && own == parent) {
            write!(f, "({self})")
        } else {
            write!(f, "{self}")
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Column(name) => write!(f, "#{name}"),
            Expr::Literal(literal) => write!(f, "{literal}"),
            Expr::Alias { expr, alias } => write!(f, "{expr} as {alias}"),
            Expr::BooleanBinary { left, op, right } => {
                left.fmt_operand(f, op.precedence(), false)?;
                write!(f, " {op} ")?;
                right.fmt_operand(f, op.precedence(), true)
            }
            Expr::Math { left, op, right } => {
                left.fmt_operand(f, op.precedence(), false)?;
                write!(f, " {op} ")?;
                right.fmt_operand(f, op.precedence(), true)
            }
            Expr::Aggregate { func, expr } => write!(f, "{func}({expr})"),
        }
    }
}

impl std::ops::Add for Expr {
    type Output = Expr;

    fn add(self, rhs: Expr) -> Expr {
        self.math(MathOperator::Add, rhs)
    }
}

impl std::ops::Sub for Expr {
    type Output = Expr;

    fn sub(self, rhs: Expr) -> Expr {
        self.math(MathOperator::Subtract, rhs)
    }
}

impl std::ops::Mul for Expr {
    type Output = Expr;

    fn mul(self, rhs: Expr) -> Expr {
        self.math(MathOperator::Multiply, rhs)
    }
}

impl std::ops::Div for Expr {
    type Output = Expr;

    fn div(self, rhs: Expr) -> Expr {
        self.math(MathOperator::Divide, rhs)
    }
}

impl std::ops::Rem for Expr {
    type Output = Expr;

    fn rem(self, rhs: Expr) -> Expr {
        self.math(MathOperator::Modulo, rhs)
    }
}

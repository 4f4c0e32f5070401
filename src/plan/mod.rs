//! Expressions and logical plans.

pub mod builder;
pub mod expr;
pub(crate) mod infer_type;
pub mod logical;
pub mod operator;
pub mod validate;

pub use builder::PlanBuilder;
pub use expr::{Expr, Literal, avg, col, count, lit, max, min, sum};
pub use logical::LogicalPlan;
pub use operator::{AggregateFunction, BooleanOperator, MathOperator};
pub use validate::{AcceptAll, PlanValidator, SchemaValidator, validate};

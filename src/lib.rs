//! The logical-plan core of a small columnar dataframe engine.
//!
//! Plans are assembled with [`PlanBuilder`] from [`Expr`] trees and read
//! their data through a [`TableReader`]. [`MemTable`] is the in-memory
//! reader used by the demo binary and the tests.

pub(crate) mod common;
pub(crate) mod containers;
pub(crate) mod core;
pub mod plan;
pub mod storage;

pub use common::error::{FrameError, Result};
pub use containers::{Batch, Field, Row, Schema};
pub use crate::core::types::{DataType, Value};
pub use plan::{
    AcceptAll, AggregateFunction, BooleanOperator, Expr, Literal, LogicalPlan, MathOperator,
    PlanBuilder, PlanValidator, SchemaValidator, avg, col, count, lit, max, min, sum, validate,
};
pub use storage::{
    Callback, IterOption, IterOptions, MemTable, TableReader, TaskContext, TxnId, callback,
    in_memory_only, with_projection,
};

//! Whole-plan validation run by [`PlanBuilder::build`](super::builder::PlanBuilder::build).
//!
//! Validation is a single pass over the finished tree. The builder uses
//! [`AcceptAll`] unless another [`PlanValidator`] is injected, so adding a
//! check never changes the builder's surface.

use tracing::trace;

use crate::{
    common::error::{FrameError, Result},
    core::types::DataType,
    plan::logical::LogicalPlan,
};

/// A check over a completed logical plan.
pub trait PlanValidator: Send + Sync {
    fn validate(&self, plan: &LogicalPlan) -> Result<()>;
}

/// Accepts every plan.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl PlanValidator for AcceptAll {
    fn validate(&self, _plan: &LogicalPlan) -> Result<()> {
        Ok(())
    }
}

/// The validation hook used by the builder.
pub fn validate(plan: &LogicalPlan) -> Result<()> {
    AcceptAll.validate(plan)
}

/// Checks cross-node consistency, leaf first:
///
/// - every node's schema resolves against its input,
/// - selection predicates are `Bool`,
/// - aggregate nodes only list aggregate calls as aggregates, and none in
///   the group-by,
/// - aggregate calls appear nowhere else,
/// - `Output` only appears at the root.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaValidator;

impl SchemaValidator {
    fn check(&self, plan: &LogicalPlan, is_root: bool) -> Result<()> {
        if let Some(input) = plan.input() {
            self.check(input, false)?;
        }

        trace!(node = plan.name(), "validating");

        match plan {
            LogicalPlan::Input { .. } => {}
            LogicalPlan::Projection { exprs, .. } => {
                if let Some(expr) = exprs.iter().find(|expr| expr.contains_aggregate()) {
                    return Err(FrameError::InvalidPlan(format!(
                        "aggregate `{expr}` used outside an aggregate node"
                    )));
                }
            }
            LogicalPlan::Selection { input, predicate } => {
                if predicate.contains_aggregate() {
                    return Err(FrameError::InvalidPlan(format!(
                        "aggregate in predicate `{predicate}`"
                    )));
                }

                let data_type = predicate.data_type(&input.schema()?)?;
                if data_type != DataType::Bool {
                    return Err(FrameError::TypeMismatch(format!(
                        "predicate `{predicate}` is {data_type}, expected Bool"
                    )));
                }
            }
            LogicalPlan::Aggregate {
                group_by,
                aggregates,
                ..
            } => {
                if let Some(expr) = group_by.iter().find(|expr| expr.contains_aggregate()) {
                    return Err(FrameError::InvalidPlan(format!(
                        "aggregate `{expr}` cannot be a grouping key"
                    )));
                }
                if let Some(expr) = aggregates.iter().find(|expr| !expr.is_aggregate()) {
                    return Err(FrameError::InvalidPlan(format!(
                        "`{expr}` is not an aggregate call"
                    )));
                }
            }
            LogicalPlan::Output { .. } => {
                if !is_root {
                    return Err(FrameError::InvalidPlan(
                        "Output must be the last node of a plan".to_string(),
                    ));
                }
            }
        }

        plan.schema().map(|_| ())
    }
}

impl PlanValidator for SchemaValidator {
    fn validate(&self, plan: &LogicalPlan) -> Result<()> {
        self.check(plan, true)
    }
}

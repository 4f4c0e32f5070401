use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    common::error::{FrameError, Result},
    plan::{
        expr::Expr,
        logical::LogicalPlan,
        validate::{self, PlanValidator},
    },
    storage::{Callback, TableReader},
};

/// Fluent, persistent builder for [`LogicalPlan`] trees.
///
/// Every step returns a new builder and leaves the receiver untouched, so a
/// partially built plan can be branched:
///
/// ```
/// # use std::sync::Arc;
/// # use tiny_frame::{col, lit, DataType, Field, MemTable, PlanBuilder, Schema};
/// let schema = Schema::new(vec![Field::new("id", DataType::Int64)]).unwrap();
/// let scan = PlanBuilder::new().input("t", Arc::new(MemTable::new("t", schema)), ["id"]);
///
/// let small = scan.filter(col("id").lt(lit(10))).build().unwrap();
/// let large = scan.filter(col("id").gt_eq(lit(10))).build().unwrap();
/// assert_ne!(small.to_string(), large.to_string());
/// ```
///
/// Steps do no type checking; problems surface from [`PlanBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct PlanBuilder {
    plan: Option<Arc<LogicalPlan>>,
    /// First operator applied while the builder had no input.
    orphaned: Option<&'static str>,
}

impl PlanBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a fresh plan reading `path` through `reader`. Discards any
    /// previous steps.
    pub fn input<I, S>(
        &self,
        path: impl Into<String>,
        reader: Arc<dyn TableReader>,
        projection: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            plan: Some(Arc::new(LogicalPlan::Input {
                path: path.into(),
                source: reader,
                projection: projection.into_iter().map(Into::into).collect(),
            })),
            orphaned: None,
        }
    }

    pub fn project(&self, exprs: Vec<Expr>) -> Self {
        self.wrap("Projection", |input| LogicalPlan::Projection { input, exprs })
    }

    pub fn filter(&self, predicate: Expr) -> Self {
        self.wrap("Selection", |input| LogicalPlan::Selection { input, predicate })
    }

    pub fn aggregate(&self, group_by: Vec<Expr>, aggregates: Vec<Expr>) -> Self {
        self.wrap("Aggregate", |input| LogicalPlan::Aggregate {
            input,
            group_by,
            aggregates,
        })
    }

    pub fn output(&self, sink: Callback) -> Self {
        self.wrap("Output", |input| LogicalPlan::Output { input, sink })
    }

    fn wrap(
        &self,
        operator: &'static str,
        node: impl FnOnce(Arc<LogicalPlan>) -> LogicalPlan,
    ) -> Self {
        match &self.plan {
            Some(input) => Self {
                plan: Some(Arc::new(node(Arc::clone(input)))),
                orphaned: self.orphaned,
            },
            None => Self {
                plan: None,
                orphaned: self.orphaned.or(Some(operator)),
            },
        }
    }

    /// The root built so far, if any.
    pub fn plan(&self) -> Option<&Arc<LogicalPlan>> {
        self.plan.as_ref()
    }

    /// Finishes the plan using the default validation hook.
    pub fn build(&self) -> Result<Arc<LogicalPlan>> {
        self.finish(validate::validate)
    }

    /// Finishes the plan, checking it with `validator`.
    pub fn build_with(&self, validator: &dyn PlanValidator) -> Result<Arc<LogicalPlan>> {
        self.finish(|plan| validator.validate(plan))
    }

    fn finish(&self, check: impl FnOnce(&LogicalPlan) -> Result<()>) -> Result<Arc<LogicalPlan>> {
        if let Some(operator) = self.orphaned {
            return Err(FrameError::InvalidPlan(format!("{operator} has no input")));
        }

        let plan = self
            .plan
            .as_ref()
            .ok_or_else(|| FrameError::InvalidPlan("empty plan".to_string()))?;

        if let Err(err) = check(plan) {
            warn!(root = plan.name(), %err, "plan rejected");
            return Err(err);
        }

        debug!(root = plan.name(), depth = plan.depth(), "plan built");
        Ok(Arc::clone(plan))
    }
}

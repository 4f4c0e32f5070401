use std::{fmt, sync::Arc};

use crate::{
    common::error::Result,
    containers::schema::{Field, Schema},
    plan::expr::Expr,
    storage::{Callback, TableReader},
};

/// A node of a logical query plan.
///
/// Plans are strict trees. Every non-leaf node owns exactly one input, held
/// behind an `Arc` so partially built plans can be shared and extended
/// without copying.
#[derive(Clone)]
pub enum LogicalPlan {
    /// Leaf reading from a table, restricted to `projection` (empty = all).
    Input {
        path: String,
        source: Arc<dyn TableReader>,
        projection: Vec<String>,
    },
    Projection {
        input: Arc<LogicalPlan>,
        exprs: Vec<Expr>,
    },
    /// Keeps rows for which `predicate` holds.
    Selection {
        input: Arc<LogicalPlan>,
        predicate: Expr,
    },
    Aggregate {
        input: Arc<LogicalPlan>,
        group_by: Vec<Expr>,
        aggregates: Vec<Expr>,
    },
    /// Terminal node handing every result batch to `sink`.
    Output {
        input: Arc<LogicalPlan>,
        sink: Callback,
    },
}

impl LogicalPlan {
    /// The schema this node produces.
    pub fn schema(&self) -> Result<Schema> {
        match self {
            LogicalPlan::Input {
                source, projection, ..
            } => source.schema().project(projection),
            LogicalPlan::Projection { input, exprs } => {
                let input_schema = input.schema()?;
                Self::fields_of(exprs.iter(), &input_schema)
            }
            LogicalPlan::Selection { input, .. } | LogicalPlan::Output { input, .. } => {
                input.schema()
            }
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggregates,
            } => {
                let input_schema = input.schema()?;
                Self::fields_of(group_by.iter().chain(aggregates.iter()), &input_schema)
            }
        }
    }

    fn fields_of<'a>(exprs: impl Iterator<Item = &'a Expr>, input: &Schema) -> Result<Schema> {
        let fields = exprs
            .map(|expr| expr.to_field(input))
            .collect::<Result<Vec<_>>>()?;

        Schema::new(fields)
    }

    /// The single input of this node; `None` for a leaf.
    pub fn input(&self) -> Option<&Arc<LogicalPlan>> {
        match self {
            LogicalPlan::Input { .. } => None,
            LogicalPlan::Projection { input, .. }
            | LogicalPlan::Selection { input, .. }
            | LogicalPlan::Aggregate { input, .. }
            | LogicalPlan::Output { input, .. } => Some(input),
        }
    }

    /// Number of nodes from this one down to the leaf, inclusive.
    pub fn depth(&self) -> usize {
        1 + self.input().map_or(0, |input| input.depth())
    }

    pub fn name(&self) -> &'static str {
        match self {
            LogicalPlan::Input { .. } => "Input",
            LogicalPlan::Projection { .. } => "Projection",
            LogicalPlan::Selection { .. } => "Selection",
            LogicalPlan::Aggregate { .. } => "Aggregate",
            LogicalPlan::Output { .. } => "Output",
        }
    }

    /// Fields of this node's input that the node itself reads.
    ///
    /// For leaves and [`LogicalPlan::Output`] that is the whole schema they
    /// expose.
    pub fn columns_used(&self) -> Result<Vec<Field>> {
        match self {
            LogicalPlan::Input { .. } | LogicalPlan::Output { .. } => {
                Ok(self.schema()?.fields().to_vec())
            }
            LogicalPlan::Projection { input, exprs } => {
                Self::lineage(exprs.iter(), &input.schema()?)
            }
            LogicalPlan::Selection { input, predicate } => {
                predicate.columns_used_in(&input.schema()?)
            }
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggregates,
            } => Self::lineage(group_by.iter().chain(aggregates.iter()), &input.schema()?),
        }
    }

    fn lineage<'a>(exprs: impl Iterator<Item = &'a Expr>, input: &Schema) -> Result<Vec<Field>> {
        let mut used: Vec<Field> = Vec::new();
        for expr in exprs {
            for field in expr.columns_used_in(input)? {
                if !used.iter().any(|seen| seen.name == field.name) {
                    used.push(field);
                }
            }
        }
        Ok(used)
    }

    /// Renders the plan as an indented tree, root first.
    pub fn explain(&self) -> String {
        self.to_string()
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalPlan::Input {
                path, projection, ..
            } => {
                if projection.is_empty() {
                    write!(f, "Input: {path}")
                } else {
                    write!(f, "Input: {path} projection=[{}]", projection.join(", "))
                }
            }
            LogicalPlan::Projection { exprs, .. } => {
                write!(f, "Projection: {}", join_exprs(exprs))
            }
            LogicalPlan::Selection { predicate, .. } => write!(f, "Selection: {predicate}"),
            LogicalPlan::Aggregate {
                group_by,
                aggregates,
                ..
            } => write!(
                f,
                "Aggregate: groupBy=[{}], aggr=[{}]",
                join_exprs(group_by),
                join_exprs(aggregates)
            ),
            LogicalPlan::Output { .. } => write!(f, "Output"),
        }
    }
}

fn join_exprs(exprs: &[Expr]) -> String {
    exprs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut node = Some(self);
        let mut level = 0;

        while let Some(plan) = node {
            if level > 0 {
                writeln!(f)?;
            }
            write!(f, "{:indent$}", "", indent = level * 2)?;
            plan.fmt_node(f)?;

            node = plan.input().map(|input| input.as_ref());
            level += 1;
        }

        Ok(())
    }
}

impl fmt::Debug for LogicalPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalPlan::Input {
                path, projection, ..
            } => f
                .debug_struct("Input")
                .field("path", path)
                .field("projection", projection)
                .finish_non_exhaustive(),
            LogicalPlan::Projection { input, exprs } => f
                .debug_struct("Projection")
                .field("input", input)
                .field("exprs", exprs)
                .finish(),
            LogicalPlan::Selection { input, predicate } => f
                .debug_struct("Selection")
                .field("input", input)
                .field("predicate", predicate)
                .finish(),
            LogicalPlan::Aggregate {
                input,
                group_by,
                aggregates,
            } => f
                .debug_struct("Aggregate")
                .field("input", input)
                .field("group_by", group_by)
                .field("aggregates", aggregates)
                .finish(),
            LogicalPlan::Output { input, .. } => f
                .debug_struct("Output")
                .field("input", input)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::error::FrameError,
        core::types::DataType,
        plan::expr::{col, count, lit, sum},
        storage::{MemTable, callback},
    };

    fn create_test_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("dept", DataType::Text),
            Field::new("salary", DataType::Float64),
        ])
        .unwrap()
    }

    fn input(projection: &[&str]) -> Arc<LogicalPlan> {
        Arc::new(LogicalPlan::Input {
            path: "staff.tbl".to_string(),
            source: Arc::new(MemTable::new("staff", create_test_schema())),
            projection: projection.iter().map(ToString::to_string).collect(),
        })
    }

    fn names(schema: &Schema) -> Vec<&str> {
        schema.fields().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_input_schema_follows_projection() {
        let all = input(&[]).schema().unwrap();
        assert_eq!(names(&all), vec!["id", "dept", "salary"]);

        let projected = input(&["salary", "id"]).schema().unwrap();
        assert_eq!(names(&projected), vec!["salary", "id"]);
    }

    #[test]
    fn test_input_schema_unknown_projection() {
        let err = input(&["bonus"]).schema().unwrap_err();
        assert_eq!(err, FrameError::ColumnNotFound("bonus".to_string()));
    }

    #[test]
    fn test_projection_schema_uses_output_names() {
        let plan = LogicalPlan::Projection {
            input: input(&[]),
            exprs: vec![col("id"), (col("salary") * lit(2)).alias("double")],
        };

        let schema = plan.schema().unwrap();
        assert_eq!(schema.fields()[0], Field::new("#id", DataType::Int64));
        assert_eq!(schema.fields()[1], Field::new("double", DataType::Float64));
    }

    #[test]
    fn test_selection_and_output_pass_schema_through() {
        let selection = Arc::new(LogicalPlan::Selection {
            input: input(&["dept"]),
            predicate: col("dept").eq(lit("eng")),
        });
        let output = LogicalPlan::Output {
            input: Arc::clone(&selection),
            sink: callback(|_, _| Ok(())),
        };

        assert_eq!(names(&selection.schema().unwrap()), vec!["dept"]);
        assert_eq!(output.schema().unwrap(), selection.schema().unwrap());
    }

    #[test]
    fn test_aggregate_schema_orders_group_by_first() {
        let plan = LogicalPlan::Aggregate {
            input: input(&[]),
            group_by: vec![col("dept")],
            aggregates: vec![sum(col("salary")), count(col("id")).alias("n")],
        };

        let schema = plan.schema().unwrap();
        assert_eq!(
            schema.fields(),
            &[
                Field::new("#dept", DataType::Text),
                Field::new("SUM(#salary)", DataType::Float64),
                Field::new("n", DataType::Int64),
            ]
        );
    }

    #[test]
    fn test_projection_schema_reports_duplicate_names() {
        let plan = LogicalPlan::Projection {
            input: input(&[]),
            exprs: vec![col("id"), col("id")],
        };
        assert_eq!(
            plan.schema().unwrap_err(),
            FrameError::DuplicateField("#id".to_string())
        );
    }

    #[test]
    fn test_columns_used_per_node() {
        let projection = LogicalPlan::Projection {
            input: input(&[]),
            exprs: vec![col("salary") + col("id"), col("salary"), lit(1)],
        };
        let used: Vec<_> = projection
            .columns_used()
            .unwrap()
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(used, vec!["salary", "id"]);

        let selection = LogicalPlan::Selection {
            input: input(&["dept", "id"]),
            predicate: col("dept").eq(lit("eng")),
        };
        assert_eq!(
            selection.columns_used().unwrap(),
            vec![Field::new("dept", DataType::Text)]
        );
    }

    #[test]
    fn test_columns_used_outside_projected_input() {
        let selection = LogicalPlan::Selection {
            input: input(&["dept"]),
            predicate: col("salary").gt(lit(10)),
        };
        assert_eq!(
            selection.columns_used().unwrap_err(),
            FrameError::ColumnNotFound("salary".to_string())
        );
    }

    #[test]
    fn test_explain_renders_tree() {
        let plan = LogicalPlan::Aggregate {
            input: Arc::new(LogicalPlan::Selection {
                input: input(&["dept", "salary"]),
                predicate: col("salary").gt(lit(1000)),
            }),
            group_by: vec![col("dept")],
            aggregates: vec![sum(col("salary"))],
        };

        let expected = "Aggregate: groupBy=[#dept], aggr=[SUM(#salary)]\n  \
                        Selection: #salary > 1000\n    \
                        Input: staff.tbl projection=[dept, salary]";
        assert_eq!(plan.explain(), expected);
        assert_eq!(plan.depth(), 3);
    }
}

use std::{
    io::{Write, stdout},
    sync::{Arc, Mutex},
};

use miette::{IntoDiagnostic, Result, miette};
use tracing_subscriber::EnvFilter;

use tiny_frame::{
    Batch, DataType, Field, FrameError, MemTable, PlanBuilder, Row, Schema, SchemaValidator,
    TableReader, TaskContext, Value, callback, col, count, lit, sum, with_projection,
};

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(false)
                .context_lines(3)
                .tab_width(4)
                .break_words(true)
                .build(),
        )
    }))
    .into_diagnostic()?;
    miette::set_panic_hook();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tiny_frame=info")),
        )
        .init();

    let schema = Schema::new(vec![
        Field::new("id", DataType::Int64),
        Field::new("dept", DataType::Text),
        Field::new("salary", DataType::Float64),
        Field::new("active", DataType::Bool),
    ])?;

    let table = Arc::new(MemTable::with_batches(
        "staff",
        schema.clone(),
        vec![Batch::from_rows(
            schema.clone(),
            vec![
                row(1, "eng", 1200.0, true),
                row(2, "eng", 950.0, true),
                row(3, "ops", 1800.0, false),
            ],
        )?],
    )?);
    table.append(Batch::from_rows(
        schema.clone(),
        vec![row(4, "ops", 1100.0, true), row(5, "sales", 700.0, true)],
    )?)?;

    let plan = PlanBuilder::new()
        .input("staff.tbl", table.clone(), ["dept", "salary", "active"])
        .filter(col("active").and(col("salary").gt(lit(1000))))
        .aggregate(
            vec![col("dept")],
            vec![sum(col("salary")).alias("total"), count(col("salary"))],
        )
        .build_with(&SchemaValidator)?;

    println!("{plan}");
    println!();
    println!("Output schema: {}", plan.schema()?);
    println!(
        "Scan reads: {}",
        plan.input()
            .ok_or_else(|| miette!("aggregate without input"))?
            .columns_used()?
            .iter()
            .map(|field| field.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!();

    let scanned = Arc::new(Mutex::new(Vec::new()));
    let sink = {
        let scanned = Arc::clone(&scanned);
        callback(move |_, batch| {
            scanned
                .lock()
                .map_err(|_| FrameError::Execution("sink poisoned".to_string()))?
                .push(batch.clone());
            Ok(())
        })
    };

    let ctx = TaskContext::new();
    table.view(&ctx, &mut |ctx, txn| {
        // Writes inside the view are not visible to it.
        table.append(Batch::from_rows(
            table.schema().clone(),
            vec![row(6, "eng", 3000.0, true)],
        )?)?;
        println!("Scanning snapshot txn={txn}");
        table.iterator(ctx, &[Arc::clone(&sink)], vec![with_projection(["dept", "salary"])])
    })?;

    let batches = scanned.lock().map_err(|_| miette!("sink poisoned"))?;
    let mut stdout = stdout().lock();
    for batch in batches.iter() {
        print_batch(&mut stdout, batch)?;
    }
    writeln!(stdout, "Table now at version {}", table.version()).into_diagnostic()?;

    Ok(())
}

fn row(id: i64, dept: &str, salary: f64, active: bool) -> Row {
    Row::new(vec![
        Value::Int64(id),
        Value::Text(dept.to_string()),
        Value::Float64(salary),
        Value::Bool(active),
    ])
}

fn print_batch(out: &mut impl Write, batch: &Batch) -> Result<()> {
    write!(out, "{: <8}", "Row").into_diagnostic()?;
    for field in batch.schema().fields() {
        write!(out, " | {: <8}", field.name).into_diagnostic()?;
    }
    writeln!(out).into_diagnostic()?;

    for idx in 0..batch.num_rows() {
        let Some(row) = batch.row(idx) else {
            break;
        };
        write!(out, "{idx: <8}").into_diagnostic()?;
        for value in &row.values {
            write!(out, " | {: <8}", value.to_string()).into_diagnostic()?;
        }
        writeln!(out).into_diagnostic()?;
    }

    Ok(())
}

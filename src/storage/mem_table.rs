//! An in-memory, multi-versioned [`TableReader`].
//!
//! Every append publishes a new immutable version of the table's batch list.
//! Readers never copy batch data: a version is an `Arc<Vec<Batch>>` and each
//! batch shares its columns, so pinning a snapshot is a pointer clone.

use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::RwLock;
use tracing::{debug, trace};

use super::{Callback, IterOption, IterOptions, TableReader, TaskContext, TxnId};
use crate::{
    common::error::{FrameError, Result},
    containers::{batch::Batch, schema::Schema},
};

/// Process-wide so transaction ids never collide across tables.
static NEXT_TXN_ID: AtomicU64 = AtomicU64::new(1);

/// A version pinned by an open [`TableReader::view`].
#[derive(Debug)]
struct Snapshot {
    version: u64,
    batches: Arc<Vec<Batch>>,
}

#[derive(Debug)]
struct TableState {
    version: u64,
    batches: Arc<Vec<Batch>>,
    snapshots: HashMap<TxnId, Snapshot>,
    closed: bool,
}

/// A table held entirely in memory.
#[derive(Debug)]
pub struct MemTable {
    name: String,
    schema: Schema,
    state: RwLock<TableState>,
}

impl MemTable {
    /// Creates an empty table.
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            state: RwLock::new(TableState {
                version: 0,
                batches: Arc::new(Vec::new()),
                snapshots: HashMap::new(),
                closed: false,
            }),
        }
    }

    /// Creates a table whose first version holds `batches`.
    pub fn with_batches(
        name: impl Into<String>,
        schema: Schema,
        batches: Vec<Batch>,
    ) -> Result<Self> {
        let table = Self::new(name, schema);
        for batch in &batches {
            table.check_schema(batch)?;
        }

        table.state.write().batches = Arc::new(batches);
        Ok(table)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The version readers currently see outside any snapshot.
    pub fn version(&self) -> u64 {
        self.state.read().version
    }

    pub fn num_batches(&self) -> usize {
        self.state.read().batches.len()
    }

    /// Number of snapshots pinned by in-flight views.
    pub fn active_snapshots(&self) -> usize {
        self.state.read().snapshots.len()
    }

    /// Publishes a new version with `batch` appended.
    ///
    /// Versions pinned by open views are left untouched.
    pub fn append(&self, batch: Batch) -> Result<u64> {
        self.check_schema(&batch)?;

        let mut state = self.state.write();
        state.ensure_open(&self.name)?;

        let mut batches = Vec::with_capacity(state.batches.len() + 1);
        batches.extend(state.batches.iter().cloned());
        batches.push(batch);

        state.batches = Arc::new(batches);
        state.version += 1;

        debug!(table = %self.name, version = state.version, "published new version");
        Ok(state.version)
    }

    /// Marks the source unavailable; later reads fail.
    pub fn close(&self) {
        self.state.write().closed = true;
        debug!(table = %self.name, "closed");
    }

    fn check_schema(&self, batch: &Batch) -> Result<()> {
        if batch.schema() != &self.schema {
            return Err(FrameError::SchemaMismatch(format!(
                "batch schema {} does not match table {} schema {}",
                batch.schema(),
                self.name,
                self.schema
            )));
        }
        Ok(())
    }

    /// Resolves the batches a read under `ctx` must observe.
    fn snapshot_for(&self, ctx: &TaskContext) -> Result<Arc<Vec<Batch>>> {
        let state = self.state.read();
        state.ensure_open(&self.name)?;

        if let Some(txn) = ctx.txn() {
            if let Some(snapshot) = state.snapshots.get(&txn) {
                trace!(table = %self.name, txn, version = snapshot.version, "reading pinned snapshot");
                return Ok(Arc::clone(&snapshot.batches));
            }
        }

        Ok(Arc::clone(&state.batches))
    }

    fn release(&self, txn: TxnId) {
        if let Some(snapshot) = self.state.write().snapshots.remove(&txn) {
            debug!(table = %self.name, txn, version = snapshot.version, "released snapshot");
        }
    }
}

impl TableState {
    fn ensure_open(&self, name: &str) -> Result<()> {
        if self.closed {
            return Err(FrameError::SourceUnavailable(name.to_string()));
        }
        Ok(())
    }
}

/// Releases a pinned snapshot when dropped, including on unwind.
struct SnapshotGuard<'a> {
    table: &'a MemTable,
    txn: TxnId,
}

impl Drop for SnapshotGuard<'_> {
    fn drop(&mut self) {
        self.table.release(self.txn);
    }
}

impl TableReader for MemTable {
    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn view(
        &self,
        ctx: &TaskContext,
        f: &mut dyn FnMut(&TaskContext, TxnId) -> Result<()>,
    ) -> Result<()> {
        ctx.check()?;

        let txn = NEXT_TXN_ID.fetch_add(1, Ordering::Relaxed);
        {
            let mut state = self.state.write();
            state.ensure_open(&self.name)?;

            let snapshot = Snapshot {
                version: state.version,
                batches: Arc::clone(&state.batches),
            };
            debug!(table = %self.name, txn, version = snapshot.version, "opened snapshot");
            state.snapshots.insert(txn, snapshot);
        }

        let _guard = SnapshotGuard { table: self, txn };
        f(&ctx.with_txn(txn), txn)
    }

    fn iterator(
        &self,
        ctx: &TaskContext,
        callbacks: &[Callback],
        options: Vec<IterOption>,
    ) -> Result<()> {
        ctx.check()?;

        let opts = IterOptions::from_options(options);
        // Everything already lives in memory, so `in_memory_only` holds trivially.
        trace!(
            table = %self.name,
            projection = ?opts.projection,
            in_memory_only = opts.in_memory_only,
            "starting scan"
        );

        self.schema.project(&opts.projection)?;
        let batches = self.snapshot_for(ctx)?;

        for (index, batch) in batches.iter().enumerate() {
            if let Err(err) = ctx.check() {
                debug!(table = %self.name, delivered = index, "scan stopped by context");
                return Err(err);
            }

            let batch = batch.project(&opts.projection)?;
            for callback in callbacks {
                callback(ctx, &batch)?;
            }
        }

        trace!(table = %self.name, batches = batches.len(), "scan finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Barrier;

    use parking_lot::Mutex;

    use super::*;
    use crate::{
        containers::{batch::Row, schema::Field},
        core::types::{DataType, Value},
        storage::{callback, in_memory_only, with_projection},
    };

    fn create_test_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Int64),
            Field::new("name", DataType::Text),
        ])
        .unwrap()
    }

    fn batch_of(ids: &[i64]) -> Batch {
        let rows = ids
            .iter()
            .map(|id| Row::new(vec![Value::Int64(*id), Value::Text(format!("user{id}"))]))
            .collect();
        Batch::from_rows(create_test_schema(), rows).unwrap()
    }

    fn create_test_table() -> MemTable {
        MemTable::with_batches(
            "users",
            create_test_schema(),
            vec![batch_of(&[1, 2]), batch_of(&[3]), batch_of(&[4, 5, 6])],
        )
        .unwrap()
    }

    /// A callback recording the row count of every batch it sees.
    fn recorder() -> (Callback, Arc<Mutex<Vec<usize>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let cb = callback(move |_ctx, batch| {
            sink.lock().push(batch.num_rows());
            Ok(())
        });
        (cb, seen)
    }

    fn count_rows(table: &MemTable, ctx: &TaskContext) -> usize {
        let (cb, seen) = recorder();
        table.iterator(ctx, &[cb], vec![]).unwrap();
        seen.lock().iter().sum()
    }

    #[test]
    fn test_iterator_delivers_batches_in_order_to_every_callback() {
        let table = create_test_table();
        let (first, first_seen) = recorder();
        let (second, second_seen) = recorder();

        table
            .iterator(&TaskContext::new(), &[first, second], vec![])
            .unwrap();

        assert_eq!(*first_seen.lock(), vec![2, 1, 3]);
        assert_eq!(*second_seen.lock(), vec![2, 1, 3]);
    }

    #[test]
    fn test_iterator_on_cancelled_context_invokes_no_callback() {
        let table = create_test_table();
        let (cb, seen) = recorder();
        let ctx = TaskContext::new();
        ctx.cancel();

        let result = table.iterator(&ctx, &[cb], vec![]);

        assert_eq!(result, Err(FrameError::Cancelled));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_callback_error_halts_and_is_returned_verbatim() {
        let table = create_test_table();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let failing = callback(move |_ctx, _batch| {
            *counter.lock() += 1;
            Err(FrameError::Execution("sink full".to_string()))
        });
        let (after, after_seen) = recorder();

        let result = table.iterator(&TaskContext::new(), &[failing, after], vec![]);

        assert_eq!(result, Err(FrameError::Execution("sink full".to_string())));
        assert_eq!(*calls.lock(), 1);
        assert!(after_seen.lock().is_empty());
    }

    #[test]
    fn test_cancellation_mid_scan_stops_before_next_batch() {
        let table = create_test_table();
        let ctx = TaskContext::new();
        let seen = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&seen);
        let cancelling = callback(move |ctx, _batch| {
            *counter.lock() += 1;
            ctx.cancel();
            Ok(())
        });

        let result = table.iterator(&ctx, &[cancelling], vec![]);

        assert_eq!(result, Err(FrameError::Cancelled));
        assert_eq!(*seen.lock(), 1);
    }

    #[test]
    fn test_projection_is_pushed_into_batches() {
        let table = create_test_table();
        let names = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&names);
        let cb = callback(move |_ctx, batch| {
            let cols: Vec<String> = batch
                .schema()
                .fields()
                .iter()
                .map(|f| f.name.clone())
                .collect();
            sink.lock().push(cols);
            Ok(())
        });

        table
            .iterator(
                &TaskContext::new(),
                &[cb],
                vec![with_projection(["name"]), with_projection(["id"]), in_memory_only()],
            )
            .unwrap();

        let names = names.lock();
        assert_eq!(names.len(), 3);
        assert!(names.iter().all(|cols| cols == &["name", "id"]));
    }

    #[test]
    fn test_unknown_projection_fails_before_delivery() {
        let table = create_test_table();
        let (cb, seen) = recorder();

        let result = table.iterator(&TaskContext::new(), &[cb], vec![with_projection(["email"])]);

        assert_eq!(result, Err(FrameError::ColumnNotFound("email".to_string())));
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_view_pins_a_consistent_snapshot() {
        let table = create_test_table();
        let ctx = TaskContext::new();

        table
            .view(&ctx, &mut |txn_ctx, txn| {
                assert_eq!(txn_ctx.txn(), Some(txn));
                assert_eq!(count_rows(&table, txn_ctx), 6);

                table.append(batch_of(&[7, 8]))?;

                // The pinned version is unaffected by the concurrent write.
                assert_eq!(count_rows(&table, txn_ctx), 6);
                // A read outside the snapshot sees the new version.
                assert_eq!(count_rows(&table, &TaskContext::new()), 8);
                Ok(())
            })
            .unwrap();

        assert_eq!(table.active_snapshots(), 0);
        assert_eq!(count_rows(&table, &ctx), 8);
    }

    #[test]
    fn test_nested_views_see_their_own_versions() {
        let table = create_test_table();
        let ctx = TaskContext::new();

        table
            .view(&ctx, &mut |outer, _| {
                table.append(batch_of(&[10]))?;

                table.view(&ctx, &mut |inner, _| {
                    assert_eq!(count_rows(&table, inner), 7);
                    assert_eq!(table.active_snapshots(), 2);
                    Ok(())
                })?;

                assert_eq!(count_rows(&table, outer), 6);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_view_releases_snapshot_on_error() {
        let table = create_test_table();

        let result = table.view(&TaskContext::new(), &mut |_, _| {
            Err(FrameError::Execution("rollback".to_string()))
        });

        assert_eq!(result, Err(FrameError::Execution("rollback".to_string())));
        assert_eq!(table.active_snapshots(), 0);
    }

    #[test]
    fn test_view_on_cancelled_context_skips_closure() {
        let table = create_test_table();
        let ctx = TaskContext::new();
        ctx.cancel();
        let mut called = false;

        let result = table.view(&ctx, &mut |_, _| {
            called = true;
            Ok(())
        });

        assert_eq!(result, Err(FrameError::Cancelled));
        assert!(!called);
        assert_eq!(table.active_snapshots(), 0);
    }

    #[test]
    fn test_concurrent_views_get_distinct_transactions() {
        let table = create_test_table();
        let barrier = Barrier::new(2);
        let txns = Mutex::new(Vec::new());

        std::thread::scope(|scope| {
            for _ in 0..2 {
                scope.spawn(|| {
                    table
                        .view(&TaskContext::new(), &mut |ctx, txn| {
                            txns.lock().push(txn);
                            barrier.wait();
                            assert_eq!(count_rows(&table, ctx), 6);
                            Ok(())
                        })
                        .unwrap();
                });
            }
        });

        let txns = txns.lock();
        assert_eq!(txns.len(), 2);
        assert_ne!(txns[0], txns[1]);
        assert_eq!(table.active_snapshots(), 0);
    }

    #[test]
    fn test_closed_table_is_unavailable() {
        let table = create_test_table();
        table.close();

        let result = table.iterator(&TaskContext::new(), &[], vec![]);
        assert_eq!(result, Err(FrameError::SourceUnavailable("users".to_string())));

        let result = table.view(&TaskContext::new(), &mut |_, _| Ok(()));
        assert_eq!(result, Err(FrameError::SourceUnavailable("users".to_string())));
    }

    #[test]
    fn test_append_rejects_foreign_schema() {
        let table = create_test_table();
        let other = Schema::new(vec![Field::new("id", DataType::Int64)]).unwrap();
        let batch = Batch::try_new(other, vec![vec![Value::Int64(1)]]).unwrap();

        assert!(matches!(table.append(batch), Err(FrameError::SchemaMismatch(_))));
        assert_eq!(table.version(), 0);
        assert_eq!(table.num_batches(), 3);
    }
}

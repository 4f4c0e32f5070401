//! The contract a storage backend satisfies so plans can read from it.
//!
//! A [`TableReader`] exposes three things:
//!
//! - its [`Schema`], stable for the reader's lifetime,
//! - a scoped snapshot ([`TableReader::view`]) that pins one version of the
//!   data for the duration of a closure,
//! - push-based iteration ([`TableReader::iterator`]) delivering batches to
//!   callbacks until the source is exhausted or the context is cancelled.

use std::sync::Arc;

use crate::{
    common::error::Result,
    containers::{batch::Batch, schema::Schema},
};

pub mod context;
pub mod mem_table;

pub use context::TaskContext;
pub use mem_table::MemTable;

/// Identifier of a snapshot transaction opened by [`TableReader::view`].
pub type TxnId = u64;

/// Receives each batch produced by an iteration.
///
/// Returning an error stops the iteration, and the error is handed back to
/// the caller of [`TableReader::iterator`] unchanged.
pub type Callback = Arc<dyn Fn(&TaskContext, &Batch) -> Result<()> + Send + Sync>;

/// A single functional iteration option.
pub type IterOption = Box<dyn FnOnce(&mut IterOptions) + Send>;

/// Options for configuring [`TableReader::iterator`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IterOptions {
    /// Columns to deliver, in order. Empty means every column.
    pub projection: Vec<String>,

    /// Refuse work that would need I/O outside memory. Enforcement is up to
    /// the reader.
    pub in_memory_only: bool,
}

impl IterOptions {
    /// Folds `options` over the defaults, in order.
    pub fn from_options(options: Vec<IterOption>) -> Self {
        let mut opts = Self::default();
        for option in options {
            option(&mut opts);
        }
        opts
    }
}

/// Appends `columns` to the projection. Repeated calls accumulate.
pub fn with_projection<I, S>(columns: I) -> IterOption
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
    Box::new(move |opts: &mut IterOptions| opts.projection.extend(columns))
}

pub fn in_memory_only() -> IterOption {
    Box::new(|opts: &mut IterOptions| opts.in_memory_only = true)
}

/// Wraps a closure as a [`Callback`].
pub fn callback<F>(f: F) -> Callback
where
    F: Fn(&TaskContext, &Batch) -> Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// A source of columnar batches that plans read from.
pub trait TableReader: Send + Sync {
    /// The reader's full schema. Pure and stable.
    fn schema(&self) -> &Schema;

    /// Runs `f` against one consistent snapshot of the data.
    ///
    /// `f` receives a context bound to the snapshot's transaction; iterating
    /// with that context observes the pinned version even while writers
    /// publish new ones. The snapshot is released when `f` returns, whether
    /// it succeeded or not.
    fn view(
        &self,
        ctx: &TaskContext,
        f: &mut dyn FnMut(&TaskContext, TxnId) -> Result<()>,
    ) -> Result<()>;

    /// Pushes every batch, in scan order, to each of `callbacks`.
    ///
    /// Fails without invoking any callback when `ctx` is already cancelled.
    /// Cancellation is re-checked before each batch. The first callback error
    /// stops delivery and is returned verbatim.
    fn iterator(
        &self,
        ctx: &TaskContext,
        callbacks: &[Callback],
        options: Vec<IterOption>,
    ) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_options_accumulate() {
        let opts = IterOptions::from_options(vec![with_projection(["a"]), with_projection(["b"])]);
        assert_eq!(opts.projection, vec!["a".to_string(), "b".to_string()]);
        assert!(!opts.in_memory_only);
    }

    #[test]
    fn test_in_memory_only_flag() {
        let opts = IterOptions::from_options(vec![in_memory_only(), with_projection(["x", "y"])]);
        assert!(opts.in_memory_only);
        assert_eq!(opts.projection, vec!["x".to_string(), "y".to_string()]);
    }

    #[test]
    fn test_no_options_is_default() {
        assert_eq!(IterOptions::from_options(vec![]), IterOptions::default());
    }
}

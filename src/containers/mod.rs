pub mod batch;
pub mod schema;

pub use batch::{Batch, Row};
pub use schema::{Field, Schema};

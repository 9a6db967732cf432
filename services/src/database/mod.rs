//! Relational row storage behind the `Relational` data source variant.
//!
//! [`SqliteStore`] is the backend the binary runs on; [`MemoryStore`] keeps
//! rows in process for unit and integration tests.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, create_pool, open_pool};

use crate::error::StoreError;
use crate::table::{PageData, PageRequest, Row, Value};
use std::future::Future;

/// Table-name keyed access to relational rows.
///
/// Table and column names come from descriptors; implementations must reject
/// anything that is not a plain identifier.
pub trait RelationalStore: Clone + Send + Sync + 'static {
    fn is_connected(&self) -> impl Future<Output = bool> + Send;

    /// One page of `fields` from `table`, with the total count of matching rows.
    fn fetch_page(
        &self,
        table: &str,
        fields: &[String],
        request: &PageRequest,
    ) -> impl Future<Output = Result<PageData, StoreError>> + Send;

    /// Every row of `table` whose `key` equals one of `values`. Used for join lookups.
    fn fetch_where_in(
        &self,
        table: &str,
        key: &str,
        values: &[Value],
    ) -> impl Future<Output = Result<Vec<Row>, StoreError>> + Send;

    /// Inserts one row and returns its primary key.
    fn insert(
        &self,
        table: &str,
        primary_key: &str,
        values: &Row,
    ) -> impl Future<Output = Result<Value, StoreError>> + Send;

    /// Updates the row identified by `id`; returns the number of rows changed.
    fn update(
        &self,
        table: &str,
        primary_key: &str,
        id: &Value,
        values: &Row,
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;

    fn delete(
        &self,
        table: &str,
        primary_key: &str,
        ids: &[Value],
    ) -> impl Future<Output = Result<u64, StoreError>> + Send;
}

/// Validates a table or column name and returns it double-quoted.
pub(crate) fn quote_ident(name: &str) -> Result<String, StoreError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if valid_start && chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(format!("\"{name}\""))
    } else {
        Err(StoreError::InvalidIdentifier(name.to_owned()))
    }
}

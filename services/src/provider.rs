//! Request-time row retrieval for a resolved descriptor.

use crate::database::RelationalStore;
use crate::error::DataSourceError;
use crate::table::join::{join_keys, resolve_join};
use crate::table::{
    DataSource, FilterOperator, FilterPredicate, PageData, PageRequest, Row, TableDescriptor,
    fetch_or_empty,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// Loads rows for descriptors.
///
/// Every failure on the way (store error, custom source error or panic,
/// timeout) degrades to an empty page and is logged at `warn`.
#[derive(Clone)]
pub struct RowProvider<S> {
    store: S,
    timeout: Duration,
}

impl<S: RelationalStore> RowProvider<S> {
    pub fn new(store: S, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// One list page: rows from the data source, joins resolved, display columns projected.
    pub async fn list(&self, descriptor: &TableDescriptor, request: &PageRequest) -> PageData {
        let fields = descriptor.stored_fields();
        let mut page = self
            .load(descriptor.name(), descriptor.data_source(), &fields, request)
            .await;
        self.finish_rows(descriptor, &mut page.rows).await;
        page
    }

    /// The row whose primary key equals `id`, read through the detail source.
    pub async fn detail(&self, descriptor: &TableDescriptor, id: &str) -> Option<Row> {
        let mut rows = self.read_by_pk(descriptor, id).await;
        self.finish_rows(descriptor, &mut rows).await;
        rows.into_iter().next()
    }

    /// The stored values of the row whose primary key equals `id`, without joins or display
    /// projections. Edit forms are filled from this so a resubmission round-trips.
    pub async fn raw_detail(&self, descriptor: &TableDescriptor, id: &str) -> Option<Row> {
        self.read_by_pk(descriptor, id).await.into_iter().next()
    }

    async fn read_by_pk(&self, descriptor: &TableDescriptor, id: &str) -> Vec<Row> {
        let request = PageRequest::single().with_filter(FilterPredicate::new(
            &descriptor.primary_key().name,
            FilterOperator::Eq,
            id,
        ));
        let fields = descriptor.stored_fields();
        self.load(descriptor.name(), descriptor.detail_source(), &fields, &request)
            .await
            .rows
    }

    async fn load(
        &self,
        name: &str,
        source: &DataSource,
        fields: &[String],
        request: &PageRequest,
    ) -> PageData {
        let result = match source {
            DataSource::Relational { table } => {
                match timeout(self.timeout, self.store.fetch_page(table, fields, request)).await {
                    Ok(Ok(page)) => Ok(page),
                    Ok(Err(e)) => Err(DataSourceError::Failed(e.to_string())),
                    Err(_) => Err(DataSourceError::Timeout(self.timeout)),
                }
            }
            DataSource::Custom(custom) => {
                let custom = Arc::clone(custom);
                let request = request.clone();
                // A timed-out task keeps running on the blocking pool; its result is dropped.
                let task =
                    tokio::task::spawn_blocking(move || fetch_or_empty(custom.as_ref(), &request));
                match timeout(self.timeout, task).await {
                    Ok(Ok(page)) => Ok(page),
                    Ok(Err(e)) => Err(DataSourceError::Panicked(e.to_string())),
                    Err(_) => Err(DataSourceError::Timeout(self.timeout)),
                }
            }
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(
                table = name,
                page = request.page,
                page_size = request.page_size,
                error = %e,
                "Data source failed, serving an empty page"
            );
            PageData::empty()
        })
    }

    async fn finish_rows(&self, descriptor: &TableDescriptor, rows: &mut [Row]) {
        if rows.is_empty() {
            return;
        }

        for group in descriptor.join_groups() {
            let keys = join_keys(rows, &group.join);
            let lookup = self
                .store
                .fetch_where_in(&group.join.table, &group.join.join_field, &keys);
            let foreign = match timeout(self.timeout, lookup).await {
                Ok(Ok(foreign)) => foreign,
                Ok(Err(e)) => {
                    tracing::warn!(
                        table = descriptor.name(),
                        join = %group.join.table,
                        error = %e,
                        "Join lookup failed"
                    );
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!(
                        table = descriptor.name(),
                        join = %group.join.table,
                        "Join lookup timed out"
                    );
                    Vec::new()
                }
            };
            resolve_join(rows, &group.join, &group.fields, &foreign);
        }

        for row in rows.iter_mut() {
            for column in descriptor.columns() {
                column.project(row);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::table::{ColumnSpec, DataType, Join, TableBuilder, Value, row_from};

    fn provider(store: MemoryStore) -> RowProvider<MemoryStore> {
        RowProvider::new(store, Duration::from_millis(200))
    }

    fn posts_store() -> MemoryStore {
        MemoryStore::new()
            .with_table(
                "posts",
                vec![
                    row_from([("id", Value::Int(1)), ("author_id", Value::Int(1))]),
                    row_from([("id", Value::Int(2)), ("author_id", Value::Int(7))]),
                ],
            )
            .with_table(
                "authors",
                vec![row_from([
                    ("id", Value::Int(1)),
                    ("first_name", Value::from("Ada")),
                    ("last_name", Value::from("Lovelace")),
                ])],
            )
    }

    fn posts() -> TableDescriptor {
        let join = Join::new("author_id", "id", "authors");
        TableBuilder::new("posts")
            .primary_key("id", DataType::Int)
            .data_source(DataSource::relational("posts"))
            .column(ColumnSpec::new("Id", "id", DataType::Int).sortable())
            .column(ColumnSpec::new("Author", "author_id", DataType::Int))
            .column(
                ColumnSpec::new("First", "first_name", DataType::Varchar)
                    .join(join.clone())
                    .hide(),
            )
            .column(
                ColumnSpec::new("Last", "last_name", DataType::Varchar)
                    .join(join)
                    .hide(),
            )
            .column(ColumnSpec::computed("Name", "name", |_, row| {
                let first = row.get("authors_joined_first_name").cloned().unwrap_or_default();
                let last = row.get("authors_joined_last_name").cloned().unwrap_or_default();
                Value::from(format!("{first} {last}").trim().to_owned())
            }))
            .build()
            .unwrap()
    }

    fn custom(source: DataSource) -> TableDescriptor {
        TableBuilder::new("external")
            .primary_key("id", DataType::Int)
            .data_source(source)
            .column(ColumnSpec::new("Id", "id", DataType::Int))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn list_resolves_joins_then_projects() {
        let request = PageRequest::default().sorted_by("id", crate::table::SortDirection::Asc);
        let page = provider(posts_store()).list(&posts(), &request).await;

        assert_eq!(page.total, 2);
        assert_eq!(page.rows[0]["authors_joined_first_name"], Value::from("Ada"));
        assert_eq!(page.rows[0]["name"], Value::from("Ada Lovelace"));
        assert_eq!(page.rows[1]["authors_joined_first_name"], Value::from(""));
        assert_eq!(page.rows[1]["name"], Value::from(""));
    }

    #[tokio::test]
    async fn detail_filters_on_primary_key() {
        let row = provider(posts_store()).detail(&posts(), "2").await.unwrap();
        assert_eq!(row["author_id"], Value::Int(7));
        assert!(provider(posts_store()).detail(&posts(), "42").await.is_none());
    }

    #[tokio::test]
    async fn raw_detail_keeps_stored_values() {
        let store = MemoryStore::new().with_table(
            "users",
            vec![row_from([("id", Value::Int(2)), ("gender", Value::Int(1))])],
        );
        let users = TableBuilder::new("users")
            .primary_key("id", DataType::Int)
            .data_source(DataSource::relational("users"))
            .column(ColumnSpec::new("Id", "id", DataType::Int))
            .column(
                ColumnSpec::new("Gender", "gender", DataType::Tinyint).display(|value, _| {
                    Value::from(if *value == Value::Int(1) { "women" } else { "men" })
                }),
            )
            .build()
            .unwrap();
        let provider = provider(store);

        let shown = provider.detail(&users, "2").await.unwrap();
        assert_eq!(shown["gender"], Value::from("women"));
        let raw = provider.raw_detail(&users, "2").await.unwrap();
        assert_eq!(raw["gender"], Value::Int(1));
        assert!(provider.raw_detail(&users, "3").await.is_none());
    }

    #[tokio::test]
    async fn store_errors_degrade_to_empty_page() {
        let page = provider(MemoryStore::new())
            .list(&posts(), &PageRequest::default())
            .await;
        assert_eq!(page, PageData::empty());
    }

    fn panics_on_second_page(request: &PageRequest) -> Result<PageData, DataSourceError> {
        assert!(!(request.page == 2 && request.page_size == 20), "page two is broken");
        Ok(PageData::new(vec![row_from([("id", Value::Int(1))])], 1))
    }

    #[tokio::test]
    async fn panicking_custom_source_degrades_to_empty_page() {
        let descriptor = custom(DataSource::custom(panics_on_second_page));
        let provider = provider(MemoryStore::new());

        let page = provider.list(&descriptor, &PageRequest::new(2, 20)).await;
        assert_eq!(page.rows.len(), 0);
        assert_eq!(page.total, 0);

        let page = provider.list(&descriptor, &PageRequest::new(1, 20)).await;
        assert_eq!(page.total, 1);
    }

    fn sleepy(_: &PageRequest) -> Result<PageData, DataSourceError> {
        std::thread::sleep(Duration::from_secs(1));
        Ok(PageData::new(vec![row_from([("id", Value::Int(1))])], 1))
    }

    #[tokio::test]
    async fn slow_custom_source_times_out() {
        let page = provider(MemoryStore::new())
            .list(&custom(DataSource::custom(sleepy)), &PageRequest::default())
            .await;
        assert_eq!(page, PageData::empty());
    }
}

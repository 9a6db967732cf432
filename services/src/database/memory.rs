use super::RelationalStore;
use crate::error::StoreError;
use crate::table::{PageData, PageRequest, Row, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// In-process implementation of [`RelationalStore`].
#[derive(Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<BTreeMap<String, Vec<Row>>>>,
    connected: bool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            tables: Arc::default(),
            connected: true,
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that reports itself unreachable to the health check.
    pub fn disconnected() -> Self {
        Self {
            connected: false,
            ..Self::default()
        }
    }

    pub fn with_table(self, name: impl Into<String>, rows: Vec<Row>) -> Self {
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.into(), rows);
        self
    }

    /// Snapshot of every row in `table`.
    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(table)
            .cloned()
            .unwrap_or_default()
    }
}

impl RelationalStore for MemoryStore {
    async fn is_connected(&self) -> bool {
        self.connected
    }

    async fn fetch_page(
        &self,
        table: &str,
        fields: &[String],
        request: &PageRequest,
    ) -> Result<PageData, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_owned()))?;

        let mut page = request.apply(rows.iter().cloned());
        for row in &mut page.rows {
            row.retain(|field, _| fields.contains(field));
        }
        Ok(page)
    }

    async fn fetch_where_in(
        &self,
        table: &str,
        key: &str,
        values: &[Value],
    ) -> Result<Vec<Row>, StoreError> {
        let tables = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_owned()))?;

        Ok(rows
            .iter()
            .filter(|row| {
                row.get(key)
                    .is_some_and(|cell| values.iter().any(|v| v.matches_key(cell)))
            })
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        table: &str,
        primary_key: &str,
        values: &Row,
    ) -> Result<Value, StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_owned()))?;

        let id = match values.get(primary_key) {
            Some(id) if !id.is_null() => id.clone(),
            _ => {
                let next = rows
                    .iter()
                    .filter_map(|row| row.get(primary_key).and_then(Value::as_i64))
                    .max()
                    .unwrap_or(0)
                    + 1;
                Value::Int(next)
            }
        };

        let mut row = values.clone();
        row.insert(primary_key.to_owned(), id.clone());
        rows.push(row);
        Ok(id)
    }

    async fn update(
        &self,
        table: &str,
        primary_key: &str,
        id: &Value,
        values: &Row,
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_owned()))?;

        let mut affected = 0;
        for row in rows
            .iter_mut()
            .filter(|row| row.get(primary_key).is_some_and(|key| key.matches_key(id)))
        {
            row.extend(values.iter().map(|(field, value)| (field.clone(), value.clone())));
            affected += 1;
        }
        Ok(affected)
    }

    async fn delete(
        &self,
        table: &str,
        primary_key: &str,
        ids: &[Value],
    ) -> Result<u64, StoreError> {
        let mut tables = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| StoreError::UnknownTable(table.to_owned()))?;

        let before = rows.len();
        rows.retain(|row| {
            !row.get(primary_key)
                .is_some_and(|key| ids.iter().any(|id| id.matches_key(key)))
        });
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::row_from;

    fn store() -> MemoryStore {
        MemoryStore::new().with_table(
            "authors",
            vec![
                row_from([("id", Value::Int(1)), ("first_name", Value::from("Ada"))]),
                row_from([("id", Value::Int(2)), ("first_name", Value::from("Grace"))]),
            ],
        )
    }

    #[tokio::test]
    async fn insert_assigns_next_integer_key() {
        let store = store();
        let id = store
            .insert("authors", "id", &row_from([("first_name", "Linus")]))
            .await
            .unwrap();
        assert_eq!(id, Value::Int(3));
        assert_eq!(store.rows("authors").len(), 3);
    }

    #[tokio::test]
    async fn update_and_delete_match_keys_across_types() {
        let store = store();
        let changed = store
            .update(
                "authors",
                "id",
                &Value::from("2"),
                &row_from([("first_name", "Hopper")]),
            )
            .await
            .unwrap();
        assert_eq!(changed, 1);
        assert_eq!(store.rows("authors")[1]["first_name"], Value::from("Hopper"));

        let deleted = store
            .delete("authors", "id", &[Value::from("1"), Value::Int(9)])
            .await
            .unwrap();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn fetch_page_projects_requested_fields() {
        let page = store()
            .fetch_page("authors", &["id".to_owned()], &PageRequest::default())
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert!(page.rows.iter().all(|row| row.len() == 1));
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let result = store().fetch_where_in("ghosts", "id", &[Value::Int(1)]).await;
        assert!(matches!(result, Err(StoreError::UnknownTable(_))));
    }
}

use super::{RelationalStore, quote_ident};
use crate::config::Config;
use crate::error::StoreError;
use crate::table::{FilterOperator, FilterPredicate, PageData, PageRequest, Row, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, QueryBuilder, Row as _, Sqlite, TypeInfo, ValueRef};
use std::str::FromStr;

/// Opens the configured SQLite database and applies the embedded migrations.
pub async fn create_pool(config: &Config) -> anyhow::Result<SqlitePool> {
    let pool = open_pool(config.database_url(), 5).await?;

    tracing::info!("Database connection pool established");

    Ok(pool)
}

/// Opens a pool on `url` and runs the migrations under `migrations/`.
///
/// An in-memory database lives only as long as its connection, so
/// `sqlite::memory:` pools should use a single connection that never expires.
pub async fn open_pool(url: &str, max_connections: u32) -> Result<SqlitePool, StoreError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
    if url.contains(":memory:") {
        pool_options = pool_options.idle_timeout(None).max_lifetime(None);
    }
    let pool = pool_options.connect_with(options).await?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(sqlx::Error::from)?;

    Ok(pool)
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl RelationalStore for SqliteStore {
    async fn is_connected(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    async fn fetch_page(
        &self,
        table: &str,
        fields: &[String],
        request: &PageRequest,
    ) -> Result<PageData, StoreError> {
        let table = quote_ident(table)?;
        let columns = fields
            .iter()
            .map(|field| quote_ident(field))
            .collect::<Result<Vec<_>, _>>()?
            .join(", ");

        let mut count = QueryBuilder::<Sqlite>::new(format!("SELECT COUNT(*) FROM {table}"));
        push_filters(&mut count, &request.filters)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Sqlite>::new(format!("SELECT {columns} FROM {table}"));
        push_filters(&mut select, &request.filters)?;
        if let Some(field) = &request.sort_field {
            select.push(format!(
                " ORDER BY {} {}",
                quote_ident(field)?,
                request.sort_direction.as_sql()
            ));
        }
        select
            .push(" LIMIT ")
            .push_bind(i64::from(request.page_size))
            .push(" OFFSET ")
            .push_bind(i64::try_from(request.offset()).unwrap_or(i64::MAX));

        let rows = select.build().fetch_all(&self.pool).await?;
        let rows = rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(%table, rows = rows.len(), total, "Fetched page");

        Ok(PageData::new(rows, u64::try_from(total).unwrap_or_default()))
    }

    async fn fetch_where_in(
        &self,
        table: &str,
        key: &str,
        values: &[Value],
    ) -> Result<Vec<Row>, StoreError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        let table = quote_ident(table)?;
        let key = quote_ident(key)?;

        let mut select =
            QueryBuilder::<Sqlite>::new(format!("SELECT * FROM {table} WHERE {key} IN ("));
        push_value_list(&mut select, values);
        select.push(")");

        let rows = select.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().map(decode_row).collect::<Result<Vec<_>, _>>()?)
    }

    async fn insert(
        &self,
        table: &str,
        primary_key: &str,
        values: &Row,
    ) -> Result<Value, StoreError> {
        let quoted_table = quote_ident(table)?;
        let mut insert = if values.is_empty() {
            QueryBuilder::<Sqlite>::new(format!("INSERT INTO {quoted_table} DEFAULT VALUES"))
        } else {
            let columns = values
                .keys()
                .map(|field| quote_ident(field))
                .collect::<Result<Vec<_>, _>>()?
                .join(", ");
            let mut builder = QueryBuilder::<Sqlite>::new(format!(
                "INSERT INTO {quoted_table} ({columns}) VALUES ("
            ));
            push_value_list(&mut builder, values.values());
            builder.push(")");
            builder
        };

        let result = insert.build().execute(&self.pool).await?;
        let id = values
            .get(primary_key)
            .filter(|id| !id.is_null())
            .cloned()
            .unwrap_or(Value::Int(result.last_insert_rowid()));

        tracing::info!(table, id = %id, "Inserted row");

        Ok(id)
    }

    async fn update(
        &self,
        table: &str,
        primary_key: &str,
        id: &Value,
        values: &Row,
    ) -> Result<u64, StoreError> {
        if values.is_empty() {
            return Ok(0);
        }
        let quoted_table = quote_ident(table)?;
        let key = quote_ident(primary_key)?;

        let mut update = QueryBuilder::<Sqlite>::new(format!("UPDATE {quoted_table} SET "));
        for (index, (field, value)) in values.iter().enumerate() {
            if index > 0 {
                update.push(", ");
            }
            update.push(format!("{} = ", quote_ident(field)?));
            push_value(&mut update, value);
        }
        update.push(format!(" WHERE {key} = "));
        push_value(&mut update, id);

        let affected = update.build().execute(&self.pool).await?.rows_affected();

        tracing::info!(table, id = %id, affected, "Updated row");

        Ok(affected)
    }

    async fn delete(
        &self,
        table: &str,
        primary_key: &str,
        ids: &[Value],
    ) -> Result<u64, StoreError> {
        if ids.is_empty() {
            return Ok(0);
        }
        let quoted_table = quote_ident(table)?;
        let key = quote_ident(primary_key)?;

        let mut delete =
            QueryBuilder::<Sqlite>::new(format!("DELETE FROM {quoted_table} WHERE {key} IN ("));
        push_value_list(&mut delete, ids);
        delete.push(")");

        let affected = delete.build().execute(&self.pool).await?.rows_affected();

        tracing::info!(table, affected, "Deleted rows");

        Ok(affected)
    }
}

fn push_filters(
    builder: &mut QueryBuilder<'_, Sqlite>,
    filters: &[FilterPredicate],
) -> Result<(), StoreError> {
    for (index, filter) in filters.iter().enumerate() {
        builder.push(if index == 0 { " WHERE " } else { " AND " });
        let column = quote_ident(&filter.field)?;

        let comparison = match filter.operator {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "<>",
            FilterOperator::Gt => ">",
            FilterOperator::Ge => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Le => "<=",
            FilterOperator::Like => {
                builder
                    .push(format!("{column} LIKE "))
                    .push_bind(like_pattern(&filter.value))
                    .push(" ESCAPE '\\'");
                continue;
            }
            FilterOperator::Range => {
                push_range(builder, &column, filter);
                continue;
            }
        };
        builder
            .push(format!("{column} {comparison} "))
            .push_bind(filter.value.clone());
    }
    Ok(())
}

/// Substring pattern matching `value` literally; `%`, `_` and `\` are escaped.
fn like_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

fn push_range(builder: &mut QueryBuilder<'_, Sqlite>, column: &str, filter: &FilterPredicate) {
    let lower = Some(filter.value.as_str()).filter(|v| !v.is_empty());
    let upper = filter.upper.as_deref().filter(|v| !v.is_empty());
    match (lower, upper) {
        (Some(lower), Some(upper)) => {
            builder
                .push(format!("({column} >= "))
                .push_bind(lower.to_owned())
                .push(format!(" AND {column} <= "))
                .push_bind(upper.to_owned())
                .push(")");
        }
        (Some(lower), None) => {
            builder.push(format!("{column} >= ")).push_bind(lower.to_owned());
        }
        (None, Some(upper)) => {
            builder.push(format!("{column} <= ")).push_bind(upper.to_owned());
        }
        (None, None) => {
            builder.push("1 = 1");
        }
    }
}

fn push_value_list<'v, I>(builder: &mut QueryBuilder<'_, Sqlite>, values: I)
where
    I: IntoIterator<Item = &'v Value>,
{
    for (index, value) in values.into_iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        push_value(builder, value);
    }
}

fn push_value(builder: &mut QueryBuilder<'_, Sqlite>, value: &Value) {
    match value {
        Value::Null => builder.push_bind(None::<String>),
        Value::Bool(flag) => builder.push_bind(*flag),
        Value::Int(number) => builder.push_bind(*number),
        Value::Float(number) => builder.push_bind(*number),
        Value::Text(text) => builder.push_bind(text.clone()),
    };
}

/// Decodes by the storage class of each value, so declared column types do not matter.
fn decode_row(row: &SqliteRow) -> Result<Row, sqlx::Error> {
    let mut decoded = Row::new();
    for column in row.columns() {
        let index = column.ordinal();
        let raw = row.try_get_raw(index)?;
        let value = if raw.is_null() {
            Value::Null
        } else {
            match raw.type_info().name() {
                "INTEGER" | "BOOLEAN" => Value::Int(row.try_get_unchecked::<i64, _>(index)?),
                "REAL" => Value::Float(row.try_get_unchecked::<f64, _>(index)?),
                "BLOB" => {
                    let bytes = row.try_get_unchecked::<Vec<u8>, _>(index)?;
                    Value::Text(String::from_utf8_lossy(&bytes).into_owned())
                }
                _ => Value::Text(row.try_get_unchecked::<String, _>(index)?),
            }
        };
        decoded.insert(column.name().to_owned(), value);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::{SortDirection, row_from};

    async fn store() -> SqliteStore {
        SqliteStore::new(open_pool("sqlite::memory:", 1).await.unwrap())
    }

    #[tokio::test]
    async fn migrations_seed_demo_tables() {
        let store = store().await;
        assert!(store.is_connected().await);

        let fields = ["id".to_owned(), "title".to_owned(), "author_id".to_owned()];
        let page = store
            .fetch_page("posts", &fields, &PageRequest::new(1, 10))
            .await
            .unwrap();
        assert!(page.total > 0);
        assert!(page.rows[0].contains_key("author_id"));
    }

    #[tokio::test]
    async fn insert_update_delete_round() {
        let store = store().await;
        let id = store
            .insert(
                "authors",
                "id",
                &row_from([
                    ("first_name", Value::from("Ada")),
                    ("last_name", Value::from("Lovelace")),
                    ("email", Value::from("ada@example.com")),
                ]),
            )
            .await
            .unwrap();
        assert!(matches!(id, Value::Int(_)));

        let changed = store
            .update(
                "authors",
                "id",
                &id,
                &row_from([("email", Value::from("ada@analytical.engine"))]),
            )
            .await
            .unwrap();
        assert_eq!(changed, 1);

        let found = store
            .fetch_where_in("authors", "id", std::slice::from_ref(&id))
            .await
            .unwrap();
        assert_eq!(found[0]["email"], Value::from("ada@analytical.engine"));

        let deleted = store.delete("authors", "id", &[id]).await.unwrap();
        assert_eq!(deleted, 1);
    }

    #[tokio::test]
    async fn range_and_sort_are_applied_in_sql() {
        let store = store().await;
        let request = PageRequest::new(1, 10)
            .sorted_by("id", SortDirection::Asc)
            .with_filter(FilterPredicate::range("id", "2", "3"));
        let page = store
            .fetch_page("authors", &["id".to_owned()], &request)
            .await
            .unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.rows[0]["id"], Value::Int(2));
        assert_eq!(page.rows[1]["id"], Value::Int(3));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ja"), "%ja%");
        assert_eq!(like_pattern("a_b%c\\d"), "%a\\_b\\%c\\\\d%");
    }

    #[tokio::test]
    async fn like_filter_treats_wildcards_literally() {
        let store = store().await;
        for name in ["grace_x", "gracexx"] {
            store
                .insert("authors", "id", &row_from([("first_name", Value::from(name))]))
                .await
                .unwrap();
        }

        let request = PageRequest::new(1, 10).with_filter(FilterPredicate::new(
            "first_name",
            FilterOperator::Like,
            "e_x",
        ));
        let page = store
            .fetch_page("authors", &["first_name".to_owned()], &request)
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0]["first_name"], Value::from("grace_x"));
        assert!(request.filters[0].matches(&page.rows[0]));
    }

    #[tokio::test]
    async fn unknown_table_is_an_error() {
        let store = store().await;
        let result = store
            .fetch_page("ghosts", &["id".to_owned()], &PageRequest::default())
            .await;
        assert!(matches!(result, Err(StoreError::Db(_))));
    }
}

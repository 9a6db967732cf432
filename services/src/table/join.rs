//! Resolution of joined columns against rows of a foreign table.

use super::column::{ColumnSpec, Join};
use super::value::{Row, Value};

/// Joined columns sharing one relationship, resolved with a single foreign lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinGroup {
    pub join: Join,
    pub fields: Vec<String>,
}

/// Groups joined columns by relationship, preserving declaration order.
pub fn join_groups<'a, I>(columns: I) -> Vec<JoinGroup>
where
    I: IntoIterator<Item = &'a ColumnSpec>,
{
    let mut groups: Vec<JoinGroup> = Vec::new();
    for column in columns {
        let Some(join) = &column.join else {
            continue;
        };
        match groups.iter_mut().find(|group| &group.join == join) {
            Some(group) => group.fields.push(column.field.clone()),
            None => groups.push(JoinGroup {
                join: join.clone(),
                fields: vec![column.field.clone()],
            }),
        }
    }
    groups
}

/// Distinct, non-null local key values of `join.field` across `rows`.
pub fn join_keys(rows: &[Row], join: &Join) -> Vec<Value> {
    let mut keys: Vec<Value> = Vec::new();
    for key in rows.iter().filter_map(|row| row.get(&join.field)) {
        if !key.is_null() && !keys.iter().any(|k| k.matches_key(key)) {
            keys.push(key.clone());
        }
    }
    keys
}

/// Copies `fields` from the matching foreign row into `{table}_joined_{field}`.
///
/// A row without a matching foreign row, or a foreign row missing the field,
/// gets an empty string.
pub fn resolve_join(rows: &mut [Row], join: &Join, fields: &[String], foreign: &[Row]) {
    for row in rows.iter_mut() {
        let matched = row.get(&join.field).and_then(|key| {
            foreign.iter().find(|candidate| {
                candidate
                    .get(&join.join_field)
                    .is_some_and(|foreign_key| foreign_key.matches_key(key))
            })
        });

        for field in fields {
            let value = matched
                .and_then(|foreign_row| foreign_row.get(field))
                .cloned()
                .unwrap_or_else(|| Value::Text(String::new()));
            row.insert(join.projected_field(field), value);
        }
    }
}

//! List-view column specifications.

use super::filter::FilterOperator;
use super::value::{DataType, Row, Value};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Projection applied to a cell after joins are resolved: `(cell, whole row) -> shown value`.
pub type DisplayFn = Arc<dyn Fn(&Value, &Row) -> Value + Send + Sync>;

/// A value/label pair used by select boxes, radios and filter choices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub selected: bool,
}

impl FieldOption {
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
            selected: false,
        }
    }

    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

/// Foreign-key relationship of a joined column.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Join {
    /// Local column holding the key, e.g. `author_id`.
    pub field: String,
    /// Column of the foreign table the key points at, e.g. `id`.
    pub join_field: String,
    /// Foreign table, e.g. `authors`.
    pub table: String,
}

impl Join {
    pub fn new(
        field: impl Into<String>,
        join_field: impl Into<String>,
        table: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            join_field: join_field.into(),
            table: table.into(),
        }
    }

    /// Row key a joined value lands in: `{table}_joined_{field}`.
    pub fn projected_field(&self, field: &str) -> String {
        format!("{}_joined_{}", self.table, field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EditType {
    Text,
    Textarea,
    Switch,
    Datetime,
    Select,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterSpec {
    pub operator: FilterOperator,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditSpec {
    pub edit_type: EditType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
}

#[derive(Clone, Serialize)]
pub struct ColumnSpec {
    pub label: String,
    pub field: String,
    pub data_type: DataType,
    pub sortable: bool,
    pub hidden: bool,
    /// Has no storage field; the value comes only from `display`.
    pub computed: bool,
    pub filter: Option<FilterSpec>,
    pub edit: Option<EditSpec>,
    pub join: Option<Join>,
    #[serde(skip)]
    pub display: Option<DisplayFn>,
}

impl fmt::Debug for ColumnSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnSpec")
            .field("label", &self.label)
            .field("field", &self.field)
            .field("data_type", &self.data_type)
            .field("sortable", &self.sortable)
            .field("hidden", &self.hidden)
            .field("computed", &self.computed)
            .field("filter", &self.filter)
            .field("edit", &self.edit)
            .field("join", &self.join)
            .field("display", &self.display.is_some())
            .finish()
    }
}

impl ColumnSpec {
    pub fn new(label: impl Into<String>, field: impl Into<String>, data_type: DataType) -> Self {
        Self {
            label: label.into(),
            field: field.into(),
            data_type,
            sortable: false,
            hidden: false,
            computed: false,
            filter: None,
            edit: None,
            join: None,
            display: None,
        }
    }

    /// A column with no backing storage field.
    pub fn computed<F>(label: impl Into<String>, field: impl Into<String>, display: F) -> Self
    where
        F: Fn(&Value, &Row) -> Value + Send + Sync + 'static,
    {
        Self {
            computed: true,
            ..Self::new(label, field, DataType::Varchar)
        }
        .display(display)
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self, operator: FilterOperator) -> Self {
        self.filter = Some(FilterSpec {
            operator,
            options: Vec::new(),
        });
        self
    }

    /// Choices shown in the filter form; implies an `eq` filter when none was declared.
    pub fn filter_options(mut self, options: Vec<FieldOption>) -> Self {
        let filter = self.filter.get_or_insert(FilterSpec {
            operator: FilterOperator::Eq,
            options: Vec::new(),
        });
        filter.options = options;
        self
    }

    pub fn editable(mut self, edit_type: EditType) -> Self {
        self.edit = Some(EditSpec {
            edit_type,
            options: Vec::new(),
        });
        self
    }

    pub fn edit_options(mut self, options: Vec<FieldOption>) -> Self {
        if let Some(edit) = self.edit.as_mut() {
            edit.options = options;
        }
        self
    }

    pub fn hide(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn join(mut self, join: Join) -> Self {
        self.join = Some(join);
        self
    }

    pub fn display<F>(mut self, display: F) -> Self
    where
        F: Fn(&Value, &Row) -> Value + Send + Sync + 'static,
    {
        self.display = Some(Arc::new(display));
        self
    }

    pub fn is_filterable(&self) -> bool {
        self.filter.is_some()
    }

    pub fn is_editable(&self) -> bool {
        self.edit.is_some()
    }

    pub fn is_joined(&self) -> bool {
        self.join.is_some()
    }

    /// Whether the store holds this column directly in the descriptor's table.
    pub fn is_stored(&self) -> bool {
        !self.computed && self.join.is_none()
    }

    /// Row key holding this column's raw value.
    pub fn value_key(&self) -> String {
        match &self.join {
            Some(join) => join.projected_field(&self.field),
            None => self.field.clone(),
        }
    }

    /// Applies the display projection, if any, to one row in place.
    pub fn project(&self, row: &mut Row) {
        let Some(display) = &self.display else {
            return;
        };
        let cell = row.get(&self.value_key()).cloned().unwrap_or_default();
        let shown = display(&cell, row);
        row.insert(self.field.clone(), shown);
    }
}

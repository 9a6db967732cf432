//! The immutable table descriptor and the construction-scoped builder that validates it.

use super::action::ActionSpec;
use super::column::ColumnSpec;
use super::data_source::DataSource;
use super::filter::{FilterOperator, FilterPredicate};
use super::form::{FormFieldSpec, FormTabs, PostHook};
use super::join::{JoinGroup, join_groups};
use super::page::{
    DEFAULT_PAGE_SIZE, PAGE_PARAM, PAGE_SIZE_PARAM, PageRequest, SORT_PARAM, SORT_TYPE_PARAM,
    SortDirection,
};
use super::value::{DataType, Row};
use crate::error::DescriptorError;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_PRIMARY_KEY: &str = "id";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrimaryKey {
    pub name: String,
    pub data_type: DataType,
}

impl PrimaryKey {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

impl Default for PrimaryKey {
    fn default() -> Self {
        Self::new(DEFAULT_PRIMARY_KEY, DataType::Int)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub can_add: bool,
    pub editable: bool,
    pub deletable: bool,
    pub exportable: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_add: true,
            editable: true,
            deletable: true,
            exportable: false,
        }
    }
}

/// Everything the admin views need to know about one table.
///
/// Only [`TableBuilder::build`] creates one, so every instance satisfies the
/// structural invariants checked there.
#[derive(Clone)]
pub struct TableDescriptor {
    name: String,
    title: String,
    description: String,
    primary_key: PrimaryKey,
    columns: Vec<ColumnSpec>,
    form_fields: Vec<FormFieldSpec>,
    data_source: DataSource,
    detail_source: Option<DataSource>,
    actions: Vec<ActionSpec>,
    capabilities: Capabilities,
    form_tabs: Option<FormTabs>,
    post_hook: Option<PostHook>,
}

impl fmt::Debug for TableDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableDescriptor")
            .field("name", &self.name)
            .field("primary_key", &self.primary_key)
            .field("columns", &self.columns)
            .field("form_fields", &self.form_fields)
            .field("data_source", &self.data_source)
            .field("actions", &self.actions)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

impl TableDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn primary_key(&self) -> &PrimaryKey {
        &self.primary_key
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    pub fn column(&self, field: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    pub fn form_fields(&self) -> &[FormFieldSpec] {
        &self.form_fields
    }

    pub fn form_field(&self, field: &str) -> Option<&FormFieldSpec> {
        self.form_fields.iter().find(|f| f.field == field)
    }

    pub fn data_source(&self) -> &DataSource {
        &self.data_source
    }

    /// Source for the detail view; falls back to the list source.
    pub fn detail_source(&self) -> &DataSource {
        self.detail_source.as_ref().unwrap_or(&self.data_source)
    }

    pub fn actions(&self) -> &[ActionSpec] {
        &self.actions
    }

    pub fn action(&self, id: &str) -> Option<&ActionSpec> {
        self.actions.iter().find(|a| a.id == id)
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn form_tabs(&self) -> Option<&FormTabs> {
        self.form_tabs.as_ref()
    }

    /// Runs the post hook, if any. Failures are logged; the write already happened.
    pub fn run_post_hook(&self, values: &Row) {
        if let Some(hook) = &self.post_hook
            && let Err(message) = hook(values)
        {
            tracing::warn!(table = %self.name, %message, "Form post hook failed");
        }
    }

    /// Fields to read from the backing table: stored columns plus join keys, primary key first.
    pub fn stored_fields(&self) -> Vec<String> {
        let mut fields = vec![self.primary_key.name.clone()];
        let stored = self
            .columns
            .iter()
            .filter(|c| c.is_stored())
            .map(|c| c.field.clone());
        let join_keys = self
            .columns
            .iter()
            .filter_map(|c| c.join.as_ref())
            .map(|j| j.field.clone());
        for field in stored.chain(join_keys) {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }

    pub fn join_groups(&self) -> Vec<JoinGroup> {
        join_groups(&self.columns)
    }

    /// Normalizes list-view query parameters into a [`PageRequest`].
    ///
    /// Only sortable columns can be sorted on (otherwise the primary key is used) and
    /// only filterable columns produce predicates, each carrying the column's operator
    /// and the raw parameter value.
    pub fn page_request(&self, params: &HashMap<String, String>) -> PageRequest {
        let page = params
            .get(PAGE_PARAM)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(1);
        let page_size = params
            .get(PAGE_SIZE_PARAM)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(DEFAULT_PAGE_SIZE);
        let sort_field = params
            .get(SORT_PARAM)
            .filter(|field| self.column(field).is_some_and(|c| c.sortable))
            .cloned()
            .unwrap_or_else(|| self.primary_key.name.clone());
        let direction = params
            .get(SORT_TYPE_PARAM)
            .and_then(|raw| SortDirection::parse(raw))
            .unwrap_or_default();

        let mut request = PageRequest::new(page, page_size).sorted_by(sort_field, direction);

        for column in &self.columns {
            let Some(filter) = &column.filter else {
                continue;
            };
            if filter.operator == FilterOperator::Range {
                let start = params
                    .get(&format!("{}_start", column.field))
                    .cloned()
                    .unwrap_or_default();
                let end = params
                    .get(&format!("{}_end", column.field))
                    .cloned()
                    .unwrap_or_default();
                if !start.is_empty() || !end.is_empty() {
                    request =
                        request.with_filter(FilterPredicate::range(&column.field, start, end));
                }
            } else if let Some(value) = params.get(&column.field)
                && !value.is_empty()
            {
                request = request.with_filter(FilterPredicate::new(
                    &column.field,
                    filter.operator,
                    value.clone(),
                ));
            }
        }

        request
    }
}

/// Accumulates one descriptor. Scoped to a single builder call; never shared.
pub struct TableBuilder {
    name: String,
    title: String,
    description: String,
    primary_key: Option<PrimaryKey>,
    columns: Vec<ColumnSpec>,
    form_fields: Vec<FormFieldSpec>,
    data_source: Option<DataSource>,
    detail_source: Option<DataSource>,
    actions: Vec<ActionSpec>,
    capabilities: Capabilities,
    form_tabs: Option<FormTabs>,
    post_hook: Option<PostHook>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: String::new(),
            description: String::new(),
            primary_key: None,
            columns: Vec::new(),
            form_fields: Vec::new(),
            data_source: None,
            detail_source: None,
            actions: Vec::new(),
            capabilities: Capabilities::default(),
            form_tabs: None,
            post_hook: None,
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn primary_key(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.primary_key = Some(PrimaryKey::new(name, data_type));
        self
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    pub fn form_field(mut self, field: FormFieldSpec) -> Self {
        self.form_fields.push(field);
        self
    }

    pub fn data_source(mut self, source: DataSource) -> Self {
        self.data_source = Some(source);
        self
    }

    pub fn detail_source(mut self, source: DataSource) -> Self {
        self.detail_source = Some(source);
        self
    }

    pub fn action(mut self, action: ActionSpec) -> Self {
        self.actions.push(action);
        self
    }

    pub fn form_tabs(mut self, tabs: FormTabs) -> Self {
        self.form_tabs = Some(tabs);
        self
    }

    pub fn post_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Row) -> Result<(), String> + Send + Sync + 'static,
    {
        self.post_hook = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> Result<TableDescriptor, DescriptorError> {
        if self.name.trim().is_empty() {
            return Err(DescriptorError::EmptyName);
        }
        let primary_key = self.primary_key.ok_or(DescriptorError::MissingPrimaryKey)?;
        let data_source = self.data_source.ok_or(DescriptorError::MissingDataSource)?;

        let mut seen = HashSet::new();
        for column in &self.columns {
            if !seen.insert(column.field.as_str()) {
                return Err(DescriptorError::DuplicateColumn(column.field.clone()));
            }
            if column.is_joined() && column.is_editable() {
                return Err(DescriptorError::EditableJoin(column.field.clone()));
            }
            if column.is_joined() && (column.sortable || column.is_filterable()) {
                return Err(DescriptorError::QueriedJoin(column.field.clone()));
            }
            if column.computed
                && (column.display.is_none() || column.sortable || column.is_filterable())
            {
                return Err(DescriptorError::InvalidComputedColumn(column.field.clone()));
            }
        }
        if !seen.contains(primary_key.name.as_str()) {
            return Err(DescriptorError::PrimaryKeyNotInColumns(primary_key.name));
        }

        let mut form_seen = HashSet::new();
        for field in &self.form_fields {
            if !form_seen.insert(field.field.as_str()) {
                return Err(DescriptorError::DuplicateFormField(field.field.clone()));
            }
        }

        let mut action_seen = HashSet::new();
        for action in &self.actions {
            if !action_seen.insert(action.id.as_str()) {
                return Err(DescriptorError::DuplicateAction(action.id.clone()));
            }
        }

        if let Some(tabs) = &self.form_tabs {
            if tabs.headers.len() != tabs.groups.len() {
                return Err(DescriptorError::TabShapeMismatch);
            }
            if let Some(unknown) = tabs.fields().find(|f| !form_seen.contains(f)) {
                return Err(DescriptorError::UnknownTabField(unknown.to_owned()));
            }
        }

        Ok(TableDescriptor {
            name: self.name,
            title: self.title,
            description: self.description,
            primary_key,
            columns: self.columns,
            form_fields: self.form_fields,
            data_source,
            detail_source: self.detail_source,
            actions: self.actions,
            capabilities: self.capabilities,
            form_tabs: self.form_tabs,
            post_hook: self.post_hook,
        })
    }
}

//! Table descriptor model.
//!
//! A [`TableDescriptor`] fully specifies one admin table: its columns, its
//! form, where its rows come from and which actions it offers. Descriptors
//! are produced per request by builder functions held in the
//! [`Registry`](crate::registry::Registry).

pub mod action;
pub mod column;
pub mod context;
pub mod data_source;
pub mod descriptor;
pub mod filter;
pub mod form;
pub mod join;
pub mod page;
pub mod value;

pub use action::{ActionKind, ActionResponse, ActionScope, ActionSpec};
pub use column::{ColumnSpec, EditType, FieldOption, Join};
pub use context::{Language, RequestContext};
pub use data_source::{CustomSource, DataSource, fetch_or_empty};
pub use descriptor::{Capabilities, PrimaryKey, TableBuilder, TableDescriptor};
pub use filter::{FilterOperator, FilterPredicate};
pub use form::{FormFieldSpec, FormMode, FormTabs, PostField, Widget};
pub use page::{PageData, PageRequest, SortDirection, page_count};
pub use value::{DataType, Row, Value, row_from};

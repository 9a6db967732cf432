//! Where a descriptor's rows come from.

use super::page::{PageData, PageRequest};
use crate::error::DataSourceError;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// A non-relational row source. May block; callers run it off the async executor.
pub trait CustomSource: Send + Sync {
    fn fetch(&self, request: &PageRequest) -> Result<PageData, DataSourceError>;
}

impl<F> CustomSource for F
where
    F: Fn(&PageRequest) -> Result<PageData, DataSourceError> + Send + Sync,
{
    fn fetch(&self, request: &PageRequest) -> Result<PageData, DataSourceError> {
        self(request)
    }
}

#[derive(Clone)]
pub enum DataSource {
    /// Rows live in a table of the relational store.
    Relational { table: String },
    Custom(Arc<dyn CustomSource>),
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Relational { table } => {
                f.debug_struct("Relational").field("table", table).finish()
            }
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl DataSource {
    pub fn relational(table: impl Into<String>) -> Self {
        Self::Relational {
            table: table.into(),
        }
    }

    pub fn custom<S>(source: S) -> Self
    where
        S: CustomSource + 'static,
    {
        Self::Custom(Arc::new(source))
    }

    /// The backing table, for relational sources.
    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Relational { table } => Some(table),
            Self::Custom(_) => None,
        }
    }
}

/// Runs a custom source; an error or a panic yields an empty page instead of propagating.
pub fn fetch_or_empty(source: &dyn CustomSource, request: &PageRequest) -> PageData {
    match panic::catch_unwind(AssertUnwindSafe(|| source.fetch(request))) {
        Ok(Ok(page)) => page,
        Ok(Err(e)) => {
            tracing::warn!(
                page = request.page,
                page_size = request.page_size,
                error = %e,
                "Custom data source failed, serving an empty page"
            );
            PageData::empty()
        }
        Err(payload) => {
            tracing::warn!(
                page = request.page,
                page_size = request.page_size,
                panic = %panic_message(payload.as_ref()),
                "Custom data source panicked, serving an empty page"
            );
            PageData::empty()
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::value::{Value, row_from};

    #[test]
    fn closure_sources_pass_through() {
        let source = |request: &PageRequest| -> Result<PageData, DataSourceError> {
            let rows = (0..3)
                .map(|i| row_from([("id", Value::Int(i))]))
                .collect();
            Ok(PageData::new(rows, u64::from(request.page_size) + 7))
        };
        let page = fetch_or_empty(&source, &PageRequest::new(1, 10));
        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.total, 17);
    }

    #[test]
    fn errors_degrade_to_empty_page() {
        let source = |_: &PageRequest| -> Result<PageData, DataSourceError> {
            Err(DataSourceError::Failed("upstream down".to_owned()))
        };
        assert_eq!(fetch_or_empty(&source, &PageRequest::default()), PageData::empty());
    }

    #[test]
    fn panics_degrade_to_empty_page() {
        let source = |request: &PageRequest| -> Result<PageData, DataSourceError> {
            if request.page == 2 && request.page_size == 20 {
                panic!("page two is cursed");
            }
            Ok(PageData::new(vec![], 1))
        };
        let page = fetch_or_empty(&source, &PageRequest::new(2, 20));
        assert!(page.rows.is_empty());
        assert_eq!(page.total, 0);
    }

    #[test]
    fn relational_exposes_table() {
        assert_eq!(DataSource::relational("posts").table(), Some("posts"));
        let custom = DataSource::custom(|_: &PageRequest| -> Result<PageData, DataSourceError> {
            Ok(PageData::empty())
        });
        assert_eq!(custom.table(), None);
    }
}

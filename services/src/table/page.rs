//! Normalized page requests and the page data sources hand back.

use super::filter::FilterPredicate;
use super::value::Row;
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const PAGE_SIZE_CHOICES: [u32; 5] = [10, 20, 30, 50, 100];

/// Query parameter names understood by the list view.
pub const PAGE_PARAM: &str = "__page";
pub const PAGE_SIZE_PARAM: &str = "__page_size";
pub const SORT_PARAM: &str = "__sort";
pub const SORT_TYPE_PARAM: &str = "__sort_type";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
    pub filters: Vec<FilterPredicate>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(1, DEFAULT_PAGE_SIZE)
    }
}

impl PageRequest {
    /// Pages start at 1; a page size outside [`PAGE_SIZE_CHOICES`] falls back to the default.
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page: page.max(1),
            page_size: if PAGE_SIZE_CHOICES.contains(&page_size) {
                page_size
            } else {
                DEFAULT_PAGE_SIZE
            },
            sort_field: None,
            sort_direction: SortDirection::default(),
            filters: Vec::new(),
        }
    }

    /// Single-row lookup used by detail views; bypasses the page size choices.
    pub fn single() -> Self {
        Self {
            page_size: 1,
            ..Self::new(1, DEFAULT_PAGE_SIZE)
        }
    }

    pub fn sorted_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = direction;
        self
    }

    pub fn with_filter(mut self, predicate: FilterPredicate) -> Self {
        self.filters.push(predicate);
        self
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.page_size)
    }

    pub fn filter(&self, field: &str) -> Option<&FilterPredicate> {
        self.filters.iter().find(|f| f.field == field)
    }

    /// Filters, sorts and slices a complete in-memory row set.
    pub fn apply<I>(&self, rows: I) -> PageData
    where
        I: IntoIterator<Item = Row>,
    {
        let mut matched: Vec<Row> = rows
            .into_iter()
            .filter(|row| self.filters.iter().all(|f| f.matches(row)))
            .collect();

        if let Some(field) = &self.sort_field {
            matched.sort_by(|a, b| {
                let left = a.get(field).cloned().unwrap_or_default();
                let right = b.get(field).cloned().unwrap_or_default();
                let ordering = left.sort_cmp(&right);
                match self.sort_direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        let total = matched.len() as u64;
        let offset = usize::try_from(self.offset()).unwrap_or(usize::MAX);
        let rows = matched
            .into_iter()
            .skip(offset)
            .take(self.page_size as usize)
            .collect();

        PageData { rows, total }
    }
}

/// Rows for one page plus the number of rows the source conceptually holds.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PageData {
    pub rows: Vec<Row>,
    pub total: u64,
}

impl PageData {
    pub fn new(rows: Vec<Row>, total: u64) -> Self {
        Self { rows, total }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn page_count(&self, page_size: u32) -> u64 {
        page_count(self.total, page_size)
    }
}

/// `ceil(total / page_size)`; zero when the page size is zero.
pub fn page_count(total: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total.div_ceil(u64::from(page_size))
}

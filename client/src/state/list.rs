//! Client-side filter, sort and paginate over a fully fetched collection.
//!
//! DESIGN
//! ======
//! List pages fetch the whole collection once and keep it untouched in
//! `ListState::items`. Every render runs [`apply`], which borrows the rows it
//! shows, so changing the query never mutates or reorders the source.

#[cfg(test)]
#[path = "list_test.rs"]
mod list_test;

use std::cmp::Ordering;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::net::error::ApiError;
use crate::pages::Rendered;

/// Sortable value of one row for one column.
#[derive(Clone, Debug, PartialEq)]
pub enum SortKey {
    Text(String),
    Number(f64),
}

impl SortKey {
    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(a), Self::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

/// A row type a list page can search, filter by status, and sort.
pub trait Listable {
    /// Column names accepted by [`Listable::sort_key`].
    const SORT_COLUMNS: &'static [&'static str];

    /// Text matched by the search box.
    fn search_text(&self) -> String;

    /// Status used by the status filter, if the row has one.
    fn status_label(&self) -> Option<String>;

    fn sort_key(&self, column: &str) -> Option<SortKey>;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub search: String,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub direction: SortDirection,
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            status: None,
            sort: None,
            direction: SortDirection::Asc,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListError {
    #[error("cannot sort by `{column}`; choose one of: {allowed}")]
    UnknownColumn { column: String, allowed: String },
}

/// One rendered page of a list.
#[derive(Debug)]
pub struct PageView<'a, T> {
    pub rows: Vec<&'a T>,
    /// Page actually shown after clamping, 1-based.
    pub page: usize,
    pub page_count: usize,
    /// Rows that passed the filters.
    pub matched: usize,
    /// Rows in the source collection.
    pub total: usize,
}

/// Filter, sort and paginate `items` without touching them.
///
/// # Errors
///
/// Returns [`ListError::UnknownColumn`] for a sort column the row type does
/// not declare.
pub fn apply<'a, T: Listable>(items: &'a [T], query: &ListQuery) -> Result<PageView<'a, T>, ListError> {
    if let Some(column) = &query.sort {
        if !T::SORT_COLUMNS.contains(&column.as_str()) {
            return Err(ListError::UnknownColumn { column: column.clone(), allowed: T::SORT_COLUMNS.join(", ") });
        }
    }

    let needle = query.search.trim().to_lowercase();
    let status = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut rows: Vec<&T> = items
        .iter()
        .filter(|row| needle.is_empty() || row.search_text().to_lowercase().contains(&needle))
        .filter(|row| {
            status.is_none_or(|wanted| row.status_label().is_some_and(|label| label.eq_ignore_ascii_case(wanted)))
        })
        .collect();

    if let Some(column) = &query.sort {
        rows.sort_by(|a, b| compare_rows(a.sort_key(column), b.sort_key(column), query.direction));
    }

    let matched = rows.len();
    let page_size = query.page_size.max(1);
    let page_count = matched.div_ceil(page_size).max(1);
    let page = query.page.clamp(1, page_count);
    let rows = rows.into_iter().skip((page - 1) * page_size).take(page_size).collect();

    Ok(PageView { rows, page, page_count, matched, total: items.len() })
}

/// Rows without a value sort last in either direction.
fn compare_rows(a: Option<SortKey>, b: Option<SortKey>, direction: SortDirection) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match direction {
            SortDirection::Asc => a.compare(&b),
            SortDirection::Desc => b.compare(&a),
        },
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// State held by a list page for one visit.
#[derive(Clone, Debug)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
    pub query: ListQuery,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self { items: Vec::new(), loading: false, error: None, query: ListQuery::default() }
    }
}

impl<T> ListState<T> {
    pub fn begin_load(&mut self) {
        self.loading = true;
        self.error = None;
    }

    /// Replace the held rows, or keep the old ones and record the failure.
    pub fn finish_load(&mut self, result: Result<Vec<T>, ApiError>) {
        self.loading = false;
        match result {
            Ok(items) => {
                tracing::debug!(rows = items.len(), "list loaded");
                self.items = items;
            }
            Err(error) => {
                tracing::warn!(error = %error, "list fetch failed");
                self.error = Some(error.display_message());
            }
        }
    }
}

impl<T: Listable> ListState<T> {
    /// Placeholder while loading, the fetch error, or the current page.
    ///
    /// # Errors
    ///
    /// See [`apply`].
    pub fn render(&self) -> Result<Rendered<PageView<'_, T>>, ListError> {
        if self.loading {
            return Ok(Rendered::Loading);
        }
        if let Some(error) = &self.error {
            return Ok(Rendered::Error(error.clone()));
        }
        self.page().map(Rendered::Ready)
    }

    /// Current page for the held query.
    ///
    /// # Errors
    ///
    /// See [`apply`].
    pub fn page(&self) -> Result<PageView<'_, T>, ListError> {
        apply(&self.items, &self.query)
    }
}

//! Collection query and page types
//!
//! A `CollectionQuery` is the (page, search, filters) tuple that keys one
//! page request. Changing the search term or any filter puts the query back
//! on page 1.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Query tuple for one page of a remote collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CollectionQuery {
    page: u32,
    search: String,
    filters: BTreeMap<String, String>,
}

impl Default for CollectionQuery {
    fn default() -> Self {
        Self { page: 1, search: String::new(), filters: BTreeMap::new() }
    }
}

impl CollectionQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based page index
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn filter(&self, name: &str) -> Option<&str> {
        self.filters.get(name).map(String::as_str)
    }

    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Set or clear (empty value) a filter. Returns whether the tuple changed.
    pub fn set_filter(&mut self, name: &str, value: &str) -> bool {
        let value = value.trim();
        let changed = if value.is_empty() {
            self.filters.remove(name).is_some()
        } else {
            self.filters.insert(name.to_string(), value.to_string()).as_deref() != Some(value)
        };
        self.page = 1;
        changed
    }

    /// Replace the search term. Returns whether the tuple changed.
    pub fn set_search(&mut self, term: &str) -> bool {
        let term = term.trim();
        let changed = self.search != term;
        self.search = term.to_string();
        self.page = 1;
        changed
    }

    /// Raw page setter; zero is clamped to 1. Range checks against the
    /// known page count belong to the caller.
    pub fn set_page(&mut self, page: u32) {
        self.page = page.max(1);
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.set_page(page);
        self
    }

    pub fn with_search(mut self, term: &str) -> Self {
        self.set_search(term);
        self
    }

    pub fn with_filter(mut self, name: &str, value: &str) -> Self {
        self.set_filter(name, value);
        self
    }

    /// Query-string pairs: `page` always, `search` and filters only when set.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("page".to_string(), self.page.to_string())];
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        params.extend(self.filters.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }
}

/// `pagination` object as returned by the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationMeta {
    pub page: u32,
    pub pages: u32,
}

/// One resolved page of rows.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CollectionPage<R> {
    pub rows: Vec<R>,
    pub current_page: u32,
    pub total_pages: u32,
}

impl<R> CollectionPage<R> {
    pub fn new(rows: Vec<R>, meta: PaginationMeta) -> Self {
        Self { rows, current_page: meta.page.max(1), total_pages: meta.pages }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_is_first_page_without_filters() {
        let q = CollectionQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.to_params(), vec![("page".to_string(), "1".to_string())]);
    }

    #[test]
    fn search_change_resets_page() {
        let mut q = CollectionQuery::new().with_page(2);
        assert!(q.set_search("john"));
        assert_eq!(q.page(), 1);
        assert_eq!(q, CollectionQuery::new().with_search("john"));
        assert_eq!(
            q.to_params(),
            vec![("page".to_string(), "1".to_string()), ("search".to_string(), "john".to_string())]
        );
    }

    #[test]
    fn empty_filter_value_means_no_filter() {
        let q = CollectionQuery::new().with_filter("role", "");
        assert_eq!(q, CollectionQuery::new());
        let mut q = CollectionQuery::new().with_filter("role", "rider").with_page(4);
        assert!(q.set_filter("role", ""));
        assert_eq!(q.page(), 1);
        assert_eq!(q.filter("role"), None);
    }

    #[test]
    fn unchanged_filter_still_resets_page() {
        let mut q = CollectionQuery::new().with_filter("status", "failed").with_page(3);
        assert!(!q.set_filter("status", "failed"));
        assert_eq!(q.page(), 1);
    }

    #[test]
    fn page_zero_is_clamped() {
        assert_eq!(CollectionQuery::new().with_page(0).page(), 1);
    }

    #[test]
    fn page_navigation_flags() {
        let p: CollectionPage<u8> = CollectionPage::new(vec![], PaginationMeta { page: 1, pages: 3 });
        assert!(!p.has_previous());
        assert!(p.has_next());
        let last: CollectionPage<u8> = CollectionPage::new(vec![], PaginationMeta { page: 3, pages: 3 });
        assert!(last.has_previous());
        assert!(!last.has_next());
    }
}

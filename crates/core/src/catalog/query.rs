use serde::{Deserialize, Serialize};

use crate::domain::catalog::CatalogEntry;

/// Category value meaning "do not filter by category".
pub const ALL_CATEGORIES: &str = "all";

pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// Filter and pagination parameters for a catalog listing.
///
/// `page` is 1-indexed. Out-of-range values are tolerated and yield an
/// empty window rather than an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySpec {
    pub page: i64,
    pub page_size: i64,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self { page: 1, page_size: DEFAULT_PAGE_SIZE, query: None, category: None }
    }
}

impl QuerySpec {
    pub fn page(page: i64, page_size: i64) -> Self {
        Self { page, page_size, ..Self::default() }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub(crate) fn normalized_query(&self) -> Option<String> {
        self.query.as_deref().filter(|query| !query.is_empty()).map(str::to_lowercase)
    }

    pub(crate) fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|category| *category != ALL_CATEGORIES)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    /// Size of the filtered set before pagination.
    pub total: usize,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self { data: Vec::new(), total: 0 }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page { data: self.data.into_iter().map(f).collect(), total: self.total }
    }
}

/// Filters `items` by name substring and category, then cuts the requested page.
pub fn filter_and_paginate<T>(items: &[T], spec: &QuerySpec) -> Page<T>
where
    T: CatalogEntry + Clone,
{
    let query = spec.normalized_query();
    let category = spec.category_filter();

    let filtered: Vec<&T> = items
        .iter()
        .filter(|item| match &query {
            Some(query) => item.name().to_lowercase().contains(query.as_str()),
            None => true,
        })
        .filter(|item| match category {
            Some(category) => item.category() == category,
            None => true,
        })
        .collect();

    let total = filtered.len();
    let data = window(&filtered, spec.page, spec.page_size).into_iter().cloned().collect();
    Page { data, total }
}

/// Contiguous slice for a 1-indexed page; empty for invalid or out-of-range requests.
pub(crate) fn window<T: Clone>(items: &[T], page: i64, page_size: i64) -> Vec<T> {
    if page < 1 || page_size <= 0 {
        return Vec::new();
    }

    let start = (page - 1).saturating_mul(page_size);
    let Ok(start) = usize::try_from(start) else {
        return Vec::new();
    };
    if start >= items.len() {
        return Vec::new();
    }

    let size = usize::try_from(page_size).unwrap_or(usize::MAX);
    let end = start.saturating_add(size).min(items.len());
    items[start..end].to_vec()
}

#[cfg(test)]
mod tests {
    use super::{filter_and_paginate, window, QuerySpec};
    use crate::catalog::fixtures::service;
    use crate::domain::catalog::WellnessService;

    fn numbered(count: usize) -> Vec<WellnessService> {
        (1..=count)
            .map(|n| service(&format!("srv-{n:03}"), &format!("Servicio {n}"), "Masajes", "..."))
            .collect()
    }

    #[test]
    fn pages_through_twenty_five_items() {
        let items = numbered(25);

        let first = filter_and_paginate(&items, &QuerySpec::page(1, 10));
        assert_eq!(first.data.len(), 10);
        assert_eq!(first.total, 25);
        assert_eq!(first.data[0].id.0, "srv-001");

        let third = filter_and_paginate(&items, &QuerySpec::page(3, 10));
        assert_eq!(third.data.len(), 5);
        assert_eq!(third.data[0].id.0, "srv-021");

        let fourth = filter_and_paginate(&items, &QuerySpec::page(4, 10));
        assert!(fourth.data.is_empty());
        assert_eq!(fourth.total, 25);
    }

    #[test]
    fn invalid_page_or_size_yields_empty_window() {
        let items = numbered(5);

        let zero_page = filter_and_paginate(&items, &QuerySpec::page(0, 10));
        assert!(zero_page.data.is_empty());
        assert_eq!(zero_page.total, 5);

        assert!(filter_and_paginate(&items, &QuerySpec::page(-2, 10)).data.is_empty());
        assert!(filter_and_paginate(&items, &QuerySpec::page(1, 0)).data.is_empty());
        assert!(filter_and_paginate(&items, &QuerySpec::page(1, -5)).data.is_empty());
    }

    #[test]
    fn query_matches_name_case_insensitively() {
        let items = vec![
            service("srv-001", "Masaje Relajante", "Masajes", "Alivia tensiones"),
            service("srv-002", "Facial Hidratante", "Faciales", "Incluye masaje facial"),
        ];

        let page = filter_and_paginate(&items, &QuerySpec::page(1, 10).with_query("masaje"));

        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].name, "Masaje Relajante");
    }

    #[test]
    fn category_filter_is_exact_and_case_sensitive() {
        let items = vec![
            service("srv-001", "Masaje Relajante", "Masajes", "..."),
            service("srv-002", "Facial Hidratante", "Faciales", "..."),
            service("srv-003", "Masaje Thai", "masajes", "..."),
        ];

        let page = filter_and_paginate(&items, &QuerySpec::page(1, 10).with_category("Masajes"));
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].id.0, "srv-001");

        let all = filter_and_paginate(&items, &QuerySpec::page(1, 10).with_category("all"));
        assert_eq!(all.total, 3);
    }

    #[test]
    fn query_and_category_compose_before_counting() {
        let items = vec![
            service("srv-001", "Masaje Relajante", "Masajes", "..."),
            service("srv-002", "Masaje Facial", "Faciales", "..."),
            service("srv-003", "Reflexologia", "Masajes", "..."),
        ];

        let page = filter_and_paginate(
            &items,
            &QuerySpec::page(1, 10).with_query("MASAJE").with_category("Masajes"),
        );

        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].id.0, "srv-001");
    }

    #[test]
    fn window_handles_huge_page_numbers() {
        let items = vec![1, 2, 3];
        assert!(window(&items, i64::MAX, i64::MAX).is_empty());
        assert_eq!(window(&items, 1, i64::MAX), vec![1, 2, 3]);
    }
}

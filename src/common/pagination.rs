use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_PER_PAGE: i64 = 10;
const MAX_PER_PAGE: i64 = 100;
// Far past any real listing; keeps `offset` from overflowing.
const MAX_PAGE: i64 = 1_000_000;

/// `?page=&perPage=` query string; pages are 1-based.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).clamp(1, MAX_PAGE)
    }

    pub fn per_page(&self) -> i64 {
        self.per_page.unwrap_or(DEFAULT_PER_PAGE).clamp(1, MAX_PER_PAGE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.per_page()
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub amount: i64,
    pub page: i64,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, amount: i64, query: &PageQuery) -> Self {
        let per_page = query.per_page();
        Self {
            items,
            amount,
            page: query.page(),
            pages: (amount + per_page - 1) / per_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_round_up() {
        let query = PageQuery { page: Some(2), per_page: None };
        let page = Page::new(vec![1, 2, 3], 23, &query);
        assert_eq!(page.pages, 3);
        assert_eq!(query.offset(), 10);
    }

    #[test]
    fn out_of_range_values_are_clamped() {
        let query = PageQuery { page: Some(0), per_page: Some(10_000) };
        assert_eq!(query.page(), 1);
        assert_eq!(query.per_page(), 100);
        assert_eq!(query.offset(), 0);
    }

    #[test]
    fn huge_pages_do_not_overflow_the_offset() {
        let query = PageQuery { page: Some(i64::MAX / 10), per_page: Some(100) };
        assert_eq!(query.page(), MAX_PAGE);
        assert_eq!(query.offset(), (MAX_PAGE - 1) * 100);

        let page = Page::new(Vec::<i32>::new(), 3, &query);
        assert!(page.items.is_empty());
        assert_eq!(page.pages, 1);
    }
}

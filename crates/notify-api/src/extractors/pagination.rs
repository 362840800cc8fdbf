//! `?page=&per_page=` query parameters.

use serde::Deserialize;

use notify_core::types::pagination::{DEFAULT_PAGE_SIZE, PageRequest};

/// 1-based page and page size; missing values take defaults and
/// out-of-range values are clamped rather than rejected.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct PaginationParams {
    pub page: u64,
    #[serde(alias = "page_size")]
    pub per_page: u64,
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PAGE_SIZE,
        }
    }
}

impl From<PaginationParams> for PageRequest {
    fn from(params: PaginationParams) -> Self {
        PageRequest::new(params.page, params.per_page)
    }
}

impl PaginationParams {
    pub fn into_page_request(self) -> PageRequest {
        self.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamps_out_of_range() {
        let page = PaginationParams { page: 0, per_page: 500 }.into_page_request();
        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 100);
    }

    #[test]
    fn test_defaults_and_alias() {
        let params: PaginationParams = serde_json::from_str(r#"{"page_size": 10}"#).unwrap();
        assert_eq!(params.page, 1);
        assert_eq!(params.per_page, 10);

        let params: PaginationParams = serde_json::from_str("{}").unwrap();
        assert_eq!(params.per_page, DEFAULT_PAGE_SIZE);
    }
}

//! Page-based pagination for list endpoints.
//!
//! Query parameters `page` (1-indexed, default 1) and `limit` (1-50,
//! default 10). Empty query values are treated as absent.
//!
//! ```json
//! { "total": 42, "page": 2, "limit": 10, "pages": 5 }
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

fn deserialize_optional_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s.trim().parse::<i64>().map(Some).map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed, default: 1)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub page: Option<i64>,
    /// Items per page (1-50, default: 10)
    #[serde(default, deserialize_with = "deserialize_optional_i64")]
    pub limit: Option<i64>,
}

impl PaginationParams {
    #[must_use]
    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1).max(1)
    }

    #[must_use]
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
    }

    #[must_use]
    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.limit()
    }

    /// Builds the response metadata for a result set of `total` rows.
    #[must_use]
    pub fn meta(&self, total: i64) -> PaginationMeta {
        let limit = self.limit();
        PaginationMeta {
            total,
            page: self.page(),
            limit,
            pages: (total.max(0) + limit - 1) / limit,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = PaginationParams::default();
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), 10);
        assert_eq!(params.offset(), 0);
    }

    #[test]
    fn test_offset_from_page() {
        let params = PaginationParams {
            page: Some(3),
            limit: Some(20),
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn test_limit_clamped() {
        let params = PaginationParams {
            page: Some(0),
            limit: Some(500),
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_LIMIT);

        let params = PaginationParams {
            page: None,
            limit: Some(-3),
        };
        assert_eq!(params.limit(), 1);
    }

    #[test]
    fn test_meta_page_count() {
        let params = PaginationParams {
            page: Some(2),
            limit: Some(10),
        };
        assert_eq!(
            params.meta(42),
            PaginationMeta {
                total: 42,
                page: 2,
                limit: 10,
                pages: 5
            }
        );
        assert_eq!(params.meta(0).pages, 0);
    }

    #[test]
    fn test_empty_query_values_ignored() {
        let params: PaginationParams =
            serde_json::from_str(r#"{"page": "", "limit": "25"}"#).unwrap();
        assert_eq!(params.page, None);
        assert_eq!(params.limit(), 25);
    }
}

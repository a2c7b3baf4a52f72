pub mod comment;
pub mod meme;
pub mod newtypes;
pub mod user;
pub mod utils;

use serde::{Deserialize, Serialize};

pub const LOGIN_PATH: &str = "/authentication/login";

/// One page of a paginated list endpoint.
///
/// `total` and `page_size` are reported by the server and passed through untouched.
/// `next_page` is computed by the client from the requested page number, see
/// [ListResponse::with_next_page].
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub total: i64,
    pub page_size: i64,
    pub results: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<i32>,
}

impl<T> ListResponse<T> {
    /// An empty page signals the end of the feed.
    pub fn with_next_page(mut self, page: i32) -> Self {
        self.next_page = if self.results.is_empty() {
            None
        } else {
            Some(page + 1)
        };
        self
    }

    pub fn map_results<U>(self, results: Vec<U>) -> ListResponse<U> {
        ListResponse {
            total: self.total,
            page_size: self.page_size,
            results,
            next_page: self.next_page,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn page(results: Vec<i32>, next_page: Option<i32>) -> ListResponse<i32> {
        ListResponse {
            total: 20,
            page_size: 10,
            results,
            next_page,
        }
    }

    #[test]
    fn test_next_page_ignores_server_value() {
        let res = page(vec![1, 2], Some(42)).with_next_page(3);
        assert_eq!(Some(4), res.next_page);

        let res = page(vec![], Some(42)).with_next_page(3);
        assert_eq!(None, res.next_page);
    }

    #[test]
    fn test_deserialize_without_next_page() {
        let json = r#"{"total":1,"pageSize":10,"results":[7]}"#;
        let res: ListResponse<i32> = serde_json::from_str(json).unwrap();
        assert_eq!(page(vec![7], None).page_size, res.page_size);
        assert_eq!(vec![7], res.results);
        assert_eq!(None, res.next_page);
    }
}

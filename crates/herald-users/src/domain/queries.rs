//! Queries of the Users context.

use std::any::Any;

use herald_core::message::{Message, Query};
use serde_json::Value;

/// Direction of a sorted listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl SortOrder {
    fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Lists users with filtering, sorting, and pagination.
#[derive(Debug, Clone)]
pub struct GetUsers {
    /// 1-based page number.
    pub page: u32,
    /// Page size.
    pub per_page: u32,
    /// Field to sort by. Checked against an allow-list by the handler.
    pub sort: String,
    /// Sort direction.
    pub order: SortOrder,
    /// Substring filter over email and name.
    pub search: Option<String>,
    /// Exact email filter.
    pub email: Option<String>,
    /// Cache lifetime for this listing; zero disables caching.
    pub cache_ttl: i64,
}

impl Default for GetUsers {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 15,
            sort: "created_at".to_owned(),
            order: SortOrder::Desc,
            search: None,
            email: None,
            cache_ttl: 0,
        }
    }
}

impl Message for GetUsers {
    fn message_name(&self) -> &'static str {
        "users.get_users"
    }

    fn to_payload(&self) -> Value {
        serde_json::json!({
            "page": self.page,
            "per_page": self.per_page,
            "sort": self.sort,
            "order": self.order.as_str(),
            "search": self.search,
            "email": self.email,
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Query for GetUsers {
    fn cache_ttl_seconds(&self) -> i64 {
        self.cache_ttl
    }
}

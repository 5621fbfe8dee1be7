//! Read-side value objects of the Users context.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::User;

/// Public projection of a user account. No password material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserDto {
    /// The user's id.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name, when one was given.
    pub name: Option<String>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserDto {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

/// One page of a user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserPage {
    /// The page's users, already sorted.
    pub users: Vec<UserDto>,
    /// Total matching users across all pages.
    pub total: usize,
    /// The 1-based page number served.
    pub page: u32,
    /// The page size requested.
    pub per_page: u32,
}

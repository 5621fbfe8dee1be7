//! Query handlers of the Users context.

use std::cmp::Ordering;
use std::sync::Arc;

use async_trait::async_trait;
use herald_bus::QueryHandler;
use herald_core::error::AppError;

use crate::application::dto::{UserDto, UserPage};
use crate::domain::queries::{GetUsers, SortOrder};
use crate::domain::repository::UserRepository;

const SORTABLE_FIELDS: [&str; 3] = ["email", "name", "created_at"];

fn compare(a: &UserDto, b: &UserDto, field: &str) -> Ordering {
    match field {
        "email" => a.email.cmp(&b.email),
        "name" => a.name.cmp(&b.name),
        _ => a.created_at.cmp(&b.created_at),
    }
}

/// Handles [`GetUsers`]: filters, sorts, and paginates the user directory.
pub struct GetUsersHandler {
    repository: Arc<dyn UserRepository>,
}

impl GetUsersHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl QueryHandler<GetUsers> for GetUsersHandler {
    type Output = UserPage;

    async fn handle(&self, query: &GetUsers) -> Result<UserPage, AppError> {
        if !SORTABLE_FIELDS.contains(&query.sort.as_str()) {
            return Err(AppError::Configuration(format!(
                "cannot sort users by unknown field: {}",
                query.sort,
            )));
        }

        let mut users: Vec<UserDto> = self
            .repository
            .all()
            .await?
            .iter()
            .map(UserDto::from)
            .filter(|user| {
                if let Some(email) = &query.email {
                    if &user.email != email {
                        return false;
                    }
                }
                if let Some(term) = &query.search {
                    let term = term.to_lowercase();
                    let in_email = user.email.to_lowercase().contains(&term);
                    let in_name = user
                        .name
                        .as_ref()
                        .is_some_and(|name| name.to_lowercase().contains(&term));
                    return in_email || in_name;
                }
                true
            })
            .collect();

        users.sort_by(|a, b| {
            let ordering = compare(a, b, &query.sort);
            match query.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = users.len();
        let per_page = query.per_page.max(1);
        let page = query.page.max(1);
        let users = users
            .into_iter()
            .skip((page as usize - 1) * per_page as usize)
            .take(per_page as usize)
            .collect();

        Ok(UserPage {
            users,
            total,
            page,
            per_page,
        })
    }
}

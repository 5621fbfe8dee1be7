//! In-memory persistence for the Users context.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use herald_core::error::AppError;
use herald_uow::UnitOfWork;
use uuid::Uuid;

use crate::domain::aggregates::User;
use crate::domain::repository::UserRepository;

#[derive(Debug, Clone)]
struct UserRow {
    id: Uuid,
    email: String,
    name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn from_aggregate(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            created_at: user.created_at,
        }
    }

    fn into_aggregate(self) -> User {
        User::rehydrate(
            self.id,
            self.email,
            self.name,
            self.password_hash,
            self.created_at,
        )
    }
}

/// Hash-map repository that hands recorded events to the Unit of Work on
/// every save. Insertion order is preserved for `all`.
pub struct InMemoryUserRepository {
    uow: Arc<UnitOfWork>,
    rows: Mutex<Vec<UserRow>>,
    index: Mutex<HashMap<Uuid, usize>>,
}

impl InMemoryUserRepository {
    /// Creates an empty repository bound to a Unit of Work.
    #[must_use]
    pub fn new(uow: Arc<UnitOfWork>) -> Self {
        Self {
            uow,
            rows: Mutex::new(Vec::new()),
            index: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored users.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the repository is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn save(&self, user: &mut User) -> Result<(), AppError> {
        {
            let row = UserRow::from_aggregate(user);
            let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
            let mut index = self.index.lock().unwrap_or_else(PoisonError::into_inner);
            match index.get(&row.id) {
                Some(&position) => rows[position] = row,
                None => {
                    index.insert(row.id, rows.len());
                    rows.push(row);
                }
            }
        }
        self.uow.collect_from(user).await
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        let position = self
            .index
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&id)
            .copied();
        Ok(position.map(|position| rows[position].clone().into_aggregate()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|row| row.email == email)
            .cloned()
            .map(UserRow::into_aggregate))
    }

    async fn all(&self) -> Result<Vec<User>, AppError> {
        Ok(self
            .rows
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .map(UserRow::into_aggregate)
            .collect())
    }
}

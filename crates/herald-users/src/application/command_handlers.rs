//! Command handlers of the Users context.

use std::sync::Arc;

use async_trait::async_trait;
use herald_bus::CommandHandler;
use herald_core::clock::Clock;
use herald_core::error::AppError;
use sha2::{Digest, Sha256};

use crate::application::dto::UserDto;
use crate::domain::aggregates::User;
use crate::domain::commands::CreateUser;
use crate::domain::repository::UserRepository;

fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

/// Handles [`CreateUser`]: rejects duplicate emails, hashes the password,
/// creates the aggregate, and saves it through the repository (which
/// forwards the recorded `UserWasCreated` to the Unit of Work).
pub struct CreateUserHandler {
    repository: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateUserHandler {
    /// Creates the handler.
    #[must_use]
    pub fn new(repository: Arc<dyn UserRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }
}

#[async_trait]
impl CommandHandler<CreateUser> for CreateUserHandler {
    type Output = UserDto;

    async fn handle(&self, command: &CreateUser) -> Result<UserDto, AppError> {
        if self.repository.find_by_email(&command.email).await?.is_some() {
            return Err(AppError::Domain(format!(
                "a user with email {} already exists",
                command.email,
            )));
        }

        let mut user = User::create(
            command.email.clone(),
            command.name.clone(),
            hash_password(&command.password),
            self.clock.as_ref(),
        );
        let dto = UserDto::from(&user);
        self.repository.save(&mut user).await?;
        Ok(dto)
    }
}

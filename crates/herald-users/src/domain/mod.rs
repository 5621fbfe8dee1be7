//! Domain layer of the Users context.

pub mod aggregates;
pub mod commands;
pub mod events;
pub mod queries;
pub mod repository;

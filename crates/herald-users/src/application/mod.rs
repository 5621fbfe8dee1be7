//! Application layer of the Users context.

pub mod command_handlers;
pub mod dto;
pub mod projector;
pub mod query_handlers;

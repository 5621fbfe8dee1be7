//! Herald Users — reference bounded context.
//!
//! A small but complete context exercising the whole toolkit: a `CreateUser`
//! command flowing through validation, audit, and the Unit of Work; a cached
//! `GetUsers` query; a `UserWasCreated` event feeding a read-model projector.
//! The core crates never depend on this one.

pub mod application;
pub mod domain;
pub mod memory;
pub mod module;

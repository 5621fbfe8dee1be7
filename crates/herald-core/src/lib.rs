//! Herald Core — shared message and domain abstractions.
//!
//! This crate defines the fundamental traits and types that the buses, the
//! Unit of Work, and the bounded contexts depend on. It contains no
//! infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod event;
pub mod message;
pub mod validation;

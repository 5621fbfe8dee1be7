//! Herald UoW — transactional scope with deferred event dispatch.
//!
//! The Unit of Work buffers domain events recorded during a command and
//! pushes them through the Event Bus only after the persistence transaction
//! has durably committed. Events must never describe state that might still
//! be rolled back.

pub mod transaction;
pub mod unit_of_work;

pub use transaction::{Transaction, TransactionProvider};
pub use unit_of_work::UnitOfWork;

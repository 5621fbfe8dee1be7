//! Persistence transaction ports.
//!
//! The Unit of Work treats the storage layer as an opaque resource with
//! exactly three operations: begin, commit, rollback. No introspection.

use async_trait::async_trait;
use herald_core::error::AppError;

/// An open persistence transaction.
#[async_trait]
pub trait Transaction: Send + Sync {
    /// Durably commits the transaction.
    async fn commit(&mut self) -> Result<(), AppError>;

    /// Aborts the transaction, discarding its writes.
    async fn rollback(&mut self) -> Result<(), AppError>;
}

/// Opens persistence transactions. Supplied by the storage layer.
#[async_trait]
pub trait TransactionProvider: Send + Sync {
    /// Opens a new transaction.
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, AppError>;
}

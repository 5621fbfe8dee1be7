//! Test transactions — mock `TransactionProvider` implementations for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use herald_core::error::AppError;
use herald_uow::{Transaction, TransactionProvider};

#[derive(Default)]
struct Shared {
    begins: AtomicUsize,
    commits: AtomicUsize,
    rollbacks: AtomicUsize,
    fail_begin: AtomicBool,
    fail_commit: AtomicBool,
    fail_rollback: AtomicBool,
    log: Mutex<Vec<&'static str>>,
}

impl Shared {
    fn record(&self, phase: &'static str) {
        self.log.lock().unwrap().push(phase);
    }
}

/// A transaction provider that counts begins, commits, and rollbacks, with
/// switchable failure per phase. Failure toggles apply to transactions
/// opened after the toggle.
#[derive(Default)]
pub struct RecordingTransactionProvider {
    shared: Arc<Shared>,
}

impl RecordingTransactionProvider {
    /// Creates a provider whose transactions always succeed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `begin_transaction` fail from now on.
    pub fn fail_on_begin(&self) {
        self.shared.fail_begin.store(true, Ordering::SeqCst);
    }

    /// Makes `commit` fail on transactions opened from now on.
    pub fn fail_on_commit(&self) {
        self.shared.fail_commit.store(true, Ordering::SeqCst);
    }

    /// Makes `rollback` fail on transactions opened from now on.
    pub fn fail_on_rollback(&self) {
        self.shared.fail_rollback.store(true, Ordering::SeqCst);
    }

    /// Number of transactions opened.
    #[must_use]
    pub fn begins(&self) -> usize {
        self.shared.begins.load(Ordering::SeqCst)
    }

    /// Number of successful commits.
    #[must_use]
    pub fn commits(&self) -> usize {
        self.shared.commits.load(Ordering::SeqCst)
    }

    /// Number of successful rollbacks.
    #[must_use]
    pub fn rollbacks(&self) -> usize {
        self.shared.rollbacks.load(Ordering::SeqCst)
    }

    /// The phase log (e.g. `["begin", "commit"]`), in call order. Failed
    /// phases are logged with an `:error` suffix.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn log(&self) -> Vec<&'static str> {
        self.shared.log.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransactionProvider for RecordingTransactionProvider {
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, AppError> {
        if self.shared.fail_begin.load(Ordering::SeqCst) {
            self.shared.record("begin:error");
            return Err(AppError::Persistence("cannot open transaction".to_owned()));
        }
        self.shared.begins.fetch_add(1, Ordering::SeqCst);
        self.shared.record("begin");
        Ok(Box::new(RecordingTransaction {
            shared: Arc::clone(&self.shared),
            fail_commit: self.shared.fail_commit.load(Ordering::SeqCst),
            fail_rollback: self.shared.fail_rollback.load(Ordering::SeqCst),
        }))
    }
}

struct RecordingTransaction {
    shared: Arc<Shared>,
    fail_commit: bool,
    fail_rollback: bool,
}

#[async_trait]
impl Transaction for RecordingTransaction {
    async fn commit(&mut self) -> Result<(), AppError> {
        if self.fail_commit {
            self.shared.record("commit:error");
            return Err(AppError::Persistence("commit refused".to_owned()));
        }
        self.shared.commits.fetch_add(1, Ordering::SeqCst);
        self.shared.record("commit");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), AppError> {
        if self.fail_rollback {
            self.shared.record("rollback:error");
            return Err(AppError::Persistence("rollback refused".to_owned()));
        }
        self.shared.rollbacks.fetch_add(1, Ordering::SeqCst);
        self.shared.record("rollback");
        Ok(())
    }
}

/// A transaction provider that refuses to open transactions. Useful for
/// testing error-handling paths around `begin`.
#[derive(Debug, Default)]
pub struct FailingTransactionProvider;

#[async_trait]
impl TransactionProvider for FailingTransactionProvider {
    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>, AppError> {
        Err(AppError::Persistence("connection refused".to_owned()))
    }
}

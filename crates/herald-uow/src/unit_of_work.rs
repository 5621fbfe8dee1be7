//! The Unit of Work session.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use herald_bus::EventBus;
use herald_core::aggregate::AggregateRoot;
use herald_core::error::AppError;
use herald_core::event::DomainEvent;

use crate::transaction::{Transaction, TransactionProvider};

#[derive(Default)]
struct Session {
    active: bool,
    transaction: Option<Box<dyn Transaction>>,
    events: Vec<Arc<dyn DomainEvent>>,
}

/// A transactional scope that buffers domain events and dispatches them only
/// after the persistence transaction has committed.
///
/// One instance serves one logical execution context at a time — nested
/// command dispatch participates in the existing session (see
/// [`UnitOfWork::is_active`]) instead of opening a second one. Concurrent
/// execution contexts must use independent instances; the internal mutex
/// only satisfies `Send + Sync` sharing and is never held across awaits.
pub struct UnitOfWork {
    provider: Arc<dyn TransactionProvider>,
    event_bus: Arc<EventBus>,
    session: Mutex<Session>,
}

impl UnitOfWork {
    /// Creates an inert Unit of Work over the given transaction provider
    /// and event bus.
    #[must_use]
    pub fn new(provider: Arc<dyn TransactionProvider>, event_bus: Arc<EventBus>) -> Self {
        Self {
            provider,
            event_bus,
            session: Mutex::new(Session::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new session: opens a persistence transaction and clears any
    /// stale event buffer.
    ///
    /// # Errors
    ///
    /// [`AppError::UnitOfWorkAlreadyActive`] if a session is already open —
    /// nested `begin` is a programming error. Callers that may run nested
    /// check [`UnitOfWork::is_active`] first. Provider failures propagate
    /// and leave the session inert.
    pub async fn begin(&self) -> Result<(), AppError> {
        {
            let mut session = self.lock();
            if session.active {
                return Err(AppError::UnitOfWorkAlreadyActive);
            }
            // Reserve the session before awaiting the provider.
            session.active = true;
            session.events.clear();
        }

        match self.provider.begin_transaction().await {
            Ok(transaction) => {
                self.lock().transaction = Some(transaction);
                Ok(())
            }
            Err(error) => {
                self.lock().active = false;
                Err(error)
            }
        }
    }

    /// Commits the session: the persistence transaction first, then — only
    /// if that succeeded — the buffered events, in insertion order.
    ///
    /// A failed event dispatch is logged and does not abort dispatch of the
    /// remaining events: once the commit is durable the command has
    /// succeeded, and one bad subscriber must not corrupt that guarantee.
    ///
    /// # Errors
    ///
    /// [`AppError::UnitOfWorkNotActive`] without an open session. If the
    /// transaction commit fails, the transaction is rolled back, buffered
    /// events are discarded, and the commit error is returned — unless the
    /// rollback itself fails, in which case that failure surfaces instead.
    /// The session is inert afterwards in every case.
    pub async fn commit(&self) -> Result<(), AppError> {
        let (mut transaction, events) = {
            let mut session = self.lock();
            if !session.active {
                return Err(AppError::UnitOfWorkNotActive);
            }
            let transaction = session.transaction.take().ok_or_else(|| {
                AppError::Internal("active unit of work has no open transaction".to_owned())
            })?;
            let events = std::mem::take(&mut session.events);
            // The session is terminal from here on.
            session.active = false;
            (transaction, events)
        };

        match transaction.commit().await {
            Ok(()) => {
                self.flush(events).await;
                Ok(())
            }
            Err(commit_error) => match transaction.rollback().await {
                Ok(()) => Err(commit_error),
                Err(rollback_error) => Err(rollback_error),
            },
        }
    }

    /// Aborts the session, discarding the transaction's writes and every
    /// buffered event. A no-op when no session is active.
    ///
    /// # Errors
    ///
    /// Propagates a failing rollback from the persistence layer.
    pub async fn rollback(&self) -> Result<(), AppError> {
        let transaction = {
            let mut session = self.lock();
            if !session.active {
                return Ok(());
            }
            session.active = false;
            session.events.clear();
            session.transaction.take()
        };

        match transaction {
            Some(mut transaction) => transaction.rollback().await,
            None => Ok(()),
        }
    }

    /// Buffers `event` for dispatch after commit when a session is active.
    ///
    /// Without an active session the event is published immediately through
    /// the Event Bus — domain events are never silently dropped just because
    /// no transactional context surrounds them.
    ///
    /// # Errors
    ///
    /// Only the immediate-dispatch path can fail, with whatever the Event
    /// Bus raises.
    pub async fn collect_event(&self, event: Arc<dyn DomainEvent>) -> Result<(), AppError> {
        {
            let mut session = self.lock();
            if session.active {
                session.events.push(event);
                return Ok(());
            }
        }
        self.event_bus.publish(event.as_ref()).await
    }

    /// Drains an aggregate's recorded events into [`UnitOfWork::collect_event`].
    ///
    /// # Errors
    ///
    /// See [`UnitOfWork::collect_event`].
    pub async fn collect_from(&self, aggregate: &mut dyn AggregateRoot) -> Result<(), AppError> {
        for event in aggregate.pull_domain_events() {
            self.collect_event(event).await?;
        }
        Ok(())
    }

    /// Whether a session is currently open.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.lock().active
    }

    /// Snapshot of the buffered events, in insertion order.
    #[must_use]
    pub fn collected_events(&self) -> Vec<Arc<dyn DomainEvent>> {
        self.lock().events.clone()
    }

    /// Discards buffered events without dispatching them.
    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    async fn flush(&self, events: Vec<Arc<dyn DomainEvent>>) {
        for event in events {
            if let Err(error) = self.event_bus.publish(event.as_ref()).await {
                tracing::error!(
                    event = event.event_name(),
                    event_id = %event.metadata().event_id,
                    %error,
                    "failed to dispatch domain event after commit",
                );
            }
        }
    }
}

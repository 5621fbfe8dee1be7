//! Middleware pipeline — an ordered chain of interceptors wrapping a
//! terminal handler call.
//!
//! Each middleware receives the message and a [`Next`] continuation. Calling
//! `next.run().await` executes the remainder of the chain (ending in the
//! terminal handler); returning without calling it short-circuits the
//! dispatch, as a cache hit or an async off-load does. Middlewares may
//! substitute the *result*, never the message.

use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use herald_core::error::AppError;
use herald_core::message::Message;

/// Boxed future used throughout the dispatch machinery.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The type-erased value a dispatch produces. `None` for handlers that
/// return nothing (commands with no result, events).
pub type DispatchValue = Option<Arc<dyn Any + Send + Sync>>;

/// The outcome of a dispatch: a value or a single propagated error.
pub type DispatchResult = Result<DispatchValue, AppError>;

/// Recovers a typed result from a [`DispatchValue`].
#[must_use]
pub fn value_as<R: Send + Sync + 'static>(value: &DispatchValue) -> Option<Arc<R>> {
    value.clone().and_then(|v| v.downcast::<R>().ok())
}

/// An interceptor in a bus pipeline.
///
/// `M` is the bus's message kind (`dyn Command`, `dyn Query`, or
/// `dyn DomainEvent`), so a middleware only ever sees the messages of the
/// bus it is configured on.
#[async_trait]
pub trait Middleware<M: Message + ?Sized>: Send + Sync {
    /// Handles `message`, continuing the chain through `next` exactly once
    /// or returning directly to short-circuit.
    async fn handle(&self, message: &M, next: Next<'_, M>) -> DispatchResult;
}

/// The terminal step of a pipeline — resolves and invokes the handler.
#[async_trait]
pub trait Terminal<M: Message + ?Sized>: Send + Sync {
    /// Invokes the handler bound to the message's runtime type.
    async fn call(&self, message: &M) -> DispatchResult;
}

/// Continuation handed to each middleware: the rest of the chain plus the
/// terminal handler, already bound to the message being dispatched.
pub struct Next<'a, M: Message + ?Sized> {
    message: &'a M,
    chain: &'a [Arc<dyn Middleware<M>>],
    terminal: &'a dyn Terminal<M>,
}

impl<'a, M: Message + ?Sized> Next<'a, M> {
    /// Runs the remainder of the pipeline.
    pub fn run(self) -> BoxFuture<'a, DispatchResult> {
        match self.chain.split_first() {
            Some((head, rest)) => head.handle(
                self.message,
                Next {
                    message: self.message,
                    chain: rest,
                    terminal: self.terminal,
                },
            ),
            None => self.terminal.call(self.message),
        }
    }
}

/// An ordered middleware chain for one bus.
///
/// Order is fixed at configuration time; adding middleware during dispatch
/// from another context is possible but unsupported.
pub struct Pipeline<M: Message + ?Sized> {
    middlewares: RwLock<Vec<Arc<dyn Middleware<M>>>>,
}

impl<M: Message + ?Sized> Default for Pipeline<M> {
    fn default() -> Self {
        Self {
            middlewares: RwLock::new(Vec::new()),
        }
    }
}

impl<M: Message + ?Sized> Pipeline<M> {
    /// Creates an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a middleware to the end of the chain.
    pub fn add(&self, middleware: Arc<dyn Middleware<M>>) {
        self.middlewares
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(middleware);
    }

    /// Number of configured middlewares.
    #[must_use]
    pub fn len(&self) -> usize {
        self.middlewares
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether the pipeline has no middleware.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Executes the chain around `terminal` for one message.
    pub async fn execute(&self, message: &M, terminal: &dyn Terminal<M>) -> DispatchResult {
        let chain = self
            .middlewares
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        Next {
            message,
            chain: &chain,
            terminal,
        }
        .run()
        .await
    }
}

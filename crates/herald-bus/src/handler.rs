//! Handler contracts and the type-erased adapters the buses store.
//!
//! Handlers are registered as constructed instances (explicit dependency
//! injection) and bound to their message type at compile time; the bus keeps
//! an erased adapter keyed by the message's [`TypeId`].

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use herald_core::error::AppError;
use herald_core::event::DomainEvent;
use herald_core::message::{Command, Message, Query};

use crate::pipeline::{DispatchResult, DispatchValue, Terminal};

/// Handles one command type.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// The handler's result. Use `()` for commands with no return value;
    /// it surfaces to the caller as `None`.
    type Output: Send + Sync + 'static;

    /// Executes the command.
    async fn handle(&self, command: &C) -> Result<Self::Output, AppError>;
}

/// Handles one query type.
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    /// The query's result object.
    type Output: Send + Sync + 'static;

    /// Answers the query. Side-effect-free by convention.
    async fn handle(&self, query: &Q) -> Result<Self::Output, AppError>;
}

/// Handles (or listens to) one domain event type.
#[async_trait]
pub trait EventHandler<E: DomainEvent>: Send + Sync {
    /// Reacts to the event.
    async fn handle(&self, event: &E) -> Result<(), AppError>;
}

/// A handler with its message type erased, invokable from the pipeline.
#[async_trait]
pub(crate) trait ErasedHandler<M: Message + ?Sized>: Send + Sync {
    async fn invoke(&self, message: &M) -> DispatchResult;
}

fn wrap_output<T: Send + Sync + 'static>(value: T) -> DispatchValue {
    if TypeId::of::<T>() == TypeId::of::<()>() {
        None
    } else {
        Some(Arc::new(value))
    }
}

fn downcast<'m, M: Message + ?Sized, C: Any>(message: &'m M) -> Result<&'m C, AppError> {
    message.as_any().downcast_ref::<C>().ok_or_else(|| {
        AppError::Internal(format!(
            "handler bound to {} received message {}",
            std::any::type_name::<C>(),
            message.message_name(),
        ))
    })
}

pub(crate) struct CommandAdapter<C, H> {
    handler: H,
    _message: PhantomData<fn(C)>,
}

impl<C, H> CommandAdapter<C, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _message: PhantomData,
        }
    }
}

#[async_trait]
impl<C, H> ErasedHandler<dyn Command> for CommandAdapter<C, H>
where
    C: Command,
    H: CommandHandler<C> + 'static,
{
    async fn invoke(&self, message: &dyn Command) -> DispatchResult {
        let command = downcast::<_, C>(message)?;
        let output = self.handler.handle(command).await?;
        Ok(wrap_output(output))
    }
}

pub(crate) struct QueryAdapter<Q, H> {
    handler: H,
    _message: PhantomData<fn(Q)>,
}

impl<Q, H> QueryAdapter<Q, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _message: PhantomData,
        }
    }
}

#[async_trait]
impl<Q, H> ErasedHandler<dyn Query> for QueryAdapter<Q, H>
where
    Q: Query,
    H: QueryHandler<Q> + 'static,
{
    async fn invoke(&self, message: &dyn Query) -> DispatchResult {
        let query = downcast::<_, Q>(message)?;
        let output = self.handler.handle(query).await?;
        Ok(wrap_output(output))
    }
}

pub(crate) struct EventAdapter<E, H> {
    handler: H,
    _message: PhantomData<fn(E)>,
}

impl<E, H> EventAdapter<E, H> {
    pub(crate) fn new(handler: H) -> Self {
        Self {
            handler,
            _message: PhantomData,
        }
    }
}

#[async_trait]
impl<E, H> ErasedHandler<dyn DomainEvent> for EventAdapter<E, H>
where
    E: DomainEvent,
    H: EventHandler<E> + 'static,
{
    async fn invoke(&self, message: &dyn DomainEvent) -> DispatchResult {
        let event = downcast::<_, E>(message)?;
        self.handler.handle(event).await?;
        Ok(None)
    }
}

/// Message-type → handler bindings for a bus. One binding per message type;
/// the last registration wins.
pub(crate) struct HandlerMap<M: Message + ?Sized> {
    map: RwLock<HashMap<TypeId, Arc<dyn ErasedHandler<M>>>>,
}

impl<M: Message + ?Sized> Default for HandlerMap<M> {
    fn default() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }
}

impl<M: Message + ?Sized> HandlerMap<M> {
    pub(crate) fn insert(&self, key: TypeId, handler: Arc<dyn ErasedHandler<M>>) {
        self.map
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, handler);
    }

    pub(crate) fn resolve(&self, message: &M) -> Option<Arc<dyn ErasedHandler<M>>> {
        self.map
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message.as_any().type_id())
            .cloned()
    }
}

/// Terminal for command and query pipelines: exactly one handler must be
/// bound, otherwise the dispatch fails as a configuration error.
#[async_trait]
impl<M: Message + ?Sized> Terminal<M> for HandlerMap<M> {
    async fn call(&self, message: &M) -> DispatchResult {
        match self.resolve(message) {
            Some(handler) => handler.invoke(message).await,
            None => Err(AppError::HandlerMissing(message.message_name().to_owned())),
        }
    }
}

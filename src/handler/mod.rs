//! Handler contract and the per-backend registry.
//!
//! A backend registers one [`OperationHandler`] per concrete operation type
//! while it is being set up. The registry is keyed by [`TypeId`], so lookup
//! matches the exact runtime type of the operation and nothing else.

pub mod limit;
pub mod sort;

use std::{
    any::{Any, TypeId},
    fmt,
    marker::PhantomData,
    sync::Arc,
};

use ahash::AHashMap;
use tracing::debug;

use crate::{
    context::Context,
    errors::GraphOpsError,
    operation::{Limit, Operation, Sort},
    stream::ElementStream,
};

pub use limit::LimitHandler;
pub use sort::SortHandler;

/// `Ok(None)` is "no result", which is not the same as an empty stream.
pub type HandlerOutput = Result<Option<ElementStream>, GraphOpsError>;

pub trait OperationHandler<Op: Operation, B>: Send + Sync {
    fn execute(&self, operation: Op, context: &Context, backend: &Arc<B>) -> HandlerOutput;
}

pub(crate) trait ErasedHandler<B>: Send + Sync {
    fn execute_any(
        &self,
        operation: Box<dyn Any + Send>,
        context: &Context,
        backend: &Arc<B>,
    ) -> HandlerOutput;
}

struct Typed<Op, H> {
    handler: H,
    _operation: PhantomData<fn(Op)>,
}

impl<Op, B, H> ErasedHandler<B> for Typed<Op, H>
where
    Op: Operation,
    H: OperationHandler<Op, B>,
{
    fn execute_any(
        &self,
        operation: Box<dyn Any + Send>,
        context: &Context,
        backend: &Arc<B>,
    ) -> HandlerOutput {
        let operation = operation.downcast::<Op>().map_err(|_| {
            GraphOpsError::backend(format!("handler for {} got another type", Op::type_name()))
        })?;
        self.handler.execute(*operation, context, backend)
    }
}

pub(crate) struct Registration<B> {
    pub(crate) operation: &'static str,
    pub(crate) handler: Arc<dyn ErasedHandler<B>>,
}

pub struct HandlerRegistry<B> {
    handlers: AHashMap<TypeId, Registration<B>>,
}

impl<B: 'static> HandlerRegistry<B> {
    pub fn new() -> Self {
        Self {
            handlers: AHashMap::new(),
        }
    }

    /// Registry preloaded with the backend-independent handlers
    /// ([`SortHandler`], [`LimitHandler`]).
    pub fn with_core_handlers() -> Self {
        let mut registry = Self::new();
        registry.register::<Sort, _>(SortHandler);
        registry.register::<Limit, _>(LimitHandler);
        registry
    }

    /// Registers `handler` for `Op`, replacing any previous one.
    pub fn register<Op, H>(&mut self, handler: H)
    where
        Op: Operation,
        H: OperationHandler<Op, B> + 'static,
    {
        let operation = Op::type_name();
        let replaced = self
            .handlers
            .insert(
                TypeId::of::<Op>(),
                Registration {
                    operation,
                    handler: Arc::new(Typed {
                        handler,
                        _operation: PhantomData,
                    }),
                },
            )
            .is_some();
        debug!(operation, replaced, "registered operation handler");
    }

    pub fn supports<Op: Operation>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<Op>())
    }

    /// Names of the supported operation types, sorted.
    pub fn supported_operations(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.handlers.values().map(|r| r.operation).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub(crate) fn lookup(&self, type_id: TypeId) -> Option<&Registration<B>> {
        self.handlers.get(&type_id)
    }
}

impl<B: 'static> Default for HandlerRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: 'static> fmt::Debug for HandlerRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("operations", &self.supported_operations())
            .finish()
    }
}

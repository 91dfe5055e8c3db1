//! Store-agnostic dispatcher.
//!
//! [`Executor`] owns a backend handle and the registry built for it. It looks
//! up the handler for an operation's exact runtime type, invokes it, and tags
//! every failure with the operation type, both at dispatch and for errors
//! that surface later while the returned stream is pulled.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    context::Context,
    errors::GraphOpsError,
    handler::{HandlerOutput, HandlerRegistry},
    operation::Operation,
};

pub struct Executor<B> {
    backend: Arc<B>,
    registry: HandlerRegistry<B>,
}

impl<B: Send + Sync + 'static> Executor<B> {
    pub fn new(backend: Arc<B>, registry: HandlerRegistry<B>) -> Self {
        Self { backend, registry }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn registry(&self) -> &HandlerRegistry<B> {
        &self.registry
    }

    pub fn supports<Op: Operation>(&self) -> bool {
        self.registry.supports::<Op>()
    }

    pub fn execute<Op: Operation>(&self, operation: Op, context: &Context) -> HandlerOutput {
        self.execute_boxed(Box::new(operation), context)
    }

    /// Dispatches on the concrete type behind the box.
    ///
    /// `UnsupportedOperation` is returned before any handler runs. A
    /// context that is already cancelled fails with `Cancelled`. The result
    /// stream stops with a `Cancelled` error once the context is cancelled
    /// mid-pull.
    pub fn execute_boxed(&self, operation: Box<dyn Operation>, context: &Context) -> HandlerOutput {
        let name = operation.operation_type();
        let Some(registration) = self.registry.lookup(operation.as_any().type_id()) else {
            warn!(operation = name, trace_id = %context.trace_id(), "no handler registered");
            return Err(GraphOpsError::unsupported(name));
        };
        if context.is_cancelled() {
            return Err(GraphOpsError::Cancelled { operation: name });
        }
        debug!(operation = name, trace_id = %context.trace_id(), "executing operation");
        let output = registration
            .handler
            .execute_any(operation.into_any(), context, &self.backend)
            .map_err(|err| {
                let err = err.tag(name);
                warn!(
                    operation = name,
                    trace_id = %context.trace_id(),
                    error = %err,
                    "operation failed"
                );
                err
            })?;
        Ok(output.map(|stream| {
            stream
                .guard(context.cancellation().clone())
                .map_err(move |err| err.tag(name))
        }))
    }
}

impl<B> std::fmt::Debug for Executor<B>
where
    B: Send + Sync + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use uuid::Uuid;

use crate::errors::GraphOpsError;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct User {
    pub user_id: String,
    pub data_auths: Vec<String>,
}

impl User {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            data_auths: Vec::new(),
        }
    }

    pub fn with_auths<I, S>(mut self, auths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.data_auths = auths.into_iter().map(Into::into).collect();
        self
    }
}

/// Shared cancellation flag. Clones observe the same signal.
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Request-scoped metadata forwarded untouched to handlers.
#[derive(Clone, Debug)]
pub struct Context {
    user: User,
    trace_id: Uuid,
    cancellation: CancellationFlag,
}

impl Context {
    pub fn new(user: User) -> Self {
        Self {
            user,
            trace_id: Uuid::new_v4(),
            cancellation: CancellationFlag::default(),
        }
    }

    pub fn with_trace_id(mut self, trace_id: Uuid) -> Self {
        self.trace_id = trace_id;
        self
    }

    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn trace_id(&self) -> Uuid {
        self.trace_id
    }

    pub fn cancellation(&self) -> &CancellationFlag {
        &self.cancellation
    }

    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Raw interruption error for use inside handlers and backends.
    pub fn check_cancelled(&self) -> Result<(), GraphOpsError> {
        if self.is_cancelled() {
            Err(GraphOpsError::interrupted(format!(
                "request {} cancelled",
                self.trace_id
            )))
        } else {
            Ok(())
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(User::default())
    }
}

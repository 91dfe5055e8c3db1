use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphOpsError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unsupported operation: {operation}")]
    UnsupportedOperation { operation: &'static str },
    #[error("operation {operation} failed: {source}")]
    Execution {
        operation: &'static str,
        #[source]
        source: Box<GraphOpsError>,
    },
    #[error("operation {operation} cancelled")]
    Cancelled { operation: &'static str },
    #[error("backend error: {0}")]
    Backend(String),
    #[error("interrupted: {0}")]
    Interrupted(String),
}

impl GraphOpsError {
    pub fn validation<T: Into<String>>(msg: T) -> Self {
        GraphOpsError::Validation(msg.into())
    }

    pub fn unsupported(operation: &'static str) -> Self {
        GraphOpsError::UnsupportedOperation { operation }
    }

    pub fn backend<T: Into<String>>(msg: T) -> Self {
        GraphOpsError::Backend(msg.into())
    }

    pub fn interrupted<T: Into<String>>(msg: T) -> Self {
        GraphOpsError::Interrupted(msg.into())
    }

    /// Attaches the operation type to a raw failure.
    ///
    /// Already tagged errors pass through untouched; interruptions become
    /// [`GraphOpsError::Cancelled`] and everything else is wrapped in
    /// [`GraphOpsError::Execution`].
    pub fn tag(self, operation: &'static str) -> Self {
        match self {
            err @ (GraphOpsError::Execution { .. } | GraphOpsError::Cancelled { .. }) => err,
            GraphOpsError::Interrupted(_) => GraphOpsError::Cancelled { operation },
            other => GraphOpsError::Execution {
                operation,
                source: Box::new(other),
            },
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            GraphOpsError::Cancelled { .. } | GraphOpsError::Interrupted(_)
        )
    }

    /// Operation type carried by the error, if it has been tagged.
    pub fn operation(&self) -> Option<&'static str> {
        match self {
            GraphOpsError::UnsupportedOperation { operation }
            | GraphOpsError::Execution { operation, .. }
            | GraphOpsError::Cancelled { operation } => Some(*operation),
            _ => None,
        }
    }
}

use std::{num::NonZeroUsize, sync::Arc};

use super::{HandlerOutput, OperationHandler};
use crate::{
    context::Context,
    errors::GraphOpsError,
    operation::Limit,
    stream::{ElementStream, StreamItem},
};

/// Backend-independent handler for [`Limit`]. Lazy; the input is closed as
/// soon as the limit is reached.
#[derive(Clone, Copy, Debug, Default)]
pub struct LimitHandler;

impl<B> OperationHandler<Limit, B> for LimitHandler {
    fn execute(&self, operation: Limit, _context: &Context, _backend: &Arc<B>) -> HandlerOutput {
        let (input, limit, truncate) = operation.into_parts();
        let Some(input) = input else {
            return Ok(None);
        };
        Ok(Some(ElementStream::new(Limited {
            input,
            limit,
            remaining: limit.get(),
            truncate,
            done: false,
        })))
    }
}

struct Limited {
    input: ElementStream,
    limit: NonZeroUsize,
    remaining: usize,
    truncate: bool,
    done: bool,
}

impl Iterator for Limited {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        if self.done {
            return None;
        }
        if self.remaining == 0 {
            // Only reached without truncation: one more item is an overflow.
            self.done = true;
            let overflow = match self.input.next() {
                Some(Ok(_)) => Some(Err(GraphOpsError::backend(format!(
                    "limit of {} exceeded",
                    self.limit
                )))),
                other => other,
            };
            self.input.close();
            return overflow;
        }
        self.remaining -= 1;
        let item = self.input.next();
        if item.is_none() {
            self.done = true;
        } else if self.remaining == 0 && self.truncate {
            self.done = true;
            self.input.close();
        }
        item
    }
}

use std::sync::Arc;

use tracing::trace;

use super::{HandlerOutput, OperationHandler};
use crate::{context::Context, operation::Sort, stream::ElementStream, topk::sort_bounded};

/// Backend-independent handler for [`Sort`].
///
/// * no input: no result;
/// * no comparator: the input, untouched (nulls included);
/// * otherwise: nulls dropped, bounded top-k, fully materialised.
///
/// The input is closed once consumed, including when a pull fails.
#[derive(Clone, Copy, Debug, Default)]
pub struct SortHandler;

impl<B> OperationHandler<Sort, B> for SortHandler {
    fn execute(&self, operation: Sort, context: &Context, _backend: &Arc<B>) -> HandlerOutput {
        let parts = operation.into_parts();
        let Some(input) = parts.input else {
            return Ok(None);
        };
        let Some(comparator) = parts.comparator else {
            return Ok(Some(input));
        };
        let mut input = input.guard(context.cancellation().clone());
        let sorted = sort_bounded(
            &mut input,
            comparator.as_ref(),
            parts.reversed,
            parts.result_limit,
        );
        input.close();
        let sorted = sorted?;
        trace!(
            kept = sorted.len(),
            limit = ?parts.result_limit,
            reversed = parts.reversed,
            "sorted input"
        );
        Ok(Some(ElementStream::from_elements(sorted)))
    }
}

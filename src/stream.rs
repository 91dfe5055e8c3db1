//! Lazy element sequences with a deterministic close path.
//!
//! Items are `Result<Option<Element>, _>`; `None` is a null entry, which
//! only a sort with a comparator discards. The close hook runs exactly once:
//! on exhaustion, on an explicit [`ElementStream::close`], or on drop.

use std::{fmt, iter, mem};

use crate::{context::CancellationFlag, element::Element, errors::GraphOpsError};

pub type StreamItem = Result<Option<Element>, GraphOpsError>;

type BoxedItems = Box<dyn Iterator<Item = StreamItem> + Send>;
type CloseHook = Box<dyn FnOnce() + Send>;

pub struct ElementStream {
    items: BoxedItems,
    on_close: Option<CloseHook>,
    closed: bool,
}

impl ElementStream {
    pub fn new<I>(items: I) -> Self
    where
        I: IntoIterator<Item = StreamItem>,
        I::IntoIter: Send + 'static,
    {
        Self {
            items: Box::new(items.into_iter()),
            on_close: None,
            closed: false,
        }
    }

    pub fn empty() -> Self {
        Self::new(iter::empty())
    }

    pub fn from_elements<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Element>,
        I::IntoIter: Send + 'static,
    {
        Self::new(elements.into_iter().map(|element| Ok(Some(element))))
    }

    pub fn from_nullable<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Option<Element>>,
        I::IntoIter: Send + 'static,
    {
        Self::new(elements.into_iter().map(Ok))
    }

    /// Registers a release hook. Hooks compose: the earlier one runs first.
    pub fn on_close<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_close = Some(match self.on_close.take() {
            Some(previous) => Box::new(move || {
                previous();
                hook();
            }),
            None => Box::new(hook),
        });
        self
    }

    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.items = Box::new(iter::empty());
        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Rewraps the underlying items, carrying the close hook over.
    fn adapt<F>(mut self, wrap: F) -> Self
    where
        F: FnOnce(BoxedItems) -> BoxedItems,
    {
        let items = mem::replace(&mut self.items, Box::new(iter::empty()));
        let on_close = self.on_close.take();
        let closed = self.closed;
        self.closed = true;
        Self {
            items: wrap(items),
            on_close,
            closed,
        }
    }

    pub fn map_err<F>(self, mut f: F) -> Self
    where
        F: FnMut(GraphOpsError) -> GraphOpsError + Send + 'static,
    {
        self.adapt(|items| Box::new(items.map(move |item| item.map_err(&mut f))))
    }

    /// Ends the stream with a single interruption error once `flag` is set.
    pub fn guard(self, flag: CancellationFlag) -> Self {
        self.adapt(|items| {
            Box::new(Guarded {
                items,
                flag,
                tripped: false,
            })
        })
    }

    pub fn collect_nullable(self) -> Result<Vec<Option<Element>>, GraphOpsError> {
        self.collect()
    }

    /// Collects the non-null elements, failing on the first error.
    pub fn collect_elements(self) -> Result<Vec<Element>, GraphOpsError> {
        let mut out = Vec::new();
        for item in self {
            if let Some(element) = item? {
                out.push(element);
            }
        }
        Ok(out)
    }
}

impl Iterator for ElementStream {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        if self.closed {
            return None;
        }
        let item = self.items.next();
        if item.is_none() {
            self.close();
        }
        item
    }
}

impl Drop for ElementStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ElementStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElementStream")
            .field("closed", &self.closed)
            .field("has_close_hook", &self.on_close.is_some())
            .finish_non_exhaustive()
    }
}

struct Guarded {
    items: BoxedItems,
    flag: CancellationFlag,
    tripped: bool,
}

impl Iterator for Guarded {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        if self.tripped {
            return None;
        }
        if self.flag.is_cancelled() {
            self.tripped = true;
            return Some(Err(GraphOpsError::interrupted("stream pull cancelled")));
        }
        self.items.next()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::element::Entity;

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let hook_count = Arc::clone(&count);
        (count, move || {
            hook_count.fetch_add(1, Ordering::SeqCst);
        })
    }

    fn entities(n: usize) -> Vec<Element> {
        (0..n)
            .map(|i| Entity::new("g", format!("v{i}")).into())
            .collect()
    }

    #[test]
    fn test_close_runs_once_on_exhaustion() {
        let (count, hook) = counter();
        let mut stream = ElementStream::from_elements(entities(2)).on_close(hook);
        assert!(stream.next().is_some());
        assert!(stream.next().is_some());
        assert!(stream.next().is_none());
        assert!(stream.is_closed());
        drop(stream);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_runs_on_early_drop() {
        let (count, hook) = counter();
        let mut stream = ElementStream::from_elements(entities(5)).on_close(hook);
        assert!(stream.next().is_some());
        drop(stream);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_adapters_keep_close_hook() {
        let (count, hook) = counter();
        let stream = ElementStream::from_elements(entities(3))
            .on_close(hook)
            .map_err(|e| e.tag("Test"))
            .guard(CancellationFlag::default());
        assert_eq!(stream.collect_elements().expect("elements").len(), 3);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_stops_after_cancellation() {
        let flag = CancellationFlag::default();
        let mut stream = ElementStream::from_elements(entities(3)).guard(flag.clone());
        assert!(matches!(stream.next(), Some(Ok(Some(_)))));
        flag.cancel();
        let err = stream.next().expect("item").unwrap_err();
        assert!(err.is_cancelled());
        assert!(stream.next().is_none());
    }
}

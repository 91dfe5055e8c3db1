//! Bounded top-k selection over a stream of elements.
//!
//! [`LimitedSortedSet`] is a tree-backed multiset capped at `limit` entries.
//! Inserting costs O(log k); once full, the worst entry is evicted, so a
//! whole pass over n elements runs in O(n log k) time and O(k) space. Ties
//! under the comparator are kept as separate entries; which of several tied
//! elements survives an eviction is unspecified.

use std::{cmp::Ordering, collections::BTreeSet, num::NonZeroUsize};

use crate::{
    element::Element, errors::GraphOpsError, operation::ElementComparator, stream::StreamItem,
};

#[derive(Clone, Copy)]
struct Order<'c> {
    comparator: &'c dyn ElementComparator,
    reversed: bool,
}

impl Order<'_> {
    fn compare(&self, a: &Element, b: &Element) -> Ordering {
        let ord = self.comparator.compare(a, b);
        if self.reversed { ord.reverse() } else { ord }
    }
}

struct Ranked<'c> {
    order: Order<'c>,
    seq: u64,
    element: Element,
}

impl Ord for Ranked<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order
            .compare(&self.element, &other.element)
            .then(self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for Ranked<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked<'_> {}

pub struct LimitedSortedSet<'c> {
    order: Order<'c>,
    limit: Option<NonZeroUsize>,
    entries: BTreeSet<Ranked<'c>>,
    next_seq: u64,
}

impl<'c> LimitedSortedSet<'c> {
    pub fn new(
        comparator: &'c dyn ElementComparator,
        reversed: bool,
        limit: Option<NonZeroUsize>,
    ) -> Self {
        Self {
            order: Order {
                comparator,
                reversed,
            },
            limit,
            entries: BTreeSet::new(),
            next_seq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_full(&self) -> bool {
        self.limit
            .is_some_and(|limit| self.entries.len() >= limit.get())
    }

    /// Inserts `element`, evicting the worst entry when over the limit.
    /// Returns `false` when the element was not retained.
    pub fn insert(&mut self, element: Element) -> bool {
        if self.is_full() {
            // A full set only accepts strictly better elements; an equal one
            // would rank after the current worst and be evicted straight away.
            if let Some(worst) = self.entries.last() {
                if self.order.compare(&element, &worst.element) != Ordering::Less {
                    return false;
                }
            }
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(Ranked {
            order: self.order,
            seq,
            element,
        });
        if let Some(limit) = self.limit {
            if self.entries.len() > limit.get() {
                self.entries.pop_last();
            }
        }
        true
    }

    /// Entries best-first.
    pub fn into_sorted_vec(self) -> Vec<Element> {
        self.entries.into_iter().map(|ranked| ranked.element).collect()
    }
}

/// Drains `items`, skipping nulls, and returns the best `limit` elements in
/// order. The first error pulled from `items` aborts the pass.
pub fn sort_bounded<I>(
    items: I,
    comparator: &dyn ElementComparator,
    reversed: bool,
    limit: Option<NonZeroUsize>,
) -> Result<Vec<Element>, GraphOpsError>
where
    I: IntoIterator<Item = StreamItem>,
{
    let mut set = LimitedSortedSet::new(comparator, reversed, limit);
    for item in items {
        if let Some(element) = item? {
            set.insert(element);
        }
    }
    Ok(set.into_sorted_vec())
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
    use serde_json::json;

    use super::*;
    use crate::{element::Entity, operation::ElementPropertyComparator};

    fn numbered(n: i64) -> Element {
        Entity::new("n", format!("v{n}"))
            .with_property("n", json!(n))
            .into()
    }

    fn numbers(elements: &[Element]) -> Vec<i64> {
        elements
            .iter()
            .map(|e| e.property("n").and_then(|v| v.as_i64()).expect("n"))
            .collect()
    }

    #[test]
    fn test_keeps_smallest_under_limit() {
        let cmp = ElementPropertyComparator::new("n");
        let items = [5, 3, 9, 1].map(|n| Ok(Some(numbered(n))));
        let out = sort_bounded(items, &cmp, false, NonZeroUsize::new(2)).expect("sorted");
        assert_eq!(numbers(&out), vec![1, 3]);
    }

    #[test]
    fn test_ties_are_kept_as_separate_entries() {
        let cmp = ElementPropertyComparator::new("n");
        let mut set = LimitedSortedSet::new(&cmp, false, NonZeroUsize::new(3));
        for n in [2, 2, 2, 2, 1] {
            set.insert(numbered(n));
        }
        assert_eq!(set.len(), 3);
        assert_eq!(numbers(&set.into_sorted_vec()), vec![1, 2, 2]);
    }

    #[test]
    fn test_full_set_rejects_worse_candidates() {
        let cmp = ElementPropertyComparator::new("n");
        let mut set = LimitedSortedSet::new(&cmp, false, NonZeroUsize::new(1));
        assert!(set.insert(numbered(4)));
        assert!(!set.insert(numbered(7)));
        assert!(!set.insert(numbered(4)));
        assert!(set.insert(numbered(0)));
        assert_eq!(numbers(&set.into_sorted_vec()), vec![0]);
    }

    #[test]
    fn test_matches_full_sort_on_shuffled_input() {
        let cmp = ElementPropertyComparator::new("n");
        let mut values: Vec<i64> = (0..500).collect();
        values.shuffle(&mut StdRng::seed_from_u64(0x5EED));
        for limit in [1usize, 7, 100, 500, 1000] {
            let items = values.iter().map(|&n| Ok(Some(numbered(n))));
            let out = sort_bounded(items, &cmp, true, NonZeroUsize::new(limit)).expect("sorted");
            let expected: Vec<i64> = (0..500).rev().take(limit).collect();
            assert_eq!(numbers(&out), expected);
        }
    }

    #[test]
    fn test_error_aborts_pass() {
        let cmp = ElementPropertyComparator::new("n");
        let items = vec![
            Ok(Some(numbered(1))),
            Err(GraphOpsError::backend("boom")),
            Ok(Some(numbered(2))),
        ];
        let err = sort_bounded(items, &cmp, false, None).unwrap_err();
        assert!(matches!(err, GraphOpsError::Backend(_)));
    }
}

//! Post-processing operations over an element stream: [`Sort`] and [`Limit`],
//! plus the comparators a sort orders by.

use std::{cmp::Ordering, fmt, num::NonZeroUsize, sync::Arc};

use serde_json::{Number, Value};

use super::{OperationBuilder, OperationCommon, impl_operation};
use crate::{element::Element, errors::GraphOpsError, stream::ElementStream};

pub trait ElementComparator: Send + Sync + fmt::Debug {
    fn compare(&self, a: &Element, b: &Element) -> Ordering;
}

impl<C: ElementComparator + ?Sized> ElementComparator for Arc<C> {
    fn compare(&self, a: &Element, b: &Element) -> Ordering {
        (**self).compare(a, b)
    }
}

/// Orders by one property of elements in the given groups.
///
/// Elements outside the groups, or missing the property, sort after every
/// element that has it. An empty group list accepts every group.
#[derive(Clone, Debug, Default)]
pub struct ElementPropertyComparator {
    groups: Vec<String>,
    property: String,
    reversed: bool,
}

impl ElementPropertyComparator {
    pub fn new(property: impl Into<String>) -> Self {
        Self {
            groups: Vec::new(),
            property: property.into(),
            reversed: false,
        }
    }

    pub fn groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups = groups.into_iter().map(Into::into).collect();
        self
    }

    /// Reverses the order of present values; missing values stay last.
    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    fn value<'e>(&self, element: &'e Element) -> Option<&'e Value> {
        if !self.groups.is_empty() && !self.groups.iter().any(|g| g == element.group()) {
            return None;
        }
        element.property(&self.property).filter(|v| !v.is_null())
    }
}

impl ElementComparator for ElementPropertyComparator {
    fn compare(&self, a: &Element, b: &Element) -> Ordering {
        match (self.value(a), self.value(b)) {
            (Some(x), Some(y)) => {
                let ord = compare_values(x, y);
                if self.reversed { ord.reverse() } else { ord }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    }
}

/// Total order over JSON values: by kind first, then by value.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => compare_numbers(x, y),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => rank(a).cmp(&rank(b)),
    }
}

/// Integers compare exactly over the whole `i64`/`u64` range; floats only
/// go through `f64` when one side actually is a float.
fn compare_numbers(x: &Number, y: &Number) -> Ordering {
    if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
        return x.cmp(&y);
    }
    if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
        return x.cmp(&y);
    }
    match (x.as_i64(), y.as_i64()) {
        // A negative i64 against a u64 beyond i64::MAX.
        (Some(_), None) if y.is_u64() => Ordering::Less,
        (None, Some(_)) if x.is_u64() => Ordering::Greater,
        _ => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
    }
}

type CompareFn = dyn Fn(&Element, &Element) -> Ordering + Send + Sync;

/// Wraps a closure; the label shows up in `Debug` output.
#[derive(Clone)]
pub struct FnComparator {
    label: String,
    compare: Arc<CompareFn>,
}

impl FnComparator {
    pub fn new<F>(label: impl Into<String>, compare: F) -> Self
    where
        F: Fn(&Element, &Element) -> Ordering + Send + Sync + 'static,
    {
        Self {
            label: label.into(),
            compare: Arc::new(compare),
        }
    }
}

impl fmt::Debug for FnComparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FnComparator").field(&self.label).finish()
    }
}

impl ElementComparator for FnComparator {
    fn compare(&self, a: &Element, b: &Element) -> Ordering {
        (self.compare)(a, b)
    }
}

/// First comparator that tells the elements apart decides.
#[derive(Clone, Debug)]
pub struct ChainedComparator(Vec<Arc<dyn ElementComparator>>);

impl ChainedComparator {
    pub fn new(comparators: Vec<Arc<dyn ElementComparator>>) -> Self {
        Self(comparators)
    }
}

impl ElementComparator for ChainedComparator {
    fn compare(&self, a: &Element, b: &Element) -> Ordering {
        self.0
            .iter()
            .map(|c| c.compare(a, b))
            .find(|ord| *ord != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }
}

/// Orders and optionally truncates its input.
///
/// With a comparator the sort consumes the whole input before yielding
/// anything, even when the input itself is lazy.
#[derive(Debug)]
pub struct Sort {
    common: OperationCommon,
    input: Option<ElementStream>,
    comparator: Option<Arc<dyn ElementComparator>>,
    reversed: bool,
    result_limit: Option<NonZeroUsize>,
}

impl_operation!(Sort, "Sort");

pub(crate) struct SortParts {
    pub input: Option<ElementStream>,
    pub comparator: Option<Arc<dyn ElementComparator>>,
    pub reversed: bool,
    pub result_limit: Option<NonZeroUsize>,
}

impl Sort {
    pub fn builder() -> SortBuilder {
        SortBuilder::default()
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn comparator(&self) -> Option<&Arc<dyn ElementComparator>> {
        self.comparator.as_ref()
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn result_limit(&self) -> Option<usize> {
        self.result_limit.map(NonZeroUsize::get)
    }

    pub(crate) fn into_parts(self) -> SortParts {
        SortParts {
            input: self.input,
            comparator: self.comparator,
            reversed: self.reversed,
            result_limit: self.result_limit,
        }
    }
}

#[derive(Debug, Default)]
pub struct SortBuilder {
    common: OperationCommon,
    input: Option<ElementStream>,
    comparators: Vec<Arc<dyn ElementComparator>>,
    reversed: bool,
    result_limit: Option<usize>,
}

impl SortBuilder {
    pub fn input(mut self, input: ElementStream) -> Self {
        self.input = Some(input);
        self
    }

    /// Adds a comparator; later ones break ties left by earlier ones.
    pub fn comparator<C: ElementComparator + 'static>(mut self, comparator: C) -> Self {
        self.comparators.push(Arc::new(comparator));
        self
    }

    pub fn reversed(mut self, reversed: bool) -> Self {
        self.reversed = reversed;
        self
    }

    pub fn result_limit(mut self, limit: usize) -> Self {
        self.result_limit = Some(limit);
        self
    }

    pub fn build(self) -> Result<Sort, GraphOpsError> {
        let result_limit = match self.result_limit {
            Some(limit) => Some(NonZeroUsize::new(limit).ok_or_else(|| {
                GraphOpsError::validation("Sort result limit must be at least 1")
            })?),
            None => None,
        };
        let mut comparators = self.comparators;
        let comparator = match comparators.len() {
            0 => None,
            1 => comparators.pop(),
            _ => Some(Arc::new(ChainedComparator::new(comparators)) as Arc<dyn ElementComparator>),
        };
        Ok(Sort {
            common: self.common,
            input: self.input,
            comparator,
            reversed: self.reversed,
            result_limit,
        })
    }
}

impl OperationBuilder for SortBuilder {
    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }
}

/// Passes through at most `result_limit` items of its input, lazily.
///
/// With `truncate` off, an input longer than the limit is an error raised
/// after the limit is reached.
#[derive(Debug)]
pub struct Limit {
    common: OperationCommon,
    input: Option<ElementStream>,
    result_limit: NonZeroUsize,
    truncate: bool,
}

impl_operation!(Limit, "Limit");

impl Limit {
    pub fn builder() -> LimitBuilder {
        LimitBuilder::default()
    }

    pub fn has_input(&self) -> bool {
        self.input.is_some()
    }

    pub fn result_limit(&self) -> usize {
        self.result_limit.get()
    }

    pub fn truncate(&self) -> bool {
        self.truncate
    }

    pub(crate) fn into_parts(self) -> (Option<ElementStream>, NonZeroUsize, bool) {
        (self.input, self.result_limit, self.truncate)
    }
}

#[derive(Debug)]
pub struct LimitBuilder {
    common: OperationCommon,
    input: Option<ElementStream>,
    result_limit: Option<usize>,
    truncate: bool,
}

impl Default for LimitBuilder {
    fn default() -> Self {
        Self {
            common: OperationCommon::default(),
            input: None,
            result_limit: None,
            truncate: true,
        }
    }
}

impl LimitBuilder {
    pub fn input(mut self, input: ElementStream) -> Self {
        self.input = Some(input);
        self
    }

    pub fn result_limit(mut self, limit: usize) -> Self {
        self.result_limit = Some(limit);
        self
    }

    pub fn truncate(mut self, truncate: bool) -> Self {
        self.truncate = truncate;
        self
    }

    pub fn build(self) -> Result<Limit, GraphOpsError> {
        let result_limit = self
            .result_limit
            .and_then(NonZeroUsize::new)
            .ok_or_else(|| {
                GraphOpsError::validation("Limit requires a result limit of at least 1")
            })?;
        Ok(Limit {
            common: self.common,
            input: self.input,
            result_limit,
            truncate: self.truncate,
        })
    }
}

impl OperationBuilder for LimitBuilder {
    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::element::{Edge, Entity};

    fn weighted(group: &str, weight: Value) -> Element {
        Edge::new(group, "a", "b", true)
            .with_property("weight", weight)
            .into()
    }

    #[test]
    fn test_property_comparator_puts_missing_last() {
        let cmp = ElementPropertyComparator::new("weight").groups(["road"]);
        let heavy = weighted("road", json!(9));
        let light = weighted("road", json!(1));
        let other_group = weighted("rail", json!(0));
        let missing: Element = Entity::new("road", "a").into();
        assert_eq!(cmp.compare(&light, &heavy), Ordering::Less);
        assert_eq!(cmp.compare(&heavy, &other_group), Ordering::Less);
        assert_eq!(cmp.compare(&missing, &light), Ordering::Greater);

        let desc = cmp.reversed(true);
        assert_eq!(desc.compare(&light, &heavy), Ordering::Greater);
        assert_eq!(desc.compare(&missing, &light), Ordering::Greater);
    }

    #[test]
    fn test_compare_values_mixes_ints_and_floats() {
        assert_eq!(compare_values(&json!(2), &json!(2.5)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("a")), Ordering::Greater);
        assert_eq!(compare_values(&json!(true), &json!(1)), Ordering::Less);
    }

    #[test]
    fn test_compare_values_keeps_large_integers_exact() {
        let max = json!(u64::MAX);
        let below = json!(u64::MAX - 1);
        assert_eq!(compare_values(&below, &max), Ordering::Less);
        assert_eq!(compare_values(&max, &below), Ordering::Greater);
        assert_eq!(compare_values(&json!(-1), &max), Ordering::Less);
        assert_eq!(compare_values(&max, &json!(i64::MIN)), Ordering::Greater);
        let low = json!(9_232_379_236_109_516_800u64);
        let high = json!(9_232_379_236_109_516_801u64);
        assert_eq!(compare_values(&low, &high), Ordering::Less);
        assert_eq!(compare_values(&json!(u64::MAX), &json!(1.5)), Ordering::Greater);
    }

    #[test]
    fn test_top_k_keeps_smallest_large_integer() {
        let cmp = ElementPropertyComparator::new("weight");
        let items = [
            weighted("road", json!(u64::MAX)),
            weighted("road", json!(u64::MAX - 1)),
        ];
        let out = crate::topk::sort_bounded(
            items.map(|e| Ok(Some(e))),
            &cmp,
            false,
            NonZeroUsize::new(1),
        )
        .expect("sorted");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].property("weight"), Some(&json!(u64::MAX - 1)));
    }

    #[test]
    fn test_zero_limits_rejected_at_build() {
        assert!(matches!(
            Sort::builder().result_limit(0).build(),
            Err(GraphOpsError::Validation(_))
        ));
        assert!(matches!(
            Limit::builder().result_limit(0).build(),
            Err(GraphOpsError::Validation(_))
        ));
        assert!(Limit::builder().build().is_err());
    }
}

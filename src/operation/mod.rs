//! Typed, immutable operation descriptors.
//!
//! Every variant embeds an [`OperationCommon`] and implements [`Operation`].
//! Builders implement [`OperationBuilder`] (and [`SeededBuilder`] for lookups)
//! whose methods return `Self`, so variant-specific setters stay reachable
//! anywhere in a chain. Validation happens once, in each builder's `build`.

pub mod compare;
pub mod get;

use std::{any::Any, fmt};

use ahash::AHashMap;

use crate::{seed::Seed, view::View};

pub use compare::{
    ChainedComparator, ElementComparator, ElementPropertyComparator, FnComparator, Limit,
    LimitBuilder, Sort, SortBuilder,
};
pub use get::{
    DirectedType, GetAllElements, GetAllElementsBuilder, GetEdges, GetEdgesBuilder, GetElements,
    GetElementsBuilder, GetEntities, GetEntitiesBuilder, IncludeIncomingOutgoing, SeedMatching,
    SeededOperation,
};

pub type Options = AHashMap<String, String>;

/// Fields shared by every operation variant.
#[derive(Clone, Debug)]
pub struct OperationCommon {
    options: Options,
    view: Option<View>,
    populate_properties: bool,
}

impl Default for OperationCommon {
    fn default() -> Self {
        Self {
            options: Options::default(),
            view: None,
            populate_properties: true,
        }
    }
}

impl OperationCommon {
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    pub fn populate_properties(&self) -> bool {
        self.populate_properties
    }
}

pub trait Operation: Any + Send + fmt::Debug {
    /// Stable identifier used in errors and logs.
    fn type_name() -> &'static str
    where
        Self: Sized;

    fn operation_type(&self) -> &'static str;

    fn common(&self) -> &OperationCommon;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;

    fn options(&self) -> &Options {
        self.common().options()
    }

    fn option(&self, key: &str) -> Option<&str> {
        self.common().options().get(key).map(String::as_str)
    }

    fn view(&self) -> Option<&View> {
        self.common().view()
    }

    fn populate_properties(&self) -> bool {
        self.common().populate_properties()
    }
}

macro_rules! impl_operation {
    ($ty:ty, $name:literal) => {
        impl $crate::operation::Operation for $ty {
            fn type_name() -> &'static str {
                $name
            }

            fn operation_type(&self) -> &'static str {
                $name
            }

            fn common(&self) -> &$crate::operation::OperationCommon {
                &self.common
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn into_any(self: Box<Self>) -> Box<dyn ::std::any::Any + Send> {
                self
            }
        }
    };
}

pub(crate) use impl_operation;

pub trait OperationBuilder: Sized {
    fn common_mut(&mut self) -> &mut OperationCommon;

    /// Sets an option, replacing any earlier value for `key`.
    fn option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.common_mut().options.insert(key.into(), value.into());
        self
    }

    fn options<I, K, V>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let target = &mut self.common_mut().options;
        for (key, value) in options {
            target.insert(key.into(), value.into());
        }
        self
    }

    fn view(mut self, view: View) -> Self {
        self.common_mut().view = Some(view);
        self
    }

    fn populate_properties(mut self, populate: bool) -> Self {
        self.common_mut().populate_properties = populate;
        self
    }
}

pub trait SeededBuilder: OperationBuilder {
    fn seeds_mut(&mut self) -> &mut Vec<Seed>;

    /// Replaces the seed list.
    fn seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Seed>,
    {
        *self.seeds_mut() = seeds.into_iter().map(Into::into).collect();
        self
    }

    fn add_seed(mut self, seed: impl Into<Seed>) -> Self {
        self.seeds_mut().push(seed.into());
        self
    }

    fn add_seeds<I, S>(mut self, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Seed>,
    {
        self.seeds_mut().extend(seeds.into_iter().map(Into::into));
        self
    }
}

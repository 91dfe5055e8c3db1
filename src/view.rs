//! Group-keyed filter and projection applied to retrieved elements.
//!
//! A present view only lets through elements whose group it lists. Each
//! group may narrow the retained properties and carry a predicate; the
//! predicate language itself is out of scope, so predicates are plain
//! closures.

use std::{fmt, sync::Arc};

use ahash::AHashMap;

use crate::element::Element;

pub type ElementPredicate = Arc<dyn Fn(&Element) -> bool + Send + Sync>;

#[derive(Clone, Default)]
pub struct ViewElementDefinition {
    properties: Option<Vec<String>>,
    predicate: Option<ElementPredicate>,
}

impl ViewElementDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only the named properties.
    pub fn properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&Element) -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }

    pub fn retained_properties(&self) -> Option<&[String]> {
        self.properties.as_deref()
    }

    fn accepts(&self, element: &Element) -> bool {
        self.predicate.as_ref().is_none_or(|predicate| predicate(element))
    }
}

impl fmt::Debug for ViewElementDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewElementDefinition")
            .field("properties", &self.properties)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
pub struct View {
    entities: AHashMap<String, ViewElementDefinition>,
    edges: AHashMap<String, ViewElementDefinition>,
}

impl View {
    pub fn builder() -> ViewBuilder {
        ViewBuilder::default()
    }

    pub fn entity_groups(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn edge_groups(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }

    pub fn has_entities(&self) -> bool {
        !self.entities.is_empty()
    }

    pub fn has_edges(&self) -> bool {
        !self.edges.is_empty()
    }

    fn definition(&self, element: &Element) -> Option<&ViewElementDefinition> {
        match element {
            Element::Entity(entity) => self.entities.get(&entity.group),
            Element::Edge(edge) => self.edges.get(&edge.group),
        }
    }

    pub fn passes_filter(&self, element: &Element) -> bool {
        self.definition(element)
            .is_some_and(|definition| definition.accepts(element))
    }

    /// Projects the element onto the properties its group retains.
    /// Identity when the group does not narrow properties.
    pub fn transform(&self, mut element: Element) -> Element {
        let retained = self
            .definition(&element)
            .and_then(ViewElementDefinition::retained_properties);
        if let Some(names) = retained {
            element
                .properties_mut()
                .retain(|name, _| names.iter().any(|kept| kept == name));
        }
        element
    }

    /// Filter then transform; `None` when the element is rejected.
    pub fn apply(&self, element: Element) -> Option<Element> {
        if self.passes_filter(&element) {
            Some(self.transform(element))
        } else {
            None
        }
    }
}

#[derive(Default)]
pub struct ViewBuilder {
    view: View,
}

impl ViewBuilder {
    pub fn entity(self, group: impl Into<String>) -> Self {
        self.entity_with(group, ViewElementDefinition::new())
    }

    pub fn entity_with(mut self, group: impl Into<String>, def: ViewElementDefinition) -> Self {
        self.view.entities.insert(group.into(), def);
        self
    }

    pub fn edge(self, group: impl Into<String>) -> Self {
        self.edge_with(group, ViewElementDefinition::new())
    }

    pub fn edge_with(mut self, group: impl Into<String>, def: ViewElementDefinition) -> Self {
        self.view.edges.insert(group.into(), def);
        self
    }

    pub fn build(self) -> View {
        self.view
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::element::{Edge, Entity};

    #[test]
    fn test_view_filters_unlisted_groups() {
        let view = View::builder().edge("road").build();
        let road: Element = Edge::new("road", "a", "b", true).into();
        let rail: Element = Edge::new("rail", "a", "b", true).into();
        let entity: Element = Entity::new("road", "a").into();
        assert!(view.passes_filter(&road));
        assert!(!view.passes_filter(&rail));
        assert!(!view.passes_filter(&entity));
    }

    #[test]
    fn test_view_transform_retains_listed_properties() {
        let view = View::builder()
            .entity_with("city", ViewElementDefinition::new().properties(["name"]))
            .build();
        let city: Element = Entity::new("city", "x")
            .with_property("name", json!("York"))
            .with_property("population", json!(200_000))
            .into();
        let projected = view.apply(city).expect("passes");
        assert_eq!(projected.property("name"), Some(&json!("York")));
        assert!(projected.property("population").is_none());
    }

    #[test]
    fn test_view_predicate() {
        let view = View::builder()
            .edge_with(
                "road",
                ViewElementDefinition::new().predicate(|e| {
                    e.property("lanes").and_then(|v| v.as_i64()).unwrap_or(0) > 1
                }),
            )
            .build();
        let narrow: Element = Edge::new("road", "a", "b", true)
            .with_property("lanes", json!(1))
            .into();
        let wide: Element = Edge::new("road", "a", "b", true)
            .with_property("lanes", json!(3))
            .into();
        assert!(!view.passes_filter(&narrow));
        assert!(view.passes_filter(&wide));
    }
}

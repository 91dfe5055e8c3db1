use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type Properties = BTreeMap<String, serde_json::Value>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub group: String,
    pub vertex: String,
    #[serde(default)]
    pub properties: Properties,
}

impl Entity {
    pub fn new(group: impl Into<String>, vertex: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            vertex: vertex.into(),
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Edge {
    pub group: String,
    pub source: String,
    pub destination: String,
    pub directed: bool,
    #[serde(default)]
    pub properties: Properties,
}

impl Edge {
    pub fn new(
        group: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        directed: bool,
    ) -> Self {
        Self {
            group: group.into(),
            source: source.into(),
            destination: destination.into(),
            directed,
            properties: Properties::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    /// Endpoints in identity order. Undirected edges are normalised so that
    /// `a-b` and `b-a` share an identity.
    pub fn endpoints(&self) -> (&str, &str) {
        if !self.directed && self.destination < self.source {
            (self.destination.as_str(), self.source.as_str())
        } else {
            (self.source.as_str(), self.destination.as_str())
        }
    }

    pub fn touches(&self, vertex: &str) -> bool {
        self.source == vertex || self.destination == vertex
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "class")]
pub enum Element {
    Entity(Entity),
    Edge(Edge),
}

impl Element {
    pub fn group(&self) -> &str {
        match self {
            Element::Entity(entity) => &entity.group,
            Element::Edge(edge) => &edge.group,
        }
    }

    pub fn properties(&self) -> &Properties {
        match self {
            Element::Entity(entity) => &entity.properties,
            Element::Edge(edge) => &edge.properties,
        }
    }

    pub fn properties_mut(&mut self) -> &mut Properties {
        match self {
            Element::Entity(entity) => &mut entity.properties,
            Element::Edge(edge) => &mut edge.properties,
        }
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties().get(name)
    }

    pub fn is_entity(&self) -> bool {
        matches!(self, Element::Entity(_))
    }

    pub fn is_edge(&self) -> bool {
        matches!(self, Element::Edge(_))
    }

    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Element::Edge(edge) => Some(edge),
            Element::Entity(_) => None,
        }
    }

    /// Vertices this element is indexed under.
    pub fn vertices(&self) -> Vec<&str> {
        match self {
            Element::Entity(entity) => vec![entity.vertex.as_str()],
            Element::Edge(edge) if edge.source == edge.destination => vec![edge.source.as_str()],
            Element::Edge(edge) => vec![edge.source.as_str(), edge.destination.as_str()],
        }
    }

    /// Drops every property, keeping only the identifying fields.
    pub fn strip_properties(mut self) -> Self {
        self.properties_mut().clear();
        self
    }
}

impl From<Entity> for Element {
    fn from(entity: Entity) -> Self {
        Element::Entity(entity)
    }
}

impl From<Edge> for Element {
    fn from(edge: Edge) -> Self {
        Element::Edge(edge)
    }
}

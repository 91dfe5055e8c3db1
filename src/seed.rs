use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntitySeed {
    pub vertex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeSeed {
    pub source: String,
    pub destination: String,
    pub directed: bool,
}

impl EdgeSeed {
    /// Same normalisation as [`crate::Edge::endpoints`].
    pub fn endpoints(&self) -> (&str, &str) {
        if !self.directed && self.destination < self.source {
            (self.destination.as_str(), self.source.as_str())
        } else {
            (self.source.as_str(), self.destination.as_str())
        }
    }
}

/// Starting point of a seed-based lookup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum Seed {
    Entity(EntitySeed),
    Edge(EdgeSeed),
}

impl Seed {
    pub fn entity(vertex: impl Into<String>) -> Self {
        Seed::Entity(EntitySeed {
            vertex: vertex.into(),
        })
    }

    pub fn edge(source: impl Into<String>, destination: impl Into<String>, directed: bool) -> Self {
        Seed::Edge(EdgeSeed {
            source: source.into(),
            destination: destination.into(),
            directed,
        })
    }

    /// Vertices a backend has to visit to resolve this seed.
    pub fn vertices(&self) -> Vec<&str> {
        match self {
            Seed::Entity(seed) => vec![seed.vertex.as_str()],
            Seed::Edge(seed) if seed.source == seed.destination => vec![seed.source.as_str()],
            Seed::Edge(seed) => vec![seed.source.as_str(), seed.destination.as_str()],
        }
    }
}

impl From<EntitySeed> for Seed {
    fn from(seed: EntitySeed) -> Self {
        Seed::Entity(seed)
    }
}

impl From<EdgeSeed> for Seed {
    fn from(seed: EdgeSeed) -> Self {
        Seed::Edge(seed)
    }
}

//! Seed matching: decides whether a stored element satisfies a seed.
//!
//! Pure and stateless; backends call [`matches`] once per (seed, candidate)
//! pair while walking their own storage.

use crate::{
    element::{Edge, Element},
    operation::get::{DirectedType, IncludeIncomingOutgoing, SeedMatching},
    seed::{EdgeSeed, Seed},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SeedMatchingConfig {
    pub seed_matching: SeedMatching,
    pub include_incoming_outgoing: IncludeIncomingOutgoing,
    pub directed_type: DirectedType,
}

impl Default for SeedMatchingConfig {
    fn default() -> Self {
        Self {
            seed_matching: SeedMatching::Related,
            include_incoming_outgoing: IncludeIncomingOutgoing::default(),
            directed_type: DirectedType::default(),
        }
    }
}

pub fn matches(seed: &Seed, element: &Element, config: &SeedMatchingConfig) -> bool {
    if let Element::Edge(edge) = element {
        if !config.directed_type.accepts(edge) {
            return false;
        }
    }
    match config.seed_matching {
        SeedMatching::Equal => matches_equal(seed, element),
        SeedMatching::Related => matches_related(seed, element, config.include_incoming_outgoing),
    }
}

fn matches_equal(seed: &Seed, element: &Element) -> bool {
    match (seed, element) {
        (Seed::Entity(seed), Element::Entity(entity)) => entity.vertex == seed.vertex,
        (Seed::Edge(seed), Element::Edge(edge)) => same_edge(seed, edge),
        _ => false,
    }
}

fn matches_related(seed: &Seed, element: &Element, include: IncludeIncomingOutgoing) -> bool {
    match (seed, element) {
        (Seed::Entity(seed), Element::Entity(entity)) => entity.vertex == seed.vertex,
        (Seed::Entity(seed), Element::Edge(edge)) => include.accepts(edge, &seed.vertex),
        (Seed::Edge(seed), Element::Edge(edge)) => same_edge(seed, edge),
        (Seed::Edge(seed), Element::Entity(entity)) => {
            entity.vertex == seed.source || entity.vertex == seed.destination
        }
    }
}

fn same_edge(seed: &EdgeSeed, edge: &Edge) -> bool {
    seed.directed == edge.directed && seed.endpoints() == edge.endpoints()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Entity;

    fn config(seed_matching: SeedMatching, include: IncludeIncomingOutgoing) -> SeedMatchingConfig {
        SeedMatchingConfig {
            seed_matching,
            include_incoming_outgoing: include,
            directed_type: DirectedType::Either,
        }
    }

    #[test]
    fn test_equal_never_matches_adjacent_edges() {
        let cfg = config(SeedMatching::Equal, IncludeIncomingOutgoing::Both);
        let seed = Seed::entity("a");
        assert!(matches(&seed, &Entity::new("g", "a").into(), &cfg));
        assert!(!matches(&seed, &Entity::new("g", "b").into(), &cfg));
        assert!(!matches(&seed, &Edge::new("g", "a", "b", true).into(), &cfg));
    }

    #[test]
    fn test_undirected_edge_seed_identity_ignores_endpoint_order() {
        let cfg = config(SeedMatching::Equal, IncludeIncomingOutgoing::Both);
        let seed = Seed::edge("b", "a", false);
        assert!(matches(&seed, &Edge::new("g", "a", "b", false).into(), &cfg));
        assert!(!matches(&seed, &Edge::new("g", "a", "b", true).into(), &cfg));
    }

    #[test]
    fn test_related_edge_seed_reaches_endpoint_entities() {
        let cfg = config(SeedMatching::Related, IncludeIncomingOutgoing::Both);
        let seed = Seed::edge("a", "b", true);
        assert!(matches(&seed, &Entity::new("g", "b").into(), &cfg));
        assert!(!matches(&seed, &Entity::new("g", "c").into(), &cfg));
    }
}

use serde::{Deserialize, Serialize};

use super::{OperationBuilder, OperationCommon, SeededBuilder, impl_operation};
use crate::{
    element::Edge, errors::GraphOpsError, matching::SeedMatchingConfig, operation::Operation,
    seed::Seed,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SeedMatching {
    /// The seed must identify the element itself.
    Equal,
    /// The seed may identify the element or one of its endpoints.
    Related,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IncludeIncomingOutgoing {
    #[default]
    Both,
    Incoming,
    Outgoing,
}

impl IncludeIncomingOutgoing {
    /// Whether `edge` counts as related to `vertex` in this direction.
    /// Undirected edges are both incoming and outgoing.
    pub fn accepts(self, edge: &Edge, vertex: &str) -> bool {
        if !edge.directed {
            return edge.touches(vertex);
        }
        match self {
            IncludeIncomingOutgoing::Both => edge.touches(vertex),
            IncludeIncomingOutgoing::Outgoing => edge.source == vertex,
            IncludeIncomingOutgoing::Incoming => edge.destination == vertex,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectedType {
    #[default]
    Either,
    Directed,
    Undirected,
}

impl DirectedType {
    pub fn accepts(self, edge: &Edge) -> bool {
        match self {
            DirectedType::Either => true,
            DirectedType::Directed => edge.directed,
            DirectedType::Undirected => !edge.directed,
        }
    }
}

/// Lookups driven by a list of seeds.
pub trait SeededOperation: Operation {
    fn seeds(&self) -> &[Seed];

    fn matching(&self) -> SeedMatchingConfig;

    fn returns_entities(&self) -> bool;

    fn returns_edges(&self) -> bool;
}

#[derive(Clone, Debug)]
pub struct GetEntities {
    common: OperationCommon,
    seeds: Vec<Seed>,
}

impl_operation!(GetEntities, "GetEntities");

impl GetEntities {
    pub fn builder() -> GetEntitiesBuilder {
        GetEntitiesBuilder::default()
    }

    pub fn new<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Seed>,
    {
        Self {
            common: OperationCommon::default(),
            seeds: seeds.into_iter().map(Into::into).collect(),
        }
    }

    pub fn seed_matching(&self) -> SeedMatching {
        SeedMatching::Equal
    }
}

impl SeededOperation for GetEntities {
    fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    fn matching(&self) -> SeedMatchingConfig {
        SeedMatchingConfig {
            seed_matching: SeedMatching::Equal,
            ..SeedMatchingConfig::default()
        }
    }

    fn returns_entities(&self) -> bool {
        true
    }

    fn returns_edges(&self) -> bool {
        false
    }
}

#[derive(Debug, Default)]
pub struct GetEntitiesBuilder {
    common: OperationCommon,
    seeds: Vec<Seed>,
    seed_matching: Option<SeedMatching>,
}

impl GetEntitiesBuilder {
    /// Only [`SeedMatching::Equal`] is accepted; anything else fails in `build`.
    pub fn seed_matching(mut self, seed_matching: SeedMatching) -> Self {
        self.seed_matching = Some(seed_matching);
        self
    }

    pub fn build(self) -> Result<GetEntities, GraphOpsError> {
        if self.seed_matching == Some(SeedMatching::Related) {
            return Err(GraphOpsError::validation(
                "GetEntities only supports EQUAL seed matching",
            ));
        }
        Ok(GetEntities {
            common: self.common,
            seeds: self.seeds,
        })
    }
}

impl OperationBuilder for GetEntitiesBuilder {
    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }
}

impl SeededBuilder for GetEntitiesBuilder {
    fn seeds_mut(&mut self) -> &mut Vec<Seed> {
        &mut self.seeds
    }
}

#[derive(Clone, Debug)]
pub struct GetEdges {
    common: OperationCommon,
    seeds: Vec<Seed>,
    seed_matching: SeedMatching,
    include_incoming_outgoing: IncludeIncomingOutgoing,
    directed_type: DirectedType,
}

impl_operation!(GetEdges, "GetEdges");

impl GetEdges {
    pub fn builder() -> GetEdgesBuilder {
        GetEdgesBuilder::default()
    }

    pub fn new<I, S>(seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Seed>,
    {
        Self::builder().seeds(seeds).into_operation()
    }

    pub fn seed_matching(&self) -> SeedMatching {
        self.seed_matching
    }

    pub fn include_incoming_outgoing(&self) -> IncludeIncomingOutgoing {
        self.include_incoming_outgoing
    }

    pub fn directed_type(&self) -> DirectedType {
        self.directed_type
    }
}

impl SeededOperation for GetEdges {
    fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    fn matching(&self) -> SeedMatchingConfig {
        SeedMatchingConfig {
            seed_matching: self.seed_matching,
            include_incoming_outgoing: self.include_incoming_outgoing,
            directed_type: self.directed_type,
        }
    }

    fn returns_entities(&self) -> bool {
        false
    }

    fn returns_edges(&self) -> bool {
        true
    }
}

#[derive(Debug)]
pub struct GetEdgesBuilder {
    common: OperationCommon,
    seeds: Vec<Seed>,
    seed_matching: SeedMatching,
    include_incoming_outgoing: IncludeIncomingOutgoing,
    directed_type: DirectedType,
}

impl Default for GetEdgesBuilder {
    fn default() -> Self {
        Self {
            common: OperationCommon::default(),
            seeds: Vec::new(),
            seed_matching: SeedMatching::Related,
            include_incoming_outgoing: IncludeIncomingOutgoing::default(),
            directed_type: DirectedType::default(),
        }
    }
}

impl GetEdgesBuilder {
    pub fn seed_matching(mut self, seed_matching: SeedMatching) -> Self {
        self.seed_matching = seed_matching;
        self
    }

    pub fn in_out_type(mut self, include: IncludeIncomingOutgoing) -> Self {
        self.include_incoming_outgoing = include;
        self
    }

    pub fn directed_type(mut self, directed_type: DirectedType) -> Self {
        self.directed_type = directed_type;
        self
    }

    pub fn build(self) -> Result<GetEdges, GraphOpsError> {
        Ok(self.into_operation())
    }

    fn into_operation(self) -> GetEdges {
        GetEdges {
            common: self.common,
            seeds: self.seeds,
            seed_matching: self.seed_matching,
            include_incoming_outgoing: self.include_incoming_outgoing,
            directed_type: self.directed_type,
        }
    }
}

impl OperationBuilder for GetEdgesBuilder {
    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }
}

impl SeededBuilder for GetEdgesBuilder {
    fn seeds_mut(&mut self) -> &mut Vec<Seed> {
        &mut self.seeds
    }
}

/// Entities and edges in one lookup.
#[derive(Clone, Debug)]
pub struct GetElements {
    common: OperationCommon,
    seeds: Vec<Seed>,
    matching: SeedMatchingConfig,
}

impl_operation!(GetElements, "GetElements");

impl GetElements {
    pub fn builder() -> GetElementsBuilder {
        GetElementsBuilder::default()
    }

    pub fn seed_matching(&self) -> SeedMatching {
        self.matching.seed_matching
    }

    pub fn include_incoming_outgoing(&self) -> IncludeIncomingOutgoing {
        self.matching.include_incoming_outgoing
    }

    pub fn directed_type(&self) -> DirectedType {
        self.matching.directed_type
    }
}

impl SeededOperation for GetElements {
    fn seeds(&self) -> &[Seed] {
        &self.seeds
    }

    fn matching(&self) -> SeedMatchingConfig {
        self.matching
    }

    fn returns_entities(&self) -> bool {
        true
    }

    fn returns_edges(&self) -> bool {
        true
    }
}

#[derive(Debug, Default)]
pub struct GetElementsBuilder {
    common: OperationCommon,
    seeds: Vec<Seed>,
    matching: SeedMatchingConfig,
}

impl GetElementsBuilder {
    pub fn seed_matching(mut self, seed_matching: SeedMatching) -> Self {
        self.matching.seed_matching = seed_matching;
        self
    }

    pub fn in_out_type(mut self, include: IncludeIncomingOutgoing) -> Self {
        self.matching.include_incoming_outgoing = include;
        self
    }

    pub fn directed_type(mut self, directed_type: DirectedType) -> Self {
        self.matching.directed_type = directed_type;
        self
    }

    pub fn build(self) -> Result<GetElements, GraphOpsError> {
        Ok(GetElements {
            common: self.common,
            seeds: self.seeds,
            matching: self.matching,
        })
    }
}

impl OperationBuilder for GetElementsBuilder {
    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }
}

impl SeededBuilder for GetElementsBuilder {
    fn seeds_mut(&mut self) -> &mut Vec<Seed> {
        &mut self.seeds
    }
}

/// Every stored element, subject to the view and directed type.
#[derive(Clone, Debug, Default)]
pub struct GetAllElements {
    common: OperationCommon,
    directed_type: DirectedType,
}

impl_operation!(GetAllElements, "GetAllElements");

impl GetAllElements {
    pub fn builder() -> GetAllElementsBuilder {
        GetAllElementsBuilder::default()
    }

    pub fn directed_type(&self) -> DirectedType {
        self.directed_type
    }
}

#[derive(Debug, Default)]
pub struct GetAllElementsBuilder {
    common: OperationCommon,
    directed_type: DirectedType,
}

impl GetAllElementsBuilder {
    pub fn directed_type(mut self, directed_type: DirectedType) -> Self {
        self.directed_type = directed_type;
        self
    }

    pub fn build(self) -> Result<GetAllElements, GraphOpsError> {
        Ok(GetAllElements {
            common: self.common,
            directed_type: self.directed_type,
        })
    }
}

impl OperationBuilder for GetAllElementsBuilder {
    fn common_mut(&mut self) -> &mut OperationCommon {
        &mut self.common
    }
}

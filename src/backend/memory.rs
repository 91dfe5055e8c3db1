use std::{
    collections::VecDeque,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use ahash::AHashMap;
use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::{
    config::GraphConfig,
    context::Context,
    element::Element,
    errors::GraphOpsError,
    executor::Executor,
    handler::{HandlerOutput, HandlerRegistry, OperationHandler},
    matching::{SeedMatchingConfig, matches},
    operation::{
        DirectedType, GetAllElements, GetEdges, GetElements, GetEntities, Operation,
        SeededOperation,
    },
    seed::Seed,
    stream::{ElementStream, StreamItem},
    view::View,
};

#[derive(Default)]
struct ElementIndex {
    elements: Vec<Element>,
    by_vertex: AHashMap<String, Vec<usize>>,
}

impl ElementIndex {
    fn push(&mut self, element: Element) {
        let position = self.elements.len();
        for vertex in element.vertices() {
            self.by_vertex
                .entry(vertex.to_owned())
                .or_default()
                .push(position);
        }
        self.elements.push(element);
    }
}

/// In-process element store indexed by vertex.
///
/// Lookups stream their results batch by batch (`seed_batch_size` seeds per
/// read lock). Every stream counts as an open scan until it is closed.
pub struct MemoryBackend {
    index: RwLock<ElementIndex>,
    config: GraphConfig,
    failing_reads: AtomicUsize,
    open_scans: Arc<AtomicUsize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            index: RwLock::new(ElementIndex::default()),
            config: GraphConfig::default(),
            failing_reads: AtomicUsize::new(0),
            open_scans: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_config(config: GraphConfig) -> Result<Self, GraphOpsError> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Registry with the lookup handlers of this backend and the core
    /// sort/limit handlers.
    pub fn registry() -> HandlerRegistry<MemoryBackend> {
        let mut registry = HandlerRegistry::with_core_handlers();
        registry.register::<GetEntities, _>(SeedLookupHandler);
        registry.register::<GetEdges, _>(SeedLookupHandler);
        registry.register::<GetElements, _>(SeedLookupHandler);
        registry.register::<GetAllElements, _>(AllElementsHandler);
        registry
    }

    pub fn into_executor(self) -> Executor<MemoryBackend> {
        Executor::new(Arc::new(self), Self::registry())
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn add_element(&self, element: impl Into<Element>) {
        self.index.write().push(element.into());
    }

    pub fn add_elements<I, E>(&self, elements: I)
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        let mut index = self.index.write();
        for element in elements {
            index.push(element.into());
        }
    }

    pub fn len(&self) -> usize {
        self.index.read().elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Streams that have been opened and not yet closed.
    pub fn open_scans(&self) -> usize {
        self.open_scans.load(Ordering::SeqCst)
    }

    /// Makes the next `reads` batch reads fail with a backend error.
    pub fn fail_next_reads(&self, reads: usize) {
        self.failing_reads.store(reads, Ordering::SeqCst);
    }

    fn check_read(&self) -> Result<(), GraphOpsError> {
        let armed = self
            .failing_reads
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            Err(GraphOpsError::backend("memory backend read failed"))
        } else {
            Ok(())
        }
    }

    fn open_stream<I>(&self, items: I) -> ElementStream
    where
        I: Iterator<Item = StreamItem> + Send + 'static,
    {
        let scans = Arc::clone(&self.open_scans);
        scans.fetch_add(1, Ordering::SeqCst);
        ElementStream::new(items).on_close(move || {
            scans.fetch_sub(1, Ordering::SeqCst);
        })
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// What a lookup keeps and how it shapes each kept element.
#[derive(Clone, Debug)]
struct Projection {
    entities: bool,
    edges: bool,
    directed_type: DirectedType,
    view: Option<View>,
    populate_properties: bool,
}

impl Projection {
    fn from_operation(
        operation: &dyn Operation,
        entities: bool,
        edges: bool,
        directed_type: DirectedType,
    ) -> Self {
        Self {
            entities,
            edges,
            directed_type,
            view: operation.view().cloned(),
            populate_properties: operation.populate_properties(),
        }
    }

    fn apply(&self, element: &Element) -> Option<Element> {
        match element {
            Element::Entity(_) if !self.entities => return None,
            Element::Edge(_) if !self.edges => return None,
            Element::Edge(edge) if !self.directed_type.accepts(edge) => return None,
            _ => {}
        }
        let element = match &self.view {
            Some(view) => view.apply(element.clone())?,
            None => element.clone(),
        };
        if self.populate_properties {
            Some(element)
        } else {
            Some(element.strip_properties())
        }
    }
}

/// Lookup handler shared by every seeded operation on [`MemoryBackend`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SeedLookupHandler;

impl<Op: SeededOperation> OperationHandler<Op, MemoryBackend> for SeedLookupHandler {
    fn execute(
        &self,
        operation: Op,
        context: &Context,
        backend: &Arc<MemoryBackend>,
    ) -> HandlerOutput {
        let matching = operation.matching();
        let projection = Projection::from_operation(
            &operation,
            operation.returns_entities(),
            operation.returns_edges(),
            matching.directed_type,
        );
        debug!(
            operation = operation.operation_type(),
            seeds = operation.seeds().len(),
            "opening seed lookup"
        );
        let scan = SeedScan {
            backend: Arc::clone(backend),
            seeds: operation.seeds().to_vec(),
            position: 0,
            matching,
            projection,
            context: context.clone(),
            buffer: VecDeque::new(),
            failed: false,
        };
        Ok(Some(backend.open_stream(scan)))
    }
}

struct SeedScan {
    backend: Arc<MemoryBackend>,
    seeds: Vec<Seed>,
    position: usize,
    matching: SeedMatchingConfig,
    projection: Projection,
    context: Context,
    buffer: VecDeque<Element>,
    failed: bool,
}

impl SeedScan {
    fn fill(&mut self) -> Result<(), GraphOpsError> {
        self.context.check_cancelled()?;
        self.backend.check_read()?;
        let end = (self.position + self.backend.config.seed_batch_size).min(self.seeds.len());
        let index = self.backend.index.read();
        for seed in &self.seeds[self.position..end] {
            resolve_seed(&index, seed, &self.matching, &self.projection, &mut self.buffer);
        }
        trace!(from = self.position, to = end, buffered = self.buffer.len(), "resolved seed batch");
        self.position = end;
        Ok(())
    }
}

/// Matches for one seed, in insertion order. An element reachable through
/// both endpoints of an edge seed is reported once.
fn resolve_seed(
    index: &ElementIndex,
    seed: &Seed,
    matching: &SeedMatchingConfig,
    projection: &Projection,
    out: &mut VecDeque<Element>,
) {
    let mut hits: Vec<usize> = seed
        .vertices()
        .into_iter()
        .filter_map(|vertex| index.by_vertex.get(vertex))
        .flatten()
        .copied()
        .collect();
    hits.sort_unstable();
    hits.dedup();
    for element in hits.into_iter().filter_map(|i| index.elements.get(i)) {
        if matches(seed, element, matching) {
            out.extend(projection.apply(element));
        }
    }
}

impl Iterator for SeedScan {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        loop {
            if let Some(element) = self.buffer.pop_front() {
                return Some(Ok(Some(element)));
            }
            if self.failed || self.position >= self.seeds.len() {
                return None;
            }
            if let Err(err) = self.fill() {
                self.failed = true;
                return Some(Err(err));
            }
        }
    }
}

/// Handler for [`GetAllElements`] on [`MemoryBackend`].
#[derive(Clone, Copy, Debug, Default)]
pub struct AllElementsHandler;

impl OperationHandler<GetAllElements, MemoryBackend> for AllElementsHandler {
    fn execute(
        &self,
        operation: GetAllElements,
        context: &Context,
        backend: &Arc<MemoryBackend>,
    ) -> HandlerOutput {
        let projection =
            Projection::from_operation(&operation, true, true, operation.directed_type());
        let scan = AllScan {
            backend: Arc::clone(backend),
            position: 0,
            projection,
            context: context.clone(),
            buffer: VecDeque::new(),
            done: false,
        };
        Ok(Some(backend.open_stream(scan)))
    }
}

struct AllScan {
    backend: Arc<MemoryBackend>,
    position: usize,
    projection: Projection,
    context: Context,
    buffer: VecDeque<Element>,
    done: bool,
}

impl AllScan {
    fn fill(&mut self) -> Result<(), GraphOpsError> {
        self.context.check_cancelled()?;
        self.backend.check_read()?;
        let index = self.backend.index.read();
        let end = (self.position + self.backend.config.seed_batch_size).min(index.elements.len());
        for element in &index.elements[self.position..end] {
            self.buffer.extend(self.projection.apply(element));
        }
        if end == index.elements.len() {
            self.done = true;
        }
        self.position = end;
        Ok(())
    }
}

impl Iterator for AllScan {
    type Item = StreamItem;

    fn next(&mut self) -> Option<StreamItem> {
        loop {
            if let Some(element) = self.buffer.pop_front() {
                return Some(Ok(Some(element)));
            }
            if self.done {
                return None;
            }
            if let Err(err) = self.fill() {
                self.done = true;
                return Some(Err(err));
            }
        }
    }
}

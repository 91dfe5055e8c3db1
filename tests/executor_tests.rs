use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use graphops::{
    Context, Edge, Element, ElementPropertyComparator, ElementStream, Entity, Executor,
    GetAllElements, GetEdges, GetElements, GetEntities, GraphConfig, GraphOpsError, HandlerOutput,
    HandlerRegistry, MemoryBackend, Operation, OperationBuilder, OperationHandler, Seed,
    SeededBuilder, Sort, User, View, ViewElementDefinition,
};
use serde_json::json;

fn sample_backend(config: GraphConfig) -> MemoryBackend {
    let backend = MemoryBackend::with_config(config).expect("backend");
    backend.add_elements([
        Element::from(Entity::new("person", "a").with_property("age", json!(40))),
        Entity::new("person", "b").with_property("age", json!(31)).into(),
        Edge::new("knows", "a", "b", true)
            .with_property("weight", json!(0.5))
            .with_property("since", json!(2010))
            .into(),
        Edge::new("knows", "b", "c", true)
            .with_property("weight", json!(0.9))
            .into(),
        Edge::new("owns", "a", "car", true).into(),
    ]);
    backend
}

fn executor() -> Executor<MemoryBackend> {
    sample_backend(GraphConfig::default()).into_executor()
}

/// Counts invocations; stands in for a backend-specific handler.
struct CountingHandler {
    calls: Arc<AtomicUsize>,
    label: &'static str,
}

impl OperationHandler<GetEdges, ()> for CountingHandler {
    fn execute(&self, _op: GetEdges, _context: &Context, _backend: &Arc<()>) -> HandlerOutput {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(ElementStream::from_elements(vec![
            Entity::new(self.label, "x").into(),
        ])))
    }
}

struct FailingHandler;

impl OperationHandler<GetEntities, ()> for FailingHandler {
    fn execute(&self, _op: GetEntities, _context: &Context, _backend: &Arc<()>) -> HandlerOutput {
        Err(GraphOpsError::backend("connection refused"))
    }
}

#[test]
fn test_unsupported_operation_names_type() {
    let executor = Executor::new(Arc::new(()), HandlerRegistry::<()>::new());
    let err = executor
        .execute(GetEntities::new([Seed::entity("a")]), &Context::default())
        .unwrap_err();
    assert!(matches!(
        err,
        GraphOpsError::UnsupportedOperation {
            operation: "GetEntities"
        }
    ));
    assert!(err.to_string().contains("GetEntities"));
}

#[test]
fn test_dispatch_uses_exact_type() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut registry = HandlerRegistry::<()>::new();
    registry.register::<GetEdges, _>(CountingHandler {
        calls: Arc::clone(&calls),
        label: "edges",
    });
    let executor = Executor::new(Arc::new(()), registry);
    assert!(executor.supports::<GetEdges>());
    assert!(!executor.supports::<GetElements>());

    let err = executor
        .execute(GetElements::builder().build().expect("op"), &Context::default())
        .unwrap_err();
    assert!(matches!(err, GraphOpsError::UnsupportedOperation { .. }));

    let out = executor
        .execute(GetEdges::new([Seed::entity("a")]), &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(out.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_reregistration_overwrites() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let mut registry = HandlerRegistry::<()>::new();
    registry.register::<GetEdges, _>(CountingHandler {
        calls: Arc::clone(&first),
        label: "first",
    });
    registry.register::<GetEdges, _>(CountingHandler {
        calls: Arc::clone(&second),
        label: "second",
    });
    assert_eq!(registry.len(), 1);
    let executor = Executor::new(Arc::new(()), registry);
    let out = executor
        .execute(GetEdges::new([Seed::entity("a")]), &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(out[0].group(), "second");
    assert_eq!(first.load(Ordering::SeqCst), 0);
    assert_eq!(second.load(Ordering::SeqCst), 1);
}

#[test]
fn test_registries_are_isolated_per_backend() {
    let memory = MemoryBackend::registry();
    let bare = HandlerRegistry::<MemoryBackend>::with_core_handlers();
    assert!(memory.supports::<GetEdges>());
    assert!(!bare.supports::<GetEdges>());
    assert_eq!(bare.supported_operations(), vec!["Limit", "Sort"]);
    assert_eq!(
        memory.supported_operations(),
        vec![
            "GetAllElements",
            "GetEdges",
            "GetElements",
            "GetEntities",
            "Limit",
            "Sort"
        ]
    );
}

#[test]
fn test_boxed_dispatch() {
    let executor = executor();
    let op: Box<dyn Operation> = Box::new(GetEntities::new([Seed::entity("b")]));
    let out = executor
        .execute_boxed(op, &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(out.len(), 1);
}

#[test]
fn test_handler_failure_is_tagged() {
    let mut registry = HandlerRegistry::<()>::new();
    registry.register::<GetEntities, _>(FailingHandler);
    let executor = Executor::new(Arc::new(()), registry);
    let err = executor
        .execute(GetEntities::new([Seed::entity("a")]), &Context::default())
        .unwrap_err();
    match &err {
        GraphOpsError::Execution { operation, source } => {
            assert_eq!(*operation, "GetEntities");
            assert!(matches!(**source, GraphOpsError::Backend(_)));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("connection refused"));
}

#[test]
fn test_backend_failure_during_pull_is_tagged() {
    let executor = sample_backend(GraphConfig::default().with_seed_batch_size(1)).into_executor();
    let mut stream = executor
        .execute(
            GetEdges::builder()
                .seeds([Seed::entity("a"), Seed::entity("b")])
                .build()
                .expect("op"),
            &Context::default(),
        )
        .expect("execute")
        .expect("stream");
    assert!(matches!(stream.next(), Some(Ok(Some(_)))));
    executor.backend().fail_next_reads(1);
    let mut saw_error = false;
    for item in stream.by_ref() {
        if let Err(err) = item {
            assert_eq!(err.operation(), Some("GetEdges"));
            assert!(matches!(err, GraphOpsError::Execution { .. }));
            saw_error = true;
        }
    }
    assert!(saw_error);
    assert_eq!(executor.backend().open_scans(), 0);
}

#[test]
fn test_cancelled_context_fails_fast() {
    let executor = executor();
    let context = Context::new(User::new("alice"));
    context.cancel();
    let err = executor
        .execute(GetEntities::new([Seed::entity("a")]), &context)
        .unwrap_err();
    assert!(matches!(
        err,
        GraphOpsError::Cancelled {
            operation: "GetEntities"
        }
    ));
}

#[test]
fn test_cancellation_mid_stream_is_distinct() {
    let executor = sample_backend(GraphConfig::default().with_seed_batch_size(1)).into_executor();
    let context = Context::new(User::new("alice").with_auths(["public"]));
    let mut stream = executor
        .execute(
            GetEntities::new([Seed::entity("a"), Seed::entity("b")]),
            &context,
        )
        .expect("execute")
        .expect("stream");
    assert!(matches!(stream.next(), Some(Ok(Some(_)))));
    context.cancel();
    let err = stream.next().expect("item").unwrap_err();
    assert!(err.is_cancelled());
    assert!(matches!(
        err,
        GraphOpsError::Cancelled {
            operation: "GetEntities"
        }
    ));
    assert!(stream.next().is_none());
    assert_eq!(executor.backend().open_scans(), 0);
}

#[test]
fn test_stream_released_on_early_drop() {
    let executor = executor();
    let mut stream = executor
        .execute(GetAllElements::builder().build().expect("op"), &Context::default())
        .expect("execute")
        .expect("stream");
    assert_eq!(executor.backend().open_scans(), 1);
    assert!(stream.next().is_some());
    drop(stream);
    assert_eq!(executor.backend().open_scans(), 0);
}

#[test]
fn test_reexecution_is_idempotent() {
    let executor = executor();
    let op = GetEdges::builder()
        .seeds([Seed::entity("a"), Seed::entity("b")])
        .build()
        .expect("op");
    let first = executor
        .execute(op.clone(), &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    let second = executor
        .execute(op, &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(first, second);
}

#[test]
fn test_view_filters_and_projects() {
    let executor = executor();
    let view = View::builder()
        .edge_with("knows", ViewElementDefinition::new().properties(["weight"]))
        .build();
    let op = GetEdges::builder()
        .add_seed(Seed::entity("a"))
        .view(view)
        .build()
        .expect("op");
    let out = executor
        .execute(op, &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].group(), "knows");
    assert_eq!(out[0].property("weight"), Some(&json!(0.5)));
    assert!(out[0].property("since").is_none());
}

#[test]
fn test_populate_properties_false_strips_properties() {
    let executor = executor();
    let op = GetEntities::builder()
        .add_seed(Seed::entity("a"))
        .populate_properties(false)
        .build()
        .expect("op");
    let out = executor
        .execute(op, &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(out, vec![Element::from(Entity::new("person", "a"))]);
}

#[test]
fn test_unknown_options_are_ignored() {
    let executor = executor();
    let op = GetEntities::builder()
        .add_seed(Seed::entity("a"))
        .option("backend.unknown.tuning", "42")
        .build()
        .expect("op");
    let out = executor
        .execute(op, &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(out.len(), 1);
}

#[test]
fn test_get_all_elements_honours_view() {
    let executor = executor();
    let op = GetAllElements::builder()
        .view(View::builder().entity("person").build())
        .build()
        .expect("op");
    let out = executor
        .execute(op, &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(out.len(), 2);
    assert!(out.iter().all(Element::is_entity));
}

#[test]
fn test_sort_over_lookup_stream() {
    let executor = executor();
    let edges = executor
        .execute(
            GetEdges::builder()
                .seeds([Seed::entity("a"), Seed::entity("b")])
                .build()
                .expect("op"),
            &Context::default(),
        )
        .expect("execute")
        .expect("stream");
    let sort = Sort::builder()
        .input(edges)
        .comparator(
            ElementPropertyComparator::new("weight")
                .groups(["knows"])
                .reversed(true),
        )
        .result_limit(1)
        .build()
        .expect("op");
    let out = executor
        .execute(sort, &Context::default())
        .expect("execute")
        .expect("stream")
        .collect_elements()
        .expect("elements");
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].property("weight"), Some(&json!(0.9)));
    assert_eq!(executor.backend().open_scans(), 0);
}

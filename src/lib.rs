//! Typed graph operations and the dispatch core that executes them.
//!
//! Callers build an operation (seeded lookups such as [`GetEdges`], or
//! post-processing such as [`Sort`]), hand it to an [`Executor`], and get
//! back a lazy [`ElementStream`]. The executor routes each operation to the
//! handler registered for its exact type in the backend's
//! [`HandlerRegistry`].
//!
//! ```
//! use graphops::{
//!     Context, Edge, ElementPropertyComparator, GetEdges, MemoryBackend, OperationBuilder,
//!     SeededBuilder, Sort,
//! };
//! use serde_json::json;
//!
//! let backend = MemoryBackend::new();
//! backend.add_element(Edge::new("road", "a", "b", true).with_property("weight", json!(3)));
//! backend.add_element(Edge::new("road", "a", "c", true).with_property("weight", json!(7)));
//! let executor = backend.into_executor();
//! let context = Context::default();
//!
//! let edges = executor
//!     .execute(GetEdges::builder().add_seed(graphops::Seed::entity("a")).build()?, &context)?
//!     .expect("stream");
//! let top = Sort::builder()
//!     .input(edges)
//!     .comparator(ElementPropertyComparator::new("weight"))
//!     .reversed(true)
//!     .result_limit(1)
//!     .build()?;
//! let best = executor.execute(top, &context)?.expect("stream").collect_elements()?;
//! assert_eq!(best[0].property("weight"), Some(&json!(7)));
//! # Ok::<(), graphops::GraphOpsError>(())
//! ```

pub mod backend;
pub mod config;
pub mod context;
pub mod element;
pub mod errors;
pub mod executor;
pub mod handler;
pub mod matching;
pub mod operation;
pub mod seed;
pub mod stream;
pub mod topk;
pub mod view;

pub use crate::backend::MemoryBackend;
pub use crate::config::GraphConfig;
pub use crate::context::{CancellationFlag, Context, User};
pub use crate::element::{Edge, Element, Entity, Properties};
pub use crate::errors::GraphOpsError;
pub use crate::executor::Executor;
pub use crate::handler::{HandlerOutput, HandlerRegistry, OperationHandler};
pub use crate::matching::SeedMatchingConfig;
pub use crate::operation::{
    DirectedType, ElementComparator, ElementPropertyComparator, FnComparator, GetAllElements,
    GetEdges, GetElements, GetEntities, IncludeIncomingOutgoing, Limit, Operation,
    OperationBuilder, SeedMatching, SeededBuilder, SeededOperation, Sort,
};
pub use crate::seed::{EdgeSeed, EntitySeed, Seed};
pub use crate::stream::{ElementStream, StreamItem};
pub use crate::view::{View, ViewElementDefinition};

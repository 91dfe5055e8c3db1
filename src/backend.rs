//! Backends own element storage; the core only sees them as the `B` handle
//! passed to handlers. [`memory::MemoryBackend`] is the in-process reference
//! implementation together with its lookup handlers.

pub mod memory;

pub use memory::{AllElementsHandler, MemoryBackend, SeedLookupHandler};

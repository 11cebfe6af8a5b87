//! # Anchor Heap
//!
//! Finds live instances of a class by tagging them during a runtime-driven
//! heap walk and fetching them back by tag.
//!
//! ## Design
//!
//! - **Tags**: every query gets a fresh, process-unique tag
//! - **Sessions**: the visit count is reset at the start of each query and only
//!   touched under the collector lock
//! - **Serialized queries**: the collector holds a lock for the whole query
//! - **Runtime-agnostic**: the host runtime is reached through [`HeapIntrospector`]
//!   and [`AgentHost`]; FFI lives in the agent crate

#![warn(clippy::all)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod collector;
pub mod error;
pub mod limit;
pub mod tag;
pub mod visitor;

pub use bootstrap::{AgentHost, Capabilities, bootstrap};
pub use collector::{HeapIntrospector, InstanceCollector};
pub use error::{BootstrapError, QueryError, QueryResult, RuntimeError};
pub use limit::{IterationLimit, UNBOUNDED};
pub use tag::{SessionTag, TagAllocator};
pub use visitor::{HeapCandidate, HeapVisitor, SessionVisitor, WalkControl};

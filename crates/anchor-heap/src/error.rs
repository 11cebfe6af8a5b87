//! Error types for anchor-heap

use thiserror::Error;

use crate::bootstrap::Capabilities;

/// Error code reported by the host runtime's introspection interface.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("{name} ({code})")]
pub struct RuntimeError {
    /// Numeric code as returned by the runtime
    pub code: u32,
    /// Symbolic name of the code
    pub name: &'static str,
}

impl RuntimeError {
    /// Create a runtime error from its code and symbolic name
    pub const fn new(code: u32, name: &'static str) -> Self {
        Self { code, name }
    }
}

/// Errors that abort agent activation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BootstrapError {
    /// The VM refused to hand out an introspection environment
    #[error("unable to obtain introspection environment, GetEnv failed, error={code}")]
    EnvironmentUnavailable {
        /// Status returned by the VM
        code: i32,
    },

    /// The runtime cannot grant the capability set in this VM
    #[error("capabilities {0:?} are not available in this VM")]
    CapabilityUnavailable(Capabilities),

    /// The runtime rejected the capability request
    #[error("capability request failed: {0}")]
    CapabilityRejected(#[source] RuntimeError),
}

/// Errors that terminate a single instance query
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// Query issued before the agent finished bootstrapping
    #[error("agent is not initialized")]
    NotInitialized,

    /// The class-scoped heap walk failed
    #[error("heap walk failed: {0}")]
    Walk(#[source] RuntimeError),

    /// Fetching the objects carrying the session tag failed
    #[error("tagged object retrieval failed: {0}")]
    Retrieval(#[source] RuntimeError),

    /// The result array could not be built
    #[error("result materialization failed: {0}")]
    Materialize(String),
}

/// Result type alias for query operations
pub type QueryResult<T> = Result<T, QueryError>;

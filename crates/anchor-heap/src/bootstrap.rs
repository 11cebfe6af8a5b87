//! Capability bootstrap
//!
//! Runs on every agent load event. The first successful run stores the
//! introspection environment in a process-wide slot; later runs reuse it and
//! request the same capabilities again, which the runtime treats as a no-op.
//! The stored environment is never released: the runtime tears it down with
//! the process.

use std::sync::OnceLock;

use crate::error::BootstrapError;

/// Optional runtime features the agent asks for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    /// Tag live objects and fetch them back by tag
    pub can_tag_objects: bool,
}

impl Capabilities {
    /// The set every query depends on
    pub const fn required() -> Self {
        Self {
            can_tag_objects: true,
        }
    }

    /// Whether every capability in `other` is also in `self`
    pub fn contains(&self, other: &Capabilities) -> bool {
        self.can_tag_objects || !other.can_tag_objects
    }
}

/// The VM side of agent startup
pub trait AgentHost {
    /// Introspection environment handle
    type Environment;

    /// Obtain an introspection environment from the VM
    fn acquire_environment(&self) -> Result<Self::Environment, BootstrapError>;

    /// Capabilities the environment could possibly be granted
    fn potential_capabilities(&self, env: &Self::Environment)
    -> Result<Capabilities, BootstrapError>;

    /// Request `capabilities` for the environment
    fn add_capabilities(
        &self,
        env: &Self::Environment,
        capabilities: Capabilities,
    ) -> Result<(), BootstrapError>;
}

/// Acquire the environment (once) and request the required capabilities.
///
/// The slot is only filled after the capabilities were granted, so a failed
/// bootstrap leaves queries reporting "not initialized".
pub fn bootstrap<'a, H: AgentHost>(
    host: &H,
    slot: &'a OnceLock<H::Environment>,
) -> Result<&'a H::Environment, BootstrapError> {
    let required = Capabilities::required();

    if let Some(env) = slot.get() {
        tracing::debug!(target: "anchor::bootstrap", "reusing introspection environment");
        request(host, env, required)?;
        return Ok(env);
    }

    let env = host.acquire_environment()?;
    request(host, &env, required)?;

    // A concurrent load may have won the race; its environment is kept and ours is dropped.
    let env = slot.get_or_init(|| env);
    tracing::info!(target: "anchor::bootstrap", ?required, "agent initialized");
    Ok(env)
}

fn request<H: AgentHost>(
    host: &H,
    env: &H::Environment,
    required: Capabilities,
) -> Result<(), BootstrapError> {
    let potential = host.potential_capabilities(env)?;
    if !potential.contains(&required) {
        return Err(BootstrapError::CapabilityUnavailable(required));
    }
    host.add_capabilities(env, required)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RuntimeError;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeHost {
        acquisitions: Cell<u32>,
        requested: RefCell<Vec<Capabilities>>,
        env_status: Option<i32>,
        potential: Capabilities,
        reject: Option<RuntimeError>,
    }

    impl FakeHost {
        fn healthy() -> Self {
            Self {
                potential: Capabilities::required(),
                ..Default::default()
            }
        }
    }

    impl AgentHost for FakeHost {
        type Environment = u32;

        fn acquire_environment(&self) -> Result<u32, BootstrapError> {
            if let Some(code) = self.env_status {
                return Err(BootstrapError::EnvironmentUnavailable { code });
            }
            self.acquisitions.set(self.acquisitions.get() + 1);
            Ok(self.acquisitions.get())
        }

        fn potential_capabilities(&self, _env: &u32) -> Result<Capabilities, BootstrapError> {
            Ok(self.potential)
        }

        fn add_capabilities(
            &self,
            _env: &u32,
            capabilities: Capabilities,
        ) -> Result<(), BootstrapError> {
            self.requested.borrow_mut().push(capabilities);
            match self.reject {
                Some(err) => Err(BootstrapError::CapabilityRejected(err)),
                None => Ok(()),
            }
        }
    }

    #[test]
    fn test_bootstrap_twice_is_idempotent() {
        let host = FakeHost::healthy();
        let slot = OnceLock::new();

        let first = *bootstrap(&host, &slot).unwrap();
        let second = *bootstrap(&host, &slot).unwrap();

        assert_eq!(first, second);
        assert_eq!(host.acquisitions.get(), 1);
        assert_eq!(
            *host.requested.borrow(),
            vec![Capabilities::required(), Capabilities::required()]
        );
    }

    #[test]
    fn test_environment_unavailable() {
        let host = FakeHost {
            env_status: Some(-3),
            ..FakeHost::healthy()
        };
        let slot = OnceLock::new();

        let err = bootstrap(&host, &slot).unwrap_err();
        assert_eq!(err, BootstrapError::EnvironmentUnavailable { code: -3 });
        assert!(slot.get().is_none());
        assert!(host.requested.borrow().is_empty());
    }

    #[test]
    fn test_capability_not_available() {
        let host = FakeHost {
            potential: Capabilities::default(),
            ..FakeHost::healthy()
        };
        let slot = OnceLock::new();

        let err = bootstrap(&host, &slot).unwrap_err();
        assert_eq!(
            err,
            BootstrapError::CapabilityUnavailable(Capabilities::required())
        );
        assert!(slot.get().is_none());
    }

    #[test]
    fn test_capability_rejected_leaves_slot_empty() {
        let rejected = RuntimeError::new(98, "JVMTI_ERROR_NOT_AVAILABLE");
        let host = FakeHost {
            reject: Some(rejected),
            ..FakeHost::healthy()
        };
        let slot = OnceLock::new();

        let err = bootstrap(&host, &slot).unwrap_err();
        assert_eq!(err, BootstrapError::CapabilityRejected(rejected));
        assert!(slot.get().is_none());
        assert_eq!(host.requested.borrow().len(), 1);
    }

    #[test]
    fn test_capabilities_contains() {
        let none = Capabilities::default();
        let tagging = Capabilities::required();
        assert!(tagging.contains(&none));
        assert!(tagging.contains(&tagging));
        assert!(!none.contains(&tagging));
    }
}

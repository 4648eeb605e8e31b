//! One-time initialization of the SAML object model.
//!
//! The unmarshaller registry is built at most once per [`Bootstrap`] and
//! published with acquire/release ordering through a [`OnceLock`]. A mutex
//! serializes initializer runs so a failed initialization leaves the state
//! `Uninitialized` and the next caller retries.
//!
//! The process-wide instance behind [`global`] backs the default parser.

use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::error::BootstrapError;
use crate::parser::registry::{QualifiedName, UnmarshallerRegistry};
use crate::parser::unmarshal_assertion;
use crate::types::SAML_NS;

/// Builds the registry on first use.
pub type Initializer = fn() -> Result<UnmarshallerRegistry, BootstrapError>;

/// Initialization state; moves one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// No successful initialization yet.
    Uninitialized,
    /// Registry is available.
    Initialized,
}

/// Lazily initialized SAML object model.
pub struct Bootstrap {
    registry: OnceLock<UnmarshallerRegistry>,
    init_lock: Mutex<()>,
    initializer: Initializer,
}

static GLOBAL: Bootstrap = Bootstrap::new(default_registry);

/// Returns the process-wide bootstrap.
pub fn global() -> &'static Bootstrap {
    &GLOBAL
}

/// Initializes the process-wide object model if needed.
///
/// # Errors
///
/// Returns the initializer's [`BootstrapError`].
pub fn ensure_initialized() -> Result<&'static UnmarshallerRegistry, BootstrapError> {
    GLOBAL.ensure_initialized()
}

/// Registers the SAML 2.0 assertion binding.
///
/// # Errors
///
/// Fails only on a duplicate registration.
pub fn default_registry() -> Result<UnmarshallerRegistry, BootstrapError> {
    let mut registry = UnmarshallerRegistry::new();
    registry.register(QualifiedName::new(SAML_NS, "Assertion"), unmarshal_assertion)?;
    Ok(registry)
}

impl Bootstrap {
    /// Creates an uninitialized bootstrap using `initializer`.
    pub const fn new(initializer: Initializer) -> Self {
        Self {
            registry: OnceLock::new(),
            init_lock: parking_lot::const_mutex(()),
            initializer,
        }
    }

    /// Returns the registry, running the initializer on first use.
    ///
    /// Safe to call from many threads; the initializer runs at most once per
    /// successful initialization.
    ///
    /// # Errors
    ///
    /// Returns the initializer's error. The state stays `Uninitialized`.
    pub fn ensure_initialized(&self) -> Result<&UnmarshallerRegistry, BootstrapError> {
        if let Some(registry) = self.registry.get() {
            return Ok(registry);
        }

        let _guard = self.init_lock.lock();
        if let Some(registry) = self.registry.get() {
            return Ok(registry);
        }

        let registry = (self.initializer)().map_err(|e| {
            tracing::warn!(error = %e, "SAML object model initialization failed");
            e
        })?;
        tracing::debug!(elements = registry.len(), "SAML object model initialized");
        Ok(self.registry.get_or_init(|| registry))
    }

    /// Returns the current state.
    pub fn state(&self) -> BootstrapState {
        if self.registry.get().is_some() {
            BootstrapState::Initialized
        } else {
            BootstrapState::Uninitialized
        }
    }
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new(default_registry)
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;

    #[test]
    fn concurrent_callers_initialize_once() {
        static RUNS: AtomicUsize = AtomicUsize::new(0);
        fn counting() -> Result<UnmarshallerRegistry, BootstrapError> {
            RUNS.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(std::time::Duration::from_millis(10));
            default_registry()
        }

        let bootstrap = Bootstrap::new(counting);
        let barrier = Barrier::new(16);
        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    barrier.wait();
                    assert_eq!(bootstrap.ensure_initialized().unwrap().len(), 1);
                });
            }
        });

        assert_eq!(RUNS.load(Ordering::SeqCst), 1);
        assert_eq!(bootstrap.state(), BootstrapState::Initialized);
    }

    #[test]
    fn failure_leaves_state_uninitialized_and_retries() {
        static RUNS: AtomicUsize = AtomicUsize::new(0);
        fn flaky() -> Result<UnmarshallerRegistry, BootstrapError> {
            if RUNS.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(BootstrapError::Initialization("registry unavailable".into()))
            } else {
                default_registry()
            }
        }

        let bootstrap = Bootstrap::new(flaky);
        assert!(bootstrap.ensure_initialized().is_err());
        assert_eq!(bootstrap.state(), BootstrapState::Uninitialized);

        assert!(bootstrap.ensure_initialized().is_ok());
        assert!(bootstrap.ensure_initialized().is_ok());
        assert_eq!(bootstrap.state(), BootstrapState::Initialized);
        assert_eq!(RUNS.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn global_registry_binds_assertions() {
        let registry = ensure_initialized().unwrap();
        assert!(registry
            .get(&QualifiedName::new(SAML_NS, "Assertion"))
            .is_some());
        assert_eq!(global().state(), BootstrapState::Initialized);
    }

    #[test]
    fn duplicate_registration_fails_bootstrap() {
        fn duplicated() -> Result<UnmarshallerRegistry, BootstrapError> {
            let mut registry = default_registry()?;
            registry.register(QualifiedName::new(SAML_NS, "Assertion"), unmarshal_assertion)?;
            Ok(registry)
        }

        let bootstrap = Bootstrap::new(duplicated);
        assert!(matches!(
            bootstrap.ensure_initialized(),
            Err(BootstrapError::DuplicateUnmarshaller { .. })
        ));
    }
}

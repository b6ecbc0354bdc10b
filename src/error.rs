//! Lifecycle error types

use crate::lifecycle::{ExternalHook, Hook};
use thiserror::Error;

/// Result type returned by behaviour hooks and external callbacks
///
/// Hooks may fail with any error type; the failure is wrapped into
/// [`LifecycleError::HookFailed`] or [`LifecycleError::ExternalHookFailed`]
/// together with the name of the unit that raised it.
pub type HookResult = anyhow::Result<()>;

/// A specialized Result type for lifecycle operations
pub type Result<T> = std::result::Result<T, LifecycleError>;

/// Errors that can occur during lifecycle operations
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// A declared dependency failed validation while the unit was
    /// completing its Initializing -> Initialized transition
    #[error("Invalid dependency for {unit}: {message}")]
    InvalidDependency {
        /// Name of the unit being initialized
        unit: String,
        /// Diagnostic naming the failing dependency
        message: String,
    },

    /// One of the unit's own hooks returned an error
    #[error("Hook '{hook}' failed for {unit}: {source}")]
    HookFailed {
        /// Name of the unit that failed
        unit: String,
        /// The hook that was running
        hook: Hook,
        /// The error returned by the hook
        #[source]
        source: anyhow::Error,
    },

    /// A controller-level `on_init` / `on_deinit` callback returned an error
    #[error("External hook '{hook}' failed for {unit}: {source}")]
    ExternalHookFailed {
        /// Name of the unit the callback was invoked for
        unit: String,
        /// The callback that was running
        hook: ExternalHook,
        /// The error returned by the callback
        #[source]
        source: anyhow::Error,
    },

    /// A typed dependency lookup found no match
    #[error("Dependency not found: {type_name}")]
    DependencyNotFound { type_name: String },

    /// Dependencies were assigned to a unit whose list was already sealed
    #[error("Dependencies already assigned for {unit}")]
    DependenciesAlreadyAssigned { unit: String },
}

impl LifecycleError {
    /// Create an invalid dependency error
    pub fn invalid_dependency(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidDependency {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Create a hook failure error
    pub fn hook_failed(unit: impl Into<String>, hook: Hook, source: anyhow::Error) -> Self {
        Self::HookFailed {
            unit: unit.into(),
            hook,
            source,
        }
    }

    /// Create an external hook failure error
    pub fn external_hook_failed(
        unit: impl Into<String>,
        hook: ExternalHook,
        source: anyhow::Error,
    ) -> Self {
        Self::ExternalHookFailed {
            unit: unit.into(),
            hook,
            source,
        }
    }

    /// Create a dependency-not-found error for `T`
    pub fn dependency_not_found<T: ?Sized>() -> Self {
        Self::DependencyNotFound {
            type_name: std::any::type_name::<T>().to_string(),
        }
    }

    /// Name of the unit the error was raised for, if any
    pub fn unit(&self) -> Option<&str> {
        match self {
            Self::InvalidDependency { unit, .. }
            | Self::HookFailed { unit, .. }
            | Self::ExternalHookFailed { unit, .. }
            | Self::DependenciesAlreadyAssigned { unit } => Some(unit),
            Self::DependencyNotFound { .. } => None,
        }
    }
}

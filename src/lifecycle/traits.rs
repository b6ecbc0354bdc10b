//! Behaviour trait
//!
//! A behaviour is the user-defined part of a unit: it supplies the four
//! lifecycle hooks and may tighten or relax how its dependencies are
//! validated. State tracking lives in [`Unit`](super::Unit), never here.

use super::{Unit, UnitState};
use crate::di::{Dependencies, Dependency};
use crate::error::HookResult;
use std::any::Any;

/// Upcast helper so `dyn Behaviour` can be downcast to its concrete type
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Outcome of checking a single dependency
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyCheck {
    /// The dependency is usable
    Valid,
    /// The dependency is not usable; the message, if any, is surfaced in
    /// [`LifecycleError::InvalidDependency`](crate::LifecycleError::InvalidDependency)
    Invalid(Option<String>),
}

impl DependencyCheck {
    /// Create a failed check with a diagnostic message
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(Some(message.into()))
    }

    /// Whether the check passed
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Default dependency policy
///
/// A dependency that is itself a [`Unit`] must have left the `None` state.
/// A dependency whose target has been dropped is rejected. Any other live
/// target passes.
pub fn default_dependency_check(dependency: &Dependency) -> DependencyCheck {
    let Some(target) = dependency.upgrade() else {
        return DependencyCheck::invalid(format!(
            "dependency ({}) has been dropped",
            dependency.type_name()
        ));
    };

    match target.downcast::<Unit>() {
        Ok(unit) if unit.state() == UnitState::None => {
            DependencyCheck::invalid(format!("dependency '{}' is not initialized", unit.name()))
        }
        _ => DependencyCheck::Valid,
    }
}

/// A shared, stateful component driven by a [`Unit`]
///
/// Every hook has a no-op default, so implementations only override what
/// they need. Hooks receive the unit's declared dependencies.
///
/// # Example
///
/// ```rust
/// use behaviour_lifecycle::{Behaviour, Dependencies, HookResult};
///
/// struct AudioMixer {
///     channels: Vec<String>,
/// }
///
/// impl Behaviour for AudioMixer {
///     fn setup(&mut self, _dependencies: &Dependencies) -> HookResult {
///         self.channels.push("master".to_string());
///         Ok(())
///     }
///
///     fn end(&mut self, _dependencies: &Dependencies) -> HookResult {
///         self.channels.clear();
///         Ok(())
///     }
/// }
/// ```
pub trait Behaviour: AsAny {
    /// Called when the unit enters `Initializing`
    fn setup(&mut self, dependencies: &Dependencies) -> HookResult {
        let _ = dependencies;
        Ok(())
    }

    /// Called when the unit enters `Initialized`, after every dependency
    /// has passed validation
    fn start(&mut self, dependencies: &Dependencies) -> HookResult {
        let _ = dependencies;
        Ok(())
    }

    /// Called when the unit returns to `None`
    fn end(&mut self, dependencies: &Dependencies) -> HookResult {
        let _ = dependencies;
        Ok(())
    }

    /// Called on terminal teardown, after `end`
    fn dispose(&mut self, dependencies: &Dependencies) -> HookResult {
        let _ = dependencies;
        Ok(())
    }

    /// Check a single declared dependency
    ///
    /// Called once per dependency, in declaration order, when the unit is
    /// about to become `Initialized`. The first invalid result aborts the
    /// transition.
    fn validate_dependency(&self, dependency: &Dependency) -> DependencyCheck {
        default_dependency_check(dependency)
    }
}

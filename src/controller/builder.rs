use super::{LifecycleController, UnitHook};
use crate::error::HookResult;
use crate::lifecycle::Unit;
use std::collections::HashSet;
use std::rc::Rc;

/// Builder for [`LifecycleController`]
///
/// # Example
///
/// ```rust
/// use behaviour_lifecycle::{Behaviour, LifecycleController, Unit, UserToken};
///
/// struct Physics;
/// impl Behaviour for Physics {}
///
/// let mut controller = LifecycleController::builder()
///     .name("gameplay")
///     .unit(Unit::new("Physics", Physics))
///     .on_init(|unit| {
///         tracing::debug!("about to initialize {}", unit.name());
///         Ok(())
///     })
///     .on_deinit(|unit| {
///         tracing::debug!("{} deinitialized", unit.name());
///         Ok(())
///     })
///     .build();
///
/// controller.register(UserToken::new())?;
/// # Ok::<(), behaviour_lifecycle::LifecycleError>(())
/// ```
pub struct ControllerBuilder {
    name: Option<String>,
    units: Vec<Rc<Unit>>,
    on_init: Option<UnitHook>,
    on_deinit: Option<UnitHook>,
}

impl Default for ControllerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ControllerBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            name: None,
            units: Vec::new(),
            on_init: None,
            on_deinit: None,
        }
    }

    /// Label used in log lines and snapshots
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a unit; units are driven in the order they are added
    pub fn unit(mut self, unit: Rc<Unit>) -> Self {
        self.units.push(unit);
        self
    }

    /// Append several units, keeping their order
    pub fn units(mut self, units: impl IntoIterator<Item = Rc<Unit>>) -> Self {
        self.units.extend(units);
        self
    }

    /// Callback run immediately before each unit's `initialize()`
    pub fn on_init<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Unit) -> HookResult + 'static,
    {
        self.on_init = Some(Box::new(hook));
        self
    }

    /// Callback run immediately after each unit's `deinitialize()`
    pub fn on_deinit<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&Unit) -> HookResult + 'static,
    {
        self.on_deinit = Some(Box::new(hook));
        self
    }

    /// Build the controller
    pub fn build(self) -> LifecycleController {
        let name = self.name.unwrap_or_else(|| "default".to_string());

        let mut seen = HashSet::new();
        for unit in &self.units {
            if !seen.insert(Rc::as_ptr(unit)) {
                tracing::warn!("[{}] Unit {} is listed more than once", name, unit.name());
            }
        }

        tracing::debug!("[{}] Controller created with {} units", name, self.units.len());

        LifecycleController {
            name,
            units: self.units,
            users: HashSet::new(),
            on_init: self.on_init,
            on_deinit: self.on_deinit,
        }
    }
}

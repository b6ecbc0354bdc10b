//! Lifecycle Controller
//!
//! Drives a fixed, ordered set of units on behalf of any number of users.
//! The first `register` brings every unit to `Initialized`; the last
//! `unregister` brings every unit back to `None`.
//!
//! ```text
//! register(u1)     ─┐
//!                   ├─ pass 1: on_init → initialize()   (array order)
//!                   └─ pass 2: initialized()            (array order)
//! register(u2)     ── both passes again; every unit is already
//!                     Initialized, so nothing happens
//! unregister(u1)   ── one user left, nothing happens
//! unregister(u2)   ── set empty: deinitialize() → on_deinit (array order)
//! ```

mod builder;
mod snapshot;
mod token;

pub use builder::ControllerBuilder;
pub use snapshot::{ControllerSnapshot, UnitSnapshot};
pub use token::UserToken;

use crate::error::{HookResult, LifecycleError, Result};
use crate::lifecycle::{Behaviour, ExternalHook, Unit};
use std::cell::Ref;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Callback invoked by the controller around a unit transition
pub type UnitHook = Box<dyn FnMut(&Unit) -> HookResult>;

/// Reference-counted orchestration of shared behaviour units
///
/// The controller shares the units with the host (`Rc<Unit>`) but owns the
/// set of registered users. Units are always visited in the order they
/// were given, so a unit should appear after everything it depends on.
///
/// # Example
///
/// ```rust
/// use behaviour_lifecycle::{Behaviour, LifecycleController, Unit, UnitState, UserToken};
///
/// struct Window;
/// impl Behaviour for Window {}
///
/// struct Renderer;
/// impl Behaviour for Renderer {}
///
/// let window = Unit::new("Window", Window);
/// let renderer = Unit::builder("Renderer", Renderer)
///     .depends_on(&window)
///     .build();
///
/// let mut controller = LifecycleController::new(vec![window.clone(), renderer.clone()]);
///
/// let scene = UserToken::new();
/// controller.register(scene)?;
/// assert_eq!(renderer.state(), UnitState::Initialized);
///
/// controller.unregister(scene)?;
/// assert_eq!(window.state(), UnitState::None);
/// # Ok::<(), behaviour_lifecycle::LifecycleError>(())
/// ```
pub struct LifecycleController {
    name: String,
    units: Vec<Rc<Unit>>,
    users: HashSet<UserToken>,
    on_init: Option<UnitHook>,
    on_deinit: Option<UnitHook>,
}

impl LifecycleController {
    /// Create a controller without external hooks
    pub fn new(units: impl IntoIterator<Item = Rc<Unit>>) -> Self {
        Self::builder().units(units).build()
    }

    /// Start building a controller
    pub fn builder() -> ControllerBuilder {
        ControllerBuilder::new()
    }

    /// Diagnostic label used in log lines
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The managed units, in orchestration order
    pub fn units(&self) -> &[Rc<Unit>] {
        &self.units
    }

    /// Number of distinct registered users
    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    /// Whether `user` currently holds a claim
    pub fn is_registered(&self, user: &UserToken) -> bool {
        self.users.contains(user)
    }

    /// Whether external `on_init` / `on_deinit` hooks are attached
    pub fn has_external_hooks(&self) -> bool {
        self.on_init.is_some() || self.on_deinit.is_some()
    }

    /// Add a user and bring every unit to `Initialized`
    ///
    /// Both initialization passes run on every call, even when `user` is
    /// already registered or other users are present; units that are
    /// already past `None` / `Initializing` skip their transitions.
    ///
    /// # Errors
    ///
    /// If any hook or dependency check fails, the remaining work is
    /// abandoned, the controller is disposed (every unit back to `None`,
    /// every user dropped) and the original error is returned.
    pub fn register(&mut self, user: UserToken) -> Result<()> {
        let first = self.users.is_empty();
        if self.users.insert(user) {
            tracing::debug!("[{}] Registered {} ({} users)", self.name, user, self.users.len());
        }
        if first {
            tracing::info!("[{}] First user registered, initializing units...", self.name);
        }

        if let Err(e) = self.initialize_all() {
            tracing::error!("[{}] Registration of {} failed: {}", self.name, user, e);
            if let Err(dispose_error) = self.dispose() {
                tracing::warn!(
                    "[{}] Dispose after failed registration also failed: {}",
                    self.name,
                    dispose_error
                );
            }
            return Err(e);
        }

        Ok(())
    }

    /// Remove a user; the last one out brings every unit back to `None`
    ///
    /// Unknown users are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first `end` / `on_deinit` failure. Every unit is still
    /// deinitialized.
    pub fn unregister(&mut self, user: UserToken) -> Result<()> {
        if !self.users.remove(&user) {
            tracing::trace!("[{}] {} was not registered", self.name, user);
            return Ok(());
        }
        tracing::debug!("[{}] Unregistered {} ({} users)", self.name, user, self.users.len());

        if !self.users.is_empty() {
            return Ok(());
        }

        tracing::info!("[{}] Last user unregistered, deinitializing units...", self.name);
        self.deinitialize_all()
    }

    /// Drop every user and deinitialize every unit
    ///
    /// # Errors
    ///
    /// Returns the first `end` / `on_deinit` failure. Every unit is still
    /// deinitialized.
    pub fn force_deinitialization(&mut self) -> Result<()> {
        tracing::info!(
            "[{}] Forcing deinitialization ({} users dropped)",
            self.name,
            self.users.len()
        );
        self.users.clear();
        self.deinitialize_all()
    }

    /// Force deinitialization, dispose every unit and detach external hooks
    ///
    /// Calling this again is harmless: units are already `None` and
    /// already disposed, so no hook runs.
    ///
    /// # Errors
    ///
    /// Returns the first failure seen. Every unit is in `None` afterwards
    /// regardless.
    pub fn dispose(&mut self) -> Result<()> {
        tracing::info!("[{}] Disposing {} units...", self.name, self.units.len());

        let mut first_error = self.force_deinitialization().err();

        for unit in &self.units {
            if let Err(e) = unit.dispose() {
                tracing::error!("[{}] Dispose failed for {}: {}", self.name, unit.name(), e);
                first_error.get_or_insert(e);
            }
        }

        self.on_init = None;
        self.on_deinit = None;

        tracing::info!("[{}] Dispose complete", self.name);
        first_error.map_or(Ok(()), Err)
    }

    /// Every behaviour of type `T`, in array order
    pub fn get_behaviours<T: Behaviour>(&self) -> Vec<Ref<'_, T>> {
        self.find_behaviours(|_: &T| true)
    }

    /// Every behaviour of type `T` accepted by `predicate`, in array order
    pub fn find_behaviours<T: Behaviour>(
        &self,
        predicate: impl Fn(&T) -> bool,
    ) -> Vec<Ref<'_, T>> {
        self.units
            .iter()
            .filter_map(|unit| unit.behaviour::<T>())
            .filter(|behaviour| predicate(&**behaviour))
            .collect()
    }

    /// First behaviour of type `T`
    pub fn try_get_behaviour<T: Behaviour>(&self) -> Option<Ref<'_, T>> {
        self.try_find_behaviour(|_: &T| true)
    }

    /// First behaviour of type `T` accepted by `predicate`
    pub fn try_find_behaviour<T: Behaviour>(
        &self,
        predicate: impl Fn(&T) -> bool,
    ) -> Option<Ref<'_, T>> {
        self.units
            .iter()
            .filter_map(|unit| unit.behaviour::<T>())
            .find(|behaviour| predicate(&**behaviour))
    }

    /// Apply `action` to every behaviour of type `T`, in array order
    ///
    /// # Errors
    ///
    /// Stops at the first error and returns it; later units are not
    /// visited.
    ///
    /// # Panics
    ///
    /// Panics if a matching behaviour is already borrowed, e.g. while a
    /// `Ref` from [`get_behaviours`](Self::get_behaviours) is still alive.
    pub fn for_each<T: Behaviour, E>(
        &self,
        mut action: impl FnMut(&mut T) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        for unit in &self.units {
            if let Some(mut behaviour) = unit.behaviour_mut::<T>() {
                action(&mut *behaviour)?;
            }
        }
        Ok(())
    }

    /// Apply `action` to every unit, in array order
    ///
    /// # Errors
    ///
    /// Stops at the first error and returns it; later units are not
    /// visited.
    pub fn for_each_unit<E>(
        &self,
        mut action: impl FnMut(&Unit) -> std::result::Result<(), E>,
    ) -> std::result::Result<(), E> {
        self.units.iter().try_for_each(|unit| action(unit.as_ref()))
    }

    /// Capture the current user count and unit states
    pub fn snapshot(&self) -> ControllerSnapshot {
        ControllerSnapshot {
            name: self.name.clone(),
            registered_users: self.users.len(),
            units: self.units.iter().map(|unit| UnitSnapshot::from(&**unit)).collect(),
        }
    }

    fn initialize_all(&mut self) -> Result<()> {
        for unit in self.units.iter().map(Rc::as_ref) {
            if let Some(on_init) = self.on_init.as_mut() {
                on_init(unit).map_err(|e| {
                    LifecycleError::external_hook_failed(unit.name(), ExternalHook::OnInit, e)
                })?;
            }
            unit.initialize()?;
        }

        for unit in &self.units {
            unit.initialized()?;
        }

        tracing::debug!("[{}] {} units initialized", self.name, self.units.len());
        Ok(())
    }

    fn deinitialize_all(&mut self) -> Result<()> {
        let mut first_error = None;

        for unit in self.units.iter().map(Rc::as_ref) {
            if let Err(e) = unit.deinitialize() {
                // Log error but continue with other units
                tracing::error!("[{}] Deinitialize failed for {}: {}", self.name, unit.name(), e);
                first_error.get_or_insert(e);
                continue;
            }

            if let Some(on_deinit) = self.on_deinit.as_mut() {
                if let Err(e) = on_deinit(unit) {
                    tracing::error!("[{}] on_deinit failed for {}: {}", self.name, unit.name(), e);
                    first_error.get_or_insert(LifecycleError::external_hook_failed(
                        unit.name(),
                        ExternalHook::OnDeinit,
                        e,
                    ));
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleController")
            .field("name", &self.name)
            .field("units", &self.units)
            .field("users", &self.users.len())
            .field("external_hooks", &self.has_external_hooks())
            .finish()
    }
}

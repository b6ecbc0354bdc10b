//! Per-unit lifecycle state machine

use super::{Behaviour, DependencyCheck, Hook, UnitState};
use crate::di::{Dependencies, Dependency};
use crate::error::{LifecycleError, Result};
use std::cell::{Cell, OnceCell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// Resets a unit's state to `None` when dropped
///
/// Held across `end`/`dispose` so the reset happens on every exit path,
/// including hook errors and panics.
struct StateReset<'a>(&'a Cell<UnitState>);

impl Drop for StateReset<'_> {
    fn drop(&mut self) {
        self.0.set(UnitState::None);
    }
}

/// A behaviour together with its lifecycle state and declared dependencies
///
/// Units are shared through `Rc<Unit>`: the host keeps its own handles, the
/// controller holds another, and other units refer to it through
/// non-owning [`Dependency`] entries. All state-machine operations take
/// `&self`; the state field is only ever written by these operations.
pub struct Unit {
    name: String,
    state: Cell<UnitState>,
    disposed: Cell<bool>,
    dependencies: OnceCell<Dependencies>,
    behaviour: RefCell<Box<dyn Behaviour>>,
}

impl Unit {
    /// Create a unit with no dependencies assigned yet
    pub fn new(name: impl Into<String>, behaviour: impl Behaviour) -> Rc<Self> {
        Self::builder(name, behaviour).build()
    }

    /// Start building a unit
    pub fn builder(name: impl Into<String>, behaviour: impl Behaviour) -> UnitBuilder {
        UnitBuilder {
            name: name.into(),
            behaviour: Box::new(behaviour),
            dependencies: None,
        }
    }

    /// Name used in logs and error messages
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current lifecycle state
    pub fn state(&self) -> UnitState {
        self.state.get()
    }

    /// Whether the unit is fully `Initialized`
    pub fn is_initialized(&self) -> bool {
        self.state() == UnitState::Initialized
    }

    /// Assign the dependency list
    ///
    /// The list can be assigned once, and only before anything has read it.
    /// The first `initialized()` call reads it, so assign before the unit is
    /// first registered.
    pub fn assign_dependencies(&self, dependencies: impl Into<Dependencies>) -> Result<()> {
        self.dependencies
            .set(dependencies.into())
            .map_err(|_| LifecycleError::DependenciesAlreadyAssigned {
                unit: self.name.clone(),
            })
    }

    /// The declared dependencies; reading seals the list
    pub fn dependencies(&self) -> &Dependencies {
        self.dependencies.get_or_init(Dependencies::default)
    }

    /// Number of declared dependencies, without sealing the list
    pub fn dependency_count(&self) -> usize {
        self.dependencies.get().map_or(0, Dependencies::len)
    }

    /// Whether the behaviour is of concrete type `T`
    pub fn is<T: Behaviour>(&self) -> bool {
        (**self.behaviour.borrow()).as_any().is::<T>()
    }

    /// Borrow the behaviour as `T`
    ///
    /// # Panics
    ///
    /// Panics if the behaviour is currently borrowed mutably, i.e. when
    /// called from inside one of this unit's own hooks.
    pub fn behaviour<T: Behaviour>(&self) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.behaviour.borrow(), |b| (**b).as_any().downcast_ref::<T>()).ok()
    }

    /// Mutably borrow the behaviour as `T`
    ///
    /// # Panics
    ///
    /// Panics if the behaviour is already borrowed.
    pub fn behaviour_mut<T: Behaviour>(&self) -> Option<RefMut<'_, T>> {
        RefMut::filter_map(self.behaviour.borrow_mut(), |b| {
            (**b).as_any_mut().downcast_mut::<T>()
        })
        .ok()
    }

    /// None -> Initializing, then `setup`
    ///
    /// No-op unless the unit is in `None`.
    pub fn initialize(&self) -> Result<()> {
        if self.state() != UnitState::None {
            tracing::trace!("{} already {}, skipping initialize", self.name, self.state());
            return Ok(());
        }

        self.state.set(UnitState::Initializing);
        self.disposed.set(false);
        tracing::debug!("Setting up: {}", self.name);
        self.run_hook(Hook::Setup)
    }

    /// Initializing -> Initialized, then `start`
    ///
    /// Every dependency is validated in declaration order first; the first
    /// failure is returned as [`LifecycleError::InvalidDependency`] and the
    /// unit stays in `Initializing`. No-op unless the unit is in
    /// `Initializing`.
    pub fn initialized(&self) -> Result<()> {
        if self.state() != UnitState::Initializing {
            tracing::trace!("{} is {}, skipping initialized", self.name, self.state());
            return Ok(());
        }

        self.validate_dependencies()?;

        self.state.set(UnitState::Initialized);
        tracing::debug!("Starting: {}", self.name);
        self.run_hook(Hook::Start)
    }

    /// Any -> None, running `end` first
    ///
    /// The state is `None` when this returns, whether `end` succeeded or not.
    pub fn deinitialize(&self) -> Result<()> {
        if self.state() == UnitState::None {
            tracing::trace!("{} already None, skipping deinitialize", self.name);
            return Ok(());
        }

        let _reset = StateReset(&self.state);
        tracing::debug!("Ending: {}", self.name);
        self.run_hook(Hook::End)
    }

    /// Deinitialize, then run the `dispose` hook
    ///
    /// The hook runs at most once between two initializations, so disposing
    /// an already disposed unit has no effect. If `end` fails the error is
    /// returned and `dispose` is not run. Either way the state is `None` on
    /// return.
    pub fn dispose(&self) -> Result<()> {
        let _reset = StateReset(&self.state);
        self.deinitialize()?;

        if self.disposed.replace(true) {
            return Ok(());
        }
        tracing::debug!("Disposing: {}", self.name);
        self.run_hook(Hook::Dispose)
    }

    fn validate_dependencies(&self) -> Result<()> {
        let behaviour = self.behaviour.borrow();
        for (index, dependency) in self.dependencies().iter().enumerate() {
            if let DependencyCheck::Invalid(message) = behaviour.validate_dependency(dependency) {
                let message = message.unwrap_or_else(|| default_failure(index, dependency));
                tracing::error!("Dependency check failed for {}: {}", self.name, message);
                return Err(LifecycleError::invalid_dependency(&self.name, message));
            }
        }
        Ok(())
    }

    fn run_hook(&self, hook: Hook) -> Result<()> {
        let dependencies = self.dependencies();
        let mut behaviour = self.behaviour.borrow_mut();
        let result = match hook {
            Hook::Setup => behaviour.setup(dependencies),
            Hook::Start => behaviour.start(dependencies),
            Hook::End => behaviour.end(dependencies),
            Hook::Dispose => behaviour.dispose(dependencies),
        };
        result.map_err(|e| {
            tracing::error!("{} hook failed for {}: {}", hook, self.name, e);
            LifecycleError::hook_failed(&self.name, hook, e)
        })
    }
}

fn default_failure(index: usize, dependency: &Dependency) -> String {
    match dependency.as_unit() {
        Some(unit) => format!("dependency '{}' was rejected", unit.name()),
        None => format!("dependency #{} ({}) was rejected", index, dependency.type_name()),
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name)
            .field("state", &self.state())
            .field("dependencies", &self.dependency_count())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Unit`]
pub struct UnitBuilder {
    name: String,
    behaviour: Box<dyn Behaviour>,
    dependencies: Option<Vec<Dependency>>,
}

impl UnitBuilder {
    /// Declare a dependency on another unit or on any shared object
    pub fn depends_on<T: 'static>(mut self, target: &Rc<T>) -> Self {
        self.dependencies
            .get_or_insert_with(Vec::new)
            .push(Dependency::on(target));
        self
    }

    /// Declare several dependencies at once, keeping their order
    pub fn dependencies(mut self, dependencies: impl IntoIterator<Item = Dependency>) -> Self {
        self.dependencies
            .get_or_insert_with(Vec::new)
            .extend(dependencies);
        self
    }

    /// Build the unit
    ///
    /// If no dependency was declared the list stays unassigned and can
    /// still be set through [`Unit::assign_dependencies`].
    pub fn build(self) -> Rc<Unit> {
        let dependencies = OnceCell::new();
        if let Some(list) = self.dependencies {
            let _ = dependencies.set(Dependencies::from(list));
        }

        Rc::new(Unit {
            name: self.name,
            state: Cell::new(UnitState::None),
            disposed: Cell::new(false),
            dependencies,
            behaviour: RefCell::new(self.behaviour),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Journal, Probe};
    use anyhow::bail;

    #[test]
    fn test_full_transition_sequence() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal));

        unit.initialize().unwrap();
        assert_eq!(unit.state(), UnitState::Initializing);
        unit.initialized().unwrap();
        assert_eq!(unit.state(), UnitState::Initialized);
        unit.deinitialize().unwrap();
        assert_eq!(unit.state(), UnitState::None);

        assert_eq!(journal.entries(), ["A:setup", "A:start", "A:end"]);
    }

    #[test]
    fn test_guarded_transitions_are_noops() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal));

        // Not Initializing yet
        unit.initialized().unwrap();
        assert_eq!(unit.state(), UnitState::None);
        // Already None
        unit.deinitialize().unwrap();

        unit.initialize().unwrap();
        unit.initialize().unwrap();
        unit.initialized().unwrap();
        unit.initialized().unwrap();
        unit.initialize().unwrap();

        assert_eq!(unit.state(), UnitState::Initialized);
        assert_eq!(journal.entries(), ["A:setup", "A:start"]);
    }

    #[test]
    fn test_deinitialize_from_initializing() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal));

        unit.initialize().unwrap();
        unit.deinitialize().unwrap();

        assert_eq!(unit.state(), UnitState::None);
        assert_eq!(journal.entries(), ["A:setup", "A:end"]);
    }

    #[test]
    fn test_invalid_dependency_keeps_unit_initializing() {
        let journal = Journal::default();
        let missing = Unit::new("C", Probe::new("C", &journal));
        let unit = Unit::builder("B", Probe::new("B", &journal))
            .depends_on(&missing)
            .build();

        unit.initialize().unwrap();
        let err = unit.initialized().unwrap_err();

        assert!(matches!(
            &err,
            LifecycleError::InvalidDependency { unit, message }
                if unit == "B" && message == "dependency 'C' is not initialized"
        ));
        assert_eq!(unit.state(), UnitState::Initializing);
        assert_eq!(journal.entries(), ["B:setup"]);
    }

    #[test]
    fn test_validation_stops_at_first_failure() {
        struct Picky {
            checked: Rc<Cell<usize>>,
        }

        impl Behaviour for Picky {
            fn validate_dependency(&self, dependency: &Dependency) -> DependencyCheck {
                self.checked.set(self.checked.get() + 1);
                match dependency.downcast::<u32>() {
                    Some(value) if *value == 0 => DependencyCheck::Invalid(None),
                    _ => DependencyCheck::Valid,
                }
            }
        }

        let checked = Rc::new(Cell::new(0));
        let good = Rc::new(7_u32);
        let bad = Rc::new(0_u32);
        let unit = Unit::builder("Picky", Picky { checked: Rc::clone(&checked) })
            .depends_on(&good)
            .depends_on(&bad)
            .depends_on(&good)
            .build();

        unit.initialize().unwrap();
        let err = unit.initialized().unwrap_err();

        assert_eq!(checked.get(), 2);
        assert!(matches!(
            &err,
            LifecycleError::InvalidDependency { message, .. } if message.starts_with("dependency #1")
        ));
    }

    #[test]
    fn test_override_can_accept_inactive_units() {
        struct Lenient;

        impl Behaviour for Lenient {
            fn validate_dependency(&self, _dependency: &Dependency) -> DependencyCheck {
                DependencyCheck::Valid
            }
        }

        let journal = Journal::default();
        let idle = Unit::new("Idle", Probe::new("Idle", &journal));
        let unit = Unit::builder("Lenient", Lenient).depends_on(&idle).build();

        unit.initialize().unwrap();
        unit.initialized().unwrap();
        assert!(unit.is_initialized());
    }

    #[test]
    fn test_end_failure_still_resets_state() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal).failing_on(Hook::End));

        unit.initialize().unwrap();
        unit.initialized().unwrap();
        let err = unit.deinitialize().unwrap_err();

        assert!(matches!(err, LifecycleError::HookFailed { hook: Hook::End, .. }));
        assert_eq!(unit.state(), UnitState::None);
    }

    #[test]
    fn test_setup_failure_leaves_unit_initializing() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal).failing_on(Hook::Setup));

        let err = unit.initialize().unwrap_err();

        assert!(matches!(err, LifecycleError::HookFailed { hook: Hook::Setup, .. }));
        assert_eq!(unit.state(), UnitState::Initializing);
    }

    #[test]
    fn test_dispose_runs_end_then_dispose_once() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal));

        unit.initialize().unwrap();
        unit.initialized().unwrap();
        unit.dispose().unwrap();
        unit.dispose().unwrap();

        assert_eq!(unit.state(), UnitState::None);
        assert_eq!(journal.entries(), ["A:setup", "A:start", "A:end", "A:dispose"]);
    }

    #[test]
    fn test_dispose_runs_again_after_reinitialization() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal));

        unit.dispose().unwrap();
        unit.initialize().unwrap();
        unit.dispose().unwrap();

        assert_eq!(
            journal.entries(),
            ["A:dispose", "A:setup", "A:end", "A:dispose"]
        );
    }

    #[test]
    fn test_dispose_failure_still_resets_state() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal).failing_on(Hook::Dispose));

        unit.initialize().unwrap();
        let err = unit.dispose().unwrap_err();

        assert!(matches!(err, LifecycleError::HookFailed { hook: Hook::Dispose, .. }));
        assert_eq!(unit.state(), UnitState::None);
    }

    #[test]
    fn test_dispose_skips_hook_when_end_fails() {
        let journal = Journal::default();
        let unit = Unit::new("A", Probe::new("A", &journal).failing_on(Hook::End));

        unit.initialize().unwrap();
        let err = unit.dispose().unwrap_err();

        assert!(matches!(err, LifecycleError::HookFailed { hook: Hook::End, .. }));
        assert_eq!(unit.state(), UnitState::None);
        assert_eq!(journal.entries(), ["A:setup", "A:end"]);
    }

    #[test]
    fn test_panicking_hook_still_resets_state() {
        struct Explosive;

        impl Behaviour for Explosive {
            fn end(&mut self, _dependencies: &Dependencies) -> crate::HookResult {
                panic!("end exploded");
            }
        }

        let unit = Unit::new("Explosive", Explosive);
        unit.initialize().unwrap();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| unit.deinitialize()));

        assert!(result.is_err());
        assert_eq!(unit.state(), UnitState::None);
    }

    #[test]
    fn test_dependencies_assigned_once() {
        struct Idle;
        impl Behaviour for Idle {}

        let settings = Rc::new("vsync".to_string());
        let unit = Unit::new("A", Idle);

        unit.assign_dependencies(vec![Dependency::on(&settings)]).unwrap();
        let err = unit.assign_dependencies(Vec::<Dependency>::new()).unwrap_err();

        assert!(matches!(err, LifecycleError::DependenciesAlreadyAssigned { unit } if unit == "A"));
        assert_eq!(unit.dependencies().len(), 1);
    }

    #[test]
    fn test_reading_dependencies_seals_the_list() {
        struct Idle;
        impl Behaviour for Idle {}

        let unit = Unit::new("A", Idle);
        assert!(unit.dependencies().is_empty());
        assert!(unit.assign_dependencies(Vec::<Dependency>::new()).is_err());
    }

    #[test]
    fn test_behaviour_downcast() {
        struct Counter {
            ticks: u32,
        }

        impl Behaviour for Counter {
            fn start(&mut self, _dependencies: &Dependencies) -> crate::HookResult {
                if self.ticks > 0 {
                    bail!("counter already started");
                }
                self.ticks += 1;
                Ok(())
            }
        }

        let unit = Unit::new("Counter", Counter { ticks: 0 });
        assert!(unit.is::<Counter>());
        assert!(unit.behaviour::<Probe>().is_none());

        unit.initialize().unwrap();
        unit.initialized().unwrap();
        assert_eq!(unit.behaviour::<Counter>().map(|c| c.ticks), Some(1));

        if let Some(mut counter) = unit.behaviour_mut::<Counter>() {
            counter.ticks = 10;
        }
        assert_eq!(unit.behaviour::<Counter>().map(|c| c.ticks), Some(10));
    }
}

use crate::error::{LifecycleError, Result};
use crate::lifecycle::Unit;
use std::any::Any;
use std::fmt;
use std::rc::{Rc, Weak};

/// A non-owning reference to something a unit depends on
///
/// The target can be another [`Unit`] or any shared object. Holding a
/// `Dependency` never keeps the target alive.
#[derive(Clone)]
pub struct Dependency {
    target: Weak<dyn Any>,
    type_name: &'static str,
}

impl Dependency {
    /// Reference `target` without taking ownership
    pub fn on<T: Any>(target: &Rc<T>) -> Self {
        let target: Rc<dyn Any> = target.clone();
        Self {
            target: Rc::downgrade(&target),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Type name of the target, captured when the dependency was declared
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Whether the target is still alive
    pub fn is_alive(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Upgrade to a strong handle on the target
    pub fn upgrade(&self) -> Option<Rc<dyn Any>> {
        self.target.upgrade()
    }

    /// Upgrade and downcast the target to `T`
    pub fn downcast<T: Any>(&self) -> Option<Rc<T>> {
        self.upgrade()?.downcast::<T>().ok()
    }

    /// The target as a unit, if it is one
    pub fn as_unit(&self) -> Option<Rc<Unit>> {
        self.downcast::<Unit>()
    }

    /// Whether this references the same allocation as `other`
    pub fn points_to<T: Any>(&self, other: &Rc<T>) -> bool {
        self.upgrade()
            .is_some_and(|target| Rc::as_ptr(&target) as *const () == Rc::as_ptr(other) as *const ())
    }
}

impl<T: Any> From<&Rc<T>> for Dependency {
    fn from(target: &Rc<T>) -> Self {
        Self::on(target)
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("type_name", &self.type_name)
            .field("alive", &self.is_alive())
            .finish()
    }
}

/// Read-only, typed view over a unit's declared dependencies
///
/// All lookups scan in declaration order and match on the concrete runtime
/// type of each live target. Dropped targets never match.
///
/// # Example
///
/// ```rust
/// use behaviour_lifecycle::{Dependencies, Dependency};
/// use std::rc::Rc;
///
/// let width = Rc::new(1920_u32);
/// let title = Rc::new(String::from("main"));
/// let height = Rc::new(1080_u32);
///
/// let dependencies = Dependencies::from(vec![
///     Dependency::on(&width),
///     Dependency::on(&title),
///     Dependency::on(&height),
/// ]);
///
/// assert_eq!(dependencies.get_dependency::<u32>().as_deref(), Some(&1920));
/// assert_eq!(dependencies.find_dependency::<u32>(|h| *h < 1500).as_deref(), Some(&1080));
/// assert_eq!(dependencies.get_dependencies::<u32>().len(), 2);
/// assert!(dependencies.try_get_dependency::<f64>().is_err());
/// ```
#[derive(Clone, Default)]
pub struct Dependencies {
    entries: Vec<Dependency>,
}

impl Dependencies {
    /// Number of declared dependencies
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no dependencies were declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the raw entries in declaration order
    pub fn iter(&self) -> std::slice::Iter<'_, Dependency> {
        self.entries.iter()
    }

    /// First dependency of type `T`
    pub fn get_dependency<T: Any>(&self) -> Option<Rc<T>> {
        self.find_dependency(|_: &T| true)
    }

    /// First dependency of type `T` accepted by `predicate`
    pub fn find_dependency<T: Any>(&self, predicate: impl Fn(&T) -> bool) -> Option<Rc<T>> {
        self.matching(predicate).next()
    }

    /// First dependency of type `T`, or [`LifecycleError::DependencyNotFound`]
    pub fn try_get_dependency<T: Any>(&self) -> Result<Rc<T>> {
        self.try_find_dependency(|_: &T| true)
    }

    /// First dependency of type `T` accepted by `predicate`, or
    /// [`LifecycleError::DependencyNotFound`]
    pub fn try_find_dependency<T: Any>(&self, predicate: impl Fn(&T) -> bool) -> Result<Rc<T>> {
        self.find_dependency(predicate)
            .ok_or_else(LifecycleError::dependency_not_found::<T>)
    }

    /// Every dependency of type `T`, in declaration order
    pub fn get_dependencies<T: Any>(&self) -> Vec<Rc<T>> {
        self.find_dependencies(|_: &T| true)
    }

    /// Every dependency of type `T` accepted by `predicate`, in declaration
    /// order
    pub fn find_dependencies<T: Any>(&self, predicate: impl Fn(&T) -> bool) -> Vec<Rc<T>> {
        self.matching(predicate).collect()
    }

    fn matching<'a, T, F>(&'a self, predicate: F) -> impl Iterator<Item = Rc<T>> + 'a
    where
        T: Any,
        F: Fn(&T) -> bool + 'a,
    {
        self.entries
            .iter()
            .filter_map(Dependency::downcast::<T>)
            .filter(move |target| predicate(&**target))
    }
}

impl From<Vec<Dependency>> for Dependencies {
    fn from(entries: Vec<Dependency>) -> Self {
        Self { entries }
    }
}

impl FromIterator<Dependency> for Dependencies {
    fn from_iter<I: IntoIterator<Item = Dependency>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Dependencies {
    type Item = &'a Dependency;
    type IntoIter = std::slice::Iter<'a, Dependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(&self.entries).finish()
    }
}

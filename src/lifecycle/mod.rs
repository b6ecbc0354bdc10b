//! Lifecycle State Machine
//!
//! Every [`Unit`] moves through three states and calls into its
//! [`Behaviour`] on each transition.
//!
//! # Lifecycle Phases
//!
//! ```text
//! 1. initialize()          None -> Initializing
//!    ↓
//! 2. setup                 ← Hook
//!    ↓
//! 3. dependency checks     (declaration order, first failure aborts)
//!    ↓
//! 4. initialized()         Initializing -> Initialized
//!    ↓
//! 5. start                 ← Hook
//!    ↓
//! [Running...]
//!    ↓
//! 6. end                   ← Hook
//!    ↓
//! 7. deinitialize()        -> None (even if `end` fails)
//!    ↓
//! 8. dispose               ← Hook (terminal teardown)
//! ```
//!
//! # Example
//!
//! ```rust
//! use behaviour_lifecycle::{Behaviour, Dependencies, HookResult, Unit, UnitState};
//!
//! struct Database;
//!
//! impl Behaviour for Database {
//!     fn start(&mut self, _dependencies: &Dependencies) -> HookResult {
//!         tracing::info!("Opening database connections");
//!         Ok(())
//!     }
//!
//!     fn end(&mut self, _dependencies: &Dependencies) -> HookResult {
//!         tracing::info!("Closing database connections");
//!         Ok(())
//!     }
//! }
//!
//! let database = Unit::new("Database", Database);
//! database.initialize()?;
//! database.initialized()?;
//! assert_eq!(database.state(), UnitState::Initialized);
//!
//! database.deinitialize()?;
//! assert_eq!(database.state(), UnitState::None);
//! # Ok::<(), behaviour_lifecycle::LifecycleError>(())
//! ```

mod state;
mod traits;
mod unit;

pub use state::{ExternalHook, Hook, UnitState};
pub use traits::{AsAny, Behaviour, DependencyCheck, default_dependency_check};
pub use unit::{Unit, UnitBuilder};

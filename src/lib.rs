//! # Behaviour Lifecycle
//!
//! Reference-counted lifecycle orchestration for shared, stateful units.
//!
//! Several independent consumers ("users") can need the same set of
//! behaviour units at once. Instead of each consumer setting the units up
//! and tearing them down, a [`LifecycleController`] tracks who currently
//! holds a claim and drives every unit through its lifecycle only when the
//! first user arrives and the last one leaves.
//!
//! ## Features
//!
//! - **Three-state units**: `None` → `Initializing` → `Initialized`, with
//!   `setup` / `start` / `end` / `dispose` hooks on a [`Behaviour`]
//! - **Dependency validation**: a unit cannot finish initializing while a
//!   unit it depends on is still inactive
//! - **Typed lookups**: query dependencies and managed behaviours by
//!   concrete type, in declaration order
//! - **Safe teardown**: `deinitialize` and `dispose` always leave the unit in
//!   `None`, even when a hook fails
//! - **External hooks**: `on_init` / `on_deinit` callbacks around each unit
//!
//! ## Quick Start
//!
//! ```rust
//! use behaviour_lifecycle::prelude::*;
//!
//! // 1. Define your behaviours
//! struct AudioDevice {
//!     open: bool,
//! }
//!
//! impl Behaviour for AudioDevice {
//!     fn start(&mut self, _dependencies: &Dependencies) -> HookResult {
//!         self.open = true;
//!         Ok(())
//!     }
//!
//!     fn end(&mut self, _dependencies: &Dependencies) -> HookResult {
//!         self.open = false;
//!         Ok(())
//!     }
//! }
//!
//! struct MusicPlayer;
//!
//! impl Behaviour for MusicPlayer {
//!     fn start(&mut self, dependencies: &Dependencies) -> HookResult {
//!         let device = dependencies.try_get_dependency::<Unit>()?;
//!         anyhow::ensure!(device.is_initialized(), "audio device not ready");
//!         Ok(())
//!     }
//! }
//!
//! // 2. Wire units; dependencies come first
//! let device = Unit::new("AudioDevice", AudioDevice { open: false });
//! let player = Unit::builder("MusicPlayer", MusicPlayer)
//!     .depends_on(&device)
//!     .build();
//!
//! // 3. Build the controller
//! let mut controller = LifecycleController::builder()
//!     .name("audio")
//!     .units([device.clone(), player])
//!     .build();
//!
//! // 4. Users come and go
//! let menu = UserToken::new();
//! let level = UserToken::new();
//!
//! controller.register(menu)?;
//! controller.register(level)?;
//! assert!(controller.try_get_behaviour::<AudioDevice>().is_some_and(|d| d.open));
//!
//! controller.unregister(menu)?;
//! assert_eq!(device.state(), UnitState::Initialized);
//!
//! controller.unregister(level)?;
//! assert_eq!(device.state(), UnitState::None);
//!
//! // 5. Teardown
//! controller.dispose()?;
//! # Ok::<(), LifecycleError>(())
//! ```

pub mod controller;
pub mod di;
pub mod error;
pub mod lifecycle;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export core types
pub use controller::{
    ControllerBuilder, ControllerSnapshot, LifecycleController, UnitHook, UnitSnapshot, UserToken,
};
pub use di::{Dependencies, Dependency};
pub use error::{HookResult, LifecycleError, Result};
pub use lifecycle::{
    Behaviour, DependencyCheck, ExternalHook, Hook, Unit, UnitBuilder, UnitState,
    default_dependency_check,
};

/// Prelude module for convenient imports
///
/// ```
/// use behaviour_lifecycle::prelude::*;
/// ```
pub mod prelude {
    pub use crate::controller::{ControllerBuilder, LifecycleController, UserToken};
    pub use crate::di::{Dependencies, Dependency};
    pub use crate::error::{HookResult, LifecycleError};
    pub use crate::lifecycle::{Behaviour, DependencyCheck, Hook, Unit, UnitState};
    pub use std::rc::Rc;
}

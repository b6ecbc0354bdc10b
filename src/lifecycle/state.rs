//! Unit states and hook identifiers

use serde::Serialize;
use strum_macros::{Display, EnumIter, IntoStaticStr};

/// Lifecycle state of a single behaviour unit
///
/// ```text
///   None ──initialize()──▶ Initializing ──initialized()──▶ Initialized
///    ▲                          │                               │
///    └──────────────────── deinitialize() ◀─────────────────────┘
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, IntoStaticStr, Serialize)]
pub enum UnitState {
    /// Inactive. Initial and terminal state.
    #[default]
    None,
    /// `setup` has run; dependencies not yet validated.
    Initializing,
    /// Dependencies validated and `start` has run.
    Initialized,
}

impl UnitState {
    /// Whether the unit has left the `None` state
    pub fn is_active(self) -> bool {
        self != UnitState::None
    }
}

/// The four hooks a [`Behaviour`](super::Behaviour) can override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Hook {
    /// Runs on entering `Initializing`
    Setup,
    /// Runs on entering `Initialized`, after dependency validation
    Start,
    /// Runs on returning to `None`
    End,
    /// Terminal teardown
    Dispose,
}

/// Controller-level callbacks invoked around each unit transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum ExternalHook {
    /// Invoked immediately before a unit's `initialize()`
    OnInit,
    /// Invoked immediately after a unit's `deinitialize()`
    OnDeinit,
}

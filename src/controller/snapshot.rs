use crate::lifecycle::{Unit, UnitState};
use serde::Serialize;

/// Point-in-time view of a controller, for logs and diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ControllerSnapshot {
    pub name: String,
    pub registered_users: usize,
    pub units: Vec<UnitSnapshot>,
}

impl ControllerSnapshot {
    /// Whether every unit is back in `None`
    pub fn is_idle(&self) -> bool {
        self.units.iter().all(|unit| unit.state == UnitState::None)
    }
}

/// Point-in-time view of a single unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSnapshot {
    pub name: String,
    pub state: UnitState,
    pub dependencies: usize,
}

impl From<&Unit> for UnitSnapshot {
    fn from(unit: &Unit) -> Self {
        Self {
            name: unit.name().to_string(),
            state: unit.state(),
            dependencies: unit.dependency_count(),
        }
    }
}

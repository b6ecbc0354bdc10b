use serde::Serialize;
use std::fmt;
use uuid::Uuid;

/// Opaque identity of one consumer scope
///
/// Every call to [`UserToken::new`] yields a distinct identity. Copies of a
/// token refer to the same user, so a scope can hand its token to whoever
/// will later unregister it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct UserToken(Uuid);

impl UserToken {
    /// Generate a fresh, unique token
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying identifier
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl Default for UserToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for UserToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "user-{}", self.0.simple())
    }
}

//! Dependency references and the typed dependency accessor

mod dependency;

pub use dependency::{Dependencies, Dependency};

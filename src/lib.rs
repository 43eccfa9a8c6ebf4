//! Binary mass-loss workspace façade.
//!
//! The simulation itself lives in the member crates, re-exported here so front-ends only need
//! one dependency. This crate adds the reporting layer (CSV round-trip and figure rendering),
//! which the simulation crates never depend on.

pub mod report;

pub use dynbin_config as config;
pub use dynbin_core as physics;
pub use dynbin_evolution as evolution;
pub use dynbin_export as export;
pub use dynbin_gravity as gravity;
pub use dynbin_orbits as orbits;

/// Returns the version of the library for smoke tests.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

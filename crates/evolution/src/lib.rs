//! Co-evolution of a binary star under continuous mass loss.
//!
//! The driver advances a direct two-body integration while removing mass from both stars every
//! step, and in parallel integrates the adiabatic approximation `da/dt = a · Ṁ / M`, `de/dt = 0`
//! so the two can be compared sample by sample.

pub mod binary;
pub mod driver;
pub mod massloss;
pub mod plan;
pub mod series;

pub use binary::{BinarySystem, SetupError, Star, make_binary_star};
pub use driver::{
    CoEvolution, DriverState, EvolutionError, EvolutionReport, RunFailure, RunSettings, StepError,
};
pub use massloss::{MassLossLaw, eccentricity_rate, semimajor_axis_rate};
pub use plan::{RunPlan, run_plan};
pub use series::{Sample, TimeSeries};

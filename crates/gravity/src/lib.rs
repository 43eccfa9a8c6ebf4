//! Gravity engine abstraction and the default direct-summation Hermite integrator.
//!
//! Engines exchange state with callers in SI units. Internally they may work in any consistent
//! unit system; the bundled [`Hermite`] engine integrates in N-body units (`G = 1`) defined by a
//! [`UnitScale`].

use std::ops::{Deref, DerefMut};

use dynbin_core::body::PointMass;
use thiserror::Error;

mod hermite;

pub use hermite::{Hermite, HermiteParameters};

/// Conversion between SI and dimensionless N-body units.
///
/// Mass and length units are chosen by the caller (typically the binary's total mass and
/// semimajor axis); the time unit follows from `G = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitScale {
    pub mass_kg: f64,
    pub length_m: f64,
    pub time_s: f64,
}

impl UnitScale {
    /// Derive the unit system from a mass and length scale and the SI gravitational constant.
    pub fn new(mass_kg: f64, length_m: f64, g: f64) -> Self {
        let time_s = (length_m.powi(3) / (g * mass_kg)).sqrt();
        Self {
            mass_kg,
            length_m,
            time_s,
        }
    }

    #[inline]
    pub fn velocity_m_s(&self) -> f64 {
        self.length_m / self.time_s
    }

    /// True when every scale factor is positive and finite.
    pub fn is_valid(&self) -> bool {
        [self.mass_kg, self.length_m, self.time_s]
            .iter()
            .all(|v| v.is_finite() && *v > 0.0)
    }
}

/// Failures raised while registering, advancing, or synchronising an engine.
#[derive(Debug, Error, PartialEq)]
pub enum IntegrationError {
    #[error("engine has been stopped")]
    Stopped,
    #[error("unit scale must be positive and finite")]
    InvalidUnitScale,
    #[error("expected {expected} particles, got {got}")]
    ParticleCountMismatch { expected: usize, got: usize },
    #[error("particle {index} has invalid mass {mass_kg} kg")]
    InvalidMass { index: usize, mass_kg: f64 },
    #[error("cannot evolve backwards from t = {current_s} s to t = {requested_s} s")]
    TimeReversal { current_s: f64, requested_s: f64 },
    #[error("state became non-finite at t = {time_s} s")]
    NonFinite { time_s: f64 },
    #[error("time step collapsed to {dt_s} s at t = {time_s} s")]
    StepCollapse { time_s: f64, dt_s: f64 },
    #[error("exceeded {limit} integration sub-steps before reaching t = {requested_s} s")]
    StepLimit { limit: u64, requested_s: f64 },
}

/// Swappable gravity engine contract consumed by the co-evolution driver.
///
/// All quantities are SI. `stop` releases the engine's resources and must be safe to call more
/// than once; every other operation on a stopped engine fails with [`IntegrationError::Stopped`].
pub trait GravityEngine {
    /// Register bodies; their order is the order used by every other call.
    fn add_particles(&mut self, bodies: &[PointMass]) -> Result<(), IntegrationError>;

    /// Advance the internal state to exactly `time_s`.
    fn evolve_to(&mut self, time_s: f64) -> Result<(), IntegrationError>;

    /// Current mass, position, and velocity of every particle.
    fn read_state(&self) -> Result<Vec<PointMass>, IntegrationError>;

    /// Replace particle masses ahead of the next `evolve_to`.
    fn write_masses(&mut self, masses_kg: &[f64]) -> Result<(), IntegrationError>;

    /// Current model time in seconds.
    fn model_time(&self) -> f64;

    fn stop(&mut self);

    fn is_stopped(&self) -> bool;
}

/// Owns an engine for a scope and stops it when dropped, whatever the exit path.
#[derive(Debug)]
pub struct EngineGuard<E: GravityEngine> {
    engine: E,
}

impl<E: GravityEngine> EngineGuard<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }
}

impl<E: GravityEngine> Deref for EngineGuard<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.engine
    }
}

impl<E: GravityEngine> DerefMut for EngineGuard<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.engine
    }
}

impl<E: GravityEngine> Drop for EngineGuard<E> {
    fn drop(&mut self) {
        self.engine.stop();
    }
}

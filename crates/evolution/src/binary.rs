//! Binary construction from orbital elements.

use dynbin_core::body::PointMass;
use dynbin_core::constants::G;
use dynbin_core::vector::Vector3;
use dynbin_gravity::IntegrationError;
use dynbin_orbits::{self as orbits, ConversionError, OrbitPhase};
use thiserror::Error;

pub const PRIMARY: &str = "primary";
pub const SECONDARY: &str = "secondary";

/// One component of the binary. Its mass only ever decreases over a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    pub name: String,
    pub mass_kg: f64,
    pub position_m: Vector3,
    pub velocity_m_s: Vector3,
}

impl Star {
    fn from_point_mass(name: &str, body: PointMass) -> Self {
        Self {
            name: name.to_string(),
            mass_kg: body.mass_kg,
            position_m: body.position_m,
            velocity_m_s: body.velocity_m_s,
        }
    }

    pub fn point_mass(&self) -> PointMass {
        PointMass::new(self.mass_kg, self.position_m, self.velocity_m_s)
    }
}

/// The binary as a whole plus its two stars.
#[derive(Debug, Clone, PartialEq)]
pub struct BinarySystem {
    pub total_mass_kg: f64,
    pub semimajor_axis_m: f64,
    pub eccentricity: f64,
    pub primary: Star,
    pub secondary: Star,
}

#[derive(Debug, Error, PartialEq)]
pub enum SetupError {
    #[error("invalid orbit: {parameter} = {value} ({requirement})")]
    InvalidOrbit {
        parameter: &'static str,
        value: f64,
        requirement: &'static str,
    },
    #[error("invalid mass-loss law: rate and reference mass must be finite, rate >= 0, reference > 0")]
    InvalidMassLoss,
    #[error("invalid time grid: end time {end_time_s} s gives step {dt_s} s")]
    InvalidTimestep { end_time_s: f64, dt_s: f64 },
    #[error("invalid deadline of {0} s")]
    InvalidDeadline(f64),
    #[error("invalid engine accuracy parameter eta = {0}")]
    InvalidAccuracy(f64),
    #[error("orbit conversion failed: {0}")]
    Conversion(#[from] ConversionError),
}

/// Build a binary with the secondary at periapsis, in the centre-of-mass frame.
pub fn make_binary_star(
    primary_mass_kg: f64,
    secondary_mass_kg: f64,
    semimajor_axis_m: f64,
    eccentricity: f64,
) -> Result<BinarySystem, SetupError> {
    check(
        "primary mass",
        primary_mass_kg,
        primary_mass_kg > 0.0,
        "must be positive",
    )?;
    check(
        "secondary mass",
        secondary_mass_kg,
        secondary_mass_kg > 0.0,
        "must be positive",
    )?;
    check(
        "semimajor axis",
        semimajor_axis_m,
        semimajor_axis_m > 0.0,
        "must be positive",
    )?;
    check(
        "eccentricity",
        eccentricity,
        (0.0..1.0).contains(&eccentricity),
        "must lie in [0, 1)",
    )?;

    let (primary, secondary) = orbits::new_binary_from_orbital_elements(
        primary_mass_kg,
        secondary_mass_kg,
        semimajor_axis_m,
        eccentricity,
        OrbitPhase::default(),
        G,
    )?;

    Ok(BinarySystem {
        total_mass_kg: primary_mass_kg + secondary_mass_kg,
        semimajor_axis_m,
        eccentricity,
        primary: Star::from_point_mass(PRIMARY, primary),
        secondary: Star::from_point_mass(SECONDARY, secondary),
    })
}

fn check(
    parameter: &'static str,
    value: f64,
    ok: bool,
    requirement: &'static str,
) -> Result<(), SetupError> {
    if ok && value.is_finite() {
        Ok(())
    } else {
        Err(SetupError::InvalidOrbit {
            parameter,
            value,
            requirement,
        })
    }
}

impl BinarySystem {
    /// Keplerian period of the current orbit.
    pub fn period_s(&self) -> f64 {
        orbits::orbital_period(self.semimajor_axis_m, self.total_mass_kg, G)
    }

    pub fn masses_kg(&self) -> [f64; 2] {
        [self.primary.mass_kg, self.secondary.mass_kg]
    }

    pub fn point_masses(&self) -> [PointMass; 2] {
        [self.primary.point_mass(), self.secondary.point_mass()]
    }

    /// Copy engine positions and velocities into the stars (engine → stars channel).
    pub fn sync_from(&mut self, state: &[PointMass]) -> Result<(), IntegrationError> {
        let [primary, secondary] = state else {
            return Err(IntegrationError::ParticleCountMismatch {
                expected: 2,
                got: state.len(),
            });
        };
        for (star, body) in [(&mut self.primary, primary), (&mut self.secondary, secondary)] {
            star.position_m = body.position_m;
            star.velocity_m_s = body.velocity_m_s;
        }
        Ok(())
    }

    /// Remove `rate · dt` from each star, never going below zero, and refresh the total.
    pub fn apply_mass_loss(&mut self, rates_kg_per_s: &[f64; 2], dt_s: f64) {
        for (star, rate) in [&mut self.primary, &mut self.secondary]
            .into_iter()
            .zip(rates_kg_per_s)
        {
            star.mass_kg = (star.mass_kg - rate * dt_s).max(0.0);
        }
        self.total_mass_kg = self.primary.mass_kg + self.secondary.mass_kg;
    }

    /// Keplerian elements of the stars' current Cartesian state.
    pub fn elements(&self) -> Result<orbits::OrbitalElements, ConversionError> {
        orbits::orbital_elements_from_binary(
            &self.primary.point_mass(),
            &self.secondary.point_mass(),
            G,
        )
    }
}

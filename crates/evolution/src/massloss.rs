//! Stellar-wind mass-loss law and its first-order effect on the orbit.

use dynbin_core::units;

/// Quadratic-in-mass loss law: `dm/dt = rate · (m / reference_mass)²`.
///
/// Rates are magnitudes (kg/s, never negative); the caller subtracts them from the masses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassLossLaw {
    pub rate_kg_per_s: f64,
    pub reference_mass_kg: f64,
}

impl MassLossLaw {
    /// 1e-6 M☉/yr for a 1 M☉ star.
    pub fn reference() -> Self {
        Self::from_solar(1.0e-6, 1.0)
    }

    /// Build a law from a rate in M☉/yr at a reference mass in M☉.
    pub fn from_solar(rate_msun_per_yr: f64, reference_mass_msun: f64) -> Self {
        Self {
            rate_kg_per_s: units::msun_per_yr_to_kg_per_s(rate_msun_per_yr),
            reference_mass_kg: units::msun_to_kg(reference_mass_msun),
        }
    }

    /// A law that never removes mass.
    pub fn none() -> Self {
        Self {
            rate_kg_per_s: 0.0,
            reference_mass_kg: units::msun_to_kg(1.0),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.rate_kg_per_s >= 0.0
            && self.rate_kg_per_s.is_finite()
            && self.reference_mass_kg > 0.0
            && self.reference_mass_kg.is_finite()
    }

    /// Instantaneous loss rate for a star of the given mass.
    pub fn rate(&self, mass_kg: f64) -> f64 {
        let ratio = mass_kg.max(0.0) / self.reference_mass_kg;
        self.rate_kg_per_s * ratio * ratio
    }
}

impl Default for MassLossLaw {
    fn default() -> Self {
        Self::reference()
    }
}

/// Adiabatic response of the semimajor axis to isotropic mass loss from both stars:
/// `da/dt = a · Σ ṁ / Σ m`, evaluated with the current masses and rates.
pub fn semimajor_axis_rate(
    semimajor_axis_m: f64,
    rates_kg_per_s: &[f64],
    masses_kg: &[f64],
) -> f64 {
    let total_mass: f64 = masses_kg.iter().sum();
    if total_mass <= 0.0 {
        return 0.0;
    }
    let total_rate: f64 = rates_kg_per_s.iter().sum();
    semimajor_axis_m * total_rate / total_mass
}

/// Isotropic mass loss leaves the eccentricity unchanged to first order, so this is
/// identically zero.
pub fn eccentricity_rate(
    _eccentricity: f64,
    _rates_kg_per_s: &[f64],
    _masses_kg: &[f64],
) -> f64 {
    0.0
}

//! Core units, constants, and shared primitives for the binary mass-loss workspace.
//!
//! Everything inside the workspace is carried in SI units. Solar units and years only appear
//! at the edges (CLI flags, config manifests, reports) and go through the helpers in [`units`].

/// Physical constants expressed in SI units (unless stated otherwise).
pub mod constants {
    /// Newtonian gravitational constant (m³ kg⁻¹ s⁻²), CODATA 2018.
    pub const G: f64 = 6.674_30e-11;
    /// Nominal solar mass (kg).
    pub const MSUN_KG: f64 = 1.988_47e30;
    /// Nominal solar radius (m).
    pub const RSUN_M: f64 = 6.957e8;
    /// Metres per astronomical unit.
    pub const AU_M: f64 = 149_597_870_700.0;
    /// Seconds per Julian day.
    pub const SECONDS_PER_DAY: f64 = 86_400.0;
    /// Seconds per Julian year (365.25 days).
    pub const SECONDS_PER_YEAR: f64 = 365.25 * SECONDS_PER_DAY;
}

/// Basic unit conversion helpers.
pub mod units {
    use super::constants::{AU_M, MSUN_KG, RSUN_M, SECONDS_PER_YEAR};

    /// Convert solar masses to kilograms.
    #[inline]
    pub fn msun_to_kg(v: f64) -> f64 {
        v * MSUN_KG
    }

    /// Convert kilograms to solar masses.
    #[inline]
    pub fn kg_to_msun(v: f64) -> f64 {
        v / MSUN_KG
    }

    /// Convert solar radii to metres.
    #[inline]
    pub fn rsun_to_m(v: f64) -> f64 {
        v * RSUN_M
    }

    /// Convert metres to solar radii.
    #[inline]
    pub fn m_to_rsun(v: f64) -> f64 {
        v / RSUN_M
    }

    /// Convert metres to astronomical units.
    #[inline]
    pub fn m_to_au(v: f64) -> f64 {
        v / AU_M
    }

    /// Convert a mass-loss rate in M☉/yr to kg/s.
    #[inline]
    pub fn msun_per_yr_to_kg_per_s(v: f64) -> f64 {
        v * MSUN_KG / SECONDS_PER_YEAR
    }

    /// Convert a mass-loss rate in kg/s to M☉/yr.
    #[inline]
    pub fn kg_per_s_to_msun_per_yr(v: f64) -> f64 {
        v * SECONDS_PER_YEAR / MSUN_KG
    }
}

/// Lightweight time utilities shared across crates.
pub mod time {
    use super::constants::{SECONDS_PER_DAY, SECONDS_PER_YEAR};

    /// Convert years to seconds.
    #[inline]
    pub fn years_to_seconds(years: f64) -> f64 {
        years * SECONDS_PER_YEAR
    }

    /// Convert seconds to years.
    #[inline]
    pub fn seconds_to_years(seconds: f64) -> f64 {
        seconds / SECONDS_PER_YEAR
    }

    /// Convert seconds to days.
    #[inline]
    pub fn seconds_to_days(seconds: f64) -> f64 {
        seconds / SECONDS_PER_DAY
    }
}

/// Minimal vector helpers to avoid ad-hoc `[f64; 3]` math everywhere.
pub mod vector {
    /// Alias for a 3D vector in metres or m/s depending on context.
    pub type Vector3 = [f64; 3];

    /// The zero vector.
    pub const ZERO: Vector3 = [0.0; 3];

    /// Euclidean norm of a vector.
    #[inline]
    pub fn norm(v: &Vector3) -> f64 {
        dot(v, v).sqrt()
    }

    /// Dot product of two vectors.
    #[inline]
    pub fn dot(a: &Vector3, b: &Vector3) -> f64 {
        a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
    }

    /// Cross product `a × b`.
    #[inline]
    pub fn cross(a: &Vector3, b: &Vector3) -> Vector3 {
        [
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ]
    }

    /// Vector addition.
    #[inline]
    pub fn add(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
    }

    /// Vector subtraction.
    #[inline]
    pub fn sub(a: &Vector3, b: &Vector3) -> Vector3 {
        [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
    }

    /// Scale a vector by a scalar.
    #[inline]
    pub fn scale(v: &Vector3, s: f64) -> Vector3 {
        [v[0] * s, v[1] * s, v[2] * s]
    }

    /// `a + s * b`, the workhorse of the integrator updates.
    #[inline]
    pub fn add_scaled(a: &Vector3, b: &Vector3, s: f64) -> Vector3 {
        [a[0] + s * b[0], a[1] + s * b[1], a[2] + s * b[2]]
    }

    /// True when every component is finite.
    #[inline]
    pub fn is_finite(v: &Vector3) -> bool {
        v.iter().all(|c| c.is_finite())
    }
}

/// Point-mass state shared by the conversion utility and the gravity engine.
pub mod body {
    use super::vector::Vector3;

    /// Mass, position, and velocity of a single body in SI units.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PointMass {
        pub mass_kg: f64,
        pub position_m: Vector3,
        pub velocity_m_s: Vector3,
    }

    impl PointMass {
        pub fn new(mass_kg: f64, position_m: Vector3, velocity_m_s: Vector3) -> Self {
            Self {
                mass_kg,
                position_m,
                velocity_m_s,
            }
        }
    }
}

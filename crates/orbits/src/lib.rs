//! Two-body orbit helpers: Cartesian state ↔ Keplerian elements.
//!
//! Both directions work on the relative orbit of the secondary about the primary
//! (`r = r₂ - r₁`, `v = v₂ - v₁`) with `μ = G (m₁ + m₂)`. Constructed binaries are placed in
//! their centre-of-mass frame. Only bound, non-degenerate orbits are representable.
use std::f64::consts::{PI, TAU};

use dynbin_core::body::PointMass;
use dynbin_core::vector::{self, Vector3};
use thiserror::Error;

/// Below this eccentricity the periapsis direction is undefined and angles are measured from
/// the line of nodes (or the x-axis for equatorial orbits).
const CIRCULAR_TOLERANCE: f64 = 1e-11;
/// Below this inclination the line of nodes is undefined.
const EQUATORIAL_TOLERANCE: f64 = 1e-11;

/// Keplerian description of a two-body orbit. Angles in radians, SI otherwise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalElements {
    pub mass1_kg: f64,
    pub mass2_kg: f64,
    pub semimajor_axis_m: f64,
    pub eccentricity: f64,
    pub true_anomaly_rad: f64,
    pub inclination_rad: f64,
    pub longitude_of_ascending_node_rad: f64,
    pub argument_of_periapsis_rad: f64,
}

/// Orientation and phase used when building a binary from elements.
///
/// The default places the secondary at periapsis in the reference plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OrbitPhase {
    pub true_anomaly_rad: f64,
    pub inclination_rad: f64,
    pub longitude_of_ascending_node_rad: f64,
    pub argument_of_periapsis_rad: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("body masses must be positive and finite (got {mass1_kg} kg, {mass2_kg} kg)")]
    NonPositiveMass { mass1_kg: f64, mass2_kg: f64 },
    #[error("semimajor axis must be positive and finite (got {0} m)")]
    InvalidSemimajorAxis(f64),
    #[error("eccentricity {0} is outside [0, 1)")]
    InvalidEccentricity(f64),
    #[error("bodies are coincident; relative separation is zero")]
    ZeroSeparation,
    #[error("state contains non-finite components")]
    NonFinite,
    #[error("orbit is unbound (specific energy {specific_energy} J/kg, eccentricity {eccentricity})")]
    Unbound {
        specific_energy: f64,
        eccentricity: f64,
    },
    #[error("relative motion is purely radial; orbit plane is undefined")]
    Radial,
}

/// Gravitational parameter `μ = G (m₁ + m₂)`.
#[inline]
pub fn gravitational_parameter(mass1_kg: f64, mass2_kg: f64, g: f64) -> f64 {
    g * (mass1_kg + mass2_kg)
}

/// Keplerian orbital period `2π sqrt(a³ / μ)`.
pub fn orbital_period(semimajor_axis_m: f64, total_mass_kg: f64, g: f64) -> f64 {
    TAU * (semimajor_axis_m.powi(3) / (g * total_mass_kg)).sqrt()
}

/// Build the two bodies of a binary from Keplerian elements, in the centre-of-mass frame.
///
/// The first returned body carries `mass1_kg`, the second `mass2_kg`.
pub fn new_binary_from_orbital_elements(
    mass1_kg: f64,
    mass2_kg: f64,
    semimajor_axis_m: f64,
    eccentricity: f64,
    phase: OrbitPhase,
    g: f64,
) -> Result<(PointMass, PointMass), ConversionError> {
    if !(mass1_kg > 0.0 && mass2_kg > 0.0 && mass1_kg.is_finite() && mass2_kg.is_finite()) {
        return Err(ConversionError::NonPositiveMass { mass1_kg, mass2_kg });
    }
    if !(semimajor_axis_m > 0.0 && semimajor_axis_m.is_finite()) {
        return Err(ConversionError::InvalidSemimajorAxis(semimajor_axis_m));
    }
    if !(0.0..1.0).contains(&eccentricity) {
        return Err(ConversionError::InvalidEccentricity(eccentricity));
    }

    let (rel_position, rel_velocity) = relative_state_from_elements(
        gravitational_parameter(mass1_kg, mass2_kg, g),
        semimajor_axis_m,
        eccentricity,
        &phase,
    );

    let total = mass1_kg + mass2_kg;
    let f1 = -mass2_kg / total;
    let f2 = mass1_kg / total;
    Ok((
        PointMass::new(
            mass1_kg,
            vector::scale(&rel_position, f1),
            vector::scale(&rel_velocity, f1),
        ),
        PointMass::new(
            mass2_kg,
            vector::scale(&rel_position, f2),
            vector::scale(&rel_velocity, f2),
        ),
    ))
}

/// Recover the Keplerian elements of the relative orbit of `secondary` about `primary`.
pub fn orbital_elements_from_binary(
    primary: &PointMass,
    secondary: &PointMass,
    g: f64,
) -> Result<OrbitalElements, ConversionError> {
    let (mass1_kg, mass2_kg) = (primary.mass_kg, secondary.mass_kg);
    if !(mass1_kg > 0.0 && mass2_kg > 0.0 && mass1_kg.is_finite() && mass2_kg.is_finite()) {
        return Err(ConversionError::NonPositiveMass { mass1_kg, mass2_kg });
    }

    let r = vector::sub(&secondary.position_m, &primary.position_m);
    let v = vector::sub(&secondary.velocity_m_s, &primary.velocity_m_s);
    if !(vector::is_finite(&r) && vector::is_finite(&v)) {
        return Err(ConversionError::NonFinite);
    }
    let r_mag = vector::norm(&r);
    if r_mag == 0.0 {
        return Err(ConversionError::ZeroSeparation);
    }

    let mu = gravitational_parameter(mass1_kg, mass2_kg, g);
    let specific_energy = 0.5 * vector::dot(&v, &v) - mu / r_mag;

    let h = vector::cross(&r, &v);
    let h_mag = vector::norm(&h);
    if h_mag <= f64::EPSILON * r_mag * vector::norm(&v) {
        return Err(ConversionError::Radial);
    }

    let e_vec = vector::sub(
        &vector::scale(&vector::cross(&v, &h), 1.0 / mu),
        &vector::scale(&r, 1.0 / r_mag),
    );
    let eccentricity = vector::norm(&e_vec);
    if specific_energy >= 0.0 || eccentricity >= 1.0 {
        return Err(ConversionError::Unbound {
            specific_energy,
            eccentricity,
        });
    }
    let semimajor_axis_m = -mu / (2.0 * specific_energy);

    let inclination_rad = (h[2] / h_mag).clamp(-1.0, 1.0).acos();
    // line of nodes: ẑ × h
    let node = [-h[1], h[0], 0.0];
    let node_mag = vector::norm(&node);
    let equatorial =
        inclination_rad < EQUATORIAL_TOLERANCE || PI - inclination_rad < EQUATORIAL_TOLERANCE;
    let circular = eccentricity < CIRCULAR_TOLERANCE;

    let longitude_of_ascending_node_rad = if equatorial {
        0.0
    } else {
        wrap_two_pi(node[1].atan2(node[0]))
    };

    // Reference direction in the orbit plane from which periapsis / position angles are measured.
    let reference: Vector3 = if equatorial {
        [1.0, 0.0, 0.0]
    } else {
        vector::scale(&node, 1.0 / node_mag)
    };
    let h_hat = vector::scale(&h, 1.0 / h_mag);
    let signed_angle = |from: &Vector3, to: &Vector3| -> f64 {
        let sin = vector::dot(&h_hat, &vector::cross(from, to));
        let cos = vector::dot(from, to);
        wrap_two_pi(sin.atan2(cos))
    };

    let (argument_of_periapsis_rad, true_anomaly_rad) = if circular {
        (0.0, signed_angle(&reference, &r))
    } else {
        (signed_angle(&reference, &e_vec), signed_angle(&e_vec, &r))
    };

    Ok(OrbitalElements {
        mass1_kg,
        mass2_kg,
        semimajor_axis_m,
        eccentricity,
        true_anomaly_rad,
        inclination_rad,
        longitude_of_ascending_node_rad,
        argument_of_periapsis_rad,
    })
}

fn relative_state_from_elements(
    mu: f64,
    semimajor_axis_m: f64,
    eccentricity: f64,
    phase: &OrbitPhase,
) -> (Vector3, Vector3) {
    let nu = phase.true_anomaly_rad;
    let p = semimajor_axis_m * (1.0 - eccentricity * eccentricity);
    let radius = p / (1.0 + eccentricity * nu.cos());
    let speed_scale = (mu / p).sqrt();

    let position_pf = [radius * nu.cos(), radius * nu.sin(), 0.0];
    let velocity_pf = [
        -speed_scale * nu.sin(),
        speed_scale * (eccentricity + nu.cos()),
        0.0,
    ];

    let rotation = perifocal_to_reference(
        phase.longitude_of_ascending_node_rad,
        phase.inclination_rad,
        phase.argument_of_periapsis_rad,
    );
    (
        rotate(&rotation, &position_pf),
        rotate(&rotation, &velocity_pf),
    )
}

/// Rotation matrix `R₃(-Ω) R₁(-i) R₃(-ω)` taking perifocal vectors to the reference frame.
fn perifocal_to_reference(node: f64, inclination: f64, periapsis: f64) -> [Vector3; 3] {
    let (so, co) = node.sin_cos();
    let (si, ci) = inclination.sin_cos();
    let (sw, cw) = periapsis.sin_cos();
    [
        [co * cw - so * sw * ci, -co * sw - so * cw * ci, so * si],
        [so * cw + co * sw * ci, -so * sw + co * cw * ci, -co * si],
        [sw * si, cw * si, ci],
    ]
}

fn rotate(m: &[Vector3; 3], v: &Vector3) -> Vector3 {
    [vector::dot(&m[0], v), vector::dot(&m[1], v), vector::dot(&m[2], v)]
}

fn wrap_two_pi(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

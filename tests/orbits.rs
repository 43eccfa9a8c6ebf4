use dynbin_massloss::orbits::{
    ConversionError, OrbitPhase, new_binary_from_orbital_elements, orbital_elements_from_binary,
    orbital_period,
};
use dynbin_massloss::physics::body::PointMass;
use dynbin_massloss::physics::constants::{G, SECONDS_PER_YEAR};
use dynbin_massloss::physics::units::{msun_to_kg, rsun_to_m};
use dynbin_massloss::physics::vector;

fn rel_diff(actual: f64, expected: f64) -> f64 {
    ((actual - expected) / expected).abs()
}

#[test]
fn elements_round_trip_for_reference_binary() {
    let m1 = msun_to_kg(15.0);
    let m2 = msun_to_kg(8.0);
    let a = rsun_to_m(138.0);
    let (primary, secondary) =
        new_binary_from_orbital_elements(m1, m2, a, 0.68, OrbitPhase::default(), G)
            .expect("binary");

    let elements = orbital_elements_from_binary(&primary, &secondary, G).expect("elements");
    assert_eq!(elements.mass1_kg, m1);
    assert_eq!(elements.mass2_kg, m2);
    assert!(rel_diff(elements.semimajor_axis_m, a) < 1e-12);
    assert!((elements.eccentricity - 0.68).abs() < 1e-12);
    // secondary starts at periapsis; allow wrap-around just below 2π
    let nu = elements.true_anomaly_rad;
    assert!(nu.abs() < 1e-9 || (nu - std::f64::consts::TAU).abs() < 1e-9, "nu = {nu}");
}

#[test]
fn elements_round_trip_for_inclined_phases() {
    let m1 = msun_to_kg(3.0);
    let m2 = msun_to_kg(1.2);
    let a = rsun_to_m(25.0);
    let phases = [
        OrbitPhase {
            true_anomaly_rad: 1.1,
            inclination_rad: 0.4,
            longitude_of_ascending_node_rad: 2.0,
            argument_of_periapsis_rad: 0.7,
        },
        OrbitPhase {
            true_anomaly_rad: 3.0,
            inclination_rad: 2.5,
            longitude_of_ascending_node_rad: 5.5,
            argument_of_periapsis_rad: 4.2,
        },
    ];
    for phase in phases {
        for e in [0.05, 0.3, 0.9] {
            let (p, s) = new_binary_from_orbital_elements(m1, m2, a, e, phase, G).unwrap();
            let el = orbital_elements_from_binary(&p, &s, G).unwrap();
            assert!(rel_diff(el.semimajor_axis_m, a) < 1e-10);
            assert!((el.eccentricity - e).abs() < 1e-10);
            assert!((el.inclination_rad - phase.inclination_rad).abs() < 1e-9);
            let node_error =
                el.longitude_of_ascending_node_rad - phase.longitude_of_ascending_node_rad;
            assert!(node_error.abs() < 1e-9);
            let periapsis_error = el.argument_of_periapsis_rad - phase.argument_of_periapsis_rad;
            assert!(periapsis_error.abs() < 1e-8);
            assert!((el.true_anomaly_rad - phase.true_anomaly_rad).abs() < 1e-8);
        }
    }
}

#[test]
fn binary_is_built_in_centre_of_mass_frame_at_periapsis() {
    let m1 = msun_to_kg(15.0);
    let m2 = msun_to_kg(8.0);
    let a = rsun_to_m(138.0);
    let e = 0.68;
    let (p, s) =
        new_binary_from_orbital_elements(m1, m2, a, e, OrbitPhase::default(), G).unwrap();

    for axis in 0..3 {
        let com = m1 * p.position_m[axis] + m2 * s.position_m[axis];
        let momentum = m1 * p.velocity_m_s[axis] + m2 * s.velocity_m_s[axis];
        assert!(com.abs() < 1e-6 * m1 * a);
        assert!(momentum.abs() < 1e-6 * m1);
    }

    let separation = vector::norm(&vector::sub(&s.position_m, &p.position_m));
    assert!(rel_diff(separation, a * (1.0 - e)) < 1e-12);
}

#[test]
fn reference_period_is_about_five_weeks() {
    let period = orbital_period(rsun_to_m(138.0), msun_to_kg(23.0), G);
    let period_yr = period / SECONDS_PER_YEAR;
    assert!(period_yr > 0.09 && period_yr < 0.12, "period {period_yr} yr");
}

#[test]
fn invalid_construction_inputs_are_rejected() {
    let m = msun_to_kg(1.0);
    let a = rsun_to_m(10.0);
    let phase = OrbitPhase::default();
    assert!(matches!(
        new_binary_from_orbital_elements(0.0, m, a, 0.1, phase, G),
        Err(ConversionError::NonPositiveMass { .. })
    ));
    assert!(matches!(
        new_binary_from_orbital_elements(m, m, -a, 0.1, phase, G),
        Err(ConversionError::InvalidSemimajorAxis(_))
    ));
    assert_eq!(
        new_binary_from_orbital_elements(m, m, a, 1.0, phase, G),
        Err(ConversionError::InvalidEccentricity(1.0))
    );
}

#[test]
fn degenerate_states_are_rejected() {
    let m = msun_to_kg(1.0);
    let here = PointMass::new(m, [1.0e9, 0.0, 0.0], [0.0, 0.0, 0.0]);
    assert_eq!(
        orbital_elements_from_binary(&here, &here, G),
        Err(ConversionError::ZeroSeparation)
    );

    let origin = PointMass::new(m, [0.0; 3], [0.0; 3]);
    let radial = PointMass::new(m, [1.0e9, 0.0, 0.0], [1.0e3, 0.0, 0.0]);
    assert_eq!(
        orbital_elements_from_binary(&origin, &radial, G),
        Err(ConversionError::Radial)
    );

    let massless = PointMass::new(0.0, [1.0e9, 0.0, 0.0], [0.0, 1.0e3, 0.0]);
    assert!(matches!(
        orbital_elements_from_binary(&origin, &massless, G),
        Err(ConversionError::NonPositiveMass { .. })
    ));
}

#[test]
fn escaping_state_is_unbound() {
    let m = msun_to_kg(1.0);
    let r = 1.0e10;
    let escape = (2.0 * G * 2.0 * m / r).sqrt();
    let origin = PointMass::new(m, [0.0; 3], [0.0; 3]);
    let fast = PointMass::new(m, [r, 0.0, 0.0], [0.0, 1.5 * escape, 0.0]);
    assert!(matches!(
        orbital_elements_from_binary(&origin, &fast, G),
        Err(ConversionError::Unbound { .. })
    ));
}

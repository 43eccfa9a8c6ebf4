//! Fourth-order Hermite predictor–corrector with a shared, adaptive time step.
//!
//! Each step predicts positions and velocities from the acceleration and jerk, re-evaluates
//! both at the predicted state, and applies the Hermite corrector. The step length follows the
//! collision / free-fall time criterion of Hut & Makino, scaled by `eta`, and the last step of
//! every `evolve_to` is shortened so the model lands exactly on the requested time.

use dynbin_core::body::PointMass;
use dynbin_core::vector::{self, Vector3, ZERO};

use crate::{GravityEngine, IntegrationError, UnitScale};

/// Accuracy and safety knobs for [`Hermite`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HermiteParameters {
    /// Dimensionless step-size factor; smaller is more accurate.
    pub eta: f64,
    /// Upper bound on sub-steps taken by a single `evolve_to` call.
    pub max_substeps: u64,
}

impl Default for HermiteParameters {
    fn default() -> Self {
        Self {
            eta: 0.01,
            max_substeps: 50_000_000,
        }
    }
}

/// Particle in N-body units.
#[derive(Debug, Clone, Copy)]
struct Particle {
    mass: f64,
    position: Vector3,
    velocity: Vector3,
}

/// Direct-summation Hermite engine.
#[derive(Debug)]
pub struct Hermite {
    scale: UnitScale,
    params: HermiteParameters,
    particles: Vec<Particle>,
    time: f64,
    substeps: u64,
    stopped: bool,
}

impl Hermite {
    pub fn new(scale: UnitScale) -> Result<Self, IntegrationError> {
        Self::with_parameters(scale, HermiteParameters::default())
    }

    pub fn with_parameters(
        scale: UnitScale,
        params: HermiteParameters,
    ) -> Result<Self, IntegrationError> {
        if !scale.is_valid() || !(params.eta > 0.0 && params.eta.is_finite()) {
            return Err(IntegrationError::InvalidUnitScale);
        }
        Ok(Self {
            scale,
            params,
            particles: Vec::new(),
            time: 0.0,
            substeps: 0,
            stopped: false,
        })
    }

    pub fn unit_scale(&self) -> &UnitScale {
        &self.scale
    }

    /// Total number of sub-steps taken since creation.
    pub fn substeps(&self) -> u64 {
        self.substeps
    }

    /// Total energy in SI units (J), useful for monitoring integration error.
    pub fn total_energy(&self) -> f64 {
        let mut kinetic = 0.0;
        let mut potential = 0.0;
        for (i, p) in self.particles.iter().enumerate() {
            kinetic += 0.5 * p.mass * vector::dot(&p.velocity, &p.velocity);
            for q in &self.particles[i + 1..] {
                let r = vector::norm(&vector::sub(&q.position, &p.position));
                potential -= p.mass * q.mass / r;
            }
        }
        let energy_unit = self.scale.mass_kg * self.scale.velocity_m_s().powi(2);
        (kinetic + potential) * energy_unit
    }

    fn ensure_running(&self) -> Result<(), IntegrationError> {
        if self.stopped {
            Err(IntegrationError::Stopped)
        } else {
            Ok(())
        }
    }

    fn step(&mut self, dt: f64) {
        let (acc0, jerk0) = accelerations_and_jerks(&self.particles);
        let dt2 = dt * dt;
        let dt3 = dt2 * dt;

        let predicted: Vec<Particle> = self
            .particles
            .iter()
            .zip(acc0.iter().zip(jerk0.iter()))
            .map(|(p, (a, j))| {
                let mut position = vector::add_scaled(&p.position, &p.velocity, dt);
                position = vector::add_scaled(&position, a, 0.5 * dt2);
                position = vector::add_scaled(&position, j, dt3 / 6.0);
                let mut velocity = vector::add_scaled(&p.velocity, a, dt);
                velocity = vector::add_scaled(&velocity, j, 0.5 * dt2);
                Particle {
                    mass: p.mass,
                    position,
                    velocity,
                }
            })
            .collect();

        let (acc1, jerk1) = accelerations_and_jerks(&predicted);

        for (i, p) in self.particles.iter_mut().enumerate() {
            let v0 = p.velocity;
            let mut v1 = vector::add_scaled(&v0, &vector::add(&acc0[i], &acc1[i]), 0.5 * dt);
            v1 = vector::add_scaled(&v1, &vector::sub(&jerk0[i], &jerk1[i]), dt2 / 12.0);
            let mut x1 = vector::add_scaled(&p.position, &vector::add(&v0, &v1), 0.5 * dt);
            x1 = vector::add_scaled(&x1, &vector::sub(&acc0[i], &acc1[i]), dt2 / 12.0);
            p.position = x1;
            p.velocity = v1;
        }
    }

    /// Shared step from the minimum pairwise collision and free-fall times.
    fn timestep(&self) -> f64 {
        let mut tau = f64::INFINITY;
        for (i, p) in self.particles.iter().enumerate() {
            for q in &self.particles[i + 1..] {
                let r = vector::norm(&vector::sub(&q.position, &p.position));
                let v = vector::norm(&vector::sub(&q.velocity, &p.velocity));
                if v > 0.0 {
                    tau = tau.min(r / v);
                }
                let m = p.mass + q.mass;
                if m > 0.0 {
                    tau = tau.min((r.powi(3) / m).sqrt());
                }
            }
        }
        self.params.eta * tau
    }

    fn state_is_finite(&self) -> bool {
        self.particles
            .iter()
            .all(|p| vector::is_finite(&p.position) && vector::is_finite(&p.velocity))
    }
}

impl GravityEngine for Hermite {
    fn add_particles(&mut self, bodies: &[PointMass]) -> Result<(), IntegrationError> {
        self.ensure_running()?;
        let offset = self.particles.len();
        for (i, body) in bodies.iter().enumerate() {
            if !(body.mass_kg >= 0.0 && body.mass_kg.is_finite()) {
                return Err(IntegrationError::InvalidMass {
                    index: offset + i,
                    mass_kg: body.mass_kg,
                });
            }
        }
        let velocity_unit = self.scale.velocity_m_s();
        self.particles.extend(bodies.iter().map(|body| Particle {
            mass: body.mass_kg / self.scale.mass_kg,
            position: vector::scale(&body.position_m, 1.0 / self.scale.length_m),
            velocity: vector::scale(&body.velocity_m_s, 1.0 / velocity_unit),
        }));
        tracing::debug!(count = self.particles.len(), "hermite particles registered");
        Ok(())
    }

    fn evolve_to(&mut self, time_s: f64) -> Result<(), IntegrationError> {
        self.ensure_running()?;
        let target = time_s / self.scale.time_s;
        if target < self.time {
            return Err(IntegrationError::TimeReversal {
                current_s: self.model_time(),
                requested_s: time_s,
            });
        }
        if self.particles.len() < 2 {
            self.time = target;
            return Ok(());
        }

        let mut taken = 0u64;
        while self.time < target {
            if taken >= self.params.max_substeps {
                return Err(IntegrationError::StepLimit {
                    limit: self.params.max_substeps,
                    requested_s: time_s,
                });
            }
            let remaining = target - self.time;
            let mut dt = self.timestep();
            if !(dt > 0.0 && dt.is_finite()) {
                return Err(IntegrationError::StepCollapse {
                    time_s: self.model_time(),
                    dt_s: dt * self.scale.time_s,
                });
            }
            let last = dt >= remaining;
            if last {
                dt = remaining;
            }
            self.step(dt);
            self.time = if last { target } else { self.time + dt };
            taken += 1;

            if !self.state_is_finite() {
                return Err(IntegrationError::NonFinite {
                    time_s: self.model_time(),
                });
            }
        }
        self.substeps += taken;
        Ok(())
    }

    fn read_state(&self) -> Result<Vec<PointMass>, IntegrationError> {
        self.ensure_running()?;
        let velocity_unit = self.scale.velocity_m_s();
        Ok(self
            .particles
            .iter()
            .map(|p| {
                PointMass::new(
                    p.mass * self.scale.mass_kg,
                    vector::scale(&p.position, self.scale.length_m),
                    vector::scale(&p.velocity, velocity_unit),
                )
            })
            .collect())
    }

    fn write_masses(&mut self, masses_kg: &[f64]) -> Result<(), IntegrationError> {
        self.ensure_running()?;
        if masses_kg.len() != self.particles.len() {
            return Err(IntegrationError::ParticleCountMismatch {
                expected: self.particles.len(),
                got: masses_kg.len(),
            });
        }
        if let Some((index, &mass_kg)) = masses_kg
            .iter()
            .enumerate()
            .find(|(_, m)| !(**m >= 0.0 && m.is_finite()))
        {
            return Err(IntegrationError::InvalidMass { index, mass_kg });
        }
        for (p, m) in self.particles.iter_mut().zip(masses_kg) {
            p.mass = m / self.scale.mass_kg;
        }
        Ok(())
    }

    fn model_time(&self) -> f64 {
        self.time * self.scale.time_s
    }

    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.particles.clear();
        self.particles.shrink_to_fit();
        tracing::debug!(substeps = self.substeps, "hermite engine stopped");
    }

    fn is_stopped(&self) -> bool {
        self.stopped
    }
}

/// Pairwise accelerations and their time derivatives (jerks), `G = 1`.
fn accelerations_and_jerks(particles: &[Particle]) -> (Vec<Vector3>, Vec<Vector3>) {
    let n = particles.len();
    let mut acc = vec![ZERO; n];
    let mut jerk = vec![ZERO; n];
    for i in 0..n {
        for j in i + 1..n {
            let r = vector::sub(&particles[j].position, &particles[i].position);
            let v = vector::sub(&particles[j].velocity, &particles[i].velocity);
            let r2 = vector::dot(&r, &r);
            let r3 = r2 * r2.sqrt();
            let rv = vector::dot(&r, &v);

            let a_unit = vector::scale(&r, 1.0 / r3);
            let j_unit = vector::sub(
                &vector::scale(&v, 1.0 / r3),
                &vector::scale(&r, 3.0 * rv / (r3 * r2)),
            );

            acc[i] = vector::add_scaled(&acc[i], &a_unit, particles[j].mass);
            acc[j] = vector::add_scaled(&acc[j], &a_unit, -particles[i].mass);
            jerk[i] = vector::add_scaled(&jerk[i], &j_unit, particles[j].mass);
            jerk[j] = vector::add_scaled(&jerk[j], &j_unit, -particles[i].mass);
        }
    }
    (acc, jerk)
}

//! The co-evolution loop.
//!
//! Every step, in this order: advance the engine with the masses set at the start of the step,
//! copy positions and velocities back into the stars, evaluate the loss rates, advance the
//! analytic `(a, e)` from its own previous value, remove mass from the stars and push the new
//! masses to the engine, then convert the resulting state to elements and record a sample.
//! Recorded true elements therefore describe the exact state the next step starts from.

use std::time::{Duration, Instant};

use dynbin_core::constants::G;
use dynbin_core::time::seconds_to_years;
use dynbin_core::units::{kg_to_msun, m_to_rsun};
use dynbin_gravity::{EngineGuard, GravityEngine, IntegrationError, UnitScale};
use dynbin_orbits::ConversionError;
use thiserror::Error;

use crate::binary::{BinarySystem, SetupError};
use crate::massloss::{MassLossLaw, eccentricity_rate, semimajor_axis_rate};
use crate::series::{Sample, TimeSeries};

/// Upper bound on samples reserved before the loop; longer runs grow the series as they go.
const MAX_RESERVED_SAMPLES: usize = 1 << 16;

/// Lifecycle of a [`CoEvolution`] driver. A driver runs at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    Idle,
    Running,
    Finished,
    Failed,
}

/// Time grid, mass-loss law, and optional wall-clock budget for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSettings {
    pub end_time_s: f64,
    /// `dt = step_fraction · end_time / step_count`; the reference grid is 0.5 / 1000.
    pub step_count: f64,
    pub step_fraction: f64,
    pub mass_loss: MassLossLaw,
    pub deadline: Option<Duration>,
}

impl RunSettings {
    pub fn new(end_time_s: f64) -> Self {
        Self {
            end_time_s,
            step_count: 1000.0,
            step_fraction: 0.5,
            mass_loss: MassLossLaw::reference(),
            deadline: None,
        }
    }

    pub fn with_mass_loss(mut self, mass_loss: MassLossLaw) -> Self {
        self.mass_loss = mass_loss;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Driver step length. A positive end time must yield a positive, finite step.
    pub fn timestep(&self) -> Result<f64, SetupError> {
        let dt_s = self.step_fraction * self.end_time_s / self.step_count;
        if !self.end_time_s.is_finite() || self.end_time_s < 0.0 {
            return Err(SetupError::InvalidTimestep {
                end_time_s: self.end_time_s,
                dt_s,
            });
        }
        // the loop only terminates if every increment actually advances the clock
        if self.end_time_s > 0.0
            && !(dt_s > 0.0 && dt_s.is_finite() && self.end_time_s + dt_s > self.end_time_s)
        {
            return Err(SetupError::InvalidTimestep {
                end_time_s: self.end_time_s,
                dt_s,
            });
        }
        Ok(dt_s)
    }
}

/// Everything a reporter needs once the run has finished.
#[derive(Debug, Clone)]
pub struct EvolutionReport {
    /// State at `t = 0`, where true and analytic values coincide.
    pub initial: Sample,
    pub series: TimeSeries,
    pub dt_s: f64,
    pub initial_period_s: f64,
    /// Binary as it stands after the final step.
    pub final_binary: BinarySystem,
}

/// Why a step failed.
#[derive(Debug, Error)]
pub enum StepError {
    #[error("integration failed: {0}")]
    Integration(#[from] IntegrationError),
    #[error("orbital element conversion failed: {0}")]
    Conversion(#[from] ConversionError),
    #[error("wall-clock deadline of {limit:?} exceeded after {elapsed:?}")]
    DeadlineExceeded { limit: Duration, elapsed: Duration },
}

/// A run aborted mid-loop, with everything recorded before the failure.
#[derive(Debug, Error)]
#[error("run aborted at t = {:.6} yr: {cause}", years(.time_s))]
pub struct RunFailure {
    pub time_s: f64,
    #[source]
    pub cause: StepError,
    pub last_good: Option<Sample>,
    pub partial: TimeSeries,
}

#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error("setup failed: {0}")]
    Setup(#[from] SetupError),
    #[error("gravity engine could not be initialised: {0}")]
    EngineSetup(#[source] IntegrationError),
    #[error("driver has already run (state {0:?})")]
    AlreadyRun(DriverState),
    #[error(transparent)]
    Aborted(Box<RunFailure>),
}

impl EvolutionError {
    /// Samples recorded before an aborted run failed.
    pub fn partial_series(&self) -> Option<&TimeSeries> {
        match self {
            Self::Aborted(failure) => Some(&failure.partial),
            _ => None,
        }
    }
}

fn years(time_s: &f64) -> f64 {
    seconds_to_years(*time_s)
}

/// Analytic estimate advanced alongside the integration.
#[derive(Debug, Clone, Copy)]
struct AnalyticOrbit {
    semimajor_axis_m: f64,
    eccentricity: f64,
}

/// Single-use driver owning the time loop.
#[derive(Debug)]
pub struct CoEvolution {
    settings: RunSettings,
    state: DriverState,
}

impl CoEvolution {
    pub fn new(settings: RunSettings) -> Self {
        Self {
            settings,
            state: DriverState::Idle,
        }
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    pub fn settings(&self) -> &RunSettings {
        &self.settings
    }

    /// Evolve `binary` to the configured end time.
    ///
    /// `create_engine` receives a unit scale derived from the binary's total mass and
    /// semimajor axis. The engine is stopped on every exit path.
    pub fn run<E, F>(
        &mut self,
        binary: &mut BinarySystem,
        create_engine: F,
    ) -> Result<EvolutionReport, EvolutionError>
    where
        E: GravityEngine,
        F: FnOnce(UnitScale) -> Result<E, IntegrationError>,
    {
        if self.state != DriverState::Idle {
            return Err(EvolutionError::AlreadyRun(self.state));
        }
        if !self.settings.mass_loss.is_valid() {
            return Err(SetupError::InvalidMassLoss.into());
        }
        let dt = self.settings.timestep()?;
        let end_time = self.settings.end_time_s;

        let initial_period_s = binary.period_s();
        let initial = Sample::at_start(binary);

        let scale = UnitScale::new(binary.total_mass_kg, binary.semimajor_axis_m, G);
        let engine = create_engine(scale).map_err(EvolutionError::EngineSetup)?;
        let mut engine = EngineGuard::new(engine);
        engine
            .add_particles(&binary.point_masses())
            .map_err(EvolutionError::EngineSetup)?;

        tracing::info!(
            period_yr = seconds_to_years(initial_period_s),
            dt_yr = seconds_to_years(dt),
            end_time_yr = seconds_to_years(end_time),
            a_rsun = m_to_rsun(binary.semimajor_axis_m),
            "starting co-evolution"
        );

        self.state = DriverState::Running;
        let estimated_steps = if dt > 0.0 {
            (end_time / dt).ceil() as usize + 1
        } else {
            0
        };
        let mut series = TimeSeries::with_capacity(estimated_steps.min(MAX_RESERVED_SAMPLES));
        let mut analytic = AnalyticOrbit {
            semimajor_axis_m: binary.semimajor_axis_m,
            eccentricity: binary.eccentricity,
        };
        let started = Instant::now();
        let mut time = 0.0;

        while time < end_time {
            if let Some(limit) = self.settings.deadline {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    let cause = StepError::DeadlineExceeded { limit, elapsed };
                    return Err(self.abort(time, cause, series));
                }
            }

            time += dt;
            match self.step(&mut *engine, binary, &mut analytic, time, dt) {
                Ok(sample) => {
                    tracing::debug!(
                        time_yr = seconds_to_years(sample.time_s),
                        a_rsun = m_to_rsun(sample.semimajor_axis_m),
                        e = sample.eccentricity,
                        m1_msun = kg_to_msun(sample.primary_mass_kg),
                        m2_msun = kg_to_msun(sample.secondary_mass_kg),
                        "step"
                    );
                    series.push(sample);
                }
                Err(cause) => return Err(self.abort(time, cause, series)),
            }
        }

        drop(engine);
        self.state = DriverState::Finished;
        tracing::info!(
            samples = series.len(),
            final_mass_msun = kg_to_msun(binary.total_mass_kg),
            "co-evolution finished"
        );

        Ok(EvolutionReport {
            initial,
            series,
            dt_s: dt,
            initial_period_s,
            final_binary: binary.clone(),
        })
    }

    fn step<E: GravityEngine>(
        &self,
        engine: &mut E,
        binary: &mut BinarySystem,
        analytic: &mut AnalyticOrbit,
        time: f64,
        dt: f64,
    ) -> Result<Sample, StepError> {
        engine.evolve_to(time)?;
        binary.sync_from(&engine.read_state()?)?;

        let masses = binary.masses_kg();
        let rates = masses.map(|m| self.settings.mass_loss.rate(m));

        let da_dt = semimajor_axis_rate(analytic.semimajor_axis_m, &rates, &masses);
        let de_dt = eccentricity_rate(analytic.eccentricity, &rates, &masses);
        analytic.semimajor_axis_m += da_dt * dt;
        analytic.eccentricity += de_dt * dt;

        binary.apply_mass_loss(&rates, dt);
        engine.write_masses(&binary.masses_kg())?;

        let elements = binary.elements()?;
        binary.semimajor_axis_m = elements.semimajor_axis_m;
        binary.eccentricity = elements.eccentricity;

        Ok(Sample {
            time_s: time,
            semimajor_axis_m: elements.semimajor_axis_m,
            eccentricity: elements.eccentricity,
            total_mass_kg: binary.total_mass_kg,
            analytic_semimajor_axis_m: analytic.semimajor_axis_m,
            analytic_eccentricity: analytic.eccentricity,
            primary_mass_kg: binary.primary.mass_kg,
            secondary_mass_kg: binary.secondary.mass_kg,
        })
    }

    fn abort(&mut self, time_s: f64, cause: StepError, partial: TimeSeries) -> EvolutionError {
        self.state = DriverState::Failed;
        tracing::warn!(
            time_yr = seconds_to_years(time_s),
            samples = partial.len(),
            error = %cause,
            "co-evolution aborted"
        );
        EvolutionError::Aborted(Box::new(RunFailure {
            time_s,
            cause,
            last_good: partial.last().copied(),
            partial,
        }))
    }
}

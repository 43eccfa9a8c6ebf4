//! Turning a run manifest into a ready-to-run binary and driver settings.

use std::time::Duration;

use dynbin_config::RunConfig;
use dynbin_core::time::years_to_seconds;
use dynbin_core::units::{msun_to_kg, rsun_to_m};
use dynbin_gravity::{Hermite, HermiteParameters};

use crate::binary::{BinarySystem, SetupError, make_binary_star};
use crate::driver::{CoEvolution, EvolutionError, EvolutionReport, RunSettings};
use crate::massloss::MassLossLaw;

/// A validated run: the binary at `t = 0`, the driver settings, and the engine accuracy.
#[derive(Debug, Clone)]
pub struct RunPlan {
    pub name: String,
    pub binary: BinarySystem,
    pub settings: RunSettings,
    pub engine: HermiteParameters,
}

impl RunPlan {
    /// Convert a manifest from solar units to SI and validate it. Nothing is allocated for the
    /// engine until [`run_plan`] is called.
    pub fn from_config(config: &RunConfig) -> Result<Self, SetupError> {
        let binary = make_binary_star(
            msun_to_kg(config.primary_mass_msun),
            msun_to_kg(config.secondary_mass_msun),
            rsun_to_m(config.semimajor_axis_rsun),
            config.eccentricity,
        )?;

        let mass_loss = MassLossLaw::from_solar(
            config.mass_loss.rate_msun_per_yr,
            config.mass_loss.reference_mass_msun,
        );
        if !mass_loss.is_valid() {
            return Err(SetupError::InvalidMassLoss);
        }

        let integrator = &config.integrator;
        let mut settings =
            RunSettings::new(years_to_seconds(config.end_time_yr)).with_mass_loss(mass_loss);
        settings.step_count = integrator.step_count;
        settings.step_fraction = integrator.step_fraction;
        if let Some(secs) = integrator.deadline_secs {
            let deadline =
                Duration::try_from_secs_f64(secs).map_err(|_| SetupError::InvalidDeadline(secs))?;
            settings = settings.with_deadline(deadline);
        }
        settings.timestep()?;

        if !(integrator.eta > 0.0 && integrator.eta.is_finite()) {
            return Err(SetupError::InvalidAccuracy(integrator.eta));
        }
        let engine = HermiteParameters {
            eta: integrator.eta,
            ..HermiteParameters::default()
        };

        Ok(Self {
            name: config.name.clone(),
            binary,
            settings,
            engine,
        })
    }
}

/// Run a plan with the bundled Hermite engine. The plan's binary is left untouched; the
/// evolved binary is returned in the report.
pub fn run_plan(plan: &RunPlan) -> Result<EvolutionReport, EvolutionError> {
    let mut binary = plan.binary.clone();
    let params = plan.engine;
    CoEvolution::new(plan.settings.clone())
        .run(&mut binary, |scale| Hermite::with_parameters(scale, params))
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use dynbin_massloss::config::{RunConfig, load_run_configs};
use dynbin_massloss::evolution::{EvolutionError, RunPlan, Sample, TimeSeries, run_plan};
use dynbin_massloss::export::summary::write_summary;
use dynbin_massloss::export::timeseries::{self, writer_for_path};
use dynbin_massloss::physics::time::{seconds_to_days, seconds_to_years};
use dynbin_massloss::physics::units::{kg_to_msun, m_to_au, m_to_rsun};
use dynbin_massloss::report::{self, FigureOptions};
use tracing::Level;

/// Evolve a mass-losing binary by direct integration and compare against the adiabatic model.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Binary orbit evolution under stellar mass loss (direct vs. analytic)"
)]
struct Cli {
    /// Primary mass in M☉ [default: 15]
    #[arg(short = 'M', long = "mprim")]
    primary_mass: Option<f64>,

    /// Secondary mass in M☉ [default: 8]
    #[arg(short = 'm', long = "msec")]
    secondary_mass: Option<f64>,

    /// Initial semimajor axis in R☉ [default: 138]
    #[arg(short = 'a', long = "semimajor-axis")]
    semimajor_axis: Option<f64>,

    /// Initial eccentricity [default: 0.68]
    #[arg(short = 'e', long = "eccentricity")]
    eccentricity: Option<f64>,

    /// Simulated span in years [default: 1000]
    #[arg(short = 't', long = "end-time")]
    end_time: Option<f64>,

    /// Mass-loss coefficient in M☉/yr for a 1 M☉ star [default: 1e-6]
    #[arg(long)]
    mass_loss_rate: Option<f64>,

    /// Number of step units in the span; dt = step_fraction * end_time / steps [default: 1000]
    #[arg(long)]
    steps: Option<f64>,

    /// Fraction applied to end_time / steps [default: 0.5]
    #[arg(long)]
    step_fraction: Option<f64>,

    /// Hermite accuracy parameter [default: 0.01]
    #[arg(long)]
    eta: Option<f64>,

    /// Abort a run once it has used this many wall-clock seconds
    #[arg(long)]
    deadline_secs: Option<f64>,

    /// Run manifest: a .toml file, a YAML list, or a directory of .toml files.
    /// Command-line values override every manifest entry.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output CSV file (use '-' for stdout)
    #[arg(long, default_value = "artifacts/mloss.csv")]
    csv: PathBuf,

    /// Optional JSON summary path
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Output figure (PNG)
    #[arg(long, default_value = "artifacts/mloss.png")]
    figure: PathBuf,

    /// Skip figure rendering
    #[arg(long, default_value_t = false)]
    no_figure: bool,

    /// Increase log verbosity (-v for per-step output, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn apply_overrides(&self, config: &mut RunConfig) {
        if let Some(v) = self.primary_mass {
            config.primary_mass_msun = v;
        }
        if let Some(v) = self.secondary_mass {
            config.secondary_mass_msun = v;
        }
        if let Some(v) = self.semimajor_axis {
            config.semimajor_axis_rsun = v;
        }
        if let Some(v) = self.eccentricity {
            config.eccentricity = v;
        }
        if let Some(v) = self.end_time {
            config.end_time_yr = v;
        }
        if let Some(v) = self.mass_loss_rate {
            config.mass_loss.rate_msun_per_yr = v;
        }
        if let Some(v) = self.steps {
            config.integrator.step_count = v;
        }
        if let Some(v) = self.step_fraction {
            config.integrator.step_fraction = v;
        }
        if let Some(v) = self.eta {
            config.integrator.eta = v;
        }
        if self.deadline_secs.is_some() {
            config.integrator.deadline_secs = self.deadline_secs;
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut runs = match &cli.config {
        Some(path) => load_run_configs(path)
            .with_context(|| format!("loading run manifests from {}", path.display()))?,
        None => vec![RunConfig::default()],
    };
    for run in &mut runs {
        cli.apply_overrides(run);
    }

    let multi = runs.len() > 1;
    for config in &runs {
        let outputs = Outputs::for_run(&cli, config, multi);
        simulate(config, &outputs)?;
    }
    Ok(())
}

/// Artifact paths for one run. Sweeps suffix each path with the run name.
struct Outputs {
    csv: PathBuf,
    summary: Option<PathBuf>,
    figure: Option<PathBuf>,
}

impl Outputs {
    fn for_run(cli: &Cli, config: &RunConfig, multi: bool) -> Self {
        let tag = |path: &Path| {
            if multi && path != Path::new("-") {
                with_run_name(path, &config.name)
            } else {
                path.to_path_buf()
            }
        };
        Self {
            csv: tag(&cli.csv),
            summary: cli.summary.as_deref().map(tag),
            figure: (!cli.no_figure).then(|| tag(&cli.figure)),
        }
    }
}

fn with_run_name(path: &Path, name: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("mloss");
    let file_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}-{name}.{ext}"),
        None => format!("{stem}-{name}"),
    };
    path.with_file_name(file_name)
}

fn simulate(config: &RunConfig, outputs: &Outputs) -> anyhow::Result<()> {
    let plan = RunPlan::from_config(config)
        .with_context(|| format!("invalid parameters for run '{}'", config.name))?;
    let to_stdout = outputs.csv == Path::new("-");

    let period_s = plan.binary.period_s();
    if !to_stdout {
        println!(
            "{}: M = {:.3} + {:.3} M☉, a = {:.3} R☉ ({:.4} AU), e = {:.3}",
            config.name,
            config.primary_mass_msun,
            config.secondary_mass_msun,
            config.semimajor_axis_rsun,
            m_to_au(plan.binary.semimajor_axis_m),
            config.eccentricity,
        );
        println!(
            "period = {:.6} yr ({:.3} d), dt = {:.6} yr",
            seconds_to_years(period_s),
            seconds_to_days(period_s),
            seconds_to_years(plan.settings.timestep()?),
        );
    }

    match run_plan(&plan) {
        Ok(report) => {
            write_artifacts(config, &plan, &report.initial, &report.series, "finished", outputs)?;
            if !to_stdout {
                if let Some(last) = report.series.last() {
                    print_final(last);
                }
            }
            Ok(())
        }
        Err(EvolutionError::Aborted(failure)) => {
            let initial = Sample::at_start(&plan.binary);
            write_artifacts(config, &plan, &initial, &failure.partial, "aborted", outputs)?;
            let last_good = match &failure.last_good {
                Some(sample) => describe(sample),
                None => "none (failed on the first step)".to_string(),
            };
            Err(anyhow::anyhow!(
                "{failure}; last good state: {last_good}; {} samples written",
                failure.partial.len()
            ))
        }
        Err(err) => Err(err).with_context(|| format!("run '{}' failed", config.name)),
    }
}

fn write_artifacts(
    config: &RunConfig,
    plan: &RunPlan,
    initial: &Sample,
    series: &TimeSeries,
    status: &str,
    outputs: &Outputs,
) -> anyhow::Result<()> {
    let records = report::records_from_series(series);

    let mut writer = writer_for_path(&outputs.csv)
        .with_context(|| format!("creating {}", outputs.csv.display()))?;
    timeseries::write_all(&mut *writer, &records)?;
    if outputs.csv != Path::new("-") {
        tracing::info!(path = %outputs.csv.display(), rows = records.len(), "wrote time series");
    }

    if let Some(path) = &outputs.summary {
        let summary = report::build_summary(config, plan, initial, series, status);
        write_summary(path, &summary).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "wrote summary");
    }

    if let Some(path) = &outputs.figure {
        if records.is_empty() {
            tracing::warn!(path = %path.display(), "no samples recorded; skipping figure");
        } else {
            report::render_figure(&records, path, FigureOptions::default())
                .with_context(|| format!("rendering {}", path.display()))?;
            tracing::info!(path = %path.display(), "wrote figure");
        }
    }
    Ok(())
}

fn describe(sample: &Sample) -> String {
    format!(
        "t = {:.6} yr, a = {:.6} R☉, e = {:.6}, m1 = {:.9} M☉, m2 = {:.9} M☉",
        seconds_to_years(sample.time_s),
        m_to_rsun(sample.semimajor_axis_m),
        sample.eccentricity,
        kg_to_msun(sample.primary_mass_kg),
        kg_to_msun(sample.secondary_mass_kg)
    )
}

fn print_final(last: &Sample) {
    println!("final: {}", describe(last));
    println!(
        "analytic: a = {:.6} R☉, e = {:.6} (relative difference in a {:.3e})",
        m_to_rsun(last.analytic_semimajor_axis_m),
        last.analytic_eccentricity,
        last.semimajor_axis_residual()
    );
}

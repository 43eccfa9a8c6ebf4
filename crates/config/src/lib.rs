//! Run manifests for binary mass-loss simulations.
//!
//! Manifests are written in astrophysical units (M☉, R☉, yr) and converted to SI by the
//! evolution crate. Every field has a default matching the reference run, so a manifest only
//! needs to name what it changes.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// One simulation run.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    pub name: String,
    pub primary_mass_msun: f64,
    pub secondary_mass_msun: f64,
    pub semimajor_axis_rsun: f64,
    pub eccentricity: f64,
    pub end_time_yr: f64,
    pub mass_loss: MassLossConfig,
    pub integrator: IntegratorConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: "mloss".to_string(),
            primary_mass_msun: 15.0,
            secondary_mass_msun: 8.0,
            semimajor_axis_rsun: 138.0,
            eccentricity: 0.68,
            end_time_yr: 1000.0,
            mass_loss: MassLossConfig::default(),
            integrator: IntegratorConfig::default(),
        }
    }
}

/// Quadratic mass-loss law `dm/dt = rate · (m / reference_mass)²`.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MassLossConfig {
    pub rate_msun_per_yr: f64,
    pub reference_mass_msun: f64,
}

impl Default for MassLossConfig {
    fn default() -> Self {
        Self {
            rate_msun_per_yr: 1.0e-6,
            reference_mass_msun: 1.0,
        }
    }
}

/// Driver step grid and engine accuracy.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Hermite accuracy parameter.
    pub eta: f64,
    /// `dt = step_fraction · end_time / step_count`.
    pub step_count: f64,
    pub step_fraction: f64,
    /// Wall-clock budget for the whole run, checked once per step.
    pub deadline_secs: Option<f64>,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            eta: 0.01,
            step_count: 1000.0,
            step_fraction: 0.5,
            deadline_secs: None,
        }
    }
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read manifest: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("no run manifests found at {0}")]
    Empty(PathBuf),
}

/// Load run manifests from a `.toml` file (one run), a YAML file (a list of runs), or a
/// directory of `.toml` files loaded in file-name order. Directory manifests without a `name`
/// key are named after their file stem.
pub fn load_run_configs<P: AsRef<Path>>(path: P) -> Result<Vec<RunConfig>, ConfigError> {
    let path = path.as_ref();
    let runs = if path.is_dir() {
        read_dir_configs(path)?
    } else {
        load_records(path)?
    };
    if runs.is_empty() {
        return Err(ConfigError::Empty(path.to_path_buf()));
    }
    Ok(runs)
}

/// Load a single run manifest; multi-run sources yield their first entry.
pub fn load_run_config<P: AsRef<Path>>(path: P) -> Result<RunConfig, ConfigError> {
    let path = path.as_ref();
    load_run_configs(path)?
        .into_iter()
        .next()
        .ok_or_else(|| ConfigError::Empty(path.to_path_buf()))
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.extension().map(|ext| ext == "toml").unwrap_or(false) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_configs(dir: &Path) -> Result<Vec<RunConfig>, ConfigError> {
    let mut runs = Vec::new();
    for path in toml_entries(dir)? {
        let contents = std::fs::read_to_string(&path)?;
        let table: toml::Table = contents.parse()?;
        let named = table.contains_key("name");
        let mut run: RunConfig = toml::Value::Table(table).try_into()?;
        if !named {
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                run.name = stem.to_string();
            }
        }
        runs.push(run);
    }
    Ok(runs)
}

fn toml_entries(dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map(|ext| ext == "toml").unwrap_or(false))
        .collect();
    entries.sort();
    Ok(entries)
}

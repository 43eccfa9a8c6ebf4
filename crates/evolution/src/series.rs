//! Recorded time series of true and analytic orbital state.

use crate::binary::BinarySystem;

/// One sample, taken at the end of a driver step. SI units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time_s: f64,
    /// Semimajor axis from the integrated Cartesian state.
    pub semimajor_axis_m: f64,
    pub eccentricity: f64,
    pub total_mass_kg: f64,
    /// Semimajor axis from the analytic mass-loss model.
    pub analytic_semimajor_axis_m: f64,
    pub analytic_eccentricity: f64,
    pub primary_mass_kg: f64,
    pub secondary_mass_kg: f64,
}

impl Sample {
    /// The binary as set up, before any step; true and analytic values coincide.
    pub fn at_start(binary: &BinarySystem) -> Self {
        Self {
            time_s: 0.0,
            semimajor_axis_m: binary.semimajor_axis_m,
            eccentricity: binary.eccentricity,
            total_mass_kg: binary.total_mass_kg,
            analytic_semimajor_axis_m: binary.semimajor_axis_m,
            analytic_eccentricity: binary.eccentricity,
            primary_mass_kg: binary.primary.mass_kg,
            secondary_mass_kg: binary.secondary.mass_kg,
        }
    }

    /// `(a_true - a_analytic) / a_analytic`.
    pub fn semimajor_axis_residual(&self) -> f64 {
        (self.semimajor_axis_m - self.analytic_semimajor_axis_m) / self.analytic_semimajor_axis_m
    }
}

/// Append-only, chronologically ordered samples.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimeSeries {
    samples: Vec<Sample>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, sample: Sample) {
        debug_assert!(
            self.samples
                .last()
                .is_none_or(|last| last.time_s <= sample.time_s),
            "samples must be appended in chronological order"
        );
        self.samples.push(sample);
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Sample> {
        self.samples.iter()
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a Sample;
    type IntoIter = std::slice::Iter<'a, Sample>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

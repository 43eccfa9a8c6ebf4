//! Export helpers for CSV and JSON artifacts.

/// Per-step time series as CSV, in solar units and years.
pub mod timeseries {
    use std::fs::{self, File};
    use std::io::{self, BufWriter, Write};
    use std::path::Path;

    pub const HEADER: &str = "time_yr,a_rsun,e,mass_msun,a_analytic_rsun,e_analytic,m1_msun,m2_msun";

    /// Create a writer for the target path, handling stdout (`-`) by convention.
    pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
        if path == Path::new("-") {
            return Ok(Box::new(BufWriter::new(io::stdout())));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Box::new(BufWriter::new(file)))
    }

    /// Write the standard time-series CSV header.
    pub fn write_header(writer: &mut dyn Write) -> io::Result<()> {
        writeln!(writer, "{}", HEADER)
    }

    /// CSV row emitted by the time-series exporter.
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct Record {
        pub time_yr: f64,
        pub a_rsun: f64,
        pub e: f64,
        pub mass_msun: f64,
        pub a_analytic_rsun: f64,
        pub e_analytic: f64,
        pub m1_msun: f64,
        pub m2_msun: f64,
    }

    impl Record {
        /// Serialize the record to CSV, matching the standard header ordering.
        pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
            writeln!(
                writer,
                "{:.9},{:.9},{:.9},{:.9},{:.9},{:.9},{:.9},{:.9}",
                self.time_yr,
                self.a_rsun,
                self.e,
                self.mass_msun,
                self.a_analytic_rsun,
                self.e_analytic,
                self.m1_msun,
                self.m2_msun,
            )
        }
    }

    /// Write header plus every record and flush.
    pub fn write_all<'a, I>(writer: &mut dyn Write, records: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a Record>,
    {
        write_header(writer)?;
        for record in records {
            record.write_to(writer)?;
        }
        writer.flush()
    }
}

/// JSON summary sidecar written next to the CSV.
pub mod summary {
    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use std::fs::{self, File};
    use std::io;
    use std::path::Path;

    /// Inputs of the run, in solar units.
    #[derive(Debug, Clone, Serialize)]
    pub struct RunInputs {
        pub primary_mass_msun: f64,
        pub secondary_mass_msun: f64,
        pub semimajor_axis_rsun: f64,
        pub eccentricity: f64,
        pub end_time_yr: f64,
        pub mass_loss_rate_msun_per_yr: f64,
        pub eta: f64,
    }

    /// Final comparison between the integrated orbit and the analytic model.
    #[derive(Debug, Clone, Serialize)]
    pub struct RunSummary<'a> {
        pub name: &'a str,
        pub generated_utc: String,
        pub status: &'a str,
        pub inputs: RunInputs,
        pub period_yr: f64,
        pub dt_yr: f64,
        pub steps: usize,
        pub initial_mass_msun: f64,
        pub final_mass_msun: f64,
        /// System mass-loss rate at the start and end of the run, in M☉/yr.
        pub initial_mass_loss_rate_msun_per_yr: f64,
        pub final_mass_loss_rate_msun_per_yr: f64,
        pub final_time_yr: f64,
        pub final_a_rsun: f64,
        pub final_a_analytic_rsun: f64,
        pub final_e: f64,
        pub final_e_analytic: f64,
        pub a_relative_difference: f64,
    }

    /// Write the summary as pretty-printed JSON, creating parent directories.
    pub fn write_summary(path: &Path, summary: &RunSummary<'_>) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        to_writer_pretty(File::create(path)?, summary)?;
        Ok(())
    }
}

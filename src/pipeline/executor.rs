//! Pipeline execution engine.
//!
//! Applies a spec's steps to a table in order and reports what changed.

use std::path::Path;
use std::time::{Duration, Instant};

use super::spec::PipelineSpec;
use crate::dataframe::DataFrame;
use crate::error::Result;
use crate::io::{read_csv, write_csv, CsvOptions};

/// Report generated after pipeline execution
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Number of rows before processing
    pub rows_before: usize,

    /// Number of columns before processing
    pub columns_before: usize,

    /// Number of rows after processing
    pub rows_after: usize,

    /// Number of columns after processing
    pub columns_after: usize,

    /// Number of steps applied
    pub steps_applied: usize,

    /// Warnings generated during execution
    pub warnings: Vec<String>,

    /// Time taken for execution
    pub duration: Duration,
}

impl RunReport {
    /// Create a summary message
    pub fn summary(&self) -> String {
        format!(
            "Pipeline completed: rows {} → {}, columns {} → {}, {} steps, {:.3}s",
            self.rows_before,
            self.rows_after,
            self.columns_before,
            self.columns_after,
            self.steps_applied,
            self.duration.as_secs_f64()
        )
    }
}

/// A validated pipeline ready to run
#[derive(Debug, Clone)]
pub struct Pipeline {
    spec: PipelineSpec,
}

impl Pipeline {
    /// Validates the spec's expressions and selectors up front
    pub fn new(spec: PipelineSpec) -> Result<Self> {
        spec.validate()?;
        Ok(Self { spec })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::new(PipelineSpec::from_file(path)?)
    }

    pub fn spec(&self) -> &PipelineSpec {
        &self.spec
    }

    /// Runs every step in order, stopping at the first failure
    pub fn run(&self, input: &DataFrame) -> Result<(DataFrame, RunReport)> {
        let start = Instant::now();
        let mut warnings = Vec::new();

        log::info!(
            "running pipeline `{}` ({} steps) on {} rows x {} columns",
            self.spec.name,
            self.spec.steps.len(),
            input.row_count(),
            input.column_count()
        );

        let mut df = input.clone();
        for (index, step) in self.spec.steps.iter().enumerate() {
            log::debug!("step {}: {}", index + 1, step);
            df = step.apply(&df).map_err(|e| {
                log::error!(
                    "pipeline `{}` failed at step {} ({}): {}",
                    self.spec.name,
                    index + 1,
                    step,
                    e
                );
                e
            })?;

            if df.is_empty() && input.row_count() > 0 {
                warnings.push(format!("Step {} ({}) produced no rows", index + 1, step));
            }
        }

        let report = RunReport {
            rows_before: input.row_count(),
            columns_before: input.column_count(),
            rows_after: df.row_count(),
            columns_after: df.column_count(),
            steps_applied: self.spec.steps.len(),
            warnings,
            duration: start.elapsed(),
        };
        log::info!("{}", report.summary());
        for warning in &report.warnings {
            log::warn!("{}", warning);
        }

        Ok((df, report))
    }
}

/// Reads a CSV file, runs the pipeline over it and optionally writes the
/// result as CSV
pub fn run_pipeline(
    spec: &PipelineSpec,
    input_path: impl AsRef<Path>,
    output_path: Option<impl AsRef<Path>>,
    options: &CsvOptions,
) -> Result<(DataFrame, RunReport)> {
    let pipeline = Pipeline::new(spec.clone())?;
    let input = read_csv(input_path, options)?;
    let (output, report) = pipeline.run(&input)?;

    if let Some(path) = output_path {
        write_csv(&output, path)?;
    }
    Ok((output, report))
}

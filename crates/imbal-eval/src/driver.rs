//! Batch evaluation of a list of dataset files.

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{error, info, instrument};

use crate::average::{RunEvaluator, average_runs};
use crate::runner::MetricVector;
use crate::EvalError;

/// Runs averaged per file when none is configured.
pub const DEFAULT_RUNS: usize = 10;

/// Dataset files evaluated when none are configured, in output order.
pub const DEFAULT_FILES: [&str; 12] = [
    "final_datasets/static_old_10.arff",
    "final_datasets/static_old_20.arff",
    "final_datasets/static_old_40.arff",
    "final_datasets/static_old_60.arff",
    "final_datasets/static_old_80.arff",
    "final_datasets/static_old_100.arff",
    "final_datasets/window_10.arff",
    "final_datasets/window_20.arff",
    "final_datasets/window_40.arff",
    "final_datasets/window_60.arff",
    "final_datasets/window_80.arff",
    "final_datasets/window_100.arff",
];

/// Which files to evaluate, how often, and what to do when one fails.
///
/// # Defaults
///
/// | Parameter    | Default           |
/// |--------------|-------------------|
/// | `runs`       | [`DEFAULT_RUNS`]  |
/// | `files`      | [`DEFAULT_FILES`] |
/// | `keep_going` | `false`           |
#[derive(Debug, Clone)]
pub struct DriverConfig {
    runs: usize,
    files: Vec<PathBuf>,
    keep_going: bool,
}

impl DriverConfig {
    /// Create the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            runs: DEFAULT_RUNS,
            files: DEFAULT_FILES.iter().map(PathBuf::from).collect(),
            keep_going: false,
        }
    }

    /// Set the number of runs averaged per file.
    #[must_use]
    pub fn with_runs(mut self, runs: usize) -> Self {
        self.runs = runs;
        self
    }

    /// Replace the file list.
    #[must_use]
    pub fn with_files(mut self, files: Vec<PathBuf>) -> Self {
        self.files = files;
        self
    }

    /// Log a failing file and continue with the next one instead of stopping.
    #[must_use]
    pub fn with_keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Return the run count.
    pub fn runs(&self) -> usize {
        self.runs
    }

    /// Return the file list.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Return whether failures are skipped.
    pub fn keep_going(&self) -> bool {
        self.keep_going
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A file whose evaluation failed while `keep_going` was set.
#[derive(Debug)]
pub struct FailedFile {
    /// The dataset file.
    pub path: PathBuf,
    /// Why it failed.
    pub error: EvalError,
}

/// Outcome of a [`Driver::run`].
#[derive(Debug, Default)]
pub struct DriverReport {
    /// Files whose result line was written.
    pub completed: usize,
    /// Files skipped after an error.
    pub failed: Vec<FailedFile>,
}

/// Evaluates every configured file and writes one result line per file.
pub struct Driver {
    config: DriverConfig,
}

impl Driver {
    /// Create a driver for `config`.
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Average `runs` evaluations of each file in order and write
    /// `path,p0,r0,f0,p1,r1,f1,accuracy,` lines to `out`.
    ///
    /// # Errors
    ///
    /// Without `keep_going`, the first evaluation error stops the batch and
    /// no line is written for that file. [`EvalError::Output`] always stops it.
    #[instrument(skip_all, fields(n_files = self.config.files.len(), runs = self.config.runs))]
    pub fn run<E, W>(&self, evaluator: &mut E, out: &mut W) -> Result<DriverReport, EvalError>
    where
        E: RunEvaluator + ?Sized,
        W: Write,
    {
        let mut report = DriverReport::default();
        for path in &self.config.files {
            match average_runs(&mut *evaluator, self.config.runs, path) {
                Ok(metrics) => {
                    info!(path = %path.display(), accuracy = metrics.values()[6], "file evaluated");
                    writeln!(out, "{}", format_line(path, &metrics)).map_err(EvalError::Output)?;
                    out.flush().map_err(EvalError::Output)?;
                    report.completed += 1;
                }
                Err(err) if self.config.keep_going => {
                    error!(path = %path.display(), error = %err, "file skipped");
                    report.failed.push(FailedFile {
                        path: path.clone(),
                        error: err,
                    });
                }
                Err(err) => return Err(err),
            }
        }
        Ok(report)
    }
}

/// The path, then every metric, each followed by a comma.
pub fn format_line(path: &Path, metrics: &MetricVector) -> String {
    let mut line = format!("{},", path.display());
    for &value in metrics.values() {
        line.push_str(&format_metric(value));
        line.push(',');
    }
    line
}

/// Shortest round-trip digits, plain for magnitudes in `[1e-3, 1e7)` and
/// `d.dddE<exp>` otherwise, always with a fractional digit (`0.5`, `1.0`,
/// `5.0E-4`, `NaN`).
pub fn format_metric(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || !value.is_finite() || (1e-3..1e7).contains(&magnitude) {
        return format!("{value:?}");
    }
    let sci = format!("{value:e}");
    match sci.split_once('e') {
        Some((mantissa, exp)) if mantissa.contains('.') => format!("{mantissa}E{exp}"),
        Some((mantissa, exp)) => format!("{mantissa}.0E{exp}"),
        None => sci,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_has_trailing_comma() {
        let metrics = MetricVector::new([1.0, 0.5, 0.25, 0.0, 1.0, 0.125, 0.75]);
        assert_eq!(
            format_line(Path::new("final_datasets/window_10.arff"), &metrics),
            "final_datasets/window_10.arff,1.0,0.5,0.25,0.0,1.0,0.125,0.75,"
        );
    }

    #[test]
    fn small_and_large_metrics_use_exponent_form() {
        assert_eq!(format_metric(0.0005), "5.0E-4");
        assert_eq!(format_metric(1.25e-5), "1.25E-5");
        assert_eq!(format_metric(0.001), "0.001");
        assert_eq!(format_metric(0.0), "0.0");
        assert_eq!(format_metric(f64::NAN), "NaN");
        assert_eq!(format_metric(1e7), "1.0E7");

        let metrics = MetricVector::new([0.0005, 1.0, 0.5, 0.0, 0.9995, 0.25, 0.75]);
        assert_eq!(
            format_line(Path::new("a.arff"), &metrics),
            "a.arff,5.0E-4,1.0,0.5,0.0,0.9995,0.25,0.75,"
        );
    }

    #[test]
    fn defaults() {
        let config = DriverConfig::default();
        assert_eq!(config.runs(), 10);
        assert_eq!(config.files().len(), 12);
        assert_eq!(config.files()[0], Path::new("final_datasets/static_old_10.arff"));
        assert_eq!(config.files()[11], Path::new("final_datasets/window_100.arff"));
        assert!(!config.keep_going());
    }

    fn failing_on(bad: &'static str) -> impl FnMut(&Path) -> Result<MetricVector, EvalError> {
        move |path: &Path| {
            if path == Path::new(bad) {
                Err(EvalError::EmptyDataset)
            } else {
                Ok(MetricVector::new([0.5; 7]))
            }
        }
    }

    #[test]
    fn fail_fast_stops_at_first_error() {
        let config = DriverConfig::new()
            .with_runs(2)
            .with_files(vec!["a.arff".into(), "b.arff".into(), "c.arff".into()]);
        let mut out = Vec::new();
        let result = Driver::new(config).run(&mut failing_on("b.arff"), &mut out);
        assert!(matches!(result, Err(EvalError::EmptyDataset)));
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert!(text.starts_with("a.arff,"));
    }

    #[test]
    fn keep_going_skips_failed_file() {
        let config = DriverConfig::new()
            .with_runs(1)
            .with_files(vec!["a.arff".into(), "b.arff".into(), "c.arff".into()])
            .with_keep_going(true);
        let mut out = Vec::new();
        let report = Driver::new(config)
            .run(&mut failing_on("b.arff"), &mut out)
            .unwrap();
        assert_eq!(report.completed, 2);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].path, Path::new("b.arff"));
        let text = String::from_utf8(out).unwrap();
        let paths: Vec<&str> = text.lines().map(|l| l.split(',').next().unwrap()).collect();
        assert_eq!(paths, vec!["a.arff", "c.arff"]);
    }
}

//! Repeated runs and element-wise averaging.

use std::path::Path;

use tracing::{debug, instrument};

use crate::runner::MetricVector;
use crate::EvalError;

/// Produces one [`MetricVector`] per call for a dataset file.
pub trait RunEvaluator {
    /// Run one evaluation of `path`.
    fn evaluate_once(&mut self, path: &Path) -> Result<MetricVector, EvalError>;
}

impl<F> RunEvaluator for F
where
    F: FnMut(&Path) -> Result<MetricVector, EvalError>,
{
    fn evaluate_once(&mut self, path: &Path) -> Result<MetricVector, EvalError> {
        self(path)
    }
}

/// Evaluate `path` `runs` times in sequence and return the element-wise mean.
///
/// The first failing run aborts the average.
///
/// # Errors
///
/// Returns [`EvalError::InvalidRunCount`] if `runs` is zero, otherwise the
/// first error of the evaluator.
#[instrument(skip(evaluator), fields(path = %path.display()))]
pub fn average_runs<E: RunEvaluator + ?Sized>(
    evaluator: &mut E,
    runs: usize,
    path: &Path,
) -> Result<MetricVector, EvalError> {
    if runs == 0 {
        return Err(EvalError::InvalidRunCount { runs });
    }
    let mut sum = MetricVector::zero();
    for run in 0..runs {
        let metrics = evaluator.evaluate_once(path)?;
        debug!(run, accuracy = metrics.values()[6], "run complete");
        sum += metrics;
    }
    Ok(sum.scaled_down(runs as f64))
}

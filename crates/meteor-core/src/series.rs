use std::ops::Range;

use crate::error::{MeteorError, Result};
use crate::stats::{mean_stddev, Dispersion};

/// Per-frame metrics in frame order. `None` marks a frame whose metric is
/// undefined (zero dispersion, undersized frame); such slots are skipped by
/// every statistic.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MetricSeries {
    values: Vec<Option<f64>>,
}

impl MetricSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn from_values(values: Vec<Option<f64>>) -> Self {
        Self { values }
    }

    /// Series where every frame has a defined metric.
    pub fn from_metrics(metrics: impl IntoIterator<Item = f64>) -> Self {
        Self {
            values: metrics.into_iter().map(Some).collect(),
        }
    }

    /// Store the metric of frame `index`, growing the series with undefined
    /// slots if needed. The series never shrinks.
    pub fn insert(&mut self, index: usize, value: Option<f64>) {
        if index >= self.values.len() {
            self.values.resize(index + 1, None);
        }
        self.values[index] = value;
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }

    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    pub fn slice(&self, range: Range<usize>) -> &[Option<f64>] {
        let end = range.end.min(self.values.len());
        &self.values[range.start.min(end)..end]
    }

    /// Defined metrics only, in order.
    pub fn defined(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().filter_map(|v| *v)
    }

    /// Indices of the slots without a metric.
    pub fn undefined_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i))
    }

    pub fn defined_count(&self) -> usize {
        self.defined().count()
    }

    /// Mean and population standard deviation over the defined metrics.
    pub fn mean_stddev(&self) -> Option<(f64, f64)> {
        mean_stddev(self.defined(), Dispersion::Population)
    }

    pub fn max(&self) -> Option<f64> {
        self.defined().reduce(f64::max)
    }

    /// Copy of the series divided by its maximum.
    pub fn normalized_by_max(&self) -> Result<MetricSeries> {
        let max = self
            .max()
            .ok_or_else(|| MeteorError::DegenerateSeries("no defined metrics".into()))?;
        if max.is_nan() || max <= 0.0 {
            return Err(MeteorError::DegenerateSeries(format!(
                "maximum {max} cannot normalize the series"
            )));
        }
        Ok(Self {
            values: self.values.iter().map(|v| v.map(|x| x / max)).collect(),
        })
    }
}

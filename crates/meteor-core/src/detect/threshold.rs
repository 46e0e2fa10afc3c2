use std::borrow::Cow;

use crate::error::{MeteorError, Result};
use crate::series::MetricSeries;

use super::config::ThresholdPolicy;

/// Series the detector works on under `policy`: the raw series, or a copy
/// divided by its maximum.
pub fn analyzed_series<'a>(
    series: &'a MetricSeries,
    policy: &ThresholdPolicy,
) -> Result<Cow<'a, MetricSeries>> {
    match policy {
        ThresholdPolicy::Fixed => Ok(Cow::Borrowed(series)),
        ThresholdPolicy::MaxNormalized => Ok(Cow::Owned(series.normalized_by_max()?)),
    }
}

/// `mean + alpha * std` over the defined values, using the population
/// standard deviation. A single defined value is its own threshold.
pub fn compute_threshold(series: &MetricSeries, alpha: f64) -> Result<f64> {
    let (mean, std) = series
        .mean_stddev()
        .ok_or_else(|| MeteorError::DegenerateSeries("need at least one defined metric".into()))?;
    Ok(mean + alpha * std)
}

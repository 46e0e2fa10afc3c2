//! Per-frame contrast metric.
//!
//! A frame is reduced to one intensity plane, normalized by its global
//! dispersion, edge filtered, gated, and matched against a point-source
//! kernel. The metric is the dispersion of what remains.

pub mod convolve;

use ndarray::{Array2, Array3, ArrayView2, Axis};

use crate::consts::{
    LAPLACIAN_KERNEL, MATCHED_FILTER, MIN_FRAME_SIDE, NORMALIZATION_KERNEL_SIZE, RECTIFIER_GAIN,
};
use crate::error::MetricFault;
use crate::frame::Frame;
use crate::stats::{mean_stddev, Dispersion};

use convolve::{convolve_valid, flip, kernel_from};

/// Compute the contrast metric of one frame.
pub fn compute(frame: &Frame) -> Result<f64, MetricFault> {
    let plane = reduce_channels(&frame.data);
    compute_plane(plane.view())
}

/// Metric of an already reduced intensity plane.
pub fn compute_plane(plane: ArrayView2<f64>) -> Result<f64, MetricFault> {
    let residual = residual_map(plane)?;
    let (_, std) =
        mean_stddev(residual.iter().copied(), Dispersion::Population).ok_or(MetricFault::Undefined)?;
    if std.is_finite() {
        Ok(std)
    } else {
        Err(MetricFault::NonFinite)
    }
}

/// Sum all channels into one plane. Total energy is kept, not averaged.
pub fn reduce_channels(data: &Array3<f32>) -> Array2<f64> {
    data.mapv(f64::from).sum_axis(Axis(2))
}

/// Run the filter chain and return the residual map, shape `(H-14, W-14)`.
pub fn residual_map(plane: ArrayView2<f64>) -> Result<Array2<f64>, MetricFault> {
    let (height, width) = plane.dim();
    if height < MIN_FRAME_SIDE || width < MIN_FRAME_SIDE {
        return Err(MetricFault::FrameTooSmall {
            height,
            width,
            min: MIN_FRAME_SIDE,
        });
    }

    let (_, s) =
        mean_stddev(plane.iter().copied(), Dispersion::Population).ok_or(MetricFault::Undefined)?;
    if s == 0.0 {
        return Err(MetricFault::Undefined);
    }
    if !s.is_finite() {
        return Err(MetricFault::NonFinite);
    }

    let normalization = Array2::from_elem(
        (NORMALIZATION_KERNEL_SIZE, NORMALIZATION_KERNEL_SIZE),
        1.0 / s,
    );
    let normalized = convolve_valid(plane, normalization.view());

    let edges = convolve_valid(normalized.view(), kernel_from(&LAPLACIAN_KERNEL).view());
    let gated = edges.mapv(rectify);

    let matched = flip(kernel_from(&MATCHED_FILTER).view());
    Ok(convolve_valid(gated.view(), matched.view()))
}

/// Nonlinear gate applied between the edge and matched filters.
pub fn rectify(v: f64) -> f64 {
    let v = v - v.abs() * RECTIFIER_GAIN;
    v * -(v - v.abs())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectify_values() {
        // Positive inputs vanish, negative ones become -2 * (0.01 v)^2.
        assert_eq!(rectify(0.0), 0.0);
        assert_eq!(rectify(3.0), 0.0);
        let r = rectify(-1.0);
        assert!((r - -2.0 * 0.01f64.powi(2)).abs() < 1e-15);
    }

    #[test]
    fn test_reduce_channels_sums() {
        let data = Array3::from_shape_fn((2, 2, 3), |(_, _, c)| (c + 1) as f32);
        let plane = reduce_channels(&data);
        assert!(plane.iter().all(|&v| v == 6.0));
    }
}

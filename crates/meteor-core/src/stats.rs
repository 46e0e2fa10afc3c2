use num_traits::ToPrimitive;

/// Degrees-of-freedom correction for [`mean_stddev`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dispersion {
    /// Divide by `n`.
    Population,
    /// Divide by `n - 1`.
    Sample,
}

/// Mean and standard deviation in one pass (Welford).
///
/// Returns `None` when there are too few values for the requested
/// dispersion (none for population, fewer than two for sample).
pub fn mean_stddev<T, I>(values: I, dispersion: Dispersion) -> Option<(f64, f64)>
where
    T: ToPrimitive,
    I: IntoIterator<Item = T>,
{
    let mut count = 0usize;
    let mut mean = 0.0f64;
    let mut m2 = 0.0f64;

    for v in values {
        let x = v.to_f64()?;
        count += 1;
        let delta = x - mean;
        mean += delta / count as f64;
        m2 += delta * (x - mean);
    }

    let denom = match dispersion {
        Dispersion::Population => count,
        Dispersion::Sample => count.checked_sub(1)?,
    };
    if denom == 0 {
        return None;
    }
    Some((mean, (m2 / denom as f64).max(0.0).sqrt()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_vs_sample() {
        let v = [2.0f64, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let (mean, pop) = mean_stddev(v, Dispersion::Population).unwrap();
        assert!((mean - 5.0).abs() < 1e-12);
        assert!((pop - 2.0).abs() < 1e-12);
        let (_, sample) = mean_stddev(v, Dispersion::Sample).unwrap();
        assert!((sample - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_too_few_values() {
        assert!(mean_stddev(Vec::<f32>::new(), Dispersion::Population).is_none());
        assert!(mean_stddev([1.0f32], Dispersion::Sample).is_none());
        assert_eq!(
            mean_stddev([3u8], Dispersion::Population),
            Some((3.0, 0.0))
        );
    }
}

use ndarray::{s, Array1, Array2};

/// Least-squares polynomial over `(position, value)` pairs.
///
/// Positions are mapped affinely onto [-1, 1] before fitting so that a
/// degree-7 basis stays well conditioned over thousands of frames. The
/// represented polynomial is the same one a fit in raw positions would give.
#[derive(Clone, Debug, PartialEq)]
pub struct PolynomialFit {
    /// Coefficients in the mapped variable, lowest power first.
    pub coefficients: Vec<f64>,
    center: f64,
    scale: f64,
}

impl PolynomialFit {
    /// Fit a polynomial of at most `degree` to `points`.
    ///
    /// The degree drops to `points - 1` when there are too few samples for
    /// a unique solution. Returns `None` for an empty point set.
    pub fn fit(points: &[(f64, f64)], degree: usize) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let (lo, hi) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
                (lo.min(x), hi.max(x))
            });
        let center = (lo + hi) / 2.0;
        let scale = if hi > lo { 2.0 / (hi - lo) } else { 1.0 };

        let mut degree = degree.min(points.len() - 1);
        loop {
            let m = degree + 1;
            let a = Array2::from_shape_fn((points.len(), m), |(i, j)| {
                ((points[i].0 - center) * scale).powi(j as i32)
            });
            let b = Array1::from_iter(points.iter().map(|&(_, y)| y));
            if let Some(c) = least_squares(a, b) {
                return Some(Self {
                    coefficients: c.to_vec(),
                    center,
                    scale,
                });
            }
            // Rank deficient (repeated positions): retry with fewer terms.
            degree = degree.checked_sub(1)?;
        }
    }

    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    /// Evaluate at a position in the original (unmapped) coordinates.
    pub fn evaluate(&self, x: f64) -> f64 {
        let t = (x - self.center) * self.scale;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }
}

/// Solve `min |A x - b|` with Householder QR. `None` if `A` is rank deficient.
fn least_squares(mut a: Array2<f64>, mut b: Array1<f64>) -> Option<Array1<f64>> {
    let (n, m) = a.dim();
    if n < m {
        return None;
    }

    for k in 0..m {
        let column = a.slice(s![k.., k]);
        let norm = column.dot(&column).sqrt();
        if norm == 0.0 {
            return None;
        }
        let alpha = if a[[k, k]] > 0.0 { -norm } else { norm };

        let mut v = a.slice(s![k.., k]).to_owned();
        v[0] -= alpha;
        let v_norm_sq = v.dot(&v);
        if v_norm_sq == 0.0 {
            continue;
        }

        for j in k..m {
            let f = 2.0 * v.dot(&a.slice(s![k.., j])) / v_norm_sq;
            a.slice_mut(s![k.., j]).scaled_add(-f, &v);
        }
        let f = 2.0 * v.dot(&b.slice(s![k..])) / v_norm_sq;
        b.slice_mut(s![k..]).scaled_add(-f, &v);
    }

    let max_diag = (0..m).map(|i| a[[i, i]].abs()).fold(0.0, f64::max);
    let mut x = Array1::<f64>::zeros(m);
    for i in (0..m).rev() {
        let d = a[[i, i]];
        if d.abs() <= max_diag * 1e-12 {
            return None;
        }
        let tail: f64 = (i + 1..m).map(|j| a[[i, j]] * x[j]).sum();
        x[i] = (b[i] - tail) / d;
    }
    Some(x)
}

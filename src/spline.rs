//! Least-squares B-spline curve fit for the smoothed magnetometer chart.
//!
//! Clamped knot vector over the data range with uniformly spaced interior
//! knots; coefficients solved with an SVD pseudo-inverse so empty knot spans
//! do not make the fit fail.

use nalgebra::{DMatrix, DVector};

use crate::error::{LoggerError, Result};

pub const DEFAULT_DEGREE: usize = 5;
const MAX_AUTO_KNOTS: usize = 12;

#[derive(Clone, Debug)]
pub struct SplineFit {
    degree: usize,
    knots: Vec<f64>,
    coeffs: Vec<f64>,
}

impl SplineFit {
    /// Fit with an interior knot count derived from the sample count
    pub fn fit_auto(xs: &[f64], ys: &[f64], degree: usize) -> Result<Self> {
        let interior = (xs.len().saturating_sub(degree + 1) / 5).min(MAX_AUTO_KNOTS);
        Self::fit(xs, ys, degree, interior)
    }

    pub fn fit(xs: &[f64], ys: &[f64], degree: usize, interior_knots: usize) -> Result<Self> {
        if xs.len() != ys.len() {
            return Err(LoggerError::Fit(format!(
                "x and y lengths differ ({} vs {})",
                xs.len(),
                ys.len()
            )));
        }
        if degree == 0 {
            return Err(LoggerError::Fit("degree must be at least 1".to_string()));
        }
        let n_basis = interior_knots + degree + 1;
        if xs.len() < n_basis {
            return Err(LoggerError::Fit(format!(
                "{} points cannot fit {} coefficients",
                xs.len(),
                n_basis
            )));
        }
        if xs.iter().chain(ys).any(|v| !v.is_finite()) {
            return Err(LoggerError::Fit("non-finite input".to_string()));
        }

        let lo = xs.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi <= lo {
            return Err(LoggerError::Fit("x values span no range".to_string()));
        }

        let mut knots = vec![lo; degree + 1];
        for i in 1..=interior_knots {
            knots.push(lo + (hi - lo) * i as f64 / (interior_knots + 1) as f64);
        }
        knots.extend(std::iter::repeat(hi).take(degree + 1));

        let mut spline = SplineFit {
            degree,
            knots,
            coeffs: vec![0.0; n_basis],
        };

        let mut design = DMatrix::<f64>::zeros(xs.len(), n_basis);
        for (row, &x) in xs.iter().enumerate() {
            let span = spline.find_span(x);
            for (i, value) in spline.basis(span, x).into_iter().enumerate() {
                design[(row, span - degree + i)] = value;
            }
        }

        let rhs = DVector::from_column_slice(ys);
        let coeffs = design
            .svd(true, true)
            .solve(&rhs, 1e-12)
            .map_err(|e| LoggerError::Fit(e.to_string()))?;
        spline.coeffs = coeffs.iter().copied().collect();
        Ok(spline)
    }

    /// Value at `x`; points outside the fitted range are clamped to its ends
    pub fn evaluate(&self, x: f64) -> f64 {
        let x = x.clamp(self.lower(), self.upper());
        let span = self.find_span(x);
        self.basis(span, x)
            .iter()
            .enumerate()
            .map(|(i, b)| b * self.coeffs[span - self.degree + i])
            .sum()
    }

    pub fn lower(&self) -> f64 {
        self.knots[self.degree]
    }

    pub fn upper(&self) -> f64 {
        self.knots[self.coeffs.len()]
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Knot span index containing `x` (last non-empty span for the upper end)
    fn find_span(&self, x: f64) -> usize {
        let p = self.degree;
        let n = self.coeffs.len() - 1;
        if x >= self.knots[n + 1] {
            return n;
        }
        if x <= self.knots[p] {
            return p;
        }
        let (mut low, mut high) = (p, n + 1);
        let mut mid = (low + high) / 2;
        while x < self.knots[mid] || x >= self.knots[mid + 1] {
            if x < self.knots[mid] {
                high = mid;
            } else {
                low = mid;
            }
            mid = (low + high) / 2;
        }
        mid
    }

    /// The `degree + 1` non-zero basis values at `x` (Cox-de Boor)
    fn basis(&self, span: usize, x: f64) -> Vec<f64> {
        let p = self.degree;
        let mut values = vec![0.0; p + 1];
        let mut left = vec![0.0; p + 1];
        let mut right = vec![0.0; p + 1];
        values[0] = 1.0;

        for j in 1..=p {
            left[j] = x - self.knots[span + 1 - j];
            right[j] = self.knots[span + j] - x;
            let mut saved = 0.0;
            for r in 0..j {
                let temp = values[r] / (right[r + 1] + left[j - r]);
                values[r] = saved + right[r + 1] * temp;
                saved = left[j - r] * temp;
            }
            values[j] = saved;
        }
        values
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

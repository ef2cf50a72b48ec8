use std::ops::{Add, Mul, Neg, Sub};

use serde::{Deserialize, Serialize};

use tl_core::Duration;

use super::Dynamics;

/// Imaginary parts below this magnitude are treated as real roots.
const ROOT_TOLERANCE: f64 = 1e-12;

/// `Σ cᵢ tⁱ`, with `t` in seconds since the dynamics were recorded.
///
/// Trailing zero coefficients are trimmed on construction, so `degree()` is
/// exact and structural equality matches mathematical equality.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Build from coefficients in ascending order of power.
    pub fn new(mut coefficients: Vec<f64>) -> Self {
        while coefficients.last() == Some(&0.0) {
            coefficients.pop();
        }
        Polynomial { coefficients }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Coefficient of `tⁿ`; zero beyond the degree.
    pub fn coefficient(&self, n: usize) -> f64 {
        self.coefficients.get(n).copied().unwrap_or(0.0)
    }

    /// Degree of the polynomial.  The zero polynomial has degree 0.
    pub fn degree(&self) -> usize {
        self.coefficients.len().saturating_sub(1)
    }

    pub fn is_non_finite(&self) -> bool {
        self.coefficients.iter().any(|c| !c.is_finite())
    }

    /// Value at `t` seconds (Horner's rule).
    pub fn evaluate_secs(&self, t: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * t + c)
    }

    pub fn evaluate(&self, elapsed: Duration) -> f64 {
        self.evaluate_secs(elapsed.as_secs_f64())
    }

    pub fn scale(&self, factor: f64) -> Self {
        Self::new(self.coefficients.iter().map(|c| c * factor).collect())
    }

    pub fn derivative(&self) -> Self {
        Self::new(
            self.coefficients
                .iter()
                .enumerate()
                .skip(1)
                .map(|(i, c)| c * i as f64)
                .collect(),
        )
    }

    /// Antiderivative whose value at `t = 0` is `starting_value`.
    pub fn integral(&self, starting_value: f64) -> Self {
        let mut coefficients = Vec::with_capacity(self.coefficients.len() + 1);
        coefficients.push(starting_value);
        coefficients.extend(self.coefficients.iter().enumerate().map(|(i, c)| c / (i + 1) as f64));
        Self::new(coefficients)
    }

    /// Real roots in ascending order, for degree ≤ 2.
    ///
    /// Returns `None` for higher degrees and for the zero polynomial (every
    /// point is a root).  A repeated root is reported once.
    pub fn real_roots(&self) -> Option<Vec<f64>> {
        match self.coefficients.as_slice() {
            [] => None,
            [_] => Some(Vec::new()),
            [c, b] => Some(vec![-c / b]),
            [c, b, a] => {
                let disc = b * b - 4.0 * a * c;
                let scale = (b * b).max((4.0 * a * c).abs()).max(1.0);
                if disc < -ROOT_TOLERANCE * scale {
                    return Some(Vec::new());
                }
                if disc.abs() <= ROOT_TOLERANCE * scale {
                    return Some(vec![-b / (2.0 * a)]);
                }
                // Numerically stable form: avoid cancellation in -b ± sqrt(disc).
                let sqrt = disc.sqrt();
                let q = -0.5 * (b + b.signum() * sqrt);
                let (r1, r2) = if q == 0.0 {
                    let r = sqrt / (2.0 * a);
                    (-r, r)
                } else {
                    (q / a, c / q)
                };
                Some(if r1 <= r2 { vec![r1, r2] } else { vec![r2, r1] })
            }
            _ => None,
        }
    }
}

impl Dynamics for Polynomial {
    type Value = f64;

    fn extract(&self) -> f64 {
        self.coefficient(0)
    }

    /// Taylor shift: the coefficients of `p(t + s)`.
    fn step(&self, elapsed: Duration) -> Self {
        if elapsed == Duration::ZERO || self.coefficients.len() < 2 {
            return self.clone();
        }
        let s = elapsed.as_secs_f64();
        let mut c = self.coefficients.clone();
        let n = c.len();
        for i in 0..n {
            for j in (i..n - 1).rev() {
                c[j] += s * c[j + 1];
            }
        }
        Self::new(c)
    }

    fn as_polynomial(&self) -> Option<Polynomial> {
        Some(self.clone())
    }

    fn is_constant(&self) -> bool {
        self.coefficients.len() <= 1
    }
}

// ── Arithmetic ────────────────────────────────────────────────────────────────

impl Add for &Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: &Polynomial) -> Polynomial {
        let len = self.coefficients.len().max(rhs.coefficients.len());
        Polynomial::new((0..len).map(|i| self.coefficient(i) + rhs.coefficient(i)).collect())
    }
}

impl Add for Polynomial {
    type Output = Polynomial;
    fn add(self, rhs: Polynomial) -> Polynomial {
        &self + &rhs
    }
}

impl Sub for &Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: &Polynomial) -> Polynomial {
        let len = self.coefficients.len().max(rhs.coefficients.len());
        Polynomial::new((0..len).map(|i| self.coefficient(i) - rhs.coefficient(i)).collect())
    }
}

impl Sub for Polynomial {
    type Output = Polynomial;
    fn sub(self, rhs: Polynomial) -> Polynomial {
        &self - &rhs
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: &Polynomial) -> Polynomial {
        if self.coefficients.is_empty() || rhs.coefficients.is_empty() {
            return Polynomial::default();
        }
        let mut out = vec![0.0; self.coefficients.len() + rhs.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in rhs.coefficients.iter().enumerate() {
                out[i + j] += a * b;
            }
        }
        Polynomial::new(out)
    }
}

impl Mul for Polynomial {
    type Output = Polynomial;
    fn mul(self, rhs: Polynomial) -> Polynomial {
        &self * &rhs
    }
}

impl Neg for Polynomial {
    type Output = Polynomial;
    fn neg(self) -> Polynomial {
        self.scale(-1.0)
    }
}

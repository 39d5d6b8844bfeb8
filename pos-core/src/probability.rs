//! # Probabilidades em Log-Space
//!
//! Multiplicar dezenas de probabilidades pequenas (ex: `0.001 × 0.0004 × ...`)
//! leva rapidamente a underflow em `f64`. Por isso todas as contas do
//! etiquetador acontecem em log-space:
//!
//! ```text
//! log(A · B) = log(A) + log(B)
//! log(A / B) = log(A) - log(B)
//! ```
//!
//! [`Probability`] guarda apenas o logaritmo natural. `ONE` é `log 1 = 0` e
//! `ZERO` é `-∞`, que absorve qualquer multiplicação.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Div, Mul, MulAssign};

use serde::{Deserialize, Serialize};

/// Probabilidade representada pelo seu logaritmo natural.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Probability(f64);

impl Probability {
    /// Certeza: `log(1) = 0`.
    pub const ONE: Probability = Probability(0.0);
    /// Impossível: `log(0) = -∞`.
    pub const ZERO: Probability = Probability(f64::NEG_INFINITY);

    /// Constrói a partir de uma probabilidade linear em `[0, 1]`.
    /// Valores `<= 0` (ou NaN) viram [`Probability::ZERO`].
    pub fn from_linear(p: f64) -> Self {
        if p > 0.0 {
            Probability(p.ln())
        } else {
            Probability::ZERO
        }
    }

    /// Constrói a partir de um logaritmo já calculado.
    pub fn from_log(log: f64) -> Self {
        if log.is_nan() {
            Probability::ZERO
        } else {
            Probability(log)
        }
    }

    /// Razão `numerator / denominator`. Denominador zero resulta em `ZERO`.
    pub fn from_ratio(numerator: u64, denominator: u64) -> Self {
        if denominator == 0 {
            return Probability::ZERO;
        }
        Probability::from_linear(numerator as f64 / denominator as f64)
    }

    pub fn log(self) -> f64 {
        self.0
    }

    pub fn linear(self) -> f64 {
        self.0.exp()
    }

    pub fn is_zero(self) -> bool {
        self.0 == f64::NEG_INFINITY
    }

    /// Maior das duas probabilidades (`self` em caso de empate).
    pub fn max(self, other: Probability) -> Probability {
        if other.0 > self.0 {
            other
        } else {
            self
        }
    }

    /// Ordenação total (NaN nunca é armazenado, ver [`Probability::from_log`]).
    pub fn total_cmp(&self, other: &Probability) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Mul for Probability {
    type Output = Probability;

    fn mul(self, rhs: Probability) -> Probability {
        if self.is_zero() || rhs.is_zero() {
            return Probability::ZERO;
        }
        Probability(self.0 + rhs.0)
    }
}

impl MulAssign for Probability {
    fn mul_assign(&mut self, rhs: Probability) {
        *self = *self * rhs;
    }
}

impl Div for Probability {
    type Output = Probability;

    fn div(self, rhs: Probability) -> Probability {
        if self.is_zero() {
            return Probability::ZERO;
        }
        Probability::from_log(self.0 - rhs.0)
    }
}

impl Default for Probability {
    fn default() -> Self {
        Probability::ONE
    }
}

impl fmt::Display for Probability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_multiplication_is_log_addition() {
        let a = Probability::from_linear(0.5);
        let b = Probability::from_linear(0.25);
        let product = a * b;
        assert!((product.linear() - 0.125).abs() < 1e-12);
        assert!((product.log() - (0.5f64.ln() + 0.25f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn test_constants() {
        assert_eq!(Probability::ONE.log(), 0.0);
        assert!(Probability::ZERO.is_zero());
        assert!(Probability::ONE > Probability::ZERO);
        assert_eq!(Probability::from_linear(0.0), Probability::ZERO);
        assert_eq!(Probability::ONE * Probability::ONE, Probability::ONE);
    }

    #[test]
    fn test_zero_absorbs() {
        let p = Probability::from_linear(0.9);
        assert!((p * Probability::ZERO).is_zero());
        assert!((Probability::ZERO / p).is_zero());
    }

    #[test]
    fn test_no_underflow_on_long_products() {
        // 1000 fatores de 0.001 dariam 1e-3000 em escala linear (underflow)
        let mut acc = Probability::ONE;
        let factor = Probability::from_linear(0.001);
        for _ in 0..1000 {
            acc *= factor;
        }
        assert!(!acc.is_zero());
        assert!((acc.log() - 1000.0 * 0.001f64.ln()).abs() < 1e-6);
    }

    #[test]
    fn test_ratio_and_max() {
        assert!((Probability::from_ratio(6, 10).linear() - 0.6).abs() < 1e-12);
        assert!(Probability::from_ratio(3, 0).is_zero());
        let low = Probability::from_linear(0.1);
        let high = Probability::from_linear(0.2);
        assert_eq!(low.max(high), high);
        assert_eq!(high.max(low), high);
    }
}

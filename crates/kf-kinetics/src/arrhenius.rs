//! Modified Arrhenius temperature dependence.

use crate::error::{KineticsError, KineticsResult};
use crate::units::{Quantity, convert};
use kf_core::units::Temperature;
use kf_core::units::constants::R_J_PER_MOL_K;
use serde::{Deserialize, Serialize};

/// Modified Arrhenius expression `k(T) = A (T/T0)^n exp(-Ea/(R T))`.
///
/// All parameters are stored in SI after unit resolution: `a` in the rate
/// units implied by the reaction order, `ea` in J/mol, `t0` in K.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrheniusRate {
    a: f64,
    n: f64,
    ea: f64,
    t0: f64,
}

impl ArrheniusRate {
    /// Build from `(value, unit)` pairs for the dimensioned parameters.
    pub fn new(
        a: (f64, &str),
        n: f64,
        ea: (f64, &str),
        t0: (f64, &str),
    ) -> KineticsResult<Self> {
        let a = convert(a.0, a.1, Quantity::RateCoefficient)?;
        let ea = convert(ea.0, ea.1, Quantity::MolarEnergy)?;
        let t0 = convert(t0.0, t0.1, Quantity::Temperature)?;
        Self::from_si(a, n, ea, t0)
    }

    /// Build from already-resolved SI scalars.
    pub fn from_si(a: f64, n: f64, ea: f64, t0: f64) -> KineticsResult<Self> {
        if !a.is_finite() {
            return Err(KineticsError::NonPhysical {
                what: "pre-exponential factor must be finite",
            });
        }
        if !n.is_finite() {
            return Err(KineticsError::NonPhysical {
                what: "temperature exponent must be finite",
            });
        }
        if !ea.is_finite() {
            return Err(KineticsError::NonPhysical {
                what: "activation energy must be finite",
            });
        }
        if !t0.is_finite() || t0 <= 0.0 {
            return Err(KineticsError::NonPhysical {
                what: "reference temperature must be positive",
            });
        }
        Ok(Self { a, n, ea, t0 })
    }

    /// Evaluate `k(T)`. Pure; defined for `T > 0`.
    pub fn rate(&self, t: Temperature) -> f64 {
        self.rate_si(t.value)
    }

    pub(crate) fn rate_si(&self, t: f64) -> f64 {
        self.a * (t / self.t0).powf(self.n) * (-self.ea / (R_J_PER_MOL_K * t)).exp()
    }

    /// Rescale the pre-exponential factor in place; `n`, `ea`, `t0` are
    /// untouched, so the whole expression scales linearly at every T.
    pub fn scale(&mut self, factor: f64) {
        self.a *= factor;
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn n(&self) -> f64 {
        self.n
    }

    pub fn ea(&self) -> f64 {
        self.ea
    }

    pub fn t0(&self) -> f64 {
        self.t0
    }

    /// Field-wise comparison within tolerance.
    pub fn is_identical_to(&self, other: &Self, tol: kf_core::numeric::Tolerances) -> bool {
        use kf_core::numeric::nearly_equal;
        nearly_equal(self.a, other.a, tol)
            && nearly_equal(self.n, other.n, tol)
            && nearly_equal(self.ea, other.ea, tol)
            && nearly_equal(self.t0, other.t0, tol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kf_core::units::k;

    fn low_limit() -> ArrheniusRate {
        ArrheniusRate::new(
            (2.62e33, "cm^6/(mol^2*s)"),
            -4.76,
            (10.21, "kJ/mol"),
            (1.0, "K"),
        )
        .unwrap()
    }

    #[test]
    fn unit_resolution_at_construction() {
        let rate = low_limit();
        assert!((rate.a() - 2.62e21).abs() / 2.62e21 < 1e-12);
        assert_eq!(rate.n(), -4.76);
        assert!((rate.ea() - 10_210.0).abs() < 1e-9);
        assert_eq!(rate.t0(), 1.0);
    }

    #[test]
    fn rate_at_reference_temperature() {
        // At T = T0 the power term is exactly 1
        let rate = ArrheniusRate::from_si(5.0e8, 1.7, 0.0, 300.0).unwrap();
        assert_eq!(rate.rate(k(300.0)), 5.0e8);
    }

    #[test]
    fn zero_barrier_reduces_to_power_law() {
        let rate = ArrheniusRate::from_si(2.0, 2.0, 0.0, 1.0).unwrap();
        let expected = 2.0 * 400.0 * 400.0;
        assert!((rate.rate(k(400.0)) - expected).abs() < 1e-6);
    }

    #[test]
    fn scale_is_linear_in_a() {
        let mut rate = low_limit();
        let before = rate.rate(k(1000.0));
        rate.scale(2.0);
        let after = rate.rate(k(1000.0));
        assert!((after - 2.0 * before).abs() / after < 1e-12);
    }

    #[test]
    fn non_positive_reference_temperature_rejected() {
        assert!(ArrheniusRate::from_si(1.0, 0.0, 0.0, 0.0).is_err());
        assert!(ArrheniusRate::from_si(1.0, 0.0, 0.0, -1.0).is_err());
    }

    #[test]
    fn zero_pre_exponential_is_degenerate_but_allowed() {
        let rate = ArrheniusRate::from_si(0.0, 0.5, 100.0, 1.0).unwrap();
        assert_eq!(rate.rate(k(500.0)), 0.0);
    }

    #[test]
    fn non_finite_parameters_rejected() {
        assert!(ArrheniusRate::from_si(f64::NAN, 0.0, 0.0, 1.0).is_err());
        assert!(ArrheniusRate::from_si(1.0, f64::INFINITY, 0.0, 1.0).is_err());
    }
}

//! Pressure-dependent (falloff) rate models.
//!
//! Three models share one capability contract:
//! - [`ThirdBody`]: intrinsically third-order, `k = k0(T)·[M]`
//! - [`Lindemann`]: blends low- and high-pressure limits via the reduced
//!   pressure `Pr = k0·[M]/kinf`
//! - [`Troe`]: Lindemann blend sharpened by the empirical broadening factor
//!   `F(T, Pr)`
//!
//! `[M]` is the ideal-gas number density `P/(R·T)`; composition effects enter
//! through the model's [`EfficiencyTable`] before `P` reaches these formulas.

use crate::arrhenius::ArrheniusRate;
use crate::efficiency::EfficiencyTable;
use crate::error::{KineticsError, KineticsResult};
use crate::species::Species;
use crate::units::{Quantity, convert};
use kf_core::numeric::Tolerances;
use kf_core::units::constants::R_J_PER_MOL_K;
use kf_core::units::{Pressure, Temperature, k, pa};
use serde::{Deserialize, Serialize};

/// What to do when a rate is requested outside the stated validity window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RangePolicy {
    /// Evaluate anyway (the permissive historical behavior).
    #[default]
    Extrapolate,
    /// Evaluate anyway, but emit a `tracing` warning.
    Warn,
    /// Refuse with [`KineticsError::OutOfValidity`].
    Reject,
}

/// Stated validity window of a fitted rate expression.
///
/// Bounds are optional; a missing bound is unbounded. The window is advisory
/// under the default policy — see [`RangePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Validity {
    tmin: Option<f64>,
    tmax: Option<f64>,
    pmin: Option<f64>,
    pmax: Option<f64>,
    policy: RangePolicy,
}

impl Validity {
    /// Resolve bounds from `(value, unit)` pairs.
    pub fn new(
        tmin: Option<(f64, &str)>,
        tmax: Option<(f64, &str)>,
        pmin: Option<(f64, &str)>,
        pmax: Option<(f64, &str)>,
        policy: RangePolicy,
    ) -> KineticsResult<Self> {
        let temp = |v: Option<(f64, &str)>| {
            v.map(|(value, unit)| convert(value, unit, Quantity::Temperature))
                .transpose()
        };
        let pres = |v: Option<(f64, &str)>| {
            v.map(|(value, unit)| convert(value, unit, Quantity::Pressure))
                .transpose()
        };
        Self::from_si(temp(tmin)?, temp(tmax)?, pres(pmin)?, pres(pmax)?, policy)
    }

    /// Build from already-resolved SI bounds.
    pub fn from_si(
        tmin: Option<f64>,
        tmax: Option<f64>,
        pmin: Option<f64>,
        pmax: Option<f64>,
        policy: RangePolicy,
    ) -> KineticsResult<Self> {
        for bound in [tmin, tmax, pmin, pmax].into_iter().flatten() {
            if !bound.is_finite() {
                return Err(KineticsError::NonPhysical {
                    what: "validity bound must be finite",
                });
            }
        }
        if let (Some(lo), Some(hi)) = (tmin, tmax) {
            if lo >= hi {
                return Err(KineticsError::NonPhysical {
                    what: "Tmin must be below Tmax",
                });
            }
        }
        if let (Some(lo), Some(hi)) = (pmin, pmax) {
            if lo >= hi {
                return Err(KineticsError::NonPhysical {
                    what: "Pmin must be below Pmax",
                });
            }
        }
        Ok(Self {
            tmin,
            tmax,
            pmin,
            pmax,
            policy,
        })
    }

    pub fn tmin(&self) -> Option<Temperature> {
        self.tmin.map(k)
    }

    pub fn tmax(&self) -> Option<Temperature> {
        self.tmax.map(k)
    }

    pub fn pmin(&self) -> Option<Pressure> {
        self.pmin.map(pa)
    }

    pub fn pmax(&self) -> Option<Pressure> {
        self.pmax.map(pa)
    }

    pub fn policy(&self) -> RangePolicy {
        self.policy
    }

    /// Is the temperature inside the stated window?
    pub fn temperature_valid(&self, t: Temperature) -> bool {
        self.temperature_valid_si(t.value)
    }

    /// Is the pressure inside the stated window?
    pub fn pressure_valid(&self, p: Pressure) -> bool {
        self.pressure_valid_si(p.value)
    }

    fn temperature_valid_si(&self, t: f64) -> bool {
        self.tmin.is_none_or(|lo| t >= lo) && self.tmax.is_none_or(|hi| t <= hi)
    }

    fn pressure_valid_si(&self, p: f64) -> bool {
        self.pmin.is_none_or(|lo| p >= lo) && self.pmax.is_none_or(|hi| p <= hi)
    }

    /// Apply the window policy to an evaluation point.
    pub(crate) fn admit(&self, t: f64, p: f64) -> KineticsResult<()> {
        match self.policy {
            RangePolicy::Extrapolate => Ok(()),
            RangePolicy::Warn => {
                if !self.temperature_valid_si(t) || !self.pressure_valid_si(p) {
                    tracing::warn!(
                        temperature_k = t,
                        pressure_pa = p,
                        "rate requested outside stated validity window"
                    );
                }
                Ok(())
            }
            RangePolicy::Reject => {
                if !self.temperature_valid_si(t) {
                    return Err(KineticsError::OutOfValidity {
                        what: "temperature",
                    });
                }
                if !self.pressure_valid_si(p) {
                    return Err(KineticsError::OutOfValidity { what: "pressure" });
                }
                Ok(())
            }
        }
    }

    /// Field-wise comparison within tolerance.
    pub fn is_identical_to(&self, other: &Self, tol: Tolerances) -> bool {
        fn close(a: Option<f64>, b: Option<f64>, tol: Tolerances) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => kf_core::numeric::nearly_equal(a, b, tol),
                _ => false,
            }
        }
        close(self.tmin, other.tmin, tol)
            && close(self.tmax, other.tmax, tol)
            && close(self.pmin, other.pmin, tol)
            && close(self.pmax, other.pmax, tol)
            && self.policy == other.policy
    }
}

/// Shared constructor inputs for all falloff variants.
///
/// Bounds arrive as `(value, unit)` pairs and are resolved once, at
/// construction.
#[derive(Debug, Clone, Default)]
pub struct FalloffOptions<'a> {
    pub tmin: Option<(f64, &'a str)>,
    pub tmax: Option<(f64, &'a str)>,
    pub pmin: Option<(f64, &'a str)>,
    pub pmax: Option<(f64, &'a str)>,
    pub range_policy: RangePolicy,
    pub efficiencies: EfficiencyTable,
    pub comment: String,
}

impl FalloffOptions<'_> {
    fn resolve(self) -> KineticsResult<(Validity, EfficiencyTable, String)> {
        let validity = Validity::new(
            self.tmin,
            self.tmax,
            self.pmin,
            self.pmax,
            self.range_policy,
        )?;
        Ok((validity, self.efficiencies, self.comment))
    }
}

/// Capability contract shared by the closed set of falloff variants.
///
/// Implementations must be thread-safe (Send + Sync); evaluation methods are
/// pure `&self` reads, safe for concurrent use against one instance.
pub trait PressureDependentRate: Send + Sync {
    /// Free-form provenance text; never parsed.
    fn comment(&self) -> &str;

    /// Stated validity window.
    fn validity(&self) -> &Validity;

    /// Collider efficiency table.
    fn efficiencies(&self) -> &EfficiencyTable;

    /// Distinguishes these models from pressure-independent rate
    /// expressions in a shared hierarchy. Constant `true` here.
    fn is_pressure_dependent(&self) -> bool {
        true
    }

    /// Effective rate coefficient at `(T, P)`, with `P` already expressing
    /// the effective third-body loading.
    fn rate_coefficient(&self, t: Temperature, p: Pressure) -> KineticsResult<f64>;

    /// Rescale every pre-exponential constant held by the model.
    fn change_rate(&mut self, factor: f64);

    /// Per-collider efficiencies aligned to `colliders`.
    fn effective_collider_efficiencies(&self, colliders: &[Species]) -> Vec<f64> {
        self.efficiencies().collider_efficiencies(colliders)
    }

    /// Efficiency-weighted effective pressure for a mixture.
    fn effective_pressure(
        &self,
        p: Pressure,
        colliders: &[Species],
        fractions: &[f64],
    ) -> KineticsResult<Pressure> {
        self.efficiencies().effective_pressure(p, colliders, fractions)
    }
}

/// Reject non-physical evaluation points before touching the formulas.
fn check_evaluation_point(t: f64, p: f64) -> KineticsResult<()> {
    if !t.is_finite() || t <= 0.0 {
        return Err(KineticsError::NonPhysical {
            what: "evaluation temperature must be positive",
        });
    }
    if !p.is_finite() || p <= 0.0 {
        return Err(KineticsError::NonPhysical {
            what: "evaluation pressure must be positive",
        });
    }
    Ok(())
}

/// Ideal-gas number density [mol/m^3].
#[inline]
fn number_density(t: f64, p: f64) -> f64 {
    p / (R_J_PER_MOL_K * t)
}

/// Simple third-body enhancement: `k = k0(T)·[M]`.
///
/// The reaction is intrinsically third-order; there is no high-pressure
/// limit. `A` of the low-pressure expression carries third-order units, so
/// the product is a second-order-equivalent rate constant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThirdBody {
    arrhenius_low: ArrheniusRate,
    validity: Validity,
    efficiencies: EfficiencyTable,
    comment: String,
}

impl ThirdBody {
    pub fn new(arrhenius_low: ArrheniusRate, options: FalloffOptions<'_>) -> KineticsResult<Self> {
        let (validity, efficiencies, comment) = options.resolve()?;
        Ok(Self {
            arrhenius_low,
            validity,
            efficiencies,
            comment,
        })
    }

    pub(crate) fn from_parts(
        arrhenius_low: ArrheniusRate,
        validity: Validity,
        efficiencies: EfficiencyTable,
        comment: String,
    ) -> Self {
        Self {
            arrhenius_low,
            validity,
            efficiencies,
            comment,
        }
    }

    pub fn arrhenius_low(&self) -> &ArrheniusRate {
        &self.arrhenius_low
    }

    pub fn is_identical_to(&self, other: &Self, tol: Tolerances) -> bool {
        self.arrhenius_low.is_identical_to(&other.arrhenius_low, tol)
            && self.validity.is_identical_to(&other.validity, tol)
            && self.efficiencies.is_identical_to(&other.efficiencies, tol)
            && self.comment == other.comment
    }
}

impl PressureDependentRate for ThirdBody {
    fn comment(&self) -> &str {
        &self.comment
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn efficiencies(&self) -> &EfficiencyTable {
        &self.efficiencies
    }

    fn rate_coefficient(&self, t: Temperature, p: Pressure) -> KineticsResult<f64> {
        let (t, p) = (t.value, p.value);
        check_evaluation_point(t, p)?;
        self.validity.admit(t, p)?;
        Ok(self.arrhenius_low.rate_si(t) * number_density(t, p))
    }

    fn change_rate(&mut self, factor: f64) {
        self.arrhenius_low.scale(factor);
    }
}

/// Lindemann blend between low- and high-pressure limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lindemann {
    arrhenius_low: ArrheniusRate,
    arrhenius_high: ArrheniusRate,
    validity: Validity,
    efficiencies: EfficiencyTable,
    comment: String,
}

impl Lindemann {
    pub fn new(
        arrhenius_low: ArrheniusRate,
        arrhenius_high: ArrheniusRate,
        options: FalloffOptions<'_>,
    ) -> KineticsResult<Self> {
        let (validity, efficiencies, comment) = options.resolve()?;
        Ok(Self {
            arrhenius_low,
            arrhenius_high,
            validity,
            efficiencies,
            comment,
        })
    }

    pub(crate) fn from_parts(
        arrhenius_low: ArrheniusRate,
        arrhenius_high: ArrheniusRate,
        validity: Validity,
        efficiencies: EfficiencyTable,
        comment: String,
    ) -> Self {
        Self {
            arrhenius_low,
            arrhenius_high,
            validity,
            efficiencies,
            comment,
        }
    }

    pub fn arrhenius_low(&self) -> &ArrheniusRate {
        &self.arrhenius_low
    }

    pub fn arrhenius_high(&self) -> &ArrheniusRate {
        &self.arrhenius_high
    }

    /// Reduced pressure `Pr = k0·[M]/kinf` at an SI evaluation point.
    fn reduced_pressure(&self, t: f64, p: f64) -> f64 {
        self.arrhenius_low.rate_si(t) * number_density(t, p) / self.arrhenius_high.rate_si(t)
    }

    pub fn is_identical_to(&self, other: &Self, tol: Tolerances) -> bool {
        self.arrhenius_low.is_identical_to(&other.arrhenius_low, tol)
            && self.arrhenius_high.is_identical_to(&other.arrhenius_high, tol)
            && self.validity.is_identical_to(&other.validity, tol)
            && self.efficiencies.is_identical_to(&other.efficiencies, tol)
            && self.comment == other.comment
    }
}

impl PressureDependentRate for Lindemann {
    fn comment(&self) -> &str {
        &self.comment
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn efficiencies(&self) -> &EfficiencyTable {
        &self.efficiencies
    }

    fn rate_coefficient(&self, t: Temperature, p: Pressure) -> KineticsResult<f64> {
        let (t, p) = (t.value, p.value);
        check_evaluation_point(t, p)?;
        self.validity.admit(t, p)?;
        let kinf = self.arrhenius_high.rate_si(t);
        let pr = self.reduced_pressure(t, p);
        Ok(kinf * pr / (1.0 + pr))
    }

    fn change_rate(&mut self, factor: f64) {
        self.arrhenius_low.scale(factor);
        self.arrhenius_high.scale(factor);
    }
}

/// Troe blend: Lindemann sharpened by the broadening factor `F`.
///
/// `Fcent = (1-α)·exp(-T/T3) + α·exp(-T/T1) + exp(-T2/T)`, the last term
/// omitted when `T2` is absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Troe {
    arrhenius_low: ArrheniusRate,
    arrhenius_high: ArrheniusRate,
    alpha: f64,
    t3: f64,
    t1: f64,
    t2: Option<f64>,
    validity: Validity,
    efficiencies: EfficiencyTable,
    comment: String,
}

impl Troe {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        arrhenius_low: ArrheniusRate,
        arrhenius_high: ArrheniusRate,
        alpha: f64,
        t3: (f64, &str),
        t1: (f64, &str),
        t2: Option<(f64, &str)>,
        options: FalloffOptions<'_>,
    ) -> KineticsResult<Self> {
        let t3 = convert(t3.0, t3.1, Quantity::Temperature)?;
        let t1 = convert(t1.0, t1.1, Quantity::Temperature)?;
        let t2 = t2
            .map(|(value, unit)| convert(value, unit, Quantity::Temperature))
            .transpose()?;
        let (validity, efficiencies, comment) = options.resolve()?;
        Self::from_parts(
            arrhenius_low,
            arrhenius_high,
            alpha,
            t3,
            t1,
            t2,
            validity,
            efficiencies,
            comment,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn from_parts(
        arrhenius_low: ArrheniusRate,
        arrhenius_high: ArrheniusRate,
        alpha: f64,
        t3: f64,
        t1: f64,
        t2: Option<f64>,
        validity: Validity,
        efficiencies: EfficiencyTable,
        comment: String,
    ) -> KineticsResult<Self> {
        if !alpha.is_finite() {
            return Err(KineticsError::NonPhysical {
                what: "alpha must be finite",
            });
        }
        if !t3.is_finite() || t3 <= 0.0 {
            return Err(KineticsError::NonPhysical {
                what: "T3 must be positive",
            });
        }
        if !t1.is_finite() || t1 <= 0.0 {
            return Err(KineticsError::NonPhysical {
                what: "T1 must be positive",
            });
        }
        if let Some(t2) = t2 {
            if !t2.is_finite() {
                return Err(KineticsError::NonPhysical {
                    what: "T2 must be finite",
                });
            }
        }
        Ok(Self {
            arrhenius_low,
            arrhenius_high,
            alpha,
            t3,
            t1,
            t2,
            validity,
            efficiencies,
            comment,
        })
    }

    pub fn arrhenius_low(&self) -> &ArrheniusRate {
        &self.arrhenius_low
    }

    pub fn arrhenius_high(&self) -> &ArrheniusRate {
        &self.arrhenius_high
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn t3(&self) -> Temperature {
        k(self.t3)
    }

    pub fn t1(&self) -> Temperature {
        k(self.t1)
    }

    pub fn t2(&self) -> Option<Temperature> {
        self.t2.map(k)
    }

    /// Broadening factor `F` at an SI evaluation point.
    fn broadening_factor(&self, t: f64, pr: f64) -> f64 {
        let mut fcent = (1.0 - self.alpha) * (-t / self.t3).exp() + self.alpha * (-t / self.t1).exp();
        if let Some(t2) = self.t2 {
            fcent += (-t2 / t).exp();
        }
        let log_fcent = fcent.log10();
        let d = 0.14;
        let c = -0.4 - 0.67 * log_fcent;
        let n = 0.75 - 1.27 * log_fcent;
        let shifted = pr.log10() + c;
        let ratio = shifted / (n - d * shifted);
        10f64.powf(log_fcent / (1.0 + ratio * ratio))
    }

    pub fn is_identical_to(&self, other: &Self, tol: Tolerances) -> bool {
        use kf_core::numeric::nearly_equal;
        let t2_close = match (self.t2, other.t2) {
            (None, None) => true,
            (Some(a), Some(b)) => nearly_equal(a, b, tol),
            _ => false,
        };
        self.arrhenius_low.is_identical_to(&other.arrhenius_low, tol)
            && self.arrhenius_high.is_identical_to(&other.arrhenius_high, tol)
            && nearly_equal(self.alpha, other.alpha, tol)
            && nearly_equal(self.t3, other.t3, tol)
            && nearly_equal(self.t1, other.t1, tol)
            && t2_close
            && self.validity.is_identical_to(&other.validity, tol)
            && self.efficiencies.is_identical_to(&other.efficiencies, tol)
            && self.comment == other.comment
    }
}

impl PressureDependentRate for Troe {
    fn comment(&self) -> &str {
        &self.comment
    }

    fn validity(&self) -> &Validity {
        &self.validity
    }

    fn efficiencies(&self) -> &EfficiencyTable {
        &self.efficiencies
    }

    fn rate_coefficient(&self, t: Temperature, p: Pressure) -> KineticsResult<f64> {
        let (t, p) = (t.value, p.value);
        check_evaluation_point(t, p)?;
        self.validity.admit(t, p)?;
        let kinf = self.arrhenius_high.rate_si(t);
        let pr = self.arrhenius_low.rate_si(t) * number_density(t, p) / kinf;
        let f = self.broadening_factor(t, pr);
        Ok(kinf * pr / (1.0 + pr) * f)
    }

    fn change_rate(&mut self, factor: f64) {
        self.arrhenius_low.scale(factor);
        self.arrhenius_high.scale(factor);
    }
}

/// Closed set of falloff variants.
///
/// The persisted forms ([`crate::wire`], [`crate::canonical`]) and any code
/// that stores heterogeneous models dispatch over this union; the trait
/// remains the shared capability contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model")]
pub enum FalloffModel {
    ThirdBody(ThirdBody),
    Lindemann(Lindemann),
    Troe(Troe),
}

impl FalloffModel {
    /// Same variant, every stored field equal within tolerance.
    pub fn is_identical_to(&self, other: &Self, tol: Tolerances) -> bool {
        match (self, other) {
            (Self::ThirdBody(a), Self::ThirdBody(b)) => a.is_identical_to(b, tol),
            (Self::Lindemann(a), Self::Lindemann(b)) => a.is_identical_to(b, tol),
            (Self::Troe(a), Self::Troe(b)) => a.is_identical_to(b, tol),
            _ => false,
        }
    }
}

impl PressureDependentRate for FalloffModel {
    fn comment(&self) -> &str {
        match self {
            Self::ThirdBody(m) => m.comment(),
            Self::Lindemann(m) => m.comment(),
            Self::Troe(m) => m.comment(),
        }
    }

    fn validity(&self) -> &Validity {
        match self {
            Self::ThirdBody(m) => m.validity(),
            Self::Lindemann(m) => m.validity(),
            Self::Troe(m) => m.validity(),
        }
    }

    fn efficiencies(&self) -> &EfficiencyTable {
        match self {
            Self::ThirdBody(m) => m.efficiencies(),
            Self::Lindemann(m) => m.efficiencies(),
            Self::Troe(m) => m.efficiencies(),
        }
    }

    fn rate_coefficient(&self, t: Temperature, p: Pressure) -> KineticsResult<f64> {
        match self {
            Self::ThirdBody(m) => m.rate_coefficient(t, p),
            Self::Lindemann(m) => m.rate_coefficient(t, p),
            Self::Troe(m) => m.rate_coefficient(t, p),
        }
    }

    fn change_rate(&mut self, factor: f64) {
        match self {
            Self::ThirdBody(m) => m.change_rate(factor),
            Self::Lindemann(m) => m.change_rate(factor),
            Self::Troe(m) => m.change_rate(factor),
        }
    }
}

impl From<ThirdBody> for FalloffModel {
    fn from(m: ThirdBody) -> Self {
        Self::ThirdBody(m)
    }
}

impl From<Lindemann> for FalloffModel {
    fn from(m: Lindemann) -> Self {
        Self::Lindemann(m)
    }
}

impl From<Troe> for FalloffModel {
    fn from(m: Troe) -> Self {
        Self::Troe(m)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn low_limit() -> ArrheniusRate {
        ArrheniusRate::new(
            (2.62e33, "cm^6/(mol^2*s)"),
            -4.76,
            (10.21, "kJ/mol"),
            (1.0, "K"),
        )
        .unwrap()
    }

    pub(crate) fn high_limit() -> ArrheniusRate {
        ArrheniusRate::new(
            (1.39e16, "cm^3/(mol*s)"),
            -0.534,
            (2.243, "kJ/mol"),
            (1.0, "K"),
        )
        .unwrap()
    }

    pub(crate) fn bath_gas() -> EfficiencyTable {
        EfficiencyTable::from_notation(&[
            ("C", 3.0),
            ("C(=O)=O", 2.0),
            ("CC", 3.0),
            ("O", 6.0),
            ("[Ar]", 0.7),
            ("[C]=O", 1.5),
            ("[H][H]", 2.0),
        ])
        .unwrap()
    }

    pub(crate) fn methane_recombination_options() -> FalloffOptions<'static> {
        FalloffOptions {
            tmin: Some((300.0, "K")),
            tmax: Some((2000.0, "K")),
            pmin: Some((0.01, "bar")),
            pmax: Some((100.0, "bar")),
            efficiencies: bath_gas(),
            comment: "H + CH3 -> CH4".to_string(),
            ..Default::default()
        }
    }

    pub(crate) fn third_body() -> ThirdBody {
        ThirdBody::new(low_limit(), methane_recombination_options()).unwrap()
    }

    pub(crate) fn lindemann() -> Lindemann {
        Lindemann::new(low_limit(), high_limit(), methane_recombination_options()).unwrap()
    }

    pub(crate) fn troe() -> Troe {
        Troe::new(
            low_limit(),
            high_limit(),
            0.783,
            (74.0, "K"),
            (2941.0, "K"),
            Some((6964.0, "K")),
            methane_recombination_options(),
        )
        .unwrap()
    }

    fn assert_grid(model: &dyn PressureDependentRate, expected: &[(f64, [f64; 3])]) {
        let pressures = [1e4, 1e5, 1e6];
        for (t, row) in expected {
            for (p, want) in pressures.iter().zip(row) {
                let got = model.rate_coefficient(k(*t), pa(*p)).unwrap();
                assert!(
                    (got - want).abs() <= 1e-4 * want,
                    "T={} P={}: got {:e}, want {:e}",
                    t,
                    p,
                    got,
                    want
                );
            }
        }
    }

    #[test]
    fn third_body_rate_grid() {
        assert_grid(
            &third_body(),
            &[
                (300.0, [2.83508e8, 2.83508e9, 2.83508e10]),
                (500.0, [7.68759e7, 7.68759e8, 7.68759e9]),
                (1000.0, [4.84353e6, 4.84353e7, 4.84353e8]),
                (1500.0, [7.05740e5, 7.05740e6, 7.05740e7]),
            ],
        );
    }

    #[test]
    fn lindemann_rate_grid() {
        assert_grid(
            &lindemann(),
            &[
                (300.0, [1.38023e8, 2.45661e8, 2.66439e8]),
                (500.0, [6.09146e7, 2.12349e8, 2.82604e8]),
                (1000.0, [4.75671e6, 4.09594e7, 1.71441e8]),
                (1500.0, [7.03616e5, 6.85062e6, 5.42111e7]),
            ],
        );
    }

    #[test]
    fn troe_rate_grid() {
        assert_grid(
            &troe(),
            &[
                (300.0, [1.00648177e8, 2.01999460e8, 2.53938097e8]),
                (500.0, [4.71247326e7, 1.41526885e8, 2.45386923e8]),
                (1000.0, [3.94987723e6, 2.87338709e7, 9.57539092e7]),
                (1500.0, [5.88566395e5, 5.10614193e6, 3.10462030e7]),
            ],
        );
    }

    fn assert_change_rate_scales(mut model: impl PressureDependentRate) {
        let temperatures: Vec<f64> = (3..=15).map(|i| i as f64 * 100.0).collect();
        let before: Vec<f64> = temperatures
            .iter()
            .map(|&t| model.rate_coefficient(k(t), pa(1e5)).unwrap())
            .collect();
        model.change_rate(2.0);
        for (&t, &expected) in temperatures.iter().zip(&before) {
            let actual = model.rate_coefficient(k(t), pa(1e5)).unwrap();
            assert!(
                (actual - 2.0 * expected).abs() <= 1e-6 * expected,
                "T={}: {} vs {}",
                t,
                actual,
                2.0 * expected
            );
        }
    }

    #[test]
    fn change_rate_scales_third_body() {
        assert_change_rate_scales(third_body());
    }

    #[test]
    fn change_rate_scales_lindemann() {
        assert_change_rate_scales(lindemann());
    }

    #[test]
    fn change_rate_scales_troe() {
        assert_change_rate_scales(troe());
    }

    #[test]
    fn all_variants_are_pressure_dependent() {
        assert!(third_body().is_pressure_dependent());
        assert!(lindemann().is_pressure_dependent());
        assert!(troe().is_pressure_dependent());
        assert!(FalloffModel::from(troe()).is_pressure_dependent());
    }

    #[test]
    fn bounds_resolved_to_si() {
        let model = third_body();
        assert_eq!(model.validity().tmin().unwrap().value, 300.0);
        assert_eq!(model.validity().tmax().unwrap().value, 2000.0);
        // 0.01 bar and 100 bar in Pa
        assert_eq!(model.validity().pmin().unwrap().value, 1e3);
        assert_eq!(model.validity().pmax().unwrap().value, 1e7);
        assert_eq!(model.comment(), "H + CH3 -> CH4");
    }

    #[test]
    fn effective_pressure_pure_and_mixed() {
        let model = third_body();
        let colliders: Vec<Species> = model.efficiencies().iter().map(|(s, _)| s).collect();

        // Each pure bath gas gives exactly P * efficiency
        for (i, (_, eff)) in model.efficiencies().iter().enumerate() {
            let mut fractions = vec![0.0; colliders.len()];
            fractions[i] = 1.0;
            let peff = model
                .effective_pressure(pa(1.0), &colliders, &fractions)
                .unwrap();
            assert_eq!(peff.value, eff);
        }

        // 50/50 CH4/CO2 mixture, normalized and not
        let mut fractions = vec![0.0; colliders.len()];
        fractions[0] = 0.5;
        fractions[1] = 0.5;
        let expected = 0.5 * 3.0 + 0.5 * 2.0;
        let peff = model
            .effective_pressure(pa(1.0), &colliders, &fractions)
            .unwrap();
        assert!((peff.value - expected).abs() < 1e-12);

        fractions[0] = 0.7;
        fractions[1] = 0.7;
        let peff = model
            .effective_pressure(pa(1.0), &colliders, &fractions)
            .unwrap();
        assert!((peff.value - expected).abs() < 1e-12);
    }

    #[test]
    fn collider_efficiencies_superset_and_subset() {
        let model = lindemann();
        let superset = [
            Species::CH4,
            Species::CO2,
            Species::Ethane,
            Species::H2O,
            Species::Ar,
            Species::CO,
            Species::H2,
        ];
        assert_eq!(
            model.effective_collider_efficiencies(&superset),
            vec![3.0, 2.0, 3.0, 6.0, 0.7, 1.5, 2.0]
        );
        assert_eq!(
            model.effective_collider_efficiencies(&[Species::CH4, Species::Ethane, Species::Ar]),
            vec![3.0, 3.0, 0.7]
        );
    }

    #[test]
    fn inverted_bounds_rejected() {
        let options = FalloffOptions {
            tmin: Some((2000.0, "K")),
            tmax: Some((300.0, "K")),
            ..Default::default()
        };
        assert!(matches!(
            ThirdBody::new(low_limit(), options),
            Err(KineticsError::NonPhysical { .. })
        ));

        let options = FalloffOptions {
            pmin: Some((100.0, "bar")),
            pmax: Some((0.01, "bar")),
            ..Default::default()
        };
        assert!(matches!(
            ThirdBody::new(low_limit(), options),
            Err(KineticsError::NonPhysical { .. })
        ));
    }

    #[test]
    fn troe_shape_parameters_validated() {
        let bad_t3 = Troe::new(
            low_limit(),
            high_limit(),
            0.783,
            (0.0, "K"),
            (2941.0, "K"),
            None,
            FalloffOptions::default(),
        );
        assert!(bad_t3.is_err());

        let bad_t1 = Troe::new(
            low_limit(),
            high_limit(),
            0.783,
            (74.0, "K"),
            (-5.0, "K"),
            None,
            FalloffOptions::default(),
        );
        assert!(bad_t1.is_err());
    }

    #[test]
    fn troe_without_t2_drops_last_term() {
        let with = troe();
        let without = Troe::new(
            low_limit(),
            high_limit(),
            0.783,
            (74.0, "K"),
            (2941.0, "K"),
            None,
            methane_recombination_options(),
        )
        .unwrap();

        // At low temperature exp(-T2/T) is negligible, so both agree closely
        let t = k(300.0);
        let a = with.rate_coefficient(t, pa(1e5)).unwrap();
        let b = without.rate_coefficient(t, pa(1e5)).unwrap();
        assert!((a - b).abs() / a < 1e-6);

        // At high temperature the extra term matters
        let t = k(2000.0);
        let a = with.rate_coefficient(t, pa(1e5)).unwrap();
        let b = without.rate_coefficient(t, pa(1e5)).unwrap();
        assert!((a - b).abs() / a > 1e-3);
    }

    #[test]
    fn window_policy_is_explicit() {
        // Default policy extrapolates silently
        let model = third_body();
        assert!(model.rate_coefficient(k(100.0), pa(1e5)).is_ok());
        assert!(!model.validity().temperature_valid(k(100.0)));
        assert!(model.validity().temperature_valid(k(1000.0)));
        assert!(model.validity().pressure_valid(pa(1e5)));
        assert!(!model.validity().pressure_valid(pa(1e8)));

        // Reject refuses out-of-window points
        let options = FalloffOptions {
            range_policy: RangePolicy::Reject,
            ..methane_recombination_options()
        };
        let strict = ThirdBody::new(low_limit(), options).unwrap();
        assert!(matches!(
            strict.rate_coefficient(k(100.0), pa(1e5)),
            Err(KineticsError::OutOfValidity { what: "temperature" })
        ));
        assert!(matches!(
            strict.rate_coefficient(k(1000.0), pa(1e8)),
            Err(KineticsError::OutOfValidity { what: "pressure" })
        ));
        assert!(strict.rate_coefficient(k(1000.0), pa(1e5)).is_ok());
    }

    #[test]
    fn non_physical_evaluation_point_rejected() {
        let model = lindemann();
        assert!(model.rate_coefficient(k(0.0), pa(1e5)).is_err());
        assert!(model.rate_coefficient(k(-300.0), pa(1e5)).is_err());
        assert!(model.rate_coefficient(k(300.0), pa(0.0)).is_err());
        assert!(model.rate_coefficient(k(300.0), pa(f64::NAN)).is_err());
    }

    #[test]
    fn lindemann_limiting_behavior() {
        let model = lindemann();
        let t = 1000.0;

        // P -> 0: k converges to k0(T) * [M]
        let p = 1e-2;
        let low = model.rate_coefficient(k(t), pa(p)).unwrap();
        let expected = low_limit().rate(k(t)) * p / (R_J_PER_MOL_K * t);
        assert!((low - expected).abs() / expected < 1e-6);

        // P -> inf: k converges to kinf(T)
        let high = model.rate_coefficient(k(t), pa(1e12)).unwrap();
        let kinf = high_limit().rate(k(t));
        assert!((high - kinf).abs() / kinf < 1e-5);
    }

    #[test]
    fn troe_limiting_behavior() {
        let model = troe();
        let t = 1000.0;

        // P -> 0: the broadening factor climbs back toward 1 (only
        // logarithmically fast), so k drifts toward k0(T) * [M]
        let low_ratio = |p: f64| {
            let rate = model.rate_coefficient(k(t), pa(p)).unwrap();
            rate / (low_limit().rate(k(t)) * p / (R_J_PER_MOL_K * t))
        };
        let coarse = low_ratio(1e-2);
        let fine = low_ratio(1e-8);
        assert!((fine - 1.0).abs() < (coarse - 1.0).abs());
        assert!((fine - 1.0).abs() < 0.05);

        // P -> inf: k approaches kinf(T)
        let high = model.rate_coefficient(k(t), pa(1e12)).unwrap();
        let kinf = high_limit().rate(k(t));
        assert!((high - kinf).abs() / kinf < 2e-2);
    }

    #[test]
    fn union_dispatch_matches_variants() {
        let direct = troe();
        let model = FalloffModel::from(direct.clone());
        let t = k(700.0);
        let p = pa(5e5);
        assert_eq!(
            model.rate_coefficient(t, p).unwrap(),
            direct.rate_coefficient(t, p).unwrap()
        );
        assert!(model.is_identical_to(&model.clone(), Tolerances::default()));
        assert!(!model.is_identical_to(&FalloffModel::from(lindemann()), Tolerances::default()));
    }

    #[test]
    fn serde_json_roundtrip() {
        let model = FalloffModel::from(troe());
        let json = serde_json::to_string(&model).unwrap();
        let back: FalloffModel = serde_json::from_str(&json).unwrap();
        assert_eq!(model, back);
    }
}

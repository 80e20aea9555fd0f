//! kf-kinetics: pressure-dependent reaction rate coefficients for kinflow.
//!
//! Provides:
//! - Bath-gas collider definitions and linear-notation resolution
//! - Collider efficiency tables and mixture resolution
//! - Modified Arrhenius temperature dependence
//! - ThirdBody / Lindemann / Troe falloff models
//! - Versioned binary and canonical-text persistence
//!
//! # Architecture
//!
//! The three falloff variants form a closed set ([`FalloffModel`]) behind one
//! capability contract ([`PressureDependentRate`]). Every physical quantity
//! enters as a `(value, unit)` pair and is resolved to SI at construction;
//! evaluation is pure arithmetic over stored SI scalars. Models are immutable
//! after construction except for [`PressureDependentRate::change_rate`],
//! which rescales the pre-exponential constants in place.
//!
//! # Example
//!
//! ```
//! use kf_kinetics::{ArrheniusRate, EfficiencyTable, FalloffOptions, Lindemann,
//!                   PressureDependentRate};
//! use kf_core::units::{k, pa};
//!
//! let low = ArrheniusRate::new(
//!     (2.62e33, "cm^6/(mol^2*s)"), -4.76, (10.21, "kJ/mol"), (1.0, "K"),
//! ).unwrap();
//! let high = ArrheniusRate::new(
//!     (1.39e16, "cm^3/(mol*s)"), -0.534, (2.243, "kJ/mol"), (1.0, "K"),
//! ).unwrap();
//! let options = FalloffOptions {
//!     efficiencies: EfficiencyTable::from_notation(&[("[Ar]", 0.7), ("O", 6.0)]).unwrap(),
//!     comment: "H + CH3 -> CH4".to_string(),
//!     ..Default::default()
//! };
//!
//! let model = Lindemann::new(low, high, options).unwrap();
//! let rate = model.rate_coefficient(k(1000.0), pa(1e5)).unwrap();
//! assert!(rate > 0.0);
//! ```

pub mod arrhenius;
pub mod canonical;
pub mod efficiency;
pub mod error;
pub mod falloff;
pub mod species;
pub mod units;
pub mod wire;

// Re-exports for ergonomics
pub use arrhenius::ArrheniusRate;
pub use canonical::{from_canonical, to_canonical};
pub use efficiency::EfficiencyTable;
pub use error::{KineticsError, KineticsResult};
pub use falloff::{
    FalloffModel, FalloffOptions, Lindemann, PressureDependentRate, RangePolicy, ThirdBody, Troe,
    Validity,
};
pub use species::Species;
pub use units::{Quantity, UnitError, convert};
pub use wire::{decode, encode};

//! Kinetics errors.

use crate::units::UnitError;
use kf_core::KfError;
use thiserror::Error;

/// Result type for kinetics operations.
pub type KineticsResult<T> = Result<T, KineticsError>;

/// Errors that can occur while building or evaluating rate models.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KineticsError {
    /// Collider list and mole-fraction list have different lengths.
    #[error("Arity mismatch: {colliders} colliders vs {fractions} mole fractions")]
    ArityMismatch { colliders: usize, fractions: usize },

    /// Non-physical values (non-positive T0, inverted bounds, etc.).
    #[error("Non-physical value for {what}")]
    NonPhysical { what: &'static str },

    /// Invalid argument.
    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    /// Two efficiency-table entries resolve to the same collider.
    #[error("Duplicate collider in efficiency table: {species}")]
    DuplicateCollider { species: &'static str },

    /// Evaluation rejected by the model's validity window policy.
    #[error("Outside validity window: {what}")]
    OutOfValidity { what: &'static str },

    /// Unit resolution failure at the construction boundary.
    #[error("Unit error: {0}")]
    Unit(#[from] UnitError),

    /// Malformed binary stream.
    #[error("Wire decode error: {what}")]
    Wire { what: String },

    /// Malformed canonical constructor text.
    #[error("Canonical form error: {what}")]
    Canonical { what: String },
}

impl From<KineticsError> for KfError {
    fn from(err: KineticsError) -> Self {
        // Convert to KfError while preserving context
        match err {
            KineticsError::ArityMismatch { colliders, fractions } => KfError::InvalidArg {
                what: Box::leak(
                    format!("arity mismatch: {} colliders vs {} fractions", colliders, fractions)
                        .into_boxed_str(),
                ),
            },
            KineticsError::NonPhysical { what } => KfError::Invariant {
                what: Box::leak(format!("Non-physical kinetics value: {}", what).into_boxed_str()),
            },
            KineticsError::InvalidArg { what } => KfError::InvalidArg {
                what: Box::leak(format!("Invalid kinetics argument: {}", what).into_boxed_str()),
            },
            KineticsError::DuplicateCollider { species } => KfError::InvalidArg {
                what: Box::leak(format!("Duplicate collider: {}", species).into_boxed_str()),
            },
            KineticsError::OutOfValidity { what } => KfError::InvalidArg {
                what: Box::leak(format!("Outside validity window: {}", what).into_boxed_str()),
            },
            KineticsError::Unit(unit_err) => KfError::InvalidArg {
                what: Box::leak(format!("Unit error: {}", unit_err).into_boxed_str()),
            },
            KineticsError::Wire { what } => KfError::Invariant {
                what: Box::leak(format!("Wire decode error: {}", what).into_boxed_str()),
            },
            KineticsError::Canonical { what } => KfError::Invariant {
                what: Box::leak(format!("Canonical form error: {}", what).into_boxed_str()),
            },
        }
    }
}

//! Unit resolution for constructor inputs.
//!
//! Every physical quantity enters the crate as a `(value, unit)` pair and is
//! converted to an SI scalar here, once, at construction. Nothing downstream
//! ever re-parses a unit string.
//!
//! # Key Design
//!
//! - **Quantity families**: each family knows its own unit vocabulary and
//!   canonical SI unit.
//! - **Strict resolution**: unknown units are errors, never pass-through
//!   guesses; negative absolute quantities are rejected where physics demands.

use kf_core::units::constants::N_A_PER_MOL;
use std::fmt;

/// Dimension/quantity family for a constructor input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    /// Temperature (canonical: K)
    Temperature,
    /// Absolute pressure (canonical: Pa)
    Pressure,
    /// Molar energy, e.g. activation energy (canonical: J/mol)
    MolarEnergy,
    /// Rate pre-exponential factor (canonical: m^3k/mol^k/s for order k+1)
    RateCoefficient,
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temperature => write!(f, "Temperature"),
            Self::Pressure => write!(f, "Pressure"),
            Self::MolarEnergy => write!(f, "Molar Energy"),
            Self::RateCoefficient => write!(f, "Rate Coefficient"),
        }
    }
}

/// Error in unit resolution.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitError {
    /// Value is NaN or infinite
    NonFinite { value: f64, quantity: String },
    /// Unit not recognized for this quantity
    UnknownUnit { unit: String, quantity: String },
    /// Value out of physical range (e.g., negative absolute pressure)
    OutOfRange { value: f64, reason: String },
}

impl fmt::Display for UnitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonFinite { value, quantity } => {
                write!(f, "Non-finite value {} for {}", value, quantity)
            }
            Self::UnknownUnit { unit, quantity } => {
                write!(f, "Unknown unit '{}' for {}", unit, quantity)
            }
            Self::OutOfRange { value, reason } => {
                write!(f, "Value {} out of range: {}", value, reason)
            }
        }
    }
}

impl std::error::Error for UnitError {}

/// Resolve a `(value, unit)` pair to its canonical SI scalar.
///
/// An empty unit string means the value is already in the canonical unit
/// for its quantity family.
pub fn convert(value: f64, unit: &str, quantity: Quantity) -> Result<f64, UnitError> {
    if !value.is_finite() {
        return Err(UnitError::NonFinite {
            value,
            quantity: quantity.to_string(),
        });
    }
    let unit = normalize(unit);

    match quantity {
        Quantity::Temperature => convert_temperature(value, &unit),
        Quantity::Pressure => convert_pressure(value, &unit),
        Quantity::MolarEnergy => convert_molar_energy(value, &unit),
        Quantity::RateCoefficient => convert_rate_coefficient(value, &unit),
    }
}

/// Lowercase, strip whitespace, unify the multiplication dot.
fn normalize(unit: &str) -> String {
    unit.trim().to_lowercase().replace('·', "*").replace(' ', "")
}

/// Convert temperature to Kelvin.
fn convert_temperature(value: f64, unit: &str) -> Result<f64, UnitError> {
    let kelvin = match unit {
        "k" | "kelvin" => value,
        "c" | "°c" | "celsius" => value + 273.15,
        "f" | "°f" | "fahrenheit" => (value + 459.67) * 5.0 / 9.0,
        "r" | "°r" | "rankine" => value * 5.0 / 9.0,
        // Default to Kelvin if no unit specified
        "" => value,
        _ => {
            return Err(UnitError::UnknownUnit {
                unit: unit.to_string(),
                quantity: "Temperature".to_string(),
            });
        }
    };

    if kelvin < 0.0 {
        return Err(UnitError::OutOfRange {
            value: kelvin,
            reason: "Absolute temperature cannot be negative".to_string(),
        });
    }

    Ok(kelvin)
}

/// Convert pressure to Pa (absolute).
fn convert_pressure(value: f64, unit: &str) -> Result<f64, UnitError> {
    let pa = match unit {
        "pa" | "pascal" => value,
        "kpa" => value * 1e3,
        "mpa" => value * 1e6,
        "bar" => value * 1e5,
        "mbar" | "millibar" => value * 100.0,
        "atm" => value * 101_325.0,
        "torr" => value * 133.322,
        "psia" => value * 6_894.76,
        "" => value, // Default to Pa
        _ => {
            return Err(UnitError::UnknownUnit {
                unit: unit.to_string(),
                quantity: "Pressure".to_string(),
            });
        }
    };

    if pa < 0.0 {
        return Err(UnitError::OutOfRange {
            value: pa,
            reason: "Absolute pressure cannot be negative".to_string(),
        });
    }

    Ok(pa)
}

/// Convert molar energy to J/mol. Sign is unrestricted (barriers can be
/// negative for fitted expressions).
fn convert_molar_energy(value: f64, unit: &str) -> Result<f64, UnitError> {
    let j_mol = match unit {
        "j/mol" => value,
        "kj/mol" => value * 1e3,
        "cal/mol" => value * 4.184,
        "kcal/mol" => value * 4_184.0,
        "j/kmol" => value * 1e-3,
        "kj/kmol" => value, // kJ/kmol == J/mol
        "" => value,
        _ => {
            return Err(UnitError::UnknownUnit {
                unit: unit.to_string(),
                quantity: "Molar Energy".to_string(),
            });
        }
    };

    Ok(j_mol)
}

/// Convert a rate pre-exponential factor to SI (m, mol, s).
///
/// The reaction order is implied by the unit: volume^k per mol^k per time
/// for an order-(k+1) rate constant. Molecule-based units are converted to
/// molar via the Avogadro constant.
fn convert_rate_coefficient(value: f64, unit: &str) -> Result<f64, UnitError> {
    let si = match unit {
        "s^-1" | "s**-1" | "1/s" => value,
        "m^3/(mol*s)" | "m3/(mol*s)" => value,
        "cm^3/(mol*s)" | "cm3/(mol*s)" => value * 1e-6,
        "l/(mol*s)" | "dm^3/(mol*s)" | "dm3/(mol*s)" => value * 1e-3,
        "m^6/(mol^2*s)" | "m6/(mol2*s)" => value,
        "cm^6/(mol^2*s)" | "cm6/(mol2*s)" => value * 1e-12,
        "m^3/(molecule*s)" => value * N_A_PER_MOL,
        "cm^3/(molecule*s)" | "cm3/(molecule*s)" => value * 1e-6 * N_A_PER_MOL,
        "cm^6/(molecule^2*s)" | "cm6/(molecule2*s)" => {
            value * 1e-12 * N_A_PER_MOL * N_A_PER_MOL
        }
        "" => value,
        _ => {
            return Err(UnitError::UnknownUnit {
                unit: unit.to_string(),
                quantity: "Rate Coefficient".to_string(),
            });
        }
    };

    Ok(si)
}

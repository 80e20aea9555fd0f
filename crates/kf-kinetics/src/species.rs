//! Bath-gas collider definitions.

use serde::{Deserialize, Serialize};

/// Bath-gas species relevant as third-body colliders in combustion kinetics.
///
/// Structural identity is enum equality; the `FromStr` impl is the boundary
/// where linear notation (SMILES-style strings, formulas, names) is resolved
/// to a canonical species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Species {
    /// Hydrogen (H₂)
    H2,
    /// Water (H₂O)
    H2O,
    /// Nitrogen (N₂)
    N2,
    /// Oxygen (O₂)
    O2,
    /// Argon (Ar)
    Ar,
    /// Helium (He)
    He,
    /// Neon (Ne)
    Ne,
    /// Carbon monoxide (CO)
    CO,
    /// Carbon dioxide (CO₂)
    CO2,
    /// Methane (CH₄)
    CH4,
    /// Ethane (C₂H₆)
    Ethane,
}

impl Species {
    pub const ALL: [Species; 11] = [
        Species::H2,
        Species::H2O,
        Species::N2,
        Species::O2,
        Species::Ar,
        Species::He,
        Species::Ne,
        Species::CO,
        Species::CO2,
        Species::CH4,
        Species::Ethane,
    ];

    /// Canonical key used for persistence and table rendering.
    pub fn key(&self) -> &'static str {
        match self {
            Species::H2 => "H2",
            Species::H2O => "H2O",
            Species::N2 => "N2",
            Species::O2 => "O2",
            Species::Ar => "Ar",
            Species::He => "He",
            Species::Ne => "Ne",
            Species::CO => "CO",
            Species::CO2 => "CO2",
            Species::CH4 => "CH4",
            Species::Ethane => "C2H6",
        }
    }

    /// SMILES notation for this collider.
    pub fn smiles(&self) -> &'static str {
        match self {
            Species::H2 => "[H][H]",
            Species::H2O => "O",
            Species::N2 => "N#N",
            Species::O2 => "O=O",
            Species::Ar => "[Ar]",
            Species::He => "[He]",
            Species::Ne => "[Ne]",
            Species::CO => "[C]=O",
            Species::CO2 => "C(=O)=O",
            Species::CH4 => "C",
            Species::Ethane => "CC",
        }
    }

    /// Get human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Species::H2 => "Hydrogen",
            Species::H2O => "Water",
            Species::N2 => "Nitrogen",
            Species::O2 => "Oxygen",
            Species::Ar => "Argon",
            Species::He => "Helium",
            Species::Ne => "Neon",
            Species::CO => "Carbon Monoxide",
            Species::CO2 => "Carbon Dioxide",
            Species::CH4 => "Methane",
            Species::Ethane => "Ethane",
        }
    }
}

impl std::str::FromStr for Species {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "H2" | "[H][H]" | "HYDROGEN" => Ok(Species::H2),
            "H2O" | "O" | "WATER" => Ok(Species::H2O),
            "N2" | "N#N" | "NITROGEN" => Ok(Species::N2),
            "O2" | "O=O" | "OXYGEN" => Ok(Species::O2),
            "AR" | "[AR]" | "ARGON" => Ok(Species::Ar),
            "HE" | "[HE]" | "HELIUM" => Ok(Species::He),
            "NE" | "[NE]" | "NEON" => Ok(Species::Ne),
            "CO" | "[C]=O" | "CARBONMONOXIDE" | "CARBON MONOXIDE" => Ok(Species::CO),
            "CO2" | "C(=O)=O" | "O=C=O" | "CARBONDIOXIDE" | "CARBON DIOXIDE" => Ok(Species::CO2),
            "CH4" | "C" | "METHANE" => Ok(Species::CH4),
            "C2H6" | "CC" | "ETHANE" => Ok(Species::Ethane),
            _ => Err("unknown collider notation"),
        }
    }
}

//! Collider efficiency tables and mixture resolution.

use crate::error::{KineticsError, KineticsResult};
use crate::species::Species;
use kf_core::units::{Pressure, pa};
use serde::{Deserialize, Serialize};

/// Ordered mapping from collider to a dimensionless efficiency factor.
///
/// Colliders not listed have efficiency 1.0. Entry order is preserved so the
/// persisted forms reproduce the table exactly as built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyTable {
    entries: Vec<(Species, f64)>,
}

impl Default for EfficiencyTable {
    fn default() -> Self {
        Self::empty()
    }
}

impl EfficiencyTable {
    /// Table with no listed colliders (every efficiency is 1.0).
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Create a table from resolved species.
    ///
    /// Rejects duplicate colliders and factors that are not positive and
    /// finite.
    pub fn new(entries: Vec<(Species, f64)>) -> KineticsResult<Self> {
        for (i, (species, factor)) in entries.iter().enumerate() {
            if !factor.is_finite() || *factor <= 0.0 {
                return Err(KineticsError::NonPhysical {
                    what: "efficiency factor must be positive and finite",
                });
            }
            if entries[..i].iter().any(|(s, _)| s == species) {
                return Err(KineticsError::DuplicateCollider {
                    species: species.key(),
                });
            }
        }
        Ok(Self { entries })
    }

    /// Create a table from linear collider notation (SMILES, formulas, names).
    ///
    /// This is the load boundary where an external textual representation is
    /// resolved to structural identities; two notations for the same species
    /// count as duplicates.
    pub fn from_notation(entries: &[(&str, f64)]) -> KineticsResult<Self> {
        let mut resolved = Vec::with_capacity(entries.len());
        for (notation, factor) in entries {
            let species = notation
                .parse::<Species>()
                .map_err(|_| KineticsError::InvalidArg {
                    what: "unresolvable collider notation",
                })?;
            resolved.push((species, *factor));
        }
        Self::new(resolved)
    }

    /// Efficiency of a single collider (1.0 if not listed).
    pub fn efficiency(&self, species: Species) -> f64 {
        self.entries
            .iter()
            .find(|(s, _)| *s == species)
            .map(|(_, factor)| *factor)
            .unwrap_or(1.0)
    }

    /// Per-collider efficiencies aligned to the given list.
    ///
    /// Order is preserved and duplicate colliders resolve independently.
    pub fn collider_efficiencies(&self, colliders: &[Species]) -> Vec<f64> {
        colliders.iter().map(|&s| self.efficiency(s)).collect()
    }

    /// Mole-fraction-weighted mixture efficiency.
    ///
    /// Dividing by the fraction sum makes the result invariant under uniform
    /// positive scaling of the fraction vector, so inputs need not be
    /// normalized.
    pub fn mixture_efficiency(
        &self,
        colliders: &[Species],
        fractions: &[f64],
    ) -> KineticsResult<f64> {
        if colliders.len() != fractions.len() {
            return Err(KineticsError::ArityMismatch {
                colliders: colliders.len(),
                fractions: fractions.len(),
            });
        }
        if colliders.is_empty() {
            return Err(KineticsError::InvalidArg {
                what: "empty mixture",
            });
        }

        let mut weighted = 0.0;
        let mut sum = 0.0;
        for (&species, &fraction) in colliders.iter().zip(fractions) {
            if !fraction.is_finite() {
                return Err(KineticsError::NonPhysical {
                    what: "non-finite mole fraction",
                });
            }
            if fraction < 0.0 {
                return Err(KineticsError::NonPhysical {
                    what: "negative mole fraction",
                });
            }
            weighted += fraction * self.efficiency(species);
            sum += fraction;
        }

        if sum <= 0.0 || !sum.is_finite() {
            return Err(KineticsError::NonPhysical {
                what: "mole fractions sum to zero or non-finite",
            });
        }

        Ok(weighted / sum)
    }

    /// Efficiency-weighted effective pressure for a mixture.
    pub fn effective_pressure(
        &self,
        p: Pressure,
        colliders: &[Species],
        fractions: &[f64],
    ) -> KineticsResult<Pressure> {
        if !p.value.is_finite() || p.value <= 0.0 {
            return Err(KineticsError::NonPhysical {
                what: "pressure must be positive and finite",
            });
        }
        let factor = self.mixture_efficiency(colliders, fractions)?;
        Ok(pa(p.value * factor))
    }

    /// Same colliders with factors equal within tolerance, in any order.
    pub fn is_identical_to(&self, other: &Self, tol: kf_core::numeric::Tolerances) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(species, factor)| {
                other
                    .entries
                    .iter()
                    .any(|(s, f)| s == species && kf_core::numeric::nearly_equal(*factor, *f, tol))
            })
    }

    /// Iterate over listed colliders in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Species, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use kf_core::numeric::{Tolerances, nearly_equal};
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn scaling_never_changes_mixture_efficiency(
            fracs in prop::collection::vec(1e-6_f64..1.0_f64, 1..6),
            scale in 1e-3_f64..1e3_f64,
        ) {
            let table = EfficiencyTable::new(vec![
                (Species::CH4, 3.0),
                (Species::H2O, 6.0),
                (Species::Ar, 0.7),
            ]).unwrap();
            let colliders: Vec<Species> = fracs
                .iter()
                .enumerate()
                .map(|(i, _)| Species::ALL[i % Species::ALL.len()])
                .collect();

            let base = table.mixture_efficiency(&colliders, &fracs).unwrap();
            let scaled_fracs: Vec<f64> = fracs.iter().map(|f| f * scale).collect();
            let scaled = table.mixture_efficiency(&colliders, &scaled_fracs).unwrap();

            let tol = Tolerances { abs: 1e-9, rel: 1e-9 };
            prop_assert!(nearly_equal(base, scaled, tol));
        }
    }
}

//! Percentage splits of a march across troop types, and the named formation
//! presets the optimizer starts from.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{AllocationError, PresetError};
use crate::troops::{TroopInventory, TroopType};

pub const FULL_PERCENTAGE: f64 = 100.0;

/// Target share of a march for each troop type, in percent.
///
/// Construction does not check the sum; see [`RatioSpec::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RatioSpec {
    pub infantry: f64,
    pub lancer: f64,
    pub marksman: f64,
}

impl RatioSpec {
    pub const fn new(infantry: f64, lancer: f64, marksman: f64) -> Self {
        Self {
            infantry,
            lancer,
            marksman,
        }
    }

    pub fn get(&self, troop: TroopType) -> f64 {
        match troop {
            TroopType::Infantry => self.infantry,
            TroopType::Lancer => self.lancer,
            TroopType::Marksman => self.marksman,
        }
    }

    pub fn total(&self) -> f64 {
        self.infantry + self.lancer + self.marksman
    }

    /// Checks that every share is a finite, non-negative number and that the
    /// shares total 100 once rounded to two decimals. `march` is the 1-based
    /// index reported on failure.
    pub fn validate(&self, march: usize) -> Result<(), AllocationError> {
        for troop in TroopType::ALL {
            let value = self.get(troop);
            if !value.is_finite() || value < 0.0 {
                return Err(AllocationError::InvalidPercentage {
                    march,
                    troop,
                    value,
                });
            }
        }
        let total = self.total();
        if round_to_hundredths(total) != FULL_PERCENTAGE {
            return Err(AllocationError::RatioValidation { march, total });
        }
        Ok(())
    }

    /// Troop types from smallest to largest share. Ties keep declaration order.
    pub fn ascending_priority(&self) -> [TroopType; 3] {
        let mut order = TroopType::ALL;
        order.sort_by(|a, b| self.compare(*a, *b));
        order
    }

    /// Troop types from largest to smallest share. Ties keep declaration order.
    pub fn descending_priority(&self) -> [TroopType; 3] {
        let mut order = TroopType::ALL;
        order.sort_by(|a, b| self.compare(*b, *a));
        order
    }

    fn compare(&self, a: TroopType, b: TroopType) -> Ordering {
        self.get(a)
            .partial_cmp(&self.get(b))
            .unwrap_or(Ordering::Equal)
    }

    /// The same ratio applied to each of `marches` marches.
    pub fn repeat(&self, marches: usize) -> Vec<RatioSpec> {
        vec![*self; marches]
    }

    /// Troops of each type this ratio calls for across `marches` marches of
    /// `march_size`, rounded down.
    pub fn requirements(&self, march_size: u64, marches: usize) -> TroopInventory {
        let need = |troop: TroopType| {
            ((self.get(troop) / FULL_PERCENTAGE) * march_size as f64 * marches as f64).floor()
                as u64
        };
        TroopInventory::new(
            need(TroopType::Infantry),
            need(TroopType::Lancer),
            need(TroopType::Marksman),
        )
    }
}

/// Rounds the exact binary value, so `100.00499..` stays below the halfway
/// point instead of being pushed over it by an inexact multiply.
fn round_to_hundredths(value: f64) -> f64 {
    format!("{value:.2}").parse().unwrap_or(value)
}

/// Named starting ratios for the optimizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationPreset {
    Bear,
    InfantryFocused,
    Balanced,
    LancerCharge,
    MarksmanRush,
    InfantryWall,
    StandardFormation,
    Garrison,
    Rally,
}

impl FormationPreset {
    pub const ALL: [FormationPreset; 9] = [
        FormationPreset::Bear,
        FormationPreset::InfantryFocused,
        FormationPreset::Balanced,
        FormationPreset::LancerCharge,
        FormationPreset::MarksmanRush,
        FormationPreset::InfantryWall,
        FormationPreset::StandardFormation,
        FormationPreset::Garrison,
        FormationPreset::Rally,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormationPreset::Bear => "Bear",
            FormationPreset::InfantryFocused => "Infantry Focused",
            FormationPreset::Balanced => "Balanced",
            FormationPreset::LancerCharge => "Lancer Charge",
            FormationPreset::MarksmanRush => "Marksman Rush",
            FormationPreset::InfantryWall => "Infantry Wall",
            FormationPreset::StandardFormation => "Standard Formation",
            FormationPreset::Garrison => "Garrison",
            FormationPreset::Rally => "Rally",
        }
    }

    pub fn ratio(self) -> RatioSpec {
        match self {
            FormationPreset::Bear => RatioSpec::new(10.0, 30.0, 60.0),
            FormationPreset::InfantryFocused => RatioSpec::new(60.0, 30.0, 10.0),
            FormationPreset::Balanced => RatioSpec::new(33.33, 33.33, 33.34),
            FormationPreset::LancerCharge => RatioSpec::new(5.0, 85.0, 10.0),
            FormationPreset::MarksmanRush => RatioSpec::new(5.0, 15.0, 80.0),
            FormationPreset::InfantryWall => RatioSpec::new(80.0, 10.0, 10.0),
            // These three carry their own shares; they never fall back to Balanced.
            FormationPreset::StandardFormation => RatioSpec::new(45.0, 10.0, 45.0),
            FormationPreset::Garrison => RatioSpec::new(50.0, 40.0, 10.0),
            FormationPreset::Rally => RatioSpec::new(30.0, 20.0, 50.0),
        }
    }

    /// Lenient lookup: unknown names fall back to [`FormationPreset::Balanced`].
    pub fn lookup_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|err: PresetError| {
            warn!("{err}; falling back to {}", FormationPreset::Balanced);
            FormationPreset::Balanced
        })
    }
}

impl fmt::Display for FormationPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FormationPreset {
    type Err = PresetError;

    /// Matches names ignoring case, spaces, dashes and underscores, so
    /// `"Marksman Rush"`, `"marksman-rush"` and `"MarksmanRush"` are equal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize(s);
        FormationPreset::ALL
            .into_iter()
            .find(|preset| normalize(preset.name()) == wanted)
            .ok_or_else(|| PresetError::Unknown(s.to_string()))
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_'))
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

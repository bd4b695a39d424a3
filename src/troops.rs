use std::fmt;
use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// The three unit categories a march can carry.
///
/// Declaration order is the canonical order used whenever two types tie on
/// priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TroopType {
    Infantry,
    Lancer,
    Marksman,
}

impl TroopType {
    pub const ALL: [TroopType; 3] = [TroopType::Infantry, TroopType::Lancer, TroopType::Marksman];

    pub fn as_str(self) -> &'static str {
        match self {
            TroopType::Infantry => "infantry",
            TroopType::Lancer => "lancer",
            TroopType::Marksman => "marksman",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TroopType::Infantry => "Infantry",
            TroopType::Lancer => "Lancer",
            TroopType::Marksman => "Marksman",
        }
    }
}

impl fmt::Display for TroopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Troop counts keyed by type. Used both for stock on hand and for derived
/// per-type quantities such as requirements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TroopInventory {
    #[serde(default)]
    pub infantry: u64,
    #[serde(default)]
    pub lancer: u64,
    #[serde(default)]
    pub marksman: u64,
}

impl TroopInventory {
    pub fn new(infantry: u64, lancer: u64, marksman: u64) -> Self {
        Self {
            infantry,
            lancer,
            marksman,
        }
    }

    /// Sums per-tier stock (T10, T11, ...) into a single inventory.
    pub fn from_tiers<I>(tiers: I) -> Self
    where
        I: IntoIterator<Item = TroopInventory>,
    {
        tiers
            .into_iter()
            .fold(Self::default(), |acc, tier| acc.saturating_add(&tier))
    }

    pub fn get(&self, troop: TroopType) -> u64 {
        self[troop]
    }

    pub fn total(&self) -> u64 {
        self.infantry + self.lancer + self.marksman
    }

    pub fn is_empty(&self) -> bool {
        self.iter().all(|(_, count)| count == 0)
    }

    pub fn saturating_add(&self, other: &TroopInventory) -> Self {
        Self {
            infantry: self.infantry.saturating_add(other.infantry),
            lancer: self.lancer.saturating_add(other.lancer),
            marksman: self.marksman.saturating_add(other.marksman),
        }
    }

    /// Removes up to `amount` of `troop` and returns how many were taken.
    pub fn take(&mut self, troop: TroopType, amount: u64) -> u64 {
        let slot = &mut self[troop];
        let taken = amount.min(*slot);
        *slot -= taken;
        taken
    }

    pub fn iter(&self) -> impl Iterator<Item = (TroopType, u64)> + '_ {
        TroopType::ALL.into_iter().map(move |troop| (troop, self[troop]))
    }
}

impl Index<TroopType> for TroopInventory {
    type Output = u64;

    fn index(&self, troop: TroopType) -> &u64 {
        match troop {
            TroopType::Infantry => &self.infantry,
            TroopType::Lancer => &self.lancer,
            TroopType::Marksman => &self.marksman,
        }
    }
}

impl IndexMut<TroopType> for TroopInventory {
    fn index_mut(&mut self, troop: TroopType) -> &mut u64 {
        match troop {
            TroopType::Infantry => &mut self.infantry,
            TroopType::Lancer => &mut self.lancer,
            TroopType::Marksman => &mut self.marksman,
        }
    }
}

//! March capacity modifiers.
//!
//! A march's effective size is its base capacity plus three independent
//! bonuses: a flat pet bonus, a percentage city bonus and a flat minister
//! bonus.

use std::fmt;
use std::str::FromStr;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::BuffError;

/// Troops granted per pet buff level.
pub const PET_BUFF_PER_LEVEL: u64 = 1_500;
pub const MAX_PET_LEVEL: u8 = 10;
pub const MINISTER_BUFF_VALUE: u64 = 2_500;

/// Snow ape pet level, `0` meaning no buff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PetBuffLevel(u8);

impl PetBuffLevel {
    pub const NONE: PetBuffLevel = PetBuffLevel(0);

    pub fn new(level: u8) -> Result<Self, BuffError> {
        if level > MAX_PET_LEVEL {
            return Err(BuffError::UnknownPetLevel(level.to_string()));
        }
        Ok(Self(level))
    }

    pub fn all() -> impl Iterator<Item = PetBuffLevel> {
        (0..=MAX_PET_LEVEL).map(PetBuffLevel)
    }

    pub fn level(self) -> u8 {
        self.0
    }

    pub fn bonus(self) -> u64 {
        PET_BUFF_PER_LEVEL * u64::from(self.0)
    }
}

impl TryFrom<u8> for PetBuffLevel {
    type Error = BuffError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PetBuffLevel> for u8 {
    fn from(value: PetBuffLevel) -> Self {
        value.0
    }
}

impl fmt::Display for PetBuffLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            0 => f.write_str("No Buff"),
            level => write!(f, "Level {level}"),
        }
    }
}

impl FromStr for PetBuffLevel {
    type Err = BuffError;

    /// Accepts a bare number, `"No Buff"` or `"Level N"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("no buff") || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Self::NONE);
        }
        let digits = trimmed
            .get(..5)
            .filter(|prefix| prefix.eq_ignore_ascii_case("level"))
            .map_or(trimmed, |_| trimmed[5..].trim());
        digits
            .parse::<u8>()
            .map_err(|_| BuffError::UnknownPetLevel(s.to_string()))
            .and_then(|level| {
                Self::new(level).map_err(|_| BuffError::UnknownPetLevel(s.to_string()))
            })
    }
}

/// Percentage city bonus. Only one may be active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum CityBuff {
    #[default]
    None,
    Ten,
    Twenty,
}

impl CityBuff {
    /// Resolves the two city buff toggles. Selecting both is a configuration
    /// error that degrades to no buff.
    pub fn from_selections(ten: bool, twenty: bool) -> Self {
        match (ten, twenty) {
            (true, true) => {
                warn!("both 10% and 20% city buffs selected; applying no city buff");
                CityBuff::None
            }
            (true, false) => CityBuff::Ten,
            (false, true) => CityBuff::Twenty,
            (false, false) => CityBuff::None,
        }
    }

    pub fn percent(self) -> u32 {
        match self {
            CityBuff::None => 0,
            CityBuff::Ten => 10,
            CityBuff::Twenty => 20,
        }
    }

    /// Flat troop value of this buff for a given base size, rounded down.
    pub fn flat_value(self, base_size: u64) -> u64 {
        // At most 20% of a u64, so the narrowing cannot truncate.
        (u128::from(base_size) * u128::from(self.percent()) / 100) as u64
    }
}

impl TryFrom<u32> for CityBuff {
    type Error = BuffError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CityBuff::None),
            10 => Ok(CityBuff::Ten),
            20 => Ok(CityBuff::Twenty),
            other => Err(BuffError::UnsupportedCityBuff(other)),
        }
    }
}

impl From<CityBuff> for u32 {
    fn from(value: CityBuff) -> Self {
        value.percent()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuffConfiguration {
    pub pet: PetBuffLevel,
    pub city: CityBuff,
    pub minister: bool,
}

impl BuffConfiguration {
    pub fn new(pet: PetBuffLevel, city: CityBuff, minister: bool) -> Self {
        Self { pet, city, minister }
    }

    pub fn pet_buff(&self) -> u64 {
        self.pet.bonus()
    }

    pub fn minister_buff(&self) -> u64 {
        if self.minister {
            MINISTER_BUFF_VALUE
        } else {
            0
        }
    }

    pub fn effective_march_size(&self, base_size: u64) -> Result<u64, BuffError> {
        effective_march_size(base_size, self)
    }

    pub fn breakdown(&self, base_size: u64) -> Result<BuffBreakdown, BuffError> {
        let pet = self.pet_buff();
        let city = self.city.flat_value(base_size);
        let minister = self.minister_buff();
        let total_bonus = pet + city + minister;
        let effective_size = base_size
            .checked_add(total_bonus)
            .ok_or(BuffError::CapacityOverflow { base_size })?;
        Ok(BuffBreakdown {
            base_size,
            pet,
            city_percent: self.city.percent(),
            city,
            minister,
            total_bonus,
            effective_size,
        })
    }
}

/// `base + pet + floor(base * city% / 100) + minister`.
///
/// Fails when the buffed size no longer fits in a `u64`.
pub fn effective_march_size(base_size: u64, buffs: &BuffConfiguration) -> Result<u64, BuffError> {
    base_size
        .checked_add(buffs.pet_buff())
        .and_then(|size| size.checked_add(buffs.city.flat_value(base_size)))
        .and_then(|size| size.checked_add(buffs.minister_buff()))
        .ok_or(BuffError::CapacityOverflow { base_size })
}

/// Per-source view of how an effective march size was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuffBreakdown {
    pub base_size: u64,
    pub pet: u64,
    pub city_percent: u32,
    pub city: u64,
    pub minister: u64,
    pub total_bonus: u64,
    pub effective_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_buffs_keep_base_size() {
        let buffs = BuffConfiguration::default();
        assert_eq!(effective_march_size(1_000, &buffs), Ok(1_000));
    }

    #[test]
    fn all_buffs_stack() {
        let buffs = BuffConfiguration::new(PetBuffLevel::new(3).unwrap(), CityBuff::Twenty, true);
        // 1_005 + 4_500 + floor(201.0) + 2_500
        assert_eq!(buffs.effective_march_size(1_005), Ok(8_206));
        let breakdown = buffs.breakdown(1_005).unwrap();
        assert_eq!(breakdown.city, 201);
        assert_eq!(breakdown.total_bonus, 7_201);
        assert_eq!(breakdown.effective_size, 8_206);
    }

    #[test]
    fn city_buff_rounds_down() {
        assert_eq!(CityBuff::Ten.flat_value(999), 99);
        assert_eq!(CityBuff::Twenty.flat_value(4), 0);
    }

    #[test]
    fn huge_base_keeps_city_value_exact() {
        let buffs = BuffConfiguration::new(PetBuffLevel::new(1).unwrap(), CityBuff::Twenty, false);
        let base = u64::MAX / 10;
        assert_eq!(CityBuff::Twenty.flat_value(base), base / 5);
        assert_eq!(
            buffs.effective_march_size(base),
            Ok(base + 1_500 + base / 5)
        );
    }

    #[test]
    fn buffed_size_past_u64_is_an_error() {
        let buffs = BuffConfiguration::new(PetBuffLevel::new(1).unwrap(), CityBuff::None, true);
        let base = u64::MAX - 100;
        assert_eq!(
            buffs.effective_march_size(base),
            Err(BuffError::CapacityOverflow { base_size: base })
        );
        assert!(buffs.breakdown(base).is_err());
    }

    #[test]
    fn conflicting_city_buffs_degrade_to_none() {
        assert_eq!(CityBuff::from_selections(true, true), CityBuff::None);
        assert_eq!(CityBuff::from_selections(true, false), CityBuff::Ten);
        assert_eq!(CityBuff::from_selections(false, true), CityBuff::Twenty);
    }

    #[test]
    fn pet_levels_cover_eleven_steps() {
        let bonuses: Vec<u64> = PetBuffLevel::all().map(PetBuffLevel::bonus).collect();
        assert_eq!(bonuses.len(), 11);
        assert_eq!(bonuses[0], 0);
        assert_eq!(bonuses[10], 15_000);
        assert!(PetBuffLevel::new(11).is_err());
    }

    #[test]
    fn pet_level_parses_display_names() {
        assert_eq!("No Buff".parse::<PetBuffLevel>().unwrap(), PetBuffLevel::NONE);
        assert_eq!("Level 7".parse::<PetBuffLevel>().unwrap().bonus(), 10_500);
        assert_eq!("4".parse::<PetBuffLevel>().unwrap().level(), 4);
        assert!("Level 12".parse::<PetBuffLevel>().is_err());
        assert_eq!(PetBuffLevel::new(2).unwrap().to_string(), "Level 2");
    }

    #[test]
    fn effective_size_is_repeatable() {
        let buffs = BuffConfiguration::new(PetBuffLevel::new(10).unwrap(), CityBuff::Ten, false);
        assert_eq!(
            effective_march_size(2_345, &buffs),
            effective_march_size(2_345, &buffs)
        );
    }
}

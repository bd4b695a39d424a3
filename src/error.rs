use thiserror::Error;

use crate::troops::TroopType;

/// Failures raised by march generation. Any of these aborts the whole call.
#[derive(Debug, Error, PartialEq)]
pub enum AllocationError {
    #[error("at least one march is required")]
    NoMarches,
    #[error("{marches} marches of {march_size} troops exceed the supported range")]
    CapacityOverflow { marches: usize, march_size: u64 },
    #[error("expected {expected} march ratios, got {got}")]
    RatioCountMismatch { expected: usize, got: usize },
    #[error("March {march} ratios must total 100% (got {total:.2}%)")]
    RatioValidation { march: usize, total: f64 },
    #[error("March {march} has an invalid {troop} percentage: {value}")]
    InvalidPercentage {
        march: usize,
        troop: TroopType,
        value: f64,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BuffError {
    #[error("unknown pet buff level '{0}' (expected 0-10 or 'No Buff'/'Level N')")]
    UnknownPetLevel(String),
    #[error("unsupported city buff {0}% (expected 0, 10 or 20)")]
    UnsupportedCityBuff(u32),
    #[error("buffed march size for base {base_size} exceeds the supported range")]
    CapacityOverflow { base_size: u64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresetError {
    #[error("unknown formation preset '{0}'")]
    Unknown(String),
}

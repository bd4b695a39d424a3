//! Splitting a troop inventory across marches.
//!
//! Two entry points share one [`Allocator`]:
//! - [`Allocator::generate_marches`] fills each march from an explicit ratio,
//!   consuming the inventory march by march.
//! - [`Allocator::optimize_ratio`] derives a whole-percent ratio that the
//!   inventory can actually sustain, starting from a [`FormationPreset`].

use log::debug;
use serde::Serialize;

use crate::{
    buffs::BuffConfiguration,
    error::{AllocationError, BuffError},
    ratio::{FormationPreset, RatioSpec, FULL_PERCENTAGE},
    troops::{TroopInventory, TroopType},
};

/// Troops placed in a single march.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarchAssignment {
    #[serde(flatten)]
    pub troops: TroopInventory,
    pub total: u64,
}

impl MarchAssignment {
    fn from_troops(troops: TroopInventory) -> Self {
        Self {
            troops,
            total: troops.total(),
        }
    }

    pub fn get(&self, troop: TroopType) -> u64 {
        self.troops[troop]
    }
}

/// Result of a full generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarchPlan {
    pub effective_march_size: u64,
    pub marches: Vec<MarchAssignment>,
    /// Inventory left once every march has been filled.
    pub remaining: TroopInventory,
}

/// Whole-number percentages produced by the optimizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatioPercentages {
    pub infantry: u32,
    pub lancer: u32,
    pub marksman: u32,
}

impl RatioPercentages {
    pub fn get(&self, troop: TroopType) -> u32 {
        match troop {
            TroopType::Infantry => self.infantry,
            TroopType::Lancer => self.lancer,
            TroopType::Marksman => self.marksman,
        }
    }

    fn get_mut(&mut self, troop: TroopType) -> &mut u32 {
        match troop {
            TroopType::Infantry => &mut self.infantry,
            TroopType::Lancer => &mut self.lancer,
            TroopType::Marksman => &mut self.marksman,
        }
    }

    pub fn total(&self) -> u32 {
        self.infantry + self.lancer + self.marksman
    }

    pub fn is_zero(&self) -> bool {
        self.total() == 0
    }

    pub fn to_ratio(&self) -> RatioSpec {
        RatioSpec::new(
            f64::from(self.infantry),
            f64::from(self.lancer),
            f64::from(self.marksman),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OptimizedRatio {
    pub preset: FormationPreset,
    pub percentages: RatioPercentages,
    /// Troops the optimizer committed per type before converting to percent.
    pub assigned: TroopInventory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocator {
    effective_march_size: u64,
}

impl Allocator {
    pub fn new(effective_march_size: u64) -> Self {
        Self {
            effective_march_size,
        }
    }

    pub fn from_buffs(base_march_size: u64, buffs: &BuffConfiguration) -> Result<Self, BuffError> {
        buffs.effective_march_size(base_march_size).map(Self::new)
    }

    pub fn effective_march_size(&self) -> u64 {
        self.effective_march_size
    }

    pub fn generate_marches(
        &self,
        num_marches: usize,
        inventory: &TroopInventory,
        ratios: &[RatioSpec],
    ) -> Result<Vec<MarchAssignment>, AllocationError> {
        self.generate_plan(num_marches, inventory, ratios)
            .map(|plan| plan.marches)
    }

    /// Fills `num_marches` marches in order, one ratio per march.
    ///
    /// Every ratio is validated before any troops move, so an invalid ratio
    /// fails the whole call. The caller's inventory is never touched.
    pub fn generate_plan(
        &self,
        num_marches: usize,
        inventory: &TroopInventory,
        ratios: &[RatioSpec],
    ) -> Result<MarchPlan, AllocationError> {
        if num_marches == 0 {
            return Err(AllocationError::NoMarches);
        }
        if ratios.len() != num_marches {
            return Err(AllocationError::RatioCountMismatch {
                expected: num_marches,
                got: ratios.len(),
            });
        }
        for (index, ratio) in ratios.iter().enumerate() {
            ratio.validate(index + 1)?;
        }

        let mut remaining = *inventory;
        let marches = ratios
            .iter()
            .enumerate()
            .map(|(index, ratio)| self.fill_march(index + 1, ratio, &mut remaining))
            .collect();

        Ok(MarchPlan {
            effective_march_size: self.effective_march_size,
            marches,
            remaining,
        })
    }

    fn fill_march(
        &self,
        march: usize,
        ratio: &RatioSpec,
        remaining: &mut TroopInventory,
    ) -> MarchAssignment {
        let size = self.effective_march_size;
        let mut troops = TroopInventory::default();

        for troop in TroopType::ALL {
            let requested = ceil_share(ratio.get(troop), size);
            troops[troop] = remaining.take(troop, requested);
        }

        // Rounded-up shares of a near-u64::MAX march can sum past u64.
        let filled: u128 = TroopType::ALL
            .into_iter()
            .map(|troop| u128::from(troops[troop]))
            .sum();
        let capacity = u128::from(size);
        if filled > capacity {
            // Trimmed troops stay out of the pool; only the march total shrinks.
            let mut overflow = filled - capacity;
            debug!("march {march}: trimming {overflow} over capacity {size}");
            for troop in ratio.ascending_priority() {
                if overflow == 0 {
                    break;
                }
                let reducible = u128::from(troops[troop]).min(overflow);
                troops[troop] -= reducible as u64;
                overflow -= reducible;
            }
        } else if filled < capacity {
            let mut shortfall = (capacity - filled) as u64;
            debug!("march {march}: backfilling {shortfall} under capacity {size}");
            for troop in ratio.descending_priority() {
                if shortfall == 0 {
                    break;
                }
                let extra = remaining.take(troop, shortfall);
                troops[troop] += extra;
                shortfall -= extra;
            }
        }

        let assignment = MarchAssignment::from_troops(troops);
        debug!(
            "march {march}: infantry={} lancer={} marksman={} total={}",
            assignment.troops.infantry,
            assignment.troops.lancer,
            assignment.troops.marksman,
            assignment.total
        );
        assignment
    }

    /// Derives whole percentages, summing to 100, that `inventory` can sustain
    /// across `num_marches` full marches, favouring the preset's largest shares.
    ///
    /// Returns all zeros when nothing can be assigned.
    pub fn optimize_ratio(
        &self,
        num_marches: usize,
        inventory: &TroopInventory,
        preset: FormationPreset,
    ) -> Result<OptimizedRatio, AllocationError> {
        if num_marches == 0 {
            return Err(AllocationError::NoMarches);
        }
        let base = preset.ratio();
        let total_needed = u64::try_from(num_marches)
            .ok()
            .and_then(|marches| marches.checked_mul(self.effective_march_size))
            .ok_or(AllocationError::CapacityOverflow {
                marches: num_marches,
                march_size: self.effective_march_size,
            })?;
        let priority = base.descending_priority();

        let mut available = *inventory;
        let mut assigned = TroopInventory::default();
        let mut remaining = total_needed;

        for troop in priority {
            let ideal = ceil_share(base.get(troop), total_needed);
            let give = available.take(troop, ideal.min(remaining));
            assigned[troop] = give;
            remaining -= give;
            if remaining == 0 {
                break;
            }
        }

        if remaining > 0 {
            for troop in priority {
                let extra = available.take(troop, remaining);
                assigned[troop] += extra;
                remaining -= extra;
                if remaining == 0 {
                    break;
                }
            }
        }
        debug!(
            "optimize {preset}: needed {total_needed}, assigned {:?}, unfilled {remaining}",
            assigned
        );

        Ok(OptimizedRatio {
            preset,
            percentages: whole_percentages(&assigned),
            assigned,
        })
    }
}

/// `ceil(percent / 100 * size)`, evaluated in floating point.
fn ceil_share(percent: f64, size: u64) -> u64 {
    ((percent / FULL_PERCENTAGE) * size as f64).ceil() as u64
}

/// Floors each share to a whole percent, then hands the missing points to the
/// types with the largest fractional parts.
fn whole_percentages(assigned: &TroopInventory) -> RatioPercentages {
    let total = assigned.total();
    let mut percentages = RatioPercentages::default();
    if total == 0 {
        return percentages;
    }

    let exact = |troop: TroopType| (assigned[troop] as f64 / total as f64) * FULL_PERCENTAGE;
    for troop in TroopType::ALL {
        *percentages.get_mut(troop) = exact(troop).floor() as u32;
    }

    let missing = 100u32.saturating_sub(percentages.total());
    if missing > 0 {
        let mut by_fraction = TroopType::ALL;
        let fraction = |troop: TroopType| exact(troop) - f64::from(percentages.get(troop));
        by_fraction.sort_by(|a, b| {
            fraction(*b)
                .partial_cmp(&fraction(*a))
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        for step in 0..missing as usize {
            *percentages.get_mut(by_fraction[step % by_fraction.len()]) += 1;
        }
    }
    percentages
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bear() -> RatioSpec {
        RatioSpec::new(10.0, 30.0, 60.0)
    }

    #[test]
    fn exact_fit_uses_requested_counts() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(1_000, 1_000, 1_000);
        let marches = allocator.generate_marches(1, &stock, &[bear()]).unwrap();
        assert_eq!(marches[0].troops, TroopInventory::new(100, 300, 600));
        assert_eq!(marches[0].total, 1_000);
    }

    #[test]
    fn shortfall_goes_to_largest_share_first() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(50, 1_000, 1_000);
        let marches = allocator.generate_marches(1, &stock, &[bear()]).unwrap();
        assert_eq!(marches[0].troops, TroopInventory::new(50, 300, 650));
        assert_eq!(marches[0].total, 1_000);
    }

    #[test]
    fn rounding_overflow_trims_smallest_share_first() {
        // 33.33% and 33.34% of 1_000 both round up to 334.
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(5_000, 5_000, 5_000);
        let ratio = RatioSpec::new(33.33, 33.33, 33.34);
        let plan = allocator.generate_plan(1, &stock, &[ratio]).unwrap();
        assert_eq!(plan.marches[0].troops, TroopInventory::new(332, 334, 334));
        assert_eq!(plan.marches[0].total, 1_000);
        // Trimmed troops are not handed back to the pool.
        assert_eq!(plan.remaining, TroopInventory::new(4_666, 4_666, 4_666));
    }

    #[test]
    fn later_marches_see_only_leftovers() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(150, 500, 2_000);
        let plan = allocator
            .generate_plan(2, &stock, &bear().repeat(2))
            .unwrap();
        assert_eq!(plan.marches[0].troops, TroopInventory::new(100, 300, 600));
        // 50 infantry and 200 lancers remain; marksman absorbs the gap.
        assert_eq!(plan.marches[1].troops, TroopInventory::new(50, 200, 750));
        assert_eq!(plan.remaining, TroopInventory::new(0, 0, 650));
    }

    #[test]
    fn short_inventory_leaves_march_under_capacity() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(100, 100, 100);
        let marches = allocator.generate_marches(1, &stock, &[bear()]).unwrap();
        assert_eq!(marches[0].troops, TroopInventory::new(100, 100, 100));
        assert_eq!(marches[0].total, 300);
    }

    #[test]
    fn invalid_ratio_fails_whole_call() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(1_000, 1_000, 1_000);
        let ratios = [bear(), RatioSpec::new(50.0, 30.0, 21.0)];
        let err = allocator.generate_marches(2, &stock, &ratios).unwrap_err();
        assert_eq!(
            err,
            AllocationError::RatioValidation {
                march: 2,
                total: 101.0
            }
        );
    }

    #[test]
    fn ratio_count_must_match_marches() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::default();
        assert_eq!(
            allocator.generate_marches(3, &stock, &[bear()]),
            Err(AllocationError::RatioCountMismatch {
                expected: 3,
                got: 1
            })
        );
        assert_eq!(
            allocator.generate_marches(0, &stock, &[]),
            Err(AllocationError::NoMarches)
        );
    }

    #[test]
    fn optimizer_follows_preset_when_stock_allows() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(10_000, 10_000, 10_000);
        let result = allocator
            .optimize_ratio(2, &stock, FormationPreset::Bear)
            .unwrap();
        assert_eq!(result.assigned, TroopInventory::new(200, 600, 1_200));
        assert_eq!(
            result.percentages,
            RatioPercentages {
                infantry: 10,
                lancer: 30,
                marksman: 60
            }
        );
    }

    #[test]
    fn optimizer_shifts_toward_available_types() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(1_000, 1_000, 300);
        let result = allocator
            .optimize_ratio(1, &stock, FormationPreset::Bear)
            .unwrap();
        // marksman 300, lancer 300, infantry 100, then lancer soaks up 300 more.
        assert_eq!(result.assigned, TroopInventory::new(100, 600, 300));
        assert_eq!(
            result.percentages,
            RatioPercentages {
                infantry: 10,
                lancer: 60,
                marksman: 30
            }
        );
    }

    #[test]
    fn optimizer_remainder_goes_to_largest_fraction() {
        let allocator = Allocator::new(1_000);
        let stock = TroopInventory::new(1, 1, 1);
        let result = allocator
            .optimize_ratio(1, &stock, FormationPreset::Bear)
            .unwrap();
        assert_eq!(result.percentages.total(), 100);
        assert_eq!(
            result.percentages,
            RatioPercentages {
                infantry: 34,
                lancer: 33,
                marksman: 33
            }
        );
    }

    #[test]
    fn optimizer_reports_total_past_u64() {
        let allocator = Allocator::new(u64::MAX / 2);
        let stock = TroopInventory::new(1_000, 1_000, 1_000);
        assert_eq!(
            allocator.optimize_ratio(3, &stock, FormationPreset::Bear),
            Err(AllocationError::CapacityOverflow {
                marches: 3,
                march_size: u64::MAX / 2
            })
        );
    }

    #[test]
    fn full_width_march_fills_exactly() {
        let allocator = Allocator::new(u64::MAX);
        let stock = TroopInventory::new(u64::MAX, u64::MAX, u64::MAX);
        let marches = allocator.generate_marches(1, &stock, &[bear()]).unwrap();
        assert_eq!(marches[0].total, u64::MAX);
    }

    #[test]
    fn from_buffs_surfaces_overflow() {
        let buffs = BuffConfiguration::new(
            crate::buffs::PetBuffLevel::new(1).unwrap(),
            crate::buffs::CityBuff::Twenty,
            false,
        );
        assert!(Allocator::from_buffs(u64::MAX / 10, &buffs).is_ok());
        assert_eq!(
            Allocator::from_buffs(u64::MAX, &buffs),
            Err(BuffError::CapacityOverflow {
                base_size: u64::MAX
            })
        );
    }

    #[test]
    fn optimizer_returns_zeros_for_empty_stock() {
        let allocator = Allocator::new(1_000);
        let result = allocator
            .optimize_ratio(3, &TroopInventory::default(), FormationPreset::Garrison)
            .unwrap();
        assert!(result.percentages.is_zero());
    }
}

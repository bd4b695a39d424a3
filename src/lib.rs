pub mod allocator;
pub mod buffs;
pub mod error;
pub mod plan;
pub mod ratio;
pub mod report;
pub mod troops;

pub use allocator::{Allocator, MarchAssignment, MarchPlan, OptimizedRatio, RatioPercentages};
pub use buffs::{effective_march_size, BuffConfiguration, CityBuff, PetBuffLevel};
pub use error::AllocationError;
pub use plan::{Plan, PlanLoader};
pub use ratio::{FormationPreset, RatioSpec};
pub use troops::{TroopInventory, TroopType};

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::{
    allocator::{Allocator, MarchPlan, OptimizedRatio},
    buffs::{BuffBreakdown, BuffConfiguration, CityBuff, PetBuffLevel},
    ratio::{FormationPreset, RatioSpec},
    troops::TroopInventory,
};

fn default_base_march_size() -> u64 {
    1_000
}

fn default_marches() -> usize {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

/// A planning request as written in a YAML plan file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_base_march_size")]
    pub base_march_size: u64,
    #[serde(default)]
    pub buffs: BuffSelection,
    #[serde(default = "default_marches")]
    pub marches: usize,
    #[serde(default)]
    pub tiers: Vec<TierStock>,
    /// Ratio applied to every march.
    #[serde(default)]
    pub ratio: Option<RatioSpec>,
    /// One ratio per march; takes precedence over `ratio`.
    #[serde(default)]
    pub per_march_ratios: Vec<RatioSpec>,
    /// Preset name for the optimizer.
    #[serde(default)]
    pub optimize: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Raw buff toggles, as a player would pick them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BuffSelection {
    #[serde(default)]
    pub pet_level: PetBuffLevel,
    #[serde(default)]
    pub city_buff_10: bool,
    #[serde(default)]
    pub city_buff_20: bool,
    #[serde(default)]
    pub minister: bool,
}

impl BuffSelection {
    pub fn to_configuration(self) -> BuffConfiguration {
        BuffConfiguration::new(
            self.pet_level,
            CityBuff::from_selections(self.city_buff_10, self.city_buff_20),
            self.minister,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TierStock {
    pub tier: String,
    #[serde(default)]
    pub infantry: u64,
    #[serde(default)]
    pub lancer: u64,
    #[serde(default)]
    pub marksman: u64,
}

impl TierStock {
    pub fn troops(&self) -> TroopInventory {
        TroopInventory::new(self.infantry, self.lancer, self.marksman)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Everything computed for one plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanOutcome {
    pub name: String,
    pub marches: usize,
    pub buffs: BuffBreakdown,
    pub inventory: TroopInventory,
    /// Troops the shared ratio calls for across all marches, rounded down.
    pub requirements: Option<TroopInventory>,
    pub optimized: Option<OptimizedRatio>,
    pub generated: Option<MarchPlan>,
}

impl Plan {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("Failed to parse plan")
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize plan")
    }

    pub fn buff_configuration(&self) -> BuffConfiguration {
        self.buffs.to_configuration()
    }

    pub fn inventory(&self) -> TroopInventory {
        TroopInventory::from_tiers(self.tiers.iter().map(TierStock::troops))
    }

    pub fn preset(&self) -> Result<Option<FormationPreset>> {
        self.optimize
            .as_deref()
            .map(|name| name.parse::<FormationPreset>())
            .transpose()
            .with_context(|| format!("Invalid optimize preset in plan '{}'", self.name))
    }

    /// Explicit ratios for each march, if the plan gives any.
    pub fn explicit_ratios(&self) -> Option<Vec<RatioSpec>> {
        if !self.per_march_ratios.is_empty() {
            Some(self.per_march_ratios.clone())
        } else {
            self.ratio.map(|ratio| ratio.repeat(self.marches))
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_march_size == 0 {
            bail!("plan '{}': base_march_size must be at least 1", self.name);
        }
        if self.marches == 0 {
            bail!("plan '{}': marches must be at least 1", self.name);
        }
        if !self.per_march_ratios.is_empty() && self.per_march_ratios.len() != self.marches {
            bail!(
                "plan '{}': {} per-march ratios given for {} marches",
                self.name,
                self.per_march_ratios.len(),
                self.marches
            );
        }
        if self.explicit_ratios().is_none() && self.optimize.is_none() {
            bail!(
                "plan '{}': needs a ratio, per_march_ratios or an optimize preset",
                self.name
            );
        }
        self.preset()?;
        Ok(())
    }

    /// Runs the optimizer (when a preset is named) and march generation.
    ///
    /// Without explicit ratios the marches are built from the optimized
    /// percentages, unless the optimizer had no troops to work with.
    pub fn execute(&self) -> Result<PlanOutcome> {
        self.validate()?;
        let buffs = self.buff_configuration();
        let allocator = Allocator::from_buffs(self.base_march_size, &buffs)
            .with_context(|| format!("Invalid march size in plan '{}'", self.name))?;
        let inventory = self.inventory();

        let optimized = match self.preset()? {
            Some(preset) => Some(
                allocator
                    .optimize_ratio(self.marches, &inventory, preset)
                    .with_context(|| format!("Failed to optimize plan '{}'", self.name))?,
            ),
            None => None,
        };

        let ratios = self.explicit_ratios().or_else(|| {
            optimized
                .filter(|result| !result.percentages.is_zero())
                .map(|result| result.percentages.to_ratio().repeat(self.marches))
        });

        let generated = match ratios {
            Some(ratios) => Some(
                allocator
                    .generate_plan(self.marches, &inventory, &ratios)
                    .with_context(|| format!("Failed to generate marches for '{}'", self.name))?,
            ),
            None => None,
        };

        let requirements = self
            .ratio
            .filter(|_| self.per_march_ratios.is_empty())
            .map(|ratio| ratio.requirements(allocator.effective_march_size(), self.marches));

        Ok(PlanOutcome {
            name: self.name.clone(),
            marches: self.marches,
            buffs: buffs.breakdown(self.base_march_size)?,
            inventory,
            requirements,
            optimized,
            generated,
        })
    }
}

pub struct PlanLoader {
    base_dir: PathBuf,
}

impl PlanLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Plan> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read plan file {}", path.display()))?;
        let plan: Plan = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(plan)
    }
}

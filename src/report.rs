//! Human-readable and JSON renderings of a plan outcome.

use std::fmt::Write as _;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    allocator::{MarchAssignment, OptimizedRatio},
    buffs::{BuffBreakdown, PetBuffLevel},
    plan::PlanOutcome,
    ratio::FormationPreset,
    troops::{TroopInventory, TroopType},
};

#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub outcome: PlanOutcome,
}

impl PlanReport {
    pub fn new(outcome: PlanOutcome, generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            outcome,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn render_text(&self) -> String {
        let outcome = &self.outcome;
        let mut out = String::new();
        let _ = writeln!(out, "Plan: {}", outcome.name);
        out.push_str(&render_buffs(&outcome.buffs));
        out.push_str(&render_inventory(&outcome.inventory));
        if let Some(needs) = &outcome.requirements {
            let _ = writeln!(
                out,
                "Needs for {} marches: Infantry = {}, Lancer = {}, Marksman = {}",
                outcome.marches, needs.infantry, needs.lancer, needs.marksman
            );
        }
        if let Some(optimized) = &outcome.optimized {
            out.push_str(&render_optimized(optimized));
        }
        if let Some(generated) = &outcome.generated {
            out.push_str(&render_marches(&generated.marches));
            let _ = writeln!(
                out,
                "Leftover: Infantry = {}, Lancer = {}, Marksman = {}",
                generated.remaining.infantry,
                generated.remaining.lancer,
                generated.remaining.marksman
            );
        }
        out
    }
}

pub fn render_buffs(buffs: &BuffBreakdown) -> String {
    let mut out = String::from("Buffs Summary\n");
    if buffs.pet > 0 {
        let _ = writeln!(out, "  Pet Buff: {} troops", buffs.pet);
    } else {
        out.push_str("  No Pet Buff Selected\n");
    }
    if buffs.city_percent > 0 {
        let _ = writeln!(
            out,
            "  City Buff: {}% (Flat Value: {} troops)",
            buffs.city_percent, buffs.city
        );
    } else {
        out.push_str("  No City Buff Selected\n");
    }
    if buffs.minister > 0 {
        let _ = writeln!(out, "  Minister Buff: {} troops", buffs.minister);
    } else {
        out.push_str("  No Minister Buff Selected\n");
    }
    let _ = writeln!(out, "  Total Buff: {} troops", buffs.total_bonus);
    let _ = writeln!(out, "  Total Buffed March Size: {} troops", buffs.effective_size);
    out
}

pub fn render_inventory(inventory: &TroopInventory) -> String {
    let mut out = String::from("Total Available Troops\n");
    for (troop, count) in inventory.iter() {
        let _ = writeln!(out, "  Total {}: {}", troop.label(), count);
    }
    out
}

pub fn render_optimized(optimized: &OptimizedRatio) -> String {
    let mut out = format!("Optimized Troop Ratios ({})\n", optimized.preset);
    for troop in TroopType::ALL {
        let _ = writeln!(
            out,
            "  {}: {}%",
            troop.label(),
            optimized.percentages.get(troop)
        );
    }
    out
}

pub fn render_marches(marches: &[MarchAssignment]) -> String {
    let mut out = String::from("March Formation Results\n");
    for (index, march) in marches.iter().enumerate() {
        let _ = writeln!(
            out,
            "March {}: Infantry = {}, Lancer = {}, Marksman = {}, Total = {}",
            index + 1,
            march.troops.infantry,
            march.troops.lancer,
            march.troops.marksman,
            march.total
        );
    }
    out
}

/// Every preset with its default shares, then every pet level with its bonus.
pub fn render_catalog() -> String {
    let mut out = String::from("Formation Presets\n");
    for preset in FormationPreset::ALL {
        let ratio = preset.ratio();
        let _ = writeln!(
            out,
            "  {}: Infantry {}%, Lancer {}%, Marksman {}%",
            preset,
            ratio.get(TroopType::Infantry),
            ratio.get(TroopType::Lancer),
            ratio.get(TroopType::Marksman)
        );
    }
    out.push_str("Pet Buff Levels\n");
    for level in PetBuffLevel::all() {
        let _ = writeln!(out, "  {}: +{} troops", level, level.bonus());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::Plan;

    fn outcome() -> PlanOutcome {
        Plan::from_yaml_str(
            "name: report\nbuffs: { city_buff_10: true }\ntiers:\n  - { tier: T10, infantry: 1000, lancer: 1000, marksman: 1000 }\nratio: { infantry: 20, lancer: 30, marksman: 50 }\n",
        )
        .unwrap()
        .execute()
        .unwrap()
    }

    #[test]
    fn text_report_lists_each_march() {
        let report = PlanReport::new(outcome(), Utc::now());
        let text = report.render_text();
        assert!(text.contains("City Buff: 10% (Flat Value: 100 troops)"));
        assert!(text.contains("Total Buffed March Size: 1100 troops"));
        assert!(text.contains("Needs for 1 marches: Infantry = 220, Lancer = 330, Marksman = 550"));
        assert!(text.contains("March 1: Infantry = 220, Lancer = 330, Marksman = 550, Total = 1100"));
    }

    #[test]
    fn catalog_lists_presets_and_pet_levels() {
        let text = render_catalog();
        assert!(text.contains("  Bear: Infantry 10%, Lancer 30%, Marksman 60%"));
        assert!(text.contains("  No Buff: +0 troops"));
        assert!(text.contains("  Level 10: +15000 troops"));
        let rows = text.lines().filter(|line| line.starts_with("  ")).count();
        assert_eq!(rows, FormationPreset::ALL.len() + 11);
    }

    #[test]
    fn json_report_flattens_outcome() {
        let report = PlanReport::new(outcome(), Utc::now());
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["name"], "report");
        assert_eq!(value["buffs"]["effective_size"], 1_100);
        assert_eq!(value["generated"]["marches"][0]["marksman"], 550);
        assert!(value["generated_at"].is_string());
    }
}

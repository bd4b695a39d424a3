use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use march_planner::{
    buffs::{BuffConfiguration, CityBuff, PetBuffLevel},
    plan::PlanLoader,
    ratio::{FormationPreset, RatioSpec},
    report::{self, PlanReport},
    troops::TroopInventory,
    Allocator,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Troop formation builder and ratio optimizer")]
struct Cli {
    /// Log filter (e.g. `debug`); defaults to the plan's level or `info`
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a YAML plan file
    Plan {
        file: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Show the effective march size for a set of buffs
    Size {
        #[command(flatten)]
        buffs: BuffArgs,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// List formation presets and pet buff levels
    List,
    /// Derive a sustainable ratio from a formation preset
    Optimize {
        #[command(flatten)]
        buffs: BuffArgs,
        #[command(flatten)]
        troops: TroopArgs,
        /// Preset name, e.g. "Bear" or "marksman-rush"
        #[arg(long)]
        preset: String,
        /// Fall back to Balanced when the preset name is not recognized
        #[arg(long)]
        lenient: bool,
        #[arg(long, default_value_t = 1)]
        marches: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Fill marches from explicit ratios
    Generate {
        #[command(flatten)]
        buffs: BuffArgs,
        #[command(flatten)]
        troops: TroopArgs,
        #[arg(long, default_value_t = 1)]
        marches: usize,
        /// `infantry,lancer,marksman` percentages; give once for every march
        /// or once per march
        #[arg(long = "ratio", value_parser = parse_ratio, required = true)]
        ratios: Vec<RatioSpec>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Args)]
struct BuffArgs {
    /// Base march capacity before buffs
    #[arg(long, default_value_t = 1_000)]
    base: u64,
    /// Pet buff level, 0-10 or "Level N"
    #[arg(long, default_value = "0")]
    pet_level: PetBuffLevel,
    /// Apply the 10% city buff
    #[arg(long)]
    city10: bool,
    /// Apply the 20% city buff
    #[arg(long)]
    city20: bool,
    /// Apply the minister of strategy buff
    #[arg(long)]
    minister: bool,
}

impl BuffArgs {
    fn configuration(&self) -> BuffConfiguration {
        BuffConfiguration::new(
            self.pet_level,
            CityBuff::from_selections(self.city10, self.city20),
            self.minister,
        )
    }
}

#[derive(Debug, Args)]
struct TroopArgs {
    /// Stock for one tier as `infantry,lancer,marksman`; repeat per tier
    #[arg(long = "tier", value_parser = parse_tier, required = true)]
    tiers: Vec<TroopInventory>,
}

impl TroopArgs {
    fn inventory(&self) -> TroopInventory {
        TroopInventory::from_tiers(self.tiers.iter().copied())
    }
}

fn split_triple(value: &str) -> Result<[&str; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    match parts.as_slice() {
        [a, b, c] => Ok([*a, *b, *c]),
        _ => Err(format!("expected three comma-separated values, got '{value}'")),
    }
}

fn parse_ratio(value: &str) -> Result<RatioSpec, String> {
    let [a, b, c] = split_triple(value)?;
    let num = |s: &str| s.parse::<f64>().map_err(|err| format!("'{s}': {err}"));
    Ok(RatioSpec::new(num(a)?, num(b)?, num(c)?))
}

fn parse_tier(value: &str) -> Result<TroopInventory, String> {
    let [a, b, c] = split_triple(value)?;
    let num = |s: &str| s.parse::<u64>().map_err(|err| format!("'{s}': {err}"));
    Ok(TroopInventory::new(num(a)?, num(b)?, num(c)?))
}

fn init_logging(filter: &str) {
    env_logger::Builder::new().parse_filters(filter).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Plan { file, format } => {
            let plan = PlanLoader::new(".").load(&file)?;
            init_logging(cli.log_level.as_deref().unwrap_or(&plan.logging.level));
            let outcome = plan.execute()?;
            info!(
                "plan '{}' complete: effective march size {}",
                outcome.name, outcome.buffs.effective_size
            );
            let report = PlanReport::new(outcome, Utc::now());
            match format {
                OutputFormat::Text => print!("{}", report.render_text()),
                OutputFormat::Json => println!("{}", report.to_json()?),
            }
        }
        Command::Size { buffs, format } => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            let breakdown = buffs.configuration().breakdown(buffs.base)?;
            match format {
                OutputFormat::Text => print!("{}", report::render_buffs(&breakdown)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&breakdown)?),
            }
        }
        Command::List => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            print!("{}", report::render_catalog());
        }
        Command::Optimize {
            buffs,
            troops,
            preset,
            lenient,
            marches,
            format,
        } => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            let preset = if lenient {
                FormationPreset::lookup_or_default(&preset)
            } else {
                preset.parse()?
            };
            let allocator = Allocator::from_buffs(buffs.base, &buffs.configuration())?;
            let result = allocator.optimize_ratio(marches, &troops.inventory(), preset)?;
            match format {
                OutputFormat::Text => print!("{}", report::render_optimized(&result)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
            }
        }
        Command::Generate {
            buffs,
            troops,
            marches,
            ratios,
            format,
        } => {
            init_logging(cli.log_level.as_deref().unwrap_or("info"));
            let ratios = match ratios.as_slice() {
                [single] => single.repeat(marches),
                many if many.len() == marches => many.to_vec(),
                many => bail!("got {} ratios for {marches} marches", many.len()),
            };
            let allocator = Allocator::from_buffs(buffs.base, &buffs.configuration())?;
            let plan = allocator
                .generate_plan(marches, &troops.inventory(), &ratios)
                .context("Failed to generate marches")?;
            match format {
                OutputFormat::Text => print!("{}", report::render_marches(&plan.marches)),
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&plan)?),
            }
        }
    }
    Ok(())
}

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use rulemem_calc::PlanCalculator;
use rulemem_core::CompilationTarget;
use rulemem_rules::{load_rules, Site};

mod config;

use config::{Config, EXAMPLE_RULES};

#[derive(Parser)]
#[command(name = "rulemem", version)]
struct Cli {
    /// Path to rulemem.toml (default: ./rulemem.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default rulemem.toml and example rules.yaml
    Init {
        #[arg(long, default_value = "site")]
        name: String,
    },

    /// Print the serialized action plan for a target
    Plan {
        /// `rep:<rep-name>:<identifier>` or `layout:<identifier>`
        reference: String,
        /// Treat the item's source content as binary
        #[arg(long)]
        binary: bool,
    },

    /// Print the plan fingerprint for a target
    Fingerprint {
        reference: String,
        #[arg(long)]
        binary: bool,
    },

    /// Print snapshot definitions for an item rep
    Snapshots {
        reference: String,
        #[arg(long)]
        binary: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(p) => p,
        None => Config::config_path(&std::env::current_dir()?),
    };

    match cli.cmd {
        Command::Init { name } => init(&config_path, &name)?,
        Command::Plan { reference, binary } => {
            let calc = open(&config_path)?;
            let plan = calc.plan_for(&parse_target(&reference, binary)?)?;
            println!("{}", serde_json::to_string_pretty(&plan.serialize())?);
        }
        Command::Fingerprint { reference, binary } => {
            let calc = open(&config_path)?;
            println!("{}", calc.fingerprint_for(&parse_target(&reference, binary)?)?);
        }
        Command::Snapshots { reference, binary } => {
            let calc = open(&config_path)?;
            let target = parse_target(&reference, binary)?;
            let rep = target
                .as_item_rep()
                .with_context(|| format!("snapshot definitions need an item rep, got `{reference}`"))?;
            for def in calc.snapshot_defs_for(rep)? {
                println!("{}\t{}", def.name, if def.binary { "binary" } else { "text" });
            }
        }
    }

    Ok(())
}

fn init(config_path: &Path, name: &str) -> Result<()> {
    if config_path.exists() {
        println!("{} already exists", config_path.display());
        return Ok(());
    }
    let cfg = Config::default_for_project(name);
    cfg.save_to(config_path)?;
    let rules_path = cfg.rules_path(config_dir(config_path));
    if !rules_path.exists() {
        std::fs::write(&rules_path, EXAMPLE_RULES).with_context(|| format!("write {}", rules_path.display()))?;
    }
    println!("Initialized {}", config_path.display());
    Ok(())
}

fn open(config_path: &Path) -> Result<PlanCalculator> {
    let cfg = Config::load_from(config_path)?;
    let rules_path = cfg.rules_path(config_dir(config_path));
    let (rules, filters) = load_rules(&rules_path)?.build()?;
    tracing::debug!(project = %cfg.project.name, rules = rules.len(), filters = filters.len(), "loaded rules");
    Ok(PlanCalculator::new(Arc::new(rules), Arc::new(filters), Site::new(cfg.site)))
}

fn parse_target(reference: &str, binary: bool) -> Result<CompilationTarget> {
    let target = match CompilationTarget::from_reference(reference)? {
        CompilationTarget::ItemRep(rep) => CompilationTarget::ItemRep(rep.with_binary(binary)),
        layout => layout,
    };
    Ok(target)
}

fn config_dir(config_path: &Path) -> &Path {
    config_path.parent().unwrap_or_else(|| Path::new("."))
}

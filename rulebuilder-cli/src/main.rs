use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rulebuilder_core::logging::init_tracing;
use rulebuilder_core::BuilderConfig;
use rulebuilder_editor::{BlockTemplate, RuleBuilder};
use rulebuilder_rules::{load_document, load_rule, validate_document, Rule};

mod output;

#[derive(Parser)]
#[command(name = "rulebuilder")]
#[command(about = "Build, validate and inspect alerting rule documents", long_about = None)]
struct Cli {
    /// Field catalog file (YAML or JSON); overrides RULEBUILDER_FIELDS
    #[arg(long, global = true)]
    fields: Option<PathBuf>,
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, env = "RULEBUILDER_LOG")]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print a fresh rule with one default alert action
    New,
    /// Validate a rule document and list what is missing
    Validate {
        /// Rule document (.json, .yaml, .yml)
        file: PathBuf,
    },
    /// Print the canonical serialized form and a readable summary
    Preview {
        file: PathBuf,
    },
    /// Print the rendered block outline of a rule
    Render {
        file: PathBuf,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = BuilderConfig::from_env()?;
    if let Some(fields) = cli.fields {
        config.fields_path = Some(fields);
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    init_tracing(&config)?;

    match cli.command {
        Commands::New => {
            let mut builder = mount(&config)?;
            builder.add_block(BlockTemplate::Action);
            println!("{}", builder.preview());
        }
        Commands::Validate { file } => {
            let document = load_document(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let errors = validate_document(&document);
            output::print_validation(&file.display().to_string(), &errors);
            if !errors.is_empty() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Preview { file } => {
            let builder = open(&config, &file)?;
            output::print_preview(&builder.get_rule(), builder.preview());
        }
        Commands::Render { file } => {
            let builder = open(&config, &file)?;
            print!("{}", builder.visual());
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn mount(config: &BuilderConfig) -> anyhow::Result<RuleBuilder> {
    let builder = RuleBuilder::from_config(config, |rule: &Rule| {
        tracing::debug!(conditions = rule.conditions.condition_count(), "rule changed");
    })?;
    Ok(builder)
}

fn open(config: &BuilderConfig, file: &Path) -> anyhow::Result<RuleBuilder> {
    let rule = load_rule(file).with_context(|| format!("reading {}", file.display()))?;
    let mut builder = mount(config)?;
    builder.set_rule(&rule);
    Ok(builder)
}

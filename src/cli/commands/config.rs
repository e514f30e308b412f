//! `kct config` command - Configuration management

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{format_money, resolve_project};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::engine::pricing::{DEFAULT_FINAL_FEE_PERCENT, DEFAULT_INITIAL_FEE_PERCENT};

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Set a project configuration key (e.g. pricing.default_markup_percent 25)
    Set(SetArgs),
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Dotted key path (author, editor, pricing.default_markup_percent, ...)
    pub key: String,

    /// Value to set
    pub value: String,
}

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ConfigCommands::Show => run_show(global),
        ConfigCommands::Set(args) => run_set(args, global),
    }
}

fn run_show(global: &GlobalOpts) -> Result<()> {
    let config = Config::load();
    let pricing = config.pricing();

    if global.format == OutputFormat::Json {
        let json = serde_json::json!({
            "author": config.author(),
            "editor": config.editor(),
            "pricing": pricing,
        });
        println!("{}", serde_json::to_string_pretty(&json).into_diagnostic()?);
        return Ok(());
    }

    println!("{}: {}", style("Author").bold(), config.author());
    println!("{}: {}", style("Editor").bold(), config.editor());
    println!();
    println!("{}", style("Pricing").bold());
    println!(
        "  default_markup_percent: {}%",
        pricing.default_markup_percent
    );
    println!(
        "  initial fee: {}% of fee base, clamp [{}, {}]",
        pricing
            .initial_fee_percent
            .unwrap_or(DEFAULT_INITIAL_FEE_PERCENT),
        format_money(pricing.initial_fee_min.unwrap_or(0.0)),
        pricing
            .initial_fee_max
            .map(format_money)
            .unwrap_or_else(|| "unbounded".to_string())
    );
    println!(
        "  final fee: {}% of fee base, clamp [{}, {}]",
        pricing
            .final_fee_percent
            .unwrap_or(DEFAULT_FINAL_FEE_PERCENT),
        format_money(pricing.final_fee_min.unwrap_or(0.0)),
        pricing
            .final_fee_max
            .map(format_money)
            .unwrap_or_else(|| "unbounded".to_string())
    );
    println!(
        "  scope synthesis: subcontractor={} equipment={} additional={}",
        pricing.include_subcontractor_scope,
        pricing.include_equipment_scope,
        pricing.include_additional_scope
    );
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config_path = project.kct_dir().join("config.yaml");

    let contents = std::fs::read_to_string(&config_path).unwrap_or_default();
    let mut root: serde_yml::Value = if contents.trim().is_empty() {
        serde_yml::Value::Mapping(serde_yml::Mapping::new())
    } else {
        serde_yml::from_str(&contents).into_diagnostic()?
    };

    set_key(&mut root, &args.key, coerce_value(&args.value))?;

    let yaml = serde_yml::to_string(&root).into_diagnostic()?;
    std::fs::write(&config_path, yaml).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Set {} = {} in {}",
            style("✓").green(),
            style(&args.key).yellow(),
            args.value,
            style(config_path.display()).dim()
        );
    }
    Ok(())
}

/// Interpret a CLI value as bool, number, null, or string
fn coerce_value(raw: &str) -> serde_yml::Value {
    match raw {
        "true" => serde_yml::Value::Bool(true),
        "false" => serde_yml::Value::Bool(false),
        "null" | "~" => serde_yml::Value::Null,
        _ => {
            if let Ok(n) = raw.parse::<f64>() {
                serde_yml::Value::Number(serde_yml::Number::from(n))
            } else {
                serde_yml::Value::String(raw.to_string())
            }
        }
    }
}

/// Walk a dotted key path, creating intermediate mappings as needed
fn set_key(root: &mut serde_yml::Value, key: &str, value: serde_yml::Value) -> Result<()> {
    let mut current = root;
    let segments: Vec<&str> = key.split('.').collect();

    for (i, segment) in segments.iter().enumerate() {
        let mapping = current
            .as_mapping_mut()
            .ok_or_else(|| miette::miette!("'{}' is not a mapping", segments[..i].join(".")))?;
        let entry_key = segment.to_string();

        if i == segments.len() - 1 {
            mapping.insert(entry_key, value);
            return Ok(());
        }

        current = mapping
            .entry(entry_key)
            .or_insert_with(|| serde_yml::Value::Mapping(serde_yml::Mapping::new()));
    }

    Ok(())
}

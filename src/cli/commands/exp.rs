//! `kct exp` command - Expense line item management

use clap::{Subcommand, ValueEnum};
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;

use crate::cli::helpers::{escape_csv, format_money, format_short_id, resolve_project, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::{find_entity_file, load_expense_sheet, save_entity};
use crate::core::Config;
use crate::engine::costs::{aggregate, line_cost};
use crate::entities::expense::{parse_amount, ExpenseCategory, ExpenseLineItem};

#[derive(Subcommand, Debug)]
pub enum ExpCommands {
    /// Record a new expense line item
    Add(AddArgs),

    /// List expenses with per-category totals
    List(ListArgs),

    /// Remove an expense line item
    Rm(RmArgs),
}

/// Category filter
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CategoryFilter {
    Subcontractor,
    Equipment,
    Material,
    Additional,
    All,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Expense name/description
    pub name: String,

    /// Category (subcontractor_fee/equipment/material/additional)
    #[arg(long, short = 'c', default_value = "additional")]
    pub category: String,

    /// Expected (estimated) amount, e.g. 1200 or "$1,200.50"
    #[arg(long, short = 'e')]
    pub expected: Option<String>,

    /// Actual amount once known
    #[arg(long, short = 'a')]
    pub actual: Option<String>,

    /// Quantity, for items billed per unit
    #[arg(long)]
    pub qty: Option<f64>,

    /// Unit the quantity is expressed in (e.g. day, ton)
    #[arg(long)]
    pub unit: Option<String>,

    /// Vendor/inventory record this expense came from
    #[arg(long)]
    pub vendor_ref: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by category
    #[arg(long, short = 'c', default_value = "all")]
    pub category: CategoryFilter,

    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Expense ID or prefix
    pub id: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub fn run(cmd: ExpCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ExpCommands::Add(args) => run_add(args, global),
        ExpCommands::List(args) => run_list(args, global),
        ExpCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();

    let category: ExpenseCategory = args
        .category
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;

    let mut item = ExpenseLineItem::new(args.name, category, config.author());
    item.expected = args.expected.as_deref().and_then(parse_amount);
    item.actual = args.actual.as_deref().and_then(parse_amount);
    item.quantity = args.qty;
    item.unit = args.unit;
    item.vendor_ref = args.vendor_ref;

    let dir = project.expense_directory(category);
    let path = dir.join(format!("{}.kct.yaml", item.id));
    save_entity(&path, &item)?;

    if !global.quiet {
        println!(
            "{} Recorded {} expense {} ({})",
            style("✓").green(),
            category,
            style(format_short_id(&item.id)).cyan(),
            format_money(line_cost(&item))
        );
        println!("   {}", style(path.display()).dim());
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let sheet = load_expense_sheet(&project)?;

    let items: Vec<&ExpenseLineItem> = match args.category {
        CategoryFilter::Subcontractor => sheet.subcontractor_fees.iter().collect(),
        CategoryFilter::Equipment => sheet.equipment.iter().collect(),
        CategoryFilter::Material => sheet.materials.iter().collect(),
        CategoryFilter::Additional => sheet.additional.iter().collect(),
        CategoryFilter::All => sheet.iter_all().collect(),
    };

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }

    if items.is_empty() {
        match global.format {
            OutputFormat::Json | OutputFormat::Yaml => println!("[]"),
            _ => {
                println!("No expenses found.");
                println!();
                println!("Record one with: {}", style("kct exp add").yellow());
            }
        }
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&items).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&items).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Csv => {
            println!("id,category,name,expected,actual,cost");
            for item in &items {
                println!(
                    "{},{},{},{},{},{}",
                    item.id,
                    item.category,
                    escape_csv(&item.name),
                    item.expected.map(|v| v.to_string()).unwrap_or_default(),
                    item.actual.map(|v| v.to_string()).unwrap_or_default(),
                    line_cost(item)
                );
            }
        }
        OutputFormat::Id => {
            for item in &items {
                println!("{}", item.id);
            }
        }
        OutputFormat::Md => {
            println!("| ID | Category | Name | Cost |");
            println!("|---|---|---|---|");
            for item in &items {
                println!(
                    "| {} | {} | {} | {} |",
                    format_short_id(&item.id),
                    item.category,
                    item.name,
                    format_money(line_cost(item))
                );
            }
        }
        _ => {
            println!(
                "{:<16} {:<18} {:<32} {:>12} {:>12}",
                style("ID").bold(),
                style("CATEGORY").bold(),
                style("NAME").bold(),
                style("EXPECTED").bold(),
                style("COST").bold()
            );
            println!("{}", "-".repeat(94));

            for item in &items {
                println!(
                    "{:<16} {:<18} {:<32} {:>12} {:>12}",
                    format_short_id(&item.id),
                    item.category.to_string(),
                    truncate_str(&item.name, 30),
                    item.expected
                        .map(format_money)
                        .unwrap_or_else(|| "-".to_string()),
                    format_money(line_cost(item))
                );
            }

            let summary = aggregate(&sheet);
            println!();
            println!(
                "Subcontractor {}  Equipment {}  Materials {}  Additional {}",
                format_money(summary.subcontractor),
                format_money(summary.equipment),
                format_money(summary.material),
                format_money(summary.additional)
            );
            println!(
                "{} expense(s), total cost {}",
                style(items.len()).cyan(),
                style(format_money(summary.total)).green()
            );
        }
    }

    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;

    let categories = [
        ExpenseCategory::SubcontractorFee,
        ExpenseCategory::Equipment,
        ExpenseCategory::Material,
        ExpenseCategory::Additional,
    ];
    let path = categories
        .iter()
        .find_map(|c| find_entity_file(&project.expense_directory(*c), &args.id))
        .ok_or_else(|| miette::miette!("No expense found matching '{}'", args.id))?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove {}?", path.display()))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    fs::remove_file(&path).into_diagnostic()?;
    if !global.quiet {
        println!(
            "{} Removed {}",
            style("✓").green(),
            style(path.display()).dim()
        );
    }
    Ok(())
}

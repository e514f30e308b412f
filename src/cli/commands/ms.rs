//! `kct ms` command - Payment milestone management
//!
//! All subcommands operate on one document's embedded milestone list and
//! re-resolve prices from the current expense sheet and pricing config on
//! every invocation.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::doc::{find_document, save_document};
use crate::cli::helpers::{format_money, format_short_id, resolve_project, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::load_expense_sheet;
use crate::core::Config;
use crate::engine::costs::aggregate;
use crate::engine::ordering::{move_item, renumber};
use crate::engine::pricing::{fee_base, resolve_price};
use crate::engine::totals::compute_totals;
use crate::entities::document::Document;
use crate::entities::expense::parse_amount;
use crate::entities::milestone::{Milestone, MilestoneType};

#[derive(Subcommand, Debug)]
pub enum MsCommands {
    /// Add a milestone to a document
    Add(AddArgs),

    /// List a document's milestones with resolved prices
    List(ListArgs),

    /// Edit a milestone's name, cost, or markup
    Edit(EditArgs),

    /// Set or clear a flat price override
    Override(OverrideArgs),

    /// Remove a milestone
    Rm(RmArgs),

    /// Move a milestone to a new position (stable reorder)
    Move(MoveArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Document ID or prefix
    pub doc: String,

    /// Milestone name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Milestone type (default: custom)
    #[arg(long, short = 't', default_value = "custom")]
    pub r#type: String,

    /// Cost attached to this milestone, e.g. 1200 or "$1,200.50"
    #[arg(long, short = 'c')]
    pub cost: Option<String>,

    /// Markup percent (default: the configured default at pricing time)
    #[arg(long, short = 'm')]
    pub markup: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Document ID or prefix
    pub doc: String,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Document ID or prefix
    pub doc: String,

    /// Milestone position (1-based), ID prefix, or name
    pub milestone: String,

    /// New name
    #[arg(long, short = 'n')]
    pub name: Option<String>,

    /// New cost
    #[arg(long, short = 'c')]
    pub cost: Option<String>,

    /// New markup percent
    #[arg(long, short = 'm')]
    pub markup: Option<f64>,

    /// Clear the milestone's own markup (revert to the configured default)
    #[arg(long, conflicts_with = "markup")]
    pub clear_markup: bool,
}

#[derive(clap::Args, Debug)]
pub struct OverrideArgs {
    /// Document ID or prefix
    pub doc: String,

    /// Milestone position (1-based), ID prefix, or name
    pub milestone: String,

    /// Flat price to set, e.g. 5000 or "$5,000"
    #[arg(long, short = 'p', conflicts_with = "clear")]
    pub price: Option<String>,

    /// Clear the override and revert to the computed price
    #[arg(long)]
    pub clear: bool,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Document ID or prefix
    pub doc: String,

    /// Milestone position (1-based), ID prefix, or name
    pub milestone: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct MoveArgs {
    /// Document ID or prefix
    pub doc: String,

    /// Current position (1-based)
    pub from: usize,

    /// New position (1-based)
    pub to: usize,
}

pub fn run(cmd: MsCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        MsCommands::Add(args) => run_add(args, global),
        MsCommands::List(args) => run_list(args, global),
        MsCommands::Edit(args) => run_edit(args, global),
        MsCommands::Override(args) => run_override(args, global),
        MsCommands::Rm(args) => run_rm(args, global),
        MsCommands::Move(args) => run_move(args, global),
    }
}

/// Find a milestone by 1-based position, ID prefix, or name substring
fn find_milestone_index(document: &Document, query: &str) -> Result<usize> {
    if let Ok(position) = query.parse::<usize>() {
        if position >= 1 && position <= document.milestones.len() {
            return Ok(position - 1);
        }
        return Err(miette::miette!(
            "Position {} is out of range (1-{})",
            position,
            document.milestones.len()
        ));
    }

    let matches: Vec<usize> = document
        .milestones
        .iter()
        .enumerate()
        .filter(|(_, m)| {
            m.id.to_string().starts_with(query)
                || m.name.to_lowercase().contains(&query.to_lowercase())
        })
        .map(|(i, _)| i)
        .collect();

    match matches.len() {
        0 => Err(miette::miette!("No milestone found matching '{}'", query)),
        1 => Ok(matches[0]),
        _ => Err(miette::miette!(
            "Ambiguous milestone query '{}'. Use a position or a longer ID prefix.",
            query
        )),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let (path, mut document) = find_document(&project, &args.doc)?;

    let milestone_type: MilestoneType = args
        .r#type
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;

    let mut milestone = Milestone::new(args.name, milestone_type);
    milestone.cost = args.cost.as_deref().and_then(parse_amount).unwrap_or(0.0);
    milestone.markup_percent = args.markup;
    let added_id = milestone.id.clone();

    document.milestones.push(milestone);
    renumber(&mut document.milestones);
    let position = document.milestones.len();
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Added milestone {} at position {}",
            style("✓").green(),
            style(format_short_id(&added_id)).cyan(),
            position
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();
    let pricing = config.pricing();

    let (_, document) = find_document(&project, &args.doc)?;
    let sheet = load_expense_sheet(&project)?;
    let costs = aggregate(&sheet);
    let base = fee_base(&document.milestones);

    if document.milestones.is_empty() {
        println!("No milestones on this document.");
        println!();
        println!("Add one with: {}", style("kct ms add").yellow());
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&document.milestones).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&document.milestones).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => {
            for m in &document.milestones {
                println!("{}", m.id);
            }
        }
        _ => {
            println!(
                "{:>3} {:<16} {:<28} {:<20} {:>12} {:>14}",
                style("#").bold(),
                style("ID").bold(),
                style("NAME").bold(),
                style("TYPE").bold(),
                style("COST").bold(),
                style("PRICE").bold()
            );
            println!("{}", "-".repeat(98));

            for m in &document.milestones {
                let price = resolve_price(m, &pricing, base);
                let name = if m.flat_price.is_some() {
                    format!("{} *", truncate_str(&m.name, 24))
                } else {
                    truncate_str(&m.name, 26)
                };
                println!(
                    "{:>3} {:<16} {:<28} {:<20} {:>12} {:>14}",
                    m.sequence,
                    format_short_id(&m.id),
                    name,
                    m.milestone_type.to_string(),
                    format_money(m.cost),
                    format_money(price)
                );
            }

            let totals = compute_totals(&document.milestones, &pricing, &costs);
            println!();
            println!(
                "Fee base {}   Customer total {}   Profit {} ({:.1}% margin)",
                format_money(base),
                style(format_money(totals.customer_total)).green(),
                format_money(totals.profit),
                totals.profit_margin_percent
            );
            if document.milestones.iter().any(|m| m.flat_price.is_some()) {
                println!("{}", style("* flat price override").dim());
            }
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let (path, mut document) = find_document(&project, &args.doc)?;
    let index = find_milestone_index(&document, &args.milestone)?;

    {
        let milestone = &mut document.milestones[index];
        if let Some(name) = args.name {
            milestone.name = name;
        }
        if let Some(cost) = args.cost.as_deref() {
            milestone.cost = parse_amount(cost).unwrap_or(0.0);
        }
        if args.clear_markup {
            milestone.markup_percent = None;
        } else if let Some(markup) = args.markup {
            milestone.markup_percent = Some(markup);
        }
    }
    let edited_id = document.milestones[index].id.clone();
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Updated milestone {}",
            style("✓").green(),
            style(format_short_id(&edited_id)).cyan()
        );
    }
    Ok(())
}

fn run_override(args: OverrideArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();
    let pricing = config.pricing();

    let (path, mut document) = find_document(&project, &args.doc)?;
    let index = find_milestone_index(&document, &args.milestone)?;

    if args.clear {
        document.milestones[index].flat_price = None;
    } else {
        let price = args
            .price
            .as_deref()
            .and_then(parse_amount)
            .ok_or_else(|| miette::miette!("Provide --price <amount> or --clear"))?;
        document.milestones[index].flat_price = Some(price);
    }

    let base = fee_base(&document.milestones);
    let resolved = resolve_price(&document.milestones[index], &pricing, base);
    let edited_id = document.milestones[index].id.clone();
    save_document(&path, &mut document)?;

    if !global.quiet {
        if args.clear {
            println!(
                "{} Cleared override on {}; price reverts to {}",
                style("✓").green(),
                style(format_short_id(&edited_id)).cyan(),
                format_money(resolved)
            );
        } else {
            println!(
                "{} Set flat price {} on {}",
                style("✓").green(),
                format_money(resolved),
                style(format_short_id(&edited_id)).cyan()
            );
        }
    }
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let (path, mut document) = find_document(&project, &args.doc)?;
    let index = find_milestone_index(&document, &args.milestone)?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!(
                "Remove milestone '{}'?",
                document.milestones[index].name
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = document.milestones.remove(index);
    renumber(&mut document.milestones);
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Removed milestone {}",
            style("✓").green(),
            style(&removed.name).yellow()
        );
    }
    Ok(())
}

fn run_move(args: MoveArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let (path, mut document) = find_document(&project, &args.doc)?;

    if args.from == 0 || args.to == 0 {
        return Err(miette::miette!("Positions are 1-based"));
    }
    if !move_item(&mut document.milestones, args.from - 1, args.to - 1) {
        return Err(miette::miette!(
            "Position out of range (1-{})",
            document.milestones.len()
        ));
    }
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Moved milestone from position {} to {}",
            style("✓").green(),
            args.from,
            args.to
        );
    }
    Ok(())
}

//! `kct scope` command - Scope-of-work management
//!
//! Manual items are user-owned text; the three fixed-title items are owned
//! by the synthesizer and refreshed by `kct scope sync` (and on document
//! creation).

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::doc::{find_document, save_document};
use crate::cli::helpers::{format_short_id, resolve_project, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::loader::load_expense_sheet;
use crate::core::Config;
use crate::engine::ordering::{move_item, renumber};
use crate::engine::scope::sync_scope;
use crate::entities::document::Document;
use crate::entities::scope_item::ScopeItem;

#[derive(Subcommand, Debug)]
pub enum ScopeCommands {
    /// Add a manual scope item to a document
    Add(AddArgs),

    /// List a document's scope items
    List(ListArgs),

    /// Edit a scope item's title or description
    Edit(EditArgs),

    /// Remove a scope item
    Rm(RmArgs),

    /// Move a scope item to a new position (stable reorder)
    Move(MoveArgs),

    /// Re-synthesize the auto-generated items from the expense sheet
    Sync(SyncArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Document ID or prefix
    pub doc: String,

    /// Item title
    #[arg(long, short = 't')]
    pub title: String,

    /// Item description
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,
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

    /// Item position (1-based), ID prefix, or title
    pub item: String,

    /// New title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// New description
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Document ID or prefix
    pub doc: String,

    /// Item position (1-based), ID prefix, or title
    pub item: String,

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

#[derive(clap::Args, Debug)]
pub struct SyncArgs {
    /// Document ID or prefix
    pub doc: String,
}

pub fn run(cmd: ScopeCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ScopeCommands::Add(args) => run_add(args, global),
        ScopeCommands::List(args) => run_list(args, global),
        ScopeCommands::Edit(args) => run_edit(args, global),
        ScopeCommands::Rm(args) => run_rm(args, global),
        ScopeCommands::Move(args) => run_move(args, global),
        ScopeCommands::Sync(args) => run_sync(args, global),
    }
}

/// Find a scope item by 1-based position, ID prefix, or title substring
fn find_scope_index(document: &Document, query: &str) -> Result<usize> {
    if let Ok(position) = query.parse::<usize>() {
        if position >= 1 && position <= document.scope.len() {
            return Ok(position - 1);
        }
        return Err(miette::miette!(
            "Position {} is out of range (1-{})",
            position,
            document.scope.len()
        ));
    }

    let matches: Vec<usize> = document
        .scope
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            s.id.to_string().starts_with(query)
                || s.title.to_lowercase().contains(&query.to_lowercase())
        })
        .map(|(i, _)| i)
        .collect();

    match matches.len() {
        0 => Err(miette::miette!("No scope item found matching '{}'", query)),
        1 => Ok(matches[0]),
        _ => Err(miette::miette!(
            "Ambiguous scope query '{}'. Use a position or a longer ID prefix.",
            query
        )),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let (path, mut document) = find_document(&project, &args.doc)?;

    let mut item = ScopeItem::manual(args.title, args.description);
    item.sequence = document.scope.len() as u32 + 1;
    let added_id = item.id.clone();
    document.scope.push(item);
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Added scope item {}",
            style("✓").green(),
            style(format_short_id(&added_id)).cyan()
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let (_, document) = find_document(&project, &args.doc)?;

    if document.scope.is_empty() {
        println!("No scope items on this document.");
        println!();
        println!(
            "Add one with {} or synthesize with {}",
            style("kct scope add").yellow(),
            style("kct scope sync").yellow()
        );
        return Ok(());
    }

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&document.scope).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&document.scope).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => {
            for item in &document.scope {
                println!("{}", item.id);
            }
        }
        _ => {
            println!(
                "{:>3} {:<16} {:<28} {:<8} {:<40}",
                style("#").bold(),
                style("ID").bold(),
                style("TITLE").bold(),
                style("OWNER").bold(),
                style("DESCRIPTION").bold()
            );
            println!("{}", "-".repeat(100));

            for item in &document.scope {
                let owner = if item.auto_generated { "auto" } else { "manual" };
                let description = item.description.replace('\n', " / ");
                println!(
                    "{:>3} {:<16} {:<28} {:<8} {:<40}",
                    item.sequence,
                    format_short_id(&item.id),
                    truncate_str(&item.title, 26),
                    owner,
                    truncate_str(&description, 38)
                );
            }

            println!();
            println!("{} scope item(s)", style(document.scope.len()).cyan());
        }
    }

    Ok(())
}

fn run_edit(args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let (path, mut document) = find_document(&project, &args.doc)?;
    let index = find_scope_index(&document, &args.item)?;

    {
        let item = &mut document.scope[index];
        if let Some(title) = args.title {
            // Renaming away from a fixed title hands the item back to the user
            item.title = title;
            item.auto_generated = false;
        }
        if let Some(description) = args.description {
            item.description = description;
        }
    }
    let edited_id = document.scope[index].id.clone();
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Updated scope item {}",
            style("✓").green(),
            style(format_short_id(&edited_id)).cyan()
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let (path, mut document) = find_document(&project, &args.doc)?;
    let index = find_scope_index(&document, &args.item)?;

    if !args.yes {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(format!("Remove scope item '{}'?", document.scope[index].title))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("Aborted.");
            return Ok(());
        }
    }

    let removed = document.scope.remove(index);
    renumber(&mut document.scope);
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Removed scope item {}",
            style("✓").green(),
            style(&removed.title).yellow()
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
    if !move_item(&mut document.scope, args.from - 1, args.to - 1) {
        return Err(miette::miette!(
            "Position out of range (1-{})",
            document.scope.len()
        ));
    }
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Moved scope item from position {} to {}",
            style("✓").green(),
            args.from,
            args.to
        );
    }
    Ok(())
}

fn run_sync(args: SyncArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();
    let pricing = config.pricing();

    let (path, mut document) = find_document(&project, &args.doc)?;
    let sheet = load_expense_sheet(&project)?;

    let before = document.scope.len();
    sync_scope(&mut document.scope, &sheet, &pricing);
    let appended = document.scope.len() - before;
    save_document(&path, &mut document)?;

    if !global.quiet {
        println!(
            "{} Synthesized scope from {} expense(s): {} item(s) appended, {} total",
            style("✓").green(),
            sheet.len(),
            appended,
            document.scope.len()
        );
    }
    Ok(())
}

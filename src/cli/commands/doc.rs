//! `kct doc` command - Document management
//!
//! Documents embed their milestone and scope lists; every preview, export,
//! and generation resolves prices from the current lists and the current
//! expense sheet, never from stored figures.

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_money, format_short_id, resolve_project, truncate_str};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::config::PricingConfig;
use crate::core::identity::EntityPrefix;
use crate::core::loader::{load_all, load_entity, load_expense_sheet, save_entity};
use crate::core::project::Project;
use crate::core::Config;
use crate::engine::costs::aggregate;
use crate::engine::ordering::{import_milestones, import_scope_items};
use crate::engine::pricing::{fee_base, resolve_price};
use crate::engine::totals::{authorize_generation, compute_totals, DocumentTotals};
use crate::entities::document::{Document, DocumentKind, DocumentPayload};
use crate::render::DocumentRenderer;

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// Create a document, seeded from the current expense sheet
    New(NewArgs),

    /// List documents
    List(ListArgs),

    /// Preview a document: resolved milestone prices, totals, and scope
    Show(ShowArgs),

    /// Emit the resolved save payload as JSON
    Export(ExportArgs),

    /// Generate the customer document (requires a positive total)
    Generate(GenerateArgs),

    /// Append milestones/scope items from another project's document
    Import(ImportArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Document title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Document kind (contract/proposal/change_order)
    #[arg(long, short = 'k', default_value = "proposal")]
    pub kind: String,

    /// Start empty instead of synthesizing defaults from expenses
    #[arg(long)]
    pub empty: bool,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show count only, not the items
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Document ID or prefix
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Document ID or prefix
    pub id: String,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Document ID or prefix
    pub id: String,

    /// Output path (default: generated/<id>.md)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ImportArgs {
    /// Destination document ID or prefix
    pub id: String,

    /// Root of the project to import from
    #[arg(long)]
    pub from: PathBuf,

    /// Source document ID or prefix (default: the only document)
    #[arg(long)]
    pub doc: Option<String>,

    /// Milestone positions to import, 1-based, comma-separated, or "all"
    #[arg(long)]
    pub milestones: Option<String>,

    /// Scope item positions to import, 1-based, comma-separated, or "all"
    #[arg(long)]
    pub scope: Option<String>,
}

pub fn run(cmd: DocCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        DocCommands::New(args) => run_new(args, global),
        DocCommands::List(args) => run_list(args, global),
        DocCommands::Show(args) => run_show(args, global),
        DocCommands::Export(args) => run_export(args, global),
        DocCommands::Generate(args) => run_generate(args, global),
        DocCommands::Import(args) => run_import(args, global),
    }
}

/// Find a document by ID prefix or title match
pub(crate) fn find_document(project: &Project, query: &str) -> Result<(PathBuf, Document)> {
    let dir = project.root().join("documents");

    if let Some(found) = load_entity::<Document>(&dir, query)? {
        return Ok(found);
    }

    // Fall back to a title search across all documents
    let mut matches: Vec<(PathBuf, Document)> = Vec::new();
    for doc in load_all::<Document>(&dir)? {
        if doc.title.to_lowercase().contains(&query.to_lowercase()) {
            let path = dir.join(format!("{}.kct.yaml", doc.id));
            matches.push((path, doc));
        }
    }

    match matches.len() {
        0 => Err(miette::miette!("No document found matching '{}'", query)),
        1 => Ok(matches.remove(0)),
        _ => {
            println!("{} Multiple matches found:", style("!").yellow());
            for (_, doc) in &matches {
                println!("  {} - {}", format_short_id(&doc.id), doc.title);
            }
            Err(miette::miette!(
                "Ambiguous query '{}'. Please be more specific.",
                query
            ))
        }
    }
}

/// Persist a mutated document, bumping its revision counter
pub(crate) fn save_document(path: &std::path::Path, document: &mut Document) -> Result<()> {
    document.entity_revision += 1;
    save_entity(path, document)
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();
    let pricing = config.pricing();

    let kind: DocumentKind = args
        .kind
        .parse()
        .map_err(|e: String| miette::miette!("{}", e))?;
    let title = args.title.unwrap_or_else(|| "New Document".to_string());

    let document = if args.empty {
        Document::new(kind, title, config.author())
    } else {
        let sheet = load_expense_sheet(&project)?;
        Document::with_defaults(kind, title, config.author(), &sheet, &pricing)
    };

    let path = project.entity_path(EntityPrefix::Doc, &document.id);
    save_entity(&path, &document)?;

    if !global.quiet {
        println!(
            "{} Created {} {}",
            style("✓").green(),
            document.kind,
            style(format_short_id(&document.id)).cyan()
        );
        println!(
            "   {} milestone(s), {} scope item(s)",
            document.milestones.len(),
            document.scope.len()
        );
        println!("   {}", style(path.display()).dim());
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();
    let pricing = config.pricing();

    let mut docs: Vec<Document> = load_all(&project.root().join("documents"))?;
    docs.sort_by(|a, b| a.created.cmp(&b.created));

    if args.count {
        println!("{}", docs.len());
        return Ok(());
    }

    if docs.is_empty() {
        match global.format {
            OutputFormat::Json | OutputFormat::Yaml => println!("[]"),
            _ => {
                println!("No documents found.");
                println!();
                println!("Create one with: {}", style("kct doc new").yellow());
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
            let json = serde_json::to_string_pretty(&docs).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&docs).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => {
            for doc in &docs {
                println!("{}", doc.id);
            }
        }
        _ => {
            println!(
                "{:<16} {:<13} {:<32} {:<9} {:>4} {:>14}",
                style("ID").bold(),
                style("KIND").bold(),
                style("TITLE").bold(),
                style("STATUS").bold(),
                style("MS").bold(),
                style("TOTAL").bold()
            );
            println!("{}", "-".repeat(92));

            for doc in &docs {
                let totals = document_totals(&doc.milestones, &pricing);
                println!(
                    "{:<16} {:<13} {:<32} {:<9} {:>4} {:>14}",
                    format_short_id(&doc.id),
                    doc.kind.to_string(),
                    truncate_str(&doc.title, 30),
                    doc.status.to_string(),
                    doc.milestones.len(),
                    format_money(totals)
                );
            }

            println!();
            println!("{} document(s) found", style(docs.len()).cyan());
        }
    }

    Ok(())
}

fn document_totals(milestones: &[crate::entities::Milestone], pricing: &PricingConfig) -> f64 {
    let base = fee_base(milestones);
    milestones
        .iter()
        .map(|m| resolve_price(m, pricing, base))
        .sum()
}

#[derive(Serialize)]
struct PreviewJson<'a> {
    #[serde(flatten)]
    payload: &'a DocumentPayload,
    totals: &'a DocumentTotals,
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();
    let pricing = config.pricing();

    let (_, document) = find_document(&project, &args.id)?;
    let sheet = load_expense_sheet(&project)?;
    let costs = aggregate(&sheet);
    let payload = DocumentPayload::build(&document, &pricing);
    let totals = compute_totals(&document.milestones, &pricing, &costs);

    let format = match global.format {
        OutputFormat::Auto => OutputFormat::Tsv,
        f => f,
    };

    match format {
        OutputFormat::Json => {
            let preview = PreviewJson {
                payload: &payload,
                totals: &totals,
            };
            let json = serde_json::to_string_pretty(&preview).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let yaml = serde_yml::to_string(&document).into_diagnostic()?;
            print!("{}", yaml);
        }
        OutputFormat::Id => {
            println!("{}", document.id);
        }
        OutputFormat::Md => {
            print!("{}", markdown_preview(&document, &payload, &totals));
        }
        _ => {
            human_preview(&document, &payload, &totals);
        }
    }

    Ok(())
}

fn milestone_table(payload: &DocumentPayload, table_style: &str) -> String {
    let mut builder = Builder::default();
    builder.push_record(["#", "Milestone", "Type", "Cost", "Markup", "Price"]);

    for (i, m) in payload.milestones.iter().enumerate() {
        let markup = if m.flat_price.is_some() {
            "flat".to_string()
        } else if m.milestone_type.is_fee() {
            "fee".to_string()
        } else {
            m.markup_percent
                .map(|p| format!("{}%", p))
                .unwrap_or_else(|| "default".to_string())
        };
        builder.push_record([
            (i + 1).to_string(),
            m.name.clone(),
            m.milestone_type.to_string(),
            format_money(m.cost),
            markup,
            format_money(m.customer_price),
        ]);
    }

    let mut table = builder.build();
    match table_style {
        "markdown" => table.with(Style::markdown()),
        _ => table.with(Style::rounded()),
    };
    table.to_string()
}

fn human_preview(document: &Document, payload: &DocumentPayload, totals: &DocumentTotals) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{}: {}",
        style("ID").bold(),
        style(&document.id.to_string()).cyan()
    );
    println!("{}: {}", style("Kind").bold(), document.kind);
    println!(
        "{}: {}",
        style("Title").bold(),
        style(&document.title).yellow()
    );
    println!("{}: {}", style("Status").bold(), document.status);
    println!("{}", style("─".repeat(60)).dim());
    println!();

    println!("{}", style("Payment Schedule").bold());
    println!("{}", milestone_table(payload, "rounded"));
    println!();

    println!(
        "{}: {}",
        style("Customer Total").bold(),
        style(format_money(totals.customer_total)).green()
    );
    println!(
        "{}: {}   {}: {}",
        style("Total Cost").bold(),
        format_money(totals.total_cost),
        style("Profit").bold(),
        format_money(totals.profit)
    );
    println!(
        "{}: {:.1}%   {}: {:.1}%",
        style("Margin").bold(),
        totals.profit_margin_percent,
        style("Effective Markup").bold(),
        totals.effective_markup_percent
    );
    println!();

    if !document.scope.is_empty() {
        println!("{}", style("Scope of Work").bold());
        for item in &document.scope {
            let marker = if item.auto_generated { "auto" } else { "manual" };
            println!(
                "  {}. {} {}",
                item.sequence,
                style(&item.title).yellow(),
                style(format!("({})", marker)).dim()
            );
            for line in item.description.lines() {
                println!("     {}", line);
            }
        }
    }

    println!();
    println!(
        "{}: {} | {}: {} | {}: {}",
        style("Author").dim(),
        document.author,
        style("Created").dim(),
        document.created.format("%Y-%m-%d %H:%M"),
        style("Revision").dim(),
        document.entity_revision
    );
}

fn markdown_preview(
    document: &Document,
    payload: &DocumentPayload,
    totals: &DocumentTotals,
) -> String {
    let mut output = String::new();
    output.push_str(&format!("# {}: {}\n\n", document.kind, document.title));
    output.push_str("## Payment Schedule\n\n");
    output.push_str(&milestone_table(payload, "markdown"));
    output.push('\n');
    output.push_str(&format!(
        "\n**Customer Total:** {}\n**Profit:** {} ({:.1}% margin)\n",
        format_money(totals.customer_total),
        format_money(totals.profit),
        totals.profit_margin_percent
    ));
    if !document.scope.is_empty() {
        output.push_str("\n## Scope of Work\n");
        for item in &document.scope {
            output.push_str(&format!("\n### {}\n\n{}\n", item.title, item.description));
        }
    }
    output
}

fn run_export(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();

    let (_, document) = find_document(&project, &args.id)?;
    let payload = DocumentPayload::build(&document, &config.pricing());
    let json = serde_json::to_string_pretty(&payload).into_diagnostic()?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, json).into_diagnostic()?;
            if !global.quiet {
                println!(
                    "{} Exported payload to {}",
                    style("✓").green(),
                    style(path.display()).cyan()
                );
            }
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn run_generate(args: GenerateArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();
    let pricing = config.pricing();

    let (_, document) = find_document(&project, &args.id)?;
    let sheet = load_expense_sheet(&project)?;
    let costs = aggregate(&sheet);
    let totals = compute_totals(&document.milestones, &pricing, &costs);

    // The one business-rule gate: a document that prices to nothing
    // cannot be generated.
    authorize_generation(&totals)?;

    let payload = DocumentPayload::build(&document, &pricing);
    let renderer = DocumentRenderer::new().map_err(|e| miette::miette!("{}", e))?;
    let rendered = renderer
        .render(&document, &payload, &totals)
        .map_err(|e| miette::miette!("{}", e))?;

    let output_path = match args.output {
        Some(path) => path,
        None => {
            let dir = project.generated_dir();
            std::fs::create_dir_all(&dir).into_diagnostic()?;
            dir.join(format!("{}.md", document.id))
        }
    };
    std::fs::write(&output_path, rendered).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Generated {} ({})",
            style("✓").green(),
            style(output_path.display()).cyan(),
            style(format_money(totals.customer_total)).green()
        );
    }
    Ok(())
}

fn run_import(args: ImportArgs, global: &GlobalOpts) -> Result<()> {
    let project = resolve_project(global)?;
    let config = Config::load();
    let pricing = config.pricing();

    let (dest_path, mut dest) = find_document(&project, &args.id)?;

    let source_project =
        Project::discover_from(&args.from).map_err(|e| miette::miette!("{}", e))?;
    let source = find_source_document(&source_project, args.doc.as_deref())?;

    let milestone_picks = match args.milestones.as_deref() {
        Some(spec) => parse_selection(spec, source.milestones.len())?,
        None if args.scope.is_some() => Vec::new(),
        None => prompt_selection(
            "Milestones to import",
            &source
                .milestones
                .iter()
                .map(|m| format!("{} ({})", m.name, format_money(m.cost)))
                .collect::<Vec<_>>(),
        )?,
    };
    let scope_picks = match args.scope.as_deref() {
        Some(spec) => parse_selection(spec, source.scope.len())?,
        None if args.milestones.is_some() => Vec::new(),
        None => prompt_selection(
            "Scope items to import",
            &source
                .scope
                .iter()
                .map(|s| s.title.clone())
                .collect::<Vec<_>>(),
        )?,
    };

    let picked_milestones: Vec<_> = milestone_picks
        .iter()
        .map(|&i| source.milestones[i].clone())
        .collect();
    let picked_scope: Vec<_> = scope_picks
        .iter()
        .map(|&i| source.scope[i].clone())
        .collect();

    // Appended verbatim apart from fresh ids and the current default markup;
    // no de-duplication against existing entries.
    import_milestones(
        &mut dest.milestones,
        &picked_milestones,
        pricing.default_markup_percent,
    );
    import_scope_items(&mut dest.scope, &picked_scope);
    save_document(&dest_path, &mut dest)?;

    if !global.quiet {
        println!(
            "{} Imported {} milestone(s) and {} scope item(s) from {}",
            style("✓").green(),
            picked_milestones.len(),
            picked_scope.len(),
            style(format_short_id(&source.id)).cyan()
        );
    }
    Ok(())
}

fn find_source_document(project: &Project, query: Option<&str>) -> Result<Document> {
    match query {
        Some(q) => find_document(project, q).map(|(_, d)| d),
        None => {
            let mut docs: Vec<Document> = load_all(&project.root().join("documents"))?;
            match docs.len() {
                0 => Err(miette::miette!(
                    "Source project has no documents to import from"
                )),
                1 => Ok(docs.remove(0)),
                _ => Err(miette::miette!(
                    "Source project has {} documents; pick one with --doc",
                    docs.len()
                )),
            }
        }
    }
}

/// Parse a 1-based selection spec ("all", "1,3,4") against a list length
fn parse_selection(spec: &str, len: usize) -> Result<Vec<usize>> {
    if spec.trim().eq_ignore_ascii_case("all") {
        return Ok((0..len).collect());
    }
    let mut picks = Vec::new();
    for part in spec.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let position: usize = part
            .parse()
            .map_err(|_| miette::miette!("Invalid position '{}' in selection", part))?;
        if position == 0 || position > len {
            return Err(miette::miette!(
                "Position {} is out of range (1-{})",
                position,
                len
            ));
        }
        picks.push(position - 1);
    }
    Ok(picks)
}

fn prompt_selection(prompt: &str, labels: &[String]) -> Result<Vec<usize>> {
    if labels.is_empty() {
        return Ok(Vec::new());
    }
    dialoguer::MultiSelect::new()
        .with_prompt(prompt)
        .items(labels)
        .interact()
        .into_diagnostic()
}

//! Document entity - contract, proposal, or change order
//!
//! A document embeds its payment milestones and scope-of-work list and is
//! persisted as one YAML file. Prices and totals are never stored; they
//! are recomputed from the embedded lists on every read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::config::PricingConfig;
use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::engine::costs::line_cost;
use crate::engine::ordering::renumber;
use crate::engine::pricing::{fee_base, resolve_price};
use crate::engine::scope::sync_scope;
use crate::entities::expense::ExpenseSheet;
use crate::entities::milestone::{Milestone, MilestoneType};
use crate::entities::scope_item::ScopeItem;

/// Document kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Contract,
    Proposal,
    ChangeOrder,
}

impl Default for DocumentKind {
    fn default() -> Self {
        DocumentKind::Proposal
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentKind::Contract => write!(f, "contract"),
            DocumentKind::Proposal => write!(f, "proposal"),
            DocumentKind::ChangeOrder => write!(f, "change_order"),
        }
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contract" => Ok(DocumentKind::Contract),
            "proposal" => Ok(DocumentKind::Proposal),
            "change_order" | "change-order" | "co" => Ok(DocumentKind::ChangeOrder),
            _ => Err(format!(
                "Invalid document kind: {}. Use contract, proposal, or change_order",
                s
            )),
        }
    }
}

/// Document lifecycle status (informational; gates nothing)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    #[default]
    Draft,
    Sent,
    Accepted,
    Void,
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentStatus::Draft => write!(f, "draft"),
            DocumentStatus::Sent => write!(f, "sent"),
            DocumentStatus::Accepted => write!(f, "accepted"),
            DocumentStatus::Void => write!(f, "void"),
        }
    }
}

/// A document entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (DOC-...)
    pub id: EntityId,

    /// Document kind
    #[serde(default)]
    pub kind: DocumentKind,

    /// Document title
    pub title: String,

    /// Lifecycle status
    #[serde(default)]
    pub status: DocumentStatus,

    /// Payment milestones, in schedule order
    #[serde(default)]
    pub milestones: Vec<Milestone>,

    /// Scope-of-work items, in display order
    #[serde(default)]
    pub scope: Vec<ScopeItem>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who created this document)
    pub author: String,

    /// Entity revision number
    #[serde(default = "default_revision")]
    pub entity_revision: u32,
}

fn default_revision() -> u32 {
    1
}

impl Entity for Document {
    const PREFIX: &'static str = "DOC";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl Document {
    /// Create an empty document
    pub fn new(kind: DocumentKind, title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Doc),
            kind,
            title: title.into(),
            status: DocumentStatus::default(),
            milestones: Vec::new(),
            scope: Vec::new(),
            created: Utc::now(),
            author: author.into(),
            entity_revision: 1,
        }
    }

    /// Create a document with default milestones and synthesized scope
    ///
    /// This is the first-open path for a project with no saved document:
    /// the milestone schedule and scope list are derived from the current
    /// expense sheet.
    pub fn with_defaults(
        kind: DocumentKind,
        title: impl Into<String>,
        author: impl Into<String>,
        sheet: &ExpenseSheet,
        pricing: &PricingConfig,
    ) -> Self {
        let mut doc = Self::new(kind, title, author);
        doc.milestones = default_milestones(sheet);
        sync_scope(&mut doc.scope, sheet, pricing);
        doc
    }
}

/// Build the default milestone schedule for an expense sheet
///
/// Initial fee first, one pass-through per subcontractor fee, a combined
/// equipment-and-materials milestone when either category has items, one
/// pass-through per additional expense, final inspection last.
pub fn default_milestones(sheet: &ExpenseSheet) -> Vec<Milestone> {
    let mut milestones = vec![Milestone::new("Initial Fee", MilestoneType::InitialFee)];

    for fee in &sheet.subcontractor_fees {
        let mut ms =
            Milestone::with_cost(fee.name.clone(), MilestoneType::Subcontractor, line_cost(fee));
        ms.subcontractor_fee_id = Some(fee.id.clone());
        milestones.push(ms);
    }

    if !sheet.equipment.is_empty() || !sheet.materials.is_empty() {
        let cost: f64 = sheet
            .equipment
            .iter()
            .chain(sheet.materials.iter())
            .map(line_cost)
            .sum();
        milestones.push(Milestone::with_cost(
            "Equipment & Materials",
            MilestoneType::EquipmentMaterials,
            cost,
        ));
    }

    for extra in &sheet.additional {
        let mut ms =
            Milestone::with_cost(extra.name.clone(), MilestoneType::Additional, line_cost(extra));
        ms.additional_expense_id = Some(extra.id.clone());
        milestones.push(ms);
    }

    milestones.push(Milestone::new(
        "Final Inspection",
        MilestoneType::FinalInspection,
    ));
    renumber(&mut milestones);
    milestones
}

/// Save payload for one milestone, with its resolved customer price
#[derive(Debug, Clone, Serialize)]
pub struct MilestonePayload {
    pub name: String,
    pub milestone_type: MilestoneType,
    pub cost: f64,
    pub markup_percent: Option<f64>,
    pub flat_price: Option<f64>,
    pub customer_price: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcontractor_fee_id: Option<EntityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_expense_id: Option<EntityId>,
}

/// Save payload for one scope item
#[derive(Debug, Clone, Serialize)]
pub struct ScopeItemPayload {
    pub title: String,
    pub description: String,
}

/// Resolved save payload for a whole document
#[derive(Debug, Clone, Serialize)]
pub struct DocumentPayload {
    pub document_id: EntityId,
    pub kind: DocumentKind,
    pub title: String,
    pub milestones: Vec<MilestonePayload>,
    pub scope: Vec<ScopeItemPayload>,
    /// Project-level customer price total
    pub customer_price: f64,
}

impl DocumentPayload {
    /// Resolve a document against the pricing config into its save payload
    pub fn build(document: &Document, pricing: &PricingConfig) -> Self {
        let base = fee_base(&document.milestones);
        let milestones: Vec<MilestonePayload> = document
            .milestones
            .iter()
            .map(|m| MilestonePayload {
                name: m.name.clone(),
                milestone_type: m.milestone_type,
                cost: m.cost,
                markup_percent: m.markup_percent,
                flat_price: m.flat_price,
                customer_price: resolve_price(m, pricing, base),
                subcontractor_fee_id: m.subcontractor_fee_id.clone(),
                additional_expense_id: m.additional_expense_id.clone(),
            })
            .collect();
        let customer_price = milestones.iter().map(|m| m.customer_price).sum();

        Self {
            document_id: document.id.clone(),
            kind: document.kind,
            title: document.title.clone(),
            milestones,
            scope: document
                .scope
                .iter()
                .map(|s| ScopeItemPayload {
                    title: s.title.clone(),
                    description: s.description.clone(),
                })
                .collect(),
            customer_price,
        }
    }
}

//! Payment milestone - one installment on a document's payment schedule
//!
//! Milestones are embedded in their document file rather than stored as
//! standalone entities. The two fee types derive their price from the fee
//! base (sum of the other milestones' costs); every other type prices from
//! its own cost and markup. A flat price, when present, wins over both.

use serde::{Deserialize, Serialize};

use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::expense::lenient_amount;

/// Milestone type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    /// Up-front fee, priced as a percent of the fee base
    InitialFee,
    /// Closing fee, priced as a percent of the fee base
    FinalInspection,
    /// Pass-through of a subcontractor fee expense
    Subcontractor,
    /// Combined equipment and materials costs
    EquipmentMaterials,
    /// Pass-through of an additional-costs expense
    Additional,
    /// User-defined milestone
    Custom,
}

impl MilestoneType {
    /// Fee milestones ignore their own cost/markup and price from the fee base
    pub fn is_fee(&self) -> bool {
        matches!(self, MilestoneType::InitialFee | MilestoneType::FinalInspection)
    }
}

impl Default for MilestoneType {
    fn default() -> Self {
        MilestoneType::Custom
    }
}

impl std::fmt::Display for MilestoneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MilestoneType::InitialFee => write!(f, "initial_fee"),
            MilestoneType::FinalInspection => write!(f, "final_inspection"),
            MilestoneType::Subcontractor => write!(f, "subcontractor"),
            MilestoneType::EquipmentMaterials => write!(f, "equipment_materials"),
            MilestoneType::Additional => write!(f, "additional"),
            MilestoneType::Custom => write!(f, "custom"),
        }
    }
}

impl std::str::FromStr for MilestoneType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "initial_fee" => Ok(MilestoneType::InitialFee),
            "final_inspection" => Ok(MilestoneType::FinalInspection),
            "subcontractor" => Ok(MilestoneType::Subcontractor),
            "equipment_materials" => Ok(MilestoneType::EquipmentMaterials),
            "additional" => Ok(MilestoneType::Additional),
            "custom" => Ok(MilestoneType::Custom),
            _ => Err(format!(
                "Invalid milestone type: {}. Use initial_fee, final_inspection, subcontractor, equipment_materials, additional, or custom",
                s
            )),
        }
    }
}

/// A payment milestone
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// Unique identifier (MS-...), generated locally
    pub id: EntityId,

    /// Display name on the payment schedule
    pub name: String,

    /// Milestone type
    #[serde(default)]
    pub milestone_type: MilestoneType,

    /// Cost attached to this milestone (0 for fee types)
    #[serde(default, deserialize_with = "lenient_cost")]
    pub cost: f64,

    /// Markup percent; absent means the configured default applies
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub markup_percent: Option<f64>,

    /// Flat customer price; when set it bypasses markup/fee computation
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub flat_price: Option<f64>,

    /// Position in the payment schedule (1-based)
    #[serde(default)]
    pub sequence: u32,

    /// Source subcontractor-fee expense, for subcontractor milestones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcontractor_fee_id: Option<EntityId>,

    /// Source additional-costs expense, for additional milestones
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_expense_id: Option<EntityId>,
}

fn lenient_cost<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(lenient_amount(deserializer)?.unwrap_or(0.0))
}

impl Milestone {
    /// Create a new milestone with no cost attached
    pub fn new(name: impl Into<String>, milestone_type: MilestoneType) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Ms),
            name: name.into(),
            milestone_type,
            cost: 0.0,
            markup_percent: None,
            flat_price: None,
            sequence: 0,
            subcontractor_fee_id: None,
            additional_expense_id: None,
        }
    }

    /// Create a milestone carrying a cost derived from expense data
    pub fn with_cost(name: impl Into<String>, milestone_type: MilestoneType, cost: f64) -> Self {
        Self {
            cost,
            ..Self::new(name, milestone_type)
        }
    }
}

//! Expense line item entity - raw project costs tracked per category
//!
//! Expenses are read-only input to the pricing engine: documents link to
//! them but never mutate them. Amount fields are parsed leniently so a
//! hand-edited file with `expected: "$1,200.50"` (or garbage) degrades to
//! a number or to absent instead of failing the whole file.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix};

/// Expense category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseCategory {
    SubcontractorFee,
    Equipment,
    Material,
    Additional,
}

impl Default for ExpenseCategory {
    fn default() -> Self {
        ExpenseCategory::Additional
    }
}

impl std::fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseCategory::SubcontractorFee => write!(f, "subcontractor_fee"),
            ExpenseCategory::Equipment => write!(f, "equipment"),
            ExpenseCategory::Material => write!(f, "material"),
            ExpenseCategory::Additional => write!(f, "additional"),
        }
    }
}

impl std::str::FromStr for ExpenseCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "subcontractor_fee" | "subcontractor" | "sub" => Ok(ExpenseCategory::SubcontractorFee),
            "equipment" => Ok(ExpenseCategory::Equipment),
            "material" | "materials" => Ok(ExpenseCategory::Material),
            "additional" => Ok(ExpenseCategory::Additional),
            _ => Err(format!(
                "Invalid expense category: {}. Use subcontractor_fee, equipment, material, or additional",
                s
            )),
        }
    }
}

/// Parse a money/quantity amount from free text
///
/// Accepts plain numbers plus the currency decorations people type into
/// YAML by hand: a leading `$`, thousands separators, surrounding space.
/// Anything else (including NaN/inf spellings) is treated as absent.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .trim_start_matches('$')
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Deserialize an optional amount, coercing strings and malformed values
pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_yml::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(coerce_amount))
}

fn coerce_amount(value: &serde_yml::Value) -> Option<f64> {
    match value {
        serde_yml::Value::Number(n) => Some(n.as_f64()).filter(|v| v.is_finite()),
        serde_yml::Value::String(s) => parse_amount(s),
        _ => None,
    }
}

/// An expense line item - one raw cost entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseLineItem {
    /// Unique identifier
    pub id: EntityId,

    /// Short name/description of the expense
    pub name: String,

    /// Expense category
    #[serde(default)]
    pub category: ExpenseCategory,

    /// Expected (estimated) amount
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub expected: Option<f64>,

    /// Actual amount once known; takes precedence over expected
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub actual: Option<f64>,

    /// Quantity, for items billed per unit
    #[serde(
        default,
        deserialize_with = "lenient_amount",
        skip_serializing_if = "Option::is_none"
    )]
    pub quantity: Option<f64>,

    /// Unit the quantity is expressed in (e.g. "day", "ton")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Opaque reference to the vendor/inventory record this expense came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_ref: Option<String>,

    /// Creation timestamp
    pub created: DateTime<Utc>,

    /// Author (who recorded this expense)
    pub author: String,
}

impl Entity for ExpenseLineItem {
    const PREFIX: &'static str = "EXP";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn title(&self) -> &str {
        &self.name
    }

    fn created(&self) -> DateTime<Utc> {
        self.created
    }

    fn author(&self) -> &str {
        &self.author
    }
}

impl ExpenseLineItem {
    /// Create a new expense line item
    pub fn new(name: String, category: ExpenseCategory, author: String) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Exp),
            name,
            category,
            expected: None,
            actual: None,
            quantity: None,
            unit: None,
            vendor_ref: None,
            created: Utc::now(),
            author,
        }
    }
}

/// The four categorized expense collections a project tracks
#[derive(Debug, Clone, Default)]
pub struct ExpenseSheet {
    pub subcontractor_fees: Vec<ExpenseLineItem>,
    pub equipment: Vec<ExpenseLineItem>,
    pub materials: Vec<ExpenseLineItem>,
    pub additional: Vec<ExpenseLineItem>,
}

impl ExpenseSheet {
    /// Route an item into its category collection
    pub fn push(&mut self, item: ExpenseLineItem) {
        match item.category {
            ExpenseCategory::SubcontractorFee => self.subcontractor_fees.push(item),
            ExpenseCategory::Equipment => self.equipment.push(item),
            ExpenseCategory::Material => self.materials.push(item),
            ExpenseCategory::Additional => self.additional.push(item),
        }
    }

    /// Items in one category
    pub fn items(&self, category: ExpenseCategory) -> &[ExpenseLineItem] {
        match category {
            ExpenseCategory::SubcontractorFee => &self.subcontractor_fees,
            ExpenseCategory::Equipment => &self.equipment,
            ExpenseCategory::Material => &self.materials,
            ExpenseCategory::Additional => &self.additional,
        }
    }

    /// Iterate every item across all four categories
    pub fn iter_all(&self) -> impl Iterator<Item = &ExpenseLineItem> {
        self.subcontractor_fees
            .iter()
            .chain(self.equipment.iter())
            .chain(self.materials.iter())
            .chain(self.additional.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.iter_all().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.iter_all().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_plain() {
        assert_eq!(parse_amount("1200.5"), Some(1200.5));
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount("-40"), Some(-40.0));
    }

    #[test]
    fn test_parse_amount_currency_decorations() {
        assert_eq!(parse_amount("$1,200.50"), Some(1200.5));
        assert_eq!(parse_amount(" $ 3 000 "), Some(3000.0));
    }

    #[test]
    fn test_parse_amount_garbage() {
        assert_eq!(parse_amount("twelve"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("nan"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_lenient_amount_from_yaml() {
        #[derive(Deserialize)]
        struct Row {
            #[serde(default, deserialize_with = "lenient_amount")]
            value: Option<f64>,
        }

        let row: Row = serde_yml::from_str("value: 42.5").unwrap();
        assert_eq!(row.value, Some(42.5));

        let row: Row = serde_yml::from_str("value: \"$1,000\"").unwrap();
        assert_eq!(row.value, Some(1000.0));

        let row: Row = serde_yml::from_str("value: \"not a number\"").unwrap();
        assert_eq!(row.value, None);

        let row: Row = serde_yml::from_str("value: [1, 2]").unwrap();
        assert_eq!(row.value, None);

        let row: Row = serde_yml::from_str("{}").unwrap();
        assert_eq!(row.value, None);
    }

    #[test]
    fn test_expense_creation() {
        let exp = ExpenseLineItem::new(
            "Concrete pour".to_string(),
            ExpenseCategory::SubcontractorFee,
            "test".to_string(),
        );

        assert!(exp.id.to_string().starts_with("EXP-"));
        assert_eq!(exp.name, "Concrete pour");
        assert_eq!(exp.category, ExpenseCategory::SubcontractorFee);
        assert!(exp.expected.is_none());
    }

    #[test]
    fn test_expense_roundtrip() {
        let mut exp = ExpenseLineItem::new(
            "Rebar".to_string(),
            ExpenseCategory::Material,
            "test".to_string(),
        );
        exp.expected = Some(200.0);
        exp.quantity = Some(3.0);
        exp.unit = Some("ton".to_string());

        let yaml = serde_yml::to_string(&exp).unwrap();
        let parsed: ExpenseLineItem = serde_yml::from_str(&yaml).unwrap();

        assert_eq!(exp.id, parsed.id);
        assert_eq!(parsed.category, ExpenseCategory::Material);
        assert_eq!(parsed.expected, Some(200.0));
        assert_eq!(parsed.unit.as_deref(), Some("ton"));
    }

    #[test]
    fn test_category_serialization() {
        let exp = ExpenseLineItem::new(
            "Excavator rental".to_string(),
            ExpenseCategory::Equipment,
            "test".to_string(),
        );

        let yaml = serde_yml::to_string(&exp).unwrap();
        assert!(yaml.contains("category: equipment"));
    }

    #[test]
    fn test_entity_trait_implementation() {
        let exp = ExpenseLineItem::new(
            "Entity Test".to_string(),
            ExpenseCategory::Additional,
            "test_author".to_string(),
        );

        assert_eq!(ExpenseLineItem::PREFIX, "EXP");
        assert_eq!(exp.title(), "Entity Test");
        assert_eq!(exp.author(), "test_author");
        assert!(exp.id().to_string().starts_with("EXP-"));
    }

    #[test]
    fn test_sheet_routing() {
        let mut sheet = ExpenseSheet::default();
        sheet.push(ExpenseLineItem::new(
            "Framing crew".to_string(),
            ExpenseCategory::SubcontractorFee,
            "test".to_string(),
        ));
        sheet.push(ExpenseLineItem::new(
            "Lumber".to_string(),
            ExpenseCategory::Material,
            "test".to_string(),
        ));

        assert_eq!(sheet.subcontractor_fees.len(), 1);
        assert_eq!(sheet.materials.len(), 1);
        assert_eq!(sheet.len(), 2);
        assert!(!sheet.is_empty());
    }
}

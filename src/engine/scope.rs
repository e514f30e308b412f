//! Scope-of-work synthesis from expense data
//!
//! Three fixed-title scope items are derived from the expense categories
//! and merged into the document's scope list. Items with the fixed titles
//! belong to the synthesizer; everything else is user text and is left
//! alone, wherever it sits in the list.

use crate::core::config::PricingConfig;
use crate::entities::expense::{ExpenseLineItem, ExpenseSheet};
use crate::entities::scope_item::ScopeItem;

/// Title of the synthesized subcontractor category
pub const SUBCONTRACTOR_TITLE: &str = "Subcontractor Work";
/// Title of the synthesized equipment + materials category
pub const EQUIPMENT_MATERIALS_TITLE: &str = "Equipment & Materials";
/// Title of the synthesized additional-costs category
pub const ADDITIONAL_TITLE: &str = "Additional Services";

/// One synthesized category: fixed title plus bullet-line description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedSection {
    pub title: &'static str,
    pub description: String,
}

/// Bullet line for one contributing expense item
fn bullet(item: &ExpenseLineItem) -> String {
    match (item.quantity, item.unit.as_deref()) {
        (Some(qty), Some(unit)) => format!(
            "\u{2022} {} ({} {})",
            item.name,
            format_quantity(qty),
            pluralize_unit(unit, qty)
        ),
        _ => format!("\u{2022} {}", item.name),
    }
}

fn format_quantity(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{:.0}", qty)
    } else {
        qty.to_string()
    }
}

fn pluralize_unit(unit: &str, qty: f64) -> String {
    if qty != 1.0 && !unit.ends_with('s') {
        format!("{}s", unit)
    } else {
        unit.to_string()
    }
}

fn category_description<'a>(
    items: impl Iterator<Item = &'a ExpenseLineItem>,
) -> Option<String> {
    let lines: Vec<String> = items.map(bullet).collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Build the synthesized sections for the current expense sheet
///
/// A category with no contributing items produces no section, and a
/// category whose auto-include flag is off is skipped entirely.
pub fn synthesize(sheet: &ExpenseSheet, pricing: &PricingConfig) -> Vec<SynthesizedSection> {
    let mut sections = Vec::new();

    if pricing.include_subcontractor_scope {
        if let Some(description) = category_description(sheet.subcontractor_fees.iter()) {
            sections.push(SynthesizedSection {
                title: SUBCONTRACTOR_TITLE,
                description,
            });
        }
    }

    if pricing.include_equipment_scope {
        if let Some(description) =
            category_description(sheet.equipment.iter().chain(sheet.materials.iter()))
        {
            sections.push(SynthesizedSection {
                title: EQUIPMENT_MATERIALS_TITLE,
                description,
            });
        }
    }

    if pricing.include_additional_scope {
        if let Some(description) = category_description(sheet.additional.iter()) {
            sections.push(SynthesizedSection {
                title: ADDITIONAL_TITLE,
                description,
            });
        }
    }

    sections
}

/// Merge synthesized sections into an existing scope list
///
/// An existing item with a matching fixed title gets its description
/// replaced in place (position and id preserved, ownership reasserted);
/// missing sections are appended at the end. User-authored items are never
/// modified, removed, or reordered.
pub fn sync_scope(scope: &mut Vec<ScopeItem>, sheet: &ExpenseSheet, pricing: &PricingConfig) {
    for section in synthesize(sheet, pricing) {
        match scope.iter_mut().find(|item| item.title == section.title) {
            Some(existing) => {
                existing.description = section.description;
                existing.auto_generated = true;
            }
            None => {
                let mut item = ScopeItem::auto(section.title, section.description);
                item.sequence = scope.len() as u32 + 1;
                scope.push(item);
            }
        }
    }
}

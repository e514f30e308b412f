//! Stable reorder and cross-project import merge
//!
//! Reordering is a plain array move: the element is removed and reinserted
//! and every other element keeps its relative order. Import is a pure
//! append with fresh local ids and deliberately no de-duplication:
//! importing the same item twice yields two entries.

use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::milestone::Milestone;
use crate::entities::scope_item::ScopeItem;

/// List elements that carry a 1-based sequence number
pub trait Sequenced {
    fn set_sequence(&mut self, sequence: u32);
}

impl Sequenced for Milestone {
    fn set_sequence(&mut self, sequence: u32) {
        self.sequence = sequence;
    }
}

impl Sequenced for ScopeItem {
    fn set_sequence(&mut self, sequence: u32) {
        self.sequence = sequence;
    }
}

/// Renumber sequences to match list positions (1-based)
pub fn renumber<T: Sequenced>(items: &mut [T]) {
    for (index, item) in items.iter_mut().enumerate() {
        item.set_sequence(index as u32 + 1);
    }
}

/// Move the element at `from` to position `to`, renumbering all sequences
///
/// Returns false (and leaves the list untouched) when either index is out
/// of range.
pub fn move_item<T: Sequenced>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    renumber(items);
    true
}

/// Append milestones imported from another project's document
///
/// Each import gets a fresh local id and the current configuration's
/// default markup; cost, type, name, and flat price are copied verbatim.
/// Back-references point into the source project and are cleared.
pub fn import_milestones(
    dest: &mut Vec<Milestone>,
    source: &[Milestone],
    default_markup_percent: f64,
) {
    for src in source {
        let mut milestone = src.clone();
        milestone.id = EntityId::new(EntityPrefix::Ms);
        milestone.markup_percent = Some(default_markup_percent);
        milestone.subcontractor_fee_id = None;
        milestone.additional_expense_id = None;
        dest.push(milestone);
    }
    renumber(dest);
}

/// Append scope items imported from another project's document
///
/// Fresh local ids; title, description, and the auto-generated flag are
/// copied verbatim.
pub fn import_scope_items(dest: &mut Vec<ScopeItem>, source: &[ScopeItem]) {
    for src in source {
        let mut item = src.clone();
        item.id = EntityId::new(EntityPrefix::Sow);
        dest.push(item);
    }
    renumber(dest);
}

//! Document pricing and milestone allocation engine
//!
//! Pure functions over explicit parameter values: the expense sheet, the
//! pricing configuration, and the document's in-memory milestone and scope
//! lists. The CLI layer owns all mutable state and file I/O and calls back
//! into this module on every change, so derived figures are always
//! recomputed from current data and never cached.

pub mod costs;
pub mod ordering;
pub mod pricing;
pub mod scope;
pub mod totals;

pub use costs::{aggregate, line_cost, CostSummary};
pub use ordering::{import_milestones, import_scope_items, move_item, renumber, Sequenced};
pub use pricing::{fee_base, resolve_price};
pub use scope::{sync_scope, synthesize};
pub use totals::{authorize_generation, compute_totals, DocumentTotals, GenerationBlocked};

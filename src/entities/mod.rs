//! Entity type definitions
//!
//! KCT tracks the following entity types:
//!
//! **Expense tracking:**
//! - [`ExpenseLineItem`] - Raw project costs in four categories
//!
//! **Documents:**
//! - [`Document`] - Contract, proposal, or change order with embedded
//!   payment milestones and scope-of-work list
//! - [`Milestone`] - One installment on a document's payment schedule
//! - [`ScopeItem`] - One line of a document's scope of work

pub mod document;
pub mod expense;
pub mod milestone;
pub mod scope_item;

pub use document::{Document, DocumentKind, DocumentPayload, DocumentStatus};
pub use expense::{ExpenseCategory, ExpenseLineItem, ExpenseSheet};
pub use milestone::{Milestone, MilestoneType};
pub use scope_item::ScopeItem;

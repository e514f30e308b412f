//! Document totals, profit, and the generation gate

use miette::Diagnostic;
use serde::Serialize;
use thiserror::Error;

use crate::core::config::PricingConfig;
use crate::engine::costs::CostSummary;
use crate::engine::pricing::{fee_base, resolve_price};
use crate::entities::milestone::Milestone;

/// Aggregate figures derived from the current milestone list
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DocumentTotals {
    /// Sum of every milestone's resolved price
    pub customer_total: f64,
    /// Expense sheet total (not the fee base)
    pub total_cost: f64,
    /// customer_total - total_cost
    pub profit: f64,
    /// Profit as a percent of the customer total (0 when total is 0)
    pub profit_margin_percent: f64,
    /// Profit as a percent of cost (0 when cost is 0)
    pub effective_markup_percent: f64,
}

/// Recompute all totals from the current milestone list
pub fn compute_totals(
    milestones: &[Milestone],
    pricing: &PricingConfig,
    costs: &CostSummary,
) -> DocumentTotals {
    let base = fee_base(milestones);
    let customer_total: f64 = milestones
        .iter()
        .map(|m| resolve_price(m, pricing, base))
        .sum();

    let total_cost = costs.total;
    let profit = customer_total - total_cost;
    let profit_margin_percent = if customer_total > 0.0 {
        profit / customer_total * 100.0
    } else {
        0.0
    };
    let effective_markup_percent = if total_cost > 0.0 {
        profit / total_cost * 100.0
    } else {
        0.0
    };

    DocumentTotals {
        customer_total,
        total_cost,
        profit,
        profit_margin_percent,
        effective_markup_percent,
    }
}

/// Generation refused because the document prices to nothing
#[derive(Debug, Error, Diagnostic)]
#[error("customer total is {customer_total:.2}; a document must price above zero to be generated")]
#[diagnostic(
    code(kct::generate::nonpositive_total),
    help("add milestones with costs or prices, or set a flat price, then try again")
)]
pub struct GenerationBlocked {
    pub customer_total: f64,
}

/// Gate document generation on a positive customer total
pub fn authorize_generation(totals: &DocumentTotals) -> Result<(), GenerationBlocked> {
    if totals.customer_total <= 0.0 {
        Err(GenerationBlocked {
            customer_total: totals.customer_total,
        })
    } else {
        Ok(())
    }
}

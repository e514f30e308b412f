//! Fee base calculation and per-milestone price resolution

use crate::core::config::PricingConfig;
use crate::entities::milestone::{Milestone, MilestoneType};

/// Percent of the fee base used for initial fees when the config has none
pub const DEFAULT_INITIAL_FEE_PERCENT: f64 = 20.0;

/// Percent of the fee base used for final inspection fees when the config has none
pub const DEFAULT_FINAL_FEE_PERCENT: f64 = 80.0;

/// Sum of cost over all non-fee milestones
///
/// This is the percentage base for fee milestones. It is the sum of
/// milestone-level costs, not the expense sheet total: milestones may cover
/// a subset or re-grouping of the raw expenses and the two can diverge.
pub fn fee_base(milestones: &[Milestone]) -> f64 {
    milestones
        .iter()
        .filter(|m| !m.milestone_type.is_fee())
        .map(|m| m.cost)
        .sum()
}

/// Resolve the customer-facing price of one milestone
///
/// Precedence: a flat price wins for every type, fee types price as a
/// clamped percent of the fee base, everything else prices as cost plus
/// markup (the configured default when the milestone carries none).
pub fn resolve_price(milestone: &Milestone, pricing: &PricingConfig, fee_base: f64) -> f64 {
    if let Some(flat) = milestone.flat_price {
        return flat;
    }

    match milestone.milestone_type {
        MilestoneType::InitialFee => fee_amount(
            fee_base,
            pricing.initial_fee_percent,
            DEFAULT_INITIAL_FEE_PERCENT,
            pricing.initial_fee_min,
            pricing.initial_fee_max,
        ),
        MilestoneType::FinalInspection => fee_amount(
            fee_base,
            pricing.final_fee_percent,
            DEFAULT_FINAL_FEE_PERCENT,
            pricing.final_fee_min,
            pricing.final_fee_max,
        ),
        MilestoneType::Subcontractor
        | MilestoneType::EquipmentMaterials
        | MilestoneType::Additional
        | MilestoneType::Custom => {
            let markup = milestone
                .markup_percent
                .unwrap_or(pricing.default_markup_percent);
            milestone.cost * (1.0 + markup / 100.0)
        }
    }
}

/// Percent-of-base fee, clamped to [min, max]
///
/// An absent percent falls back to the caller's default; a present zero or
/// negative percent is used as-is (the min clamp floors the result).
fn fee_amount(
    base: f64,
    percent: Option<f64>,
    default_percent: f64,
    min: Option<f64>,
    max: Option<f64>,
) -> f64 {
    let percent = percent.unwrap_or(default_percent);
    let amount = base * percent / 100.0;
    let min = min.unwrap_or(0.0);
    let max = max.unwrap_or(f64::INFINITY);
    amount.min(max).max(min)
}

//! Cost aggregation over raw expense line items

use serde::Serialize;

use crate::entities::expense::{ExpenseLineItem, ExpenseSheet};

/// Cost of one expense line: actual if present, else expected, else 0
///
/// Negative amounts are floored at 0 so no line can reduce a category total.
pub fn line_cost(item: &ExpenseLineItem) -> f64 {
    item.actual.or(item.expected).unwrap_or(0.0).max(0.0)
}

/// Per-category cost breakdown plus grand total
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostSummary {
    pub subcontractor: f64,
    pub equipment: f64,
    pub material: f64,
    pub additional: f64,
    pub total: f64,
}

/// Sum the expense sheet into a cost summary
pub fn aggregate(sheet: &ExpenseSheet) -> CostSummary {
    fn sum(items: &[ExpenseLineItem]) -> f64 {
        items.iter().map(line_cost).sum()
    }

    let subcontractor = sum(&sheet.subcontractor_fees);
    let equipment = sum(&sheet.equipment);
    let material = sum(&sheet.materials);
    let additional = sum(&sheet.additional);

    CostSummary {
        subcontractor,
        equipment,
        material,
        additional,
        total: subcontractor + equipment + material + additional,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::expense::ExpenseCategory;

    fn expense(
        name: &str,
        category: ExpenseCategory,
        expected: Option<f64>,
        actual: Option<f64>,
    ) -> ExpenseLineItem {
        let mut item = ExpenseLineItem::new(name.to_string(), category, "test".to_string());
        item.expected = expected;
        item.actual = actual;
        item
    }

    #[test]
    fn test_line_cost_precedence() {
        let item = expense("a", ExpenseCategory::Equipment, Some(100.0), Some(120.0));
        assert_eq!(line_cost(&item), 120.0);

        let item = expense("b", ExpenseCategory::Equipment, Some(100.0), None);
        assert_eq!(line_cost(&item), 100.0);

        let item = expense("c", ExpenseCategory::Equipment, None, None);
        assert_eq!(line_cost(&item), 0.0);
    }

    #[test]
    fn test_line_cost_never_negative() {
        let item = expense("refund", ExpenseCategory::Additional, Some(-50.0), None);
        assert_eq!(line_cost(&item), 0.0);

        let item = expense("credit", ExpenseCategory::Additional, Some(80.0), Some(-10.0));
        assert_eq!(line_cost(&item), 0.0);
    }

    #[test]
    fn test_actual_zero_beats_expected() {
        // An explicit actual of 0 wins over the estimate
        let item = expense("waived", ExpenseCategory::Material, Some(400.0), Some(0.0));
        assert_eq!(line_cost(&item), 0.0);
    }

    #[test]
    fn test_aggregate_by_category() {
        let mut sheet = ExpenseSheet::default();
        sheet.push(expense(
            "Framing crew",
            ExpenseCategory::SubcontractorFee,
            Some(1000.0),
            None,
        ));
        sheet.push(expense(
            "Excavator",
            ExpenseCategory::Equipment,
            Some(500.0),
            None,
        ));
        sheet.push(expense(
            "Rebar",
            ExpenseCategory::Material,
            Some(200.0),
            None,
        ));

        let summary = aggregate(&sheet);
        assert_eq!(summary.subcontractor, 1000.0);
        assert_eq!(summary.equipment, 500.0);
        assert_eq!(summary.material, 200.0);
        assert_eq!(summary.additional, 0.0);
        assert_eq!(summary.total, 1700.0);
    }

    #[test]
    fn test_aggregate_empty_sheet() {
        let summary = aggregate(&ExpenseSheet::default());
        assert_eq!(summary, CostSummary::default());
    }
}

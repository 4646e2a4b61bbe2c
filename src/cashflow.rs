//! Cash-flow aggregation
//!
//! Sums the expense categories and derives net monthly cash flow.
//! A negative net is a deficit, not an error.

use crate::models::CashFlowInput;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CashFlowTotals {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_cash_flow: f64,
}

impl CashFlowTotals {
    pub fn is_deficit(&self) -> bool {
        self.net_cash_flow < 0.0
    }
}

pub fn aggregate(input: &CashFlowInput) -> CashFlowTotals {
    let total_expenses =
        input.fixed_expenses() + input.variable_expenses() + input.discretionary_spending();

    CashFlowTotals {
        total_income: input.monthly_net_income(),
        total_expenses,
        net_cash_flow: input.monthly_net_income() - total_expenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert_eq, proptest};

    #[test]
    fn test_surplus() {
        let input = CashFlowInput::new(85000.0, 44000.0, 2000.0, 26000.0, 0.0).unwrap();
        let totals = aggregate(&input);

        assert_eq!(totals.total_income, 85000.0);
        assert_eq!(totals.total_expenses, 72000.0);
        assert_eq!(totals.net_cash_flow, 13000.0);
        assert!(!totals.is_deficit());
    }

    #[test]
    fn test_deficit_is_a_valid_result() {
        let input = CashFlowInput::new(30000.0, 25000.0, 8000.0, 2000.0, 0.0).unwrap();
        let totals = aggregate(&input);

        assert_eq!(totals.net_cash_flow, -5000.0);
        assert!(totals.is_deficit());
    }

    proptest! {
        #[test]
        fn prop_totals_match_components(
            income in 0u32..10_000_000,
            fixed in 0u32..5_000_000,
            variable in 0u32..5_000_000,
            discretionary in 0u32..5_000_000
        ) {
            let (income, fixed, variable, discretionary) =
                (income as f64, fixed as f64, variable as f64, discretionary as f64);
            let input = CashFlowInput::new(income, fixed, variable, discretionary, 0.0).unwrap();
            let totals = aggregate(&input);

            prop_assert_eq!(totals.total_expenses, fixed + variable + discretionary);
            prop_assert_eq!(totals.net_cash_flow, income - totals.total_expenses);
        }
    }
}

//! Spending Classifier
//!
//! Applies rule-of-thumb budgeting thresholds to a client's cash flow:
//! - Deficit: expenses exceed income
//! - Discretionary overspend: wants above 30% of income (50/30/20 rule)
//! - Fixed-cost load: needs above 50% of income
//! - Thin surplus: positive cash flow below 10% of income
//!
//! Rules run in registration order and each contributes at most one
//! suggestion, so the output order is deterministic.

use crate::cashflow::{aggregate, CashFlowTotals};
use crate::models::{AnalysisResult, CashFlowInput, GoalFundingStatus};
use tracing::debug;

pub const DISCRETIONARY_LIMIT_RATIO: f64 = 0.30;
pub const FIXED_EXPENSE_LIMIT_RATIO: f64 = 0.50;
pub const THIN_SURPLUS_RATIO: f64 = 0.10;

/// A single threshold check over the cash-flow figures
pub trait SpendingRule: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns a suggestion when the rule fires.
    fn evaluate(&self, input: &CashFlowInput, totals: &CashFlowTotals) -> Option<String>;
}

/// Ordered rule set producing optimization suggestions
pub struct SpendingClassifier {
    rules: Vec<Box<dyn SpendingRule>>,
}

impl SpendingClassifier {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn add_rule(&mut self, rule: Box<dyn SpendingRule>) {
        self.rules.push(rule);
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    pub fn classify(&self, input: &CashFlowInput, totals: &CashFlowTotals) -> Vec<String> {
        let mut suggestions = Vec::with_capacity(self.rules.len());

        for rule in &self.rules {
            if let Some(suggestion) = rule.evaluate(input, totals) {
                debug!(rule = rule.name(), "Spending rule triggered");
                suggestions.push(suggestion);
            }
        }

        suggestions
    }
}

impl Default for SpendingClassifier {
    fn default() -> Self {
        create_default_classifier()
    }
}

/// Standard rule order: deficit, discretionary, fixed load, thin surplus.
pub fn create_default_classifier() -> SpendingClassifier {
    let mut classifier = SpendingClassifier::new();
    classifier.add_rule(Box::new(DeficitRule));
    classifier.add_rule(Box::new(DiscretionarySpendingRule));
    classifier.add_rule(Box::new(FixedExpenseLoadRule));
    classifier.add_rule(Box::new(ThinSurplusRule));
    classifier
}

/// Funding status and shortfall against the monthly savings target.
pub fn goal_funding(input: &CashFlowInput, totals: &CashFlowTotals) -> (GoalFundingStatus, f64) {
    let shortfall = (input.target_savings() - totals.net_cash_flow).max(0.0);
    let status = if shortfall > 0.0 {
        GoalFundingStatus::Shortfall
    } else {
        GoalFundingStatus::OnTrack
    };
    (status, shortfall)
}

/// Tool boundary: aggregate, classify and assess goal funding.
///
/// Infallible. A `CashFlowInput` can only be built from validated amounts,
/// so there is nothing left to reject here.
pub fn spending_categorizer_and_analyser(input: &CashFlowInput) -> AnalysisResult {
    analyse_with(&create_default_classifier(), input)
}

pub fn analyse_with(classifier: &SpendingClassifier, input: &CashFlowInput) -> AnalysisResult {
    let totals = aggregate(input);
    let optimization_areas = classifier.classify(input, &totals);
    let (goal_funding_status, funding_shortfall) = goal_funding(input, &totals);

    AnalysisResult {
        total_income: totals.total_income,
        total_expenses: totals.total_expenses,
        net_cash_flow: totals.net_cash_flow,
        goal_funding_status,
        funding_shortfall,
        optimization_areas,
    }
}

/// Format an INR amount with two decimals and thousands separators.
pub fn format_inr(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}₹{}.{}", sign, grouped, frac)
}

//
// ========== Rules ==========
//

pub struct DeficitRule;

impl SpendingRule for DeficitRule {
    fn name(&self) -> &'static str {
        "monthly_deficit"
    }

    fn evaluate(&self, _input: &CashFlowInput, totals: &CashFlowTotals) -> Option<String> {
        totals.is_deficit().then(|| {
            format!(
                "You are running a monthly deficit of {}. Immediate expense reduction or income adjustments are recommended.",
                format_inr(-totals.net_cash_flow)
            )
        })
    }
}

pub struct DiscretionarySpendingRule;

impl SpendingRule for DiscretionarySpendingRule {
    fn name(&self) -> &'static str {
        "discretionary_above_30_percent"
    }

    fn evaluate(&self, input: &CashFlowInput, _totals: &CashFlowTotals) -> Option<String> {
        let limit = DISCRETIONARY_LIMIT_RATIO * input.monthly_net_income();
        (input.discretionary_spending() > limit).then(|| {
            format!(
                "Discretionary spending is above recommended levels. Trimming {} would bring it within the 30% guideline.",
                format_inr(input.discretionary_spending() - limit)
            )
        })
    }
}

pub struct FixedExpenseLoadRule;

impl SpendingRule for FixedExpenseLoadRule {
    fn name(&self) -> &'static str {
        "fixed_expenses_above_50_percent"
    }

    fn evaluate(&self, input: &CashFlowInput, _totals: &CashFlowTotals) -> Option<String> {
        (input.fixed_expenses() > FIXED_EXPENSE_LIMIT_RATIO * input.monthly_net_income()).then(|| {
            "Fixed expenses exceed 50% of your income. Consider reviewing rent, large EMIs, or refinancing options to reduce the fixed burden."
                .to_string()
        })
    }
}

pub struct ThinSurplusRule;

impl SpendingRule for ThinSurplusRule {
    fn name(&self) -> &'static str {
        "thin_surplus"
    }

    fn evaluate(&self, input: &CashFlowInput, totals: &CashFlowTotals) -> Option<String> {
        let net = totals.net_cash_flow;
        (net > 0.0 && net < THIN_SURPLUS_RATIO * input.monthly_net_income()).then(|| {
            "Your monthly surplus is thin. Consider optimizing variable expenses like utilities, subscriptions, or grocery spend."
                .to_string()
        })
    }
}

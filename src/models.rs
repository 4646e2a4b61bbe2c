//! Core data models for the budget optimizer

use crate::error::BudgetError;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

//
// ================= Enums =================
//

/// Employment status that selects the analysis branch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserStatus {
    Working,
    Retired,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum GoalFundingStatus {
    #[serde(rename = "On track")]
    OnTrack,
    Shortfall,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CashFlowStatus {
    Surplus,
    Deficit,
    #[serde(rename = "Break-even")]
    BreakEven,
}

impl CashFlowStatus {
    pub fn from_net(net_cash_flow: f64) -> Self {
        if net_cash_flow > 0.0 {
            CashFlowStatus::Surplus
        } else if net_cash_flow < 0.0 {
            CashFlowStatus::Deficit
        } else {
            CashFlowStatus::BreakEven
        }
    }
}

//
// ================= Cash-Flow Input =================
//

/// Validated monthly cash-flow figures, all in INR.
///
/// Fields are private so that every instance has passed [`CashFlowInput::new`]:
/// amounts are finite and non-negative, and so are the totals derived from them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCashFlowInput")]
pub struct CashFlowInput {
    monthly_net_income_inr: f64,
    fixed_expenses_inr: f64,
    variable_expenses_inr: f64,
    discretionary_spending_inr: f64,
    target_savings_inr: f64,
}

#[derive(Debug, Deserialize)]
struct RawCashFlowInput {
    monthly_net_income_inr: f64,
    fixed_expenses_inr: f64,
    variable_expenses_inr: f64,
    discretionary_spending_inr: f64,
    #[serde(default)]
    target_savings_inr: f64,
}

impl TryFrom<RawCashFlowInput> for CashFlowInput {
    type Error = BudgetError;

    fn try_from(raw: RawCashFlowInput) -> Result<Self> {
        CashFlowInput::new(
            raw.monthly_net_income_inr,
            raw.fixed_expenses_inr,
            raw.variable_expenses_inr,
            raw.discretionary_spending_inr,
            raw.target_savings_inr,
        )
    }
}

impl CashFlowInput {
    pub fn new(
        monthly_net_income_inr: f64,
        fixed_expenses_inr: f64,
        variable_expenses_inr: f64,
        discretionary_spending_inr: f64,
        target_savings_inr: f64,
    ) -> Result<Self> {
        let input = Self {
            monthly_net_income_inr: non_negative_amount(
                "monthly_net_income_inr",
                monthly_net_income_inr,
            )?,
            fixed_expenses_inr: non_negative_amount("fixed_expenses_inr", fixed_expenses_inr)?,
            variable_expenses_inr: non_negative_amount(
                "variable_expenses_inr",
                variable_expenses_inr,
            )?,
            discretionary_spending_inr: non_negative_amount(
                "discretionary_spending_inr",
                discretionary_spending_inr,
            )?,
            target_savings_inr: non_negative_amount("target_savings_inr", target_savings_inr)?,
        };

        // Totals, net and shortfall must stay representable for every valid input.
        let total_expenses =
            input.fixed_expenses_inr + input.variable_expenses_inr + input.discretionary_spending_inr;
        let net_cash_flow = input.monthly_net_income_inr - total_expenses;
        if !total_expenses.is_finite() || !(input.target_savings_inr - net_cash_flow).is_finite() {
            return Err(BudgetError::InvalidInput(
                "amounts are too large to total without overflow".to_string(),
            ));
        }

        Ok(input)
    }

    pub fn monthly_net_income(&self) -> f64 {
        self.monthly_net_income_inr
    }

    pub fn fixed_expenses(&self) -> f64 {
        self.fixed_expenses_inr
    }

    pub fn variable_expenses(&self) -> f64 {
        self.variable_expenses_inr
    }

    pub fn discretionary_spending(&self) -> f64 {
        self.discretionary_spending_inr
    }

    pub fn target_savings(&self) -> f64 {
        self.target_savings_inr
    }
}

/// Reject negative, NaN and infinite amounts.
pub(crate) fn non_negative_amount(field: &str, value: f64) -> Result<f64> {
    if !value.is_finite() {
        return Err(BudgetError::InvalidInput(format!(
            "{} must be a finite number",
            field
        )));
    }
    if value < 0.0 {
        return Err(BudgetError::InvalidInput(format!(
            "{} must not be negative (got {})",
            field, value
        )));
    }
    Ok(value)
}

//
// ================= Analysis Results =================
//

/// Output of the spending analyser for a working client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(rename = "total_monthly_net_income_inr")]
    pub total_income: f64,
    #[serde(rename = "total_monthly_expenses_inr")]
    pub total_expenses: f64,
    #[serde(rename = "net_cash_flow_inr")]
    pub net_cash_flow: f64,
    pub goal_funding_status: GoalFundingStatus,
    #[serde(rename = "funding_shortfall_inr")]
    pub funding_shortfall: f64,
    pub optimization_areas: Vec<String>,
}

/// Output of the withdrawal-safety evaluator for a retired client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetirementResult {
    pub withdrawal_rate_percent: f64,
    pub safe_withdrawal_threshold_percent: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_flag: Option<String>,
    pub optimization_areas: Vec<String>,
    pub goal_funding_status: GoalFundingStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmergencyFundCheck {
    pub months_covered: f64,
    pub target_months: f64,
    pub sufficient: bool,
    pub shortfall_inr: f64,
}

//
// ================= Budget Summary =================
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingSummary {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub cash_flow_status: CashFlowStatus,
    pub surplus_or_deficit_amount_inr: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_fund: Option<EmergencyFundCheck>,
    pub high_interest_debt_flag: bool,
    pub additional_recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetiredSummary {
    #[serde(flatten)]
    pub withdrawal: RetirementResult,
    pub annual_withdrawal_inr: f64,
    pub corpus_inr: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emergency_fund: Option<EmergencyFundCheck>,
    pub high_interest_debt_flag: bool,
    pub additional_recommendations: Vec<String>,
}

/// The value written under `budget_analysis_summary`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "user_status")]
pub enum BudgetSummary {
    Working(WorkingSummary),
    Retired(RetiredSummary),
}

impl BudgetSummary {
    pub fn user_status(&self) -> UserStatus {
        match self {
            BudgetSummary::Working(_) => UserStatus::Working,
            BudgetSummary::Retired(_) => UserStatus::Retired,
        }
    }

    pub fn goal_funding_status(&self) -> GoalFundingStatus {
        match self {
            BudgetSummary::Working(s) => s.analysis.goal_funding_status,
            BudgetSummary::Retired(s) => s.withdrawal.goal_funding_status,
        }
    }

    pub fn risk_flag(&self) -> Option<&str> {
        match self {
            BudgetSummary::Working(_) => None,
            BudgetSummary::Retired(s) => s.withdrawal.risk_flag.as_deref(),
        }
    }

    pub fn high_interest_debt_flag(&self) -> bool {
        match self {
            BudgetSummary::Working(s) => s.high_interest_debt_flag,
            BudgetSummary::Retired(s) => s.high_interest_debt_flag,
        }
    }

    /// Whether the merged document should carry `debt_flag = true`.
    pub fn raises_debt_flag(&self) -> bool {
        self.high_interest_debt_flag() || self.risk_flag().is_some()
    }
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: serde_json::Value,
    pub error: Option<String>,
}

impl FromStr for UserStatus {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Working" => Ok(UserStatus::Working),
            "Retired" => Ok(UserStatus::Retired),
            other => Err(BudgetError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UserStatus::Working => "Working",
            UserStatus::Retired => "Retired",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for GoalFundingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            GoalFundingStatus::OnTrack => "On track",
            GoalFundingStatus::Shortfall => "Shortfall",
        };
        write!(f, "{}", s)
    }
}

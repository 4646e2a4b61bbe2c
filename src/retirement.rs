//! Retirement withdrawal-safety evaluation
//!
//! Compares the annual drawdown against the retirement corpus using the
//! 4% safe-withdrawal guideline.

use crate::error::BudgetError;
use crate::models::{non_negative_amount, GoalFundingStatus, RetirementResult};
use crate::Result;
use serde::Deserialize;
use tracing::debug;

pub const SAFE_WITHDRAWAL_THRESHOLD_PERCENT: f64 = 4.0;
pub const HIGH_WITHDRAWAL_RISK_FLAG: &str = "High withdrawal rate";

/// Drawdown figures for a retired client.
///
/// The withdrawal is always held as an annual amount. A monthly pension or
/// drawdown is annualised; when both are supplied the annual figure wins.
/// The corpus is kept as given so the evaluator can report `InvalidCorpus`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "RawRetirementInputs")]
pub struct RetirementInputs {
    pub annual_withdrawal_inr: f64,
    pub corpus_inr: f64,
}

#[derive(Debug, Deserialize)]
struct RawRetirementInputs {
    corpus_inr: f64,
    #[serde(default)]
    annual_withdrawal_inr: Option<f64>,
    #[serde(default)]
    monthly_pension_or_drawdown_inr: Option<f64>,
}

impl TryFrom<RawRetirementInputs> for RetirementInputs {
    type Error = BudgetError;

    fn try_from(raw: RawRetirementInputs) -> Result<Self> {
        let annual_withdrawal_inr = match (raw.annual_withdrawal_inr, raw.monthly_pension_or_drawdown_inr) {
            (Some(annual), _) => non_negative_amount("annual_withdrawal_inr", annual)?,
            (None, Some(monthly)) => non_negative_amount(
                "monthly_pension_or_drawdown_inr",
                non_negative_amount("monthly_pension_or_drawdown_inr", monthly)? * 12.0,
            )?,
            (None, None) => {
                return Err(BudgetError::InvalidInput(
                    "expected `annual_withdrawal_inr` or `monthly_pension_or_drawdown_inr`"
                        .to_string(),
                ))
            }
        };

        Ok(Self {
            annual_withdrawal_inr,
            corpus_inr: raw.corpus_inr,
        })
    }
}

impl RetirementInputs {
    pub fn monthly_drawdown(&self) -> f64 {
        self.annual_withdrawal_inr / 12.0
    }

    pub fn evaluate(&self) -> Result<RetirementResult> {
        evaluate_withdrawal(self.annual_withdrawal_inr, self.corpus_inr)
    }
}

/// Evaluate an annual withdrawal against the corpus it is drawn from.
///
/// `annual_withdrawal` and `corpus` must be in the same currency unit.
/// A zero, negative or non-finite corpus is rejected with `InvalidCorpus`.
pub fn evaluate_withdrawal(annual_withdrawal: f64, corpus: f64) -> Result<RetirementResult> {
    let annual_withdrawal = non_negative_amount("annual_withdrawal_inr", annual_withdrawal)?;

    if !corpus.is_finite() || corpus <= 0.0 {
        return Err(BudgetError::InvalidCorpus(format!(
            "corpus must be a positive amount (got {})",
            corpus
        )));
    }

    let mut withdrawal_rate_percent = 100.0 * annual_withdrawal / corpus;
    if !withdrawal_rate_percent.is_finite() {
        // 100 * withdrawal can overflow even when the rate itself fits.
        withdrawal_rate_percent = annual_withdrawal / corpus * 100.0;
    }
    if !withdrawal_rate_percent.is_finite() {
        return Err(BudgetError::InvalidInput(format!(
            "withdrawal rate is not representable for withdrawal {} against corpus {}",
            annual_withdrawal, corpus
        )));
    }

    let exceeds = withdrawal_rate_percent > SAFE_WITHDRAWAL_THRESHOLD_PERCENT;

    debug!(
        withdrawal_rate_percent,
        threshold = SAFE_WITHDRAWAL_THRESHOLD_PERCENT,
        exceeds,
        "Withdrawal rate evaluated"
    );

    let mut optimization_areas = Vec::new();
    let (risk_flag, goal_funding_status) = if exceeds {
        let sustainable = corpus / 100.0 * SAFE_WITHDRAWAL_THRESHOLD_PERCENT;
        optimization_areas.push(format!(
            "Your withdrawal rate of {:.2}% exceeds the {:.1}% safe threshold. Consider reducing annual drawdown towards {} to preserve your corpus.",
            withdrawal_rate_percent,
            SAFE_WITHDRAWAL_THRESHOLD_PERCENT,
            crate::classifier::format_inr(sustainable)
        ));
        (
            Some(HIGH_WITHDRAWAL_RISK_FLAG.to_string()),
            GoalFundingStatus::Shortfall,
        )
    } else {
        (None, GoalFundingStatus::OnTrack)
    };

    Ok(RetirementResult {
        withdrawal_rate_percent,
        safe_withdrawal_threshold_percent: SAFE_WITHDRAWAL_THRESHOLD_PERCENT,
        risk_flag,
        optimization_areas,
        goal_funding_status,
    })
}

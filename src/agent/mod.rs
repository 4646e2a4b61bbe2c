//! Budget optimizer agent - routes a client through the right analysis
//!
//! DOCUMENT → VIEW → ROUTE (Working | Retired) → SUMMARY → MERGE
//!
//! The agent is a pure function of the document snapshot it is given. On any
//! failure the caller keeps its original snapshot and gets the error.

use crate::classifier::{analyse_with, format_inr, SpendingClassifier};
use crate::error::BudgetError;
use crate::models::{
    BudgetSummary, CashFlowInput, CashFlowStatus, EmergencyFundCheck, RetiredSummary,
    WorkingSummary,
};
use crate::retirement::RetirementInputs;
use crate::state::{BudgetView, ClientProfile, FinancialStateDocument};
use crate::Result;
use tracing::{debug, info, warn};

/// Months of outflow an emergency fund should cover
pub const EMERGENCY_FUND_TARGET_MONTHS: f64 = 6.0;

const HIGH_INTEREST_DEBT_RECOMMENDATION: &str =
    "Prioritise repaying high-interest EMIs and credit balances before increasing discretionary spend or new investments.";

pub struct BudgetOptimizer {
    classifier: SpendingClassifier,
}

impl BudgetOptimizer {
    pub fn new(classifier: SpendingClassifier) -> Self {
        Self { classifier }
    }

    /// Analyse a document and return a new snapshot with the summary merged.
    pub fn run(&self, doc: &FinancialStateDocument) -> Result<FinancialStateDocument> {
        let input_fingerprint = doc.fingerprint();
        debug!(fingerprint = %input_fingerprint, "Starting budget analysis");

        let outcome = BudgetView::from_document(doc)
            .and_then(|view| self.analyse(&view))
            .and_then(|summary| doc.with_summary(&summary));

        match outcome {
            Ok(updated) => {
                info!(
                    input_fingerprint = %input_fingerprint,
                    output_fingerprint = %updated.fingerprint(),
                    "Budget analysis merged"
                );
                Ok(updated)
            }
            Err(e) => {
                warn!(
                    fingerprint = %input_fingerprint,
                    kind = e.kind(),
                    error = %e,
                    "Budget analysis failed; document left unchanged"
                );
                Err(e)
            }
        }
    }

    /// Route on the client's status and build the matching summary shape.
    pub fn analyse(&self, view: &BudgetView) -> Result<BudgetSummary> {
        info!(user_status = %view.profile.user_status(), "Routing budget analysis");

        let summary = match &view.profile {
            ClientProfile::Working(input) => BudgetSummary::Working(self.analyse_working(view, input)?),
            ClientProfile::Retired(inputs) => BudgetSummary::Retired(analyse_retired(view, inputs)?),
        };

        Ok(summary)
    }

    fn analyse_working(&self, view: &BudgetView, input: &CashFlowInput) -> Result<WorkingSummary> {
        let analysis = analyse_with(&self.classifier, input);
        let emergency_fund = emergency_fund_check(view.emergency_fund_amount_inr, analysis.total_expenses)?;
        let additional_recommendations = additional_recommendations(view, emergency_fund.as_ref());

        debug!(
            net_cash_flow = analysis.net_cash_flow,
            suggestions = analysis.optimization_areas.len(),
            "Working analysis complete"
        );

        Ok(WorkingSummary {
            cash_flow_status: CashFlowStatus::from_net(analysis.net_cash_flow),
            surplus_or_deficit_amount_inr: analysis.net_cash_flow,
            analysis,
            emergency_fund,
            high_interest_debt_flag: view.high_interest_debt,
            additional_recommendations,
        })
    }
}

impl Default for BudgetOptimizer {
    fn default() -> Self {
        Self::new(SpendingClassifier::default())
    }
}

fn analyse_retired(view: &BudgetView, inputs: &RetirementInputs) -> Result<RetiredSummary> {
    let withdrawal = inputs.evaluate()?;
    let emergency_fund = emergency_fund_check(view.emergency_fund_amount_inr, inputs.monthly_drawdown())?;
    let additional_recommendations = additional_recommendations(view, emergency_fund.as_ref());

    debug!(
        withdrawal_rate_percent = withdrawal.withdrawal_rate_percent,
        risk_flag = withdrawal.risk_flag.is_some(),
        "Retirement analysis complete"
    );

    Ok(RetiredSummary {
        withdrawal,
        annual_withdrawal_inr: inputs.annual_withdrawal_inr,
        corpus_inr: inputs.corpus_inr,
        emergency_fund,
        high_interest_debt_flag: view.high_interest_debt,
        additional_recommendations,
    })
}

/// Coverage of monthly outflow by the emergency fund, when both are known.
fn emergency_fund_check(fund: Option<f64>, monthly_outflow: f64) -> Result<Option<EmergencyFundCheck>> {
    let Some(fund) = fund else {
        return Ok(None);
    };
    if monthly_outflow <= 0.0 {
        return Ok(None);
    }

    let months_covered = ensure_finite("emergency_fund.months_covered", fund / monthly_outflow)?;
    let shortfall_inr = ensure_finite(
        "emergency_fund.shortfall_inr",
        (EMERGENCY_FUND_TARGET_MONTHS * monthly_outflow - fund).max(0.0),
    )?;

    Ok(Some(EmergencyFundCheck {
        months_covered,
        target_months: EMERGENCY_FUND_TARGET_MONTHS,
        sufficient: months_covered >= EMERGENCY_FUND_TARGET_MONTHS,
        shortfall_inr,
    }))
}

fn additional_recommendations(view: &BudgetView, emergency_fund: Option<&EmergencyFundCheck>) -> Vec<String> {
    let mut recommendations = Vec::new();

    if view.high_interest_debt {
        recommendations.push(HIGH_INTEREST_DEBT_RECOMMENDATION.to_string());
    }

    if let Some(check) = emergency_fund.filter(|c| !c.sufficient) {
        recommendations.push(format!(
            "Strengthen your emergency fund: it covers {:.1} of the recommended {:.0} months. Build it up by about {}.",
            check.months_covered,
            check.target_months,
            format_inr(check.shortfall_inr)
        ));
    }

    recommendations
}

fn ensure_finite(field: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(BudgetError::InvalidInput(format!(
            "{} is not representable; amounts are too large",
            field
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GoalFundingStatus;
    use crate::state::{DEBT_FLAG_KEY, SUMMARY_KEY};
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use serde_json::{json, Value};

    fn doc(value: Value) -> FinancialStateDocument {
        FinancialStateDocument::from_value(value).unwrap()
    }

    fn working_example() -> FinancialStateDocument {
        doc(json!({
            "user_status": "Working",
            "client_id": "c-1042",
            "goals": [{"name": "house", "target_inr": 2500000}],
            "cash_flow": {
                "monthly_net_income_inr": 85000,
                "fixed_expenses_inr": 44000,
                "variable_expenses_inr": 2000,
                "discretionary_spending_inr": 26000,
                "target_savings_inr": 0
            }
        }))
    }

    fn retired_example() -> FinancialStateDocument {
        doc(json!({
            "user_status": "Retired",
            "client_id": "c-2210",
            "retirement": {
                "annual_withdrawal_inr": 62000,
                "corpus_inr": 1000000
            }
        }))
    }

    #[test]
    fn test_working_end_to_end() {
        let agent = BudgetOptimizer::default();
        let updated = agent.run(&working_example()).unwrap();

        let summary = updated.get(SUMMARY_KEY).unwrap();
        assert_eq!(summary["user_status"], json!("Working"));
        assert_eq!(summary["net_cash_flow_inr"], json!(13000.0));
        assert_eq!(summary["goal_funding_status"], json!("On track"));
        assert_eq!(summary["funding_shortfall_inr"], json!(0.0));
        assert_eq!(summary["cash_flow_status"], json!("Surplus"));
        assert_eq!(summary["optimization_areas"].as_array().unwrap().len(), 2);
        assert_eq!(summary["high_interest_debt_flag"], json!(false));
        assert!(updated.get(DEBT_FLAG_KEY).is_none());
    }

    #[test]
    fn test_retired_end_to_end() {
        let agent = BudgetOptimizer::default();
        let updated = agent.run(&retired_example()).unwrap();

        let summary = updated.get(SUMMARY_KEY).unwrap();
        assert_eq!(summary["user_status"], json!("Retired"));
        assert_eq!(summary["withdrawal_rate_percent"], json!(6.2));
        assert_eq!(summary["risk_flag"], json!("High withdrawal rate"));
        assert_eq!(summary["goal_funding_status"], json!("Shortfall"));
        assert_eq!(updated.get(DEBT_FLAG_KEY), Some(&json!(true)));
    }

    #[test]
    fn test_unknown_status_leaves_document_unchanged() {
        let agent = BudgetOptimizer::default();
        let original = doc(json!({"user_status": "Unknown", "client_id": "c-9"}));
        let before = original.clone();

        let err = agent.run(&original).unwrap_err();
        assert!(matches!(err, BudgetError::UnknownStatus(_)));
        assert_eq!(original, before);
        assert!(original.get(SUMMARY_KEY).is_none());
    }

    #[test]
    fn test_zero_corpus_is_invalid_corpus() {
        let agent = BudgetOptimizer::default();
        let original = doc(json!({
            "user_status": "Retired",
            "retirement": {"monthly_pension_or_drawdown_inr": 40000, "corpus_inr": 0}
        }));

        let err = agent.run(&original).unwrap_err();
        assert!(matches!(err, BudgetError::InvalidCorpus(_)));
    }

    #[test]
    fn test_overflowing_amounts_are_rejected() {
        let agent = BudgetOptimizer::default();
        let original = doc(json!({
            "user_status": "Working",
            "cash_flow": {
                "monthly_net_income_inr": 1.0,
                "fixed_expenses_inr": 1.5e308,
                "variable_expenses_inr": 1.5e308,
                "discretionary_spending_inr": 0.0
            }
        }));

        let err = agent.run(&original).unwrap_err();
        assert!(matches!(err, BudgetError::InvalidInput(_)));
    }

    #[test]
    fn test_high_interest_debt_sets_flag_and_recommendation() {
        let agent = BudgetOptimizer::default();
        let mut fields = working_example().fields().clone();
        fields.insert(
            "debts".to_string(),
            json!([{"name": "personal loan", "interest_rate_percent": 18.0}]),
        );

        let updated = agent.run(&FinancialStateDocument::from_map(fields)).unwrap();
        let summary = updated.get(SUMMARY_KEY).unwrap();

        assert_eq!(updated.get(DEBT_FLAG_KEY), Some(&json!(true)));
        assert_eq!(summary["high_interest_debt_flag"], json!(true));
        let recs = summary["additional_recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 1);
        assert!(recs[0].as_str().unwrap().starts_with("Prioritise repaying high-interest EMIs"));
        // The analyser's own suggestions are unchanged.
        assert_eq!(summary["optimization_areas"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_emergency_fund_shortfall() {
        let agent = BudgetOptimizer::default();
        let mut fields = working_example().fields().clone();
        fields.insert("emergency_fund_amount_inr".to_string(), json!(144000));

        let updated = agent.run(&FinancialStateDocument::from_map(fields)).unwrap();
        let summary = updated.get(SUMMARY_KEY).unwrap();

        assert_eq!(summary["emergency_fund"]["months_covered"], json!(2.0));
        assert_eq!(summary["emergency_fund"]["sufficient"], json!(false));
        assert_eq!(summary["emergency_fund"]["shortfall_inr"], json!(288000.0));
        let recs = summary["additional_recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 1);
        assert!(recs[0].as_str().unwrap().contains("₹288,000.00"));
    }

    #[test]
    fn test_retired_emergency_fund_uses_drawdown() {
        let view = BudgetView {
            profile: ClientProfile::Retired(RetirementInputs {
                annual_withdrawal_inr: 360_000.0,
                corpus_inr: 10_000_000.0,
            }),
            emergency_fund_amount_inr: Some(240_000.0),
            high_interest_debt: false,
        };

        let BudgetSummary::Retired(summary) = BudgetOptimizer::default().analyse(&view).unwrap() else {
            panic!("expected retired summary");
        };
        let check = summary.emergency_fund.unwrap();
        assert_eq!(check.months_covered, 8.0);
        assert!(check.sufficient);
        assert_eq!(check.shortfall_inr, 0.0);
        assert!(summary.additional_recommendations.is_empty());
        assert_eq!(summary.withdrawal.goal_funding_status, GoalFundingStatus::OnTrack);
    }

    #[test]
    fn test_emergency_fund_coverage_overflow_is_rejected() {
        let view = BudgetView {
            profile: ClientProfile::Retired(RetirementInputs {
                annual_withdrawal_inr: 1e-300,
                corpus_inr: 1_000_000.0,
            }),
            emergency_fund_amount_inr: Some(1e10),
            high_interest_debt: false,
        };

        let err = BudgetOptimizer::default().analyse(&view).unwrap_err();
        assert!(matches!(err, BudgetError::InvalidInput(_)));
    }

    #[test]
    fn test_emergency_fund_target_overflow_is_rejected() {
        let mut fields = working_example().fields().clone();
        fields.insert(
            "cash_flow".to_string(),
            json!({
                "monthly_net_income_inr": 1.0e308,
                "fixed_expenses_inr": 1.0e308,
                "variable_expenses_inr": 0.0,
                "discretionary_spending_inr": 0.0
            }),
        );
        fields.insert("emergency_fund_amount_inr".to_string(), json!(1000));

        let err = BudgetOptimizer::default()
            .run(&FinancialStateDocument::from_map(fields))
            .unwrap_err();
        assert!(matches!(err, BudgetError::InvalidInput(_)));
    }

    #[test]
    fn test_untouched_fields_keep_exact_numbers_and_order() {
        let raw = r#"{"user_status":"Working","account_no":123456789012345678901234567890,"fx_rate":0.1000000000000000000001,"cash_flow":{"monthly_net_income_inr":85000,"fixed_expenses_inr":44000,"variable_expenses_inr":2000,"discretionary_spending_inr":26000},"zeta":{"b":1,"a":2}}"#;
        let input = FinancialStateDocument::from_json_str(raw).unwrap();

        let out = BudgetOptimizer::default()
            .run(&input)
            .unwrap()
            .to_json_string(false)
            .unwrap();

        assert!(out.starts_with(r#"{"user_status":"Working","account_no":123456789012345678901234567890,"fx_rate":0.1000000000000000000001,"cash_flow":{"monthly_net_income_inr":85000,"#));
        assert!(out.contains(r#""zeta":{"b":1,"a":2}"#));

        let zeta = out.find(r#""zeta""#).unwrap();
        let summary = out.find(r#""budget_analysis_summary""#).unwrap();
        assert!(zeta < summary);
    }

    #[test]
    fn test_retired_document_ignores_stale_cash_flow() {
        let mut fields = retired_example().fields().clone();
        fields.insert("cash_flow".to_string(), json!({"monthly_net_income_inr": "n/a"}));

        assert!(BudgetOptimizer::default()
            .run(&FinancialStateDocument::from_map(fields))
            .is_ok());
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_pipeline_is_idempotent_and_non_destructive(
            income in 0u32..2_000_000,
            fixed in 0u32..1_000_000,
            variable in 0u32..1_000_000,
            discretionary in 0u32..1_000_000,
            target in 0u32..200_000,
            extra in proptest::collection::btree_map("[a-z]{1,8}", 0i64..1000, 0..6)
        ) {
            let mut value = json!({
                "user_status": "Working",
                "cash_flow": {
                    "monthly_net_income_inr": income,
                    "fixed_expenses_inr": fixed,
                    "variable_expenses_inr": variable,
                    "discretionary_spending_inr": discretionary,
                    "target_savings_inr": target
                }
            });
            for (k, v) in &extra {
                value[format!("x_{k}")] = json!(v);
            }
            let original = doc(value);
            let agent = BudgetOptimizer::default();

            let once = agent.run(&original).unwrap();
            let twice = agent.run(&once).unwrap();
            prop_assert_eq!(once.get(SUMMARY_KEY), twice.get(SUMMARY_KEY));

            for (key, v) in original.fields() {
                prop_assert_eq!(once.get(key), Some(v));
            }
            for key in once.fields().keys() {
                prop_assert!(
                    original.get(key).is_some() || key == SUMMARY_KEY || key == DEBT_FLAG_KEY
                );
            }
        }
    }
}

//! Financial State Object (FSO) handling
//!
//! The FSO is owned by the surrounding pipeline. This module reads a narrow,
//! typed view of the keys the budget analysis needs and writes back exactly
//! two keys. Every other key travels through the passthrough map untouched.
//!
//! Documents are treated as immutable snapshots: merging returns a new
//! document and leaves the input as it was.

use crate::error::BudgetError;
use crate::models::{non_negative_amount, BudgetSummary, CashFlowInput, UserStatus};
use crate::retirement::RetirementInputs;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::io::Write;
use tracing::debug;

pub const SUMMARY_KEY: &str = "budget_analysis_summary";
pub const DEBT_FLAG_KEY: &str = "debt_flag";

pub const USER_STATUS_KEY: &str = "user_status";
pub const CASH_FLOW_KEY: &str = "cash_flow";
pub const RETIREMENT_KEY: &str = "retirement";
pub const EMERGENCY_FUND_KEY: &str = "emergency_fund_amount_inr";
pub const HIGH_INTEREST_DEBT_KEY: &str = "high_interest_debt";
pub const DEBTS_KEY: &str = "debts";

/// Annual interest rate at or above which a debt counts as high-interest
pub const HIGH_INTEREST_RATE_PERCENT: f64 = 12.0;

/// A snapshot of the shared financial-state document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FinancialStateDocument {
    fields: Map<String, Value>,
}

impl FinancialStateDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(fields: Map<String, Value>) -> Self {
        Self { fields }
    }

    /// Accepts only a JSON object at the top level.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(BudgetError::InvalidInput(format!(
                "financial state document must be a JSON object, got {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| BudgetError::InvalidInput(format!("malformed document: {}", e)))?;
        Self::from_value(value)
    }

    pub fn to_json_string(&self, pretty: bool) -> Result<String> {
        let out = if pretty {
            serde_json::to_string_pretty(&self.fields)?
        } else {
            serde_json::to_string(&self.fields)?
        };
        Ok(out)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }

    /// Hex SHA-256 of the serialized document.
    ///
    /// Keys hash in document order, so the fingerprint matches the bytes
    /// `to_json_string(false)` would emit.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();

        if serde_json::to_writer(&mut HashWriter(&mut hasher), &self.fields).is_err() {
            return String::new();
        }

        hex::encode(hasher.finalize())
    }

    /// Return a new snapshot with the summary merged in.
    ///
    /// Sets `budget_analysis_summary`, and `debt_flag = true` when the summary
    /// raises it. An existing `debt_flag` is otherwise left alone. The summary
    /// is serialized before anything is copied, so a failure leaves no partial
    /// write behind.
    pub fn with_summary(&self, summary: &BudgetSummary) -> Result<Self> {
        let summary_value = serde_json::to_value(summary)?;

        let mut fields = self.fields.clone();
        fields.insert(SUMMARY_KEY.to_string(), summary_value);
        if summary.raises_debt_flag() {
            fields.insert(DEBT_FLAG_KEY.to_string(), Value::Bool(true));
        }

        debug!(
            user_status = %summary.user_status(),
            debt_flag = summary.raises_debt_flag(),
            key_count = fields.len(),
            "Merged budget summary into document"
        );

        Ok(Self { fields })
    }
}

impl From<Map<String, Value>> for FinancialStateDocument {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_map(fields)
    }
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

//
// ================= Typed View =================
//

/// Status-specific inputs read from the document.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientProfile {
    Working(CashFlowInput),
    Retired(RetirementInputs),
}

impl ClientProfile {
    pub fn user_status(&self) -> UserStatus {
        match self {
            ClientProfile::Working(_) => UserStatus::Working,
            ClientProfile::Retired(_) => UserStatus::Retired,
        }
    }
}

/// The subset of the FSO the budget analysis reads.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetView {
    pub profile: ClientProfile,
    pub emergency_fund_amount_inr: Option<f64>,
    pub high_interest_debt: bool,
}

#[derive(Debug, Deserialize)]
struct DebtEntry {
    #[serde(default)]
    interest_rate_percent: Option<f64>,
}

impl BudgetView {
    /// Extract and validate the fields relevant to the client's status.
    ///
    /// Only the section for the declared status is read: a retired client's
    /// document is not rejected over a stale `cash_flow` block.
    pub fn from_document(doc: &FinancialStateDocument) -> Result<Self> {
        let status = match doc.get(USER_STATUS_KEY) {
            None | Some(Value::Null) => {
                return Err(BudgetError::InvalidInput(format!(
                    "missing required field `{}`",
                    USER_STATUS_KEY
                )))
            }
            Some(Value::String(s)) => s.parse::<UserStatus>()?,
            Some(other) => {
                return Err(BudgetError::InvalidInput(format!(
                    "`{}` must be a string, got {}",
                    USER_STATUS_KEY,
                    json_type_name(other)
                )))
            }
        };

        let profile = match status {
            UserStatus::Working => ClientProfile::Working(required_section(doc, CASH_FLOW_KEY)?),
            UserStatus::Retired => ClientProfile::Retired(required_section(doc, RETIREMENT_KEY)?),
        };

        let emergency_fund_amount_inr = match optional_section::<f64>(doc, EMERGENCY_FUND_KEY)? {
            Some(amount) => Some(non_negative_amount(EMERGENCY_FUND_KEY, amount)?),
            None => None,
        };

        let declared_debt = optional_section::<bool>(doc, HIGH_INTEREST_DEBT_KEY)?.unwrap_or(false);
        let debts = optional_section::<Vec<DebtEntry>>(doc, DEBTS_KEY)?.unwrap_or_default();
        let listed_debt = debts.iter().any(|d| {
            d.interest_rate_percent
                .is_some_and(|rate| rate >= HIGH_INTEREST_RATE_PERCENT)
        });

        Ok(Self {
            profile,
            emergency_fund_amount_inr,
            high_interest_debt: declared_debt || listed_debt,
        })
    }
}

fn required_section<T: DeserializeOwned>(doc: &FinancialStateDocument, key: &str) -> Result<T> {
    optional_section(doc, key)?.ok_or_else(|| {
        BudgetError::InvalidInput(format!("missing required field `{}`", key))
    })
}

fn optional_section<T: DeserializeOwned>(
    doc: &FinancialStateDocument,
    key: &str,
) -> Result<Option<T>> {
    match doc.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value.clone())
            .map(Some)
            .map_err(|e| BudgetError::InvalidInput(format!("`{}`: {}", key, e))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

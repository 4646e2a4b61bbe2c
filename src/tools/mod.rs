//! Tool trait and registry
//!
//! Tools are deterministic, side-effect-free operations callable without a
//! full financial-state document. Parameters are validated here, before the
//! analysis code is reached.

use crate::classifier::spending_categorizer_and_analyser;
use crate::error::BudgetError;
use crate::models::{CashFlowInput, ToolInput, ToolOutput};
use crate::retirement::evaluate_withdrawal;
use crate::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

/// Trait for a single tool (deterministic execution)
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput>;
}

/// Tool registry for looking up and executing tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, sorted.
    pub fn list(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tools.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Look up a tool by name and run it.
    pub async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let tool = self
            .get(&input.tool_name)
            .ok_or_else(|| BudgetError::ToolNotFound(input.tool_name.clone()))?;
        tool.execute(input).await
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_object_parameters(input: &ToolInput) -> Result<()> {
    if input.parameters.is_object() {
        Ok(())
    } else {
        Err(BudgetError::InvalidToolInput(
            "tool_input must be a JSON object".to_string(),
        ))
    }
}

fn parse_parameters<T: DeserializeOwned>(input: &ToolInput) -> Result<T> {
    ensure_object_parameters(input)?;
    serde_json::from_value(input.parameters.clone()).map_err(|e| {
        BudgetError::InvalidToolInput(format!("{}: {}", input.tool_name, e))
    })
}

/// Cash-flow categorisation and analysis for a working client.
pub struct SpendingAnalyserTool;

#[async_trait::async_trait]
impl Tool for SpendingAnalyserTool {
    fn name(&self) -> &'static str {
        "spending_categorizer_and_analyser"
    }

    fn description(&self) -> &'static str {
        "Compute surplus/deficit, goal funding status and optimization areas from monthly income and expenses"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let cash_flow: CashFlowInput = parse_parameters(input)?;
        let analysis = spending_categorizer_and_analyser(&cash_flow);

        Ok(ToolOutput {
            success: true,
            data: serde_json::to_value(analysis)?,
            error: None,
        })
    }
}

#[derive(Debug, Deserialize)]
struct WithdrawalParameters {
    annual_withdrawal_inr: f64,
    corpus_inr: f64,
}

/// Withdrawal-rate safety check for a retired client.
pub struct WithdrawalRateTool;

#[async_trait::async_trait]
impl Tool for WithdrawalRateTool {
    fn name(&self) -> &'static str {
        "withdrawal_rate_evaluator"
    }

    fn description(&self) -> &'static str {
        "Compare an annual withdrawal against the retirement corpus using the 4% safe-withdrawal threshold"
    }

    async fn execute(&self, input: &ToolInput) -> Result<ToolOutput> {
        let params: WithdrawalParameters = parse_parameters(input)?;
        let result = evaluate_withdrawal(params.annual_withdrawal_inr, params.corpus_inr)?;

        Ok(ToolOutput {
            success: true,
            data: serde_json::to_value(result)?,
            error: None,
        })
    }
}

/// Create a registry with the budget analysis tools.
pub fn create_default_registry() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(SpendingAnalyserTool));
    registry.register(Arc::new(WithdrawalRateTool));
    registry
}

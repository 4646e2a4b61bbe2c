//! Budget Optimizer Agent
//!
//! A deterministic budget and withdrawal analysis stage for an FSO-driven
//! financial planning pipeline:
//! - Aggregates monthly income and expenses into surplus/deficit
//! - Classifies spending against rule-of-thumb thresholds (50/30/20)
//! - Checks retirement withdrawal rates against the 4% guideline
//! - Merges the result into the Financial State Object without touching
//!   unrelated keys
//!
//! FLOW:
//! DOCUMENT → VIEW → ROUTE → ANALYSE → MERGE

pub mod agent;
pub mod api;
pub mod cashflow;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod retirement;
pub mod state;
pub mod tools;

pub use error::{BudgetError, Result};

// Re-export common types
pub use models::*;
pub use agent::BudgetOptimizer;
pub use classifier::spending_categorizer_and_analyser;
pub use state::{BudgetView, FinancialStateDocument};

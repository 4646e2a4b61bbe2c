//! Command-line processing for the `budget-optimizer` binary
//!
//! The updated document is written only when the analysis succeeds, so a
//! failed run leaves the output stream empty.

use crate::agent::BudgetOptimizer;
use crate::state::FinancialStateDocument;
use crate::Result;
use std::io::{Read, Write};
use tracing::{error, info};

/// Read one FSO document, analyse it and write the updated document.
pub fn process<R: Read, W: Write>(
    agent: &BudgetOptimizer,
    mut reader: R,
    mut writer: W,
    pretty: bool,
) -> Result<()> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;

    let document = FinancialStateDocument::from_json_str(&raw)?;
    info!(fingerprint = %document.fingerprint(), "Loaded financial state document");

    let updated = agent.run(&document).map_err(|e| {
        error!(kind = e.kind(), "Budget analysis failed");
        e
    })?;

    let out = updated.to_json_string(pretty)?;
    writeln!(writer, "{}", out)?;
    writer.flush()?;
    Ok(())
}

//! Validate and optionally evaluate plumb scripts

use crate::{parse, Evaluator, Scope};

use super::{scope_to_json, CliError};

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// The script text to check
    pub script: String,
    /// Evaluate against an empty scope after parsing
    pub eval: bool,
    /// Produce machine-readable JSON instead of plain text
    pub json: bool,
}

/// Result of a check operation
#[derive(Debug)]
pub enum CheckResult {
    /// Syntax validation passed
    SyntaxValid,
    /// Script evaluated; the declared bindings as JSON
    Evaluated(serde_json::Value),
}

/// Execute a plumb check operation
pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let root = parse(&options.script)?;

    if !options.eval {
        return Ok(CheckResult::SyntaxValid);
    }

    let mut scope = Scope::new();
    let mut evaluator = Evaluator::new();
    evaluator.eval(&root, &mut scope)?;

    Ok(CheckResult::Evaluated(scope_to_json(&scope)))
}

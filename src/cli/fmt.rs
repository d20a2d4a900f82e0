//! Canonical formatting of plumb scripts

use std::fs;
use std::path::PathBuf;

use crate::ast::format;

use super::CliError;

/// Options for the fmt command
#[derive(Debug, Clone, Default)]
pub struct FmtOptions {
    /// Script file to format
    pub path: Option<PathBuf>,
    /// Script text, when reading from stdin instead of a file
    pub script: Option<String>,
    /// Rewrite the file in place instead of printing
    pub write: bool,
}

/// Result of a fmt operation
#[derive(Debug, PartialEq)]
pub enum FmtResult {
    /// The canonical text, to be printed
    Formatted(String),
    /// The file was rewritten in place
    Rewritten,
    /// The file was already canonical; nothing written
    Unchanged,
}

/// Execute a plumb fmt operation
pub fn execute_fmt(options: &FmtOptions) -> Result<FmtResult, CliError> {
    let source = match (&options.path, &options.script) {
        (Some(path), _) => fs::read_to_string(path)?,
        (None, Some(script)) => script.clone(),
        (None, None) => return Err(CliError::NoInput),
    };

    let formatted = format(&source)?;

    if options.write {
        let path = options.path.as_ref().ok_or(CliError::NoInput)?;
        if formatted == source {
            return Ok(FmtResult::Unchanged);
        }
        fs::write(path, &formatted)?;
        return Ok(FmtResult::Rewritten);
    }

    Ok(FmtResult::Formatted(formatted))
}

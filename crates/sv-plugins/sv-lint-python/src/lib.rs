//! # sv-lint-python
//!
//! Validates submitted snippets by parsing them as Python programs.
//! A submission is accepted only when it is a well-formed program; a parse
//! failure is reported with the offending line and the parser's reason.

use rustpython_parser::parser::parse_program;
use sv_core::models::LintError;
use sv_core::traits::SnippetLinter;

pub struct PythonLinter;

impl SnippetLinter for PythonLinter {
    fn lint(&self, code: &str) -> Vec<LintError> {
        match parse_program(code, "<submission>") {
            Ok(_) => Vec::new(),
            // the parser stops at the first failure, so one entry per attempt
            Err(err) => vec![LintError {
                line: err.location.row() as usize,
                reason: err.error.to_string(),
            }],
        }
    }
}

//! Post-run log search.
//!
//! Scans captured component output for error patterns. Error matches fail a
//! scenario that has not already failed; warning matches are only counted.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use ranctl_core::error::ConfigError;

/// Default patterns that mark a line as an error.
pub const DEFAULT_ERROR_PATTERNS: &[&str] = &[
    r"(?i)\berror\b",
    r"(?i)\bsegmentation fault\b|\bassert(ion)? failed\b",
];

/// Default patterns that mark a line as a warning.
pub const DEFAULT_WARNING_PATTERNS: &[&str] = &[r"(?i)\bwarning\b"];

/// Upper bound on matched lines kept in the report.
const MAX_REPORTED_MATCHES: usize = 50;

/// A matched error line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogMatch {
    pub component: String,
    /// 1-based line number within the component's captured output.
    pub line_number: usize,
    pub line: String,
}

/// Result of a log search.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogSearchSummary {
    pub errors: usize,
    pub warnings: usize,
    /// First error lines, capped.
    pub matches: Vec<LogMatch>,
}

impl LogSearchSummary {
    pub fn has_errors(&self) -> bool {
        self.errors > 0
    }
}

/// Compiled log search patterns.
#[derive(Debug, Clone)]
pub struct LogSearch {
    errors: Vec<Regex>,
    warnings: Vec<Regex>,
}

impl LogSearch {
    /// Compile custom patterns.
    pub fn new(errors: &[&str], warnings: &[&str]) -> Result<Self, ConfigError> {
        Ok(Self {
            errors: compile(errors, "log_search.error_patterns")?,
            warnings: compile(warnings, "log_search.warning_patterns")?,
        })
    }

    /// Compile the default error and warning patterns.
    pub fn with_default_patterns() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_ERROR_PATTERNS, DEFAULT_WARNING_PATTERNS)
    }

    /// Scan captured logs per component.
    pub fn scan(&self, logs: &BTreeMap<String, Vec<String>>) -> LogSearchSummary {
        let mut summary = LogSearchSummary::default();

        for (component, lines) in logs {
            for (idx, line) in lines.iter().enumerate() {
                if self.errors.iter().any(|re| re.is_match(line)) {
                    summary.errors += 1;
                    if summary.matches.len() < MAX_REPORTED_MATCHES {
                        summary.matches.push(LogMatch {
                            component: component.clone(),
                            line_number: idx + 1,
                            line: line.clone(),
                        });
                    }
                } else if self.warnings.iter().any(|re| re.is_match(line)) {
                    summary.warnings += 1;
                }
            }
        }

        summary
    }
}

fn compile(patterns: &[&str], field: &str) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(p).map_err(|e| ConfigError::InvalidValue {
                field: field.to_owned(),
                reason: format!("invalid regex '{p}': {e}"),
            })
        })
        .collect()
}

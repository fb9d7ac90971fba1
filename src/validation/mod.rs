//! Configuration validation system.

pub mod report;

use crate::config::model::AppConfig;
use crate::process::locate::resolve_program;

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    /// Blocks configuration loading.
    Error,
    /// Logged but allows loading.
    Warning,
}

/// A validation issue found during configuration checking.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Severity of the issue.
    pub severity: ValidationSeverity,
    /// Path to the problematic config field (e.g., "files.patterns[1]").
    pub path: String,
    /// Description of the issue.
    pub message: String,
    /// Optional suggestion for fixing the issue.
    pub suggestion: Option<String>,
}

impl ValidationIssue {
    /// Creates a new error-level validation issue.
    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Error,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Creates a new warning-level validation issue.
    pub fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity: ValidationSeverity::Warning,
            path: path.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    /// Adds a suggestion to this validation issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

/// Result of validating a configuration.
#[derive(Debug, Default)]
pub struct ValidationResult {
    issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Creates an empty validation result.
    pub fn new() -> Self {
        Self { issues: Vec::new() }
    }

    /// Adds an issue to the result.
    pub fn add(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    /// Returns true if there are no errors (warnings are allowed).
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == ValidationSeverity::Error)
    }

    /// Returns an iterator over error-level issues.
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Error)
    }

    /// Returns an iterator over warning-level issues.
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues
            .iter()
            .filter(|i| i.severity == ValidationSeverity::Warning)
    }

    /// Returns the number of errors.
    pub fn error_count(&self) -> usize {
        self.errors().count()
    }
}

/// Validates a configuration.
pub fn validate_config(config: &AppConfig) -> ValidationResult {
    let mut result = ValidationResult::new();

    validate_tool(&config.tools.inspect, "tools.inspect", config.tools.prefer_bundled, &mut result);
    validate_tool(&config.tools.remux, "tools.remux", config.tools.prefer_bundled, &mut result);

    if config.timeouts.inspect_seconds == Some(0) {
        result.add(
            ValidationIssue::error("timeouts.inspect_seconds", "Timeout must be greater than zero")
                .with_suggestion("Use null to disable the timeout"),
        );
    }
    if config.timeouts.remux_seconds == Some(0) {
        result.add(
            ValidationIssue::error("timeouts.remux_seconds", "Timeout must be greater than zero")
                .with_suggestion("Use null to disable the timeout"),
        );
    }

    if config.max_parallel == 0 {
        result.add(ValidationIssue::error(
            "max_parallel",
            "At least one file must be processed at a time",
        ));
    }

    if config.files.patterns.is_empty() {
        result.add(
            ValidationIssue::warning(
                "files.patterns",
                "No file pattern, directories will yield no file",
            )
            .with_suggestion("Add a pattern such as '*.mkv'"),
        );
    }
    for (i, pattern) in config.files.patterns.iter().enumerate() {
        if let Err(e) = glob::Pattern::new(pattern) {
            result.add(ValidationIssue::error(
                format!("files.patterns[{}]", i),
                format!("Invalid file pattern '{}': {}", pattern, e),
            ));
        }
    }

    result
}

/// Checks that a tool is named and can be found.
fn validate_tool(program: &str, path: &str, prefer_bundled: bool, result: &mut ValidationResult) {
    if program.trim().is_empty() {
        result.add(ValidationIssue::error(path, "Tool name cannot be empty"));
        return;
    }

    if !resolve_program(program, prefer_bundled).is_file() {
        result.add(
            ValidationIssue::warning(path, format!("'{}' was not found", program))
                .with_suggestion("Install MKVToolNix or set the tool path explicitly"),
        );
    }
}

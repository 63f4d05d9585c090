//! Diagnostics for pagegrid
//!
//! Structures for reporting errors, warnings, and informational messages
//! found while validating or emitting a document. Locations are IR paths
//! such as `/pages/0/elements/2/area`.

use serde::{Deserialize, Serialize};

/// A diagnostic message
///
/// Diagnostics represent issues found during validation or emission.
/// They can range from fatal errors to informational hints.
///
/// # Example
///
/// ```
/// use pagegrid_core::diagnostics::{Diagnostic, Severity};
///
/// let diag = Diagnostic::new(Severity::Error, "Duplicate element id 'logo'")
///     .with_code("PG011")
///     .with_path("/pages/1/elements/0/id")
///     .with_help("Element ids must be unique across the document");
/// assert!(diag.is_error());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level of the diagnostic
    pub severity: Severity,

    /// The diagnostic message
    pub message: String,

    /// Optional validator code (e.g., "PG001")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// IR path of the offending value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Additional help text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,

    /// Related notes or secondary locations
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

/// Severity level of a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Reported, but emission goes ahead
    Warning,

    /// Blocks emission
    Error,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            code: None,
            path: None,
            help: None,
            notes: Vec::new(),
        }
    }

    /// Create an error diagnostic
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    /// Set the diagnostic code
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Set the IR path
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set help text
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Add a note
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Check if this is an error-level diagnostic
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    /// Check if this is a warning-level diagnostic
    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: severity[code]: message
        write!(f, "{}", self.severity)?;
        if let Some(ref code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)?;

        // Add location if available
        if let Some(ref path) = self.path {
            write!(f, "\n  --> {}", path)?;
        }

        // Add help text
        if let Some(ref help) = self.help {
            write!(f, "\n  = help: {}", help)?;
        }

        // Add notes
        for note in &self.notes {
            write!(f, "\n  = note: {}", note)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "Test error");
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "Test error");
        assert!(diag.code.is_none());
    }

    #[test]
    fn test_diagnostic_builder() {
        let diag = Diagnostic::error("Alpha out of range 0.0-1.0")
            .with_code("PG020")
            .with_path("/pages/0/elements/3/payload/alpha")
            .with_help("Use a value between 0.0 and 1.0");

        assert!(diag.is_error());
        assert_eq!(diag.code, Some("PG020".to_string()));
        assert_eq!(
            diag.path.as_deref(),
            Some("/pages/0/elements/3/payload/alpha")
        );
    }

    #[test]
    fn test_severity_order() {
        assert!(Severity::Warning < Severity::Error);
        assert!(Diagnostic::warning("w").is_warning());
        assert!(!Diagnostic::warning("w").is_error());
        assert!(Diagnostic::error("e").is_error());
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let json = r#"{"severity":"fatal","message":"x"}"#;
        assert!(serde_json::from_str::<Diagnostic>(json).is_err());
    }

    #[test]
    fn test_diagnostic_display() {
        let diag = Diagnostic::warning("Figure asset not found")
            .with_code("PG030")
            .with_path("/pages/0/elements/1/payload/src")
            .with_note("looked for img/missing.png");

        let display = format!("{}", diag);
        assert!(display.starts_with("warning[PG030]: Figure asset not found"));
        assert!(display.contains("--> /pages/0/elements/1/payload/src"));
        assert!(display.contains("note: looked for img/missing.png"));
    }

    #[test]
    fn test_diagnostic_serialize() {
        let diag = Diagnostic::warning("Unknown element type 'chart'").with_code("PG012");

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("\"severity\":\"warning\""));
        assert!(json.contains("\"code\":\"PG012\""));
        assert!(!json.contains("\"path\""));

        let restored: Diagnostic = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.severity, Severity::Warning);
        assert_eq!(restored.code, Some("PG012".to_string()));
    }
}

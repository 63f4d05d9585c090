//! pagegrid-validate - Document validation engine
//!
//! This crate provides a pluggable validation engine for checking the page
//! IR before it is emitted.
//!
//! # Architecture
//!
//! The validation engine uses a trait-based design where individual validators
//! implement the `Validator` trait. The `ValidationEngine` orchestrates running
//! all registered validators and collecting diagnostics into a
//! [`ValidationReport`].
//!
//! # Example
//!
//! ```
//! use pagegrid_validate::{ValidationEngine, PageStructureValidator};
//! use pagegrid_ast::Document;
//!
//! let mut engine = ValidationEngine::new();
//! engine.add_validator(Box::new(PageStructureValidator));
//!
//! let doc = Document::new();
//! let report = engine.report(&doc);
//! assert!(!report.ok());
//! ```

pub mod elements;
pub mod structure;
pub mod styles;

use std::path::PathBuf;

use pagegrid_ast::Document;
use pagegrid_core::diagnostics::Diagnostic;
use serde::Serialize;
use serde_json::Value;

// Re-export validators
pub use elements::{AssetValidator, ElementValidator};
pub use structure::PageStructureValidator;
pub use styles::StyleValidator;

/// Trait for document validators
///
/// Validators inspect a document and return a list of diagnostics
/// for any issues found. Each validator has a unique code prefix
/// for its diagnostics.
pub trait Validator: Send + Sync {
    /// Get the validator's unique code (e.g., "PG00" for page structure)
    fn code(&self) -> &'static str;

    /// Get a human-readable name for this validator
    fn name(&self) -> &'static str {
        "unnamed"
    }

    /// Validate the document and return any diagnostics
    fn validate(&self, doc: &Document) -> Vec<Diagnostic>;
}

/// Settings for the default validator set
#[derive(Debug, Clone, Default)]
pub struct ValidationOptions {
    /// Report missing assets as errors instead of warnings
    pub strict_assets: bool,
    /// Directory relative asset paths are resolved against (cwd when unset)
    pub base_dir: Option<PathBuf>,
}

/// The outcome of a validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// True when no diagnostic is an error
    pub fn ok(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.is_error())
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Validation engine that orchestrates multiple validators
///
/// The engine manages a collection of validators and runs them
/// against documents, collecting all diagnostics.
pub struct ValidationEngine {
    /// Registered validators
    validators: Vec<Box<dyn Validator>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationEngine {
    /// Create a new empty validation engine
    pub fn new() -> Self {
        Self {
            validators: Vec::new(),
        }
    }

    /// Create an engine with default validators
    pub fn with_defaults() -> Self {
        Self::with_options(ValidationOptions::default())
    }

    /// Create an engine with the default validators configured by `options`
    pub fn with_options(options: ValidationOptions) -> Self {
        let mut engine = Self::new();
        engine.add_validator(Box::new(PageStructureValidator));
        engine.add_validator(Box::new(ElementValidator));
        engine.add_validator(Box::new(AssetValidator::new(
            options.strict_assets,
            options.base_dir,
        )));
        engine.add_validator(Box::new(StyleValidator));
        engine
    }

    /// Add a validator to the engine
    pub fn add_validator(&mut self, validator: Box<dyn Validator>) {
        self.validators.push(validator);
    }

    /// Get the number of registered validators
    pub fn validator_count(&self) -> usize {
        self.validators.len()
    }

    /// Get the names of all registered validators
    pub fn validator_names(&self) -> Vec<&'static str> {
        self.validators.iter().map(|v| v.name()).collect()
    }

    /// Validate a document using all registered validators
    ///
    /// Returns a vector of all diagnostics from all validators.
    pub fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for validator in &self.validators {
            let validator_diagnostics = validator.validate(doc);
            log::debug!(
                "Validator {} reported {} diagnostics",
                validator.name(),
                validator_diagnostics.len()
            );
            diagnostics.extend(validator_diagnostics);
        }

        diagnostics
    }

    /// Validate and wrap the diagnostics in a report
    pub fn report(&self, doc: &Document) -> ValidationReport {
        ValidationReport {
            diagnostics: self.validate(doc),
        }
    }

    /// Check if a document has any errors
    pub fn has_errors(&self, doc: &Document) -> bool {
        self.validate(doc).iter().any(|d| d.is_error())
    }

    /// Check if a document has any warnings or errors
    pub fn has_issues(&self, doc: &Document) -> bool {
        !self.validate(doc).is_empty()
    }
}

/// Page keys every serialized page must carry
pub const REQUIRED_PAGE_KEYS: [&str; 4] = ["id", "title", "page_size", "grid"];

/// Shape checks on a serialized IR that the typed model cannot express
///
/// Reports a missing or empty `pages` array and pages lacking required
/// keys. Typed validation only makes sense when this returns no errors.
pub fn validate_json(ir: &Value) -> Vec<Diagnostic> {
    let Some(root) = ir.as_object() else {
        return vec![Diagnostic::error("IR root not an object").with_path("/")];
    };

    let pages = match root.get("pages") {
        None => {
            return vec![Diagnostic::error("Missing pages array")
                .with_code("PG001")
                .with_path("/pages")]
        }
        Some(Value::Array(pages)) if !pages.is_empty() => pages,
        Some(_) => {
            return vec![Diagnostic::error("Pages empty or not a list")
                .with_code("PG001")
                .with_path("/pages")]
        }
    };

    let mut diagnostics = Vec::new();
    for (idx, page) in pages.iter().enumerate() {
        let Some(page) = page.as_object() else {
            diagnostics.push(
                Diagnostic::error("Page not an object").with_path(format!("/pages/{}", idx)),
            );
            continue;
        };
        for key in REQUIRED_PAGE_KEYS {
            if !page.contains_key(key) {
                diagnostics.push(
                    Diagnostic::error("Missing required page key")
                        .with_code("PG001")
                        .with_path(format!("/pages/{}/{}", idx, key)),
                );
            }
        }
    }
    diagnostics
}

/// Validate a serialized IR: shape checks first, then the typed validators
pub fn validate_ir(ir: &Value, options: ValidationOptions) -> ValidationReport {
    let diagnostics = validate_json(ir);
    if diagnostics.iter().any(|d| d.is_error()) {
        return ValidationReport { diagnostics };
    }

    match serde_json::from_value::<Document>(ir.clone()) {
        Ok(doc) => ValidationEngine::with_options(options).report(&doc),
        Err(e) => ValidationReport {
            diagnostics: vec![Diagnostic::error(format!("IR does not match the page model: {}", e))
                .with_path("/")],
        },
    }
}

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

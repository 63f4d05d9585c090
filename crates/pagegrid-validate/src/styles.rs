//! Style declaration validator

use pagegrid_ast::Document;
use pagegrid_core::diagnostics::Diagnostic;
use pagegrid_core::style::parse_style_decl;

use crate::Validator;

/// Whether a length is a bare number that Typst would reject
pub fn lacks_unit(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

/// Validates `STYLE_*` declarations
///
/// Unknown keys and values are warnings and never block emission; bare
/// numbers where Typst expects a length are errors.
///
/// # Diagnostic Codes
///
/// - `PG021`: Unrecognized style property or value (warning)
/// - `PG022`: Style stroke or radius without a unit
pub struct StyleValidator;

impl Validator for StyleValidator {
    fn code(&self) -> &'static str {
        "PG02"
    }

    fn name(&self) -> &'static str {
        "styles"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (key, value) in &doc.meta {
            let Some(name) = key.strip_prefix("STYLE_") else {
                continue;
            };
            let name = name.to_lowercase();
            let path = format!("/meta/{}", key);
            let (style, warnings) = parse_style_decl(value);

            for warning in warnings {
                diagnostics.push(
                    Diagnostic::warning(warning)
                        .with_code("PG021")
                        .with_path(path.clone()),
                );
            }

            let lengths = [("stroke", &style.stroke), ("radius", &style.radius)];
            for (field, length) in lengths {
                if let Some(v) = length.as_deref().filter(|v| lacks_unit(v)) {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "Style '{}' {} length '{}' missing unit",
                            name, field, v
                        ))
                        .with_code("PG022")
                        .with_path(path.clone()),
                    );
                }
            }
        }

        diagnostics
    }
}

//! Page structure validator
//!
//! Checks that the document has pages, that page ids are unique, and that
//! every rendered page shares the single page size the output declares.

use std::collections::HashSet;

use pagegrid_ast::Document;
use pagegrid_core::diagnostics::Diagnostic;

use crate::Validator;

/// Page properties that are resolved per page but cannot change the size
/// of the emitted output
const SIZE_OVERRIDES: [&str; 2] = ["PAGE_SIZE", "ORIENTATION"];

/// Validates page-level structure
///
/// # Diagnostic Codes
///
/// - `PG001`: No pages
/// - `PG002`: Duplicate page id
/// - `PG003`: Rendered pages differ in size
/// - `PG004`: Per-page size overrides are ignored by the output
///
/// # Example
///
/// ```
/// use pagegrid_validate::{Validator, PageStructureValidator};
/// use pagegrid_ast::{Document, Grid, Page, PageSize};
///
/// let mut doc = Document::new();
/// doc.pages.push(Page::new("a", "A", PageSize::new(297.0, 210.0), Grid::new(12, 8)));
///
/// assert!(PageStructureValidator.validate(&doc).is_empty());
/// ```
pub struct PageStructureValidator;

impl Validator for PageStructureValidator {
    fn code(&self) -> &'static str {
        "PG00"
    }

    fn name(&self) -> &'static str {
        "page-structure"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        if doc.pages.is_empty() {
            diagnostics.push(
                Diagnostic::error("Pages empty or not a list")
                    .with_code("PG001")
                    .with_path("/pages"),
            );
            return diagnostics;
        }

        let mut seen = HashSet::new();
        for (idx, page) in doc.pages.iter().enumerate() {
            if !seen.insert(page.id.as_str()) {
                diagnostics.push(
                    Diagnostic::error(format!("Duplicate page id '{}'", page.id))
                        .with_code("PG002")
                        .with_path(format!("/pages/{}/id", idx)),
                );
            }

            let ignored: Vec<&str> = SIZE_OVERRIDES
                .iter()
                .copied()
                .filter(|key| page.props.contains_key(*key))
                .collect();
            if !ignored.is_empty() {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "Per-page overrides ignored: {}",
                        ignored.join(", ")
                    ))
                    .with_code("PG004")
                    .with_path(format!("/pages/{}/ignored_overrides", idx))
                    .with_help("The output declares one page size, taken from the first rendered page"),
                );
            }
        }

        let mut rendered = doc
            .pages
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_master_def());
        if let Some((_, first)) = rendered.next() {
            let expected = first.page_size;
            for (idx, page) in rendered {
                if page.page_size != expected {
                    diagnostics.push(
                        Diagnostic::error(format!(
                            "Non-uniform page size: {}x{}mm differs from first page {}x{}mm",
                            page.page_size.w_mm,
                            page.page_size.h_mm,
                            expected.w_mm,
                            expected.h_mm
                        ))
                        .with_code("PG003")
                        .with_path(format!("/pages/{}/page_size", idx)),
                    );
                }
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegrid_ast::{Grid, Page, PageSize};

    fn page(id: &str, w: f64, h: f64) -> Page {
        Page::new(id, id.to_uppercase(), PageSize::new(w, h), Grid::new(12, 8))
    }

    #[test]
    fn test_empty_document() {
        let diags = PageStructureValidator.validate(&Document::new());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.as_deref(), Some("PG001"));
    }

    #[test]
    fn test_duplicate_page_id() {
        let mut doc = Document::new();
        doc.pages.push(page("intro", 297.0, 210.0));
        doc.pages.push(page("intro", 297.0, 210.0));

        let diags = PageStructureValidator.validate(&doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].message, "Duplicate page id 'intro'");
        assert_eq!(diags[0].path.as_deref(), Some("/pages/1/id"));
    }

    #[test]
    fn test_non_uniform_page_size() {
        let mut doc = Document::new();
        doc.pages.push(page("a", 297.0, 210.0));
        doc.pages.push(page("b", 210.0, 297.0));

        let diags = PageStructureValidator.validate(&doc);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_error());
        assert!(diags[0].message.starts_with("Non-uniform page size"));
    }

    #[test]
    fn test_master_pages_are_not_compared() {
        let mut doc = Document::new();
        let mut master = page("m", 210.0, 297.0);
        master.master_def = Some("base".to_string());
        doc.pages.push(master);
        doc.pages.push(page("a", 297.0, 210.0));
        doc.pages.push(page("b", 297.0, 210.0));

        assert!(PageStructureValidator.validate(&doc).is_empty());
    }

    #[test]
    fn test_ignored_overrides_warning() {
        let mut doc = Document::new();
        let mut p = page("a", 297.0, 210.0);
        p.props.insert("ORIENTATION".to_string(), "landscape".to_string());
        p.props.insert("PAGE_SIZE".to_string(), "A4".to_string());
        doc.pages.push(p);

        let diags = PageStructureValidator.validate(&doc);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_warning());
        assert_eq!(diags[0].message, "Per-page overrides ignored: PAGE_SIZE, ORIENTATION");
        assert!(diags[0].path.as_deref().unwrap().contains("ignored_overrides"));
    }
}

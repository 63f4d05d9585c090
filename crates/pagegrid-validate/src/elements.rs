//! Element validators
//!
//! [`ElementValidator`] checks ids, types, areas, and numeric payload
//! ranges. [`AssetValidator`] checks that referenced files exist.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use pagegrid_ast::{Document, ElementType, Payload};
use pagegrid_core::diagnostics::{Diagnostic, Severity};

use crate::styles::lacks_unit;
use crate::Validator;

fn element_path(page: usize, element: usize) -> String {
    format!("/pages/{}/elements/{}", page, element)
}

/// Validates element ids, types, areas, and payload values
///
/// # Diagnostic Codes
///
/// - `PG011`: Duplicate element id
/// - `PG012`: Unknown element type (warning)
/// - `PG013`: Asset element without a source
/// - `PG015`: Alpha outside `0.0..=1.0`
/// - `PG016`: Area with non-positive values
/// - `PG017`: Area beyond the total grid
/// - `PG018`: PDF scale not positive
/// - `PG019`: Stroke or radius length without a unit
pub struct ElementValidator;

impl Validator for ElementValidator {
    fn code(&self) -> &'static str {
        "PG01"
    }

    fn name(&self) -> &'static str {
        "elements"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        let mut seen_ids = HashSet::new();

        for (pidx, page) in doc.pages.iter().enumerate() {
            let total = page.total_grid();

            for (eidx, el) in page.elements.iter().enumerate() {
                let epath = element_path(pidx, eidx);

                if !seen_ids.insert(el.id.as_str()) {
                    diagnostics.push(
                        Diagnostic::error(format!("Duplicate element id '{}'", el.id))
                            .with_code("PG011")
                            .with_path(format!("{}/id", epath)),
                    );
                }

                if let ElementType::Unknown(name) = &el.kind {
                    diagnostics.push(
                        Diagnostic::warning(format!("Unknown element type '{}'", name))
                            .with_code("PG012")
                            .with_path(epath.clone()),
                    );
                }

                if let Some(area) = &el.area {
                    if area.x < 1 || area.y < 1 || area.w < 1 || area.h < 1 {
                        diagnostics.push(
                            Diagnostic::error("Area has non-positive values")
                                .with_code("PG016")
                                .with_path(format!("{}/area", epath)),
                        );
                    } else if area.right() > i64::from(total.cols)
                        || area.bottom() > i64::from(total.rows)
                    {
                        diagnostics.push(
                            Diagnostic::error("Area exceeds total-grid bounds")
                                .with_code("PG017")
                                .with_path(format!("{}/area", epath))
                                .with_note(format!(
                                    "total grid is {}x{}",
                                    total.cols, total.rows
                                )),
                        );
                    }
                }

                check_payload(&el.kind, &el.payload, &epath, &mut diagnostics);
            }
        }

        diagnostics
    }
}

fn check_payload(
    kind: &ElementType,
    payload: &Payload,
    epath: &str,
    diagnostics: &mut Vec<Diagnostic>,
) {
    let missing_src = |label: &str| {
        Diagnostic::error(format!("{} element missing src", label))
            .with_code("PG013")
            .with_path(format!("{}/payload/src", epath))
    };

    match payload {
        Payload::Figure(fig) if fig.src.is_none() => diagnostics.push(missing_src("Figure")),
        Payload::Svg(svg) if svg.src.is_none() => diagnostics.push(missing_src("SVG")),
        Payload::Pdf(pdf) => {
            if pdf.src.is_none() {
                diagnostics.push(missing_src("PDF"));
            }
            if let Some(scale) = pdf.scale.filter(|s| *s <= 0.0) {
                diagnostics.push(
                    Diagnostic::error(format!("PDF scale must be positive, got {}", scale))
                        .with_code("PG018")
                        .with_path(format!("{}/payload/scale", epath)),
                );
            }
        }
        Payload::Rectangle(rect) => {
            if let Some(alpha) = rect.alpha.filter(|a| !(0.0..=1.0).contains(a)) {
                diagnostics.push(
                    Diagnostic::error("Alpha out of range 0.0-1.0")
                        .with_code("PG015")
                        .with_path(format!("{}/payload/alpha", epath))
                        .with_note(format!("found {}", alpha)),
                );
            }
            if let Some(stroke) = rect.stroke.as_deref().filter(|s| lacks_unit(s)) {
                diagnostics.push(
                    Diagnostic::error(format!("Stroke length '{}' missing unit", stroke))
                        .with_code("PG019")
                        .with_path(format!("{}/payload/stroke", epath))
                        .with_help("Use a length such as 1pt or 0.5mm"),
                );
            }
            if let Some(radius) = rect.radius.as_deref().filter(|r| lacks_unit(r)) {
                diagnostics.push(
                    Diagnostic::error(format!("Radius length '{}' missing unit", radius))
                        .with_code("PG019")
                        .with_path(format!("{}/payload/radius", epath))
                        .with_help("Use a length such as 2mm or 4pt"),
                );
            }
        }
        Payload::Empty if matches!(kind, ElementType::Figure | ElementType::Pdf | ElementType::Svg) => {
            diagnostics.push(missing_src(kind.as_str()));
        }
        _ => {}
    }
}

/// Validates that referenced asset files exist
///
/// Absolute paths are not checked. Missing assets are warnings unless the
/// validator is strict.
///
/// # Diagnostic Codes
///
/// - `PG014`: Asset not found
pub struct AssetValidator {
    strict: bool,
    base_dir: Option<PathBuf>,
}

impl AssetValidator {
    pub fn new(strict: bool, base_dir: Option<PathBuf>) -> Self {
        Self { strict, base_dir }
    }

    fn exists(&self, src: &str) -> bool {
        let path = Path::new(src);
        if path.is_absolute() {
            return true;
        }
        match &self.base_dir {
            Some(base) => base.join(path).exists(),
            None => path.exists(),
        }
    }
}

impl Validator for AssetValidator {
    fn code(&self) -> &'static str {
        "PG014"
    }

    fn name(&self) -> &'static str {
        "assets"
    }

    fn validate(&self, doc: &Document) -> Vec<Diagnostic> {
        let severity = if self.strict {
            Severity::Error
        } else {
            Severity::Warning
        };

        let mut diagnostics = Vec::new();
        for (pidx, page) in doc.pages.iter().enumerate() {
            for (eidx, el) in page.elements.iter().enumerate() {
                let label = match el.payload {
                    Payload::Figure(_) => "Figure",
                    Payload::Pdf(_) => "PDF",
                    Payload::Svg(_) => "SVG",
                    _ => continue,
                };
                let Some(src) = el.asset_src() else {
                    continue;
                };
                if !self.exists(src) {
                    diagnostics.push(
                        Diagnostic::new(severity, format!("{} asset not found", label))
                            .with_code("PG014")
                            .with_path(format!("{}/payload/src", element_path(pidx, eidx)))
                            .with_note(src.to_string()),
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
    use pagegrid_ast::{
        Area, Element, FigureRef, Grid, Page, PageSize, PdfRef, RectSpec, Sides, SvgRef,
    };

    fn doc_with(elements: Vec<Element>) -> Document {
        let mut page = Page::new("p", "P", PageSize::new(297.0, 210.0), Grid::new(4, 4));
        page.elements = elements;
        let mut doc = Document::new();
        doc.pages.push(page);
        doc
    }

    fn rect(id: &str, spec: RectSpec) -> Element {
        Element::new(id, ElementType::Rectangle).with_payload(Payload::Rectangle(spec))
    }

    fn figure(id: &str, src: Option<&str>) -> Element {
        Element::new(id, ElementType::Figure).with_payload(Payload::Figure(FigureRef {
            src: src.map(str::to_string),
            ..Default::default()
        }))
    }

    fn messages(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_duplicate_element_id_across_pages() {
        let mut doc = doc_with(vec![rect("logo", RectSpec::default())]);
        let mut second = doc.pages[0].clone();
        second.id = "q".to_string();
        doc.pages.push(second);

        let diags = ElementValidator.validate(&doc);
        assert_eq!(messages(&diags), vec!["Duplicate element id 'logo'"]);
        assert_eq!(diags[0].path.as_deref(), Some("/pages/1/elements/0/id"));
    }

    #[test]
    fn test_unknown_type_is_warning() {
        let doc = doc_with(vec![Element::new(
            "chart",
            ElementType::Unknown("chart".to_string()),
        )]);
        let diags = ElementValidator.validate(&doc);
        assert_eq!(diags.len(), 1);
        assert!(diags[0].is_warning());
        assert_eq!(diags[0].message, "Unknown element type 'chart'");
    }

    #[test]
    fn test_area_checks() {
        let doc = doc_with(vec![
            rect("ok", RectSpec::default()).with_area(Area::new(1, 1, 4, 4)),
            rect("zero", RectSpec::default()).with_area(Area::new(0, 1, 1, 1)),
            rect("wide", RectSpec::default()).with_area(Area::new(2, 1, 4, 1)),
        ]);
        let diags = ElementValidator.validate(&doc);
        assert_eq!(
            messages(&diags),
            vec!["Area has non-positive values", "Area exceeds total-grid bounds"]
        );
    }

    #[test]
    fn test_area_uses_total_grid_with_margins() {
        let mut doc = doc_with(vec![
            rect("margin", RectSpec::default()).with_area(Area::new(1, 1, 6, 6))
        ]);
        doc.pages[0] = doc.pages[0].clone().with_margins(Sides::uniform(10.0));
        assert!(ElementValidator.validate(&doc).is_empty());
    }

    #[test]
    fn test_missing_src() {
        let doc = doc_with(vec![
            figure("f", None),
            Element::new("s", ElementType::Svg).with_payload(Payload::Svg(SvgRef::default())),
            Element::new("d", ElementType::Pdf).with_payload(Payload::Pdf(PdfRef::default())),
        ]);
        let diags = ElementValidator.validate(&doc);
        assert_eq!(
            messages(&diags),
            vec![
                "Figure element missing src",
                "SVG element missing src",
                "PDF element missing src"
            ]
        );
    }

    #[test]
    fn test_pdf_scale_must_be_positive() {
        let doc = doc_with(vec![Element::new("d", ElementType::Pdf).with_payload(
            Payload::Pdf(PdfRef {
                src: Some("a.pdf".to_string()),
                scale: Some(0.0),
                ..Default::default()
            }),
        )]);
        let diags = ElementValidator.validate(&doc);
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code.as_deref(), Some("PG018"));
    }

    #[test]
    fn test_rectangle_values() {
        let doc = doc_with(vec![rect(
            "r",
            RectSpec {
                alpha: Some(1.5),
                stroke: Some("2".to_string()),
                radius: Some("3mm".to_string()),
                ..Default::default()
            },
        )]);
        let diags = ElementValidator.validate(&doc);
        assert_eq!(
            messages(&diags),
            vec!["Alpha out of range 0.0-1.0", "Stroke length '2' missing unit"]
        );
    }

    #[test]
    fn test_assets_missing_is_warning_unless_strict() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("present.png"), b"png").unwrap();
        let doc = doc_with(vec![
            figure("a", Some("present.png")),
            figure("b", Some("absent.png")),
            figure("c", Some("/abs/never/checked.png")),
        ]);

        let lenient = AssetValidator::new(false, Some(dir.path().to_path_buf()));
        let diags = lenient.validate(&doc);
        assert_eq!(messages(&diags), vec!["Figure asset not found"]);
        assert!(diags[0].is_warning());

        let strict = AssetValidator::new(true, Some(dir.path().to_path_buf()));
        assert!(strict.validate(&doc)[0].is_error());
    }
}

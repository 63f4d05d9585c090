//! Validation of parsed documents

use pagegrid_core::parse;
use pagegrid_validate::{validate_ir, ValidationEngine, ValidationOptions};
use tempfile::TempDir;

const DECK: &str = "#+GRID: 4x4
#+STYLE_CARD: stroke: 1pt, radius: 2
* One
** Logo
:PROPERTIES:
:AREA: A1
:END:
[[file:logo.png]]
** Band
:PROPERTIES:
:TYPE: rectangle
:AREA: A1,A5
:ALPHA: -0.4
:END:
* Two
:PROPERTIES:
:ORIENTATION: portrait
:END:
** Logo
:PROPERTIES:
:TYPE: chart
:END:
";

fn options(dir: &TempDir, strict: bool) -> ValidationOptions {
    ValidationOptions {
        strict_assets: strict,
        base_dir: Some(dir.path().to_path_buf()),
    }
}

#[test]
fn test_parsed_deck_reports_every_issue() {
    let dir = TempDir::new().unwrap();
    let doc = parse(DECK).unwrap();
    let report = ValidationEngine::with_options(options(&dir, false)).report(&doc);

    let errors: Vec<_> = report.errors().map(|d| d.message.as_str()).collect();
    assert!(errors.contains(&"Duplicate element id 'logo'"));
    assert!(errors.contains(&"Area exceeds total-grid bounds"));
    assert!(errors.contains(&"Alpha out of range 0.0-1.0"));
    assert!(errors.contains(&"Style 'card' radius length '2' missing unit"));
    assert!(errors.iter().any(|m| m.starts_with("Non-uniform page size")));

    let warnings: Vec<_> = report.warnings().map(|d| d.message.as_str()).collect();
    assert!(warnings.contains(&"Figure asset not found"));
    assert!(warnings.contains(&"Unknown element type 'chart'"));
    assert!(warnings.contains(&"Per-page overrides ignored: ORIENTATION"));
    assert!(!report.ok());
}

#[test]
fn test_existing_asset_is_clean() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("logo.png"), b"\x89PNG").unwrap();
    let doc = parse("* One\n** Logo\n:PROPERTIES:\n:AREA: A1\n:END:\n[[file:logo.png]]\n").unwrap();

    let report = ValidationEngine::with_options(options(&dir, true)).report(&doc);
    assert!(report.ok(), "{:?}", report.diagnostics);
    assert!(report.is_empty());
}

#[test]
fn test_strict_assets_are_errors() {
    let dir = TempDir::new().unwrap();
    let doc = parse("* One\n** Logo\n[[file:logo.png]]\n").unwrap();

    let report = ValidationEngine::with_options(options(&dir, true)).report(&doc);
    assert!(!report.ok());
    assert_eq!(report.errors().count(), 1);
}

#[test]
fn test_ir_round_trip_validation() {
    let dir = TempDir::new().unwrap();
    let doc = parse("* One\n** Title\n:PROPERTIES:\n:TYPE: header\n:END:\nHi\n").unwrap();
    let ir = serde_json::to_value(&doc).unwrap();

    let report = validate_ir(&ir, options(&dir, false));
    assert!(report.ok());
}

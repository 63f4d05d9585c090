//! End-to-end emission tests: outline text in, Typst source out

use pagegrid_core::{parse, StaticFontCatalog};
use pagegrid_typst::{emit, Emitter, MM_PER_PT};
use tempfile::TempDir;

const DECK: &str = r#"#+TITLE: Launch
#+DATE: 2024/03/05
#+PAGESIZE: A4
#+ORIENTATION: landscape
#+GRID: 4x4
#+STYLE_QUOTE: font: Lora, size: 14pt, justify: yes

* Template
:PROPERTIES:
:MASTER_DEF: base
:END:
** Footer band
:PROPERTIES:
:TYPE: rectangle
:AREA: D1,D4
:COLOR: #222222
:ALPHA: 0.5
:Z: 1
:END:

* Welcome
:PROPERTIES:
:MASTER: base
:END:
** Title
:PROPERTIES:
:TYPE: header
:AREA: A1,A4
:ALIGN: center
:VALIGN: middle
:END:
Hello *world*
** Quote
:PROPERTIES:
:TYPE: body
:STYLE: quote
:AREA: B1,C4
:FLOW: bottom-up
:END:
First paragraph.

Second paragraph.

* Contents
** Index
:PROPERTIES:
:TYPE: toc
:AREA: A1,D4
:END:
"#;

#[test]
fn test_deck_structure() {
    let doc = parse(DECK).unwrap();
    let out = emit(&doc);
    let src = &out.source;

    assert!(src.contains("#set page(width: 297mm, height: 210mm, margin: 0mm)"));
    assert!(src.contains("#let date_iso = \"2024-03-05\""));
    assert!(src.contains("// Page 1: Welcome\n"));
    assert!(src.contains("// Page 2: Contents\n"));
    assert!(!src.contains("// Page 3"));
    assert_eq!(src.matches("#pagebreak()").count(), 1);
    assert!(out.warnings.is_empty(), "{:?}", out.warnings);
}

#[test]
fn test_master_elements_come_first() {
    let src = emit(&parse(DECK).unwrap()).source;
    let welcome = &src[src.find("// Page 1").unwrap()..src.find("// Page 2").unwrap()];
    let footer = welcome.find("// Element footer-band (rectangle)").unwrap();
    let title = welcome.find("// Element title (header)").unwrap();
    assert!(footer < title);
    assert!(welcome.contains("ColorRect(\"#222222\", 0.5)"));

    let contents = &src[src.find("// Page 2").unwrap()..];
    assert!(!contents.contains("footer-band"));
}

#[test]
fn test_text_styles_and_alignment() {
    let src = emit(&parse(DECK).unwrap()).source;
    assert!(src.contains(
        "#layer_grid(gp,1,1,4,1, align(center + horizon)[#text(font: \"Inter\", weight: \"bold\", size: 24pt)[Hello #strong[world]]])"
    ));
    assert!(src.contains("// FLOW: bottom-up\n"));
    assert!(src.contains("#par(justify: true)[#text(font: \"Lora\", size: 14pt)[First paragraph.]]"));
    assert!(src.contains("#layer_grid(gp,1,2,4,2, align(bottom)[#par("));
}

#[test]
fn test_toc_lists_rendered_pages() {
    let src = emit(&parse(DECK).unwrap()).source;
    assert!(src.contains("[#text(font: \"Inter\")[Welcome]]"));
    assert!(src.contains("[#text(font: \"Inter\")[Contents]]"));
    assert!(!src.contains("[#text(font: \"Inter\")[Template]]"));
}

#[test]
fn test_grid_debug_overlay() {
    let text = format!("#+GRID_DEBUG: true\n{}", DECK);
    let src = emit(&parse(&text).unwrap()).source;
    assert_eq!(src.matches("#draw_grid(4, 4, cw, ch)").count(), 2);

    let with_margins = format!("#+GRID_DEBUG: true\n#+MARGINS: 10,10,10,10\n{}", DECK);
    let src = emit(&parse(&with_margins).unwrap()).source;
    assert_eq!(src.matches("#draw_total_grid(gp)").count(), 2);
}

#[test]
fn test_missing_fonts_are_reported() {
    let doc = parse(DECK).unwrap();
    let mut emitter = Emitter::new().with_fonts(Box::new(StaticFontCatalog::new(["Inter"])));
    let out = emitter.emit(&doc);
    assert_eq!(
        out.warnings,
        vec!["Font family 'Lora' referenced by style 'quote' not found; Typst may fallback"]
    );
}

#[test]
fn test_pdf_auto_scale() {
    let dir = TempDir::new().unwrap();
    // 90 x 90 units is 25.4 mm square
    std::fs::write(dir.path().join("chart.pdf"), b"%PDF-1.4 /MediaBox [0 0 90 90]").unwrap();

    let text = r#"#+PAGESIZE: A4
#+GRID: 4x4
* Data
** Chart
:PROPERTIES:
:TYPE: pdf
:PDF: chart.pdf
:PAGE: 2
:AREA: A1,B2
:END:
** Cover chart
:PROPERTIES:
:TYPE: pdf
:PDF: chart.pdf
:SCALE_MODE: cover
:AREA: A3,B4
:END:
"#;
    let doc = parse(text).unwrap();
    let mut emitter = Emitter::new().with_asset_root(dir.path());
    let src = emitter.emit(&doc).source;

    // Frame is 2 x 2 cells of 74.25 x 52.5 mm
    let side = 90.0 * MM_PER_PT;
    let contain: f64 = format!("{:.6}", 105.0 / side).parse().unwrap();
    let cover: f64 = format!("{:.6}", 148.5 / side).parse().unwrap();
    assert!(src.contains("// auto pdf scale base contain applied\n// Element chart (pdf)"));
    assert!(src.contains(&format!("PdfEmbed(\"chart.pdf\", page: 2, scale: {:?})", contain)));
    assert!(src.contains("// auto pdf scale base cover (may crop) applied"));
    assert!(src.contains(&format!("PdfEmbed(\"chart.pdf\", page: 1, scale: {:?})", cover)));
}

#[test]
fn test_empty_document() {
    let out = emit(&parse("#+TITLE: Nothing\n").unwrap());
    assert!(out.source.contains("#set page(width: 210mm, height: 297mm, margin: 0mm)"));
    assert!(!out.source.contains("// Page"));
}

#[test]
fn test_ordered_list_starting_at_max_ordinal() {
    let deck = "* Notes\n** Body\n:PROPERTIES:\n:TYPE: body\n:AREA: A1\n:END:\n4294967295. last\n1. next\n";
    let out = Emitter::new().emit(&parse(deck).unwrap());
    assert_eq!(out.source.matches("4294967295. ").count(), 2);
    assert!(out.source.contains("last"));
    assert!(out.source.contains("next"));
}

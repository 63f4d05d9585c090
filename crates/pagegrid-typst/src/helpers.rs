//! Document preamble: imports, theme, date helpers, and layout helpers

use std::collections::BTreeMap;

use pagegrid_ast::{Document, PageSize};

/// Typography theme record
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub font_header: String,
    pub font_body: String,
    pub size_header: String,
    pub size_subheader: String,
    pub size_body: String,
}

impl Theme {
    pub fn light() -> Self {
        Self {
            font_header: "Inter".to_string(),
            font_body: "Inter".to_string(),
            size_header: "2.6em".to_string(),
            size_subheader: "1.6em".to_string(),
            size_body: "1.0em".to_string(),
        }
    }

    /// Theme selected by the `THEME` directive (only `light` is defined)
    pub fn from_meta(meta: &BTreeMap<String, String>) -> Self {
        if let Some(name) = meta.get("THEME").map(|t| t.trim().to_lowercase()) {
            if name != "light" {
                log::debug!("Unknown theme '{}', using light", name);
            }
        }
        Self::light()
    }

    fn render(&self) -> String {
        format!(
            "#let theme = (\n  font_header: \"{}\",\n  font_body: \"{}\",\n  size_header: {},\n  size_subheader: {},\n  size_body: {}\n)\n",
            self.font_header, self.font_body, self.size_header, self.size_subheader, self.size_body
        )
    }
}

/// Parse `DATE_OVERRIDE` / `DATE` (`Y-m-d`, with `/` or `.` separators)
pub fn parse_date(value: &str) -> Option<(i32, u32, u32)> {
    let normalized = value.trim().replace(['/', '.'], "-");
    let mut parts = normalized.split('-');
    let year: i32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let day: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    Some((year, month, day))
}

fn date_helpers(meta: &BTreeMap<String, String>) -> String {
    let declared = meta
        .get("DATE_OVERRIDE")
        .or_else(|| meta.get("DATE"))
        .filter(|v| !v.trim().is_empty());

    let mut out = String::new();
    match declared.and_then(|v| parse_date(v)) {
        Some((y, m, d)) => {
            let yy = y.rem_euclid(100);
            out.push_str(&format!("#let date_iso = \"{:04}-{:02}-{:02}\"\n", y, m, d));
            out.push_str(&format!("#let date_yy_mm_dd = \"{:02}.{:02}.{:02}\"\n", yy, m, d));
            out.push_str(&format!("#let date_dd_mm_yy = \"{:02}.{:02}.{:02}\"\n", d, m, yy));
        }
        None => {
            if let Some(v) = declared {
                log::warn!("Unparseable date '{}', using the compile date", v);
            }
            out.push_str("#let date_iso = datetime.today().display(\"[year]-[month]-[day]\")\n");
            out.push_str(
                "#let date_yy_mm_dd = datetime.today().display(\"[year repr:last_two].[month].[day]\")\n",
            );
            out.push_str(
                "#let date_dd_mm_yy = datetime.today().display(\"[day].[month].[year repr:last_two]\")\n",
            );
        }
    }
    out.push_str("#let page_no = context counter(page).display()\n");
    out.push_str("#let page_total = context counter(page).final().at(0)\n");
    out
}

const FIG_HELPER: &str = r#"#let Fig(img, caption: none, caption_align: left, img_align: left) = if caption == none {
  block(width: 100%, height: 100%)[#align(img_align)[#img]]
} else {
  block(width: 100%, height: 100%)[
    #block(height: 85%)[#align(img_align)[#img]]
    #block(height: 15%)[#align(caption_align)[#text(size: 0.75em, fill: rgb(60%,60%,60%), font: theme.font_body)[#caption]]]
  ]
}
"#;

const RECT_HELPER: &str = r#"#let as_len(v) = if type(v) == str { eval(v) } else { v }
#let ColorRect(color, alpha, stroke: none, stroke_color: none, radius: none) = {
  let sc = if stroke_color == none { color } else { stroke_color }
  let s = if stroke == none { none } else { as_len(stroke) + rgb(sc) }
  let r = if radius == none { 0pt } else { as_len(radius) }
  block(width: 100%, height: 100%, fill: rgb(color).transparentize(100% - alpha * 100%), stroke: s, radius: r)[]
}
"#;

const PDF_HELPER: &str = r#"#let PdfEmbed(path, page: 1, scale: 1.0) = {
  let pdf_data = read(path, encoding: none)
  let pdf_img = muchpdf(pdf_data, pages: page - 1, scale: scale)
  block(width: 100%, height: 100%)[
    #pdf_img
  ]
}
"#;

const GRID_HELPERS: &str = r##"#let draw_grid(cols, rows, cw, ch) = {
  for col in range(1, cols + 1) {
    place(line(start: ((col - 1) * cw, 0pt), end: ((col - 1) * cw, rows * ch), stroke: 0.5pt + rgb("#ccc")))
  }
  for row in range(1, rows + 1) {
    place(line(start: (0pt, (row - 1) * ch), end: (cols * cw, (row - 1) * ch), stroke: 0.5pt + rgb("#ccc")))
  }
  for col in range(1, cols + 1) {
    place(dx: (col - 1) * cw + 2pt, dy: 2pt, text(size: 8pt, fill: rgb("#888"))[#col])
  }
  let letters = ("a","b","c","d","e","f","g","h","i","j","k","l","m","n","o","p","q","r","s","t","u","v","w","x","y","z")
  for row in range(1, rows + 1) {
    let label = if row <= 26 { letters.at(row - 1) } else { str(row) }
    place(dx: 2pt, dy: (row - 1) * ch + 2pt, text(size: 8pt, fill: rgb("#888"))[#label])
  }
}
// Variable-track grid: margin tracks have fixed mm sizes
#let col_width(i, gp) = if i <= gp.lc { if gp.lc == 0 { 0mm } else { gp.lm / gp.lc } } else if i <= gp.lc + gp.cc { gp.cw } else { if gp.rc == 0 { 0mm } else { gp.rm / gp.rc } }
#let row_height(j, gp) = if j <= gp.lr { if gp.lr == 0 { 0mm } else { gp.tm / gp.lr } } else if j <= gp.lr + gp.cr { gp.ch } else { if gp.br == 0 { 0mm } else { gp.bm / gp.br } }
#let sum_cols(from, count, gp) = {
  let total = 0mm
  if count <= 0 { return total }
  for i in range(from, from + count) { total = total + col_width(i, gp) }
  total
}
#let sum_rows(from, count, gp) = {
  let total = 0mm
  if count <= 0 { return total }
  for j in range(from, from + count) { total = total + row_height(j, gp) }
  total
}
#let layer_grid(gp, x, y, w, h, body) = place(
  dx: sum_cols(1, x - 1, gp),
  dy: sum_rows(1, y - 1, gp),
  block(width: sum_cols(x, w, gp), height: sum_rows(y, h, gp), body)
)
#let layer_grid_padded(gp, x, y, w, h, top, right, bottom, left, body) = {
  let dx = sum_cols(1, x - 1, gp) + left
  let dy = sum_rows(1, y - 1, gp) + top
  let frame_w = sum_cols(x, w, gp) - left - right
  let frame_h = sum_rows(y, h, gp) - top - bottom
  if frame_w < 0mm { frame_w = 0mm }
  if frame_h < 0mm { frame_h = 0mm }
  place(dx: dx, dy: dy, block(width: frame_w, height: frame_h, body))
}
#let draw_total_grid(gp) = {
  let tot_cols = gp.lc + gp.cc + gp.rc
  let tot_rows = gp.lr + gp.cr + gp.br
  for col in range(1, tot_cols + 1) {
    place(line(start: (sum_cols(1, col - 1, gp), 0mm), end: (sum_cols(1, col - 1, gp), sum_rows(1, tot_rows, gp)), stroke: 0.5pt + rgb("#ccc")))
  }
  for row in range(1, tot_rows + 1) {
    place(line(start: (0mm, sum_rows(1, row - 1, gp)), end: (sum_cols(1, tot_cols, gp), sum_rows(1, row - 1, gp)), stroke: 0.5pt + rgb("#ccc")))
  }
  for col in range(1, tot_cols + 1) {
    place(dx: sum_cols(1, col - 1, gp) + 2pt, dy: 2pt, text(size: 8pt, fill: rgb("#888"))[#col])
  }
  let letters = ("a","b","c","d","e","f","g","h","i","j","k","l","m","n","o","p","q","r","s","t","u","v","w","x","y","z")
  for row in range(1, tot_rows + 1) {
    let label = if row <= 26 { letters.at(row - 1) } else { str(row) }
    place(dx: 2pt, dy: sum_rows(1, row - 1, gp) + 2pt, text(size: 8pt, fill: rgb("#888"))[#label])
  }
}
"##;

/// Size of the single `#set page(..)`: the first rendered page, else A4 portrait
pub fn output_page_size(doc: &Document) -> PageSize {
    doc.rendered_pages()
        .next()
        .map(|p| p.page_size)
        .unwrap_or_else(PageSize::a4_portrait)
}

/// Everything emitted before the first page
pub fn preamble(doc: &Document) -> String {
    let size = output_page_size(doc);
    let mut out = String::new();

    out.push_str("// Generated by pagegrid\n");
    out.push_str("#set text(fill: rgb(\"#1b1f23\"))\n");
    out.push_str("#import \"@preview/muchpdf:0.1.1\": muchpdf\n\n");
    out.push_str(&Theme::from_meta(&doc.meta).render());
    out.push_str(&format!(
        "#set page(width: {}mm, height: {}mm, margin: 0mm)\n",
        size.w_mm, size.h_mm
    ));
    out.push_str(&date_helpers(&doc.meta));
    out.push_str(FIG_HELPER);
    out.push_str(RECT_HELPER);
    out.push_str(PDF_HELPER);
    out.push_str(GRID_HELPERS);
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegrid_ast::{Grid, Page};

    #[test]
    fn test_parse_date() {
        assert_eq!(parse_date("2024-03-05"), Some((2024, 3, 5)));
        assert_eq!(parse_date("2024/03/05"), Some((2024, 3, 5)));
        assert_eq!(parse_date("2024.3.5"), Some((2024, 3, 5)));
        assert_eq!(parse_date("March 5"), None);
        assert_eq!(parse_date("2024-13-01"), None);
    }

    #[test]
    fn test_declared_date_helpers() {
        let mut doc = Document::new();
        doc.meta.insert("DATE".to_string(), "2024/03/05".to_string());
        let out = preamble(&doc);
        assert!(out.contains("#let date_iso = \"2024-03-05\"\n"));
        assert!(out.contains("#let date_yy_mm_dd = \"24.03.05\"\n"));
        assert!(out.contains("#let date_dd_mm_yy = \"05.03.24\"\n"));
    }

    #[test]
    fn test_override_wins_over_date() {
        let mut doc = Document::new();
        doc.meta.insert("DATE".to_string(), "2024-03-05".to_string());
        doc.meta.insert("DATE_OVERRIDE".to_string(), "2025-01-02".to_string());
        assert!(preamble(&doc).contains("\"2025-01-02\""));
    }

    #[test]
    fn test_undated_output_is_deterministic() {
        let doc = Document::new();
        let out = preamble(&doc);
        assert!(out.contains("#let date_iso = datetime.today()"));
        assert_eq!(out, preamble(&doc));
    }

    #[test]
    fn test_page_size_from_first_rendered_page() {
        let mut doc = Document::new();
        assert!(preamble(&doc).contains("#set page(width: 210mm, height: 297mm, margin: 0mm)"));

        let mut master = Page::new("m", "M", PageSize::new(100.0, 100.0), Grid::new(1, 1));
        master.master_def = Some("base".to_string());
        doc.pages.push(master);
        doc.pages.push(Page::new("a", "A", PageSize::new(297.0, 210.0), Grid::new(12, 8)));
        assert!(preamble(&doc).contains("#set page(width: 297mm, height: 210mm, margin: 0mm)"));
    }

    #[test]
    fn test_header_and_theme() {
        let out = preamble(&Document::new());
        assert!(out.starts_with("// Generated by pagegrid\n#set text(fill: rgb(\"#1b1f23\"))\n"));
        assert!(out.contains("#import \"@preview/muchpdf:0.1.1\": muchpdf"));
        assert!(out.contains("#let theme = (\n  font_header: \"Inter\",\n  font_body: \"Inter\",\n  size_header: 2.6em,\n  size_subheader: 1.6em,\n  size_body: 1.0em\n)"));
        for helper in ["#let Fig(", "#let ColorRect(", "#let PdfEmbed(", "#let layer_grid(", "#let layer_grid_padded(", "#let draw_total_grid("] {
            assert!(out.contains(helper), "missing {}", helper);
        }
    }
}

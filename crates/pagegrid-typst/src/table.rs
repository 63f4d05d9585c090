//! Pipe table rendering
//!
//! Rules are drawn only where the source had separator lines; there is no
//! implicit rule above the first row or between ordinary rows.

use std::collections::BTreeSet;

use pagegrid_ast::TableBlock;

use crate::text::{escape_text, typst_text};

fn row_is_empty(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn cell(text: &str, text_args: &str, bold: bool) -> String {
    let text = text.trim();
    if text.is_empty() {
        return "[]".to_string();
    }
    let escaped = escape_text(text);
    let inner = if bold {
        format!("#strong[{}]", escaped)
    } else {
        escaped
    };
    format!("[{}]", typst_text(&inner, text_args))
}

/// Render a table block as a single Typst `#table`
pub fn render_table(table: &TableBlock, text_args: &str) -> String {
    let width = table.column_count();
    if width == 0 {
        return String::new();
    }

    let mut rows: Vec<Vec<String>> = table
        .rows
        .iter()
        .map(|r| {
            let mut row = r.clone();
            row.resize(width, String::new());
            row
        })
        .collect();
    let seps: BTreeSet<usize> = table.separators.iter().copied().collect();
    let header_rows = table.header_rows.min(rows.len());

    // A rule right after the last non-empty data row stays anchored there:
    // trailing empty rows below it are dropped
    if let Some(last) = rows[header_rows..].iter().rposition(|r| !row_is_empty(r)) {
        if seps.contains(&(header_rows + last + 1)) {
            rows.truncate(header_rows + last + 1);
        }
    }

    let columns = vec!["auto"; width].join(", ");
    let mut parts = vec![format!(
        "#table(columns: ({}), gutter: 6pt, stroke: none,",
        columns
    )];

    if header_rows > 0 {
        let cells: Vec<String> = rows[..header_rows]
            .iter()
            .flatten()
            .map(|c| cell(c, text_args, true))
            .collect();
        parts.push(format!("  table.header(\n    {}\n  ),", cells.join(", ")));
        if seps.contains(&header_rows) {
            parts.push("  table.hline(),".to_string());
        }
    }

    for (idx, row) in rows[header_rows..].iter().enumerate() {
        let cells: Vec<String> = row.iter().map(|c| cell(c, text_args, false)).collect();
        parts.push(format!("  {},", cells.join(", ")));
        if seps.contains(&(header_rows + idx + 1)) {
            parts.push("  table.hline(),".to_string());
        }
    }

    parts.push(")".to_string());
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]], separators: &[usize], header_rows: usize) -> TableBlock {
        TableBlock {
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
            separators: separators.to_vec(),
            header_rows,
        }
    }

    fn rule_count(out: &str) -> usize {
        out.matches("table.hline()").count()
    }

    #[test]
    fn test_header_and_rules() {
        let t = table(&[&["Name", "Qty"], &["a", "1"], &["b", "2"]], &[1, 2, 3], 1);
        let out = render_table(&t, "");
        assert_eq!(
            out,
            "#table(columns: (auto, auto), gutter: 6pt, stroke: none,\n  table.header(\n    [#text[#strong[Name]]], [#text[#strong[Qty]]]\n  ),\n  table.hline(),\n  [#text[a]], [#text[1]],\n  table.hline(),\n  [#text[b]], [#text[2]],\n  table.hline(),\n)"
        );
        assert_eq!(rule_count(&out), 3);
    }

    #[test]
    fn test_no_implicit_rules() {
        let t = table(&[&["a"], &["b"], &["c"]], &[], 0);
        let out = render_table(&t, "");
        assert_eq!(rule_count(&out), 0);
        assert!(!out.contains("table.header"));
    }

    #[test]
    fn test_ragged_rows_are_padded() {
        let t = table(&[&["a", "b", "c"], &["d"]], &[], 0);
        let out = render_table(&t, "size: 9pt");
        assert!(out.contains("columns: (auto, auto, auto)"));
        assert!(out.contains("  [#text(size: 9pt)[d]], [], [],"));
    }

    #[test]
    fn test_trailing_empty_rows_after_final_rule_are_dropped() {
        let t = table(&[&["h"], &["x"], &[""], &[" "]], &[1, 2], 1);
        let out = render_table(&t, "");
        assert!(out.ends_with("  [#text[x]],\n  table.hline(),\n)"));
        assert_eq!(rule_count(&out), 2);
    }

    #[test]
    fn test_empty_table() {
        assert_eq!(render_table(&TableBlock::default(), ""), "");
    }
}

//! List rendering with hanging indents

use std::sync::OnceLock;

use pagegrid_ast::{Checkbox, ListBlock, ListKind};
use regex::Regex;

use crate::text::{escape_text, typst_par, typst_text};

const DEFAULT_ITEM_SPACING: &str = "1.2em";

fn leading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|,\s*)leading:\s*([^,]+)").unwrap())
}

/// Item spacing: the paragraph leading, so items sit one line apart
fn item_spacing(par_args: &str) -> String {
    leading_re()
        .captures(par_args)
        .map(|caps| caps[1].trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_ITEM_SPACING.to_string())
}

fn checkbox_marker(checkbox: Checkbox) -> &'static str {
    match checkbox {
        Checkbox::Checked => "[x] ",
        Checkbox::Partial => "[-] ",
        Checkbox::Unchecked => "[ ] ",
    }
}

fn join_args(par_args: &str, extra: &str) -> String {
    if par_args.is_empty() {
        extra.to_string()
    } else {
        format!("{}, {}", par_args, extra)
    }
}

/// Render a list block as one `#par` per item
pub fn render_list(list: &ListBlock, text_args: &str, par_args: &str) -> String {
    if list.items.is_empty() {
        return String::new();
    }

    let spacing = item_spacing(par_args);
    let mut parts = Vec::new();

    match list.kind {
        ListKind::Unordered | ListKind::Ordered => {
            let hanging = match list.kind {
                ListKind::Ordered => "1.5em",
                _ => "1.2em",
            };
            let args = join_args(
                par_args,
                &format!("hanging-indent: {}, spacing: {}", hanging, spacing),
            );

            for (idx, item) in list.items.iter().enumerate() {
                let text = item.text.trim();
                if text.is_empty() {
                    continue;
                }
                let mut marker = match list.kind {
                    ListKind::Ordered => {
                        format!("{}. ", list.marker.format(list.start.saturating_add(idx as u32)))
                    }
                    _ => String::new(),
                };
                match item.checkbox {
                    Some(checkbox) => marker.push_str(checkbox_marker(checkbox)),
                    None if list.kind == ListKind::Unordered => marker.push_str("• "),
                    None => {}
                }

                let content = format!(
                    "{}{}",
                    typst_text(&escape_text(&marker), text_args),
                    typst_text(&escape_text(text), text_args)
                );
                parts.push(typst_par(&content, &args));
            }
        }
        ListKind::Description => {
            let desc_args = join_args(par_args, "hanging-indent: 1em");
            for item in &list.items {
                if let Some(term) = item.term.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
                    let bold = format!("#strong[{}]", escape_text(term));
                    parts.push(typst_par(&typst_text(&bold, text_args), par_args));
                }
                let desc = item.text.trim();
                if !desc.is_empty() {
                    parts.push(typst_par(
                        &typst_text(&escape_text(desc), text_args),
                        &desc_args,
                    ));
                }
            }
        }
    }

    if !list.tight && !parts.is_empty() {
        parts.push(String::new());
    }
    parts.join("\n")
}

//! Text payload blocks
//!
//! Text elements (header, subheader, body) carry their content as a
//! sequence of blocks: plain paragraphs, lists, and tables.

use serde::{Deserialize, Serialize};

/// A block of text content inside a text element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "block", rename_all = "snake_case")]
pub enum TextBlock {
    /// Raw paragraph text (may contain code fences and raw Typst lines)
    Plain {
        /// Source lines joined with `\n`
        content: String,
    },
    /// An ordered, unordered, or description list
    List(ListBlock),
    /// A pipe table
    Table(TableBlock),
}

/// A list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListBlock {
    /// Type of list
    pub kind: ListKind,
    /// List items in source order
    pub items: Vec<ListItem>,
    /// First ordinal for ordered lists
    #[serde(default = "default_start")]
    pub start: u32,
    /// Marker style for ordered lists
    #[serde(default)]
    pub marker: MarkerStyle,
    /// Whether items are rendered without extra trailing space
    #[serde(default = "default_tight")]
    pub tight: bool,
}

fn default_start() -> u32 {
    1
}

fn default_tight() -> bool {
    true
}

/// List type variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListKind {
    /// Bullet list (`- item`, `+ item`)
    Unordered,
    /// Numbered list (`1. item`, `a) item`)
    Ordered,
    /// Term/definition list (`- term :: definition`)
    Description,
}

/// Ordered list marker style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerStyle {
    /// 1. 2. 3.
    #[default]
    Decimal,
    /// a. b. c.
    LowerAlpha,
    /// A. B. C.
    UpperAlpha,
    /// i. ii. iii.
    LowerRoman,
    /// I. II. III.
    UpperRoman,
}

impl MarkerStyle {
    /// Format the ordinal `n` (1-based) in this style
    pub fn format(self, n: u32) -> String {
        match self {
            MarkerStyle::Decimal => n.to_string(),
            MarkerStyle::LowerAlpha => alpha(n).to_lowercase(),
            MarkerStyle::UpperAlpha => alpha(n),
            MarkerStyle::LowerRoman => roman(n).to_lowercase(),
            MarkerStyle::UpperRoman => roman(n),
        }
    }
}

/// Bijective base-26: 1 → A, 26 → Z, 27 → AA
fn alpha(mut n: u32) -> String {
    let mut out = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        out.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn roman(mut n: u32) -> String {
    const TABLE: [(u32, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, digits) in TABLE {
        while n >= value {
            out.push_str(digits);
            n -= value;
        }
    }
    out
}

/// A single list item
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ListItem {
    /// Item text (the definition, for description lists)
    pub text: String,
    /// For description lists: the term being defined
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub term: Option<String>,
    /// Checkbox state, when the item starts with `[ ]`, `[X]` or `[-]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkbox: Option<Checkbox>,
}

/// Checkbox state of a list item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Checkbox {
    Unchecked,
    Checked,
    Partial,
}

/// A pipe table
///
/// Rows are kept exactly as parsed (ragged). Separator lines are not rows;
/// their positions are recorded as "after the Nth parsed row".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableBlock {
    /// Cell text per row
    pub rows: Vec<Vec<String>>,
    /// Distinct separator positions, ascending, each in `1..=rows.len()`
    #[serde(default)]
    pub separators: Vec<usize>,
    /// Number of leading rows before the first separator
    #[serde(default)]
    pub header_rows: usize,
}

impl TableBlock {
    /// Widest row length
    pub fn column_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }
}

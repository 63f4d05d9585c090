//! Text payload parsing
//!
//! Splits the raw content lines of a text element into plain paragraphs,
//! lists, and pipe tables.

use std::sync::OnceLock;

use pagegrid_ast::{Checkbox, ListBlock, ListItem, ListKind, MarkerStyle, TableBlock, TextBlock};
use regex::Regex;

fn ordered_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+|[A-Za-z]+)[.)]\s+(.*)$").unwrap())
}

/// Block parser state
#[derive(Debug)]
enum BlockState {
    /// Between blocks
    Root,
    /// Accumulating plain lines
    Plain(Vec<String>),
    /// Accumulating list items
    List(ListBlock),
    /// Accumulating table rows
    Table(TableBlock),
}

/// A parsed list item line
#[derive(Debug)]
struct ItemLine {
    kind: ListKind,
    item: ListItem,
    /// Marker style and ordinal of an ordered item
    ordinal: Option<(MarkerStyle, u32)>,
}

struct BlockParser {
    blocks: Vec<TextBlock>,
    state: BlockState,
    in_fence: bool,
}

impl BlockParser {
    fn new() -> Self {
        Self {
            blocks: Vec::new(),
            state: BlockState::Root,
            in_fence: false,
        }
    }

    fn parse(mut self, lines: &[String]) -> Vec<TextBlock> {
        for line in lines {
            self.process_line(line);
        }
        self.flush_state();
        self.blocks
    }

    fn process_line(&mut self, line: &str) {
        let trimmed = line.trim_start();

        if self.in_fence {
            if trimmed.starts_with("```") {
                self.in_fence = false;
            }
            self.push_plain(line.to_string());
            return;
        }

        if trimmed.starts_with("```") {
            self.in_fence = true;
            self.push_plain(line.to_string());
            return;
        }

        if trimmed.is_empty() {
            match &mut self.state {
                BlockState::Plain(lines) => lines.push(String::new()),
                BlockState::Root => {}
                _ => self.flush_state(),
            }
            return;
        }

        if trimmed.starts_with('|') {
            self.handle_table_line(trimmed);
            return;
        }

        if let Some(item) = try_parse_item(trimmed) {
            self.handle_list_item(item);
            return;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');
        if indented {
            if let BlockState::List(list) = &mut self.state {
                if let Some(last) = list.items.last_mut() {
                    if !last.text.is_empty() {
                        last.text.push(' ');
                    }
                    last.text.push_str(trimmed.trim_end());
                    return;
                }
            }
        }

        self.push_plain(trimmed.to_string());
    }

    fn push_plain(&mut self, line: String) {
        match &mut self.state {
            BlockState::Plain(lines) => lines.push(line),
            _ => {
                self.flush_state();
                self.state = BlockState::Plain(vec![line]);
            }
        }
    }

    fn handle_table_line(&mut self, line: &str) {
        if !matches!(self.state, BlockState::Table(_)) {
            self.flush_state();
            self.state = BlockState::Table(TableBlock::default());
        }
        let BlockState::Table(table) = &mut self.state else {
            return;
        };

        if is_separator(line) {
            let pos = table.rows.len();
            if pos > 0 && !table.separators.contains(&pos) {
                table.separators.push(pos);
            }
            return;
        }
        table.rows.push(split_cells(line));
    }

    fn handle_list_item(&mut self, line: ItemLine) {
        match &mut self.state {
            BlockState::List(list) if list.kind == line.kind => {
                list.items.push(line.item);
            }
            _ => {
                self.flush_state();
                let (marker, start) = line.ordinal.unwrap_or((MarkerStyle::Decimal, 1));
                self.state = BlockState::List(ListBlock {
                    kind: line.kind,
                    items: vec![line.item],
                    start,
                    marker,
                    tight: true,
                });
            }
        }
    }

    fn flush_state(&mut self) {
        let state = std::mem::replace(&mut self.state, BlockState::Root);

        match state {
            BlockState::Root => {}
            BlockState::Plain(lines) => {
                let content = lines.join("\n");
                if !content.trim().is_empty() {
                    self.blocks.push(TextBlock::Plain {
                        content: content.trim_end().to_string(),
                    });
                }
            }
            BlockState::List(list) => {
                if !list.items.is_empty() {
                    self.blocks.push(TextBlock::List(list));
                }
            }
            BlockState::Table(mut table) => {
                if table.rows.is_empty() {
                    return;
                }
                table.header_rows = match table.separators.first() {
                    Some(&first) if first < table.rows.len() => first,
                    _ => 0,
                };
                self.blocks.push(TextBlock::Table(table));
            }
        }
    }
}

/// `|---+---|` style rule line
fn is_separator(line: &str) -> bool {
    let body = line.trim().trim_start_matches('|');
    body.contains('-') && body.chars().all(|c| matches!(c, '-' | '+' | '|' | ':'))
}

fn split_cells(line: &str) -> Vec<String> {
    let inner = line.trim();
    let inner = inner.strip_prefix('|').unwrap_or(inner);
    let inner = inner.strip_suffix('|').unwrap_or(inner);
    inner.split('|').map(|c| c.trim().to_string()).collect()
}

fn split_checkbox(text: &str) -> (Option<Checkbox>, &str) {
    let markers = [
        ("[ ]", Checkbox::Unchecked),
        ("[x]", Checkbox::Checked),
        ("[X]", Checkbox::Checked),
        ("[-]", Checkbox::Partial),
    ];
    for (marker, state) in markers {
        if let Some(rest) = text.strip_prefix(marker) {
            if rest.is_empty() || rest.starts_with(char::is_whitespace) {
                return (Some(state), rest.trim_start());
            }
        }
    }
    (None, text)
}

fn try_parse_item(line: &str) -> Option<ItemLine> {
    let line = line.trim_end();

    let bullet = line
        .strip_prefix("- ")
        .or_else(|| line.strip_prefix("+ "))
        .or_else(|| (line == "-" || line == "+").then_some(""));
    if let Some(rest) = bullet {
        let rest = rest.trim_start();
        if let Some((term, desc)) = rest.split_once(" :: ") {
            return Some(ItemLine {
                kind: ListKind::Description,
                item: ListItem {
                    text: desc.trim().to_string(),
                    term: Some(term.trim().to_string()),
                    checkbox: None,
                },
                ordinal: None,
            });
        }
        let (checkbox, text) = split_checkbox(rest);
        return Some(ItemLine {
            kind: ListKind::Unordered,
            item: ListItem {
                text: text.to_string(),
                term: None,
                checkbox,
            },
            ordinal: None,
        });
    }

    let caps = ordered_re().captures(line)?;
    let ordinal = parse_ordinal(&caps[1])?;
    let (checkbox, text) = split_checkbox(caps.get(2).map_or("", |m| m.as_str()));
    Some(ItemLine {
        kind: ListKind::Ordered,
        item: ListItem {
            text: text.to_string(),
            term: None,
            checkbox,
        },
        ordinal: Some(ordinal),
    })
}

/// Marker style and value of an ordered list marker
fn parse_ordinal(marker: &str) -> Option<(MarkerStyle, u32)> {
    if let Ok(n) = marker.parse::<u32>() {
        return Some((MarkerStyle::Decimal, n));
    }
    let upper = marker.chars().all(|c| c.is_ascii_uppercase());
    let lower = marker.chars().all(|c| c.is_ascii_lowercase());
    if !upper && !lower {
        return None;
    }

    let is_roman_letter = |c: char| "IVXLCDM".contains(c.to_ascii_uppercase());
    if marker.len() > 1 || marker.eq_ignore_ascii_case("i") {
        if !marker.chars().all(is_roman_letter) {
            return None;
        }
        let value = roman_value(marker)?;
        let style = if upper {
            MarkerStyle::UpperRoman
        } else {
            MarkerStyle::LowerRoman
        };
        return Some((style, value));
    }

    let ch = marker.chars().next()?;
    let value = ch.to_ascii_lowercase() as u32 - 'a' as u32 + 1;
    let style = if upper {
        MarkerStyle::UpperAlpha
    } else {
        MarkerStyle::LowerAlpha
    };
    Some((style, value))
}

fn roman_value(marker: &str) -> Option<u32> {
    let digit = |c: char| match c.to_ascii_uppercase() {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    };
    let values: Vec<u32> = marker.chars().map(digit).collect::<Option<_>>()?;
    let total = values.iter().enumerate().fold(0i64, |acc, (i, v)| {
        match values.get(i + 1) {
            Some(next) if next > v => acc - *v as i64,
            _ => acc + *v as i64,
        }
    });
    u32::try_from(total).ok().filter(|n| *n > 0)
}

/// Parse the content lines of a text element into blocks
pub fn parse_blocks(lines: &[String]) -> Vec<TextBlock> {
    BlockParser::new().parse(lines)
}

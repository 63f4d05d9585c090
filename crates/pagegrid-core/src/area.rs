//! Attribute value parsers
//!
//! Small, lenient parsers for property values. Each returns `None` on
//! malformed input instead of failing, so a bad attribute degrades to
//! "absent".

use std::sync::OnceLock;

use pagegrid_ast::{Area, Sides};
use regex::Regex;

fn cell_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([A-Za-z]+)\s*(\d+)\s*$").unwrap())
}

fn block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\s*([A-Za-z]+)\s*(\d+)\s*,\s*([A-Za-z]+)\s*(\d+)\s*$").unwrap()
    })
}

/// Convert row letters to a 1-based index (`A` → 1, `Z` → 26, `AA` → 27)
fn letters_to_row(letters: &str) -> Option<i64> {
    let mut n: i64 = 0;
    for ch in letters.trim().to_ascii_uppercase().chars() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        n = n.checked_mul(26)?.checked_add(ch as i64 - 'A' as i64 + 1)?;
    }
    (n > 0).then_some(n)
}

/// Parse an `AREA` value
///
/// Accepts cell notation (`B3`, `A1,C4`: letters are the row, digits the
/// column) and the legacy `x,y,w,h` integer form.
pub fn parse_area(value: &str) -> Option<Area> {
    if let Some(caps) = block_re().captures(value) {
        let r1 = letters_to_row(&caps[1])?;
        let c1: i64 = caps[2].parse().ok()?;
        let r2 = letters_to_row(&caps[3])?;
        let c2: i64 = caps[4].parse().ok()?;
        return Some(Area::new(
            c1.min(c2),
            r1.min(r2),
            (c2 - c1).abs() + 1,
            (r2 - r1).abs() + 1,
        ));
    }

    if let Some(caps) = cell_re().captures(value) {
        let r = letters_to_row(&caps[1])?;
        let c: i64 = caps[2].parse().ok()?;
        return Some(Area::new(c, r, 1, 1));
    }

    let parts: Vec<i64> = value
        .split(',')
        .map(|p| p.trim().parse::<i64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [x, y, w, h] => Some(Area::new(*x, *y, *w, *h)),
        _ => None,
    }
}

/// Parse a CSS-like padding shorthand in millimetres
///
/// One to four numbers separated by commas and/or whitespace. Extra values
/// beyond four are ignored.
pub fn parse_padding(value: &str) -> Option<Sides> {
    let nums: Vec<f64> = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;

    match nums.as_slice() {
        [] => None,
        [all] => Some(Sides::uniform(*all)),
        [v, h] => Some(Sides::new(*v, *h, *v, *h)),
        [t, h, b] => Some(Sides::new(*t, *h, *b, *h)),
        [t, r, b, l, ..] => Some(Sides::new(*t, *r, *b, *l)),
    }
}

/// Parse a boolean token (`1/true/yes/y/on`, `0/false/no/n/off`)
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Turn a headline into an id: lowercase, runs of other characters become `-`
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_dash = false;
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if out.is_empty() {
        "item".to_string()
    } else {
        out
    }
}

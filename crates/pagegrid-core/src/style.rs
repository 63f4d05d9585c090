//! Style declarations and cascade
//!
//! Styles come from three layers, lowest precedence first: built-in
//! defaults for header/subheader/body, the `#+FONT` directive, and
//! `#+STYLE_<NAME>` declarations. Element-level fields override the
//! resolved style at emission time.

use std::collections::BTreeMap;

use pagegrid_ast::Element;

const VALID_WEIGHTS: [&str; 9] = [
    "thin",
    "extralight",
    "light",
    "regular",
    "medium",
    "semibold",
    "bold",
    "extrabold",
    "black",
];

const VALID_LINEBREAKS: [&str; 3] = ["auto", "loose", "strict"];

/// A resolved style (all values kept as written)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Style {
    pub font: Option<String>,
    pub weight: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub leading: Option<String>,
    pub spacing: Option<String>,
    pub justify: Option<String>,
    pub linebreaks: Option<String>,
    pub first_line_indent: Option<String>,
    pub hanging_indent: Option<String>,
    pub alpha: Option<String>,
    pub stroke: Option<String>,
    pub stroke_color: Option<String>,
    pub radius: Option<String>,
}

impl Style {
    fn font(font: &str) -> Self {
        Self {
            font: Some(font.to_string()),
            ..Default::default()
        }
    }

    /// Overlay `other` on top of `self`; set fields in `other` win
    pub fn merged(&self, other: &Style) -> Style {
        fn pick(base: &Option<String>, over: &Option<String>) -> Option<String> {
            over.clone().or_else(|| base.clone())
        }
        Style {
            font: pick(&self.font, &other.font),
            weight: pick(&self.weight, &other.weight),
            size: pick(&self.size, &other.size),
            color: pick(&self.color, &other.color),
            leading: pick(&self.leading, &other.leading),
            spacing: pick(&self.spacing, &other.spacing),
            justify: pick(&self.justify, &other.justify),
            linebreaks: pick(&self.linebreaks, &other.linebreaks),
            first_line_indent: pick(&self.first_line_indent, &other.first_line_indent),
            hanging_indent: pick(&self.hanging_indent, &other.hanging_indent),
            alpha: pick(&self.alpha, &other.alpha),
            stroke: pick(&self.stroke, &other.stroke),
            stroke_color: pick(&self.stroke_color, &other.stroke_color),
            radius: pick(&self.radius, &other.radius),
        }
    }
}

/// Split a declaration on `,`/`;` outside parentheses and quotes
fn split_declaration(decl: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut prev = '\0';

    for ch in decl.chars() {
        match quote {
            Some(q) => {
                buf.push(ch);
                if ch == q && prev != '\\' {
                    quote = None;
                }
            }
            None => match ch {
                '"' | '\'' => {
                    quote = Some(ch);
                    buf.push(ch);
                }
                '(' => {
                    depth += 1;
                    buf.push(ch);
                }
                ')' => {
                    depth = depth.saturating_sub(1);
                    buf.push(ch);
                }
                ',' | ';' if depth == 0 => parts.push(std::mem::take(&mut buf)),
                _ => buf.push(ch),
            },
        }
        prev = ch;
    }
    if !buf.is_empty() {
        parts.push(buf);
    }
    parts
}

/// Parse a style declaration such as `font: Inter, weight: bold, size: 24pt`
///
/// Returns the parsed style and any warnings. Unknown keys and values are
/// reported but never fatal.
pub fn parse_style_decl(decl: &str) -> (Style, Vec<String>) {
    let mut style = Style::default();
    let mut warnings = Vec::new();

    for part in split_declaration(decl) {
        let Some((key, value)) = part.split_once(':').or_else(|| part.split_once('=')) else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim().to_string();
        if key.is_empty() {
            continue;
        }

        match key.as_str() {
            "font-family" | "font" => style.font = Some(value),
            "font-weight" | "weight" => {
                let numeric = value
                    .parse::<u32>()
                    .is_ok_and(|n| (100..=900).contains(&n) && n % 100 == 0);
                if !numeric && !VALID_WEIGHTS.contains(&value.to_lowercase().as_str()) {
                    warnings.push(format!("Unknown font weight '{}'", value));
                }
                style.weight = Some(value);
            }
            "font-size" | "size" => style.size = Some(value),
            "fill" | "color" | "colour" => style.color = Some(value),
            "linebreaks" => {
                if !VALID_LINEBREAKS.contains(&value.to_lowercase().as_str()) {
                    warnings.push(format!("Unknown linebreaks value '{}'", value));
                }
                style.linebreaks = Some(value);
            }
            "leading" => style.leading = Some(value),
            "spacing" => style.spacing = Some(value),
            "justify" => style.justify = Some(value),
            "first-line-indent" | "first_line_indent" => style.first_line_indent = Some(value),
            "hanging-indent" | "hanging_indent" => style.hanging_indent = Some(value),
            "alpha" => style.alpha = Some(value),
            "stroke" => style.stroke = Some(value),
            "stroke-color" | "stroke_color" => style.stroke_color = Some(value),
            "radius" => style.radius = Some(value),
            _ => warnings.push(format!(
                "Unrecognized style property '{}' in declaration: {}",
                key, decl
            )),
        }
    }

    (style, warnings)
}

/// All named styles of a document
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSheet {
    styles: BTreeMap<String, Style>,
    warnings: Vec<String>,
}

impl Default for StyleSheet {
    fn default() -> Self {
        let mut styles = BTreeMap::new();
        styles.insert(
            "header".to_string(),
            Style {
                weight: Some("bold".to_string()),
                size: Some("24pt".to_string()),
                ..Style::font("Inter")
            },
        );
        styles.insert(
            "subheader".to_string(),
            Style {
                weight: Some("semibold".to_string()),
                size: Some("18pt".to_string()),
                ..Style::font("Inter")
            },
        );
        styles.insert("body".to_string(), Style::font("Inter"));
        Self {
            styles,
            warnings: Vec::new(),
        }
    }
}

impl StyleSheet {
    /// Build the style sheet from document directives
    pub fn from_meta(meta: &BTreeMap<String, String>) -> Self {
        let mut sheet = Self::default();

        if let Some(font) = meta.get("FONT").map(|f| f.trim()).filter(|f| !f.is_empty()) {
            for style in sheet.styles.values_mut() {
                style.font = Some(font.to_string());
            }
        }

        for (key, value) in meta {
            let Some(name) = key.strip_prefix("STYLE_") else {
                continue;
            };
            let name = name.trim().to_lowercase();
            if name.is_empty() {
                continue;
            }
            let (decl, warnings) = parse_style_decl(value);
            for warning in warnings {
                log::warn!("STYLE_{}: {}", name.to_uppercase(), warning);
                sheet.warnings.push(warning);
            }
            let merged = match sheet.styles.get(&name) {
                Some(base) => base.merged(&decl),
                None => decl,
            };
            sheet.styles.insert(name, merged);
        }

        sheet
    }

    /// Look up a style by name (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&Style> {
        self.styles.get(&name.trim().to_lowercase())
    }

    /// Style for an element: its `STYLE` reference, else its type, else body
    pub fn for_element(&self, element: &Element) -> Style {
        let by_name = element.style.as_deref().and_then(|n| self.get(n));
        by_name
            .or_else(|| self.get(element.kind.as_str()))
            .or_else(|| self.get("body"))
            .cloned()
            .unwrap_or_default()
    }

    /// Iterate over `(name, style)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Style)> {
        self.styles.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Warnings collected while parsing declarations
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// Normalize a boolean token for Typst, passing other values through
pub fn bool_token(value: &str) -> String {
    let lower = value.trim().to_lowercase();
    match crate::area::parse_bool(&lower) {
        Some(true) => "true".to_string(),
        Some(false) => "false".to_string(),
        None => lower,
    }
}

/// Typst `#text(...)` arguments: font, weight, size, fill
pub fn text_args(style: &Style) -> String {
    let mut parts = Vec::new();
    fn non_empty(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    if let Some(font) = non_empty(&style.font) {
        parts.push(format!("font: \"{}\"", font));
    }
    if let Some(weight) = non_empty(&style.weight) {
        if weight.chars().all(|c| c.is_ascii_digit()) {
            parts.push(format!("weight: {}", weight));
        } else {
            parts.push(format!("weight: \"{}\"", weight));
        }
    }
    if let Some(size) = non_empty(&style.size) {
        parts.push(format!("size: {}", size));
    }
    if let Some(color) = non_empty(&style.color) {
        parts.push(format!("fill: {}", color_expr(color)));
    }
    parts.join(", ")
}

/// A color value as a Typst expression
fn color_expr(color: &str) -> String {
    let is_call = color
        .split_once('(')
        .is_some_and(|(name, _)| !name.is_empty() && name.chars().all(|c| c.is_ascii_alphabetic()));
    if is_call {
        color.to_string()
    } else {
        format!("rgb(\"{}\")", color)
    }
}

/// Typst `#par(...)` arguments
///
/// An element-level `justify` wins over the style's.
pub fn par_args(style: &Style, justify: Option<bool>) -> String {
    let mut parts = Vec::new();
    let fields = [
        ("leading", &style.leading),
        ("spacing", &style.spacing),
        ("first-line-indent", &style.first_line_indent),
        ("hanging-indent", &style.hanging_indent),
        ("linebreaks", &style.linebreaks),
    ];
    for (key, value) in fields {
        if let Some(v) = value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            parts.push(format!("{}: {}", key, v));
        }
    }
    match justify {
        Some(j) => parts.push(format!("justify: {}", j)),
        None => {
            if let Some(v) = style.justify.as_deref().filter(|v| !v.trim().is_empty()) {
                parts.push(format!("justify: {}", bool_token(v)));
            }
        }
    }
    parts.join(", ")
}

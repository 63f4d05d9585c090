//! Outline markup parser
//!
//! This module parses the Org-like page markup into a
//! `pagegrid_ast::Document`.
//!
//! # Supported Syntax
//!
//! - Directives: `#+KEY: value` (keys upper-cased, `#+TBLFM:` ignored)
//! - Pages: `* Title`
//! - Elements: `** Title`, nested by the number of stars
//! - Property drawers: `:PROPERTIES:` ... `:END:` with `:KEY: value` lines
//! - Content: any other line, attached to the innermost open element
//!
//! # Example
//!
//! ```
//! use pagegrid_core::parser;
//!
//! let input = "#+GRID: 4x3\n* Cover\n** Title\n:PROPERTIES:\n:TYPE: header\n:AREA: A1,A4\n:END:\nHello\n";
//!
//! let doc = parser::parse(input)?;
//! assert_eq!(doc.pages[0].elements[0].id, "title");
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use pagegrid_ast::{
    Area, Document, Element, ElementType, FigureRef, Flow, HAlign, Page, Payload, PdfRef,
    RectSpec, ScaleMode, Sides, SvgRef, VAlign, DEFAULT_Z,
};
use regex::Regex;

use crate::area::{parse_area, parse_bool, parse_padding, slugify};
use crate::blocks::parse_blocks;
use crate::layout::{resolve, resolve_page_setup};

fn headline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\*+)\s+(.+)$").unwrap())
}

fn image_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[\[file:([^\]]+)\]\]").unwrap())
}

/// Parser state for property drawers
#[derive(Debug, Clone, PartialEq)]
enum ParserState {
    /// Outside any drawer
    Content,
    /// Inside `:PROPERTIES:`, collecting key/value pairs
    Properties(BTreeMap<String, String>),
}

/// An element headline with its raw attributes and content
#[derive(Debug, Default)]
struct RawNode {
    level: usize,
    title: String,
    props: BTreeMap<String, String>,
    lines: Vec<String>,
    children: Vec<RawNode>,
}

/// A page headline with its element tree
#[derive(Debug, Default)]
struct RawPage {
    title: String,
    props: BTreeMap<String, String>,
    nodes: Vec<RawNode>,
}

/// Attributes passed down the element tree
#[derive(Debug, Clone, Default)]
struct Inherited {
    area: Option<Area>,
    style: Option<String>,
    padding: Option<Sides>,
}

impl Inherited {
    /// Add a padding declaration to the accumulated sum
    fn with_padding(mut self, own: Option<Sides>) -> Self {
        self.padding = match (self.padding, own) {
            (Some(acc), Some(own)) => Some(acc.add(&own)),
            (acc, own) => acc.or(own),
        };
        self
    }
}

/// Line-oriented outline parser
struct Parser {
    meta: BTreeMap<String, String>,
    pages: Vec<RawPage>,
    /// Open element headlines, outermost first
    stack: Vec<RawNode>,
    state: ParserState,
}

impl Parser {
    fn new() -> Self {
        Self {
            meta: BTreeMap::new(),
            pages: Vec::new(),
            stack: Vec::new(),
            state: ParserState::Content,
        }
    }

    fn parse(mut self, text: &str) -> Result<Document> {
        // Normalize line endings
        let text = text.replace("\r\n", "\n");

        for line in text.lines() {
            self.process_line(line);
        }
        self.close_elements(1);

        let meta = self.meta;
        let mut doc = Document {
            pages: self
                .pages
                .into_iter()
                .filter_map(|raw| build_page(&meta, raw))
                .collect(),
            meta,
        };
        resolve(&mut doc);
        Ok(doc)
    }

    fn process_line(&mut self, line: &str) {
        let stripped = line.trim_start();

        if let Some(directive) = stripped.strip_prefix("#+") {
            self.handle_directive(directive);
            return;
        }

        if let ParserState::Properties(props) = &mut self.state {
            if is_drawer_marker(stripped, ":END:") {
                let props = std::mem::take(props);
                self.state = ParserState::Content;
                self.apply_properties(props);
            } else if let Some((key, value)) = parse_property(stripped) {
                props.insert(key, value);
            }
            return;
        }

        if let Some((level, title)) = try_parse_headline(stripped) {
            self.open_headline(level, title);
            return;
        }

        if is_drawer_marker(stripped, ":PROPERTIES:") {
            self.state = ParserState::Properties(BTreeMap::new());
            return;
        }

        if let Some(node) = self.stack.last_mut() {
            node.lines.push(line.to_string());
        }
    }

    fn handle_directive(&mut self, directive: &str) {
        let Some((key, value)) = directive.split_once(':') else {
            return;
        };
        let key = key.trim().to_uppercase();
        if key == "TBLFM" {
            return;
        }
        self.meta.insert(key, value.trim().to_string());
    }

    fn open_headline(&mut self, level: usize, title: String) {
        if level == 1 {
            self.close_elements(1);
            self.pages.push(RawPage {
                title,
                ..Default::default()
            });
            return;
        }
        if self.pages.is_empty() {
            return;
        }
        self.close_elements(level);
        self.stack.push(RawNode {
            level,
            title,
            ..Default::default()
        });
    }

    /// Close open elements whose level is `level` or deeper
    fn close_elements(&mut self, level: usize) {
        while self.stack.last().is_some_and(|n| n.level >= level) {
            let Some(node) = self.stack.pop() else {
                break;
            };
            match self.stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => {
                    if let Some(page) = self.pages.last_mut() {
                        page.nodes.push(node);
                    }
                }
            }
        }
    }

    fn apply_properties(&mut self, props: BTreeMap<String, String>) {
        if let Some(node) = self.stack.last_mut() {
            node.props.extend(props);
        } else if let Some(page) = self.pages.last_mut() {
            page.props.extend(props);
        }
    }
}

fn try_parse_headline(line: &str) -> Option<(usize, String)> {
    let caps = headline_re().captures(line)?;
    Some((caps[1].len(), caps[2].trim().to_string()))
}

fn is_drawer_marker(line: &str, marker: &str) -> bool {
    line.get(..marker.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(marker))
}

/// Split `:KEY: value` into an upper-cased key and trimmed value
fn parse_property(line: &str) -> Option<(String, String)> {
    let rest = line.strip_prefix(':')?;
    let (key, value) = rest.split_once(':')?;
    let key = key.trim().to_uppercase();
    (!key.is_empty()).then(|| (key, value.trim().to_string()))
}

fn build_page(meta: &BTreeMap<String, String>, raw: RawPage) -> Option<Page> {
    if raw.props.get("IGNORE").and_then(|v| parse_bool(v)) == Some(true) {
        log::debug!("Page '{}' is marked IGNORE, skipping", raw.title);
        return None;
    }

    let setup = resolve_page_setup(meta, &raw.props);
    let id = raw
        .props
        .get("ID")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| slugify(&raw.title));

    let mut page = Page::new(id, raw.title, setup.page_size, setup.grid);
    page.orientation = setup.orientation;
    page.margins_mm = setup.margins_mm;
    page.master = setup.master;
    page.master_def = setup.master_def;

    let inherited = Inherited::default()
        .with_padding(meta.get("PADDING").and_then(|v| parse_padding(v)))
        .with_padding(raw.props.get("PADDING").and_then(|v| parse_padding(v)));
    for node in raw.nodes {
        walk(node, inherited.clone(), &mut page.elements);
    }

    page.props = raw.props;
    Some(page)
}

/// Build elements from a subtree, resolving inheritance top-down
fn walk(node: RawNode, inherited: Inherited, out: &mut Vec<Element>) {
    let props = &node.props;
    if props.get("IGNORE").and_then(|v| parse_bool(v)) == Some(true) {
        return;
    }

    let own_area = props.get("AREA").and_then(|v| parse_area(v));
    let own_style = props
        .get("STYLE")
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let own_padding = props.get("PADDING").and_then(|v| parse_padding(v));

    let ctx = Inherited {
        area: own_area.or(inherited.area),
        style: own_style.or(inherited.style.clone()),
        padding: inherited.padding,
    }
    .with_padding(own_padding);

    let kind = match props.get("TYPE") {
        Some(declared) => Some(ElementType::parse(declared)),
        None if node.children.is_empty() && is_single_image_link(&node.lines) => {
            Some(ElementType::Figure)
        }
        None => None,
    };

    if let Some(kind) = kind.filter(|k| *k != ElementType::None) {
        out.push(build_element(&node, kind, &ctx));
    }

    for child in node.children {
        walk(child, ctx.clone(), out);
    }
}

fn is_single_image_link(lines: &[String]) -> bool {
    let mut non_blank = lines.iter().map(|l| l.trim()).filter(|l| !l.is_empty());
    matches!(
        (non_blank.next(), non_blank.next()),
        (Some(only), None) if image_link_re().is_match(only)
    )
}

fn first_image_link(lines: &[String]) -> Option<String> {
    lines
        .iter()
        .find_map(|l| image_link_re().captures(l.trim()))
        .map(|caps| caps[1].to_string())
}

fn build_element(node: &RawNode, kind: ElementType, ctx: &Inherited) -> Element {
    let props = &node.props;
    let prop = |key: &str| {
        props
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    };

    let id = prop("ID")
        .map(str::to_string)
        .unwrap_or_else(|| slugify(&node.title));
    let mut element = Element::new(id, kind.clone());
    element.title = node.title.clone();
    element.area = ctx.area;
    element.style = ctx.style.clone();
    element.padding_mm = ctx.padding;
    element.z = prop("Z").and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_Z);
    element.justify = props
        .get("JUSTIFY")
        .map(|v| parse_bool(v).unwrap_or(true));
    element.align = prop("ALIGN").and_then(parse_halign);
    element.valign = prop("VALIGN").and_then(parse_valign);
    element.flow = prop("FLOW").and_then(parse_flow);

    let scale = prop("SCALE").and_then(|v| v.parse::<f64>().ok());
    element.payload = match kind {
        ElementType::Header | ElementType::Subheader | ElementType::Body => Payload::Text {
            blocks: parse_blocks(&node.lines),
        },
        ElementType::Figure => Payload::Figure(FigureRef {
            src: first_image_link(&node.lines),
            caption: prop("CAPTION").map(str::to_string),
            fit: prop("FIT").unwrap_or("contain").to_string(),
        }),
        ElementType::Pdf => Payload::Pdf(PdfRef {
            src: prop("PDF").map(str::to_string),
            page: prop("PAGE").and_then(|v| v.parse().ok()).unwrap_or(1),
            scale,
            scale_mode: match prop("SCALE_MODE").map(str::to_lowercase).as_deref() {
                Some("cover") => ScaleMode::Cover,
                _ => ScaleMode::Contain,
            },
        }),
        ElementType::Svg => Payload::Svg(SvgRef {
            src: prop("SVG").map(str::to_string),
            scale,
        }),
        ElementType::Rectangle => Payload::Rectangle(RectSpec {
            color: prop("COLOR").map(str::to_string),
            alpha: prop("ALPHA").map(|v| v.parse().unwrap_or(1.0)),
            stroke: prop("STROKE").map(str::to_string),
            stroke_color: prop("STROKE_COLOR").map(str::to_string),
            radius: prop("RADIUS").map(str::to_string),
        }),
        ElementType::Toc | ElementType::None | ElementType::Unknown(_) => Payload::Empty,
    };
    element
}

fn parse_halign(value: &str) -> Option<HAlign> {
    match value.to_lowercase().as_str() {
        "left" => Some(HAlign::Left),
        "center" => Some(HAlign::Center),
        "right" => Some(HAlign::Right),
        _ => None,
    }
}

fn parse_valign(value: &str) -> Option<VAlign> {
    match value.to_lowercase().as_str() {
        "top" => Some(VAlign::Top),
        "middle" => Some(VAlign::Middle),
        "bottom" => Some(VAlign::Bottom),
        _ => None,
    }
}

fn parse_flow(value: &str) -> Option<Flow> {
    match value.to_lowercase().as_str() {
        "normal" => Some(Flow::Normal),
        "bottom-up" => Some(Flow::BottomUp),
        "center-out" => Some(Flow::CenterOut),
        _ => None,
    }
}

/// Parse outline markup into a Document.
///
/// # Errors
///
/// The parser is lenient: malformed attributes degrade to "absent" and
/// unknown constructs are kept as content. It does not currently fail.
pub fn parse(text: &str) -> Result<Document> {
    let parser = Parser::new();
    parser.parse(text)
}

/// Read and parse a markup file
pub fn parse_file(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    parse(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

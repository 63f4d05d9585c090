//! Positioned elements and their payloads
//!
//! An element is one placed item on a page: text, an image, a PDF page,
//! an SVG, a colored rectangle, or a table of contents.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::block::TextBlock;

/// Default stacking order for elements without `Z`
pub const DEFAULT_Z: i64 = 10;

/// Element type
///
/// `None` elements are never emitted; they only pass area, style, and
/// padding down to their children. `Unknown` keeps an unrecognized declared
/// type so validation can report it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementType {
    Header,
    Subheader,
    Body,
    Figure,
    Pdf,
    Svg,
    Rectangle,
    Toc,
    None,
    Unknown(String),
}

impl ElementType {
    /// Parse a declared `TYPE` value (case-insensitive)
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "header" => ElementType::Header,
            "subheader" => ElementType::Subheader,
            "body" => ElementType::Body,
            "figure" => ElementType::Figure,
            "pdf" => ElementType::Pdf,
            "svg" => ElementType::Svg,
            "rectangle" => ElementType::Rectangle,
            "toc" => ElementType::Toc,
            "none" => ElementType::None,
            other => ElementType::Unknown(other.to_string()),
        }
    }

    /// Lowercase name as written in the markup
    pub fn as_str(&self) -> &str {
        match self {
            ElementType::Header => "header",
            ElementType::Subheader => "subheader",
            ElementType::Body => "body",
            ElementType::Figure => "figure",
            ElementType::Pdf => "pdf",
            ElementType::Svg => "svg",
            ElementType::Rectangle => "rectangle",
            ElementType::Toc => "toc",
            ElementType::None => "none",
            ElementType::Unknown(name) => name,
        }
    }

    /// Header, subheader, or body
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            ElementType::Header | ElementType::Subheader | ElementType::Body
        )
    }

    /// Whether elements of this type produce output
    pub fn is_rendered(&self) -> bool {
        !matches!(self, ElementType::None | ElementType::Unknown(_))
    }
}

impl From<String> for ElementType {
    fn from(value: String) -> Self {
        ElementType::parse(&value)
    }
}

impl From<ElementType> for String {
    fn from(value: ElementType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rectangle in grid cells (1-based, inclusive, total-grid coordinates)
///
/// Values are signed: the legacy `x,y,w,h` notation is taken literally and
/// validation reports non-positive spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Area {
    pub x: i64,
    pub y: i64,
    pub w: i64,
    pub h: i64,
}

impl Area {
    pub fn new(x: i64, y: i64, w: i64, h: i64) -> Self {
        Self { x, y, w, h }
    }

    /// Last covered column
    pub fn right(&self) -> i64 {
        self.x + self.w - 1
    }

    /// Last covered row
    pub fn bottom(&self) -> i64 {
        self.y + self.h - 1
    }
}

/// Four side lengths in millimetres (margins and padding)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Sides {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Sides {
    pub fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same length on every side
    pub fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Side-wise sum
    pub fn add(&self, other: &Sides) -> Sides {
        Sides::new(
            self.top + other.top,
            self.right + other.right,
            self.bottom + other.bottom,
            self.left + other.left,
        )
    }
}

/// Horizontal alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

impl HAlign {
    pub fn as_str(self) -> &'static str {
        match self {
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
        }
    }
}

/// Vertical alignment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VAlign {
    Top,
    Middle,
    Bottom,
}

/// Content flow hint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Flow {
    Normal,
    BottomUp,
    CenterOut,
}

impl Flow {
    pub fn as_str(self) -> &'static str {
        match self {
            Flow::Normal => "normal",
            Flow::BottomUp => "bottom-up",
            Flow::CenterOut => "center-out",
        }
    }
}

/// How a PDF page is fitted into its frame when no explicit scale is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// Whole page visible (smaller axis ratio)
    #[default]
    Contain,
    /// Frame fully covered, may crop (larger axis ratio)
    Cover,
}

impl ScaleMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ScaleMode::Contain => "contain",
            ScaleMode::Cover => "cover",
        }
    }
}

/// Image reference of a figure element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureRef {
    /// Image path
    pub src: Option<String>,
    /// Caption text (markup allowed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Fit mode (`contain`, `cover`, `fill`, `stretch`)
    #[serde(default = "default_fit")]
    pub fit: String,
}

fn default_fit() -> String {
    "contain".to_string()
}

impl Default for FigureRef {
    fn default() -> Self {
        Self {
            src: None,
            caption: None,
            fit: default_fit(),
        }
    }
}

/// PDF page reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PdfRef {
    /// PDF path
    pub src: Option<String>,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: u32,
    /// Explicit scale, used verbatim when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
    /// Fit mode used when `scale` is absent
    #[serde(default)]
    pub scale_mode: ScaleMode,
}

fn default_page() -> u32 {
    1
}

impl Default for PdfRef {
    fn default() -> Self {
        Self {
            src: None,
            page: default_page(),
            scale: None,
            scale_mode: ScaleMode::default(),
        }
    }
}

/// SVG reference
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SvgRef {
    /// SVG path
    pub src: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

/// Inline rectangle fields (each overrides the resolved style)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RectSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alpha: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<String>,
}

/// Element payload, keyed by element kind
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    /// Paragraphs, lists, and tables of a text element
    Text { blocks: Vec<TextBlock> },
    Figure(FigureRef),
    Pdf(PdfRef),
    Svg(SvgRef),
    Rectangle(RectSpec),
    /// No payload (toc, none, unknown types)
    #[default]
    Empty,
}

/// A positioned element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Unique element id
    pub id: String,
    /// Element type
    #[serde(rename = "type")]
    pub kind: ElementType,
    /// Headline text
    #[serde(default)]
    pub title: String,
    /// Placement in total-grid cells
    #[serde(default)]
    pub area: Option<Area>,
    /// Stacking order (ascending)
    #[serde(default = "default_z")]
    pub z: i64,
    /// Named style reference
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Paragraph justification override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justify: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<HAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valign: Option<VAlign>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flow: Option<Flow>,
    /// Accumulated padding (ancestors plus own)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub padding_mm: Option<Sides>,
    /// Type-specific content
    #[serde(default)]
    pub payload: Payload,
}

fn default_z() -> i64 {
    DEFAULT_Z
}

impl Element {
    /// Create an element with no placement and an empty payload
    pub fn new(id: impl Into<String>, kind: ElementType) -> Self {
        Self {
            id: id.into(),
            kind,
            title: String::new(),
            area: None,
            z: DEFAULT_Z,
            style: None,
            justify: None,
            align: None,
            valign: None,
            flow: None,
            padding_mm: None,
            payload: Payload::Empty,
        }
    }

    /// Set the area
    pub fn with_area(mut self, area: Area) -> Self {
        self.area = Some(area);
        self
    }

    /// Set the payload
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Asset path of a figure, pdf, or svg payload
    pub fn asset_src(&self) -> Option<&str> {
        match &self.payload {
            Payload::Figure(fig) => fig.src.as_deref(),
            Payload::Pdf(pdf) => pdf.src.as_deref(),
            Payload::Svg(svg) => svg.src.as_deref(),
            _ => None,
        }
    }

    /// Replace the asset path of a figure, pdf, or svg payload
    pub fn set_asset_src(&mut self, src: impl Into<String>) {
        let src = Some(src.into());
        match &mut self.payload {
            Payload::Figure(fig) => fig.src = src,
            Payload::Pdf(pdf) => pdf.src = src,
            Payload::Svg(svg) => svg.src = src,
            _ => {}
        }
    }

    /// Text blocks of a text element (empty for other payloads)
    pub fn text_blocks(&self) -> &[TextBlock] {
        match &self.payload {
            Payload::Text { blocks } => blocks,
            _ => &[],
        }
    }
}

//! Document root and page definitions
//!
//! A document is a list of pages plus the global `#+KEY: value`
//! directives. Pages carry their resolved physical size and grid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::element::{Element, Sides};

/// Page margins in millimetres
pub type Margins = Sides;

/// A complete document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Global directives, keys upper-cased
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    /// Pages in source order (master definitions included)
    #[serde(default)]
    pub pages: Vec<Page>,
}

impl Document {
    /// Create a new empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a directive by (upper-case) key
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Pages that produce output (everything except master definitions)
    pub fn rendered_pages(&self) -> impl Iterator<Item = &Page> {
        self.pages.iter().filter(|p| !p.is_master_def())
    }

    /// Find the master definition page with the given name
    pub fn master(&self, name: &str) -> Option<&Page> {
        self.pages
            .iter()
            .find(|p| p.master_def.as_deref() == Some(name))
    }

    /// All elements of all pages
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.pages.iter().flat_map(|p| p.elements.iter())
    }

    /// Check if the document has no pages
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Page orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
}

impl Orientation {
    /// Parse an orientation, `None` for unrecognized values
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "landscape" => Some(Orientation::Landscape),
            "portrait" => Some(Orientation::Portrait),
            _ => None,
        }
    }
}

/// Physical page size in millimetres
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub w_mm: f64,
    pub h_mm: f64,
}

impl PageSize {
    pub fn new(w_mm: f64, h_mm: f64) -> Self {
        Self { w_mm, h_mm }
    }

    /// A4 portrait, used when no page is rendered
    pub fn a4_portrait() -> Self {
        Self::new(210.0, 297.0)
    }
}

/// Grid dimensions in cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub cols: u32,
    pub rows: u32,
}

impl Grid {
    pub fn new(cols: u32, rows: u32) -> Self {
        Self { cols, rows }
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(12, 8)
    }
}

/// A page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    /// Unique page id
    pub id: String,
    /// Headline text
    pub title: String,
    pub page_size: PageSize,
    #[serde(default)]
    pub orientation: Orientation,
    /// Content grid
    pub grid: Grid,
    /// Margins, when declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub margins_mm: Option<Margins>,
    /// Content grid plus one margin track per side, when margins are declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grid_total: Option<Grid>,
    /// Master page applied to this page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master: Option<String>,
    /// Name under which this page is a master template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub master_def: Option<String>,
    /// Raw page property block
    #[serde(default)]
    pub props: BTreeMap<String, String>,
    /// Elements in source order
    #[serde(default)]
    pub elements: Vec<Element>,
}

impl Page {
    /// Create a page with the given size and grid, without margins
    pub fn new(id: impl Into<String>, title: impl Into<String>, size: PageSize, grid: Grid) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            page_size: size,
            orientation: Orientation::default(),
            grid,
            margins_mm: None,
            grid_total: None,
            master: None,
            master_def: None,
            props: BTreeMap::new(),
            elements: Vec::new(),
        }
    }

    /// Set the margins and the matching total grid
    pub fn with_margins(mut self, margins: Margins) -> Self {
        self.margins_mm = Some(margins);
        self.grid_total = Some(Grid::new(self.grid.cols + 2, self.grid.rows + 2));
        self
    }

    /// Add an element
    pub fn push(&mut self, element: Element) {
        self.elements.push(element);
    }

    /// Whether this page is a master template
    pub fn is_master_def(&self) -> bool {
        self.master_def.is_some()
    }

    /// Grid in which element areas are addressed
    pub fn total_grid(&self) -> Grid {
        match self.margins_mm {
            Some(_) => Grid::new(self.grid.cols + 2, self.grid.rows + 2),
            None => self.grid,
        }
    }

    /// Look up a raw page property by (upper-case) key
    pub fn prop(&self, key: &str) -> Option<&str> {
        self.props.get(key).map(String::as_str)
    }
}

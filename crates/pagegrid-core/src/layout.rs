//! Page setup and grid geometry
//!
//! Element areas are addressed in the *total* grid: when margins are
//! declared, one extra track per side holds the margin, so the total grid
//! is the content grid plus two in each direction.

use std::collections::BTreeMap;

use pagegrid_ast::{Area, Document, Grid, Margins, Orientation, Page, PageSize, Sides};

/// Named page sizes in portrait millimetres
const PAGE_SIZES_MM: [(&str, f64, f64); 7] = [
    ("A4", 210.0, 297.0),
    ("A3", 297.0, 420.0),
    ("A2", 420.0, 594.0),
    ("A1", 594.0, 841.0),
    ("A5", 148.0, 210.0),
    ("LETTER", 216.0, 279.0),
    ("LEGAL", 216.0, 356.0),
];

/// Document-level defaults applied when a directive is absent
pub const META_DEFAULTS: [(&str, &str); 7] = [
    ("PAGESIZE", "A4"),
    ("ORIENTATION", "landscape"),
    ("GRID", "12x8"),
    ("THEME", "light"),
    ("GRID_DEBUG", "false"),
    ("MARGINS", ""),
    ("DEFAULT_MASTER", ""),
];

/// Look up a meta directive, falling back to the document default
pub fn meta_or_default<'a>(meta: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    if let Some(value) = meta.get(key) {
        return value;
    }
    META_DEFAULTS
        .iter()
        .find(|(k, _)| *k == key)
        .map_or("", |(_, v)| *v)
}

/// Resolve a named page size for an orientation (unknown names fall back to A4)
pub fn page_size_mm(name: &str, orientation: Orientation) -> PageSize {
    let key = name.trim().to_uppercase();
    let (_, w, h) = PAGE_SIZES_MM
        .iter()
        .find(|(n, _, _)| *n == key)
        .copied()
        .unwrap_or(PAGE_SIZES_MM[0]);
    match orientation {
        Orientation::Landscape if w < h => PageSize::new(h, w),
        Orientation::Portrait if w > h => PageSize::new(h, w),
        _ => PageSize::new(w, h),
    }
}

/// Parse a `CxR` grid spec, `None` when malformed or zero-sized
pub fn parse_grid(value: &str) -> Option<Grid> {
    let lower = value.trim().to_lowercase();
    let (cols, rows) = lower.split_once('x')?;
    let cols: u32 = cols.trim().parse().ok()?;
    let rows: u32 = rows.trim().parse().ok()?;
    (cols > 0 && rows > 0).then(|| Grid::new(cols, rows))
}

/// Parse `t,r,b,l` margins in millimetres (exactly four numbers)
pub fn parse_margins(value: &str) -> Option<Margins> {
    let nums: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .ok()?;
    match nums.as_slice() {
        [t, r, b, l] => Some(Sides::new(*t, *r, *b, *l)),
        _ => None,
    }
}

/// Resolved page-level settings
#[derive(Debug, Clone, PartialEq)]
pub struct PageSetup {
    pub page_size: PageSize,
    pub orientation: Orientation,
    pub grid: Grid,
    pub margins_mm: Option<Margins>,
    pub master: Option<String>,
    pub master_def: Option<String>,
}

/// Resolve page settings from page properties over document meta
///
/// Page props override meta for `PAGE_SIZE`, `ORIENTATION`, `GRID`,
/// `MARGINS`, and `MASTER`.
pub fn resolve_page_setup(
    meta: &BTreeMap<String, String>,
    props: &BTreeMap<String, String>,
) -> PageSetup {
    let pick = |prop: &str, meta_key: &str| -> String {
        props
            .get(prop)
            .map(String::as_str)
            .unwrap_or_else(|| meta_or_default(meta, meta_key))
            .trim()
            .to_string()
    };

    let orientation = Orientation::parse(&pick("ORIENTATION", "ORIENTATION")).unwrap_or_default();
    let page_size = page_size_mm(&pick("PAGE_SIZE", "PAGESIZE"), orientation);
    let grid = parse_grid(&pick("GRID", "GRID")).unwrap_or_default();
    let margins_mm = parse_margins(&pick("MARGINS", "MARGINS"));

    let non_empty = |v: String| (!v.is_empty()).then_some(v);
    let master = non_empty(pick("MASTER", "DEFAULT_MASTER"));
    let master_def = props
        .get("MASTER_DEF")
        .map(|v| v.trim().to_string())
        .and_then(non_empty);

    PageSetup {
        page_size,
        orientation,
        grid,
        margins_mm,
        master,
        master_def,
    }
}

/// Physical geometry of a page's grid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub w_mm: f64,
    pub h_mm: f64,
    pub cols: u32,
    pub rows: u32,
    pub margins: Option<Margins>,
    /// Content cell width in mm
    pub cw: f64,
    /// Content cell height in mm
    pub ch: f64,
    pub total_cols: u32,
    pub total_rows: u32,
}

impl PageGeometry {
    /// Compute the geometry of a page
    pub fn of(page: &Page) -> Self {
        let w = page.page_size.w_mm;
        let h = page.page_size.h_mm;
        let cols = page.grid.cols.max(1);
        let rows = page.grid.rows.max(1);

        match page.margins_mm {
            Some(m) => Self {
                w_mm: w,
                h_mm: h,
                cols,
                rows,
                margins: Some(m),
                cw: (w - (m.left + m.right)) / cols as f64,
                ch: (h - (m.top + m.bottom)) / rows as f64,
                total_cols: cols + 2,
                total_rows: rows + 2,
            },
            None => Self {
                w_mm: w,
                h_mm: h,
                cols,
                rows,
                margins: None,
                cw: w / cols as f64,
                ch: h / rows as f64,
                total_cols: cols,
                total_rows: rows,
            },
        }
    }

    /// Default area for elements without one: the first content row
    pub fn default_area(&self) -> Area {
        Area::new(1, 1, self.cols as i64, 1)
    }

    /// Whether an area lies inside the total grid with positive spans
    pub fn contains(&self, area: &Area) -> bool {
        area.x >= 1
            && area.y >= 1
            && area.w >= 1
            && area.h >= 1
            && area.right() <= self.total_cols as i64
            && area.bottom() <= self.total_rows as i64
    }

    fn col_width(&self, index: i64) -> f64 {
        match self.margins {
            Some(m) if index == 1 => m.left,
            Some(m) if index == self.cols as i64 + 2 => m.right,
            _ => self.cw,
        }
    }

    fn row_height(&self, index: i64) -> f64 {
        match self.margins {
            Some(m) if index == 1 => m.top,
            Some(m) if index == self.rows as i64 + 2 => m.bottom,
            _ => self.ch,
        }
    }

    /// Size in mm of the frame an element occupies, after padding
    ///
    /// Each dimension is clamped at zero.
    pub fn frame_size(&self, area: &Area, padding: Option<&Sides>) -> (f64, f64) {
        let (mut width, mut height) = match self.margins {
            Some(_) => (
                (area.x..area.x + area.w.max(0))
                    .map(|i| self.col_width(i))
                    .sum::<f64>(),
                (area.y..area.y + area.h.max(0))
                    .map(|j| self.row_height(j))
                    .sum::<f64>(),
            ),
            None => (area.w as f64 * self.cw, area.h as f64 * self.ch),
        };
        if let Some(p) = padding {
            width -= p.left + p.right;
            height -= p.top + p.bottom;
        }
        (width.max(0.0), height.max(0.0))
    }
}

/// Recompute derived page geometry in place
///
/// Idempotent: resolving a resolved document changes nothing.
pub fn resolve(doc: &mut Document) {
    for page in &mut doc.pages {
        page.grid_total = page
            .margins_mm
            .map(|_| Grid::new(page.grid.cols + 2, page.grid.rows + 2));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(grid: Grid, margins: Option<Margins>) -> Page {
        let mut p = Page::new("p", "P", PageSize::new(297.0, 210.0), grid);
        p.margins_mm = margins;
        p
    }

    #[test]
    fn test_page_sizes_and_orientation() {
        assert_eq!(
            page_size_mm("a4", Orientation::Landscape),
            PageSize::new(297.0, 210.0)
        );
        assert_eq!(
            page_size_mm("A3", Orientation::Portrait),
            PageSize::new(297.0, 420.0)
        );
        assert_eq!(
            page_size_mm("Letter", Orientation::Portrait),
            PageSize::new(216.0, 279.0)
        );
        assert_eq!(
            page_size_mm("B7", Orientation::Portrait),
            PageSize::new(210.0, 297.0)
        );
    }

    #[test]
    fn test_parse_grid() {
        assert_eq!(parse_grid("4x3"), Some(Grid::new(4, 3)));
        assert_eq!(parse_grid("12X8"), Some(Grid::new(12, 8)));
        assert_eq!(parse_grid("0x3"), None);
        assert_eq!(parse_grid("wide"), None);
    }

    #[test]
    fn test_parse_margins() {
        assert_eq!(
            parse_margins("25, 15, 20, 25"),
            Some(Sides::new(25.0, 15.0, 20.0, 25.0))
        );
        assert_eq!(parse_margins("10,10"), None);
        assert_eq!(parse_margins(""), None);
    }

    #[test]
    fn test_page_setup_props_override_meta() {
        let mut meta = BTreeMap::new();
        meta.insert("GRID".to_string(), "6x4".to_string());
        meta.insert("DEFAULT_MASTER".to_string(), "base".to_string());
        let mut props = BTreeMap::new();
        props.insert("GRID".to_string(), "3x3".to_string());
        props.insert("MARGINS".to_string(), "1,1,1,1".to_string());

        let setup = resolve_page_setup(&meta, &props);
        assert_eq!(setup.grid, Grid::new(3, 3));
        assert_eq!(setup.margins_mm, Some(Sides::uniform(1.0)));
        assert_eq!(setup.master.as_deref(), Some("base"));
        assert_eq!(setup.page_size, PageSize::new(297.0, 210.0));
    }

    #[test]
    fn test_page_setup_bad_values_fall_back() {
        let mut meta = BTreeMap::new();
        meta.insert("GRID".to_string(), "banana".to_string());
        meta.insert("MARGINS".to_string(), "1,2,3".to_string());
        let setup = resolve_page_setup(&meta, &BTreeMap::new());
        assert_eq!(setup.grid, Grid::new(12, 8));
        assert_eq!(setup.margins_mm, None);
        assert_eq!(setup.master, None);
    }

    #[test]
    fn test_geometry_with_margins() {
        let p = page(Grid::new(4, 3), Some(Sides::new(20.0, 15.0, 10.0, 25.0)));
        let g = PageGeometry::of(&p);
        assert_eq!(g.total_cols, 6);
        assert_eq!(g.total_rows, 5);
        assert!((g.cw - (297.0 - 40.0) / 4.0).abs() < 1e-9);
        assert!((g.ch - (210.0 - 30.0) / 3.0).abs() < 1e-9);

        // left margin track plus one content column
        let (w, h) = g.frame_size(&Area::new(1, 1, 2, 1), None);
        assert!((w - (25.0 + g.cw)).abs() < 1e-9);
        assert!((h - 20.0).abs() < 1e-9);

        // right and bottom margin tracks
        let (w, h) = g.frame_size(&Area::new(6, 5, 1, 1), None);
        assert!((w - 15.0).abs() < 1e-9);
        assert!((h - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_geometry_without_margins() {
        let g = PageGeometry::of(&page(Grid::new(12, 8), None));
        assert_eq!((g.total_cols, g.total_rows), (12, 8));
        let (w, h) = g.frame_size(&Area::new(1, 1, 3, 2), None);
        assert!((w - 3.0 * 297.0 / 12.0).abs() < 1e-9);
        assert!((h - 2.0 * 210.0 / 8.0).abs() < 1e-9);
        assert!(g.contains(&Area::new(12, 8, 1, 1)));
        assert!(!g.contains(&Area::new(12, 8, 2, 1)));
        assert!(!g.contains(&Area::new(0, 1, 1, 1)));
    }

    #[test]
    fn test_frame_size_padding_clamps() {
        let g = PageGeometry::of(&page(Grid::new(12, 8), None));
        let area = Area::new(1, 1, 1, 1);
        let (w, h) = g.frame_size(&area, Some(&Sides::uniform(100.0)));
        assert_eq!((w, h), (0.0, 0.0));

        let zero = Sides::uniform(5.0).add(&Sides::uniform(-5.0));
        assert_eq!(g.frame_size(&area, Some(&zero)), g.frame_size(&area, None));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut doc = Document::new();
        doc.pages.push(page(Grid::new(3, 3), Some(Sides::uniform(1.0))));
        doc.pages.push(page(Grid::new(2, 2), None));

        resolve(&mut doc);
        let once = doc.clone();
        resolve(&mut doc);
        assert_eq!(doc, once);
        assert_eq!(doc.pages[0].grid_total, Some(Grid::new(5, 5)));
        assert_eq!(doc.pages[1].grid_total, None);
    }
}

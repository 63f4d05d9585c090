//! pagegrid-core - Pages on a grid
//!
//! Core library for pagegrid: parses outline markup into the page IR,
//! resolves page geometry, and interprets style declarations.
//!
//! # Example
//!
//! ```
//! use pagegrid_core::{parse, PageGeometry};
//!
//! let doc = parse("#+PAGESIZE: A4\n#+GRID: 12x8\n* Cover\n")?;
//! let geometry = PageGeometry::of(&doc.pages[0]);
//! assert_eq!(geometry.w_mm, 297.0);
//! assert_eq!(geometry.cols, 12);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod area;
pub mod blocks;
pub mod cache;
pub mod diagnostics;
pub mod fonts;
pub mod layout;
pub mod parser;
pub mod style;

// Re-export main types and functions
pub use area::{parse_area, parse_bool, parse_padding, slugify};
pub use blocks::parse_blocks;
pub use cache::{Clock, FileCache, SystemClock, TtlCache};
pub use diagnostics::{Diagnostic, Severity};
pub use fonts::{missing_font_warnings, DirectoryFontCatalog, FontCatalog, StaticFontCatalog};
pub use layout::{resolve, resolve_page_setup, PageGeometry, PageSetup};
pub use parser::{parse, parse_file};
pub use style::{par_args, parse_style_decl, text_args, Style, StyleSheet};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! pagegrid-ast - Intermediate document model
//!
//! This crate provides the page/element tree produced by the parser and
//! consumed by the validator, the emitter, and the asset pipeline. Every
//! type serializes with serde; the JSON form is the IR handoff format.

pub mod block;
pub mod document;
pub mod element;

pub use block::{Checkbox, ListBlock, ListItem, ListKind, MarkerStyle, TableBlock, TextBlock};
pub use document::{Document, Grid, Margins, Orientation, Page, PageSize};
pub use element::{
    Area, Element, ElementType, FigureRef, Flow, HAlign, Payload, PdfRef, RectSpec, ScaleMode,
    Sides, SvgRef, VAlign, DEFAULT_Z,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, "1.0.0");
    }
}

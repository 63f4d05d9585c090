//! # pagegrid-assets
//!
//! Rescue for PDF assets that break Typst compilation.
//!
//! When a deck fails to compile, each embedded PDF is first repaired
//! (qpdf, `mutool clean`, Ghostscript), then replaced by an SVG rendering
//! of the referenced page, then by a PNG. The document is re-emitted and
//! recompiled after every stage that changed something.
//!
//! A finished PDF can also get an sRGB output intent through Ghostscript,
//! see [`inject_output_intent`].
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use pagegrid_assets::{FallbackOptions, FallbackPipeline};
//! use pagegrid_typst::{Emitter, TypstCli};
//!
//! let doc = pagegrid_core::parse_file(Path::new("deck.org"))?;
//! let pipeline = FallbackPipeline::with_system_tools(FallbackOptions::new("export"));
//! let outcome = pipeline.run(
//!     &doc,
//!     &mut Emitter::new().with_asset_root("export"),
//!     &TypstCli::default(),
//!     Path::new("export/deck.typ"),
//!     Path::new("deck.pdf"),
//! )?;
//! for asset in outcome.failed() {
//!     eprintln!("could not embed {}", asset.original);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod convert;
pub mod error;
pub mod intent;
pub mod paths;
pub mod pipeline;
pub mod sanitize;
pub mod tools;

pub use convert::{convert_page, fallback_name, FALLBACK_DIR};
pub use error::{AssetError, Result, ToolError, ToolResult};
pub use intent::{
    find_srgb_icc, has_output_intent, inject_output_intent, GhostscriptOutputIntent, IntentOutcome,
    PdfPreset,
};
pub use paths::adjust_asset_paths;
pub use pipeline::{AssetRecord, AssetState, FallbackOptions, FallbackPipeline, PipelineOutcome, Stage};
pub use sanitize::{sanitize_pdf, SANITIZED_DIR};
pub use tools::{ConvertCommand, ImageFormat, PageConverter, PdfRepairTool, RepairCommand, DEFAULT_DPI};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

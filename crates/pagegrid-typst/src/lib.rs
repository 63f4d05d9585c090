//! pagegrid-typst - Typst emission and compilation
//!
//! This crate turns a pagegrid document into Typst source and compiles it
//! to PDF.
//!
//! # Architecture
//!
//! 1. **Emitter** - Converts a `pagegrid_ast::Document` to Typst markup
//! 2. **Compiler** - Runs Typst on the emitted file
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use pagegrid_typst::{emit, DocumentCompiler, TypstCli};
//!
//! let doc = pagegrid_core::parse_file(Path::new("deck.org"))?;
//! let out = emit(&doc);
//! std::fs::write("export/deck.typ", &out.source)?;
//! TypstCli::default().compile(Path::new("export/deck.typ"), Path::new("deck.pdf"))?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod compiler;
mod emitter;
mod error;
pub mod helpers;
mod list;
pub mod pdf_size;
mod table;
pub mod text;

#[cfg(feature = "embedded")]
pub use compiler::EmbeddedCompiler;
pub use compiler::{DocumentCompiler, TypstCli};
pub use emitter::{emit, EmitOutput, Emitter};
pub use error::{Result, TypstError};
pub use pdf_size::{PdfSizeCache, MM_PER_PT};
pub use text::escape_text;

//! pagegrid CLI - Command-line interface library
//!
//! This library provides the CLI functionality for pagegrid:
//! - Build: emit Typst source (and optionally the IR) for a deck
//! - Pdf: compile the deck, rescuing PDF assets that break compilation
//! - Ir: print the parsed IR as JSON
//! - Validate: check the IR and report issues
//!
//! # Library Usage
//!
//! ```ignore
//! use pagegrid_cli::{build_command, validate_file, Settings};
//!
//! let settings = Settings::load(None)?;
//! build_command(Path::new("deck.org"), &settings, None, None)?;
//! let report = validate_file(Path::new("deck.org"), false)?;
//! ```
//!
//! # Binary Usage
//!
//! ```bash
//! pagegrid build deck.org --ir deck.json
//! pagegrid pdf deck.org --no-clean
//! pagegrid validate deck.org --format json
//! ```

pub mod app;
pub mod config;

// Re-export main entry point and types
pub use app::{
    build_command, ir_command, pdf_command, update_html_total, validate_command, validate_file,
};
pub use app::{run_cli, OutputFormat};
pub use config::{
    BuildSettings, CompilerSettings, FallbackSettings, FontSettings, OutputIntentSettings,
    PresetName, Settings, CONFIG_FILE,
};

//! Tool configuration
//!
//! Settings come from an optional `pagegrid.toml`. Document-level options
//! stay in the deck's `#+` directives; this file only covers how the tool
//! runs. Command-line flags override file values.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use pagegrid_assets::PdfPreset;
use serde::{Deserialize, Serialize};

/// File looked up in the working directory when no `--config` is given
pub const CONFIG_FILE: &str = "pagegrid.toml";

/// Top-level settings structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub build: BuildSettings,
    pub compiler: CompilerSettings,
    pub fallback: FallbackSettings,
    pub fonts: FontSettings,
    pub output_intent: OutputIntentSettings,
}

impl Settings {
    /// Parse settings from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Load settings from `path`, or from `pagegrid.toml` when present
    ///
    /// An explicit path must exist; the implicit file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let implicit = PathBuf::from(CONFIG_FILE);
                if !implicit.exists() {
                    return Ok(Self::default());
                }
                implicit
            }
        };
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let settings = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config: {}", path.display()))?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

/// Output locations and validation strictness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSettings {
    /// Directory the `.typ` file and generated assets are written to
    pub export_dir: PathBuf,
    /// Typst file name, relative to the export directory
    pub output: PathBuf,
    /// Treat missing assets as errors
    pub strict_assets: bool,
}

impl Default for BuildSettings {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("export"),
            output: PathBuf::from("deck.typ"),
            strict_assets: false,
        }
    }
}

/// How the Typst source is compiled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerSettings {
    /// `typst` executable
    pub typst_bin: PathBuf,
    /// Extra font directories; missing ones are skipped
    pub font_paths: Vec<PathBuf>,
    /// Use the in-process engine (needs the `embedded` feature)
    pub embedded: bool,
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self {
            typst_bin: PathBuf::from("typst"),
            font_paths: vec![
                PathBuf::from("assets/fonts"),
                PathBuf::from("assets/fonts/static"),
            ],
            embedded: false,
        }
    }
}

/// Asset fallback stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FallbackSettings {
    pub sanitize: bool,
    pub vector: bool,
    pub raster: bool,
    /// Resolution of PNG fallbacks
    pub dpi: u32,
}

impl Default for FallbackSettings {
    fn default() -> Self {
        Self {
            sanitize: true,
            vector: true,
            raster: true,
            dpi: pagegrid_assets::DEFAULT_DPI,
        }
    }
}

/// Font availability checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontSettings {
    /// Warn about style fonts missing from the font directories
    pub check: bool,
    /// Seconds a directory scan stays valid
    pub cache_ttl_secs: u64,
}

impl Default for FontSettings {
    fn default() -> Self {
        Self {
            check: true,
            cache_ttl_secs: pagegrid_core::fonts::DEFAULT_FONT_TTL.as_secs(),
        }
    }
}

impl FontSettings {
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

/// Ghostscript quality preset as written in settings and flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PresetName {
    Screen,
    Printer,
    Prepress,
}

impl From<PresetName> for PdfPreset {
    fn from(name: PresetName) -> Self {
        match name {
            PresetName::Screen => PdfPreset::Screen,
            PresetName::Printer => PdfPreset::Printer,
            PresetName::Prepress => PdfPreset::Prepress,
        }
    }
}

/// ICC output intent written into the finished PDF
///
/// Nothing is injected unless `srgb` is set or a profile is given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputIntentSettings {
    /// Attach the system sRGB profile
    pub srgb: bool,
    /// Explicit ICC profile; takes precedence over `srgb`
    pub icc_profile: Option<PathBuf>,
    /// Ghostscript `-dPDFSETTINGS` preset
    pub preset: Option<PresetName>,
}

impl OutputIntentSettings {
    pub fn enabled(&self) -> bool {
        self.srgb || self.icc_profile.is_some()
    }
}

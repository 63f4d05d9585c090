//! Fallback pipeline for PDF assets that break compilation
//!
//! Every PDF reference moves through a one-way state machine:
//!
//! ```text
//! Fresh ──► Sanitized ──► VectorFallback ──► RasterFallback ──► Failed
//!   │           │               │                  │
//!   └───────────┴───────────────┴──────────────────┴──► Embedded
//! ```
//!
//! A stage runs at most once per build, and only when at least one of its
//! tools is available. After a stage rewrites any reference, the working
//! copy of the document is emitted and compiled again. The caller's
//! document is never modified.

use std::fs;
use std::path::{Path, PathBuf};

use pagegrid_ast::{Document, Payload};
use pagegrid_typst::{DocumentCompiler, EmitOutput, Emitter};

use crate::convert::{convert_page, FALLBACK_DIR};
use crate::error::{Result, ToolResult};
use crate::sanitize::{sanitize_pdf, SANITIZED_DIR};
use crate::tools::{ConvertCommand, PageConverter, PdfRepairTool, RepairCommand, DEFAULT_DPI};

/// Where a PDF reference stands in the fallback sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetState {
    /// Original reference, not yet touched
    Fresh,
    /// Points at a repaired copy of the PDF
    Sanitized,
    /// Points at an SVG rendering of the page
    VectorFallback,
    /// Points at a PNG rendering of the page
    RasterFallback,
    /// The document compiled with the current reference
    Embedded,
    /// Every available stage was tried and compilation still fails
    Failed,
}

/// A pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Sanitize,
    Vector,
    Raster,
}

impl Stage {
    /// Stages in the order they are attempted
    pub const ORDER: [Stage; 3] = [Stage::Sanitize, Stage::Vector, Stage::Raster];

    /// State of an asset this stage rewrote
    pub fn target(self) -> AssetState {
        match self {
            Stage::Sanitize => AssetState::Sanitized,
            Stage::Vector => AssetState::VectorFallback,
            Stage::Raster => AssetState::RasterFallback,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Sanitize => "sanitize",
            Stage::Vector => "vector",
            Stage::Raster => "raster",
        }
    }
}

/// Pipeline settings
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackOptions {
    /// Directory holding the emitted `.typ` file; asset paths are relative to it
    pub export_dir: PathBuf,
    /// Raster resolution
    pub dpi: u32,
    pub sanitize: bool,
    pub vector: bool,
    pub raster: bool,
}

impl Default for FallbackOptions {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("export"),
            dpi: DEFAULT_DPI,
            sanitize: true,
            vector: true,
            raster: true,
        }
    }
}

impl FallbackOptions {
    pub fn new(export_dir: impl Into<PathBuf>) -> Self {
        Self {
            export_dir: export_dir.into(),
            ..Self::default()
        }
    }

    fn enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::Sanitize => self.sanitize,
            Stage::Vector => self.vector,
            Stage::Raster => self.raster,
        }
    }
}

/// One PDF reference tracked by the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct AssetRecord {
    pub element_id: String,
    /// Source as it appeared in the input document
    pub original: String,
    /// Source in the final document
    pub current: String,
    pub page: u32,
    pub state: AssetState,
    location: (usize, usize),
    /// Latest PDF form of the asset (original or sanitized)
    pdf_src: String,
}

/// Result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    /// Working copy with rewritten references
    pub document: Document,
    pub assets: Vec<AssetRecord>,
    /// Last emitted source
    pub emitted: EmitOutput,
    /// Whether the last compilation succeeded
    pub compiled: bool,
    /// Stages that ran, in order
    pub stages_run: Vec<Stage>,
    /// Message of the last failed compilation
    pub last_error: Option<String>,
}

impl PipelineOutcome {
    pub fn state_of(&self, element_id: &str) -> Option<AssetState> {
        self.assets
            .iter()
            .find(|a| a.element_id == element_id)
            .map(|a| a.state)
    }

    pub fn failed(&self) -> impl Iterator<Item = &AssetRecord> {
        self.assets.iter().filter(|a| a.state == AssetState::Failed)
    }
}

fn is_pdf(src: &str) -> bool {
    Path::new(src)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"))
}

fn collect_assets(doc: &Document) -> Vec<AssetRecord> {
    let mut assets = Vec::new();
    for (pidx, page) in doc.pages.iter().enumerate() {
        for (eidx, el) in page.elements.iter().enumerate() {
            let Payload::Pdf(pdf) = &el.payload else {
                continue;
            };
            let Some(src) = pdf.src.as_deref().filter(|s| is_pdf(s)) else {
                continue;
            };
            assets.push(AssetRecord {
                element_id: el.id.clone(),
                original: src.to_string(),
                current: src.to_string(),
                page: pdf.page.max(1),
                state: AssetState::Fresh,
                location: (pidx, eidx),
                pdf_src: src.to_string(),
            });
        }
    }
    assets
}

/// Drives emit/compile attempts and the fallback stages
pub struct FallbackPipeline {
    options: FallbackOptions,
    repair_tools: Vec<Box<dyn PdfRepairTool>>,
    vector_converters: Vec<Box<dyn PageConverter>>,
    raster_converters: Vec<Box<dyn PageConverter>>,
}

impl FallbackPipeline {
    /// A pipeline with no tools; every stage is skipped until tools are added
    pub fn new(options: FallbackOptions) -> Self {
        Self {
            options,
            repair_tools: Vec::new(),
            vector_converters: Vec::new(),
            raster_converters: Vec::new(),
        }
    }

    /// A pipeline using qpdf, MuPDF, Poppler, and Ghostscript
    pub fn with_system_tools(options: FallbackOptions) -> Self {
        let dpi = options.dpi;
        let mut pipeline = Self::new(options);
        for tool in RepairCommand::all() {
            pipeline.add_repair_tool(Box::new(tool));
        }
        for converter in ConvertCommand::vector() {
            pipeline.add_vector_converter(Box::new(converter));
        }
        for converter in ConvertCommand::raster(dpi) {
            pipeline.add_raster_converter(Box::new(converter));
        }
        pipeline
    }

    pub fn add_repair_tool(&mut self, tool: Box<dyn PdfRepairTool>) {
        log::debug!("Added repair tool: {}", tool.name());
        self.repair_tools.push(tool);
    }

    pub fn add_vector_converter(&mut self, converter: Box<dyn PageConverter>) {
        log::debug!("Added vector converter: {}", converter.name());
        self.vector_converters.push(converter);
    }

    pub fn add_raster_converter(&mut self, converter: Box<dyn PageConverter>) {
        log::debug!("Added raster converter: {}", converter.name());
        self.raster_converters.push(converter);
    }

    pub fn options(&self) -> &FallbackOptions {
        &self.options
    }

    fn stage_available(&self, stage: Stage) -> bool {
        match stage {
            Stage::Sanitize => self.repair_tools.iter().any(|t| t.is_available()),
            Stage::Vector => self.vector_converters.iter().any(|c| c.is_available()),
            Stage::Raster => self.raster_converters.iter().any(|c| c.is_available()),
        }
    }

    fn resolve(&self, src: &str) -> PathBuf {
        let path = Path::new(src);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.options.export_dir.join(path)
        }
    }

    /// Export-relative source for a file written under `dir`
    fn export_src(dir: &str, file: &Path) -> String {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{}/{}", dir, name)
    }

    /// Run one stage on one asset; `Ok(None)` means nothing changed
    fn apply(&self, stage: Stage, asset: &AssetRecord) -> ToolResult<Option<String>> {
        let input = self.resolve(&asset.pdf_src);
        let export = &self.options.export_dir;
        match stage {
            Stage::Sanitize => Ok(sanitize_pdf(&input, &self.repair_tools, &export.join(SANITIZED_DIR))?
                .map(|file| Self::export_src(SANITIZED_DIR, &file))),
            Stage::Vector | Stage::Raster => {
                let converters = if stage == Stage::Vector {
                    &self.vector_converters
                } else {
                    &self.raster_converters
                };
                let file = convert_page(
                    &input,
                    Path::new(&asset.original),
                    asset.page,
                    converters,
                    &export.join(FALLBACK_DIR),
                )?;
                Ok(Some(Self::export_src(FALLBACK_DIR, &file)))
            }
        }
    }

    /// Emit `doc` to `typ_path` and compile it to `pdf_path`
    fn attempt(
        &self,
        doc: &Document,
        emitter: &mut Emitter,
        compiler: &dyn DocumentCompiler,
        typ_path: &Path,
        pdf_path: &Path,
    ) -> Result<(EmitOutput, Option<String>)> {
        let emitted = emitter.emit(doc);
        if let Some(parent) = typ_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(typ_path, &emitted.source)?;
        let error = match compiler.compile(typ_path, pdf_path) {
            Ok(()) => None,
            Err(e) => {
                log::warn!("Compilation with {} failed: {}", compiler.name(), e);
                Some(e.to_string())
            }
        };
        Ok((emitted, error))
    }

    /// Emit and compile `doc`, falling back stage by stage on failure
    ///
    /// Only writing the emitted source can fail; assets that cannot be
    /// rescued end in [`AssetState::Failed`].
    pub fn run(
        &self,
        doc: &Document,
        emitter: &mut Emitter,
        compiler: &dyn DocumentCompiler,
        typ_path: &Path,
        pdf_path: &Path,
    ) -> Result<PipelineOutcome> {
        let mut working = doc.clone();
        let mut assets = collect_assets(&working);
        let mut stages_run = Vec::new();

        let (mut emitted, mut error) = self.attempt(&working, emitter, compiler, typ_path, pdf_path)?;

        for stage in Stage::ORDER {
            if error.is_none() {
                break;
            }
            if assets.is_empty() {
                log::debug!("No PDF assets left to rescue");
                break;
            }
            if !self.options.enabled(stage) {
                log::debug!("Stage {} is disabled, skipping", stage.as_str());
                continue;
            }
            if !self.stage_available(stage) {
                log::debug!("Stage {} has no available tool, skipping", stage.as_str());
                continue;
            }

            stages_run.push(stage);
            let mut changed = false;
            for asset in assets.iter_mut() {
                match self.apply(stage, asset) {
                    Ok(Some(src)) => {
                        log::debug!(
                            "Stage {} rewrote {}: {} -> {}",
                            stage.as_str(),
                            asset.element_id,
                            asset.current,
                            src
                        );
                        let (pidx, eidx) = asset.location;
                        working.pages[pidx].elements[eidx].set_asset_src(src.clone());
                        if stage == Stage::Sanitize {
                            asset.pdf_src = src.clone();
                        }
                        asset.current = src;
                        asset.state = stage.target();
                        changed = true;
                    }
                    Ok(None) => log::debug!("Stage {} left {} unchanged", stage.as_str(), asset.element_id),
                    Err(e) => log::warn!("Stage {} failed for {}: {}", stage.as_str(), asset.element_id, e),
                }
            }

            if changed {
                (emitted, error) = self.attempt(&working, emitter, compiler, typ_path, pdf_path)?;
            }
        }

        let compiled = error.is_none();
        let final_state = if compiled {
            AssetState::Embedded
        } else {
            AssetState::Failed
        };
        for asset in &mut assets {
            asset.state = final_state;
        }

        Ok(PipelineOutcome {
            document: working,
            assets,
            emitted,
            compiled,
            stages_run,
            last_error: error,
        })
    }
}

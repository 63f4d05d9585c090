//! CLI Application logic
//!
//! Contains the command-line interface implementation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use regex::Regex;

use pagegrid_ast::Document;
use pagegrid_assets::{
    adjust_asset_paths, find_srgb_icc, inject_output_intent, AssetState, FallbackOptions,
    FallbackPipeline, GhostscriptOutputIntent, IntentOutcome, PdfPreset,
};
use pagegrid_core::{parse_file, DirectoryFontCatalog, SystemClock};
use pagegrid_typst::{DocumentCompiler, Emitter, TypstCli};
use pagegrid_validate::{validate_ir, ValidationEngine, ValidationOptions, ValidationReport};

use crate::config::{OutputIntentSettings, PresetName, Settings};

/// Output format for diagnostics
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output
    #[default]
    Text,
    /// JSON output for tool consumption
    Json,
}

#[derive(Parser)]
#[command(name = "pagegrid")]
#[command(author, version, about = "Grid-placed slide decks from outline markup", long_about = None)]
struct Cli {
    /// Log pipeline progress (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Settings file (defaults to ./pagegrid.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Emit Typst source for a deck
    Build {
        /// Input markup file
        input: PathBuf,

        /// Typst file, relative to the export directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the IR as JSON, relative to the export directory
        #[arg(long)]
        ir: Option<PathBuf>,

        /// Directory for generated files
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Set the `let total = N;` page count in a viewer HTML file
        #[arg(long)]
        update_html: Option<PathBuf>,
    },

    /// Emit Typst source and compile it to PDF
    Pdf {
        /// Input markup file
        input: PathBuf,

        /// Typst file, relative to the export directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// PDF file, relative to the export directory (default: <input stem>.pdf)
        #[arg(long)]
        pdf_output: Option<PathBuf>,

        /// Typst executable
        #[arg(long)]
        typst_bin: Option<PathBuf>,

        /// Directory for generated files
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Keep the Typst file after a successful compile
        #[arg(long)]
        no_clean: bool,

        /// Treat missing assets as errors
        #[arg(long)]
        strict_assets: bool,

        /// Compile in-process instead of running the Typst executable
        #[arg(long)]
        embedded: bool,

        /// Attach the system sRGB profile as PDF output intent (needs gs)
        #[arg(long)]
        inject_output_intent_srgb: bool,

        /// Attach this ICC profile as PDF output intent (needs gs)
        #[arg(long)]
        icc_profile: Option<PathBuf>,

        /// Ghostscript quality preset for the output intent rewrite
        #[arg(long, value_enum)]
        pdf_preset: Option<PresetName>,
    },

    /// Print the parsed IR as JSON
    Ir {
        /// Input markup file
        input: PathBuf,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a deck
    Validate {
        /// Input markup file
        input: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Treat missing assets as errors
        #[arg(long)]
        strict_assets: bool,
    },
}

/// Run the CLI application
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            input,
            output,
            ir,
            export_dir,
            update_html,
        } => {
            if let Some(output) = output {
                settings.build.output = output;
            }
            if let Some(dir) = export_dir {
                settings.build.export_dir = dir;
            }
            build_command(&input, &settings, ir.as_deref(), update_html.as_deref())?;
        }
        Commands::Pdf {
            input,
            output,
            pdf_output,
            typst_bin,
            export_dir,
            no_clean,
            strict_assets,
            embedded,
            inject_output_intent_srgb,
            icc_profile,
            pdf_preset,
        } => {
            if let Some(output) = output {
                settings.build.output = output;
            }
            if let Some(dir) = export_dir {
                settings.build.export_dir = dir;
            }
            if let Some(bin) = typst_bin {
                settings.compiler.typst_bin = bin;
            }
            settings.build.strict_assets |= strict_assets;
            settings.compiler.embedded |= embedded;
            settings.output_intent.srgb |= inject_output_intent_srgb;
            if icc_profile.is_some() {
                settings.output_intent.icc_profile = icc_profile;
            }
            if pdf_preset.is_some() {
                settings.output_intent.preset = pdf_preset;
            }
            pdf_command(&input, &settings, pdf_output.as_deref(), no_clean)?;
        }
        Commands::Ir { input, output } => {
            ir_command(&input, output.as_deref())?;
        }
        Commands::Validate {
            input,
            format,
            strict_assets,
        } => {
            let strict = strict_assets || settings.build.strict_assets;
            validate_command(&input, format, strict)?;
        }
    }

    Ok(())
}

/// Install the logger: `warn` by default, `debug` with `-v`, `RUST_LOG` wins
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn load_document(input: &Path) -> Result<Document> {
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    parse_file(input)
}

/// `path` itself when absolute, else `path` under the export directory
fn in_export_dir(export_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        export_dir.join(path)
    }
}

fn write_file(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(path, data).with_context(|| format!("Failed to write file: {}", path.display()))
}

/// Parse the deck and rewrite asset paths for the export directory
fn prepare(input: &Path, export_dir: &Path) -> Result<Document> {
    let doc = load_document(input)?;
    fs::create_dir_all(export_dir).with_context(|| {
        format!(
            "Failed to create export directory: {}",
            export_dir.display()
        )
    })?;
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    Ok(adjust_asset_paths(&doc, export_dir, &cwd))
}

fn make_emitter(settings: &Settings) -> Emitter {
    let mut emitter = Emitter::new().with_asset_root(&settings.build.export_dir);
    if settings.fonts.check {
        let catalog = DirectoryFontCatalog::with_clock(
            settings.compiler.font_paths.clone(),
            settings.fonts.cache_ttl(),
            Box::new(SystemClock),
        );
        emitter = emitter.with_fonts(Box::new(catalog));
    }
    emitter
}

fn make_compiler(settings: &Settings, root: &Path) -> Result<Box<dyn DocumentCompiler>> {
    if settings.compiler.embedded {
        #[cfg(feature = "embedded")]
        {
            let mut compiler = pagegrid_typst::EmbeddedCompiler::new().with_root(root);
            for path in &settings.compiler.font_paths {
                compiler = compiler.with_font_path(path);
            }
            return Ok(Box::new(compiler));
        }
        #[cfg(not(feature = "embedded"))]
        anyhow::bail!("This build has no embedded compiler; rebuild with --features embedded");
    }

    let mut compiler = TypstCli::new(&settings.compiler.typst_bin).with_root(root);
    for path in &settings.compiler.font_paths {
        compiler = compiler.with_font_path(path);
    }
    Ok(Box::new(compiler))
}

fn print_diagnostics(report: &ValidationReport) {
    for diag in &report.diagnostics {
        println!(
            "{}: {}: {}",
            diag.severity.to_string().to_uppercase(),
            diag.path.as_deref().unwrap_or("/"),
            diag.message
        );
    }
}

fn html_total_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"let total = [^;]+;").unwrap())
}

/// Write the page count into a viewer page's `let total = ...;` line
///
/// A placeholder `let total = undefined;` is preferred over any other
/// assignment. Returns `false` when the file is missing or holds no
/// such line.
pub fn update_html_total(path: &Path, total: usize) -> Result<bool> {
    if !path.is_file() {
        return Ok(false);
    }
    let html = fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let line = format!("let total = {};", total);

    let placeholder = "let total = undefined;";
    let updated = if html.contains(placeholder) {
        html.replacen(placeholder, &line, 1)
    } else {
        match html_total_regex().find(&html) {
            Some(m) => format!("{}{}{}", &html[..m.start()], line, &html[m.end()..]),
            None => return Ok(false),
        }
    };
    write_file(path, &updated)?;
    Ok(true)
}

/// Attach the configured output intent to a compiled PDF
///
/// Problems are logged and never fail the build.
fn apply_output_intent(pdf_path: &Path, intent: &OutputIntentSettings) {
    let icc = match intent.icc_profile.clone().or_else(find_srgb_icc) {
        Some(icc) => icc,
        None => {
            log::warn!("Output intent skipped: no sRGB ICC profile found");
            return;
        }
    };
    let tool = GhostscriptOutputIntent::new(icc).with_preset(intent.preset.map(PdfPreset::from));
    match inject_output_intent(pdf_path, &tool) {
        Ok(IntentOutcome::Injected) => {
            println!("  Output intent: {}", tool.icc_profile.display())
        }
        Ok(IntentOutcome::AlreadyPresent) => {
            log::info!("{} already has an output intent", pdf_path.display())
        }
        Err(e) => log::warn!(
            "Output intent not injected into {}: {}",
            pdf_path.display(),
            e
        ),
    }
}

/// Execute the build command
pub fn build_command(
    input: &Path,
    settings: &Settings,
    ir: Option<&Path>,
    update_html: Option<&Path>,
) -> Result<()> {
    let export_dir = &settings.build.export_dir;
    let doc = prepare(input, export_dir)?;

    if let Some(ir) = ir {
        let ir_path = in_export_dir(export_dir, ir);
        let json = serde_json::to_string_pretty(&doc).context("Failed to serialize IR")?;
        write_file(&ir_path, &json)?;
        println!("  Wrote IR: {}", ir_path.display());
    }

    let emitted = make_emitter(settings).emit(&doc);
    for warning in &emitted.warnings {
        log::warn!("{}", warning);
    }

    let out_path = in_export_dir(export_dir, &settings.build.output);
    write_file(&out_path, &emitted.source)?;
    println!(
        "Built Typst: {} pages={}",
        out_path.display(),
        doc.pages.len()
    );

    if let Some(html) = update_html {
        if update_html_total(html, doc.pages.len())? {
            println!("  Updated total in {}", html.display());
        } else {
            log::warn!("No page total to update in {}", html.display());
        }
    }

    Ok(())
}

/// Execute the pdf command
///
/// Validation errors stop the build before anything is compiled. A failed
/// compile runs the asset fallback pipeline before giving up.
pub fn pdf_command(
    input: &Path,
    settings: &Settings,
    pdf_output: Option<&Path>,
    no_clean: bool,
) -> Result<()> {
    let export_dir = &settings.build.export_dir;
    let doc = prepare(input, export_dir)?;

    let report = ValidationEngine::with_options(ValidationOptions {
        strict_assets: settings.build.strict_assets,
        base_dir: Some(export_dir.clone()),
    })
    .report(&doc);
    for warning in report.warnings() {
        log::warn!("{}", warning.message);
    }
    if !report.ok() {
        for error in report.errors() {
            eprintln!(
                "ERROR: {}: {}",
                error.path.as_deref().unwrap_or("/"),
                error.message
            );
        }
        anyhow::bail!(
            "Validation failed with {} errors: {}",
            report.errors().count(),
            input.display()
        );
    }

    let typ_path = in_export_dir(export_dir, &settings.build.output);
    let pdf_name = match pdf_output {
        Some(p) => p.to_path_buf(),
        None => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "deck".to_string());
            PathBuf::from(format!("{}.pdf", stem))
        }
    };
    let pdf_path = in_export_dir(export_dir, &pdf_name);

    let root = std::env::current_dir().context("Failed to read the working directory")?;
    let compiler = make_compiler(settings, &root)?;
    if !compiler.is_available() {
        anyhow::bail!(
            "typst binary not found at '{}'",
            settings.compiler.typst_bin.display()
        );
    }

    let pipeline = FallbackPipeline::with_system_tools(FallbackOptions {
        export_dir: export_dir.clone(),
        dpi: settings.fallback.dpi,
        sanitize: settings.fallback.sanitize,
        vector: settings.fallback.vector,
        raster: settings.fallback.raster,
    });
    let mut emitter = make_emitter(settings);
    let outcome = pipeline
        .run(&doc, &mut emitter, compiler.as_ref(), &typ_path, &pdf_path)
        .context("Asset pipeline failed")?;

    for warning in &outcome.emitted.warnings {
        log::warn!("{}", warning);
    }
    for stage in &outcome.stages_run {
        println!("  Fallback stage: {}", stage.as_str());
    }
    for asset in &outcome.assets {
        if asset.state == AssetState::Embedded && asset.current != asset.original {
            println!("  Replaced: {} -> {}", asset.original, asset.current);
        }
    }
    for asset in outcome.failed() {
        eprintln!(
            "ERROR: could not embed {} (page {}) for element '{}'",
            asset.original, asset.page, asset.element_id
        );
    }

    if outcome.compiled && settings.output_intent.enabled() {
        apply_output_intent(&pdf_path, &settings.output_intent);
    }

    if outcome.compiled && !no_clean {
        if let Err(e) = fs::remove_file(&typ_path) {
            log::debug!("Could not remove {}: {}", typ_path.display(), e);
        }
    }

    println!(
        "PDF build success={} pdf={} pages={}",
        outcome.compiled,
        pdf_path.display(),
        doc.pages.len()
    );

    if !outcome.compiled {
        if let Some(error) = outcome.last_error {
            eprintln!("ERROR: Typst compile failed:\n{}", error);
        }
        std::process::exit(1);
    }

    Ok(())
}

/// Execute the ir command
pub fn ir_command(input: &Path, output: Option<&Path>) -> Result<()> {
    let doc = load_document(input)?;
    let json = serde_json::to_string_pretty(&doc).context("Failed to serialize IR")?;
    match output {
        Some(path) => {
            write_file(path, &json)?;
            println!("Wrote IR: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

/// Execute the validate command
///
/// Exits with status 1 when the report holds errors.
pub fn validate_command(input: &Path, format: OutputFormat, strict_assets: bool) -> Result<()> {
    let report = validate_file(input, strict_assets)?;

    match format {
        OutputFormat::Text => {
            print_diagnostics(&report);
            if report.ok() {
                println!("IR valid: no errors");
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize diagnostics to JSON")?;
            println!("{}", json);
        }
    }

    if !report.ok() {
        std::process::exit(1);
    }

    Ok(())
}

/// Parse a deck and validate its serialized IR
///
/// Relative asset paths are checked against the working directory.
pub fn validate_file(input: &Path, strict_assets: bool) -> Result<ValidationReport> {
    let doc = load_document(input)?;
    let ir = serde_json::to_value(&doc).context("Failed to serialize IR")?;
    Ok(validate_ir(
        &ir,
        ValidationOptions {
            strict_assets,
            base_dir: None,
        },
    ))
}

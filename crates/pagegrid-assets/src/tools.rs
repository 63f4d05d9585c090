//! External PDF tools
//!
//! Repair tools rewrite a PDF into a cleaner PDF; page converters render
//! one page to SVG or PNG. The system implementations shell out to qpdf,
//! MuPDF, Poppler, and Ghostscript.

use std::fmt;
use std::path::Path;
use std::process::Command;

use crate::error::{ToolError, ToolResult};

/// Default raster resolution
pub const DEFAULT_DPI: u32 = 150;

/// Output format of a page converter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// A tool that rewrites a PDF file
pub trait PdfRepairTool: Send + Sync {
    fn name(&self) -> &str;

    /// Whether the tool can run on this system
    fn is_available(&self) -> bool;

    /// Write a repaired copy of `input` to `output`
    fn repair(&self, input: &Path, output: &Path) -> ToolResult<()>;
}

/// A tool that renders one PDF page to an image
pub trait PageConverter: Send + Sync {
    fn name(&self) -> &str;

    fn format(&self) -> ImageFormat;

    /// Whether the tool can run on this system
    fn is_available(&self) -> bool;

    /// Render `page` (1-based) of `input` to `output`
    fn convert(&self, input: &Path, page: u32, output: &Path) -> ToolResult<()>;
}

/// Whether a binary can be started at all
pub(crate) fn can_spawn(bin: &str, version_arg: &str) -> bool {
    Command::new(bin).arg(version_arg).output().is_ok()
}

/// Run a tool and map a non-zero exit to [`ToolError::Failed`]
pub(crate) fn run(bin: &str, args: &[String]) -> ToolResult<()> {
    log::debug!("Running {} {}", bin, args.join(" "));
    let output = Command::new(bin)
        .args(args)
        .output()
        .map_err(|e| ToolError::Unavailable(format!("{}: {}", bin, e)))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(ToolError::Failed {
            tool: bin.to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

pub(crate) fn path_arg(path: &Path) -> String {
    path.display().to_string()
}

/// Fail unless the tool left a non-empty file behind
pub(crate) fn expect_output(tool: &str, output: &Path) -> ToolResult<()> {
    match std::fs::metadata(output) {
        Ok(meta) if meta.len() > 0 => Ok(()),
        _ => Err(ToolError::Failed {
            tool: tool.to_string(),
            message: format!("no output written to {}", output.display()),
        }),
    }
}

/// System PDF repair tools, in the order they are chained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepairCommand {
    /// `qpdf`: decompress every stream, then recompress
    Qpdf,
    /// `mutool clean`: rebuild the object structure
    MutoolClean,
    /// Ghostscript `pdfwrite`: re-distill the whole file
    GhostscriptPdfWrite,
}

impl RepairCommand {
    pub fn all() -> [RepairCommand; 3] {
        [
            RepairCommand::Qpdf,
            RepairCommand::MutoolClean,
            RepairCommand::GhostscriptPdfWrite,
        ]
    }

    fn bin(self) -> &'static str {
        match self {
            RepairCommand::Qpdf => "qpdf",
            RepairCommand::MutoolClean => "mutool",
            RepairCommand::GhostscriptPdfWrite => "gs",
        }
    }
}

impl PdfRepairTool for RepairCommand {
    fn name(&self) -> &str {
        match self {
            RepairCommand::Qpdf => "qpdf",
            RepairCommand::MutoolClean => "mutool clean",
            RepairCommand::GhostscriptPdfWrite => "gs pdfwrite",
        }
    }

    fn is_available(&self) -> bool {
        match self {
            RepairCommand::MutoolClean => can_spawn("mutool", "-v"),
            other => can_spawn(other.bin(), "--version"),
        }
    }

    fn repair(&self, input: &Path, output: &Path) -> ToolResult<()> {
        match self {
            RepairCommand::Qpdf => {
                let expanded = output.with_extension("expanded.pdf");
                run(
                    "qpdf",
                    &[
                        "--stream-data=uncompress".to_string(),
                        path_arg(input),
                        path_arg(&expanded),
                    ],
                )?;
                let result = run(
                    "qpdf",
                    &[
                        "--stream-data=compress".to_string(),
                        "--object-streams=generate".to_string(),
                        path_arg(&expanded),
                        path_arg(output),
                    ],
                );
                let _ = std::fs::remove_file(&expanded);
                result?;
            }
            RepairCommand::MutoolClean => run(
                "mutool",
                &[
                    "clean".to_string(),
                    "-gggg".to_string(),
                    "-z".to_string(),
                    path_arg(input),
                    path_arg(output),
                ],
            )?,
            RepairCommand::GhostscriptPdfWrite => run(
                "gs",
                &[
                    "-q".to_string(),
                    "-dNOPAUSE".to_string(),
                    "-dBATCH".to_string(),
                    "-dSAFER".to_string(),
                    "-sDEVICE=pdfwrite".to_string(),
                    format!("-sOutputFile={}", output.display()),
                    path_arg(input),
                ],
            )?,
        }
        expect_output(self.name(), output)
    }
}

/// System page converters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertCommand {
    /// `mutool draw -F svg`
    MutoolSvg,
    /// `pdftocairo -svg`
    PdftocairoSvg,
    /// `mutool draw -r DPI` to PNG
    MutoolPng { dpi: u32 },
    /// Ghostscript `png16m`
    GhostscriptPng { dpi: u32 },
}

impl ConvertCommand {
    /// Vector converters in preference order
    pub fn vector() -> [ConvertCommand; 2] {
        [ConvertCommand::MutoolSvg, ConvertCommand::PdftocairoSvg]
    }

    /// Raster converters in preference order
    pub fn raster(dpi: u32) -> [ConvertCommand; 2] {
        [
            ConvertCommand::MutoolPng { dpi },
            ConvertCommand::GhostscriptPng { dpi },
        ]
    }

    /// Command line for one conversion
    pub fn args(self, input: &Path, page: u32, output: &Path) -> (&'static str, Vec<String>) {
        match self {
            ConvertCommand::MutoolSvg => (
                "mutool",
                vec![
                    "draw".to_string(),
                    "-F".to_string(),
                    "svg".to_string(),
                    "-o".to_string(),
                    path_arg(output),
                    path_arg(input),
                    page.to_string(),
                ],
            ),
            ConvertCommand::PdftocairoSvg => (
                "pdftocairo",
                vec![
                    "-svg".to_string(),
                    "-f".to_string(),
                    page.to_string(),
                    "-l".to_string(),
                    page.to_string(),
                    path_arg(input),
                    path_arg(output),
                ],
            ),
            ConvertCommand::MutoolPng { dpi } => (
                "mutool",
                vec![
                    "draw".to_string(),
                    "-r".to_string(),
                    dpi.to_string(),
                    "-o".to_string(),
                    path_arg(output),
                    path_arg(input),
                    page.to_string(),
                ],
            ),
            ConvertCommand::GhostscriptPng { dpi } => (
                "gs",
                vec![
                    "-q".to_string(),
                    "-dNOPAUSE".to_string(),
                    "-dBATCH".to_string(),
                    "-dSAFER".to_string(),
                    "-sDEVICE=png16m".to_string(),
                    format!("-r{}", dpi),
                    format!("-dFirstPage={}", page),
                    format!("-dLastPage={}", page),
                    format!("-sOutputFile={}", output.display()),
                    path_arg(input),
                ],
            ),
        }
    }
}

impl PageConverter for ConvertCommand {
    fn name(&self) -> &str {
        match self {
            ConvertCommand::MutoolSvg => "mutool svg",
            ConvertCommand::PdftocairoSvg => "pdftocairo",
            ConvertCommand::MutoolPng { .. } => "mutool png",
            ConvertCommand::GhostscriptPng { .. } => "gs png16m",
        }
    }

    fn format(&self) -> ImageFormat {
        match self {
            ConvertCommand::MutoolSvg | ConvertCommand::PdftocairoSvg => ImageFormat::Svg,
            ConvertCommand::MutoolPng { .. } | ConvertCommand::GhostscriptPng { .. } => {
                ImageFormat::Png
            }
        }
    }

    fn is_available(&self) -> bool {
        match self {
            ConvertCommand::MutoolSvg | ConvertCommand::MutoolPng { .. } => can_spawn("mutool", "-v"),
            ConvertCommand::PdftocairoSvg => can_spawn("pdftocairo", "-v"),
            ConvertCommand::GhostscriptPng { .. } => can_spawn("gs", "--version"),
        }
    }

    fn convert(&self, input: &Path, page: u32, output: &Path) -> ToolResult<()> {
        let (bin, args) = self.args(input, page, output);
        run(bin, &args)?;
        expect_output(self.name(), output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_format() {
        assert_eq!(ImageFormat::Svg.extension(), "svg");
        assert_eq!(ImageFormat::Png.to_string(), "png");
    }

    #[test]
    fn test_converter_formats() {
        assert!(ConvertCommand::vector().iter().all(|c| c.format() == ImageFormat::Svg));
        assert!(ConvertCommand::raster(72).iter().all(|c| c.format() == ImageFormat::Png));
    }

    #[test]
    fn test_raster_args_carry_dpi_and_page() {
        let (bin, args) = ConvertCommand::GhostscriptPng { dpi: 200 }.args(
            Path::new("in.pdf"),
            3,
            Path::new("out.png"),
        );
        assert_eq!(bin, "gs");
        assert!(args.contains(&"-r200".to_string()));
        assert!(args.contains(&"-dFirstPage=3".to_string()));
        assert!(args.contains(&"-dLastPage=3".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("in.pdf"));

        let (bin, args) = ConvertCommand::MutoolPng { dpi: 96 }.args(
            Path::new("in.pdf"),
            2,
            Path::new("out.png"),
        );
        assert_eq!(bin, "mutool");
        assert_eq!(args, vec!["draw", "-r", "96", "-o", "out.png", "in.pdf", "2"]);
    }

    #[test]
    fn test_svg_args() {
        let (bin, args) =
            ConvertCommand::PdftocairoSvg.args(Path::new("a.pdf"), 1, Path::new("a.svg"));
        assert_eq!(bin, "pdftocairo");
        assert_eq!(args, vec!["-svg", "-f", "1", "-l", "1", "a.pdf", "a.svg"]);
    }

    #[test]
    fn test_missing_output_is_failure() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = expect_output("tool", &dir.path().join("none.pdf")).unwrap_err();
        assert!(matches!(err, ToolError::Failed { .. }));
    }
}

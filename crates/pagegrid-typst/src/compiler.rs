//! Typst to PDF compilers
//!
//! [`TypstCli`] runs the `typst` binary. With the `embedded` feature,
//! [`EmbeddedCompiler`] compiles in-process through typst-as-lib.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::{Result, TypstError};

/// Compiles a Typst source file to a PDF file
pub trait DocumentCompiler {
    /// Compiler name for logs
    fn name(&self) -> &str;

    /// Whether the compiler can run on this system
    fn is_available(&self) -> bool;

    /// Compile `input` (a `.typ` file) to `output`
    fn compile(&self, input: &Path, output: &Path) -> Result<()>;
}

/// The `typst` command-line compiler
#[derive(Debug, Clone)]
pub struct TypstCli {
    bin: PathBuf,
    root: Option<PathBuf>,
    font_paths: Vec<PathBuf>,
}

impl Default for TypstCli {
    fn default() -> Self {
        Self::new("typst")
    }
}

impl TypstCli {
    pub fn new(bin: impl Into<PathBuf>) -> Self {
        Self {
            bin: bin.into(),
            root: None,
            font_paths: Vec::new(),
        }
    }

    /// Project root passed as `--root` (defaults to the input's directory)
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Add a `--font-path`
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_paths.push(path.into());
        self
    }

    pub fn bin(&self) -> &Path {
        &self.bin
    }

    /// Arguments for one compilation
    pub fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        let root = self
            .root
            .clone()
            .or_else(|| input.parent().map(Path::to_path_buf))
            .filter(|r| !r.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));

        let mut args = vec![
            "compile".to_string(),
            "--root".to_string(),
            root.display().to_string(),
        ];
        for font_path in self.font_paths.iter().filter(|p| p.is_dir()) {
            args.push("--font-path".to_string());
            args.push(font_path.display().to_string());
        }
        args.push(input.display().to_string());
        args.push(output.display().to_string());
        args
    }
}

impl DocumentCompiler for TypstCli {
    fn name(&self) -> &str {
        "typst"
    }

    fn is_available(&self) -> bool {
        Command::new(&self.bin)
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    fn compile(&self, input: &Path, output: &Path) -> Result<()> {
        let args = self.args(input, output);
        log::debug!("Running {} {}", self.bin.display(), args.join(" "));

        let result = Command::new(&self.bin).args(&args).output().map_err(|e| {
            TypstError::ToolMissing(format!("{}: {}", self.bin.display(), e))
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(TypstError::Compilation(stderr.trim().to_string()));
        }
        if !output.exists() {
            return Err(TypstError::Compilation(format!(
                "{} reported success but wrote no output",
                self.bin.display()
            )));
        }
        Ok(())
    }
}

/// In-process compiler backed by typst-as-lib
///
/// Files are resolved relative to the root; `@preview` packages are not
/// downloaded, so decks embedding PDFs need [`TypstCli`].
#[cfg(feature = "embedded")]
#[derive(Debug, Clone, Default)]
pub struct EmbeddedCompiler {
    root: Option<PathBuf>,
    font_paths: Vec<PathBuf>,
}

#[cfg(feature = "embedded")]
impl EmbeddedCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    /// Add a font file, or a directory scanned for font files
    pub fn with_font_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_paths.push(path.into());
        self
    }

    fn font_files(&self) -> Vec<PathBuf> {
        let is_font = |p: &Path| {
            p.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_lowercase().as_str(), "ttf" | "otf" | "ttc" | "otc"))
        };
        let mut files = Vec::new();
        for path in &self.font_paths {
            if path.is_file() {
                files.push(path.clone());
            } else if let Ok(entries) = std::fs::read_dir(path) {
                files.extend(entries.flatten().map(|e| e.path()).filter(|p| is_font(p)));
            }
        }
        files.sort();
        files
    }

    /// Compile Typst source to PDF bytes
    pub fn compile_source(&self, source: &str) -> Result<Vec<u8>> {
        use typst_as_lib::TypstEngine;

        let mut fonts = Vec::new();
        for font_path in self.font_files() {
            let bytes = std::fs::read(&font_path).map_err(|e| {
                TypstError::Font(format!("Failed to read font {}: {}", font_path.display(), e))
            })?;
            fonts.push(bytes);
        }

        let root = self.root.clone().unwrap_or_else(|| PathBuf::from("."));
        let engine = TypstEngine::builder()
            .main_file(source.to_string())
            .fonts(fonts)
            .with_file_system_resolver(root)
            .build();

        let document = engine
            .compile()
            .output
            .map_err(|e| TypstError::Compilation(format!("{:?}", e)))?;

        let options = typst_pdf::PdfOptions::default();
        let pdf_bytes = typst_pdf::pdf(&document, &options)
            .map_err(|e| TypstError::Compilation(format!("PDF generation failed: {:?}", e)))?;

        Ok(pdf_bytes.into())
    }
}

#[cfg(feature = "embedded")]
impl DocumentCompiler for EmbeddedCompiler {
    fn name(&self) -> &str {
        "typst-as-lib"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn compile(&self, input: &Path, output: &Path) -> Result<()> {
        let source = std::fs::read_to_string(input)?;
        let compiler = match (&self.root, input.parent()) {
            (None, Some(parent)) => self.clone().with_root(parent),
            _ => self.clone(),
        };
        let pdf = compiler.compile_source(&source)?;
        std::fs::write(output, pdf)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_args() {
        let dir = TempDir::new().unwrap();
        let fonts = dir.path().join("fonts");
        std::fs::create_dir(&fonts).unwrap();

        let cli = TypstCli::new("typst")
            .with_root("/work/export")
            .with_font_path(&fonts)
            .with_font_path(dir.path().join("missing"));
        let args = cli.args(Path::new("/work/export/deck.typ"), Path::new("/work/out.pdf"));
        assert_eq!(
            args,
            vec![
                "compile".to_string(),
                "--root".to_string(),
                "/work/export".to_string(),
                "--font-path".to_string(),
                fonts.display().to_string(),
                "/work/export/deck.typ".to_string(),
                "/work/out.pdf".to_string(),
            ]
        );
    }

    #[test]
    fn test_root_defaults_to_input_dir() {
        let args = TypstCli::default().args(Path::new("export/deck.typ"), Path::new("deck.pdf"));
        assert_eq!(args[2], "export");

        let args = TypstCli::default().args(Path::new("deck.typ"), Path::new("deck.pdf"));
        assert_eq!(args[2], ".");
    }

    #[test]
    fn test_missing_binary() {
        let cli = TypstCli::new("/nonexistent/typst-binary");
        assert!(!cli.is_available());

        let dir = TempDir::new().unwrap();
        let input = dir.path().join("a.typ");
        std::fs::write(&input, "Hello").unwrap();
        let err = cli.compile(&input, &dir.path().join("a.pdf")).unwrap_err();
        assert!(matches!(err, TypstError::ToolMissing(_)));
    }
}

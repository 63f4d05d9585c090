//! sRGB output intent for finished PDFs
//!
//! Print shops and PDF/X checkers expect an `/OutputIntents` entry. Typst
//! does not write one, so the compiled file is re-distilled through
//! Ghostscript with an ICC profile attached and then swapped in place.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{ToolError, ToolResult};
use crate::tools::{can_spawn, expect_output, path_arg, run, PdfRepairTool};

/// Bytes read from the start of a PDF when looking for an existing intent
pub const INTENT_SCAN_BYTES: u64 = 200_000;

/// Well-known locations of an sRGB ICC profile
pub const SRGB_ICC_CANDIDATES: &[&str] = &[
    "/usr/share/color/icc/srgb.icc",
    "/usr/share/color/icc/sRGB.icc",
    "/usr/share/color/icc/colord/sRGB.icc",
    "/usr/share/color/icc/ghostscript/srgb.icc",
    "/usr/share/ghostscript/iccprofiles/srgb.icc",
    "/usr/local/share/color/icc/sRGB.icc",
    "/Library/ColorSync/Profiles/sRGB Profile.icc",
    "/System/Library/ColorSync/Profiles/sRGB Profile.icc",
];

/// Ghostscript `-dPDFSETTINGS` preset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfPreset {
    Screen,
    Printer,
    Prepress,
}

impl PdfPreset {
    pub fn as_str(self) -> &'static str {
        match self {
            PdfPreset::Screen => "screen",
            PdfPreset::Printer => "printer",
            PdfPreset::Prepress => "prepress",
        }
    }
}

impl fmt::Display for PdfPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What [`inject_output_intent`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    /// The PDF was rewritten with an output intent
    Injected,
    /// The PDF already carried one and was left alone
    AlreadyPresent,
}

/// First existing file among `candidates`
pub fn first_existing<I, P>(candidates: I) -> Option<PathBuf>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    candidates
        .into_iter()
        .map(|p| p.as_ref().to_path_buf())
        .find(|p| p.is_file())
}

/// Locate a system sRGB ICC profile
pub fn find_srgb_icc() -> Option<PathBuf> {
    first_existing(SRGB_ICC_CANDIDATES)
}

/// Whether the head of `pdf` already declares `/OutputIntents`
pub fn has_output_intent(pdf: &Path) -> ToolResult<bool> {
    let mut head = Vec::new();
    File::open(pdf)?
        .take(INTENT_SCAN_BYTES)
        .read_to_end(&mut head)?;
    let needle = b"/OutputIntents";
    Ok(head.windows(needle.len()).any(|w| w == needle))
}

/// Ghostscript `pdfwrite` run that attaches an ICC output profile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GhostscriptOutputIntent {
    pub icc_profile: PathBuf,
    pub preset: Option<PdfPreset>,
}

impl GhostscriptOutputIntent {
    pub fn new(icc_profile: impl Into<PathBuf>) -> Self {
        Self {
            icc_profile: icc_profile.into(),
            preset: None,
        }
    }

    pub fn with_preset(mut self, preset: Option<PdfPreset>) -> Self {
        self.preset = preset;
        self
    }

    /// Ghostscript arguments for one rewrite
    pub fn args(&self, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "-q".to_string(),
            "-sDEVICE=pdfwrite".to_string(),
            "-dCompatibilityLevel=1.7".to_string(),
            "-dNOPAUSE".to_string(),
            "-dBATCH".to_string(),
        ];
        if let Some(preset) = self.preset {
            args.push(format!("-dPDFSETTINGS=/{}", preset));
        }
        args.push("-dColorConversionStrategy=/LeaveColorUnchanged".to_string());
        args.push(format!("-sOutputICCProfile={}", self.icc_profile.display()));
        args.push(format!("-sOutputFile={}", output.display()));
        args.push(path_arg(input));
        args
    }
}

impl PdfRepairTool for GhostscriptOutputIntent {
    fn name(&self) -> &str {
        "gs output intent"
    }

    fn is_available(&self) -> bool {
        can_spawn("gs", "--version")
    }

    fn repair(&self, input: &Path, output: &Path) -> ToolResult<()> {
        if !self.icc_profile.is_file() {
            return Err(ToolError::Unavailable(format!(
                "ICC profile not found: {}",
                self.icc_profile.display()
            )));
        }
        run("gs", &self.args(input, output))?;
        expect_output(self.name(), output)
    }
}

/// Rewrite `pdf` in place through `tool` unless it already has an intent
///
/// The rewrite goes to a temporary file next to `pdf` that replaces it
/// only after the tool produced a non-empty result, so a failed run
/// leaves the original untouched.
pub fn inject_output_intent(pdf: &Path, tool: &dyn PdfRepairTool) -> ToolResult<IntentOutcome> {
    if has_output_intent(pdf)? {
        log::debug!("{} already has an output intent", pdf.display());
        return Ok(IntentOutcome::AlreadyPresent);
    }
    if !tool.is_available() {
        return Err(ToolError::Unavailable(tool.name().to_string()));
    }

    let dir = match pdf.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let scratch = tempfile::Builder::new()
        .prefix(".intent-")
        .suffix(".pdf")
        .tempfile_in(dir)?;
    tool.repair(pdf, scratch.path())?;
    expect_output(tool.name(), scratch.path())?;
    scratch.persist(pdf).map_err(|e| ToolError::Io(e.error))?;
    log::info!("Injected output intent into {}", pdf.display());
    Ok(IntentOutcome::Injected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Writes the input back with an intent marker, or nothing at all
    struct Tagger {
        available: bool,
        write: bool,
        calls: AtomicUsize,
    }

    impl Tagger {
        fn new(available: bool, write: bool) -> Self {
            Self {
                available,
                write,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl PdfRepairTool for Tagger {
        fn name(&self) -> &str {
            "tagger"
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn repair(&self, input: &Path, output: &Path) -> ToolResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.write {
                let mut data = fs::read(input)?;
                data.extend_from_slice(b"\n/OutputIntents [1 0 R]");
                fs::write(output, data)?;
            }
            Ok(())
        }
    }

    fn pdf(dir: &TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("deck.pdf");
        fs::write(&path, body).unwrap();
        path
    }

    fn leftovers(dir: &TempDir) -> usize {
        fs::read_dir(dir.path())
            .unwrap()
            .filter(|e| {
                e.as_ref()
                    .map(|e| e.file_name().to_string_lossy().starts_with(".intent-"))
                    .unwrap_or(false)
            })
            .count()
    }

    #[test]
    fn test_detects_existing_intent() {
        let dir = TempDir::new().unwrap();
        let with = pdf(&dir, "%PDF-1.7\n<< /OutputIntents [] >>");
        assert!(has_output_intent(&with).unwrap());

        let without = dir.path().join("plain.pdf");
        fs::write(&without, "%PDF-1.7\n<< /Type /Catalog >>").unwrap();
        assert!(!has_output_intent(&without).unwrap());
    }

    #[test]
    fn test_intent_past_scan_window_is_not_seen() {
        let dir = TempDir::new().unwrap();
        let mut body = "%PDF-1.7\n".to_string();
        body.push_str(&" ".repeat(INTENT_SCAN_BYTES as usize));
        body.push_str("/OutputIntents");
        let path = pdf(&dir, &body);
        assert!(!has_output_intent(&path).unwrap());
    }

    #[test]
    fn test_inject_replaces_in_place() {
        let dir = TempDir::new().unwrap();
        let path = pdf(&dir, "%PDF-1.7");
        let tool = Tagger::new(true, true);

        let outcome = inject_output_intent(&path, &tool).unwrap();
        assert_eq!(outcome, IntentOutcome::Injected);
        let data = fs::read_to_string(&path).unwrap();
        assert!(data.starts_with("%PDF-1.7"));
        assert!(data.contains("/OutputIntents"));
        assert_eq!(leftovers(&dir), 0);

        // Second run is a no-op
        let outcome = inject_output_intent(&path, &tool).unwrap();
        assert_eq!(outcome, IntentOutcome::AlreadyPresent);
        assert_eq!(tool.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_output_keeps_original() {
        let dir = TempDir::new().unwrap();
        let path = pdf(&dir, "%PDF-1.7");
        let err = inject_output_intent(&path, &Tagger::new(true, false)).unwrap_err();
        assert!(matches!(err, ToolError::Failed { .. }));
        assert_eq!(fs::read_to_string(&path).unwrap(), "%PDF-1.7");
        assert_eq!(leftovers(&dir), 0);
    }

    #[test]
    fn test_unavailable_tool() {
        let dir = TempDir::new().unwrap();
        let path = pdf(&dir, "%PDF-1.7");
        let tool = Tagger::new(false, true);
        let err = inject_output_intent(&path, &tool).unwrap_err();
        assert!(matches!(err, ToolError::Unavailable(_)));
        assert_eq!(tool.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_missing_pdf_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = inject_output_intent(&dir.path().join("none.pdf"), &Tagger::new(true, true))
            .unwrap_err();
        assert!(matches!(err, ToolError::Io(_)));
    }

    #[test]
    fn test_missing_icc_profile() {
        let dir = TempDir::new().unwrap();
        let path = pdf(&dir, "%PDF-1.7");
        let gs = GhostscriptOutputIntent::new(dir.path().join("missing.icc"));
        let err = gs.repair(&path, &dir.path().join("out.pdf")).unwrap_err();
        assert!(err.to_string().contains("ICC profile not found"));
    }

    #[test]
    fn test_ghostscript_args() {
        let gs = GhostscriptOutputIntent::new("/icc/srgb.icc");
        let args = gs.args(Path::new("in.pdf"), Path::new("out.pdf"));
        assert!(args.contains(&"-sDEVICE=pdfwrite".to_string()));
        assert!(args.contains(&"-dCompatibilityLevel=1.7".to_string()));
        assert!(args.contains(&"-sOutputICCProfile=/icc/srgb.icc".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("-dPDFSETTINGS")));
        assert_eq!(args[args.len() - 2], "-sOutputFile=out.pdf");
        assert_eq!(args.last().map(String::as_str), Some("in.pdf"));

        let args = gs
            .with_preset(Some(PdfPreset::Prepress))
            .args(Path::new("in.pdf"), Path::new("out.pdf"));
        assert!(args.contains(&"-dPDFSETTINGS=/prepress".to_string()));
    }

    #[test]
    fn test_first_existing_candidate() {
        let dir = TempDir::new().unwrap();
        let icc = dir.path().join("sRGB.icc");
        fs::write(&icc, b"icc").unwrap();
        let found = first_existing([dir.path().join("nope.icc"), dir.path().to_path_buf(), icc.clone()]);
        assert_eq!(found, Some(icc));
        assert_eq!(first_existing(Vec::<PathBuf>::new()), None);
    }
}

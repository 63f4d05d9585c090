//! Page-to-image fallbacks

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::error::{ToolError, ToolResult};
use crate::tools::PageConverter;

/// Output directory for fallback images, relative to the export directory
pub const FALLBACK_DIR: &str = "assets/pdf-fallbacks";

/// Deterministic fallback file name: `<stem>-p<page>.<ext>`
pub fn fallback_name(source: &Path, page: u32, extension: &str) -> String {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string());
    format!("{}-p{}.{}", stem, page, extension)
}

/// Render one page with the first converter that succeeds
///
/// Converters render `source` into a scratch directory; only a complete
/// file is moved to `<out_dir>/<stem>-p<page>.<ext>`, where the stem is
/// taken from `name_from` so a repaired copy keeps the original name.
pub fn convert_page(
    source: &Path,
    name_from: &Path,
    page: u32,
    converters: &[Box<dyn PageConverter>],
    out_dir: &Path,
) -> ToolResult<PathBuf> {
    let mut last_error = None;

    for converter in converters {
        if !converter.is_available() {
            log::debug!("Converter {} is not available, skipping", converter.name());
            continue;
        }

        let name = fallback_name(name_from, page, converter.format().extension());
        let scratch = TempDir::new()?;
        let scratch_file = scratch.path().join(&name);

        match converter.convert(source, page, &scratch_file) {
            Ok(()) => {
                fs::create_dir_all(out_dir)?;
                let target = out_dir.join(&name);
                fs::copy(&scratch_file, &target)?;
                log::debug!(
                    "Converted page {} of {} with {}",
                    page,
                    source.display(),
                    converter.name()
                );
                return Ok(target);
            }
            Err(e) => {
                log::warn!("Converter {} failed: {}", converter.name(), e);
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        ToolError::Unavailable("no page converter available".to_string())
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ImageFormat;

    struct Fake {
        format: ImageFormat,
        available: bool,
        fail: bool,
    }

    impl PageConverter for Fake {
        fn name(&self) -> &str {
            "fake"
        }

        fn format(&self) -> ImageFormat {
            self.format
        }

        fn is_available(&self) -> bool {
            self.available
        }

        fn convert(&self, _input: &Path, page: u32, output: &Path) -> ToolResult<()> {
            if self.fail {
                return Err(ToolError::Failed {
                    tool: "fake".to_string(),
                    message: "cannot render".to_string(),
                });
            }
            fs::write(output, format!("page {}", page))?;
            Ok(())
        }
    }

    #[test]
    fn test_fallback_name() {
        assert_eq!(fallback_name(Path::new("a/b/chart.v2.pdf"), 3, "svg"), "chart.v2-p3.svg");
    }

    #[test]
    fn test_first_success_wins() {
        let dir = TempDir::new().unwrap();
        let converters: Vec<Box<dyn PageConverter>> = vec![
            Box::new(Fake { format: ImageFormat::Svg, available: false, fail: false }),
            Box::new(Fake { format: ImageFormat::Svg, available: true, fail: true }),
            Box::new(Fake { format: ImageFormat::Png, available: true, fail: false }),
        ];
        let out = convert_page(
            Path::new("assets/pdf-sanitized/deck-0badf00d.pdf"),
            Path::new("deck.pdf"),
            2,
            &converters,
            dir.path(),
        )
        .unwrap();
        assert_eq!(out, dir.path().join("deck-p2.png"));
        assert_eq!(fs::read_to_string(out).unwrap(), "page 2");
        assert!(!dir.path().join("deck-p2.svg").exists());
    }

    #[test]
    fn test_no_converter() {
        let dir = TempDir::new().unwrap();
        let err = convert_page(Path::new("deck.pdf"), Path::new("deck.pdf"), 1, &[], dir.path()).unwrap_err();
        assert!(matches!(err, ToolError::Unavailable(_)));
    }
}

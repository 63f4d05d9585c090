//! PDF sanitizing: a chain of repair tools
//!
//! Each available tool consumes the output of the last successful one.
//! Intermediate files live in a scratch directory that is removed when the
//! run ends, whatever the outcome.

use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

use crate::error::ToolResult;
use crate::tools::PdfRepairTool;

/// Output directory for sanitized PDFs, relative to the export directory
pub const SANITIZED_DIR: &str = "assets/pdf-sanitized";

/// First 8 hex digits of the SHA-256 of a file's content
pub fn content_hash8(path: &Path) -> ToolResult<String> {
    let data = fs::read(path)?;
    let digest = Sha256::digest(&data);
    Ok(digest.iter().take(4).map(|b| format!("{:02x}", b)).collect())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string())
}

/// Run the repair chain over `input`
///
/// Returns the sanitized file `<out_dir>/<stem>-<hash8>.pdf`, or `None`
/// when no tool succeeded and the original should pass through.
pub fn sanitize_pdf(
    input: &Path,
    tools: &[Box<dyn PdfRepairTool>],
    out_dir: &Path,
) -> ToolResult<Option<PathBuf>> {
    let scratch = TempDir::new()?;
    let mut current = input.to_path_buf();
    let mut repaired = false;

    for (idx, tool) in tools.iter().enumerate() {
        if !tool.is_available() {
            log::debug!("Repair tool {} is not available, skipping", tool.name());
            continue;
        }
        let output = scratch.path().join(format!("stage-{}.pdf", idx));
        match tool.repair(&current, &output) {
            Ok(()) => {
                log::debug!("Repaired {} with {}", input.display(), tool.name());
                current = output;
                repaired = true;
            }
            Err(e) => log::warn!("Repair tool {} failed on {}: {}", tool.name(), input.display(), e),
        }
    }

    if !repaired {
        return Ok(None);
    }

    fs::create_dir_all(out_dir)?;
    let target = out_dir.join(format!(
        "{}-{}.pdf",
        file_stem(input),
        content_hash8(input)?
    ));
    fs::copy(&current, &target)?;
    Ok(Some(target))
}

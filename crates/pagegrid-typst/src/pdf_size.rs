//! Intrinsic PDF page size from the file header

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::OnceLock;

use pagegrid_core::cache::FileCache;
use regex::Regex;

/// Millimetres per PDF user unit as rendered by the `muchpdf` Typst package
///
/// The package renders about 90 units per inch rather than 72, so sizes
/// are computed with 25.4/90. Recalibrate for a different PDF backend.
pub const MM_PER_PT: f64 = 25.4 / 90.0;

/// Page size assumed when no MediaBox can be read (US Letter, points)
pub const FALLBACK_SIZE_PT: (f64, f64) = (612.0, 792.0);

/// Bytes scanned for a MediaBox
const SCAN_LIMIT: u64 = 200_000;

fn media_box_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        let num = r"(-?\d+(?:\.\d*)?)";
        Regex::new(&format!(
            r"/MediaBox\s*\[\s*{num}\s+{num}\s+{num}\s+{num}\s*\]"
        ))
        .unwrap()
    })
}

/// Read the first MediaBox as `(width, height)` in points
fn read_media_box(path: &Path) -> Option<(f64, f64)> {
    let mut data = Vec::new();
    File::open(path)
        .ok()?
        .take(SCAN_LIMIT)
        .read_to_end(&mut data)
        .ok()?;
    // Latin-1: every byte maps to one char
    let text: String = data.iter().map(|&b| b as char).collect();

    let caps = media_box_re().captures(&text)?;
    let mut values = [0.0f64; 4];
    for (slot, idx) in values.iter_mut().zip(1..=4) {
        *slot = caps[idx].parse().ok()?;
    }
    let [x0, y0, x1, y1] = values;
    let (w, h) = ((x1 - x0).abs(), (y1 - y0).abs());
    (w > 1.0 && h > 1.0 && w.is_finite() && h.is_finite()).then_some((w, h))
}

/// PDF size lookup memoized per path and modification time
#[derive(Debug, Default)]
pub struct PdfSizeCache {
    cache: FileCache<(f64, f64)>,
}

impl PdfSizeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intrinsic `(width, height)` in millimetres of the first page
    pub fn size_mm(&mut self, path: &Path) -> (f64, f64) {
        self.cache.get_or_insert_with(path, |p| {
            let (w, h) = read_media_box(p).unwrap_or_else(|| {
                log::debug!("No MediaBox in {}, assuming Letter", p.display());
                FALLBACK_SIZE_PT
            });
            (w * MM_PER_PT, h * MM_PER_PT)
        })
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_media_box() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.pdf");
        std::fs::write(&path, b"%PDF-1.4\n1 0 obj << /Type /Page /MediaBox [0 0 595.28 841.89] >>").unwrap();

        let mut sizes = PdfSizeCache::new();
        let (w, h) = sizes.size_mm(&path);
        assert!(close(w, 595.28 * MM_PER_PT));
        assert!(close(h, 841.89 * MM_PER_PT));
    }

    #[test]
    fn test_fallback_for_missing_or_degenerate() {
        let dir = TempDir::new().unwrap();
        let flat = dir.path().join("flat.pdf");
        std::fs::write(&flat, b"/MediaBox [0 0 0 0]").unwrap();

        let mut sizes = PdfSizeCache::new();
        let letter = (612.0 * MM_PER_PT, 792.0 * MM_PER_PT);
        assert_eq!(sizes.size_mm(&flat), letter);
        assert_eq!(sizes.size_mm(&dir.path().join("missing.pdf")), letter);
        assert_eq!(sizes.len(), 2);
    }

    #[test]
    fn test_negative_origin() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("b.pdf");
        std::fs::write(&path, b"/MediaBox[-10 -10 90 190]").unwrap();
        let (w, h) = PdfSizeCache::new().size_mm(&path);
        assert!(close(w, 100.0 * MM_PER_PT));
        assert!(close(h, 200.0 * MM_PER_PT));
    }
}

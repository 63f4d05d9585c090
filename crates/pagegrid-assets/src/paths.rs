//! Asset path adjustment
//!
//! The emitted `.typ` file lives in the export directory, so asset paths
//! written relative to the working directory must be rewritten relative to
//! the export directory.

use std::path::{Component, Path, PathBuf};

use pagegrid_ast::Document;

/// Whether a source names a URL-like resource (`https:`, `data:`, ...)
fn has_scheme(src: &str) -> bool {
    src.split_once(':').is_some_and(|(scheme, _)| {
        scheme.len() > 1
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Path of `target` relative to directory `base`
pub fn relative_path(target: &Path, base: &Path) -> PathBuf {
    let target = absolute(target);
    let base = absolute(base);
    let t: Vec<Component> = target.components().collect();
    let b: Vec<Component> = base.components().collect();

    let common = t.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let mut rel = PathBuf::new();
    for _ in common..b.len() {
        rel.push("..");
    }
    for part in &t[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// Copy of `doc` with asset paths relative to `export_dir`
///
/// Relative sources are looked up under `base_dir` first, then under the
/// export directory. A source found under `base_dir` is rewritten; one
/// found only in the export directory or nowhere is kept. Absolute paths
/// and URLs are never touched.
pub fn adjust_asset_paths(doc: &Document, export_dir: &Path, base_dir: &Path) -> Document {
    let mut adjusted = doc.clone();
    for page in &mut adjusted.pages {
        for el in &mut page.elements {
            let Some(src) = el.asset_src().map(str::to_string) else {
                continue;
            };
            if Path::new(&src).is_absolute() || has_scheme(&src) {
                continue;
            }
            let local = base_dir.join(&src);
            if local.exists() {
                let rel = relative_path(&local, export_dir);
                let rel = rel.to_string_lossy().replace('\\', "/");
                if rel != src {
                    log::debug!("Asset {} -> {}", src, rel);
                    el.set_asset_src(rel);
                }
            } else if !export_dir.join(&src).exists() {
                log::debug!("Asset {} not found; leaving as is", src);
            }
        }
    }
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use pagegrid_ast::{Element, ElementType, FigureRef, Grid, Page, PageSize, Payload};
    use std::fs;
    use tempfile::TempDir;

    fn doc_with_srcs(srcs: &[&str]) -> Document {
        let mut page = Page::new("p", "P", PageSize::a4_portrait(), Grid::new(2, 2));
        for (idx, src) in srcs.iter().enumerate() {
            page.push(
                Element::new(format!("f{}", idx), ElementType::Figure).with_payload(
                    Payload::Figure(FigureRef {
                        src: Some(src.to_string()),
                        ..Default::default()
                    }),
                ),
            );
        }
        let mut doc = Document::new();
        doc.pages.push(page);
        doc
    }

    fn srcs(doc: &Document) -> Vec<&str> {
        doc.elements().filter_map(|e| e.asset_src()).collect()
    }

    #[test]
    fn test_has_scheme() {
        assert!(has_scheme("https://example.com/a.png"));
        assert!(has_scheme("data:image/png;base64,xx"));
        assert!(!has_scheme("img/a.png"));
        assert!(!has_scheme("C:\\img\\a.png"));
    }

    #[test]
    fn test_relative_path() {
        let dir = TempDir::new().unwrap();
        let export = dir.path().join("export");
        fs::create_dir_all(&export).unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/a.png"), b"x").unwrap();

        assert_eq!(
            relative_path(&dir.path().join("img/a.png"), &export),
            PathBuf::from("../img/a.png")
        );
    }

    #[test]
    fn test_adjust_asset_paths() {
        let dir = TempDir::new().unwrap();
        let export = dir.path().join("export");
        fs::create_dir_all(export.join("assets")).unwrap();
        fs::create_dir_all(dir.path().join("img")).unwrap();
        fs::write(dir.path().join("img/a.png"), b"x").unwrap();
        fs::write(export.join("assets/b.png"), b"x").unwrap();

        let doc = doc_with_srcs(&[
            "img/a.png",
            "assets/b.png",
            "missing.png",
            "/abs/c.png",
            "https://example.com/d.png",
        ]);
        let adjusted = adjust_asset_paths(&doc, &export, dir.path());
        assert_eq!(
            srcs(&adjusted),
            vec![
                "../img/a.png",
                "assets/b.png",
                "missing.png",
                "/abs/c.png",
                "https://example.com/d.png"
            ]
        );
        assert_eq!(srcs(&doc)[0], "img/a.png");
    }
}

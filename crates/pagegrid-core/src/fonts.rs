//! Font availability lookup
//!
//! The emitter only needs to know whether a font family exists so it can
//! warn before Typst silently falls back. Discovery scans font directories
//! and recognizes font files by their header magic.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::cache::{Clock, TtlCache};
use crate::style::StyleSheet;

/// Default time-to-live of a directory scan
pub const DEFAULT_FONT_TTL: Duration = Duration::from_secs(300);

const FONT_MAGIC: [&[u8; 4]; 7] = [
    b"\x00\x01\x00\x00",
    b"OTTO",
    b"ttcf",
    b"true",
    b"typ1",
    b"wOFF",
    b"wOF2",
];

const FONT_EXTENSIONS: [&str; 6] = ["ttf", "otf", "ttc", "otc", "woff", "woff2"];

/// Lookup of installed font families
pub trait FontCatalog: Send + Sync {
    /// All known family names
    fn families(&self) -> Arc<BTreeSet<String>>;

    /// Whether a family is known
    fn has_family(&self, family: &str) -> bool {
        self.families().contains(family)
    }
}

/// A fixed set of families
#[derive(Debug, Clone, Default)]
pub struct StaticFontCatalog {
    families: Arc<BTreeSet<String>>,
}

impl StaticFontCatalog {
    pub fn new<I, S>(families: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            families: Arc::new(families.into_iter().map(Into::into).collect()),
        }
    }
}

impl FontCatalog for StaticFontCatalog {
    fn families(&self) -> Arc<BTreeSet<String>> {
        Arc::clone(&self.families)
    }
}

/// Families discovered by scanning font directories, cached with a TTL
pub struct DirectoryFontCatalog {
    roots: Vec<PathBuf>,
    cache: Mutex<TtlCache<(), Arc<BTreeSet<String>>>>,
}

impl DirectoryFontCatalog {
    /// Scan `roots` with the default TTL
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self::with_cache(roots, TtlCache::new(DEFAULT_FONT_TTL))
    }

    /// Scan `roots` with a custom TTL and clock
    pub fn with_clock(roots: Vec<PathBuf>, ttl: Duration, clock: Box<dyn Clock>) -> Self {
        Self::with_cache(roots, TtlCache::with_clock(ttl, clock))
    }

    fn with_cache(roots: Vec<PathBuf>, cache: TtlCache<(), Arc<BTreeSet<String>>>) -> Self {
        Self {
            roots,
            cache: Mutex::new(cache),
        }
    }

    /// Font directories being scanned
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    fn scan(&self) -> BTreeSet<String> {
        let mut families = BTreeSet::new();
        for root in &self.roots {
            if root.is_dir() {
                scan_dir(root, root, &mut families);
            }
        }
        log::debug!(
            "Discovered {} font families in {} directories",
            families.len(),
            self.roots.len()
        );
        families
    }
}

impl FontCatalog for DirectoryFontCatalog {
    fn families(&self) -> Arc<BTreeSet<String>> {
        match self.cache.lock() {
            Ok(mut cache) => cache.get_or_insert_with((), || Arc::new(self.scan())),
            Err(_) => Arc::new(self.scan()),
        }
    }
}

fn scan_dir(root: &Path, dir: &Path, families: &mut BTreeSet<String>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            scan_dir(root, &path, families);
        } else if is_font_file(&path) {
            for family in family_names(root, &path) {
                add_with_aliases(families, &family);
            }
        }
    }
}

fn is_font_file(path: &Path) -> bool {
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| FONT_EXTENSIONS.contains(&e.to_lowercase().as_str()));
    if !ext_ok {
        return false;
    }
    let mut header = [0u8; 4];
    fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut header))
        .is_ok_and(|_| FONT_MAGIC.iter().any(|m| **m == header))
}

/// Candidate family names: the file stem before its style suffix, and the
/// containing directory (skipping `static` subdirectories)
fn family_names(root: &Path, path: &Path) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
        let family = stem
            .split(['-', '['])
            .next()
            .unwrap_or(stem)
            .trim();
        if !family.is_empty() {
            names.push(family.to_string());
        }
    }

    let mut parent = path.parent();
    if parent.and_then(|p| p.file_name()).is_some_and(|n| n == "static") {
        parent = parent.and_then(Path::parent);
    }
    if let Some(dir) = parent.filter(|p| *p != root) {
        if let Some(name) = dir.file_name().and_then(|n| n.to_str()) {
            names.push(name.to_string());
        }
    }
    names
}

fn add_with_aliases(families: &mut BTreeSet<String>, family: &str) {
    families.insert(family.to_string());
    if family.contains('_') {
        families.insert(family.replace('_', " "));
    }
    if family.contains(' ') {
        families.insert(family.replace(' ', "_"));
    }
}

/// Warn about style fonts missing from the catalog
pub fn missing_font_warnings(styles: &StyleSheet, catalog: &dyn FontCatalog) -> Vec<String> {
    styles
        .iter()
        .filter_map(|(name, style)| {
            let font = style.font.as_deref()?.trim();
            (!font.is_empty() && !catalog.has_family(font)).then(|| {
                format!(
                    "Font family '{}' referenced by style '{}' not found; Typst may fallback",
                    font, name
                )
            })
        })
        .collect()
}

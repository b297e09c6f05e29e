//! Font resolution with a deterministic fallback chain.
//!
//! Most watermark text this tool sees is CJK, and font availability varies
//! wildly across installs, so a missing font must never abort a render.
//! [`FontResolver::resolve`] walks an ordered chain of strategies and
//! always returns a usable handle while the host has at least one font
//! installed: the exact requested family first, then a fixed list of
//! CJK-capable families, then known font-file paths, then any face at all.
//! Every non-exact resolution is reported as a `tracing` warning, never an
//! error.
//!
//! The fallback lists live in a [`FallbackTable`] injected at construction
//! rather than in module-level mutable state; the system font database is
//! loaded once per resolver and is read-only afterwards.

use std::path::PathBuf;

use ab_glyph::{FontArc, FontVec, PxScale};

use crate::error::{Error, Result};

/// Ordered fallback families tried when the requested family fails to load.
const CJK_FALLBACK_FAMILIES: &[&str] = &[
    "SimHei",
    "Microsoft YaHei",
    "Arial Unicode MS",
    "WenQuanYi Micro Hei",
];

/// Known font-file locations tried after every family lookup fails.
const SYSTEM_FONT_PATHS: &[&str] = &[
    "C:/Windows/Fonts/simhei.ttf",
    "C:/Windows/Fonts/msyh.ttc",
    "C:/Windows/Fonts/simsun.ttc",
    "C:/Windows/Fonts/simkai.ttf",
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/System/Library/Fonts/PingFang.ttc",
];

/// The fallback configuration consulted by a [`FontResolver`].
#[derive(Debug, Clone)]
pub struct FallbackTable {
    /// Family names tried, in order, when the requested family is missing.
    pub families: Vec<String>,
    /// Absolute font-file paths tried after all family lookups fail.
    pub paths: Vec<PathBuf>,
}

impl Default for FallbackTable {
    fn default() -> Self {
        Self {
            families: CJK_FALLBACK_FAMILIES.iter().map(|s| (*s).to_string()).collect(),
            paths: SYSTEM_FONT_PATHS.iter().map(|p| PathBuf::from(*p)).collect(),
        }
    }
}

/// How a [`ResolvedFont`] was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FontOrigin {
    /// The requested family loaded directly.
    Exact,
    /// A family from the fallback list loaded instead.
    FallbackFamily(String),
    /// A known font file loaded from disk.
    SystemPath(PathBuf),
    /// Any available face; no CJK coverage guarantee.
    LastResort,
}

/// A loaded font plus the pixel size it was requested at.
#[derive(Clone)]
pub struct ResolvedFont {
    font: FontArc,
    size: f32,
    origin: FontOrigin,
}

impl ResolvedFont {
    /// The underlying font.
    #[must_use]
    pub fn font(&self) -> &FontArc {
        &self.font
    }

    /// The requested pixel size as an `ab_glyph` scale.
    #[must_use]
    pub fn scale(&self) -> PxScale {
        PxScale::from(self.size)
    }

    /// How this font was resolved.
    #[must_use]
    pub fn origin(&self) -> &FontOrigin {
        &self.origin
    }

    /// Whether the requested family loaded without any fallback.
    #[must_use]
    pub fn is_exact(&self) -> bool {
        self.origin == FontOrigin::Exact
    }
}

impl std::fmt::Debug for ResolvedFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedFont")
            .field("size", &self.size)
            .field("origin", &self.origin)
            .finish()
    }
}

/// Resolves font names to loaded fonts against the system font database.
pub struct FontResolver {
    db: fontdb::Database,
    table: FallbackTable,
}

impl FontResolver {
    /// Create a resolver over the system fonts with the default fallbacks.
    #[must_use]
    pub fn new() -> Self {
        Self::with_table(FallbackTable::default())
    }

    /// Create a resolver with a custom fallback table.
    #[must_use]
    pub fn with_table(table: FallbackTable) -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        Self { db, table }
    }

    /// Whether any face is available at all.
    #[must_use]
    pub fn has_fonts(&self) -> bool {
        self.db.faces().next().is_some()
    }

    /// Resolve `name` at `size` pixels, preferring bold/italic variants when
    /// requested. Style hints are best-effort: the closest face wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoUsableFont`] only when the host has no fonts at
    /// all; every other shortfall falls through the chain with a warning.
    pub fn resolve(&self, name: &str, size: u32, bold: bool, italic: bool) -> Result<ResolvedFont> {
        let size = size.max(1) as f32;

        if let Some(font) = self.try_family(name, bold, italic) {
            return Ok(ResolvedFont {
                font,
                size,
                origin: FontOrigin::Exact,
            });
        }

        for family in &self.table.families {
            if let Some(font) = self.try_family(family, bold, italic) {
                tracing::warn!(requested = %name, fallback = %family, "font not found, using fallback family");
                return Ok(ResolvedFont {
                    font,
                    size,
                    origin: FontOrigin::FallbackFamily(family.clone()),
                });
            }
        }

        for path in &self.table.paths {
            if let Some(font) = try_path(path) {
                tracing::warn!(requested = %name, path = %path.display(), "font not found, loaded from known path");
                return Ok(ResolvedFont {
                    font,
                    size,
                    origin: FontOrigin::SystemPath(path.clone()),
                });
            }
        }

        if let Some(font) = self.any_face() {
            tracing::warn!(requested = %name, "font not found, using first available face (CJK coverage not guaranteed)");
            return Ok(ResolvedFont {
                font,
                size,
                origin: FontOrigin::LastResort,
            });
        }

        Err(Error::NoUsableFont)
    }

    /// Load the best-matching face for a family name, or `None`.
    fn try_family(&self, family: &str, bold: bool, italic: bool) -> Option<FontArc> {
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            weight: if bold { fontdb::Weight::BOLD } else { fontdb::Weight::NORMAL },
            stretch: fontdb::Stretch::Normal,
            style: if italic { fontdb::Style::Italic } else { fontdb::Style::Normal },
        };
        let id = self.db.query(&query)?;
        self.load_face(id)
    }

    /// Load any face present in the database.
    fn any_face(&self) -> Option<FontArc> {
        let id = self.db.faces().next()?.id;
        self.load_face(id)
    }

    fn load_face(&self, id: fontdb::ID) -> Option<FontArc> {
        self.db
            .with_face_data(id, |data, index| {
                FontVec::try_from_vec_and_index(data.to_vec(), index)
                    .ok()
                    .map(FontArc::new)
            })
            .flatten()
    }
}

impl Default for FontResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Load a font file from disk, or `None` on any failure.
fn try_path(path: &std::path::Path) -> Option<FontArc> {
    let data = std::fs::read(path).ok()?;
    FontVec::try_from_vec_and_index(data, 0).ok().map(FontArc::new)
}

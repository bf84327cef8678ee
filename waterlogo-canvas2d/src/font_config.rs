//! Font configuration for text overlays.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// Font configuration shared by every surface that draws text.
///
/// Resolve it once with [`FontConfig::resolve`] and hand the result to
/// [`Canvas2dContext::with_resolved`](crate::Canvas2dContext::with_resolved);
/// scanning system fonts for every image of a batch is slow.
#[derive(Clone, Debug)]
pub struct FontConfig {
    /// Custom font data to register.
    pub custom_fonts: Vec<CustomFont>,
    /// Mappings from generic CSS family names to concrete font family names.
    pub generic_families: GenericFamilyMap,
    /// Whether to load system fonts (default: true).
    pub load_system_fonts: bool,
    /// Additional directories to scan for font files.
    pub font_dirs: Vec<PathBuf>,
    /// Whether glyph outlines are hinted (default: false).
    pub hinting_enabled: bool,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            custom_fonts: Vec::new(),
            generic_families: GenericFamilyMap::defaults(),
            load_system_fonts: true,
            font_dirs: Vec::new(),
            hinting_enabled: false,
        }
    }
}

/// Raw font file bytes to register with the database.
#[derive(Clone, Debug)]
pub struct CustomFont {
    /// TTF/OTF data. Arc-wrapped so cloning a config stays cheap.
    pub data: Arc<Vec<u8>>,
}

/// Concrete fonts for the generic CSS families, in priority order.
#[derive(Clone, Debug, Default)]
pub struct GenericFamilyMap {
    pub sans_serif: Vec<String>,
    pub serif: Vec<String>,
    pub monospace: Vec<String>,
}

impl GenericFamilyMap {
    /// Browser-like preferences, starting with the faces a watermark is usually set in.
    pub fn defaults() -> Self {
        Self {
            sans_serif: vec![
                "Segoe UI".into(),
                "Arial".into(),
                "Helvetica".into(),
                "Liberation Sans".into(),
                "DejaVu Sans".into(),
            ],
            serif: vec![
                "Times New Roman".into(),
                "Liberation Serif".into(),
                "DejaVu Serif".into(),
            ],
            monospace: vec![
                "Courier New".into(),
                "Liberation Mono".into(),
                "DejaVu Sans Mono".into(),
            ],
        }
    }
}

impl FontConfig {
    /// Resolve this configuration into a concrete font database.
    pub fn resolve(&self) -> ResolvedFontConfig {
        ResolvedFontConfig {
            fontdb: font_config_to_fontdb(self),
            hinting_enabled: self.hinting_enabled,
        }
    }
}

/// A [`FontConfig`] that has been loaded into a font database.
///
/// Cloning copies the in-memory database without touching the filesystem.
#[derive(Clone)]
pub struct ResolvedFontConfig {
    pub(crate) fontdb: fontdb::Database,
    pub(crate) hinting_enabled: bool,
}

impl ResolvedFontConfig {
    /// Number of font faces available for text overlays.
    pub fn face_count(&self) -> usize {
        self.fontdb.len()
    }
}

impl std::fmt::Debug for ResolvedFontConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedFontConfig")
            .field("faces", &self.fontdb.len())
            .field("hinting_enabled", &self.hinting_enabled)
            .finish()
    }
}

/// Convert a [`FontConfig`] into a [`fontdb::Database`].
pub fn font_config_to_fontdb(config: &FontConfig) -> fontdb::Database {
    let mut db = fontdb::Database::new();

    if config.load_system_fonts {
        db.load_system_fonts();
    }
    for dir in &config.font_dirs {
        db.load_fonts_dir(dir);
    }
    for font in &config.custom_fonts {
        db.load_font_data(Vec::from(font.data.as_slice()));
    }

    apply_generic_families(&mut db, &config.generic_families);
    log::debug!(target: "canvas", "font database ready with {} faces", db.len());
    db
}

/// Point each generic family at the first preference that is installed.
fn apply_generic_families(db: &mut fontdb::Database, families: &GenericFamilyMap) {
    let available: HashSet<String> = db
        .faces()
        .flat_map(|face| face.families.iter().map(|(fam, _lang)| fam.clone()))
        .collect();

    if let Some(family) = families.sans_serif.iter().find(|f| available.contains(*f)) {
        db.set_sans_serif_family(family.as_str());
    }
    if let Some(family) = families.serif.iter().find(|f| available.contains(*f)) {
        db.set_serif_family(family.as_str());
    }
    if let Some(family) = families.monospace.iter().find(|f| available.contains(*f)) {
        db.set_monospace_family(family.as_str());
    }
}

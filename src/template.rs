//! Watermark templates: a flat JSON codec plus a directory-backed store.
//!
//! A template is a named snapshot of a [`WatermarkConfig`]. The codec is
//! defensive on decode: every field has a hard-coded default, so a record
//! missing any field (or all of them) still decodes to a valid config.
//! Out-of-range integers are clamped, unknown position strings fall back
//! to `center`, and unknown extra fields are ignored. Encoding then
//! decoding a config reproduces it field for field.
//!
//! [`TemplateStore`] keeps one UTF-8 JSON file per template
//! (`<name>.json`) under a directory. Malformed files surface as
//! [`Error::Template`], never as a raw parse panic.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};

use crate::config::{Anchor, Color, Position, WatermarkConfig};
use crate::error::{Error, Result};

fn default_font_name() -> String {
    "SimHei".to_string()
}

fn default_font_size() -> u32 {
    24
}

fn default_color() -> Color {
    Color::white()
}

fn default_opacity() -> u8 {
    50
}

fn default_position() -> Position {
    Position::Anchor(Anchor::Center)
}

fn de_font_size<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u32, D::Error> {
    let v = i64::deserialize(deserializer)?;
    Ok(v.clamp(1, i64::from(u32::MAX)) as u32)
}

fn de_opacity<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<u8, D::Error> {
    let v = i64::deserialize(deserializer)?;
    Ok(v.clamp(0, 100) as u8)
}

/// The persisted form of a named watermark configuration.
///
/// Field-for-field this is the template file format: a flat JSON object,
/// every field optional with the documented default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    /// Template name.
    #[serde(default)]
    pub name: String,
    /// Watermark text.
    #[serde(default)]
    pub text: String,
    /// Font family name.
    #[serde(default = "default_font_name")]
    pub font_name: String,
    /// Font size in pixels, clamped to at least 1.
    #[serde(default = "default_font_size", deserialize_with = "de_font_size")]
    pub font_size: u32,
    /// Bold style hint.
    #[serde(default)]
    pub font_bold: bool,
    /// Italic style hint.
    #[serde(default)]
    pub font_italic: bool,
    /// Text color; accepts a 3- or 4-element array on read.
    #[serde(default = "default_color")]
    pub color: Color,
    /// Opacity in percent, clamped to 0-100.
    #[serde(default = "default_opacity", deserialize_with = "de_opacity")]
    pub opacity: u8,
    /// Placement: anchor name or `[x, y]`.
    #[serde(default = "default_position")]
    pub position: Position,
    /// Rotation in degrees.
    #[serde(default)]
    pub rotation: i32,
}

impl TemplateRecord {
    /// Encode a config as a named template record.
    #[must_use]
    pub fn from_config(name: impl Into<String>, config: &WatermarkConfig) -> Self {
        Self {
            name: name.into(),
            text: config.text.clone(),
            font_name: config.font_name.clone(),
            font_size: config.font_size,
            font_bold: config.font_bold,
            font_italic: config.font_italic,
            color: config.color,
            opacity: config.opacity.min(100),
            position: config.position,
            rotation: config.rotation,
        }
    }

    /// Decode this record into a config. Total: never fails.
    #[must_use]
    pub fn to_config(&self) -> WatermarkConfig {
        WatermarkConfig {
            text: self.text.clone(),
            font_name: self.font_name.clone(),
            font_size: self.font_size.max(1),
            font_bold: self.font_bold,
            font_italic: self.font_italic,
            color: self.color,
            opacity: self.opacity.min(100),
            position: self.position,
            rotation: self.rotation,
        }
    }
}

/// A directory of template files, one JSON file per template.
#[derive(Debug, Clone)]
pub struct TemplateStore {
    dir: PathBuf,
}

impl TemplateStore {
    /// Use `dir` as the templates directory, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The templates directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.json")))
    }

    /// Save a template, overwriting any existing one with the same name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] for an invalid name, or an I/O error if
    /// the write fails.
    pub fn save(&self, record: &TemplateRecord) -> Result<()> {
        let path = self.path_for(&record.name)?;
        let json = serde_json::to_string_pretty(record)
            .map_err(|e| Error::Template(format!("failed to encode '{}': {e}", record.name)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a template by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the file is missing or not a valid
    /// template record.
    pub fn load(&self, name: &str) -> Result<TemplateRecord> {
        let path = self.path_for(name)?;
        let json = std::fs::read_to_string(&path)
            .map_err(|e| Error::Template(format!("failed to read '{name}': {e}")))?;
        serde_json::from_str(&json)
            .map_err(|e| Error::Template(format!("failed to decode '{name}': {e}")))
    }

    /// Delete a template by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the template does not exist.
    pub fn delete(&self, name: &str) -> Result<()> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(Error::Template(format!("no template named '{name}'")));
        }
        std::fs::remove_file(path)?;
        Ok(())
    }

    /// All template names in the store, sorted.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = std::fs::read_dir(&self.dir)?
            .filter_map(std::result::Result::ok)
            .map(|e| e.path())
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("json"))
            .filter_map(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .collect();
        names.sort();
        Ok(names)
    }

    /// Rename a template, overwriting any template already at `new_name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the source template does not exist.
    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<()> {
        let old_path = self.path_for(old_name)?;
        let new_path = self.path_for(new_name)?;
        if !old_path.exists() {
            return Err(Error::Template(format!("no template named '{old_name}'")));
        }
        std::fs::rename(old_path, new_path)?;
        Ok(())
    }

    /// Import a template file into the store, named after the file stem.
    /// Returns the imported template's name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the file is not a valid template.
    pub fn import(&self, file: &Path) -> Result<String> {
        let json = std::fs::read_to_string(file)
            .map_err(|e| Error::Template(format!("failed to read '{}': {e}", file.display())))?;
        let record: TemplateRecord = serde_json::from_str(&json)
            .map_err(|e| Error::Template(format!("'{}' is not a template: {e}", file.display())))?;

        let name = file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::Template(format!("'{}' has no usable name", file.display())))?;

        // Keep the imported record but store it under the file's name.
        let record = TemplateRecord { name: name.clone(), ..record };
        self.save(&record)?;
        Ok(name)
    }

    /// Copy a stored template to an external file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the template does not exist.
    pub fn export(&self, name: &str, dest: &Path) -> Result<()> {
        let path = self.path_for(name)?;
        if !path.exists() {
            return Err(Error::Template(format!("no template named '{name}'")));
        }
        std::fs::copy(path, dest)?;
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::Template("template name is empty".to_string()));
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(Error::Template(format!("invalid template name '{name}'")));
    }
    Ok(())
}

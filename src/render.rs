//! The watermark engine: rendering, format-aware saving, batch export.
//!
//! Rendering never resizes the canvas: the composited output always has
//! the source dimensions, rotation included. Saving encodes the full
//! image in memory before touching the destination, so a failed render or
//! encode never leaves a partial file behind.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};

use crate::compose;
use crate::config::WatermarkConfig;
use crate::error::{Error, Result};
use crate::font::FontResolver;
use crate::layout::{self, AnchorMode};

/// JPEG encode quality for flattened output.
const JPEG_QUALITY: u8 = 95;

/// The watermark engine holding the font resolver.
///
/// Create once and reuse across renders; the system font database is
/// loaded at construction and read-only afterwards. Each render call is
/// self-contained and allocates its own scratch surfaces.
pub struct Engine {
    resolver: FontResolver,
    anchor_mode: AnchorMode,
}

impl Engine {
    /// Create an engine over the system fonts with legacy anchor behavior.
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolver: FontResolver::new(),
            anchor_mode: AnchorMode::Legacy,
        }
    }

    /// Use a pre-built font resolver.
    #[must_use]
    pub fn with_resolver(mut self, resolver: FontResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Select the rotated-path anchor behavior.
    #[must_use]
    pub fn with_anchor_mode(mut self, mode: AnchorMode) -> Self {
        self.anchor_mode = mode;
        self
    }

    /// Composite the watermark described by `config` onto `source`.
    ///
    /// The output always has the source's exact dimensions. With a nonzero
    /// rotation only the text layer is rotated: the glyphs are drawn
    /// centered on a square scratch surface sized to twice the larger text
    /// dimension (so the rotated silhouette cannot clip), rotated with
    /// bounds expansion, and pasted onto a full-canvas overlay.
    ///
    /// # Errors
    ///
    /// [`Error::EmptyText`] for an empty watermark text;
    /// [`Error::NoUsableFont`] on a host with no fonts at all.
    pub fn render(&self, source: &DynamicImage, config: &WatermarkConfig) -> Result<RgbaImage> {
        if config.text.is_empty() {
            return Err(Error::EmptyText);
        }

        let font = self.resolver.resolve(
            &config.font_name,
            config.font_size,
            config.font_bold,
            config.font_italic,
        )?;

        let base = source.to_rgba8();
        let img_size = base.dimensions();
        let text_size = layout::measure_text(&config.text, &font);
        let alpha = config.alpha();
        tracing::debug!(
            width = img_size.0,
            height = img_size.1,
            text_w = text_size.0,
            text_h = text_size.1,
            rotation = config.rotation,
            "rendering watermark"
        );

        let mut overlay = RgbaImage::new(img_size.0, img_size.1);

        if config.rotation == 0 {
            let origin = layout::placement(config.position, img_size, text_size);
            compose::draw_text(&mut overlay, &font, &config.text, origin, config.color, alpha);
        } else {
            // Square scratch surface, twice the larger text dimension.
            let side = (2 * text_size.0.max(text_size.1)).max(1);
            let mut scratch = RgbaImage::new(side, side);
            let center = i64::from(side / 2);
            let origin = (
                center - i64::from(text_size.0) / 2,
                center - i64::from(text_size.1) / 2,
            );
            compose::draw_text(&mut scratch, &font, &config.text, origin, config.color, alpha);

            let rotated = compose::rotate_expand(&scratch, config.rotation as f32);
            let paste = layout::rotated_placement(
                config.position,
                img_size,
                rotated.dimensions(),
                self.anchor_mode,
            );
            compose::overlay_at(&mut overlay, &rotated, paste.0, paste.1);
        }

        let mut out = base;
        compose::overlay_at(&mut out, &overlay, 0, 0);
        Ok(out)
    }

    /// Render a watermark over the image at `input`.
    ///
    /// With `output` set, the composited image is written there and `None`
    /// is returned; without it, the in-memory image is returned instead.
    ///
    /// # Errors
    ///
    /// Anything from [`Engine::render`], plus I/O and decode errors for the
    /// source and destination. A failure never leaves a partial output
    /// file.
    pub fn render_path(
        &self,
        input: &Path,
        config: &WatermarkConfig,
        output: Option<&Path>,
    ) -> Result<Option<RgbaImage>> {
        if !is_supported_image(input) {
            return Err(Error::UnsupportedFormat(input.display().to_string()));
        }
        let source = image::open(input)?;
        let composited = self.render(&source, config)?;
        match output {
            Some(path) => {
                save_image(&composited, path)?;
                Ok(None)
            }
            None => Ok(Some(composited)),
        }
    }

    /// Process a single file: load, render, save. Never panics; failures
    /// are reported in the returned [`ProcessResult`].
    #[must_use]
    pub fn process_file(
        &self,
        input: &Path,
        output: &Path,
        config: &WatermarkConfig,
    ) -> ProcessResult {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    return ProcessResult::failure(
                        input,
                        format!("failed to create output directory: {e}"),
                    );
                }
            }
        }

        match self.render_path(input, config, Some(output)) {
            Ok(_) => ProcessResult::success(input),
            Err(e) => ProcessResult::failure(input, e.to_string()),
        }
    }

    /// Apply one config to many images, strictly sequentially.
    ///
    /// Output paths come from `naming`. A failing item is reported in its
    /// result and the batch continues; already-written outputs stay on
    /// disk.
    #[must_use]
    pub fn process_batch(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
        naming: &OutputNaming,
        config: &WatermarkConfig,
    ) -> Vec<ProcessResult> {
        if !output_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(output_dir) {
                return vec![ProcessResult::failure(
                    output_dir,
                    format!("failed to create output directory: {e}"),
                )];
            }
        }

        inputs
            .iter()
            .map(|input| {
                let output = naming.output_path_for(input, output_dir);
                self.process_file(input, &output, config)
            })
            .collect()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed input file.
    pub path: PathBuf,
    /// Whether processing succeeded.
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn success(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            success: true,
            message: "watermark applied".to_string(),
        }
    }

    fn failure(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            success: false,
            message,
        }
    }
}

/// How batch outputs are named relative to their inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputNaming {
    /// Keep the input file name.
    Original,
    /// Prepend a prefix to the file stem.
    Prefix(String),
    /// Append a suffix to the file stem, before the extension.
    Suffix(String),
}

impl OutputNaming {
    /// The output path for `input` under `output_dir`.
    #[must_use]
    pub fn output_path_for(&self, input: &Path, output_dir: &Path) -> PathBuf {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        let ext = input
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        let name = match self {
            Self::Original => format!("{stem}{ext}"),
            Self::Prefix(prefix) => format!("{prefix}{stem}{ext}"),
            Self::Suffix(suffix) => format!("{stem}{suffix}{ext}"),
        };
        output_dir.join(name)
    }
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(ext.to_lowercase().as_str(), "jpg" | "jpeg" | "png" | "bmp"),
        None => false,
    }
}

/// Collect the supported images directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be read.
pub fn collect_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
        .map(|e| e.path())
        .filter(|p| is_supported_image(p))
        .collect();
    paths.sort();
    Ok(paths)
}

/// Save a composited image with format-specific handling.
///
/// `.jpg`/`.jpeg` destinations are flattened to RGB (alpha dropped, the
/// original tool's behavior) and encoded at quality 95. `.png` and any
/// other or missing extension are written as PNG with alpha preserved.
/// The image is encoded fully in memory first; nothing is written unless
/// encoding succeeds.
///
/// # Errors
///
/// Returns an error if encoding or the final write fails.
pub fn save_image(img: &RgbaImage, path: &Path) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    let mut buf = Vec::new();
    let mut cursor = Cursor::new(&mut buf);

    match ext.as_str() {
        "jpg" | "jpeg" => {
            let rgb = flatten_to_rgb(img);
            let mut encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
            encoder.encode_image(&rgb)?;
        }
        _ => {
            img.write_to(&mut cursor, ImageFormat::Png)?;
        }
    }

    std::fs::write(path, &buf)?;
    Ok(())
}

/// Drop the alpha channel without compositing onto a background.
fn flatten_to_rgb(img: &RgbaImage) -> RgbImage {
    let mut rgb = RgbImage::new(img.width(), img.height());
    for (src, dst) in img.pixels().zip(rgb.pixels_mut()) {
        *dst = image::Rgb([src[0], src[1], src[2]]);
    }
    rgb
}

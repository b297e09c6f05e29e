//! Error types for the photo-watermark crate.

/// Errors that can occur while rendering watermarks or handling templates.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The watermark text is empty; there is nothing to render.
    #[error("watermark text is empty")]
    EmptyText,

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An error occurred during image processing (load, encode, save).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),

    /// The source image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// No font could be loaded at all (empty system font database).
    ///
    /// Fallback resolution never raises this while at least one face is
    /// installed; see [`crate::FontResolver`].
    #[error("no usable font found on this system")]
    NoUsableFont,

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A template could not be read, written, or decoded.
    #[error("template error: {0}")]
    Template(String),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let io_err = Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        assert!(io_err.to_string().contains("gone"));

        let unsupported = Error::UnsupportedFormat("tiff".to_string());
        assert!(unsupported.to_string().contains("tiff"));

        let empty = Error::EmptyText;
        assert!(empty.to_string().contains("empty"));

        let tpl = Error::Template("not json".to_string());
        assert!(tpl.to_string().contains("not json"));
    }
}

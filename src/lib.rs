//! Overlay configurable text watermarks onto raster images.
//!
//! The engine renders a text watermark described by a [`WatermarkConfig`]
//! onto a source image: fonts are resolved with a CJK-aware fallback
//! chain, placement uses nine named anchors or an explicit pixel offset,
//! and rotation affects only the text layer, never the canvas size.
//! Configurations can be persisted as named JSON templates and applied to
//! whole directories sequentially.
//!
//! # Quick Start
//!
//! ```no_run
//! use photo_watermark::{Engine, WatermarkConfig};
//!
//! let engine = Engine::new();
//! let config = WatermarkConfig::default()
//!     .with_text("测试水印")
//!     .with_opacity(50);
//!
//! let img = image::open("photo.jpg").unwrap();
//! let composited = engine.render(&img, &config).unwrap();
//! composited.save("watermarked.png").unwrap();
//! ```
//!
//! # Templates
//!
//! A template is a named snapshot of a config, one JSON file per template:
//!
//! ```no_run
//! use photo_watermark::{TemplateRecord, TemplateStore, WatermarkConfig};
//!
//! let store = TemplateStore::open("templates").unwrap();
//! let config = WatermarkConfig::default().with_text("Copyright");
//! store.save(&TemplateRecord::from_config("default", &config)).unwrap();
//!
//! let loaded = store.load("default").unwrap().to_config();
//! assert_eq!(loaded, config);
//! ```

#![deny(missing_docs)]

mod compose;
pub mod config;
pub mod error;
pub mod font;
pub mod layout;
mod render;
pub mod template;

pub use config::{parse_hex_color, Anchor, Color, Position, WatermarkConfig};
pub use error::{Error, Result};
pub use font::{FallbackTable, FontOrigin, FontResolver, ResolvedFont};
pub use layout::{anchor_point, measure_text, AnchorMode};
pub use render::{
    collect_images, is_supported_image, save_image, Engine, OutputNaming, ProcessResult,
};
pub use template::{TemplateRecord, TemplateStore};

use std::path::{Path, PathBuf};
use std::process;

use clap::Parser;

use photo_watermark::{
    collect_images, parse_hex_color, AnchorMode, Engine, OutputNaming, Position, ProcessResult,
    TemplateRecord, TemplateStore, WatermarkConfig,
};

#[derive(Parser)]
#[command(
    name = "photo-watermark",
    about = "Overlay a configurable text watermark onto images",
    version,
    after_help = "Simple usage: photo-watermark photo.jpg --text \"Copyright\"\n\n\
                  A directory input watermarks every supported image in it\n\
                  (jpg/jpeg/png/bmp), sequentially, into the output directory."
)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input image file or directory
    input: Option<PathBuf>,

    /// Output file (single input) or directory (batch); default: {name}_watermarked.{ext}
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Watermark text
    #[arg(short, long)]
    text: Option<String>,

    /// Font family name
    #[arg(long)]
    font: Option<String>,

    /// Font size in pixels
    #[arg(long)]
    size: Option<u32>,

    /// Prefer a bold face
    #[arg(long)]
    bold: bool,

    /// Prefer an italic face
    #[arg(long)]
    italic: bool,

    /// Text color as #RGB or #RRGGBB
    #[arg(long)]
    color: Option<String>,

    /// Opacity in percent (0-100, clamped)
    #[arg(long)]
    opacity: Option<i64>,

    /// Position: an anchor name (e.g. bottom_right) or explicit "x,y"
    #[arg(short, long)]
    position: Option<String>,

    /// Rotation in degrees (counter-clockwise for positive values)
    #[arg(short, long)]
    rotation: Option<i32>,

    /// Load this template as the base configuration
    #[arg(long)]
    template: Option<String>,

    /// Save the resulting configuration under this template name
    #[arg(long)]
    save_template: Option<String>,

    /// Templates directory (default: ./templates)
    #[arg(long, default_value = "templates")]
    templates_dir: PathBuf,

    /// Batch naming: prepend this prefix to output file names
    #[arg(long)]
    prefix: Option<String>,

    /// Batch naming: append this suffix to output file stems
    #[arg(long)]
    suffix: Option<String>,

    /// Apply the standard edge margin in the rotated path too
    #[arg(long)]
    strict_anchors: bool,

    /// Suppress all non-error output
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.quiet {
        tracing::Level::ERROR
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    if cli.prefix.is_some() && cli.suffix.is_some() {
        eprintln!("Error: Cannot specify both --prefix and --suffix");
        process::exit(1);
    }

    let store = match TemplateStore::open(&cli.templates_dir) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: Failed to open templates directory: {e}");
            process::exit(1);
        }
    };

    let config = match build_config(&cli, &store) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("Error: {msg}");
            process::exit(1);
        }
    };

    if let Some(name) = &cli.save_template {
        let record = TemplateRecord::from_config(name.clone(), &config);
        if let Err(e) = store.save(&record) {
            eprintln!("Error: Failed to save template '{name}': {e}");
            process::exit(1);
        }
        if !cli.quiet {
            eprintln!("Template '{name}' saved to {}", store.dir().display());
        }
        if cli.input.is_none() {
            return;
        }
    }

    let Some(input) = &cli.input else {
        eprintln!("Error: No input given (and no --save-template to perform instead)");
        process::exit(1);
    };
    if !input.exists() {
        eprintln!("Error: Input path does not exist: {}", input.display());
        process::exit(1);
    }

    let mode = if cli.strict_anchors {
        AnchorMode::Strict
    } else {
        AnchorMode::Legacy
    };
    let engine = Engine::new().with_anchor_mode(mode);

    let results = if input.is_dir() {
        let Some(output_dir) = &cli.output else {
            eprintln!("Error: Output directory is required for batch processing");
            eprintln!("Usage: photo-watermark <input_dir> -o <output_dir> --text <text>");
            process::exit(1);
        };
        let naming = if let Some(prefix) = &cli.prefix {
            OutputNaming::Prefix(prefix.clone())
        } else if let Some(suffix) = &cli.suffix {
            OutputNaming::Suffix(suffix.clone())
        } else {
            OutputNaming::Original
        };
        let inputs = match collect_images(input) {
            Ok(paths) => paths,
            Err(e) => {
                eprintln!("Error: Failed to read input directory: {e}");
                process::exit(1);
            }
        };
        engine.process_batch(&inputs, output_dir, &naming, &config)
    } else {
        let output = cli
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(input));
        vec![engine.process_file(input, &output, &config)]
    };

    let mut success_count = 0u32;
    let mut fail_count = 0u32;
    for result in &results {
        print_result(result, cli.quiet);
        if result.success {
            success_count += 1;
        } else {
            fail_count += 1;
        }
    }

    if results.len() > 1 && !cli.quiet {
        eprintln!();
        eprint!("[Summary] Processed: {success_count}");
        if fail_count > 0 {
            eprint!(", Failed: {fail_count}");
        }
        eprintln!(" (Total: {})", results.len());
    }

    if fail_count > 0 {
        process::exit(1);
    }
}

/// Build the render config: template base (if any) with CLI overrides.
fn build_config(cli: &Cli, store: &TemplateStore) -> Result<WatermarkConfig, String> {
    let mut config = match &cli.template {
        Some(name) => store
            .load(name)
            .map_err(|e| format!("Failed to load template '{name}': {e}"))?
            .to_config(),
        None => WatermarkConfig::default(),
    };

    if let Some(text) = &cli.text {
        config = config.with_text(text.clone());
    }
    if cli.font.is_some() || cli.size.is_some() || cli.bold || cli.italic {
        let font_name = cli.font.clone().unwrap_or_else(|| config.font_name.clone());
        let font_size = cli.size.unwrap_or(config.font_size);
        let font_bold = cli.bold || config.font_bold;
        let font_italic = cli.italic || config.font_italic;
        config = config.with_font(font_name, font_size, font_bold, font_italic);
    }
    if let Some(hex) = &cli.color {
        let color = parse_hex_color(hex).map_err(|e| e.to_string())?;
        config = config.with_color(color);
    }
    if let Some(opacity) = cli.opacity {
        config = config.with_opacity(opacity);
    }
    if let Some(position) = &cli.position {
        let position = Position::parse(position)
            .ok_or_else(|| format!("Invalid position '{position}': expected an anchor name or \"x,y\""))?;
        config = config.with_position(position);
    }
    if let Some(rotation) = cli.rotation {
        config = config.with_rotation(rotation);
    }

    Ok(config)
}

/// Default single-file output: `photo.jpg` becomes `photo_watermarked.jpg`.
fn default_output_path(input: &Path) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let ext = input.extension().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    if ext.is_empty() {
        parent.join(format!("{stem}_watermarked"))
    } else {
        parent.join(format!("{stem}_watermarked.{ext}"))
    }
}

fn print_result(result: &ProcessResult, quiet: bool) {
    let filename = result.path.file_name().map_or_else(
        || result.path.display().to_string(),
        |f| f.to_string_lossy().to_string(),
    );

    if result.success {
        if !quiet {
            eprintln!("[OK] {filename}");
        }
    } else {
        eprintln!("[FAIL] {filename}: {}", result.message);
    }
}

// ============================================================================
// EXPORT — PNG encoding and the `Grainy_Editorial_<w>x<h>.png` naming scheme
// ============================================================================

use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageError, RgbaImage};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::settings::GrainSettings;

/// Filename prefix for exported images.
pub const EXPORT_PREFIX: &str = "Grainy_Editorial";

/// Error type for export operations
#[derive(Debug)]
pub enum ExportError {
    Io(std::io::Error),
    Encode(String),
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::Io(e) => write!(f, "I/O error: {}", e),
            ExportError::Encode(e) => write!(f, "PNG encode error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {}

impl From<std::io::Error> for ExportError {
    fn from(e: std::io::Error) -> Self {
        ExportError::Io(e)
    }
}

impl From<ImageError> for ExportError {
    fn from(e: ImageError) -> Self {
        match e {
            ImageError::IoError(io) => ExportError::Io(io),
            other => ExportError::Encode(other.to_string()),
        }
    }
}

/// `Grainy_Editorial_<width>x<height>.png`
pub fn export_filename(width: u32, height: u32) -> String {
    format!("{}_{}x{}.png", EXPORT_PREFIX, width, height)
}

/// Filename for a render of `settings`, using the clamped dimensions that
/// were actually rendered rather than the requested ones.
pub fn export_filename_for(settings: &GrainSettings) -> String {
    let (w, h) = settings.output_dimensions();
    export_filename(w, h)
}

/// Encode `image` as an RGBA PNG into any writer.
pub fn encode_png<W: Write>(image: &RgbaImage, writer: W) -> Result<(), ExportError> {
    let encoder = PngEncoder::new(writer);
    encoder.write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ColorType::Rgba8,
    )?;
    Ok(())
}

/// Encode to an in-memory PNG (for callers that ship bytes elsewhere).
pub fn encode_png_bytes(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    encode_png(image, &mut bytes)?;
    Ok(bytes)
}

/// Encode and write to an explicit path.
pub fn write_png(image: &RgbaImage, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    encode_png(image, &mut writer)?;
    writer.flush()?;
    crate::log_info!("Exported {}x{} PNG to {}", image.width(), image.height(), path.display());
    Ok(())
}

/// Write `image` into `dir` under the standard export filename.
/// Returns the full path written.
pub fn export_png(image: &RgbaImage, dir: &Path) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_filename(image.width(), image.height()));
    write_png(image, &path)?;
    Ok(path)
}

// ============================================================================
// CLIPBOARD — hand the rendered grain to the OS clipboard (arboard)
// ============================================================================

use image::RgbaImage;

#[derive(Debug)]
pub enum ClipboardError {
    /// No clipboard could be opened (headless session, missing display server).
    Unavailable(String),
    /// The clipboard refused the image.
    Rejected(String),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::Unavailable(e) => write!(f, "Clipboard unavailable: {}", e),
            ClipboardError::Rejected(e) => write!(f, "Clipboard rejected image: {}", e),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// arboard wants ImageData { width, height, bytes } in RGBA order, which is
/// exactly the buffer layout, so no copy is made here.
pub fn to_image_data(img: &RgbaImage) -> arboard::ImageData<'_> {
    arboard::ImageData {
        width: img.width() as usize,
        height: img.height() as usize,
        bytes: std::borrow::Cow::Borrowed(img.as_raw()),
    }
}

/// Write an RGBA image to the system clipboard.
pub fn copy_to_system_clipboard(img: &RgbaImage) -> Result<(), ClipboardError> {
    let mut clip =
        arboard::Clipboard::new().map_err(|e| ClipboardError::Unavailable(e.to_string()))?;
    clip.set_image(to_image_data(img))
        .map_err(|e| ClipboardError::Rejected(e.to_string()))?;
    crate::log_info!(
        "Copied {}x{} image to clipboard",
        img.width(),
        img.height()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn image_data_borrows_rgba_bytes() {
        let img = RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]));
        let data = to_image_data(&img);
        assert_eq!((data.width, data.height), (3, 2));
        assert_eq!(data.bytes.len(), 3 * 2 * 4);
        assert_eq!(&data.bytes[..4], &[1, 2, 3, 255]);
    }
}

//! Helpers for moving encoded images between the filesystem and the engine.
//!
//! The engine itself only deals in byte buffers; these helpers cover the file side
//! for command-line tools and tests.

use crate::core::config::OutputFormat;
use crate::core::errors::{InpaintError, InpaintResult};
use image::RgbImage;
use std::fs;
use std::path::Path;

/// Reads an encoded image from disk without decoding it.
///
/// # Errors
///
/// Returns [`InpaintError::Io`] if the file cannot be read, and
/// [`InpaintError::InvalidArgument`] if it is empty.
pub fn read_image_bytes(path: &Path) -> InpaintResult<Vec<u8>> {
    let bytes = fs::read(path)?;
    if bytes.is_empty() {
        return Err(InpaintError::invalid_argument(format!(
            "image file '{}' is empty",
            path.display()
        )));
    }
    Ok(bytes)
}

/// Writes encoded output bytes, creating parent directories as needed.
pub fn write_image_bytes(path: &Path, bytes: &[u8]) -> InpaintResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bytes)?;
    Ok(())
}

/// Loads an image from a file path and converts it to RgbImage.
pub fn load_image(path: &Path) -> InpaintResult<RgbImage> {
    let img = image::open(path)
        .map_err(|e| InpaintError::decode_error(path.display().to_string(), Some(e)))?;
    Ok(img.to_rgb8())
}

/// Picks the output container from a file extension.
///
/// `jpg` and `jpeg` map to JPEG and `png` to PNG (case-insensitive); anything else
/// returns `None` so the caller can fall back to its configured format.
pub fn output_format_for_path(path: &Path) -> Option<OutputFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some(OutputFormat::Png),
        "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use std::path::PathBuf;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("oar_inpaint_{name}_{}", std::process::id()))
    }

    #[test]
    fn test_output_format_from_extension() {
        assert_eq!(
            output_format_for_path(Path::new("out/result.PNG")),
            Some(OutputFormat::Png)
        );
        assert_eq!(
            output_format_for_path(Path::new("result.jpeg")),
            Some(OutputFormat::Jpeg)
        );
        assert_eq!(output_format_for_path(Path::new("result.bmp")), None);
        assert_eq!(output_format_for_path(Path::new("result")), None);
    }

    #[test]
    fn test_write_then_read_bytes() {
        let dir = scratch_dir("rw");
        let path = dir.join("nested").join("out.png");
        write_image_bytes(&path, &[1, 2, 3]).unwrap();
        assert_eq!(read_image_bytes(&path).unwrap(), vec![1, 2, 3]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_read_missing_and_empty_files() {
        let err = read_image_bytes(Path::new("definitely_missing_image.png")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);

        let dir = scratch_dir("empty");
        let path = dir.join("empty.png");
        write_image_bytes(&path, &[]).unwrap();
        let err = read_image_bytes(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        fs::remove_dir_all(&dir).unwrap();
    }
}

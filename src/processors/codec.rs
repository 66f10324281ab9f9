//! Encoded bytes to pixel buffers and back.

use super::types::{ColorRole, Image, OutputFormat};
use crate::core::constants::JPEG_QUALITY;
use crate::core::errors::{InpaintError, InpaintResult};
use image::ImageFormat;
use image::codecs::jpeg::JpegEncoder;
use std::io::Cursor;

/// Decodes PNG or JPEG bytes into an image of the requested role.
///
/// Color images are converted to RGB and masks to 8-bit grayscale, whatever the
/// encoded color type was.
pub fn decode(bytes: &[u8], role: ColorRole) -> InpaintResult<Image> {
    if bytes.is_empty() {
        return Err(InpaintError::decode_error("empty buffer", None));
    }
    let img = image::load_from_memory(bytes).map_err(|e| {
        InpaintError::decode_error(format!("{} bytes as {role:?} image", bytes.len()), Some(e))
    })?;
    let decoded = match role {
        ColorRole::Color => Image::Color(img.to_rgb8()),
        ColorRole::Gray => Image::Gray(img.to_luma8()),
    };
    if decoded.is_empty() {
        return Err(InpaintError::decode_error("decoded image has no pixels", None));
    }
    Ok(decoded)
}

/// Encodes an image into the given container format.
pub fn encode(image: Image, format: OutputFormat) -> InpaintResult<Vec<u8>> {
    let (width, height) = image.dimensions();
    let mut buffer = Vec::new();
    let result = match format {
        OutputFormat::Png => image
            .into_dynamic()
            .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png),
        OutputFormat::Jpeg => {
            let encoder = JpegEncoder::new_with_quality(&mut buffer, JPEG_QUALITY);
            image.into_dynamic().write_with_encoder(encoder)
        }
    };
    result.map_err(|e| {
        InpaintError::encode_error(format.as_str(), format!("{width}x{height} image"), Some(e))
    })?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::ErrorKind;
    use image::{GrayImage, Luma, Rgb, RgbImage};

    fn png_bytes(img: image::DynamicImage) -> Vec<u8> {
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    #[test]
    fn test_decode_converts_to_role() {
        let rgb = RgbImage::from_pixel(4, 3, Rgb([200, 100, 50]));
        let bytes = png_bytes(image::DynamicImage::ImageRgb8(rgb));

        let color = decode(&bytes, ColorRole::Color).unwrap();
        assert_eq!(color.channels(), 3);
        assert_eq!(color.dimensions(), (4, 3));

        let gray = decode(&bytes, ColorRole::Gray).unwrap();
        assert_eq!(gray.channels(), 1);
    }

    #[test]
    fn test_decode_rejects_empty_and_garbage() {
        assert_eq!(
            decode(&[], ColorRole::Color).unwrap_err().kind(),
            ErrorKind::Decode
        );
        assert_eq!(
            decode(b"definitely not an image", ColorRole::Gray)
                .unwrap_err()
                .kind(),
            ErrorKind::Decode
        );
    }

    #[test]
    fn test_png_encode_is_lossless() {
        let gray = GrayImage::from_fn(8, 8, |x, y| Luma([(x * 16 + y) as u8]));
        let bytes = encode(Image::Gray(gray.clone()), OutputFormat::Png).unwrap();
        assert_eq!(decode(&bytes, ColorRole::Gray).unwrap(), Image::Gray(gray));
    }

    #[test]
    fn test_jpeg_encode_produces_jpeg() {
        let rgb = RgbImage::from_pixel(16, 16, Rgb([10, 20, 30]));
        let bytes = encode(Image::Color(rgb), OutputFormat::Jpeg).unwrap();
        assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
        assert_eq!(
            image::guess_format(&bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }
}

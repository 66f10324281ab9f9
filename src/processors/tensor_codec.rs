//! Conversion between encoded images and model tensors.

use super::codec;
use super::mask::prepare_mask;
use super::normalization::{gray_to_tensor, rgb_to_tensor};
use super::postprocess::tensor_to_image;
use super::types::{ColorRole, Image, TargetSize};
use crate::core::Tensor4D;
use crate::core::config::CodecConfig;
use crate::core::errors::{InpaintError, InpaintResult};
use image::imageops::{self, FilterType};
use image::RgbImage;
use tracing::debug;

/// Turns encoded bytes into normalized NCHW tensors and model outputs back into bytes.
///
/// The codec holds only its configuration and can be shared freely between threads.
#[derive(Debug, Clone, Default)]
pub struct TensorCodec {
    config: CodecConfig,
}

impl TensorCodec {
    /// Creates a codec with the given configuration.
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    /// Returns the codec configuration.
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Decodes bytes as an image of the given role.
    pub fn decode(&self, bytes: &[u8], role: ColorRole) -> InpaintResult<Image> {
        codec::decode(bytes, role)
    }

    /// Encodes an image with the configured output format.
    pub fn encode(&self, image: Image) -> InpaintResult<Vec<u8>> {
        codec::encode(image, self.config.output_format)
    }

    /// Builds the image and mask tensors for a model with the given input size.
    ///
    /// Returns `(1, 3, H, W)` and `(1, 1, H, W)` tensors with values in [0, 1]. The
    /// mask is resized with nearest-neighbour sampling and binarized; the image is
    /// resized bilinearly.
    pub fn preprocess(
        &self,
        image: &Image,
        mask: &Image,
        target: TargetSize,
    ) -> InpaintResult<(Tensor4D, Tensor4D)> {
        let rgb = match image {
            Image::Color(rgb) => rgb,
            Image::Gray(_) => {
                return Err(InpaintError::shape_error(
                    "preprocess",
                    &[3],
                    &[image.channels()],
                    "image must have 3 channels",
                ));
            }
        };
        let gray = match mask {
            Image::Gray(gray) => gray,
            Image::Color(_) => {
                return Err(InpaintError::shape_error(
                    "preprocess",
                    &[1],
                    &[mask.channels()],
                    "mask must have 1 channel",
                ));
            }
        };
        if image.is_empty() || mask.is_empty() {
            return Err(InpaintError::invalid_argument("image and mask must not be empty"));
        }
        if target.area() == 0 {
            return Err(InpaintError::shape_error(
                "preprocess",
                &[1, 1],
                &[target.height as usize, target.width as usize],
                "target size must be positive",
            ));
        }

        debug!(
            image = ?rgb.dimensions(),
            mask = ?gray.dimensions(),
            %target,
            "preprocessing inputs"
        );

        let mask = prepare_mask(gray, target);
        let resized = resize_image(rgb, target);

        let image_tensor = rgb_to_tensor(
            &resized,
            self.config.channel_order,
            self.config.parallel_pixel_threshold,
        )?;
        let mask_tensor = gray_to_tensor(&mask)?;
        Ok((image_tensor, mask_tensor))
    }

    /// Converts one model output into an image.
    pub fn postprocess(&self, shape: &[usize], data: &[f32]) -> InpaintResult<Image> {
        tensor_to_image(
            shape,
            data,
            self.config.output_range,
            self.config.channel_order,
        )
    }

    /// Converts an owned output tensor into an image.
    pub fn postprocess_tensor(&self, tensor: &Tensor4D) -> InpaintResult<Image> {
        match tensor.as_slice() {
            Some(data) => self.postprocess(tensor.shape(), data),
            None => {
                let data: Vec<f32> = tensor.iter().copied().collect();
                self.postprocess(tensor.shape(), &data)
            }
        }
    }
}

fn resize_image(img: &RgbImage, target: TargetSize) -> RgbImage {
    if img.dimensions() == (target.width, target.height) {
        return img.clone();
    }
    imageops::resize(img, target.width, target.height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ChannelOrder, OutputFormat, OutputRange};
    use crate::core::errors::ErrorKind;
    use image::{GrayImage, Luma, Rgb};

    fn square_mask(size: u32, start: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(size, size, |x, y| {
            let inside = (start..start + side).contains(&x) && (start..start + side).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn test_preprocess_shapes_for_declared_target() {
        let codec = TensorCodec::default();
        let image = Image::Color(RgbImage::from_pixel(37, 21, Rgb([1, 2, 3])));
        let mask = Image::Gray(GrayImage::from_pixel(10, 10, Luma([200])));
        let (img, msk) = codec
            .preprocess(&image, &mask, TargetSize::new(64, 48))
            .unwrap();
        assert_eq!(img.shape(), &[1, 3, 48, 64]);
        assert_eq!(msk.shape(), &[1, 1, 48, 64]);
        assert!(img.iter().chain(msk.iter()).all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_preprocess_rejects_wrong_channel_counts() {
        let codec = TensorCodec::default();
        let gray = Image::Gray(GrayImage::new(4, 4));
        let color = Image::Color(RgbImage::new(4, 4));
        let target = TargetSize::new(4, 4);

        let err = codec.preprocess(&gray, &gray, target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);

        let err = codec.preprocess(&color, &color, target).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Shape);
    }

    #[test]
    fn test_upscaled_mask_square_stays_sharp() {
        let codec = TensorCodec::default();
        let image = Image::Color(RgbImage::from_pixel(256, 256, Rgb([120, 60, 30])));
        let mask = Image::Gray(square_mask(256, 96, 64));
        let (img, msk) = codec
            .preprocess(&image, &mask, TargetSize::new(512, 512))
            .unwrap();

        assert_eq!(img.shape(), &[1, 3, 512, 512]);
        assert_eq!(msk.shape(), &[1, 1, 512, 512]);
        assert!(img.iter().all(|&v| (0.0..=1.0).contains(&v)));

        let ones = msk.iter().filter(|&&v| (v - 1.0).abs() < 1e-6).count();
        let zeros = msk.iter().filter(|&&v| v == 0.0).count();
        assert_eq!(ones, 128 * 128);
        assert_eq!(ones + zeros, 512 * 512);

        assert!((msk[[0, 0, 192, 192]] - 1.0).abs() < 1e-6);
        assert!((msk[[0, 0, 319, 319]] - 1.0).abs() < 1e-6);
        assert_eq!(msk[[0, 0, 191, 256]], 0.0);
        assert_eq!(msk[[0, 0, 320, 256]], 0.0);
    }

    #[test]
    fn test_round_trip_through_bytes() {
        let codec = TensorCodec::new(CodecConfig::default().with_output_format(OutputFormat::Png));
        let tensor = Tensor4D::from_elem((1, 3, 8, 8), 0.5);
        let image = codec.postprocess_tensor(&tensor).unwrap();
        let bytes = codec.encode(image).unwrap();
        let decoded = codec.decode(&bytes, ColorRole::Color).unwrap();
        assert_eq!(decoded.dimensions(), (8, 8));
    }

    #[test]
    fn test_declared_scaled_range_is_respected() {
        let codec = TensorCodec::new(
            CodecConfig::default()
                .with_output_range(OutputRange::Scaled)
                .with_channel_order(ChannelOrder::Rgb),
        );
        let image = codec.postprocess(&[1, 3, 1, 1], &[1.0, 0.4, 0.0]).unwrap();
        match image {
            Image::Color(c) => assert_eq!(c.as_raw(), &vec![1, 0, 0]),
            other => panic!("unexpected image: {other:?}"),
        }
    }
}

//! Tensor codec configuration.

use crate::core::constants::DEFAULT_PARALLEL_PIXEL_THRESHOLD;
use serde::{Deserialize, Serialize};

/// Container format produced by the encoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG at maximum quality.
    Jpeg,
}

impl OutputFormat {
    /// Lowercase name used in logs and errors.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpeg",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(OutputFormat::Png),
            "jpg" | "jpeg" => Ok(OutputFormat::Jpeg),
            other => Err(format!("unsupported output format '{other}'")),
        }
    }
}

/// Value range of a model's color output tensor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputRange {
    /// Decide per tensor: values that all fall inside [0, 1] are scaled by 255.
    #[default]
    Auto,
    /// The model always emits values in [0, 1].
    Normalized,
    /// The model always emits values in [0, 255].
    Scaled,
}

/// Channel order a model expects on input and produces on output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Red, green, blue.
    #[default]
    Rgb,
    /// Blue, green, red.
    Bgr,
}

/// Settings for converting between encoded images and tensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    /// Format of encoded outputs.
    #[serde(default)]
    pub output_format: OutputFormat,
    /// How color outputs are denormalized.
    #[serde(default)]
    pub output_range: OutputRange,
    /// Channel convention of the model.
    #[serde(default)]
    pub channel_order: ChannelOrder,
    /// Images with more pixels than this are normalized on the rayon pool.
    #[serde(default = "CodecConfig::default_parallel_pixel_threshold")]
    pub parallel_pixel_threshold: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::default(),
            output_range: OutputRange::default(),
            channel_order: ChannelOrder::default(),
            parallel_pixel_threshold: Self::default_parallel_pixel_threshold(),
        }
    }
}

impl CodecConfig {
    /// Creates the default codec configuration.
    pub fn new() -> Self {
        Self::default()
    }

    fn default_parallel_pixel_threshold() -> usize {
        DEFAULT_PARALLEL_PIXEL_THRESHOLD
    }

    /// Sets the output format.
    pub fn with_output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Sets the output range contract.
    pub fn with_output_range(mut self, range: OutputRange) -> Self {
        self.output_range = range;
        self
    }

    /// Sets the model channel order.
    pub fn with_channel_order(mut self, order: ChannelOrder) -> Self {
        self.channel_order = order;
        self
    }

    /// Sets the pixel count above which normalization runs in parallel.
    pub fn with_parallel_pixel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_pixel_threshold = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("PNG".parse::<OutputFormat>(), Ok(OutputFormat::Png));
        assert_eq!("jpg".parse::<OutputFormat>(), Ok(OutputFormat::Jpeg));
        assert!("webp".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_codec_config_uses_lowercase_names() {
        let config: CodecConfig =
            serde_json::from_str(r#"{ "output_format": "jpeg", "channel_order": "bgr" }"#)
                .unwrap();
        assert_eq!(config.output_format, OutputFormat::Jpeg);
        assert_eq!(config.channel_order, ChannelOrder::Bgr);
        assert_eq!(config.output_range, OutputRange::Auto);
        assert_eq!(
            config.parallel_pixel_threshold,
            DEFAULT_PARALLEL_PIXEL_THRESHOLD
        );
    }
}

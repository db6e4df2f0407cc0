//! Label image preprocessing for OCR.

use image::{imageops, DynamicImage, GrayImage, Luma};
use tracing::debug;

use crate::error::RecognizerError;
use crate::models::config::OcrConfig;

/// Grayscale, denoise and binarize label photos before recognition.
#[derive(Debug, Clone)]
pub struct LabelPreprocessor {
    /// Gaussian blur sigma (0 disables denoising).
    denoise_sigma: f32,
    /// Neighbourhood size for the local mean.
    block_size: u32,
    /// Constant subtracted from the local mean.
    offset: i32,
}

impl LabelPreprocessor {
    /// Create a new preprocessor with default settings.
    pub fn new() -> Self {
        Self {
            denoise_sigma: 1.0,
            block_size: 31,
            offset: 10,
        }
    }

    /// Create a preprocessor from OCR settings.
    pub fn from_config(config: &OcrConfig) -> Self {
        Self::new()
            .with_denoise_sigma(config.denoise_sigma)
            .with_block_size(config.threshold_block)
            .with_offset(config.threshold_offset)
    }

    /// Set the blur sigma.
    pub fn with_denoise_sigma(mut self, sigma: f32) -> Self {
        self.denoise_sigma = sigma.max(0.0);
        self
    }

    /// Set the thresholding neighbourhood; even sizes are rounded up to odd.
    pub fn with_block_size(mut self, size: u32) -> Self {
        self.block_size = (size.max(3)) | 1;
        self
    }

    /// Set the thresholding offset.
    pub fn with_offset(mut self, offset: i32) -> Self {
        self.offset = offset;
        self
    }

    /// Produce a black-on-white binary image.
    pub fn prepare(&self, image: &DynamicImage) -> Result<DynamicImage, RecognizerError> {
        let gray = image.to_luma8();
        let (width, height) = gray.dimensions();
        if width == 0 || height == 0 {
            return Err(RecognizerError::Preprocessing(format!(
                "empty image {}x{}",
                width, height
            )));
        }
        debug!("Preprocessing {}x{} label image", width, height);

        let denoised = if self.denoise_sigma > 0.0 {
            imageops::blur(&gray, self.denoise_sigma)
        } else {
            gray
        };

        Ok(DynamicImage::ImageLuma8(self.adaptive_threshold(&denoised)))
    }

    /// Threshold each pixel against the mean of its neighbourhood.
    fn adaptive_threshold(&self, image: &GrayImage) -> GrayImage {
        let (width, height) = image.dimensions();
        let integral = IntegralImage::new(image);
        let half = self.block_size / 2;
        let mut result = GrayImage::new(width, height);

        for y in 0..height {
            let y0 = y.saturating_sub(half);
            let y1 = (y + half + 1).min(height);
            for x in 0..width {
                let x0 = x.saturating_sub(half);
                let x1 = (x + half + 1).min(width);

                let count = u64::from((x1 - x0) * (y1 - y0));
                let mean = (integral.sum(x0, y0, x1, y1) / count) as i32;
                let value = i32::from(image.get_pixel(x, y)[0]);

                let output = if value > mean - self.offset { 255 } else { 0 };
                result.put_pixel(x, y, Luma([output]));
            }
        }

        result
    }
}

impl Default for LabelPreprocessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Summed-area table with a zero row and column.
struct IntegralImage {
    stride: usize,
    sums: Vec<u64>,
}

impl IntegralImage {
    fn new(image: &GrayImage) -> Self {
        let (width, height) = image.dimensions();
        let stride = width as usize + 1;
        let mut sums = vec![0u64; stride * (height as usize + 1)];

        for y in 0..height as usize {
            let mut row_sum = 0u64;
            for x in 0..width as usize {
                row_sum += u64::from(image.get_pixel(x as u32, y as u32)[0]);
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }

        Self { stride, sums }
    }

    /// Sum over `[x0, x1) x [y0, y1)`.
    fn sum(&self, x0: u32, y0: u32, x1: u32, y1: u32) -> u64 {
        let at = |x: u32, y: u32| self.sums[y as usize * self.stride + x as usize];
        at(x1, y1) + at(x0, y0) - at(x0, y1) - at(x1, y0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn test_block_size_is_odd() {
        assert_eq!(LabelPreprocessor::new().with_block_size(30).block_size, 31);
        assert_eq!(LabelPreprocessor::new().with_block_size(1).block_size, 3);
    }

    #[test]
    fn test_integral_sum_matches_direct_sum() {
        let image = GrayImage::from_fn(5, 4, |x, y| Luma([(x * 10 + y) as u8]));
        let integral = IntegralImage::new(&image);

        let mut direct = 0u64;
        for y in 1..3 {
            for x in 2..5 {
                direct += u64::from(image.get_pixel(x, y)[0]);
            }
        }
        assert_eq!(integral.sum(2, 1, 5, 3), direct);
    }

    #[test]
    fn test_prepare_binarizes_dark_text() {
        let mut label = RgbImage::from_pixel(40, 20, Rgb([230, 230, 230]));
        for x in 10..30 {
            for y in 8..12 {
                label.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }

        let prepared = LabelPreprocessor::new()
            .with_denoise_sigma(0.0)
            .with_block_size(15)
            .prepare(&DynamicImage::ImageRgb8(label))
            .unwrap()
            .to_luma8();

        assert_eq!(prepared.dimensions(), (40, 20));
        assert!(prepared.pixels().all(|p| p[0] == 0 || p[0] == 255));
        assert_eq!(prepared.get_pixel(20, 10)[0], 0);
        assert_eq!(prepared.get_pixel(2, 2)[0], 255);
    }

    #[test]
    fn test_prepare_rejects_empty_image() {
        let result = LabelPreprocessor::new().prepare(&DynamicImage::new_luma8(0, 0));
        assert!(matches!(result, Err(RecognizerError::Preprocessing(_))));
    }
}

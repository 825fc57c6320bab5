use crate::utils::error::FaceError;
use crate::Result;
use axum::body::Bytes;
use image::{DynamicImage, ImageFormat};
use ndarray::Array3;

/// 单个图像文件的大小上限
const MAX_IMAGE_BYTES: usize = 50 * 1024 * 1024; // 50MB

pub struct ImageLoader;

impl ImageLoader {
    /// 从字节流加载图像
    pub fn from_bytes(bytes: &Bytes) -> Result<DynamicImage> {
        // 检查文件大小
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(FaceError::FileTooLarge(bytes.len(), MAX_IMAGE_BYTES));
        }

        let image = image::load_from_memory(bytes).map_err(FaceError::ImageDecode)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 验证图像格式是否支持
    pub fn is_supported_format(format: ImageFormat) -> bool {
        matches!(
            format,
            ImageFormat::Png
                | ImageFormat::Jpeg
                | ImageFormat::Bmp
                | ImageFormat::Tiff
                | ImageFormat::WebP
        )
    }

    /// 转换DynamicImage为ndarray::Array3<f32> (HWC格式, 0..255)
    pub fn to_array3(image: &DynamicImage) -> Array3<f32> {
        let rgb_image = image.to_rgb8();
        let (width, height) = rgb_image.dimensions();

        let mut array = Array3::<f32>::zeros((height as usize, width as usize, 3));

        for (x, y, pixel) in rgb_image.enumerate_pixels() {
            for c in 0..3 {
                array[[y as usize, x as usize, c]] = pixel[c] as f32;
            }
        }

        array
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::Cursor;

    fn encode_png(width: u32, height: u32, rgb: [u8; 3]) -> Bytes {
        let img = RgbImage::from_pixel(width, height, image::Rgb(rgb));
        let mut buffer = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buffer, ImageFormat::Png)
            .unwrap();
        Bytes::from(buffer.into_inner())
    }

    #[test]
    fn decodes_valid_png() {
        let bytes = encode_png(8, 6, [10, 20, 30]);
        let image = ImageLoader::from_bytes(&bytes).unwrap();
        assert_eq!(image.to_rgb8().dimensions(), (8, 6));
    }

    #[test]
    fn rejects_undecodable_bytes() {
        let bytes = Bytes::from_static(b"ten bytes!");
        match ImageLoader::from_bytes(&bytes) {
            Err(FaceError::ImageDecode(_)) => {}
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn to_array3_preserves_pixels_in_hwc_order() {
        let mut img = RgbImage::from_pixel(2, 2, image::Rgb([0, 0, 0]));
        img.put_pixel(1, 0, image::Rgb([255, 128, 1]));
        let array = ImageLoader::to_array3(&DynamicImage::ImageRgb8(img));

        assert_eq!(array.dim(), (2, 2, 3));
        assert_eq!(array[[0, 1, 0]], 255.0);
        assert_eq!(array[[0, 1, 1]], 128.0);
        assert_eq!(array[[0, 1, 2]], 1.0);
        assert_eq!(array[[1, 1, 0]], 0.0);
    }

    #[test]
    fn detects_png_format() {
        let bytes = encode_png(4, 4, [1, 2, 3]);
        let format = ImageLoader::detect_format(&bytes).unwrap();
        assert_eq!(format, ImageFormat::Png);
        assert!(ImageLoader::is_supported_format(format));
    }
}

use image::{imageops, DynamicImage, RgbImage};
use ndarray::Array3;

use crate::Result;

/// 模型输入边长
pub const INPUT_SIZE: u32 = 224;

/// CLIP视觉编码器的归一化常量
pub const CLIP_MEAN: [f32; 3] = [0.48145466, 0.4578275, 0.40821073];
pub const CLIP_STD: [f32; 3] = [0.26862954, 0.26130258, 0.27577711];

/// 推理端预处理：与训练时的验证变换保持一致
pub struct ImagePreprocessor;

impl ImagePreprocessor {
    /// 完整预处理流水线：RGB -> 短边缩放 -> 中心裁剪 -> [0,1] -> 标准化
    ///
    /// 输出为CHW布局的 (3, 224, 224) 张量。
    pub fn preprocess(image: &DynamicImage) -> Result<Array3<f32>> {
        let rgb = image.to_rgb8();
        let resized = Self::resize_shortest_side(&rgb, INPUT_SIZE);
        let cropped = Self::center_crop(&resized, INPUT_SIZE);
        Ok(Self::to_normalized_chw(&cropped))
    }

    /// 短边缩放到target，保持宽高比（双线性插值）
    fn resize_shortest_side(image: &RgbImage, target: u32) -> RgbImage {
        let (width, height) = image.dimensions();

        let (new_width, new_height) = if width <= height {
            let scaled = (height as f64 * target as f64 / width as f64).round() as u32;
            (target, scaled.max(target))
        } else {
            let scaled = (width as f64 * target as f64 / height as f64).round() as u32;
            (scaled.max(target), target)
        };

        imageops::resize(image, new_width, new_height, imageops::FilterType::Triangle)
    }

    /// 居中裁剪到 size x size
    fn center_crop(image: &RgbImage, size: u32) -> RgbImage {
        let (width, height) = image.dimensions();
        let x = (width - size) / 2;
        let y = (height - size) / 2;

        imageops::crop_imm(image, x, y, size, size).to_image()
    }

    /// 像素缩放到[0,1]后按通道标准化，HWC -> CHW
    fn to_normalized_chw(image: &RgbImage) -> Array3<f32> {
        let (width, height) = image.dimensions();
        let mut tensor = Array3::<f32>::zeros((3, height as usize, width as usize));

        for (x, y, pixel) in image.enumerate_pixels() {
            for c in 0..3 {
                let value = pixel[c] as f32 / 255.0;
                tensor[[c, y as usize, x as usize]] = (value - CLIP_MEAN[c]) / CLIP_STD[c];
            }
        }

        tensor
    }
}

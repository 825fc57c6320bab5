use ndarray::Array3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// 翻转方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlipCode {
    Horizontal,
    Vertical,
    Both,
}

/// 训练期数据增强变换集
///
/// 所有变换都作用于HWC布局、取值0..255的 `Array3<f32>`，
/// 彼此独立且可组合；推理路径不使用本模块。
pub struct ImageTransforms;

impl ImageTransforms {
    /// 翻转图像
    pub fn flip(image: &Array3<f32>, code: FlipCode) -> Array3<f32> {
        let (height, width, channels) = image.dim();
        let mut flipped = Array3::<f32>::zeros((height, width, channels));

        for h in 0..height {
            for w in 0..width {
                let (src_h, src_w) = match code {
                    FlipCode::Horizontal => (h, width - 1 - w),
                    FlipCode::Vertical => (height - 1 - h, w),
                    FlipCode::Both => (height - 1 - h, width - 1 - w),
                };
                for c in 0..channels {
                    flipped[[h, w, c]] = image[[src_h, src_w, c]];
                }
            }
        }

        flipped
    }

    /// 绕图像中心旋转（角度制），出界像素填0
    pub fn rotate(image: &Array3<f32>, angle_degrees: f32) -> Array3<f32> {
        let (height, width, channels) = image.dim();
        let mut rotated = Array3::<f32>::zeros((height, width, channels));

        let theta = angle_degrees.to_radians();
        let (sin, cos) = theta.sin_cos();
        let cx = width as f32 / 2.0;
        let cy = height as f32 / 2.0;

        for h in 0..height {
            for w in 0..width {
                // 反向映射：目标坐标旋转回源坐标
                let dx = w as f32 - cx;
                let dy = h as f32 - cy;
                let src_x = (cos * dx + sin * dy + cx).round() as i64;
                let src_y = (-sin * dx + cos * dy + cy).round() as i64;

                if src_x >= 0 && src_x < width as i64 && src_y >= 0 && src_y < height as i64 {
                    for c in 0..channels {
                        rotated[[h, w, c]] = image[[src_y as usize, src_x as usize, c]];
                    }
                }
            }
        }

        rotated
    }

    /// 平移图像，空出的像素填0
    pub fn shift(image: &Array3<f32>, shift_x: i32, shift_y: i32) -> Array3<f32> {
        let (height, width, channels) = image.dim();
        let mut shifted = Array3::<f32>::zeros((height, width, channels));

        for h in 0..height {
            for w in 0..width {
                let src_x = w as i64 - shift_x as i64;
                let src_y = h as i64 - shift_y as i64;

                if src_x >= 0 && src_x < width as i64 && src_y >= 0 && src_y < height as i64 {
                    for c in 0..channels {
                        shifted[[h, w, c]] = image[[src_y as usize, src_x as usize, c]];
                    }
                }
            }
        }

        shifted
    }

    /// 亮度调整：逐像素加上delta后截断到[0,255]
    pub fn adjust_brightness(image: &Array3<f32>, delta: f32) -> Array3<f32> {
        image.mapv(|v| (v + delta).clamp(0.0, 255.0))
    }

    /// 对比度调整：逐像素乘以factor后截断到[0,255]
    pub fn adjust_contrast(image: &Array3<f32>, factor: f32) -> Array3<f32> {
        image.mapv(|v| (v * factor).clamp(0.0, 255.0))
    }

    /// 叠加高斯噪声 N(0, std_dev^2)
    pub fn gaussian_noise(image: &Array3<f32>, std_dev: f32, rng: &mut StdRng) -> Array3<f32> {
        let normal = Normal::new(0.0f32, std_dev).expect("std_dev must be finite and non-negative");
        image.mapv(|v| (v + normal.sample(rng)).clamp(0.0, 255.0))
    }
}

/// 随机增强流水线：每个变换以50%概率独立触发
///
/// 参数范围沿用训练笔记：旋转±15度、平移±15像素、
/// 亮度±30、对比度0.7..1.3、噪声σ 5..20。
pub struct AugmentPipeline {
    rng: StdRng,
}

impl AugmentPipeline {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// 固定种子，便于复现
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn apply(&mut self, image: &Array3<f32>) -> Array3<f32> {
        let mut augmented = image.clone();

        // 几何增强
        if self.rng.gen_bool(0.5) {
            augmented = ImageTransforms::flip(&augmented, FlipCode::Horizontal);
        }
        if self.rng.gen_bool(0.5) {
            let angle = self.rng.gen_range(-15.0..15.0);
            augmented = ImageTransforms::rotate(&augmented, angle);
        }
        if self.rng.gen_bool(0.5) {
            let shift_x = self.rng.gen_range(-15..=15);
            let shift_y = self.rng.gen_range(-15..=15);
            augmented = ImageTransforms::shift(&augmented, shift_x, shift_y);
        }

        // 颜色增强
        if self.rng.gen_bool(0.5) {
            let delta = self.rng.gen_range(-30..=30) as f32;
            augmented = ImageTransforms::adjust_brightness(&augmented, delta);
        }
        if self.rng.gen_bool(0.5) {
            let factor = self.rng.gen_range(0.7..1.3);
            augmented = ImageTransforms::adjust_contrast(&augmented, factor);
        }
        if self.rng.gen_bool(0.5) {
            let std_dev = self.rng.gen_range(5.0..20.0);
            augmented = ImageTransforms::gaussian_noise(&augmented, std_dev, &mut self.rng);
        }

        augmented
    }
}

impl Default for AugmentPipeline {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(height: usize, width: usize) -> Array3<f32> {
        let mut image = Array3::<f32>::zeros((height, width, 3));
        for h in 0..height {
            for w in 0..width {
                for c in 0..3 {
                    image[[h, w, c]] = ((h * width + w + c) % 256) as f32;
                }
            }
        }
        image
    }

    #[test]
    fn double_horizontal_flip_is_identity() {
        let image = gradient(9, 13);
        let once = ImageTransforms::flip(&image, FlipCode::Horizontal);
        let twice = ImageTransforms::flip(&once, FlipCode::Horizontal);
        assert_eq!(image, twice);
    }

    #[test]
    fn both_flip_equals_two_axis_flips() {
        let image = gradient(6, 4);
        let both = ImageTransforms::flip(&image, FlipCode::Both);
        let sequential = ImageTransforms::flip(
            &ImageTransforms::flip(&image, FlipCode::Horizontal),
            FlipCode::Vertical,
        );
        assert_eq!(both, sequential);
    }

    #[test]
    fn shift_moves_pixels_and_zero_fills() {
        let image = gradient(5, 5);
        let shifted = ImageTransforms::shift(&image, 2, 1);

        assert_eq!(shifted[[1, 2, 0]], image[[0, 0, 0]]);
        // 空出的边缘被填0
        assert_eq!(shifted[[0, 0, 0]], 0.0);
        assert_eq!(shifted[[4, 1, 1]], 0.0);
    }

    #[test]
    fn zero_rotation_is_identity() {
        let image = gradient(8, 8);
        assert_eq!(ImageTransforms::rotate(&image, 0.0), image);
    }

    #[test]
    fn brightness_clamps_to_valid_range() {
        let image = gradient(4, 4);
        let bright = ImageTransforms::adjust_brightness(&image, 300.0);
        let dark = ImageTransforms::adjust_brightness(&image, -300.0);

        assert!(bright.iter().all(|&v| v == 255.0));
        assert!(dark.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn contrast_scales_pixels() {
        let image = Array3::<f32>::from_elem((3, 3, 3), 100.0);
        let adjusted = ImageTransforms::adjust_contrast(&image, 1.3);
        assert!(adjusted.iter().all(|&v| (v - 130.0).abs() < 1e-4));
    }

    #[test]
    fn gaussian_noise_stays_in_range() {
        let image = Array3::<f32>::from_elem((16, 16, 3), 128.0);
        let mut rng = StdRng::seed_from_u64(7);
        let noisy = ImageTransforms::gaussian_noise(&image, 20.0, &mut rng);

        assert!(noisy.iter().all(|&v| (0.0..=255.0).contains(&v)));
        // 噪声确实改变了图像
        assert_ne!(noisy, image);
    }

    #[test]
    fn seeded_pipeline_is_reproducible() {
        let image = gradient(20, 20);

        let a = AugmentPipeline::with_seed(42).apply(&image);
        let b = AugmentPipeline::with_seed(42).apply(&image);
        assert_eq!(a, b);

        assert_eq!(a.dim(), image.dim());
    }
}

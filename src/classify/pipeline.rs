use crate::{
    classify::Prediction,
    image::{ImageLoader, ImagePreprocessor},
    models::ModelManager,
    utils::error::FaceError,
    Result,
};
use axum::body::Bytes;
use std::time::Instant;

/// 分类流水线：解码 -> 预处理 -> 骨干 -> 分类头
///
/// 每个请求独立无状态，中途不重试；模型句柄由调用方显式传入。
pub struct ClassifyPipeline;

impl ClassifyPipeline {
    /// 对一份上传的图像字节做完整分类
    ///
    /// `declared_mime` 是客户端声明的内容类型，必须以 `image/` 开头；
    /// 声明缺失或不是图像类型、以及无法解码的字节都算客户端错误。
    pub fn classify(
        models: &ModelManager,
        bytes: &Bytes,
        declared_mime: Option<&str>,
    ) -> Result<Prediction> {
        let start_time = Instant::now();

        // 1. 校验声明的内容类型
        let mime = declared_mime.ok_or_else(|| {
            FaceError::InvalidInput("File must declare an image content type".to_string())
        })?;
        if !mime.starts_with("image/") {
            return Err(FaceError::InvalidInput(format!(
                "File must be an image, got content type '{mime}'"
            )));
        }

        // 2. 解码为像素网格
        let image = ImageLoader::from_bytes(bytes)?;
        tracing::debug!(
            "Decoded {}x{} image ({} bytes)",
            image.width(),
            image.height(),
            bytes.len()
        );

        // 3-4. 缩放、裁剪并标准化为 (3, 224, 224)
        let tensor = ImagePreprocessor::preprocess(&image)?;
        let preprocess_time = start_time.elapsed();

        // 5. 冻结骨干提特征
        let inference_start = Instant::now();
        let features = models.extract_features(&tensor)?;

        // 6. 分类头 -> 假脸概率
        let prob_fake = models.head_forward(&features)?;
        let inference_time = inference_start.elapsed();

        // 7. 导出标签与置信度
        let prediction = Prediction::from_prob_fake(prob_fake);

        tracing::debug!(
            "Classified as {} (prob_fake={:.6}, preprocess={:.3}ms, inference={:.3}ms)",
            prediction.label.as_str(),
            prediction.prob_fake,
            preprocess_time.as_secs_f64() * 1000.0,
            inference_time.as_secs_f64() * 1000.0,
        );

        Ok(prediction)
    }
}

use crate::models::{ClassifierHead, ClipBackbone, FeatureExtractor};
use crate::{Config, Result};
use ndarray::{Array1, Array3};
use std::sync::Arc;

/// 模型句柄：骨干网络 + 分类头
///
/// 在启动时构建一次，作为显式参数放进axum状态传给处理器；
/// 不使用任何进程级单例。加载后不可变，可被任意数量的并发请求读取。
pub struct ModelManager {
    backbone: Arc<dyn FeatureExtractor>,
    head: Arc<ClassifierHead>,
    config: Config,
}

impl ModelManager {
    /// 按配置加载全部模型，任何缺失都会在启动阶段失败
    pub fn load(config: Config) -> Result<Self> {
        tracing::info!("Loading models...");

        let backbone = Arc::new(ClipBackbone::new(&config)?);
        let head = Arc::new(ClassifierHead::from_file(&config.head_checkpoint_path())?);

        tracing::info!(
            "Models loaded: head expects {}-dim features",
            head.input_dim()
        );

        Ok(Self {
            backbone,
            head,
            config,
        })
    }

    /// 由现成组件组装（测试和自定义后端使用）
    pub fn from_parts(
        backbone: Arc<dyn FeatureExtractor>,
        head: Arc<ClassifierHead>,
        config: Config,
    ) -> Self {
        Self {
            backbone,
            head,
            config,
        }
    }

    /// 冻结骨干提特征，推理模式下无梯度
    pub fn extract_features(&self, pixels: &Array3<f32>) -> Result<Array1<f32>> {
        self.backbone.extract(pixels)
    }

    /// 分类头前向，输出假脸概率
    pub fn head_forward(&self, features: &Array1<f32>) -> Result<f32> {
        self.head.forward(features.view())
    }

    /// 获取配置引用
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 模型健康检查：跑一次零输入的完整前向
    pub fn health_check(&self) -> Result<()> {
        tracing::debug!("Performing model health check...");

        let probe = Array3::<f32>::zeros((3, 224, 224));
        let features = self.backbone.extract(&probe)?;
        let _ = self.head.forward(features.view())?;

        tracing::debug!("Model health check passed");
        Ok(())
    }

    /// 获取模型统计信息
    pub fn stats(&self) -> ModelStats {
        ModelStats {
            feature_dim: self.head.input_dim(),
            intra_threads: self.config.onnx_config.intra_threads,
            optimization_level: self.config.onnx_config.optimization_level,
        }
    }
}

/// 模型统计信息
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelStats {
    pub feature_dim: usize,
    pub intra_threads: usize,
    pub optimization_level: i32,
}

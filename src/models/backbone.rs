use crate::utils::error::FaceError;
use crate::{Config, Result};
use ndarray::{Array1, Array3, Axis};
use ort::{
    inputs,
    session::{builder::GraphOptimizationLevel, Session},
    value::Tensor,
};
use parking_lot::Mutex;
use std::sync::Arc;

/// 特征提取后端
///
/// 推理流水线只依赖这个接口；测试可以注入固定输出的桩实现。
pub trait FeatureExtractor: Send + Sync {
    /// 将预处理后的 (3, 224, 224) 张量编码为定长特征向量
    fn extract(&self, pixels: &Array3<f32>) -> Result<Array1<f32>>;
}

/// 冻结的CLIP视觉骨干网络（ONNX会话）
///
/// 权重在启动时加载一次，此后只读。会话用互斥锁串行化，
/// 对应同一计算设备上的隐式排队。
pub struct ClipBackbone {
    session: Arc<Mutex<Session>>,
    input_name: String,
    output_name: String, // 动态发现的输出名称
}

impl ClipBackbone {
    pub fn new(config: &Config) -> Result<Self> {
        let model_path = config.backbone_model_path();

        // 启动前置检查：缺失能力直接快速失败，不做任何运行时安装
        if !model_path.exists() {
            return Err(FaceError::ModelLoad(format!(
                "CLIP visual backbone not found: {} (export the ONNX graph first)",
                model_path.display()
            )));
        }

        tracing::info!("Loading backbone model from: {}", model_path.display());

        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.onnx_config.intra_threads)?
            .commit_from_file(&model_path)?;

        // 动态发现输入输出名称
        let input_name = if session.inputs.is_empty() {
            return Err(FaceError::ModelLoad(
                "Backbone model has no inputs".to_string(),
            ));
        } else {
            session.inputs[0].name.clone()
        };

        let output_name = if session.outputs.is_empty() {
            return Err(FaceError::ModelLoad(
                "Backbone model has no outputs".to_string(),
            ));
        } else {
            let output_name = session.outputs[0].name.clone();
            tracing::info!(
                "Backbone model io: input '{}', output '{}'",
                input_name,
                output_name
            );

            // 记录所有可用输出用于调试
            for (i, output) in session.outputs.iter().enumerate() {
                tracing::debug!("Backbone output[{}]: '{}'", i, output.name);
            }

            output_name
        };

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            output_name,
        })
    }
}

impl FeatureExtractor for ClipBackbone {
    fn extract(&self, pixels: &Array3<f32>) -> Result<Array1<f32>> {
        // 添加batch维度 -> [1, 3, H, W]
        let input_tensor = pixels.clone().insert_axis(Axis(0));
        let input_tensor = Tensor::from_array(input_tensor)?;

        let features = {
            let mut session = self.session.lock();
            let outputs = session.run(inputs![self.input_name.as_str() => input_tensor])?;

            match outputs.get(&self.output_name) {
                Some(output) => output.try_extract_array::<f32>()?.into_owned(),
                None => {
                    let available: Vec<String> = outputs.keys().map(|s| s.to_string()).collect();
                    return Err(FaceError::Inference(format!(
                        "Backbone output '{}' not found. Available outputs: {:?}",
                        self.output_name, available
                    )));
                }
            }
        };

        // 期望 [1, D]，压平成一维特征向量
        let flat: Vec<f32> = features.iter().copied().collect();
        if flat.is_empty() {
            return Err(FaceError::Inference(
                "Backbone produced an empty feature vector".to_string(),
            ));
        }

        Ok(Array1::from_vec(flat))
    }
}

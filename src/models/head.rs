use crate::utils::error::FaceError;
use crate::Result;
use ndarray::{Array1, Array2, ArrayView1};
use safetensors::tensor::TensorView;
use safetensors::{Dtype, SafeTensors};
use std::path::Path;

/// 检查点中各线性层的张量键名（PyTorch布局：weight为 (out, in)）
const LAYER_KEYS: [(&str, &str); 3] = [
    ("fc1.weight", "fc1.bias"),
    ("fc2.weight", "fc2.bias"),
    ("fc3.weight", "fc3.bias"),
];

/// 训练好的分类头：Linear -> ReLU -> Linear -> ReLU -> Linear -> sigmoid
///
/// Dropout只存在于训练期，推理端没有对应表示。
/// 输出为"假脸"概率标量。
#[derive(Debug)]
pub struct ClassifierHead {
    layers: Vec<(Array2<f32>, Array1<f32>)>,
}

impl ClassifierHead {
    /// 从safetensors检查点文件加载
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FaceError::Checkpoint(format!(
                "Head checkpoint not found: {}",
                path.display()
            )));
        }

        tracing::info!("Loading head checkpoint from: {}", path.display());

        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    /// 从safetensors字节内容加载并校验层形状
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let tensors = SafeTensors::deserialize(bytes)
            .map_err(|e| FaceError::Checkpoint(format!("Invalid safetensors data: {e}")))?;

        let mut layers = Vec::with_capacity(LAYER_KEYS.len());
        for (weight_key, bias_key) in LAYER_KEYS {
            let weight = load_matrix(&tensors, weight_key)?;
            let bias = load_vector(&tensors, bias_key)?;

            if weight.nrows() != bias.len() {
                return Err(FaceError::Checkpoint(format!(
                    "{weight_key} has {} output rows but {bias_key} has {} entries",
                    weight.nrows(),
                    bias.len()
                )));
            }

            layers.push((weight, bias));
        }

        // 层间维度必须衔接，最后一层输出单个标量
        for pair in layers.windows(2) {
            let (prev, _) = &pair[0];
            let (next, _) = &pair[1];
            if next.ncols() != prev.nrows() {
                return Err(FaceError::Checkpoint(format!(
                    "Layer shape chain broken: {}x{} followed by {}x{}",
                    prev.nrows(),
                    prev.ncols(),
                    next.nrows(),
                    next.ncols()
                )));
            }
        }
        let (last, _) = layers.last().expect("LAYER_KEYS is non-empty");
        if last.nrows() != 1 {
            return Err(FaceError::Checkpoint(format!(
                "Final layer must produce a single logit, got {} outputs",
                last.nrows()
            )));
        }

        let head = Self { layers };
        tracing::info!(
            "Head checkpoint loaded: input dim {}, hidden dims {:?}",
            head.input_dim(),
            head.layers[..head.layers.len() - 1]
                .iter()
                .map(|(w, _)| w.nrows())
                .collect::<Vec<_>>()
        );

        Ok(head)
    }

    /// 期望的特征向量长度
    pub fn input_dim(&self) -> usize {
        self.layers[0].0.ncols()
    }

    /// 前向传播：返回sigmoid后的假脸概率，取值(0,1)
    pub fn forward(&self, features: ArrayView1<f32>) -> Result<f32> {
        if features.len() != self.input_dim() {
            return Err(FaceError::Inference(format!(
                "Feature length mismatch: backbone produced {}, head expects {}",
                features.len(),
                self.input_dim()
            )));
        }

        let mut activation = features.to_owned();
        let last = self.layers.len() - 1;
        for (i, (weight, bias)) in self.layers.iter().enumerate() {
            activation = weight.dot(&activation) + bias;
            if i < last {
                activation.mapv_inplace(|v| v.max(0.0)); // ReLU
            }
        }

        Ok(sigmoid(activation[0]))
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn load_matrix(tensors: &SafeTensors, key: &str) -> Result<Array2<f32>> {
    let view = tensor_view(tensors, key)?;
    let shape = view.shape();
    if shape.len() != 2 {
        return Err(FaceError::Checkpoint(format!(
            "{key} must be 2-dimensional, got shape {shape:?}"
        )));
    }

    let data = tensor_data(&view, key)?;
    Array2::from_shape_vec((shape[0], shape[1]), data)
        .map_err(|e| FaceError::Checkpoint(format!("{key} shape mismatch: {e}")))
}

fn load_vector(tensors: &SafeTensors, key: &str) -> Result<Array1<f32>> {
    let view = tensor_view(tensors, key)?;
    let shape = view.shape();
    if shape.len() != 1 {
        return Err(FaceError::Checkpoint(format!(
            "{key} must be 1-dimensional, got shape {shape:?}"
        )));
    }

    Ok(Array1::from_vec(tensor_data(&view, key)?))
}

fn tensor_view<'a>(tensors: &'a SafeTensors, key: &str) -> Result<TensorView<'a>> {
    tensors
        .tensor(key)
        .map_err(|_| FaceError::Checkpoint(format!("Checkpoint is missing tensor '{key}'")))
}

/// safetensors按小端序存储f32
fn tensor_data(view: &TensorView<'_>, key: &str) -> Result<Vec<f32>> {
    if view.dtype() != Dtype::F32 {
        return Err(FaceError::Checkpoint(format!(
            "{key} must be f32, got {:?}",
            view.dtype()
        )));
    }

    Ok(view
        .data()
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

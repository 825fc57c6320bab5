use crate::{
    classify::{ClassifyPipeline, PredictionResponse},
    models::ModelManager,
    utils::error::FaceError,
    web::extractors::RequestId,
    Config, Result,
};
use axum::{
    body::Bytes,
    extract::{Multipart, State},
    response::Json,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;

/// 应用状态：配置 + 显式的模型句柄
///
/// 模型不挂在任何环境/全局对象上，依赖在处理器签名里可见。
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub models: Arc<ModelManager>,
}

/// Multipart文件上传处理器：POST /predict
pub async fn predict_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    mut multipart: Multipart,
) -> Result<Json<PredictionResponse>> {
    let start_time = Instant::now();

    tracing::info!("Processing predict request: request_id={}", request_id);

    let mut upload: Option<(Bytes, Option<String>)> = None;

    // 解析multipart数据
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        FaceError::InvalidInput(format!("Failed to read multipart field: {e}"))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();

        match field_name.as_str() {
            "file" => {
                // 客户端声明的内容类型在流水线里校验
                let content_type = field.content_type().map(|s| s.to_string());

                let data = field.bytes().await.map_err(|e| {
                    FaceError::InvalidInput(format!("Failed to read file data: {e}"))
                })?;

                if data.is_empty() {
                    return Err(FaceError::InvalidInput("Empty file".to_string()));
                }

                tracing::debug!("Received file: {} bytes", data.len());
                upload = Some((data, content_type));
            }
            _ => {
                tracing::debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    // 验证必需的图像数据
    let (data, content_type) =
        upload.ok_or_else(|| FaceError::InvalidInput("No image file provided".to_string()))?;

    // 执行分类流水线
    let prediction = ClassifyPipeline::classify(&state.models, &data, content_type.as_deref())?;

    let processing_time = start_time.elapsed();

    tracing::info!(
        "Predict completed: request_id={}, class={}, confidence={:.6}, time={:.3}s",
        request_id,
        prediction.label.as_str(),
        prediction.confidence,
        processing_time.as_secs_f32()
    );

    Ok(Json(prediction.to_response()))
}

/// 健康检查端点
pub async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state
        .models
        .health_check()
        .map_err(|e| FaceError::ModelLoad(format!("Model health check failed: {e}")))?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.models.stats();

    Json(json!({
        "service": "facecheck",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "labels": { "0": "Real", "1": "Fake" }
    }))
}

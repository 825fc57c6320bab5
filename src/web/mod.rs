pub mod extractors;
pub mod handlers;
pub mod middleware;

use crate::{models::ModelManager, Config, Result};
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer};

pub use handlers::AppState;

pub async fn serve(config: Config) -> Result<()> {
    // 启动时加载一次模型；失败则进程不开始监听
    let models = Arc::new(ModelManager::load(config.clone())?);

    // 构建应用路由
    let app = create_app(config.clone(), models);

    // 解析绑定地址
    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        crate::utils::error::FaceError::Config(format!(
            "Invalid bind address {}: {}",
            config.bind_addr, e
        ))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  POST /predict   - Multipart image upload");
    tracing::info!("  GET  /health    - Health check");
    tracing::info!("  GET  /api/info  - Service information");

    // 启动服务器
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        crate::utils::error::FaceError::Internal(format!("Failed to bind to address {addr}: {e}"))
    })?;

    axum::serve(listener, app).await.map_err(|e| {
        crate::utils::error::FaceError::Internal(format!("Server failed to start: {e}"))
    })?;

    Ok(())
}

/// 组装路由与中间件；测试可注入自定义的模型句柄
pub fn create_app(config: Config, models: Arc<ModelManager>) -> Router {
    let state = AppState {
        config: config.clone(),
        models,
    };

    Router::new()
        // 推理API路由
        .route("/predict", post(handlers::predict_handler))
        // 系统路由
        .route("/health", get(handlers::health_handler))
        .route("/api/info", get(handlers::info_handler))
        // 中间件 - 分层模式避免复杂类型嵌套
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .layer(RequestBodyLimitLayer::new(
            config.server_config.max_request_size,
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server_config.request_timeout,
        )))
        .layer(CorsLayer::permissive())
        // 传递状态到处理器
        .with_state(state)
}

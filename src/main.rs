use sales_dashboard_rust::{
    create_client, router, AppConfig, AppState, AuthGate, DashboardService, RemoteApi, RequestCache,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{fmt::time::ChronoLocal, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_level(true)
        .init();

    // 加载配置
    let config = AppConfig::from_env();
    info!("Starting server with config: {:?}", config);

    // 远端报表接口
    let client = create_client(&config.backend)?;
    let cache = Arc::new(RequestCache::new());
    let api = RemoteApi::new(client, &config.backend.base_url, cache).with_ttl(
        config.cache.reference_ttl_secs.map(Duration::from_secs),
        config.cache.records_ttl_secs.map(Duration::from_secs),
    );
    info!("Reporting backend: {}", api.base_url());

    let auth = Arc::new(AuthGate::from_config(&config.auth));
    if auth.is_authenticated()? {
        info!("Restored saved session token");
    }

    let dashboard = Arc::new(DashboardService::new(api, config.dashboard.clone()));
    let app = router(AppState { dashboard, auth });

    // 启动服务器
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!("Server listening on {}", addr);
    info!("API Endpoints:");
    info!("  POST /api/login            - 登录");
    info!("  GET  /api/sales            - 销售看板");
    info!("  GET  /api/inventory        - 库存看板");
    info!("  GET  /api/sales/export     - 销售导出");
    info!("  GET  /api/inventory/export - 库存导出");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

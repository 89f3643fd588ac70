//! HTTP server bootstrap

use axum::Router;
use tokio_util::sync::CancellationToken;
use tower::limit::GlobalConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::cors::Any;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::api::handlers::AppState;
use crate::api::routes;
use crate::app::BoardRag;
use crate::Result;

/// Requests handled at once; each `/ask` holds model and database calls open
const MAX_CONCURRENT_REQUESTS: usize = 64;

/// Start the API server and run until `shutdown` fires
pub async fn serve_api(
    app: &BoardRag,
    host: &str,
    port: u16,
    enable_cors: bool,
    shutdown: CancellationToken,
) -> Result<()> {
    info!("Starting BoardRag API server...");

    let state = AppState {
        store: app.database().clone(),
        rag_service: app.rag_service(),
    };

    let mut router: Router = routes::app_router(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(GlobalConcurrencyLimitLayer::new(MAX_CONCURRENT_REQUESTS)),
        );

    if enable_cors {
        info!("CORS enabled");
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        router = router.layer(cors);
    }

    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("API server listening on http://{}", addr);
    info!("Available endpoints:");
    info!("  GET  /api/health  - Health check");
    info!("  GET  /api/status  - Index status");
    info!("  POST /api/ask     - Streamed question answering (SSE)");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;

    info!("API server stopped");
    Ok(())
}

//! API server handler

use tokio_util::sync::CancellationToken;

use crate::api::serve_api;
use crate::app::BoardRag;
use crate::Result;

pub async fn handle_serve_api(
    app: &BoardRag,
    host: Option<String>,
    port: Option<u16>,
    cors: bool,
    shutdown: CancellationToken,
) -> Result<()> {
    let host = host.unwrap_or_else(|| app.config().api.host.clone());
    let port = port.unwrap_or(app.config().api.port);
    let cors = cors || app.config().api.enable_cors;

    println!("🚀 Starting BoardRAG API Server");
    println!("===============================\n");
    println!("📍 Host: {host}");
    println!("🔌 Port: {port}");
    println!("🌐 CORS: {}", if cors { "Enabled" } else { "Disabled" });
    println!();

    serve_api(app, &host, port, cors, shutdown).await
}

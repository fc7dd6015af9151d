//! Health check endpoint for the hosting platform

use axum::{routing::get, Router};

/// Paths answered with `ok`
pub const HEALTH_PATHS: [&str; 3] = ["/", "/health", "/healthz"];

async fn health_handler() -> &'static str {
    "ok"
}

/// Create the health check router
pub fn create_health_router() -> Router {
    HEALTH_PATHS
        .iter()
        .fold(Router::new(), |router, path| router.route(path, get(health_handler)))
}

/// Start the health check server
pub async fn start_health_server(port: u16) -> anyhow::Result<()> {
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Health check server listening on {} (paths: {})", addr, HEALTH_PATHS.join(","));
    axum::serve(listener, create_health_router()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_handler() {
        assert_eq!(health_handler().await, "ok");
    }
}

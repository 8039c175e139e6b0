use std::{future::Future, net::SocketAddr};

use axum::Router;
use common::utils::logging::init_logging_from_env;
use configs::AppConfig;
use dotenvy::dotenv;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::auth::AuthConfig;

use crate::auth::ServerState;
use crate::routes;

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn bind_addr(cfg: &AppConfig) -> anyhow::Result<SocketAddr> {
    Ok(format!("{}:{}", cfg.server.host, cfg.server.port).parse()?)
}

/// Connect, migrate, seed the admin account when configured and build the router.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let db = models::db::connect_with_config(&cfg.database).await?;
    models::db::migrate(&db).await?;

    if cfg.auth.jwt_secret.is_none() {
        warn!(
            event = "jwt_secret_missing",
            "no JWT secret configured; tokens will not be issued and protected routes answer 401"
        );
    }
    let state = ServerState::new(db, AuthConfig::from_settings(&cfg.auth));

    if let Some((email, password)) = cfg.auth.admin_seed() {
        state.auth.ensure_admin(email, password).await?;
    }

    Ok(routes::build_router(state, build_cors()))
}

/// Public entry: load configuration and serve until the process is stopped.
pub async fn run() -> anyhow::Result<()> {
    run_until(std::future::pending()).await
}

/// Serve until `shutdown` resolves, then drain in-flight requests.
pub async fn run_until<F>(shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    dotenv().ok();
    init_logging_from_env();

    let cfg = AppConfig::load_and_validate()?;
    let app = build_app(&cfg).await?;

    let addr = bind_addr(&cfg)?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, event = "listening", "fixit marketplace api listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown).await?;
    info!(event = "drained", "server stopped accepting connections");
    Ok(())
}

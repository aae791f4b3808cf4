use axum::{middleware, routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::jwt_auth_middleware;

pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(auth_public_routes())
        // Protected API
        .merge(protected_routes())
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new().route("/auth/login", post(auth::login_post))
}

fn protected_routes() -> Router {
    use axum::routing::put;
    use handlers::protected::{analytics, auth, residents, users};

    Router::new()
        .route("/api/auth/whoami", get(auth::whoami_get))
        // Residents
        .route("/api/residents", get(residents::residents_list))
        .route("/api/residents/export", get(residents::residents_export))
        .route(
            "/api/residents/:id",
            get(residents::resident_get).put(residents::resident_put),
        )
        // Analytics
        .route("/api/analytics/summary", get(analytics::analytics_summary))
        // Account management
        .route(
            "/api/users",
            get(users::users_list).post(users::users_create),
        )
        .route(
            "/api/users/:id",
            put(users::users_update).delete(users::users_delete),
        )
        .layer(middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Chittoor Health Registry API",
            "version": version,
            "description": "District health registry backend - role-scoped resident data collection",
            "endpoints": {
                "home": "/ (public)",
                "login": "/auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "residents": "/api/residents[/:id] (protected)",
                "export": "/api/residents/export (protected)",
                "analytics": "/api/analytics/summary (protected)",
                "users": "/api/users[/:id] (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}

/// Binds and serves the API until the process exits.
pub async fn serve(port: u16) -> anyhow::Result<()> {
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Health registry API listening on http://{}", bind_addr);
    axum::serve(listener, app()).await?;
    Ok(())
}

pub fn port_from_env() -> u16 {
    std::env::var("API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000)
}

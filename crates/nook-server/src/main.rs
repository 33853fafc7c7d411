use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Json, Router, middleware,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use nook_api::auth::{self, AppState, AppStateInner};
use nook_api::middleware::require_auth;
use nook_api::notes;
use nook_api::tasks;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nook=debug,tower_http=debug".into()),
        )
        .init();

    // Config
    let jwt_secret =
        std::env::var("NOOK_JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".into());
    let db_path = std::env::var("NOOK_DB_PATH").unwrap_or_else(|_| "nook.db".into());
    let host = std::env::var("NOOK_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("NOOK_PORT")
        .unwrap_or_else(|_| "3000".into())
        .parse()?;
    let token_expiry_minutes: i64 = std::env::var("NOOK_TOKEN_EXPIRY_MINUTES")
        .unwrap_or_else(|_| "120".into())
        .parse()?;

    // Init database
    let db = nook_db::Database::open(&PathBuf::from(&db_path))?;

    // Seed the configured admin account, if any
    if let (Ok(admin_email), Ok(admin_password)) = (
        std::env::var("NOOK_ADMIN_EMAIL"),
        std::env::var("NOOK_ADMIN_PASSWORD"),
    ) {
        auth::seed_admin(&db, &admin_email, &admin_password)?;
    }

    // Shared state
    let state: AppState = Arc::new(AppStateInner {
        db,
        jwt_secret,
        token_expiry_minutes,
    });

    // Routes
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let protected_routes = Router::new()
        .route("/users/me", get(auth::me))
        .route("/tasks", post(tasks::create_task))
        .route("/tasks", get(tasks::list_tasks))
        .route("/tasks/{task_id}", patch(tasks::update_task))
        .route("/tasks/{task_id}", delete(tasks::delete_task))
        .route("/notes", post(notes::create_note))
        .route("/notes", get(notes::list_notes))
        .route("/notes/{note_id}", get(notes::get_note))
        .route("/notes/{note_id}", patch(notes::update_note))
        .route("/notes/{note_id}", delete(notes::delete_note))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    let app = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Nook server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "nook"
    }))
}

//! Web server: application state, routing, and error mapping.

pub mod auth_handlers;
pub mod render;
pub mod task_handlers;
pub mod templates;

use crate::config::Config;
use crate::db::Database;
use crate::error::{AppError, ErrorCode};
use axum::Router;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared state for all handlers.
#[derive(Clone)]
pub struct AppState {
    db: Database,
    config: Arc<Config>,
}

impl AppState {
    pub fn new(db: Database, config: Arc<Config>) -> Self {
        Self { db, config }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn page_size(&self) -> i64 {
        self.config.server.page_size
    }

    pub fn session_ttl_hours(&self) -> i64 {
        self.config.server.session_ttl_hours
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self.code {
            ErrorCode::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorCode::UsernameTaken => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details go to the log, not the page.
        let message = if status.is_server_error() {
            error!(code = ?self.code, "request failed: {}", self.message);
            "Something went wrong, please try again later".to_string()
        } else {
            self.message
        };

        (
            status,
            render::page("Error", None, &render::error_message(&message)),
        )
            .into_response()
    }
}

/// Build the router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Page routes
        .route("/", get(task_handlers::root))
        .route(
            "/user/login",
            get(auth_handlers::login_page).post(auth_handlers::login_submit),
        )
        .route(
            "/user/signup",
            get(auth_handlers::signup_page).post(auth_handlers::signup_submit),
        )
        .route("/user/logout", post(auth_handlers::logout))
        .route("/tasks", get(task_handlers::tasks_page))
        .route("/tasks/completed", get(task_handlers::completed_page))
        .route("/tasks/all", get(task_handlers::all_tasks_page))
        .route(
            "/tasks/new",
            get(task_handlers::new_task_page).post(task_handlers::create_task_submit),
        )
        .route("/tasks/{task_id}", get(task_handlers::task_detail_page))
        .route(
            "/tasks/{task_id}/edit",
            get(task_handlers::edit_task_page).post(task_handlers::update_task_submit),
        )
        .route(
            "/tasks/{task_id}/complete",
            post(task_handlers::complete_task_submit),
        )
        .route(
            "/tasks/{task_id}/delete",
            post(task_handlers::delete_task_submit),
        )
        // API routes
        .route("/api/health", get(task_handlers::health))
        // Add middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: AppState, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tower_sessions::{MemoryStore, SessionManagerLayer};

use crate::handlers;
use crate::middleware::auth_layer;
use crate::state::AppState;

pub mod health;

/// API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub code: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: true,
            message: "success".to_string(),
            data: Some(data),
        }
    }

    /// Success with a user-facing status message
    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: Some(data),
        }
    }

    pub fn error(_code: i32, message: impl Into<String>) -> Self {
        Self {
            code: false,
            message: message.into(),
            data: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn success_msg(message: impl Into<String>) -> Self {
        Self {
            code: true,
            message: message.into(),
            data: None,
        }
    }
}

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // Session store (in-memory for now)
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false) // Set to true in production with HTTPS
        .with_http_only(true);

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes
    let api_routes = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Auth routes
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/logout", post(handlers::auth::logout))
        .route("/user/current", get(handlers::auth::current_user))
        // Department routes
        .route("/department", get(handlers::department::list_departments))
        .route(
            "/department_add",
            get(handlers::department::department_form).post(handlers::department::add_department),
        )
        .route(
            "/department/edit/:id",
            get(handlers::department::edit_department_form)
                .post(handlers::department::edit_department),
        )
        .route(
            "/department/delete/:id",
            get(handlers::department::delete_department)
                .post(handlers::department::delete_department),
        )
        // Role routes
        .route("/roles", get(handlers::role::list_roles))
        .route(
            "/roles/add",
            get(handlers::role::role_form).post(handlers::role::add_role),
        )
        .route(
            "/roles/edit/:id",
            get(handlers::role::edit_role_form).post(handlers::role::edit_role),
        )
        .route(
            "/roles/delete/:id",
            get(handlers::role::delete_role).post(handlers::role::delete_role),
        )
        // Employee routes
        .route("/employees", get(handlers::employee::list_employees))
        .route(
            "/employees/assign/:id",
            get(handlers::employee::assign_employee_form)
                .post(handlers::employee::assign_employee),
        );

    // Static file service for frontend
    // Serves files from webapp/dist, falls back to index.html for SPA routing
    let static_dir = "webapp/dist";
    let index_file = format!("{}/index.html", static_dir);
    let serve_dir = ServeDir::new(static_dir).not_found_service(ServeFile::new(&index_file));

    Router::new()
        .nest("/api", api_routes)
        .fallback_service(serve_dir)
        .layer(middleware::from_fn_with_state(state.clone(), auth_layer))
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

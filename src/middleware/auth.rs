//! Authentication middleware
//!
//! Provides session-based authentication for API routes

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde_json::json;
use std::ops::Deref;
use tower_sessions::Session;

use crate::entity::employee;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Session key for storing the username
pub const SESSION_USER_KEY: &str = "user";
pub const SESSION_TIMESTAMP_KEY: &str = "timestamp";

/// Database connection wrapper for use in handlers via Extension
#[derive(Clone)]
pub struct DbConn(pub DatabaseConnection);

impl Deref for DbConn {
    type Target = DatabaseConnection;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The acting principal, resolved once per request and passed to every
/// handler through request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
    pub department_id: Option<i64>,
    pub role_id: Option<i64>,
}

impl CurrentUser {
    /// Guard for privileged operations. Every admin handler calls this
    /// before touching the store.
    pub fn require_admin(&self) -> AppResult<()> {
        if self.is_admin {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl From<employee::Model> for CurrentUser {
    fn from(m: employee::Model) -> Self {
        Self {
            id: m.id,
            username: m.username,
            email: m.email,
            first_name: m.first_name,
            last_name: m.last_name,
            is_admin: m.is_admin,
            department_id: m.department_id,
            role_id: m.role_id,
        }
    }
}

/// Paths that don't require authentication
fn is_public_path(path: &str) -> bool {
    // Only authenticate API routes; everything else is static files
    if !path.starts_with("/api") {
        return true;
    }

    // Public API endpoints
    if path == "/api/login" || path == "/api/register" {
        return true;
    }
    // Health check
    if path == "/api/health" {
        return true;
    }
    false
}

/// Authentication middleware
pub async fn auth_layer(
    State(state): State<AppState>,
    session: Session,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    // Make the database connection available to all handlers via
    // Extension<DbConn>
    request.extensions_mut().insert(DbConn(state.db.clone()));

    // Skip auth for public paths
    if is_public_path(&path) {
        return next.run(request).await;
    }

    // Get username from session
    let username: Option<String> = session.get(SESSION_USER_KEY).await.unwrap_or(None);

    let Some(username) = username else {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "unauthorized"})),
        )
            .into_response();
    };

    // Look up the employee in the database
    let employee_result = employee::Entity::find()
        .filter(employee::Column::Username.eq(&username))
        .one(&state.db)
        .await;

    match employee_result {
        Ok(Some(model)) => {
            request.extensions_mut().insert(CurrentUser::from(model));
            next.run(request).await
        }
        Ok(None) => {
            tracing::warn!("Employee not found in database: {}", username);
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "invalid_session"})),
            )
                .into_response()
        }
        Err(e) => {
            tracing::error!("Database error during auth: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "internal error"})),
            )
                .into_response()
        }
    }
}

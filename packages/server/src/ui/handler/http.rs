//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    infrastructure::dto::http::RoomStateDto,
    ui::{middleware::auth::AUTH_COOKIE, state::AppState},
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Current members of the room
pub async fn room_state(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RoomStateDto>, StatusCode> {
    match state.room.members().await {
        Ok(members) => Ok(Json(RoomStateDto::from(members))),
        Err(e) => {
            tracing::error!("cannot read room state: {}", e);
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub name: Option<String>,
}

/// Sign-in step: hands out the auth cookie for a display name and sends the
/// browser back to `/`.
pub async fn login(Query(query): Query<LoginQuery>) -> Response {
    let Some(name) = query.name.as_deref().and_then(valid_name) else {
        return (
            StatusCode::BAD_REQUEST,
            "name must be 1-32 characters of [A-Za-z0-9_-]",
        )
            .into_response();
    };

    tracing::info!(name = %name, "signed in");
    let cookie = format!("{AUTH_COOKIE}={name}; Path=/; HttpOnly; SameSite=Lax");
    ([(header::SET_COOKIE, cookie)], Redirect::to("/")).into_response()
}

fn valid_name(name: &str) -> Option<&str> {
    let name = name.trim();
    let ok = !name.is_empty()
        && name.len() <= 32
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    ok.then_some(name)
}

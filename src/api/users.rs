//! User endpoints, projected through the `UserShow` group.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use crate::api::{blank, deleted, respond, written};
use crate::domain::{User, UserInput, USER_SHOW};
use crate::hateoas::paginate;
use crate::http::error::ApiError;
use crate::http::request::{parse_id, parse_page_number, CurrentUser};
use crate::http::server::AppState;

/// Role given to every registered user.
const DEFAULT_ROLE: &str = "ROLE_USER";

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = payload?;
    if let Some(field) = input.blank_field() {
        return Err(blank(field));
    }
    ensure_unique(&state, &input, None)?;

    let user = state.catalog.users.insert_with(|id| User {
        id,
        email: input.email,
        username: input.username,
        roles: vec![DEFAULT_ROLE.to_string()],
    });
    tracing::info!(user_id = user.id, "User registered");
    written(StatusCode::CREATED, &user, &USER_SHOW)
}

pub async fn show_all(
    State(state): State<AppState>,
    Path(page): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let page_number = parse_page_number(&page)?;
    let page = paginate(state.catalog.users.list(), state.page_size, page_number);
    respond(&state, &headers, &page, &USER_SHOW)
}

/// The caller's own clients, in the `UserShow` projection.
pub async fn show_clients(
    State(state): State<AppState>,
    Path(page): Path<String>,
    caller: CurrentUser,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let user = caller.require()?;
    let page_number = parse_page_number(&page)?;
    let clients = state.catalog.clients.list_where(|c| c.user == user);
    let page = paginate(clients, state.page_size, page_number);
    respond(&state, &headers, &page, &USER_SHOW)
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let user = state.catalog.users.find(id).ok_or_else(|| not_found(id))?;
    respond(&state, &headers, &user, &USER_SHOW)
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    if let Some(field) = input.blank_field() {
        return Err(blank(field));
    }
    if state.catalog.users.find(id).is_none() {
        return Err(not_found(id));
    }
    ensure_unique(&state, &input, Some(id))?;

    let user = state
        .catalog
        .users
        .update(id, |user| {
            user.email = input.email;
            user.username = input.username;
        })
        .ok_or_else(|| not_found(id))?;
    tracing::info!(user_id = id, "User updated");
    written(StatusCode::OK, &user, &USER_SHOW)
}

/// Delete a user together with the clients they own.
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    state.catalog.users.remove(id).ok_or_else(|| not_found(id))?;
    let clients = state.catalog.clients.remove_where(|c| c.user == id);
    tracing::info!(user_id = id, clients_removed = clients, "User deleted");
    Ok(deleted())
}

/// Reject an email or username already held by another user.
fn ensure_unique(state: &AppState, input: &UserInput, except: Option<u64>) -> Result<(), ApiError> {
    let taken = state.catalog.users.list_where(|u| {
        Some(u.id) != except && (u.email == input.email || u.username == input.username)
    });
    if taken.is_empty() {
        Ok(())
    } else {
        Err(ApiError::InvalidRequest("email or username already registered".into()))
    }
}

fn not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("user {id} not found"))
}

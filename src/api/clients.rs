//! Client endpoints, projected through the `ClientShow` group.
//!
//! Clients are owned by the user that created them. Listing is scoped to
//! the caller when `X-User-Id` is present.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use crate::api::{blank, deleted, respond, written};
use crate::domain::{Client, ClientInput, CLIENT_SHOW};
use crate::hateoas::paginate;
use crate::http::error::ApiError;
use crate::http::request::{parse_id, parse_page_number, CurrentUser};
use crate::http::server::AppState;

pub async fn show_all(
    State(state): State<AppState>,
    Path(page): Path<String>,
    caller: CurrentUser,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let page_number = parse_page_number(&page)?;
    let clients = match caller.0 {
        Some(user) => state.catalog.clients.list_where(|c| c.user == user),
        None => state.catalog.clients.list(),
    };
    let page = paginate(clients, state.page_size, page_number);
    respond(&state, &headers, &page, &CLIENT_SHOW)
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let client = state.catalog.clients.find(id).ok_or_else(|| not_found(id))?;
    respond(&state, &headers, &client, &CLIENT_SHOW)
}

pub async fn create(
    State(state): State<AppState>,
    caller: CurrentUser,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let owner = caller.require()?;
    if state.catalog.users.find(owner).is_none() {
        return Err(ApiError::Unauthorized(format!("unknown user {owner}")));
    }
    let Json(input) = payload?;
    if let Some(field) = input.blank_field() {
        return Err(blank(field));
    }

    let client = state.catalog.clients.insert_with(|id| Client {
        id,
        name: input.name,
        email: input.email,
        user: owner,
    });
    tracing::info!(client_id = client.id, user_id = owner, "Client created");
    written(StatusCode::CREATED, &client, &CLIENT_SHOW)
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ClientInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    if let Some(field) = input.blank_field() {
        return Err(blank(field));
    }

    let client = state
        .catalog
        .clients
        .update(id, |client| {
            client.name = input.name;
            client.email = input.email;
        })
        .ok_or_else(|| not_found(id))?;
    tracing::info!(client_id = id, "Client updated");
    written(StatusCode::OK, &client, &CLIENT_SHOW)
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    state.catalog.clients.remove(id).ok_or_else(|| not_found(id))?;
    tracing::info!(client_id = id, "Client deleted");
    Ok(deleted())
}

fn not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("client {id} not found"))
}

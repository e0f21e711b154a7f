//! Product endpoints, projected through the `default` group.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};

use crate::api::{blank, deleted, respond, written};
use crate::domain::{ProductInput, PRODUCT_DEFAULT};
use crate::hateoas::paginate;
use crate::http::error::ApiError;
use crate::http::request::{parse_id, parse_page_number};
use crate::http::server::AppState;

pub async fn show_all(
    State(state): State<AppState>,
    Path(page): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let page_number = parse_page_number(&page)?;
    let page = paginate(state.catalog.products.list(), state.page_size, page_number);
    respond(&state, &headers, &page, &PRODUCT_DEFAULT)
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let product = state
        .catalog
        .products
        .find(id)
        .ok_or_else(|| not_found(id))?;
    respond(&state, &headers, &product, &PRODUCT_DEFAULT)
}

pub async fn create(
    State(state): State<AppState>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(input) = payload?;
    if let Some(field) = input.blank_field() {
        return Err(blank(field));
    }

    let product = state.catalog.products.insert_with(|id| input.into_product(id));
    tracing::info!(product_id = product.id, "Product created");
    written(StatusCode::CREATED, &product, &PRODUCT_DEFAULT)
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<ProductInput>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    let Json(input) = payload?;
    if let Some(field) = input.blank_field() {
        return Err(blank(field));
    }

    let product = state
        .catalog
        .products
        .update(id, |product| *product = input.into_product(id))
        .ok_or_else(|| not_found(id))?;
    tracing::info!(product_id = id, "Product updated");
    written(StatusCode::OK, &product, &PRODUCT_DEFAULT)
}

pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;
    state.catalog.products.remove(id).ok_or_else(|| not_found(id))?;
    tracing::info!(product_id = id, "Product deleted");
    Ok(deleted())
}

fn not_found(id: u64) -> ApiError {
    ApiError::NotFound(format!("product {id} not found"))
}

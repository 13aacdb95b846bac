use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Deserialize;
use serde_json::Value;

use greenmart_core::{EntityKind, ListFilter, Patch, Record};

use crate::routes::auth::authenticated_user;
use crate::routes::error::ApiError;
use crate::state::EntityState;

/// CRUD routes for one entity, mounted under its plural path segment.
pub fn entity_routes(state: EntityState) -> Router {
    Router::new()
        .route("/", get(list).post(create))
        .route("/{id}", get(get_by_id).put(update).delete(delete_entity))
        .with_state(state)
}

pub fn route_segment(entity: &EntityKind) -> &'static str {
    match entity.name {
        "user" => "users",
        "product" => "products",
        "category" => "categories",
        "cart" => "carts",
        "order" => "orders",
        "payment" => "payments",
        "wishlist" => "wishlists",
        "address" => "addresses",
        "contact" => "contacts",
        other => unreachable!("unmapped entity {other}"),
    }
}

/// Owner-scoped entities resolve their scope from the bearer token; global
/// entities ignore the caller's identity.
fn resolve_scope(state: &EntityState, headers: &HeaderMap) -> Result<Option<i64>, ApiError> {
    if state.repository.entity().is_scoped() {
        authenticated_user(state.access_tokens.as_ref(), headers).map(Some)
    } else {
        Ok(None)
    }
}

fn positive_id(id: i64) -> Result<i64, ApiError> {
    if id > 0 {
        Ok(id)
    } else {
        Err(ApiError::bad_request("Identifier must be a positive integer"))
    }
}

/// The `search_key` query parameter arrives base64-encoded.
fn decode_search_key(raw: &str) -> Result<String, ApiError> {
    let bytes = BASE64
        .decode(raw)
        .map_err(|_| ApiError::bad_request("Malformed search key"))?;
    String::from_utf8(bytes).map_err(|_| ApiError::bad_request("Malformed search key"))
}

fn body_as_record(body: Value) -> Result<Record, ApiError> {
    match body {
        Value::Object(record) => Ok(record),
        _ => Err(ApiError::bad_request("Expected a JSON object body")),
    }
}

#[derive(Debug, Deserialize)]
struct ListQuery {
    skip: Option<u64>,
    limit: Option<u64>,
    search_key: Option<String>,
}

#[tracing::instrument(name = "List entities", skip_all, fields(entity = state.repository.entity().name))]
async fn list(
    State(state): State<EntityState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Record>>, ApiError> {
    let scope = resolve_scope(&state, &headers)?;
    let search_key = query
        .search_key
        .as_deref()
        .map(decode_search_key)
        .transpose()?;

    let rows = state
        .repository
        .list(
            scope,
            ListFilter {
                search_key,
                select: None,
                skip: query.skip,
                limit: query.limit,
            },
        )
        .await?;
    Ok(Json(rows))
}

#[tracing::instrument(name = "Get entity", skip_all, fields(entity = state.repository.entity().name))]
async fn get_by_id(
    State(state): State<EntityState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Record>, ApiError> {
    let scope = resolve_scope(&state, &headers)?;
    let id = positive_id(id)?;

    let row = state
        .repository
        .get_by_id(scope, id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(row))
}

#[tracing::instrument(name = "Create entity", skip_all, fields(entity = state.repository.entity().name))]
async fn create(
    State(state): State<EntityState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Response, ApiError> {
    let scope = resolve_scope(&state, &headers)?;
    let values = body_as_record(body)?;
    if values.is_empty() {
        return Err(ApiError::bad_request("Empty body"));
    }

    let row = state
        .repository
        .create(scope, values)
        .await?
        .ok_or_else(|| ApiError::server("Created row could not be read back"))?;
    Ok((StatusCode::CREATED, Json(row)).into_response())
}

#[tracing::instrument(name = "Update entity", skip_all, fields(entity = state.repository.entity().name))]
async fn update(
    State(state): State<EntityState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Result<Json<Record>, ApiError> {
    let scope = resolve_scope(&state, &headers)?;
    let id = positive_id(id)?;
    let patch = Patch::from_record(state.repository.entity(), body_as_record(body)?);

    let row = state
        .repository
        .update(scope, id, patch)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(row))
}

#[tracing::instrument(name = "Delete entity", skip_all, fields(entity = state.repository.entity().name))]
async fn delete_entity(
    State(state): State<EntityState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Result<Json<Record>, ApiError> {
    let scope = resolve_scope(&state, &headers)?;
    let id = positive_id(id)?;

    let receipt = state
        .repository
        .delete(scope, id)
        .await?
        .ok_or_else(ApiError::not_found)?;
    Ok(Json(receipt))
}

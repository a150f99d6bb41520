//! RPC endpoint routes.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use rowset_engine::{FieldSet, RecordId, Row, Values};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::{
    handle_call, handle_create, handle_default_get, handle_delete, handle_fields, handle_read,
    handle_write, Ack, CallRequest, CreateRequest, CreateResponse, DefaultGetRequest,
    DeleteRequest, ReadRequest, WriteRequest,
};
use crate::AppState;

/// Create RPC routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/rpc/{resource}/fields", get(fields_handler))
        .route("/rpc/{resource}/read", post(read_handler))
        .route("/rpc/{resource}/default_get", post(default_get_handler))
        .route("/rpc/{resource}/create", post(create_handler))
        .route("/rpc/{resource}/write", post(write_handler))
        .route("/rpc/{resource}/delete", post(delete_handler))
        .route("/rpc/{resource}/call/{method}", post(call_handler))
}

/// GET /rpc/{resource}/fields - Field set of a resource.
async fn fields_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(resource): Path<String>,
) -> Result<Json<FieldSet>> {
    Ok(Json(handle_fields(&state.dataset, &resource)?))
}

/// POST /rpc/{resource}/read - Batched read.
async fn read_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(resource): Path<String>,
    Json(request): Json<ReadRequest>,
) -> Result<Json<Vec<Row>>> {
    Ok(Json(handle_read(&state.dataset, &resource, request)?))
}

/// POST /rpc/{resource}/default_get - Defaults for new records.
async fn default_get_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(resource): Path<String>,
    Json(request): Json<DefaultGetRequest>,
) -> Result<Json<Values>> {
    Ok(Json(handle_default_get(&state.dataset, &resource, request)?))
}

/// POST /rpc/{resource}/create - Persist a new record.
async fn create_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(resource): Path<String>,
    Json(request): Json<CreateRequest>,
) -> Result<Json<CreateResponse>> {
    Ok(Json(handle_create(&state.dataset, &resource, request)?))
}

/// POST /rpc/{resource}/write - Update records.
async fn write_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(resource): Path<String>,
    Json(request): Json<WriteRequest>,
) -> Result<Json<Ack>> {
    Ok(Json(handle_write(&state.dataset, &resource, request)?))
}

/// POST /rpc/{resource}/delete - Delete records.
async fn delete_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(resource): Path<String>,
    Json(request): Json<DeleteRequest>,
) -> Result<Json<Ack>> {
    Ok(Json(handle_delete(&state.dataset, &resource, request)?))
}

/// POST /rpc/{resource}/call/{method} - Run a write hook.
async fn call_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path((resource, method)): Path<(String, String)>,
    Json(request): Json<CallRequest>,
) -> Result<Json<Vec<RecordId>>> {
    Ok(Json(handle_call(&state.dataset, &resource, &method, request)?))
}

//! RPC handlers - one per remote service operation.
//!
//! Handlers take the dataset and a decoded request and return the response
//! body; routing and extraction live in `routes::rpc`.

use rowset_engine::{Context, FieldSet, RecordId, Row, Values};
use serde::{Deserialize, Serialize};

use crate::dataset::Dataset;
use crate::error::Result;

/// Body of `POST /rpc/{resource}/read`.
#[derive(Debug, Deserialize)]
pub struct ReadRequest {
    pub ids: Vec<RecordId>,
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub context: Context,
}

/// Body of `POST /rpc/{resource}/default_get`.
#[derive(Debug, Deserialize)]
pub struct DefaultGetRequest {
    pub fields: Vec<String>,
    #[serde(default)]
    pub context: Context,
}

/// Body of `POST /rpc/{resource}/create`.
#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub values: Values,
    #[serde(default)]
    pub context: Context,
}

/// Response of `POST /rpc/{resource}/create`.
#[derive(Debug, Serialize)]
pub struct CreateResponse {
    pub id: RecordId,
}

/// Body of `POST /rpc/{resource}/write`.
#[derive(Debug, Deserialize)]
pub struct WriteRequest {
    pub ids: Vec<RecordId>,
    pub values: Values,
    #[serde(default)]
    pub context: Context,
}

/// Body of `POST /rpc/{resource}/delete`.
#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub ids: Vec<RecordId>,
    #[serde(default)]
    pub context: Context,
}

/// Body of `POST /rpc/{resource}/call/{method}`.
#[derive(Debug, Deserialize)]
pub struct CallRequest {
    pub id: RecordId,
    #[serde(default)]
    pub context: Context,
}

/// Acknowledgement for operations without a result.
#[derive(Debug, Serialize)]
pub struct Ack {
    pub ok: bool,
}

impl Ack {
    fn ok() -> Self {
        Self { ok: true }
    }
}

pub fn handle_fields(dataset: &Dataset, resource: &str) -> Result<FieldSet> {
    Ok(dataset.fields(resource)?)
}

pub fn handle_read(dataset: &Dataset, resource: &str, request: ReadRequest) -> Result<Vec<Row>> {
    tracing::debug!(resource, ids = request.ids.len(), context = ?request.context, "read");
    Ok(dataset.read(resource, &request.ids, &request.fields)?)
}

pub fn handle_default_get(
    dataset: &Dataset,
    resource: &str,
    request: DefaultGetRequest,
) -> Result<Values> {
    Ok(dataset.default_get(resource, &request.fields)?)
}

pub fn handle_create(
    dataset: &Dataset,
    resource: &str,
    request: CreateRequest,
) -> Result<CreateResponse> {
    let id = dataset.create(resource, &request.values)?;
    Ok(CreateResponse { id })
}

pub fn handle_write(dataset: &Dataset, resource: &str, request: WriteRequest) -> Result<Ack> {
    dataset.write(resource, &request.ids, &request.values)?;
    Ok(Ack::ok())
}

pub fn handle_delete(dataset: &Dataset, resource: &str, request: DeleteRequest) -> Result<Ack> {
    dataset.delete(resource, &request.ids)?;
    Ok(Ack::ok())
}

pub fn handle_call(
    dataset: &Dataset,
    resource: &str,
    method: &str,
    request: CallRequest,
) -> Result<Vec<RecordId>> {
    let ids = dataset.call(resource, method, request.id)?;
    tracing::debug!(resource, method, id = request.id, returned = ids.len(), "write hook");
    Ok(ids)
}

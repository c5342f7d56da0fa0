//! JSON-RPC method handlers.

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use opdir_remote::wire::{
    GetRecordsParams, JSONRPC_VERSION, METHOD_GET_RECORDS, METHOD_GET_TIP, METHOD_SUBMIT_RECORDS,
    RecordsResult, RpcRequest, RpcResponse, SubmitRecordsParams,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::AppState;
use crate::error::RpcError;

/// `POST /jsonrpc`. Always answers 200 with a JSON-RPC response body.
pub(crate) async fn jsonrpc(State(state): State<AppState>, body: Bytes) -> Json<RpcResponse> {
    let request: RpcRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            let err = RpcError::Parse(e.to_string());
            return Json(RpcResponse::failure(Value::Null, err.code(), err.to_string()));
        }
    };

    let id = request.id.clone();
    match dispatch(&state, request).await {
        Ok(result) => Json(RpcResponse::success(id, result)),
        Err(err) => {
            warn!(code = err.code(), error = %err, "JSON-RPC call failed");
            Json(RpcResponse::failure(id, err.code(), err.to_string()))
        }
    }
}

async fn dispatch(state: &AppState, request: RpcRequest) -> Result<Value, RpcError> {
    if request.jsonrpc != JSONRPC_VERSION {
        return Err(RpcError::InvalidRequest(format!(
            "unsupported jsonrpc version {:?}",
            request.jsonrpc
        )));
    }
    debug!(method = %request.method, "JSON-RPC call");

    match request.method.as_str() {
        METHOD_GET_RECORDS => get_records(state, params(request.params)?).await,
        METHOD_GET_TIP => get_tip(state).await,
        METHOD_SUBMIT_RECORDS => submit_records(state, params(request.params)?).await,
        other => Err(RpcError::MethodNotFound(other.to_string())),
    }
}

/// Decode method params; a missing `params` member reads as `{}`.
fn params<P: DeserializeOwned>(value: Value) -> Result<P, RpcError> {
    let value = if value.is_null() {
        Value::Object(Default::default())
    } else {
        value
    };
    serde_json::from_value(value).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

fn to_value<T: serde::Serialize>(v: T) -> Result<Value, RpcError> {
    serde_json::to_value(v).map_err(|e| RpcError::Internal(e.to_string()))
}

async fn get_records(state: &AppState, params: GetRecordsParams) -> Result<Value, RpcError> {
    let log = state.log.clone();
    let records = tokio::task::spawn_blocking(move || log.records(params.after.as_ref())).await?;
    to_value(RecordsResult { records })
}

async fn get_tip(state: &AppState) -> Result<Value, RpcError> {
    let log = state.log.clone();
    let tip = tokio::task::spawn_blocking(move || log.tip()).await?;
    to_value(tip)
}

async fn submit_records(state: &AppState, params: SubmitRecordsParams) -> Result<Value, RpcError> {
    if params.records.is_empty() {
        return Err(RpcError::InvalidParams("no records submitted".into()));
    }
    let log = state.log.clone();
    tokio::task::spawn_blocking(move || log.append(&params.records)).await??;
    Ok(Value::String("ok".into()))
}

//! JSON-RPC over HTTP record source.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use opdir_types::{RecordHash, SignedChangeRecord};
use serde::de::DeserializeOwned;
use tracing::trace;

use crate::error::RemoteError;
use crate::source::RecordSource;
use crate::wire::{
    GetRecordsParams, METHOD_GET_RECORDS, METHOD_GET_TIP, METHOD_SUBMIT_RECORDS, RecordsResult,
    RpcRequest, RpcResponse, SubmitRecordsParams,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Talks to a directory server's `/jsonrpc` endpoint.
pub struct JsonRpcSource {
    endpoint: String,
    client: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcSource {
    /// Client for the JSON-RPC endpoint URL (e.g. `http://host:4000/jsonrpc`).
    pub fn new(endpoint: impl Into<String>) -> Result<Self, RemoteError> {
        Self::with_timeout(endpoint, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call<R: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<R, RemoteError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        trace!(method, id, endpoint = %self.endpoint, "JSON-RPC call");

        let response: RpcResponse = self
            .client
            .post(&self.endpoint)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(RemoteError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(serde_json::from_value(
            response.result.unwrap_or(serde_json::Value::Null),
        )?)
    }
}

#[async_trait::async_trait]
impl RecordSource for JsonRpcSource {
    async fn get_records(
        &self,
        after: Option<RecordHash>,
    ) -> Result<Vec<SignedChangeRecord>, RemoteError> {
        let params = serde_json::to_value(GetRecordsParams { after })?;
        let result: RecordsResult = self.call(METHOD_GET_RECORDS, params).await?;
        Ok(result.records)
    }

    async fn get_tip(&self) -> Result<Option<SignedChangeRecord>, RemoteError> {
        self.call(METHOD_GET_TIP, serde_json::json!({})).await
    }

    async fn submit_records(&self, records: Vec<SignedChangeRecord>) -> Result<(), RemoteError> {
        let params = serde_json::to_value(SubmitRecordsParams { records })?;
        let _: serde_json::Value = self.call(METHOD_SUBMIT_RECORDS, params).await?;
        Ok(())
    }
}

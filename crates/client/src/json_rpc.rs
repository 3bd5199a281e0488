// Path: crates/client/src/json_rpc.rs
use crate::ChainClient;
use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use daokit_tx::{TransactionReceipt, TransactionRequest};
use daokit_types::error::ClientError;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// [`ChainClient`] over a node's HTTP JSON-RPC endpoint.
pub struct JsonRpcClient {
    url: String,
    client: Client,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: JsonValue,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<JsonValue>,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<JsonValue>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CallObject<'a> {
    from: Address,
    to: Address,
    data: &'a Bytes,
    value: alloy_primitives::U256,
    #[serde(skip_serializing_if = "Option::is_none")]
    gas: Option<alloy_primitives::U64>,
}

fn ascii_snippet(bytes: &[u8]) -> String {
    let s = String::from_utf8_lossy(bytes);
    s.trim()
        .chars()
        .take(160)
        .collect::<String>()
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

impl JsonRpcClient {
    pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_timeout(url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            client,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: JsonValue,
    ) -> Result<Option<T>, ClientError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let resp = self
            .client
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!(target: "chain-client", method, error = %e, "rpc send failed");
                ClientError::Transport(e.to_string())
            })?;

        let status = resp.status();
        let bytes = resp
            .bytes()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: ascii_snippet(&bytes),
            });
        }

        let parsed: RpcResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::Malformed(format!("{e}: {}", ascii_snippet(&bytes))))?;

        if let Some(err) = parsed.error {
            let message = match err.data {
                Some(JsonValue::String(data)) => format!("{} ({data})", err.message),
                _ => err.message,
            };
            return Err(ClientError::Rpc {
                code: err.code,
                message,
            });
        }

        match parsed.result {
            None | Some(JsonValue::Null) => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| ClientError::Malformed(format!("{method}: {e}"))),
        }
    }

    async fn request_required<T: DeserializeOwned>(
        &self,
        method: &str,
        params: JsonValue,
    ) -> Result<T, ClientError> {
        self.request(method, params)
            .await?
            .ok_or_else(|| ClientError::Malformed(format!("{method}: missing result")))
    }
}

#[async_trait]
impl ChainClient for JsonRpcClient {
    async fn get_code(&self, address: Address) -> Result<Bytes, ClientError> {
        self.request_required("eth_getCode", json!([address, "latest"]))
            .await
    }

    async fn simulate(&self, from: Address, tx: &TransactionRequest) -> Result<Bytes, ClientError> {
        let call = CallObject {
            from,
            to: tx.to,
            data: &tx.data,
            value: tx.value,
            gas: tx.gas.map(alloy_primitives::U64::from),
        };
        self.request_required("eth_call", json!([call, "latest"]))
            .await
    }

    async fn get_transaction_receipt(
        &self,
        hash: B256,
    ) -> Result<Option<TransactionReceipt>, ClientError> {
        self.request("eth_getTransactionReceipt", json!([hash])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{routing::post, Json, Router};
    use std::net::SocketAddr;

    async fn serve(handler: fn(JsonValue) -> JsonValue) -> SocketAddr {
        let app = Router::new().route(
            "/",
            post(move |Json(body): Json<JsonValue>| async move { Json(handler(body)) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn reply(body: &JsonValue, result: JsonValue) -> JsonValue {
        json!({ "jsonrpc": "2.0", "id": body["id"], "result": result })
    }

    #[tokio::test]
    async fn get_code_decodes_hex() {
        let addr = serve(|body| {
            assert_eq!(body["method"], "eth_getCode");
            reply(&body, json!("0x6080"))
        })
        .await;
        let client = JsonRpcClient::new(format!("http://{addr}/")).unwrap();

        let code = client.get_code(Address::repeat_byte(1)).await.unwrap();
        assert_eq!(code.as_ref(), &[0x60, 0x80]);
        assert!(client.has_code(Address::repeat_byte(1)).await.unwrap());
    }

    #[tokio::test]
    async fn simulate_sends_from_and_surfaces_reverts() {
        let addr = serve(|body| {
            assert_eq!(body["method"], "eth_call");
            assert_eq!(
                body["params"][0]["from"].as_str().unwrap().to_lowercase(),
                format!("0x{}", "0a".repeat(20))
            );
            json!({
                "jsonrpc": "2.0",
                "id": body["id"],
                "error": { "code": 3, "message": "execution reverted", "data": "0x08c379a0" }
            })
        })
        .await;
        let client = JsonRpcClient::new(format!("http://{addr}/")).unwrap();
        let tx = TransactionRequest::call(Address::repeat_byte(2), vec![0xde, 0xad]);

        let err = client.simulate(Address::repeat_byte(0x0a), &tx).await.unwrap_err();
        match err {
            ClientError::Rpc { code, message } => {
                assert_eq!(code, 3);
                assert!(message.starts_with("execution reverted"));
                assert!(message.contains("0x08c379a0"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn pending_receipt_is_none() {
        let addr = serve(|body| reply(&body, JsonValue::Null)).await;
        let client = JsonRpcClient::new(format!("http://{addr}/")).unwrap();
        assert!(client
            .get_transaction_receipt(B256::repeat_byte(1))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn mined_receipt_keeps_logs() {
        let addr = serve(|body| {
            reply(
                &body,
                json!({
                    "transactionHash": format!("0x{}", "11".repeat(32)),
                    "status": "0x1",
                    "blockNumber": "0x10",
                    "logs": [{
                        "address": format!("0x{}", "22".repeat(20)),
                        "topics": [format!("0x{}", "33".repeat(32))],
                        "data": "0x",
                        "logIndex": "0x0"
                    }]
                }),
            )
        })
        .await;
        let client = JsonRpcClient::new(format!("http://{addr}/")).unwrap();

        let receipt = client
            .get_transaction_receipt(B256::repeat_byte(0x11))
            .await
            .unwrap()
            .unwrap();
        assert!(receipt.succeeded());
        assert_eq!(receipt.logs.len(), 1);
        assert_eq!(receipt.logs[0].address, Address::repeat_byte(0x22));
    }

    #[tokio::test]
    async fn non_success_status_is_reported() {
        let app = Router::new().route(
            "/",
            post(|| async { (axum::http::StatusCode::BAD_GATEWAY, "upstream down") }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let client = JsonRpcClient::new(format!("http://{addr}/")).unwrap();
        let err = client.get_code(Address::ZERO).await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 502, .. }));
    }
}

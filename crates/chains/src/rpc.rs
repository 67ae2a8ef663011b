//! JSON-RPC over HTTP, shared by every invoker.
//!
//! Nodes disagree on how errors come back. JSON-RPC 2.0 nodes (geth,
//! bitcoind, Tendermint) send an `error` object with `code` and `message`.
//! Ontology-family nodes (ONT, Poly) always send an integer `error` and a
//! `desc` string, where `0` means success. Both forms end up as
//! [`ChainError::Rpc`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use cctest_core::metrics as m;
use cctest_core::{ChainError, ChainKind, Secret};
use reqwest::Url;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON-RPC request envelope.
#[derive(Debug, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: &'a Value,
}

/// HTTP JSON-RPC client bound to one node.
pub struct JsonRpcClient {
    chain: ChainKind,
    endpoint: String,
    url: Url,
    http: reqwest::Client,
    basic_auth: Option<(String, Secret)>,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    /// Create a client for `endpoint`.
    ///
    /// Only `http` and `https` endpoints are accepted. No request is sent.
    pub fn new(chain: ChainKind, endpoint: &str, timeout: Duration) -> Result<Self, ChainError> {
        let url = Url::parse(endpoint).map_err(|e| ChainError::InvalidEndpoint {
            chain,
            endpoint: endpoint.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ChainError::InvalidEndpoint {
                chain,
                endpoint: endpoint.to_owned(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Transport {
                chain,
                method: "client setup".to_owned(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            chain,
            endpoint: endpoint.to_owned(),
            url,
            http,
            basic_auth: None,
            next_id: AtomicU64::new(1),
        })
    }

    /// Send HTTP basic credentials with every request.
    pub fn with_basic_auth(mut self, user: impl Into<String>, password: Secret) -> Self {
        self.basic_auth = Some((user.into(), password));
        self
    }

    /// Chain this client talks to.
    pub fn chain(&self) -> ChainKind {
        self.chain
    }

    /// Endpoint as configured.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Call `method` and return its `result`.
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let chain = self.chain.as_str();
        metrics::counter!(m::RPC_REQUESTS_TOTAL, m::LABEL_CHAIN => chain).increment(1);

        let result = self.send(method, &params).await;
        if let Err(e) = &result {
            metrics::counter!(m::RPC_ERRORS_TOTAL, m::LABEL_CHAIN => chain).increment(1);
            tracing::debug!(chain, method, error = %e, "rpc call failed");
        }
        result
    }

    /// Call `method` and deserialize its `result` into `T`.
    pub async fn call_as<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, ChainError> {
        let value = self.call(method, params).await?;
        serde_json::from_value(value).map_err(|e| ChainError::UnexpectedResponse {
            chain: self.chain,
            method: method.to_owned(),
            reason: e.to_string(),
        })
    }

    /// First call made against a freshly configured node.
    ///
    /// Identical to [`call`](Self::call) except that transport failures are
    /// reported as [`ChainError::Unreachable`].
    pub async fn probe(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        self.call(method, params).await.map_err(|e| match e {
            ChainError::Transport { reason, .. } => ChainError::Unreachable {
                chain: self.chain,
                endpoint: self.endpoint.clone(),
                reason,
            },
            other => other,
        })
    }

    async fn send(&self, method: &str, params: &Value) -> Result<Value, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        let mut builder = self
            .http
            .post(self.url.clone())
            .header(CONTENT_TYPE, "application/json")
            .json(&request);
        if let Some((user, password)) = &self.basic_auth {
            builder = builder.basic_auth(user, Some(password.expose()));
        }

        let transport = |reason: String| ChainError::Transport {
            chain: self.chain,
            method: method.to_owned(),
            reason,
        };

        let response = builder.send().await.map_err(|e| transport(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| transport(e.to_string()))?;

        // bitcoind reports RPC errors with a 500 and a JSON body
        match serde_json::from_str::<Value>(&body) {
            Ok(envelope) => decode_response(self.chain, method, envelope),
            Err(_) if !status.is_success() => Err(transport(format!("http status {status}"))),
            Err(e) => Err(ChainError::UnexpectedResponse {
                chain: self.chain,
                method: method.to_owned(),
                reason: format!("invalid json body: {e}"),
            }),
        }
    }
}

impl std::fmt::Debug for JsonRpcClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonRpcClient")
            .field("chain", &self.chain)
            .field("endpoint", &self.endpoint)
            .field("basic_auth", &self.basic_auth.as_ref().map(|(user, _)| user))
            .finish_non_exhaustive()
    }
}

/// Extract `result` from a response envelope, mapping either error form.
pub fn decode_response(
    chain: ChainKind,
    method: &str,
    mut envelope: Value,
) -> Result<Value, ChainError> {
    let rpc_error = |code: i64, message: String| ChainError::Rpc {
        chain,
        method: method.to_owned(),
        code,
        message,
    };

    match envelope.get("error") {
        None | Some(Value::Null) => {}
        Some(Value::Object(obj)) => {
            let code = obj.get("code").and_then(Value::as_i64).unwrap_or(0);
            let message = obj
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_owned();
            return Err(rpc_error(code, message));
        }
        Some(Value::Number(n)) => {
            let code = n.as_i64().unwrap_or(-1);
            if code != 0 {
                let desc = envelope
                    .get("desc")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_owned();
                return Err(rpc_error(code, desc));
            }
        }
        Some(other) => {
            return Err(ChainError::UnexpectedResponse {
                chain,
                method: method.to_owned(),
                reason: format!("unrecognised error field: {other}"),
            });
        }
    }

    match envelope.get_mut("result") {
        Some(result) => Ok(result.take()),
        None => Err(ChainError::UnexpectedResponse {
            chain,
            method: method.to_owned(),
            reason: "response has neither result nor error".to_owned(),
        }),
    }
}

/// Read a block height or other quantity.
///
/// Accepts a JSON number, a decimal string (Tendermint) or a `0x` hex
/// string (Ethereum).
pub fn parse_quantity(chain: ChainKind, method: &str, value: &Value) -> Result<u64, ChainError> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok(),
            None => s.parse::<u64>().ok(),
        },
        _ => None,
    };
    parsed.ok_or_else(|| ChainError::UnexpectedResponse {
        chain,
        method: method.to_owned(),
        reason: format!("expected an unsigned quantity, got {value}"),
    })
}

/// Fail with [`ChainError::MissingField`] when `value` is empty.
pub(crate) fn require(chain: ChainKind, field: &str, value: &str) -> Result<(), ChainError> {
    if value.trim().is_empty() {
        return Err(ChainError::MissingField {
            chain,
            field: field.to_owned(),
        });
    }
    Ok(())
}

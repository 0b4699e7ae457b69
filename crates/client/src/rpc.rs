//! A minimal async JSON-RPC 2.0 HTTP client for the handful of
//! `eth_*` methods the wallet needs.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::time::Instant;

use usdcwallet_core::numeric::{block_height_string, hex_from_bytes, int_from_hex};
use usdcwallet_types::{Address, Digest, Error};

#[derive(Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
    data: Option<Value>,
}

/// A confirmed (or failed) transaction receipt.
#[derive(Debug, Clone)]
pub struct TransactionReceipt {
    /// Hash of the mined transaction.
    pub transaction_hash: Digest,
    /// `true` if the transaction's top-level call succeeded.
    pub status: bool,
    /// Block the transaction was mined in.
    pub block_number: u64,
    /// Gas actually consumed.
    pub gas_used: u64,
    /// Address of the deployed contract, if this was a deployment.
    pub contract_address: Option<Address>,
}

/// An async JSON-RPC client for a single Ethereum-compatible endpoint.
///
/// The chain id is fetched once and cached; call [`RpcClient::new`]
/// again (or build a fresh client) after pointing at a different URL.
pub struct RpcClient {
    http: reqwest::Client,
    url: String,
    chain_id: RwLock<Option<u64>>,
    request_id: std::sync::atomic::AtomicU64,
}

impl RpcClient {
    /// Builds a client against `url`. No network call happens here.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
            chain_id: RwLock::new(None),
            request_id: std::sync::atomic::AtomicU64::new(1),
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, Error> {
        let id = self
            .request_id
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        let request = JsonRpcRequest {
            jsonrpc: "2.0",
            id,
            method,
            params,
        };

        log::debug!("rpc call {method} -> {}", self.url);

        let response = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Rpc {
                message: e.to_string(),
                code: 0,
                data: None,
                status: e.status().map(|s| s.as_u16()).unwrap_or(0),
            })?;

        let status = response.status().as_u16();
        let body: JsonRpcResponse = response.json().await.map_err(|e| Error::Rpc {
            message: e.to_string(),
            code: 0,
            data: None,
            status,
        })?;

        if let Some(err) = body.error {
            return Err(Error::Rpc {
                message: err.message,
                code: err.code,
                data: err.data.map(|d| d.to_string()),
                status,
            });
        }

        body.result.ok_or_else(|| Error::Rpc {
            message: if (200..300).contains(&status) {
                "Result missing".into()
            } else {
                status_text(status)
            },
            code: 0,
            data: None,
            status,
        })
    }

    fn expect_hex_string(value: Value) -> Result<String, Error> {
        value.as_str().map(str::to_string).ok_or(Error::Rpc {
            message: "expected a hex string result".into(),
            code: 0,
            data: None,
            status: 0,
        })
    }

    /// `eth_chainId`, cached after the first successful call.
    pub async fn chain_id(&self) -> Result<u64, Error> {
        if let Some(id) = *self.chain_id.read().await {
            return Ok(id);
        }
        let result = self.call("eth_chainId", json!([])).await?;
        let id = int_from_hex(&Self::expect_hex_string(result)?)?;
        *self.chain_id.write().await = Some(id);
        Ok(id)
    }

    /// `eth_gasPrice`.
    pub async fn gas_price(&self) -> Result<u64, Error> {
        let result = self.call("eth_gasPrice", json!([])).await?;
        int_from_hex(&Self::expect_hex_string(result)?)
    }

    /// `eth_getTransactionCount` at the given block height (`"latest"`,
    /// `"pending"`, or a decimal block number).
    pub async fn transaction_count(&self, address: &Address, block: &str) -> Result<u64, Error> {
        let result = self
            .call(
                "eth_getTransactionCount",
                json!([address.to_string(), block_height_string(block)]),
            )
            .await?;
        int_from_hex(&Self::expect_hex_string(result)?)
    }

    /// `eth_estimateGas` for a call/transaction object.
    pub async fn estimate_gas(
        &self,
        from: &Address,
        to: Option<&Address>,
        data: &[u8],
        value: Option<&num_bigint::BigInt>,
    ) -> Result<u64, Error> {
        let params = call_object(from, to, data, value);
        let result = self.call("eth_estimateGas", json!([params])).await?;
        int_from_hex(&Self::expect_hex_string(result)?)
    }

    /// `eth_call`: a read-only contract invocation.
    pub async fn eth_call(
        &self,
        from: Option<&Address>,
        to: &Address,
        data: &[u8],
        block: &str,
    ) -> Result<Vec<u8>, Error> {
        let params = call_object_opt_from(from, Some(to), data, None);
        let result = self
            .call("eth_call", json!([params, block_height_string(block)]))
            .await?;
        usdcwallet_core::numeric::bytes_from_hex(&Self::expect_hex_string(result)?)
    }

    /// `eth_sendRawTransaction`.
    pub async fn send_raw_transaction(&self, raw: &[u8]) -> Result<Digest, Error> {
        let result = self
            .call("eth_sendRawTransaction", json!([hex_from_bytes(raw, true)]))
            .await?;
        let hex = Self::expect_hex_string(result)?;
        let bytes = usdcwallet_core::numeric::bytes_from_hex(&hex)?;
        if bytes.len() != 32 {
            return Err(Error::Rpc {
                message: "transaction hash was not 32 bytes".into(),
                code: 0,
                data: None,
                status: 0,
            });
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes);
        Ok(digest)
    }

    /// `eth_getTransactionReceipt`. Returns `None` while still pending.
    pub async fn transaction_receipt(
        &self,
        hash: &Digest,
    ) -> Result<Option<TransactionReceipt>, Error> {
        let result = self
            .call(
                "eth_getTransactionReceipt",
                json!([hex_from_bytes(hash, true)]),
            )
            .await?;
        if result.is_null() {
            return Ok(None);
        }
        parse_receipt(&result).map(Some)
    }

    /// Polls `eth_getTransactionReceipt` until it is mined or `timeout`
    /// elapses.
    pub async fn wait_for_receipt(
        &self,
        hash: &Digest,
        poll_interval: Duration,
        timeout: Duration,
    ) -> Result<TransactionReceipt, Error> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(receipt) = self.transaction_receipt(hash).await? {
                return Ok(receipt);
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout {
                    waited_secs: timeout.as_secs(),
                });
            }
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// The HTTP status line text for a non-2xx response that carried no
/// parseable JSON-RPC `error` field, e.g. `"404 Not Found"`.
fn status_text(status: u16) -> String {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Status");
    format!("{status} {reason}")
}

fn call_object(
    from: &Address,
    to: Option<&Address>,
    data: &[u8],
    value: Option<&num_bigint::BigInt>,
) -> Value {
    call_object_opt_from(Some(from), to, data, value)
}

fn call_object_opt_from(
    from: Option<&Address>,
    to: Option<&Address>,
    data: &[u8],
    value: Option<&num_bigint::BigInt>,
) -> Value {
    let mut obj = json!({
        "data": hex_from_bytes(data, true),
    });
    if let Some(from) = from {
        obj["from"] = json!(from.to_string());
    }
    if let Some(to) = to {
        obj["to"] = json!(to.to_string());
    }
    if let Some(value) = value {
        obj["value"] = json!(usdcwallet_core::numeric::hex_quantity_from_bigint(value));
    }
    obj
}

fn parse_receipt(value: &Value) -> Result<TransactionReceipt, Error> {
    let field = |name: &str| -> Result<&str, Error> {
        value
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Rpc {
                message: format!("receipt missing field `{name}`"),
                code: 0,
                data: None,
                status: 0,
            })
    };

    let tx_hash_bytes = usdcwallet_core::numeric::bytes_from_hex(field("transactionHash")?)?;
    let mut transaction_hash = [0u8; 32];
    transaction_hash.copy_from_slice(&tx_hash_bytes[..32.min(tx_hash_bytes.len())]);

    let status = int_from_hex(field("status")?)? != 0;
    let block_number = int_from_hex(field("blockNumber")?)?;
    let gas_used = int_from_hex(field("gasUsed")?)?;
    let contract_address = match value.get("contractAddress").and_then(Value::as_str) {
        Some(s) if !s.is_empty() => Some(Address::parse_hex(s)?),
        _ => None,
    };

    Ok(TransactionReceipt {
        transaction_hash,
        status,
        block_number,
        gas_used,
        contract_address,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_successful_receipt() {
        let value = json!({
            "transactionHash": "0x".to_string() + &"ab".repeat(32),
            "status": "0x1",
            "blockNumber": "0x10",
            "gasUsed": "0x5208",
            "contractAddress": null,
        });
        let receipt = parse_receipt(&value).unwrap();
        assert!(receipt.status);
        assert_eq!(receipt.block_number, 16);
        assert_eq!(receipt.gas_used, 21000);
        assert!(receipt.contract_address.is_none());
    }

    #[test]
    fn status_text_reports_reason_phrase() {
        assert_eq!(status_text(404), "404 Not Found");
        assert_eq!(status_text(500), "500 Internal Server Error");
    }

    #[test]
    fn parses_failed_receipt() {
        let value = json!({
            "transactionHash": "0x".to_string() + &"00".repeat(32),
            "status": "0x0",
            "blockNumber": "0x1",
            "gasUsed": "0x1",
        });
        let receipt = parse_receipt(&value).unwrap();
        assert!(!receipt.status);
    }
}

use base64::Engine;
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use async_trait::async_trait;
use primitives::BlockHash;

use crate::config::NodeConfig;
use crate::driver::{BlockRef, DaemonDriver, DaemonError, DaemonInfo};

/// JSON-RPC client for a daemon already running next to the node.
///
/// Speaks plain HTTP/1.1 over a fresh TCP connection per call, with
/// basic auth taken from the daemon config. `start` only probes the
/// endpoint: the daemon process itself is managed out of band.
pub struct RpcDriver {
    host: String,
    port: u16,
    auth: Option<String>,
}

impl RpcDriver {
    pub fn new(config: &NodeConfig) -> Self {
        let auth = match (&config.rpc_user, &config.rpc_password) {
            (Some(user), Some(password)) => Some(
                base64::engine::general_purpose::STANDARD.encode(format!("{user}:{password}")),
            ),
            _ => None,
        };
        Self {
            host: "127.0.0.1".to_string(),
            port: config.rpc_port,
            auth,
        }
    }

    async fn call(&self, method: &str, params: Value) -> Result<Value, DaemonError> {
        let body = json!({
            "jsonrpc": "1.0",
            "id": "anchorage",
            "method": method,
            "params": params,
        })
        .to_string();

        let mut request = format!(
            "POST / HTTP/1.1\r\nHost: {}:{}\r\nConnection: close\r\nContent-Type: application/json\r\nContent-Length: {}\r\n",
            self.host,
            self.port,
            body.len()
        );
        if let Some(auth) = &self.auth {
            request.push_str(&format!("Authorization: Basic {auth}\r\n"));
        }
        request.push_str("\r\n");
        request.push_str(&body);

        debug!(method, port = self.port, "daemon rpc call");
        let mut stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|err| DaemonError::Transport(err.to_string()))?;
        stream
            .write_all(request.as_bytes())
            .await
            .map_err(|err| DaemonError::Transport(err.to_string()))?;

        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .await
            .map_err(|err| DaemonError::Transport(err.to_string()))?;

        let body = http_body(&raw)?;
        let response: Value = serde_json::from_slice(body)
            .map_err(|err| DaemonError::BadResponse(err.to_string()))?;
        if let Some(error) = response.get("error") {
            if !error.is_null() {
                return Err(DaemonError::Rpc(error.to_string()));
            }
        }
        response
            .get("result")
            .cloned()
            .ok_or_else(|| DaemonError::BadResponse("missing result field".to_string()))
    }
}

fn http_body(raw: &[u8]) -> Result<&[u8], DaemonError> {
    let split = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .ok_or_else(|| DaemonError::BadResponse("no header/body separator".to_string()))?;
    let head = std::str::from_utf8(&raw[..split])
        .map_err(|_| DaemonError::BadResponse("non-utf8 response headers".to_string()))?;
    let status = head.lines().next().unwrap_or_default();
    if !status.contains("200") {
        return Err(DaemonError::Rpc(format!("http status: {status}")));
    }
    Ok(&raw[split + 4..])
}

#[async_trait]
impl DaemonDriver for RpcDriver {
    async fn start(&self) -> Result<(), DaemonError> {
        // Connectivity probe; the real launch happens outside the node.
        self.call("getblockcount", json!([]))
            .await
            .map_err(|err| DaemonError::Startup(err.to_string()))?;
        Ok(())
    }

    async fn stop(&self) -> Result<(), DaemonError> {
        self.call("stop", json!([])).await?;
        Ok(())
    }

    async fn get_info(&self) -> Result<DaemonInfo, DaemonError> {
        let result = self.call("getblockcount", json!([])).await?;
        let height = result
            .as_u64()
            .ok_or_else(|| DaemonError::BadResponse("getblockcount is not a u64".to_string()))?;
        Ok(DaemonInfo { height })
    }

    async fn get_block(&self, block: BlockRef) -> Result<Vec<u8>, DaemonError> {
        let hash = match block {
            BlockRef::Hash(hash) => hash,
            BlockRef::Height(height) => {
                let result = self.call("getblockhash", json!([height])).await?;
                let hex = result.as_str().ok_or_else(|| {
                    DaemonError::BadResponse("getblockhash is not a string".to_string())
                })?;
                hex.parse::<BlockHash>()
                    .map_err(|_| DaemonError::BadResponse(format!("bad block hash: {hex}")))?
            }
        };

        // verbosity 0 returns the raw block as hex
        let result = self.call("getblock", json!([hash.to_hex(), 0])).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| DaemonError::BadResponse("getblock is not a string".to_string()))?;
        hex::decode(hex).map_err(|err| DaemonError::BadResponse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_http_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"result\":5}";
        let body = http_body(raw).expect("body");
        assert_eq!(body, b"{\"result\":5}");
    }

    #[test]
    fn rejects_non_200_status() {
        let raw = b"HTTP/1.1 401 Unauthorized\r\n\r\n";
        assert!(matches!(http_body(raw), Err(DaemonError::Rpc(_))));
    }
}

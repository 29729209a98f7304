use std::process::Stdio;

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;

use crate::config::{Config, DownloadClientKind};
use crate::pipeline::DownloadTrigger;

/// Response from Transmission RPC
#[derive(Debug, Deserialize)]
struct TransmissionResponse {
    result: String,
}

/// Starts downloads by running an external program with the magnet as last argument
#[derive(Debug, Clone)]
pub struct RemoteCommand {
    program: String,
    args: Vec<String>,
}

impl RemoteCommand {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }

    /// `<program> -a <magnet>`, the transmission-remote calling convention
    pub fn transmission_remote(program: &str) -> Self {
        Self::new(program, vec!["-a".to_string()])
    }
}

impl DownloadTrigger for RemoteCommand {
    async fn start(&self, magnet: &str) -> Result<()> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(magnet)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .status()
            .await
            .with_context(|| format!("Failed to run {}", self.program))?;

        if status.success() {
            Ok(())
        } else {
            Err(anyhow!("{} exited with {}", self.program, status))
        }
    }
}

/// Starts downloads through Transmission's JSON-RPC interface
#[derive(Debug, Clone)]
pub struct TransmissionRpc {
    client: Client,
    url: String,
    download_dir: Option<String>,
}

impl TransmissionRpc {
    pub fn new(client: Client, url: &str, download_dir: Option<String>) -> Self {
        Self {
            client,
            url: url.to_string(),
            download_dir,
        }
    }

    /// Get the Transmission session ID for RPC calls
    async fn get_session_id(&self) -> Result<String> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to reach Transmission at {}", self.url))?;

        let session_id = resp
            .headers()
            .get("X-Transmission-Session-Id")
            .ok_or_else(|| anyhow!("Missing X-Transmission-Session-Id header"))?
            .to_str()
            .map_err(|_| anyhow!("Invalid X-Transmission-Session-Id header"))?
            .to_string();

        Ok(session_id)
    }
}

impl DownloadTrigger for TransmissionRpc {
    async fn start(&self, magnet: &str) -> Result<()> {
        let session_id = self.get_session_id().await?;

        let mut arguments = json!({ "filename": magnet });
        if let Some(dir) = &self.download_dir {
            arguments["download-dir"] = json!(dir);
        }
        let body = json!({ "method": "torrent-add", "arguments": arguments });

        let text = self
            .client
            .post(&self.url)
            .header("X-Transmission-Session-Id", &session_id)
            .json(&body)
            .send()
            .await
            .context("Failed to send torrent-add")?
            .text()
            .await?;

        let response: TransmissionResponse = serde_json::from_str(&text).map_err(|e| {
            anyhow!("Failed to parse torrent-add response: {} - Response: {}", e, text)
        })?;

        if response.result == "success" {
            Ok(())
        } else {
            Err(anyhow!("Failed to add torrent: {}", response.result))
        }
    }
}

/// The download client selected by configuration
#[derive(Debug, Clone)]
pub enum DownloadClient {
    Remote(RemoteCommand),
    Rpc(TransmissionRpc),
}

impl DownloadClient {
    pub fn from_config(config: &Config, client: Client) -> Self {
        match config.download_client {
            DownloadClientKind::Remote => {
                DownloadClient::Remote(RemoteCommand::transmission_remote(&config.download_command))
            }
            DownloadClientKind::Rpc => DownloadClient::Rpc(TransmissionRpc::new(
                client,
                &config.transmission_rpc_url(),
                config.transmission_download_dir.clone(),
            )),
        }
    }
}

impl DownloadTrigger for DownloadClient {
    async fn start(&self, magnet: &str) -> Result<()> {
        match self {
            DownloadClient::Remote(command) => command.start(magnet).await,
            DownloadClient::Rpc(rpc) => rpc.start(magnet).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MAGNET: &str = "magnet:?xt=urn:btih:0123456789abcdef";

    #[tokio::test]
    async fn test_remote_command_success() {
        let command = RemoteCommand::new("true", vec!["-a".to_string()]);
        assert!(command.start(MAGNET).await.is_ok());
    }

    #[tokio::test]
    async fn test_remote_command_failure_status() {
        let command = RemoteCommand::new("false", vec![]);
        let err = command.start(MAGNET).await.unwrap_err();
        assert!(err.to_string().contains("false exited"));
    }

    #[tokio::test]
    async fn test_remote_command_missing_program() {
        let command = RemoteCommand::transmission_remote("/nonexistent/transmission-remote");
        assert!(command.start(MAGNET).await.is_err());
    }

    #[tokio::test]
    async fn test_rpc_adds_torrent_with_session() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/transmission/rpc"))
            .respond_with(
                ResponseTemplate::new(409).insert_header("X-Transmission-Session-Id", "sess-1"),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .and(header("X-Transmission-Session-Id", "sess-1"))
            .and(body_json(json!({
                "method": "torrent-add",
                "arguments": { "filename": MAGNET, "download-dir": "/data/downloads" }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"arguments":{"torrent-added":{"id":1}},"result":"success"}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let rpc = TransmissionRpc::new(
            Client::new(),
            &format!("{}/transmission/rpc", server.uri()),
            Some("/data/downloads".to_string()),
        );

        assert!(rpc.start(MAGNET).await.is_ok());
    }

    #[tokio::test]
    async fn test_rpc_reports_failure_result() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(409).insert_header("X-Transmission-Session-Id", "sess-2"),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"result":"invalid or corrupt torrent file"}"#),
            )
            .mount(&server)
            .await;

        let url = format!("{}/transmission/rpc", server.uri());
        let rpc = TransmissionRpc::new(Client::new(), &url, None);

        let err = rpc.start(MAGNET).await.unwrap_err();
        assert!(err.to_string().contains("invalid or corrupt"));
    }
}

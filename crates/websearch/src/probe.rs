//! Health checks for the self-hosted search backend.

use crate::client::{fetch_self_hosted, SelfHostedError};
use std::process::Stdio;
use std::time::Duration;

/// Query sent by the reachability ping.
pub const PING_QUERY: &str = "ping";

/// Capability and reachability checks used by the resolver.
#[async_trait::async_trait]
pub trait HealthProbe: Send + Sync {
    /// Is the container runtime client installed and talking to its daemon?
    /// `Err` carries a short reason.
    async fn runtime_available(&self) -> Result<(), String>;

    /// Does the self-hosted service answer a JSON search request?
    async fn ping(&self, endpoint: &str) -> Result<(), SelfHostedError>;
}

/// Probe that shells out to the runtime client and pings over HTTP.
#[derive(Debug, Clone)]
pub struct SystemProbe {
    runtime_command: String,
    client: reqwest::Client,
    timeout: Duration,
}

impl SystemProbe {
    pub fn new(runtime_command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runtime_command: runtime_command.into(),
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait::async_trait]
impl HealthProbe for SystemProbe {
    async fn runtime_available(&self) -> Result<(), String> {
        let mut command = tokio::process::Command::new(&self.runtime_command);
        command
            .arg("info")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true);

        let status = match tokio::time::timeout(self.timeout, command.status()).await {
            Err(_) => {
                return Err(format!(
                    "`{} info` did not answer within {}s",
                    self.runtime_command,
                    self.timeout.as_secs()
                ))
            }
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(format!("`{}` is not installed", self.runtime_command))
            }
            Ok(Err(e)) => return Err(format!("could not run `{}`: {}", self.runtime_command, e)),
            Ok(Ok(status)) => status,
        };

        if status.success() {
            tracing::debug!("Container runtime `{}` is available", self.runtime_command);
            Ok(())
        } else {
            Err(format!(
                "`{} info` failed, the daemon is probably not running",
                self.runtime_command
            ))
        }
    }

    async fn ping(&self, endpoint: &str) -> Result<(), SelfHostedError> {
        fetch_self_hosted(&self.client, endpoint, PING_QUERY, self.timeout)
            .await
            .map(|_| ())
    }
}

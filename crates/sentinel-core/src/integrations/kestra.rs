//! Kestra workflow trigger.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

use super::WorkflowTrigger;
use crate::config::KestraConfig;
use crate::error::{ConnectorError, ConnectorResult};

const SERVICE: &str = "kestra";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Kestra-backed `WorkflowTrigger`.
///
/// The overall call timeout is applied by the orchestrator; only the connect
/// phase is bounded here.
pub struct KestraTrigger {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    namespace: String,
    flow_id: String,
}

impl KestraTrigger {
    pub fn new(config: &KestraConfig) -> ConnectorResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            namespace: config.namespace.clone(),
            flow_id: config.flow_id.clone(),
        })
    }

    /// Send with auth, turning non-2xx responses into `ConnectorError::Status`.
    async fn execute(&self, req: reqwest::RequestBuilder) -> ConnectorResult<reqwest::Response> {
        let req = match &self.api_key {
            Some(key) => req.bearer_auth(key),
            None => req,
        };

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ConnectorError::Status {
                service: SERVICE,
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp)
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> ConnectorResult<T> {
        self.execute(req)
            .await?
            .json()
            .await
            .map_err(|e| ConnectorError::invalid_response(SERVICE, e.to_string()))
    }
}

#[async_trait]
impl WorkflowTrigger for KestraTrigger {
    async fn trigger_incident_flow(&self, incident_id: &str, payload: &Value) -> ConnectorResult<String> {
        let url = format!(
            "{}/api/v1/executions/{}/{}",
            self.base_url, self.namespace, self.flow_id
        );
        let body = json!({
            "inputs": {
                "incident_id": incident_id,
                "incident_data": payload,
            }
        });

        debug!(incident_id, %url, "Triggering Kestra flow");
        let data: Value = self.send(self.client.post(&url).json(&body)).await?;

        data.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ConnectorError::invalid_response(SERVICE, "execution response has no id"))
    }

    async fn execution_status(&self, execution_id: &str) -> ConnectorResult<Value> {
        let url = format!("{}/api/v1/executions/{}", self.base_url, execution_id);
        self.send(self.client.get(&url)).await
    }

    async fn execution_logs(&self, execution_id: &str) -> ConnectorResult<String> {
        let url = format!("{}/api/v1/executions/{}/logs", self.base_url, execution_id);
        Ok(self.execute(self.client.get(&url)).await?.text().await?)
    }
}

//! JSON-over-HTTP transport (API Gateway style endpoints).

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::StatusCode;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use url::Url;

use super::Invoker;
use crate::dispatch::DispatchError;

/// POSTs the payload and reads a JSON body back.
#[derive(Debug, Clone)]
pub struct HttpInvoker {
    client: Client,
    url: Url,
    label: String,
}

impl HttpInvoker {
    pub fn connect(url: Url, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            label: url.to_string(),
            url,
        })
    }
}

impl Invoker for HttpInvoker {
    fn target(&self) -> &str {
        &self.label
    }

    fn invoke(&self, payload: &Value) -> Result<Value, DispatchError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(payload)
            .send()
            .map_err(|e| DispatchError::unavailable(&self.label, describe(&e)))?;

        let status = response.status();
        let text = response
            .text()
            .map_err(|e| DispatchError::unavailable(&self.label, describe(&e)))?;
        interpret(status, &text).map_err(|err| match err {
            Interpreted::Unavailable(msg) => DispatchError::unavailable(&self.label, msg),
            Interpreted::Garbled(msg) => DispatchError::backend(&self.label, msg),
        })
    }
}

#[derive(Debug, PartialEq)]
enum Interpreted {
    Unavailable(String),
    Garbled(String),
}

/// Map a status and body onto a JSON response. Failed calls keep their
/// message under `error` so the dispatcher reports them like any other.
fn interpret(status: StatusCode, text: &str) -> Result<Value, Interpreted> {
    if matches!(
        status,
        StatusCode::BAD_GATEWAY | StatusCode::SERVICE_UNAVAILABLE | StatusCode::GATEWAY_TIMEOUT
    ) {
        return Err(Interpreted::Unavailable(format!("HTTP {status}")));
    }

    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(mut map)) => {
            if !status.is_success()
                && !map.contains_key("error")
                && !map.contains_key("errorMessage")
            {
                map.insert("error".to_string(), Value::String(format!("HTTP {status}")));
            }
            Ok(Value::Object(map))
        }
        Ok(other) if status.is_success() => Ok(other),
        Ok(_) | Err(_) if !status.is_success() => {
            Ok(json!({ "error": format!("HTTP {status}: {}", text.trim()) }))
        }
        Ok(_) | Err(_) => Err(Interpreted::Garbled("response body is not JSON".to_string())),
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        format!("timed out: {err}")
    } else {
        err.to_string()
    }
}

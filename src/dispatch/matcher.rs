//! Clients for the hosted matcher and summarize functions.

use serde_json::{Value, json};
use tracing::{debug, info};

use super::DispatchError;
use super::OperationRef;
use super::envelope;
use crate::transport::Invoker;

/// Sends prompts to the matcher function and returns its raw answer.
pub struct Matcher {
    invoker: Box<dyn Invoker>,
}

impl Matcher {
    pub fn new(invoker: Box<dyn Invoker>) -> Self {
        Self { invoker }
    }

    pub fn target(&self) -> &str {
        self.invoker.target()
    }

    /// Raw answer for `prompt`; unwrapping is left to the dispatcher.
    pub fn ask(&self, prompt: &str, user_id: Option<&str>) -> Result<Value, DispatchError> {
        let mut payload = json!({ "prompt": prompt });
        if let Some(uid) = user_id {
            payload["user_id"] = Value::String(uid.to_string());
        }
        info!(endpoint = self.invoker.target(), "asking matcher");
        let raw = self.invoker.invoke(&payload)?;
        debug!(raw = %raw, "matcher answered");
        Ok(raw)
    }
}

/// Turns an executed result into prose via the summarize function.
pub struct Summarizer {
    invoker: Box<dyn Invoker>,
}

impl Summarizer {
    pub fn new(invoker: Box<dyn Invoker>) -> Self {
        Self { invoker }
    }

    pub fn summarize(&self, operation: &OperationRef, data: &Value) -> Result<String, DispatchError> {
        let payload = json!({ "data": data, "function_id": operation.as_str() });
        let response = envelope::open_body(self.invoker.invoke(&payload)?);
        if let Some(err) = response.get("error").filter(|v| !v.is_null()) {
            let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
            return Err(DispatchError::backend("summarize", message));
        }
        response
            .get("summary")
            .and_then(Value::as_str)
            .map(|s| s.trim().to_string())
            .ok_or_else(|| DispatchError::backend("summarize", "response has no summary"))
    }
}

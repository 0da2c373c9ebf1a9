//! AWS Lambda transport: synchronous `RequestResponse` invocations.

use std::rc::Rc;
use std::time::Duration;

use aws_config::SdkConfig;
use aws_sdk_lambda::error::DisplayErrorContext;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use serde_json::Value;
use tokio::runtime::Runtime;
use tracing::debug;

use super::Invoker;
use crate::dispatch::DispatchError;

pub struct LambdaInvoker {
    runtime: Rc<Runtime>,
    client: aws_sdk_lambda::Client,
    function: String,
    label: String,
    timeout: Duration,
}

impl LambdaInvoker {
    pub fn new(runtime: Rc<Runtime>, config: &SdkConfig, function: &str, timeout: Duration) -> Self {
        Self {
            runtime,
            client: aws_sdk_lambda::Client::new(config),
            function: function.to_string(),
            label: format!("lambda:{function}"),
            timeout,
        }
    }
}

/// Resolve region and credentials from the default provider chain.
pub fn load_sdk_config(runtime: &Runtime) -> SdkConfig {
    runtime.block_on(aws_config::load_defaults(aws_config::BehaviorVersion::latest()))
}

impl Invoker for LambdaInvoker {
    fn target(&self) -> &str {
        &self.label
    }

    fn invoke(&self, payload: &Value) -> Result<Value, DispatchError> {
        let body = serde_json::to_vec(payload)
            .map_err(|e| DispatchError::backend(&self.label, format!("payload encoding: {e}")))?;

        let request = self
            .client
            .invoke()
            .function_name(&self.function)
            .invocation_type(InvocationType::RequestResponse)
            .payload(Blob::new(body))
            .send();

        let output = self
            .runtime
            .block_on(async { tokio::time::timeout(self.timeout, request).await })
            .map_err(|_| {
                DispatchError::unavailable(
                    &self.label,
                    format!("timed out after {}s", self.timeout.as_secs()),
                )
            })?
            .map_err(|e| DispatchError::unavailable(&self.label, DisplayErrorContext(e).to_string()))?;

        let bytes: &[u8] = output.payload().map(|b| b.as_ref()).unwrap_or_default();
        debug!(function = %self.function, bytes = bytes.len(), "lambda returned");

        let function_error = output.function_error().map(str::to_string);
        decode_payload(bytes, function_error)
            .map_err(|message| DispatchError::backend(&self.label, message))
    }
}

/// Decode a Lambda response payload. A function error without an
/// `errorMessage` in the payload is recorded as one.
fn decode_payload(bytes: &[u8], function_error: Option<String>) -> Result<Value, String> {
    let parsed = if bytes.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice::<Value>(bytes) {
            Ok(v) => v,
            Err(_) if function_error.is_some() => {
                Value::String(String::from_utf8_lossy(bytes).into_owned())
            }
            Err(e) => return Err(format!("payload is not JSON: {e}")),
        }
    };

    let Some(kind) = function_error else {
        return Ok(parsed);
    };
    match parsed {
        Value::Object(mut map) => {
            map.entry("errorMessage")
                .or_insert_with(|| Value::String(kind));
            Ok(Value::Object(map))
        }
        Value::String(text) => Ok(serde_json::json!({ "errorMessage": text })),
        _ => Ok(serde_json::json!({ "errorMessage": kind })),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn plain_payload_decodes() {
        let v = decode_payload(br#"{"goals": []}"#, None).unwrap();
        assert_eq!(v, json!({"goals": []}));
    }

    #[test]
    fn function_error_keeps_its_message() {
        let v = decode_payload(
            br#"{"errorMessage": "'goal_id'", "errorType": "KeyError"}"#,
            Some("Unhandled".into()),
        )
        .unwrap();
        assert_eq!(v["errorMessage"], json!("'goal_id'"));
    }

    #[test]
    fn function_error_without_message() {
        let v = decode_payload(b"", Some("Unhandled".into())).unwrap();
        assert_eq!(v, json!({"errorMessage": "Unhandled"}));

        let v = decode_payload(b"Task timed out", Some("Unhandled".into())).unwrap();
        assert_eq!(v, json!({"errorMessage": "Task timed out"}));
    }

    #[test]
    fn garbage_payload_is_an_error() {
        assert!(decode_payload(b"<html>", None).is_err());
    }
}

//! Matcher answer shapes.
//!
//! The matcher may answer flat (`{function_id, parameters, ...}`) or inside an
//! HTTP-style envelope whose `body` holds a serialized copy, optionally with
//! the match nested under `matched_function`. [`RawMatch::classify`] decides
//! the shape once; [`unwrap`] flattens either one into a [`MatchResult`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::DispatchError;

const MATCHER: &str = "function_matcher";
const NESTED_MATCH: &str = "matched_function";

/// One matcher answer, flattened.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub function_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl MatchResult {
    /// Title for display, falling back to the function id.
    pub fn display_title(&self) -> &str {
        if self.title.trim().is_empty() {
            &self.function_id
        } else {
            &self.title
        }
    }

    /// The matcher answers `none`/`null` when nothing in the catalog fits.
    pub fn is_no_match(&self) -> bool {
        let id = self.function_id.trim().to_ascii_lowercase();
        matches!(id.as_str(), "none" | "null" | "no match")
    }
}

/// The two shapes a matcher answer arrives in.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMatch {
    Flat(Map<String, Value>),
    Enveloped {
        outer: Map<String, Value>,
        body: Map<String, Value>,
    },
}

impl RawMatch {
    /// Decide the shape of a raw matcher answer, parsing a serialized `body`.
    pub fn classify(raw: Value) -> Result<Self, DispatchError> {
        let Value::Object(outer) = raw else {
            return Err(DispatchError::malformed(format!(
                "expected a JSON object, got {}",
                type_name(&raw)
            )));
        };

        let status = status_code(&outer);
        if status == Some(404) {
            return Err(DispatchError::NoMatch);
        }

        let body = match outer.get("body") {
            None | Some(Value::Null) => return Ok(RawMatch::Flat(outer)),
            Some(Value::Object(map)) => map.clone(),
            Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => map,
                Ok(other) => {
                    return Err(DispatchError::malformed(format!(
                        "envelope body is a {}, expected an object",
                        type_name(&other)
                    )));
                }
                Err(_) if status.is_some_and(|s| s >= 400) => {
                    return Err(DispatchError::backend(MATCHER, text.clone()));
                }
                Err(e) => {
                    return Err(DispatchError::malformed(format!(
                        "envelope body is not valid JSON: {e}"
                    )));
                }
            },
            Some(other) => {
                return Err(DispatchError::malformed(format!(
                    "envelope body is a {}, expected serialized JSON",
                    type_name(other)
                )));
            }
        };

        Ok(RawMatch::Enveloped { outer, body })
    }

    /// Flatten into a [`MatchResult`]. Precedence: top level, then body,
    /// then a nested `matched_function`.
    pub fn into_match(self) -> Result<MatchResult, DispatchError> {
        let mut layers: Vec<&Map<String, Value>> = Vec::with_capacity(4);
        let nested_outer;
        let nested_body;
        match &self {
            RawMatch::Flat(map) => {
                layers.push(map);
                nested_outer = map.get(NESTED_MATCH).and_then(Value::as_object);
                nested_body = None;
            }
            RawMatch::Enveloped { outer, body } => {
                layers.push(outer);
                layers.push(body);
                nested_outer = outer.get(NESTED_MATCH).and_then(Value::as_object);
                nested_body = body.get(NESTED_MATCH).and_then(Value::as_object);
            }
        }
        layers.extend(nested_outer);
        layers.extend(nested_body);

        let function_id = match pick_id(&layers) {
            Some(Value::String(id)) => id.trim().to_string(),
            None => return Err(missing_function_id(&layers)),
            Some(other) => {
                return Err(DispatchError::malformed(format!(
                    "function_id is a {}, expected a string",
                    type_name(other)
                )));
            }
        };

        let parameters = match pick(&layers, "parameters") {
            None => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => map,
                _ => {
                    return Err(DispatchError::malformed(
                        "parameters is a string that does not hold a JSON object",
                    ));
                }
            },
            Some(other) => {
                return Err(DispatchError::malformed(format!(
                    "parameters is a {}, expected an object",
                    type_name(other)
                )));
            }
        };

        Ok(MatchResult {
            function_id,
            title: pick_text(&layers, "title"),
            description: pick_text(&layers, "description"),
            parameters,
        })
    }
}

/// Flatten a raw matcher answer of either shape.
pub fn unwrap(raw: Value) -> Result<MatchResult, DispatchError> {
    RawMatch::classify(raw)?.into_match()
}

/// Open an HTTP-style envelope around a backend response, if there is one.
///
/// Never fails: a body that is not JSON is kept as text, under `error` when
/// the status code says the call failed.
pub fn open_body(response: Value) -> Value {
    let Value::Object(map) = &response else {
        return response;
    };
    if !map.contains_key("statusCode") {
        return response;
    }
    let failed = status_code(map).is_some_and(|s| s >= 400);
    match map.get("body") {
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(inner)) => Value::Object(inner),
            _ if failed => serde_json::json!({ "error": text }),
            _ => response,
        },
        Some(Value::Object(inner)) => Value::Object(inner.clone()),
        _ => response,
    }
}

fn pick<'a>(layers: &[&'a Map<String, Value>], key: &str) -> Option<&'a Value> {
    layers
        .iter()
        .filter_map(|layer| layer.get(key))
        .find(|v| !v.is_null())
}

/// `function_id` lookup: blank strings count as absent so an empty outer
/// field does not hide the body's.
fn pick_id<'a>(layers: &[&'a Map<String, Value>]) -> Option<&'a Value> {
    layers
        .iter()
        .filter_map(|layer| layer.get("function_id"))
        .find(|v| match v {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn pick_text(layers: &[&Map<String, Value>], key: &str) -> String {
    match pick(layers, key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

fn missing_function_id(layers: &[&Map<String, Value>]) -> DispatchError {
    match pick(layers, "error").or_else(|| pick(layers, "errorMessage")) {
        Some(Value::String(msg)) if msg.to_ascii_lowercase().contains("no matching") => {
            DispatchError::NoMatch
        }
        Some(Value::String(msg)) => DispatchError::backend(MATCHER, msg.clone()),
        Some(other) => DispatchError::backend(MATCHER, other.to_string()),
        None => DispatchError::malformed("response carries no function_id"),
    }
}

fn status_code(map: &Map<String, Value>) -> Option<u64> {
    map.get("statusCode").and_then(Value::as_u64)
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

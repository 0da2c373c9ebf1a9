//! Response schemas and normalization.
//!
//! Each domain declares where its records live (`list_key`), which generic
//! keys to fall back to, and the fields of one record. [`normalize`] only
//! consults that descriptor; it never guesses from whatever key is present.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::OperationRef;
use super::alias::Domain;

/// Generic keys tried when a backend omits its domain key.
pub const FALLBACK_KEYS: &[&str] = &["items", "Items"];

/// One record field, with the alternative spellings backends use.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub label: &'static str,
    pub keys: &'static [&'static str],
    pub numeric: bool,
}

impl FieldSpec {
    const fn text(label: &'static str, keys: &'static [&'static str]) -> Self {
        Self {
            label,
            keys,
            numeric: false,
        }
    }

    const fn number(label: &'static str, keys: &'static [&'static str]) -> Self {
        Self {
            label,
            keys,
            numeric: true,
        }
    }

    /// First non-null value under any of this field's keys.
    pub fn get<'a>(&self, item: &'a Value) -> Option<&'a Value> {
        self.keys
            .iter()
            .filter_map(|k| item.get(*k))
            .find(|v| !v.is_null())
    }

    /// Render for display. Missing numbers are `0`, missing text is empty.
    pub fn render(&self, item: &Value) -> String {
        match self.get(item) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None if self.numeric => "0".to_string(),
            None => String::new(),
        }
    }
}

/// Record shapes, one per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemShape {
    Subscription,
    Product,
    Goal,
}

const SUBSCRIPTION_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", &["name"]),
    FieldSpec::number("amount", &["amount"]),
    FieldSpec::text("frequency", &["frequency"]),
];

const PRODUCT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", &["name"]),
    FieldSpec::text("description", &["description"]),
    FieldSpec::number("min", &["min_amount", "minimum_amount"]),
    FieldSpec::number("max", &["max_amount", "maximum_amount"]),
];

const GOAL_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("name", &["name"]),
    FieldSpec::number("current", &["current_amount"]),
    FieldSpec::number("target", &["target_amount"]),
    FieldSpec::text("due_date", &["due_date"]),
];

impl ItemShape {
    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            ItemShape::Subscription => SUBSCRIPTION_FIELDS,
            ItemShape::Product => PRODUCT_FIELDS,
            ItemShape::Goal => GOAL_FIELDS,
        }
    }

    /// Render the field with `label` from `item`; unknown labels render empty.
    pub fn render(self, item: &Value, label: &str) -> String {
        self.fields()
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.render(item))
            .unwrap_or_default()
    }
}

/// Where a domain's records live in a raw response.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSchema {
    pub list_key: &'static str,
    pub fallback_keys: &'static [&'static str],
    pub shape: Option<ItemShape>,
}

impl ResponseSchema {
    pub fn for_domain(domain: Domain) -> Self {
        let shape = match domain {
            Domain::Subscriptions => ItemShape::Subscription,
            Domain::Products => ItemShape::Product,
            Domain::Goals => ItemShape::Goal,
        };
        Self {
            list_key: domain.as_str(),
            fallback_keys: FALLBACK_KEYS,
            shape: Some(shape),
        }
    }

    /// Schema for operations outside the alias table.
    pub fn generic() -> Self {
        Self {
            list_key: FALLBACK_KEYS[0],
            fallback_keys: &FALLBACK_KEYS[1..],
            shape: None,
        }
    }

    pub fn for_operation(operation: &OperationRef) -> Self {
        match operation {
            OperationRef::Known(op) => Self::for_domain(op.domain()),
            OperationRef::Unresolved(_) => Self::generic(),
        }
    }
}

/// Backend result with its records under one predictable key.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedResult {
    pub operation: OperationRef,
    pub key: &'static str,
    pub items: Vec<Value>,
    /// Which raw key the records came from, if any.
    pub source_key: Option<&'static str>,
    /// Status/message line from write operations.
    pub status: Option<String>,
}

impl NormalizedResult {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(self.key.to_string(), Value::Array(self.items.clone()));
        if let Some(status) = &self.status {
            map.insert("status".to_string(), Value::String(status.clone()));
        }
        Value::Object(map)
    }
}

/// Pull the operation's record list out of a raw backend response.
///
/// Never fails: absent or non-list data normalizes to an empty list.
pub fn normalize(operation: &OperationRef, raw: &Value) -> NormalizedResult {
    let schema = ResponseSchema::for_operation(operation);

    let candidates = std::iter::once(schema.list_key).chain(schema.fallback_keys.iter().copied());
    let mut items = Vec::new();
    let mut source_key = None;
    for key in candidates {
        match raw.get(key) {
            Some(Value::Array(list)) => {
                items = list.clone();
                source_key = Some(key);
                break;
            }
            Some(Value::Null) | None => continue,
            Some(other) => {
                warn!(key, kind = ?other, "response key is not a list; ignoring");
            }
        }
    }

    let status = ["status", "message"]
        .iter()
        .find_map(|k| raw.get(*k).and_then(Value::as_str))
        .map(str::to_string);

    debug!(
        operation = %operation,
        key = schema.list_key,
        source = source_key.unwrap_or("-"),
        count = items.len(),
        "normalized backend response"
    );

    NormalizedResult {
        operation: operation.clone(),
        key: schema.list_key,
        items,
        source_key,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::alias::Operation;
    use serde_json::json;

    fn known(op: Operation) -> OperationRef {
        OperationRef::Known(op)
    }

    #[test]
    fn domain_key_is_preferred() {
        let raw = json!({"subscriptions": [{"name": "Spotify"}], "items": [{"name": "x"}, {"name": "y"}]});
        let n = normalize(&known(Operation::GetSubscriptions), &raw);
        assert_eq!(n.key, "subscriptions");
        assert_eq!(n.items.len(), 1);
        assert_eq!(n.source_key, Some("subscriptions"));
    }

    #[test]
    fn falls_back_to_items_then_dynamo_items() {
        let n = normalize(&known(Operation::GetGoals), &json!({"items": [{"name": "Car"}]}));
        assert_eq!(n.key, "goals");
        assert_eq!(n.items.len(), 1);
        assert_eq!(n.source_key, Some("items"));

        let n = normalize(&known(Operation::GetProducts), &json!({"Items": [{}, {}]}));
        assert_eq!(n.items.len(), 2);
        assert_eq!(n.source_key, Some("Items"));
    }

    #[test]
    fn absent_data_is_an_empty_list() {
        let responses = [
            json!({}),
            json!({"unrelated": [1, 2]}),
            json!({"products": null}),
            json!({"products": "oops"}),
            json!(null),
            json!([1, 2, 3]),
            json!("text"),
        ];
        for raw in responses {
            let n = normalize(&known(Operation::GetProducts), &raw);
            assert!(n.is_empty(), "expected empty list for {raw}");
            assert_eq!(n.to_json(), json!({"products": []}));
        }
    }

    #[test]
    fn unresolved_operations_use_generic_items() {
        let op = OperationRef::Unresolved("list_loans".into());
        let n = normalize(&op, &json!({"items": [{"name": "Auto"}]}));
        assert_eq!(n.key, "items");
        assert_eq!(n.items.len(), 1);

        let n = normalize(&op, &json!({"loans": [{"name": "Auto"}]}));
        assert!(n.is_empty());
    }

    #[test]
    fn write_status_is_kept() {
        let n = normalize(&known(Operation::PutGoal), &json!({"status": "put success"}));
        assert!(n.is_empty());
        assert_eq!(n.status.as_deref(), Some("put success"));
        assert_eq!(n.to_json(), json!({"goals": [], "status": "put success"}));
    }

    #[test]
    fn fields_render_defaults() {
        let item = json!({"name": "Emergency Fund", "target_amount": 10000});
        let shape = ItemShape::Goal;
        assert_eq!(shape.render(&item, "name"), "Emergency Fund");
        assert_eq!(shape.render(&item, "current"), "0");
        assert_eq!(shape.render(&item, "target"), "10000");
        assert_eq!(shape.render(&item, "due_date"), "");
    }

    #[test]
    fn product_amount_spellings() {
        let shape = ItemShape::Product;
        let a = json!({"min_amount": 100, "max_amount": 500});
        let b = json!({"minimum_amount": 100, "maximum_amount": 500});
        assert_eq!(shape.render(&a, "min"), shape.render(&b, "min"));
        assert_eq!(shape.render(&a, "max"), "500");
    }
}

//! Presenter: plain-text and JSON renderings of dispatch outcomes.
//!
//! Everything here is pure formatting. Styling (color, boxes) is added by
//! the command layer on top of these lines.

use serde_json::{Value, json};

use crate::dispatch::alias::Operation;
use crate::dispatch::normalize::{ItemShape, NormalizedResult, ResponseSchema};
use crate::dispatch::{DispatchError, OperationRef, Outcome, Plan};

pub const NO_MATCH_MESSAGE: &str = "I'm not equipped to help with that request. Try rephrasing or ask about subscriptions, products, or goals.";

/// Section heading for a result, if its operation has a formatter.
pub fn heading(result: &NormalizedResult) -> Option<&'static str> {
    match result.operation.known()? {
        Operation::GetSubscriptions => Some("Subscriptions"),
        Operation::GetProducts => Some("Available Products"),
        Operation::GetGoals => Some("Financial Goals"),
        Operation::PutGoal | Operation::DeleteGoal => None,
    }
}

/// Human-readable lines for an executed result. `raw` is dumped as-is for
/// operations without a formatter.
pub fn result_lines(result: &NormalizedResult, raw: &Value) -> Vec<String> {
    let schema = ResponseSchema::for_operation(&result.operation);
    let (Some(op), Some(shape)) = (result.operation.known(), schema.shape) else {
        return dump(raw);
    };

    if op.is_write() {
        let status = result.status.as_deref().unwrap_or("No message");
        return vec![format!("Operation successful: {status}")];
    }

    if result.is_empty() {
        return vec![format!("No {} found.", result.key)];
    }

    let mut lines = Vec::with_capacity(result.items.len());
    for item in &result.items {
        let f = |label| shape.render(item, label);
        match shape {
            ItemShape::Subscription => {
                lines.push(format!("{}: ${}/{}", f("name"), f("amount"), f("frequency")));
            }
            ItemShape::Product => {
                lines.push(format!("{}: {}", f("name"), f("description")));
                lines.push(format!("  Amount Range: ${} - ${}", f("min"), f("max")));
            }
            ItemShape::Goal => {
                lines.push(format!(
                    "{}: ${} / ${} (Due: {})",
                    f("name"),
                    f("current"),
                    f("target"),
                    f("due_date")
                ));
            }
        }
    }
    lines
}

/// Lines shown when execution is skipped: what matched and what would be sent.
pub fn plan_lines(plan: &Plan) -> Vec<String> {
    let description = if plan.matched.description.trim().is_empty() {
        "(No description)"
    } else {
        plan.matched.description.as_str()
    };
    let params = serde_json::to_string_pretty(&plan.request.parameters)
        .unwrap_or_else(|_| "{}".to_string());

    let mut lines = vec![
        format!("Function: {}", plan.matched.display_title()),
        format!("Description: {description}"),
    ];
    if plan.request.operation.as_str() != plan.matched.function_id {
        lines.push(format!("Operation: {}", plan.request.operation));
    }
    let mut param_lines = params.lines();
    if let Some(first) = param_lines.next() {
        lines.push(format!("Parameters: {first}"));
    }
    lines.extend(param_lines.map(str::to_string));
    lines
}

/// Machine-readable document for one prompt. The raw backend response is
/// only included with `include_raw`.
pub fn outcome_json(
    prompt: &str,
    user_id: &str,
    outcome: &Outcome,
    elapsed_ms: u128,
    include_raw: bool,
) -> Value {
    let plan = outcome.plan();
    let mut doc = json!({
        "status": "ok",
        "prompt": prompt,
        "user_id": user_id,
        "elapsed_ms": elapsed_ms,
        "match": plan.matched,
        "invocation": plan.request.to_json(),
    });
    if let Outcome::Executed { raw, result, .. } = outcome {
        doc["executed"] = json!(true);
        doc["result"] = result.to_json();
        if include_raw {
            doc["raw"] = raw.clone();
        }
    } else {
        doc["executed"] = json!(false);
    }
    doc
}

/// `{"status": "error", "kind": .., "error": ..}`, the batch-mode failure document.
pub fn error_document(kind: &str, message: &str) -> Value {
    json!({ "status": "error", "kind": kind, "error": message })
}

pub fn error_json(err: &DispatchError) -> Value {
    error_document(err.kind(), &user_message(err))
}

/// What the user sees for a failed prompt.
pub fn user_message(err: &DispatchError) -> String {
    match err {
        DispatchError::NoMatch => NO_MATCH_MESSAGE.to_string(),
        DispatchError::UnknownFunction { message, .. } => message.clone(),
        other => other.to_string(),
    }
}

/// Whether this operation uses one of the dedicated formatters.
pub fn has_formatter(operation: &OperationRef) -> bool {
    operation.known().is_some()
}

fn dump(raw: &Value) -> Vec<String> {
    serde_json::to_string_pretty(raw)
        .unwrap_or_else(|_| raw.to_string())
        .lines()
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::envelope::MatchResult;
    use crate::dispatch::normalize::normalize;
    use crate::dispatch::resolve;

    fn run(op: Operation, raw: Value) -> Vec<String> {
        let op = OperationRef::Known(op);
        let n = normalize(&op, &raw);
        result_lines(&n, &raw)
    }

    #[test]
    fn subscriptions_one_line_each() {
        let raw = json!({"subscriptions": [
            {"name": "Spotify", "amount": 9.99, "frequency": "monthly", "category": "streaming"},
            {"name": "Netflix", "amount": 15.99, "frequency": "monthly", "category": "streaming"}
        ]});
        assert_eq!(
            run(Operation::GetSubscriptions, raw),
            vec!["Spotify: $9.99/monthly", "Netflix: $15.99/monthly"]
        );
    }

    #[test]
    fn products_render_blocks() {
        let raw = json!({"products": [
            {"name": "High-Yield Savings", "description": "Competitive rates", "min_amount": 100, "max_amount": 1000000}
        ]});
        assert_eq!(
            run(Operation::GetProducts, raw),
            vec![
                "High-Yield Savings: Competitive rates",
                "  Amount Range: $100 - $1000000"
            ]
        );
    }

    #[test]
    fn goals_render_progress_and_due_date() {
        let raw = json!({"goals": [
            {"name": "Emergency Fund", "current_amount": 5000, "target_amount": 10000, "due_date": "2025-12-31"}
        ]});
        assert_eq!(
            run(Operation::GetGoals, raw),
            vec!["Emergency Fund: $5000 / $10000 (Due: 2025-12-31)"]
        );
    }

    #[test]
    fn partial_records_use_defaults() {
        let lines = run(Operation::GetGoals, json!({"goals": [{"name": "Car"}]}));
        assert_eq!(lines, vec!["Car: $0 / $0 (Due: )"]);

        let lines = run(Operation::GetSubscriptions, json!({"items": [{}]}));
        assert_eq!(lines, vec![": $0/"]);
    }

    #[test]
    fn empty_results_say_so() {
        assert_eq!(run(Operation::GetProducts, json!({})), vec!["No products found."]);
        assert_eq!(
            run(Operation::GetSubscriptions, json!({"subscriptions": []})),
            vec!["No subscriptions found."]
        );
    }

    #[test]
    fn write_operations_report_status() {
        assert_eq!(
            run(Operation::PutGoal, json!({"status": "put success"})),
            vec!["Operation successful: put success"]
        );
        assert_eq!(
            run(Operation::DeleteGoal, json!({})),
            vec!["Operation successful: No message"]
        );
    }

    #[test]
    fn unknown_operations_dump_raw() {
        let op = OperationRef::Unresolved("list_loans".into());
        let raw = json!({"loans": [1]});
        let lines = result_lines(&normalize(&op, &raw), &raw);
        assert_eq!(lines.join("\n"), serde_json::to_string_pretty(&raw).unwrap());
        assert!(!has_formatter(&op));
    }

    #[test]
    fn plan_shows_title_description_parameters() {
        let matched = MatchResult {
            function_id: "manage_goals".into(),
            title: "Manage Financial Goals".into(),
            description: String::new(),
            parameters: Default::default(),
        };
        let plan = Plan {
            request: resolve(&matched),
            matched,
        };
        let lines = plan_lines(&plan);
        assert_eq!(lines[0], "Function: Manage Financial Goals");
        assert_eq!(lines[1], "Description: (No description)");
        assert_eq!(lines[2], "Operation: get_goals");
        let text = lines.join("\n");
        assert!(text.contains("\"action\": \"get\""));
    }

    #[test]
    fn json_document_carries_plan_and_result() {
        let matched = MatchResult {
            function_id: "get_products".into(),
            ..Default::default()
        };
        let plan = Plan {
            request: resolve(&matched),
            matched,
        };
        let raw = json!({"Items": [{"name": "Auto Loan"}]});
        let op = plan.request.operation.clone();
        let outcome = Outcome::Executed {
            plan,
            result: normalize(&op, &raw),
            raw,
        };

        let doc = outcome_json("loans?", "u1", &outcome, 12, false);
        assert_eq!(doc["status"], json!("ok"));
        assert_eq!(doc["executed"], json!(true));
        assert_eq!(doc["match"]["function_id"], json!("get_products"));
        assert_eq!(doc["invocation"]["operation"], json!("get_products"));
        assert!(doc.get("raw").is_none());

        let doc = outcome_json("loans?", "u1", &outcome, 12, true);
        assert_eq!(doc["raw"]["Items"][0]["name"], json!("Auto Loan"));
    }

    #[test]
    fn no_match_has_a_friendly_message() {
        let v = error_json(&DispatchError::NoMatch);
        assert_eq!(v["kind"], json!("no_match"));
        assert_eq!(v["error"], json!(NO_MATCH_MESSAGE));
    }

    #[test]
    fn unknown_function_message_is_verbatim() {
        let err = DispatchError::unknown_function("x", "Unknown function ID: x");
        assert_eq!(user_message(&err), "Unknown function ID: x");
    }
}

/*!
`aliases.rs`

Prints the alias table: every function id and catalog title the matcher
may answer with, the operation(s) it resolves to, the defaults merged into
the call, and the backend domain.

  finassist aliases
  finassist aliases --json
*/

use anyhow::Result;
use clap::Args;
use serde_json::{Value, json};

use crate::cmd::format::{StyleOptions, box_header, table};
use crate::cmd::shared::pretty;
use crate::dispatch::alias::{Alias, IntentRule, Operation};

#[derive(Args, Debug)]
pub struct AliasesArgs {
    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub fn execute_aliases(args: AliasesArgs) -> Result<()> {
    if args.json {
        println!("{}", pretty(&alias_table_json()));
        return Ok(());
    }

    let style = StyleOptions::detect();
    println!(
        "{}",
        box_header(
            "Alias Table",
            Some(format!("{} aliases", Alias::ALL.len())),
            &style
        )
    );
    println!(
        "{}",
        table(
            &["FUNCTION ID", "TITLES", "OPERATION", "DEFAULTS", "RULE"],
            &alias_rows(),
            &style
        )
    );
    Ok(())
}

fn rule_label(rule: IntentRule) -> &'static str {
    match rule {
        IntentRule::Fixed(_) => "fixed",
        IntentRule::GoalIntent => "action > goal (put) > goal_id (delete) > get",
    }
}

fn defaults_label(op: Operation) -> String {
    op.defaults()
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn alias_rows() -> Vec<Vec<String>> {
    Alias::ALL
        .iter()
        .map(|alias| {
            let ops = alias.rule().candidates();
            vec![
                alias.function_id().to_string(),
                alias.titles().join(", "),
                ops.iter().map(|o| o.as_str()).collect::<Vec<_>>().join(" | "),
                ops.iter()
                    .map(|o| defaults_label(*o))
                    .filter(|d| !d.is_empty())
                    .collect::<Vec<_>>()
                    .join(" | "),
                rule_label(alias.rule()).to_string(),
            ]
        })
        .collect()
}

fn alias_table_json() -> Value {
    let aliases: Vec<Value> = Alias::ALL
        .iter()
        .map(|alias| {
            let operations: Vec<Value> = alias
                .rule()
                .candidates()
                .into_iter()
                .map(|op| {
                    let defaults: serde_json::Map<String, Value> = op
                        .defaults()
                        .iter()
                        .map(|(k, v)| (k.to_string(), json!(v)))
                        .collect();
                    json!({
                        "operation": op.as_str(),
                        "domain": op.domain().as_str(),
                        "defaults": defaults,
                    })
                })
                .collect();
            json!({
                "function_id": alias.function_id(),
                "titles": alias.titles(),
                "rule": rule_label(alias.rule()),
                "operations": operations,
            })
        })
        .collect();
    json!({ "status": "ok", "count": aliases.len(), "aliases": aliases })
}

/*!
`ask.rs`

One prompt, one answer, then exit. Non-zero exit on any failure.

  finassist ask "Show me all my monthly subscriptions"
  finassist ask "What are my goals?" --user-id u42 --json
  finassist ask "Which loans do you offer?" --skip-execution
  finassist ask "Summarize my subscriptions" --summarize --raw

JSON success output:
{
  "status": "ok",
  "prompt": "...",
  "user_id": "...",
  "elapsed_ms": 42,
  "executed": true,
  "match": { "function_id": ..., "title": ..., "description": ..., "parameters": {...} },
  "invocation": { "operation": ..., "parameters": {...}, "alias": ... },
  "result": { "<subscriptions|products|goals|items>": [...] },
  "raw": { ... },            (--raw only)
  "summary": "..."           (--summarize only)
}

JSON error output:
{ "status": "error", "kind": "<no_match|backend_error|...>", "error": "message" }
*/

use anyhow::Result;
use clap::Args;
use serde_json::Value;
use std::time::Instant;
use tracing::warn;

use crate::cmd::format::{Role, StyleOptions, color, emoji};
use crate::cmd::shared::{
    GlobalOpts, Session, dispatch_error, human_outcome, human_summary, output_error, pretty,
};
use crate::dispatch::{Mode, Outcome};
use crate::present;

#[derive(Args, Debug)]
pub struct AskArgs {
    /// What to ask, e.g. "Show me my financial goals"
    #[arg(value_name = "PROMPT", required = true, num_args = 1..)]
    pub prompt: Vec<String>,

    /// User the request is made for (defaults to the configured user)
    #[arg(short = 'u', long = "user-id", value_name = "ID")]
    pub user_id: Option<String>,

    /// Stop after matching and show what would be called
    #[arg(long)]
    pub skip_execution: bool,

    /// Output JSON
    #[arg(long)]
    pub json: bool,

    /// Include the raw backend response
    #[arg(long)]
    pub raw: bool,

    /// Also ask the summarize function for a prose summary
    #[arg(long)]
    pub summarize: bool,
}

pub fn execute_ask(args: AskArgs, globals: &GlobalOpts) -> Result<()> {
    let prompt = args.prompt.join(" ");
    if prompt.trim().is_empty() {
        return output_error(args.json, "usage", "Please provide a request.");
    }

    let config = match globals.load_config() {
        Ok(c) => c,
        Err(e) => return output_error(args.json, "config", &format!("{e:#}")),
    };
    let user_id = args.user_id.clone().unwrap_or_else(|| config.user_id.clone());
    let want_summary = args.summarize && !args.skip_execution;
    let mode = if args.skip_execution {
        Mode::SkipExecution
    } else {
        Mode::Execute
    };
    let session = match Session::open(&config, mode, want_summary) {
        Ok(s) => s,
        Err(e) => return output_error(args.json, "config", &format!("{e:#}")),
    };

    let started = Instant::now();
    let outcome = match session.answer(prompt.trim(), &user_id, mode) {
        Ok(o) => o,
        Err(e) => return dispatch_error(args.json, &e),
    };
    let elapsed_ms = started.elapsed().as_millis();

    // A failed summary does not invalidate the answer itself.
    let (summary, summary_error) = match session.summarize(&outcome) {
        Some(Ok(text)) => (Some(text), None),
        Some(Err(e)) => {
            warn!(error = %e, "summarize failed");
            (None, Some(present::user_message(&e)))
        }
        None => (None, None),
    };

    if args.json {
        let mut doc = present::outcome_json(prompt.trim(), &user_id, &outcome, elapsed_ms, args.raw);
        if let Some(text) = &summary {
            doc["summary"] = Value::String(text.clone());
        }
        if let Some(err) = &summary_error {
            doc["summary_error"] = Value::String(err.clone());
        }
        println!("{}", pretty(&doc));
        return Ok(());
    }

    let style = StyleOptions::detect();
    for line in human_outcome(&outcome, args.raw, &style) {
        println!("{line}");
    }
    if let Some(text) = &summary {
        for line in human_summary(text, &style) {
            println!("{line}");
        }
    }
    if let Some(err) = &summary_error {
        println!(
            "\n{} {}",
            emoji("error", &style),
            color(Role::Error, format!("Summary unavailable: {err}"), &style)
        );
    }

    let hint = match &outcome {
        Outcome::Planned(_) => "Drop --skip-execution to call the backend",
        Outcome::Executed { .. } if !args.raw => "Use --raw to see the backend response",
        Outcome::Executed { .. } => "",
    };
    println!(
        "\n{}",
        color(
            Role::Dim,
            format!("{elapsed_ms} ms • matcher={}", session.matcher_target()),
            &style
        )
    );
    if !hint.is_empty() {
        println!("{} {}", emoji("info", &style), color(Role::Dim, hint, &style));
    }
    Ok(())
}

/*!
`chat.rs`

Interactive session: read a prompt, answer it, repeat.

  - empty line      -> "Please provide a request."
  - exit / quit / q -> goodbye, end of session
  - end of input    -> goodbye, end of session
  - failed prompt   -> boxed error, session continues
*/

use anyhow::{Context, Result};
use clap::Args;
use std::io::{self, BufRead, Write};
use tracing::debug;

use crate::cmd::format::{StyleOptions, emoji};
use crate::cmd::shared::{GlobalOpts, Session, error_box, human_outcome};
use crate::dispatch::Mode;
use crate::present;

#[derive(Args, Debug)]
pub struct ChatArgs {
    /// User the requests are made for (defaults to the configured user)
    #[arg(short = 'u', long = "user-id", value_name = "ID")]
    pub user_id: Option<String>,

    /// Only show what each prompt would call
    #[arg(long)]
    pub skip_execution: bool,
}

pub fn execute_chat(args: ChatArgs, globals: &GlobalOpts) -> Result<()> {
    let config = globals.load_config()?;
    let mode = if args.skip_execution {
        Mode::SkipExecution
    } else {
        Mode::Execute
    };
    let session = Session::open(&config, mode, false)?;
    let user_id = args.user_id.unwrap_or(config.user_id);

    let style = StyleOptions::detect();
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_chat(&session, &user_id, mode, stdin.lock(), stdout.lock(), &style)
}

fn welcome(style: &StyleOptions) -> String {
    let capabilities = [
        ("receipt", "Subscriptions", "Show me my recurring payments"),
        ("tools", "Financial Products", "List some financial tools I could use"),
        ("goal", "Financial Goals", "Add a new goal to save for vacation"),
    ];
    let mut text = String::from(
        "Hi, I'm your financial tools assistant.\n\nI can help you with 3 things:\n",
    );
    for (i, (tag, name, example)) in capabilities.iter().enumerate() {
        let icon = emoji(tag, style);
        let gap = if icon.is_empty() { "" } else { " " };
        text.push_str(&format!("  {}. {icon}{gap}{name}: \"{example}\"\n", i + 1));
    }
    text.push_str(
        "\nIf your request doesn't match one of those, I'll let you know I can't help.\n\n\
         How can I help today?",
    );
    text
}

const GOODBYE: &str = "Thanks for using the financial assistant. Goodbye!";

fn is_exit(line: &str) -> bool {
    ["exit", "quit", "q"]
        .iter()
        .any(|w| line.eq_ignore_ascii_case(w))
}

pub fn run_chat<R: BufRead, W: Write>(
    session: &Session,
    user_id: &str,
    mode: Mode,
    mut input: R,
    mut out: W,
    style: &StyleOptions,
) -> Result<()> {
    writeln!(out, "{}", welcome(style))?;

    let mut line = String::new();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        line.clear();
        let read = input.read_line(&mut line).context("Failed to read from stdin")?;
        if read == 0 {
            writeln!(out, "\n{GOODBYE}")?;
            return Ok(());
        }

        let prompt = line.trim();
        if prompt.is_empty() {
            writeln!(out, "\nPlease provide a request.\n")?;
            continue;
        }
        if is_exit(prompt) {
            writeln!(out, "\n{GOODBYE}")?;
            return Ok(());
        }

        debug!(prompt, "chat prompt");
        writeln!(out)?;
        match session.answer(prompt, user_id, mode) {
            Ok(outcome) => {
                for l in human_outcome(&outcome, false, style) {
                    writeln!(out, "{l}")?;
                }
            }
            Err(e) => writeln!(out, "{}", error_box(&present::user_message(&e), style))?,
        }
        writeln!(out)?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::alias::Domain;
    use crate::dispatch::matcher::Matcher;
    use crate::dispatch::testing::ScriptedInvoker;
    use crate::dispatch::{BackendRoutes, Dispatcher};
    use serde_json::json;

    fn chat(matcher: ScriptedInvoker, backend: ScriptedInvoker, input: &str) -> String {
        let session = Session::from_parts(
            Matcher::new(Box::new(matcher)),
            Dispatcher::new(BackendRoutes::new().with_domain(Domain::Goals, Box::new(backend))),
            None,
        );
        let mut out = Vec::new();
        run_chat(
            &session,
            "test_user",
            Mode::Execute,
            input.as_bytes(),
            &mut out,
            &StyleOptions::plain(),
        )
        .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn answers_until_exit() {
        let matcher = ScriptedInvoker::new("matcher").reply(json!({
            "function_id": "manage_goals",
            "title": "Manage Financial Goals",
            "parameters": {}
        }));
        let backend = ScriptedInvoker::new("goals").reply(json!({"goals": [
            {"name": "Emergency Fund", "current_amount": 5000, "target_amount": 10000, "due_date": "2025-12-31"}
        ]}));
        let sent = backend.log();

        let text = chat(matcher, backend, "Show me my financial goals\nquit\nnever read\n");
        assert!(text.starts_with("Hi, I'm your financial tools assistant."));
        assert!(text.contains("Emergency Fund: $5000 / $10000 (Due: 2025-12-31)"));
        assert!(text.trim_end().ends_with(GOODBYE));
        assert_eq!(sent.borrow()[0], json!({"action": "get", "user_id": "test_user"}));
    }

    #[test]
    fn errors_do_not_end_the_session() {
        let matcher = ScriptedInvoker::new("matcher")
            .reply(json!({"function_id": "none"}))
            .reply(json!({"statusCode": 200, "body": "not json"}))
            .reply(json!({"function_id": "get_goals"}));
        let backend = ScriptedInvoker::new("goals").reply(json!({}));

        let text = chat(matcher, backend, "weather?\nsomething\ngoals\n");
        assert!(text.contains(present::NO_MATCH_MESSAGE));
        assert!(text.contains("Request Failed"));
        assert!(text.contains("No goals found."));
        assert!(text.trim_end().ends_with(GOODBYE));
    }

    #[test]
    fn blank_lines_ask_again() {
        let matcher = ScriptedInvoker::new("matcher");
        let asked = matcher.log();
        let text = chat(matcher, ScriptedInvoker::new("goals"), "\n   \nQ\n");
        assert!(text.contains("Please provide a request."));
        assert!(asked.borrow().is_empty());
    }
}

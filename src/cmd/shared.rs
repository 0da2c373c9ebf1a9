/*!
shared.rs - helpers used by more than one subcommand.

  - GlobalOpts: config path + CLI overrides, resolved into a Config
  - Session: matcher + dispatcher (+ optional summarizer) built from Config
  - human_outcome: styled lines for one answered prompt
  - report_error / output_error: boxed or JSON error output
*/

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use serde_json::Value;
use tracing::debug;

use crate::cmd::format::{Role, StyleOptions, box_header, color, emoji};
use crate::config::{CliOverrides, Config};
use crate::dispatch::alias::Domain;
use crate::dispatch::matcher::{Matcher, Summarizer};
use crate::dispatch::{BackendRoutes, DispatchError, Dispatcher, Mode, Outcome};
use crate::present;
use crate::transport::{Connector, Invoker, parse_target};

/* ---- Global Options ---- */

/// Global flags every subcommand receives from `main`.
#[derive(Debug, Clone, Default)]
pub struct GlobalOpts {
    pub config: Option<PathBuf>,
    pub overrides: CliOverrides,
}

impl GlobalOpts {
    pub fn load_config(&self) -> Result<Config> {
        Config::load(self.config.as_deref(), &self.overrides)
    }
}

/* ---- Session ---- */

/// Everything needed to answer prompts, wired from configuration.
pub struct Session {
    matcher: Matcher,
    dispatcher: Dispatcher,
    summarizer: Option<Summarizer>,
}

impl Session {
    /// Connect the collaborators `mode` needs. Domain backends, the fallback
    /// and the summarize target are only connected when prompts are executed,
    /// and the summarize target only when `with_summary` is set.
    pub fn open(config: &Config, mode: Mode, with_summary: bool) -> Result<Self> {
        let summarize_target = match (with_summary, &config.summarize) {
            (true, None) => bail!("--summarize needs a summarize target in the configuration"),
            (true, Some(target)) => Some(target.as_str()),
            (false, _) => None,
        };

        let connector = Connector::new(config.timeout());
        let matcher = Matcher::new(open_target(&connector, &config.matcher, "function_matcher")?);

        let mut routes = BackendRoutes::new();
        let mut summarizer = None;
        if mode == Mode::Execute {
            for domain in Domain::ALL {
                let target = match domain {
                    Domain::Subscriptions => &config.backends.subscriptions,
                    Domain::Products => &config.backends.products,
                    Domain::Goals => &config.backends.goals,
                };
                let invoker = open_target(&connector, target, domain.as_str())?;
                routes = routes.with_domain(domain, invoker);
            }
            if let Some(fallback) = &config.backends.fallback {
                routes = routes.with_fallback(open_target(&connector, fallback, "fallback")?);
            }
            if let Some(target) = summarize_target {
                summarizer = Some(Summarizer::new(open_target(&connector, target, "summarize")?));
            }
        }
        debug!(
            ?mode,
            backends = routes.count(),
            summarize = summarizer.is_some(),
            "session ready"
        );

        Ok(Self::from_parts(matcher, Dispatcher::new(routes), summarizer))
    }

    pub fn from_parts(
        matcher: Matcher,
        dispatcher: Dispatcher,
        summarizer: Option<Summarizer>,
    ) -> Self {
        Self {
            matcher,
            dispatcher,
            summarizer,
        }
    }

    /// One prompt through matcher and dispatcher.
    pub fn answer(&self, prompt: &str, user_id: &str, mode: Mode) -> Result<Outcome, DispatchError> {
        let raw = self.matcher.ask(prompt, Some(user_id))?;
        self.dispatcher.run(raw, Some(user_id), mode)
    }

    /// Summary of an executed outcome; `None` when no summarizer is set up
    /// or nothing was executed.
    pub fn summarize(&self, outcome: &Outcome) -> Option<Result<String, DispatchError>> {
        let summarizer = self.summarizer.as_ref()?;
        let Outcome::Executed { plan, raw, .. } = outcome else {
            return None;
        };
        Some(summarizer.summarize(&plan.request.operation, raw))
    }

    pub fn matcher_target(&self) -> &str {
        self.matcher.target()
    }
}

fn open_target(connector: &Connector, raw: &str, name: &str) -> Result<Box<dyn Invoker>> {
    let spec = parse_target(raw).with_context(|| format!("Invalid {name} target '{raw}'"))?;
    debug!(name, kind = ?spec.kind(), endpoint = %spec, "connecting collaborator");
    connector
        .connect(&spec, name)
        .with_context(|| format!("Failed to set up {name} target '{}'", spec.original()))
}

/* ---- Human Rendering ---- */

/// Styled lines for an answered prompt. `show_raw` appends the backend's
/// untouched response.
pub fn human_outcome(outcome: &Outcome, show_raw: bool, style: &StyleOptions) -> Vec<String> {
    let mut lines = Vec::new();
    match outcome {
        Outcome::Planned(plan) => {
            lines.push(box_header(
                format!("{} Matched, not executed", emoji("skip", style)),
                Some(plan.request.operation.as_str()),
                style,
            ));
            lines.extend(present::plan_lines(plan));
        }
        Outcome::Executed { plan, raw, result } => {
            let title = present::heading(result).unwrap_or_else(|| plan.matched.display_title());
            let subtitle = if present::has_formatter(&result.operation) && !result.is_empty() {
                format!("{} • {} item(s)", result.operation, result.items.len())
            } else {
                result.operation.to_string()
            };
            lines.push(box_header(
                format!("{} {title}", emoji("money", style)),
                Some(subtitle),
                style,
            ));
            lines.extend(present::result_lines(result, raw));
            if show_raw && present::has_formatter(&result.operation) {
                lines.push(String::new());
                let label = match result.source_key {
                    Some(key) if key != result.key => {
                        format!("Raw Response (records under \"{key}\"):")
                    }
                    _ => "Raw Response:".to_string(),
                };
                lines.push(color(Role::Accent, label, style));
                lines.extend(pretty(raw).lines().map(str::to_string));
            }
        }
    }
    lines
}

pub fn human_summary(summary: &str, style: &StyleOptions) -> Vec<String> {
    vec![
        String::new(),
        color(Role::Success, format!("{} Summary", emoji("info", style)), style),
        summary.to_string(),
    ]
}

pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/* ---- Errors ---- */

/// Boxed title with the message below it, so long messages stay whole.
pub fn error_box(msg: &str, style: &StyleOptions) -> String {
    let title = format!("{} Request Failed", emoji("error", style));
    format!(
        "{}\n{}",
        box_header(title, None::<&str>, style),
        color(Role::Error, msg, style)
    )
}

/// Print an error without ending the process.
pub fn report_error(json: bool, kind: &str, msg: &str) {
    if json {
        println!("{}", pretty(&present::error_document(kind, msg)));
    } else {
        println!("{}", error_box(msg, &StyleOptions::detect()));
    }
}

/// Print an error and fail the command (batch use).
pub fn output_error(json: bool, kind: &str, msg: &str) -> Result<()> {
    report_error(json, kind, msg);
    bail!(msg.to_string())
}

/// `output_error` for pipeline failures, keeping the error kind.
pub fn dispatch_error(json: bool, err: &DispatchError) -> Result<()> {
    let msg = present::user_message(err);
    if json {
        println!("{}", pretty(&present::error_json(err)));
    } else {
        println!("{}", error_box(&msg, &StyleOptions::detect()));
    }
    bail!(msg)
}

//! Target parsing and the collaborators' call boundary.
//!
//! parse_target -> TargetSpec { Lambda | Http | LocalCommand }
//! Connector::connect(spec, name) -> Box<dyn Invoker>
//!
//! Every external function (matcher, domain backends, summarize) is reached
//! through an [`Invoker`]: JSON payload in, JSON response out.
//!
use anyhow::{Context, Result, bail};
use aws_config::SdkConfig;
use serde_json::Value;
use shell_words::split as shell_split;
use std::cell::OnceCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;
use url::Url;

use crate::dispatch::DispatchError;

pub mod http;
pub mod lambda;
pub mod mcp;

/// One synchronous call to an external function.
pub trait Invoker {
    /// Human-readable address, used in logs and errors.
    fn target(&self) -> &str;

    fn invoke(&self, payload: &Value) -> Result<Value, DispatchError>;
}

/// Classification of the high-level target kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Lambda,
    Http,
    LocalProcess,
}

/// A parsed target string.
///
/// Keeps the original input for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub enum TargetSpec {
    /// AWS Lambda function, by name or ARN.
    Lambda { original: String, function: String },
    /// JSON-over-HTTP endpoint.
    Http { original: String, url: Url },
    /// Local MCP server spawned over stdio.
    LocalCommand {
        original: String,
        program: String,
        args: Vec<String>,
    },
}

impl TargetSpec {
    pub fn original(&self) -> &str {
        match self {
            TargetSpec::Lambda { original, .. }
            | TargetSpec::Http { original, .. }
            | TargetSpec::LocalCommand { original, .. } => original,
        }
    }

    pub fn kind(&self) -> TargetKind {
        match self {
            TargetSpec::Lambda { .. } => TargetKind::Lambda,
            TargetSpec::Http { .. } => TargetKind::Http,
            TargetSpec::LocalCommand { .. } => TargetKind::LocalProcess,
        }
    }
}

impl fmt::Display for TargetSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSpec::Lambda { function, .. } => write!(f, "lambda:{function}"),
            TargetSpec::Http { url, .. } => write!(f, "{url}"),
            TargetSpec::LocalCommand { program, args, .. } => {
                if args.is_empty() {
                    write!(f, "local: {program}")
                } else {
                    write!(f, "local: {} {}", program, args.join(" "))
                }
            }
        }
    }
}

/// Parse a target string.
///
/// 1. `lambda:<name>` -> Lambda (the name may itself be an ARN).
/// 2. A URL with scheme http/https -> Http.
/// 3. Anything else is a local command line, split with shell rules.
///
/// Examples:
/// - "lambda:subscriptions" -> Lambda
/// - "https://api.example.com/goals" -> Http
/// - "./goals-server --stdio" -> LocalCommand
pub fn parse_target(raw: &str) -> Result<TargetSpec> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Target string is empty");
    }

    if let Some(function) = trimmed.strip_prefix("lambda:") {
        let function = function.trim();
        if function.is_empty() {
            bail!("Lambda target has no function name");
        }
        return Ok(TargetSpec::Lambda {
            original: raw.to_string(),
            function: function.to_string(),
        });
    }

    if let Ok(url) = Url::parse(trimmed)
        && matches!(url.scheme(), "http" | "https")
    {
        return Ok(TargetSpec::Http {
            original: raw.to_string(),
            url,
        });
    }

    let parts = shell_split(trimmed)
        .map_err(|e| anyhow::anyhow!("Failed to parse local command line: {e}"))?;
    let Some((program, args)) = parts.split_first() else {
        bail!("No tokens produced when parsing local command target");
    };
    if program.is_empty() {
        bail!("Empty program name in local command target");
    }
    Ok(TargetSpec::LocalCommand {
        original: raw.to_string(),
        program: program.clone(),
        args: args.to_vec(),
    })
}

/// Builds the invokers of one session.
///
/// Lambda and MCP targets share a single Tokio runtime, and Lambda targets
/// share a single AWS configuration. Both are created on first use, so a
/// session without such targets never builds them.
pub struct Connector {
    timeout: Duration,
    runtime: OnceCell<Rc<Runtime>>,
    aws: OnceCell<SdkConfig>,
}

impl Connector {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            runtime: OnceCell::new(),
            aws: OnceCell::new(),
        }
    }

    fn runtime(&self) -> Result<Rc<Runtime>> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(Rc::clone(runtime));
        }
        let runtime = Runtime::new().context("Failed to create Tokio runtime")?;
        Ok(Rc::clone(self.runtime.get_or_init(|| Rc::new(runtime))))
    }

    fn aws_config(&self, runtime: &Runtime) -> &SdkConfig {
        self.aws.get_or_init(|| {
            debug!("loading AWS configuration");
            lambda::load_sdk_config(runtime)
        })
    }

    /// Build the invoker for a target. `name` is the collaborator's logical
    /// name, used as the tool name on MCP targets.
    pub fn connect(&self, spec: &TargetSpec, name: &str) -> Result<Box<dyn Invoker>> {
        let invoker: Box<dyn Invoker> = match spec {
            TargetSpec::Lambda { function, .. } => {
                let runtime = self.runtime()?;
                let config = self.aws_config(&runtime);
                Box::new(lambda::LambdaInvoker::new(
                    Rc::clone(&runtime),
                    config,
                    function,
                    self.timeout,
                ))
            }
            TargetSpec::Http { url, .. } => {
                Box::new(http::HttpInvoker::connect(url.clone(), self.timeout)?)
            }
            TargetSpec::LocalCommand { program, args, .. } => Box::new(mcp::McpInvoker::new(
                self.runtime()?,
                program.clone(),
                args.clone(),
                name,
                self.timeout,
            )),
        };
        Ok(invoker)
    }

    #[cfg(test)]
    fn runtime_refs(&self) -> usize {
        self.runtime.get().map_or(0, Rc::strong_count)
    }
}

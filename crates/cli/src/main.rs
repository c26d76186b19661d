//! Courier CLI entry point.
//!
//! This binary is the composition root for the workspace. Responsibilities:
//!
//! 1. **Parse arguments** with `clap`.
//! 2. **Wire observability**: `tracing-subscriber` with a text or JSON layer
//!    and, when configured, an OpenTelemetry OTLP exporter.
//! 3. **Load configuration** in layers: `--config` file (or
//!    `.courier/config.toml` when present), then `COURIER_BASE_API`, then flags.
//! 4. **Construct infrastructure** (`ReqwestTransport`, terminal notifier and
//!    loading indicator) and inject it into a `RequestGateway`.
//! 5. **Send one request** and print the unwrapped body to stdout.
//!
//! Failures are shown once on stderr and the process exits with status 1.

mod observability;

use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use gateway::{
    BearerAuth, GatewayConfig, GatewayError, GatewaySettings, Locale, Method, NoopIndicator,
    Notification, Notifier, ProgressIndicator, ProgressTracker, RequestDescriptor, RequestGateway,
};
use http_transport::ReqwestTransport;
use terminal::{TerminalIndicator, TerminalNotifier};

/// Configuration file picked up from the working directory when `--config` is absent.
const DEFAULT_CONFIG_PATH: &str = ".courier/config.toml";

/// Send one HTTP request through the Courier gateway and print the response body.
#[derive(Debug, Parser)]
#[command(name = "courier", version)]
struct Cli {
    /// HTTP method (case-insensitive).
    #[arg(value_parser = parse_method)]
    method: Method,

    /// Path relative to the base URL, or an absolute http(s) URL.
    path: String,

    /// TOML configuration file.
    #[arg(long, env = "COURIER_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL; overrides the configuration file and COURIER_BASE_API.
    #[arg(long)]
    base_url: Option<String>,

    /// Default request timeout in milliseconds.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Locale of failure messages (zh-CN or en).
    #[arg(long)]
    locale: Option<Locale>,

    /// Request header as 'Name: value'. Repeatable.
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Query parameter as 'key=value'. Repeatable.
    #[arg(short, long = "query")]
    query: Vec<String>,

    /// JSON request body.
    #[arg(short, long)]
    data: Option<String>,

    /// Bearer token added as an Authorization header.
    #[arg(long, env = "COURIER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let notifier = Arc::new(TerminalNotifier::stderr());

    let telemetry = match observability::init(cli.log_json) {
        Ok(telemetry) => telemetry,
        Err(err) => {
            notifier.notify(Notification::error(format!("{err:#}")));
            return ExitCode::FAILURE;
        }
    };

    let code = match run(cli, notifier.clone()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Pipeline failures were already shown by the gateway's notifier.
            if !already_notified(&err) {
                notifier.notify(Notification::error(format!("{err:#}")));
            }
            ExitCode::FAILURE
        }
    };

    telemetry.shutdown();
    code
}

async fn run(cli: Cli, notifier: Arc<TerminalNotifier>) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    let descriptor = build_descriptor(&cli)?;
    tracing::debug!(base_url = %config.base_url(), timeout_ms = config.timeout().as_millis() as u64, "configuration loaded");

    let transport = ReqwestTransport::new().context("failed to initialise HTTP transport")?;
    let indicator: Arc<dyn ProgressIndicator> = if std::io::stderr().is_terminal() {
        Arc::new(TerminalIndicator::stderr())
    } else {
        Arc::new(NoopIndicator)
    };

    let mut builder = RequestGateway::builder(config, Arc::new(transport))
        .notifier(notifier)
        .progress(Arc::new(ProgressTracker::new(indicator)));
    if let Some(token) = &cli.token {
        builder = builder.hook(Arc::new(BearerAuth::new(token.clone())));
    }
    let gateway = builder.build();

    let body = gateway.send(descriptor).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&body)?;
    if !body.is_empty() && !body.ends_with(b"\n") {
        writeln!(stdout)?;
    }
    stdout.flush()?;
    Ok(())
}

fn already_notified(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<GatewayError>(),
        Some(GatewayError::Transport(_) | GatewayError::Hook(_) | GatewayError::InvalidRequest { .. })
    )
}

fn load_config(cli: &Cli) -> anyhow::Result<GatewayConfig> {
    let file = match &cli.config {
        Some(path) => GatewaySettings::from_file(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).is_file() => {
            GatewaySettings::from_file(Path::new(DEFAULT_CONFIG_PATH))?
        }
        None => GatewaySettings::default(),
    };

    let flags = GatewaySettings {
        base_url: cli.base_url.clone(),
        timeout_ms: cli.timeout_ms,
        locale: cli.locale,
    };

    file.merge(GatewaySettings::from_env())
        .merge(flags)
        .into_config()
        .context("invalid configuration")
}

fn build_descriptor(cli: &Cli) -> anyhow::Result<RequestDescriptor> {
    let mut builder = RequestDescriptor::builder()
        .method(cli.method.clone())
        .path(cli.path.clone());

    for pair in &cli.query {
        let (key, value) = parse_query(pair)?;
        builder = builder.query(key, value);
    }
    for header in &cli.headers {
        let (name, value) = parse_header(header)?;
        builder = builder
            .header(name, value)
            .map_err(|err| anyhow!("header '{header}' is not valid: {err}"))?;
    }
    if let Some(data) = &cli.data {
        let value: serde_json::Value =
            serde_json::from_str(data).context("--data is not valid JSON")?;
        builder = builder
            .json(&value)
            .map_err(|err| anyhow!("--data could not be encoded: {err}"))?;
    }

    // Rebuilt as plain messages: these never reached the gateway, so the
    // caller must still report them.
    builder
        .build()
        .map_err(|err| anyhow!("invalid request arguments: {err}"))
}

fn parse_method(raw: &str) -> Result<Method, String> {
    Method::from_bytes(raw.to_ascii_uppercase().as_bytes()).map_err(|e| e.to_string())
}

fn parse_header(raw: &str) -> anyhow::Result<(&str, &str)> {
    match raw.split_once(':') {
        Some((name, value)) if !name.trim().is_empty() => Ok((name.trim(), value.trim())),
        _ => bail!("header '{raw}' must look like 'Name: value'"),
    }
}

fn parse_query(raw: &str) -> anyhow::Result<(&str, &str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key, value)),
        _ => bail!("query parameter '{raw}' must look like 'key=value'"),
    }
}

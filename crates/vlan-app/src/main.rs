//! vlanapp - VLAN translib application
//!
//! Entry point for the vlanapp request runner. Executes one request given on
//! the command line, or a sequence of requests read from stdin, against
//! CONFIG_DB (or an in-memory store with `--memory`).

use anyhow::{bail, Context};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sonic_translib_common::{AppHandler, AppRequest, ConfigDb, MemoryDb, OpKind, RedisDb};
use sonic_vlan_app::{VlanApp, VlanAppConfig, DEFAULT_CONFIG_PATH};

/// SONiC VLAN translib application
#[derive(Parser, Debug)]
#[command(name = "vlanapp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Redis server host (overrides config file)
    #[arg(long)]
    redis_host: Option<String>,

    /// Redis server port (overrides config file)
    #[arg(long)]
    redis_port: Option<u16>,

    /// Redis database index for CONFIG_DB (overrides config file)
    #[arg(long)]
    config_db: Option<u32>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Use an in-memory store instead of Redis
    #[arg(long)]
    memory: bool,

    /// Operation (create, replace, update, delete, get, subscribe)
    #[arg(short = 'o', long, requires = "path")]
    op: Option<OpKind>,

    /// Request path (e.g., /vlan/10/member)
    #[arg(short = 'p', long, requires = "op")]
    path: Option<String>,

    /// JSON request body
    #[arg(short = 'b', long, default_value = "")]
    body: String,
}

/// Initializes tracing/logging subsystem
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

/// Parses a request line: `<op> <path> [<json body>]`.
fn parse_request_line(line: &str) -> anyhow::Result<AppRequest> {
    let mut parts = line.trim().splitn(3, char::is_whitespace);
    let (Some(op), Some(path)) = (parts.next(), parts.next()) else {
        bail!("expected '<op> <path> [<body>]', got '{}'", line);
    };
    let op: OpKind = op.parse()?;
    let body = parts.next().unwrap_or("").trim();
    Ok(AppRequest::new(path, op, body.as_bytes().to_vec()))
}

/// Runs one request through the handler serving its path.
async fn run_request(
    handlers: &[Box<dyn AppHandler>],
    db: &dyn ConfigDb,
    request: &AppRequest,
) -> anyhow::Result<()> {
    let Some(handler) = handlers.iter().find(|h| h.handles(&request.path)) else {
        bail!("no application serves '{}'", request.path);
    };

    let response = handler
        .process(db, request)
        .await
        .map_err(|e| anyhow::anyhow!("[{}] {}", e.kind().as_str(), e))?;

    if let Some(payload) = response.payload {
        println!("{}", serde_json::to_string_pretty(&payload)?);
    }
    Ok(())
}

async fn run(args: Args, mut config: VlanAppConfig) -> anyhow::Result<bool> {
    if let Some(host) = args.redis_host {
        config.database.redis_host = host;
    }
    if let Some(port) = args.redis_port {
        config.database.redis_port = port;
    }
    if let Some(db) = args.config_db {
        config.database.config_db_number = db;
    }
    config.validate()?;

    let db: Box<dyn ConfigDb> = if args.memory {
        info!("Using in-memory store");
        Box::new(MemoryDb::new())
    } else {
        let redis = RedisDb::connect(config.redis_config())
            .await
            .context("connecting to CONFIG_DB")?;
        Box::new(redis)
    };

    let handlers: Vec<Box<dyn AppHandler>> = vec![Box::new(VlanApp::new())];

    if let (Some(op), Some(path)) = (args.op, args.path) {
        let request = AppRequest::new(path, op, args.body.into_bytes());
        run_request(&handlers, db.as_ref(), &request).await?;
        return Ok(true);
    }

    // Batch mode: one request per line on stdin; failures are logged and
    // reflected in the exit code
    let mut all_ok = true;
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }
        let result = match parse_request_line(&line) {
            Ok(request) => run_request(&handlers, db.as_ref(), &request).await,
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            error!("{}: {:#}", line.trim(), e);
            all_ok = false;
        }
    }
    Ok(all_ok)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let loaded = VlanAppConfig::load_or_default(&args.config);

    let level = match (&args.log_level, &loaded) {
        (Some(level), _) => level.clone(),
        (None, Ok(config)) => config.logging.level.clone(),
        (None, Err(_)) => "info".to_string(),
    };
    init_logging(&level);

    let result = match loaded {
        Ok(config) => run(args, config).await,
        Err(e) => {
            Err(anyhow::Error::new(e).context(format!("loading {}", args.config.display())))
        }
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("vlanapp: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

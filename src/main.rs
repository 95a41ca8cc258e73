// src/main.rs
use anyhow::{Context, Result};
use clap::Parser;
use kubeconfig_binder::{
    app::install_abort_handler,
    config::load_requests,
    credentials::FileCredentialStore,
    run_command,
    utils::{FileLogger, Logger, MultiLogger, StdoutLogger},
    with_kubeconfig, KubeConfigError, KubeConfigWriter, WriterConfig,
};
use std::{
    collections::BTreeMap,
    env,
    path::PathBuf,
    process,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

const ABORTED_EXIT_CODE: i32 = 130;

#[derive(Parser)]
#[command(version, about)]
pub struct Args {
    /// JSON array of credential requests
    #[arg(short, long, env = "KUBECONFIG_BINDER_REQUESTS")]
    pub requests: PathBuf,
    /// JSON array of stored credentials
    #[arg(long, env = "KUBECONFIG_BINDER_CREDENTIALS")]
    pub credentials: PathBuf,
    #[arg(short, long, default_value = ".")]
    pub workspace: String,
    /// Writer settings; defaults are used when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Also append build log lines to this file
    #[arg(long)]
    pub build_log: Option<String>,
    #[arg(short, long)]
    pub debug: bool,
    #[arg(long, default_value = "warn", env = "LOG_LEVEL")]
    pub log_level: String,
    #[arg(long, default_value = "compact", value_parser = ["compact", "json"])]
    pub log_format: String,
    /// Command to run with the kubeconfig in place
    #[arg(last = true)]
    pub command: Vec<String>,
}

fn setup_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false);
    match format {
        "json" => builder.json().init(),
        _ => builder.compact().init(),
    }
}

fn build_logger(args: &Args) -> Result<Box<dyn Logger>> {
    let stdout: Box<dyn Logger> = Box::new(StdoutLogger::new(args.debug));
    match &args.build_log {
        Some(path) => {
            let file = FileLogger::new(path, args.debug)
                .with_context(|| format!("Failed to open build log {}", path))?;
            Ok(Box::new(MultiLogger::new().with(stdout).with(Box::new(file))))
        }
        None => Ok(stdout),
    }
}

fn run(args: Args) -> Result<i32> {
    let config = match &args.config {
        Some(path) => WriterConfig::load_from_file(path)
            .with_context(|| format!("Failed to load writer config {}", path.display()))?,
        None => WriterConfig::default(),
    };
    let requests = load_requests(&args.requests)
        .with_context(|| format!("Failed to load requests from {}", args.requests.display()))?;
    let store = FileCredentialStore::load(&args.credentials)?;
    let workspace = PathBuf::from(shellexpand::tilde(&args.workspace).to_string());

    info!(
        requests = requests.len(),
        credentials = store.len(),
        workspace = %workspace.display(),
        layout = ?config.layout,
        "Configuration loaded"
    );

    let abort = Arc::new(AtomicBool::new(false));
    install_abort_handler(Arc::clone(&abort)).context("Failed to install signal handlers")?;

    let writer = KubeConfigWriter::new(workspace, &store, config).with_abort_flag(Arc::clone(&abort));
    let logger = build_logger(&args)?;
    let base: BTreeMap<String, String> = env::vars().collect();

    with_kubeconfig(&writer, &requests, logger, |overrides, logger| {
        for (key, value) in overrides {
            logger.log(&format!("{}={}", key, value));
        }
        if args.command.is_empty() {
            return Ok(0);
        }
        let status = run_command(&args.command, &base, overrides, &abort)
            .with_context(|| format!("Failed to run {}", args.command[0]))?;
        if abort.load(Ordering::SeqCst) {
            return Ok(ABORTED_EXIT_CODE);
        }
        Ok(status.code().unwrap_or(1))
    })
}

fn main() {
    let args = Args::parse();
    setup_logging(&args.log_level, &args.log_format);

    match run(args) {
        Ok(code) => process::exit(code),
        Err(e) if matches!(e.downcast_ref::<KubeConfigError>(), Some(KubeConfigError::Aborted)) => {
            error!("kubeconfig setup aborted");
            process::exit(ABORTED_EXIT_CODE);
        }
        Err(e) => {
            error!(error = %e, "kubeconfig-binder failed");
            eprintln!("ERROR: {:#}", e);
            process::exit(1);
        }
    }
}

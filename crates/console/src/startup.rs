use std::io::Write;
use std::sync::Arc;

use anyhow::anyhow;
use common::env::ensure_data_dir;
use configs::AppConfig;
use service::auth::repo::FileSessionRepository;
use service::observability::encode_metrics;
use service::transport::HttpTransport;
use service::{AdminError, AdminService, ApiClient, SessionManager};
use tracing::info;

use crate::cli::Cli;
use crate::commands::{self, Context};

/// Wire config, session store and transport together.
pub async fn build_context(config: AppConfig) -> anyhow::Result<Context> {
    ensure_data_dir(&config.session.data_dir).await?;
    let transport = Arc::new(HttpTransport::new(&config.api)?);
    let repo = Arc::new(FileSessionRepository::open(config.session_file()).await?);
    let session = Arc::new(SessionManager::new(repo, transport.clone()));
    let status = session.restore().await;
    info!(?status, api = %config.api.base_url, "session resolved");
    let client = Arc::new(ApiClient::new(transport, session.clone()));
    Ok(Context { config, session, admin: AdminService::new(client) })
}

/// Sign-in problems get a hint on how to continue.
fn with_hint(err: anyhow::Error) -> anyhow::Error {
    match err.downcast_ref::<AdminError>() {
        Some(e) if e.requires_login() => anyhow!("{e}; run `imove-admin login` to continue"),
        _ => err,
    }
}

/// Public entry: load config, restore the session and run one command.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load_and_validate(cli.config.as_deref())?;
    let ctx = build_context(config).await?;

    let mut out = std::io::stdout();
    let result = commands::execute(&ctx, cli.command, &mut out).await;
    if cli.metrics {
        write!(out, "{}", encode_metrics())?;
    }
    result.map_err(with_hint)
}

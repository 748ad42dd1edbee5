use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

use console::Cli;

fn init_logging(json: bool) {
    // load .env first so RUST_LOG from it takes effect
    dotenv().ok();
    common::utils::logging::init_logging(json);
    info!(service = "admin", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.json_logs);

    let session_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "admin",
            event = "panic",
            %session_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(service = "admin", event = "runtime_build_failed", error = %e, "failed to build tokio runtime");
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(service = "admin", event = "start", %session_id, pid, version, "admin console starting");

    rt.block_on(async move {
        let task = tokio::spawn(console::run(cli));

        tokio::select! {
            res = task => match res {
                Ok(Ok(())) => {
                    info!(service = "admin", event = "stop", %session_id, "command finished");
                    std::process::ExitCode::SUCCESS
                }
                Ok(Err(e)) => {
                    error!(service = "admin", event = "command_failed", error = %e, "command failed");
                    eprintln!("error: {e}");
                    std::process::ExitCode::FAILURE
                }
                Err(e) => {
                    error!(service = "admin", event = "task_join_error", error = %e, "command task join error");
                    std::process::ExitCode::FAILURE
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!(service = "admin", event = "shutdown_signal", %session_id, "received Ctrl+C, shutting down");
                std::process::ExitCode::SUCCESS
            }
        }
    })
}

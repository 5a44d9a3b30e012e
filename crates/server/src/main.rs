//! codecortex server binary — loads the root config, connects the
//! embedding provider, and serves the HTTP API in front of the
//! [`codecortex_registry::Coordinator`] (spec §6).

use codecortex_registry::Coordinator;
use codecortex_server::{router, AppState};
use std::path::PathBuf;
use std::time::Duration;

fn print_help() {
    println!("codecortex server");
    println!();
    println!("Usage: codecortex-server [CONFIG_PATH]");
    println!();
    println!("CONFIG_PATH defaults to ./codecortex.yaml");
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }
    let config_path = args.into_iter().next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("codecortex.yaml"));

    // spec §6 "Exit codes: 0 normal, non-zero when the embedding provider is
    // unreachable at start" (spec §7 EmbeddingFatal: "process exits with error").
    let coordinator = match Coordinator::connect(config_path).await {
        Ok(coordinator) => coordinator,
        Err(err) => {
            log::error!("failed to start: {err:#}");
            std::process::exit(1);
        }
    };

    let projects = coordinator.list_projects().await;
    log::info!("coordinator ready with {} registered project(s)", projects.len());

    coordinator.spawn_status_publisher();
    coordinator.spawn_config_reloader(Duration::from_secs(10));

    let server_settings = coordinator.server_settings().await;
    let bind_host = if server_settings.host == "localhost" { "127.0.0.1".to_string() } else { server_settings.host.clone() };

    let app = router(AppState { coordinator });
    let listener = match tokio::net::TcpListener::bind((bind_host.as_str(), server_settings.port)).await {
        Ok(listener) => listener,
        Err(err) => {
            log::error!("could not bind {bind_host}:{}: {err}", server_settings.port);
            std::process::exit(1);
        }
    };
    log::info!("listening on {bind_host}:{}", server_settings.port);

    if let Err(err) = axum::serve(listener, app).await {
        log::error!("server error: {err}");
        std::process::exit(1);
    }
}

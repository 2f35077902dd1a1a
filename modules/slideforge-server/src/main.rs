use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use agent_client::{EnvTokenProvider, FoundryClient, TokenProvider};
use render_client::BrowserlessRenderer;
use slideforge_common::AppConfig;
use slideforge_pipeline::{Pipeline, ProvisioningContext, ProvisioningSupervisor};
use slideforge_server::{build_router, worker, AppState};
use slideforge_store::{JobStore, StateStore};

#[derive(Parser)]
#[command(name = "slideforge-server", about = "Slide generation job orchestrator")]
struct Cli {
    /// Browserless-compatible renderer base URL.
    #[arg(long, env = "BROWSERLESS_BASE_URL", default_value = "http://localhost:3000")]
    browserless_base_url: String,

    /// Optional Browserless auth token.
    #[arg(long, env = "BROWSERLESS_TOKEN")]
    browserless_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .json()
        .init();

    info!("starting slideforge-server");

    let cli = Cli::parse();
    let config = Arc::new(AppConfig::from_env().context("failed to load configuration")?);

    let token_provider: Arc<dyn TokenProvider> =
        Arc::new(EnvTokenProvider::from_env("FOUNDRY_API_KEY").context("failed to load agent credentials")?);
    let agent_client = Arc::new(FoundryClient::new(
        config.foundry_project_endpoint.clone(),
        config.foundry_api_version.clone(),
        config.foundry_http_timeout,
        token_provider,
    )?);

    let renderer = Arc::new(BrowserlessRenderer::new(&cli.browserless_base_url, cli.browserless_token.as_deref()));

    let store = Arc::new(JobStore::new(config.job_data_dir.clone()));
    let state_store = Arc::new(StateStore::new(config.state_local_path.clone()));

    let (queue_handle, queue_receiver) = slideforge_queue::job_queue();

    let provisioning = Arc::new(ProvisioningContext::default());
    let supervisor = ProvisioningSupervisor::new(
        agent_client.clone(),
        state_store,
        config.model_deployment_name.clone(),
        config.seed_data_dir.clone(),
    );
    let provisioning_for_supervisor = provisioning.clone();
    tokio::spawn(async move {
        supervisor.run(&provisioning_for_supervisor).await;
    });

    let pipeline = Arc::new(Pipeline::new(
        agent_client,
        store.clone(),
        renderer,
        provisioning,
        config.model_deployment_name.clone(),
    ));

    let cancellation = CancellationToken::new();
    let worker_cancellation = cancellation.clone();
    let worker_store = store.clone();
    let worker_handle = tokio::spawn(async move {
        worker::run(queue_receiver, pipeline, worker_store, worker_cancellation).await;
    });

    let state = Arc::new(AppState {
        store,
        queue: queue_handle,
        config: config.clone(),
    });
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.bind_port);
    let listener = tokio::net::TcpListener::bind(&addr).await.context("failed to bind HTTP listener")?;
    info!(addr, "listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(cancellation.clone()))
        .await
        .context("server error")?;

    cancellation.cancel();
    worker_handle.await.context("worker task panicked")?;

    Ok(())
}

async fn shutdown_signal(cancellation: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("shutdown signal received");
    cancellation.cancel();
}

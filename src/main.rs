use clap::Parser;
use miette::{IntoDiagnostic, Result};
use order_process::application::processor::OrderProcessor;
use order_process::config::Config;
use order_process::domain::ports::{CallbackNotifierRef, OrderProcessStoreRef};
use order_process::infrastructure::http_callback::HttpCallbackNotifier;
use order_process::infrastructure::in_memory::InMemoryOrderProcessStore;
use order_process::interfaces::http::build_router;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();
    init_tracing();

    info!(
        max_duplicate_callbacks = config.max_duplicate_callbacks,
        max_order_process_duration = config.max_order_process_duration,
        "starting order process service"
    );

    let store: OrderProcessStoreRef = Arc::new(InMemoryOrderProcessStore::new());
    let notifier: CallbackNotifierRef = Arc::new(
        HttpCallbackNotifier::new(config.retry_policy(), config.callback_timeout())
            .into_diagnostic()?,
    );

    let mut processor = OrderProcessor::new(store, notifier, config.processor_config());
    if let Some(seed) = config.seed {
        processor = processor.with_rng(StdRng::seed_from_u64(seed));
    }

    let app = build_router(processor.clone()).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .into_diagnostic()?;
    info!("listening on {}", config.listen_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .into_diagnostic()?;

    let in_flight = processor.in_flight();
    if in_flight > 0 {
        warn!(in_flight, "shutting down with order processes still running");
    }
    info!("server stopped");

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "unable to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

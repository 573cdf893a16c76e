mod api;
mod middleware;

use std::sync::Arc;

use promocheck_browser::{ChromiumLauncher, Workflow};
use promocheck_core::StorefrontCatalog;
use tracing_subscriber::EnvFilter;

use crate::api::{build_app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = promocheck_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let storefronts =
        StorefrontCatalog::load(&config.storefronts_path, &config.default_storefront)?;
    tracing::info!(
        env = %config.env,
        storefronts = storefronts.profiles().count(),
        default_storefront = storefronts.default_name(),
        "loaded storefront profiles"
    );

    let launcher = ChromiumLauncher::new(config.browser.clone());
    let workflow = Workflow::new(Arc::new(launcher), Arc::new(storefronts));
    let app = build_app(AppState { workflow });

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "promo code validator listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}

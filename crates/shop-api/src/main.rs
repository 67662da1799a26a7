//! # Shopaholic
//!
//! Shopping list checkout service.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export STRIPE_SECRET_KEY=sk_test_...
//! export STRIPE_WEBHOOK_SECRET=whsec_...
//! export SUPABASE_URL=https://<project>.supabase.co
//! export SUPABASE_ANON_KEY=...
//!
//! # Run the server (LOG_FORMAT=json for structured logs)
//! shopaholic
//! ```

use shop_api::{routes, state::AppState};
use tokio::signal;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    print_banner();

    let state = AppState::new()?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Shopping list store: {}", state.store.backend_name());
    info!("Payment provider: {}", state.gateway.provider_name());

    let app = routes::create_router(state);

    info!("🛒 Shopaholic starting on http://{}", addr);

    if !is_prod {
        info!("📝 Health: http://{}/health", addr);
        info!("💳 Checkout: POST http://{}/api/checkout", addr);
        info!("🔔 Webhook: POST http://{}/api/webhooks/stripe", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

fn print_banner() {
    println!(
        r#"
  🛒 Shopaholic 🛒
  ━━━━━━━━━━━━━━━━━━━━━━━
  Shopping list checkout
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}

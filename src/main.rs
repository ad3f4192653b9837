//! Reactive Cookie demo
//!
//! Keeps a session token in a file-backed cookie jar. Running the binary
//! twice within the expiry window reuses the stored token instead of
//! fetching a new one.

use anyhow::Context;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reactive_cookie::cookie::current_timestamp_ms;
use reactive_cookie::{from_fn, Config, Expiry, FileJar, ReactiveCookie};

/// Main entry point for the demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the file-backed jar and build the cookie cache (rehydrating if possible)
/// 4. Wait for the first value, fetching one if nothing was restored
/// 5. Wait for Ctrl+C or for the value to expire
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reactive_cookie=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        "Configuration loaded: jar={}, cookie={}, expiry_days={}",
        config.jar_path.display(),
        config.cookie_name,
        config.expiry_days
    );

    let jar = FileJar::new(&config.jar_path);
    info!("Using cookie jar at {}", jar.path().display());
    let cookie: ReactiveCookie<String> = ReactiveCookie::new(
        config.cookie_name.clone(),
        from_fn(|| async {
            info!("Fetching a new session token");
            Ok(format!("token-{}", current_timestamp_ms()))
        }),
        jar,
        Some(Expiry::days(config.expiry_days)),
    );

    let rehydrated = cookie.current().is_some();
    let mut values = cookie.subscribe();

    let value = values
        .wait_for(|value| value.is_some())
        .await
        .context("cookie cache closed before producing a value")?
        .clone()
        .unwrap_or_default();

    info!(
        "Session token {} ({})",
        value,
        if rehydrated { "restored from jar" } else { "freshly fetched" }
    );

    tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
        cleared = values.wait_for(|value| value.is_none()) => {
            if cleared.is_ok() {
                info!("Session token expired and was cleared");
            }
        }
    }

    Ok(())
}

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn env_filter(log_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level))
}

/// Install the global JSON subscriber. Panics if one is already installed.
pub fn init_tracing(service_name: &str, log_level: &str) {
    if let Err(e) = try_init_tracing(service_name, log_level) {
        eprintln!(
            "Failed to initialize tracing for service '{}': {}",
            service_name, e
        );
        panic!("Failed to initialize tracing: {}", e);
    }
}

/// Install the global JSON subscriber, returning an error instead of
/// panicking when a subscriber is already set (tests install it repeatedly).
pub fn try_init_tracing(
    service_name: &str,
    log_level: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .try_init()?;

    tracing::info!(service = service_name, "Tracing initialized");
    Ok(())
}

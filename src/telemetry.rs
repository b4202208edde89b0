use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Initialize tracing with JSON output for structured logging. This provides
/// the correlation IDs and structured data needed for observability.
pub fn init_telemetry(default_level: &str) -> Result<()> {
    let level: tracing::Level = default_level.parse().unwrap_or(tracing::Level::INFO);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(true)
                .with_span_list(true),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    tracing::info!("Gatepass telemetry initialized with structured logging");
    Ok(())
}

/// Generate a correlation ID for linking related operations
pub fn generate_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Create a span with common approval-workflow attributes
pub fn create_workflow_span(
    operation: &str,
    order_id: Option<u64>,
    vehicle: Option<&str>,
    correlation_id: Option<&str>,
) -> tracing::Span {
    tracing::info_span!(
        "order_workflow",
        operation = operation,
        order.id = order_id,
        vehicle.registration = vehicle,
        correlation.id = correlation_id,
    )
}

//! # Structured Logging Module
//!
//! Environment-aware structured logging for takedown workflows. Output is
//! human-readable by default and JSON when `TAKEDOWN_LOG_FORMAT=json`.

use crate::models::Workflow;
use chrono::Utc;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging with environment-specific configuration
pub fn init_structured_logging() {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| get_log_level(&environment));
        let json = std::env::var("TAKEDOWN_LOG_FORMAT")
            .map(|format| format.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let layer = if json {
            fmt::layer()
                .with_target(true)
                .with_ansi(false)
                .json()
                .with_filter(EnvFilter::new(&filter))
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_filter(EnvFilter::new(&filter))
                .boxed()
        };

        // Tolerate a subscriber installed by the host application
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %environment,
            filter = %filter,
            json = json,
            "Structured logging initialized"
        );
    });
}

/// Get current environment from environment variables
pub fn get_environment() -> String {
    std::env::var("TAKEDOWN_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
pub fn get_log_level(environment: &str) -> String {
    match environment {
        "production" => "info".to_string(),
        _ => "debug".to_string(),
    }
}

/// Log a workflow lifecycle event
pub fn log_workflow_operation(event: &str, workflow: &Workflow, details: Option<&str>) {
    tracing::info!(
        event = %event,
        workflow_id = %workflow.workflow_id,
        url = %workflow.url,
        strategy = %workflow.strategy,
        status = %workflow.status,
        overall_success = workflow.overall_success,
        processing_time_ms = workflow.processing_time.map(|d| d.as_millis() as u64),
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "WORKFLOW_OPERATION"
    );
}

/// Log the result of one remediation channel sub-call
pub fn log_channel_operation(
    channel: &str,
    url: &str,
    successful: bool,
    elapsed: Duration,
    message: &str,
) {
    if successful {
        tracing::info!(
            channel = %channel,
            url = %url,
            successful = successful,
            duration_ms = elapsed.as_millis() as u64,
            message = %message,
            "CHANNEL_OPERATION"
        );
    } else {
        tracing::warn!(
            channel = %channel,
            url = %url,
            successful = successful,
            duration_ms = elapsed.as_millis() as u64,
            message = %message,
            "CHANNEL_OPERATION"
        );
    }
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Strategy;

    #[test]
    fn test_environment_detection() {
        std::env::set_var("TAKEDOWN_ENV", "test_override");
        let env = get_environment();
        assert_eq!(env, "test_override");
        std::env::remove_var("TAKEDOWN_ENV");
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_init_is_idempotent() {
        init_structured_logging();
        init_structured_logging();
        log_workflow_operation(
            "workflow.created",
            &Workflow::new("https://pirate.example/x", Strategy::Parallel),
            Some("logging smoke test"),
        );
        log_channel_operation("dmca", "https://pirate.example/x", false, Duration::from_millis(5), "down");
        log_error("logging", "smoke", "nothing wrong", None);
    }
}

//! Prometheus metrics collection for the command bus.
//!
//! Metrics are exposed on the HTTP endpoint served by [`crate::http`].
//!
//! - `bus_command_total{command,source}` - Invocations entering the pipeline
//! - `bus_command_errors_total{command,source,code}` - Thrown errors by kind
//! - `bus_command_duration_seconds{command}` - Pipeline latency histogram
//! - `bus_rate_limited_total` - Cooldown rejections
//! - `bus_permission_denied_total` - Permission rejections
//! - `bus_audit_entries_total` - Audit records written

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

// ========================================================================
// Counters (monotonic increasing)
// ========================================================================

/// Invocations by command name and transport.
pub static COMMAND_COUNTER: OnceLock<IntCounterVec> = OnceLock::new();

/// Thrown errors by command name, transport, and error code.
pub static COMMAND_ERRORS: OnceLock<IntCounterVec> = OnceLock::new();

/// Total cooldown rejections.
pub static RATE_LIMITED: OnceLock<IntCounter> = OnceLock::new();

/// Total permission rejections.
pub static PERMISSION_DENIED: OnceLock<IntCounter> = OnceLock::new();

/// Total audit records written.
pub static AUDIT_ENTRIES: OnceLock<IntCounter> = OnceLock::new();

// ========================================================================
// Histograms
// ========================================================================

/// Pipeline latency by command name.
pub static COMMAND_LATENCY: OnceLock<HistogramVec> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            if $metric.get().is_none() {
                match $init {
                    Ok(m) => {
                        if let Err(e) = r.register(Box::new(m.clone())) {
                            tracing::warn!(
                                error = %e,
                                concat!("Failed to register metric ", stringify!($metric))
                            );
                        }
                        let _ = $metric.set(m);
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            concat!("Failed to create metric ", stringify!($metric))
                        );
                    }
                }
            }
        };
    }

    register!(
        COMMAND_COUNTER,
        IntCounterVec::new(
            Opts::new("bus_command_total", "Commands entering the pipeline"),
            &["command", "source"],
        )
    );
    register!(
        COMMAND_ERRORS,
        IntCounterVec::new(
            Opts::new("bus_command_errors_total", "Commands that raised an error"),
            &["command", "source", "code"],
        )
    );
    register!(
        COMMAND_LATENCY,
        HistogramVec::new(
            HistogramOpts::new("bus_command_duration_seconds", "Pipeline latency by command")
                .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["command"],
        )
    );
    register!(RATE_LIMITED, IntCounter::new("bus_rate_limited_total", "Cooldown rejections"));
    register!(
        PERMISSION_DENIED,
        IntCounter::new("bus_permission_denied_total", "Permission rejections")
    );
    register!(AUDIT_ENTRIES, IntCounter::new("bus_audit_entries_total", "Audit records written"));
}

/// Render every registered metric in the Prometheus text format.
///
/// Encoding failures are logged and yield an empty body.
pub fn gather_metrics() -> String {
    let families = registry().gather();
    TextEncoder::new()
        .encode_to_string(&families)
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to encode metrics");
            String::new()
        })
}

// ============================================================================
// Helper functions
// ============================================================================

/// Record a command entering the pipeline.
#[inline]
pub fn record_command(command: &str, source: &str) {
    if let Some(c) = COMMAND_COUNTER.get() {
        c.with_label_values(&[command, source]).inc();
    }
}

/// Record pipeline latency for a command.
#[inline]
pub fn observe_command_latency(command: &str, duration_secs: f64) {
    if let Some(h) = COMMAND_LATENCY.get() {
        h.with_label_values(&[command]).observe(duration_secs);
    }
}

/// Record a thrown command error.
#[inline]
pub fn record_command_error(command: &str, source: &str, code: &str) {
    if let Some(c) = COMMAND_ERRORS.get() {
        c.with_label_values(&[command, source, code]).inc();
    }
}

#[inline]
pub fn record_rate_limited() {
    if let Some(c) = RATE_LIMITED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_permission_denied() {
    if let Some(c) = PERMISSION_DENIED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_audit_entry() {
    if let Some(c) = AUDIT_ENTRIES.get() {
        c.inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_lifecycle() {
        init();
        init();

        record_command("metrics-test", "unit");
        record_command_error("metrics-test", "unit", "HANDLER_FAILURE");
        observe_command_latency("metrics-test", 0.001);
        record_rate_limited();
        record_permission_denied();

        let output = gather_metrics();
        assert!(output.contains("bus_command_total"));
        assert!(output.contains(r#"command="metrics-test""#));
        assert!(output.contains(r#"code="HANDLER_FAILURE""#));
        assert!(output.contains("bus_command_duration_seconds"));
        assert!(output.contains("bus_rate_limited_total"));
    }
}

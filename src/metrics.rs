use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the global Prometheus recorder
pub fn init_metrics() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;

    init_metric_descriptions();

    Ok(handle)
}

/// Initialize metric descriptions (can be called multiple times safely)
fn init_metric_descriptions() {
    describe_counter!(
        "chromelogger_rows_total",
        "Log rows committed to response headers"
    );
    describe_counter!(
        "chromelogger_rejections_total",
        "Logging calls rejected by the size or already-sent guard"
    );
    describe_histogram!(
        "chromelogger_header_bytes",
        "Size of the x-chromelogger-data header when the response is flushed"
    );
    describe_gauge!("chromelogger_info", "Protocol version information");

    gauge!("chromelogger_info", "version" => crate::payload::PROTOCOL_VERSION).set(1.0);
}

/// Record a committed row
pub fn record_row(row_type: &'static str) {
    counter!("chromelogger_rows_total", "type" => row_type).increment(1);
}

/// Record a rejected logging call
pub fn record_rejection(reason: &'static str) {
    counter!("chromelogger_rejections_total", "reason" => reason).increment(1);
}

/// Record the header size of a flushed response
pub fn record_header_bytes(bytes: usize) {
    histogram!("chromelogger_header_bytes").record(bytes as f64);
}

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    if PROM_HANDLE.get().is_some() {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);
    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}

/// Counts one computed report; `kind` is `report_card`, `attendance_recap`
/// or `grade_recap`, `surface` is `api` or `print`.
pub(crate) fn record_report(kind: &'static str, surface: &'static str, rows: usize) {
    metrics::counter!("reports_generated_total", "kind" => kind, "surface" => surface)
        .increment(1);
    metrics::histogram!("report_rows", "kind" => kind).record(rows as f64);
}

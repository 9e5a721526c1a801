//! Artist finder metrics
//!
//! Counters and histograms for each stage of a search. Everything is recorded
//! through the `metrics` facade, so calls are no-ops until a recorder is
//! installed by [`init_metrics`].

use std::net::SocketAddr;
use std::sync::{Once, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle, PrometheusRecorder};
use tracing::{info, warn};

use crate::types::IdentitySource;

static INIT: Once = Once::new();
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Builds metric names as `artist_finder_{stage}_{name}[_total]`
macro_rules! stage_metric {
    (counter, $stage:literal, $name:literal) => {
        concat!("artist_finder_", $stage, "_", $name, "_total")
    };
    (histogram, $stage:literal, $name:literal) => {
        concat!("artist_finder_", $stage, "_", $name)
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyOutcome {
    Hit,
    Miss,
    Error,
}

impl StrategyOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyOutcome::Hit => "hit",
            StrategyOutcome::Miss => "miss",
            StrategyOutcome::Error => "error",
        }
    }
}

/// Install the Prometheus recorder. Idempotent.
///
/// When `PROMETHEUS_ADDR` holds a valid socket address the HTTP exporter is
/// spawned on the current tokio runtime as well. Either way the snapshot is
/// available through [`render`] (served by the API's `/metrics` route).
pub fn init_metrics() {
    INIT.call_once(|| {
        let installed = match listen_addr() {
            Some(addr) => install_with_listener(addr),
            None => PrometheusBuilder::new()
                .install_recorder()
                .map_err(anyhow::Error::from),
        };

        match installed {
            Ok(handle) => {
                if HANDLE.set(handle).is_err() {
                    warn!("Prometheus handle was already set");
                }
                register_all_metrics();
                info!("Metrics recorder installed");
            }
            Err(e) => warn!("Failed to install Prometheus recorder: {}", e),
        }
    });
}

fn listen_addr() -> Option<SocketAddr> {
    let raw = std::env::var("PROMETHEUS_ADDR").ok()?;
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse() {
        Ok(addr) => Some(addr),
        Err(_) => {
            warn!("Invalid PROMETHEUS_ADDR '{}', exporter disabled", raw);
            None
        }
    }
}

fn install_with_listener(addr: SocketAddr) -> anyhow::Result<PrometheusHandle> {
    let recorder = spawn_exporter(addr)?;
    let handle = recorder.handle();
    ::metrics::set_global_recorder(recorder)
        .map_err(|_| anyhow::anyhow!("a metrics recorder is already installed"))?;
    Ok(handle)
}

/// Bind the HTTP exporter on `addr` and spawn it on the current runtime.
/// The returned recorder is what the exporter renders.
fn spawn_exporter(addr: SocketAddr) -> anyhow::Result<PrometheusRecorder> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|_| anyhow::anyhow!("the HTTP exporter needs a tokio runtime"))?;

    let (recorder, exporter) = {
        let _guard = runtime.enter();
        PrometheusBuilder::new().with_http_listener(addr).build()?
    };
    runtime.spawn(async move {
        if let Err(e) = exporter.await {
            warn!("Prometheus exporter stopped: {}", e);
        }
    });

    info!("Prometheus HTTP exporter listening on http://{}/metrics", addr);
    Ok(recorder)
}

/// Render the current snapshot in Prometheus text format, if a recorder is installed
pub fn render() -> Option<String> {
    HANDLE.get().map(|h| h.render())
}

/// Pre-register so every series shows up on `/metrics` before first use
fn register_all_metrics() {
    let _ = ::metrics::counter!(stage_metric!(counter, "search", "requests"));
    let _ = ::metrics::counter!(stage_metric!(counter, "search", "empty_results"));
    let _ = ::metrics::histogram!(stage_metric!(histogram, "search", "duration_seconds"));
    let _ = ::metrics::histogram!(stage_metric!(histogram, "search", "results"));
    let _ = ::metrics::counter!(stage_metric!(counter, "song", "strategy_runs"));
    let _ = ::metrics::histogram!(stage_metric!(histogram, "artists", "handles_resolved"));
    let _ = ::metrics::counter!(stage_metric!(counter, "profile", "enrichments"));
    let _ = ::metrics::counter!(stage_metric!(counter, "identity", "lookups"));
    let _ = ::metrics::counter!(stage_metric!(counter, "upstream", "errors"));
}

/// A provider call failed at the given stage
pub fn upstream_error(provider: &'static str, stage: &'static str) {
    ::metrics::counter!(
        stage_metric!(counter, "upstream", "errors"),
        "provider" => provider,
        "stage" => stage
    )
    .increment(1);
}

pub fn strategy_outcome(strategy: &'static str, outcome: StrategyOutcome) {
    ::metrics::counter!(
        stage_metric!(counter, "song", "strategy_runs"),
        "strategy" => strategy,
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

pub fn handles_resolved(count: usize) {
    ::metrics::histogram!(stage_metric!(histogram, "artists", "handles_resolved")).record(count as f64);
}

/// `success == false` means the profile fell back to a placeholder
pub fn profile_enriched(success: bool) {
    let outcome = if success { "found" } else { "placeholder" };
    ::metrics::counter!(stage_metric!(counter, "profile", "enrichments"), "outcome" => outcome)
        .increment(1);
}

pub fn identity_found(source: IdentitySource) {
    ::metrics::counter!(
        stage_metric!(counter, "identity", "lookups"),
        "source" => source.as_str()
    )
    .increment(1);
}

pub fn search_started() {
    ::metrics::counter!(stage_metric!(counter, "search", "requests")).increment(1);
}

pub fn resolution_completed(results: usize, duration_secs: f64) {
    if results == 0 {
        ::metrics::counter!(stage_metric!(counter, "search", "empty_results")).increment(1);
    }
    ::metrics::histogram!(stage_metric!(histogram, "search", "results")).record(results as f64);
    ::metrics::histogram!(stage_metric!(histogram, "search", "duration_seconds")).record(duration_secs);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_naming_convention() {
        assert_eq!(
            stage_metric!(counter, "upstream", "errors"),
            "artist_finder_upstream_errors_total"
        );
        assert_eq!(
            stage_metric!(histogram, "search", "duration_seconds"),
            "artist_finder_search_duration_seconds"
        );
    }

    #[tokio::test]
    async fn test_http_exporter_serves_recorded_series() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let recorder = spawn_exporter(addr).unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            search_started();
            strategy_outcome("sound_search", StrategyOutcome::Hit);
            upstream_error("sociavault", "song_details");
        });

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /metrics HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut body = String::new();
        stream.read_to_string(&mut body).await.unwrap();

        assert!(body.starts_with("HTTP/1.1 200"));
        assert!(body.contains("artist_finder_search_requests_total 1"));
        assert!(body.contains(r#"outcome="hit""#));
        assert!(body.contains(r#"provider="sociavault""#));
    }

    #[test]
    fn test_render_after_install_lists_registered_series() {
        init_metrics();
        identity_found(IdentitySource::NotFound);
        resolution_completed(0, 0.5);

        let text = render().unwrap();
        assert!(text.contains("artist_finder_upstream_errors_total"));
        assert!(text.contains(r#"source="not_found""#));
        assert!(text.contains("artist_finder_search_duration_seconds"));
    }
}

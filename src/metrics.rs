use tracing::debug;

/// Named counters emitted by the core (spec §6 "Metrics sink"). The
/// Prometheus wire format itself is out of scope (spec §1); this trait is
/// the seam a concrete exporter plugs into.
pub trait MetricsSink: Send + Sync {
    fn login_attempt(&self, tenant: &str, client: Option<&str>) {
        let _ = (tenant, client);
    }
    fn login_success(&self, tenant: &str, client: Option<&str>) {
        let _ = (tenant, client);
    }
    fn login_failure(&self, tenant: &str, client: Option<&str>, reason: &str) {
        let _ = (tenant, client, reason);
    }
    fn authorize_attempt(&self, tenant: &str, client: &str) {
        let _ = (tenant, client);
    }
    fn oauth_success(&self, tenant: &str, client: &str) {
        let _ = (tenant, client);
    }
    fn oauth_failure(&self, tenant: &str, client: &str, reason: &str) {
        let _ = (tenant, client, reason);
    }
    fn interceptor_success(&self, tenant: &str) {
        let _ = tenant;
    }
    fn interceptor_failure(&self, tenant: &str, reason: &str) {
        let _ = (tenant, reason);
    }
}

/// Default: discard everything.
#[derive(Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {}

/// Logs each counter increment at `debug!`, useful until a real exporter is wired in.
#[derive(Default, Clone, Copy)]
pub struct TracingMetricsSink;

impl MetricsSink for TracingMetricsSink {
    fn login_attempt(&self, tenant: &str, client: Option<&str>) {
        debug!(tenant, ?client, counter = "login_attempts", "metric");
    }
    fn login_success(&self, tenant: &str, client: Option<&str>) {
        debug!(tenant, ?client, counter = "login_success", "metric");
    }
    fn login_failure(&self, tenant: &str, client: Option<&str>, reason: &str) {
        debug!(tenant, ?client, reason, counter = "login_failure", "metric");
    }
    fn authorize_attempt(&self, tenant: &str, client: &str) {
        debug!(tenant, client, counter = "authorize_attempts", "metric");
    }
    fn oauth_success(&self, tenant: &str, client: &str) {
        debug!(tenant, client, counter = "oauth_success", "metric");
    }
    fn oauth_failure(&self, tenant: &str, client: &str, reason: &str) {
        debug!(tenant, client, reason, counter = "oauth_failure", "metric");
    }
    fn interceptor_success(&self, tenant: &str) {
        debug!(tenant, counter = "interceptor_success", "metric");
    }
    fn interceptor_failure(&self, tenant: &str, reason: &str) {
        debug!(tenant, reason, counter = "interceptor_failure", "metric");
    }
}

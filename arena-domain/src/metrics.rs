use std::sync::Arc;

use crate::matches::MatchType;

pub type ArcMetricsSink = Arc<Box<dyn MetricsSink + Send + Sync + 'static>>;

/// Observability collaborator for the write paths. The domain only emits
/// observations through this seam; the server wires a Prometheus-backed
/// implementation and tests wire the no-op.
pub trait MetricsSink {
    fn match_started(&self, match_type: MatchType);
    fn login_recorded(&self);
    fn revenue_recorded(&self, item_type: &str, amount: f64);
}

#[derive(Default, Clone)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn match_started(&self, _match_type: MatchType) {}
    fn login_recorded(&self) {}
    fn revenue_recorded(&self, _item_type: &str, _amount: f64) {}
}

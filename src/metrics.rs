use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::prediction::PredictionResult;

/// Request counters for one submission flow.
#[derive(Default)]
struct FlowCounters {
    requests: AtomicU64,
    human: AtomicU64,
    ai: AtomicU64,
    errors: AtomicU64,
    total_classify_ms: AtomicU64,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct FlowStats {
    pub requests: u64,
    pub human: u64,
    pub ai: u64,
    pub errors: u64,
    pub avg_classify_ms: Option<f64>,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct PredictionStats {
    pub upload: FlowStats,
    pub instagram: FlowStats,
}

#[derive(Clone, Copy, Debug)]
pub enum FlowKind {
    Upload,
    Instagram,
}

#[derive(Clone, Default)]
pub struct Metrics {
    upload: Arc<FlowCounters>,
    instagram: Arc<FlowCounters>,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counters(&self, flow: FlowKind) -> &FlowCounters {
        match flow {
            FlowKind::Upload => &self.upload,
            FlowKind::Instagram => &self.instagram,
        }
    }

    pub fn record_request(&self, flow: FlowKind) {
        self.counters(flow).requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_result(&self, flow: FlowKind, result: &PredictionResult, classify_ms: u64) {
        let c = self.counters(flow);
        if result.is_human() {
            c.human.fetch_add(1, Ordering::Relaxed);
        } else {
            c.ai.fetch_add(1, Ordering::Relaxed);
        }
        c.total_classify_ms.fetch_add(classify_ms, Ordering::Relaxed);
    }

    pub fn record_error(&self, flow: FlowKind) {
        self.counters(flow).errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> PredictionStats {
        PredictionStats {
            upload: Self::flow_stats(&self.upload),
            instagram: Self::flow_stats(&self.instagram),
        }
    }

    fn flow_stats(c: &FlowCounters) -> FlowStats {
        let human = c.human.load(Ordering::Relaxed);
        let ai = c.ai.load(Ordering::Relaxed);
        let classified = human + ai;
        FlowStats {
            requests: c.requests.load(Ordering::Relaxed),
            human,
            ai,
            errors: c.errors.load(Ordering::Relaxed),
            avg_classify_ms: if classified > 0 {
                Some(c.total_classify_ms.load(Ordering::Relaxed) as f64 / classified as f64)
            } else {
                None
            },
        }
    }
}

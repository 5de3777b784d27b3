use tracing::debug;

use super::domain::{Draft, Slug};
use crate::workflows::editorial::placeholders::{scan_with, ScanOptions, ScanReport};

/// Proof that a specific draft passed the placeholder gate. Only the evaluator mints one,
/// and it holds the exact content and images that were scanned, so it goes stale as soon
/// as either changes.
#[derive(Debug, PartialEq, Eq)]
pub struct GateClearance {
    slug: Slug,
    content: String,
    images: Vec<String>,
    excused_maps: usize,
}

impl GateClearance {
    pub fn slug(&self) -> &Slug {
        &self.slug
    }

    /// Whether the draft still carries the content this clearance was issued for.
    pub(crate) fn covers(&self, draft: &Draft) -> bool {
        self.content == draft.content() && self.images == draft.images()
    }

    /// Map markers let through because the environment has map configuration.
    pub fn excused_maps(&self) -> usize {
        self.excused_maps
    }
}

#[derive(Debug)]
pub enum GateDecision {
    Clear(GateClearance),
    Blocked(ScanReport),
}

impl GateDecision {
    pub fn is_clear(&self) -> bool {
        matches!(self, Self::Clear(_))
    }
}

/// Decides whether a draft may advance past review.
#[derive(Debug, Clone, Copy, Default)]
pub struct GateEvaluator {
    options: ScanOptions,
}

impl GateEvaluator {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn scan(&self, draft: &Draft) -> ScanReport {
        scan_with(draft.content(), draft.images(), &self.options)
    }

    pub fn evaluate(&self, draft: &Draft) -> GateDecision {
        let report = self.scan(draft);
        debug!(
            slug = %draft.slug(),
            unresolved = report.count(),
            excused_maps = report.excused_maps(),
            "evaluated placeholder gate"
        );
        if report.is_clear() {
            GateDecision::Clear(GateClearance {
                slug: draft.slug().clone(),
                content: draft.content().to_string(),
                images: draft.images().to_vec(),
                excused_maps: report.excused_maps(),
            })
        } else {
            GateDecision::Blocked(report)
        }
    }
}

//! Observability sink receiving the structured events of a run.

use std::sync::Arc;

use shared::dto::ReconciliationOutcome;
use shared::error::GatewayError;
use tracing::{debug, error, info};

use crate::plan::Plan;

/// Receives the events of a reconciliation run. Passed into the
/// [`Reconciler`](crate::reconciler::Reconciler) explicitly.
pub trait OutcomeSink: Send + Sync {
    /// The diff was computed; nothing has been created yet.
    fn plan_ready(&self, _plan: &Plan) {}

    /// The run finished. Emits the summary and one detail per failed topic.
    fn run_completed(&self, outcome: &ReconciliationOutcome);

    /// A broker call failed as a whole and no outcome was produced.
    fn run_aborted(&self, error: &GatewayError);
}

impl<T: OutcomeSink + ?Sized> OutcomeSink for Arc<T> {
    fn plan_ready(&self, plan: &Plan) {
        (**self).plan_ready(plan)
    }

    fn run_completed(&self, outcome: &ReconciliationOutcome) {
        (**self).run_completed(outcome)
    }

    fn run_aborted(&self, error: &GatewayError) {
        (**self).run_aborted(error)
    }
}

/// Writes run events through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn plan_ready(&self, plan: &Plan) {
        debug!(
            to_create = plan.to_create().len(),
            already_present = plan.already_present().len(),
            "reconciliation plan computed"
        );
    }

    fn run_completed(&self, outcome: &ReconciliationOutcome) {
        let summary = outcome.summary();
        info!(
            created = summary.created,
            already_existed = summary.already_existed,
            failed = summary.failed,
            "reconciliation run finished"
        );

        let created: Vec<&str> = outcome.created().collect();
        if !created.is_empty() {
            info!("Created topics: {}", created.join(", "));
        } else if summary.failed == 0 && summary.already_existed > 0 {
            info!("All topics already exist.");
        }

        for (topic, err) in outcome.failures() {
            error!(topic = %topic, kind = err.kind(), %err, "topic creation failed");
        }
    }

    fn run_aborted(&self, err: &GatewayError) {
        error!(kind = err.kind(), %err, "reconciliation run aborted");
    }
}

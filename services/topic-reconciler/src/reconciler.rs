use shared::dto::{DesiredSet, ReconciliationOutcome};
use shared::error::GatewayError;
use shared::kafka::TopicAdmin;
use tracing::{debug, info};

use crate::plan::{self, Plan};
use crate::sink::OutcomeSink;

/// Runs list, diff and create against one broker.
///
/// A run holds no state between calls, so several reconcilers may target the
/// same cluster at once; the broker rejecting duplicate creation atomically
/// is what keeps them consistent.
pub struct Reconciler<A, S> {
    admin: A,
    sink: S,
}

impl<A, S> Reconciler<A, S>
where
    A: TopicAdmin,
    S: OutcomeSink,
{
    pub fn new(admin: A, sink: S) -> Self {
        Self { admin, sink }
    }

    /// Ensures every topic in `desired` exists.
    ///
    /// A failed listing or a transport failure of the create call aborts the
    /// run and is returned as `Err`. Per-topic rejections end up in the
    /// outcome. Each missing topic is requested at most once and nothing is
    /// retried. Dropping the future after the create request went out does
    /// not undo it, so a retry must start with a fresh listing.
    pub async fn run(&self, desired: &DesiredSet) -> Result<ReconciliationOutcome, GatewayError> {
        if desired.is_empty() {
            debug!("no desired topics, skipping broker listing");
            let outcome = ReconciliationOutcome::default();
            self.sink.run_completed(&outcome);
            return Ok(outcome);
        }

        let plan = self.plan(desired).await?;
        if plan.is_noop() {
            let outcome = plan.settle_noop();
            self.sink.run_completed(&outcome);
            return Ok(outcome);
        }

        info!(count = plan.to_create().len(), "creating missing topics");
        let results = match self.admin.create_topics(plan.to_create()).await {
            Ok(results) => results,
            Err(err) => {
                self.sink.run_aborted(&err);
                return Err(err);
            }
        };
        let outcome = plan.settle(results);
        self.sink.run_completed(&outcome);
        Ok(outcome)
    }

    /// Lists the broker and computes the diff without creating anything.
    pub async fn plan(&self, desired: &DesiredSet) -> Result<Plan, GatewayError> {
        let observed = match self.admin.list_topics().await {
            Ok(observed) => observed,
            Err(err) => {
                self.sink.run_aborted(&err);
                return Err(err);
            }
        };
        debug!(observed = observed.len(), "listed broker topics");
        let plan = plan::reconcile(desired, &observed);
        self.sink.plan_ready(&plan);
        Ok(plan)
    }
}

//! Pure diffing of the desired topics against a broker listing.

use std::collections::BTreeMap;

use shared::dto::{
    CreateResults, DesiredSet, ObservedSet, ReconciliationOutcome, TopicOutcome, TopicSpec,
};
use shared::error::CreateError;
use tracing::warn;

/// Which desired topics must be created and which are already present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    to_create: Vec<TopicSpec>,
    already_present: Vec<String>,
}

/// Splits `desired` into topics missing from `observed` and topics the
/// broker already reported. Both lists are ordered by name.
pub fn reconcile(desired: &DesiredSet, observed: &ObservedSet) -> Plan {
    let (present, missing): (Vec<&TopicSpec>, Vec<&TopicSpec>) =
        desired.iter().partition(|spec| observed.contains(spec.name()));
    Plan {
        to_create: missing.into_iter().cloned().collect(),
        already_present: present.into_iter().map(|s| s.name().to_string()).collect(),
    }
}

impl Plan {
    pub fn to_create(&self) -> &[TopicSpec] {
        &self.to_create
    }

    pub fn already_present(&self) -> &[String] {
        &self.already_present
    }

    /// True when nothing has to be sent to the broker.
    pub fn is_noop(&self) -> bool {
        self.to_create.is_empty()
    }

    /// Outcome for a plan that needs no create call.
    pub fn settle_noop(self) -> ReconciliationOutcome {
        self.settle(CreateResults::new())
    }

    /// Folds the per-topic create results into an outcome that covers every
    /// planned name exactly once.
    pub fn settle(self, mut results: CreateResults) -> ReconciliationOutcome {
        let mut topics = BTreeMap::new();
        for name in self.already_present {
            topics.insert(name, TopicOutcome::AlreadyExisted);
        }
        for spec in self.to_create {
            let name = spec.name().to_string();
            let outcome = match results.remove(&name) {
                Some(Ok(())) => TopicOutcome::Created,
                // another client created it after we listed
                Some(Err(CreateError::AlreadyExists)) => TopicOutcome::AlreadyExisted,
                Some(Err(err)) => TopicOutcome::Failed(err),
                None => TopicOutcome::Failed(CreateError::BrokerUnavailable(
                    "broker returned no result for topic".into(),
                )),
            };
            topics.insert(name, outcome);
        }
        for name in results.keys() {
            warn!(topic = %name, "ignoring create result for unplanned topic");
        }
        ReconciliationOutcome::new(topics)
    }
}

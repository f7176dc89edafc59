#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use shared::dto::{CreateResults, DesiredSet, ObservedSet, ReconciliationOutcome, TopicSpec};
use shared::error::{CreateError, GatewayError};
use shared::kafka::TopicAdmin;
use tokio::sync::Barrier;
use topic_reconciler::{OutcomeSink, Plan};

/// In-memory broker. Creation is atomic per topic: the first request for a
/// name wins, later ones see `AlreadyExists`.
#[derive(Default)]
pub struct FakeBroker {
    topics: Mutex<BTreeSet<String>>,
    list_error: Mutex<Option<GatewayError>>,
    create_error: Mutex<Option<GatewayError>>,
    rejections: Mutex<BTreeMap<String, CreateError>>,
    sneak_in: Mutex<Vec<String>>,
    list_barrier: Mutex<Option<Arc<Barrier>>>,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub requested: Mutex<Vec<Vec<String>>>,
}

impl FakeBroker {
    pub fn with_topics(names: &[&str]) -> Self {
        let broker = Self::default();
        broker
            .topics
            .lock()
            .unwrap()
            .extend(names.iter().map(|n| n.to_string()));
        broker
    }

    pub fn fail_listing(&self, err: GatewayError) {
        *self.list_error.lock().unwrap() = Some(err);
    }

    pub fn fail_create_call(&self, err: GatewayError) {
        *self.create_error.lock().unwrap() = Some(err);
    }

    /// The broker rejects `name` with `err` instead of creating it.
    pub fn reject(&self, name: &str, err: CreateError) {
        self.rejections.lock().unwrap().insert(name.to_string(), err);
    }

    /// Another client creates `name` right after the next listing.
    pub fn create_after_listing(&self, name: &str) {
        self.sneak_in.lock().unwrap().push(name.to_string());
    }

    /// Every listing waits on `barrier` after taking its snapshot.
    pub fn synchronize_listings(&self, barrier: Arc<Barrier>) {
        *self.list_barrier.lock().unwrap() = Some(barrier);
    }

    pub fn topic_names(&self) -> Vec<String> {
        self.topics.lock().unwrap().iter().cloned().collect()
    }

    pub fn lists(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn creates(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TopicAdmin for FakeBroker {
    async fn list_topics(&self) -> Result<ObservedSet, GatewayError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        let snapshot: ObservedSet = self.topics.lock().unwrap().iter().cloned().collect();
        {
            let mut topics = self.topics.lock().unwrap();
            topics.extend(self.sneak_in.lock().unwrap().drain(..));
        }
        let barrier = self.list_barrier.lock().unwrap().clone();
        if let Some(barrier) = barrier {
            barrier.wait().await;
        }
        Ok(snapshot)
    }

    async fn create_topics(&self, specs: &[TopicSpec]) -> Result<CreateResults, GatewayError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.requested
            .lock()
            .unwrap()
            .push(specs.iter().map(|s| s.name().to_string()).collect());
        if let Some(err) = self.create_error.lock().unwrap().clone() {
            return Err(err);
        }
        let rejections = self.rejections.lock().unwrap();
        let mut topics = self.topics.lock().unwrap();
        let mut results = CreateResults::new();
        for spec in specs {
            let name = spec.name().to_string();
            let result = if let Some(err) = rejections.get(&name) {
                Err(err.clone())
            } else if !topics.insert(name.clone()) {
                Err(CreateError::AlreadyExists)
            } else {
                Ok(())
            };
            results.insert(name, result);
        }
        Ok(results)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Planned(Vec<String>),
    Completed(ReconciliationOutcome),
    Aborted(GatewayError),
}

#[derive(Default)]
pub struct RecordingSink {
    pub events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

impl OutcomeSink for RecordingSink {
    fn plan_ready(&self, plan: &Plan) {
        let names = plan.to_create().iter().map(|s| s.name().to_string()).collect();
        self.events.lock().unwrap().push(Event::Planned(names));
    }

    fn run_completed(&self, outcome: &ReconciliationOutcome) {
        self.events
            .lock()
            .unwrap()
            .push(Event::Completed(outcome.clone()));
    }

    fn run_aborted(&self, error: &GatewayError) {
        self.events.lock().unwrap().push(Event::Aborted(error.clone()));
    }
}

pub fn desired(names: &[&str]) -> DesiredSet {
    DesiredSet::try_from_triples(names.iter().map(|n| (*n, 1, 1))).unwrap()
}

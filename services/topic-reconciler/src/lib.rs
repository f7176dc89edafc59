//! Ensures a declared set of Kafka topics exists on a cluster, creating the
//! missing ones and reporting a per-topic outcome.

pub mod plan;
pub mod reconciler;
pub mod sink;
pub mod status;

pub use plan::{reconcile, Plan};
pub use reconciler::Reconciler;
pub use sink::{OutcomeSink, TracingSink};
pub use status::RunStatus;

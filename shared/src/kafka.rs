//! Kafka administration gateway: lists the topics a cluster knows about and
//! creates missing ones, reporting a typed result per topic.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication, TopicResult};
use rdkafka::client::DefaultClientContext;
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::ClientConfig;
use tracing::{debug, warn};

use crate::dto::{CreateResults, ObservedSet, TopicSpec};
use crate::error::{CreateError, GatewayError};

/// Slack granted on top of the admin timeout before the local side stops
/// waiting for a create response.
const CREATE_GRACE: Duration = Duration::from_secs(1);

/// The two broker calls a reconciliation run needs.
#[async_trait]
pub trait TopicAdmin: Send + Sync {
    /// Names of all topics currently known to the cluster.
    async fn list_topics(&self) -> Result<ObservedSet, GatewayError>;

    /// Requests creation of every spec in one round trip. Only a failure of
    /// the whole call is returned as `Err`; rejections of single topics are
    /// reported in the map.
    async fn create_topics(&self, specs: &[TopicSpec]) -> Result<CreateResults, GatewayError>;
}

#[async_trait]
impl<T: TopicAdmin + ?Sized> TopicAdmin for Arc<T> {
    async fn list_topics(&self) -> Result<ObservedSet, GatewayError> {
        (**self).list_topics().await
    }

    async fn create_topics(&self, specs: &[TopicSpec]) -> Result<CreateResults, GatewayError> {
        (**self).create_topics(specs).await
    }
}

/// [`TopicAdmin`] backed by an rdkafka [`AdminClient`].
pub struct KafkaTopicAdmin {
    admin: Arc<AdminClient<DefaultClientContext>>,
    timeout: Duration,
}

impl KafkaTopicAdmin {
    /// Creates the admin client for a comma-separated bootstrap list. Every
    /// broker call made through it is bounded by `timeout`.
    pub fn connect(bootstrap_servers: &str, timeout: Duration) -> Result<Self, GatewayError> {
        let admin: AdminClient<_> = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_servers)
            .create()
            .map_err(|e| GatewayError::Connection(format!("failed to create admin client: {e}")))?;
        Ok(Self {
            admin: Arc::new(admin),
            timeout,
        })
    }
}

#[async_trait]
impl TopicAdmin for KafkaTopicAdmin {
    async fn list_topics(&self) -> Result<ObservedSet, GatewayError> {
        let admin = Arc::clone(&self.admin);
        let timeout = self.timeout;
        // fetch_metadata blocks the calling thread until the broker answers
        let names = tokio::task::spawn_blocking(move || {
            admin.inner().fetch_metadata(None, timeout).map(|metadata| {
                metadata
                    .topics()
                    .iter()
                    .map(|t| t.name().to_string())
                    .collect::<Vec<_>>()
            })
        })
        .await
        .map_err(|e| GatewayError::Connection(format!("metadata task failed: {e}")))?
        .map_err(classify_metadata_error)?;
        debug!(count = names.len(), "fetched topic metadata");
        observed_from_names(names)
    }

    async fn create_topics(&self, specs: &[TopicSpec]) -> Result<CreateResults, GatewayError> {
        let new_topics: Vec<NewTopic<'_>> = specs
            .iter()
            .map(|s| {
                NewTopic::new(
                    s.name(),
                    s.partitions(),
                    TopicReplication::Fixed(s.replication_factor()),
                )
            })
            .collect();
        let opts = AdminOptions::new()
            .operation_timeout(Some(self.timeout))
            .request_timeout(Some(self.timeout));

        let call = self.admin.create_topics(new_topics.iter(), &opts);
        match tokio::time::timeout(self.timeout + CREATE_GRACE, call).await {
            Ok(Ok(results)) => Ok(collect_create_results(specs, results)),
            Ok(Err(e)) => classify_create_call_error(specs, e),
            Err(_) => {
                // the request may still take effect broker-side
                warn!(
                    count = specs.len(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "create request timed out locally"
                );
                Ok(all_timed_out(specs))
            }
        }
    }
}

/// Builds an [`ObservedSet`] from the names in a metadata reply.
pub fn observed_from_names<I>(names: I) -> Result<ObservedSet, GatewayError>
where
    I: IntoIterator<Item = String>,
{
    let names: Vec<String> = names.into_iter().collect();
    if names.iter().any(|n| n.is_empty()) {
        return Err(GatewayError::AdminProtocol(
            "metadata contains a topic without a name".into(),
        ));
    }
    Ok(names.into_iter().collect())
}

fn is_transport_code(code: RDKafkaErrorCode) -> bool {
    matches!(
        code,
        RDKafkaErrorCode::BrokerTransportFailure
            | RDKafkaErrorCode::AllBrokersDown
            | RDKafkaErrorCode::OperationTimedOut
            | RDKafkaErrorCode::RequestTimedOut
            | RDKafkaErrorCode::Resolve
            | RDKafkaErrorCode::BrokerNotAvailable
            | RDKafkaErrorCode::NetworkException
    )
}

/// Unreachable brokers become `Connection`; anything else the broker sends
/// back instead of metadata is treated as a protocol failure.
pub fn classify_metadata_error(err: KafkaError) -> GatewayError {
    match err.rdkafka_error_code() {
        Some(code) if is_transport_code(code) => GatewayError::Connection(err.to_string()),
        _ => GatewayError::AdminProtocol(err.to_string()),
    }
}

fn all_timed_out(specs: &[TopicSpec]) -> CreateResults {
    specs
        .iter()
        .map(|s| (s.name().to_string(), Err(CreateError::Timeout)))
        .collect()
}

/// Handles a create request that failed as a whole. A timed-out request is
/// reported as `Timeout` for every requested topic, since the broker may
/// still apply it; every other failure aborts the run as `Connection`.
pub fn classify_create_call_error(
    specs: &[TopicSpec],
    err: KafkaError,
) -> Result<CreateResults, GatewayError> {
    match err.rdkafka_error_code() {
        Some(RDKafkaErrorCode::OperationTimedOut | RDKafkaErrorCode::RequestTimedOut) => {
            warn!(count = specs.len(), %err, "create request timed out");
            Ok(all_timed_out(specs))
        }
        _ => Err(GatewayError::Connection(err.to_string())),
    }
}

/// Maps a per-topic rejection code onto [`CreateError`].
pub fn classify_create_error(code: RDKafkaErrorCode) -> CreateError {
    match code {
        RDKafkaErrorCode::TopicAlreadyExists => CreateError::AlreadyExists,
        RDKafkaErrorCode::InvalidPartitions
        | RDKafkaErrorCode::InvalidReplicationFactor
        | RDKafkaErrorCode::InvalidReplicaAssignment
        | RDKafkaErrorCode::InvalidTopic
        | RDKafkaErrorCode::InvalidConfig
        | RDKafkaErrorCode::PolicyViolation => CreateError::InvalidSpec(code.to_string()),
        RDKafkaErrorCode::RequestTimedOut | RDKafkaErrorCode::OperationTimedOut => {
            CreateError::Timeout
        }
        other => CreateError::BrokerUnavailable(other.to_string()),
    }
}

/// Keys the broker's per-topic results by name. Results for names that were
/// never requested are dropped.
pub fn collect_create_results(specs: &[TopicSpec], results: Vec<TopicResult>) -> CreateResults {
    let mut out = CreateResults::new();
    for result in results {
        let (name, res) = match result {
            Ok(name) => (name, Ok(())),
            Err((name, code)) => (name, Err(classify_create_error(code))),
        };
        if specs.iter().any(|s| s.name() == name) {
            out.insert(name, res);
        } else {
            warn!(topic = %name, "broker returned a result for a topic that was not requested");
        }
    }
    out
}

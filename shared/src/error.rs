use strum_macros::AsRefStr;
use thiserror::Error;

/// Failure affecting a whole broker call. Aborts the reconciliation run.
#[derive(Error, Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum GatewayError {
    #[error("broker connection error: {0}")]
    Connection(String),
    #[error("malformed admin response: {0}")]
    AdminProtocol(String),
}

impl GatewayError {
    /// Stable name of the failure class, used as a structured log field.
    pub fn kind(&self) -> &str {
        self.as_ref()
    }
}

/// Per-topic result of a create request. Never aborts the run.
#[derive(Error, Debug, Clone, PartialEq, Eq, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub enum CreateError {
    #[error("topic already exists")]
    AlreadyExists,
    #[error("invalid topic spec: {0}")]
    InvalidSpec(String),
    #[error("broker unavailable: {0}")]
    BrokerUnavailable(String),
    #[error("topic creation timed out")]
    Timeout,
}

impl CreateError {
    pub fn kind(&self) -> &str {
        self.as_ref()
    }
}

/// Reasons a desired topic is rejected before anything is sent to the broker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("invalid topic spec: topic name must not be empty")]
    EmptyName,
    #[error("invalid topic spec: topic name `{0}` is reserved")]
    ReservedName(String),
    #[error("invalid topic spec: topic name `{name}` is longer than {max} characters")]
    NameTooLong { name: String, max: usize },
    #[error("invalid topic spec: topic name `{name}` contains illegal character {ch:?}")]
    IllegalCharacter { name: String, ch: char },
    #[error("invalid topic spec: `{name}` needs a positive partition count, got {partitions}")]
    Partitions { name: String, partitions: i32 },
    #[error("invalid topic spec: `{name}` needs a positive replication factor, got {replication_factor}")]
    ReplicationFactor { name: String, replication_factor: i32 },
    #[error("invalid topic spec: `{0}` is declared more than once with different parameters")]
    ConflictingDuplicate(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    InvalidSpec(#[from] SpecError),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_error_kinds_are_snake_case() {
        assert_eq!(CreateError::AlreadyExists.kind(), "already_exists");
        assert_eq!(CreateError::InvalidSpec("x".into()).kind(), "invalid_spec");
        assert_eq!(
            CreateError::BrokerUnavailable("down".into()).kind(),
            "broker_unavailable"
        );
        assert_eq!(CreateError::Timeout.kind(), "timeout");
    }

    #[test]
    fn gateway_error_kinds() {
        assert_eq!(GatewayError::Connection("refused".into()).kind(), "connection");
        assert_eq!(
            GatewayError::AdminProtocol("bad".into()).kind(),
            "admin_protocol"
        );
    }

    #[test]
    fn spec_errors_read_as_invalid_spec() {
        let err = AppError::from(SpecError::ConflictingDuplicate("events".into()));
        assert!(err.to_string().starts_with("invalid topic spec"));
    }
}

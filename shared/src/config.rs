use std::path::{Path, PathBuf};
use std::time::Duration;

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Deserializer};

use crate::dto::DesiredSet;
use crate::error::SpecError;

/// Topics ensured when the configuration names none.
pub const DEFAULT_TOPICS: &[&str] = &["impressions", "clicks", "events"];

/// Directory below `$HOME/.config` holding the per-user config file.
pub const PROJECT_NAME: &str = "topic-reconciler";

pub const CONFIG_FILENAME: &str = "config.toml";

/// Environment variable pointing at an explicit config file.
pub const CONFIG_PATH_ENV: &str = "RECONCILER_CONFIG";

fn default_message_broker_url() -> String {
    "localhost:9092".into()
}

fn default_admin_timeout_ms() -> u64 {
    10_000
}

fn default_partitions() -> i32 {
    1
}

fn default_replication_factor() -> i32 {
    1
}

/// One `[[topics]]` table of the config file.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TopicEntry {
    pub name: String,
    #[serde(default)]
    pub partitions: Option<i32>,
    #[serde(default)]
    pub replication_factor: Option<i32>,
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTopicName {
    Name(String),
    Number(i64),
}

impl RawTopicName {
    fn into_names(self) -> Vec<String> {
        match self {
            RawTopicName::Name(joined) => joined.split(',').map(str::to_string).collect(),
            RawTopicName::Number(n) => vec![n.to_string()],
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTopicNames {
    List(Vec<RawTopicName>),
    Single(RawTopicName),
}

/// `topic_names` arrives as a TOML array or as one comma-separated value
/// from the environment. Numeric names such as `2024` are legal topics.
fn deserialize_topic_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match RawTopicNames::deserialize(deserializer)? {
        RawTopicNames::List(items) => items,
        RawTopicNames::Single(item) => vec![item],
    };
    Ok(raw.into_iter().flat_map(RawTopicName::into_names).collect())
}

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    #[serde(default = "default_message_broker_url")]
    pub message_broker_url: String,
    #[serde(default = "default_admin_timeout_ms")]
    pub admin_timeout_ms: u64,
    #[serde(default = "default_partitions")]
    pub default_partitions: i32,
    #[serde(default = "default_replication_factor")]
    pub default_replication_factor: i32,
    #[serde(default)]
    pub topics: Vec<TopicEntry>,
    #[serde(default, deserialize_with = "deserialize_topic_names")]
    pub topic_names: Vec<String>,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Settings {
    /// Settings from the process environment only.
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::build(config::Config::builder())
    }

    /// Settings from an optional TOML file overlaid with the environment.
    ///
    /// An explicit `path` must exist. Without one the per-user file
    /// `$HOME/.config/topic-reconciler/config.toml` is read when present.
    pub fn load(path: Option<&Path>) -> Result<Self, config::ConfigError> {
        let builder = match path {
            Some(path) => config::Config::builder().add_source(File::from(path).required(true)),
            None => match default_config_path() {
                Some(path) => {
                    config::Config::builder().add_source(File::from(path).required(false))
                }
                None => config::Config::builder(),
            },
        };
        Self::build(builder)
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, config::ConfigError> {
        builder
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
    }

    pub fn admin_timeout(&self) -> Duration {
        Duration::from_millis(self.admin_timeout_ms)
    }

    /// The configured topics as (name, partitions, replication_factor)
    /// triples in declaration order: `topics` first, then `topic_names`.
    pub fn topic_triples(&self) -> Vec<(String, i32, i32)> {
        let entries = self.topics.iter().map(|t| {
            (
                t.name.clone(),
                t.partitions.unwrap_or(self.default_partitions),
                t.replication_factor.unwrap_or(self.default_replication_factor),
            )
        });
        let named = self
            .topic_names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .map(|n| {
                (
                    n.to_string(),
                    self.default_partitions,
                    self.default_replication_factor,
                )
            });
        let triples: Vec<_> = entries.chain(named).collect();
        if triples.is_empty() {
            return DEFAULT_TOPICS
                .iter()
                .map(|n| {
                    (
                        n.to_string(),
                        self.default_partitions,
                        self.default_replication_factor,
                    )
                })
                .collect();
        }
        triples
    }

    pub fn desired_set(&self) -> Result<DesiredSet, SpecError> {
        DesiredSet::try_from_triples(self.topic_triples())
    }
}

/// `$HOME/.config/topic-reconciler/config.toml`, if `HOME` is set.
pub fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join(PROJECT_NAME)
            .join(CONFIG_FILENAME),
    )
}

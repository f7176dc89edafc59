//! Topic data model shared between the admin gateway, the reconciler and the
//! observability sink.

use std::collections::{btree_map, BTreeMap, BTreeSet};

use crate::error::{CreateError, SpecError};

/// Longest topic name the broker accepts.
pub const MAX_TOPIC_NAME_LEN: usize = 249;

/// A topic as it should exist on the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSpec {
    name: String,
    partitions: i32,
    replication_factor: i32,
}

impl TopicSpec {
    /// Validates the name against the broker's legal charset and the
    /// partition/replication values against zero and negatives.
    pub fn new(
        name: impl Into<String>,
        partitions: i32,
        replication_factor: i32,
    ) -> Result<Self, SpecError> {
        let name = name.into();
        validate_topic_name(&name)?;
        if partitions < 1 {
            return Err(SpecError::Partitions { name, partitions });
        }
        if replication_factor < 1 {
            return Err(SpecError::ReplicationFactor {
                name,
                replication_factor,
            });
        }
        Ok(Self {
            name,
            partitions,
            replication_factor,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn partitions(&self) -> i32 {
        self.partitions
    }

    pub fn replication_factor(&self) -> i32 {
        self.replication_factor
    }
}

fn validate_topic_name(name: &str) -> Result<(), SpecError> {
    if name.is_empty() {
        return Err(SpecError::EmptyName);
    }
    if name == "." || name == ".." {
        return Err(SpecError::ReservedName(name.to_string()));
    }
    if name.chars().count() > MAX_TOPIC_NAME_LEN {
        return Err(SpecError::NameTooLong {
            name: name.to_string(),
            max: MAX_TOPIC_NAME_LEN,
        });
    }
    if let Some(ch) = name
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(SpecError::IllegalCharacter {
            name: name.to_string(),
            ch,
        });
    }
    Ok(())
}

/// The topics a run should guarantee, keyed and ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DesiredSet {
    specs: BTreeMap<String, TopicSpec>,
}

impl DesiredSet {
    /// Builds the set from specs in declaration order. Repeating a name with
    /// the same parameters is harmless; repeating it with different ones is
    /// rejected.
    pub fn try_from_specs<I>(specs: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = TopicSpec>,
    {
        let mut map = BTreeMap::new();
        for spec in specs {
            match map.entry(spec.name.clone()) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(spec);
                }
                btree_map::Entry::Occupied(existing) => {
                    if *existing.get() != spec {
                        return Err(SpecError::ConflictingDuplicate(spec.name));
                    }
                }
            }
        }
        Ok(Self { specs: map })
    }

    /// Convenience for (name, partitions, replication_factor) triples.
    pub fn try_from_triples<I, N>(triples: I) -> Result<Self, SpecError>
    where
        I: IntoIterator<Item = (N, i32, i32)>,
        N: Into<String>,
    {
        let specs = triples
            .into_iter()
            .map(|(name, partitions, replication)| TopicSpec::new(name, partitions, replication))
            .collect::<Result<Vec<_>, _>>()?;
        Self::try_from_specs(specs)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Specs in lexicographic name order.
    pub fn iter(&self) -> impl Iterator<Item = &TopicSpec> {
        self.specs.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.keys().map(String::as_str)
    }
}

/// Snapshot of the topic names the broker reported at listing time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedSet {
    names: BTreeSet<String>,
}

impl ObservedSet {
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ObservedSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Per-topic results of a single create round trip.
pub type CreateResults = BTreeMap<String, Result<(), CreateError>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicOutcome {
    Created,
    AlreadyExisted,
    Failed(CreateError),
}

/// What happened to every desired topic during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationOutcome {
    topics: BTreeMap<String, TopicOutcome>,
}

impl ReconciliationOutcome {
    pub fn new(topics: BTreeMap<String, TopicOutcome>) -> Self {
        Self { topics }
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&TopicOutcome> {
        self.topics.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TopicOutcome)> {
        self.topics.iter().map(|(name, outcome)| (name.as_str(), outcome))
    }

    pub fn created(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, o)| matches!(o, TopicOutcome::Created))
            .map(|(name, _)| name)
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &CreateError)> {
        self.iter().filter_map(|(name, o)| match o {
            TopicOutcome::Failed(err) => Some((name, err)),
            _ => None,
        })
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for (_, outcome) in self.iter() {
            match outcome {
                TopicOutcome::Created => summary.created += 1,
                TopicOutcome::AlreadyExisted => summary.already_existed += 1,
                TopicOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}

/// Counts reported in the run summary event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub created: usize,
    pub already_existed: usize,
    pub failed: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_broker_legal_names() {
        for name in ["events", "app.clicks-v2", "__consumer_offsets", "A_b.c-1"] {
            assert!(TopicSpec::new(name, 1, 1).is_ok(), "{name}");
        }
    }

    #[test]
    fn rejects_illegal_names() {
        assert_eq!(TopicSpec::new("", 1, 1), Err(SpecError::EmptyName));
        assert!(matches!(
            TopicSpec::new("..", 1, 1),
            Err(SpecError::ReservedName(_))
        ));
        assert!(matches!(
            TopicSpec::new("click stream", 1, 1),
            Err(SpecError::IllegalCharacter { ch: ' ', .. })
        ));
        assert!(matches!(
            TopicSpec::new("a".repeat(MAX_TOPIC_NAME_LEN + 1), 1, 1),
            Err(SpecError::NameTooLong { .. })
        ));
    }

    #[test]
    fn rejects_non_positive_parameters() {
        assert!(matches!(
            TopicSpec::new("events", 0, 1),
            Err(SpecError::Partitions { partitions: 0, .. })
        ));
        assert!(matches!(
            TopicSpec::new("events", 3, -1),
            Err(SpecError::ReplicationFactor { replication_factor: -1, .. })
        ));
    }

    #[test]
    fn identical_duplicates_collapse() {
        let desired =
            DesiredSet::try_from_triples([("events", 1, 1), ("clicks", 2, 1), ("events", 1, 1)])
                .unwrap();
        assert_eq!(desired.len(), 2);
        assert_eq!(desired.names().collect::<Vec<_>>(), vec!["clicks", "events"]);
    }

    #[test]
    fn conflicting_duplicates_are_rejected() {
        let err = DesiredSet::try_from_triples([("events", 1, 1), ("events", 3, 1)]).unwrap_err();
        assert_eq!(err, SpecError::ConflictingDuplicate("events".into()));
    }

    #[test]
    fn summary_counts_each_outcome() {
        let mut topics = BTreeMap::new();
        topics.insert("a".to_string(), TopicOutcome::Created);
        topics.insert("b".to_string(), TopicOutcome::AlreadyExisted);
        topics.insert("c".to_string(), TopicOutcome::Failed(CreateError::Timeout));
        topics.insert("d".to_string(), TopicOutcome::Created);
        let outcome = ReconciliationOutcome::new(topics);

        assert_eq!(
            outcome.summary(),
            RunSummary {
                created: 2,
                already_existed: 1,
                failed: 1
            }
        );
        assert!(outcome.has_failures());
        assert_eq!(outcome.failures().map(|(n, _)| n).collect::<Vec<_>>(), vec!["c"]);
    }
}

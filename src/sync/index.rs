//! Tag↔digest index and its copy-on-write store
//!
//! A [`TagIndex`] holds both directions of the mapping and keeps them
//! consistent on every insert. The [`IndexStore`] publishes whole indexes:
//! writers build a fresh index off to the side and swap it in, readers
//! clone the current `Arc` and never hold the lock while they work.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, PoisonError, RwLock};

/// Tag-level difference between two published indexes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexChanges {
    pub added: Vec<String>,
    pub removed: Vec<String>,
    /// Tags present in both whose digest changed, e.g. a moving `latest`
    pub moved: Vec<String>,
}

impl IndexChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.moved.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    tag_digest: BTreeMap<String, String>,
    digest_tags: BTreeMap<String, BTreeSet<String>>,
}

impl TagIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `tag -> digest`, moving the tag out of any digest it was under before
    pub fn insert(&mut self, tag: impl Into<String>, digest: impl Into<String>) {
        let tag = tag.into();
        let digest = digest.into();

        if let Some(previous) = self.tag_digest.insert(tag.clone(), digest.clone()) {
            if previous != digest {
                if let Some(tags) = self.digest_tags.get_mut(&previous) {
                    tags.remove(&tag);
                    if tags.is_empty() {
                        self.digest_tags.remove(&previous);
                    }
                }
            }
        }

        self.digest_tags.entry(digest).or_default().insert(tag);
    }

    pub fn digest(&self, tag: &str) -> Option<&str> {
        self.tag_digest.get(tag).map(String::as_str)
    }

    pub fn tags_for(&self, digest: &str) -> Option<&BTreeSet<String>> {
        self.digest_tags.get(digest)
    }

    /// Lexically smallest other tag sharing `tag`'s digest
    pub fn analog(&self, tag: &str) -> Option<&str> {
        let digest = self.tag_digest.get(tag)?;
        self.digest_tags
            .get(digest)?
            .iter()
            .find(|other| other.as_str() != tag)
            .map(String::as_str)
    }

    pub fn tag_digests(&self) -> &BTreeMap<String, String> {
        &self.tag_digest
    }

    pub fn len(&self) -> usize {
        self.tag_digest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tag_digest.is_empty()
    }

    /// What changed going from `previous` to this index, in tag order
    pub fn changes_since(&self, previous: &TagIndex) -> IndexChanges {
        let mut changes = IndexChanges::default();
        for (tag, digest) in &self.tag_digest {
            match previous.digest(tag) {
                None => changes.added.push(tag.clone()),
                Some(old) if old != digest => changes.moved.push(tag.clone()),
                Some(_) => {}
            }
        }
        changes.removed = previous
            .tag_digest
            .keys()
            .filter(|tag| !self.tag_digest.contains_key(*tag))
            .cloned()
            .collect();
        changes
    }

    /// Both directions agree: every tag sits in its digest's set and every set member maps back
    pub fn is_consistent(&self) -> bool {
        let forward = self.tag_digest.iter().all(|(tag, digest)| {
            self.digest_tags
                .get(digest)
                .is_some_and(|tags| tags.contains(tag))
        });
        let backward = self.digest_tags.iter().all(|(digest, tags)| {
            !tags.is_empty()
                && tags
                    .iter()
                    .all(|tag| self.tag_digest.get(tag) == Some(digest))
        });
        forward && backward
    }
}

impl<T: Into<String>, D: Into<String>> FromIterator<(T, D)> for TagIndex {
    fn from_iter<I: IntoIterator<Item = (T, D)>>(iter: I) -> Self {
        let mut index = TagIndex::new();
        for (tag, digest) in iter {
            index.insert(tag, digest);
        }
        index
    }
}

/// Shared slot holding the latest published [`TagIndex`]
#[derive(Debug, Clone, Default)]
pub struct IndexStore {
    current: Arc<RwLock<Arc<TagIndex>>>,
}

impl IndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the latest published index; the lock is released before returning
    pub fn snapshot(&self) -> Arc<TagIndex> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Replace the published index wholesale
    pub fn publish(&self, index: TagIndex) {
        let fresh = Arc::new(index);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *guard = fresh;
    }

    /// Another tag naming the same artifact, or `tag` itself when it has no alias
    pub fn find_tag_analog(&self, tag: &str) -> String {
        let index = self.snapshot();
        index.analog(tag).unwrap_or(tag).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TagIndex {
        [
            ("v1.6.10", "sha256:aaa"),
            ("stable", "sha256:aaa"),
            ("latest", "sha256:aaa"),
            ("v2.0.0", "sha256:bbb"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_index_is_bidirectionally_consistent() {
        let index = sample();
        assert!(index.is_consistent());
        assert_eq!(index.len(), 4);
        assert_eq!(index.tags_for("sha256:bbb").unwrap().len(), 1);
        assert_eq!(index.tags_for("sha256:aaa").unwrap().len(), 3);
    }

    #[test]
    fn test_changes_since_previous_index() {
        let previous = sample();
        let mut current = sample();
        current.insert("latest", "sha256:bbb");
        current.insert("v2.1.0", "sha256:ccc");
        let current: TagIndex = current
            .tag_digests()
            .iter()
            .filter(|(tag, _)| tag.as_str() != "stable")
            .collect();

        let changes = current.changes_since(&previous);
        assert_eq!(changes.added, vec!["v2.1.0"]);
        assert_eq!(changes.removed, vec!["stable"]);
        assert_eq!(changes.moved, vec!["latest"]);
        assert!(current.changes_since(&current).is_empty());
        assert_eq!(previous.changes_since(&TagIndex::new()).added.len(), 4);
    }

    #[test]
    fn test_reinserting_tag_moves_it_between_digests() {
        let mut index = sample();
        index.insert("v2.0.0", "sha256:ccc");
        assert!(index.is_consistent());
        assert!(index.tags_for("sha256:bbb").is_none());
        assert_eq!(index.digest("v2.0.0"), Some("sha256:ccc"));
    }

    #[test]
    fn test_analog_is_lexically_smallest_other_tag() {
        let index = sample();
        // {latest, stable, v1.6.10}
        assert_eq!(index.analog("v1.6.10"), Some("latest"));
        assert_eq!(index.analog("stable"), Some("latest"));
        assert_eq!(index.analog("latest"), Some("stable"));
        assert_eq!(index.analog("v2.0.0"), None);
        assert_eq!(index.analog("unknown"), None);
    }

    #[test]
    fn test_analog_independent_of_insertion_order() {
        let forward = sample();
        let reversed: TagIndex = forward
            .tag_digests()
            .iter()
            .rev()
            .map(|(t, d)| (t.clone(), d.clone()))
            .collect();
        for tag in forward.tag_digests().keys() {
            assert_eq!(forward.analog(tag), reversed.analog(tag));
        }
        assert_eq!(forward, reversed);
    }

    #[test]
    fn test_store_publishes_whole_snapshots() {
        let store = IndexStore::new();
        assert!(store.snapshot().is_empty());
        assert_eq!(store.find_tag_analog("stable"), "stable");

        store.publish(sample());
        let held = store.snapshot();
        assert_eq!(store.find_tag_analog("stable"), "latest");
        assert_eq!(store.find_tag_analog("v2.0.0"), "v2.0.0");

        store.publish(TagIndex::new());
        // Old handle still sees the full previous index
        assert_eq!(held.len(), 4);
        assert!(store.snapshot().is_empty());
        assert_eq!(store.find_tag_analog("stable"), "stable");
    }
}

//! Registry sync engine
//!
//! Each refresh cycle fetches the tag list, resolves every tag's digest in
//! bounded batches into a scratch [`TagIndex`], then publishes the scratch
//! index in one swap. Failed lookups are logged and left out; they never
//! abort the cycle.

use crate::common::RegistryApi;
use crate::concurrency::BatchExecutor;
use crate::config::SyncConfig;
use crate::error::Result;
use crate::logging::Logger;
use crate::sync::index::{IndexChanges, IndexStore, TagIndex};
use regex::Regex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Drops pre-release tags unless they are explicitly included
#[derive(Debug, Clone)]
pub struct TagFilter {
    include_prerelease: bool,
    prerelease: Regex,
}

impl TagFilter {
    pub fn new(include_prerelease: bool, pattern: &str) -> Result<Self> {
        Ok(Self {
            include_prerelease,
            prerelease: Regex::new(pattern)?,
        })
    }

    pub fn keep(&self, tag: &str) -> bool {
        self.include_prerelease || !self.prerelease.is_match(tag)
    }
}

/// Outcome of one refresh cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Tags returned by the registry
    pub listed: usize,
    /// Tags dropped as pre-releases or duplicates
    pub skipped: usize,
    pub resolved: usize,
    pub failed: usize,
    pub batches: usize,
    /// False when the tag list could not be fetched and the old index was kept
    pub published: bool,
    /// Difference to the previously published index
    pub changes: IndexChanges,
    pub elapsed: Duration,
}

pub struct SyncEngine {
    api: Arc<dyn RegistryApi>,
    store: IndexStore,
    filter: TagFilter,
    executor: BatchExecutor,
    output: Logger,
}

impl SyncEngine {
    pub fn new(api: Arc<dyn RegistryApi>, config: &SyncConfig, output: Logger) -> Result<Self> {
        let filter = TagFilter::new(config.include_prerelease, &config.prerelease_pattern)?;
        let executor = BatchExecutor::new(config.batch_width)?;
        Ok(Self::with_parts(api, filter, executor, output))
    }

    pub fn with_parts(
        api: Arc<dyn RegistryApi>,
        filter: TagFilter,
        executor: BatchExecutor,
        output: Logger,
    ) -> Self {
        Self {
            api,
            store: IndexStore::new(),
            filter,
            executor,
            output,
        }
    }

    /// Rebuild the index from the registry and publish it
    pub async fn refresh(&self) -> SyncReport {
        let started = Instant::now();
        let mut report = SyncReport::default();

        let listed = match self.api.list_tags().await {
            Ok(tags) => tags,
            Err(e) => {
                self.output.warning(&format!(
                    "Failed to fetch tag list, keeping previous index: {}",
                    e
                ));
                report.elapsed = started.elapsed();
                return report;
            }
        };
        report.listed = listed.len();

        let mut seen = HashSet::new();
        let tags: Vec<String> = listed
            .into_iter()
            .filter(|tag| self.filter.keep(tag) && seen.insert(tag.clone()))
            .collect();
        report.skipped = report.listed - tags.len();
        report.batches = self.executor.batch_count(tags.len());

        self.output.verbose(&format!(
            "Resolving digests for {} tags in {} batches of up to {}",
            tags.len(),
            report.batches,
            self.executor.width()
        ));

        let api = &self.api;
        let lookups = self
            .executor
            .run(tags, |tag| async move {
                let digest = api.manifest_digest(&tag).await;
                (tag, digest)
            })
            .await;

        let mut scratch = TagIndex::new();
        for (tag, digest) in lookups {
            match digest {
                Ok(digest) => {
                    scratch.insert(tag, digest);
                    report.resolved += 1;
                }
                Err(e) => {
                    self.output
                        .warning(&format!("Error reading tag {}: {}", tag, e));
                    report.failed += 1;
                }
            }
        }

        report.changes = scratch.changes_since(&self.store.snapshot());
        self.store.publish(scratch);
        report.published = true;
        report.elapsed = started.elapsed();

        self.output.info(&format!(
            "Fetched version list: {} tags indexed, {} failed, {} skipped in {}",
            report.resolved,
            report.failed,
            report.skipped,
            self.output.format_duration(report.elapsed)
        ));
        if !report.changes.is_empty() {
            self.output.verbose(&format!(
                "Index changes: {} added, {} removed, {} moved",
                report.changes.added.len(),
                report.changes.removed.len(),
                report.changes.moved.len()
            ));
        }

        report
    }

    /// Run [`refresh`](Self::refresh) every `period` in a background task.
    ///
    /// The first tick fires one full period from now; callers refresh once
    /// themselves at startup. Each cycle's report is sent to `reports`; the
    /// task ends once the receiving side is dropped.
    pub fn spawn_periodic(
        self: Arc<Self>,
        period: Duration,
        reports: UnboundedSender<SyncReport>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let report = self.refresh().await;
                if reports.send(report).is_err() {
                    break;
                }
            }
        })
    }

    pub fn find_tag_analog(&self, tag: &str) -> String {
        self.store.find_tag_analog(tag)
    }

    /// Read-only `tag -> digest` view of the current index
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.store.snapshot().tag_digests().clone()
    }

    /// Number of tags in the current index
    pub fn tag_count(&self) -> usize {
        self.store.snapshot().len()
    }

    pub fn index(&self) -> Arc<TagIndex> {
        self.store.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prerelease_filter() {
        let filter = TagFilter::new(false, crate::config::DEFAULT_PRERELEASE_PATTERN).unwrap();
        assert!(filter.keep("v1.6.10"));
        assert!(filter.keep("v2.0.0-alpha1"));
        assert!(!filter.keep("v1.6.11-rc3"));
        assert!(filter.keep("v1.6.11-rc3-hotfix"));

        let include = TagFilter::new(true, crate::config::DEFAULT_PRERELEASE_PATTERN).unwrap();
        assert!(include.keep("v1.6.11-rc3"));
    }

    #[test]
    fn test_invalid_pattern_is_rejected() {
        assert!(TagFilter::new(false, "-rc[").is_err());
    }
}

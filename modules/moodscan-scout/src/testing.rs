// Test mocks for the scanner.
//
// Three mocks matching the three trait boundaries:
// - MockSourceProvider (SourceProvider): in-memory groups, channels and timestamped posts
// - MockClassifier (Classifier): scripted replies, records every batch it sees
// - RecordingPublisher (StatusPublisher): keeps every published snapshot

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use moodscan_common::ClassificationError;

use crate::classifier::Classifier;
use crate::sources::{Source, SourceGroup, SourceMessage, SourceProvider};
use crate::status::{ScanStatus, StatusPublisher};
use crate::types::{ClassificationResult, ContentBatch};

/// Fixed start time for deterministic tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

// ---------------------------------------------------------------------------
// MockSourceProvider
// ---------------------------------------------------------------------------

/// A `fetch_since` call as seen by the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub source_id: String,
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    pub limit: usize,
}

/// In-memory source provider.
/// Builder pattern: `.group()`, `.source()`, `.post()`, `.failing_group()`, `.failing_source()`,
/// `.hanging_source()`.
#[derive(Default)]
pub struct MockSourceProvider {
    groups: Vec<SourceGroup>,
    sources: Vec<Source>,
    posts: HashMap<String, Vec<(DateTime<Utc>, SourceMessage)>>,
    failing_groups: HashSet<String>,
    failing_sources: HashSet<String>,
    hanging_sources: HashSet<String>,
    fail_group_listing: bool,
    group_listings: Mutex<u32>,
    source_listings: Mutex<Vec<String>>,
    fetches: Mutex<Vec<FetchCall>>,
}

impl MockSourceProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, id: &str) -> Self {
        self.groups.push(SourceGroup {
            id: id.to_string(),
            name: format!("guild-{id}"),
        });
        self
    }

    pub fn source(mut self, group_id: &str, id: &str) -> Self {
        self.sources.push(Source {
            id: id.to_string(),
            group_id: group_id.to_string(),
            name: format!("channel-{id}"),
        });
        self
    }

    pub fn post(mut self, source_id: &str, at: DateTime<Utc>, message: SourceMessage) -> Self {
        self.posts
            .entry(source_id.to_string())
            .or_default()
            .push((at, message));
        self
    }

    /// Several human posts one second apart, starting at `at`.
    pub fn human_posts(mut self, source_id: &str, at: DateTime<Utc>, texts: &[&str]) -> Self {
        for (i, text) in texts.iter().enumerate() {
            self = self.post(
                source_id,
                at + chrono::Duration::seconds(i as i64),
                SourceMessage::human(*text),
            );
        }
        self
    }

    /// Listing this group's sources fails.
    pub fn failing_group(mut self, id: &str) -> Self {
        self.failing_groups.insert(id.to_string());
        self
    }

    /// Reading this source fails.
    pub fn failing_source(mut self, id: &str) -> Self {
        self.failing_sources.insert(id.to_string());
        self
    }

    /// Reading this source never completes.
    pub fn hanging_source(mut self, id: &str) -> Self {
        self.hanging_sources.insert(id.to_string());
        self
    }

    /// Listing groups fails.
    pub fn failing_group_listing(mut self) -> Self {
        self.fail_group_listing = true;
        self
    }

    pub fn group_listings(&self) -> u32 {
        *self.group_listings.lock().unwrap()
    }

    /// Group ids whose sources were listed, in call order.
    pub fn listed_groups(&self) -> Vec<String> {
        self.source_listings.lock().unwrap().clone()
    }

    pub fn fetches(&self) -> Vec<FetchCall> {
        self.fetches.lock().unwrap().clone()
    }

    /// Source ids that were read, in call order.
    pub fn fetched_sources(&self) -> Vec<String> {
        self.fetches().into_iter().map(|c| c.source_id).collect()
    }

    /// Total provider calls of any kind.
    pub fn total_calls(&self) -> usize {
        self.group_listings() as usize + self.listed_groups().len() + self.fetches().len()
    }
}

#[async_trait]
impl SourceProvider for MockSourceProvider {
    async fn groups(&self) -> Result<Vec<SourceGroup>> {
        *self.group_listings.lock().unwrap() += 1;
        if self.fail_group_listing {
            bail!("MockSourceProvider: group listing unavailable");
        }
        Ok(self.groups.clone())
    }

    async fn sources(&self, group: &SourceGroup) -> Result<Vec<Source>> {
        self.source_listings.lock().unwrap().push(group.id.clone());
        if self.failing_groups.contains(&group.id) {
            bail!("MockSourceProvider: cannot list channels of {}", group.id);
        }
        Ok(self
            .sources
            .iter()
            .filter(|s| s.group_id == group.id)
            .cloned()
            .collect())
    }

    async fn fetch_since(
        &self,
        source: &Source,
        since: DateTime<Utc>,
        until: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<SourceMessage>> {
        self.fetches.lock().unwrap().push(FetchCall {
            source_id: source.id.clone(),
            since,
            until,
            limit,
        });
        if self.failing_sources.contains(&source.id) {
            bail!("MockSourceProvider: cannot read {}", source.id);
        }
        if self.hanging_sources.contains(&source.id) {
            std::future::pending::<()>().await;
        }

        let mut posts: Vec<&(DateTime<Utc>, SourceMessage)> = self
            .posts
            .get(&source.id)
            .map(|p| p.iter().filter(|(at, _)| *at > since && *at <= until).collect())
            .unwrap_or_default();
        posts.sort_by_key(|(at, _)| *at);

        Ok(posts
            .into_iter()
            .take(limit)
            .map(|(_, m)| m.clone())
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockClassifier
// ---------------------------------------------------------------------------

/// Scripted classifier. Replies are consumed in order; once the script runs
/// out every item is counted as neutral.
#[derive(Default)]
pub struct MockClassifier {
    script: Mutex<VecDeque<Result<ClassificationResult, ClassificationError>>>,
    batches: Mutex<Vec<Vec<String>>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_ok(self, positive: u64, neutral: u64, negative: u64) -> Self {
        self.script.lock().unwrap().push_back(Ok(ClassificationResult {
            positive,
            neutral,
            negative,
        }));
        self
    }

    pub fn then_err(self, err: ClassificationError) -> Self {
        self.script.lock().unwrap().push_back(Err(err));
        self
    }

    /// Every batch submitted, in call order.
    pub fn batches(&self) -> Vec<Vec<String>> {
        self.batches.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn classify(
        &self,
        batch: &ContentBatch,
    ) -> Result<ClassificationResult, ClassificationError> {
        self.batches.lock().unwrap().push(batch.items().to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ClassificationResult {
                positive: 0,
                neutral: batch.len() as u64,
                negative: 0,
            }))
    }
}

// ---------------------------------------------------------------------------
// RecordingPublisher
// ---------------------------------------------------------------------------

/// Keeps every snapshot. Optionally fails after recording.
#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<ScanStatus>>,
    fail: bool,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn published(&self) -> Vec<ScanStatus> {
        self.published.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<ScanStatus> {
        self.published.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl StatusPublisher for RecordingPublisher {
    async fn publish(&self, status: &ScanStatus) -> anyhow::Result<()> {
        self.published.lock().unwrap().push(status.clone());
        if self.fail {
            bail!("RecordingPublisher: configured to fail");
        }
        Ok(())
    }
}

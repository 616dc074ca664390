//! Pattern learning engine.
//!
//! A persistent, append/merge-only store of which URL-path buckets have
//! previously yielded an identifier or email, per domain and globally.
//! It is fed by a higher-trust extraction channel when that channel finds
//! a value the interactive resolver missed, and it is read by every
//! resolver instance to prioritize navigation.
//!
//! Concurrency discipline: reads take a snapshot through a `std` RwLock
//! and never wait on a writer's I/O; writes are serialized by an async
//! mutex and persist the whole document atomically (temp file + rename),
//! so a failed write cannot corrupt the store. Last write wins at
//! whole-document granularity.

use std::path::{Path, PathBuf};
use std::sync::RwLock;

use chrono::Utc;
use indexmap::IndexSet;
use percent_encoding::percent_decode_str;
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::error::LearningResult;
use crate::types::patterns::{DataType, LearnedItem, LearningStats, PatternDocument};

/// Semantic path buckets, matched against URL path segments.
/// Russian sites mix Cyrillic, transliterated, and English paths.
const SEMANTIC_BUCKETS: &[(&str, &[&str])] = &[
    ("/contacts", &["contact", "kontakt", "контакт", "svyaz", "связ"]),
    (
        "/requisites",
        &["requisit", "rekvizit", "реквизит", "legal", "jurid", "юридическ", "pravov"],
    ),
    (
        "/about",
        &["about", "o-nas", "onas", "о-нас", "o-kompanii", "о-компании"],
    ),
    ("/company", &["company", "kompani", "компани", "firma", "фирм"]),
    ("/info", &["info", "инфо"]),
];

/// Process-wide learning store with an explicit, injected lifecycle:
/// loaded on construction, flushed on every write.
pub struct PatternLearningEngine {
    path: Option<PathBuf>,
    doc: RwLock<PatternDocument>,
    /// Single-writer discipline; held across the persist I/O
    write_gate: Mutex<()>,
}

impl PatternLearningEngine {
    /// Load the store from `path`, starting empty if the file is absent.
    pub async fn load(path: impl Into<PathBuf>) -> LearningResult<Self> {
        let path = path.into();
        let doc = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => PatternDocument::default(),
            Err(e) => return Err(e.into()),
        };
        debug!(
            path = %path.display(),
            total_learned = doc.stats.total_learned,
            "pattern store loaded"
        );
        Ok(Self {
            path: Some(path),
            doc: RwLock::new(doc),
            write_gate: Mutex::new(()),
        })
    }

    /// An engine with no backing file. Used in tests and one-off runs.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: RwLock::new(PatternDocument::default()),
            write_gate: Mutex::new(()),
        }
    }

    /// Record that a higher-trust channel confirmed `confirmed_value` of
    /// `data_type` for `domain`, found at `source_urls`.
    ///
    /// Derives a coarse path bucket per source URL and appends it to the
    /// domain-scoped and global lists when absent (set semantics,
    /// insertion order = priority). Counters increment on every call, so
    /// re-confirming is idempotent for the pattern lists but still counts.
    pub async fn learn_from_confirmed_success(
        &self,
        domain: &str,
        data_type: DataType,
        confirmed_value: &str,
        source_urls: &[String],
    ) -> LearningResult<Vec<LearnedItem>> {
        let buckets: Vec<String> = {
            let mut seen = IndexSet::new();
            for url in source_urls {
                if let Some(bucket) = derive_bucket(url) {
                    seen.insert(bucket);
                }
            }
            seen.into_iter().collect()
        };

        let _writer = self.write_gate.lock().await;

        let (snapshot, learned) = {
            let mut doc = self.doc.write().unwrap();
            let mut learned = Vec::new();

            {
                let domain_list = doc
                    .domains
                    .entry(domain.to_lowercase())
                    .or_default()
                    .entry(data_type)
                    .or_default();
                for bucket in &buckets {
                    if !domain_list.urls.contains(bucket) {
                        domain_list.urls.push(bucket.clone());
                        learned.push(LearnedItem {
                            data_type,
                            domain: Some(domain.to_lowercase()),
                            url_path_pattern: bucket.clone(),
                        });
                    }
                }
                domain_list.confirmed_count += 1;
            }

            let global_list = doc.global.entry(data_type).or_default();
            for bucket in &buckets {
                if !global_list.contains(bucket) {
                    global_list.push(bucket.clone());
                    learned.push(LearnedItem {
                        data_type,
                        domain: None,
                        url_path_pattern: bucket.clone(),
                    });
                }
            }

            doc.stats.external_contributions += 1;
            doc.stats.total_learned += learned.len() as u64;
            doc.updated_at = Utc::now();

            (doc.clone(), learned)
        };

        self.persist(&snapshot).await?;

        info!(
            domain,
            data_type = ?data_type,
            value = confirmed_value,
            new_patterns = learned.len(),
            "learned from confirmed success"
        );
        Ok(learned)
    }

    /// Priority-ordered path patterns for a domain: domain-scoped entries
    /// strictly before global ones, deduplicated, first-seen order kept.
    ///
    /// Never blocks on a write in progress; readers see the last
    /// committed snapshot.
    pub fn priority_url_patterns(&self, domain: &str, data_type: DataType) -> Vec<String> {
        let doc = self.doc.read().unwrap();
        let mut ordered: IndexSet<String> = IndexSet::new();

        if let Some(by_type) = doc.domains.get(&domain.to_lowercase()) {
            if let Some(patterns) = by_type.get(&data_type) {
                ordered.extend(patterns.urls.iter().cloned());
            }
        }
        if let Some(global) = doc.global.get(&data_type) {
            ordered.extend(global.iter().cloned());
        }

        ordered.into_iter().collect()
    }

    /// Read-only counters for introspection.
    pub fn statistics(&self) -> LearningStats {
        self.doc.read().unwrap().stats
    }

    /// Write the whole document to a temp file, then swap it in place.
    async fn persist(&self, snapshot: &PatternDocument) -> LearningResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        let tmp = tmp_path(path);
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Localized link-text markers for a semantic bucket, used by the
/// resolver to match visible links against learned patterns.
pub(crate) fn bucket_markers(bucket: &str) -> Option<&'static [&'static str]> {
    SEMANTIC_BUCKETS
        .iter()
        .find(|(name, _)| *name == bucket)
        .map(|(_, markers)| *markers)
}

/// Derive the coarse path bucket for one source URL.
///
/// Segments are inspected deepest-first so `/about-us/requisites` lands
/// in the requisites bucket, not the about bucket. Unrecognized paths
/// fall back to their first segment; root URLs yield nothing.
pub(crate) fn derive_bucket(url: &str) -> Option<String> {
    let path = match Url::parse(url) {
        // The parser percent-encodes non-ASCII paths; decode so the
        // Cyrillic bucket markers can match.
        Ok(parsed) => percent_decode_str(parsed.path())
            .decode_utf8_lossy()
            .into_owned(),
        // Bare paths are accepted too
        Err(_) => url.to_string(),
    };
    let path = path.to_lowercase();

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return None;
    }

    for segment in segments.iter().rev() {
        for (bucket, markers) in SEMANTIC_BUCKETS {
            if markers.iter().any(|m| segment.contains(m)) {
                return Some((*bucket).to_string());
            }
        }
    }

    Some(format!("/{}", segments[0]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_derived_from_deepest_matching_segment() {
        assert_eq!(
            derive_bucket("https://example.com/about-us/requisites").as_deref(),
            Some("/requisites")
        );
        assert_eq!(
            derive_bucket("https://example.com/kontakty").as_deref(),
            Some("/contacts")
        );
        assert_eq!(
            derive_bucket("https://example.com/о-компании").as_deref(),
            Some("/about")
        );
        // Unrecognized path falls back to its first segment
        assert_eq!(
            derive_bucket("https://example.com/catalog/pumps").as_deref(),
            Some("/catalog")
        );
        assert_eq!(derive_bucket("https://example.com/"), None);
    }

    #[tokio::test]
    async fn cyrillic_source_urls_learn_semantic_buckets() {
        let engine = PatternLearningEngine::in_memory();
        engine
            .learn_from_confirmed_success(
                "zavod.ru",
                DataType::Inn,
                "7707083893",
                &["https://zavod.ru/контакты".to_string()],
            )
            .await
            .unwrap();

        // The bucket must be the semantic one, not a percent-encoded path.
        assert_eq!(
            engine.priority_url_patterns("zavod.ru", DataType::Inn),
            vec!["/contacts".to_string()]
        );
    }

    #[tokio::test]
    async fn domain_patterns_come_before_global() {
        let engine = PatternLearningEngine::in_memory();

        // Another domain seeds the global list first.
        engine
            .learn_from_confirmed_success(
                "other.com",
                DataType::Inn,
                "7707083893",
                &["https://other.com/about".to_string()],
            )
            .await
            .unwrap();

        engine
            .learn_from_confirmed_success(
                "example.com",
                DataType::Inn,
                "5001007322",
                &["https://example.com/about-us/requisites".to_string()],
            )
            .await
            .unwrap();

        let patterns = engine.priority_url_patterns("example.com", DataType::Inn);
        assert_eq!(patterns, vec!["/requisites".to_string(), "/about".to_string()]);

        // A domain with no history still sees the global list.
        let fresh = engine.priority_url_patterns("new.com", DataType::Inn);
        assert_eq!(fresh, vec!["/about".to_string(), "/requisites".to_string()]);
    }

    #[tokio::test]
    async fn learning_twice_is_idempotent_for_patterns() {
        let engine = PatternLearningEngine::in_memory();
        let urls = vec!["https://example.com/rekvizity".to_string()];

        let first = engine
            .learn_from_confirmed_success("example.com", DataType::Inn, "7707083893", &urls)
            .await
            .unwrap();
        // Domain-scoped and global entries are both new the first time.
        assert_eq!(first.len(), 2);

        let second = engine
            .learn_from_confirmed_success("example.com", DataType::Inn, "7707083893", &urls)
            .await
            .unwrap();
        assert!(second.is_empty());

        let patterns = engine.priority_url_patterns("example.com", DataType::Inn);
        assert_eq!(patterns, vec!["/requisites".to_string()]);

        let stats = engine.statistics();
        assert_eq!(stats.external_contributions, 2);
        assert_eq!(stats.total_learned, 2);
    }

    #[tokio::test]
    async fn data_types_are_tracked_separately() {
        let engine = PatternLearningEngine::in_memory();
        engine
            .learn_from_confirmed_success(
                "example.com",
                DataType::Email,
                "info@example.com",
                &["https://example.com/contacts".to_string()],
            )
            .await
            .unwrap();

        assert!(engine
            .priority_url_patterns("example.com", DataType::Inn)
            .is_empty());
        assert_eq!(
            engine.priority_url_patterns("example.com", DataType::Email),
            vec!["/contacts".to_string()]
        );
    }

    #[tokio::test]
    async fn store_survives_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.json");

        {
            let engine = PatternLearningEngine::load(&path).await.unwrap();
            engine
                .learn_from_confirmed_success(
                    "example.com",
                    DataType::Inn,
                    "7707083893",
                    &["https://example.com/requisites".to_string()],
                )
                .await
                .unwrap();
        }

        let reloaded = PatternLearningEngine::load(&path).await.unwrap();
        assert_eq!(
            reloaded.priority_url_patterns("example.com", DataType::Inn),
            vec!["/requisites".to_string()]
        );
        assert_eq!(reloaded.statistics().external_contributions, 1);

        // No stray temp file after a committed write.
        assert!(!tmp_path(&path).exists());
    }
}

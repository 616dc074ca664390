//! Persisted knowledge units for the pattern learning engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// What kind of value a pattern has previously yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Inn,
    Email,
}

/// One newly recorded pattern, returned from a learning call.
///
/// `domain = None` means the pattern was added to the global list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearnedItem {
    pub data_type: DataType,
    pub domain: Option<String>,
    pub url_path_pattern: String,
}

/// Running counters exposed through `statistics()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningStats {
    /// Distinct patterns recorded (domain-scoped and global)
    pub total_learned: u64,
    /// Confirmations received from the higher-trust channel
    pub external_contributions: u64,
}

/// Domain-scoped pattern list for one data type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainPatterns {
    /// Path buckets, insertion order = priority
    pub urls: Vec<String>,
    /// Times a confirmation touched this (domain, data type)
    pub confirmed_count: u64,
}

/// The single durable document owned by the learning engine.
///
/// Append/merge only: patterns are never deleted, counters only grow.
/// `schema_version` exists so a future bounded/decaying policy can migrate
/// the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternDocument {
    pub schema_version: u32,
    pub updated_at: DateTime<Utc>,
    /// Global path buckets per data type, insertion order = priority
    pub global: BTreeMap<DataType, Vec<String>>,
    /// Per-domain pattern lists
    pub domains: BTreeMap<String, BTreeMap<DataType, DomainPatterns>>,
    pub stats: LearningStats,
}

impl PatternDocument {
    pub const SCHEMA_VERSION: u32 = 1;
}

impl Default for PatternDocument {
    fn default() -> Self {
        Self {
            schema_version: Self::SCHEMA_VERSION,
            updated_at: Utc::now(),
            global: BTreeMap::new(),
            domains: BTreeMap::new(),
            stats: LearningStats::default(),
        }
    }
}

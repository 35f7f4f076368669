//! Editable column -> contact field mapping for one upload session.
//!
//! [`MappingEditor`] is a pure reducer: every write recomputes
//! [`MappingStats`] synchronously, so the statistics can never drift from
//! the mapping contents. No I/O happens here.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use crate::error::CoreError;
use crate::fields::{is_ignore_value, is_required_field, EMAIL_FIELD};
use crate::import::UploadSession;
use crate::types::{ColumnName, FieldKey};

/// Source column -> target field. Unmapped columns are absent; the ignore
/// sentinel is never stored.
pub type FieldMapping = BTreeMap<ColumnName, FieldKey>;

/// Whether some column in `mapping` targets `email`, the one field
/// confirmation requires.
pub fn maps_email(mapping: &FieldMapping) -> bool {
    mapping.values().any(|target| target == EMAIL_FIELD)
}

// ---------------------------------------------------------------------------
// Confidence tiers
// ---------------------------------------------------------------------------

/// Minimum score for [`ConfidenceTier::High`].
pub const HIGH_CONFIDENCE_MIN: f64 = 90.0;
/// Minimum score for [`ConfidenceTier::Medium`].
pub const MEDIUM_CONFIDENCE_MIN: f64 = 70.0;
/// Minimum score for [`ConfidenceTier::Low`].
pub const LOW_CONFIDENCE_MIN: f64 = 50.0;

/// Display tier for a server confidence score. Advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
    Manual,
}

impl ConfidenceTier {
    pub fn from_score(score: f64) -> Self {
        if score >= HIGH_CONFIDENCE_MIN {
            Self::High
        } else if score >= MEDIUM_CONFIDENCE_MIN {
            Self::Medium
        } else if score >= LOW_CONFIDENCE_MIN {
            Self::Low
        } else {
            Self::Manual
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Manual => "Manual",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Coverage counts derived from a mapping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MappingStats {
    /// Columns in the session.
    pub total: usize,
    /// Columns mapped to a real target field.
    pub mapped: usize,
    /// `total - mapped`.
    pub unmapped: usize,
    /// Mapped values that are required fields. Counts values, so two
    /// columns mapped to `email` count twice.
    pub required: usize,
}

impl MappingStats {
    pub fn compute(columns: &[ColumnName], mapping: &FieldMapping) -> Self {
        let targets = || mapping.values().filter(|value| !is_ignore_value(value));
        let mapped = targets().count();
        let required = targets().filter(|value| is_required_field(value)).count();
        let total = columns.len();

        Self {
            total,
            mapped,
            unmapped: total.saturating_sub(mapped),
            required,
        }
    }
}

// ---------------------------------------------------------------------------
// Editor
// ---------------------------------------------------------------------------

/// Field mapping state for the active upload session.
#[derive(Debug, Clone)]
pub struct MappingEditor {
    columns: Vec<ColumnName>,
    confidence_scores: BTreeMap<ColumnName, f64>,
    mapping: FieldMapping,
    stats: MappingStats,
}

impl MappingEditor {
    /// Create an editor with an empty mapping.
    pub fn new(columns: Vec<ColumnName>, confidence_scores: BTreeMap<ColumnName, f64>) -> Self {
        let stats = MappingStats::compute(&columns, &FieldMapping::new());
        Self {
            columns,
            confidence_scores,
            mapping: FieldMapping::new(),
            stats,
        }
    }

    /// Create an editor seeded from the session's auto-mappings.
    pub fn for_session(session: &UploadSession) -> Self {
        let mut editor = Self::new(session.columns.clone(), session.confidence_scores.clone());
        editor.seed(session.auto_mappings.clone());
        editor
    }

    /// Replace the mapping wholesale.
    ///
    /// Entries for columns outside the session and entries whose value is
    /// the ignore sentinel (or blank) are dropped. Returns how many
    /// entries were dropped.
    pub fn seed<I>(&mut self, auto_mappings: I) -> usize
    where
        I: IntoIterator<Item = (ColumnName, FieldKey)>,
    {
        let known: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let mut dropped = 0;
        let mut mapping = FieldMapping::new();

        for (column, target) in auto_mappings {
            if known.contains(column.as_str()) && !is_ignore_value(&target) {
                mapping.insert(column, target.trim().to_string());
            } else {
                dropped += 1;
            }
        }

        self.mapping = mapping;
        self.recompute();
        dropped
    }

    /// Map `column` to `target`. The ignore sentinel or a blank target
    /// removes the column's entry.
    pub fn set_mapping(&mut self, column: &str, target: &str) -> Result<(), CoreError> {
        self.ensure_column(column)?;

        if is_ignore_value(target) {
            self.mapping.remove(column);
        } else {
            self.mapping
                .insert(column.to_string(), target.trim().to_string());
        }

        self.recompute();
        Ok(())
    }

    /// Unmap `column`, returning its previous target.
    pub fn clear(&mut self, column: &str) -> Result<Option<FieldKey>, CoreError> {
        self.ensure_column(column)?;
        let previous = self.mapping.remove(column);
        self.recompute();
        Ok(previous)
    }

    /// Whether some column maps to `email`.
    ///
    /// `first_name` / `last_name` are counted in [`MappingStats::required`]
    /// but do not gate confirmation.
    pub fn can_confirm(&self) -> bool {
        maps_email(&self.mapping)
    }

    /// Tier of the column's server confidence score; `Manual` when the
    /// server gave none.
    pub fn confidence_tier(&self, column: &str) -> ConfidenceTier {
        self.confidence(column)
            .map_or(ConfidenceTier::Manual, ConfidenceTier::from_score)
    }

    pub fn confidence(&self, column: &str) -> Option<f64> {
        self.confidence_scores.get(column).copied()
    }

    pub fn stats(&self) -> MappingStats {
        self.stats
    }

    pub fn mapping(&self) -> &FieldMapping {
        &self.mapping
    }

    pub fn into_mapping(self) -> FieldMapping {
        self.mapping
    }

    pub fn columns(&self) -> &[ColumnName] {
        &self.columns
    }

    pub fn target_for(&self, column: &str) -> Option<&str> {
        self.mapping.get(column).map(String::as_str)
    }

    /// Columns with no target, in file order.
    pub fn unmapped_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| !self.mapping.contains_key(column.as_str()))
            .map(String::as_str)
            .collect()
    }

    /// Target fields mapped from more than one column, with the columns
    /// in file order. A warning for display; never blocks confirmation.
    pub fn duplicate_targets(&self) -> Vec<(FieldKey, Vec<ColumnName>)> {
        let mut by_target: Vec<(FieldKey, Vec<ColumnName>)> = Vec::new();

        for column in &self.columns {
            let Some(target) = self.mapping.get(column) else {
                continue;
            };
            match by_target.iter_mut().find(|(t, _)| t == target) {
                Some((_, columns)) => columns.push(column.clone()),
                None => by_target.push((target.clone(), vec![column.clone()])),
            }
        }

        by_target.retain(|(_, columns)| columns.len() > 1);
        by_target
    }

    // ---- private helpers ----

    fn ensure_column(&self, column: &str) -> Result<(), CoreError> {
        if self.columns.iter().any(|c| c == column) {
            Ok(())
        } else {
            Err(CoreError::NotFound {
                entity: "Column",
                key: column.to_string(),
            })
        }
    }

    fn recompute(&mut self) {
        self.stats = MappingStats::compute(&self.columns, &self.mapping);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Wire types for the contact import service and the upload session model.
//!
//! Field names on the `*Response` / `*Request` types are the service's
//! JSON contract and must not be renamed.

use std::collections::{BTreeMap, HashSet};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::mapping::FieldMapping;
use crate::types::{ColumnName, Timestamp};

// ---------------------------------------------------------------------------
// Optional upload blocks
// ---------------------------------------------------------------------------

/// Usage-credit counters reported with an upload. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditInfo {
    #[serde(default, alias = "available_credits")]
    pub available: u64,
    #[serde(default, alias = "required_credits")]
    pub required: u64,
    #[serde(default, alias = "remaining_credits")]
    pub remaining: u64,
}

impl CreditInfo {
    /// Whether the account has fewer credits than this import needs.
    pub fn is_short(&self) -> bool {
        self.available < self.required
    }
}

/// Sheet layout for multi-sheet spreadsheet sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetInfo {
    #[serde(default)]
    pub total_sheets: u32,
    #[serde(default)]
    pub sheet_names: Vec<String>,
    /// Name of the sheet that was parsed.
    #[serde(default)]
    pub selected_sheet: Option<String>,
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// Body of `POST /api/contacts/upload-contacts-file`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub upload_id: String,
    pub columns: Vec<ColumnName>,
    #[serde(default)]
    pub auto_mappings: BTreeMap<ColumnName, String>,
    #[serde(default)]
    pub confidence_scores: BTreeMap<ColumnName, f64>,
    #[serde(default)]
    pub preview_data: Vec<IndexMap<ColumnName, serde_json::Value>>,
    pub total_rows: u64,
    pub filename: String,
    #[serde(default)]
    pub credit_info: Option<CreditInfo>,
    #[serde(default)]
    pub sheet_info: Option<SheetInfo>,
}

impl UploadResponse {
    /// Auto-mapping and confidence keys that name no detected column.
    pub fn stale_keys(&self) -> Vec<&str> {
        let columns: HashSet<&str> = self.columns.iter().map(String::as_str).collect();
        let mut stale: Vec<&str> = self
            .auto_mappings
            .keys()
            .chain(self.confidence_scores.keys())
            .map(String::as_str)
            .filter(|key| !columns.contains(key))
            .collect();
        stale.sort_unstable();
        stale.dedup();
        stale
    }

    /// Validate the response and build the session it describes.
    ///
    /// Fails when `upload_id` is blank or `columns` repeats a name.
    /// Keys of `auto_mappings` / `confidence_scores` that are not in
    /// `columns` are dropped.
    pub fn into_session(
        self,
        owner: impl Into<String>,
        uploaded_at: Timestamp,
    ) -> Result<UploadSession, CoreError> {
        if self.upload_id.trim().is_empty() {
            return Err(CoreError::Validation(
                "Upload response is missing an upload_id".to_string(),
            ));
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            if !seen.insert(column.as_str()) {
                return Err(CoreError::Validation(format!(
                    "Upload response lists column '{column}' more than once"
                )));
            }
        }

        let auto_mappings = self
            .auto_mappings
            .into_iter()
            .filter(|(column, _)| seen.contains(column.as_str()))
            .collect();
        let confidence_scores = self
            .confidence_scores
            .into_iter()
            .filter(|(column, _)| seen.contains(column.as_str()))
            .collect();

        Ok(UploadSession {
            upload_id: self.upload_id,
            filename: self.filename,
            owner: owner.into(),
            columns: self.columns,
            total_rows: self.total_rows,
            preview_rows: self.preview_data,
            auto_mappings,
            confidence_scores,
            sheet_info: self.sheet_info,
            credit_info: self.credit_info,
            uploaded_at,
        })
    }
}

/// A successfully uploaded file, as understood by the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadSession {
    /// Identifier issued by the import service.
    pub upload_id: String,
    /// Original file name, display-only.
    pub filename: String,
    /// Owner identity used for the upload; re-sent on confirmation.
    pub owner: String,
    /// Detected columns, in file order.
    pub columns: Vec<ColumnName>,
    /// Data rows, excluding the header.
    pub total_rows: u64,
    /// First few rows for sanity-checking the mapping.
    pub preview_rows: Vec<IndexMap<ColumnName, serde_json::Value>>,
    /// Server-inferred mapping used to seed the editor.
    pub auto_mappings: BTreeMap<ColumnName, String>,
    /// 0-100 confidence of each auto-mapping.
    pub confidence_scores: BTreeMap<ColumnName, f64>,
    pub sheet_info: Option<SheetInfo>,
    pub credit_info: Option<CreditInfo>,
    pub uploaded_at: Timestamp,
}

impl UploadSession {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    /// Raw preview cell, if the row exists and carries the column.
    pub fn preview_value(&self, row: usize, column: &str) -> Option<&serde_json::Value> {
        self.preview_rows.get(row).and_then(|r| r.get(column))
    }
}

// ---------------------------------------------------------------------------
// Confirm
// ---------------------------------------------------------------------------

/// Body of `POST /api/contacts/confirm-mapping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmMappingRequest {
    pub upload_id: String,
    pub field_mappings: FieldMapping,
    /// Owner identity (the service calls it `email`).
    pub email: String,
}

/// Response of `POST /api/contacts/confirm-mapping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfirmMappingResponse {
    pub validation_summary: ValidationSummary,
}

/// Row-level outcome of an import, produced by the service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    pub total_rows: u64,
    pub valid_contacts: u64,
    pub contacts_with_issues: u64,
    pub null_emails: u64,
    pub invalid_emails: u64,
    pub duplicate_emails: u64,
    #[serde(default)]
    pub issues_breakdown: IssuesBreakdown,
}

impl ValidationSummary {
    /// No row was flagged.
    pub fn is_clean(&self) -> bool {
        self.contacts_with_issues == 0
    }

    /// Number of issue descriptions across all categories.
    pub fn issue_count(&self) -> usize {
        self.issues_breakdown.len()
    }
}

/// Human-readable issue descriptions, grouped by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuesBreakdown {
    #[serde(default)]
    pub email_issues: Vec<String>,
    #[serde(default)]
    pub phone_issues: Vec<String>,
    #[serde(default)]
    pub name_issues: Vec<String>,
    #[serde(default)]
    pub required_field_issues: Vec<String>,
}

impl IssuesBreakdown {
    pub fn len(&self) -> usize {
        self.email_issues.len()
            + self.phone_issues.len()
            + self.name_issues.len()
            + self.required_field_issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(category label, issues)` pairs in display order.
    pub fn categories(&self) -> [(&'static str, &[String]); 4] {
        [
            ("Email", self.email_issues.as_slice()),
            ("Phone", self.phone_issues.as_slice()),
            ("Name", self.name_issues.as_slice()),
            ("Required fields", self.required_field_issues.as_slice()),
        ]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

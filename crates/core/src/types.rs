/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Source column name as detected in the uploaded file.
pub type ColumnName = String;

/// Canonical contact field identifier (e.g. `email`, `company`).
pub type FieldKey = String;

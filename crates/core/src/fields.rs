//! Target contact fields a source column can be mapped to.
//!
//! The import service advertises its selectable fields through
//! `GET /api/contacts/field-options`. When that endpoint is unreachable
//! the client falls back to [`FieldOptions::builtin`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reserved field keys
// ---------------------------------------------------------------------------

/// Sentinel mapping value meaning "do not import this column".
pub const IGNORE_FIELD: &str = "ignore";

/// The only field whose presence gates confirmation.
pub const EMAIL_FIELD: &str = "email";

pub const FIRST_NAME_FIELD: &str = "first_name";
pub const LAST_NAME_FIELD: &str = "last_name";

/// Fields counted by [`MappingStats::required`](crate::mapping::MappingStats).
pub const REQUIRED_FIELDS: &[&str] = &[EMAIL_FIELD, FIRST_NAME_FIELD, LAST_NAME_FIELD];

/// Whether `field` is one of [`REQUIRED_FIELDS`].
pub fn is_required_field(field: &str) -> bool {
    REQUIRED_FIELDS.contains(&field)
}

/// Whether a mapping value means "unmapped" (the sentinel or blank).
pub fn is_ignore_value(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == IGNORE_FIELD
}

// ---------------------------------------------------------------------------
// Built-in catalog
// ---------------------------------------------------------------------------

pub const CATEGORY_BASIC: &str = "Basic Information";
pub const CATEGORY_COMPANY: &str = "Company Information";
pub const CATEGORY_LOCATION: &str = "Location";
pub const CATEGORY_SOCIAL: &str = "Social & Web";
pub const CATEGORY_ADDITIONAL: &str = "Additional";

const BUILTIN_CATALOG: &[(&str, &[(&str, &str)])] = &[
    (
        CATEGORY_BASIC,
        &[
            (EMAIL_FIELD, "Email"),
            (FIRST_NAME_FIELD, "First Name"),
            (LAST_NAME_FIELD, "Last Name"),
            ("full_name", "Full Name"),
            ("phone", "Phone"),
            ("mobile_phone", "Mobile Phone"),
        ],
    ),
    (
        CATEGORY_COMPANY,
        &[
            ("company", "Company"),
            ("job_title", "Job Title"),
            ("department", "Department"),
            ("industry", "Industry"),
            ("company_size", "Company Size"),
            ("company_domain", "Company Domain"),
        ],
    ),
    (
        CATEGORY_LOCATION,
        &[
            ("address", "Address"),
            ("city", "City"),
            ("state", "State / Region"),
            ("country", "Country"),
            ("postal_code", "Postal Code"),
        ],
    ),
    (
        CATEGORY_SOCIAL,
        &[
            ("linkedin_url", "LinkedIn URL"),
            ("twitter_url", "Twitter URL"),
            ("website", "Website"),
        ],
    ),
    (
        CATEGORY_ADDITIONAL,
        &[
            ("notes", "Notes"),
            ("tags", "Tags"),
            ("lead_source", "Lead Source"),
        ],
    ),
];

// ---------------------------------------------------------------------------
// FieldOptions
// ---------------------------------------------------------------------------

/// Selectable target fields grouped by display category.
///
/// Category and field order follow the server response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOptions {
    /// Category name -> (field key -> human label).
    pub field_categories: IndexMap<String, IndexMap<String, String>>,
    /// Non-field choices such as the ignore sentinel.
    #[serde(default)]
    pub special_options: IndexMap<String, String>,
}

impl FieldOptions {
    /// The fixed catalog used when the service cannot be asked.
    pub fn builtin() -> Self {
        let field_categories = BUILTIN_CATALOG
            .iter()
            .map(|(category, fields)| {
                let fields = fields
                    .iter()
                    .map(|(key, label)| ((*key).to_string(), (*label).to_string()))
                    .collect();
                ((*category).to_string(), fields)
            })
            .collect();

        let mut special_options = IndexMap::new();
        special_options.insert(IGNORE_FIELD.to_string(), "Ignore this column".to_string());

        Self {
            field_categories,
            special_options,
        }
    }

    /// Strip the ignore sentinel from every category and drop categories
    /// that end up empty.
    pub fn sanitized(mut self) -> Self {
        for fields in self.field_categories.values_mut() {
            fields.retain(|key, _| !is_ignore_value(key));
        }
        self.field_categories.retain(|_, fields| !fields.is_empty());
        self
    }

    /// Whether `field` is a selectable target in any category.
    pub fn contains(&self, field: &str) -> bool {
        self.category_of(field).is_some()
    }

    /// Category that lists `field`, if any.
    pub fn category_of(&self, field: &str) -> Option<&str> {
        self.field_categories
            .iter()
            .find(|(_, fields)| fields.contains_key(field))
            .map(|(category, _)| category.as_str())
    }

    /// Display label for a field or special option.
    pub fn label_for(&self, field: &str) -> Option<&str> {
        self.field_categories
            .values()
            .find_map(|fields| fields.get(field))
            .or_else(|| self.special_options.get(field))
            .map(String::as_str)
    }

    /// Total number of selectable target fields.
    pub fn field_count(&self) -> usize {
        self.field_categories.values().map(IndexMap::len).sum()
    }
}

impl Default for FieldOptions {
    fn default() -> Self {
        Self::builtin()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

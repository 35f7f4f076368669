//! Plain-text rendering of sessions, mappings and validation results.
//!
//! Every renderer returns newline-terminated text ready for `print!`.

use contacthub_core::fields::FieldOptions;
use contacthub_core::import::{UploadSession, ValidationSummary};
use contacthub_core::mapping::{MappingEditor, MappingStats};

const UNMAPPED: &str = "(ignore)";

/// Target-field catalog, one category per block.
pub fn field_list(options: &FieldOptions) -> String {
    let mut lines = Vec::new();
    for (category, fields) in &options.field_categories {
        lines.push(category.clone());
        lines.extend(fields.iter().map(|(key, label)| format!("  {key:<20} {label}")));
    }
    lines.extend(
        options
            .special_options
            .iter()
            .map(|(key, label)| format!("  {key:<20} {label}")),
    );
    join_lines(lines)
}

/// File header: name, row count, sheet and credit info.
pub fn upload_header(session: &UploadSession) -> String {
    let mut lines = vec![format!(
        "Uploaded {} ({} rows, {} columns) as {}",
        session.filename,
        session.total_rows,
        session.columns.len(),
        session.upload_id
    )];

    if let Some(sheet) = session.sheet_info.as_ref().filter(|s| s.total_sheets > 1) {
        let selected = sheet.selected_sheet.as_deref().unwrap_or("first");
        lines.push(format!(
            "Sheet: {selected} (of {}: {})",
            sheet.total_sheets,
            sheet.sheet_names.join(", ")
        ));
    }

    if let Some(credits) = &session.credit_info {
        lines.push(format!(
            "Credits: {} available, {} required, {} remaining",
            credits.available, credits.required, credits.remaining
        ));
        if credits.is_short() {
            lines.push("warning: not enough credits to import every row".to_string());
        }
    }
    join_lines(lines)
}

/// One line per column: target field, confidence tier and a sample value
/// from the first preview row.
pub fn mapping_table(
    session: &UploadSession,
    editor: &MappingEditor,
    options: &FieldOptions,
) -> String {
    let width = editor
        .columns()
        .iter()
        .map(String::len)
        .max()
        .unwrap_or(0)
        .max("Column".len());

    let mut lines = vec![format!(
        "{:<width$}  {:<24}  {:<10}  Sample",
        "Column", "Field", "Confidence"
    )];
    for column in editor.columns() {
        let field = match editor.target_for(column) {
            Some(target) => options
                .label_for(target)
                .map(|label| format!("{target} ({label})"))
                .unwrap_or_else(|| target.to_string()),
            None => UNMAPPED.to_string(),
        };
        let tier = editor.confidence_tier(column).label();
        let sample = session
            .preview_value(0, column)
            .map(preview_cell)
            .unwrap_or_default();
        lines.push(format!("{column:<width$}  {field:<24}  {tier:<10}  {sample}"));
    }
    join_lines(lines)
}

pub fn stats_line(stats: &MappingStats) -> String {
    format!(
        "{} of {} columns mapped, {} unmapped, {} required fields mapped",
        stats.mapped, stats.total, stats.unmapped, stats.required
    )
}

/// Warnings for fields targeted by more than one column.
pub fn duplicate_warnings(editor: &MappingEditor) -> Vec<String> {
    editor
        .duplicate_targets()
        .into_iter()
        .map(|(field, columns)| {
            format!(
                "warning: field '{field}' is mapped from several columns: {}",
                columns.join(", ")
            )
        })
        .collect()
}

/// Counters followed by the per-category issue lists.
pub fn summary_report(summary: &ValidationSummary) -> String {
    let mut lines = vec![
        format!("Total rows:           {}", summary.total_rows),
        format!("Valid contacts:       {}", summary.valid_contacts),
        format!("Contacts with issues: {}", summary.contacts_with_issues),
        format!("  missing email:      {}", summary.null_emails),
        format!("  invalid email:      {}", summary.invalid_emails),
        format!("  duplicate email:    {}", summary.duplicate_emails),
    ];

    for (category, issues) in summary.issues_breakdown.categories() {
        if issues.is_empty() {
            continue;
        }
        lines.push(format!("{category} issues:"));
        lines.extend(issues.iter().map(|issue| format!("  - {issue}")));
    }
    join_lines(lines)
}

// ---- private helpers ----

fn join_lines(lines: Vec<String>) -> String {
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn preview_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

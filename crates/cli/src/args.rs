use std::path::PathBuf;

use clap::Parser;

/// Upload a contact spreadsheet, review the inferred field mapping and
/// confirm it with the import service.
#[derive(Debug, Parser)]
#[command(name = "contacthub-import", version)]
pub struct Args {
    /// CSV or Excel file to import.
    #[arg(required_unless_present = "list_fields")]
    pub file: Option<PathBuf>,

    /// Owner identity sent with the upload. Defaults to
    /// CONTACTHUB_OWNER_EMAIL.
    #[arg(long, value_name = "EMAIL")]
    pub owner: Option<String>,

    /// Override one column's target field. Use `ignore` or an empty FIELD
    /// to leave the column unmapped. Repeatable.
    #[arg(long = "map", value_name = "COLUMN=FIELD", value_parser = parse_override)]
    pub overrides: Vec<(String, String)>,

    /// Stop after printing the mapping; do not confirm.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the selectable target fields and exit.
    #[arg(long)]
    pub list_fields: bool,
}

/// Parse `COLUMN=FIELD`. Splits on the last `=` so column headers may
/// contain one.
pub fn parse_override(raw: &str) -> Result<(String, String), String> {
    let (column, field) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected COLUMN=FIELD, got '{raw}'"))?;
    if column.is_empty() {
        return Err(format!("missing column name in '{raw}'"));
    }
    Ok((column.to_string(), field.trim().to_string()))
}

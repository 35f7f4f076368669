//! `contacthub-import` -- upload a contact spreadsheet and confirm its
//! field mapping from the command line.
//!
//! # Environment variables
//!
//! | Variable                          | Required | Default | Description                          |
//! |-----------------------------------|----------|---------|--------------------------------------|
//! | `CONTACTHUB_API_URL`              | yes      | --      | Import service base URL              |
//! | `CONTACTHUB_OWNER_EMAIL`          | no       | --      | Owner identity when `--owner` is absent |
//! | `CONTACTHUB_REQUEST_TIMEOUT_SECS` | no       | none    | Whole-request timeout                |
//! | `RUST_LOG`                        | no       | `contacthub_cli=info,contacthub_importer=info` | Log filter |

mod args;
mod render;

use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::Parser;
use contacthub_core::fields::{is_ignore_value, FieldOptions};
use contacthub_importer::api::{ImportApi, UploadFile};
use contacthub_importer::config::{ConfigError, ImportConfig};
use contacthub_importer::error::ImportError;
use contacthub_importer::session::ImportSession;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::args::Args;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "contacthub_cli=info,contacthub_importer=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = ImportConfig::from_env()?;

    if args.list_fields {
        let options = match ImportApi::from_config(&config) {
            Ok(api) => ImportSession::new(api).field_options().await,
            Err(ConfigError::MissingBaseUrl) => FieldOptions::builtin(),
            Err(e) => return Err(e.into()),
        };
        print!("{}", render::field_list(&options));
        return Ok(());
    }

    let path = args.file.context("FILE is required")?;
    let owner = args
        .owner
        .or_else(|| config.owner_email.clone())
        .context("An owner identity is required: pass --owner or set CONTACTHUB_OWNER_EMAIL")?;

    let api = ImportApi::from_config(&config)?;
    tracing::info!(base_url = %api.base_url(), file = %path.display(), "Starting import");
    let session = ImportSession::new(api);
    let options = session.field_options().await;

    let file = UploadFile::from_path(&path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let uploaded = session.upload_file(file, &owner).await?;
    print!("{}", render::upload_header(&uploaded));

    for (column, field) in &args.overrides {
        if !is_ignore_value(field) && !options.contains(field) {
            tracing::warn!(
                column = %column,
                field = %field,
                "Target field is not in the field catalog",
            );
        }
        session
            .set_mapping(column, field)
            .with_context(|| format!("Cannot apply --map {column}={field}"))?;
    }

    let editor = session.editor().ok_or(ImportError::NoActiveSession)?;
    println!();
    print!("{}", render::mapping_table(&uploaded, &editor, &options));
    println!();
    println!("{}", render::stats_line(&editor.stats()));
    for warning in render::duplicate_warnings(&editor) {
        println!("{warning}");
    }

    if !editor.can_confirm() {
        bail!("No column is mapped to email; add --map COLUMN=email");
    }
    if args.dry_run {
        println!("Dry run: mapping not confirmed.");
        return Ok(());
    }

    let summary = session.confirm().await?;
    println!();
    print!("{}", render::summary_report(&summary));
    Ok(())
}

use crate::infra::{build_i18n_state, parse_pair};
use clap::Args;
use estate_hub::config::{AppConfig, ConfigError};
use estate_hub::error::AppError;
use estate_hub::i18n::{Locale, ReportOutcome, TranslationValues};
use estate_hub::inventory::{
    CommitOutcome, ImportSubmission, InMemoryInventoryRepository,
    MappingApproval, ProjectId, RowOutcome, UnitImportService,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct TranslateArgs {
    /// Dot-separated message key, e.g. `units.status.sold`
    pub(crate) key: String,
    /// Locale code (defaults to the configured default locale)
    #[arg(long)]
    pub(crate) locale: Option<String>,
    /// Namespace searched before the root of the message tree
    #[arg(long)]
    pub(crate) namespace: Option<String>,
    /// Interpolation value as NAME=VALUE; may be repeated
    #[arg(long = "value", value_parser = parse_pair)]
    pub(crate) values: Vec<(String, String)>,
    /// Text returned when the key is missing
    #[arg(long)]
    pub(crate) default: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct ImportArgs {
    /// CSV export with one unit per row
    pub(crate) csv: PathBuf,
    /// Project the units belong to
    #[arg(long)]
    pub(crate) project: String,
    /// Who is submitting the spreadsheet
    #[arg(long, default_value = "cli")]
    pub(crate) imported_by: String,
    /// Approve the suggested column mapping and commit immediately
    #[arg(long)]
    pub(crate) approve: bool,
}

pub(crate) async fn run_translate(args: TranslateArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let state = build_i18n_state(&config.i18n)?;

    let locale = match args.locale.as_deref() {
        Some(raw) => raw
            .parse::<Locale>()
            .map_err(|_| ConfigError::InvalidLocale(raw.to_string()))?,
        None => config.i18n.default_locale,
    };

    let mut values = TranslationValues::new();
    for (name, value) in &args.values {
        values.insert(name.as_str(), value);
    }
    if let Some(default) = args.default {
        values = values.with_default(default);
    }

    let translated = state
        .translator(locale)
        .resolve(&args.key, args.namespace.as_deref(), &values);

    println!("{}", translated.text);
    println!(
        "  locale: {}{}  resolution: {}",
        locale.code(),
        if locale.is_rtl() { " (rtl)" } else { "" },
        translated.resolution.label()
    );

    if let Some(reporter) = &state.reporter {
        match reporter.flush().await {
            ReportOutcome::Delivered { attempts, total } => {
                println!("  reported {total} missing translation(s) after {attempts} attempt(s)")
            }
            ReportOutcome::Failed { attempts, error } => {
                println!("  missing translation report failed after {attempts} attempt(s): {error}")
            }
            ReportOutcome::NothingToSend => {}
        }
    }

    Ok(())
}

pub(crate) fn run_import(args: ImportArgs) -> Result<(), AppError> {
    let csv = std::fs::read_to_string(&args.csv)?;
    let service = UnitImportService::new(Arc::new(InMemoryInventoryRepository::new()));

    let details = service.submit(
        ProjectId(args.project.clone()),
        ImportSubmission {
            imported_by: args.imported_by.clone(),
            csv,
            mapping: None,
        },
    )?;

    println!("Unit import {}", details.import.id);
    println!(
        "  Project: {}  Rows: {}",
        details.import.project_id, details.import.total_units
    );
    println!("  Suggested column mapping:");
    for (column, field) in &details.field_mapping.columns {
        println!("    {column} -> {}", field.label());
    }
    let missing = details.field_mapping.missing_required();
    if !missing.is_empty() {
        let labels: Vec<&str> = missing.iter().map(|field| field.label()).collect();
        println!("  Unmapped required fields: {}", labels.join(", "));
    }

    if !args.approve {
        println!("  Mapping awaits approval; rerun with --approve to commit");
        return Ok(());
    }

    service.approve_mapping(
        &details.import.id,
        MappingApproval {
            approved_by: args.imported_by,
            mapping: None,
        },
    )?;

    match service.commit(&details.import.id)? {
        CommitOutcome::Committed(summary) => {
            println!(
                "  Committed: {} created, {} updated, {} skipped, {} failed",
                summary.created_units,
                summary.updated_units,
                summary.skipped_units,
                summary.failed_units
            );
            for row in &summary.rows {
                match &row.outcome {
                    RowOutcome::Skipped { reason } => {
                        println!("    line {}: skipped ({reason})", row.line)
                    }
                    RowOutcome::Failed { error } => {
                        println!("    line {}: failed ({error})", row.line)
                    }
                    RowOutcome::Created { .. } | RowOutcome::Updated { .. } => {}
                }
            }
            Ok(())
        }
        CommitOutcome::AwaitingApproval {
            import_id,
            field_mapping_id,
        } => {
            println!("  Import {import_id} still awaits approval of mapping {field_mapping_id}");
            Ok(())
        }
    }
}

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{error, info, warn};

use super::domain::{
    CommitOutcome, FieldMapping, FieldMappingId, ImportDetails, ImportId, ImportSummary,
    PendingImport, ProjectId, RawTable, RowOutcome, UnitField, UnitId, UnitImportRecord,
    UnitVersionRecord, VersionId,
};
use super::mapping::suggest_columns;
use super::parser::{parse_table, ParseError};
use super::repository::{InventoryRepository, RepositoryError, UnitWrite};
use super::validation::validate_row;
use super::versioning::{paginate, PageRequest, VersionPage};

/// Raw spreadsheet submitted by an operator.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSubmission {
    pub imported_by: String,
    pub csv: String,
    #[serde(default)]
    pub mapping: Option<BTreeMap<String, UnitField>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingApproval {
    pub approved_by: String,
    /// Replaces the suggested columns when present.
    #[serde(default)]
    pub mapping: Option<BTreeMap<String, UnitField>>,
}

/// Service driving submit, approve and commit of unit imports.
pub struct UnitImportService<R> {
    repository: Arc<R>,
}

static IMPORT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static MAPPING_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static UNIT_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static VERSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_import_id() -> ImportId {
    let id = IMPORT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ImportId(format!("imp-{id:06}"))
}

fn next_mapping_id() -> FieldMappingId {
    let id = MAPPING_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    FieldMappingId(format!("map-{id:06}"))
}

fn next_unit_id() -> UnitId {
    let id = UNIT_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    UnitId(format!("unit-{id:06}"))
}

fn next_version_id() -> VersionId {
    let id = VERSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    VersionId(format!("ver-{id:06}"))
}

impl<R> UnitImportService<R>
where
    R: InventoryRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Store a parsed spreadsheet as a pending import with an unapproved mapping.
    pub fn submit(
        &self,
        project_id: ProjectId,
        submission: ImportSubmission,
    ) -> Result<ImportDetails, ImportServiceError> {
        let imported_by = submission.imported_by.trim();
        if imported_by.is_empty() {
            return Err(ImportServiceError::MissingActor("importedBy"));
        }
        if project_id.0.trim().is_empty() {
            return Err(ImportServiceError::MissingProject);
        }

        let raw_data = parse_table(submission.csv.as_bytes())?;
        let columns = match submission.mapping {
            Some(columns) => {
                check_columns(&raw_data, &columns)?;
                columns
            }
            None => suggest_columns(&raw_data.columns),
        };

        let field_mapping = FieldMapping {
            id: next_mapping_id(),
            project_id: project_id.clone(),
            columns,
            is_approved: false,
            approved_by: None,
            approved_at: None,
        };

        let import = UnitImportRecord {
            id: next_import_id(),
            project_id,
            import_date: Utc::now(),
            imported_by: imported_by.to_string(),
            total_units: raw_data.len(),
            created_units: 0,
            updated_units: 0,
            skipped_units: 0,
            failed_units: 0,
            field_mapping_id: field_mapping.id.clone(),
            raw_data,
            processed: false,
        };

        self.repository
            .insert_import(import.clone(), field_mapping.clone())?;
        info!(
            import_id = %import.id,
            project_id = %import.project_id,
            rows = import.total_units,
            mapped_columns = field_mapping.columns.len(),
            "unit import submitted"
        );

        Ok(ImportDetails {
            import,
            field_mapping,
        })
    }

    /// Imports not yet committed, optionally for one project.
    pub fn pending(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<PendingImport>, ImportServiceError> {
        self.repository
            .pending_imports(project_id)?
            .into_iter()
            .map(|import| {
                let mapping = self.mapping_for(&import)?;
                Ok(PendingImport::new(import, mapping))
            })
            .collect()
    }

    pub fn import(&self, import_id: &ImportId) -> Result<ImportDetails, ImportServiceError> {
        let import = self.fetch_import(import_id)?;
        let field_mapping = self.mapping_for(&import)?;
        Ok(ImportDetails {
            import,
            field_mapping,
        })
    }

    /// Approve the field mapping, optionally replacing its columns first.
    pub fn approve_mapping(
        &self,
        import_id: &ImportId,
        approval: MappingApproval,
    ) -> Result<FieldMapping, ImportServiceError> {
        let approved_by = approval.approved_by.trim();
        if approved_by.is_empty() {
            return Err(ImportServiceError::MissingActor("approvedBy"));
        }

        let import = self.fetch_import(import_id)?;
        if import.processed {
            return Err(ImportServiceError::AlreadyProcessed(import.id));
        }

        let mut mapping = self.mapping_for(&import)?;
        if let Some(columns) = approval.mapping {
            check_columns(&import.raw_data, &columns)?;
            mapping.columns = columns;
        }

        let missing = mapping.missing_required();
        if !missing.is_empty() {
            return Err(ImportServiceError::MissingRequiredFields(missing));
        }

        mapping.is_approved = true;
        mapping.approved_by = Some(approved_by.to_string());
        mapping.approved_at = Some(Utc::now());
        self.repository.update_mapping(mapping.clone())?;

        info!(
            import_id = %import.id,
            field_mapping_id = %mapping.id,
            approved_by,
            "unit import mapping approved"
        );
        Ok(mapping)
    }

    /// Apply an approved import row by row.
    ///
    /// A row that fails validation or persistence is reported in the summary and the batch
    /// carries on with the next row.
    pub fn commit(&self, import_id: &ImportId) -> Result<CommitOutcome, ImportServiceError> {
        let mut import = self.fetch_import(import_id)?;
        if import.processed {
            return Err(ImportServiceError::AlreadyProcessed(import.id));
        }

        let mapping = self.mapping_for(&import)?;
        if !mapping.is_approved {
            info!(import_id = %import.id, "unit import awaiting mapping approval");
            return Ok(CommitOutcome::AwaitingApproval {
                import_id: import.id,
                field_mapping_id: mapping.id,
            });
        }

        if !self.repository.claim_import(&import.id)? {
            return Err(ImportServiceError::AlreadyProcessed(import.id));
        }

        let mut summary = ImportSummary::new(import.id.clone());
        let mut last_version_date: Option<DateTime<Utc>> = None;

        for (index, row) in import.raw_data.rows.iter().enumerate() {
            let line = index + 2;
            let outcome = self.commit_row(&import, &mapping, row, line, &mut last_version_date);
            summary.record(line, outcome);
        }

        import.processed = true;
        import.created_units = summary.created_units;
        import.updated_units = summary.updated_units;
        import.skipped_units = summary.skipped_units;
        import.failed_units = summary.failed_units;
        self.repository.update_import(import)?;

        info!(
            import_id = %summary.import_id,
            created = summary.created_units,
            updated = summary.updated_units,
            skipped = summary.skipped_units,
            failed = summary.failed_units,
            "unit import committed"
        );
        Ok(CommitOutcome::Committed(summary))
    }

    fn commit_row(
        &self,
        import: &UnitImportRecord,
        mapping: &FieldMapping,
        row: &[String],
        line: usize,
        last_version_date: &mut Option<DateTime<Utc>>,
    ) -> RowOutcome {
        let draft = match validate_row(mapping, &import.raw_data.columns, row) {
            Ok(draft) => draft,
            Err(reason) => {
                warn!(import_id = %import.id, line, %reason, "skipping unit row");
                return RowOutcome::Skipped { reason };
            }
        };

        let building = draft.building.clone();
        let number = draft.number.clone();
        let key = draft.natural_key(&import.project_id);

        let now = Utc::now();
        let version_date = last_version_date.map_or(now, |previous| previous.max(now));

        let write = match self.repository.find_unit(&key) {
            Ok(Some(mut unit)) => {
                draft.apply_to(&mut unit, version_date);
                UnitWrite::Update(unit)
            }
            Ok(None) => UnitWrite::Insert(draft.into_unit(
                next_unit_id(),
                import.project_id.clone(),
                version_date,
            )),
            Err(err) => {
                error!(import_id = %import.id, line, building = %building, number = %number, error = %err, "unit lookup failed");
                return RowOutcome::Failed {
                    error: err.to_string(),
                };
            }
        };

        let unit_id = write.unit().id.clone();
        let version = UnitVersionRecord::snapshot(
            next_version_id(),
            write.unit(),
            import.id.clone(),
            version_date,
        );
        let created = matches!(write, UnitWrite::Insert(_));

        match self.repository.save_unit(write, version) {
            Ok(()) => {
                *last_version_date = Some(version_date);
                if created {
                    RowOutcome::Created { unit_id }
                } else {
                    RowOutcome::Updated { unit_id }
                }
            }
            Err(err) => {
                error!(import_id = %import.id, line, building = %building, number = %number, error = %err, "unit write failed");
                RowOutcome::Failed {
                    error: err.to_string(),
                }
            }
        }
    }

    /// Newest-first version history with per-entry diffs.
    pub fn versions(
        &self,
        unit_id: &UnitId,
        request: PageRequest,
    ) -> Result<VersionPage, ImportServiceError> {
        if self.repository.fetch_unit(unit_id)?.is_none() {
            return Err(ImportServiceError::UnitNotFound(unit_id.clone()));
        }
        let history = self.repository.versions(unit_id)?;
        Ok(paginate(unit_id.clone(), &history, request))
    }

    fn fetch_import(&self, import_id: &ImportId) -> Result<UnitImportRecord, ImportServiceError> {
        self.repository
            .fetch_import(import_id)?
            .ok_or_else(|| ImportServiceError::ImportNotFound(import_id.clone()))
    }

    fn mapping_for(&self, import: &UnitImportRecord) -> Result<FieldMapping, ImportServiceError> {
        self.repository
            .fetch_mapping(&import.field_mapping_id)?
            .ok_or(ImportServiceError::Repository(RepositoryError::NotFound))
    }
}

fn check_columns(
    table: &RawTable,
    columns: &BTreeMap<String, UnitField>,
) -> Result<(), ImportServiceError> {
    if let Some(unknown) = columns.keys().find(|column| !table.has_column(column)) {
        return Err(ImportServiceError::UnknownColumn(unknown.clone()));
    }

    let mut seen: Vec<UnitField> = Vec::with_capacity(columns.len());
    for field in columns.values() {
        if seen.contains(field) {
            return Err(ImportServiceError::DuplicateField(*field));
        }
        seen.push(*field);
    }
    Ok(())
}

fn field_list(fields: &[UnitField]) -> String {
    fields
        .iter()
        .map(|field| field.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Error raised by the unit import service.
#[derive(Debug, thiserror::Error)]
pub enum ImportServiceError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("{0} is required")]
    MissingActor(&'static str),
    #[error("project id is required")]
    MissingProject,
    #[error("import {0} not found")]
    ImportNotFound(ImportId),
    #[error("unit {0} not found")]
    UnitNotFound(UnitId),
    #[error("import {0} has already been processed")]
    AlreadyProcessed(ImportId),
    #[error("mapping references unknown column '{0}'")]
    UnknownColumn(String),
    #[error("mapping assigns {0} to more than one column")]
    DuplicateField(UnitField),
    #[error("mapping does not cover required fields: {}", field_list(.0))]
    MissingRequiredFields(Vec<UnitField>),
}

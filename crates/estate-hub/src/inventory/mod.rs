//! Bulk unit ingest: spreadsheet submission, field-mapping approval, row-by-row commit with
//! version snapshots, and version history with derived diffs.

pub mod domain;
pub(crate) mod mapping;
pub mod memory;
pub(crate) mod normalizer;
pub mod parser;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
pub mod versioning;

#[cfg(test)]
mod tests;

pub use domain::{
    CommitOutcome, FieldMapping, FieldMappingId, ImportDetails, ImportId, ImportSummary,
    PendingImport, ProjectId, RawTable, RowOutcome, RowReport, Unit, UnitDraft, UnitField,
    UnitId, UnitImportRecord, UnitKey, UnitStatus, UnitVersionRecord, VersionId,
};
pub use memory::InMemoryInventoryRepository;
pub use parser::ParseError;
pub use repository::{InventoryRepository, RepositoryError, UnitWrite};
pub use router::inventory_router;
pub use service::{ImportServiceError, ImportSubmission, MappingApproval, UnitImportService};
pub use validation::RowError;
pub use versioning::{
    AreaChange, PageRequest, PriceChange, StatusChange, VersionChanges, VersionPage, VersionView,
};

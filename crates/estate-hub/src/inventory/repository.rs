use super::domain::{
    FieldMapping, FieldMappingId, ImportId, ProjectId, Unit, UnitId, UnitImportRecord, UnitKey,
    UnitVersionRecord,
};

/// Unit write paired with its version snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum UnitWrite {
    Insert(Unit),
    Update(Unit),
}

impl UnitWrite {
    pub fn unit(&self) -> &Unit {
        match self {
            UnitWrite::Insert(unit) | UnitWrite::Update(unit) => unit,
        }
    }
}

/// Storage abstraction so the import service can be exercised in isolation.
pub trait InventoryRepository: Send + Sync {
    fn insert_import(
        &self,
        import: UnitImportRecord,
        mapping: FieldMapping,
    ) -> Result<(), RepositoryError>;
    fn update_import(&self, import: UnitImportRecord) -> Result<(), RepositoryError>;
    fn fetch_import(&self, id: &ImportId) -> Result<Option<UnitImportRecord>, RepositoryError>;
    /// Atomically marks the import processed. Returns `false` when it already was, so only
    /// one commit applies its rows.
    fn claim_import(&self, id: &ImportId) -> Result<bool, RepositoryError>;
    /// Unprocessed imports, oldest first.
    fn pending_imports(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<UnitImportRecord>, RepositoryError>;

    fn fetch_mapping(&self, id: &FieldMappingId) -> Result<Option<FieldMapping>, RepositoryError>;
    fn update_mapping(&self, mapping: FieldMapping) -> Result<(), RepositoryError>;

    fn find_unit(&self, key: &UnitKey) -> Result<Option<Unit>, RepositoryError>;
    fn fetch_unit(&self, id: &UnitId) -> Result<Option<Unit>, RepositoryError>;
    /// Persists the unit and appends its version in one transaction: either both are
    /// stored or neither is.
    fn save_unit(&self, write: UnitWrite, version: UnitVersionRecord)
        -> Result<(), RepositoryError>;
    /// Version history, newest first.
    fn versions(&self, unit_id: &UnitId) -> Result<Vec<UnitVersionRecord>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("constraint violated: {0}")]
    Constraint(String),
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

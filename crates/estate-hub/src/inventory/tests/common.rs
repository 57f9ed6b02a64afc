use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

use axum::response::Response;
use serde_json::Value;

use crate::inventory::domain::{
    FieldMapping, FieldMappingId, ImportId, ProjectId, Unit, UnitId, UnitImportRecord, UnitKey,
    UnitVersionRecord,
};
use crate::inventory::memory::InMemoryInventoryRepository;
use crate::inventory::repository::{InventoryRepository, RepositoryError, UnitWrite};
use crate::inventory::service::{ImportSubmission, MappingApproval, UnitImportService};

pub(super) const HEADER: &str = "Building,Unit No.,Price,Status,Area (sqm),Floor,View";

pub(super) fn project() -> ProjectId {
    ProjectId("sea-breeze".to_string())
}

pub(super) fn csv(rows: &[&str]) -> String {
    let mut body = String::from(HEADER);
    for row in rows {
        body.push('\n');
        body.push_str(row);
    }
    body.push('\n');
    body
}

/// Ten rows for building A; the fifth has a price that is not a number.
pub(super) fn ten_rows_with_bad_fifth() -> String {
    let rows: Vec<String> = (1..=10)
        .map(|index| {
            let price = if index == 5 {
                "call us".to_string()
            } else {
                format!("{}", 100_000 + index * 1_000)
            };
            format!("A,{},{price},available,{}.5,{index},Sea", 100 + index, 40 + index)
        })
        .collect();
    let borrowed: Vec<&str> = rows.iter().map(String::as_str).collect();
    csv(&borrowed)
}

pub(super) fn submission(csv: String) -> ImportSubmission {
    ImportSubmission {
        imported_by: "ops@estate.test".to_string(),
        csv,
        mapping: None,
    }
}

pub(super) fn approval() -> MappingApproval {
    MappingApproval {
        approved_by: "lead@estate.test".to_string(),
        mapping: None,
    }
}

pub(super) fn memory_service() -> (
    Arc<UnitImportService<InMemoryInventoryRepository>>,
    Arc<InMemoryInventoryRepository>,
) {
    let repository = Arc::new(InMemoryInventoryRepository::new());
    let service = Arc::new(UnitImportService::new(repository.clone()));
    (service, repository)
}

pub(super) fn approved_import<R>(service: &UnitImportService<R>, csv: String) -> ImportId
where
    R: InventoryRepository + 'static,
{
    let details = service
        .submit(project(), submission(csv))
        .expect("submit succeeds");
    service
        .approve_mapping(&details.import.id, approval())
        .expect("approval succeeds");
    details.import.id
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("body readable");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Delegates to memory but rejects unit writes for one unit number.
pub(super) struct FlakyRepository {
    pub(super) inner: InMemoryInventoryRepository,
    pub(super) failing_number: String,
}

impl FlakyRepository {
    pub(super) fn failing_on(number: &str) -> Self {
        Self {
            inner: InMemoryInventoryRepository::new(),
            failing_number: number.to_string(),
        }
    }
}

impl InventoryRepository for FlakyRepository {
    fn insert_import(
        &self,
        import: UnitImportRecord,
        mapping: FieldMapping,
    ) -> Result<(), RepositoryError> {
        self.inner.insert_import(import, mapping)
    }

    fn update_import(&self, import: UnitImportRecord) -> Result<(), RepositoryError> {
        self.inner.update_import(import)
    }

    fn fetch_import(&self, id: &ImportId) -> Result<Option<UnitImportRecord>, RepositoryError> {
        self.inner.fetch_import(id)
    }

    fn claim_import(&self, id: &ImportId) -> Result<bool, RepositoryError> {
        self.inner.claim_import(id)
    }

    fn pending_imports(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<UnitImportRecord>, RepositoryError> {
        self.inner.pending_imports(project_id)
    }

    fn fetch_mapping(&self, id: &FieldMappingId) -> Result<Option<FieldMapping>, RepositoryError> {
        self.inner.fetch_mapping(id)
    }

    fn update_mapping(&self, mapping: FieldMapping) -> Result<(), RepositoryError> {
        self.inner.update_mapping(mapping)
    }

    fn find_unit(&self, key: &UnitKey) -> Result<Option<Unit>, RepositoryError> {
        self.inner.find_unit(key)
    }

    fn fetch_unit(&self, id: &UnitId) -> Result<Option<Unit>, RepositoryError> {
        self.inner.fetch_unit(id)
    }

    fn save_unit(
        &self,
        write: UnitWrite,
        version: UnitVersionRecord,
    ) -> Result<(), RepositoryError> {
        if write.unit().number == self.failing_number {
            return Err(RepositoryError::Constraint(format!(
                "unit {} violates a unique index",
                self.failing_number
            )));
        }
        self.inner.save_unit(write, version)
    }

    fn versions(&self, unit_id: &UnitId) -> Result<Vec<UnitVersionRecord>, RepositoryError> {
        self.inner.versions(unit_id)
    }
}

/// Every call fails as if the database were down.
pub(super) struct UnavailableRepository;

fn down<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl InventoryRepository for UnavailableRepository {
    fn insert_import(&self, _: UnitImportRecord, _: FieldMapping) -> Result<(), RepositoryError> {
        down()
    }

    fn update_import(&self, _: UnitImportRecord) -> Result<(), RepositoryError> {
        down()
    }

    fn fetch_import(&self, _: &ImportId) -> Result<Option<UnitImportRecord>, RepositoryError> {
        down()
    }

    fn claim_import(&self, _: &ImportId) -> Result<bool, RepositoryError> {
        down()
    }

    fn pending_imports(
        &self,
        _: Option<&ProjectId>,
    ) -> Result<Vec<UnitImportRecord>, RepositoryError> {
        down()
    }

    fn fetch_mapping(&self, _: &FieldMappingId) -> Result<Option<FieldMapping>, RepositoryError> {
        down()
    }

    fn update_mapping(&self, _: FieldMapping) -> Result<(), RepositoryError> {
        down()
    }

    fn find_unit(&self, _: &UnitKey) -> Result<Option<Unit>, RepositoryError> {
        down()
    }

    fn fetch_unit(&self, _: &UnitId) -> Result<Option<Unit>, RepositoryError> {
        down()
    }

    fn save_unit(&self, _: UnitWrite, _: UnitVersionRecord) -> Result<(), RepositoryError> {
        down()
    }

    fn versions(&self, _: &UnitId) -> Result<Vec<UnitVersionRecord>, RepositoryError> {
        down()
    }
}

/// Holds the first `parties` import lookups until all of them have arrived, so concurrent
/// commits read the same unprocessed record.
pub(super) struct LockstepRepository {
    pub(super) inner: InMemoryInventoryRepository,
    parties: usize,
    armed: AtomicBool,
    arrivals: AtomicUsize,
    gate: Barrier,
}

impl LockstepRepository {
    pub(super) fn new(parties: usize) -> Self {
        Self {
            inner: InMemoryInventoryRepository::new(),
            parties,
            armed: AtomicBool::new(false),
            arrivals: AtomicUsize::new(0),
            gate: Barrier::new(parties),
        }
    }

    /// Lookups made before arming pass straight through.
    pub(super) fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl InventoryRepository for LockstepRepository {
    fn insert_import(
        &self,
        import: UnitImportRecord,
        mapping: FieldMapping,
    ) -> Result<(), RepositoryError> {
        self.inner.insert_import(import, mapping)
    }

    fn update_import(&self, import: UnitImportRecord) -> Result<(), RepositoryError> {
        self.inner.update_import(import)
    }

    fn fetch_import(&self, id: &ImportId) -> Result<Option<UnitImportRecord>, RepositoryError> {
        let record = self.inner.fetch_import(id);
        if self.armed.load(Ordering::SeqCst)
            && self.arrivals.fetch_add(1, Ordering::SeqCst) < self.parties
        {
            self.gate.wait();
        }
        record
    }

    fn claim_import(&self, id: &ImportId) -> Result<bool, RepositoryError> {
        self.inner.claim_import(id)
    }

    fn pending_imports(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<UnitImportRecord>, RepositoryError> {
        self.inner.pending_imports(project_id)
    }

    fn fetch_mapping(&self, id: &FieldMappingId) -> Result<Option<FieldMapping>, RepositoryError> {
        self.inner.fetch_mapping(id)
    }

    fn update_mapping(&self, mapping: FieldMapping) -> Result<(), RepositoryError> {
        self.inner.update_mapping(mapping)
    }

    fn find_unit(&self, key: &UnitKey) -> Result<Option<Unit>, RepositoryError> {
        self.inner.find_unit(key)
    }

    fn fetch_unit(&self, id: &UnitId) -> Result<Option<Unit>, RepositoryError> {
        self.inner.fetch_unit(id)
    }

    fn save_unit(
        &self,
        write: UnitWrite,
        version: UnitVersionRecord,
    ) -> Result<(), RepositoryError> {
        self.inner.save_unit(write, version)
    }

    fn versions(&self, unit_id: &UnitId) -> Result<Vec<UnitVersionRecord>, RepositoryError> {
        self.inner.versions(unit_id)
    }
}

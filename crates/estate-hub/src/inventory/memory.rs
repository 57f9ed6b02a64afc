use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::domain::{
    FieldMapping, FieldMappingId, ImportId, ProjectId, Unit, UnitId, UnitImportRecord, UnitKey,
    UnitVersionRecord,
};
use super::repository::{InventoryRepository, RepositoryError, UnitWrite};

#[derive(Debug, Default)]
struct InventoryState {
    imports: HashMap<ImportId, UnitImportRecord>,
    mappings: HashMap<FieldMappingId, FieldMapping>,
    units: HashMap<UnitId, Unit>,
    unit_keys: HashMap<UnitKey, UnitId>,
    /// Chronological, oldest first.
    versions: HashMap<UnitId, Vec<UnitVersionRecord>>,
}

/// Process-local store; the mutex is the transaction boundary.
#[derive(Debug, Default)]
pub struct InMemoryInventoryRepository {
    state: Mutex<InventoryState>,
}

impl InMemoryInventoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, InventoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn units(&self, project_id: &ProjectId) -> Vec<Unit> {
        let mut units: Vec<Unit> = self
            .lock()
            .units
            .values()
            .filter(|unit| &unit.project_id == project_id)
            .cloned()
            .collect();
        units.sort_by(|a, b| (&a.building, &a.number).cmp(&(&b.building, &b.number)));
        units
    }
}

impl InventoryRepository for InMemoryInventoryRepository {
    fn insert_import(
        &self,
        import: UnitImportRecord,
        mapping: FieldMapping,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        if state.imports.contains_key(&import.id) || state.mappings.contains_key(&mapping.id) {
            return Err(RepositoryError::Conflict);
        }
        state.mappings.insert(mapping.id.clone(), mapping);
        state.imports.insert(import.id.clone(), import);
        Ok(())
    }

    fn update_import(&self, import: UnitImportRecord) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        match state.imports.get_mut(&import.id) {
            Some(slot) => {
                *slot = import;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn fetch_import(&self, id: &ImportId) -> Result<Option<UnitImportRecord>, RepositoryError> {
        Ok(self.lock().imports.get(id).cloned())
    }

    fn claim_import(&self, id: &ImportId) -> Result<bool, RepositoryError> {
        let mut state = self.lock();
        match state.imports.get_mut(id) {
            Some(import) if import.processed => Ok(false),
            Some(import) => {
                import.processed = true;
                Ok(true)
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn pending_imports(
        &self,
        project_id: Option<&ProjectId>,
    ) -> Result<Vec<UnitImportRecord>, RepositoryError> {
        let mut pending: Vec<UnitImportRecord> = self
            .lock()
            .imports
            .values()
            .filter(|import| !import.processed)
            .filter(|import| project_id.map_or(true, |project| &import.project_id == project))
            .cloned()
            .collect();
        pending.sort_by(|a, b| (a.import_date, &a.id).cmp(&(b.import_date, &b.id)));
        Ok(pending)
    }

    fn fetch_mapping(&self, id: &FieldMappingId) -> Result<Option<FieldMapping>, RepositoryError> {
        Ok(self.lock().mappings.get(id).cloned())
    }

    fn update_mapping(&self, mapping: FieldMapping) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        match state.mappings.get_mut(&mapping.id) {
            Some(slot) => {
                *slot = mapping;
                Ok(())
            }
            None => Err(RepositoryError::NotFound),
        }
    }

    fn find_unit(&self, key: &UnitKey) -> Result<Option<Unit>, RepositoryError> {
        let state = self.lock();
        Ok(state
            .unit_keys
            .get(key)
            .and_then(|id| state.units.get(id))
            .cloned())
    }

    fn fetch_unit(&self, id: &UnitId) -> Result<Option<Unit>, RepositoryError> {
        Ok(self.lock().units.get(id).cloned())
    }

    fn save_unit(
        &self,
        write: UnitWrite,
        version: UnitVersionRecord,
    ) -> Result<(), RepositoryError> {
        let mut state = self.lock();
        let unit = write.unit();

        if version.unit_id != unit.id {
            return Err(RepositoryError::Constraint(format!(
                "version {} belongs to unit {}, not {}",
                version.id, version.unit_id, unit.id
            )));
        }

        let key = unit.natural_key();
        match &write {
            UnitWrite::Insert(unit) => {
                if state.units.contains_key(&unit.id) || state.unit_keys.contains_key(&key) {
                    return Err(RepositoryError::Conflict);
                }
            }
            UnitWrite::Update(unit) => match state.units.get(&unit.id) {
                None => return Err(RepositoryError::NotFound),
                Some(existing) if existing.natural_key() != key => {
                    return Err(RepositoryError::Constraint(format!(
                        "unit {} cannot change its building or number",
                        unit.id
                    )));
                }
                Some(_) => {}
            },
        }

        let unit = match write {
            UnitWrite::Insert(unit) | UnitWrite::Update(unit) => unit,
        };
        state.unit_keys.insert(key, unit.id.clone());
        state
            .versions
            .entry(unit.id.clone())
            .or_default()
            .push(version);
        state.units.insert(unit.id.clone(), unit);
        Ok(())
    }

    fn versions(&self, unit_id: &UnitId) -> Result<Vec<UnitVersionRecord>, RepositoryError> {
        Ok(self
            .lock()
            .versions
            .get(unit_id)
            .map(|history| history.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

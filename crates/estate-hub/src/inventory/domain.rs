use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::RowError;

/// Identifier of the project (development) units belong to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VersionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldMappingId(pub String);

macro_rules! display_id {
    ($($id:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $id {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(&self.0)
                }
            }
        )+
    };
}

display_id!(ProjectId, UnitId, ImportId, VersionId, FieldMappingId);

/// Sales state of a unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    #[default]
    Available,
    Reserved,
    Sold,
    Unavailable,
}

impl UnitStatus {
    pub const fn label(self) -> &'static str {
        match self {
            UnitStatus::Available => "available",
            UnitStatus::Reserved => "reserved",
            UnitStatus::Sold => "sold",
            UnitStatus::Unavailable => "unavailable",
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Unit attribute a spreadsheet column can be mapped onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UnitField {
    Building,
    Number,
    Price,
    Status,
    Area,
    Floor,
    Description,
    WindowView,
    Bedrooms,
    Layout,
}

impl UnitField {
    pub const REQUIRED: [UnitField; 3] = [UnitField::Building, UnitField::Number, UnitField::Price];

    pub const fn label(self) -> &'static str {
        match self {
            UnitField::Building => "building",
            UnitField::Number => "number",
            UnitField::Price => "price",
            UnitField::Status => "status",
            UnitField::Area => "area",
            UnitField::Floor => "floor",
            UnitField::Description => "description",
            UnitField::WindowView => "windowView",
            UnitField::Bedrooms => "bedrooms",
            UnitField::Layout => "layout",
        }
    }
}

impl fmt::Display for UnitField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Natural key: a unit number is unique within a building of a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitKey {
    pub project_id: ProjectId,
    pub building: String,
    pub number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
    pub id: UnitId,
    pub project_id: ProjectId,
    pub building: String,
    pub number: String,
    pub price: f64,
    pub status: UnitStatus,
    pub area: Option<f64>,
    pub floor: Option<i32>,
    pub description: Option<String>,
    pub window_view: Option<String>,
    pub bedrooms: Option<u32>,
    pub layout: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Unit {
    pub fn natural_key(&self) -> UnitKey {
        UnitKey {
            project_id: self.project_id.clone(),
            building: self.building.clone(),
            number: self.number.clone(),
        }
    }
}

/// Validated values of one spreadsheet row.
///
/// Optional attributes that are absent leave an existing unit's value untouched; a new unit
/// without a status starts as [`UnitStatus::Available`].
#[derive(Debug, Clone, PartialEq)]
pub struct UnitDraft {
    pub building: String,
    pub number: String,
    pub price: f64,
    pub status: Option<UnitStatus>,
    pub area: Option<f64>,
    pub floor: Option<i32>,
    pub description: Option<String>,
    pub window_view: Option<String>,
    pub bedrooms: Option<u32>,
    pub layout: Option<String>,
}

impl UnitDraft {
    pub fn natural_key(&self, project_id: &ProjectId) -> UnitKey {
        UnitKey {
            project_id: project_id.clone(),
            building: self.building.clone(),
            number: self.number.clone(),
        }
    }

    pub fn into_unit(self, id: UnitId, project_id: ProjectId, now: DateTime<Utc>) -> Unit {
        Unit {
            id,
            project_id,
            building: self.building,
            number: self.number,
            price: self.price,
            status: self.status.unwrap_or_default(),
            area: self.area,
            floor: self.floor,
            description: self.description,
            window_view: self.window_view,
            bedrooms: self.bedrooms,
            layout: self.layout,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply_to(self, unit: &mut Unit, now: DateTime<Utc>) {
        unit.price = self.price;
        if let Some(status) = self.status {
            unit.status = status;
        }
        if self.area.is_some() {
            unit.area = self.area;
        }
        if self.floor.is_some() {
            unit.floor = self.floor;
        }
        if self.description.is_some() {
            unit.description = self.description;
        }
        if self.window_view.is_some() {
            unit.window_view = self.window_view;
        }
        if self.bedrooms.is_some() {
            unit.bedrooms = self.bedrooms;
        }
        if self.layout.is_some() {
            unit.layout = self.layout;
        }
        unit.updated_at = now;
    }
}

/// Parsed spreadsheet kept on the import for auditing and later commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|candidate| candidate == column)
    }
}

/// Column to unit-field association plus its approval gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub id: FieldMappingId,
    pub project_id: ProjectId,
    pub columns: BTreeMap<String, UnitField>,
    pub is_approved: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
}

impl FieldMapping {
    /// Required fields no column is mapped onto.
    pub fn missing_required(&self) -> Vec<UnitField> {
        UnitField::REQUIRED
            .into_iter()
            .filter(|field| !self.columns.values().any(|mapped| mapped == field))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitImportRecord {
    pub id: ImportId,
    pub project_id: ProjectId,
    pub import_date: DateTime<Utc>,
    pub imported_by: String,
    pub total_units: usize,
    pub created_units: usize,
    pub updated_units: usize,
    pub skipped_units: usize,
    pub failed_units: usize,
    pub field_mapping_id: FieldMappingId,
    pub raw_data: RawTable,
    pub processed: bool,
}

/// Immutable snapshot of a unit as written by one import.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitVersionRecord {
    pub id: VersionId,
    pub unit_id: UnitId,
    pub import_id: ImportId,
    pub version_date: DateTime<Utc>,
    pub price: f64,
    pub status: UnitStatus,
    pub area: Option<f64>,
    pub floor: Option<i32>,
    pub description: Option<String>,
    pub window_view: Option<String>,
}

impl UnitVersionRecord {
    pub fn snapshot(
        id: VersionId,
        unit: &Unit,
        import_id: ImportId,
        version_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            unit_id: unit.id.clone(),
            import_id,
            version_date,
            price: unit.price,
            status: unit.status,
            area: unit.area,
            floor: unit.floor,
            description: unit.description.clone(),
            window_view: unit.window_view.clone(),
        }
    }
}

/// Result of committing one spreadsheet row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RowOutcome {
    Created { unit_id: UnitId },
    Updated { unit_id: UnitId },
    Skipped { reason: RowError },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowReport {
    /// 1-based spreadsheet line, header included.
    pub line: usize,
    #[serde(flatten)]
    pub outcome: RowOutcome,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub import_id: ImportId,
    pub total_units: usize,
    pub created_units: usize,
    pub updated_units: usize,
    pub skipped_units: usize,
    pub failed_units: usize,
    pub rows: Vec<RowReport>,
}

impl ImportSummary {
    pub fn new(import_id: ImportId) -> Self {
        Self {
            import_id,
            total_units: 0,
            created_units: 0,
            updated_units: 0,
            skipped_units: 0,
            failed_units: 0,
            rows: Vec::new(),
        }
    }

    pub fn record(&mut self, line: usize, outcome: RowOutcome) {
        self.total_units += 1;
        match &outcome {
            RowOutcome::Created { .. } => self.created_units += 1,
            RowOutcome::Updated { .. } => self.updated_units += 1,
            RowOutcome::Skipped { .. } => self.skipped_units += 1,
            RowOutcome::Failed { .. } => self.failed_units += 1,
        }
        self.rows.push(RowReport { line, outcome });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommitOutcome {
    Committed(ImportSummary),
    #[serde(rename_all = "camelCase")]
    AwaitingApproval {
        import_id: ImportId,
        field_mapping_id: FieldMappingId,
    },
}

/// Import plus the mapping that governs it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDetails {
    pub import: UnitImportRecord,
    pub field_mapping: FieldMapping,
}

/// Listing entry for imports that have not been committed yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingImport {
    pub import_id: ImportId,
    pub project_id: ProjectId,
    pub import_date: DateTime<Utc>,
    pub imported_by: String,
    pub total_units: usize,
    pub columns: Vec<String>,
    pub field_mapping: FieldMapping,
}

impl PendingImport {
    pub fn new(import: UnitImportRecord, field_mapping: FieldMapping) -> Self {
        Self {
            import_id: import.id,
            project_id: import.project_id,
            import_date: import.import_date,
            imported_by: import.imported_by,
            total_units: import.total_units,
            columns: import.raw_data.columns,
            field_mapping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft() -> UnitDraft {
        UnitDraft {
            building: "A".to_string(),
            number: "101".to_string(),
            price: 120_000.0,
            status: None,
            area: Some(42.5),
            floor: None,
            description: None,
            window_view: Some("Sea".to_string()),
            bedrooms: None,
            layout: None,
        }
    }

    #[test]
    fn draft_creates_available_unit() {
        let now = Utc::now();
        let unit = draft().into_unit(UnitId("unit-1".into()), ProjectId("p".into()), now);
        assert_eq!(unit.status, UnitStatus::Available);
        assert_eq!(unit.created_at, unit.updated_at);
    }

    #[test]
    fn draft_update_keeps_absent_attributes() {
        let created = Utc::now();
        let mut unit = draft().into_unit(UnitId("unit-1".into()), ProjectId("p".into()), created);
        unit.status = UnitStatus::Sold;
        unit.floor = Some(3);

        let mut update = draft();
        update.price = 99_000.0;
        update.area = None;
        update.apply_to(&mut unit, created + chrono::Duration::minutes(5));

        assert_eq!(unit.price, 99_000.0);
        assert_eq!(unit.status, UnitStatus::Sold);
        assert_eq!(unit.floor, Some(3));
        assert_eq!(unit.area, Some(42.5));
        assert!(unit.updated_at > unit.created_at);
    }

    #[test]
    fn mapping_reports_uncovered_required_fields() {
        let mapping = FieldMapping {
            id: FieldMappingId("map-1".into()),
            project_id: ProjectId("p".into()),
            columns: BTreeMap::from([("Unit".to_string(), UnitField::Number)]),
            is_approved: false,
            approved_by: None,
            approved_at: None,
        };
        assert_eq!(
            mapping.missing_required(),
            vec![UnitField::Building, UnitField::Price]
        );
    }

    #[test]
    fn outcomes_serialize_with_tags() {
        let mut summary = ImportSummary::new(ImportId("imp-1".into()));
        summary.record(
            2,
            RowOutcome::Created {
                unit_id: UnitId("unit-1".into()),
            },
        );
        let value = serde_json::to_value(CommitOutcome::Committed(summary)).expect("serializes");
        assert_eq!(value["status"], json!("committed"));
        assert_eq!(value["createdUnits"], json!(1));
        assert_eq!(
            value["rows"][0],
            json!({"line": 2, "outcome": "created", "unitId": "unit-1"})
        );
    }
}

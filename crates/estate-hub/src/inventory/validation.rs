use serde::{Serialize, Serializer};

use super::domain::{FieldMapping, UnitDraft, UnitField};
use super::mapping::status_for_label;
use super::parser::parse_number;

/// Reason a row was skipped during commit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("{0} is required")]
    Missing(UnitField),
    #[error("{field} must be numeric, got '{value}'")]
    NotNumeric { field: UnitField, value: String },
    #[error("{field} must be a whole number, got '{value}'")]
    NotWhole { field: UnitField, value: String },
    #[error("{field} cannot be negative, got '{value}'")]
    Negative { field: UnitField, value: String },
    #[error("unknown status '{0}'")]
    UnknownStatus(String),
}

impl Serialize for RowError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct MappedRow<'a> {
    cells: Vec<(UnitField, &'a str)>,
}

impl<'a> MappedRow<'a> {
    fn new(mapping: &FieldMapping, columns: &[String], row: &'a [String]) -> Self {
        let cells = columns
            .iter()
            .zip(row)
            .filter_map(|(column, value)| {
                mapping
                    .columns
                    .get(column)
                    .map(|field| (*field, value.trim()))
            })
            .collect();
        Self { cells }
    }

    fn get(&self, field: UnitField) -> Option<&'a str> {
        self.cells
            .iter()
            .find(|(candidate, value)| *candidate == field && !value.is_empty())
            .map(|(_, value)| *value)
    }

    fn text(&self, field: UnitField) -> Option<String> {
        self.get(field).map(str::to_string)
    }

    fn required(&self, field: UnitField) -> Result<&'a str, RowError> {
        self.get(field).ok_or(RowError::Missing(field))
    }

    fn number(&self, field: UnitField) -> Result<Option<f64>, RowError> {
        self.get(field)
            .map(|value| {
                parse_number(value).ok_or_else(|| RowError::NotNumeric {
                    field,
                    value: value.to_string(),
                })
            })
            .transpose()
    }

    fn raw(&self, field: UnitField) -> String {
        self.get(field).unwrap_or_default().to_string()
    }

    /// Whole numbers outside `T` are reported as not numeric, with the cell text.
    fn whole<T: TryFrom<i64>>(&self, field: UnitField) -> Result<Option<T>, RowError> {
        let Some(number) = self.number(field)? else {
            return Ok(None);
        };
        if number.fract() != 0.0 {
            return Err(RowError::NotWhole {
                field,
                value: self.raw(field),
            });
        }
        // i64::MAX rounds up to 2^63 as f64, so the upper bound is exclusive.
        if !(i64::MIN as f64..i64::MAX as f64).contains(&number) {
            return Err(RowError::NotNumeric {
                field,
                value: self.raw(field),
            });
        }
        T::try_from(number as i64)
            .map(Some)
            .map_err(|_| RowError::NotNumeric {
                field,
                value: self.raw(field),
            })
    }
}

fn non_negative(field: UnitField, value: f64, raw: &str) -> Result<f64, RowError> {
    if value < 0.0 {
        return Err(RowError::Negative {
            field,
            value: raw.to_string(),
        });
    }
    Ok(value)
}

/// Applies the mapping to one raw row and checks it.
pub(crate) fn validate_row(
    mapping: &FieldMapping,
    columns: &[String],
    row: &[String],
) -> Result<UnitDraft, RowError> {
    let mapped = MappedRow::new(mapping, columns, row);

    let building = mapped.required(UnitField::Building)?.to_string();
    let number = mapped.required(UnitField::Number)?.to_string();

    let raw_price = mapped.required(UnitField::Price)?;
    let price = mapped
        .number(UnitField::Price)?
        .ok_or(RowError::Missing(UnitField::Price))?;
    let price = non_negative(UnitField::Price, price, raw_price)?;

    let area = match mapped.number(UnitField::Area)? {
        Some(area) => Some(non_negative(
            UnitField::Area,
            area,
            mapped.get(UnitField::Area).unwrap_or_default(),
        )?),
        None => None,
    };

    let floor = mapped.whole::<i32>(UnitField::Floor)?;

    let bedrooms = match mapped.whole::<i64>(UnitField::Bedrooms)? {
        Some(bedrooms) if bedrooms < 0 => {
            return Err(RowError::Negative {
                field: UnitField::Bedrooms,
                value: mapped.raw(UnitField::Bedrooms),
            });
        }
        Some(bedrooms) => Some(u32::try_from(bedrooms).map_err(|_| RowError::NotNumeric {
            field: UnitField::Bedrooms,
            value: mapped.raw(UnitField::Bedrooms),
        })?),
        None => None,
    };

    let status = match mapped.get(UnitField::Status) {
        Some(label) => Some(
            status_for_label(label).ok_or_else(|| RowError::UnknownStatus(label.to_string()))?,
        ),
        None => None,
    };

    Ok(UnitDraft {
        building,
        number,
        price,
        status,
        area,
        floor,
        description: mapped.text(UnitField::Description),
        window_view: mapped.text(UnitField::WindowView),
        bedrooms,
        layout: mapped.text(UnitField::Layout),
    })
}

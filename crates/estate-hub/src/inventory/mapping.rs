use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use super::domain::{UnitField, UnitStatus};
use super::normalizer::normalize_label;

static HEADER_ALIASES: OnceLock<HashMap<String, UnitField>> = OnceLock::new();
static STATUS_ALIASES: OnceLock<HashMap<String, UnitStatus>> = OnceLock::new();

pub(crate) fn field_for_header(header: &str) -> Option<UnitField> {
    header_aliases().get(&normalize_label(header)).copied()
}

pub(crate) fn status_for_label(label: &str) -> Option<UnitStatus> {
    status_aliases().get(&normalize_label(label)).copied()
}

/// Maps every recognised header onto a unit field. When two headers point at the same field
/// the leftmost column wins.
pub(crate) fn suggest_columns(columns: &[String]) -> BTreeMap<String, UnitField> {
    let mut suggested = BTreeMap::new();
    let mut claimed: Vec<UnitField> = Vec::new();

    for column in columns {
        if let Some(field) = field_for_header(column) {
            if claimed.contains(&field) {
                continue;
            }
            claimed.push(field);
            suggested.insert(column.clone(), field);
        }
    }

    suggested
}

fn header_aliases() -> &'static HashMap<String, UnitField> {
    HEADER_ALIASES.get_or_init(|| {
        const HEADER_TO_FIELD: &[(&str, UnitField)] = &[
            // Location
            ("building", UnitField::Building),
            ("building name", UnitField::Building),
            ("block", UnitField::Building),
            ("tower", UnitField::Building),
            ("корпус", UnitField::Building),
            ("number", UnitField::Number),
            ("unit", UnitField::Number),
            ("unit number", UnitField::Number),
            ("unit no", UnitField::Number),
            ("unit no.", UnitField::Number),
            ("unit #", UnitField::Number),
            ("apartment", UnitField::Number),
            ("номер", UnitField::Number),
            ("floor", UnitField::Floor),
            ("level", UnitField::Floor),
            ("storey", UnitField::Floor),
            ("этаж", UnitField::Floor),
            // Commercial
            ("price", UnitField::Price),
            ("list price", UnitField::Price),
            ("price usd", UnitField::Price),
            ("price (usd)", UnitField::Price),
            ("cost", UnitField::Price),
            ("цена", UnitField::Price),
            ("status", UnitField::Status),
            ("availability", UnitField::Status),
            ("sales status", UnitField::Status),
            ("статус", UnitField::Status),
            // Layout
            ("area", UnitField::Area),
            ("size", UnitField::Area),
            ("area sqm", UnitField::Area),
            ("area (sqm)", UnitField::Area),
            ("sqm", UnitField::Area),
            ("площадь", UnitField::Area),
            ("bedrooms", UnitField::Bedrooms),
            ("beds", UnitField::Bedrooms),
            ("rooms", UnitField::Bedrooms),
            ("комнаты", UnitField::Bedrooms),
            ("layout", UnitField::Layout),
            ("layout type", UnitField::Layout),
            ("unit type", UnitField::Layout),
            ("type", UnitField::Layout),
            ("планировка", UnitField::Layout),
            // Descriptive
            ("description", UnitField::Description),
            ("notes", UnitField::Description),
            ("comment", UnitField::Description),
            ("описание", UnitField::Description),
            ("window view", UnitField::WindowView),
            ("windowview", UnitField::WindowView),
            ("view", UnitField::WindowView),
            ("вид из окна", UnitField::WindowView),
        ];

        let mut map = HashMap::with_capacity(HEADER_TO_FIELD.len());
        for (header, field) in HEADER_TO_FIELD {
            map.insert(normalize_label(header), *field);
        }
        map
    })
}

fn status_aliases() -> &'static HashMap<String, UnitStatus> {
    STATUS_ALIASES.get_or_init(|| {
        const LABEL_TO_STATUS: &[(&str, UnitStatus)] = &[
            ("available", UnitStatus::Available),
            ("free", UnitStatus::Available),
            ("for sale", UnitStatus::Available),
            ("on sale", UnitStatus::Available),
            ("vacant", UnitStatus::Available),
            ("open", UnitStatus::Available),
            ("свободна", UnitStatus::Available),
            ("свободно", UnitStatus::Available),
            ("reserved", UnitStatus::Reserved),
            ("booked", UnitStatus::Reserved),
            ("on hold", UnitStatus::Reserved),
            ("hold", UnitStatus::Reserved),
            ("бронь", UnitStatus::Reserved),
            ("sold", UnitStatus::Sold),
            ("sold out", UnitStatus::Sold),
            ("closed", UnitStatus::Sold),
            ("продана", UnitStatus::Sold),
            ("продано", UnitStatus::Sold),
            ("unavailable", UnitStatus::Unavailable),
            ("not available", UnitStatus::Unavailable),
            ("off market", UnitStatus::Unavailable),
            ("withdrawn", UnitStatus::Unavailable),
            ("недоступна", UnitStatus::Unavailable),
        ];

        let mut map = HashMap::with_capacity(LABEL_TO_STATUS.len());
        for (label, status) in LABEL_TO_STATUS {
            map.insert(normalize_label(label), *status);
        }
        map
    })
}

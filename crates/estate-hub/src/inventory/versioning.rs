//! Version history views. Diffs are derived on read and never stored.

use serde::{Deserialize, Serialize};

use super::domain::{UnitId, UnitStatus, UnitVersionRecord};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceChange {
    pub from: f64,
    pub to: f64,
    pub diff: f64,
    /// `None` when the previous price was zero.
    pub percent_diff: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub from: UnitStatus,
    pub to: UnitStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaChange {
    pub from: Option<f64>,
    pub to: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionChanges {
    pub price: PriceChange,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StatusChange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub area: Option<AreaChange>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn price_change(from: f64, to: f64) -> PriceChange {
    let diff = to - from;
    let percent_diff = if from == 0.0 {
        None
    } else {
        Some(round2(diff * 100.0 / from))
    };

    PriceChange {
        from,
        to,
        diff: round2(diff),
        percent_diff,
    }
}

/// Change-set from `previous` to `current`.
pub fn diff(previous: &UnitVersionRecord, current: &UnitVersionRecord) -> VersionChanges {
    let status = (previous.status != current.status).then_some(StatusChange {
        from: previous.status,
        to: current.status,
    });
    let area = (previous.area != current.area).then_some(AreaChange {
        from: previous.area,
        to: current.area,
    });

    VersionChanges {
        price: price_change(previous.price, current.price),
        status,
        area,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageRequest {
    #[serde(default = "PageRequest::first_page")]
    pub page: usize,
    #[serde(default = "PageRequest::default_limit")]
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: Self::first_page(),
            limit: Self::default_limit(),
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Self {
        Self { page, limit }
    }

    fn first_page() -> usize {
        1
    }

    fn default_limit() -> usize {
        DEFAULT_PAGE_SIZE
    }

    /// Page clamped to at least 1, limit clamped to `1..=MAX_PAGE_SIZE`.
    pub fn clamped(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_PAGE_SIZE),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionView {
    #[serde(flatten)]
    pub version: UnitVersionRecord,
    /// Absent for the first recorded version.
    pub changes: Option<VersionChanges>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionPage {
    pub unit_id: UnitId,
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
    pub versions: Vec<VersionView>,
}

/// Slices a newest-first history. Every entry is diffed against the next older one, which
/// may sit on the following page.
pub fn paginate(
    unit_id: UnitId,
    history: &[UnitVersionRecord],
    request: PageRequest,
) -> VersionPage {
    let request = request.clamped();
    let total = history.len();
    let total_pages = total.div_ceil(request.limit);
    let start = (request.page - 1).saturating_mul(request.limit).min(total);
    let end = start.saturating_add(request.limit).min(total);

    let versions = (start..end)
        .map(|index| VersionView {
            version: history[index].clone(),
            changes: history
                .get(index + 1)
                .map(|previous| diff(previous, &history[index])),
        })
        .collect();

    VersionPage {
        unit_id,
        page: request.page,
        limit: request.limit,
        total,
        total_pages,
        versions,
    }
}

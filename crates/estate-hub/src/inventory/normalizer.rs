/// Canonical form used to compare spreadsheet headers and status labels.
pub(crate) fn normalize_label(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    let spaced = cleaned.replace(['_', '-'], " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    collapsed.to_lowercase()
}

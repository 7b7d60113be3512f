/// Clean a field name coming out of a spreadsheet export: strip BOM and
/// zero-width characters, collapse runs of whitespace.
pub(crate) fn normalize_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case-folded key used to spot duplicate rows within one import.
pub(crate) fn dedup_key(value: &str) -> String {
    normalize_name(value).to_ascii_lowercase()
}

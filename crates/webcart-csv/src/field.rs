//! RFC4180-style field escaping.

/// Escapes one CSV field: quoted when it contains a comma, quote, or line
/// break, with embedded quotes doubled. Other fields pass through as-is.
#[must_use]
pub fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') || value.contains('\r') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Escapes each field and joins them into one row.
#[must_use]
pub fn csv_row(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

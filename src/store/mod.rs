pub mod backup;
pub mod csv_table;

/// Neutralises spreadsheet formula injection before a user-supplied string is
/// persisted: a leading `=`, `+`, `-` or `@` gets a quote prefix so the cell
/// reads as text when the CSV is opened in a spreadsheet.
pub fn sanitize_cell(value: &str) -> String {
    if value.starts_with(['=', '+', '-', '@']) {
        format!("'{value}")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formula_prefixes_are_quoted() {
        assert_eq!(sanitize_cell("=1+2"), "'=1+2");
        assert_eq!(sanitize_cell("@cmd"), "'@cmd");
        assert_eq!(sanitize_cell("-1"), "'-1");
        assert_eq!(sanitize_cell("plain text"), "plain text");
        assert_eq!(sanitize_cell(""), "");
    }
}

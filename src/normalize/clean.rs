//! Per-cell scrubbing of recognised table text into canonical field values.

use regex::Regex;
use std::sync::LazyLock;

/// Separator used when joining several values into one field.
pub const FIELD_SEPARATOR: &str = " / ";

static RUN_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\b").expect("Hardcode regex pattern"));

/// Extracts every standalone 4-digit token from `cell`, left to right, joined by `" / "`.
///
/// Returns an empty string when the cell has no such token.
pub fn extract_run_numbers(cell: &str) -> String {
    RUN_NUMBER
        .find_iter(cell)
        .map(|matcher| matcher.as_str())
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR)
}

/// Cleans a driver cell down to an alphabetic name.
///
/// Only the first line is kept, anything other than ASCII letters and spaces
/// is dropped and the result is trimmed. A null cell yields an empty string.
pub fn clean_driver(cell: Option<&str>) -> String {
    let Some(cell) = cell else {
        return String::new();
    };
    let first_line = cell.split('\n').next().unwrap_or_default();
    first_line
        .chars()
        .filter(|character| character.is_ascii_alphabetic() || *character == ' ')
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Trims `cell`, drops control characters and keeps the first `length` characters left.
pub fn clean_truck(cell: &str, length: usize) -> String {
    cell.trim()
        .chars()
        .filter(|character| !character.is_control())
        .take(length)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use googletest::prelude::*;
    use test_casing::test_casing;

    const RUN_NUMBER_CASES: [(&str, &str); 6] = [
        ("Run 1234 / 5678 extra", "1234 / 5678"),
        ("no digits here", ""),
        ("12345 123 0042", "0042"),
        ("1234,5678", "1234 / 5678"),
        ("R1234", ""),
        ("4321\n8765", "4321 / 8765"),
    ];

    #[test_casing(6, RUN_NUMBER_CASES)]
    fn extracts_run_numbers(cell: &str, expected: &str) {
        assert_eq!(extract_run_numbers(cell), expected);
    }

    #[googletest::test]
    fn driver_keeps_first_line_only() {
        expect_that!(clean_driver(Some("John Smith\n(relief)")), eq("John Smith"));
    }

    #[googletest::test]
    fn driver_null_cell_is_empty() {
        expect_that!(clean_driver(None), eq(""));
    }

    #[googletest::test]
    fn driver_strips_non_letters() {
        expect_that!(clean_driver(Some("  O'Brien-Jones 2 ")), eq("OBrienJones"));
        expect_that!(clean_driver(Some("Ana Lu\r\nnext")), eq("Ana Lu"));
        expect_that!(clean_driver(Some("José")), eq("Jos"));
    }

    #[googletest::test]
    fn truck_is_trimmed_then_truncated() {
        expect_that!(clean_truck("  AB12 CD3 extra ", 8), eq("AB12 CD3"));
        expect_that!(clean_truck(" T7 ", 8), eq("T7"));
        expect_that!(clean_truck("ABCDEFGH", 6), eq("ABCDEF"));
    }

    #[googletest::test]
    fn truck_drops_control_characters() {
        expect_that!(clean_truck("AB\u{1}12\u{7f}CD3", 8), eq("AB12CD3"));
        expect_that!(clean_truck("\u{b}T7\u{0}", 8), eq("T7"));
    }

    #[googletest::test]
    fn truck_truncates_on_characters_not_bytes() {
        expect_that!(clean_truck("ÄÖÜ-1234", 4), eq("ÄÖÜ-"));
    }
}

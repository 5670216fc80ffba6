//! French month names.

/// Canonical lowercase French month names, index 0 = janvier.
pub const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// Map a French month name to its 1-based number.
///
/// The name is lower-cased first. Anything not in [`FRENCH_MONTHS`] resolves
/// to 1 (January) rather than failing; callers that need strictness must
/// check the name themselves.
pub fn resolve_french_month(name: &str) -> u32 {
    let lowered = name.to_lowercase();
    FRENCH_MONTHS
        .iter()
        .position(|m| *m == lowered)
        .map(|idx| idx as u32 + 1)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_canonical_name_resolves_in_order() {
        for (idx, name) in FRENCH_MONTHS.iter().enumerate() {
            assert_eq!(resolve_french_month(name), idx as u32 + 1, "{name}");
        }
    }

    #[test]
    fn accented_names_resolve() {
        assert_eq!(resolve_french_month("février"), 2);
        assert_eq!(resolve_french_month("août"), 8);
        assert_eq!(resolve_french_month("décembre"), 12);
    }

    #[test]
    fn capitalised_names_are_lowered_first() {
        assert_eq!(resolve_french_month("Mars"), 3);
        assert_eq!(resolve_french_month("DÉCEMBRE"), 12);
    }

    #[test]
    fn unknown_names_default_to_january() {
        assert_eq!(resolve_french_month("blurfl"), 1);
        assert_eq!(resolve_french_month(""), 1);
        // Unaccented spellings are not in the vocabulary.
        assert_eq!(resolve_french_month("fevrier"), 1);
        assert_eq!(resolve_french_month("march"), 1);
    }
}

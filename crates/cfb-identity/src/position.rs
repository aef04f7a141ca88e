/// Full position names → lowercase abbreviations.
pub const POSITION_TABLE: &[(&str, &str)] = &[
    ("quarterback", "qb"),
    ("running back", "rb"),
    ("wide receiver", "wr"),
    ("tight end", "te"),
    ("offensive tackle", "ot"),
    ("offensive guard", "og"),
    ("offensive line", "ol"),
    ("center", "c"),
    ("defensive end", "de"),
    ("defensive tackle", "dt"),
    ("defensive line", "dl"),
    ("linebacker", "lb"),
    ("inside linebacker", "ilb"),
    ("outside linebacker", "olb"),
    ("cornerback", "cb"),
    ("safety", "s"),
    ("free safety", "fs"),
    ("strong safety", "ss"),
    ("athlete", "ath"),
    ("kicker", "k"),
    ("punter", "p"),
    ("long snapper", "ls"),
    ("edge", "edge"),
];

/// Canonical lowercase abbreviation; unknown input comes back lowercased.
pub fn normalize_position(raw: &str) -> String {
    let pos = raw.trim().to_lowercase();
    POSITION_TABLE
        .iter()
        .find(|(full, _)| *full == pos)
        .map(|(_, abbr)| abbr.to_string())
        .unwrap_or(pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_full_names_case_insensitively() {
        assert_eq!(normalize_position("Quarterback"), "qb");
        assert_eq!(normalize_position("QUARTERBACK"), "qb");
        assert_eq!(normalize_position("  Running Back "), "rb");
        assert_eq!(normalize_position("Inside Linebacker"), "ilb");
        assert_eq!(normalize_position("Long Snapper"), "ls");
        assert_eq!(normalize_position("Edge"), "edge");
    }

    #[test]
    fn every_table_entry_round_trips() {
        for (full, abbr) in POSITION_TABLE {
            assert_eq!(normalize_position(&full.to_uppercase()), *abbr);
        }
    }

    #[test]
    fn unknown_passes_through_lowercased() {
        assert_eq!(normalize_position("QB"), "qb");
        assert_eq!(normalize_position("Unknown Position"), "unknown position");
        assert_eq!(normalize_position(""), "");
    }
}

//! IBGE state codes.
//!
//! The first two digits of a municipality code identify its state.

/// (IBGE state code, UF abbreviation)
pub const STATES: [(&str, &str); 27] = [
    ("11", "RO"), ("12", "AC"), ("13", "AM"), ("14", "RR"), ("15", "PA"), ("16", "AP"), ("17", "TO"),
    ("21", "MA"), ("22", "PI"), ("23", "CE"), ("24", "RN"), ("25", "PB"), ("26", "PE"), ("27", "AL"),
    ("28", "SE"), ("29", "BA"),
    ("31", "MG"), ("32", "ES"), ("33", "RJ"), ("35", "SP"),
    ("41", "PR"), ("42", "SC"), ("43", "RS"),
    ("50", "MS"), ("51", "MT"), ("52", "GO"), ("53", "DF"),
];

/// UF abbreviation for a two-digit state code
#[must_use]
pub fn state_for_code(code: &str) -> Option<&'static str> {
    STATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, uf)| *uf)
}

/// UF abbreviation of the state a municipality code belongs to
#[must_use]
pub fn state_of_region(region_code: i64) -> Option<&'static str> {
    let code = region_code.to_string();
    code.get(..2).and_then(state_for_code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_of_region() {
        assert_eq!(state_of_region(410690), Some("PR"));
        assert_eq!(state_of_region(420910), Some("SC"));
        assert_eq!(state_of_region(431490), Some("RS"));
        assert_eq!(state_of_region(990000), None);
        assert_eq!(state_of_region(7), None);
    }
}

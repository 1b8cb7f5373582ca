//! ICD-10 suicide codes and their method grouping.
//!
//! X60-X69 are intentional self-poisoning, X70-X84 intentional self-harm.

/// (3-character ICD-10 category, method group)
pub const SUICIDE_METHODS: [(&str, &str); 25] = [
    ("X60", "Drogas ou medicamentos"),
    ("X61", "Drogas ou medicamentos"),
    ("X62", "Drogas ou medicamentos"),
    ("X63", "Drogas ou medicamentos"),
    ("X64", "Drogas ou medicamentos"),
    ("X65", "Drogas ou medicamentos"),
    ("X66", "Outras substancias"),
    ("X67", "Outras substancias"),
    ("X68", "Outras substancias"),
    ("X69", "Outras substancias"),
    ("X70", "Estrangulamento"),
    ("X71", "Afogamento"),
    ("X72", "Arma de fogo"),
    ("X73", "Arma de fogo"),
    ("X74", "Arma de fogo"),
    ("X75", "Outros meios"),
    ("X76", "Fogo, fumaça, gases ou objetos quentes"),
    ("X77", "Fogo, fumaça, gases ou objetos quentes"),
    ("X78", "Arma branca"),
    ("X79", "Arma branca"),
    ("X80", "Impacto"),
    ("X81", "Impacto"),
    ("X82", "Impacto"),
    ("X83", "Outros meios"),
    ("X84", "Outros meios"),
];

/// Method group for a 3-character cause category
#[must_use]
pub fn suicide_method(category: &str) -> Option<&'static str> {
    SUICIDE_METHODS
        .iter()
        .find(|(code, _)| *code == category)
        .map(|(_, method)| *method)
}

/// Whether a 3-character cause category is a suicide code
#[must_use]
pub fn is_suicide_code(category: &str) -> bool {
    suicide_method(category).is_some()
}

/// Truncate a full ICD-10 code (e.g. `X700`) to its 3-character category
#[must_use]
pub fn cause_category(code: &str) -> &str {
    match code.char_indices().nth(3) {
        Some((idx, _)) => &code[..idx],
        None => code,
    }
}

//! Code-to-label tables for the coded categorical fields.
//!
//! Labels are kept in the wording used by the source registry. A code with no
//! entry translates to a missing value.

/// Coded categorical fields of the mortality registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodedField {
    /// `LOCOCOR`: place of death
    PlaceOfDeath,
    /// `SEXO`
    Sex,
    /// `RACACOR`: race/colour as classified by IBGE
    Race,
    /// `ESC`: highest level of education
    Education,
    /// `ESTCIV`: marital status
    MaritalStatus,
}

impl CodedField {
    /// Every translated field, in table order
    pub const ALL: [Self; 5] = [
        Self::PlaceOfDeath,
        Self::Sex,
        Self::Race,
        Self::Education,
        Self::MaritalStatus,
    ];

    /// Column carrying this field
    #[must_use]
    pub const fn column(self) -> &'static str {
        match self {
            Self::PlaceOfDeath => "LOCOCOR",
            Self::Sex => "SEXO",
            Self::Race => "RACACOR",
            Self::Education => "ESC",
            Self::MaritalStatus => "ESTCIV",
        }
    }

    const fn table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::PlaceOfDeath => &[
                ("1", "Estabelecimento de saude"),
                ("2", "Estabelecimento de saude"),
                ("3", "Domicilio"),
                ("4", "Via publica"),
                ("5", "Outro"),
            ],
            Self::Sex => &[("1", "Masculino"), ("2", "Feminino")],
            Self::Race => &[
                ("1", "Branca"),
                ("2", "Preta"),
                ("3", "Amarela"),
                ("4", "Parda"),
                ("5", "Indigena"),
            ],
            Self::Education => &[
                ("1", "Sem escolaridade"),
                ("2", "Fundamental I"),
                ("3", "Fundamental II"),
                ("4", "Médio"),
                ("5", "Superior"),
            ],
            Self::MaritalStatus => &[
                ("1", "Solteiro"),
                ("2", "Casado"),
                ("3", "Viuvo"),
                ("4", "Divorciado"),
                ("5", "Uniao estavel"),
            ],
        }
    }

    /// Label for `code`, `None` when unmapped
    #[must_use]
    pub fn translate(self, code: &str) -> Option<&'static str> {
        lookup(self.table(), code)
    }
}

/// Legal nature of a healthcare facility (`NATUREZA`)
#[must_use]
pub fn facility_nature(code: &str) -> Option<&'static str> {
    const NATURE: [(&str, &str); 13] = [
        ("01", "Publica"),
        ("02", "Outra"),
        ("03", "Publica"),
        ("04", "Publica"),
        ("05", "Publica"),
        ("06", "Publica"),
        ("07", "Privada"),
        ("08", "Privada"),
        ("09", "Outra"),
        ("10", "Privada"),
        ("11", "Publica"),
        ("12", "Outra"),
        ("13", "Outra"),
    ];
    lookup(&NATURE, code)
}

fn lookup(table: &[(&'static str, &'static str)], code: &str) -> Option<&'static str> {
    table
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, label)| *label)
}

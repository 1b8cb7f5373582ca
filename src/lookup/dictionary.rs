//! Static description of the enriched dataset's variables.

/// One documented variable: (name, type, description)
pub type DictionaryEntry = (&'static str, &'static str, &'static str);

/// Variables of the enriched mortality table
#[must_use]
pub const fn data_dictionary() -> &'static [DictionaryEntry] {
    &[
        ("DTOBITO", "date", "Date of death"),
        ("HORAOBITO", "string", "Time of death (HHMM)"),
        ("CAUSABAS", "string", "Underlying cause of death, ICD-10 category"),
        ("LOCOCOR", "string", "Place of death"),
        ("CODMUN", "int", "Municipality of residence code as defined by IBGE"),
        ("IDADE", "float", "Age in years"),
        ("SEXO", "string", "Sex"),
        ("RACACOR", "string", "Race/colour as classified by IBGE"),
        ("ESC", "string", "Highest level of education"),
        ("ESTCIV", "string", "Marital status"),
        ("year", "int", "Year of death"),
        ("month", "int", "Month of death"),
        ("day", "int", "Day of death"),
        ("season", "string", "Season of the year of death"),
        ("weekday", "string", "Weekday of death"),
        ("holiday", "bool", "Death within one day of a public holiday"),
        ("state", "string", "State of residence (UF)"),
        ("name_muni", "string", "Municipality of residence's name"),
        ("pop_muni", "int", "Municipality of residence's population"),
        ("facility_rate", "float", "Mental-health facilities per 1,000 inhabitants"),
        ("average_suicide_rate", "float", "Mean yearly suicides per 100,000 inhabitants"),
        ("age_group", "string", "Age group"),
        ("method", "string", "Suicide method"),
        ("day_period", "string", "Period of the day of death"),
    ]
}

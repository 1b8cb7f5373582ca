//! Facility (CNES) selection and decoding.

use std::sync::Arc;

use arrow::array::{ArrayRef, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;

use crate::error::Result;
use crate::lookup::facility_nature;
use crate::schemas::{FACILITY_SELECTION, facilities_schema};
use crate::utils::arrow::{project_as_strings, string_values};

/// Facility type code of psychosocial care centres (CAPS)
pub const PSYCHOSOCIAL_UNIT_TYPE: &str = "39";

/// Whether a facility offers psychosocial care or social services
///
/// A facility qualifies when it is a psychosocial care centre, or when it
/// provides psychotherapy support (`SERAP02P`) or social service (`SERAP02T`).
#[must_use]
pub fn is_mental_health_facility(
    unit_type: Option<&str>,
    psychotherapy: Option<&str>,
    social_service: Option<&str>,
) -> bool {
    unit_type == Some(PSYCHOSOCIAL_UNIT_TYPE) || psychotherapy == Some("1") || social_service == Some("1")
}

/// Select mental-health facilities from a raw CNES table
///
/// Values are trimmed, `year` is taken from the first four characters of the
/// competence (`YYYYMM`), `NATUREZA` is translated to its legal-nature label
/// and `CODUFMUN` is parsed as an integer code (unparseable codes are null).
pub fn preprocess_facilities(raw: &RecordBatch) -> Result<RecordBatch> {
    let selected = project_as_strings(raw, &FACILITY_SELECTION)?;
    let trimmed = |name: &str| -> Result<Vec<Option<String>>> {
        Ok(string_values(&selected, name)?
            .into_iter()
            .map(|v| v.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
            .collect())
    };
    let cnes = trimmed("CNES")?;
    let competence = trimmed("COMPETEN")?;
    let municipality = trimmed("CODUFMUN")?;
    let cep = trimmed("COD_CEP")?;
    let nature = trimmed("NATUREZA")?;
    let sus = trimmed("VINC_SUS")?;
    let unit_type = trimmed("TP_UNID")?;
    let psychotherapy = trimmed("SERAP02P")?;
    let social = trimmed("SERAP02T")?;

    let keep: Vec<usize> = (0..selected.num_rows())
        .filter(|&i| {
            is_mental_health_facility(
                unit_type[i].as_deref(),
                psychotherapy[i].as_deref(),
                social[i].as_deref(),
            )
        })
        .collect();

    let pick = |column: &[Option<String>]| -> ArrayRef {
        Arc::new(StringArray::from_iter(keep.iter().map(|&i| column[i].as_deref())))
    };
    let year = keep.iter().map(|&i| {
        competence[i]
            .as_deref()
            .and_then(|c| c.get(..4))
            .and_then(|y| y.parse::<i64>().ok())
    });
    let code = keep.iter().map(|&i| {
        municipality[i]
            .as_deref()
            .and_then(|c| c.parse::<i64>().ok())
    });
    let nature_labels = keep
        .iter()
        .map(|&i| nature[i].as_deref().and_then(facility_nature));

    let arrays: Vec<ArrayRef> = vec![
        pick(&cnes),
        pick(&competence),
        Arc::new(Int64Array::from_iter(code)),
        pick(&cep),
        Arc::new(StringArray::from_iter(nature_labels)),
        pick(&sus),
        pick(&unit_type),
        pick(&psychotherapy),
        pick(&social),
        Arc::new(Int64Array::from_iter(year)),
    ];

    log::info!(
        "Selected {} mental-health facilities out of {} raw records",
        keep.len(),
        raw.num_rows()
    );
    Ok(RecordBatch::try_new(facilities_schema(), arrays)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::arrow::i64_values;

    #[test]
    fn test_facility_selection() {
        let col = |values: Vec<Option<&str>>| Arc::new(StringArray::from(values)) as ArrayRef;
        let raw = RecordBatch::try_from_iter(vec![
            ("CNES", col(vec![Some("1"), Some("2"), Some("3"), Some("4")])),
            ("COMPETEN", col(vec![Some("201501"), Some("201601"), Some("201501"), Some("20")])),
            ("CODUFMUN", col(vec![Some("410690 "), Some("420910"), Some("410690"), Some("x")])),
            ("NATUREZA", col(vec![Some("01"), Some("07"), Some("01"), Some("99")])),
            ("TP_UNID", col(vec![Some("39"), Some("05"), Some("05"), Some("05")])),
            ("SERAP02P", col(vec![Some("0"), Some("1"), Some("0"), Some("0")])),
            ("SERAP02T", col(vec![Some("0"), Some("0"), Some("0"), Some("1")])),
        ])
        .unwrap();

        let table = preprocess_facilities(&raw).unwrap();
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.schema(), facilities_schema());
        assert_eq!(
            i64_values(&table, "CODUFMUN").unwrap(),
            vec![Some(410690), Some(420910), None]
        );
        assert_eq!(i64_values(&table, "year").unwrap(), vec![Some(2015), Some(2016), None]);
        assert_eq!(
            string_values(&table, "NATUREZA").unwrap(),
            vec![Some("Publica".to_string()), Some("Privada".to_string()), None]
        );
        // absent raw column is all null
        assert_eq!(table.column_by_name("COD_CEP").unwrap().null_count(), 3);
    }
}

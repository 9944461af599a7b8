use std::io::Read;

use crate::scoring::{FactValue, ProductFacts, ProductRecord};

pub(crate) const PRODUCT_ID_COLUMN: &str = "product_id";

#[derive(Debug)]
pub(crate) enum ParseOutcome {
    Records(Vec<ProductRecord>),
    MissingIdColumn,
    BlankId { line: u64 },
}

pub(crate) fn parse_records<R: Read>(reader: R) -> Result<ParseOutcome, csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(clean_header)
        .collect();
    let Some(id_index) = headers.iter().position(|header| header == PRODUCT_ID_COLUMN) else {
        return Ok(ParseOutcome::MissingIdColumn);
    };

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row?;
        let product_id = row.get(id_index).unwrap_or_default().to_string();
        if product_id.is_empty() {
            let line = row.position().map(|position| position.line()).unwrap_or(0);
            return Ok(ParseOutcome::BlankId { line });
        }

        let mut facts = ProductFacts::new();
        for (index, cell) in row.iter().enumerate() {
            if index == id_index {
                continue;
            }
            let Some(header) = headers.get(index) else {
                continue;
            };
            if let Some(value) = parse_cell(cell) {
                facts.insert_path(header, value);
            }
        }

        records.push(ProductRecord { product_id, facts });
    }

    Ok(ParseOutcome::Records(records))
}

fn clean_header(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}

/// Empty cells are absent; everything else is the narrowest matching value.
pub(crate) fn parse_cell(raw: &str) -> Option<FactValue> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.eq_ignore_ascii_case("true") {
        return Some(FactValue::Bool(true));
    }
    if trimmed.eq_ignore_ascii_case("false") {
        return Some(FactValue::Bool(false));
    }
    match trimmed.parse::<f64>() {
        Ok(number) if number.is_finite() => Some(FactValue::Number(number)),
        _ => Some(FactValue::Text(trimmed.to_string())),
    }
}

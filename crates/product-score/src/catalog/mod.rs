//! Product catalog import for batch ranking.
//!
//! CSV exports carry a `product_id` column plus one column per dot-path
//! attribute (`specs.noise_db`, `price`, ...). JSON exports are an array of
//! `{ "product_id": ..., "facts": { ... } }` records.

mod parser;

use std::io::Read;
use std::path::Path;

use crate::scoring::ProductRecord;
use parser::ParseOutcome;

#[derive(Debug)]
pub enum CatalogImportError {
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    MissingIdColumn,
    BlankProductId { line: u64 },
    UnsupportedFormat(String),
}

impl std::fmt::Display for CatalogImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CatalogImportError::Io(err) => write!(f, "failed to read catalog export: {}", err),
            CatalogImportError::Csv(err) => write!(f, "invalid catalog CSV data: {}", err),
            CatalogImportError::Json(err) => write!(f, "invalid catalog JSON data: {}", err),
            CatalogImportError::MissingIdColumn => write!(
                f,
                "catalog CSV has no '{}' column",
                parser::PRODUCT_ID_COLUMN
            ),
            CatalogImportError::BlankProductId { line } => {
                write!(f, "catalog row on line {line} has a blank product id")
            }
            CatalogImportError::UnsupportedFormat(extension) => {
                write!(f, "unsupported catalog format '{extension}' (expected csv or json)")
            }
        }
    }
}

impl std::error::Error for CatalogImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogImportError::Io(err) => Some(err),
            CatalogImportError::Csv(err) => Some(err),
            CatalogImportError::Json(err) => Some(err),
            CatalogImportError::MissingIdColumn
            | CatalogImportError::BlankProductId { .. }
            | CatalogImportError::UnsupportedFormat(_) => None,
        }
    }
}

impl From<std::io::Error> for CatalogImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for CatalogImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

impl From<serde_json::Error> for CatalogImportError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

pub struct CatalogImporter;

impl CatalogImporter {
    /// Import a `.csv` or `.json` export, chosen by file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ProductRecord>, CatalogImportError> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let file = std::fs::File::open(path)?;

        match extension.as_str() {
            "csv" => Self::from_csv_reader(file),
            "json" => Self::from_json_reader(file),
            other => Err(CatalogImportError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Vec<ProductRecord>, CatalogImportError> {
        match parser::parse_records(reader)? {
            ParseOutcome::Records(records) => Ok(records),
            ParseOutcome::MissingIdColumn => Err(CatalogImportError::MissingIdColumn),
            ParseOutcome::BlankId { line } => Err(CatalogImportError::BlankProductId { line }),
        }
    }

    pub fn from_json_reader<R: Read>(reader: R) -> Result<Vec<ProductRecord>, CatalogImportError> {
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::FactValue;
    use std::io::Cursor;

    #[test]
    fn csv_columns_become_nested_facts() {
        let csv = "product_id,price,specs.noise_db,specs.mop,energy_class\n\
vac-1,399,62,true,A\n\
vac-2,549,,false,B\n";

        let records =
            CatalogImporter::from_csv_reader(Cursor::new(csv)).expect("catalog imports");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].product_id, "vac-1");
        assert_eq!(
            records[0].facts.lookup("specs.noise_db").found(),
            Some(&FactValue::Number(62.0))
        );
        assert!(records[1].facts.lookup("specs.noise_db").found().is_none());
        assert_eq!(
            records[1].facts.lookup("specs.mop").found(),
            Some(&FactValue::Bool(false))
        );
    }

    #[test]
    fn csv_without_id_column_is_rejected() {
        let csv = "sku,price\nvac-1,399\n";
        let error = CatalogImporter::from_csv_reader(Cursor::new(csv)).expect_err("missing id");
        assert!(matches!(error, CatalogImportError::MissingIdColumn));
    }

    #[test]
    fn csv_rows_need_a_product_id() {
        let csv = "product_id,price\nvac-1,399\n,450\n";
        let error = CatalogImporter::from_csv_reader(Cursor::new(csv)).expect_err("blank id");
        assert!(matches!(error, CatalogImportError::BlankProductId { line: 3 }));
    }

    #[test]
    fn json_records_deserialize() {
        let json = r#"[{ "product_id": "vac-9", "facts": { "price": 299, "specs": { "mop": true } } }]"#;
        let records =
            CatalogImporter::from_json_reader(Cursor::new(json)).expect("json imports");
        assert_eq!(records[0].product_id, "vac-9");
        assert_eq!(
            records[0].facts.lookup("specs.mop").found(),
            Some(&FactValue::Bool(true))
        );
    }
}

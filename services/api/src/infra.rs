use metrics_exporter_prometheus::PrometheusHandle;
use product_score::catalog::{CatalogImportError, CatalogImporter};
use product_score::scoring::{CategoryProfile, CategoryRegistry, ProductRecord, RegistryError};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

const SAMPLE_CATEGORY: &str = include_str!("../../../config/categories/robot_vacuum.json");
const SAMPLE_CATALOG: &str = include_str!("../../../config/samples/robot_vacuums.csv");

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Robot vacuum profile compiled into the binary for demos.
pub(crate) fn sample_profile() -> Result<CategoryProfile, RegistryError> {
    serde_json::from_str(SAMPLE_CATEGORY).map_err(|source| RegistryError::Parse {
        path: PathBuf::from("robot_vacuum.json"),
        source,
    })
}

pub(crate) fn sample_registry() -> Result<CategoryRegistry, RegistryError> {
    CategoryRegistry::from_profiles(vec![sample_profile()?])
}

pub(crate) fn sample_catalog() -> Result<Vec<ProductRecord>, CatalogImportError> {
    CatalogImporter::from_csv_reader(Cursor::new(SAMPLE_CATALOG))
}

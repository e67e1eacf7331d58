//! Toronto tables compiled into the crate.
use std::io::Write;

use once_cell::sync::Lazy;
use tempfile::NamedTempFile;
use tracing::info;

use crate::{Category, CategoryTable, DataError, Result, raw};

const EMBEDDED_METADATA: &str = include_str!("metadata.json");

const EMBEDDED_TABLES: [(Category, &[u8]); 13] = [
    (Category::Intersection, include_bytes!("toronto/intersections.csv")),
    (Category::TransitStop, include_bytes!("toronto/transit_stops.csv")),
    (Category::Hospital, include_bytes!("toronto/hospitals.csv")),
    (Category::Shelter, include_bytes!("toronto/shelters.csv")),
    (Category::Landmark, include_bytes!("toronto/landmarks.csv")),
    (Category::Education, include_bytes!("toronto/education.csv")),
    (Category::Park, include_bytes!("toronto/parks.csv")),
    (Category::Shopping, include_bytes!("toronto/shopping.csv")),
    (Category::Library, include_bytes!("toronto/libraries.csv")),
    (Category::Recreation, include_bytes!("toronto/recreation.csv")),
    (Category::Worship, include_bytes!("toronto/worship.csv")),
    (Category::Government, include_bytes!("toronto/government.csv")),
    (Category::Entertainment, include_bytes!("toronto/entertainment.csv")),
];

/// Description of the bundled dataset.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct EmbeddedMetadata {
    pub version: String,
    pub region: String,
    pub description: String,
    pub categories: Vec<Category>,
}

pub static METADATA: Lazy<EmbeddedMetadata> =
    Lazy::new(|| load_metadata().expect("Bundled gazetteer metadata should be valid JSON"));

pub fn load_metadata() -> Result<EmbeddedMetadata> {
    Ok(serde_json::from_str(EMBEDDED_METADATA)?)
}

/// Raw CSV bytes of a bundled table.
pub fn embedded_table_bytes(category: Category) -> Option<&'static [u8]> {
    EMBEDDED_TABLES
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, bytes)| *bytes)
}

/// Parse the bundled tables for `categories`, in the order given.
pub(crate) fn load_embedded_tables(categories: &[Category]) -> Result<Vec<CategoryTable>> {
    info!(
        version = %METADATA.version,
        region = %METADATA.region,
        "Loading embedded gazetteer"
    );

    categories
        .iter()
        .map(|&category| {
            let bytes =
                embedded_table_bytes(category).ok_or(DataError::EmbeddedTableNotFound(category))?;
            // The CSV reader scans from a path, so stage the bytes in a temp file.
            let mut tmp_file = NamedTempFile::new()?;
            tmp_file.write_all(bytes)?;
            tmp_file.flush()?;
            raw::read_category_table(tmp_file.path(), category)
        })
        .collect()
}

use std::{fs::File, io::Write};

use tempfile::TempDir;
use tracing::info;

use super::{Category, error::Result};

/// Rows of a synthetic category table: `(name, lat, lng)`.
pub type TestRows<'a> = &'a [(&'a str, f64, f64)];

/// Write small category tables into a fresh temporary directory.
///
/// The directory layout matches what [`GazetteerSource::Directory`](crate::GazetteerSource)
/// expects, so the result can be fed straight into the loader. The directory
/// is removed when the returned handle is dropped.
pub fn create_test_data_dir(tables: &[(Category, TestRows<'_>)]) -> Result<TempDir> {
    let dir = TempDir::new()?;
    info!(path = ?dir.path(), tables = tables.len(), "Creating test gazetteer tables");

    for (category, rows) in tables {
        let mut file = File::create(dir.path().join(format!("{}.csv", category.file_stem())))?;
        writeln!(file, "name,lat,lng")?;
        for (name, lat, lng) in *rows {
            writeln!(file, "{name},{lat},{lng}")?;
        }
        file.flush()?;
    }

    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::read_category_table;

    #[test]
    fn test_create_test_data_dir_writes_readable_tables() {
        let dir = create_test_data_dir(&[
            (Category::Hospital, &[("sick kids", 43.6572, -79.3873)]),
            (Category::Shelter, &[]),
        ])
        .unwrap();

        let hospitals =
            read_category_table(dir.path().join("hospitals.csv"), Category::Hospital).unwrap();
        assert_eq!(hospitals.len(), 1);
        assert_eq!(hospitals.records[0].name, "sick kids");
        assert!(dir.path().join("shelters.csv").exists());
    }
}

use std::path::Path;

use itertools::izip;
use polars::prelude::*;
use tracing::{debug, instrument};

use crate::{Category, CategoryTable, Coordinates, DataError, GazetteerRecord, Result};

const GAZETTEER_SCHEMA: [(PlSmallStr, DataType); 3] = [
    (PlSmallStr::from_static("name"), DataType::String),
    (PlSmallStr::from_static("lat"), DataType::Float64),
    (PlSmallStr::from_static("lng"), DataType::Float64),
];

/// Scan a `name,lat,lng` category file.
pub fn get_category_lf(path: impl AsRef<Path>) -> Result<LazyFrame> {
    Ok(LazyCsvReader::new(path)
        .with_has_header(true)
        .with_schema(Some(Schema::from_iter(GAZETTEER_SCHEMA).into()))
        .finish()?)
}

/// Read a category file into a table, keeping file order.
///
/// Every row needs a non-blank name and coordinates inside the valid
/// latitude/longitude ranges.
#[instrument(name = "Read category table", level = "debug", skip(path))]
pub fn read_category_table(path: impl AsRef<Path>, category: Category) -> Result<CategoryTable> {
    let df = get_category_lf(path)?.collect()?;

    let records = izip!(
        df.column("name")?.str()?,
        df.column("lat")?.f64()?,
        df.column("lng")?.f64()?,
    )
    .enumerate()
    .map(|(idx, (name, lat, lng))| {
        let row = idx + 1;
        let invalid = |reason: String| DataError::InvalidRow {
            category,
            row,
            reason,
        };

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| invalid("missing name".to_string()))?;
        let (Some(lat), Some(lng)) = (lat, lng) else {
            return Err(invalid(format!("missing coordinates for '{name}'")));
        };
        let coordinates =
            Coordinates::new(lat, lng).map_err(|e| invalid(format!("'{name}': {e}")))?;

        Ok(GazetteerRecord {
            name: name.to_string(),
            coordinates,
        })
    })
    .collect::<Result<Vec<_>>>()?;

    debug!(%category, rows = records.len(), "Parsed category table");
    Ok(CategoryTable { category, records })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "name,lat,lng").unwrap();
        write!(file, "{body}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_read_category_table_keeps_file_order() {
        let file = write_csv(
            "kipling station,43.6373,-79.5362\n  Union Station ,43.6453,-79.3806\nbloor station,43.6709,-79.3857\n",
        );

        let table = read_category_table(file.path(), Category::TransitStop).unwrap();

        assert_eq!(table.category, Category::TransitStop);
        let names: Vec<_> = table.records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["kipling station", "Union Station", "bloor station"]);
        assert_eq!(table.records[0].coordinates.lat, 43.6373);
        assert_eq!(table.records[0].coordinates.lng, -79.5362);
    }

    #[test]
    fn test_out_of_range_coordinates_are_rejected() {
        let file = write_csv("fine,43.0,-79.0\nbroken,143.0,-79.0\n");

        let err = read_category_table(file.path(), Category::Park).unwrap_err();
        match err {
            DataError::InvalidRow { category, row, .. } => {
                assert_eq!(category, Category::Park);
                assert_eq!(row, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_values_are_rejected() {
        let file = write_csv(",43.0,-79.0\n");
        assert!(read_category_table(file.path(), Category::Park).is_err());

        let file = write_csv("no coordinates,,\n");
        assert!(matches!(
            read_category_table(file.path(), Category::Park),
            Err(DataError::InvalidRow { .. })
        ));
    }

    #[test]
    fn test_header_only_file_is_empty_table() {
        let file = write_csv("");
        let table = read_category_table(file.path(), Category::Worship).unwrap();
        assert!(table.is_empty());
    }
}

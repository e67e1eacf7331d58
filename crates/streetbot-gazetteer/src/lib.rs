//! Place-name tables for the StreetBot location resolver.
//!
//! The gazetteer is split into category tables (intersections, TTC stations,
//! hospitals, ...). Each table is a `name,lat,lng` CSV file. The Toronto tables
//! ship embedded in the crate; a directory holding the same files can be used
//! instead (see [`GazetteerSource`]).
use once_cell::sync::Lazy;
use std::{fmt, path::PathBuf, str::FromStr};
use tracing::{info, instrument};

pub mod embedded;
pub mod raw;
pub mod test_data;

mod error;
pub use error::{DataError, Result};
pub use embedded::{EmbeddedMetadata, METADATA};
pub use test_data::create_test_data_dir;

/// Environment variable that points the loader at a directory of category CSV files.
pub const GAZETTEER_DIR_ENV: &str = "STREETBOT_GAZETTEER_DIR";

/// Directory configured through [`GAZETTEER_DIR_ENV`], if any.
pub static GAZETTEER_DIR: Lazy<Option<PathBuf>> =
    Lazy::new(|| std::env::var_os(GAZETTEER_DIR_ENV).map(PathBuf::from));

/// Logical grouping of gazetteer entries. Provenance only, never used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Intersection,
    TransitStop,
    Hospital,
    Shelter,
    Landmark,
    Education,
    Park,
    Shopping,
    Library,
    Recreation,
    Worship,
    Government,
    Entertainment,
}

impl Category {
    /// All categories in their default merge order.
    pub const ALL: [Self; 13] = [
        Self::Intersection,
        Self::TransitStop,
        Self::Hospital,
        Self::Shelter,
        Self::Landmark,
        Self::Education,
        Self::Park,
        Self::Shopping,
        Self::Library,
        Self::Recreation,
        Self::Worship,
        Self::Government,
        Self::Entertainment,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intersection => "intersection",
            Self::TransitStop => "transit-stop",
            Self::Hospital => "hospital",
            Self::Shelter => "shelter",
            Self::Landmark => "landmark",
            Self::Education => "education",
            Self::Park => "park",
            Self::Shopping => "shopping",
            Self::Library => "library",
            Self::Recreation => "recreation",
            Self::Worship => "worship",
            Self::Government => "government",
            Self::Entertainment => "entertainment",
        }
    }

    /// File stem of the category table (`<stem>.csv`).
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::Intersection => "intersections",
            Self::TransitStop => "transit_stops",
            Self::Hospital => "hospitals",
            Self::Shelter => "shelters",
            Self::Landmark => "landmarks",
            Self::Education => "education",
            Self::Park => "parks",
            Self::Shopping => "shopping",
            Self::Library => "libraries",
            Self::Recreation => "recreation",
            Self::Worship => "worship",
            Self::Government => "government",
            Self::Entertainment => "entertainment",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s) || c.file_stem().eq_ignore_ascii_case(s))
            .ok_or_else(|| DataError::UnknownCategory(s.to_string()))
    }
}

/// A point in WGS84 decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build coordinates, rejecting values outside the valid latitude/longitude ranges.
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        let coordinates = Self { lat, lng };
        if coordinates.is_valid() {
            Ok(coordinates)
        } else {
            Err(DataError::InvalidCoordinates { lat, lng })
        }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lng)
    }
}

/// One row of a category table, name as written in the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerRecord {
    pub name: String,
    pub coordinates: Coordinates,
}

/// All rows of a single category, in file order.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    pub category: Category,
    pub records: Vec<GazetteerRecord>,
}

impl CategoryTable {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Where the category tables come from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GazetteerSource {
    /// Toronto tables compiled into the crate
    #[default]
    Embedded,
    /// A directory holding one `<file_stem>.csv` per category
    Directory(PathBuf),
}

impl GazetteerSource {
    /// Use [`GAZETTEER_DIR_ENV`] when set, the embedded tables otherwise.
    pub fn from_env() -> Self {
        GAZETTEER_DIR
            .clone()
            .map_or(Self::Embedded, Self::Directory)
    }
}

/// Load the tables for `categories`, in the order given.
///
/// A directory source must contain a file for every requested category.
#[instrument(name = "Load gazetteer tables", level = "info", skip(categories))]
pub fn load_tables(source: &GazetteerSource, categories: &[Category]) -> Result<Vec<CategoryTable>> {
    let tables = match source {
        GazetteerSource::Embedded => embedded::load_embedded_tables(categories)?,
        GazetteerSource::Directory(dir) => categories
            .iter()
            .map(|&category| {
                let path = dir.join(format!("{}.csv", category.file_stem()));
                if !path.exists() {
                    return Err(DataError::TableNotFound { category, path });
                }
                raw::read_category_table(&path, category)
            })
            .collect::<Result<Vec<_>>>()?,
    };

    info!(
        tables = tables.len(),
        rows = tables.iter().map(CategoryTable::len).sum::<usize>(),
        "Loaded gazetteer tables"
    );
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_names() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
            assert_eq!(category.file_stem().parse::<Category>().unwrap(), category);
        }
        assert!("castle".parse::<Category>().is_err());
    }

    #[test]
    fn test_coordinates_validation() {
        assert!(Coordinates::new(43.6561, -79.3802).is_ok());
        assert!(Coordinates::new(90.0, 180.0).is_ok());
        assert!(matches!(
            Coordinates::new(91.0, 0.0),
            Err(DataError::InvalidCoordinates { .. })
        ));
        assert!(Coordinates::new(0.0, -180.5).is_err());
        assert!(Coordinates::new(f64::NAN, 0.0).is_err());
    }

    #[test]
    fn test_directory_source_requires_every_table() {
        let dir = create_test_data_dir(&[(
            Category::Intersection,
            &[("yonge and dundas", 43.6561, -79.3802)],
        )])
        .unwrap();
        let source = GazetteerSource::Directory(dir.path().to_path_buf());

        let tables = load_tables(&source, &[Category::Intersection]).unwrap();
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].records[0].name, "yonge and dundas");

        let missing = load_tables(&source, &[Category::Intersection, Category::Park]);
        assert!(matches!(
            missing,
            Err(DataError::TableNotFound {
                category: Category::Park,
                ..
            })
        ));
    }
}

use polars::prelude::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

use crate::Category;

pub type Result<T> = std::result::Result<T, DataError>;

#[derive(Error, Debug)]
pub enum DataError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Coordinates out of range: lat {lat}, lng {lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
    #[error("Invalid row {row} in {category} table: {reason}")]
    InvalidRow {
        category: Category,
        row: usize,
        reason: String,
    },
    #[error("Unknown gazetteer category: {0}")]
    UnknownCategory(String),
    #[error("Table for {category} not found at {}", path.display())]
    TableNotFound { category: Category, path: PathBuf },
    #[error("Embedded table for {0} is not bundled")]
    EmbeddedTableNotFound(Category),
}

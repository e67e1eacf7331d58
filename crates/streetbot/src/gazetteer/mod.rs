//! Immutable place-name lookup merged from the category tables.
//!
//! Keys are normalized (trimmed, lowercased) once at build time, so a lookup
//! only has to normalize the query. Iteration follows insertion order, which is
//! what the containment fallback of the resolver relies on for tie-breaking.
use ahash::AHashMap;
use itertools::Itertools;
use streetbot_gazetteer::{Category, CategoryTable, Coordinates, GazetteerSource, load_tables};
use tracing::{debug, info, instrument};

pub use error::{GazetteerError, Result};

/// Normalize free text the way gazetteer keys are stored.
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// A single place the resolver can match.
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerEntry {
    /// Normalized canonical name or alias
    pub key: String,
    pub coordinates: Coordinates,
    /// Table the current value came from
    pub category: Category,
}

/// What to do when two tables define the same key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// The later table wins; the key keeps the position of its first definition.
    #[default]
    LastWriteWins,
    /// Fail the build when the colliding definitions disagree on coordinates.
    /// Identical duplicates are still merged.
    RejectConflicting,
}

/// A key defined more than once while merging.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyCollision {
    pub key: String,
    pub replaced: (Category, Coordinates),
    pub kept: (Category, Coordinates),
}

impl KeyCollision {
    /// The two definitions point at different places.
    pub fn is_conflicting(&self) -> bool {
        !same_point(&self.replaced.1, &self.kept.1)
    }
}

fn same_point(a: &Coordinates, b: &Coordinates) -> bool {
    (a.lat - b.lat).abs() < 1e-9 && (a.lng - b.lng).abs() < 1e-9
}

/// How the gazetteer is assembled from its tables.
#[derive(Debug, Clone, PartialEq)]
pub struct GazetteerConfig {
    /// Merge order and containment priority. Categories not listed are not loaded.
    pub category_order: Vec<Category>,
    pub collision_policy: CollisionPolicy,
}

impl Default for GazetteerConfig {
    fn default() -> Self {
        Self {
            category_order: Category::ALL.to_vec(),
            collision_policy: CollisionPolicy::default(),
        }
    }
}

/// Read-only mapping from normalized place names to coordinates.
#[derive(Debug, Clone)]
pub struct Gazetteer {
    entries: Vec<GazetteerEntry>,
    index: AHashMap<String, usize>,
    collisions: Vec<KeyCollision>,
    category_order: Vec<Category>,
    source_rows: usize,
}

impl Gazetteer {
    pub fn builder() -> GazetteerBuilder {
        GazetteerBuilder::default()
    }

    /// Load the tables from `source` and merge them according to `config`.
    #[instrument(name = "Load gazetteer", level = "info", skip(config))]
    pub fn load(source: &GazetteerSource, config: &GazetteerConfig) -> Result<Self> {
        let tables = load_tables(source, &config.category_order)?;
        Self::builder()
            .tables(tables)
            .category_order(config.category_order.clone())
            .collision_policy(config.collision_policy)
            .build()
    }

    /// The bundled Toronto gazetteer with default merge settings.
    pub fn embedded() -> Result<Self> {
        Self::load(&GazetteerSource::Embedded, &GazetteerConfig::default())
    }

    /// Look up free text, normalizing it first.
    pub fn get(&self, query: &str) -> Option<&GazetteerEntry> {
        self.get_normalized(&normalize(query))
    }

    /// Look up an already normalized key.
    pub fn get_normalized(&self, key: &str) -> Option<&GazetteerEntry> {
        self.index.get(key).map(|&idx| &self.entries[idx])
    }

    pub fn contains_key(&self, query: &str) -> bool {
        self.get(query).is_some()
    }

    /// First entry, in iteration order, whose key contains `phrase` or is contained in it.
    ///
    /// `phrase` must already be normalized. An empty phrase matches nothing.
    pub fn find_containing(&self, phrase: &str) -> Option<&GazetteerEntry> {
        if phrase.is_empty() {
            return None;
        }
        self.entries
            .iter()
            .find(|entry| phrase.contains(entry.key.as_str()) || entry.key.contains(phrase))
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &GazetteerEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys defined more than once while merging, in merge order.
    pub fn collisions(&self) -> &[KeyCollision] {
        &self.collisions
    }

    /// Category merge order used to build this gazetteer.
    pub fn category_order(&self) -> &[Category] {
        &self.category_order
    }

    /// Rows read from the source tables, duplicates included.
    pub fn source_rows(&self) -> usize {
        self.source_rows
    }

    /// Live entries per category, in category order. Overwritten keys count
    /// towards the category that won.
    pub fn category_counts(&self) -> Vec<(Category, usize)> {
        let counts = self.entries.iter().counts_by(|entry| entry.category);
        self.category_order
            .iter()
            .map(|category| (*category, counts.get(category).copied().unwrap_or_default()))
            .collect()
    }
}

impl<'a> IntoIterator for &'a Gazetteer {
    type Item = &'a GazetteerEntry;
    type IntoIter = std::slice::Iter<'a, GazetteerEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Collects category tables and merges them into a [`Gazetteer`].
#[derive(Debug, Clone, Default)]
pub struct GazetteerBuilder {
    tables: Vec<CategoryTable>,
    category_order: Option<Vec<Category>>,
    collision_policy: CollisionPolicy,
}

impl GazetteerBuilder {
    pub fn table(mut self, table: CategoryTable) -> Self {
        self.tables.push(table);
        self
    }

    pub fn tables(mut self, tables: impl IntoIterator<Item = CategoryTable>) -> Self {
        self.tables.extend(tables);
        self
    }

    /// Merge tables in this category order. Tables of unlisted categories are skipped.
    pub fn category_order(mut self, order: Vec<Category>) -> Self {
        self.category_order = Some(order);
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    #[instrument(name = "Build gazetteer", level = "debug", skip_all)]
    pub fn build(self) -> Result<Gazetteer> {
        let category_order = self.category_order.unwrap_or_else(|| Category::ALL.to_vec());
        if category_order.is_empty() {
            return Err(GazetteerError::EmptyCategoryOrder);
        }
        if let Some(duplicate) = category_order.iter().duplicates().next() {
            return Err(GazetteerError::DuplicateCategory(*duplicate));
        }

        // Stable sort keeps tables of the same category in the order they were added.
        let tables = self
            .tables
            .into_iter()
            .filter_map(|table| {
                category_order
                    .iter()
                    .position(|c| *c == table.category)
                    .map(|rank| (rank, table))
            })
            .sorted_by_key(|(rank, _)| *rank)
            .map(|(_, table)| table);

        let mut entries: Vec<GazetteerEntry> = Vec::new();
        let mut index: AHashMap<String, usize> = AHashMap::new();
        let mut collisions = Vec::new();
        let mut source_rows = 0;

        for table in tables {
            for record in table.records {
                source_rows += 1;
                let key = normalize(&record.name);
                if key.is_empty() {
                    return Err(GazetteerError::EmptyKey(table.category));
                }
                if !record.coordinates.is_valid() {
                    return Err(GazetteerError::InvalidCoordinates {
                        key,
                        coordinates: record.coordinates,
                    });
                }

                let Some(&slot) = index.get(&key) else {
                    index.insert(key.clone(), entries.len());
                    entries.push(GazetteerEntry {
                        key,
                        coordinates: record.coordinates,
                        category: table.category,
                    });
                    continue;
                };

                let existing = &mut entries[slot];
                let collision = KeyCollision {
                    key: key.clone(),
                    replaced: (existing.category, existing.coordinates),
                    kept: (table.category, record.coordinates),
                };
                debug!(
                    key = %collision.key,
                    replaced = %collision.replaced.0,
                    kept = %collision.kept.0,
                    conflicting = collision.is_conflicting(),
                    "Gazetteer key defined twice"
                );
                if self.collision_policy == CollisionPolicy::RejectConflicting
                    && collision.is_conflicting()
                {
                    return Err(GazetteerError::ConflictingKey(Box::new(collision)));
                }
                existing.coordinates = record.coordinates;
                existing.category = table.category;
                collisions.push(collision);
            }
        }

        info!(
            entries = entries.len(),
            source_rows,
            collisions = collisions.len(),
            "Gazetteer built"
        );

        Ok(Gazetteer {
            entries,
            index,
            collisions,
            category_order,
            source_rows,
        })
    }
}

mod error {
    use streetbot_gazetteer::{Category, Coordinates, DataError};
    use thiserror::Error;

    use super::KeyCollision;

    #[derive(Error, Debug)]
    pub enum GazetteerError {
        #[error("Data error: {0}")]
        Data(#[from] DataError),
        #[error(
            "Key '{}' maps to {} ({}) and {} ({})",
            .0.key, .0.replaced.0, .0.replaced.1, .0.kept.0, .0.kept.1
        )]
        ConflictingKey(Box<KeyCollision>),
        #[error("Empty key in {0} table")]
        EmptyKey(Category),
        #[error("Invalid coordinates ({coordinates}) for '{key}'")]
        InvalidCoordinates { key: String, coordinates: Coordinates },
        #[error("Category order must not be empty")]
        EmptyCategoryOrder,
        #[error("Category {0} listed more than once in the category order")]
        DuplicateCategory(Category),
    }

    pub type Result<T> = std::result::Result<T, GazetteerError>;
}

//! Immutable, row-indexed movie table.
//!
//! Row order is fixed at construction. Every derived structure (feature vectors,
//! similarity rows) is addressed by the [`RowIndex`] handed out here.

use std::collections::HashMap;

use crate::models::{MovieRecord, RowIndex};

pub mod source;

pub use source::{CatalogSource, CsvFileSource, HttpCsvSource};

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("duplicate movie id {id} at rows {first} and {second}")]
    DuplicateId { id: i64, first: usize, second: usize },
}

#[derive(Debug)]
pub struct Catalog {
    records: Vec<MovieRecord>,
    positions: HashMap<i64, RowIndex>,
}

impl Catalog {
    /// Builds the catalog, keeping `records` in the given order
    pub fn new(records: Vec<MovieRecord>) -> Result<Self, CatalogError> {
        let mut positions = HashMap::with_capacity(records.len());

        for (row, record) in records.iter().enumerate() {
            if let Some(existing) = positions.insert(record.id, RowIndex(row)) {
                return Err(CatalogError::DuplicateId {
                    id: record.id,
                    first: existing.get(),
                    second: row,
                });
            }
        }

        Ok(Self { records, positions })
    }

    /// Loads all records from `source`
    pub async fn load(source: &dyn CatalogSource) -> crate::error::AppResult<Self> {
        let records = source.load().await?;
        let catalog = Self::new(records)?;

        tracing::info!(
            source = %source.describe(),
            movies = catalog.len(),
            "Loaded movie catalog"
        );

        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, row: RowIndex) -> &MovieRecord {
        &self.records[row.0]
    }

    pub fn position_of(&self, id: i64) -> Option<RowIndex> {
        self.positions.get(&id).copied()
    }

    /// Records in catalog order, paired with their row
    pub fn iter(&self) -> impl Iterator<Item = (RowIndex, &MovieRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(row, record)| (RowIndex(row), record))
    }

    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::source::MockCatalogSource;
    use crate::error::AppError;

    fn sample() -> Vec<MovieRecord> {
        vec![
            MovieRecord::new(10, "Heat"),
            MovieRecord::new(20, "Ronin"),
            MovieRecord::new(30, "Collateral"),
        ]
    }

    #[test]
    fn test_rows_follow_input_order() {
        let catalog = Catalog::new(sample()).unwrap();
        let titles: Vec<&str> = catalog.iter().map(|(_, r)| r.title_text()).collect();
        assert_eq!(titles, vec!["Heat", "Ronin", "Collateral"]);
        assert_eq!(catalog.position_of(20), Some(RowIndex(1)));
        assert_eq!(catalog.get(RowIndex(2)).id, 30);
        assert_eq!(catalog.position_of(99), None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut records = sample();
        records.push(MovieRecord::new(20, "Ronin (re-release)"));
        let err = Catalog::new(records).unwrap_err();
        assert_eq!(
            err,
            CatalogError::DuplicateId {
                id: 20,
                first: 1,
                second: 3
            }
        );
    }

    #[tokio::test]
    async fn test_load_from_source() {
        let mut source = MockCatalogSource::new();
        source.expect_load().times(1).returning(|| Ok(sample()));
        source
            .expect_describe()
            .returning(|| "mock".to_string());

        let catalog = Catalog::load(&source).await.unwrap();
        assert_eq!(catalog.len(), 3);
    }

    #[tokio::test]
    async fn test_load_propagates_source_error() {
        let mut source = MockCatalogSource::new();
        source
            .expect_load()
            .returning(|| Err(AppError::Catalog("unreachable".to_string())));
        source
            .expect_describe()
            .returning(|| "mock".to_string());

        let err = Catalog::load(&source).await.unwrap_err();
        assert!(matches!(err, AppError::Catalog(_)));
    }
}

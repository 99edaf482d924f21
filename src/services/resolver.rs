use crate::{
    catalog::Catalog,
    error::{AppError, AppResult},
    models::RowIndex,
};

/// Maps a free-text title to a single catalog row.
///
/// Case-insensitive exact match wins; otherwise the first title containing the
/// query. Both passes walk the catalog in row order.
pub fn resolve(catalog: &Catalog, query: &str) -> AppResult<RowIndex> {
    let needle = query.to_lowercase();

    let exact = catalog
        .iter()
        .find(|(_, record)| matches!(&record.title, Some(t) if t.to_lowercase() == needle));

    if let Some((row, _)) = exact {
        return Ok(row);
    }

    find(catalog, query, 1)
        .into_iter()
        .next()
        .ok_or_else(|| AppError::NotFound(format!("Movie '{}' not found in dataset", query)))
}

/// Rows whose title contains `query` (case-insensitive), in catalog order.
/// Records without a title never match.
pub fn find(catalog: &Catalog, query: &str, limit: usize) -> Vec<RowIndex> {
    let needle = query.to_lowercase();

    catalog
        .iter()
        .filter(|(_, record)| matches!(&record.title, Some(t) if t.to_lowercase().contains(&needle)))
        .map(|(row, _)| row)
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieRecord;

    fn catalog() -> Catalog {
        Catalog::new(vec![
            MovieRecord::new(1, "The Dark Knight Rises"),
            MovieRecord::new(2, "The Dark Knight"),
            MovieRecord {
                id: 3,
                ..Default::default()
            },
            MovieRecord::new(4, "Dark City"),
            MovieRecord::new(5, "the dark knight"),
        ])
        .unwrap()
    }

    #[test]
    fn test_exact_match_beats_earlier_substring_match() {
        let row = resolve(&catalog(), "THE DARK KNIGHT").unwrap();
        assert_eq!(catalog().get(row).id, 2);
    }

    #[test]
    fn test_substring_fallback_takes_first_in_order() {
        let row = resolve(&catalog(), "dark").unwrap();
        assert_eq!(catalog().get(row).id, 1);
    }

    #[test]
    fn test_unknown_title_is_not_found() {
        let err = resolve(&catalog(), "zzzznotamovie").unwrap_err();
        match err {
            AppError::NotFound(msg) => assert!(msg.contains("zzzznotamovie")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_query_is_not_a_pattern() {
        assert!(resolve(&catalog(), "dark.*").is_err());
    }

    #[test]
    fn test_find_respects_limit_and_order() {
        let catalog = catalog();
        let ids: Vec<i64> = find(&catalog, "DARK", 10)
            .into_iter()
            .map(|row| catalog.get(row).id)
            .collect();
        assert_eq!(ids, vec![1, 2, 4, 5]);

        assert_eq!(find(&catalog, "dark", 2).len(), 2);
        assert!(find(&catalog, "dark", 0).is_empty());
    }

    #[test]
    fn test_find_without_matches_is_empty() {
        assert!(find(&catalog(), "nope", 10).is_empty());
    }
}

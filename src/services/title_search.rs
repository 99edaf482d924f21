use crate::{catalog::Catalog, models::SearchHit, services::resolver};

/// Title search for autocomplete
///
/// Substring match only, in catalog order, at most `limit` hits. No matches is
/// an empty list, not an error.
pub fn search_titles(catalog: &Catalog, query: &str, limit: usize) -> Vec<SearchHit> {
    let hits: Vec<SearchHit> = resolver::find(catalog, query, limit)
        .into_iter()
        .map(|row| SearchHit::from(catalog.get(row)))
        .collect();

    tracing::debug!(query = %query, hits = hits.len(), "Searched titles");

    hits
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MovieRecord;

    #[test]
    fn test_search_titles() {
        let catalog = Catalog::new(vec![
            MovieRecord::new(1, "Spaceward"),
            MovieRecord::new(2, "Kitchen Tales"),
            MovieRecord::new(3, "Spark of Stars"),
        ])
        .unwrap();

        let hits = search_titles(&catalog, "SPA", 10);
        let titles: Vec<&str> = hits.iter().map(|h| h.title.as_str()).collect();
        assert_eq!(titles, vec!["Spaceward", "Spark of Stars"]);

        assert!(search_titles(&catalog, "xyz", 10).is_empty());
    }
}

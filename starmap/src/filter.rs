//! Name search over a loaded catalog.
//!
//! Filtering is a case-insensitive substring match against the proper name,
//! Bayer designation and Gliese id. Queries of zero or one character leave
//! the catalog unfiltered. Results are index lists into the catalog, in
//! catalog order, so the point cloud built from them stays index-aligned.

use rayon::prelude::*;

use crate::catalog::{Catalog, StarRecord};

/// Queries with at most this many characters do not filter.
pub const MIN_QUERY_CHARS: usize = 2;

fn is_active(query: &str) -> bool {
    query.chars().count() >= MIN_QUERY_CHARS
}

fn field_contains(field: &Option<String>, needle: &str) -> bool {
    field
        .as_deref()
        .is_some_and(|value| value.to_lowercase().contains(needle))
}

/// Whether a star matches an already-lowercased needle.
pub fn matches(star: &StarRecord, needle: &str) -> bool {
    field_contains(&star.proper_name, needle)
        || field_contains(&star.bayer_designation, needle)
        || field_contains(&star.gliese_id, needle)
}

/// Lowercased searchable fields of one star, computed once per catalog.
type SearchKey = [Option<String>; 3];

fn search_key(star: &StarRecord) -> SearchKey {
    let lower = |field: &Option<String>| field.as_deref().map(str::to_lowercase);
    [
        lower(&star.proper_name),
        lower(&star.bayer_designation),
        lower(&star.gliese_id),
    ]
}

fn key_matches(key: &SearchKey, needle: &str) -> bool {
    key.iter().flatten().any(|field| field.contains(needle))
}

/// Filter `stars` by `query`, returning the indices of matching stars.
///
/// Short queries return every index. This always rescans the full input.
pub fn filter_indices(stars: &[StarRecord], query: &str) -> Vec<usize> {
    if !is_active(query) {
        return (0..stars.len()).collect();
    }

    let needle = query.to_lowercase();
    stars
        .iter()
        .enumerate()
        .filter(|(_, star)| matches(star, &needle))
        .map(|(i, _)| i)
        .collect()
}

/// Filter `stars` by `query`, returning the matching records in order.
pub fn filter_records<'a>(stars: &'a [StarRecord], query: &str) -> Vec<&'a StarRecord> {
    filter_indices(stars, query)
        .into_iter()
        .map(|i| &stars[i])
        .collect()
}

/// Memoizing filter for a stream of queries against one catalog at a time.
///
/// Each keystroke usually extends the previous query, and every star matching
/// the longer query also matched the shorter one. In that case only the
/// previous result is rescanned. Lowercased search fields are built once per
/// catalog, so scans do not allocate. The result is always identical to
/// [`filter_indices`] on the full catalog.
#[derive(Debug, Default)]
pub struct QueryFilter {
    generation: Option<u64>,
    needle: Option<String>,
    indices: Vec<usize>,
    keys_generation: Option<u64>,
    keys: Vec<SearchKey>,
}

impl QueryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices of `catalog` stars matching `query`.
    pub fn apply(&mut self, catalog: &Catalog, query: &str) -> &[usize] {
        let needle = is_active(query).then(|| query.to_lowercase());
        let same_catalog = self.generation == Some(catalog.generation());

        if same_catalog && self.needle == needle {
            log::trace!("Filter cache hit for {query:?}");
            return &self.indices;
        }

        let stars = catalog.stars();
        if needle.is_some() && self.keys_generation != Some(catalog.generation()) {
            self.keys = stars.par_iter().map(search_key).collect();
            self.keys_generation = Some(catalog.generation());
        }

        let keys = &self.keys;
        self.indices = match (&needle, &self.needle) {
            (Some(new), Some(previous)) if same_catalog && new.starts_with(previous.as_str()) => {
                let narrowed: Vec<usize> = self
                    .indices
                    .iter()
                    .copied()
                    .filter(|&i| key_matches(&keys[i], new))
                    .collect();
                log::debug!(
                    "Narrowed filter {previous:?} -> {new:?}: {} -> {} stars",
                    self.indices.len(),
                    narrowed.len()
                );
                narrowed
            }
            (Some(new), _) => {
                let indices: Vec<usize> = keys
                    .iter()
                    .enumerate()
                    .filter(|(_, key)| key_matches(key, new))
                    .map(|(i, _)| i)
                    .collect();
                log::debug!(
                    "Full filter scan for {query:?}: {} of {} stars",
                    indices.len(),
                    stars.len()
                );
                indices
            }
            (None, _) => (0..stars.len()).collect(),
        };

        self.generation = Some(catalog.generation());
        self.needle = needle;
        &self.indices
    }

    /// Forget cached results.
    pub fn invalidate(&mut self) {
        self.generation = None;
        self.needle = None;
        self.indices.clear();
        self.keys_generation = None;
        self.keys.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn star(proper: Option<&str>, bayer: Option<&str>, gl: Option<&str>) -> StarRecord {
        let mut s = StarRecord::at(0.0, 0.0, 0.0);
        s.proper_name = proper.map(str::to_string);
        s.bayer_designation = bayer.map(str::to_string);
        s.gliese_id = gl.map(str::to_string);
        s
    }

    fn sample() -> Vec<StarRecord> {
        vec![
            star(Some("Sirius"), Some("Alp"), Some("Gl 244A")),
            star(Some("Vega"), Some("Alp"), Some("Gl 721")),
            star(None, None, Some("Gl 551")),
            star(None, Some("Bet"), None),
            star(Some("Betelgeuse"), Some("Alp"), None),
            star(None, None, None),
        ]
    }

    #[rstest]
    #[case("")]
    #[case("s")]
    #[case("Z")]
    #[case("é")]
    fn test_short_query_is_identity(#[case] query: &str) {
        let stars = sample();
        assert_eq!(filter_indices(&stars, query), (0..stars.len()).collect::<Vec<_>>());
    }

    #[rstest]
    #[case("sir", vec![0])]
    #[case("SIR", vec![0])]
    #[case("alp", vec![0, 1, 4])]
    #[case("bet", vec![3, 4])]
    #[case("gl 7", vec![1])]
    #[case("gl", vec![0, 1, 2])]
    #[case("xyz", vec![])]
    fn test_matches_any_searched_field(#[case] query: &str, #[case] expected: Vec<usize>) {
        assert_eq!(filter_indices(&sample(), query), expected);
    }

    #[test]
    fn test_results_are_ordered_subsequence_containing_query() {
        let stars = sample();
        for query in ["al", "ga", "e", "gl 5", "us"] {
            let result = filter_records(&stars, query);
            let needle = query.to_lowercase();
            for star in &result {
                assert!(matches(star, &needle));
            }
            let indices = filter_indices(&stars, query);
            assert!(indices.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_unsearched_fields_do_not_match() {
        let mut s = star(None, None, None);
        s.constellation = Some("Orion".to_string());
        s.spectral_type = Some("M1".to_string());
        assert!(filter_indices(&[s], "or").is_empty());
    }

    #[test]
    fn test_query_filter_agrees_with_full_scan() {
        let catalog = Catalog::new(sample());
        let mut filter = QueryFilter::new();

        for query in ["", "a", "al", "alp", "al", "b", "be", "bet", "betel", "x", "gl", "gl 2"] {
            let cached = filter.apply(&catalog, query).to_vec();
            assert_eq!(cached, filter_indices(catalog.stars(), query), "query {query:?}");
        }
    }

    #[test]
    fn test_query_filter_builds_keys_once_per_catalog() {
        let catalog = Catalog::new(vec![
            star(Some("Étoile"), None, None),
            star(Some("Sirius"), Some("Alp"), Some("Gl 244A")),
        ]);
        let mut filter = QueryFilter::new();

        // Unfiltered queries need no keys
        assert_eq!(filter.apply(&catalog, "e"), &[0, 1]);
        assert!(filter.keys.is_empty());

        assert_eq!(filter.apply(&catalog, "ÉTO"), &[0]);
        assert_eq!(filter.keys_generation, Some(catalog.generation()));
        assert_eq!(filter.keys[0][0].as_deref(), Some("étoile"));
        let first_key_ptr = filter.keys.as_ptr();

        for query in ["gl", "gl 2", "ir", "alp"] {
            assert_eq!(
                filter.apply(&catalog, query),
                filter_indices(catalog.stars(), query).as_slice()
            );
        }
        assert_eq!(filter.keys.as_ptr(), first_key_ptr);

        let other = Catalog::new(vec![star(Some("Vega"), None, None)]);
        assert_eq!(filter.apply(&other, "veg"), &[0]);
        assert_eq!(filter.keys.len(), 1);
        assert_eq!(filter.keys_generation, Some(other.generation()));
    }

    #[test]
    fn test_query_filter_resets_on_new_catalog() {
        let mut filter = QueryFilter::new();
        let first = Catalog::new(sample());
        assert_eq!(filter.apply(&first, "sir"), &[0]);

        let second = Catalog::new(vec![star(Some("Polaris"), None, None)]);
        assert!(filter.apply(&second, "sir").is_empty());
        assert_eq!(filter.apply(&second, "pol"), &[0]);
    }
}

//! Title search

/// Result of searching the entry titles
#[derive(Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    /// A title equals the query ignoring case
    Exact(String),
    /// Titles containing the query ignoring case, in input order
    Matches(Vec<String>),
}

pub fn search(titles: Vec<String>, query: &str) -> SearchOutcome {
    let query = query.to_lowercase();

    if let Some(exact) = titles.iter().find(|t| t.to_lowercase() == query) {
        return SearchOutcome::Exact(exact.clone());
    }

    SearchOutcome::Matches(
        titles
            .into_iter()
            .filter(|t| t.to_lowercase().contains(&query))
            .collect(),
    )
}

//! Listing search: a case-insensitive substring filter over `display_name`.

use crate::Document;

/// True if `query` is empty or occurs in the display name, ignoring case.
pub fn matches_display_name(document: &Document, query: &str) -> bool {
    query.is_empty()
        || document
            .display_name
            .as_str()
            .to_lowercase()
            .contains(&query.to_lowercase())
}

pub fn filter_by_display_name<'a>(documents: &'a [Document], query: &str) -> Vec<&'a Document> {
    documents
        .iter()
        .filter(|d| matches_display_name(d, query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::{config, new_document};
    use crate::registry::{DocumentRegistry, FsDocumentRegistry};
    use tempfile::TempDir;

    fn documents(names: &[&str]) -> Vec<Document> {
        let temp = TempDir::new().unwrap();
        let registry = FsDocumentRegistry::new(&config(&temp));
        names
            .iter()
            .map(|n| registry.create(new_document("uid-a", n)).unwrap())
            .collect()
    }

    #[test]
    fn test_search_returns_only_matching() {
        let docs = documents(&["report.pdf", "invoice.pdf"]);
        let hits: Vec<&str> = filter_by_display_name(&docs, "rep")
            .into_iter()
            .map(|d| d.display_name.as_str())
            .collect();
        assert_eq!(hits, vec!["report.pdf"]);
    }

    #[test]
    fn test_search_ignores_case() {
        let docs = documents(&["Quarterly REPORT.pdf"]);
        assert_eq!(filter_by_display_name(&docs, "report").len(), 1);
        assert_eq!(filter_by_display_name(&docs, "QUARTERLY").len(), 1);
    }

    #[test]
    fn test_empty_query_returns_everything() {
        let docs = documents(&["a.pdf", "b.pdf"]);
        assert_eq!(filter_by_display_name(&docs, "").len(), 2);
        assert!(filter_by_display_name(&docs, "zzz").is_empty());
    }
}

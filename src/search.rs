//! Query execution context and runner.
//!
//! [`SearchContext`] is the explicit home of everything a query run needs:
//! the opened shard router and the collection store handle. It is built once
//! at startup, passed to the runner, and dropped (releasing all handles) when
//! the process exits, success or failure alike. Nothing query-scoped lives in
//! process-global state.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::collection::CollectionStore;
use crate::error::Result;
use crate::query::QueryEvaluator;
use crate::shard::ShardRouter;

/// One matched document: its ID and the source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryMatch {
    /// Document ID (the line's byte offset in the collection store).
    pub doc_id: u64,
    /// The document line, without its terminator.
    pub line: String,
}

/// Result structure for one query run.
#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResults {
    /// The query as given.
    pub query: String,
    /// Matches in ascending doc-ID order.
    pub matches: Vec<QueryMatch>,
    /// Wall-clock time spent evaluating and fetching.
    pub duration_ms: u64,
}

/// All state needed to answer queries: the shard index and the collection.
#[derive(Debug)]
pub struct SearchContext {
    index: ShardRouter,
    collection: CollectionStore,
}

impl SearchContext {
    /// Create a context from already-opened handles.
    pub fn new(index: ShardRouter, collection: CollectionStore) -> Self {
        SearchContext { index, collection }
    }

    /// Evaluate a boolean query and fetch the matching lines.
    ///
    /// Matches come back in ascending doc-ID order. A line fetch failure
    /// aborts the whole query; no partial result set is returned.
    pub fn search(&mut self, query: &str) -> Result<SearchResults> {
        let start_time = Instant::now();

        let doc_ids = QueryEvaluator::new(&mut self.index).evaluate(query)?;

        let mut matches = Vec::with_capacity(doc_ids.len());
        for doc_id in doc_ids {
            let line = self.collection.line_at(doc_id)?;
            matches.push(QueryMatch { doc_id, line });
        }

        let duration_ms = start_time.elapsed().as_millis() as u64;
        log::info!(
            "query {query:?} matched {} documents in {duration_ms}ms",
            matches.len()
        );

        Ok(SearchResults {
            query: query.to_string(),
            matches,
            duration_ms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XiphosError;
    use crate::postings::Posting;
    use crate::shard::ShardWriter;
    use crate::storage::memory::MemoryStorage;
    use crate::storage::Storage;
    use std::io::Write;

    /// Single-shard fixture matching the cat/dog scenario: doc IDs are the
    /// byte offsets of the collection lines.
    fn context() -> SearchContext {
        let storage = MemoryStorage::new();

        let mut writer = ShardWriter::new(0, 1).unwrap();
        writer
            .add_term(
                "cat",
                vec![Posting::new(0, 2), Posting::new(10, 1), Posting::new(22, 1)],
            )
            .unwrap();
        writer
            .add_term("dog", vec![Posting::new(10, 1), Posting::new(32, 1)])
            .unwrap();
        writer.finish(&storage).unwrap();

        let mut output = storage.create_output("collection.txt").unwrap();
        output
            .write_all(b"cat story\ncat and dog\ncat alone\ndog alone\n")
            .unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        let index = ShardRouter::open(&storage).unwrap();
        let collection = CollectionStore::open(&storage, "collection.txt").unwrap();
        SearchContext::new(index, collection)
    }

    #[test]
    fn test_and_query_fetches_matching_line() {
        let mut ctx = context();
        let results = ctx.search("cat dog AND").unwrap();

        assert_eq!(results.query, "cat dog AND");
        assert_eq!(
            results.matches,
            vec![QueryMatch {
                doc_id: 10,
                line: "cat and dog".to_string(),
            }]
        );
    }

    #[test]
    fn test_or_query_fetches_all_lines_in_order() {
        let mut ctx = context();
        let results = ctx.search("cat dog OR").unwrap();

        let lines: Vec<&str> = results.matches.iter().map(|m| m.line.as_str()).collect();
        assert_eq!(
            lines,
            vec!["cat story", "cat and dog", "cat alone", "dog alone"]
        );

        let ids: Vec<u64> = results.matches.iter().map(|m| m.doc_id).collect();
        assert_eq!(ids, vec![0, 10, 22, 32]);
    }

    #[test]
    fn test_malformed_query_produces_no_matches() {
        let mut ctx = context();
        let result = ctx.search("AND cat");
        assert!(matches!(result, Err(XiphosError::StackUnderflow(_))));
    }

    #[test]
    fn test_fetch_failure_aborts_query() {
        // Postings pointing past the end of the collection store.
        let storage = MemoryStorage::new();

        let mut writer = ShardWriter::new(0, 1).unwrap();
        writer
            .add_term("cat", vec![Posting::new(1000, 1)])
            .unwrap();
        writer.finish(&storage).unwrap();

        let mut output = storage.create_output("collection.txt").unwrap();
        output.write_all(b"short\n").unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        let index = ShardRouter::open(&storage).unwrap();
        let collection = CollectionStore::open(&storage, "collection.txt").unwrap();
        let mut ctx = SearchContext::new(index, collection);

        let result = ctx.search("cat");
        assert!(matches!(result, Err(XiphosError::OffsetOutOfRange(_))));
    }
}

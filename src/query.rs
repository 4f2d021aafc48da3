//! Stack-based boolean query evaluation.
//!
//! Queries are whitespace-tokenized sequences of terms and the operators
//! `AND` and `OR` (exact, case-sensitive; anything else is a term). The
//! evaluator makes a single left-to-right pass over the tokens with one
//! stack of document-ID sets: a term pushes its set, an operator pops two
//! sets and pushes their intersection or union. There is no precedence and
//! no parenthesization; operators always combine the two most recently
//! produced sets, in encounter order.
//!
//! A syntactically valid query leaves exactly one set on the stack.

use std::collections::BTreeSet;

use crate::error::{Result, XiphosError};
use crate::postings::PostingList;
use crate::shard::ShardRouter;

/// A set of document IDs, iterated in ascending order.
///
/// Ascending iteration is load-bearing: result output must be emitted in
/// ascending doc-ID order.
pub type DocIdSet = BTreeSet<u64>;

/// Evaluates one boolean query against a shard router.
///
/// The evaluation stack is local to a single evaluation; the evaluator is
/// consumed by [`QueryEvaluator::evaluate`] and never shared.
#[derive(Debug)]
pub struct QueryEvaluator<'a> {
    index: &'a mut ShardRouter,
    stack: Vec<DocIdSet>,
}

impl<'a> QueryEvaluator<'a> {
    /// Create an evaluator over the given index.
    pub fn new(index: &'a mut ShardRouter) -> Self {
        QueryEvaluator {
            index,
            stack: Vec::new(),
        }
    }

    /// Evaluate a query string down to its set of matching document IDs.
    pub fn evaluate(mut self, query: &str) -> Result<DocIdSet> {
        let tokens: Vec<&str> = query.split_whitespace().collect();
        if tokens.is_empty() {
            return Err(XiphosError::malformed_query("query contains no tokens"));
        }

        for token in tokens {
            match token {
                "AND" => self.perform_and()?,
                "OR" => self.perform_or()?,
                term => self.push_term(term)?,
            }
        }

        let result = self
            .stack
            .pop()
            .ok_or_else(|| XiphosError::malformed_query("no result set produced"))?;

        if !self.stack.is_empty() {
            return Err(XiphosError::malformed_query(format!(
                "{} sets left on the stack after evaluation",
                self.stack.len() + 1
            )));
        }

        Ok(result)
    }

    /// Fetch a term's document-ID set and push it onto the stack.
    fn push_term(&mut self, term: &str) -> Result<()> {
        let set = self.fetch_document_set(term)?;
        self.stack.push(set);
        Ok(())
    }

    /// Pop two sets and push their intersection.
    fn perform_and(&mut self) -> Result<()> {
        let (s1, s2) = self.pop_operands("AND")?;
        self.stack.push(s1.intersection(&s2).copied().collect());
        Ok(())
    }

    /// Pop two sets and push their union.
    fn perform_or(&mut self) -> Result<()> {
        let (s1, s2) = self.pop_operands("OR")?;
        self.stack.push(s1.union(&s2).copied().collect());
        Ok(())
    }

    fn pop_operands(&mut self, operator: &str) -> Result<(DocIdSet, DocIdSet)> {
        if self.stack.len() < 2 {
            return Err(XiphosError::stack_underflow(format!(
                "{operator} requires two operand sets, {} on the stack",
                self.stack.len()
            )));
        }

        // Pop order matters only for reporting; AND and OR are symmetric.
        match (self.stack.pop(), self.stack.pop()) {
            (Some(s1), Some(s2)) => Ok((s1, s2)),
            _ => Err(XiphosError::stack_underflow(format!(
                "{operator} requires two operand sets"
            ))),
        }
    }

    /// Project a term's postings down to its set of document IDs.
    ///
    /// A term absent from its shard yields the empty set; a postings list
    /// that fails to decode is a hard error, since silently treating
    /// corruption as "no matches" would mask index damage.
    fn fetch_document_set(&mut self, term: &str) -> Result<DocIdSet> {
        let bytes = match self.index.postings_bytes(term)? {
            Some(bytes) => bytes,
            None => {
                log::debug!("term {term:?} not found in its shard");
                return Ok(DocIdSet::new());
            }
        };

        let list = PostingList::decode(&bytes)?;
        log::debug!("term {term:?} df={}", list.doc_frequency());

        Ok(list.doc_ids().collect())
    }
}

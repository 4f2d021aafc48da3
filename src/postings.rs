//! Posting lists and the compressed postings codec.
//!
//! A posting list is serialized as a varint document frequency followed by
//! one (varint doc-ID delta, varint term frequency) pair per posting. Deltas
//! are taken against the previous document ID, starting from zero, so a list
//! round-trips only if its postings are in strictly ascending doc-ID order.
//! Term frequencies ride along in the wire format but boolean retrieval
//! never consumes them.

use crate::error::{Result, XiphosError};
use crate::util::varint;

/// A single posting in a posting list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Posting {
    /// Document ID. For this engine a document ID is the byte offset of the
    /// document's line in the collection store.
    pub doc_id: u64,
    /// Term frequency in the document.
    pub frequency: u32,
}

impl Posting {
    /// Create a new posting.
    pub fn new(doc_id: u64, frequency: u32) -> Self {
        Posting { doc_id, frequency }
    }
}

/// A validated posting list for a single term.
///
/// Postings are held in strictly ascending doc-ID order with positive term
/// frequencies; both invariants are checked on construction and on decode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    /// Create a posting list, validating the codec invariants.
    pub fn new(postings: Vec<Posting>) -> Result<Self> {
        let mut previous: Option<u64> = None;
        for posting in &postings {
            if posting.frequency == 0 {
                return Err(XiphosError::corrupt_postings(format!(
                    "zero term frequency for doc {}",
                    posting.doc_id
                )));
            }
            if let Some(prev) = previous {
                if posting.doc_id <= prev {
                    return Err(XiphosError::corrupt_postings(format!(
                        "doc IDs not strictly ascending: {} after {}",
                        posting.doc_id, prev
                    )));
                }
            }
            previous = Some(posting.doc_id);
        }

        Ok(PostingList { postings })
    }

    /// Create an empty posting list.
    pub fn empty() -> Self {
        PostingList::default()
    }

    /// The postings in ascending doc-ID order.
    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Document frequency: the number of documents containing the term.
    pub fn doc_frequency(&self) -> u64 {
        self.postings.len() as u64
    }

    /// Iterate over the document IDs in ascending order.
    pub fn doc_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.postings.iter().map(|p| p.doc_id)
    }

    /// Encode this posting list into its compressed wire format.
    pub fn encode(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(&varint::encode_u64(self.postings.len() as u64));

        let mut previous = 0u64;
        for posting in &self.postings {
            let delta = posting.doc_id - previous;
            bytes.extend_from_slice(&varint::encode_u64(delta));
            bytes.extend_from_slice(&varint::encode_u32(posting.frequency));
            previous = posting.doc_id;
        }

        bytes
    }

    /// Decode a posting list from its compressed wire format.
    ///
    /// Fails with `CorruptPostings` on truncated input, trailing bytes,
    /// duplicate or decreasing document IDs, doc-ID overflow, and zero
    /// term frequencies. A document frequency of zero decodes to the empty
    /// list.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut pos = 0;

        let (df, consumed) = varint::decode_u64(&bytes[pos..])?;
        pos += consumed;

        let mut postings = Vec::with_capacity(df.min(1 << 20) as usize);
        let mut doc_id = 0u64;

        for i in 0..df {
            let (delta, consumed) = varint::decode_u64(&bytes[pos..])?;
            pos += consumed;

            if i > 0 && delta == 0 {
                return Err(XiphosError::corrupt_postings(format!(
                    "duplicate document ID {doc_id} (zero delta)"
                )));
            }

            doc_id = doc_id.checked_add(delta).ok_or_else(|| {
                XiphosError::corrupt_postings("document ID overflow while decoding deltas")
            })?;

            let (frequency, consumed) = varint::decode_u32(&bytes[pos..])?;
            pos += consumed;

            if frequency == 0 {
                return Err(XiphosError::corrupt_postings(format!(
                    "zero term frequency for doc {doc_id}"
                )));
            }

            postings.push(Posting::new(doc_id, frequency));
        }

        if pos != bytes.len() {
            return Err(XiphosError::corrupt_postings(format!(
                "{} trailing bytes after {df} postings",
                bytes.len() - pos
            )));
        }

        Ok(PostingList { postings })
    }
}

//! Line-oriented collection store access.
//!
//! The collection is a single append-only file where each document occupies
//! one line; a document ID is the byte offset of its line. This module only
//! performs random-access reads, so the store must be seekable: a gzip
//! compressed collection is rejected up front.

use std::io::{BufRead, BufReader, Seek, SeekFrom};

use crate::error::{Result, XiphosError};
use crate::storage::{Storage, StorageInput};

/// A read handle over the document collection.
///
/// The underlying input has a single cursor; `line_at` seeks before every
/// read, so a concurrent wrapper would need one handle per in-flight query.
#[derive(Debug)]
pub struct CollectionStore {
    input: Box<dyn StorageInput>,
    size: u64,
}

impl CollectionStore {
    /// Open the collection file with the given name.
    ///
    /// Fails with `UnsupportedCollection` for gzip-compressed files, which
    /// are not seekable.
    pub fn open(storage: &dyn Storage, name: &str) -> Result<Self> {
        if name.ends_with(".gz") {
            return Err(XiphosError::unsupported_collection(format!(
                "{name}: gzipped collection is not seekable, use the uncompressed file"
            )));
        }

        let input = storage.open_input(name)?;
        let size = input.size()?;

        Ok(CollectionStore { input, size })
    }

    /// Size of the collection store in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Read the single line starting at the given byte offset.
    ///
    /// The line terminator is not included; a trailing carriage return is
    /// stripped as well.
    pub fn line_at(&mut self, offset: u64) -> Result<String> {
        if offset >= self.size {
            return Err(XiphosError::offset_out_of_range(offset, self.size));
        }

        self.input.seek(SeekFrom::Start(offset))?;

        let mut line = Vec::new();
        let mut reader = BufReader::new(&mut self.input);
        reader.read_until(b'\n', &mut line)?;

        if line.last() == Some(&b'\n') {
            line.pop();
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        Ok(String::from_utf8_lossy(&line).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::XiphosError;
    use crate::storage::memory::MemoryStorage;
    use std::io::Write;

    fn store_with(content: &[u8]) -> CollectionStore {
        let storage = MemoryStorage::new();
        let mut output = storage.create_output("collection.txt").unwrap();
        output.write_all(content).unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        CollectionStore::open(&storage, "collection.txt").unwrap()
    }

    #[test]
    fn test_line_at_offsets() {
        let mut store = store_with(b"cat story\ncat and dog\ncat alone\n");

        assert_eq!(store.line_at(0).unwrap(), "cat story");
        assert_eq!(store.line_at(10).unwrap(), "cat and dog");
        assert_eq!(store.line_at(22).unwrap(), "cat alone");
    }

    #[test]
    fn test_line_at_mid_line_offset_reads_to_terminator() {
        let mut store = store_with(b"cat story\ncat and dog\n");
        assert_eq!(store.line_at(4).unwrap(), "story");
    }

    #[test]
    fn test_last_line_without_terminator() {
        let mut store = store_with(b"first\nlast without newline");
        assert_eq!(store.line_at(6).unwrap(), "last without newline");
    }

    #[test]
    fn test_crlf_is_stripped() {
        let mut store = store_with(b"dos line\r\nnext\r\n");
        assert_eq!(store.line_at(0).unwrap(), "dos line");
    }

    #[test]
    fn test_offset_out_of_range() {
        let mut store = store_with(b"short\n");
        let result = store.line_at(100);
        assert!(matches!(result, Err(XiphosError::OffsetOutOfRange(_))));

        // The store size itself is one past the last readable byte.
        let result = store.line_at(6);
        assert!(matches!(result, Err(XiphosError::OffsetOutOfRange(_))));
    }

    #[test]
    fn test_gzipped_collection_is_rejected() {
        let storage = MemoryStorage::new();
        let mut output = storage.create_output("collection.txt.gz").unwrap();
        output.write_all(b"\x1f\x8b").unwrap();
        output.flush_and_sync().unwrap();
        drop(output);

        let result = CollectionStore::open(&storage, "collection.txt.gz");
        assert!(matches!(
            result,
            Err(XiphosError::UnsupportedCollection(_))
        ));
    }
}

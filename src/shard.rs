//! Sharded term dictionary: on-disk format, routing, and lookup.
//!
//! The index directory holds one file per shard, named `shard-NNNNN`. Each
//! shard is an immutable, sorted mapping from term bytes to an encoded
//! posting list (see [`crate::postings`]). A term belongs to exactly one
//! shard, determined by a stable 32-bit hash of the term modulo the shard
//! count.
//!
//! The coupling between index construction and query evaluation (hash
//! function and shard count) is recorded in every shard file header and
//! verified when the index is opened, so a drifted index fails loudly at
//! startup instead of silently losing terms.
//!
//! # Shard file layout
//!
//! ```text
//! magic            4 bytes  "XSHD"
//! format version   u8
//! hash id          u8       1 = CRC32 (IEEE), sign bit masked
//! shard index      u32 LE
//! shard count      u32 LE
//! entry count      u64 LE
//! entries          entry_count times, sorted by term bytes:
//!   term length    varint
//!   term bytes
//!   value length   varint
//!   value bytes    encoded posting list
//! ```

use std::io::{Read, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::{Result, XiphosError};
use crate::postings::{Posting, PostingList};
use crate::storage::{Storage, StorageInput};
use crate::util::varint;

/// Magic bytes identifying a shard file.
pub const SHARD_MAGIC: [u8; 4] = *b"XSHD";

/// Current shard file format version.
pub const FORMAT_VERSION: u8 = 1;

/// Hash identifier for CRC32 (IEEE) with the sign bit masked.
pub const HASH_CRC32_MASKED: u8 = 1;

/// File name of the shard with the given index.
pub fn shard_name(shard_index: u32) -> String {
    format!("shard-{shard_index:05}")
}

/// Map a term to the index of the shard that owns it.
///
/// The hash is CRC32 (IEEE) of the term bytes with the sign bit masked off,
/// so the result is always in `[0, shard_count)`. Index construction and
/// query evaluation must use this identical function; the `hash id` header
/// field ties a shard file to it.
pub fn shard_for_term(term: &str, shard_count: usize) -> usize {
    debug_assert!(shard_count > 0);
    (crc32fast::hash(term.as_bytes()) & 0x7FFF_FFFF) as usize % shard_count
}

/// Parsed shard file header.
#[derive(Debug, Clone)]
pub struct ShardHeader {
    /// Format version of the shard file.
    pub format_version: u8,
    /// Identifier of the hash function the shard was built with.
    pub hash_id: u8,
    /// Index of this shard within the index.
    pub shard_index: u32,
    /// Total shard count the index was built with.
    pub shard_count: u32,
    /// Number of term entries in this shard.
    pub entry_count: u64,
}

/// Offset and length of one term's postings bytes within a shard file.
#[derive(Debug, Clone)]
struct TermEntry {
    key: Vec<u8>,
    value_offset: u64,
    value_len: u64,
}

/// A reader over a single shard file.
///
/// The term table is scanned once at open time; postings bytes stay on disk
/// and are fetched lazily per lookup through the held input handle. The
/// handle has a single cursor, so lookups take `&mut self`; a concurrent
/// wrapper would need one input per in-flight query.
#[derive(Debug)]
pub struct ShardReader {
    header: ShardHeader,
    entries: Vec<TermEntry>,
    input: Box<dyn StorageInput>,
}

impl ShardReader {
    /// Open and validate a shard file.
    pub fn open(storage: &dyn Storage, name: &str) -> Result<Self> {
        let mut input = storage.open_input(name)?;
        let size = input.size()?;

        let mut magic = [0u8; 4];
        input.read_exact(&mut magic)?;
        if magic != SHARD_MAGIC {
            return Err(XiphosError::index(format!("{name} is not a shard file")));
        }

        let format_version = input.read_u8()?;
        if format_version != FORMAT_VERSION {
            return Err(XiphosError::index(format!(
                "{name}: unsupported shard format version {format_version}"
            )));
        }

        let hash_id = input.read_u8()?;
        if hash_id != HASH_CRC32_MASKED {
            return Err(XiphosError::index(format!(
                "{name}: unknown term hash identifier {hash_id}"
            )));
        }

        let shard_index = input.read_u32::<LittleEndian>()?;
        let shard_count = input.read_u32::<LittleEndian>()?;
        let entry_count = input.read_u64::<LittleEndian>()?;

        if shard_count == 0 || shard_index >= shard_count {
            return Err(XiphosError::index(format!(
                "{name}: shard index {shard_index} out of range for shard count {shard_count}"
            )));
        }

        let header = ShardHeader {
            format_version,
            hash_id,
            shard_index,
            shard_count,
            entry_count,
        };

        // Scan the entry table, recording where each term's postings live.
        let mut entries: Vec<TermEntry> = Vec::with_capacity(entry_count.min(1 << 20) as usize);
        for _ in 0..entry_count {
            let key_len = varint::read_u64(&mut input)
                .map_err(|_| XiphosError::index(format!("{name}: truncated term entry")))?;
            if key_len > size {
                return Err(XiphosError::index(format!(
                    "{name}: term length {key_len} exceeds shard file size"
                )));
            }
            let mut key = vec![0u8; key_len as usize];
            input.read_exact(&mut key)?;

            let value_len = varint::read_u64(&mut input)
                .map_err(|_| XiphosError::index(format!("{name}: truncated term entry")))?;
            let value_offset = input.stream_position()?;

            if let Some(last) = entries.last()
                && last.key.as_slice() >= key.as_slice()
            {
                return Err(XiphosError::index(format!(
                    "{name}: term entries out of order"
                )));
            }

            entries.push(TermEntry {
                key,
                value_offset,
                value_len,
            });

            let skip = i64::try_from(value_len).map_err(|_| {
                XiphosError::index(format!("{name}: unreasonable postings length {value_len}"))
            })?;
            input.seek(SeekFrom::Current(skip))?;
        }

        if input.stream_position()? != size {
            return Err(XiphosError::index(format!(
                "{name}: shard file length does not match its entry table"
            )));
        }

        Ok(ShardReader {
            header,
            entries,
            input,
        })
    }

    /// The validated header of this shard.
    pub fn header(&self) -> &ShardHeader {
        &self.header
    }

    /// Exact-key lookup of the raw postings bytes for a term.
    ///
    /// A key absent from the shard is `Ok(None)`, never an error.
    pub fn lookup(&mut self, term: &[u8]) -> Result<Option<Vec<u8>>> {
        let index = match self
            .entries
            .binary_search_by(|entry| entry.key.as_slice().cmp(term))
        {
            Ok(index) => index,
            Err(_) => return Ok(None),
        };

        let entry = &self.entries[index];
        self.input.seek(SeekFrom::Start(entry.value_offset))?;

        let mut value = vec![0u8; entry.value_len as usize];
        self.input.read_exact(&mut value)?;

        Ok(Some(value))
    }
}

/// Routes terms to shards and performs lookups against the owning shard.
///
/// Shards are discovered once, when the index is opened, by listing the
/// index directory; the shard count is the number of shards discovered, and
/// every shard header is checked against it.
#[derive(Debug)]
pub struct ShardRouter {
    shards: Vec<ShardReader>,
}

impl ShardRouter {
    /// Discover and open all shards in the given storage.
    ///
    /// Fails with a fatal `Index` error when no shards are found, or when
    /// any shard header disagrees with the discovered layout (count,
    /// position, or hash function).
    pub fn open(storage: &dyn Storage) -> Result<Self> {
        let mut names: Vec<String> = storage
            .list_files()?
            .into_iter()
            .filter(|name| name.starts_with("shard-"))
            .collect();
        names.sort();

        if names.is_empty() {
            return Err(XiphosError::index("no shards found in index directory"));
        }

        let mut shards = Vec::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            let reader = ShardReader::open(storage, name)?;
            let header = reader.header();

            if header.shard_count as usize != names.len() {
                return Err(XiphosError::index(format!(
                    "{name}: built for {} shards but {} were discovered",
                    header.shard_count,
                    names.len()
                )));
            }
            if header.shard_index as usize != position {
                return Err(XiphosError::index(format!(
                    "{name}: shard index {} does not match its position {position}",
                    header.shard_index
                )));
            }

            shards.push(reader);
        }

        log::info!("opened index with {} shards", shards.len());

        Ok(ShardRouter { shards })
    }

    /// The number of discovered shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// The index of the shard owning the given term.
    pub fn shard_for(&self, term: &str) -> usize {
        shard_for_term(term, self.shards.len())
    }

    /// Fetch the raw postings bytes for a term from its owning shard.
    pub fn postings_bytes(&mut self, term: &str) -> Result<Option<Vec<u8>>> {
        let shard = self.shard_for(term);
        log::debug!("term {term:?} routed to shard {shard}");
        self.shards[shard].lookup(term.as_bytes())
    }
}

/// Writes a single shard file.
///
/// Terms must be added in ascending byte order and must route to the shard
/// being written; both are validated. Entries are buffered in memory and
/// written out by [`ShardWriter::finish`], since the entry count leads the
/// entry table.
#[derive(Debug)]
pub struct ShardWriter {
    shard_index: u32,
    shard_count: u32,
    entries: Vec<(Vec<u8>, Vec<u8>)>,
}

impl ShardWriter {
    /// Create a writer for one shard of a `shard_count`-shard index.
    pub fn new(shard_index: u32, shard_count: u32) -> Result<Self> {
        if shard_count == 0 || shard_index >= shard_count {
            return Err(XiphosError::index(format!(
                "shard index {shard_index} out of range for shard count {shard_count}"
            )));
        }

        Ok(ShardWriter {
            shard_index,
            shard_count,
            entries: Vec::new(),
        })
    }

    /// Add a term and its postings to the shard.
    pub fn add_term(&mut self, term: &str, postings: Vec<Posting>) -> Result<()> {
        let owner = shard_for_term(term, self.shard_count as usize);
        if owner != self.shard_index as usize {
            return Err(XiphosError::index(format!(
                "term {term:?} routes to shard {owner}, writer is shard {}",
                self.shard_index
            )));
        }

        if let Some((last, _)) = self.entries.last() {
            if last.as_slice() >= term.as_bytes() {
                return Err(XiphosError::index(format!(
                    "term {term:?} added out of order"
                )));
            }
        }

        let list = PostingList::new(postings)?;
        self.entries.push((term.as_bytes().to_vec(), list.encode()));
        Ok(())
    }

    /// Write the shard file and flush it to storage.
    pub fn finish(self, storage: &dyn Storage) -> Result<()> {
        let mut output = storage.create_output(&shard_name(self.shard_index))?;

        output.write_all(&SHARD_MAGIC)?;
        output.write_u8(FORMAT_VERSION)?;
        output.write_u8(HASH_CRC32_MASKED)?;
        output.write_u32::<LittleEndian>(self.shard_index)?;
        output.write_u32::<LittleEndian>(self.shard_count)?;
        output.write_u64::<LittleEndian>(self.entries.len() as u64)?;

        for (key, value) in &self.entries {
            varint::write_u64(&mut output, key.len() as u64)?;
            output.write_all(key)?;
            varint::write_u64(&mut output, value.len() as u64)?;
            output.write_all(value)?;
        }

        output.flush_and_sync()?;
        Ok(())
    }
}

//! Command implementation for the Xiphos CLI.

use std::path::Path;

use crate::cli::args::{OutputFormat, XiphosArgs};
use crate::cli::output::print_results;
use crate::collection::CollectionStore;
use crate::error::{Result, XiphosError};
use crate::search::SearchContext;
use crate::shard::ShardRouter;
use crate::storage::file::FileStorage;
use crate::storage::{Storage, StorageConfig};

/// Execute the query described by the parsed arguments.
pub fn execute_command(args: XiphosArgs) -> Result<()> {
    // A gzipped collection is rejected before any index access.
    if args
        .collection
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("gz"))
    {
        return Err(XiphosError::unsupported_collection(format!(
            "{}: gzipped collection is not seekable, use the uncompressed file",
            args.collection.display()
        )));
    }

    if args.verbosity() > 1 {
        println!("Index: {}", args.index.display());
        println!("Collection: {}", args.collection.display());
    }

    let index_storage = FileStorage::new(&args.index, StorageConfig::default())?;
    let index = ShardRouter::open(&index_storage)?;

    let collection = open_collection(&args.collection)?;
    let mut context = SearchContext::new(index, collection);

    if args.verbosity() > 0 && matches!(args.output_format, OutputFormat::Human) {
        println!("Query: {}", args.query);
    }

    let results = context.search(&args.query)?;

    print_results(&results, &args)
}

/// Open the collection file through a storage rooted at its parent directory.
fn open_collection(path: &Path) -> Result<CollectionStore> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            XiphosError::other(format!("collection path has no file name: {}", path.display()))
        })?;

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let storage = FileStorage::new(directory, StorageConfig::default())?;
    if !storage.file_exists(name) {
        return Err(XiphosError::storage(format!(
            "File not found: {}",
            path.display()
        )));
    }

    CollectionStore::open(&storage, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use tempfile::TempDir;

    use crate::postings::Posting;
    use crate::shard::ShardWriter;

    fn args_for(index: &Path, collection: &Path, query: &str) -> XiphosArgs {
        XiphosArgs::try_parse_from([
            "xiphos",
            "--quiet",
            "--index",
            index.to_str().unwrap(),
            "--collection",
            collection.to_str().unwrap(),
            "--query",
            query,
        ])
        .unwrap()
    }

    fn write_fixture(dir: &Path) -> std::path::PathBuf {
        let storage = FileStorage::new(dir, StorageConfig::default()).unwrap();

        let mut writer = ShardWriter::new(0, 1).unwrap();
        writer
            .add_term("cat", vec![Posting::new(0, 1)])
            .unwrap();
        writer.finish(&storage).unwrap();

        let collection_path = dir.join("collection.txt");
        let mut file = std::fs::File::create(&collection_path).unwrap();
        file.write_all(b"cat story\n").unwrap();
        collection_path
    }

    #[test]
    fn test_execute_command_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let collection_path = write_fixture(temp_dir.path());

        let args = args_for(temp_dir.path(), &collection_path, "cat");
        execute_command(args).unwrap();
    }

    #[test]
    fn test_gz_collection_is_rejected_before_index_access() {
        // The index path does not even exist; the gz check must fire first.
        let args = args_for(
            Path::new("/nonexistent/index"),
            Path::new("/nonexistent/collection.txt.gz"),
            "cat",
        );

        let result = execute_command(args);
        assert!(matches!(
            result,
            Err(XiphosError::UnsupportedCollection(_))
        ));
    }

    #[test]
    fn test_missing_collection_file() {
        let temp_dir = TempDir::new().unwrap();
        write_fixture(temp_dir.path());

        let args = args_for(
            temp_dir.path(),
            &temp_dir.path().join("missing.txt"),
            "cat",
        );
        let result = execute_command(args);
        assert!(matches!(result, Err(XiphosError::Storage(_))));
    }
}

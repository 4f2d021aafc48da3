//! Output formatting for CLI results.

use crate::cli::args::{OutputFormat, XiphosArgs};
use crate::error::Result;
use crate::search::SearchResults;

/// Print the results of a query run in the requested format.
///
/// Human output emits one `<doc_id>\t<line>` row per match in ascending
/// doc-ID order, followed by an elapsed-time summary.
pub fn print_results(results: &SearchResults, args: &XiphosArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            for m in &results.matches {
                println!("{}\t{}", m.doc_id, m.line);
            }

            if args.verbosity() > 0 {
                println!();
                println!("query completed in {}ms", results.duration_ms);
            }
        }
        OutputFormat::Json => {
            let rendered = if args.pretty {
                serde_json::to_string_pretty(results)?
            } else {
                serde_json::to_string(results)?
            };
            println!("{rendered}");
        }
    }

    Ok(())
}

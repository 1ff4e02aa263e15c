//! Preview command implementation.

use crate::cli::PreviewArgs;
use crate::error::Result;
use crate::output::Formatter;

/// Execute the preview command.
pub async fn execute_preview(args: PreviewArgs, formatter: &Formatter) -> Result<()> {
    let table = geoeval_extractor::preview_path(&args.path, args.rows)?;
    println!("{}", formatter.format_table(&table)?);
    Ok(())
}

use anyhow::{Context, Result};
use faf_cli::cli::GeoCommands;
use faf_geo::{merge_on, persist, read_table, validate_destination};
use tracing::info;

/// Handle `faf geo merge`: CSV table left-joined onto a shapefile, written as a new shapefile.
///
/// The destination suffix is checked before any input is read, so a bad
/// `--out` fails fast and leaves the filesystem untouched.
pub fn handle(command: &GeoCommands) -> Result<()> {
    let GeoCommands::Merge {
        table,
        shapefile,
        key,
        out,
    } = command
    else {
        unreachable!();
    };
    validate_destination(out)?;

    info!("Merging {} onto {} by '{}'", table.display(), shapefile.display(), key);
    let frame = read_table(table).with_context(|| format!("loading table '{}'", table.display()))?;
    let merged = merge_on(&frame, shapefile, key)?;
    persist(&merged, out).with_context(|| format!("writing '{}'", out.display()))?;

    println!(
        "Merged {} table rows ({} with geometry) -> {}",
        merged.height(),
        merged.geometry_count(),
        out.display()
    );
    Ok(())
}

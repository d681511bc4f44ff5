use anyhow::Result;
use faf_cli::cli::GeoCommands;
use faf_geo::read_shapefile;

pub fn handle(command: &GeoCommands) -> Result<()> {
    let GeoCommands::Inspect { shapefile } = command else {
        unreachable!();
    };
    let frame = read_shapefile(shapefile)?;

    println!("Shapefile {}:", shapefile.display());
    println!("  Rows      : {}", frame.height());
    println!(
        "  Geometry  : {} ({} rows)",
        frame.geometry_type().unwrap_or("none"),
        frame.geometry_count()
    );
    println!(
        "  Projection: {}",
        if frame.projection.is_some() { "yes" } else { "no" }
    );
    println!("  Columns:");
    for series in frame.attributes.get_columns() {
        println!("    {:<12} {}", series.name(), series.dtype());
    }
    Ok(())
}

use crate::error::{GeoError, GeoResult};
use polars::prelude::{CsvReader, DataFrame, SerReader};
use std::fs::File;
use std::path::Path;

/// Load a tabular dataset (CSV with a header row).
pub fn read_table(path: &Path) -> GeoResult<DataFrame> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();
    if extension != "csv" {
        return Err(GeoError::Invalid(format!(
            "unsupported table extension '{}' for {}; use .csv",
            extension,
            path.display()
        )));
    }
    let mut file = File::open(path).map_err(|_| GeoError::FileNotFound {
        path: path.to_path_buf(),
    })?;
    let reader = CsvReader::new(&mut file);
    Ok(reader.has_header(true).finish()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::DataType;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn reads_csv_with_integer_keys() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("flows.csv");
        fs::write(&path, "FAF_Zone,tons\n11,1.5\n12,2.0\n").unwrap();
        let df = read_table(&path).unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.column("FAF_Zone").unwrap().dtype(), &DataType::Int64);
    }

    #[test]
    fn rejects_other_extensions() {
        let err = read_table(Path::new("flows.parquet")).unwrap_err();
        assert!(matches!(err, GeoError::Invalid(_)));
    }

    #[test]
    fn missing_table_is_file_not_found() {
        let tmp = tempdir().unwrap();
        let err = read_table(&tmp.path().join("absent.csv")).unwrap_err();
        assert!(matches!(err, GeoError::FileNotFound { .. }));
    }
}

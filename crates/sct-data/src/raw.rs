use sct_core::{Error, Result};
use std::fs::File;
use std::path::{Path, PathBuf};

/// A delimited-text file read as nullable strings, before any typing.
#[derive(Debug, Clone)]
pub struct RawTable {
    /// Source file.
    pub path: PathBuf,
    /// Header names (trimmed).
    pub headers: Vec<String>,
    /// Row cells; `None` marks a null token or a missing trailing field.
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Index of a required column.
    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers.iter().position(|h| h == name).ok_or_else(|| {
            Error::Validation(format!(
                "{}: missing required column '{}' (found: {})",
                self.path.display(),
                name,
                self.headers.join(", ")
            ))
        })
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell `(row, col)` as an owned nullable string.
    pub fn cell(&self, row: usize, col: usize) -> Option<String> {
        self.rows.get(row).and_then(|r| r.get(col)).cloned().flatten()
    }
}

/// Delimiter for `path`: the override when given, tab for `.tsv`, comma otherwise.
pub fn delimiter_for(path: &Path, delimiter: Option<char>) -> u8 {
    if let Some(c) = delimiter {
        if c.is_ascii() {
            return c as u8;
        }
    }
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("").to_lowercase();
    if ext == "tsv" { b'\t' } else { b',' }
}

/// Read a delimited-text file with a header row.
///
/// Rows are kept as-is: short rows yield `None` for missing cells and extra
/// cells are ignored. Cells equal to a null token (after trimming) are `None`.
pub fn read_delimited(path: &Path, delimiter: u8, null_tokens: &[String]) -> Result<RawTable> {
    let file = File::open(path).map_err(|e| {
        Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", path.display(), e)))
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(Error::Validation(format!("{}: file has no header row", path.display())));
    }

    let n_cols = headers.len();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let mut row = Vec::with_capacity(n_cols);
        for j in 0..n_cols {
            let cell = record.get(j).map(str::trim).and_then(|s| {
                if null_tokens.iter().any(|t| t == s) { None } else { Some(s.to_string()) }
            });
            row.push(cell);
        }
        rows.push(row);
    }

    tracing::debug!(path = %path.display(), rows = rows.len(), columns = n_cols, "read table");
    Ok(RawTable { path: path.to_path_buf(), headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tmp_file(name: &str, contents: &str) -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("sct_raw_{}_{}", std::process::id(), name));
        std::fs::write(&p, contents).unwrap();
        p
    }

    #[test]
    fn nulls_and_short_rows() {
        let p = tmp_file("short.csv", "a,b,c\n1, NA ,x\n2,,\n3\n");
        let t = read_delimited(&p, b',', &[String::new(), "NA".into()]).unwrap();
        assert_eq!(t.headers, vec!["a", "b", "c"]);
        assert_eq!(t.len(), 3);
        assert_eq!(t.cell(0, 0).as_deref(), Some("1"));
        assert_eq!(t.cell(0, 1), None);
        assert_eq!(t.cell(0, 2).as_deref(), Some("x"));
        assert_eq!(t.cell(1, 1), None);
        assert_eq!(t.cell(2, 2), None);
        assert!(t.column_index("b").is_ok());
        assert!(t.column_index("z").is_err());
        std::fs::remove_file(p).ok();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_delimited(Path::new("/nonexistent/sct.csv"), b',', &[]).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn delimiter_selection() {
        assert_eq!(delimiter_for(Path::new("a.tsv"), None), b'\t');
        assert_eq!(delimiter_for(Path::new("a.CSV"), None), b',');
        assert_eq!(delimiter_for(Path::new("a.csv"), Some(';')), b';');
    }
}

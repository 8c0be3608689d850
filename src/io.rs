//! CSV input and output.
//!
//! Output is rendered fully in memory, then staged in temporary files next to each
//! destination. The destinations are only replaced once both files are staged, so a run
//! that fails never leaves half-written output behind.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::assemble::TriageResult;
use crate::error::Result;
use crate::table::CompoundTable;

/// Read a headered CSV table.
pub fn read_table<R: Read>(reader: R) -> Result<CompoundTable> {
    let mut rdr = csv::Reader::from_reader(reader);
    let columns: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for record in rdr.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    CompoundTable::new(columns, rows)
}

/// Read a headered CSV file.
pub fn read_table_path(path: impl AsRef<Path>) -> Result<CompoundTable> {
    let path = path.as_ref();
    let table = read_table(fs::File::open(path)?)?;
    info!(path = %path.display(), rows = table.len(), "read compound table");
    Ok(table)
}

/// Write a table as headered CSV.
pub fn write_table<W: Write>(writer: W, table: &CompoundTable) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(table.columns())?;
    for row in table.rows() {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Render a table to CSV bytes.
pub fn table_to_csv(table: &CompoundTable) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_table(&mut buf, table)?;
    Ok(buf)
}

/// Write the full annotated table and the exemplar table.
pub fn write_outputs(
    result: &TriageResult,
    full_path: impl AsRef<Path>,
    exemplar_path: impl AsRef<Path>,
) -> Result<()> {
    let full = table_to_csv(&result.full_table()?)?;
    let exemplars = table_to_csv(&result.exemplar_table()?)?;

    let (full_path, exemplar_path) = (full_path.as_ref(), exemplar_path.as_ref());
    let full_tmp = stage(full_path, &full)?;
    let exemplar_tmp = stage(exemplar_path, &exemplars)?;

    full_tmp.persist(full_path).map_err(|e| e.error)?;
    if let Err(e) = exemplar_tmp.persist(exemplar_path) {
        if let Err(rm) = fs::remove_file(full_path) {
            warn!(path = %full_path.display(), error = %rm, "could not remove partial output");
        }
        return Err(e.error.into());
    }
    info!(
        full = %full_path.display(),
        exemplars = %exemplar_path.display(),
        "wrote results"
    );
    Ok(())
}

/// Write `bytes` to a temporary file in the directory `path` will live in.
fn stage(path: &Path, bytes: &[u8]) -> Result<NamedTempFile> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Exemplar, KmeansFit};
    use crate::embed::Embedding;

    fn result() -> TriageResult {
        let table = read_table("id,smiles,MW\na,C,16\nb,CC,30\nc,CCC,44\n".as_bytes()).unwrap();
        let fit = KmeansFit {
            labels: vec![0, 0, 1],
            centroids: vec![vec![0.5, 0.0], vec![5.0, 5.0]],
            iterations: 1,
            converged: true,
            inertia: 0.5,
        };
        let exemplars = vec![
            Exemplar {
                cluster: 0,
                row: 0,
                distance: 0.5,
            },
            Exemplar {
                cluster: 1,
                row: 2,
                distance: 0.0,
            },
        ];
        let embedding = Embedding::new(vec![[0.0, 0.0], [1.0, 0.0], [5.0, 5.0]]);
        TriageResult::assemble(table, embedding, fit, exemplars).unwrap()
    }

    #[test]
    fn writes_both_outputs_and_nothing_else() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full.csv");
        let medoids = dir.path().join("medoids.csv");
        write_outputs(&result(), &full, &medoids).unwrap();

        assert_eq!(read_table_path(&full).unwrap().len(), 3);
        assert_eq!(read_table_path(&medoids).unwrap().len(), 2);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 2);
    }

    #[test]
    fn unwritable_exemplar_path_leaves_no_full_table() {
        let dir = tempfile::tempdir().unwrap();
        let full = dir.path().join("full.csv");
        let medoids = dir.path().join("no_such_dir").join("medoids.csv");

        assert!(write_outputs(&result(), &full, &medoids).is_err());
        assert!(!full.exists());
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn csv_round_trip_keeps_quoted_fields() {
        let text = "id,smiles,MW\nC1,\"CC(=O)O,x\",60.05\nC2,CCO,46.07\n";
        let table = read_table(text.as_bytes()).unwrap();
        assert_eq!(table.columns(), &["id", "smiles", "MW"]);
        assert_eq!(table.field(0, "smiles"), Some("CC(=O)O,x"));

        let out = String::from_utf8(table_to_csv(&table).unwrap()).unwrap();
        assert_eq!(out, text);
    }

    #[test]
    fn ragged_csv_is_an_error() {
        let text = "a,b\n1,2\n3\n";
        assert!(read_table(text.as_bytes()).is_err());
    }

    #[test]
    fn read_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in.csv");
        fs::write(&path, "id,logP\nx,1.5\n").unwrap();
        let table = read_table_path(&path).unwrap();
        assert_eq!(table.len(), 1);
        assert!(read_table_path(dir.path().join("missing.csv")).is_err());
    }
}

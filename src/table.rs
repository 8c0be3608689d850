//! Compound tables and the descriptor matrix extracted from them.
//!
//! A [`CompoundTable`] keeps every column of the filtered input as text so that
//! identifiers, structure strings, and any other pass-through columns come out of the
//! pipeline unchanged. Only the descriptor columns named by a [`DescriptorSchema`] are
//! parsed, into a [`FeatureMatrix`] whose row `i` is table row `i`.

use crate::error::{Error, Result, Stage};

/// One chemical entity: identifier, structure string, and descriptor values.
#[derive(Clone, Debug, PartialEq)]
pub struct CompoundRecord {
    /// Stable identifier.
    pub id: String,
    /// Structure string (e.g. SMILES).
    pub structure: String,
    /// Descriptor values, in schema order.
    pub descriptors: Vec<f32>,
}

impl CompoundRecord {
    /// Create a record.
    pub fn new(id: impl Into<String>, structure: impl Into<String>, descriptors: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            structure: structure.into(),
            descriptors,
        }
    }
}

/// Ordered descriptor column names.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DescriptorSchema {
    names: Vec<String>,
}

impl DescriptorSchema {
    /// Create a schema. Names must be non-empty and unique.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(Error::invalid_input(
                Stage::Input,
                "descriptor schema has no columns",
            ));
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(Error::invalid_input(
                    Stage::Input,
                    format!("descriptor column {name:?} listed twice"),
                ));
            }
        }
        Ok(Self { names })
    }

    /// Column names, in matrix order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of descriptors (D).
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Always false for a constructed schema.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Dense N x D descriptor matrix, row-aligned with its source table.
#[derive(Clone, Debug, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<f32>>,
    n_cols: usize,
}

impl FeatureMatrix {
    /// Build from rows, rejecting ragged or non-finite data.
    pub fn new(rows: Vec<Vec<f32>>) -> Result<Self> {
        let n_cols = rows.first().map_or(0, Vec::len);
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n_cols {
                return Err(Error::invalid_input(
                    Stage::Input,
                    format!("row {i} has {} descriptors, expected {n_cols}", row.len()),
                ));
            }
            if let Some(j) = row.iter().position(|v| !v.is_finite()) {
                return Err(Error::invalid_input(
                    Stage::Input,
                    format!("row {i}, descriptor {j}: value is not finite"),
                ));
            }
        }
        Ok(Self { rows, n_cols })
    }

    /// Number of rows (N).
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns (D).
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Row-major view.
    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    /// True when there are no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A filtered compound table: header plus text cells, one row per compound.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompoundTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CompoundTable {
    /// Create a table, checking every row has one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(Error::invalid_input(
                    Stage::Input,
                    format!(
                        "row {i} has {} fields, header has {}",
                        row.len(),
                        columns.len()
                    ),
                ));
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a table from typed records.
    ///
    /// Columns are `id_column`, `structure_column`, then the schema's descriptors.
    pub fn from_records(
        id_column: &str,
        structure_column: &str,
        schema: &DescriptorSchema,
        records: &[CompoundRecord],
    ) -> Result<Self> {
        let mut columns = Vec::with_capacity(schema.len() + 2);
        columns.push(id_column.to_string());
        columns.push(structure_column.to_string());
        columns.extend(schema.names().iter().cloned());

        let mut rows = Vec::with_capacity(records.len());
        for (i, rec) in records.iter().enumerate() {
            if rec.descriptors.len() != schema.len() {
                return Err(Error::invalid_input(
                    Stage::Input,
                    format!(
                        "record {i} ({}) has {} descriptors, schema has {}",
                        rec.id,
                        rec.descriptors.len(),
                        schema.len()
                    ),
                ));
            }
            let mut row = Vec::with_capacity(columns.len());
            row.push(rec.id.clone());
            row.push(rec.structure.clone());
            row.extend(rec.descriptors.iter().map(|v| v.to_string()));
            rows.push(row);
        }
        Self::new(columns, rows)
    }

    /// Header, in input order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows, in input order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of compounds.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no compounds.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at `(row, column)`, if both exist.
    pub fn field(&self, row: usize, column: &str) -> Option<&str> {
        let j = self.column_index(column)?;
        self.rows.get(row).map(|r| r[j].as_str())
    }

    /// Parse the schema's descriptor columns into a matrix.
    ///
    /// Fails with [`Error::InvalidInput`] if a column is absent or any cell is empty,
    /// non-numeric, or non-finite.
    pub fn feature_matrix(&self, schema: &DescriptorSchema) -> Result<FeatureMatrix> {
        let mut indices = Vec::with_capacity(schema.len());
        for name in schema.names() {
            let j = self.column_index(name).ok_or_else(|| {
                Error::invalid_input(Stage::Input, format!("missing descriptor column {name:?}"))
            })?;
            indices.push(j);
        }

        let mut out = Vec::with_capacity(self.rows.len());
        for (i, row) in self.rows.iter().enumerate() {
            let mut values = Vec::with_capacity(indices.len());
            for (&j, name) in indices.iter().zip(schema.names()) {
                let cell = row[j].trim();
                if cell.is_empty() {
                    return Err(Error::invalid_input(
                        Stage::Input,
                        format!("row {i}: missing value for {name:?}"),
                    ));
                }
                let v: f32 = cell.parse().map_err(|_| {
                    Error::invalid_input(
                        Stage::Input,
                        format!("row {i}: {name:?} is not numeric ({cell:?})"),
                    )
                })?;
                if !v.is_finite() {
                    return Err(Error::invalid_input(
                        Stage::Input,
                        format!("row {i}: {name:?} is not finite ({cell:?})"),
                    ));
                }
                values.push(v);
            }
            out.push(values);
        }
        FeatureMatrix::new(out)
    }
}

//! Table Submodule (of Tree)
//!
//! Reads and writes trees in the tabular exchange schema, one row per node:
//! `x, y, isleaf, child, parent, col`. Tables exported from dendrogram
//! tooling name the leaf and child columns `leaf` and `label`; both spellings
//! are accepted.
//!
//! Sanitization on import, before the tree is validated:
//! missing `isleaf` is false, leaf heights are forced to 0, missing colours
//! become `#000000`, missing parents become the root sentinel, and rows are
//! sorted by `(y, x)`. `NA` counts as missing.
//!
use std::fs::File;
use std::io;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;

use log::info;
use serde::Deserialize;
use thiserror::Error;

use crate::tree::Edge;
use crate::tree::TreeError;
use crate::tree::TreeModel;
use crate::tree::DEFAULT_COLOR;
use crate::tree::ROOT_SENTINEL;

#[derive(Error, Debug)]
pub enum TableError {
    #[error("could not access table: {0}")]
    Io(#[from] io::Error),
    #[error("invalid table: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: missing value in column {column}")]
    MissingValue { row: usize, column: &'static str },
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// A row as found in the file, before sanitization
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(default, deserialize_with = "csv::invalid_option")]
    x: Option<f64>,
    #[serde(default, deserialize_with = "csv::invalid_option")]
    y: Option<f64>,
    #[serde(default, alias = "leaf")]
    isleaf: Option<String>,
    #[serde(alias = "label")]
    child: String,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    col: Option<String>,
}

// --------------------------- PUBLIC
/// Reads a tree table from any reader; see the module docs for sanitization.
pub fn read_table<R: io::Read>(reader: R) -> Result<TreeModel, TableError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    let mut edges = vec![];
    for (i, result) in rdr.deserialize::<RawRow>().enumerate() {
        //1-based, header excluded
        edges.push(result?.into_edge(i + 1)?);
    }
    edges.sort_by(|a, b| a.y.total_cmp(&b.y).then(a.x.total_cmp(&b.x)));
    info!("read {} tree rows", edges.len());
    Ok(TreeModel::new(edges)?)
}
pub fn read_table_file<P: AsRef<Path>>(path: P) -> Result<TreeModel, TableError> {
    let file = File::open(path)?;
    read_table(BufReader::new(file))
}
/// Writes the rows of `tree` in their current order.
pub fn write_table<W: io::Write>(tree: &TreeModel, writer: W) -> Result<(), TableError> {
    let mut wtr = csv::Writer::from_writer(writer);
    for edge in tree.edges() {
        wtr.serialize(edge)?;
    }
    wtr.flush()?;
    info!("wrote {} tree rows", tree.len());
    Ok(())
}
pub fn write_table_file<P: AsRef<Path>>(tree: &TreeModel, path: P) -> Result<(), TableError> {
    let file = File::create(path)?;
    write_table(tree, BufWriter::new(file))
}

// --------------------------- helpers
impl RawRow {
    fn into_edge(self, row: usize) -> Result<Edge, TableError> {
        let isleaf = self.isleaf.as_deref().is_some_and(parse_flag);
        let x = self.x.ok_or(TableError::MissingValue { row, column: "x" })?;
        let y = if isleaf {
            0.0
        } else {
            self.y.ok_or(TableError::MissingValue { row, column: "y" })?
        };
        Ok(Edge {
            x,
            y,
            isleaf,
            child: self.child,
            parent: present(self.parent).unwrap_or_else(|| ROOT_SENTINEL.to_owned()),
            color: present(self.col).unwrap_or_else(|| DEFAULT_COLOR.to_owned()),
        })
    }
}
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !is_missing(v))
}
fn is_missing(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.eq_ignore_ascii_case("na") || value.eq_ignore_ascii_case("nan")
}
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "1" | "yes"
    )
}

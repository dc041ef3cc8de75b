//! Tables - CSV Inputs of a House
//!
//! Readers for the per-row sensor tables, the static node table and the
//! edge list. Cells are kept as strings until a component asks for a number.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::path::{Path, PathBuf};

use homegin_core::{Error, Result};

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_path(path)
        .map_err(|e| Error::csv(path.display().to_string(), e))
}

fn parse_f32(path: &Path, row: usize, column: &str, value: &str) -> Result<f32> {
    let trimmed = value.trim();
    match trimmed {
        "True" | "true" => return Ok(1.0),
        "False" | "false" => return Ok(0.0),
        _ => {}
    }
    trimmed.parse::<f32>().map_err(|_| Error::Parse {
        path: path.display().to_string(),
        row,
        column: column.to_string(),
        value: value.to_string(),
    })
}

fn parse_usize(path: &Path, row: usize, column: &str, value: &str) -> Result<usize> {
    let trimmed = value.trim();
    trimmed
        .parse::<usize>()
        .or_else(|_| match trimmed.parse::<f64>() {
            Ok(v) if v >= 0.0 && v.fract() == 0.0 => Ok(v as usize),
            _ => Err(()),
        })
        .map_err(|()| Error::Parse {
            path: path.display().to_string(),
            row,
            column: column.to_string(),
            value: value.to_string(),
        })
}

fn column_index(path: &Path, headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim() == name)
        .ok_or_else(|| Error::MissingColumn {
            path: path.display().to_string(),
            column: name.to_string(),
        })
}

// =============================================================================
// SensorTable
// =============================================================================

/// A per-row sensor table: values or last-change times.
#[derive(Debug, Clone)]
pub struct SensorTable {
    path: PathBuf,
    headers: Vec<String>,
    rows: Vec<csv::StringRecord>,
}

impl SensorTable {
    /// Reads a table with a header row.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = open(path)?;
        let headers = reader
            .headers()
            .map_err(|e| Error::csv(path.display().to_string(), e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let rows = reader
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::csv(path.display().to_string(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    /// Source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if there are no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    /// Column headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Position of the column named `name`.
    pub fn column(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| Error::MissingColumn {
                path: self.path.display().to_string(),
                column: name.to_string(),
            })
    }

    /// Raw cell text.
    pub fn cell(&self, row: usize, col: usize) -> Result<&str> {
        let record = self.rows.get(row).ok_or(Error::IndexOutOfBounds {
            index: row,
            size: self.rows.len(),
        })?;
        record.get(col).ok_or_else(|| Error::MissingColumn {
            path: self.path.display().to_string(),
            column: col.to_string(),
        })
    }

    /// Cell parsed as a number.
    pub fn number(&self, row: usize, col: usize) -> Result<f32> {
        let column = self
            .headers
            .get(col)
            .cloned()
            .unwrap_or_else(|| col.to_string());
        parse_f32(&self.path, row, &column, self.cell(row, col)?)
    }
}

// =============================================================================
// NodeTable
// =============================================================================

/// One row of the static node table.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRow {
    /// `Type` column; 1 marks structural nodes.
    pub node_type: f32,
    /// `place_in_house` column.
    pub place: f32,
    /// `Object` column; `None` when empty.
    pub object: Option<String>,
}

impl NodeRow {
    /// Structural nodes carry no sensor reading.
    pub fn is_structural(&self) -> bool {
        self.node_type == 1.0
    }
}

/// Static per-node metadata shared by every row of a house.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeTable {
    rows: Vec<NodeRow>,
}

impl NodeTable {
    /// Creates a table from rows.
    pub fn new(rows: Vec<NodeRow>) -> Self {
        Self { rows }
    }

    /// Reads `Type`, `place_in_house` and `Object` columns.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = open(path)?;
        let headers = reader
            .headers()
            .map_err(|e| Error::csv(path.display().to_string(), e))?
            .clone();
        let type_col = column_index(path, &headers, "Type")?;
        let place_col = column_index(path, &headers, "place_in_house")?;
        let object_col = column_index(path, &headers, "Object")?;

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::csv(path.display().to_string(), e))?;
            let field = |col: usize| record.get(col).unwrap_or("");
            let object = field(object_col).trim();
            rows.push(NodeRow {
                node_type: parse_f32(path, i, "Type", field(type_col))?,
                place: parse_f32(path, i, "place_in_house", field(place_col))?,
                object: (!object.is_empty()).then(|| object.to_string()),
            });
        }
        Ok(Self { rows })
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[NodeRow] {
        &self.rows
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// EdgeTable
// =============================================================================

/// Directed edge list read from `Src` / `Dst` columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeTable {
    /// Edge sources.
    pub src: Vec<usize>,
    /// Edge destinations.
    pub dst: Vec<usize>,
}

impl EdgeTable {
    /// Reads an edge list.
    pub fn read(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut reader = open(path)?;
        let headers = reader
            .headers()
            .map_err(|e| Error::csv(path.display().to_string(), e))?
            .clone();
        let src_col = column_index(path, &headers, "Src")?;
        let dst_col = column_index(path, &headers, "Dst")?;

        let mut src = Vec::new();
        let mut dst = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|e| Error::csv(path.display().to_string(), e))?;
            src.push(parse_usize(path, i, "Src", record.get(src_col).unwrap_or(""))?);
            dst.push(parse_usize(path, i, "Dst", record.get(dst_col).unwrap_or(""))?);
        }
        Ok(Self { src, dst })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_sensor_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            dir.path(),
            "house.csv",
            "a,b,activity,time_of_the_day,s1\n0,0,eating,12.5,1\n0,0,idle,13,False\n",
        );
        let table = SensorTable::read(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column("time_of_the_day").unwrap(), 3);
        assert_eq!(table.cell(0, 2).unwrap(), "eating");
        assert!((table.number(0, 3).unwrap() - 12.5).abs() < 1e-6);
        assert_eq!(table.number(1, 4).unwrap(), 0.0);
        assert!(matches!(table.number(0, 2), Err(Error::Parse { .. })));
        assert!(matches!(table.column("missing"), Err(Error::MissingColumn { .. })));
    }

    #[test]
    fn test_node_and_edge_tables() {
        let dir = tempfile::tempdir().unwrap();
        let nodes = write(
            dir.path(),
            "nodes.csv",
            "name,Type,place_in_house,Object\nkitchen,1,3,\ndoor,2,1,door\ntime,3,0,\n",
        );
        let table = NodeTable::read(&nodes).unwrap();
        assert_eq!(table.len(), 3);
        assert!(table.rows()[0].is_structural());
        assert_eq!(table.rows()[0].object, None);
        assert_eq!(table.rows()[1].object.as_deref(), Some("door"));

        let edges = write(dir.path(), "edges.csv", "Src,Dst\n0,1\n1,0\n2.0,1\n");
        let edges = EdgeTable::read(&edges).unwrap();
        assert_eq!(edges.src, vec![0, 1, 2]);
        assert_eq!(edges.dst, vec![1, 0, 1]);

        let bad = write(dir.path(), "bad.csv", "From,To\n0,1\n");
        assert!(matches!(EdgeTable::read(&bad), Err(Error::MissingColumn { .. })));
    }
}

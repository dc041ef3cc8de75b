//! Feature Encoder - Per-Node Attributes of One Sensor Row
//!
//! Every node gets a 4-wide feature `(value, place_in_house, type,
//! last_change)`. Structural nodes carry `(-1, place, type, -1)`. Sensor
//! nodes read consecutive sensor columns, except that a run of sensor nodes
//! sharing one `Object` is a single physical sensor and repeats the reading
//! of its first node. The last node-table row is the time-of-day node,
//! encoded as `(time_of_the_day, -1, -1, -1)`.
//!
//! The node table is compiled once into a `NodeLayout` so that encoding a
//! row is a plain gather.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use std::collections::HashSet;

use homegin_core::{Error, Result};

use crate::table::{NodeTable, SensorTable};

/// Width of a node feature.
pub const FEATURE_DIM: usize = 4;

/// First sensor column in the value and change-time tables.
pub const FIRST_SENSOR_COLUMN: usize = 4;

/// Column holding the time of day.
pub const TIME_OF_DAY_COLUMN: &str = "time_of_the_day";

/// Feature vector of one node.
pub type NodeFeature = [f32; FEATURE_DIM];

// =============================================================================
// NodeLayout
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
enum NodeSource {
    Structural { place: f32, node_type: f32 },
    Sensor { slot: usize, place: f32, node_type: f32 },
}

/// Compiled node table: where every node reads its feature from.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeLayout {
    sources: Vec<NodeSource>,
    num_slots: usize,
}

impl NodeLayout {
    /// Compiles a node table.
    ///
    /// Fails with `Error::NonContiguousObject` if an `Object` reappears after
    /// its run of sensor nodes ended. A structural node ends the open run.
    pub fn compile(nodes: &NodeTable) -> Result<Self> {
        let Some((_, sensor_rows)) = nodes.rows().split_last() else {
            return Err(Error::invalid_graph("node table is empty"));
        };

        let mut sources = Vec::with_capacity(sensor_rows.len());
        let mut finished: HashSet<&str> = HashSet::new();
        let mut current: Option<(Option<&str>, usize)> = None;
        let mut num_slots = 0;

        for (j, row) in sensor_rows.iter().enumerate() {
            if row.is_structural() {
                if let Some((Some(prev), _)) = current.take() {
                    finished.insert(prev);
                }
                sources.push(NodeSource::Structural {
                    place: row.place,
                    node_type: row.node_type,
                });
                continue;
            }

            let object = row.object.as_deref();
            let slot = match current {
                Some((Some(prev), slot)) if object == Some(prev) => slot,
                _ => {
                    if let Some((Some(prev), _)) = current {
                        finished.insert(prev);
                    }
                    if let Some(obj) = object {
                        if finished.contains(obj) {
                            return Err(Error::NonContiguousObject {
                                object: obj.to_string(),
                                node: j,
                            });
                        }
                    }
                    let slot = num_slots;
                    num_slots += 1;
                    current = Some((object, slot));
                    slot
                }
            };
            sources.push(NodeSource::Sensor {
                slot,
                place: row.place,
                node_type: row.node_type,
            });
        }

        Ok(Self { sources, num_slots })
    }

    /// Nodes per graph, the time-of-day node included.
    pub fn num_nodes(&self) -> usize {
        self.sources.len() + 1
    }

    /// Number of sensor columns consumed per row.
    pub fn num_sensor_columns(&self) -> usize {
        self.num_slots
    }
}

// =============================================================================
// FeatureEncoder
// =============================================================================

/// Encodes rows of one house's value and change-time tables.
#[derive(Debug, Clone, Copy)]
pub struct FeatureEncoder<'a> {
    layout: &'a NodeLayout,
    values: &'a SensorTable,
    changes: &'a SensorTable,
    time_column: usize,
}

impl<'a> FeatureEncoder<'a> {
    /// Checks that both tables have the columns and rows the layout needs.
    pub fn new(
        layout: &'a NodeLayout,
        values: &'a SensorTable,
        changes: &'a SensorTable,
    ) -> Result<Self> {
        let required = FIRST_SENSOR_COLUMN + layout.num_sensor_columns();
        for table in [values, changes] {
            if table.num_columns() < required {
                return Err(Error::MissingColumn {
                    path: table.path().display().to_string(),
                    column: (required - 1).to_string(),
                });
            }
        }
        if changes.len() < values.len() {
            return Err(Error::csv(
                changes.path().display().to_string(),
                format!(
                    "{} rows, but the value table has {}",
                    changes.len(),
                    values.len()
                ),
            ));
        }
        let time_column = values.column(TIME_OF_DAY_COLUMN)?;
        Ok(Self {
            layout,
            values,
            changes,
            time_column,
        })
    }

    /// Feature vectors of every node for `row`.
    pub fn encode(&self, row: usize) -> Result<Vec<NodeFeature>> {
        let mut readings = Vec::with_capacity(self.layout.num_slots);
        for slot in 0..self.layout.num_slots {
            let col = FIRST_SENSOR_COLUMN + slot;
            readings.push((self.values.number(row, col)?, self.changes.number(row, col)?));
        }

        let mut features = Vec::with_capacity(self.layout.num_nodes());
        for source in &self.layout.sources {
            features.push(match *source {
                NodeSource::Structural { place, node_type } => [-1.0, place, node_type, -1.0],
                NodeSource::Sensor {
                    slot,
                    place,
                    node_type,
                } => {
                    let (value, last_change) = readings[slot];
                    [value, place, node_type, last_change]
                }
            });
        }
        features.push([
            self.values.number(row, self.time_column)?,
            -1.0,
            -1.0,
            -1.0,
        ]);
        Ok(features)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::NodeRow;
    use std::io::Write;

    fn node(node_type: f32, place: f32, object: Option<&str>) -> NodeRow {
        NodeRow {
            node_type,
            place,
            object: object.map(str::to_string),
        }
    }

    fn table(dir: &std::path::Path, name: &str, contents: &str) -> SensorTable {
        let path = dir.join(name);
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents.as_bytes())
            .unwrap();
        SensorTable::read(path).unwrap()
    }

    /// kitchen (structural), fridge x2 (linked), door, time-of-day
    fn nodes() -> NodeTable {
        NodeTable::new(vec![
            node(1.0, 3.0, Some("kitchen")),
            node(2.0, 3.0, Some("fridge")),
            node(2.0, 3.0, Some("fridge")),
            node(4.0, 1.0, Some("door")),
            node(5.0, 0.0, None),
        ])
    }

    #[test]
    fn test_layout_slots() {
        let layout = NodeLayout::compile(&nodes()).unwrap();
        assert_eq!(layout.num_nodes(), 5);
        assert_eq!(layout.num_sensor_columns(), 2);
    }

    #[test]
    fn test_encode_row() {
        let dir = tempfile::tempdir().unwrap();
        let values = table(
            dir.path(),
            "v.csv",
            "id,x,activity,time_of_the_day,fridge,door\n0,0,eating,8.5,1,0\n",
        );
        let changes = table(
            dir.path(),
            "c.csv",
            "id,x,activity,time_of_the_day,fridge,door\n0,0,eating,8.5,12,30\n",
        );
        let layout = NodeLayout::compile(&nodes()).unwrap();
        let encoder = FeatureEncoder::new(&layout, &values, &changes).unwrap();
        let features = encoder.encode(0).unwrap();

        assert_eq!(
            features,
            vec![
                [-1.0, 3.0, 1.0, -1.0],
                [1.0, 3.0, 2.0, 12.0],
                [1.0, 3.0, 2.0, 12.0],
                [0.0, 1.0, 4.0, 30.0],
                [8.5, -1.0, -1.0, -1.0],
            ]
        );
    }

    #[test]
    fn test_structural_node_ends_run() {
        let result = NodeLayout::compile(&NodeTable::new(vec![
            node(2.0, 1.0, Some("bed")),
            node(1.0, 1.0, Some("bedroom")),
            node(2.0, 1.0, Some("bed")),
            node(5.0, 0.0, None),
        ]));
        match result {
            Err(Error::NonContiguousObject { object, node }) => {
                assert_eq!(object, "bed");
                assert_eq!(node, 2);
            }
            other => panic!("expected NonContiguousObject, got {other:?}"),
        }
    }

    #[test]
    fn test_structural_node_between_objects_keeps_columns() {
        let layout = NodeLayout::compile(&NodeTable::new(vec![
            node(2.0, 1.0, Some("tap")),
            node(2.0, 1.0, Some("tap")),
            node(1.0, 1.0, Some("kitchen")),
            node(2.0, 1.0, Some("fridge")),
            node(5.0, 0.0, None),
        ]))
        .unwrap();
        assert_eq!(layout.num_sensor_columns(), 2);
        assert_eq!(layout.num_nodes(), 5);
    }

    #[test]
    fn test_empty_objects_never_link() {
        let layout = NodeLayout::compile(&NodeTable::new(vec![
            node(2.0, 1.0, None),
            node(2.0, 1.0, None),
            node(5.0, 0.0, None),
        ]))
        .unwrap();
        assert_eq!(layout.num_sensor_columns(), 2);
    }

    #[test]
    fn test_non_contiguous_object_rejected() {
        let result = NodeLayout::compile(&NodeTable::new(vec![
            node(2.0, 1.0, Some("tap")),
            node(2.0, 1.0, Some("door")),
            node(2.0, 1.0, Some("tap")),
            node(5.0, 0.0, None),
        ]));
        match result {
            Err(Error::NonContiguousObject { object, node }) => {
                assert_eq!(object, "tap");
                assert_eq!(node, 2);
            }
            other => panic!("expected NonContiguousObject, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_sensor_columns() {
        let dir = tempfile::tempdir().unwrap();
        let values = table(
            dir.path(),
            "v.csv",
            "id,x,activity,time_of_the_day,fridge\n0,0,eating,8.5,1\n",
        );
        let layout = NodeLayout::compile(&nodes()).unwrap();
        assert!(matches!(
            FeatureEncoder::new(&layout, &values, &values),
            Err(Error::MissingColumn { .. })
        ));
    }
}

//! PTH path files
//!
//! Area waypoint graphs stored as a GFF tree. Each point owns a contiguous
//! run of the shared connection list, addressed by `First_Conection` and
//! `Conections` (the engine's spelling).

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::gff::{self, GffStruct, GffValue};
use crate::error::{Error, Result};

/// GFF type tag of path files.
pub const PTH_TYPE: &str = "PTH ";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
    /// Indices of the points reachable from this one.
    pub connections: Vec<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathGraph {
    pub points: Vec<PathPoint>,
}

impl PathGraph {
    /// Build from the GFF root of a path file.
    ///
    /// # Errors
    /// Returns a format error when a required field is missing or a point's
    /// connection run lies outside the connection list.
    pub fn from_gff(root: &GffStruct) -> Result<Self> {
        let destinations = root
            .get_list("Path_Conections")
            .unwrap_or_default()
            .iter()
            .map(|connection| required_u32(connection, "Destination"))
            .collect::<Result<Vec<_>>>()?;

        let points = root
            .get_list("Path_Points")
            .unwrap_or_default()
            .iter()
            .map(|point| {
                let count = required_u32(point, "Conections")? as usize;
                let first = required_u32(point, "First_Conection")? as usize;
                let connections = destinations
                    .get(first..first + count)
                    .ok_or_else(|| {
                        Error::InvalidPathGraph(format!(
                            "path point connections {first}..{} exceed {} entries",
                            first + count,
                            destinations.len()
                        ))
                    })?
                    .to_vec();
                Ok(PathPoint {
                    x: required_f32(point, "X")?,
                    y: required_f32(point, "Y")?,
                    connections,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { points })
    }

    /// Flatten into the GFF layout, assigning connection runs in point order.
    pub fn to_gff(&self) -> GffStruct {
        let mut points = Vec::with_capacity(self.points.len());
        let mut connections = Vec::new();

        for point in &self.points {
            points.push(
                GffStruct::new(2)
                    .with("Conections", GffValue::Dword(point.connections.len() as u32))
                    .with("First_Conection", GffValue::Dword(connections.len() as u32))
                    .with("X", GffValue::Float(point.x))
                    .with("Y", GffValue::Float(point.y)),
            );
            connections.extend(
                point
                    .connections
                    .iter()
                    .map(|&destination| GffStruct::new(3).with("Destination", GffValue::Dword(destination))),
            );
        }

        GffStruct::root()
            .with("Path_Points", GffValue::List(points))
            .with("Path_Conections", GffValue::List(connections))
    }
}

fn required_u32(gff_struct: &GffStruct, label: &str) -> Result<u32> {
    gff_struct.get_u32(label).ok_or_else(|| missing(label))
}

fn required_f32(gff_struct: &GffStruct, label: &str) -> Result<f32> {
    gff_struct.get_f32(label).ok_or_else(|| missing(label))
}

fn missing(label: &str) -> Error {
    Error::InvalidPathGraph(format!("missing or mistyped field {label}"))
}

/// Read a PTH file from disk
pub fn read_pth<P: AsRef<Path>>(path: P) -> Result<PathGraph> {
    PathGraph::from_gff(&gff::read_gff_as(path, PTH_TYPE)?)
}

/// Parse PTH data from bytes
pub fn parse_pth_bytes(data: &[u8]) -> Result<PathGraph> {
    PathGraph::from_gff(&gff::parse_gff_bytes_as(data, PTH_TYPE)?)
}

/// Write a PTH file to disk
pub fn write_pth<P: AsRef<Path>>(graph: &PathGraph, path: P) -> Result<()> {
    std::fs::write(path, serialize_pth(graph)?)?;
    Ok(())
}

/// Serialize a path graph to bytes
pub fn serialize_pth(graph: &PathGraph) -> Result<Vec<u8>> {
    gff::serialize_gff_struct(&graph.to_gff(), PTH_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn triangle_graph() -> PathGraph {
        PathGraph {
            points: vec![
                PathPoint { x: 0.0, y: 0.0, connections: vec![1, 2] },
                PathPoint { x: 10.0, y: 0.0, connections: vec![0] },
                PathPoint { x: 5.0, y: 8.5, connections: vec![] },
            ],
        }
    }

    #[test]
    fn test_pth_round_trip() {
        let bytes = serialize_pth(&triangle_graph()).unwrap();
        assert_eq!(parse_pth_bytes(&bytes).unwrap(), triangle_graph());
    }

    #[test]
    fn test_gff_layout() {
        let root = triangle_graph().to_gff();
        let points = root.get_list("Path_Points").unwrap();
        assert_eq!(points[1].get_u32("First_Conection"), Some(2));
        assert_eq!(points[1].get_u32("Conections"), Some(1));
        assert_eq!(root.get_list("Path_Conections").unwrap().len(), 3);
    }

    #[test]
    fn test_connection_run_out_of_range() {
        let root = GffStruct::root().with(
            "Path_Points",
            GffValue::List(vec![
                GffStruct::new(2)
                    .with("Conections", GffValue::Dword(4))
                    .with("First_Conection", GffValue::Dword(0))
                    .with("X", GffValue::Float(0.0))
                    .with("Y", GffValue::Float(0.0)),
            ]),
        );
        let err = PathGraph::from_gff(&root).unwrap_err();
        assert!(matches!(err, Error::InvalidPathGraph(_)));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_connection_run_past_empty_list() {
        let root = GffStruct::root()
            .with(
                "Path_Points",
                GffValue::List(vec![
                    GffStruct::new(2)
                        .with("Conections", GffValue::Dword(5))
                        .with("First_Conection", GffValue::Dword(0))
                        .with("X", GffValue::Float(1.0))
                        .with("Y", GffValue::Float(1.0)),
                ]),
            )
            .with("Path_Conections", GffValue::List(Vec::new()));
        let bytes = gff::serialize_gff_struct(&root, PTH_TYPE).unwrap();

        let err = parse_pth_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_missing_field_is_format_error() {
        let root = GffStruct::root().with(
            "Path_Points",
            GffValue::List(vec![GffStruct::new(2).with("X", GffValue::Float(0.0))]),
        );
        let err = PathGraph::from_gff(&root).unwrap_err();
        assert!(matches!(&err, Error::InvalidPathGraph(message) if message.contains("Conections")));
        assert_eq!(err.kind(), ErrorKind::Format);
    }

    #[test]
    fn test_wrong_gff_type() {
        let bytes = gff::serialize_gff_struct(&triangle_graph().to_gff(), "UTC ").unwrap();
        assert!(matches!(parse_pth_bytes(&bytes), Err(Error::GffTypeMismatch { .. })));
    }
}

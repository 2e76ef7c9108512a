//! Indexed geometry with optional per-vertex attributes.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("geometry has no vertices")]
    Empty,
    #[error("index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    #[error("{attribute} has {len} entries but there are {vertex_count} vertices")]
    AttributeLength {
        attribute: &'static str,
        len: usize,
        vertex_count: usize,
    },
}

/// A polygon given by vertex indices, counter-clockwise seen from the front.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    Triangle([u32; 3]),
    Quad([u32; 4]),
}

impl Face {
    #[inline]
    pub fn indices(&self) -> &[u32] {
        match self {
            Face::Triangle(idx) => idx,
            Face::Quad(idx) => idx,
        }
    }
}

/// Vertex positions plus optional attribute arrays. An attribute array is
/// either empty (absent) or index-aligned with `vertices`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Geometry {
    pub vertices: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[f32; 4]>,
    pub faces: Vec<Face>,
    pub edges: Vec<[u32; 2]>,
}

impl Geometry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// `true` once there is vertex data to upload.
    #[inline]
    pub fn has_data(&self) -> bool {
        !self.vertices.is_empty()
    }

    /// Checks attribute lengths and that every face/edge index names a vertex.
    pub fn validate(&self) -> Result<(), GeometryError> {
        let vertex_count = self.vertices.len();
        if vertex_count == 0 {
            return Err(GeometryError::Empty);
        }

        let attributes = [
            ("normals", self.normals.len()),
            ("uvs", self.uvs.len()),
            ("colors", self.colors.len()),
        ];
        for (attribute, len) in attributes {
            if len != 0 && len != vertex_count {
                return Err(GeometryError::AttributeLength {
                    attribute,
                    len,
                    vertex_count,
                });
            }
        }

        let face_indices = self.faces.iter().flat_map(|f| f.indices().iter());
        let edge_indices = self.edges.iter().flat_map(|e| e.iter());
        match face_indices
            .chain(edge_indices)
            .find(|&&i| i as usize >= vertex_count)
        {
            Some(&index) => Err(GeometryError::IndexOutOfRange {
                index,
                vertex_count,
            }),
            None => Ok(()),
        }
    }

    /// Triangle-list indices; quads `a b c d` split into `a b c` and `a c d`.
    pub fn triangle_indices(&self) -> Vec<u32> {
        let mut out = Vec::with_capacity(self.faces.len() * 6);
        for face in &self.faces {
            match *face {
                Face::Triangle([a, b, c]) => out.extend_from_slice(&[a, b, c]),
                Face::Quad([a, b, c, d]) => out.extend_from_slice(&[a, b, c, a, c, d]),
            }
        }
        out
    }

    /// Line-list indices, two per edge.
    pub fn line_indices(&self) -> Vec<u32> {
        self.edges.iter().flatten().copied().collect()
    }
}
